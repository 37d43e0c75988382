use anyhow::Context as _;
use sea_orm::Database;
use tracing::{info, warn};

use tuapp_core::tracing::init_tracing;
use tuapp_transit::config::TransitConfig;
use tuapp_transit::infra::mail::MailNotifier;
use tuapp_transit::router::build_router;
use tuapp_transit::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,sqlx=warn");

    let config = TransitConfig::from_env()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let notifier = MailNotifier::from_config(config.smtp.as_ref(), config.mail_log_fallback)
        .context("invalid SMTP configuration")?;
    match &notifier {
        MailNotifier::Log(_) => info!("SMTP_HOST not set, 2FA codes are only logged"),
        MailNotifier::Unconfigured => warn!("SMTP_HOST not set, 2FA requests will fail"),
        MailNotifier::Smtp(_) => {}
    }

    let state = AppState {
        db,
        jwt_secret: config.jwt_secret,
        access_token_ttl_secs: config.access_token_expire_minutes * 60,
        two_factor_max_attempts: config.two_factor_max_attempts,
        notifier,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        %addr,
        two_factor_max_attempts = ?config.two_factor_max_attempts,
        "transit service listening"
    );
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
