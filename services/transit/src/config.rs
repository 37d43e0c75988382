use anyhow::Context as _;

/// Outbound mail settings. Present only when `SMTP_HOST` is set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// Default 587 (STARTTLS). Env var: `SMTP_PORT`.
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox. Env var: `SMTP_FROM`.
    pub from: String,
}

/// Transit service configuration loaded from environment variables.
#[derive(Debug)]
pub struct TransitConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing session credentials.
    pub jwt_secret: String,
    /// Session credential lifetime (default 30). Env var: `ACCESS_TOKEN_EXPIRE_MINUTES`.
    pub access_token_expire_minutes: u64,
    /// TCP port to listen on (default 8000). Env var: `TRANSIT_PORT`.
    pub port: u16,
    /// `None` makes every 2FA delivery fail unless `mail_log_fallback` is set.
    pub smtp: Option<SmtpConfig>,
    /// Accept 2FA requests without SMTP by only logging them (development).
    /// Env var: `MAIL_LOG_FALLBACK`, default false.
    pub mail_log_fallback: bool,
    /// Failed 2FA attempts before a code is discarded. Unset means unlimited.
    /// Env var: `TWO_FACTOR_MAX_ATTEMPTS`.
    pub two_factor_max_attempts: Option<u32>,
}

impl TransitConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_or(&var, "SMTP_PORT", 587)?,
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
                from: var("SMTP_FROM").unwrap_or_else(|| "no-reply@tuapp.local".to_owned()),
            }),
            None => None,
        };

        let two_factor_max_attempts = var("TWO_FACTOR_MAX_ATTEMPTS")
            .map(|v| {
                v.parse::<u32>()
                    .context("TWO_FACTOR_MAX_ATTEMPTS must be a positive integer")
            })
            .transpose()?
            .filter(|&n| n > 0);

        Ok(Self {
            database_url: var("DATABASE_URL").context("DATABASE_URL is not set")?,
            jwt_secret: var("JWT_SECRET").context("JWT_SECRET is not set")?,
            access_token_expire_minutes: parse_or(&var, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            port: parse_or(&var, "TRANSIT_PORT", 8000)?,
            smtp,
            mail_log_fallback: parse_or(&var, "MAIL_LOG_FALLBACK", false)?,
            two_factor_max_attempts,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(v) => v.parse().with_context(|| format!("{key} has an invalid value {v:?}")),
        None => Ok(default),
    }
}
