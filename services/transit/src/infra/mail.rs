use std::sync::Arc;

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::domain::repository::Notifier;
use crate::error::DeliveryError;

/// SMTP reply codes meaning the server refused our credentials.
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

// ── SMTP ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SmtpNotifier {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            transport: Arc::new(builder.build()),
            from: config.from.parse()?,
        })
    }

    fn build_message(
        &self,
        to: &str,
        display_name: &str,
        code: &str,
    ) -> Result<Message, DeliveryError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| DeliveryError::Transport(format!("invalid recipient address: {e}")))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("tuAPP verification code")
            .header(ContentType::TEXT_PLAIN)
            .body(two_factor_body(display_name, code))
            .map_err(|e| DeliveryError::Transport(format!("failed to build message: {e}")))
    }
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .finish()
    }
}

impl Notifier for SmtpNotifier {
    async fn send_two_factor_code(
        &self,
        to: &str,
        display_name: &str,
        code: &str,
    ) -> Result<(), DeliveryError> {
        let message = self.build_message(to, display_name, code)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(classify_smtp_error)
    }
}

fn classify_smtp_error(e: lettre::transport::smtp::Error) -> DeliveryError {
    let code = e.status().map(|c| c.to_string());
    if code.is_some_and(|c| AUTH_FAILURE_CODES.contains(&c.as_str())) {
        DeliveryError::Authentication
    } else {
        DeliveryError::Transport(e.to_string())
    }
}

fn two_factor_body(display_name: &str, code: &str) -> String {
    format!(
        "Hola {display_name},\n\n\
         El teu codi de verificació és: {code}\n\n\
         Caduca d'aquí a 5 minuts. Si no l'has sol·licitat, ignora aquest missatge.\n"
    )
}

// ── Logging fallback ─────────────────────────────────────────────────────────

/// Development stand-in for SMTP, enabled with `MAIL_LOG_FALLBACK`. Never logs the code
/// itself, so a code "sent" this way cannot be used.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send_two_factor_code(
        &self,
        to: &str,
        _display_name: &str,
        _code: &str,
    ) -> Result<(), DeliveryError> {
        tracing::warn!(recipient = to, "SMTP not configured, 2FA code not mailed");
        Ok(())
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum MailNotifier {
    Smtp(SmtpNotifier),
    Log(LogNotifier),
    /// No SMTP host and no fallback: every delivery fails with a transport error.
    Unconfigured,
}

impl MailNotifier {
    pub fn from_config(smtp: Option<&SmtpConfig>, log_fallback: bool) -> anyhow::Result<Self> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpNotifier::new(config)?)),
            None if log_fallback => Ok(Self::Log(LogNotifier)),
            None => Ok(Self::Unconfigured),
        }
    }
}

impl Notifier for MailNotifier {
    async fn send_two_factor_code(
        &self,
        to: &str,
        display_name: &str,
        code: &str,
    ) -> Result<(), DeliveryError> {
        match self {
            Self::Smtp(n) => n.send_two_factor_code(to, display_name, code).await,
            Self::Log(n) => n.send_two_factor_code(to, display_name, code).await,
            Self::Unconfigured => Err(DeliveryError::Transport("smtp not configured".to_owned())),
        }
    }
}
