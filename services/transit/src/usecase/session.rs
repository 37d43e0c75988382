use chrono::{DateTime, Utc};

use tuapp_auth_types::token::{AuthError, Subject, encode_session, validate_session};

use crate::error::TransitError;

/// Signed bearer credential handed back after a successful login or 2FA verification.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub access_token: String,
    /// Expiry, seconds since UNIX epoch.
    pub exp: u64,
}

/// Issues and checks session credentials. Never touches the token store.
#[derive(Debug, Clone)]
pub struct SessionGrantor {
    pub secret: String,
    pub ttl_secs: u64,
}

impl SessionGrantor {
    pub fn grant(
        &self,
        subject: &Subject,
        issued_at: DateTime<Utc>,
    ) -> Result<SessionGrant, TransitError> {
        let exp = issued_at.timestamp().max(0) as u64 + self.ttl_secs;
        let access_token = encode_session(subject, exp, &self.secret)
            .map_err(|e| TransitError::Internal(e.into()))?;
        Ok(SessionGrant { access_token, exp })
    }

    /// Decode an incoming bearer credential. Any failure is `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Subject, TransitError> {
        validate_session(token, &self.secret)
            .map(|info| info.subject)
            .map_err(|e| match e {
                AuthError::Signing => TransitError::Internal(e.into()),
                _ => TransitError::InvalidToken,
            })
    }
}
