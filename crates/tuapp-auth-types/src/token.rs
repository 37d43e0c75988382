//! JWT session-credential encoding and validation.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use tuapp_domain::id::PassengerId;

/// Who a session credential authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// Passenger, granted after a successful 2FA verification.
    Passenger(PassengerId),
    /// Administrative user (by email), granted after password login.
    Admin(String),
}

impl Subject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Passenger(_) => SubjectKind::Passenger,
            Self::Admin(_) => SubjectKind::Admin,
        }
    }

    #[cfg(any(feature = "issuer", test))]
    fn sub_claim(&self) -> String {
        match self {
            Self::Passenger(id) => id.to_string(),
            Self::Admin(email) => email.clone(),
        }
    }
}

/// Discriminates the two subject universes inside the claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Passenger,
    Admin,
}

/// Identity extracted from a validated session credential.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub subject: Subject,
    pub exp: u64,
}

/// Errors returned by [`validate_session`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token")]
    Signing,
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | passenger numeric id, or admin email |
/// | `kind` | custom | `"passenger"` or `"admin"` |
/// | `exp` | `exp` | expiry, seconds since UNIX epoch |
///
/// [`Serialize`] requires the **`issuer`** cargo feature.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct SessionClaims {
    pub sub: String,
    pub kind: SubjectKind,
    pub exp: u64,
}

impl SessionClaims {
    fn into_subject(self) -> Result<Subject, AuthError> {
        match self.kind {
            SubjectKind::Passenger => self
                .sub
                .parse::<PassengerId>()
                .map(Subject::Passenger)
                .map_err(|_| AuthError::Malformed),
            SubjectKind::Admin if self.sub.contains('@') => Ok(Subject::Admin(self.sub)),
            SubjectKind::Admin => Err(AuthError::Malformed),
        }
    }
}

/// HS256, `exp` checked with no leeway, required claims: `exp` + `sub`.
fn validation() -> Validation {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

/// Validate a bearer credential, returning the authenticated subject.
pub fn validate_session(token: &str, secret: &str) -> Result<SessionInfo, AuthError> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    let exp = data.claims.exp;
    let subject = data.claims.into_subject()?;
    Ok(SessionInfo { subject, exp })
}

/// Sign a session credential for `subject` expiring at `exp` (seconds since epoch).
#[cfg(any(feature = "issuer", test))]
pub fn encode_session(subject: &Subject, exp: u64, secret: &str) -> Result<String, AuthError> {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let claims = SessionClaims {
        sub: subject.sub_claim(),
        kind: subject.kind(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::Signing)
}
