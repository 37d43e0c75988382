//! Session-credential extractors for the transit API.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::Span;

use tuapp_auth_types::bearer::bearer_token;
use tuapp_auth_types::token::Subject;
use tuapp_domain::id::PassengerId;

use crate::error::TransitError;
use crate::state::AppState;

/// Any valid session: passenger or admin.
///
/// Rejects with `InvalidToken` (401) when the bearer credential is absent, forged or expired.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Subject);

impl Authenticated {
    /// Ownership filter for passenger-scoped reads; `None` for admins.
    pub fn owner_filter(&self) -> Option<PassengerId> {
        match &self.0 {
            Subject::Passenger(id) => Some(*id),
            Subject::Admin(_) => None,
        }
    }
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = TransitError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = bearer_token(&parts.headers)
            .ok_or(TransitError::InvalidToken)
            .and_then(|token| state.sessions().verify(token))
            .inspect(record_actor)
            .map(Self);
        async move { result }
    }
}

/// Tags the request span with who is calling.
fn record_actor(subject: &Subject) {
    let actor = match subject {
        Subject::Passenger(id) => format!("passenger:{id}"),
        Subject::Admin(email) => format!("admin:{email}"),
    };
    Span::current().record("actor", actor.as_str());
}

/// Admin session. A valid passenger session is rejected with `Forbidden` (403).
///
/// `email` is the session subject and identifies the acting account.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub email: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = TransitError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = bearer_token(&parts.headers)
            .ok_or(TransitError::InvalidToken)
            .and_then(|token| state.sessions().verify(token))
            .inspect(record_actor)
            .and_then(|subject| match subject {
                Subject::Admin(email) => Ok(Self { email }),
                Subject::Passenger(_) => Err(TransitError::Forbidden),
            });
        async move { result }
    }
}
