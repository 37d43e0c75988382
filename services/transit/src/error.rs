use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use tuapp_domain::card::CardStatus;

/// Failure of the outbound notification channel.
///
/// Distinct from issuance failure: when this surfaces, the token is already live.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("mail server rejected credentials")]
    Authentication,
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Transit service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("passenger not found")]
    PassengerNotFound,
    #[error("card not found")]
    CardNotFound,
    #[error("virtual card not found")]
    VirtualCardNotFound,
    #[error("admin user not found")]
    AdminNotFound,
    #[error("invalid verification code")]
    InvalidCode,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("forbidden")]
    Forbidden,
    #[error("token expired")]
    TokenExpired,
    #[error("card is not active (status: {status})")]
    CardNotActive { status: CardStatus },
    #[error("card cannot be modified (status: {status})")]
    CardLocked { status: CardStatus },
    #[error("balance must not be negative")]
    InvalidBalance,
    #[error("nothing to update")]
    NoChanges,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("passenger already exists")]
    DuplicatePassenger,
    #[error("admin user already exists")]
    DuplicateAdmin,
    #[error("card code already in use")]
    DuplicateCardCode,
    #[error("passenger still has cards")]
    PassengerHasCards,
    #[error("an admin user cannot delete itself")]
    CannotDeleteSelf,
    #[error("could not generate a unique card code")]
    CardCodeExhausted,
    #[error("delivery failed")]
    Delivery(#[from] DeliveryError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl TransitError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PassengerNotFound => "PASSENGER_NOT_FOUND",
            Self::CardNotFound => "CARD_NOT_FOUND",
            Self::VirtualCardNotFound => "VIRTUAL_CARD_NOT_FOUND",
            Self::AdminNotFound => "ADMIN_NOT_FOUND",
            Self::InvalidCode => "INVALID_CODE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::CardNotActive { .. } => "CARD_NOT_ACTIVE",
            Self::CardLocked { .. } => "CARD_LOCKED",
            Self::InvalidBalance => "INVALID_BALANCE",
            Self::NoChanges => "NO_CHANGES",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::DuplicatePassenger => "DUPLICATE_PASSENGER",
            Self::DuplicateAdmin => "DUPLICATE_ADMIN",
            Self::DuplicateCardCode => "DUPLICATE_CARD_CODE",
            Self::PassengerHasCards => "PASSENGER_HAS_CARDS",
            Self::CannotDeleteSelf => "CANNOT_DELETE_SELF",
            Self::CardCodeExhausted => "RESOURCE_EXHAUSTED",
            Self::Delivery(DeliveryError::Authentication) => "DELIVERY_AUTHENTICATION",
            Self::Delivery(DeliveryError::Transport(_)) => "DELIVERY_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::PassengerNotFound
            | Self::CardNotFound
            | Self::VirtualCardNotFound
            | Self::AdminNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCode | Self::InvalidCredentials | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::TokenExpired => StatusCode::GONE,
            Self::CardNotActive { .. }
            | Self::CardLocked { .. }
            | Self::InvalidBalance
            | Self::NoChanges
            | Self::InvalidEmail
            | Self::CannotDeleteSelf => StatusCode::BAD_REQUEST,
            Self::DuplicatePassenger
            | Self::DuplicateAdmin
            | Self::DuplicateCardCode
            | Self::PassengerHasCards => StatusCode::CONFLICT,
            Self::Delivery(_) => StatusCode::BAD_GATEWAY,
            Self::CardCodeExhausted | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TransitError {
    fn into_response(self) -> Response {
        let status = self.status();
        // TraceLayer already records every response status. Only server-side faults
        // carry detail worth logging here.
        match &self {
            Self::Internal(e) => tracing::error!(error = ?e, kind = "INTERNAL", "internal error"),
            Self::CardCodeExhausted => {
                tracing::error!(kind = self.kind(), "card code space exhausted")
            }
            Self::Delivery(e) => tracing::warn!(error = %e, kind = self.kind(), "delivery failed"),
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
