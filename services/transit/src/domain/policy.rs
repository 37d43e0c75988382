//! Per-kind rules of the shared verification-token protocol.
//!
//! The issue / expire / consume sequence lives in
//! [`TokenLifecycle`](crate::usecase::lifecycle::TokenLifecycle); a policy supplies the
//! parts that differ between the 2FA code and the QR hash.

use chrono::Duration;
use sha2::{Digest, Sha256};

use tuapp_domain::id::PassengerId;

use crate::domain::repository::RandomSource;
use crate::domain::types::{
    ConsumeEffect, QR_HASH_LEN, QR_RANDOM_BYTES, QR_TTL_SECS, TWO_FACTOR_CODE_MAX,
    TWO_FACTOR_CODE_MIN, TWO_FACTOR_TTL_SECS, TokenKind,
};
use crate::error::TransitError;

pub trait TokenPolicy: Send + Sync {
    fn kind(&self) -> TokenKind;

    fn ttl(&self) -> Duration;

    fn generate_value<R: RandomSource>(&self, rng: &R) -> String;

    /// Error reported when the owner disappears between lookup and issuance.
    fn owner_missing(&self) -> TransitError;

    /// Side effect committed together with a successful consumption.
    fn on_consume(&self, owner_id: i64) -> ConsumeEffect;
}

/// Six-digit code mailed to a passenger.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoFactorPolicy {
    /// `None` never deletes a code on mismatch; it stays usable until its own expiry.
    pub max_failed_attempts: Option<u32>,
}

impl TokenPolicy for TwoFactorPolicy {
    fn kind(&self) -> TokenKind {
        TokenKind::TwoFactor
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(TWO_FACTOR_TTL_SECS)
    }

    fn generate_value<R: RandomSource>(&self, rng: &R) -> String {
        rng.numeric(TWO_FACTOR_CODE_MIN, TWO_FACTOR_CODE_MAX)
            .to_string()
    }

    fn owner_missing(&self) -> TransitError {
        TransitError::PassengerNotFound
    }

    fn on_consume(&self, owner_id: i64) -> ConsumeEffect {
        ConsumeEffect::ActivatePassengerSession(PassengerId(owner_id))
    }
}

/// Virtual-card hash rendered as a QR image.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrPolicy;

impl TokenPolicy for QrPolicy {
    fn kind(&self) -> TokenKind {
        TokenKind::Qr
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(QR_TTL_SECS)
    }

    /// Hex of [`QR_RANDOM_BYTES`] secure bytes followed by the SHA-256 hex of that
    /// string, capped at [`QR_HASH_LEN`] characters.
    fn generate_value<R: RandomSource>(&self, rng: &R) -> String {
        let head = hex::encode(rng.secure_bytes(QR_RANDOM_BYTES));
        let digest = hex::encode(Sha256::digest(head.as_bytes()));
        let mut value = head + &digest;
        value.truncate(QR_HASH_LEN);
        value
    }

    fn owner_missing(&self) -> TransitError {
        TransitError::CardNotFound
    }

    fn on_consume(&self, _owner_id: i64) -> ConsumeEffect {
        ConsumeEffect::None
    }
}
