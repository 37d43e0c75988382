use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use tuapp_domain::card::{CardProfile, CardStatus};
use tuapp_domain::id::{CardId, PassengerId};

/// Registered passenger (card holder).
#[derive(Debug, Clone, Serialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub name: String,
    pub surname_1: String,
    pub surname_2: Option<String>,
    pub document: String,
    pub email: String,
    /// Flipped on after a successful 2FA verification.
    pub session_active: bool,
}

impl Passenger {
    /// Name used in outgoing mail greetings.
    pub fn display_name(&self) -> String {
        match &self.surname_2 {
            Some(s2) => format!("{} {} {}", self.name, self.surname_1, s2),
            None => format!("{} {}", self.name, self.surname_1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPassenger {
    pub name: String,
    pub surname_1: String,
    pub surname_2: Option<String>,
    pub document: String,
    pub email: String,
}

/// Partial passenger update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PassengerChanges {
    pub name: Option<String>,
    pub surname_1: Option<String>,
    pub surname_2: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub session_active: Option<bool>,
}

impl PassengerChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname_1.is_none()
            && self.surname_2.is_none()
            && self.document.is_none()
            && self.email.is_none()
            && self.session_active.is_none()
    }
}

/// Physical transit card.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub id: CardId,
    pub passenger_id: PassengerId,
    pub code: String,
    pub profile: CardProfile,
    pub balance_cents: i64,
    pub status: CardStatus,
}

#[derive(Debug, Clone)]
pub struct NewCard {
    pub passenger_id: PassengerId,
    pub code: String,
    pub profile: CardProfile,
    pub balance_cents: i64,
    pub status: CardStatus,
}

/// Partial card update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct CardChanges {
    pub balance_cents: Option<i64>,
    pub status: Option<CardStatus>,
}

impl CardChanges {
    pub fn is_empty(&self) -> bool {
        self.balance_cents.is_none() && self.status.is_none()
    }
}

/// Card + owning passenger, captured in the same read as a QR token lookup.
#[derive(Debug, Clone, Serialize)]
pub struct CardHolder {
    pub card_id: CardId,
    pub card_code: String,
    pub profile: CardProfile,
    pub balance_cents: i64,
    pub card_status: CardStatus,
    pub passenger_id: PassengerId,
    pub name: String,
    pub surname_1: String,
    pub surname_2: Option<String>,
    pub document: String,
    pub email: String,
}

/// Administrative account.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial admin update. The password arrives here already hashed.
#[derive(Debug, Clone, Default)]
pub struct AdminChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub disabled: Option<bool>,
}

impl AdminChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.disabled.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Numeric code mailed to a passenger. Owner is a passenger id.
    TwoFactor,
    /// Virtual-card hash. Owner is a card id.
    Qr,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoFactor => "two_factor",
            Self::Qr => "qr",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "two_factor" => Some(Self::TwoFactor),
            "qr" => Some(Self::Qr),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-boxed, single-use secret bound to one owner.
#[derive(Debug, Clone)]
pub struct VerificationToken {
    pub id: Uuid,
    pub kind: TokenKind,
    pub owner_id: i64,
    pub value: String,
    pub failed_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    /// A token is still usable at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Side effect committed together with a successful consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeEffect {
    None,
    ActivatePassengerSession(PassengerId),
}

/// Outcome of storing a freshly issued token under the owner's row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Stored,
    OwnerMissing,
    /// The owning card was no longer active once locked. Nothing was written.
    OwnerInactive(CardStatus),
}

/// Outcome of a consumption attempt under the owner's row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Consumed,
    /// Consumed, superseded or deleted by someone else first.
    AlreadyGone,
    /// The owning card is no longer active. The token is left in place.
    OwnerInactive(CardStatus),
}

/// Result of looking a QR token up by its value.
#[derive(Debug, Clone)]
pub struct QrLookup {
    pub token: VerificationToken,
    pub holder: CardHolder,
}

/// 2FA code time-to-live in seconds.
pub const TWO_FACTOR_TTL_SECS: i64 = 300;

/// QR hash time-to-live in seconds.
pub const QR_TTL_SECS: i64 = 60;

/// Inclusive range of 2FA codes (always six digits).
pub const TWO_FACTOR_CODE_MIN: u32 = 100_000;
pub const TWO_FACTOR_CODE_MAX: u32 = 999_999;

/// Random bytes hex-encoded into the head of a QR hash.
pub const QR_RANDOM_BYTES: usize = 128;

/// Stored QR hash length cap.
pub const QR_HASH_LEN: usize = 255;

/// Draws allowed before card-code generation gives up.
pub const MAX_CARD_CODE_ATTEMPTS: usize = 10;

/// Upper bound of the numeric part of a card code.
pub const CARD_CODE_MAX: u32 = 999_999;
