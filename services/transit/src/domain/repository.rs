#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tuapp_domain::id::{CardId, PassengerId};
use tuapp_domain::pagination::PageRequest;

use crate::domain::types::{
    AdminChanges, AdminUser, Card, CardChanges, ConsumeEffect, ConsumeOutcome, NewCard,
    NewPassenger, Passenger, PassengerChanges, QrLookup, ReplaceOutcome, TokenKind,
    VerificationToken,
};
use crate::error::{DeliveryError, TransitError};

pub trait PassengerRepository: Send + Sync {
    async fn find_by_id(&self, id: PassengerId) -> Result<Option<Passenger>, TransitError>;

    async fn find_by_document(&self, document: &str) -> Result<Option<Passenger>, TransitError>;

    /// Fails with `DuplicatePassenger` if the document or email is taken.
    async fn create(&self, passenger: &NewPassenger) -> Result<Passenger, TransitError>;

    async fn list(&self, page: PageRequest) -> Result<Vec<Passenger>, TransitError>;

    /// Fails with `PassengerNotFound` or `DuplicatePassenger`.
    async fn update(
        &self,
        id: PassengerId,
        changes: &PassengerChanges,
    ) -> Result<Passenger, TransitError>;

    /// Removes the passenger and any pending 2FA code. Returns whether a row was removed.
    ///
    /// Fails with `PassengerHasCards` while any card still references the passenger.
    async fn delete(&self, id: PassengerId) -> Result<bool, TransitError>;
}

pub trait CardRepository: Send + Sync {
    async fn find_by_id(&self, id: CardId) -> Result<Option<Card>, TransitError>;

    /// Whether any stored card already carries `code`.
    async fn code_exists(&self, code: &str) -> Result<bool, TransitError>;

    /// Fails with `DuplicateCardCode` if the code was taken after the uniqueness check.
    async fn create(&self, card: &NewCard) -> Result<Card, TransitError>;

    async fn list(&self, page: PageRequest) -> Result<Vec<Card>, TransitError>;

    async fn list_by_passenger(
        &self,
        passenger_id: PassengerId,
        page: PageRequest,
    ) -> Result<Vec<Card>, TransitError>;

    async fn update(&self, id: CardId, changes: &CardChanges) -> Result<Card, TransitError>;
}

/// Transactional persistence for verification tokens.
///
/// Every method is atomic on its own; the lifecycle sequences (supersede on issue,
/// single-use on consume) are expressed as single calls so they commit or roll back
/// as a unit.
pub trait TokenStore: Send + Sync {
    /// Lock the owner, delete its tokens of `token.kind`, insert `token`.
    ///
    /// Nothing is stored unless the locked owner exists and, for a card, is active.
    async fn replace(&self, token: &VerificationToken) -> Result<ReplaceOutcome, TransitError>;

    /// Most recently created token of `kind` for `owner_id`, expired or not.
    async fn latest_for_owner(
        &self,
        kind: TokenKind,
        owner_id: i64,
    ) -> Result<Option<VerificationToken>, TransitError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VerificationToken>, TransitError>;

    /// QR token by value, joined with its card and the card's passenger in one read.
    async fn find_qr_holder(&self, value: &str) -> Result<Option<QrLookup>, TransitError>;

    /// Unconditional delete. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, TransitError>;

    /// Lock the owner, then delete `token` if it is still stored and apply `effect` in
    /// the same transaction.
    ///
    /// The effect is applied only on `Consumed`. A card that went inactive keeps its token.
    async fn consume(
        &self,
        token: &VerificationToken,
        effect: ConsumeEffect,
    ) -> Result<ConsumeOutcome, TransitError>;

    /// Increment the failed-attempt counter. `None` if the token is gone.
    async fn record_failed_attempt(&self, id: Uuid) -> Result<Option<u32>, TransitError>;
}

pub trait AdminUserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>, TransitError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, TransitError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, TransitError>;

    /// Fails with `DuplicateAdmin` if the username or email is taken.
    async fn create(&self, user: &AdminUser) -> Result<(), TransitError>;

    async fn list(&self, page: PageRequest) -> Result<Vec<AdminUser>, TransitError>;

    /// Fails with `AdminNotFound` or `DuplicateAdmin`.
    async fn update(&self, id: Uuid, changes: &AdminChanges) -> Result<AdminUser, TransitError>;

    async fn delete(&self, id: Uuid) -> Result<bool, TransitError>;
}

/// Outbound channel for 2FA codes.
pub trait Notifier: Send + Sync {
    async fn send_two_factor_code(
        &self,
        to: &str,
        display_name: &str,
        code: &str,
    ) -> Result<(), DeliveryError>;
}

/// Encodes an opaque payload as a scannable image.
pub trait QrRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn render(&self, payload: &str) -> Result<Vec<u8>, TransitError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomSource: Send + Sync {
    /// Uniform integer in `low..=high`. Need not be cryptographically secure.
    fn numeric(&self, low: u32, high: u32) -> u32;

    /// `len` bytes from a cryptographically secure generator.
    fn secure_bytes(&self, len: usize) -> Vec<u8>;
}
