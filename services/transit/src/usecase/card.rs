use tracing::debug;

use tuapp_domain::card::{CardProfile, CardStatus};
use tuapp_domain::id::{CardId, PassengerId};
use tuapp_domain::pagination::PageRequest;

use crate::domain::repository::{CardRepository, PassengerRepository, RandomSource};
use crate::domain::types::{CARD_CODE_MAX, Card, CardChanges, MAX_CARD_CODE_ATTEMPTS, NewCard};
use crate::error::TransitError;

/// Draw `{prefix}{nnnnnn}` codes until one is not stored yet.
///
/// Gives up with `CardCodeExhausted` after [`MAX_CARD_CODE_ATTEMPTS`] collisions.
pub async fn generate_unique_card_code<K, R>(
    profile: CardProfile,
    cards: &K,
    rng: &R,
) -> Result<String, TransitError>
where
    K: CardRepository,
    R: RandomSource,
{
    for attempt in 1..=MAX_CARD_CODE_ATTEMPTS {
        let code = format!("{}{:06}", profile.code_prefix(), rng.numeric(1, CARD_CODE_MAX));
        if !cards.code_exists(&code).await? {
            return Ok(code);
        }
        debug!(attempt, profile = profile.as_str(), "card code collision");
    }
    Err(TransitError::CardCodeExhausted)
}

// ── Create ───────────────────────────────────────────────────────────────────

pub struct CreateCardInput {
    pub passenger_id: PassengerId,
    pub profile: CardProfile,
    pub balance_cents: i64,
    pub status: CardStatus,
}

pub struct CreateCardUseCase<P, K, R>
where
    P: PassengerRepository,
    K: CardRepository,
    R: RandomSource,
{
    pub passengers: P,
    pub cards: K,
    pub rng: R,
}

impl<P, K, R> CreateCardUseCase<P, K, R>
where
    P: PassengerRepository,
    K: CardRepository,
    R: RandomSource,
{
    pub async fn execute(&self, input: CreateCardInput) -> Result<Card, TransitError> {
        if input.balance_cents < 0 {
            return Err(TransitError::InvalidBalance);
        }
        self.passengers
            .find_by_id(input.passenger_id)
            .await?
            .ok_or(TransitError::PassengerNotFound)?;

        let code = generate_unique_card_code(input.profile, &self.cards, &self.rng).await?;
        self.cards
            .create(&NewCard {
                passenger_id: input.passenger_id,
                code,
                profile: input.profile,
                balance_cents: input.balance_cents,
                status: input.status,
            })
            .await
    }
}

// ── Read ─────────────────────────────────────────────────────────────────────

pub struct GetCardUseCase<K: CardRepository> {
    pub cards: K,
}

impl<K: CardRepository> GetCardUseCase<K> {
    /// `owner` restricts the lookup to that passenger's cards.
    pub async fn execute(
        &self,
        card_id: CardId,
        owner: Option<PassengerId>,
    ) -> Result<Card, TransitError> {
        self.cards
            .find_by_id(card_id)
            .await?
            .filter(|card| owner.is_none_or(|o| o == card.passenger_id))
            .ok_or(TransitError::CardNotFound)
    }
}

pub struct ListCardsUseCase<K: CardRepository> {
    pub cards: K,
}

impl<K: CardRepository> ListCardsUseCase<K> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<Card>, TransitError> {
        self.cards.list(page.clamped()).await
    }
}

pub struct ListPassengerCardsUseCase<P, K>
where
    P: PassengerRepository,
    K: CardRepository,
{
    pub passengers: P,
    pub cards: K,
}

impl<P, K> ListPassengerCardsUseCase<P, K>
where
    P: PassengerRepository,
    K: CardRepository,
{
    pub async fn execute(
        &self,
        passenger_id: PassengerId,
        page: PageRequest,
    ) -> Result<Vec<Card>, TransitError> {
        self.passengers
            .find_by_id(passenger_id)
            .await?
            .ok_or(TransitError::PassengerNotFound)?;
        self.cards
            .list_by_passenger(passenger_id, page.clamped())
            .await
    }
}

// ── Update ───────────────────────────────────────────────────────────────────

pub struct UpdateCardUseCase<K: CardRepository> {
    pub cards: K,
}

impl<K: CardRepository> UpdateCardUseCase<K> {
    pub async fn execute(&self, card_id: CardId, changes: CardChanges) -> Result<Card, TransitError> {
        let card = self
            .cards
            .find_by_id(card_id)
            .await?
            .ok_or(TransitError::CardNotFound)?;

        if card.status.is_locked() {
            return Err(TransitError::CardLocked {
                status: card.status,
            });
        }
        if changes.balance_cents.is_some_and(|b| b < 0) {
            return Err(TransitError::InvalidBalance);
        }
        if changes.is_empty() {
            return Err(TransitError::NoChanges);
        }

        self.cards.update(card_id, &changes).await
    }
}
