use uuid::Uuid;

use tuapp_domain::id::{CardId, PassengerId};

use crate::domain::policy::{QrPolicy, TokenPolicy};
use crate::domain::repository::{CardRepository, Clock, QrRenderer, RandomSource, TokenStore};
use crate::domain::types::{CardHolder, VerificationToken};
use crate::error::TransitError;
use crate::usecase::lifecycle::TokenLifecycle;

// ── Issue ────────────────────────────────────────────────────────────────────

pub struct IssueVirtualCardInput {
    pub card_id: CardId,
    /// When set, the card must belong to this passenger. A foreign card reports
    /// `CardNotFound` so card ids cannot be enumerated.
    pub owner: Option<PassengerId>,
}

pub struct IssueVirtualCardUseCase<K, T, C, R>
where
    K: CardRepository,
    T: TokenStore,
    C: Clock,
    R: RandomSource,
{
    pub cards: K,
    pub tokens: T,
    pub clock: C,
    pub rng: R,
}

impl<K, T, C, R> IssueVirtualCardUseCase<K, T, C, R>
where
    K: CardRepository,
    T: TokenStore,
    C: Clock,
    R: RandomSource,
{
    /// Replace the card's virtual card with a fresh QR hash.
    pub async fn execute(
        &self,
        input: IssueVirtualCardInput,
    ) -> Result<VerificationToken, TransitError> {
        let card = self
            .cards
            .find_by_id(input.card_id)
            .await?
            .ok_or(TransitError::CardNotFound)?;

        if input.owner.is_some_and(|owner| owner != card.passenger_id) {
            return Err(TransitError::CardNotFound);
        }
        if !card.status.is_active() {
            return Err(TransitError::CardNotActive {
                status: card.status,
            });
        }

        TokenLifecycle {
            policy: &QrPolicy,
            store: &self.tokens,
            clock: &self.clock,
        }
        .issue(card.id.0, &self.rng)
        .await
    }
}

// ── Verify ───────────────────────────────────────────────────────────────────

pub struct VerifyVirtualCardUseCase<T, C>
where
    T: TokenStore,
    C: Clock,
{
    pub tokens: T,
    pub clock: C,
}

impl<T, C> VerifyVirtualCardUseCase<T, C>
where
    T: TokenStore,
    C: Clock,
{
    /// Validate and consume a presented QR hash.
    ///
    /// An inactive card fails with `CardNotActive` and leaves the hash stored.
    pub async fn execute(&self, value: &str) -> Result<CardHolder, TransitError> {
        let lookup = self
            .tokens
            .find_qr_holder(value)
            .await?
            .ok_or(TransitError::VirtualCardNotFound)?;

        let lifecycle = TokenLifecycle {
            policy: &QrPolicy,
            store: &self.tokens,
            clock: &self.clock,
        };
        lifecycle.ensure_live(&lookup.token).await?;

        if !lookup.holder.card_status.is_active() {
            return Err(TransitError::CardNotActive {
                status: lookup.holder.card_status,
            });
        }

        if !lifecycle.consume(&lookup.token).await? {
            return Err(TransitError::VirtualCardNotFound);
        }
        Ok(lookup.holder)
    }
}

// ── Render ───────────────────────────────────────────────────────────────────

pub struct RenderVirtualCardInput {
    pub token_id: Uuid,
    /// Same ownership filter as [`IssueVirtualCardInput::owner`].
    pub owner: Option<PassengerId>,
}

#[derive(Debug)]
pub struct RenderedVirtualCard {
    pub content_type: &'static str,
    pub image: Vec<u8>,
}

pub struct RenderVirtualCardUseCase<K, T, C, Q>
where
    K: CardRepository,
    T: TokenStore,
    C: Clock,
    Q: QrRenderer,
{
    pub cards: K,
    pub tokens: T,
    pub clock: C,
    pub renderer: Q,
}

impl<K, T, C, Q> RenderVirtualCardUseCase<K, T, C, Q>
where
    K: CardRepository,
    T: TokenStore,
    C: Clock,
    Q: QrRenderer,
{
    /// Render a live QR hash. Rendering never consumes the hash.
    pub async fn execute(
        &self,
        input: RenderVirtualCardInput,
    ) -> Result<RenderedVirtualCard, TransitError> {
        let policy = QrPolicy;
        let token = self
            .tokens
            .find_by_id(input.token_id)
            .await?
            .filter(|t| t.kind == policy.kind())
            .ok_or(TransitError::VirtualCardNotFound)?;

        if let Some(owner) = input.owner {
            let card = self.cards.find_by_id(CardId(token.owner_id)).await?;
            if card.is_none_or(|c| c.passenger_id != owner) {
                return Err(TransitError::VirtualCardNotFound);
            }
        }

        TokenLifecycle {
            policy: &policy,
            store: &self.tokens,
            clock: &self.clock,
        }
        .ensure_live(&token)
        .await?;

        let image = self.renderer.render(&token.value)?;
        Ok(RenderedVirtualCard {
            content_type: self.renderer.content_type(),
            image,
        })
    }
}
