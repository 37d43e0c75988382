use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::policy::TokenPolicy;
use crate::domain::repository::{Clock, RandomSource, TokenStore};
use crate::domain::types::{ConsumeOutcome, ReplaceOutcome, VerificationToken};
use crate::error::TransitError;

/// Issue / expire / consume sequence shared by every token kind.
pub struct TokenLifecycle<'a, P, S, C>
where
    P: TokenPolicy,
    S: TokenStore,
    C: Clock,
{
    pub policy: &'a P,
    pub store: &'a S,
    pub clock: &'a C,
}

impl<P, S, C> TokenLifecycle<'_, P, S, C>
where
    P: TokenPolicy,
    S: TokenStore,
    C: Clock,
{
    /// Supersede every stored token of this kind for `owner_id` with a fresh one.
    pub async fn issue<R: RandomSource>(
        &self,
        owner_id: i64,
        rng: &R,
    ) -> Result<VerificationToken, TransitError> {
        let now = self.clock.now();
        let token = VerificationToken {
            id: Uuid::new_v4(),
            kind: self.policy.kind(),
            owner_id,
            value: self.policy.generate_value(rng),
            failed_attempts: 0,
            created_at: now,
            expires_at: now + self.policy.ttl(),
        };

        match self.store.replace(&token).await? {
            ReplaceOutcome::Stored => {}
            ReplaceOutcome::OwnerMissing => return Err(self.policy.owner_missing()),
            ReplaceOutcome::OwnerInactive(status) => {
                return Err(TransitError::CardNotActive { status });
            }
        }

        info!(
            kind = %token.kind,
            owner_id,
            token_id = %token.id,
            expires_at = %token.expires_at,
            "verification token issued"
        );
        Ok(token)
    }

    /// Lazy expiry: an expired token is deleted on the read that notices it.
    pub async fn ensure_live(&self, token: &VerificationToken) -> Result<(), TransitError> {
        if !token.is_expired_at(self.clock.now()) {
            return Ok(());
        }
        self.store.delete(token.id).await?;
        info!(
            kind = %token.kind,
            owner_id = token.owner_id,
            token_id = %token.id,
            "expired verification token removed"
        );
        Err(TransitError::TokenExpired)
    }

    /// Single-use consumption. `Ok(false)` when a concurrent request consumed or
    /// superseded the token first.
    ///
    /// A QR token whose card is no longer active fails with `CardNotActive` and stays
    /// stored. The status is the one read under the owner lock, not the caller's snapshot.
    pub async fn consume(&self, token: &VerificationToken) -> Result<bool, TransitError> {
        let effect = self.policy.on_consume(token.owner_id);
        match self.store.consume(token, effect).await? {
            ConsumeOutcome::Consumed => {
                info!(
                    kind = %token.kind,
                    owner_id = token.owner_id,
                    token_id = %token.id,
                    "verification token consumed"
                );
                Ok(true)
            }
            ConsumeOutcome::AlreadyGone => {
                warn!(
                    kind = %token.kind,
                    owner_id = token.owner_id,
                    token_id = %token.id,
                    "verification token already consumed by a concurrent request"
                );
                Ok(false)
            }
            ConsumeOutcome::OwnerInactive(status) => {
                info!(
                    kind = %token.kind,
                    owner_id = token.owner_id,
                    token_id = %token.id,
                    %status,
                    "card went inactive before the token was consumed"
                );
                Err(TransitError::CardNotActive { status })
            }
        }
    }
}
