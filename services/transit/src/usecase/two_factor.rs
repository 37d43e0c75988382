use tracing::{info, warn};

use tuapp_auth_types::token::Subject;

use crate::domain::policy::{TokenPolicy, TwoFactorPolicy};
use crate::domain::repository::{Clock, Notifier, PassengerRepository, RandomSource, TokenStore};
use crate::domain::types::VerificationToken;
use crate::error::TransitError;
use crate::usecase::lifecycle::TokenLifecycle;
use crate::usecase::session::{SessionGrant, SessionGrantor};

// ── Request a code ───────────────────────────────────────────────────────────

pub struct RequestTwoFactorInput {
    pub document: String,
}

pub struct RequestTwoFactorUseCase<P, T, N, C, R>
where
    P: PassengerRepository,
    T: TokenStore,
    N: Notifier,
    C: Clock,
    R: RandomSource,
{
    pub passengers: P,
    pub tokens: T,
    pub notifier: N,
    pub clock: C,
    pub rng: R,
    pub policy: TwoFactorPolicy,
}

impl<P, T, N, C, R> RequestTwoFactorUseCase<P, T, N, C, R>
where
    P: PassengerRepository,
    T: TokenStore,
    N: Notifier,
    C: Clock,
    R: RandomSource,
{
    /// Issue a fresh code and mail it.
    ///
    /// The code is committed before delivery is attempted. A delivery failure is
    /// returned as `Delivery` while the issued code stays live.
    pub async fn execute(
        &self,
        input: RequestTwoFactorInput,
    ) -> Result<VerificationToken, TransitError> {
        let passenger = self
            .passengers
            .find_by_document(&input.document)
            .await?
            .ok_or(TransitError::PassengerNotFound)?;

        let lifecycle = TokenLifecycle {
            policy: &self.policy,
            store: &self.tokens,
            clock: &self.clock,
        };
        let token = lifecycle.issue(passenger.id.0, &self.rng).await?;

        if let Err(e) = self
            .notifier
            .send_two_factor_code(&passenger.email, &passenger.display_name(), &token.value)
            .await
        {
            warn!(
                error = %e,
                passenger_id = %passenger.id,
                token_id = %token.id,
                "2FA code issued but not delivered"
            );
            return Err(e.into());
        }
        Ok(token)
    }
}

// ── Verify a code ────────────────────────────────────────────────────────────

pub struct VerifyTwoFactorInput {
    pub document: String,
    pub code: String,
}

pub struct VerifyTwoFactorUseCase<P, T, C>
where
    P: PassengerRepository,
    T: TokenStore,
    C: Clock,
{
    pub passengers: P,
    pub tokens: T,
    pub clock: C,
    pub policy: TwoFactorPolicy,
    pub sessions: SessionGrantor,
}

impl<P, T, C> VerifyTwoFactorUseCase<P, T, C>
where
    P: PassengerRepository,
    T: TokenStore,
    C: Clock,
{
    /// Unknown document, missing code and wrong code all report `InvalidCode`.
    pub async fn execute(&self, input: VerifyTwoFactorInput) -> Result<SessionGrant, TransitError> {
        let passenger = self
            .passengers
            .find_by_document(&input.document)
            .await?
            .ok_or(TransitError::InvalidCode)?;

        let token = self
            .tokens
            .latest_for_owner(self.policy.kind(), passenger.id.0)
            .await?
            .ok_or(TransitError::InvalidCode)?;

        let lifecycle = TokenLifecycle {
            policy: &self.policy,
            store: &self.tokens,
            clock: &self.clock,
        };
        lifecycle.ensure_live(&token).await?;

        if token.value != input.code {
            self.register_mismatch(&token).await?;
            return Err(TransitError::InvalidCode);
        }

        if !lifecycle.consume(&token).await? {
            return Err(TransitError::InvalidCode);
        }

        self.sessions
            .grant(&Subject::Passenger(passenger.id), self.clock.now())
    }

    async fn register_mismatch(&self, token: &VerificationToken) -> Result<(), TransitError> {
        let Some(max) = self.policy.max_failed_attempts else {
            return Ok(());
        };
        let Some(attempts) = self.tokens.record_failed_attempt(token.id).await? else {
            return Ok(());
        };
        if attempts >= max {
            self.tokens.delete(token.id).await?;
            info!(
                owner_id = token.owner_id,
                token_id = %token.id,
                attempts,
                "2FA code discarded after too many failed attempts"
            );
        }
        Ok(())
    }
}
