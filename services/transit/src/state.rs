use sea_orm::DatabaseConnection;

use crate::domain::policy::TwoFactorPolicy;
use crate::infra::db::{DbAdminUserRepository, DbCardRepository, DbPassengerRepository, DbTokenStore};
use crate::infra::mail::MailNotifier;
use crate::infra::qr::SvgQrRenderer;
use crate::usecase::session::SessionGrantor;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub access_token_ttl_secs: u64,
    pub two_factor_max_attempts: Option<u32>,
    pub notifier: MailNotifier,
}

impl AppState {
    pub fn passenger_repo(&self) -> DbPassengerRepository {
        DbPassengerRepository {
            db: self.db.clone(),
        }
    }

    pub fn card_repo(&self) -> DbCardRepository {
        DbCardRepository {
            db: self.db.clone(),
        }
    }

    pub fn token_store(&self) -> DbTokenStore {
        DbTokenStore {
            db: self.db.clone(),
        }
    }

    pub fn admin_repo(&self) -> DbAdminUserRepository {
        DbAdminUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn renderer(&self) -> SvgQrRenderer {
        SvgQrRenderer
    }

    pub fn sessions(&self) -> SessionGrantor {
        SessionGrantor {
            secret: self.jwt_secret.clone(),
            ttl_secs: self.access_token_ttl_secs,
        }
    }

    pub fn two_factor_policy(&self) -> TwoFactorPolicy {
        TwoFactorPolicy {
            max_failed_attempts: self.two_factor_max_attempts,
        }
    }
}
