use std::time::Duration;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Database, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tokio::sync::OnceCell;
use uuid::Uuid;

use tuapp_domain::card::{CardProfile, CardStatus};
use tuapp_domain::id::{CardId, PassengerId};
use tuapp_transit::domain::repository::PassengerRepository;
use tuapp_transit::domain::types::{Card, NewPassenger, Passenger, TokenKind};
use tuapp_transit::infra::db::{
    DbAdminUserRepository, DbCardRepository, DbPassengerRepository, DbTokenStore,
};
use tuapp_transit::infra::mail::{LogNotifier, MailNotifier};
use tuapp_transit::infra::system::ThreadRandom;
use tuapp_transit::usecase::card::{CreateCardInput, CreateCardUseCase};
use tuapp_transit::usecase::session::SessionGrantor;
use tuapp_transit_migration::Migrator;
use tuapp_transit_schema::{cards, verification_tokens};

pub const DATABASE_URL_VAR: &str = "TEST_DATABASE_URL";

/// How long a test holds a row lock so a racing request is parked on it.
pub const LOCK_HOLD: Duration = Duration::from_millis(300);

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Fresh connection to the test database, migrated once per run. `None` when
/// `TEST_DATABASE_URL` is unset.
pub async fn connect() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        eprintln!("{DATABASE_URL_VAR} not set, skipping");
        return None;
    };
    let db = Database::connect(&url)
        .await
        .expect("connect to test database");
    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("run migrations");
        })
        .await;
    Some(db)
}

pub fn passengers(db: &DatabaseConnection) -> DbPassengerRepository {
    DbPassengerRepository { db: db.clone() }
}

pub fn cards(db: &DatabaseConnection) -> DbCardRepository {
    DbCardRepository { db: db.clone() }
}

pub fn store(db: &DatabaseConnection) -> DbTokenStore {
    DbTokenStore { db: db.clone() }
}

pub fn admins(db: &DatabaseConnection) -> DbAdminUserRepository {
    DbAdminUserRepository { db: db.clone() }
}

pub fn log_notifier() -> MailNotifier {
    MailNotifier::Log(LogNotifier)
}

pub fn sessions() -> SessionGrantor {
    SessionGrantor {
        secret: "postgres-test-secret".to_owned(),
        ttl_secs: 1800,
    }
}

pub fn unique_tag() -> String {
    Uuid::new_v4().simple().to_string()
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub async fn seed_passenger(db: &DatabaseConnection) -> Passenger {
    let tag = unique_tag();
    passengers(db)
        .create(&NewPassenger {
            name: "Joan".to_owned(),
            surname_1: "Garcia".to_owned(),
            surname_2: None,
            document: format!("DOC-{tag}"),
            email: format!("joan.{tag}@example.com"),
        })
        .await
        .unwrap()
}

pub async fn seed_card(db: &DatabaseConnection, passenger_id: PassengerId, status: CardStatus) -> Card {
    CreateCardUseCase {
        passengers: passengers(db),
        cards: cards(db),
        rng: ThreadRandom,
    }
    .execute(CreateCardInput {
        passenger_id,
        profile: CardProfile::General,
        balance_cents: 1250,
        status,
    })
    .await
    .unwrap()
}

/// Stored tokens of `kind` for `owner_id`, read straight from the table.
pub async fn stored_tokens(
    db: &DatabaseConnection,
    kind: TokenKind,
    owner_id: i64,
) -> Vec<verification_tokens::Model> {
    verification_tokens::Entity::find()
        .filter(verification_tokens::Column::Kind.eq(kind.as_str()))
        .filter(verification_tokens::Column::OwnerId.eq(owner_id))
        .all(db)
        .await
        .unwrap()
}

/// Lock the card row and change its status inside an open transaction.
///
/// Requests that lock the card block until the returned transaction ends, then see
/// the new status. Plain reads keep seeing the old one until commit.
pub async fn hold_card_with_status(
    db: &DatabaseConnection,
    card_id: CardId,
    status: CardStatus,
) -> DatabaseTransaction {
    let txn = db.begin().await.unwrap();
    cards::Entity::find_by_id(card_id.0)
        .lock_exclusive()
        .one(&txn)
        .await
        .unwrap()
        .expect("card to hold");
    cards::Entity::update_many()
        .col_expr(cards::Column::Status, Expr::value(status.as_str()))
        .filter(cards::Column::Id.eq(card_id.0))
        .exec(&txn)
        .await
        .unwrap();
    txn
}
