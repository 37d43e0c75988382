use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, Statement, TransactionError, TransactionTrait,
};
use uuid::Uuid;

use tuapp_domain::card::{CardProfile, CardStatus};
use tuapp_domain::id::{CardId, PassengerId};
use tuapp_domain::pagination::PageRequest;
use tuapp_transit_schema::{admin_users, cards, passengers, verification_tokens};

use crate::domain::repository::{
    AdminUserRepository, CardRepository, PassengerRepository, TokenStore,
};
use crate::domain::types::{
    AdminChanges, AdminUser, Card, CardChanges, CardHolder, ConsumeEffect, ConsumeOutcome,
    NewCard, NewPassenger, Passenger, PassengerChanges, QrLookup, ReplaceOutcome, TokenKind,
    VerificationToken,
};
use crate::error::TransitError;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

// ── Passenger repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPassengerRepository {
    pub db: DatabaseConnection,
}

impl PassengerRepository for DbPassengerRepository {
    async fn find_by_id(&self, id: PassengerId) -> Result<Option<Passenger>, TransitError> {
        let model = passengers::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find passenger by id")?;
        Ok(model.map(passenger_from_model))
    }

    async fn find_by_document(&self, document: &str) -> Result<Option<Passenger>, TransitError> {
        let model = passengers::Entity::find()
            .filter(passengers::Column::Document.eq(document))
            .one(&self.db)
            .await
            .context("find passenger by document")?;
        Ok(model.map(passenger_from_model))
    }

    async fn create(&self, passenger: &NewPassenger) -> Result<Passenger, TransitError> {
        let model = passengers::ActiveModel {
            name: Set(passenger.name.clone()),
            surname_1: Set(passenger.surname_1.clone()),
            surname_2: Set(passenger.surname_2.clone()),
            document: Set(passenger.document.clone()),
            email: Set(passenger.email.clone()),
            session_active: Set(false),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TransitError::DuplicatePassenger
            } else {
                anyhow::Error::new(e).context("create passenger").into()
            }
        })?;
        Ok(passenger_from_model(model))
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Passenger>, TransitError> {
        let models = passengers::Entity::find()
            .order_by_asc(passengers::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list passengers")?;
        Ok(models.into_iter().map(passenger_from_model).collect())
    }

    async fn update(
        &self,
        id: PassengerId,
        changes: &PassengerChanges,
    ) -> Result<Passenger, TransitError> {
        let mut am = passengers::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };
        if let Some(name) = &changes.name {
            am.name = Set(name.clone());
        }
        if let Some(surname_1) = &changes.surname_1 {
            am.surname_1 = Set(surname_1.clone());
        }
        if let Some(surname_2) = &changes.surname_2 {
            am.surname_2 = Set(Some(surname_2.clone()));
        }
        if let Some(document) = &changes.document {
            am.document = Set(document.clone());
        }
        if let Some(email) = &changes.email {
            am.email = Set(email.clone());
        }
        if let Some(active) = changes.session_active {
            am.session_active = Set(active);
        }
        let model = am.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => TransitError::PassengerNotFound,
            e if is_unique_violation(&e) => TransitError::DuplicatePassenger,
            e => anyhow::Error::new(e).context("update passenger").into(),
        })?;
        Ok(passenger_from_model(model))
    }

    async fn delete(&self, id: PassengerId) -> Result<bool, TransitError> {
        let deleted = self
            .db
            .transaction::<_, bool, DbErr>(move |txn| {
                Box::pin(async move {
                    // Held until commit so no 2FA code can be issued for a passenger
                    // that is about to disappear.
                    let lock = lock_owner(txn, TokenKind::TwoFactor, id.0).await?;
                    if let OwnerLock::Missing = lock {
                        return Ok(false);
                    }
                    let kind = TokenKind::TwoFactor.as_str();
                    verification_tokens::Entity::delete_many()
                        .filter(verification_tokens::Column::Kind.eq(kind))
                        .filter(verification_tokens::Column::OwnerId.eq(id.0))
                        .exec(txn)
                        .await?;
                    let result = passengers::Entity::delete_by_id(id.0).exec(txn).await?;
                    Ok(result.rows_affected > 0)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Transaction(e) if is_foreign_key_violation(&e) => {
                    TransitError::PassengerHasCards
                }
                e => anyhow::Error::new(e).context("delete passenger").into(),
            })?;
        Ok(deleted)
    }
}

fn passenger_from_model(model: passengers::Model) -> Passenger {
    Passenger {
        id: PassengerId(model.id),
        name: model.name,
        surname_1: model.surname_1,
        surname_2: model.surname_2,
        document: model.document,
        email: model.email,
        session_active: model.session_active,
    }
}

// ── Card repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCardRepository {
    pub db: DatabaseConnection,
}

impl CardRepository for DbCardRepository {
    async fn find_by_id(&self, id: CardId) -> Result<Option<Card>, TransitError> {
        let model = cards::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find card by id")?;
        Ok(model.map(card_from_model).transpose()?)
    }

    async fn code_exists(&self, code: &str) -> Result<bool, TransitError> {
        let found = cards::Entity::find()
            .select_only()
            .column(cards::Column::Id)
            .filter(cards::Column::Code.eq(code))
            .into_tuple::<i64>()
            .one(&self.db)
            .await
            .context("check card code")?;
        Ok(found.is_some())
    }

    async fn create(&self, card: &NewCard) -> Result<Card, TransitError> {
        let model = cards::ActiveModel {
            passenger_id: Set(card.passenger_id.0),
            code: Set(card.code.clone()),
            profile: Set(card.profile.as_str().to_owned()),
            balance_cents: Set(card.balance_cents),
            status: Set(card.status.as_str().to_owned()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TransitError::DuplicateCardCode
            } else {
                anyhow::Error::new(e).context("create card").into()
            }
        })?;
        Ok(card_from_model(model)?)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Card>, TransitError> {
        let models = cards::Entity::find()
            .order_by_asc(cards::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list cards")?;
        let cards = models
            .into_iter()
            .map(card_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(cards)
    }

    async fn list_by_passenger(
        &self,
        passenger_id: PassengerId,
        page: PageRequest,
    ) -> Result<Vec<Card>, TransitError> {
        let models = cards::Entity::find()
            .filter(cards::Column::PassengerId.eq(passenger_id.0))
            .order_by_asc(cards::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list cards by passenger")?;
        let cards = models
            .into_iter()
            .map(card_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(cards)
    }

    async fn update(&self, id: CardId, changes: &CardChanges) -> Result<Card, TransitError> {
        let mut am = cards::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };
        if let Some(balance) = changes.balance_cents {
            am.balance_cents = Set(balance);
        }
        if let Some(status) = changes.status {
            am.status = Set(status.as_str().to_owned());
        }
        let model = am.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => TransitError::CardNotFound,
            e => anyhow::Error::new(e).context("update card").into(),
        })?;
        Ok(card_from_model(model)?)
    }
}

fn card_from_model(model: cards::Model) -> anyhow::Result<Card> {
    Ok(Card {
        id: CardId(model.id),
        passenger_id: PassengerId(model.passenger_id),
        profile: model
            .profile
            .parse::<CardProfile>()
            .context("stored card profile")?,
        status: model
            .status
            .parse::<CardStatus>()
            .context("stored card status")?,
        code: model.code,
        balance_cents: model.balance_cents,
    })
}

// ── Verification token store ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTokenStore {
    pub db: DatabaseConnection,
}

impl TokenStore for DbTokenStore {
    async fn replace(&self, token: &VerificationToken) -> Result<ReplaceOutcome, TransitError> {
        let outcome = self
            .db
            .transaction::<_, ReplaceOutcome, DbErr>(|txn| {
                let token = token.clone();
                Box::pin(async move {
                    // Concurrent issuers for the same owner serialize on this lock, so
                    // the delete below always sees the other issuer's committed row.
                    // The status read here is the latest committed one.
                    match lock_owner(txn, token.kind, token.owner_id).await? {
                        OwnerLock::Missing => return Ok(ReplaceOutcome::OwnerMissing),
                        OwnerLock::Inactive(status) => {
                            return Ok(ReplaceOutcome::OwnerInactive(status));
                        }
                        OwnerLock::Held => {}
                    }
                    verification_tokens::Entity::delete_many()
                        .filter(verification_tokens::Column::Kind.eq(token.kind.as_str()))
                        .filter(verification_tokens::Column::OwnerId.eq(token.owner_id))
                        .exec(txn)
                        .await?;
                    insert_token(txn, &token).await?;
                    Ok(ReplaceOutcome::Stored)
                })
            })
            .await
            .context("replace verification token")?;
        Ok(outcome)
    }

    async fn latest_for_owner(
        &self,
        kind: TokenKind,
        owner_id: i64,
    ) -> Result<Option<VerificationToken>, TransitError> {
        let model = verification_tokens::Entity::find()
            .filter(verification_tokens::Column::Kind.eq(kind.as_str()))
            .filter(verification_tokens::Column::OwnerId.eq(owner_id))
            .order_by_desc(verification_tokens::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find latest verification token")?;
        Ok(model.map(token_from_model).transpose()?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VerificationToken>, TransitError> {
        let model = verification_tokens::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find verification token by id")?;
        Ok(model.map(token_from_model).transpose()?)
    }

    async fn find_qr_holder(&self, value: &str) -> Result<Option<QrLookup>, TransitError> {
        #[derive(Debug, FromQueryResult)]
        struct QrHolderRow {
            id: Uuid,
            owner_id: i64,
            value: String,
            failed_attempts: i32,
            created_at: chrono::DateTime<chrono::Utc>,
            expires_at: chrono::DateTime<chrono::Utc>,
            card_code: String,
            profile: String,
            balance_cents: i64,
            card_status: String,
            passenger_id: i64,
            name: String,
            surname_1: String,
            surname_2: Option<String>,
            document: String,
            email: String,
        }

        let sql = r#"
            SELECT t.id, t.owner_id, t.value, t.failed_attempts, t.created_at, t.expires_at,
                   c.code AS card_code, c.profile, c.balance_cents, c.status AS card_status,
                   p.id AS passenger_id, p.name, p.surname_1, p.surname_2, p.document, p.email
            FROM verification_tokens t
            INNER JOIN cards c ON c.id = t.owner_id
            INNER JOIN passengers p ON p.id = c.passenger_id
            WHERE t.kind = $1 AND t.value = $2
        "#;

        let row = QrHolderRow::find_by_statement(Statement::from_sql_and_values(
            self.db.get_database_backend(),
            sql,
            [TokenKind::Qr.as_str().into(), value.into()],
        ))
        .one(&self.db)
        .await
        .context("find QR token holder")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let holder = CardHolder {
            card_id: CardId(row.owner_id),
            card_code: row.card_code,
            profile: row.profile.parse().context("stored card profile")?,
            balance_cents: row.balance_cents,
            card_status: row.card_status.parse().context("stored card status")?,
            passenger_id: PassengerId(row.passenger_id),
            name: row.name,
            surname_1: row.surname_1,
            surname_2: row.surname_2,
            document: row.document,
            email: row.email,
        };
        let token = VerificationToken {
            id: row.id,
            kind: TokenKind::Qr,
            owner_id: row.owner_id,
            value: row.value,
            failed_attempts: row.failed_attempts.max(0) as u32,
            created_at: row.created_at,
            expires_at: row.expires_at,
        };
        Ok(Some(QrLookup { token, holder }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, TransitError> {
        let result = verification_tokens::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete verification token")?;
        Ok(result.rows_affected > 0)
    }

    async fn consume(
        &self,
        token: &VerificationToken,
        effect: ConsumeEffect,
    ) -> Result<ConsumeOutcome, TransitError> {
        let token_id = token.id;
        let kind = token.kind;
        let owner_id = token.owner_id;
        let outcome = self
            .db
            .transaction::<_, ConsumeOutcome, DbErr>(move |txn| {
                Box::pin(async move {
                    // Owner before token, the same order `replace` takes.
                    match lock_owner(txn, kind, owner_id).await? {
                        OwnerLock::Missing => return Ok(ConsumeOutcome::AlreadyGone),
                        OwnerLock::Inactive(status) => {
                            return Ok(ConsumeOutcome::OwnerInactive(status));
                        }
                        OwnerLock::Held => {}
                    }

                    // A racing consumer blocks on the owner until the winner commits,
                    // then finds the row gone.
                    let locked = verification_tokens::Entity::find_by_id(token_id)
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if locked.is_none() {
                        return Ok(ConsumeOutcome::AlreadyGone);
                    }

                    if let ConsumeEffect::ActivatePassengerSession(passenger_id) = effect {
                        passengers::Entity::update_many()
                            .col_expr(
                                passengers::Column::SessionActive,
                                sea_orm::sea_query::Expr::value(true),
                            )
                            .filter(passengers::Column::Id.eq(passenger_id.0))
                            .exec(txn)
                            .await?;
                    }

                    let deleted = verification_tokens::Entity::delete_by_id(token_id)
                        .exec(txn)
                        .await?;
                    if deleted.rows_affected == 1 {
                        Ok(ConsumeOutcome::Consumed)
                    } else {
                        Ok(ConsumeOutcome::AlreadyGone)
                    }
                })
            })
            .await
            .context("consume verification token")?;
        Ok(outcome)
    }

    async fn record_failed_attempt(&self, id: Uuid) -> Result<Option<u32>, TransitError> {
        #[derive(Debug, FromQueryResult)]
        struct AttemptsRow {
            failed_attempts: i32,
        }

        let row = AttemptsRow::find_by_statement(Statement::from_sql_and_values(
            self.db.get_database_backend(),
            "UPDATE verification_tokens SET failed_attempts = failed_attempts + 1 \
             WHERE id = $1 RETURNING failed_attempts",
            [id.into()],
        ))
        .one(&self.db)
        .await
        .context("record failed verification attempt")?;
        Ok(row.map(|r| r.failed_attempts.max(0) as u32))
    }
}

enum OwnerLock {
    Missing,
    Inactive(CardStatus),
    Held,
}

/// `SELECT ... FOR UPDATE` on the token's owner row.
///
/// A card owner is only `Held` while its locked status is active.
async fn lock_owner(
    txn: &DatabaseTransaction,
    kind: TokenKind,
    owner_id: i64,
) -> Result<OwnerLock, DbErr> {
    match kind {
        TokenKind::TwoFactor => {
            let found = passengers::Entity::find_by_id(owner_id)
                .lock_exclusive()
                .one(txn)
                .await?;
            Ok(match found {
                Some(_) => OwnerLock::Held,
                None => OwnerLock::Missing,
            })
        }
        TokenKind::Qr => {
            let Some(card) = cards::Entity::find_by_id(owner_id)
                .lock_exclusive()
                .one(txn)
                .await?
            else {
                return Ok(OwnerLock::Missing);
            };
            let status = card
                .status
                .parse::<CardStatus>()
                .map_err(|e| DbErr::Custom(format!("stored card status: {e}")))?;
            if status.is_active() {
                Ok(OwnerLock::Held)
            } else {
                Ok(OwnerLock::Inactive(status))
            }
        }
    }
}

async fn insert_token(txn: &DatabaseTransaction, token: &VerificationToken) -> Result<(), DbErr> {
    verification_tokens::ActiveModel {
        id: Set(token.id),
        kind: Set(token.kind.as_str().to_owned()),
        owner_id: Set(token.owner_id),
        value: Set(token.value.clone()),
        failed_attempts: Set(token.failed_attempts as i32),
        created_at: Set(token.created_at),
        expires_at: Set(token.expires_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn token_from_model(model: verification_tokens::Model) -> anyhow::Result<VerificationToken> {
    let kind = TokenKind::parse(&model.kind)
        .with_context(|| format!("unknown verification token kind {:?}", model.kind))?;
    Ok(VerificationToken {
        id: model.id,
        kind,
        owner_id: model.owner_id,
        value: model.value,
        failed_attempts: model.failed_attempts.max(0) as u32,
        created_at: model.created_at,
        expires_at: model.expires_at,
    })
}

// ── Admin user repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAdminUserRepository {
    pub db: DatabaseConnection,
}

impl AdminUserRepository for DbAdminUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>, TransitError> {
        let model = admin_users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find admin user by id")?;
        Ok(model.map(admin_from_model))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, TransitError> {
        let model = admin_users::Entity::find()
            .filter(admin_users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find admin user by username")?;
        Ok(model.map(admin_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, TransitError> {
        let model = admin_users::Entity::find()
            .filter(admin_users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find admin user by email")?;
        Ok(model.map(admin_from_model))
    }

    async fn create(&self, user: &AdminUser) -> Result<(), TransitError> {
        admin_users::ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            disabled: Set(user.disabled),
            created_at: Set(user.created_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TransitError::DuplicateAdmin
            } else {
                anyhow::Error::new(e).context("create admin user").into()
            }
        })?;
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<AdminUser>, TransitError> {
        let models = admin_users::Entity::find()
            .order_by_asc(admin_users::Column::CreatedAt)
            .order_by_asc(admin_users::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list admin users")?;
        Ok(models.into_iter().map(admin_from_model).collect())
    }

    async fn update(&self, id: Uuid, changes: &AdminChanges) -> Result<AdminUser, TransitError> {
        let mut am = admin_users::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        if let Some(username) = &changes.username {
            am.username = Set(username.clone());
        }
        if let Some(email) = &changes.email {
            am.email = Set(email.clone());
        }
        if let Some(hash) = &changes.password_hash {
            am.password_hash = Set(hash.clone());
        }
        if let Some(disabled) = changes.disabled {
            am.disabled = Set(disabled);
        }
        let model = am.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => TransitError::AdminNotFound,
            e if is_unique_violation(&e) => TransitError::DuplicateAdmin,
            e => anyhow::Error::new(e).context("update admin user").into(),
        })?;
        Ok(admin_from_model(model))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, TransitError> {
        let result = admin_users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete admin user")?;
        Ok(result.rows_affected > 0)
    }
}

fn admin_from_model(model: admin_users::Model) -> AdminUser {
    AdminUser {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        disabled: model.disabled,
        created_at: model.created_at,
    }
}
