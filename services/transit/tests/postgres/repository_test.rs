use chrono::Utc;
use uuid::Uuid;

use tuapp_domain::card::CardStatus;
use tuapp_domain::pagination::PageRequest;
use tuapp_transit::domain::repository::{
    AdminUserRepository, CardRepository, PassengerRepository, TokenStore,
};
use tuapp_transit::domain::types::{AdminChanges, AdminUser, PassengerChanges, TokenKind};
use tuapp_transit::error::TransitError;
use tuapp_transit::infra::system::{SystemClock, ThreadRandom};
use tuapp_transit::usecase::two_factor::{RequestTwoFactorInput, RequestTwoFactorUseCase};

use crate::helpers::*;

// ── Passengers ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_update_passenger_and_map_conflicts() {
    let Some(db) = connect().await else { return };
    let joan = seed_passenger(&db).await;
    let other = seed_passenger(&db).await;
    let repo = passengers(&db);

    let updated = repo
        .update(
            joan.id,
            &PassengerChanges {
                surname_2: Some("Lopez".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.surname_2.as_deref(), Some("Lopez"));
    assert_eq!(updated.email, joan.email);

    let taken = PassengerChanges {
        email: Some(other.email.clone()),
        ..Default::default()
    };
    let err = repo.update(joan.id, &taken).await.unwrap_err();
    assert!(matches!(err, TransitError::DuplicatePassenger));

    let missing = tuapp_domain::id::PassengerId(-1);
    let err = repo.update(missing, &taken).await.unwrap_err();
    assert!(matches!(err, TransitError::PassengerNotFound));
}

#[tokio::test]
async fn should_restrict_passenger_delete_while_cards_exist() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;
    seed_card(&db, passenger.id, CardStatus::Active).await;
    let repo = passengers(&db);

    let err = repo.delete(passenger.id).await.unwrap_err();

    assert!(matches!(err, TransitError::PassengerHasCards));
    assert!(repo.find_by_id(passenger.id).await.unwrap().is_some());
}

#[tokio::test]
async fn should_delete_passenger_and_pending_code() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;
    let code = RequestTwoFactorUseCase {
        passengers: passengers(&db),
        tokens: store(&db),
        notifier: log_notifier(),
        clock: SystemClock,
        rng: ThreadRandom,
        policy: Default::default(),
    }
    .execute(RequestTwoFactorInput {
        document: passenger.document.clone(),
    })
    .await
    .unwrap();
    let repo = passengers(&db);

    assert!(repo.delete(passenger.id).await.unwrap());

    assert!(repo.find_by_id(passenger.id).await.unwrap().is_none());
    assert!(store(&db).find_by_id(code.id).await.unwrap().is_none());
    assert!(
        stored_tokens(&db, TokenKind::TwoFactor, passenger.id.0)
            .await
            .is_empty()
    );
    assert!(!repo.delete(passenger.id).await.unwrap());
}

// ── Cards ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_cards_in_id_order() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;
    let first = seed_card(&db, passenger.id, CardStatus::Active).await;
    let second = seed_card(&db, passenger.id, CardStatus::Lost).await;

    // Other tests share the table, so page from a known position.
    let all = cards(&db)
        .list(PageRequest {
            skip: 0,
            limit: tuapp_domain::pagination::MAX_LIMIT,
        })
        .await
        .unwrap();
    let ids: Vec<i64> = all.iter().map(|c| c.id.0).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);

    let mine = cards(&db)
        .list_by_passenger(passenger.id, PageRequest::default())
        .await
        .unwrap();
    let mine: Vec<_> = mine.iter().map(|c| (c.id, c.status)).collect();
    assert_eq!(
        mine,
        [(first.id, CardStatus::Active), (second.id, CardStatus::Lost)]
    );
}

// ── Admin users ──────────────────────────────────────────────────────────────

fn admin(tag: &str) -> AdminUser {
    AdminUser {
        id: Uuid::now_v7(),
        username: format!("gestor-{tag}"),
        email: format!("gestor-{tag}@tuapp.cat"),
        password_hash: "$argon2id$placeholder".to_owned(),
        disabled: false,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn should_update_and_delete_admin_users() {
    let Some(db) = connect().await else { return };
    let repo = admins(&db);
    let first = admin(&unique_tag());
    let second = admin(&unique_tag());
    repo.create(&first).await.unwrap();
    repo.create(&second).await.unwrap();

    let updated = repo
        .update(
            first.id,
            &AdminChanges {
                disabled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.disabled);
    assert_eq!(
        repo.find_by_email(&first.email).await.unwrap().unwrap().id,
        first.id
    );

    let err = repo
        .update(
            first.id,
            &AdminChanges {
                username: Some(second.username.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::DuplicateAdmin));

    let err = repo
        .update(
            Uuid::now_v7(),
            &AdminChanges {
                disabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::AdminNotFound));

    assert!(repo.delete(second.id).await.unwrap());
    assert!(repo.find_by_id(second.id).await.unwrap().is_none());
    assert!(!repo.delete(second.id).await.unwrap());
}
