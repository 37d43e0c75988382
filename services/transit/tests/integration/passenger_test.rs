use tuapp_domain::card::CardStatus;
use tuapp_domain::id::PassengerId;
use tuapp_domain::pagination::PageRequest;
use tuapp_transit::domain::policy::TwoFactorPolicy;
use tuapp_transit::domain::types::{PassengerChanges, TokenKind};
use tuapp_transit::error::TransitError;
use tuapp_transit::usecase::lifecycle::TokenLifecycle;
use tuapp_transit::usecase::passenger::{
    DeletePassengerUseCase, ListPassengersUseCase, UpdatePassengerUseCase,
};

use crate::helpers::*;

#[tokio::test]
async fn should_list_passengers_by_id() {
    let world = World::new()
        .with_passenger(other_passenger())
        .with_passenger(test_passenger());
    let uc = ListPassengersUseCase {
        passengers: world.passenger_repo(),
    };

    let all = uc.execute(PageRequest::default()).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|p| p.id.0).collect();
    assert_eq!(ids, [7, 8]);

    let page = uc.execute(PageRequest { skip: 1, limit: 1 }).await.unwrap();
    assert_eq!(page[0].document, "87654321B");
}

#[tokio::test]
async fn should_update_only_given_fields() {
    let world = World::new().with_passenger(test_passenger());
    let uc = UpdatePassengerUseCase {
        passengers: world.passenger_repo(),
    };

    let passenger = uc
        .execute(
            PassengerId(7),
            PassengerChanges {
                email: Some("joan.nou@example.com".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(passenger.email, "joan.nou@example.com");
    assert_eq!(passenger.document, "12345678A");
    assert_eq!(passenger.surname_2.as_deref(), Some("Lopez"));
}

#[tokio::test]
async fn should_reject_passenger_update_without_changes() {
    let world = World::new().with_passenger(test_passenger());
    let uc = UpdatePassengerUseCase {
        passengers: world.passenger_repo(),
    };

    let err = uc
        .execute(PassengerId(7), PassengerChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::NoChanges));

    // A blank second surname alone is not a change.
    let err = uc
        .execute(
            PassengerId(7),
            PassengerChanges {
                surname_2: Some(" ".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::NoChanges));
}

#[tokio::test]
async fn should_reject_update_to_taken_document_or_unknown_passenger() {
    let world = World::new()
        .with_passenger(test_passenger())
        .with_passenger(other_passenger());
    let uc = UpdatePassengerUseCase {
        passengers: world.passenger_repo(),
    };
    let taken = PassengerChanges {
        document: Some("87654321B".to_owned()),
        ..Default::default()
    };

    let err = uc.execute(PassengerId(7), taken.clone()).await.unwrap_err();
    assert!(matches!(err, TransitError::DuplicatePassenger));

    let err = uc.execute(PassengerId(99), taken).await.unwrap_err();
    assert!(matches!(err, TransitError::PassengerNotFound));
}

#[tokio::test]
async fn should_refuse_deleting_passenger_with_cards() {
    let world = World::new()
        .with_passenger(test_passenger())
        .with_card(test_card(CardStatus::Active));
    let uc = DeletePassengerUseCase {
        passengers: world.passenger_repo(),
    };

    let err = uc.execute(PassengerId(7)).await.unwrap_err();

    assert!(matches!(err, TransitError::PassengerHasCards));
    assert_eq!(world.passengers.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_delete_passenger_with_pending_code() {
    let world = World::new().with_passenger(test_passenger());
    let clock = FixedClock::new();
    let store = world.token_store();
    TokenLifecycle {
        policy: &TwoFactorPolicy::default(),
        store: &store,
        clock: &clock,
    }
    .issue(7, &SequenceRandom::new([246_810]))
    .await
    .unwrap();
    let uc = DeletePassengerUseCase {
        passengers: world.passenger_repo(),
    };

    uc.execute(PassengerId(7)).await.unwrap();

    assert!(world.passengers.lock().unwrap().is_empty());
    assert!(world.tokens_of(TokenKind::TwoFactor, 7).is_empty());
    let err = uc.execute(PassengerId(7)).await.unwrap_err();
    assert!(matches!(err, TransitError::PassengerNotFound));
}
