use tuapp_domain::card::CardStatus;
use tuapp_transit::domain::policy::TwoFactorPolicy;
use tuapp_transit::domain::repository::{PassengerRepository, TokenStore};
use tuapp_transit::domain::types::TokenKind;
use tuapp_transit::error::TransitError;
use tuapp_transit::infra::system::{SystemClock, ThreadRandom};
use tuapp_transit::usecase::two_factor::{
    RequestTwoFactorInput, RequestTwoFactorUseCase, VerifyTwoFactorInput, VerifyTwoFactorUseCase,
};
use tuapp_transit::usecase::virtual_card::{
    IssueVirtualCardInput, IssueVirtualCardUseCase, VerifyVirtualCardUseCase,
};

use crate::helpers::*;

const RACERS: usize = 8;

// ── Double issue ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_leave_one_qr_after_concurrent_issues() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;
    let card = seed_card(&db, passenger.id, CardStatus::Active).await;
    let card_id = card.id;

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let uc = IssueVirtualCardUseCase {
                cards: cards(&db),
                tokens: store(&db),
                clock: SystemClock,
                rng: ThreadRandom,
            };
            tokio::spawn(async move {
                uc.execute(IssueVirtualCardInput {
                    card_id,
                    owner: None,
                })
                .await
            })
        })
        .collect();
    let mut issued = Vec::new();
    for handle in handles {
        issued.push(handle.await.unwrap().unwrap());
    }

    let stored = stored_tokens(&db, TokenKind::Qr, card.id.0).await;
    assert_eq!(stored.len(), 1);
    assert!(issued.iter().any(|t| t.id == stored[0].id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_leave_one_code_after_concurrent_requests() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let uc = RequestTwoFactorUseCase {
                passengers: passengers(&db),
                tokens: store(&db),
                notifier: log_notifier(),
                clock: SystemClock,
                rng: ThreadRandom,
                policy: TwoFactorPolicy::default(),
            };
            let document = passenger.document.clone();
            tokio::spawn(async move { uc.execute(RequestTwoFactorInput { document }).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(
        stored_tokens(&db, TokenKind::TwoFactor, passenger.id.0)
            .await
            .len(),
        1
    );
}

// ── Double consume ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_admit_exactly_one_of_concurrent_qr_scans() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;
    let card = seed_card(&db, passenger.id, CardStatus::Active).await;
    let token = IssueVirtualCardUseCase {
        cards: cards(&db),
        tokens: store(&db),
        clock: SystemClock,
        rng: ThreadRandom,
    }
    .execute(IssueVirtualCardInput {
        card_id: card.id,
        owner: None,
    })
    .await
    .unwrap();

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let uc = VerifyVirtualCardUseCase {
                tokens: store(&db),
                clock: SystemClock,
            };
            let value = token.value.clone();
            tokio::spawn(async move { uc.execute(&value).await })
        })
        .collect();
    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(holder) => {
                assert_eq!(holder.card_id, card.id);
                admitted += 1;
            }
            Err(e) => assert!(matches!(e, TransitError::VirtualCardNotFound), "{e:?}"),
        }
    }

    assert_eq!(admitted, 1);
    assert!(stored_tokens(&db, TokenKind::Qr, card.id.0).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_grant_exactly_one_session_for_concurrent_code_submissions() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;
    let token = RequestTwoFactorUseCase {
        passengers: passengers(&db),
        tokens: store(&db),
        notifier: log_notifier(),
        clock: SystemClock,
        rng: ThreadRandom,
        policy: TwoFactorPolicy::default(),
    }
    .execute(RequestTwoFactorInput {
        document: passenger.document.clone(),
    })
    .await
    .unwrap();

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let uc = VerifyTwoFactorUseCase {
                passengers: passengers(&db),
                tokens: store(&db),
                clock: SystemClock,
                policy: TwoFactorPolicy::default(),
                sessions: sessions(),
            };
            let input = VerifyTwoFactorInput {
                document: passenger.document.clone(),
                code: token.value.clone(),
            };
            tokio::spawn(async move { uc.execute(input).await })
        })
        .collect();
    let mut granted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => granted += 1,
            Err(e) => assert!(matches!(e, TransitError::InvalidCode), "{e:?}"),
        }
    }

    assert_eq!(granted, 1);
    let stored = passengers(&db).find_by_id(passenger.id).await.unwrap().unwrap();
    assert!(stored.session_active);
    assert!(store(&db).find_by_id(token.id).await.unwrap().is_none());
}

// ── Status changes racing the lifecycle ──────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_refuse_qr_issue_when_card_expires_mid_request() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;
    let card = seed_card(&db, passenger.id, CardStatus::Active).await;

    let card_id = card.id;
    let txn = hold_card_with_status(&db, card_id, CardStatus::Expired).await;
    let uc = IssueVirtualCardUseCase {
        cards: cards(&db),
        tokens: store(&db),
        clock: SystemClock,
        rng: ThreadRandom,
    };
    // Reads the card as still active, then parks on the row lock.
    let issue = tokio::spawn(async move {
        uc.execute(IssueVirtualCardInput {
            card_id,
            owner: None,
        })
        .await
    });
    tokio::time::sleep(LOCK_HOLD).await;
    txn.commit().await.unwrap();

    let err = issue.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        TransitError::CardNotActive {
            status: CardStatus::Expired
        }
    ));
    assert!(stored_tokens(&db, TokenKind::Qr, card.id.0).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_keep_qr_when_card_stolen_mid_scan() {
    let Some(db) = connect().await else { return };
    let passenger = seed_passenger(&db).await;
    let card = seed_card(&db, passenger.id, CardStatus::Active).await;
    let token = IssueVirtualCardUseCase {
        cards: cards(&db),
        tokens: store(&db),
        clock: SystemClock,
        rng: ThreadRandom,
    }
    .execute(IssueVirtualCardInput {
        card_id: card.id,
        owner: None,
    })
    .await
    .unwrap();

    let txn = hold_card_with_status(&db, card.id, CardStatus::Stolen).await;
    let uc = VerifyVirtualCardUseCase {
        tokens: store(&db),
        clock: SystemClock,
    };
    // The joined lookup still reports the card active; consumption parks on the lock.
    let value = token.value.clone();
    let scan = tokio::spawn(async move { uc.execute(&value).await });
    tokio::time::sleep(LOCK_HOLD).await;
    txn.commit().await.unwrap();

    let err = scan.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        TransitError::CardNotActive {
            status: CardStatus::Stolen
        }
    ));
    let stored = stored_tokens(&db, TokenKind::Qr, card.id.0).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, token.id);
}
