use tuapp_auth_types::token::Subject;
use tuapp_domain::pagination::PageRequest;
use tuapp_transit::error::TransitError;
use tuapp_transit::usecase::admin::{
    DeleteAdminUseCase, GetAdminUseCase, GetCurrentAdminUseCase, ListAdminsUseCase,
    LoginAdminInput, LoginAdminUseCase, RegisterAdminInput, RegisterAdminUseCase,
    UpdateAdminInput, UpdateAdminUseCase,
};
use uuid::Uuid;

use crate::helpers::*;

fn registration(username: &str, email: &str) -> RegisterAdminInput {
    RegisterAdminInput {
        username: username.to_owned(),
        email: email.to_owned(),
        password: "s3cret-pass".to_owned(),
    }
}

fn login_use_case(admins: &MockAdminRepo) -> LoginAdminUseCase<MockAdminRepo, FixedClock> {
    LoginAdminUseCase {
        admins: admins.clone(),
        clock: FixedClock::at(chrono::Utc::now()),
        sessions: test_sessions(),
    }
}

async fn registered(admins: &MockAdminRepo, username: &str, email: &str) -> Uuid {
    RegisterAdminUseCase {
        admins: admins.clone(),
    }
    .execute(registration(username, email))
    .await
    .unwrap()
    .id
}

fn credentials(username: &str, password: &str) -> LoginAdminInput {
    LoginAdminInput {
        username: username.to_owned(),
        password: password.to_owned(),
    }
}

#[tokio::test]
async fn should_register_admin_with_hashed_password() {
    let admins = MockAdminRepo::default();
    let uc = RegisterAdminUseCase {
        admins: admins.clone(),
    };

    let user = uc
        .execute(registration("gestor", "gestor@tuapp.cat"))
        .await
        .unwrap();

    assert_eq!(user.username, "gestor");
    assert_ne!(user.password_hash, "s3cret-pass");
    assert!(user.password_hash.starts_with("$argon2"));
    assert_eq!(admins.users_handle().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_admin_email_without_at_sign() {
    let admins = MockAdminRepo::default();
    let uc = RegisterAdminUseCase {
        admins: admins.clone(),
    };

    let err = uc
        .execute(registration("gestor", "gestor"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransitError::InvalidEmail));
    assert!(admins.users_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_duplicate_admin_username() {
    let admins = MockAdminRepo::default();
    let uc = RegisterAdminUseCase {
        admins: admins.clone(),
    };
    uc.execute(registration("gestor", "gestor@tuapp.cat"))
        .await
        .unwrap();

    let err = uc
        .execute(registration("gestor", "altre@tuapp.cat"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransitError::DuplicateAdmin));
}

#[tokio::test]
async fn should_grant_admin_session_for_valid_password() {
    let admins = MockAdminRepo::default();
    RegisterAdminUseCase {
        admins: admins.clone(),
    }
    .execute(registration("gestor", "gestor@tuapp.cat"))
    .await
    .unwrap();

    let grant = login_use_case(&admins)
        .execute(credentials("gestor", "s3cret-pass"))
        .await
        .unwrap();

    let subject = test_sessions().verify(&grant.access_token).unwrap();
    assert_eq!(subject, Subject::Admin("gestor@tuapp.cat".to_owned()));
}

#[tokio::test]
async fn should_reject_wrong_password_and_unknown_user_alike() {
    let admins = MockAdminRepo::default();
    RegisterAdminUseCase {
        admins: admins.clone(),
    }
    .execute(registration("gestor", "gestor@tuapp.cat"))
    .await
    .unwrap();
    let uc = login_use_case(&admins);

    let wrong = uc
        .execute(credentials("gestor", "nope"))
        .await
        .unwrap_err();
    let unknown = uc
        .execute(credentials("ningu", "s3cret-pass"))
        .await
        .unwrap_err();

    assert!(matches!(wrong, TransitError::InvalidCredentials));
    assert!(matches!(unknown, TransitError::InvalidCredentials));
}

#[tokio::test]
async fn should_reject_disabled_admin() {
    let admins = MockAdminRepo::default();
    RegisterAdminUseCase {
        admins: admins.clone(),
    }
    .execute(registration("gestor", "gestor@tuapp.cat"))
    .await
    .unwrap();
    admins.users_handle().lock().unwrap()[0].disabled = true;

    let err = login_use_case(&admins)
        .execute(credentials("gestor", "s3cret-pass"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransitError::InvalidCredentials));
}

// ── User management ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_and_get_admins() {
    let admins = MockAdminRepo::default();
    let first = registered(&admins, "gestor", "gestor@tuapp.cat").await;
    registered(&admins, "suport", "suport@tuapp.cat").await;

    let page = ListAdminsUseCase {
        admins: admins.clone(),
    }
    .execute(PageRequest { skip: 1, limit: 10 })
    .await
    .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].username, "suport");

    let uc = GetAdminUseCase {
        admins: admins.clone(),
    };
    assert_eq!(uc.execute(first).await.unwrap().email, "gestor@tuapp.cat");
    let err = uc.execute(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TransitError::AdminNotFound));
}

#[tokio::test]
async fn should_resolve_current_admin_from_session_email() {
    let admins = MockAdminRepo::default();
    let id = registered(&admins, "gestor", "gestor@tuapp.cat").await;
    let uc = GetCurrentAdminUseCase {
        admins: admins.clone(),
    };

    assert_eq!(uc.execute("gestor@tuapp.cat").await.unwrap().id, id);
    let err = uc.execute("esborrat@tuapp.cat").await.unwrap_err();
    assert!(matches!(err, TransitError::AdminNotFound));
}

#[tokio::test]
async fn should_disable_admin_and_block_login() {
    let admins = MockAdminRepo::default();
    let id = registered(&admins, "gestor", "gestor@tuapp.cat").await;

    let user = UpdateAdminUseCase {
        admins: admins.clone(),
    }
    .execute(
        id,
        UpdateAdminInput {
            disabled: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(user.disabled);

    let err = login_use_case(&admins)
        .execute(credentials("gestor", "s3cret-pass"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::InvalidCredentials));
}

#[tokio::test]
async fn should_rehash_password_on_update() {
    let admins = MockAdminRepo::default();
    let id = registered(&admins, "gestor", "gestor@tuapp.cat").await;

    UpdateAdminUseCase {
        admins: admins.clone(),
    }
    .execute(
        id,
        UpdateAdminInput {
            password: Some("nova-clau".to_owned()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let stored = admins.users_handle().lock().unwrap()[0].password_hash.clone();
    assert!(stored.starts_with("$argon2"));
    login_use_case(&admins)
        .execute(credentials("gestor", "nova-clau"))
        .await
        .unwrap();
    let err = login_use_case(&admins)
        .execute(credentials("gestor", "s3cret-pass"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::InvalidCredentials));
}

#[tokio::test]
async fn should_reject_admin_update_without_changes_or_with_taken_email() {
    let admins = MockAdminRepo::default();
    let id = registered(&admins, "gestor", "gestor@tuapp.cat").await;
    registered(&admins, "suport", "suport@tuapp.cat").await;
    let uc = UpdateAdminUseCase {
        admins: admins.clone(),
    };

    let err = uc.execute(id, UpdateAdminInput::default()).await.unwrap_err();
    assert!(matches!(err, TransitError::NoChanges));

    let err = uc
        .execute(
            id,
            UpdateAdminInput {
                email: Some("suport@tuapp.cat".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::DuplicateAdmin));

    let err = uc
        .execute(
            id,
            UpdateAdminInput {
                email: Some("sense-arrova".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::InvalidEmail));

    let err = uc
        .execute(
            Uuid::new_v4(),
            UpdateAdminInput {
                username: Some("ningu".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransitError::AdminNotFound));
}

#[tokio::test]
async fn should_delete_other_admin_but_not_self() {
    let admins = MockAdminRepo::default();
    let me = registered(&admins, "gestor", "gestor@tuapp.cat").await;
    let other = registered(&admins, "suport", "suport@tuapp.cat").await;
    let uc = DeleteAdminUseCase {
        admins: admins.clone(),
    };

    let err = uc.execute("gestor@tuapp.cat", me).await.unwrap_err();
    assert!(matches!(err, TransitError::CannotDeleteSelf));

    uc.execute("gestor@tuapp.cat", other).await.unwrap();
    assert_eq!(admins.users_handle().lock().unwrap().len(), 1);

    let err = uc.execute("gestor@tuapp.cat", other).await.unwrap_err();
    assert!(matches!(err, TransitError::AdminNotFound));
}
