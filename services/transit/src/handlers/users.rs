use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tuapp_core::serde::to_rfc3339_ms;
use tuapp_domain::pagination::PageRequest;

use crate::domain::types::AdminUser;
use crate::error::TransitError;
use crate::handlers::extract::AdminSession;
use crate::state::AppState;
use crate::usecase::admin::{
    DeleteAdminUseCase, GetAdminUseCase, GetCurrentAdminUseCase, ListAdminsUseCase,
    RegisterAdminInput, RegisterAdminUseCase, UpdateAdminInput, UpdateAdminUseCase,
};

/// Admin account as exposed over HTTP. The password hash never leaves the service.
#[derive(Serialize)]
pub struct AdminResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub disabled: bool,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<AdminUser> for AdminResponse {
    fn from(user: AdminUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            disabled: user.disabled,
            created_at: user.created_at,
        }
    }
}

// ── POST /users ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AdminResponse>), TransitError> {
    let usecase = RegisterAdminUseCase {
        admins: state.admin_repo(),
    };
    let user = usecase
        .execute(RegisterAdminInput {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── GET /users ───────────────────────────────────────────────────────────────

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<AdminResponse>>, TransitError> {
    let usecase = ListAdminsUseCase {
        admins: state.admin_repo(),
    };
    let users = usecase.execute(page).await?;
    Ok(Json(users.into_iter().map(AdminResponse::from).collect()))
}

// ── GET /users/me ────────────────────────────────────────────────────────────

pub async fn get_current_user(
    State(state): State<AppState>,
    admin: AdminSession,
) -> Result<Json<AdminResponse>, TransitError> {
    let usecase = GetCurrentAdminUseCase {
        admins: state.admin_repo(),
    };
    Ok(Json(usecase.execute(&admin.email).await?.into()))
}

// ── GET /users/{id} ──────────────────────────────────────────────────────────

pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminResponse>, TransitError> {
    let usecase = GetAdminUseCase {
        admins: state.admin_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}

// ── PUT /users/{id} ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub disabled: Option<bool>,
}

pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<AdminResponse>, TransitError> {
    let usecase = UpdateAdminUseCase {
        admins: state.admin_repo(),
    };
    let user = usecase
        .execute(
            id,
            UpdateAdminInput {
                username: body.username,
                email: body.email,
                password: body.password,
                disabled: body.disabled,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

// ── DELETE /users/{id} ───────────────────────────────────────────────────────

pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, TransitError> {
    let usecase = DeleteAdminUseCase {
        admins: state.admin_repo(),
    };
    usecase.execute(&admin.email, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
