use axum::{Form, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::TransitError;
use crate::handlers::users::AdminResponse;
use crate::infra::system::{SystemClock, ThreadRandom};
use crate::state::AppState;
use crate::usecase::admin::{
    LoginAdminInput, LoginAdminUseCase, RegisterAdminInput, RegisterAdminUseCase,
};
use crate::usecase::session::SessionGrant;
use crate::usecase::two_factor::{
    RequestTwoFactorInput, RequestTwoFactorUseCase, VerifyTwoFactorInput, VerifyTwoFactorUseCase,
};

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: u64,
}

impl From<SessionGrant> for AccessTokenResponse {
    fn from(grant: SessionGrant) -> Self {
        Self {
            access_token: grant.access_token,
            token_type: "bearer",
            expires_at: grant.exp,
        }
    }
}

// ── POST /auth/register ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
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

// ── POST /auth/token ─────────────────────────────────────────────────────────

/// OAuth2 password-grant style form body.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_admin(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<AccessTokenResponse>, TransitError> {
    let usecase = LoginAdminUseCase {
        admins: state.admin_repo(),
        clock: SystemClock,
        sessions: state.sessions(),
    };
    let grant = usecase
        .execute(LoginAdminInput {
            username: form.username,
            password: form.password,
        })
        .await?;
    Ok(Json(grant.into()))
}

// ── POST /auth/login ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TwoFactorLoginRequest {
    pub document: String,
}

pub async fn request_two_factor(
    State(state): State<AppState>,
    Json(body): Json<TwoFactorLoginRequest>,
) -> Result<StatusCode, TransitError> {
    let usecase = RequestTwoFactorUseCase {
        passengers: state.passenger_repo(),
        tokens: state.token_store(),
        notifier: state.notifier.clone(),
        clock: SystemClock,
        rng: ThreadRandom,
        policy: state.two_factor_policy(),
    };
    usecase
        .execute(RequestTwoFactorInput {
            document: body.document,
        })
        .await?;
    Ok(StatusCode::ACCEPTED)
}

// ── POST /auth/verify ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TwoFactorVerifyRequest {
    pub document: String,
    pub code: u32,
}

pub async fn verify_two_factor(
    State(state): State<AppState>,
    Json(body): Json<TwoFactorVerifyRequest>,
) -> Result<Json<AccessTokenResponse>, TransitError> {
    let usecase = VerifyTwoFactorUseCase {
        passengers: state.passenger_repo(),
        tokens: state.token_store(),
        clock: SystemClock,
        policy: state.two_factor_policy(),
        sessions: state.sessions(),
    };
    let grant = usecase
        .execute(VerifyTwoFactorInput {
            document: body.document,
            code: body.code.to_string(),
        })
        .await?;
    Ok(Json(grant.into()))
}
