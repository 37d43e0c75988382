use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tuapp_core::serde::to_rfc3339_ms;
use tuapp_domain::id::CardId;

use crate::domain::types::CardHolder;
use crate::error::TransitError;
use crate::handlers::extract::{AdminSession, Authenticated};
use crate::infra::system::{SystemClock, ThreadRandom};
use crate::state::AppState;
use crate::usecase::virtual_card::{
    IssueVirtualCardInput, IssueVirtualCardUseCase, RenderVirtualCardInput,
    RenderVirtualCardUseCase, VerifyVirtualCardUseCase,
};

// ── POST /virtual-cards ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IssueVirtualCardRequest {
    pub card_id: i64,
}

#[derive(Serialize)]
pub struct VirtualCardResponse {
    pub id: Uuid,
    pub card_id: i64,
    pub qr: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

pub async fn issue_virtual_card(
    State(state): State<AppState>,
    session: Authenticated,
    Json(body): Json<IssueVirtualCardRequest>,
) -> Result<(StatusCode, Json<VirtualCardResponse>), TransitError> {
    let usecase = IssueVirtualCardUseCase {
        cards: state.card_repo(),
        tokens: state.token_store(),
        clock: SystemClock,
        rng: ThreadRandom,
    };
    let token = usecase
        .execute(IssueVirtualCardInput {
            card_id: CardId(body.card_id),
            owner: session.owner_filter(),
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(VirtualCardResponse {
            id: token.id,
            card_id: token.owner_id,
            qr: token.value,
            created_at: token.created_at,
            expires_at: token.expires_at,
        }),
    ))
}

// ── GET /virtual-cards/{id}/qr ───────────────────────────────────────────────

pub async fn render_virtual_card(
    State(state): State<AppState>,
    session: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, TransitError> {
    let usecase = RenderVirtualCardUseCase {
        cards: state.card_repo(),
        tokens: state.token_store(),
        clock: SystemClock,
        renderer: state.renderer(),
    };
    let rendered = usecase
        .execute(RenderVirtualCardInput {
            token_id: id,
            owner: session.owner_filter(),
        })
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, rendered.content_type.to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"qr_{id}.svg\""),
            ),
        ],
        rendered.image,
    ))
}

// ── POST /virtual-cards/verify ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyVirtualCardRequest {
    pub qr: String,
}

#[derive(Serialize)]
pub struct VerifyVirtualCardResponse {
    pub valid: bool,
    #[serde(flatten)]
    pub holder: CardHolder,
}

pub async fn verify_virtual_card(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(body): Json<VerifyVirtualCardRequest>,
) -> Result<Json<VerifyVirtualCardResponse>, TransitError> {
    let usecase = VerifyVirtualCardUseCase {
        tokens: state.token_store(),
        clock: SystemClock,
    };
    let holder = usecase.execute(&body.qr).await?;
    Ok(Json(VerifyVirtualCardResponse {
        valid: true,
        holder,
    }))
}
