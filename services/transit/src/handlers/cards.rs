use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use tuapp_domain::card::{CardProfile, CardStatus};
use tuapp_domain::id::{CardId, PassengerId};
use tuapp_domain::pagination::PageRequest;

use crate::domain::types::{Card, CardChanges};
use crate::error::TransitError;
use crate::handlers::extract::{AdminSession, Authenticated};
use crate::infra::system::ThreadRandom;
use crate::state::AppState;
use crate::usecase::card::{
    CreateCardInput, CreateCardUseCase, GetCardUseCase, ListCardsUseCase,
    ListPassengerCardsUseCase, UpdateCardUseCase,
};

// ── POST /cards ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCardRequest {
    pub passenger_id: i64,
    pub profile: CardProfile,
    #[serde(default)]
    pub balance_cents: i64,
    #[serde(default = "default_status")]
    pub status: CardStatus,
}

fn default_status() -> CardStatus {
    CardStatus::Active
}

pub async fn create_card(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(body): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), TransitError> {
    let usecase = CreateCardUseCase {
        passengers: state.passenger_repo(),
        cards: state.card_repo(),
        rng: ThreadRandom,
    };
    let card = usecase
        .execute(CreateCardInput {
            passenger_id: PassengerId(body.passenger_id),
            profile: body.profile,
            balance_cents: body.balance_cents,
            status: body.status,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(card)))
}

// ── GET /cards ───────────────────────────────────────────────────────────────

pub async fn list_cards(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<Card>>, TransitError> {
    let usecase = ListCardsUseCase {
        cards: state.card_repo(),
    };
    Ok(Json(usecase.execute(page).await?))
}

// ── GET /cards/{id} ──────────────────────────────────────────────────────────

pub async fn get_card(
    State(state): State<AppState>,
    session: Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<Card>, TransitError> {
    let usecase = GetCardUseCase {
        cards: state.card_repo(),
    };
    let card = usecase.execute(CardId(id), session.owner_filter()).await?;
    Ok(Json(card))
}

// ── PUT /cards/{id} ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub balance_cents: Option<i64>,
    #[serde(default)]
    pub status: Option<CardStatus>,
}

pub async fn update_card(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCardRequest>,
) -> Result<Json<Card>, TransitError> {
    let usecase = UpdateCardUseCase {
        cards: state.card_repo(),
    };
    let card = usecase
        .execute(
            CardId(id),
            CardChanges {
                balance_cents: body.balance_cents,
                status: body.status,
            },
        )
        .await?;
    Ok(Json(card))
}

// ── GET /cards/passenger/{passenger_id} ──────────────────────────────────────

pub async fn list_passenger_cards(
    State(state): State<AppState>,
    session: Authenticated,
    Path(passenger_id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<Card>>, TransitError> {
    let passenger_id = PassengerId(passenger_id);
    if session.owner_filter().is_some_and(|own| own != passenger_id) {
        return Err(TransitError::PassengerNotFound);
    }
    let usecase = ListPassengerCardsUseCase {
        passengers: state.passenger_repo(),
        cards: state.card_repo(),
    };
    Ok(Json(usecase.execute(passenger_id, page).await?))
}
