use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use tuapp_domain::id::PassengerId;
use tuapp_domain::pagination::PageRequest;

use crate::domain::types::{NewPassenger, Passenger, PassengerChanges};
use crate::error::TransitError;
use crate::handlers::extract::{AdminSession, Authenticated};
use crate::state::AppState;
use crate::usecase::passenger::{
    CreatePassengerUseCase, DeletePassengerUseCase, GetPassengerUseCase, ListPassengersUseCase,
    UpdatePassengerUseCase,
};

// ── POST /passengers ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreatePassengerRequest {
    pub name: String,
    pub surname_1: String,
    #[serde(default)]
    pub surname_2: Option<String>,
    pub document: String,
    pub email: String,
}

pub async fn create_passenger(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(body): Json<CreatePassengerRequest>,
) -> Result<(StatusCode, Json<Passenger>), TransitError> {
    let usecase = CreatePassengerUseCase {
        passengers: state.passenger_repo(),
    };
    let passenger = usecase
        .execute(NewPassenger {
            name: body.name,
            surname_1: body.surname_1,
            surname_2: body.surname_2,
            document: body.document,
            email: body.email,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(passenger)))
}

// ── GET /passengers/{id} ─────────────────────────────────────────────────────

pub async fn get_passenger(
    State(state): State<AppState>,
    session: Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<Passenger>, TransitError> {
    let id = PassengerId(id);
    if session.owner_filter().is_some_and(|own| own != id) {
        return Err(TransitError::PassengerNotFound);
    }
    let usecase = GetPassengerUseCase {
        passengers: state.passenger_repo(),
    };
    Ok(Json(usecase.execute(id).await?))
}

// ── GET /passengers ──────────────────────────────────────────────────────────

pub async fn list_passengers(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<Passenger>>, TransitError> {
    let usecase = ListPassengersUseCase {
        passengers: state.passenger_repo(),
    };
    Ok(Json(usecase.execute(page).await?))
}

// ── PUT /passengers/{id} ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdatePassengerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname_1: Option<String>,
    #[serde(default)]
    pub surname_2: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub session_active: Option<bool>,
}

pub async fn update_passenger(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePassengerRequest>,
) -> Result<Json<Passenger>, TransitError> {
    let usecase = UpdatePassengerUseCase {
        passengers: state.passenger_repo(),
    };
    let passenger = usecase
        .execute(
            PassengerId(id),
            PassengerChanges {
                name: body.name,
                surname_1: body.surname_1,
                surname_2: body.surname_2,
                document: body.document,
                email: body.email,
                session_active: body.session_active,
            },
        )
        .await?;
    Ok(Json(passenger))
}

// ── DELETE /passengers/{id} ──────────────────────────────────────────────────

pub async fn delete_passenger(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i64>,
) -> Result<StatusCode, TransitError> {
    let usecase = DeletePassengerUseCase {
        passengers: state.passenger_repo(),
    };
    usecase.execute(PassengerId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
