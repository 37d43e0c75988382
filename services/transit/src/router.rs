use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use tuapp_core::health::healthz;
use tuapp_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    auth::{login_admin, register, request_two_factor, verify_two_factor},
    cards::{create_card, get_card, list_cards, list_passenger_cards, update_card},
    health::readyz,
    passengers::{
        create_passenger, delete_passenger, get_passenger, list_passengers, update_passenger,
    },
    users::{create_user, delete_user, get_current_user, get_user, list_users, update_user},
    virtual_cards::{issue_virtual_card, render_virtual_card, verify_virtual_card},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Admin accounts
        .route("/auth/register", post(register))
        .route("/auth/token", post(login_admin))
        // Passenger 2FA
        .route("/auth/login", post(request_two_factor))
        .route("/auth/verify", post(verify_two_factor))
        // Admin user management
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(get_current_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        // Passengers
        .route("/passengers", get(list_passengers).post(create_passenger))
        .route(
            "/passengers/{id}",
            get(get_passenger).put(update_passenger).delete(delete_passenger),
        )
        // Cards
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/{id}", get(get_card).put(update_card))
        .route("/cards/passenger/{passenger_id}", get(list_passenger_cards))
        // Virtual cards
        .route("/virtual-cards", post(issue_virtual_card))
        .route("/virtual-cards/verify", post(verify_virtual_card))
        .route("/virtual-cards/{id}/qr", get(render_virtual_card));

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
