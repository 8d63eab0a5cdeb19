// Routes module - wires every HTTP endpoint to its handler

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;

pub fn router(state: SharedState) -> Router {
    Router::new()
        // ===== HEALTH CHECK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))

        // ===== ACCESS =====
        .route("/admin", get(get_admin))
        .route("/trusted-sources", post(add_trusted_source))
        .route("/trusted-sources/:identity", get(get_trusted_source))
        .route("/running", post(run_switch))

        // ===== QUESTIONS =====
        .route("/questions", get(get_questions).post(add_question))
        .route("/questions/:id", get(get_question))
        .route("/questions/:id/resolve", post(resolve_question))

        // ===== BETTING & PAYOUTS =====
        .route("/questions/:id/bets", post(place_bet))
        .route("/questions/:id/bets/:bettor", get(get_bet))
        .route("/questions/:id/claim", post(claim_funds))

        // ===== ACTIVITY & ESCROW =====
        .route("/events", get(get_events))
        .route("/escrow", get(get_escrow))

        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
