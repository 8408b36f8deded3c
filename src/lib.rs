pub mod config;
pub mod csrf;
pub mod entry;
pub mod handlers;
pub mod services;
pub mod types;
pub mod views;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use csrf::CsrfTokens;
use services::Ledger;

pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub csrf: CsrfTokens,
}

impl AppState {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(ledger),
            csrf: CsrfTokens::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/entries", get(handlers::api_entries))
        .route("/add", post(handlers::api_add_round))
        .route("/delete/:id", delete(handlers::api_delete_entry))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(handlers::index))
        .route("/add", post(handlers::add_round))
        .route("/wipe", post(handlers::wipe))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
