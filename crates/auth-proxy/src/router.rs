use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/reset-password", post(handlers::reset_password))
        .route("/update-password", put(handlers::update_password))
        .route("/me", get(handlers::me))
        .route("/account", delete(handlers::delete_account))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
