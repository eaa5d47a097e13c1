pub mod auth;
pub mod dashboard;
pub mod profile;
pub mod search;
pub mod session;
pub mod surveys;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router(state.clone()))
        .merge(dashboard::router(state.clone()))
        .merge(profile::router(state.clone()))
        .merge(search::router(state.clone()))
        .nest("/survey", surveys::router(state))
}
