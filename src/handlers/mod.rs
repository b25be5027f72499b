use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

mod gate;
mod health;
mod metrics;

pub use gate::{
    check_handler, clear_handler, delete_handler, get_handler, prune_handler, set_handler,
    size_handler,
};
pub use health::health_handler;
pub use metrics::metrics_handler;

// creating the router with routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/gate", get(size_handler).delete(clear_handler))
        .route("/gate/prune", post(prune_handler))
        .route(
            "/gate/{id}",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .route("/gate/{id}/check", post(check_handler))
        .with_state(state)
}
