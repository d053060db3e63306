// src/api/mod.rs
pub mod handlers;

use crate::realtime::{Scheduler, ZoneMonitor};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<ZoneMonitor>,
    pub scheduler: Arc<Scheduler>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/fx_health", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        .route(
            "/trigger",
            get(handlers::trigger_analysis).post(handlers::trigger_analysis),
        )
        .route("/api/notifications/cooldowns", get(handlers::cooldowns_api))
        .layer(cors)
        .with_state(state)
}
