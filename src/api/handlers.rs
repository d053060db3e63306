// src/api/handlers.rs
use crate::api::AppState;
use crate::notifications::AlertStateEntry;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};

pub const HEALTH_MESSAGE: &str = "FX zone alert bot is running.";
pub const TRIGGER_ACCEPTED: &str = "Analysis triggered in background";

#[derive(Debug, Default, Deserialize)]
pub struct TriggerParams {
    #[serde(default)]
    pub force: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": HEALTH_MESSAGE,
        "scheduler_running": state.scheduler.is_running(),
        "analysis_in_progress": state.monitor.is_busy(),
        "last_run": state.monitor.last_run(),
        "timestamp": Utc::now()
    }))
}

/// Starts a run on a background task and answers immediately.
pub async fn trigger_analysis(
    State(state): State<AppState>,
    Query(params): Query<TriggerParams>,
) -> Json<Value> {
    info!("🌐 Analysis trigger received (force={})", params.force);
    let monitor = state.monitor.clone();
    let force = params.force;
    tokio::spawn(async move {
        monitor.run_once(force).await;
    });

    Json(json!({
        "status": TRIGGER_ACCEPTED,
        "force": force
    }))
}

pub async fn cooldowns_api(State(state): State<AppState>) -> Json<Vec<AlertStateEntry>> {
    Json(state.monitor.cooldowns(Utc::now()))
}
