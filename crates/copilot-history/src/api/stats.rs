use axum::extract::State;
use axum::response::Json;
use serde_json::Value;

use super::AppState;

pub async fn get_stats(State(state): State<AppState>) -> Json<Value> {
    Json(state.history.get_session_stats())
}
