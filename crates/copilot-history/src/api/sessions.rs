use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationParams {
    #[serde(default)]
    pub include_tool_calls: bool,
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    Json(
        state
            .history
            .list_recent_sessions(params.limit.unwrap_or(state.list_limit)),
    )
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ConversationParams>,
) -> Json<Value> {
    Json(
        state
            .history
            .get_session_conversation(&id, params.include_tool_calls),
    )
}
