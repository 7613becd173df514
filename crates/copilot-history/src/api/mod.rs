mod search;
mod sessions;
mod stats;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use copilot_history_sessions::SessionHistory;

use crate::config::HistoryConfig;

#[derive(Clone)]
pub struct AppState {
    pub history: Arc<SessionHistory>,
    /// Used when a request leaves `max_results` out
    pub max_results: usize,
    /// Used when a request leaves `limit` out
    pub list_limit: usize,
}

pub fn create_router(history: Arc<SessionHistory>, config: &HistoryConfig) -> Router {
    let state = AppState {
        history,
        max_results: config.max_results(),
        list_limit: config.list_limit(),
    };

    Router::new()
        .route("/api/search", get(search::search_sessions))
        .route("/api/files", get(search::search_files))
        .route("/api/tools", get(search::search_tools))
        .route("/api/sessions", get(sessions::list_sessions))
        .route(
            "/api/sessions/{id}/conversation",
            get(sessions::get_conversation),
        )
        .route("/api/stats", get(stats::get_stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;

    use copilot_history_sessions::{
        SessionHistory, SessionStore, DEFAULT_LIST_LIMIT, DEFAULT_MAX_RESULTS,
    };
    use tempfile::TempDir;

    use super::AppState;

    pub const SESSION_ID: &str = "abc123-session";

    const SESSION: &str = r#"{"type":"session.start","timestamp":"2025-12-01T10:00:00Z","data":{"sessionId":"abc123-session","selectedModel":"claude-sonnet-4"}}
{"type":"user.message","timestamp":"2025-12-01T10:00:05Z","data":{"content":"Please fix src/main.rs","attachments":[]}}
{"type":"assistant.message","timestamp":"2025-12-01T10:00:10Z","data":{"content":"Reading the file","toolRequests":[{"name":"read_file","arguments":{"filePath":"src/main.rs"},"toolCallId":"call-1"}]}}
{"type":"tool.result","timestamp":"2025-12-01T10:00:11Z","data":{"toolCallId":"call-1","result":{"content":"fn main() {}"}}}
"#;

    pub fn state_with_session() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(format!("{}.jsonl", SESSION_ID)), SESSION).unwrap();
        let state = state_for(dir.path());
        (dir, state)
    }

    pub fn state_for(dir: &Path) -> AppState {
        AppState {
            history: Arc::new(SessionHistory::new(SessionStore::with_dir(
                dir.to_path_buf(),
            ))),
            max_results: DEFAULT_MAX_RESULTS,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}
