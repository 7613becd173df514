use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default)]
    pub case_sensitive: bool,
    pub event_type: Option<String>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct FileParams {
    pub path: String,
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ToolParams {
    pub name: Option<String>,
    pub max_results: Option<usize>,
}

pub async fn search_sessions(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Value> {
    Json(state.history.search_sessions(
        &params.query,
        params.case_sensitive,
        params.event_type.as_deref(),
        params.max_results.unwrap_or(state.max_results),
    ))
}

pub async fn search_files(
    State(state): State<AppState>,
    Query(params): Query<FileParams>,
) -> Json<Value> {
    Json(
        state
            .history
            .search_by_file_path(&params.path, params.max_results.unwrap_or(state.max_results)),
    )
}

pub async fn search_tools(
    State(state): State<AppState>,
    Query(params): Query<ToolParams>,
) -> Json<Value> {
    Json(state.history.search_tool_usage(
        params.name.as_deref().filter(|n| !n.is_empty()),
        params.max_results.unwrap_or(state.max_results),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{state_for, state_with_session, SESSION_ID};

    #[tokio::test]
    async fn test_search_returns_matches() {
        let (_dir, state) = state_with_session();

        let Json(value) = search_sessions(
            State(state),
            Query(SearchParams {
                query: "fix".to_string(),
                case_sensitive: false,
                event_type: None,
                max_results: None,
            }),
        )
        .await;

        let results = value.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["session_id"], SESSION_ID);
        assert_eq!(results[0]["event_type"], "user.message");
    }

    #[tokio::test]
    async fn test_search_invalid_pattern_is_error_element() {
        let (_dir, state) = state_with_session();

        let Json(value) = search_sessions(
            State(state),
            Query(SearchParams {
                query: "(unclosed".to_string(),
                case_sensitive: false,
                event_type: None,
                max_results: None,
            }),
        )
        .await;

        assert!(value[0].get("error").is_some());
    }

    #[tokio::test]
    async fn test_search_files() {
        let (_dir, state) = state_with_session();

        let Json(value) = search_files(
            State(state),
            Query(FileParams {
                path: "src/main.rs".to_string(),
                max_results: Some(10),
            }),
        )
        .await;

        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_tools_empty_name_means_all() {
        let (_dir, state) = state_with_session();

        let Json(value) = search_tools(
            State(state),
            Query(ToolParams {
                name: Some(String::new()),
                max_results: None,
            }),
        )
        .await;

        assert_eq!(value[0]["tool_name"], "read_file");
    }

    #[tokio::test]
    async fn test_missing_store_is_error_element() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = state_for(&dir.path().join("missing"));

        let Json(value) = search_tools(
            State(state),
            Query(ToolParams {
                name: None,
                max_results: None,
            }),
        )
        .await;

        assert!(value[0]["error"]
            .as_str()
            .unwrap()
            .contains("Session directory not found"));
    }
}
