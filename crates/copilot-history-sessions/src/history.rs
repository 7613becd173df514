//! Operation surface handed to request dispatchers (CLI, HTTP).
//!
//! Every operation takes primitive parameters and returns plain JSON: a list
//! of records, a single `{"message": ..}` element when nothing was found, or
//! a single `{"error": ..}` element when the query could not run.

use serde_json::{json, Value};

use crate::search::SearchQuery;
use crate::store::SessionStore;
use crate::title::TitleCache;

/// A session store plus the title cache that outlives single requests.
#[derive(Debug)]
pub struct SessionHistory {
    store: SessionStore,
    titles: TitleCache,
}

impl SessionHistory {
    pub fn new(store: SessionStore) -> Self {
        Self::with_cache(store, TitleCache::new())
    }

    pub fn with_cache(store: SessionStore, titles: TitleCache) -> Self {
        Self { store, titles }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn titles(&self) -> &TitleCache {
        &self.titles
    }

    pub fn search_sessions(
        &self,
        query: &str,
        case_sensitive: bool,
        event_type: Option<&str>,
        max_results: usize,
    ) -> Value {
        let query = SearchQuery {
            pattern: query.to_string(),
            case_sensitive,
            event_type: event_type.map(String::from),
            max_results,
        };
        self.store.search(&query).into_json()
    }

    pub fn list_recent_sessions(&self, limit: usize) -> Value {
        self.store.recent_sessions(limit, &self.titles).into_json()
    }

    pub fn get_session_stats(&self) -> Value {
        match self.store.stats() {
            Ok(stats) => serde_json::to_value(stats).unwrap_or(Value::Null),
            Err(e) => json!({ "error": e.to_string() }),
        }
    }

    pub fn get_session_conversation(&self, session_id: &str, include_tool_calls: bool) -> Value {
        self.store
            .conversation(session_id, include_tool_calls)
            .into_json()
    }

    pub fn search_by_file_path(&self, file_path: &str, max_results: usize) -> Value {
        self.store
            .search_by_file_path(file_path, max_results)
            .into_json()
    }

    pub fn search_tool_usage(&self, tool_name: Option<&str>, max_results: usize) -> Value {
        self.store
            .search_tool_usage(tool_name, max_results)
            .into_json()
    }
}
