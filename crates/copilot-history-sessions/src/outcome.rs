use serde::Serialize;
use serde_json::{json, Value};

use crate::error::HistoryError;

/// Result of a list-shaped query.
///
/// Callers must be able to tell "nothing matched" from "the query could not
/// run", and both from a non-empty answer, so each case has its own variant.
#[derive(Debug)]
pub enum QueryOutcome<T> {
    Found(Vec<T>),
    Empty(String),
    Failed(HistoryError),
}

impl<T> QueryOutcome<T> {
    /// `Found` for a non-empty list, `Empty(reason)` otherwise.
    pub fn from_items(items: Vec<T>, reason: impl FnOnce() -> String) -> Self {
        if items.is_empty() {
            QueryOutcome::Empty(reason())
        } else {
            QueryOutcome::Found(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            QueryOutcome::Found(items) => items,
            _ => &[],
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, QueryOutcome::Found(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, QueryOutcome::Empty(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }
}

impl<T: Serialize> QueryOutcome<T> {
    /// Flatten to the plain shape handed to callers: the list itself,
    /// `[{"message": ..}]` when nothing was found, `[{"error": ..}]` on failure.
    pub fn into_json(self) -> Value {
        match self {
            QueryOutcome::Found(items) => items
                .iter()
                .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
                .collect::<Vec<_>>()
                .into(),
            QueryOutcome::Empty(message) => json!([{ "message": message }]),
            QueryOutcome::Failed(error) => json!([{ "error": error.to_string() }]),
        }
    }
}
