use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};

use crate::error::HistoryError;
use crate::outcome::QueryOutcome;
use crate::parser::EventReader;
use crate::store::SessionStore;
use crate::types::{EventData, SessionListing, SessionLogFile};

/// Default length of a session title before it is truncated.
pub const DEFAULT_TITLE_LENGTH: usize = 100;

/// Default number of sessions in the recent listing.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Title used when a session has no user message.
pub const UNTITLED: &str = "Untitled session";

/// Derive a title from the first user message of a session log.
///
/// Content is trimmed and newlines become spaces. A message that is blank
/// after trimming does not make a title, so the next user message is used.
pub fn session_title(path: &Path, max_length: usize) -> String {
    let Ok(events) = EventReader::open(path) else {
        return UNTITLED.to_string();
    };

    events
        .filter_map(|event| match event.data {
            EventData::UserMessage(data) => Some(data.content),
            _ => None,
        })
        .map(|content| content.trim().replace(['\r', '\n'], " "))
        .find(|content| !content.is_empty())
        .map(|content| truncate(&content, max_length))
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() > max_length {
        let head: String = text.chars().take(max_length).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Render an ISO-8601 timestamp as `YYYY-MM-DD HH:MM`.
///
/// Empty input gives `unknown`; unparsable input is cut to its first 16
/// characters.
pub fn format_timestamp(raw: &str) -> String {
    if raw.is_empty() {
        return "unknown".to_string();
    }

    match parse_timestamp(raw) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => raw.chars().take(16).collect(),
    }
}

/// Parse an ISO-8601 timestamp. Times without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|ts| ts.and_utc().fixed_offset())
}

/// A memoized title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCacheEntry {
    pub title: String,
    pub modified: SystemTime,
    pub max_length: usize,
}

/// Session titles keyed by session id.
///
/// An entry is only used while the log's modification time (and the
/// requested length) still match, so edits to a log are picked up on the
/// next lookup. Entries are never evicted.
#[derive(Debug, Default)]
pub struct TitleCache {
    entries: Mutex<HashMap<String, TitleCacheEntry>>,
}

impl TitleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Title of `file`, read from disk only on a miss.
    pub fn title(&self, file: &SessionLogFile, max_length: usize) -> String {
        if let Some(entry) = self.entry(&file.session_id) {
            if entry.modified == file.modified && entry.max_length == max_length {
                return entry.title;
            }
        }

        let title = session_title(&file.path, max_length);
        self.lock().insert(
            file.session_id.clone(),
            TitleCacheEntry {
                title: title.clone(),
                modified: file.modified,
                max_length,
            },
        );
        title
    }

    pub fn entry(&self, session_id: &str) -> Option<TitleCacheEntry> {
        self.lock().get(session_id).cloned()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TitleCacheEntry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore {
    /// The `limit` most recently modified sessions with their titles.
    /// A limit of 0 is treated as 1.
    pub fn recent_sessions(
        &self,
        limit: usize,
        titles: &TitleCache,
    ) -> QueryOutcome<SessionListing> {
        if !self.exists() {
            return QueryOutcome::Failed(HistoryError::StoreAbsent(
                self.sessions_dir().to_path_buf(),
            ));
        }

        let listings: Vec<SessionListing> = self
            .recent_files()
            .into_iter()
            .take(limit.max(1))
            .map(|file| {
                let (model, started) = session_start_info(&file.path);
                SessionListing {
                    title: titles.title(&file, DEFAULT_TITLE_LENGTH),
                    model: model.unwrap_or_else(|| "unknown".to_string()),
                    started: format_timestamp(&started),
                    modified: format_modified(file.modified),
                    file: file.path.display().to_string(),
                    session_id: file.session_id,
                }
            })
            .collect();

        QueryOutcome::from_items(listings, || "No sessions found".to_string())
    }
}

/// Model and timestamp of the `session.start` event, if any.
fn session_start_info(path: &Path) -> (Option<String>, String) {
    let Ok(events) = EventReader::open(path) else {
        return (None, String::new());
    };

    for event in events {
        if let EventData::SessionStart(data) = event.data {
            return (data.selected_model, event.timestamp);
        }
    }
    (None, String::new())
}

fn format_modified(modified: SystemTime) -> String {
    DateTime::<Local>::from(modified)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_iso_timestamp() {
        assert_eq!(format_timestamp("2025-12-01T10:30:45Z"), "2025-12-01 10:30");
        assert_eq!(
            format_timestamp("2025-12-01T10:30:45.123+02:00"),
            "2025-12-01 10:30"
        );
        assert_eq!(format_timestamp("2025-12-01T10:30:45"), "2025-12-01 10:30");
    }

    #[test]
    fn test_parse_naive_timestamp_as_utc() {
        let naive = parse_timestamp("2025-12-01T10:00:00").unwrap();
        let zulu = parse_timestamp("2025-12-01T10:00:00Z").unwrap();
        assert_eq!(naive, zulu);
        assert!(parse_timestamp("2025-12-01T09:00:00+00:00").unwrap() < naive);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_format_invalid_timestamp() {
        assert_eq!(format_timestamp("invalid"), "invalid");
        assert_eq!(
            format_timestamp("definitely not a timestamp"),
            "definitely not a"
        );
    }

    #[test]
    fn test_format_empty_timestamp() {
        assert_eq!(format_timestamp(""), "unknown");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("éééé", 2), "éé...");
    }
}
