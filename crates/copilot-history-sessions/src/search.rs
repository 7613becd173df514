use regex::{Regex, RegexBuilder};

use crate::error::HistoryError;
use crate::extract::searchable_text;
use crate::outcome::QueryOutcome;
use crate::parser::EventReader;
use crate::store::SessionStore;
use crate::title::format_timestamp;
use crate::types::{Event, EventData, EventKind, SearchResult, SessionLogFile, ToolUsage};

/// Default cap on the number of results of a scan.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Characters of context kept on each side of a match.
const CONTEXT_CHARS: usize = 100;

/// Parameters of a full-text search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Regular expression matched against each event's searchable text.
    pub pattern: String,
    pub case_sensitive: bool,
    /// Only events of this type (e.g. `user.message`) when set.
    pub event_type: Option<String>,
    pub max_results: usize,
}

impl SearchQuery {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_sensitive: false,
            event_type: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SessionStore {
    /// Search every session, most recent first, stopping once
    /// `max_results` matches have been collected.
    pub fn search(&self, query: &SearchQuery) -> QueryOutcome<SearchResult> {
        if !self.exists() {
            return QueryOutcome::Failed(HistoryError::StoreAbsent(
                self.sessions_dir().to_path_buf(),
            ));
        }

        let regex = match RegexBuilder::new(&query.pattern)
            .case_insensitive(!query.case_sensitive)
            .build()
        {
            Ok(regex) => regex,
            Err(source) => {
                return QueryOutcome::Failed(HistoryError::InvalidPattern {
                    pattern: query.pattern.clone(),
                    source,
                })
            }
        };

        let results = self.scan_matches(&regex, query.max_results, |event| {
            query
                .event_type
                .as_deref()
                .map_or(true, |wanted| event.kind.as_str() == wanted)
        });

        QueryOutcome::from_items(results, || {
            format!("No matches found for '{}'", query.pattern)
        })
    }

    /// Find messages referencing a file path (attachments, tool arguments).
    /// The fragment is matched literally and case-insensitively.
    pub fn search_by_file_path(
        &self,
        fragment: &str,
        max_results: usize,
    ) -> QueryOutcome<SearchResult> {
        if !self.exists() {
            return QueryOutcome::Failed(HistoryError::StoreAbsent(
                self.sessions_dir().to_path_buf(),
            ));
        }

        let regex = match RegexBuilder::new(&regex::escape(fragment))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => regex,
            Err(source) => {
                return QueryOutcome::Failed(HistoryError::InvalidPattern {
                    pattern: fragment.to_string(),
                    source,
                })
            }
        };

        let results = self.scan_matches(&regex, max_results, |event| {
            matches!(
                event.kind,
                EventKind::UserMessage | EventKind::AssistantMessage
            )
        });

        QueryOutcome::from_items(results, || {
            format!("No references found to '{}'", fragment)
        })
    }

    /// List tool invocations, optionally only those whose name contains
    /// `tool_name` (case-insensitive).
    pub fn search_tool_usage(
        &self,
        tool_name: Option<&str>,
        max_results: usize,
    ) -> QueryOutcome<ToolUsage> {
        if !self.exists() {
            return QueryOutcome::Failed(HistoryError::StoreAbsent(
                self.sessions_dir().to_path_buf(),
            ));
        }

        let max_results = max_results.max(1);
        let needle = tool_name.map(str::to_lowercase);
        let mut results: Vec<ToolUsage> = Vec::new();

        'files: for file in self.recent_files() {
            let Some(events) = open_events(&file) else {
                continue;
            };

            for event in events {
                let EventData::AssistantMessage(data) = &event.data else {
                    continue;
                };

                for request in &data.tool_requests {
                    if let Some(ref needle) = needle {
                        if !request.name.to_lowercase().contains(needle) {
                            continue;
                        }
                    }

                    results.push(ToolUsage {
                        session_id: file.session_id.clone(),
                        file: file.file_name(),
                        timestamp: format_timestamp(&event.timestamp),
                        tool_name: request.name.clone(),
                        arguments: request.arguments.clone(),
                    });

                    if results.len() >= max_results {
                        break 'files;
                    }
                }
            }
        }

        QueryOutcome::from_items(results, || match tool_name {
            Some(name) => format!("No usage found for tool '{}'", name),
            None => "No tool usage found".to_string(),
        })
    }

    /// Shared scan loop: files most recent first, events in file order,
    /// global cap across all files.
    fn scan_matches(
        &self,
        regex: &Regex,
        max_results: usize,
        accept: impl Fn(&Event) -> bool,
    ) -> Vec<SearchResult> {
        let max_results = max_results.max(1);
        let mut results: Vec<SearchResult> = Vec::new();

        for file in self.recent_files() {
            let Some(events) = open_events(&file) else {
                continue;
            };

            for event in events {
                if !accept(&event) {
                    continue;
                }

                let text = searchable_text(&event);
                let Some(m) = regex.find(&text) else {
                    continue;
                };

                results.push(SearchResult {
                    session_id: file.session_id.clone(),
                    file: file.file_name(),
                    timestamp: format_timestamp(&event.timestamp),
                    event_type: event.kind.to_string(),
                    matched_text: m.as_str().to_string(),
                    context: context_window(&text, m.start(), m.end()),
                });

                if results.len() >= max_results {
                    tracing::debug!("Search stopped at {} results", max_results);
                    return results;
                }
            }
        }

        results
    }
}

fn open_events(file: &SessionLogFile) -> Option<EventReader> {
    match EventReader::open(&file.path) {
        Ok(reader) => Some(reader),
        Err(e) => {
            tracing::warn!("Skipping session {}: {:#}", file.session_id, e);
            None
        }
    }
}

/// Up to `CONTEXT_CHARS` characters either side of `start..end`, with
/// ellipses where the text was cut and newlines flattened.
fn context_window(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(CONTEXT_CHARS)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    let mut window = String::new();
    if from > 0 {
        window.push_str("...");
    }
    window.push_str(&text[from..to].replace(['\r', '\n'], " "));
    if to < text.len() {
        window.push_str("...");
    }
    window
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_window_short_text_is_whole() {
        let text = "fix the parser bug";
        let start = text.find("parser").unwrap();
        assert_eq!(context_window(text, start, start + 6), text);
    }

    #[test]
    fn test_context_window_bounds_long_text() {
        let text = format!("{}needle{}", "a".repeat(300), "b".repeat(300));
        let start = text.find("needle").unwrap();
        let window = context_window(&text, start, start + 6);

        assert!(window.starts_with("..."));
        assert!(window.ends_with("..."));
        assert!(window.contains("needle"));
        assert_eq!(window.chars().count(), 3 + CONTEXT_CHARS + 6 + CONTEXT_CHARS + 3);
    }

    #[test]
    fn test_context_window_multibyte() {
        let text = format!("{}ключ{}", "ü".repeat(150), "é".repeat(150));
        let start = text.find("ключ").unwrap();
        let window = context_window(&text, start, start + "ключ".len());

        assert!(window.contains("ключ"));
        assert_eq!(window.chars().count(), 3 + CONTEXT_CHARS + 4 + CONTEXT_CHARS + 3);
    }

    #[test]
    fn test_context_window_flattens_newlines() {
        let text = "line one\nline two";
        let start = text.find("two").unwrap();
        assert_eq!(context_window(text, start, start + 3), "line one line two");
    }
}
