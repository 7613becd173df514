use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::{Event, EventData, EventKind};

/// Decode one JSONL line into an [`Event`].
pub fn decode_line(line: &str) -> Result<Event, DecodeError> {
    let value: Value = serde_json::from_str(line)?;
    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = match object.get("type") {
        Some(Value::String(kind)) => EventKind::from(kind.as_str()),
        _ => return Err(DecodeError::MissingType),
    };
    let timestamp = match object.get("timestamp") {
        Some(Value::String(ts)) => ts.clone(),
        _ => String::new(),
    };
    let data = object.remove("data").unwrap_or(Value::Null);

    let data = match kind {
        EventKind::SessionStart => typed(data, EventData::SessionStart),
        EventKind::UserMessage => typed(data, EventData::UserMessage),
        EventKind::AssistantMessage => typed(data, EventData::AssistantMessage),
        EventKind::ToolResult => typed(data, EventData::ToolResult),
        EventKind::Other(_) => EventData::Raw(data),
    };

    Ok(Event {
        kind,
        timestamp,
        data,
    })
}

/// Parse `data` into the typed payload, keeping the raw value when it does
/// not fit.
fn typed<T>(data: Value, wrap: fn(T) -> EventData) -> EventData
where
    T: for<'de> Deserialize<'de>,
{
    match T::deserialize(&data) {
        Ok(payload) => wrap(payload),
        Err(_) => EventData::Raw(data),
    }
}

/// Lazily yields the events of one session file in file order.
///
/// Blank and undecodable lines are skipped. The file is closed when the
/// reader is dropped; iterating again means opening a new reader.
pub struct EventReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl EventReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open session file: {:?}", path))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }
}

impl Iterator for EventReader {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    self.line_number += 1;
                    tracing::trace!(
                        "Skipping non UTF-8 line {} in {:?}",
                        self.line_number,
                        self.path
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Stopped reading {:?}: {}", self.path, e);
                    return None;
                }
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            match decode_line(&line) {
                Ok(event) => return Some(event),
                Err(e) => {
                    tracing::trace!(
                        "Skipping line {} in {:?}: {}",
                        self.line_number,
                        self.path,
                        e
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_user_message() {
        let line = r#"{"type":"user.message","timestamp":"2025-12-01T10:01:00Z","data":{"content":"hi","attachments":[{"displayName":"main.py","path":"/src/main.py"}]}}"#;
        let event = decode_line(line).unwrap();

        assert_eq!(event.kind, EventKind::UserMessage);
        assert_eq!(event.timestamp, "2025-12-01T10:01:00Z");
        match event.data {
            EventData::UserMessage(data) => {
                assert_eq!(data.content, "hi");
                assert_eq!(data.attachments.len(), 1);
                assert_eq!(data.attachments[0].display_name.as_deref(), Some("main.py"));
                assert_eq!(data.attachments[0].path.as_deref(), Some("/src/main.py"));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_kind_keeps_payload() {
        let event = decode_line(r#"{"type":"session.idle","data":{"reason":"timeout"}}"#).unwrap();

        assert_eq!(event.kind, EventKind::Other("session.idle".to_string()));
        assert_eq!(event.timestamp, "");
        match event.data {
            EventData::Raw(value) => assert_eq!(value["reason"], "timeout"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_decode_mismatched_payload_falls_back_to_raw() {
        let event = decode_line(r#"{"type":"user.message","data":{"content":42}}"#).unwrap();

        assert_eq!(event.kind, EventKind::UserMessage);
        assert!(matches!(event.data, EventData::Raw(_)));
    }

    #[test]
    fn test_decode_null_fields_as_empty() {
        let line = r#"{"type":"assistant.message","data":{"content":null,"toolRequests":[{"name":"read_file","arguments":{"filePath":"a.rs"}}]}}"#;
        match decode_line(line).unwrap().data {
            EventData::AssistantMessage(data) => {
                assert_eq!(data.content, "");
                assert_eq!(data.tool_requests.len(), 1);
                assert_eq!(data.tool_requests[0].name, "read_file");
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        let line = r#"{"type":"assistant.message","data":{"content":"done","toolRequests":null}}"#;
        match decode_line(line).unwrap().data {
            EventData::AssistantMessage(data) => assert!(data.tool_requests.is_empty()),
            other => panic!("unexpected payload: {:?}", other),
        }

        let line = r#"{"type":"user.message","data":{"content":"hi","attachments":null}}"#;
        assert!(matches!(
            decode_line(line).unwrap().data,
            EventData::UserMessage(_)
        ));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(decode_line("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode_line("[1,2,3]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(
            decode_line(r#"{"timestamp":"x","data":{}}"#),
            Err(DecodeError::MissingType)
        ));
        assert!(matches!(
            decode_line(r#"{"type":7}"#),
            Err(DecodeError::MissingType)
        ));
    }

    #[test]
    fn test_reader_skips_bad_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("s.jsonl");
        std::fs::write(
            &path,
            "{\"type\":\"session.start\",\"data\":{}}\n\ngarbage\n{\"data\":{}}\n{\"type\":\"user.message\",\"data\":{\"content\":\"x\"}}\n",
        )
        .unwrap();

        let kinds: Vec<EventKind> = EventReader::open(&path).unwrap().map(|e| e.kind).collect();

        assert_eq!(kinds, vec![EventKind::SessionStart, EventKind::UserMessage]);
    }

    #[test]
    fn test_reader_missing_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(EventReader::open(&dir.path().join("missing.jsonl")).is_err());
    }
}
