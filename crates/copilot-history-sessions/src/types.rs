use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One `.jsonl` session log on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLogFile {
    pub path: PathBuf,
    pub session_id: String,
    pub modified: SystemTime,
}

impl SessionLogFile {
    /// File name as shown in results.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Event type tag. New kinds show up over time, so anything unrecognised
/// lands in `Other` instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    SessionStart,
    UserMessage,
    AssistantMessage,
    ToolResult,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::SessionStart => "session.start",
            EventKind::UserMessage => "user.message",
            EventKind::AssistantMessage => "assistant.message",
            EventKind::ToolResult => "tool.result",
            EventKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s {
            "session.start" => EventKind::SessionStart,
            "user.message" => EventKind::UserMessage,
            "assistant.message" => EventKind::AssistantMessage,
            "tool.result" => EventKind::ToolResult,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded log line.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    /// ISO-8601 as written by the CLI, empty when absent.
    pub timestamp: String,
    pub data: EventData,
}

/// Payload of an event. `Raw` holds unknown kinds as well as known kinds
/// whose payload did not have the expected shape.
#[derive(Debug, Clone)]
pub enum EventData {
    SessionStart(SessionStartData),
    UserMessage(UserMessageData),
    AssistantMessage(AssistantMessageData),
    ToolResult(ToolResultData),
    Raw(Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copilot_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessageData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "type")]
    pub attachment_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessageData {
    /// `null` on turns that only request tools.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool_requests: Vec<ToolRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultData {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One matching event from a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub session_id: String,
    pub file: String,
    pub timestamp: String,
    pub event_type: String,
    pub matched_text: String,
    pub context: String,
}

/// One tool invocation found in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUsage {
    pub session_id: String,
    pub file: String,
    pub timestamp: String,
    pub tool_name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message of a reconstructed conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
    #[serde(skip)]
    pub call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Aggregate statistics over every session log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub total_entries: usize,
    pub event_types: BTreeMap<String, usize>,
    pub models_used: BTreeSet<String>,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Row of the recent sessions listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListing {
    pub session_id: String,
    pub title: String,
    pub model: String,
    pub started: String,
    pub modified: String,
    pub file: String,
}
