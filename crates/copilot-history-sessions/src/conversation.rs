use serde_json::Value;

use crate::error::HistoryError;
use crate::extract::tool_result_text;
use crate::outcome::QueryOutcome;
use crate::parser::EventReader;
use crate::store::SessionStore;
use crate::types::{
    ConversationMessage, EventData, EventKind, Role, ToolCall, ToolResultData, UserMessageData,
};

impl SessionStore {
    /// Replay a session into system/user/assistant messages, in file order.
    ///
    /// The session is the most recent one whose id contains `fragment`.
    /// Tool results never become messages of their own; with
    /// `include_tool_calls` they are attached to the call they answer.
    pub fn conversation(
        &self,
        fragment: &str,
        include_tool_calls: bool,
    ) -> QueryOutcome<ConversationMessage> {
        if !self.exists() {
            return QueryOutcome::Failed(HistoryError::StoreAbsent(
                self.sessions_dir().to_path_buf(),
            ));
        }

        let Some(file) = self.find_session(fragment) else {
            return QueryOutcome::Failed(HistoryError::SessionNotFound(fragment.to_string()));
        };

        let events = match EventReader::open(&file.path) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Failed to read session {}: {:#}", file.session_id, e);
                return QueryOutcome::Failed(HistoryError::SessionNotFound(
                    fragment.to_string(),
                ));
            }
        };

        let mut messages: Vec<ConversationMessage> = Vec::new();

        for event in events {
            match event.data {
                EventData::SessionStart(data) => messages.push(ConversationMessage {
                    role: Role::System,
                    content: format!(
                        "Session started (model: {})",
                        data.selected_model.as_deref().unwrap_or("unknown")
                    ),
                    timestamp: event.timestamp,
                    tool_calls: None,
                }),
                EventData::UserMessage(data) => messages.push(ConversationMessage {
                    role: Role::User,
                    content: user_content(&data),
                    timestamp: event.timestamp,
                    tool_calls: None,
                }),
                EventData::AssistantMessage(data) => {
                    let tool_calls = include_tool_calls.then(|| {
                        data.tool_requests
                            .into_iter()
                            .map(|request| ToolCall {
                                name: request.name,
                                arguments: request.arguments,
                                call_id: request.tool_call_id,
                                result: None,
                            })
                            .collect()
                    });
                    messages.push(ConversationMessage {
                        role: Role::Assistant,
                        content: data.content,
                        timestamp: event.timestamp,
                        tool_calls,
                    });
                }
                EventData::ToolResult(data) if include_tool_calls => {
                    attach_tool_result(&mut messages, &data);
                }
                // A message whose payload did not decode still counts as a
                // message; keep whatever content string it carries.
                EventData::Raw(value) => {
                    let role = match event.kind {
                        EventKind::UserMessage => Role::User,
                        EventKind::AssistantMessage => Role::Assistant,
                        _ => continue,
                    };
                    messages.push(ConversationMessage {
                        role,
                        content: raw_content(&value),
                        timestamp: event.timestamp,
                        tool_calls: (include_tool_calls && role == Role::Assistant)
                            .then(Vec::new),
                    });
                }
                EventData::ToolResult(_) => {}
            }
        }

        QueryOutcome::from_items(messages, || {
            format!("No messages in session '{}'", file.session_id)
        })
    }
}

fn raw_content(value: &Value) -> String {
    value
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn user_content(data: &UserMessageData) -> String {
    let references: Vec<String> = data
        .attachments
        .iter()
        .filter_map(|a| match (a.display_name.as_deref(), a.path.as_deref()) {
            (Some(name), Some(path)) => Some(format!("{} ({})", name, path)),
            (Some(name), None) => Some(name.to_string()),
            (None, Some(path)) => Some(path.to_string()),
            (None, None) => None,
        })
        .collect();

    if references.is_empty() {
        data.content.clone()
    } else {
        format!("{}\n\nAttachments: {}", data.content, references.join(", "))
    }
}

/// Store a tool result on the latest assistant message: on the call with the
/// same id when ids are present, else on its first unanswered call.
fn attach_tool_result(messages: &mut [ConversationMessage], data: &ToolResultData) {
    let Some(calls) = messages
        .iter_mut()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .and_then(|m| m.tool_calls.as_mut())
    else {
        return;
    };

    let by_id = data.tool_call_id.as_deref().and_then(|id| {
        calls
            .iter()
            .position(|c| c.result.is_none() && c.call_id.as_deref() == Some(id))
    });
    let slot = by_id.or_else(|| calls.iter().position(|c| c.result.is_none()));

    if let Some(index) = slot {
        calls[index].result = Some(tool_result_text(&data.result));
    }
}
