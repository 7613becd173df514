//! Flattening of event payloads into the text that queries match against.

use serde_json::Value;

use crate::types::{Event, EventData};

/// Build the searchable text of an event.
///
/// Every literal a user may want to find is included verbatim: message
/// content, attachment names and paths, tool names, tool argument values and
/// tool result text.
pub fn searchable_text(event: &Event) -> String {
    let mut parts: Vec<String> = Vec::new();

    match &event.data {
        EventData::UserMessage(data) => {
            parts.push(data.content.clone());
            for attachment in &data.attachments {
                parts.extend(attachment.display_name.iter().cloned());
                parts.extend(attachment.path.iter().cloned());
            }
        }
        EventData::AssistantMessage(data) => {
            parts.push(data.content.clone());
            for request in &data.tool_requests {
                parts.push(request.name.clone());
                if !request.arguments.is_null() {
                    parts.push(request.arguments.to_string());
                    collect_strings(&request.arguments, &mut parts);
                }
            }
        }
        EventData::ToolResult(data) => parts.push(tool_result_text(&data.result)),
        EventData::SessionStart(data) => {
            parts.push(serde_json::to_string(data).unwrap_or_default());
        }
        EventData::Raw(value) => parts.push(render(value)),
    }

    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

/// Text of a tool result: its `content` field, the string itself, or the
/// JSON rendering of whatever else it is.
pub fn tool_result_text(result: &Value) -> String {
    match result {
        Value::Object(map) => match map.get("content") {
            Some(Value::String(content)) => content.clone(),
            _ => result.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Push every string leaf of `value`. JSON rendering escapes backslashes and
/// quotes, so the raw strings are added as well.
fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}
