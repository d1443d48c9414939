//! JSON shapes exchanged with the agent runtime.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{ChatMessage, ChatRole, OutgoingMessage, ThreadInfo};

#[derive(Debug, Deserialize)]
pub(crate) struct WireThread {
    thread_id: String,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<WireThread> for ThreadInfo {
    fn from(thread: WireThread) -> Self {
        let created_at = thread
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|time| time.with_timezone(&Utc));
        ThreadInfo {
            thread_id: thread.thread_id,
            created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireThreadState {
    #[serde(default)]
    values: Value,
}

impl WireThreadState {
    pub(crate) fn messages(&self, messages_key: &str) -> Vec<ChatMessage> {
        messages_from_values(&self.values, messages_key)
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireMessage {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    additional_kwargs: WireKwargs,
}

#[derive(Debug, Default, Deserialize)]
struct WireKwargs {
    #[serde(default)]
    display: Option<Value>,
    #[serde(default)]
    is_link: Option<Value>,
    #[serde(default)]
    geolocation: Option<Value>,
    #[serde(default)]
    complete: Option<Value>,
}

/// Extracts the message list stored under `messages_key` in a state object.
///
/// Entries that are not human or assistant messages, or that fail to parse,
/// are skipped.
pub(crate) fn messages_from_values(values: &Value, messages_key: &str) -> Vec<ChatMessage> {
    let Some(items) = values.get(messages_key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<WireMessage>(item.clone()).ok())
        .filter_map(into_chat_message)
        .collect()
}

fn into_chat_message(message: WireMessage) -> Option<ChatMessage> {
    let role = message
        .kind
        .as_deref()
        .or(message.role.as_deref())
        .and_then(parse_role)?;
    let kwargs = message.additional_kwargs;
    Some(ChatMessage {
        role,
        content: content_text(&message.content),
        display: !matches!(kwargs.display, Some(Value::Bool(false))),
        is_link: kwargs.is_link.as_ref().is_some_and(truthy),
        complete: kwargs.complete.as_ref().map_or(true, truthy),
        requests_location: kwargs.geolocation.as_ref().is_some_and(truthy),
    })
}

fn parse_role(raw: &str) -> Option<ChatRole> {
    match raw {
        "human" | "user" | "HumanMessageChunk" => Some(ChatRole::Human),
        "ai" | "assistant" | "AIMessageChunk" => Some(ChatRole::Assistant),
        _ => None,
    }
}

fn content_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                Value::Object(map) => map.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn run_request_body(
    assistant_id: &str,
    messages_key: &str,
    messages: &[OutgoingMessage],
) -> Value {
    let messages: Vec<Value> = messages.iter().map(outgoing_message).collect();
    let mut input = serde_json::Map::new();
    input.insert(messages_key.to_string(), Value::Array(messages));
    json!({
        "assistant_id": assistant_id,
        "input": Value::Object(input),
        "stream_mode": ["values"],
    })
}

fn outgoing_message(message: &OutgoingMessage) -> Value {
    if message.display {
        json!({ "type": "human", "content": message.content })
    } else {
        json!({
            "type": "human",
            "content": message.content,
            "additional_kwargs": { "display": false },
        })
    }
}
