//! Message adapters - convert between different API formats

use crate::types::{ChatMessage, MessageRole, ToolDefinition};
use serde_json::{Map, Value, json};

/// Adapter for converting messages to different API formats
pub struct MessageAdapter;

impl MessageAdapter {
    /// Convert messages to OpenAI chat-completions format.
    ///
    /// Tool call arguments are sent as JSON-encoded strings, as that API
    /// requires.
    pub fn to_openai_format(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::Assistant if msg.requests_tools() => {
                    let calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": encode_arguments(&call.arguments),
                                }
                            })
                        })
                        .collect();
                    let content = if msg.content.is_empty() {
                        Value::Null
                    } else {
                        Value::String(msg.content.clone())
                    };
                    json!({
                        "role": "assistant",
                        "content": content,
                        "tool_calls": calls,
                    })
                }
                MessageRole::Tool => json!({
                    "role": "tool",
                    "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
                    "content": msg.content.clone(),
                }),
                role => json!({
                    "role": role.as_str(),
                    "content": msg.content.clone()
                }),
            })
            .collect()
    }

    /// Convert messages to Ollama `/api/chat` format.
    /// Same as OpenAI except tool call arguments stay JSON objects and
    /// calls carry no ids.
    pub fn to_ollama_format(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::Assistant if msg.requests_tools() => {
                    let calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments,
                                }
                            })
                        })
                        .collect();
                    json!({
                        "role": "assistant",
                        "content": msg.content.clone(),
                        "tool_calls": calls,
                    })
                }
                role => json!({
                    "role": role.as_str(),
                    "content": msg.content.clone()
                }),
            })
            .collect()
    }

    /// Function definitions in the `{"type":"function","function":{...}}`
    /// shape shared by OpenAI-compatible servers and Ollama.
    pub fn tools_to_function_format(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect()
    }

    /// Decodes the argument string of an OpenAI tool call.
    ///
    /// An empty string means "no arguments". Undecodable text is preserved as
    /// a JSON string so the normalizer can report it instead of the client
    /// failing the whole response.
    pub fn decode_arguments(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Object(Map::new());
        }
        serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(raw.to_string()))
    }
}

fn encode_arguments(arguments: &Value) -> String {
    match arguments {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}
