use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Token counters reported by the service. Each one may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub total_tokens: Option<u64>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

impl Usage {
    fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |names: &[&str]| names.iter().find_map(|n| obj.get(*n).and_then(Value::as_u64));
        let usage = Self {
            total_tokens: field(&["total_tokens"]),
            input_tokens: field(&["input_tokens", "prompt_tokens"]),
            output_tokens: field(&["output_tokens", "completion_tokens"]),
        };
        if usage == Self::default() {
            None
        } else {
            Some(usage)
        }
    }
}

/// A tool call made by the agent during the cycle.
///
/// Captured best effort: when the service sends something malformed the
/// fields that could be read are kept and `error` says what went wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolInvocation {
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self {
                name: None,
                arguments: None,
                id: None,
                error: Some(format!("tool call is not an object: {}", value)),
            };
        };

        // OpenAI-style calls nest name/arguments under "function"
        let source = obj.get("function").and_then(Value::as_object).unwrap_or(obj);

        let name = source.get("name").map(value_to_string);
        let id = obj
            .get("tool_call_id")
            .or_else(|| obj.get("id"))
            .map(value_to_string);

        let mut error = None;
        let arguments = match source.get("arguments") {
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    error = Some(format!("arguments are not valid JSON: {}", e));
                    Some(Value::String(raw.clone()))
                }
            },
            Some(other) => Some(other.clone()),
            None => None,
        };

        if name.is_none() && error.is_none() {
            error = Some("tool call has no name".to_string());
        }

        Self { name, arguments, id, error }
    }
}

/// Parsed response of one activation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationResult {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
    pub stop_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl ActivationResult {
    /// Build a result from the JSON body returned by the messages endpoint.
    ///
    /// The last assistant message supplies the text and tool calls; if there
    /// is none, the first message carrying content is used for the text.
    pub fn from_json(body: &Value) -> Self {
        let mut result = Self::default();

        match body.get("messages").and_then(Value::as_array) {
            Some(messages) => {
                let assistant = messages.iter().rev().find(|m| is_assistant(m));
                if let Some(msg) = assistant {
                    result.text = msg.get("content").and_then(content_text);
                }

                // Tool calls may ride on the assistant message or arrive as separate messages
                for msg in messages {
                    if let Some(calls) = msg.get("tool_calls") {
                        match calls.as_array() {
                            Some(list) => {
                                result.tool_calls.extend(list.iter().map(ToolInvocation::from_json))
                            }
                            None if calls.is_null() => {}
                            None => {
                                warn!("Ignoring tool_calls field that is not a list");
                                result.tool_calls.push(ToolInvocation::from_json(calls));
                            }
                        }
                    }
                    if let Some(call) = msg.get("tool_call").filter(|c| !c.is_null()) {
                        result.tool_calls.push(ToolInvocation::from_json(call));
                    }
                }

                if result.text.is_none() {
                    result.text = messages
                        .iter()
                        .find_map(|m| m.get("content").and_then(content_text));
                }
            }
            None => {
                result.text = body.get("content").and_then(content_text);
            }
        }

        result.stop_reason = body.get("stop_reason").and_then(stop_reason_text);
        result.usage = body.get("usage").and_then(Usage::from_json);
        result
    }

    pub fn tool_call_count(&self) -> usize {
        self.tool_calls.len()
    }
}

fn is_assistant(msg: &Value) -> bool {
    msg.get("role").and_then(Value::as_str) == Some("assistant")
        || msg.get("message_type").and_then(Value::as_str) == Some("assistant_message")
}

fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let joined: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str).or_else(|| p.as_str()))
                .collect();
            if joined.is_empty() {
                Some(content.to_string())
            } else {
                Some(joined.join("\n"))
            }
        }
        other => Some(other.to_string()),
    }
}

fn stop_reason_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
