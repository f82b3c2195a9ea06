use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};

use crate::errors::AgentError;
use crate::models::message::{Message, MessageContent};
use crate::models::tool::{Tool, ToolCall};

/// Marker a reasoning model closes its thought trace with. Everything up
/// to and including the last occurrence is split off as "thoughts".
pub const THOUGHT_MARKER: &str = "</think>";

/// Thoughts value used when a response carries no marker.
pub const NO_THOUGHTS: &str = "This model provided no thoughts.";

/// Convert internal Message format to OpenAI's API message specification.
/// Tool responses become separate `tool`-role wire messages carrying the
/// id of the request they answer.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role
        });

        let mut output = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    if !text.text.is_empty() {
                        converted["content"] = json!(text.text);
                    }
                }
                MessageContent::ToolRequest(request) => match &request.tool_call {
                    Ok(tool_call) => {
                        let sanitized_name = sanitize_function_name(&tool_call.name);
                        let tool_calls = converted
                            .as_object_mut()
                            .unwrap()
                            .entry("tool_calls")
                            .or_insert(json!([]));

                        tool_calls.as_array_mut().unwrap().push(json!({
                            "id": request.id,
                            "type": "function",
                            "function": {
                                "name": sanitized_name,
                                "arguments": tool_call.arguments.to_string(),
                            }
                        }));
                    }
                    Err(e) => {
                        output.push(json!({
                            "role": "tool",
                            "content": format!("Error: {}", e),
                            "tool_call_id": request.id
                        }));
                    }
                },
                MessageContent::ToolResponse(response) => match &response.tool_result {
                    Ok(contents) => {
                        let text = contents
                            .iter()
                            .filter_map(|content| content.as_text())
                            .collect::<Vec<_>>()
                            .join("\n");
                        output.push(json!({
                            "role": "tool",
                            "content": text,
                            "tool_call_id": response.id
                        }));
                    }
                    Err(e) => {
                        // An error result is still surfaced as tool output so
                        // the model can interpret it and adjust
                        output.push(json!({
                            "role": "tool",
                            "content": format!("Error: {}", e),
                            "tool_call_id": response.id
                        }));
                    }
                },
            }
        }

        if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
            output.insert(0, converted);
        }
        messages_spec.extend(output);
    }

    messages_spec
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .map(|choice| choice["message"].clone())
        .ok_or_else(|| anyhow!("no response"))?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(|text| text.as_str()) {
        message = message.with_text(text);
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|calls| calls.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default().to_string();
            let function_name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = tool_call["function"]["arguments"]
                .as_str()
                .unwrap_or_default()
                .to_string();

            if !is_valid_function_name(&function_name) {
                let error = AgentError::ToolNotFound(format!(
                    "The provided function name '{}' had invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                    function_name
                ));
                message = message.with_tool_request(id, Err(error));
            } else {
                match serde_json::from_str::<Value>(&arguments) {
                    Ok(params) => {
                        message = message
                            .with_tool_request(id, Ok(ToolCall::new(&function_name, params)));
                    }
                    Err(e) => {
                        let error = AgentError::InvalidParameters(format!(
                            "Could not interpret tool use parameters for id {}: {}",
                            id, e
                        ));
                        message = message.with_tool_request(id, Err(error));
                    }
                }
            }
        }
    }

    Ok(message)
}

/// Split a response into a thought trace and the visible content. The
/// split happens at the last marker occurrence; the marker stays with
/// the thoughts. `None` thoughts means the marker was absent.
pub fn split_thoughts(content: &str) -> (Option<String>, String) {
    match content.rfind(THOUGHT_MARKER) {
        Some(index) => {
            let end = index + THOUGHT_MARKER.len();
            let thoughts = content[..end].trim().to_string();
            (Some(thoughts), content[end..].to_string())
        }
        None => (None, content.to_string()),
    }
}

fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    re.replace_all(name, "_").to_string()
}

fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}
