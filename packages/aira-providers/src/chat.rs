//! OpenAI-compatible chat completions with function tools.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
	System(String),
	User(String),
	Assistant(String),
	/// An assistant turn that requested tools instead of answering.
	AssistantToolCalls(Vec<ToolCall>),
	/// A tool result, tagged with the id of the call it answers.
	Tool { call_id: String, content: String },
}
impl ChatMessage {
	pub fn to_wire(&self) -> Value {
		match self {
			Self::System(content) => serde_json::json!({ "role": "system", "content": content }),
			Self::User(content) => serde_json::json!({ "role": "user", "content": content }),
			Self::Assistant(content) =>
				serde_json::json!({ "role": "assistant", "content": content }),
			Self::AssistantToolCalls(calls) => serde_json::json!({
				"role": "assistant",
				"content": Value::Null,
				"tool_calls": calls.iter().map(ToolCall::to_wire).collect::<Vec<_>>(),
			}),
			Self::Tool { call_id, content } => serde_json::json!({
				"role": "tool",
				"tool_call_id": call_id,
				"content": content,
			}),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
	pub id: String,
	pub name: String,
	/// Always a JSON object; malformed arguments from the model become an empty object.
	pub arguments: Value,
}
impl ToolCall {
	fn to_wire(&self) -> Value {
		serde_json::json!({
			"id": self.id,
			"type": "function",
			"function": {
				"name": self.name,
				"arguments": self.arguments.to_string(),
			},
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
	pub name: String,
	pub description: String,
	/// JSON schema of the arguments object.
	pub parameters: Value,
}
impl ToolDefinition {
	pub fn to_wire(&self) -> Value {
		serde_json::json!({
			"type": "function",
			"function": {
				"name": self.name,
				"description": self.description,
				"parameters": self.parameters,
			},
		})
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
	Answer(String),
	ToolCalls(Vec<ToolCall>),
}

pub async fn complete(
	cfg: &aira_config::LlmProviderConfig,
	messages: &[ChatMessage],
	tools: &[ToolDefinition],
) -> Result<Completion> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = request_body(cfg, messages, tools);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion(&json)
}

fn request_body(
	cfg: &aira_config::LlmProviderConfig,
	messages: &[ChatMessage],
	tools: &[ToolDefinition],
) -> Value {
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages.iter().map(ChatMessage::to_wire).collect::<Vec<_>>(),
	});

	if !tools.is_empty() {
		body["tools"] = Value::Array(tools.iter().map(ToolDefinition::to_wire).collect());
		body["tool_choice"] = Value::String("auto".to_string());
	}

	body
}

pub fn parse_completion(json: &Value) -> Result<Completion> {
	let message = json
		.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.ok_or_else(|| eyre::eyre!("Chat response is missing choices[0].message."))?;

	if let Some(calls) = message.get("tool_calls").and_then(Value::as_array)
		&& !calls.is_empty()
	{
		return Ok(Completion::ToolCalls(calls.iter().map(parse_tool_call).collect()));
	}

	let content = message.get("content").and_then(Value::as_str).unwrap_or_default();

	Ok(Completion::Answer(content.to_string()))
}

fn parse_tool_call(raw: &Value) -> ToolCall {
	let id = raw.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
	let function = raw.get("function");
	let name = function
		.and_then(|function| function.get("name"))
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string();
	let arguments = match function.and_then(|function| function.get("arguments")) {
		Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
			Ok(Value::Object(map)) => Value::Object(map),
			_ => {
				tracing::warn!(tool = %name, "Tool call arguments are not a JSON object.");

				Value::Object(Map::new())
			},
		},
		Some(Value::Object(map)) => Value::Object(map.clone()),
		_ => Value::Object(Map::new()),
	};

	ToolCall { id, name, arguments }
}
