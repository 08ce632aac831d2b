use serde::Deserialize;

pub const MAX_FOLLOW_UPS: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredReply {
	reply: String,
	#[serde(default)]
	follow_up_questions: Vec<String>,
	#[serde(default)]
	needs_clarification: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
	pub answer: String,
	pub follow_up_questions: Vec<String>,
	pub needs_clarification: bool,
}

/// Interprets the model's final text.
///
/// A well-formed `{"reply", "follow_up_questions", "needs_clarification"}` object, bare or in a
/// fenced json block, is unpacked. Anything else, including an object with unknown fields or a
/// blank reply, is returned as plain text.
pub fn parse_reply(raw: &str) -> ParsedReply {
	let trimmed = raw.trim();
	let candidate = strip_fence(trimmed);

	if candidate.starts_with('{')
		&& let Ok(structured) = serde_json::from_str::<StructuredReply>(candidate)
		&& !structured.reply.trim().is_empty()
	{
		let follow_up_questions = structured
			.follow_up_questions
			.into_iter()
			.map(|question| question.trim().to_string())
			.filter(|question| !question.is_empty())
			.take(MAX_FOLLOW_UPS)
			.collect();

		return ParsedReply {
			answer: structured.reply.trim().to_string(),
			follow_up_questions,
			needs_clarification: structured.needs_clarification,
		};
	}

	ParsedReply { answer: trimmed.to_string(), ..Default::default() }
}

fn strip_fence(text: &str) -> &str {
	let Some(body) = text.strip_prefix("```") else {
		return text;
	};
	let body = body.strip_prefix("json").unwrap_or(body);
	let body = body.strip_suffix("```").unwrap_or(body);

	body.trim()
}
