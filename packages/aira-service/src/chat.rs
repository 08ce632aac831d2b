use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use aira_domain::{
	history::{ConversationHistory, Turn},
	safety::{self, SafetyVerdict},
};

use crate::{
	AiraService, Error, Result,
	agent::{LoopOutcome, OrchestrationLoop},
	items::{Recommendation, Source},
	matching::MatchingEngine,
	tools::ToolRouter,
};

pub const EMPTY_QUERY_ANSWER: &str =
	"Please send a message so I can help. Ask me about IT careers, courses, or mentors.";

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
	pub query: String,
	#[serde(default)]
	pub history: Vec<Turn>,
	#[serde(default)]
	pub user_id: Option<String>,
}
impl ChatRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), history: Vec::new(), user_id: None }
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
	pub answer: String,
	pub sources: Vec<Source>,
	pub recommendations: Vec<Recommendation>,
	pub needs_clarification: bool,
	pub follow_up_questions: Vec<String>,
}
impl ChatResponse {
	fn text(answer: impl Into<String>) -> Self {
		Self {
			answer: answer.into(),
			sources: Vec::new(),
			recommendations: Vec::new(),
			needs_clarification: false,
			follow_up_questions: Vec::new(),
		}
	}
}
impl From<LoopOutcome> for ChatResponse {
	fn from(outcome: LoopOutcome) -> Self {
		Self {
			answer: outcome.answer,
			sources: outcome.sources,
			recommendations: outcome.recommendations,
			needs_clarification: outcome.needs_clarification,
			follow_up_questions: outcome.follow_up_questions,
		}
	}
}

impl AiraService {
	pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
		let span = tracing::info_span!(
			"chat",
			request_id = %Uuid::new_v4(),
			user_id = req.user_id.as_deref().unwrap_or("anonymous"),
		);

		self.chat_inner(req).instrument(span).await
	}

	async fn chat_inner(&self, req: ChatRequest) -> Result<ChatResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Ok(ChatResponse::text(EMPTY_QUERY_ANSWER));
		}

		let max_chars = self.cfg.agent.max_query_chars as usize;
		let query_chars = query.chars().count();

		if query_chars > max_chars {
			let message = format!("query must be at most {max_chars} characters, got {query_chars}.");

			return Err(Error::InvalidRequest { message });
		}

		let verdict = safety::classify(query);

		match verdict {
			SafetyVerdict::Blocked => {
				tracing::warn!(
					verdict = verdict.as_str(),
					term = safety::blocking_term(query).unwrap_or_default(),
					"Query blocked by topic gate."
				);

				return Ok(ChatResponse::text(safety::REFUSAL_MESSAGE));
			},
			SafetyVerdict::Redirected => {
				tracing::info!(verdict = verdict.as_str(), "Off-topic query redirected.");

				return Ok(ChatResponse {
					needs_clarification: true,
					follow_up_questions: safety::REDIRECT_FOLLOW_UPS
						.iter()
						.map(|question| question.to_string())
						.collect(),
					..ChatResponse::text(safety::REDIRECT_MESSAGE)
				});
			},
			SafetyVerdict::Safe => {},
		}

		let history =
			ConversationHistory::from_turns(self.cfg.agent.history_turns as usize, req.history);
		let matching =
			MatchingEngine::new(&self.cfg, self.index.as_ref(), self.providers.embedding.as_ref());
		let router = ToolRouter::new(
			matching,
			self.providers.web_search.as_ref(),
			&self.cfg.providers.web_search,
			self.cfg.matching.default_limit as usize,
			Duration::from_millis(self.cfg.agent.tool_timeout_ms),
		);
		let orchestration = OrchestrationLoop::new(&self.cfg, self.providers.chat.as_ref(), router);
		let outcome = orchestration.run(query, &history).await;

		Ok(outcome.into())
	}
}
