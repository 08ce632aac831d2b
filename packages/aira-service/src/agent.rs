//! The orchestration loop.
//!
//! One run owns one [`SessionState`]. The loop alternates between asking the model and
//! dispatching the tools it requests until the model answers in plain text or the iteration
//! ceiling is reached, at which point a final tool-free call forces an answer. A model failure
//! at any point ends the run with a fixed degraded answer and whatever results were gathered.

use std::time::Duration;

use time::{Date, OffsetDateTime};

use aira_config::Config;
use aira_domain::history::{ConversationHistory, TurnRole};
use aira_providers::chat::{ChatMessage, Completion, ToolDefinition};

use crate::{
	ChatProvider, Error, Result,
	accumulator::ResultAccumulator,
	error::timeout_message,
	items::{Recommendation, Source},
	reply,
	tools::{QUERY_VECTOR_DB, SEARCH_WEB, ToolBudget, ToolRouter},
};

pub const DEGRADED_ANSWER: &str = "Sorry, I could not complete your request because the \
assistant service is temporarily unavailable. Please try again in a moment.";

pub const EMPTY_ANSWER_FALLBACK: &str = "I could not put together a complete answer this time. \
Could you rephrase your question or tell me a bit more about what you are looking for?";

const FORCED_SYNTHESIS_INSTRUCTION: &str = "No more tools are available. Answer the user now \
using only the information already gathered in this conversation.";

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
	/// The model answered in plain text.
	Answered,
	/// The iteration ceiling was reached and a tool-free call produced the answer.
	ForcedSynthesis,
	/// A model call failed or timed out.
	Degraded,
}
impl Termination {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Answered => "answered",
			Self::ForcedSynthesis => "forced_synthesis",
			Self::Degraded => "degraded",
		}
	}
}

#[derive(Debug, Clone)]
pub struct LoopOutcome {
	pub answer: String,
	pub sources: Vec<Source>,
	pub recommendations: Vec<Recommendation>,
	pub follow_up_questions: Vec<String>,
	pub needs_clarification: bool,
	pub termination: Termination,
	pub model_calls: u32,
}

/// Mutable state of a single run. Never shared between runs.
#[derive(Debug)]
pub struct SessionState {
	pub messages: Vec<ChatMessage>,
	pub budget: ToolBudget,
	pub results: ResultAccumulator,
	pub model_calls: u32,
}
impl SessionState {
	pub fn new(
		system_prompt: String,
		history: &ConversationHistory,
		query: &str,
		budget: ToolBudget,
	) -> Self {
		let mut messages = Vec::with_capacity(history.len() + 2);

		messages.push(ChatMessage::System(system_prompt));

		for turn in history {
			messages.push(match turn.role {
				TurnRole::User => ChatMessage::User(turn.text.clone()),
				TurnRole::Assistant => ChatMessage::Assistant(turn.text.clone()),
			});
		}

		messages.push(ChatMessage::User(query.to_string()));

		Self { messages, budget, results: ResultAccumulator::default(), model_calls: 0 }
	}
}

pub struct OrchestrationLoop<'a> {
	cfg: &'a Config,
	chat: &'a dyn ChatProvider,
	router: ToolRouter<'a>,
}
impl<'a> OrchestrationLoop<'a> {
	pub fn new(cfg: &'a Config, chat: &'a dyn ChatProvider, router: ToolRouter<'a>) -> Self {
		Self { cfg, chat, router }
	}

	pub async fn run(&self, query: &str, history: &ConversationHistory) -> LoopOutcome {
		let agent = &self.cfg.agent;
		let budget = ToolBudget::new(agent.max_web_searches, agent.max_db_searches);
		let prompt = system_prompt(OffsetDateTime::now_utc().date());
		let mut session = SessionState::new(prompt, history, query, budget);

		for iteration in 0..agent.max_iterations {
			let offered = self.router.offered(&session.budget);
			let calls = match self.call_model(&mut session, &offered).await {
				Ok(Completion::Answer(text)) => {
					return self.finish(session, text, Termination::Answered);
				},
				Ok(Completion::ToolCalls(calls)) => calls,
				Err(err) => return self.degraded(session, err),
			};

			tracing::info!(
				iteration,
				requested = calls.len(),
				offered = offered.len(),
				"Model requested tools."
			);

			session.messages.push(ChatMessage::AssistantToolCalls(calls.clone()));

			for call in &calls {
				let output = self.router.dispatch(call, &mut session.budget).await;

				session
					.messages
					.push(ChatMessage::Tool { call_id: call.id.clone(), content: output.text });
				session.results.add_sources(output.sources);
				session.results.add_recommendations(output.recommendations);
			}
		}

		tracing::info!(
			max_iterations = agent.max_iterations,
			"Iteration ceiling reached; forcing synthesis."
		);

		session.messages.push(ChatMessage::System(FORCED_SYNTHESIS_INSTRUCTION.to_string()));

		match self.call_model(&mut session, &[]).await {
			Ok(Completion::Answer(text)) =>
				self.finish(session, text, Termination::ForcedSynthesis),
			Ok(Completion::ToolCalls(calls)) => {
				tracing::warn!(
					requested = calls.len(),
					"Model requested tools during forced synthesis; using fallback answer."
				);

				self.finish(session, String::new(), Termination::ForcedSynthesis)
			},
			Err(err) => self.degraded(session, err),
		}
	}

	async fn call_model(
		&self,
		session: &mut SessionState,
		tools: &[ToolDefinition],
	) -> Result<Completion> {
		let llm = &self.cfg.providers.llm;
		let timeout = Duration::from_millis(llm.timeout_ms);

		session.model_calls += 1;

		tokio::time::timeout(timeout, self.chat.complete(llm, &session.messages, tools))
			.await
			.map_err(|_| Error::model(timeout_message("Model call", timeout)))?
			.map_err(Error::model)
	}

	fn finish(
		&self,
		session: SessionState,
		text: String,
		termination: Termination,
	) -> LoopOutcome {
		let parsed = reply::parse_reply(&text);
		let answer = if parsed.answer.is_empty() {
			tracing::warn!(termination = termination.as_str(), "Model returned an empty answer.");

			EMPTY_ANSWER_FALLBACK.to_string()
		} else {
			parsed.answer
		};

		self.outcome(
			session,
			answer,
			parsed.follow_up_questions,
			parsed.needs_clarification,
			termination,
		)
	}

	fn degraded(&self, session: SessionState, err: Error) -> LoopOutcome {
		tracing::error!(
			error = %err,
			model_calls = session.model_calls,
			"Model call failed; degrading."
		);

		self.outcome(session, DEGRADED_ANSWER.to_string(), Vec::new(), false, Termination::Degraded)
	}

	fn outcome(
		&self,
		session: SessionState,
		answer: String,
		follow_up_questions: Vec<String>,
		needs_clarification: bool,
		termination: Termination,
	) -> LoopOutcome {
		let agent = &self.cfg.agent;
		let model_calls = session.model_calls;
		let (sources, recommendations) = session
			.results
			.finalize(agent.max_sources as usize, agent.max_recommendations as usize);

		tracing::info!(
			termination = termination.as_str(),
			model_calls,
			web_searches = session.budget.web_search_count,
			db_searches = session.budget.db_search_count,
			sources = sources.len(),
			recommendations = recommendations.len(),
			"Orchestration finished."
		);

		LoopOutcome {
			answer,
			sources,
			recommendations,
			follow_up_questions,
			needs_clarification,
			termination,
			model_calls,
		}
	}
}

pub fn system_prompt(today: Date) -> String {
	format!(
		"You are Aira, an IT career and education advisor. Today is {today}.\n\
		 \n\
		 Tools:\n\
		 - {QUERY_VECTOR_DB}: search the course and mentor database. Use it for learning paths \
		 and recommendations.\n\
		 - {SEARCH_WEB}: search the web for current facts such as salaries, job market trends, \
		 and admissions.\n\
		 \n\
		 Database results are tagged [MATCH: EXACT], [MATCH: RELATED], [MATCH: KEYWORD], \
		 [MATCH: ALTERNATIVE], or [MATCH: ALL]. Recommend EXACT and RELATED items directly. When \
		 items are tagged KEYWORD or ALTERNATIVE, hedge: say they are the closest available \
		 options, not a direct match. A result starting with [STATUS: EMPTY_DB] means the \
		 database had nothing direct for the topic.\n\
		 \n\
		 Only recommend items that appear in tool results. Reply with a JSON object \
		 {{\"reply\": string, \"follow_up_questions\": [string], \"needs_clarification\": bool}}."
	)
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;
	use aira_domain::history::Turn;

	#[test]
	fn system_prompt_names_tools_and_date() {
		let prompt = system_prompt(date!(2026 - 03 - 14));

		assert!(prompt.contains("2026-03-14"));
		assert!(prompt.contains(SEARCH_WEB));
		assert!(prompt.contains(QUERY_VECTOR_DB));
		assert!(prompt.contains("KEYWORD or ALTERNATIVE"));
	}

	#[test]
	fn session_seeds_system_history_and_query() {
		let history = ConversationHistory::from_turns(
			4,
			[Turn::user("I like data."), Turn::assistant("Great, try analytics.")],
		);
		let session =
			SessionState::new("prompt".to_string(), &history, "What next?", ToolBudget::new(1, 1));

		assert_eq!(
			session.messages,
			vec![
				ChatMessage::System("prompt".to_string()),
				ChatMessage::User("I like data.".to_string()),
				ChatMessage::Assistant("Great, try analytics.".to_string()),
				ChatMessage::User("What next?".to_string()),
			]
		);
	}
}
