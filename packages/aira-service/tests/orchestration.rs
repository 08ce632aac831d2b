use std::time::Duration;

use serde_json::json;

use aira_config::Config;
use aira_domain::history::ConversationHistory;
use aira_providers::chat::{ChatMessage, Completion};
use aira_service::{
	agent::{DEGRADED_ANSWER, EMPTY_ANSWER_FALLBACK, LoopOutcome, OrchestrationLoop, Termination},
	matching::MatchingEngine,
	tools::{EMPTY_DB_SENTINEL, QUERY_VECTOR_DB, SEARCH_WEB, ToolRouter},
};
use aira_testkit::{
	Behavior, COURSES_COLLECTION, ScriptedChat, StaticIndex, StubEmbedding, StubWebSearch,
	course_hit, tool_call, web_hit,
};

struct Harness {
	cfg: Config,
	index: StaticIndex,
	embedding: StubEmbedding,
	web: StubWebSearch,
	chat: ScriptedChat,
}
impl Harness {
	fn new(chat: ScriptedChat) -> Self {
		Self {
			cfg: aira_testkit::test_config(),
			index: StaticIndex::new(),
			embedding: StubEmbedding::new(),
			web: StubWebSearch::new(vec![
				web_hit("Rust salaries", "https://jobs.example.com/rust", "Median pay rose."),
				web_hit("ADA University", "https://ada.edu.az/programs", "Computer science."),
			]),
			chat,
		}
	}

	async fn run(&self, query: &str) -> LoopOutcome {
		let matching = MatchingEngine::new(&self.cfg, &self.index, &self.embedding);
		let router = ToolRouter::new(
			matching,
			&self.web,
			&self.cfg.providers.web_search,
			self.cfg.matching.default_limit as usize,
			Duration::from_millis(self.cfg.agent.tool_timeout_ms),
		);

		OrchestrationLoop::new(&self.cfg, &self.chat, router)
			.run(query, &ConversationHistory::new(self.cfg.agent.history_turns as usize))
			.await
	}

	/// Tool result messages from the last model call, in order.
	fn tool_results(&self) -> Vec<(String, String)> {
		self.chat
			.transcripts()
			.last()
			.map(|messages| {
				messages
					.iter()
					.filter_map(|message| match message {
						ChatMessage::Tool { call_id, content } =>
							Some((call_id.clone(), content.clone())),
						_ => None,
					})
					.collect()
			})
			.unwrap_or_default()
	}
}

fn tool_calls(calls: Vec<(&str, &str, serde_json::Value)>) -> Completion {
	Completion::ToolCalls(
		calls.into_iter().map(|(id, name, args)| tool_call(id, name, args)).collect(),
	)
}

#[tokio::test]
async fn plain_answer_ends_after_one_call() {
	let harness = Harness::new(ScriptedChat::answering("Start with Python."));
	let outcome = harness.run("How do I become a backend developer?").await;

	assert_eq!(outcome.termination, Termination::Answered);
	assert_eq!(outcome.model_calls, 1);
	assert_eq!(outcome.answer, "Start with Python.");
	assert_eq!(harness.web.calls(), 0);
	assert_eq!(harness.chat.offered_tools()[0], vec![QUERY_VECTOR_DB, SEARCH_WEB]);
}

#[tokio::test]
async fn tool_hungry_model_is_cut_off_at_the_ceiling() {
	let harness = Harness::new(ScriptedChat::new(vec![tool_calls(vec![(
		"call_1",
		SEARCH_WEB,
		json!({ "query": "rust salary" }),
	)])]));
	let outcome = harness.run("What do Rust developers earn?").await;
	let ceiling = harness.cfg.agent.max_iterations as usize;
	let offered = harness.chat.offered_tools();

	assert_eq!(harness.chat.calls(), ceiling + 1);
	assert_eq!(outcome.model_calls as usize, ceiling + 1);
	assert_eq!(outcome.termination, Termination::ForcedSynthesis);
	assert_eq!(outcome.answer, EMPTY_ANSWER_FALLBACK);
	assert_eq!(harness.web.calls(), harness.cfg.agent.max_web_searches as usize);
	assert!(offered[0].iter().any(|name| name == SEARCH_WEB));
	assert!(offered[1].iter().any(|name| name == SEARCH_WEB));

	for tools in &offered[2..ceiling] {
		assert_eq!(tools, &vec![QUERY_VECTOR_DB.to_string()]);
	}

	assert!(offered[ceiling].is_empty());
	assert_eq!(outcome.sources.len(), 2);
}

#[tokio::test]
async fn exhausted_tool_calls_get_a_steering_result() {
	let harness = Harness::new(ScriptedChat::new(vec![
		tool_calls(vec![("c1", SEARCH_WEB, json!({ "query": "a" }))]),
		tool_calls(vec![("c2", SEARCH_WEB, json!({ "query": "b" }))]),
		tool_calls(vec![("c3", SEARCH_WEB, json!({ "query": "c" }))]),
		Completion::Answer("Done.".to_string()),
	]));
	let outcome = harness.run("Rust market trends").await;
	let results = harness.tool_results();

	assert_eq!(outcome.termination, Termination::Answered);
	assert_eq!(harness.web.queries(), vec!["a", "b"]);
	assert_eq!(results.len(), 3);
	assert_eq!(results[2].0, "c3");
	assert!(results[2].1.contains("no longer available"));
}

#[tokio::test]
async fn forced_synthesis_text_becomes_the_answer() {
	let mut harness = Harness::new(ScriptedChat::new(vec![
		tool_calls(vec![("c1", QUERY_VECTOR_DB, json!({ "topic": "python" }))]),
		Completion::Answer("Here is your plan.".to_string()),
	]));

	harness.cfg.agent.max_iterations = 1;

	let outcome = harness.run("python plan").await;
	let last_transcript = harness.chat.transcripts().pop().expect("Expected a transcript.");

	assert_eq!(outcome.termination, Termination::ForcedSynthesis);
	assert_eq!(outcome.model_calls, 2);
	assert_eq!(outcome.answer, "Here is your plan.");
	assert!(matches!(
		last_transcript.last(),
		Some(ChatMessage::System(text)) if text.contains("No more tools")
	));
	assert!(harness.chat.offered_tools()[1].is_empty());
}

#[tokio::test]
async fn model_failure_degrades_with_fixed_answer() {
	let harness = Harness::new(ScriptedChat::with_behavior(Behavior::Fail));
	let outcome = harness.run("python course").await;

	assert_eq!(outcome.termination, Termination::Degraded);
	assert_eq!(outcome.answer, DEGRADED_ANSWER);
	assert_eq!(outcome.model_calls, 1);
	assert!(outcome.recommendations.is_empty());
}

#[tokio::test]
async fn model_timeout_degrades() {
	let mut harness = Harness::new(ScriptedChat::with_behavior(Behavior::Hang));

	harness.cfg.providers.llm.timeout_ms = 50;

	let outcome = harness.run("python course").await;

	assert_eq!(outcome.termination, Termination::Degraded);
	assert_eq!(outcome.answer, DEGRADED_ANSWER);
}

#[tokio::test]
async fn empty_database_result_carries_sentinel_and_hint() {
	let harness = Harness::new(ScriptedChat::new(vec![
		tool_calls(vec![("c1", QUERY_VECTOR_DB, json!({ "topic": "kubernetes" }))]),
		Completion::Answer("Try the DevOps course.".to_string()),
	]));
	let outcome = harness.run("kubernetes course").await;
	let results = harness.tool_results();

	assert_eq!(results[0].0, "c1");
	assert!(results[0].1.starts_with(EMPTY_DB_SENTINEL));
	assert!(results[0].1.contains(SEARCH_WEB));
	assert!(results[0].1.contains("[MATCH: KEYWORD]"));
	assert_eq!(outcome.recommendations[0].id, "bs_devops");
}

#[tokio::test]
async fn vector_results_are_accumulated_without_sentinel() {
	let mut harness = Harness::new(ScriptedChat::new(vec![
		tool_calls(vec![
			("c1", QUERY_VECTOR_DB, json!({ "topic": "rust" })),
			("c2", QUERY_VECTOR_DB, json!({ "topic": "rust" })),
		]),
		Completion::Answer("Take Rust 101.".to_string()),
	]));

	harness.index = StaticIndex::new()
		.with_hits(COURSES_COLLECTION, vec![course_hit("c-rust", "Rust 101", 0.88, json!({}))]);

	let outcome = harness.run("rust").await;
	let results = harness.tool_results();

	assert_eq!(results.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(), vec!["c1", "c2"]);
	assert!(!results[0].1.contains(EMPTY_DB_SENTINEL));
	assert_eq!(outcome.recommendations.len(), 1);
	assert_eq!(outcome.recommendations[0].id, "c-rust");
}

#[tokio::test]
async fn bad_calls_do_not_spend_budget() {
	let mut harness = Harness::new(ScriptedChat::new(vec![
		tool_calls(vec![
			("c1", QUERY_VECTOR_DB, json!({ "topic": "   " })),
			("c2", "delete_everything", json!({})),
			("c3", SEARCH_WEB, json!({})),
		]),
		Completion::Answer("Could you tell me more?".to_string()),
	]));

	harness.cfg.agent.max_db_searches = 1;
	harness.cfg.agent.max_web_searches = 1;

	harness.run("help").await;

	let results = harness.tool_results();

	assert!(results[0].1.contains("requires a non-empty \"topic\""));
	assert_eq!(results[1].1, "Unknown tool: delete_everything");
	assert!(results[2].1.contains("requires a non-empty \"query\""));
	assert_eq!(harness.chat.offered_tools()[1], vec![QUERY_VECTOR_DB, SEARCH_WEB]);
	assert_eq!(harness.web.calls(), 0);
}

#[tokio::test]
async fn zero_budgets_offer_no_tools() {
	let mut harness = Harness::new(ScriptedChat::answering("General advice."));

	harness.cfg.agent.max_db_searches = 0;
	harness.cfg.agent.max_web_searches = 0;

	let outcome = harness.run("career advice").await;

	assert!(harness.chat.offered_tools()[0].is_empty());
	assert_eq!(outcome.answer, "General advice.");
}

#[tokio::test]
async fn web_failures_become_tool_text() {
	for behavior in [Behavior::Fail, Behavior::Hang] {
		let mut harness = Harness::new(ScriptedChat::new(vec![
			tool_calls(vec![("c1", SEARCH_WEB, json!({ "query": "rust salary" }))]),
			Completion::Answer("Salaries vary.".to_string()),
		]));

		harness.web = StubWebSearch::with_behavior(behavior);

		let outcome = harness.run("rust salary").await;
		let results = harness.tool_results();

		assert!(results[0].1.contains("currently unavailable"), "{behavior:?}");
		assert!(outcome.sources.is_empty());
		assert_eq!(outcome.termination, Termination::Answered);
	}
}

#[tokio::test]
async fn empty_web_results_suggest_general_knowledge() {
	let mut harness = Harness::new(ScriptedChat::new(vec![
		tool_calls(vec![("c1", SEARCH_WEB, json!({ "query": "obscure thing" }))]),
		Completion::Answer("Not much is known.".to_string()),
	]));

	harness.web = StubWebSearch::new(Vec::new());
	harness.run("obscure thing").await;

	assert!(harness.tool_results()[0].1.contains("general knowledge"));
}

#[tokio::test]
async fn web_sources_are_labelled_and_returned() {
	let harness = Harness::new(ScriptedChat::new(vec![
		tool_calls(vec![("c1", SEARCH_WEB, json!({ "query": "cs degrees" }))]),
		Completion::Answer("ADA has a CS program.".to_string()),
	]));
	let outcome = harness.run("cs degrees").await;
	let results = harness.tool_results();

	assert!(results[0].1.contains("[official] ADA University"));
	assert!(results[0].1.contains("[web] Rust salaries"));
	assert_eq!(outcome.sources[1].url, "https://ada.edu.az/programs");
}

#[tokio::test]
async fn structured_final_reply_is_unpacked() {
	let harness = Harness::new(ScriptedChat::answering(
		r#"{"reply":"Consider data analytics.","follow_up_questions":["Do you know SQL?"],"needs_clarification":false}"#,
	));
	let outcome = harness.run("what should I learn").await;

	assert_eq!(outcome.answer, "Consider data analytics.");
	assert_eq!(outcome.follow_up_questions, vec!["Do you know SQL?"]);
}

#[tokio::test]
async fn empty_model_text_is_replaced() {
	let harness = Harness::new(ScriptedChat::answering("   "));
	let outcome = harness.run("hello").await;

	assert_eq!(outcome.answer, EMPTY_ANSWER_FALLBACK);
	assert_eq!(outcome.termination, Termination::Answered);
}
