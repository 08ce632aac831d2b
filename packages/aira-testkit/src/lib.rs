//! In-process doubles for the service ports and a ready-to-use config.
//!
//! Nothing here talks to the network, so suites built on it run without a vector store, model
//! endpoint, or search API.

use std::{
	collections::{HashMap, VecDeque},
	future,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use color_eyre::eyre;
use serde_json::{Map, Value};

use aira_config::{
	Agent, Config, EmbeddingProviderConfig, LlmProviderConfig, Matching, Providers, Qdrant,
	Security, Service, Storage, WebSearchProviderConfig,
};
use aira_providers::{
	chat::{ChatMessage, Completion, ToolCall, ToolDefinition},
	web_search::WebHit,
};
use aira_service::{BoxFuture, ChatProvider, EmbeddingProvider, VectorIndex, WebSearchProvider};
use aira_storage::models::SearchHit;

pub const COURSES_COLLECTION: &str = "courses_collection";
pub const MENTORS_COLLECTION: &str = "mentors_collection";
pub const VECTOR_DIM: u32 = 8;

pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				courses_collection: COURSES_COLLECTION.to_string(),
				mentors_collection: MENTORS_COLLECTION.to_string(),
				vector_dim: VECTOR_DIM,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-chat".to_string(),
				temperature: 0.2,
				max_tokens: 512,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			web_search: WebSearchProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/search".to_string(),
				country: "az".to_string(),
				language: "en".to_string(),
				num_results: 10,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		matching: Matching {
			exact_threshold: 0.70,
			related_threshold: 0.50,
			admission_threshold: 0.35,
			default_limit: 5,
			mentor_limit: 3,
			keyword_top_k: 4,
			fallback_count: 4,
			budget_price_ceiling: 50.0,
			timeout_ms: 200,
		},
		agent: Agent {
			max_iterations: 5,
			max_web_searches: 2,
			max_db_searches: 2,
			history_turns: 10,
			max_sources: 5,
			max_recommendations: 6,
			max_query_chars: 500,
			tool_timeout_ms: 200,
		},
		security: Security { bind_localhost_only: true },
	}
}

pub fn course_hit(id: &str, title: &str, score: f32, extra: Value) -> SearchHit {
	let mut payload = Map::new();

	payload.insert("id".to_string(), Value::from(id));
	payload.insert("title".to_string(), Value::from(title));
	payload.insert("category".to_string(), Value::from("Programming"));
	payload.insert("difficulty".to_string(), Value::from("Beginner"));
	payload.insert("duration_hours".to_string(), Value::from(20));
	payload.insert("rating".to_string(), Value::from(4.5));
	payload.insert("description".to_string(), Value::from(format!("About {title}.")));

	if let Value::Object(extra) = extra {
		payload.extend(extra);
	}

	SearchHit { external_id: format!("point-{id}"), score, payload }
}

pub fn mentor_hit(id: &str, name: &str, score: f32) -> SearchHit {
	let mut payload = Map::new();

	payload.insert("id".to_string(), Value::from(id));
	payload.insert("name".to_string(), Value::from(name));
	payload.insert("specialty".to_string(), Value::from("Backend Development"));
	payload.insert("experience_years".to_string(), Value::from(7));
	payload.insert("rating".to_string(), Value::from(4.9));
	payload.insert("skills".to_string(), serde_json::json!(["python", "postgresql"]));

	SearchHit { external_id: format!("point-{id}"), score, payload }
}

pub fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCall {
	ToolCall { id: id.to_string(), name: name.to_string(), arguments }
}

pub fn web_hit(title: &str, link: &str, snippet: &str) -> WebHit {
	WebHit {
		title: title.to_string(),
		link: link.to_string(),
		snippet: snippet.to_string(),
		date: None,
	}
}

fn failure<T>(message: &'static str) -> BoxFuture<'static, color_eyre::Result<T>>
where
	T: Send + 'static,
{
	Box::pin(async move { Err::<T, _>(eyre::eyre!("{message}")) })
}

fn pending<T>() -> BoxFuture<'static, T>
where
	T: Send + 'static,
{
	Box::pin(future::pending::<T>())
}

/// How a double responds to every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
	#[default]
	Succeed,
	Fail,
	Hang,
}

/// Returns a constant vector per input.
#[derive(Default)]
pub struct StubEmbedding {
	behavior: Behavior,
	dimensions: Option<usize>,
	calls: AtomicUsize,
}
impl StubEmbedding {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_behavior(behavior: Behavior) -> Self {
		Self { behavior, ..Self::default() }
	}

	/// Vectors of a fixed size regardless of the configured dimensions.
	pub fn with_dimensions(dimensions: usize) -> Self {
		Self { dimensions: Some(dimensions), ..Self::default() }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let dim = self.dimensions.unwrap_or(cfg.dimensions as usize);

		match self.behavior {
			Behavior::Succeed => Box::pin(async move { Ok(vec![vec![0.1; dim]; texts.len()]) }),
			Behavior::Fail => failure("Embedding backend is down."),
			Behavior::Hang => pending(),
		}
	}
}

/// Serves fixed hits per collection, applying the limit and score threshold like a real index.
#[derive(Default)]
pub struct StaticIndex {
	collections: HashMap<String, Vec<SearchHit>>,
	behavior: Behavior,
	calls: AtomicUsize,
}
impl StaticIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_behavior(behavior: Behavior) -> Self {
		Self { behavior, ..Self::default() }
	}

	pub fn with_hits(mut self, collection: &str, hits: Vec<SearchHit>) -> Self {
		self.collections.insert(collection.to_string(), hits);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl VectorIndex for StaticIndex {
	fn search<'a>(
		&'a self,
		collection: &'a str,
		_vector: &'a [f32],
		limit: u64,
		score_threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<SearchHit>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		match self.behavior {
			Behavior::Succeed => {
				let mut hits: Vec<SearchHit> = self
					.collections
					.get(collection)
					.map(|hits| hits.iter().filter(|hit| hit.score >= score_threshold).cloned().collect())
					.unwrap_or_default();

				hits.sort_by(|left, right| right.score.total_cmp(&left.score));
				hits.truncate(limit as usize);

				Box::pin(async move { Ok(hits) })
			},
			Behavior::Fail => failure("Vector store is unreachable."),
			Behavior::Hang => pending(),
		}
	}
}

#[derive(Default)]
pub struct StubWebSearch {
	hits: Vec<WebHit>,
	behavior: Behavior,
	queries: Mutex<Vec<String>>,
}
impl StubWebSearch {
	pub fn new(hits: Vec<WebHit>) -> Self {
		Self { hits, ..Self::default() }
	}

	pub fn with_behavior(behavior: Behavior) -> Self {
		Self { behavior, ..Self::default() }
	}

	pub fn calls(&self) -> usize {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn queries(&self) -> Vec<String> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl WebSearchProvider for StubWebSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a WebSearchProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebHit>>> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(query.to_string());

		match self.behavior {
			Behavior::Succeed => {
				let hits = self.hits.clone();

				Box::pin(async move { Ok(hits) })
			},
			Behavior::Fail => failure("Search API returned 503."),
			Behavior::Hang => pending(),
		}
	}
}

/// Replays a script of completions, then repeats the last one.
///
/// Records every call's offered tool names and message count so tests can assert on what the
/// model was shown.
pub struct ScriptedChat {
	script: Mutex<VecDeque<Completion>>,
	last: Mutex<Option<Completion>>,
	behavior: Behavior,
	offered: Mutex<Vec<Vec<String>>>,
	transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}
impl ScriptedChat {
	pub fn new(script: Vec<Completion>) -> Self {
		Self {
			script: Mutex::new(script.into()),
			last: Mutex::new(None),
			behavior: Behavior::Succeed,
			offered: Mutex::new(Vec::new()),
			transcripts: Mutex::new(Vec::new()),
		}
	}

	pub fn answering(text: &str) -> Self {
		Self::new(vec![Completion::Answer(text.to_string())])
	}

	pub fn with_behavior(behavior: Behavior) -> Self {
		Self { behavior, ..Self::new(Vec::new()) }
	}

	pub fn calls(&self) -> usize {
		self.offered.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	/// Tool names offered on each call, in call order.
	pub fn offered_tools(&self) -> Vec<Vec<String>> {
		self.offered.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// Messages sent on each call, in call order.
	pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
		self.transcripts.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn next_completion(&self) -> Completion {
		let next = self.script.lock().unwrap_or_else(|err| err.into_inner()).pop_front();
		let mut last = self.last.lock().unwrap_or_else(|err| err.into_inner());

		match next {
			Some(completion) => {
				*last = Some(completion.clone());

				completion
			},
			None => last.clone().unwrap_or_else(|| Completion::Answer(String::new())),
		}
	}
}
impl ChatProvider for ScriptedChat {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
		tools: &'a [ToolDefinition],
	) -> BoxFuture<'a, color_eyre::Result<Completion>> {
		self.offered
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push(tools.iter().map(|tool| tool.name.clone()).collect());
		self.transcripts.lock().unwrap_or_else(|err| err.into_inner()).push(messages.to_vec());

		match self.behavior {
			Behavior::Succeed => {
				let completion = self.next_completion();

				Box::pin(async move { Ok(completion) })
			},
			Behavior::Fail => failure("Model endpoint returned 500."),
			Behavior::Hang => pending(),
		}
	}
}
