use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub matching: Matching,
	pub agent: Agent,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub courses_collection: String,
	pub mentors_collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
	pub web_search: WebSearchProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSearchProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	/// Geolocation hint forwarded as `gl`.
	pub country: String,
	/// Interface language forwarded as `hl`.
	pub language: String,
	pub num_results: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Tier thresholds and sizes for the matching engine.
///
/// The score thresholds are product-tuned. `admission_threshold` is the floor passed to the
/// vector store; `related_threshold` and `exact_threshold` classify what comes back.
#[derive(Debug, Clone, Deserialize)]
pub struct Matching {
	pub exact_threshold: f32,
	pub related_threshold: f32,
	pub admission_threshold: f32,
	pub default_limit: u32,
	pub mentor_limit: u32,
	pub keyword_top_k: u32,
	pub fallback_count: u32,
	pub budget_price_ceiling: f64,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
	pub max_iterations: u32,
	pub max_web_searches: u32,
	pub max_db_searches: u32,
	pub history_turns: u32,
	pub max_sources: u32,
	pub max_recommendations: u32,
	pub max_query_chars: u32,
	pub tool_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	#[serde(default = "default_bind_localhost_only")]
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: default_bind_localhost_only() }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_bind_localhost_only() -> bool {
	true
}
