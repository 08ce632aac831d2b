pub mod accumulator;
pub mod agent;
pub mod chat;
pub mod items;
pub mod matching;
pub mod reply;
pub mod tools;

mod error;

pub use aira_domain::catalog::ItemKind;
pub use chat::{ChatRequest, ChatResponse};
pub use error::{Error, Result};
pub use items::{MatchQuality, Recommendation, Source};

use std::{future::Future, pin::Pin, sync::Arc};

use aira_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, WebSearchProviderConfig};
use aira_providers::{
	chat::{self as chat_provider, ChatMessage, Completion, ToolDefinition},
	embedding,
	web_search::{self, WebHit},
};
use aira_storage::{models::SearchHit, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
		tools: &'a [ToolDefinition],
	) -> BoxFuture<'a, color_eyre::Result<Completion>>;
}

pub trait WebSearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a WebSearchProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebHit>>>;
}

/// Similarity search over a named collection.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		collection: &'a str,
		vector: &'a [f32],
		limit: u64,
		score_threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<SearchHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
	pub web_search: Arc<dyn WebSearchProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		chat: Arc<dyn ChatProvider>,
		web_search: Arc<dyn WebSearchProvider>,
	) -> Self {
		Self { embedding, chat, web_search }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), chat: provider.clone(), web_search: provider }
	}
}

pub struct AiraService {
	pub cfg: Config,
	pub index: Arc<dyn VectorIndex>,
	pub providers: Providers,
}
impl AiraService {
	pub fn new(cfg: Config, index: Arc<dyn VectorIndex>) -> Self {
		Self { cfg, index, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, index: Arc<dyn VectorIndex>, providers: Providers) -> Self {
		Self { cfg, index, providers }
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
		tools: &'a [ToolDefinition],
	) -> BoxFuture<'a, color_eyre::Result<Completion>> {
		Box::pin(chat_provider::complete(cfg, messages, tools))
	}
}
impl WebSearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a WebSearchProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<WebHit>>> {
		Box::pin(web_search::search(cfg, query))
	}
}

impl VectorIndex for QdrantStore {
	fn search<'a>(
		&'a self,
		collection: &'a str,
		vector: &'a [f32],
		limit: u64,
		score_threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<SearchHit>>> {
		Box::pin(async move {
			Ok(QdrantStore::search(self, collection, vector, limit, score_threshold).await?)
		})
	}
}
