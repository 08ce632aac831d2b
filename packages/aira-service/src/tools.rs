//! Tool routing for the orchestration loop.
//!
//! The model sees a closed set of two tools. Each call is checked against the session budget,
//! validated, dispatched, and turned into a [`ToolOutput`]. Nothing here returns an error to
//! the loop: exhausted budgets, bad arguments, and backend failures all become result text the
//! model can read.

use std::{collections::HashMap, fmt::Write as _, time::Duration};

use serde_json::Value;

use aira_config::WebSearchProviderConfig;
use aira_domain::text;
use aira_providers::{
	chat::{ToolCall, ToolDefinition},
	web_search::WebHit,
};

use crate::{
	Error, WebSearchProvider,
	error::timeout_message,
	items::{Recommendation, Source},
	matching::MatchingEngine,
};

pub const SEARCH_WEB: &str = "search_web";
pub const QUERY_VECTOR_DB: &str = "query_vector_db";
pub const EMPTY_DB_SENTINEL: &str = "[STATUS: EMPTY_DB]";

const MAX_WEB_ENTRIES: usize = 8;
const SOURCE_TITLE_CHARS: usize = 100;
const SOURCE_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
	VectorQuery,
	WebQuery,
}
impl ToolKind {
	pub const ALL: [Self; 2] = [Self::VectorQuery, Self::WebQuery];

	pub fn name(self) -> &'static str {
		match self {
			Self::VectorQuery => QUERY_VECTOR_DB,
			Self::WebQuery => SEARCH_WEB,
		}
	}

	/// The single string argument each tool takes.
	pub fn argument(self) -> &'static str {
		match self {
			Self::VectorQuery => "topic",
			Self::WebQuery => "query",
		}
	}

	pub fn definition(self) -> ToolDefinition {
		let (description, argument_description) = match self {
			Self::VectorQuery => (
				"Search the course and mentor database. Use for learning paths, course and \
				 mentor recommendations, or when the user asks what is available.",
				"Topic, skill, or career goal to match, for example \"python backend\".",
			),
			Self::WebQuery => (
				"Search the web for current information: salaries, job market trends, \
				 university admissions, certifications, or anything the database cannot answer.",
				"Search query.",
			),
		};
		let argument = self.argument();

		ToolDefinition {
			name: self.name().to_string(),
			description: description.to_string(),
			parameters: serde_json::json!({
				"type": "object",
				"properties": {
					argument: { "type": "string", "description": argument_description },
				},
				"required": [argument],
			}),
		}
	}
}

/// Per-session call counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolBudget {
	pub web_search_count: u32,
	pub db_search_count: u32,
	max_web_searches: u32,
	max_db_searches: u32,
}
impl ToolBudget {
	pub fn new(max_web_searches: u32, max_db_searches: u32) -> Self {
		Self { web_search_count: 0, db_search_count: 0, max_web_searches, max_db_searches }
	}

	pub fn has_remaining(&self, kind: ToolKind) -> bool {
		match kind {
			ToolKind::VectorQuery => self.db_search_count < self.max_db_searches,
			ToolKind::WebQuery => self.web_search_count < self.max_web_searches,
		}
	}

	fn record(&mut self, kind: ToolKind) {
		match kind {
			ToolKind::VectorQuery => self.db_search_count += 1,
			ToolKind::WebQuery => self.web_search_count += 1,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
	pub text: String,
	pub sources: Vec<Source>,
	pub recommendations: Vec<Recommendation>,
}
impl ToolOutput {
	fn text(text: impl Into<String>) -> Self {
		Self { text: text.into(), ..Default::default() }
	}
}

pub struct ToolRouter<'a> {
	matching: MatchingEngine<'a>,
	web_search: &'a dyn WebSearchProvider,
	web_cfg: &'a WebSearchProviderConfig,
	default_limit: usize,
	web_timeout: Duration,
	lookup: HashMap<&'static str, ToolKind>,
}
impl<'a> ToolRouter<'a> {
	pub fn new(
		matching: MatchingEngine<'a>,
		web_search: &'a dyn WebSearchProvider,
		web_cfg: &'a WebSearchProviderConfig,
		default_limit: usize,
		web_timeout: Duration,
	) -> Self {
		let lookup = ToolKind::ALL.iter().map(|kind| (kind.name(), *kind)).collect();

		Self { matching, web_search, web_cfg, default_limit, web_timeout, lookup }
	}

	/// Tools with budget left, in a stable order.
	pub fn offered(&self, budget: &ToolBudget) -> Vec<ToolDefinition> {
		ToolKind::ALL
			.into_iter()
			.filter(|kind| budget.has_remaining(*kind))
			.map(ToolKind::definition)
			.collect()
	}

	pub async fn dispatch(&self, call: &ToolCall, budget: &mut ToolBudget) -> ToolOutput {
		let Some(kind) = self.lookup.get(call.name.as_str()).copied() else {
			tracing::warn!(tool = %call.name, "Model requested an unknown tool.");

			return ToolOutput::text(format!("Unknown tool: {}", call.name));
		};

		if !budget.has_remaining(kind) {
			tracing::info!(tool = kind.name(), "Tool budget exhausted; call not dispatched.");

			return ToolOutput::text(format!(
				"Tool {} is no longer available in this conversation. Answer with the \
				 information you already have.",
				kind.name()
			));
		}

		let Some(argument) = call
			.arguments
			.get(kind.argument())
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|value| !value.is_empty())
		else {
			return ToolOutput::text(format!(
				"Error: {} requires a non-empty \"{}\" argument.",
				kind.name(),
				kind.argument()
			));
		};

		budget.record(kind);

		tracing::info!(
			tool = kind.name(),
			argument,
			web_searches = budget.web_search_count,
			db_searches = budget.db_search_count,
			"Dispatching tool."
		);

		self.invoke(kind, argument).await
	}

	/// Runs a tool without budget bookkeeping.
	pub async fn invoke(&self, kind: ToolKind, argument: &str) -> ToolOutput {
		match kind {
			ToolKind::VectorQuery => self.query_vector_db(argument).await,
			ToolKind::WebQuery => self.search_web(argument).await,
		}
	}

	async fn query_vector_db(&self, topic: &str) -> ToolOutput {
		let outcome = self.matching.find_matches(topic, self.default_limit).await;

		tracing::info!(
			topic,
			tier = outcome.tier.as_str(),
			count = outcome.recommendations.len(),
			"Database query answered."
		);

		let text = if outcome.tier.is_fallback() {
			format!(
				"{EMPTY_DB_SENTINEL}\nThe database has no direct match for \"{topic}\". If the \
				 user needs current or external information, consider calling {SEARCH_WEB}.\n\n{}",
				outcome.context
			)
		} else {
			outcome.context
		};

		ToolOutput { text, sources: Vec::new(), recommendations: outcome.recommendations }
	}

	async fn search_web(&self, query: &str) -> ToolOutput {
		let search = self.web_search.search(self.web_cfg, query);
		let result = tokio::time::timeout(self.web_timeout, search)
			.await
			.map_err(|_| Error::search(timeout_message("Web search", self.web_timeout)))
			.and_then(|result| result.map_err(Error::search));
		let hits = match result {
			Ok(hits) => hits,
			Err(err) => {
				tracing::warn!(error = %err, query, "Web search failed.");

				return ToolOutput::text(
					"Web search is currently unavailable. Answer from general knowledge and any \
					 database results, and say that live data could not be checked.",
				);
			},
		};

		if hits.is_empty() {
			return ToolOutput::text(format!(
				"No web results for \"{query}\". Answer from general knowledge and say so."
			));
		}

		let (text, sources) = render_web_hits(query, &hits);

		ToolOutput { text, sources, recommendations: Vec::new() }
	}
}

pub fn render_web_hits(query: &str, hits: &[WebHit]) -> (String, Vec<Source>) {
	let mut text = format!("Web results for \"{query}\":\n");
	let mut sources = Vec::new();

	for hit in hits
		.iter()
		.filter(|hit| !hit.title.trim().is_empty() && !hit.snippet.trim().is_empty())
		.take(MAX_WEB_ENTRIES)
	{
		let domain = domain_of(&hit.link);
		let date = hit.date.as_deref().map(|date| format!(" ({date})")).unwrap_or_default();

		let _ = writeln!(text, "[{}] {}{date}", source_quality(domain), hit.title);
		let _ = writeln!(text, "  {}", hit.snippet);
		let _ = writeln!(text, "  Source: {domain}");

		sources.push(Source {
			title: text::truncate_chars(&hit.title, SOURCE_TITLE_CHARS),
			url: hit.link.clone(),
			snippet: text::truncate_chars(&hit.snippet, SOURCE_SNIPPET_CHARS),
		});
	}

	text.push_str(
		"Synthesize these results in your answer. If exact figures are missing, estimate from the \
		 trend and say so.",
	);

	(text, sources)
}

/// `official` for `.az` hosts, `education` for edu/gov/ac hosts, `web` otherwise.
pub fn source_quality(domain: &str) -> &'static str {
	if domain.ends_with(".az") {
		return "official";
	}
	if domain.split('.').any(|label| matches!(label, "edu" | "gov" | "ac")) {
		return "education";
	}

	"web"
}

fn domain_of(link: &str) -> &str {
	let without_scheme = link.split_once("://").map_or(link, |(_, rest)| rest);
	let host = without_scheme.split(['/', '?', '#']).next().unwrap_or_default();
	let host = host.rsplit_once('@').map_or(host, |(_, host)| host);
	let host = host.split(':').next().unwrap_or_default();

	host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hit(title: &str, link: &str, snippet: &str) -> WebHit {
		WebHit {
			title: title.to_string(),
			link: link.to_string(),
			snippet: snippet.to_string(),
			date: None,
		}
	}

	#[test]
	fn labels_source_quality_by_domain() {
		assert_eq!(source_quality(domain_of("https://www.dim.gov.az/news")), "official");
		assert_eq!(source_quality(domain_of("https://ox.ac.uk/courses?x=1")), "education");
		assert_eq!(source_quality(domain_of("http://mit.edu")), "education");
		assert_eq!(source_quality(domain_of("https://stackoverflow.com/q/1")), "web");
	}

	#[test]
	fn renders_at_most_eight_complete_entries() {
		let mut hits =
			vec![hit("", "https://a.com", "no title"), hit("No snippet", "https://b.com", "")];

		hits.extend(
			(0..10).map(|i| hit(&format!("Result {i}"), &format!("https://r{i}.com"), "text")),
		);

		let (text, sources) = render_web_hits("rust jobs", &hits);

		assert_eq!(sources.len(), MAX_WEB_ENTRIES);
		assert_eq!(sources[0].title, "Result 0");
		assert!(!text.contains("No snippet"));
		assert!(text.contains("[web] Result 7"));
		assert!(!text.contains("Result 8"));
	}

	#[test]
	fn truncates_source_fields() {
		let long_title = "t".repeat(150);
		let long_snippet = "s".repeat(300);
		let (_, sources) =
			render_web_hits("q", &[hit(&long_title, "https://x.az", &long_snippet)]);

		assert_eq!(sources[0].title.chars().count(), SOURCE_TITLE_CHARS + 3);
		assert_eq!(sources[0].snippet.chars().count(), SOURCE_SNIPPET_CHARS + 3);
	}

	#[test]
	fn budget_tracks_each_tool_separately() {
		let mut budget = ToolBudget::new(1, 2);

		budget.record(ToolKind::WebQuery);

		assert!(!budget.has_remaining(ToolKind::WebQuery));
		assert!(budget.has_remaining(ToolKind::VectorQuery));
	}

	#[test]
	fn definitions_require_their_argument() {
		let definition = ToolKind::VectorQuery.definition();

		assert_eq!(definition.name, QUERY_VECTOR_DB);
		assert_eq!(definition.parameters["required"][0], "topic");
		assert_eq!(ToolKind::WebQuery.definition().parameters["required"][0], "query");
	}
}
