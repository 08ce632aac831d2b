//! Tiered matching engine.
//!
//! Resolves a topic into recommendations through three tiers: vector search over the course
//! and mentor collections, keyword matching against the curated inventory, and the curated
//! bestsellers. Each tier only runs when the previous one produced nothing, and the last one
//! cannot fail, so a completed search always yields at least one recommendation. Failures in
//! the vector tier are logged and demoted to the next tier; they never reach the caller.

use std::{collections::HashSet, fmt::Write as _, time::Duration};

use serde_json::{Map, Value};

use aira_config::Config;
use aira_domain::{
	catalog::{self, ItemKind},
	intent::{self, QueryIntent},
	text,
};
use aira_storage::models::SearchHit;

use crate::{
	EmbeddingProvider, Error, Result, VectorIndex,
	error::timeout_message,
	items::{MatchQuality, Recommendation, round_to},
};

const CARD_DESCRIPTION_CHARS: usize = 150;
const CONTEXT_DESCRIPTION_CHARS: usize = 120;

/// Which tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
	ListAll,
	Vector,
	Keyword,
	Popular,
}
impl MatchTier {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::ListAll => "list_all",
			Self::Vector => "vector",
			Self::Keyword => "keyword",
			Self::Popular => "popular",
		}
	}

	/// True when the vector tier produced nothing for this topic.
	pub fn is_fallback(self) -> bool {
		matches!(self, Self::Keyword | Self::Popular)
	}
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
	pub recommendations: Vec<Recommendation>,
	/// Model-facing description of the same items, one tagged block per item.
	pub context: String,
	pub tier: MatchTier,
}

pub struct MatchingEngine<'a> {
	cfg: &'a Config,
	index: &'a dyn VectorIndex,
	embedding: &'a dyn EmbeddingProvider,
}
impl<'a> MatchingEngine<'a> {
	pub fn new(
		cfg: &'a Config,
		index: &'a dyn VectorIndex,
		embedding: &'a dyn EmbeddingProvider,
	) -> Self {
		Self { cfg, index, embedding }
	}

	pub async fn find_matches(&self, topic: &str, limit: usize) -> MatchOutcome {
		let limit = limit.max(1);
		let intent = intent::detect(topic);

		if intent.list_all {
			tracing::info!(topic, "List-all request; returning the full inventory.");

			return list_all_outcome();
		}

		let timeout = Duration::from_millis(self.cfg.matching.timeout_ms);

		match tokio::time::timeout(timeout, self.vector_tier(topic, limit, intent)).await {
			Ok(Ok(Some(outcome))) => return outcome,
			Ok(Ok(None)) => {
				tracing::info!(topic, "Vector tier returned no admissible candidates.");
			},
			Ok(Err(err)) => {
				tracing::warn!(error = %err, topic, "Vector tier failed; falling back.");
			},
			Err(_) => {
				let err = Error::retrieval(timeout_message("Vector search", timeout));

				tracing::warn!(error = %err, topic, "Vector tier timed out; falling back.");
			},
		}

		if let Some(outcome) = self.keyword_tier(topic) {
			return outcome;
		}

		popular_outcome(topic, self.cfg.matching.fallback_count as usize)
	}

	async fn vector_tier(
		&self,
		topic: &str,
		limit: usize,
		intent: QueryIntent,
	) -> Result<Option<MatchOutcome>> {
		let matching = &self.cfg.matching;
		let qdrant = &self.cfg.storage.qdrant;
		let vectors = self
			.embedding
			.embed(&self.cfg.providers.embedding, &[topic.to_string()])
			.await
			.map_err(Error::retrieval)?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::retrieval("Embedding provider returned no vectors."));
		};

		if vector.len() != qdrant.vector_dim as usize {
			return Err(Error::retrieval(format!(
				"Embedding has {} dimensions, expected {}.",
				vector.len(),
				qdrant.vector_dim
			)));
		}

		let course_hits = self
			.index
			.search(
				&qdrant.courses_collection,
				&vector,
				(limit * 2) as u64,
				matching.admission_threshold,
			)
			.await
			.map_err(Error::retrieval)?;
		let mentor_hits = self
			.index
			.search(
				&qdrant.mentors_collection,
				&vector,
				u64::from(matching.mentor_limit),
				matching.admission_threshold,
			)
			.await
			.map_err(Error::retrieval)?;
		let mut courses: Vec<Candidate> =
			course_hits.iter().filter_map(Candidate::course).collect();
		let mentors: Vec<Candidate> = mentor_hits.iter().filter_map(Candidate::mentor).collect();

		if intent.budget {
			let ceiling = matching.budget_price_ceiling;

			courses.retain(|candidate| candidate.price.is_some_and(|price| price <= ceiling));
		}
		if intent.popularity {
			courses.sort_by(|left, right| right.popularity.cmp(&left.popularity));
		}

		let mut exact = Vec::new();
		let mut related = Vec::new();

		for candidate in courses.into_iter().chain(mentors) {
			if candidate.score >= matching.exact_threshold {
				exact.push(candidate.into_recommendation(MatchQuality::Exact));
			} else if candidate.score >= matching.related_threshold {
				related.push(candidate.into_recommendation(MatchQuality::Related));
			}
		}

		let recommendations = dedup(exact.into_iter().chain(related), limit);

		if recommendations.is_empty() {
			return Ok(None);
		}

		tracing::info!(
			topic,
			count = recommendations.len(),
			budget = intent.budget,
			popularity = intent.popularity,
			"Vector tier matched."
		);

		let context =
			vector_context(topic, &recommendations, intent, matching.budget_price_ceiling);

		Ok(Some(MatchOutcome { recommendations, context, tier: MatchTier::Vector }))
	}

	fn keyword_tier(&self, topic: &str) -> Option<MatchOutcome> {
		let normalized = text::normalize(topic);
		let matches =
			catalog::keyword_matches(&normalized, self.cfg.matching.keyword_top_k as usize);

		if matches.is_empty() {
			return None;
		}

		tracing::info!(topic, count = matches.len(), "Keyword tier matched.");

		let recommendations: Vec<Recommendation> = matches
			.iter()
			.map(|(item, _)| Recommendation::from_curated(item, MatchQuality::Keyword))
			.collect();
		let mut context = format!(
			"No direct database match for \"{topic}\". Closest programs by keyword; say they are \
			 related rather than exact:\n"
		);

		for (recommendation, (_, hits)) in recommendations.iter().zip(&matches) {
			push_item_block(&mut context, recommendation);
			let _ = writeln!(context, "  Keyword hits: {hits}");
		}

		Some(MatchOutcome { recommendations, context, tier: MatchTier::Keyword })
	}
}

struct Candidate {
	id: String,
	title: String,
	kind: ItemKind,
	description: String,
	score: f32,
	price: Option<f64>,
	popularity: u64,
	metadata: Map<String, Value>,
}
impl Candidate {
	fn course(hit: &SearchHit) -> Option<Self> {
		let Some(title) = hit.str_field("title") else {
			tracing::warn!(id = %hit.external_id, "Course payload has no title; skipping.");

			return None;
		};
		let price = hit.f64_field("price");
		let popularity =
			hit.u64_field("student_count").or_else(|| hit.u64_field("enrollment_count"));
		let mut metadata = Map::new();

		insert_str(&mut metadata, "category", hit.str_field("category"));
		insert_str(&mut metadata, "difficulty", hit.str_field("difficulty"));

		if let Some(hours) = hit.f64_field("duration_hours") {
			metadata.insert("duration".to_string(), Value::from(format!("{hours} hours")));
		}
		if let Some(rating) = hit.f64_field("rating") {
			metadata.insert("rating".to_string(), Value::from(round_to(rating, 1)));
		}
		if let Some(students) = popularity {
			metadata.insert("students".to_string(), Value::from(students));
		}
		if let Some(price) = price {
			metadata.insert("price".to_string(), Value::from(price));
		}

		Some(Self {
			id: hit.id(),
			title: title.to_string(),
			kind: ItemKind::Course,
			description: text::truncate_chars(
				hit.str_field("description").unwrap_or_default(),
				CARD_DESCRIPTION_CHARS,
			),
			score: hit.score,
			price,
			popularity: popularity.unwrap_or(0),
			metadata,
		})
	}

	fn mentor(hit: &SearchHit) -> Option<Self> {
		let Some(name) = hit.str_field("name") else {
			tracing::warn!(id = %hit.external_id, "Mentor payload has no name; skipping.");

			return None;
		};
		let specialty = hit.str_field("specialty").unwrap_or("Mentor");
		let skills: Vec<&str> = hit
			.payload
			.get("skills")
			.and_then(Value::as_array)
			.map(|skills| skills.iter().filter_map(Value::as_str).collect())
			.unwrap_or_default();
		let experience = hit.u64_field("experience_years");
		let mut metadata = Map::new();
		let mut description = format!("{specialty} mentor");

		metadata.insert("specialty".to_string(), Value::from(specialty));

		if let Some(years) = experience {
			metadata.insert("experience_years".to_string(), Value::from(years));
			let _ = write!(description, " with {years} years of experience");
		}
		if let Some(rating) = hit.f64_field("rating") {
			metadata.insert("rating".to_string(), Value::from(round_to(rating, 1)));
		}
		if !skills.is_empty() {
			let _ = write!(description, ". Skills: {}", skills.join(", "));
		}

		description.push('.');

		Some(Self {
			id: hit.id(),
			title: name.to_string(),
			kind: ItemKind::Mentor,
			description,
			score: hit.score,
			price: None,
			popularity: 0,
			metadata,
		})
	}

	fn into_recommendation(mut self, quality: MatchQuality) -> Recommendation {
		let score = round_to(f64::from(self.score), 3);

		self.metadata.insert("score".to_string(), Value::from(score));
		self.metadata.insert("match_quality".to_string(), Value::from(quality.as_str()));

		Recommendation {
			id: self.id,
			title: self.title,
			kind: self.kind,
			description: self.description,
			metadata: self.metadata,
			match_quality: quality,
		}
	}
}

/// Same id or same title collapse to the first occurrence.
fn dedup(
	recommendations: impl IntoIterator<Item = Recommendation>,
	limit: usize,
) -> Vec<Recommendation> {
	let mut seen_ids = HashSet::new();
	let mut seen_titles = HashSet::new();
	let mut out = Vec::new();

	for recommendation in recommendations {
		let title_key = text::normalize(&recommendation.title);

		if seen_ids.contains(&recommendation.id) || seen_titles.contains(&title_key) {
			continue;
		}

		seen_ids.insert(recommendation.id.clone());
		seen_titles.insert(title_key);
		out.push(recommendation);

		if out.len() == limit {
			break;
		}
	}

	out
}

fn list_all_outcome() -> MatchOutcome {
	let recommendations: Vec<Recommendation> = catalog::inventory()
		.iter()
		.map(|item| Recommendation::from_curated(item, MatchQuality::All))
		.collect();
	let mut context = String::from("Full program catalog:\n");

	for recommendation in &recommendations {
		push_item_block(&mut context, recommendation);
	}

	MatchOutcome { recommendations, context, tier: MatchTier::ListAll }
}

fn popular_outcome(topic: &str, count: usize) -> MatchOutcome {
	tracing::info!(topic, count, "No match in any tier; returning bestsellers.");

	let recommendations: Vec<Recommendation> = catalog::bestsellers(count)
		.iter()
		.map(|item| Recommendation::from_curated(item, MatchQuality::Alternative))
		.collect();
	let mut context = format!(
		"No direct match for \"{topic}\". The programs below are popular alternatives, not a \
		 direct match. Present them as alternatives and say that nothing matched exactly:\n"
	);

	for recommendation in &recommendations {
		push_item_block(&mut context, recommendation);
	}

	MatchOutcome { recommendations, context, tier: MatchTier::Popular }
}

fn vector_context(
	topic: &str,
	recommendations: &[Recommendation],
	intent: QueryIntent,
	price_ceiling: f64,
) -> String {
	let mut filters = Vec::new();

	if intent.budget {
		filters.push(format!("budget-friendly: price <= {price_ceiling}"));
	}
	if intent.popularity {
		filters.push("sorted by popularity".to_string());
	}

	let mut context = format!("Database results for \"{topic}\"");

	if !filters.is_empty() {
		let _ = write!(context, " ({})", filters.join(", "));
	}

	context.push_str(":\n");

	for recommendation in recommendations {
		push_item_block(&mut context, recommendation);

		let mut details = Vec::new();

		if let Some(score) = recommendation.meta_f64("score") {
			details.push(format!("Match: {:.0}%", score * 100.0));
		}
		if let Some(duration) = recommendation.meta_str("duration") {
			details.push(format!("Duration: {duration}"));
		}
		if let Some(price) = recommendation.meta_f64("price") {
			details.push(format!("Price: {price}"));
		}
		if let Some(students) = recommendation.metadata.get("students").and_then(Value::as_u64)
		{
			details.push(format!("Students: {students}"));
		}
		if !details.is_empty() {
			let _ = writeln!(context, "  {}", details.join(" | "));
		}
	}

	context
}

fn push_item_block(context: &mut String, recommendation: &Recommendation) {
	let kind = match recommendation.kind {
		ItemKind::Course => "Course",
		ItemKind::Mentor => "Mentor",
	};
	let mut facts = Vec::new();

	if let Some(category) =
		recommendation.meta_str("category").or_else(|| recommendation.meta_str("specialty"))
	{
		facts.push(format!("Category: {category}"));
	}
	if let Some(level) = recommendation.meta_str("difficulty") {
		facts.push(format!("Level: {level}"));
	}
	if let Some(rating) = recommendation.meta_f64("rating") {
		facts.push(format!("Rating: {rating}"));
	}

	let _ = writeln!(
		context,
		"{} {kind}: {}",
		recommendation.match_quality.tag(),
		recommendation.title
	);

	if !facts.is_empty() {
		let _ = writeln!(context, "  {}", facts.join(" | "));
	}
	if !recommendation.description.is_empty() {
		let _ = writeln!(
			context,
			"  {}",
			text::truncate_chars(&recommendation.description, CONTEXT_DESCRIPTION_CHARS)
		);
	}
}

fn insert_str(metadata: &mut Map<String, Value>, key: &str, value: Option<&str>) {
	if let Some(value) = value {
		metadata.insert(key.to_string(), Value::from(value));
	}
}
