use std::collections::HashSet;

use crate::items::{Recommendation, Source};

/// Session-wide collection of everything the tools returned.
///
/// Sources are keyed by url (empty urls are dropped) and recommendations by id. The first
/// occurrence wins and order is first-seen, so feeding the same batch twice changes nothing.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
	sources: Vec<Source>,
	source_urls: HashSet<String>,
	recommendations: Vec<Recommendation>,
	recommendation_ids: HashSet<String>,
}
impl ResultAccumulator {
	pub fn add_sources(&mut self, sources: impl IntoIterator<Item = Source>) {
		for source in sources {
			let url = source.url.trim();

			if url.is_empty() || !self.source_urls.insert(url.to_string()) {
				continue;
			}

			self.sources.push(source);
		}
	}

	pub fn add_recommendations(
		&mut self,
		recommendations: impl IntoIterator<Item = Recommendation>,
	) {
		for recommendation in recommendations {
			if !self.recommendation_ids.insert(recommendation.id.clone()) {
				continue;
			}

			self.recommendations.push(recommendation);
		}
	}

	pub fn recommendation_count(&self) -> usize {
		self.recommendations.len()
	}

	pub fn finalize(
		mut self,
		max_sources: usize,
		max_recommendations: usize,
	) -> (Vec<Source>, Vec<Recommendation>) {
		self.sources.truncate(max_sources);
		self.recommendations.truncate(max_recommendations);

		(self.sources, self.recommendations)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;
	use crate::{ItemKind, MatchQuality};

	fn source(url: &str) -> Source {
		Source { title: format!("Title {url}"), url: url.to_string(), snippet: String::new() }
	}

	fn recommendation(id: &str) -> Recommendation {
		Recommendation {
			id: id.to_string(),
			title: id.to_uppercase(),
			kind: ItemKind::Course,
			description: String::new(),
			metadata: Map::new(),
			match_quality: MatchQuality::Related,
		}
	}

	#[test]
	fn adding_twice_equals_adding_once() {
		let batch = vec![source("https://a.com"), source("https://b.com")];
		let mut once = ResultAccumulator::default();
		let mut twice = ResultAccumulator::default();

		once.add_sources(batch.clone());
		twice.add_sources(batch.clone());
		twice.add_sources(batch);

		assert_eq!(once.finalize(5, 6), twice.finalize(5, 6));
	}

	#[test]
	fn drops_empty_urls_and_keeps_first_seen_order() {
		let mut accumulator = ResultAccumulator::default();

		accumulator.add_sources(vec![source(""), source("https://b.com"), source("  ")]);
		accumulator.add_sources(vec![source("https://a.com"), source("https://b.com")]);

		let (sources, _) = accumulator.finalize(5, 6);
		let urls: Vec<&str> = sources.iter().map(|source| source.url.as_str()).collect();

		assert_eq!(urls, vec!["https://b.com", "https://a.com"]);
	}

	#[test]
	fn finalize_applies_caps() {
		let mut accumulator = ResultAccumulator::default();

		accumulator.add_recommendations((0..10).map(|i| recommendation(&format!("r{i}"))));
		accumulator.add_recommendations(vec![recommendation("r0")]);

		assert_eq!(accumulator.recommendation_count(), 10);

		let (_, recommendations) = accumulator.finalize(5, 6);

		assert_eq!(recommendations.len(), 6);
		assert_eq!(recommendations[0].id, "r0");
	}
}
