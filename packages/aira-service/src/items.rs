use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use aira_domain::catalog::{CuratedItem, ItemKind};

/// A web page cited by an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
	pub title: String,
	pub url: String,
	pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchQuality {
	Exact,
	Related,
	Keyword,
	Alternative,
	All,
}
impl MatchQuality {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Exact => "EXACT",
			Self::Related => "RELATED",
			Self::Keyword => "KEYWORD",
			Self::Alternative => "ALTERNATIVE",
			Self::All => "ALL",
		}
	}

	/// Context tag the model sees in front of each item.
	pub fn tag(self) -> String {
		format!("[MATCH: {}]", self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
	pub id: String,
	pub title: String,
	pub kind: ItemKind,
	pub description: String,
	pub metadata: Map<String, Value>,
	pub match_quality: MatchQuality,
}
impl Recommendation {
	pub fn from_curated(item: &CuratedItem, quality: MatchQuality) -> Self {
		let mut metadata = Map::new();

		metadata.insert("category".to_string(), Value::from(item.category));
		metadata.insert("difficulty".to_string(), Value::from(item.difficulty));
		metadata.insert("duration".to_string(), Value::from(item.duration));
		metadata.insert("rating".to_string(), Value::from(round_to(f64::from(item.rating), 1)));
		metadata.insert("students".to_string(), Value::from(item.students));
		metadata.insert("mentor".to_string(), Value::from(item.mentor));
		metadata.insert("tags".to_string(), Value::from(item.tags.to_vec()));
		metadata.insert("match_quality".to_string(), Value::from(quality.as_str()));

		Self {
			id: item.id.to_string(),
			title: item.title.to_string(),
			kind: item.kind,
			description: item.description.to_string(),
			metadata,
			match_quality: quality,
		}
	}

	pub fn meta_str(&self, key: &str) -> Option<&str> {
		self.metadata.get(key).and_then(Value::as_str)
	}

	pub fn meta_f64(&self, key: &str) -> Option<f64> {
		self.metadata.get(key).and_then(Value::as_f64)
	}
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
	let factor = 10_f64.powi(decimals);

	(value * factor).round() / factor
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quality_serializes_screaming() {
		assert_eq!(
			serde_json::to_value(MatchQuality::Alternative).expect("Failed to serialize."),
			"ALTERNATIVE"
		);
		assert_eq!(MatchQuality::Related.tag(), "[MATCH: RELATED]");
	}

	#[test]
	fn curated_items_carry_catalog_metadata() {
		let item = &aira_domain::catalog::inventory()[0];
		let rec = Recommendation::from_curated(item, MatchQuality::Keyword);

		assert_eq!(rec.id, item.id);
		assert_eq!(rec.kind, ItemKind::Course);
		assert_eq!(rec.meta_str("mentor"), Some(item.mentor));
		assert_eq!(rec.meta_str("match_quality"), Some("KEYWORD"));
		assert_eq!(rec.meta_f64("rating"), Some(4.8));
	}
}
