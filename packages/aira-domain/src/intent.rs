use crate::text::WordIndex;

/// Phrases asking for the whole catalog instead of a ranked match.
pub const LIST_ALL_TRIGGERS: &[&str] = &[
	"all courses",
	"all mentors",
	"show all",
	"list all",
	"list courses",
	"full list",
	"what else",
	"what do you have",
	"other courses",
	"more courses",
	"everything",
	"catalog",
	"bütün kurslar",
	"hamısı",
	"siyahı",
];

/// Cost-sensitivity phrases. Presence enables the price ceiling in the vector tier.
pub const BUDGET_TERMS: &[&str] = &[
	"cheap",
	"cheapest",
	"budget",
	"affordable",
	"low cost",
	"inexpensive",
	"student",
	"ucuz",
	"sərfəli",
	"tələbə",
];

/// Popularity phrases. Presence re-ranks vector candidates by enrollment.
pub const POPULARITY_TERMS: &[&str] =
	&["best", "top", "popular", "most popular", "most chosen", "ən yaxşı", "məşhur"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryIntent {
	pub list_all: bool,
	pub budget: bool,
	pub popularity: bool,
}

pub fn detect(topic: &str) -> QueryIntent {
	let index = WordIndex::new(topic);

	QueryIntent {
		list_all: index.contains_any(LIST_ALL_TRIGGERS),
		budget: index.contains_any(BUDGET_TERMS),
		popularity: index.contains_any(POPULARITY_TERMS),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_each_intent_independently() {
		let intent = detect("cheap but popular python course");

		assert!(intent.budget);
		assert!(intent.popularity);
		assert!(!intent.list_all);
	}

	#[test]
	fn triggers_are_whole_words() {
		assert!(!detect("laptop for a desktop developer").popularity);
		assert!(!detect("small install footprint").list_all);
		assert!(detect("Show ALL courses").list_all);
	}
}
