//! Pre-flight topic gate.
//!
//! Runs before any model or tool call. Hard-block terms refuse outright; soft-pivot terms
//! redirect the user back to career and education topics unless the query also carries
//! domain context ("football" alone is off-topic, "football analytics developer" is not).

use crate::text;

pub const REFUSAL_MESSAGE: &str = "This topic is outside what I can help with. I am an IT career \
and education advisor: ask me about programming, courses, mentors, or building a tech career.";

pub const REDIRECT_MESSAGE: &str = "That is an interesting topic, but my expertise is IT careers \
and learning. I can help you get started in tech, pick a programming course, find a mentor, or \
plan your next career step. Which of these interests you?";

/// Suggested follow-ups attached to a redirect.
pub const REDIRECT_FOLLOW_UPS: [&str; 3] =
	["How do I start a career in IT?", "Which programming course fits me?", "Find me a mentor"];

/// Substring-matched against the normalized query. Terms are chosen so that they do not occur
/// inside common technical words ("skill", "software", "between").
pub const HARD_BLOCK_TERMS: &[&str] = &[
	// violence
	"violence",
	"terrorism",
	"terrorist",
	"murder",
	"weapon",
	"firearm",
	"how to make a bomb",
	"zorakılıq",
	// politics
	"politics",
	"political party",
	"election campaign",
	"presidential election",
	"propaganda",
	"siyasət",
	// adult content
	"porn",
	"nsfw",
	"adult content",
	"escort service",
	"erotic",
	// gambling
	"gambling",
	"casino",
	"betting",
	"poker",
	"lottery",
	"slot machine",
	"qumar",
];

pub const SOFT_PIVOT_TERMS: &[&str] = &[
	"football",
	"soccer",
	"basketball",
	"tennis",
	"sports",
	"weather",
	"horoscope",
	"celebrity",
	"movie",
	"tv series",
	"music video",
	"recipe",
	"futbol",
	"hava proqnozu",
];

/// Matched on word boundaries, so "app" does not fire inside "happy".
pub const DOMAIN_CONTEXT_TERMS: &[&str] = &[
	"developer",
	"programming",
	"programmer",
	"software",
	"coding",
	"code",
	"engineer",
	"analytics",
	"data",
	"machine learning",
	"python",
	"javascript",
	"database",
	"backend",
	"frontend",
	"career",
	"job",
	"course",
	"mentor",
	"app",
	"api",
	"design",
	"proqramlaşdırma",
	"karyera",
	"kurs",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
	Blocked,
	Redirected,
	Safe,
}
impl SafetyVerdict {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Blocked => "blocked",
			Self::Redirected => "redirected",
			Self::Safe => "safe",
		}
	}
}

pub fn classify(query: &str) -> SafetyVerdict {
	let normalized = text::normalize(query);

	if text::contains_any(&normalized, HARD_BLOCK_TERMS) {
		return SafetyVerdict::Blocked;
	}
	if text::contains_any(&normalized, SOFT_PIVOT_TERMS)
		&& !text::WordIndex::new(&normalized).contains_any(DOMAIN_CONTEXT_TERMS)
	{
		return SafetyVerdict::Redirected;
	}

	SafetyVerdict::Safe
}

/// The hard-block term that matched, for logging.
pub fn blocking_term(query: &str) -> Option<&'static str> {
	let normalized = text::normalize(query);

	HARD_BLOCK_TERMS.iter().copied().find(|term| normalized.contains(term))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hard_block_terms_do_not_hide_in_technical_words() {
		for query in [
			"skill tree for software engineers",
			"difference between sql and nosql",
			"alphabet soup of cloud certifications",
			"feature selection for machine learning",
		] {
			assert_eq!(classify(query), SafetyVerdict::Safe, "{query}");
		}
	}

	#[test]
	fn context_terms_do_not_hide_in_unrelated_words() {
		for query in ["weather in the capital", "happy movie night", "decode this horoscope"] {
			assert_eq!(classify(query), SafetyVerdict::Redirected, "{query}");
		}

		assert_eq!(classify("movie recommendation app"), SafetyVerdict::Safe);
	}

	#[test]
	fn blocking_term_reports_match() {
		assert_eq!(blocking_term("Best CASINO apps"), Some("casino"));
		assert_eq!(blocking_term("rust course"), None);
	}
}
