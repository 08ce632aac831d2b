use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Canonical form used for every term lookup: NFKC, lower-cased, single-spaced.
pub fn normalize(input: &str) -> String {
	let folded = input.nfkc().collect::<String>().to_lowercase();

	folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Substring test against an already normalized haystack.
pub fn contains_any(normalized: &str, terms: &[&str]) -> bool {
	terms.iter().any(|term| normalized.contains(term))
}

/// Word-boundary phrase matching.
///
/// `"all"` matches "show all courses" but not "small". Phrases are compared word by word, so
/// punctuation between words does not matter.
pub struct WordIndex {
	joined: String,
}
impl WordIndex {
	pub fn new(input: &str) -> Self {
		let normalized = normalize(input);
		let words: Vec<&str> = normalized.unicode_words().collect();

		Self { joined: format!(" {} ", words.join(" ")) }
	}

	pub fn contains_phrase(&self, phrase: &str) -> bool {
		let normalized = normalize(phrase);
		let words: Vec<&str> = normalized.unicode_words().collect();

		if words.is_empty() {
			return false;
		}

		self.joined.contains(&format!(" {} ", words.join(" ")))
	}

	pub fn contains_any(&self, phrases: &[&str]) -> bool {
		phrases.iter().any(|phrase| self.contains_phrase(phrase))
	}
}

/// Truncates to `max_chars` characters, appending an ellipsis when anything was cut.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
	if input.chars().count() <= max_chars {
		return input.to_string();
	}

	let mut out: String = input.chars().take(max_chars).collect();

	out.push_str("...");

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalizes_case_width_and_spacing() {
		assert_eq!(normalize("  Python\t\tBACKEND \n course "), "python backend course");
		assert_eq!(normalize("ＰＹＴＨＯＮ"), "python");
	}

	#[test]
	fn phrases_respect_word_boundaries() {
		let index = WordIndex::new("Show me ALL courses, please");

		assert!(index.contains_phrase("all courses"));
		assert!(index.contains_phrase("all"));
		assert!(!WordIndex::new("small data sets").contains_phrase("all"));
		assert!(!index.contains_phrase("   "));
	}

	#[test]
	fn truncates_on_char_boundaries() {
		assert_eq!(truncate_chars("Təhlükəsizlik", 4), "Təhl...");
		assert_eq!(truncate_chars("short", 10), "short");
	}
}
