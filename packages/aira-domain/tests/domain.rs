use aira_domain::{
	catalog,
	history::{ConversationHistory, Turn, TurnRole},
	intent,
	safety::{self, SafetyVerdict},
};

#[test]
fn gambling_query_is_blocked() {
	assert_eq!(safety::classify("gambling site recommendations"), SafetyVerdict::Blocked);
	assert_eq!(safety::classify("Best Online CASINO"), SafetyVerdict::Blocked);
}

#[test]
fn off_topic_query_is_redirected() {
	assert_eq!(safety::classify("weather today"), SafetyVerdict::Redirected);
	assert_eq!(safety::classify("Who won the football match?"), SafetyVerdict::Redirected);
}

#[test]
fn off_topic_term_with_domain_context_is_safe() {
	assert_eq!(
		safety::classify("football stats for a sports analytics developer job"),
		SafetyVerdict::Safe
	);
	assert_eq!(safety::classify("How do I learn Rust?"), SafetyVerdict::Safe);
}

#[test]
fn hard_block_wins_over_domain_context() {
	assert_eq!(safety::classify("python bot for casino betting"), SafetyVerdict::Blocked);
}

#[test]
fn keyword_matches_rank_by_tag_hits() {
	let matches = catalog::keyword_matches("i want to learn docker and kubernetes on aws", 4);

	assert_eq!(matches.first().map(|(item, _)| item.id), Some("bs_devops"));
	assert_eq!(matches.first().map(|(_, hits)| *hits), Some(3));
}

#[test]
fn keyword_matches_respect_top_k() {
	let matches = catalog::keyword_matches("python data sql database programming", 2);

	assert_eq!(matches.len(), 2);
	assert!(matches[0].1 >= matches[1].1);
}

#[test]
fn unrelated_topic_has_no_keyword_matches() {
	assert!(catalog::keyword_matches("underwater basket weaving", 4).is_empty());
}

#[test]
fn bestsellers_are_never_empty() {
	assert_eq!(catalog::bestsellers(0).len(), 1);
	assert_eq!(catalog::bestsellers(4).len(), 4);
	assert_eq!(catalog::bestsellers(100).len(), catalog::inventory().len());
	assert_eq!(catalog::bestsellers(1)[0].id, "bs_python_backend");
}

#[test]
fn list_all_intent_is_detected() {
	assert!(intent::detect("What do you have? Show all courses.").list_all);
	assert!(!intent::detect("python backend").list_all);
}

#[test]
fn history_skips_blank_turns_and_keeps_the_tail() {
	let turns = vec![
		Turn::user("one"),
		Turn::assistant("   "),
		Turn::assistant("two"),
		Turn::user("three"),
		Turn::assistant("four"),
	];
	let history = ConversationHistory::from_turns(3, turns);
	let texts: Vec<&str> = history.iter().map(|turn| turn.text.as_str()).collect();

	assert_eq!(texts, vec!["two", "three", "four"]);
}

#[test]
fn turns_deserialize_from_wire_shape() {
	let turn: Turn = serde_json::from_str(r#"{"role":"assistant","content":"Hi there"}"#)
		.expect("Failed to parse turn.");

	assert_eq!(turn.role, TurnRole::Assistant);
	assert_eq!(turn.text, "Hi there");
}
