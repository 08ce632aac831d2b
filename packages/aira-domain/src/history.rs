use std::collections::{VecDeque, vec_deque::Iter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
	User,
	Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
	pub role: TurnRole,
	#[serde(alias = "content")]
	pub text: String,
}
impl Turn {
	pub fn user(text: impl Into<String>) -> Self {
		Self { role: TurnRole::User, text: text.into() }
	}

	pub fn assistant(text: impl Into<String>) -> Self {
		Self { role: TurnRole::Assistant, text: text.into() }
	}
}

/// Most recent conversation turns, oldest first. Pushing past capacity evicts the oldest turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
	turns: VecDeque<Turn>,
	capacity: usize,
}
impl ConversationHistory {
	pub fn new(capacity: usize) -> Self {
		Self { turns: VecDeque::with_capacity(capacity), capacity }
	}

	/// Keeps the last `capacity` turns that carry non-blank text.
	pub fn from_turns<I>(capacity: usize, turns: I) -> Self
	where
		I: IntoIterator<Item = Turn>,
	{
		let mut history = Self::new(capacity);

		for turn in turns {
			history.push(turn);
		}

		history
	}

	pub fn push(&mut self, turn: Turn) {
		if self.capacity == 0 || turn.text.trim().is_empty() {
			return;
		}
		if self.turns.len() == self.capacity {
			self.turns.pop_front();
		}

		self.turns.push_back(turn);
	}

	pub fn iter(&self) -> Iter<'_, Turn> {
		self.turns.iter()
	}

	pub fn len(&self) -> usize {
		self.turns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.turns.is_empty()
	}
}
impl<'a> IntoIterator for &'a ConversationHistory {
	type IntoIter = Iter<'a, Turn>;
	type Item = &'a Turn;

	fn into_iter(self) -> Self::IntoIter {
		self.turns.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn evicts_oldest_turn_at_capacity() {
		let mut history = ConversationHistory::new(2);

		history.push(Turn::user("first"));
		history.push(Turn::assistant("second"));
		history.push(Turn::user("third"));

		let texts: Vec<&str> = history.iter().map(|turn| turn.text.as_str()).collect();

		assert_eq!(texts, vec!["second", "third"]);
	}

	#[test]
	fn zero_capacity_keeps_nothing() {
		let history = ConversationHistory::from_turns(0, [Turn::user("hello")]);

		assert!(history.is_empty());
	}
}
