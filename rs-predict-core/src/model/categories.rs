use std::collections::HashSet;

use serde::Serialize;

const DETERMINERS: &[&str] = &["the", "a", "an", "that", "this", "these", "those"];

const ADJECTIVES: &[&str] = &[
	"good", "great", "big", "small", "new", "old", "important", "interesting", "amazing", "powerful",
];

const VERBS: &[&str] = &[
	"is", "are", "was", "were", "has", "have", "can", "could", "should", "will", "would", "like",
	"love", "think", "know", "see", "make", "get", "do", "does",
];

const NOUNS: &[&str] = &[
	"cat", "dog", "pizza", "food", "model", "network", "learning", "data", "work", "way", "time",
	"thing",
];

const PREPOSITIONS: &[&str] = &["of", "to", "in", "on", "at", "for", "with", "about", "that"];

/// Coarse part-of-speech-like category of a word, decided by list membership.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WordCategory {
	Determiner,
	Adjective,
	Verb,
	Noun,
	Preposition,
}

impl WordCategory {
	/// Lookup priority. `"that"` is listed as determiner and preposition;
	/// the determiner wins.
	const PRIORITY: [WordCategory; 5] = [
		WordCategory::Determiner,
		WordCategory::Adjective,
		WordCategory::Verb,
		WordCategory::Noun,
		WordCategory::Preposition,
	];

	/// Classifies `word` into the first matching category, if any.
	pub fn classify(word: &str) -> Option<Self> {
		Self::PRIORITY
			.into_iter()
			.find(|category| category.members().contains(&word))
	}

	/// Words of this category.
	pub fn members(self) -> &'static [&'static str] {
		match self {
			WordCategory::Determiner => DETERMINERS,
			WordCategory::Adjective => ADJECTIVES,
			WordCategory::Verb => VERBS,
			WordCategory::Noun => NOUNS,
			WordCategory::Preposition => PREPOSITIONS,
		}
	}

	/// Categories expected right after a word of this category.
	pub fn followers(self) -> &'static [WordCategory] {
		match self {
			WordCategory::Determiner => &[WordCategory::Adjective, WordCategory::Noun],
			WordCategory::Adjective => &[WordCategory::Noun],
			WordCategory::Verb => &[WordCategory::Noun, WordCategory::Adjective, WordCategory::Preposition],
			WordCategory::Noun => &[WordCategory::Verb, WordCategory::Preposition],
			WordCategory::Preposition => &[WordCategory::Determiner, WordCategory::Noun],
		}
	}
}

/// Words that commonly follow `word`.
///
/// Empty when `word` belongs to no category.
pub fn common_followers(word: &str) -> HashSet<&'static str> {
	WordCategory::classify(word)
		.map(|category| {
			category
				.followers()
				.iter()
				.flat_map(|follower| follower.members().iter().copied())
				.collect()
		})
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classify_respects_priority() {
		assert_eq!(WordCategory::classify("that"), Some(WordCategory::Determiner));
		assert_eq!(WordCategory::classify("good"), Some(WordCategory::Adjective));
		assert_eq!(WordCategory::classify("like"), Some(WordCategory::Verb));
		assert_eq!(WordCategory::classify("pizza"), Some(WordCategory::Noun));
		assert_eq!(WordCategory::classify("with"), Some(WordCategory::Preposition));
		assert_eq!(WordCategory::classify("zebra"), None);
	}

	#[test]
	fn determiners_expect_adjectives_and_nouns() {
		let followers = common_followers("the");
		assert!(followers.contains("cat"));
		assert!(followers.contains("amazing"));
		assert!(!followers.contains("is"));
	}

	#[test]
	fn prepositions_expect_determiners_and_nouns() {
		let followers = common_followers("of");
		assert!(followers.contains("the"));
		assert!(followers.contains("data"));
		assert!(!followers.contains("good"));
	}

	#[test]
	fn unknown_word_has_no_followers() {
		assert!(common_followers("xylophone").is_empty());
	}
}
