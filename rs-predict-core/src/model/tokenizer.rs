/// Punctuation characters emitted as standalone tokens.
pub const PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

/// Start-of-sequence sentinel wrapped around every corpus sentence.
pub const START_TOKEN: &str = "<s>";

/// End-of-sequence sentinel wrapped around every corpus sentence.
pub const END_TOKEN: &str = "</s>";

/// Returns `true` if `c` belongs to a word token.
///
/// Word characters are ASCII letters, digits and `_`, plus the apostrophe
/// so that contractions (`don't`, `it's`) stay in one piece.
fn is_word_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == '\''
}

/// Splits `text` into lowercase tokens.
///
/// - Maximal runs of word characters form one token
/// - Each punctuation character from [`PUNCTUATION`] is its own token
/// - Anything else separates tokens and is dropped
///
/// Empty input yields an empty vector. Sentinels are never produced:
/// `"</s>"` tokenizes to `["s"]`.
pub fn tokenize(text: &str) -> Vec<String> {
	let lowered = text.to_lowercase();
	let mut tokens = Vec::new();
	let mut word = String::new();

	for c in lowered.chars() {
		if is_word_char(c) {
			word.push(c);
			continue;
		}
		if !word.is_empty() {
			tokens.push(std::mem::take(&mut word));
		}
		if PUNCTUATION.contains(&c) {
			tokens.push(c.to_string());
		}
	}
	if !word.is_empty() {
		tokens.push(word);
	}

	tokens
}

/// Returns `true` for the start/end sentinels.
pub fn is_sentinel(token: &str) -> bool {
	token == START_TOKEN || token == END_TOKEN
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_input_has_no_tokens() {
		assert!(tokenize("").is_empty());
		assert!(tokenize("   \t\n").is_empty());
	}

	#[test]
	fn lowercases_and_keeps_contractions() {
		assert_eq!(tokenize("I Don't KNOW"), vec!["i", "don't", "know"]);
	}

	#[test]
	fn punctuation_is_standalone() {
		assert_eq!(
			tokenize("hello, world! ok?"),
			vec!["hello", ",", "world", "!", "ok", "?"]
		);
		assert_eq!(tokenize("a;b:c."), vec!["a", ";", "b", ":", "c", "."]);
	}

	#[test]
	fn other_characters_separate() {
		assert_eq!(tokenize("cats-and_dogs (2)"), vec!["cats", "and_dogs", "2"]);
		assert_eq!(tokenize("</s>"), vec!["s"]);
	}

	#[test]
	fn only_punctuation() {
		assert_eq!(tokenize("..."), vec![".", ".", "."]);
	}
}
