use serde::Serialize;

use super::categories::{common_followers, WordCategory};
use super::ngram_model::{context_key, NGramModel};
use super::tokenizer::is_sentinel;

/// Minimum successor total for a trigram context to answer.
pub const MIN_TRIGRAM_TOTAL: usize = 2;

/// Minimum successor total for a bigram predecessor to answer.
pub const MIN_BIGRAM_TOTAL: usize = 1;

/// Weight multiplier for words in the "commonly follows" set.
pub const FOLLOWER_BOOST: f64 = 3.0;

/// Which level of the backoff produced a distribution.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum Backoff {
	/// Successors of the last two prompt tokens, joined as `prev2|prev1`.
	Trigram { context: String },
	/// Successors of the last prompt token.
	Bigram { context: String },
	/// Whole vocabulary by frequency. `boosted` is the category of the last
	/// token when one applied.
	Unigram { boosted: Option<WordCategory> },
}

/// Raw weights selected by the backoff, borrowed from the model.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDistribution<'m> {
	pub source: Backoff,
	/// `(token, weight)` in table order.
	pub weights: Vec<(&'m str, f64)>,
}

/// Selects the most specific distribution for `tokens`.
///
/// 1. Trigram on the last two tokens when its total is >= 2
/// 2. Bigram on the last token when its total is >= 1
/// 3. Unigram over the vocabulary without sentinels, words commonly
///    following the last token weighted 3x (no boost for an empty prompt)
///
/// Pure: the prompt and the model are only read.
pub fn backoff<'m>(model: &'m NGramModel, tokens: &[String]) -> RawDistribution<'m> {
	let Some(last) = tokens.last() else {
		return unigram(model, None);
	};

	if let [.., prev2, prev1] = tokens {
		let context = context_key(prev2, prev1);
		if let Some(state) = model.trigram_by_key(&context) {
			if state.total() >= MIN_TRIGRAM_TOTAL {
				return RawDistribution {
					source: Backoff::Trigram { context },
					weights: state.distribution(),
				};
			}
		}
	}

	if let Some(state) = model.bigram(last) {
		if state.total() >= MIN_BIGRAM_TOTAL {
			return RawDistribution {
				source: Backoff::Bigram { context: last.clone() },
				weights: state.distribution(),
			};
		}
	}

	unigram(model, Some(last.as_str()))
}

/// Unigram fallback, boosted by the category of `last` when given.
fn unigram<'m>(model: &'m NGramModel, last: Option<&str>) -> RawDistribution<'m> {
	let boosted = last.and_then(WordCategory::classify);
	let followers = last.map(common_followers).unwrap_or_default();

	let weights = model
		.unigrams()
		.filter(|(token, _)| !is_sentinel(token))
		.map(|(token, count)| {
			let boost = if followers.contains(token) { FOLLOWER_BOOST } else { 1.0 };
			(token, count as f64 * boost)
		})
		.collect();

	RawDistribution { source: Backoff::Unigram { boosted }, weights }
}
