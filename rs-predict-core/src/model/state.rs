use super::counts::CountTable;
use crate::error::ModelError;

/// Represents a context in the bigram or trigram table.
///
/// A `State` corresponds to a fixed context (`key`): a single predecessor
/// token for bigrams, or a `prev2|prev1` pair for trigrams. It stores every
/// observed successor token and how many times it followed the context.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate successor occurrences during corpus ingestion
/// - Expose the successor distribution (counts as weights) for prediction
/// - Merge with another state having the same key (parallel building)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
/// - `total()` equals the number of times the context was followed by any token
#[derive(Clone, Debug, PartialEq)]
pub struct State {
	/// Identifier of the state (predecessor token or joined predecessor pair).
	key: String,
	/// Outgoing transitions in first-seen order.
	/// Example: { "sat" => 1, "chased" => 1, "is" => 2 }
	transitions: CountTable,
}

impl State {
	/// Creates a new empty state for the given context.
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			transitions: CountTable::new(),
		}
	}

	/// Context identifier.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Records one occurrence of `next_token` following this context.
	pub fn add_transition(&mut self, next_token: &str) {
		self.transitions.add(next_token, 1);
	}

	/// How many times `next_token` followed this context.
	pub fn occurrence(&self, next_token: &str) -> usize {
		self.transitions.get(next_token)
	}

	/// Sum of all successor counts.
	pub fn total(&self) -> usize {
		self.transitions.total()
	}

	/// Number of distinct successors.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.len() == 0
	}

	/// Successor distribution with raw counts as weights, in first-seen order.
	pub fn distribution(&self) -> Vec<(&str, f64)> {
		self.transitions
			.iter()
			.map(|(token, occurrence)| (token, occurrence as f64))
			.collect()
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same context (`key`).
	/// Transition occurrence counts are summed.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.key != other.key {
			return Err(ModelError::KeyMismatch {
				expected: self.key.clone(),
				found: other.key.clone(),
			});
		}
		self.transitions.merge(&other.transitions);
		Ok(())
	}
}
