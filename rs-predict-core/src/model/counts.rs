use std::collections::HashMap;

/// Token counter remembering first-seen order.
///
/// Lookups go through `index`, iteration follows `entries`. Keeping the
/// insertion order makes every distribution derived from a table
/// deterministic across builds, which the formatter relies on to break
/// probability ties.
///
/// # Invariants
/// - `index[token]` is the position of `token` in `entries`
/// - Every count is strictly positive
/// - `total` is the sum of all counts
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct CountTable {
	entries: Vec<(String, usize)>,
	index: HashMap<String, usize>,
	total: usize,
}

impl CountTable {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Adds `occurrence` to the count of `token`, inserting it if unseen.
	pub(crate) fn add(&mut self, token: &str, occurrence: usize) {
		if occurrence == 0 {
			return;
		}
		match self.index.get(token) {
			Some(&position) => self.entries[position].1 += occurrence,
			None => {
				self.index.insert(token.to_owned(), self.entries.len());
				self.entries.push((token.to_owned(), occurrence));
			}
		}
		self.total += occurrence;
	}

	/// Count of `token`, zero when unseen.
	pub(crate) fn get(&self, token: &str) -> usize {
		self.index.get(token).map_or(0, |&position| self.entries[position].1)
	}

	pub(crate) fn total(&self) -> usize {
		self.total
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}

	/// Iterates over `(token, count)` in first-seen order.
	pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
		self.entries.iter().map(|(token, count)| (token.as_str(), *count))
	}

	/// Sums the counts of `other` into this table.
	///
	/// Tokens unseen here are appended in `other`'s order.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (token, count) in other.iter() {
			self.add(token, count);
		}
	}
}
