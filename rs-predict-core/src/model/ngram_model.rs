use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::thread;

use log::{debug, info};
use serde::Serialize;

use super::corpus;
use super::counts::CountTable;
use super::formatter::{format_predictions, Prediction};
use super::predictor::backoff;
use super::state::State;
use super::tokenizer::{tokenize, END_TOKEN, START_TOKEN};
use crate::error::ModelError;
use crate::io::read_corpus_file;

/// Joins the two tokens of a trigram context.
///
/// Tokens are runs of word characters, single punctuation marks or
/// sentinels, so none of them can contain the separator.
pub const CONTEXT_SEPARATOR: char = '|';

/// Builds the trigram context key for `(prev2, prev1)`, order-sensitive.
///
/// Example: `("the", "cat")` → `"the|cat"`
pub fn context_key(prev2: &str, prev1: &str) -> String {
	let mut key = String::with_capacity(prev2.len() + prev1.len() + 1);
	key.push_str(prev2);
	key.push(CONTEXT_SEPARATOR);
	key.push_str(prev1);
	key
}

/// Word-level unigram / bigram / trigram frequency model.
///
/// # Responsibilities
/// - Ingest sentences wrapped in start/end sentinels
/// - Count unigrams, predecessor → successor pairs and predecessor-pair → successor triples
/// - Answer `predict` requests through backoff and formatting
/// - Merge with another model (parallel construction)
///
/// # Invariants
/// - Sum of unigram counts equals `total_tokens()`
/// - For every bigram state, `total()` equals the number of times its key
///   was immediately followed by a token
/// - Same for trigram states, scoped to the predecessor pair
/// - Never mutated once construction returns
#[derive(Clone, Debug, PartialEq)]
pub struct NGramModel {
	/// Token → occurrences, sentinels included, in first-seen order.
	unigram: CountTable,
	/// Predecessor token → successor counts.
	bigram: HashMap<String, State>,
	/// `prev2|prev1` → successor counts.
	trigram: HashMap<String, State>,
	/// Every distinct token seen, sentinels included.
	vocabulary: HashSet<String>,
	/// Number of sentences ingested.
	sentences: usize,
}

/// Size figures of a built model.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ModelSummary {
	pub sentences: usize,
	pub vocabulary: usize,
	pub total_tokens: usize,
	pub bigram_contexts: usize,
	pub trigram_contexts: usize,
}

/// Builds the model from the built-in corpus.
///
/// Deterministic: every call produces identical tables.
pub fn build_model() -> NGramModel {
	let model = NGramModel::from_sentences(corpus::sentences());
	let summary = model.summary();
	info!(
		"Built n-gram model: {} sentences, {} tokens, {} vocabulary entries",
		summary.sentences, summary.total_tokens, summary.vocabulary
	);
	model
}

impl NGramModel {
	/// Returns an empty model.
	///
	/// Useful for creating a blank model that can then be filled or merged.
	pub fn empty() -> Self {
		Self {
			unigram: CountTable::new(),
			bigram: HashMap::new(),
			trigram: HashMap::new(),
			vocabulary: HashSet::new(),
			sentences: 0,
		}
	}

	/// Builds a model by ingesting `sentences` sequentially.
	pub fn from_sentences<I, S>(sentences: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut model = Self::empty();
		for sentence in sentences {
			model.add_sentence(sentence.as_ref());
		}
		model
	}

	/// Builds a model from the built-in corpus plus the sentences of a file.
	///
	/// - Blank lines and `#` comment lines of the file are skipped
	/// - The file's sentences are counted in parallel and merged after the
	///   built-in corpus
	///
	/// # Errors
	/// - Returns an error if the file cannot be read
	/// - Returns an error if the file has no sentence
	pub fn from_file<P: AsRef<Path>>(filepath: P) -> Result<Self, ModelError> {
		let lines = read_corpus_file(&filepath)?;
		if lines.is_empty() {
			return Err(ModelError::EmptyCorpus(filepath.as_ref().display().to_string()));
		}
		debug!("Read {} sentences from {}", lines.len(), filepath.as_ref().display());

		let mut model = build_model();
		let extra = Self::from_lines_parallel(&lines)?;
		model.merge(&extra)?;
		Ok(model)
	}

	/// Splits `lines` into chunks, counts each chunk on its own thread and
	/// merges the partial models in chunk order.
	///
	/// # Notes
	/// - Chunk count is CPU cores * 8, as for large files most chunks stay small
	/// - Merging in chunk order keeps first-seen token order identical to a
	///   sequential build
	///
	/// # Errors
	/// Returns an error if a worker thread died before sending its model.
	pub fn from_lines_parallel(lines: &[String]) -> Result<Self, ModelError> {
		if lines.is_empty() {
			return Ok(Self::empty());
		}

		let chunks = num_cpus::get() * 8;
		let chunk_size = lines.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		for (index, chunk) in lines.chunks(chunk_size).enumerate() {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();

			thread::spawn(move || {
				let partial_model = Self::from_sentences(&chunk);
				// The receiver only disappears if the builder already gave up.
				let _ = tx.send((index, partial_model));
			});
			spawned += 1;
		}
		drop(tx);

		let mut partial_models: Vec<(usize, Self)> = rx.iter().collect();
		if partial_models.len() != spawned {
			return Err(ModelError::WorkerFailed {
				expected: spawned,
				received: partial_models.len(),
			});
		}
		partial_models.sort_by_key(|(index, _)| *index);

		let mut final_model = Self::empty();
		for (_, partial_model) in &partial_models {
			final_model.merge(partial_model)?;
		}
		Ok(final_model)
	}

	/// Adds a sentence to the model.
	///
	/// # Behavior
	/// - Tokenizes the sentence and wraps it with `<s>` / `</s>`
	/// - Every token increments its unigram count
	/// - Every token with a predecessor increments `prev → token`
	/// - Every token with two predecessors increments `prev2|prev1 → token`
	pub fn add_sentence(&mut self, sentence: &str) {
		let mut tokens = Vec::with_capacity(8);
		tokens.push(START_TOKEN.to_owned());
		tokens.extend(tokenize(sentence));
		tokens.push(END_TOKEN.to_owned());

		for (i, token) in tokens.iter().enumerate() {
			self.vocabulary.insert(token.clone());
			self.unigram.add(token, 1);

			if i > 0 {
				let prev = &tokens[i - 1];
				self.bigram
					.entry(prev.clone())
					.or_insert_with(|| State::new(prev))
					.add_transition(token);
			}

			if i > 1 {
				let key = context_key(&tokens[i - 2], &tokens[i - 1]);
				self.trigram
					.entry(key.clone())
					.or_insert_with(|| State::new(&key))
					.add_transition(token);
			}
		}
		self.sentences += 1;
	}

	/// Merges another model into this one.
	///
	/// # Notes
	/// - Occurrence counts for matching contexts and tokens are summed
	/// - Contexts unknown here are cloned from `other`
	///
	/// # Errors
	/// Returns an error if two states stored under the same key disagree on it.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		self.unigram.merge(&other.unigram);
		Self::merge_states(&mut self.bigram, &other.bigram)?;
		Self::merge_states(&mut self.trigram, &other.trigram)?;
		self.vocabulary.extend(other.vocabulary.iter().cloned());
		self.sentences += other.sentences;
		Ok(())
	}

	fn merge_states(
		states: &mut HashMap<String, State>,
		others: &HashMap<String, State>,
	) -> Result<(), ModelError> {
		for (key, state) in others {
			if let Some(existing) = states.get_mut(key) {
				existing.merge(state)?;
			} else {
				states.insert(key.clone(), state.clone());
			}
		}
		Ok(())
	}

	/// Predicts the next token for `prompt`.
	///
	/// Tokenizes the prompt, selects a distribution through backoff and
	/// returns the temperature-scaled top-k list. Deterministic for a given
	/// model and inputs. `temperature` and `top_k` are clamped, never rejected.
	pub fn predict(&self, prompt: &str, temperature: f64, top_k: usize) -> Vec<Prediction> {
		let tokens = tokenize(prompt);
		let raw = backoff(self, &tokens);
		debug!("Backoff for {:?} answered by {:?}", prompt, raw.source);
		format_predictions(&raw.weights, temperature, top_k)
	}

	/// Unigram count of `token`, zero when unseen.
	pub fn unigram_count(&self, token: &str) -> usize {
		self.unigram.get(token)
	}

	/// Iterates over `(token, count)` for every vocabulary entry, sentinels
	/// included, in first-seen order.
	pub fn unigrams(&self) -> impl Iterator<Item = (&str, usize)> {
		self.unigram.iter()
	}

	/// Total token occurrences processed, sentinels included.
	pub fn total_tokens(&self) -> usize {
		self.unigram.total()
	}

	pub fn vocabulary(&self) -> &HashSet<String> {
		&self.vocabulary
	}

	/// Successor counts of a single predecessor token.
	pub fn bigram(&self, prev: &str) -> Option<&State> {
		self.bigram.get(prev)
	}

	/// Successor counts of an ordered predecessor pair.
	pub fn trigram(&self, prev2: &str, prev1: &str) -> Option<&State> {
		self.trigram.get(&context_key(prev2, prev1))
	}

	/// Successor counts of a joined trigram context key.
	pub fn trigram_by_key(&self, key: &str) -> Option<&State> {
		self.trigram.get(key)
	}

	pub fn summary(&self) -> ModelSummary {
		ModelSummary {
			sentences: self.sentences,
			vocabulary: self.vocabulary.len(),
			total_tokens: self.unigram.total(),
			bigram_contexts: self.bigram.len(),
			trigram_contexts: self.trigram.len(),
		}
	}
}

/// Lazily built, shared model.
///
/// The first [`LazyModel::get`] builds the model from the built-in corpus;
/// later calls return the same instance. Owned by the caller, one per
/// process or test.
#[derive(Debug, Default)]
pub struct LazyModel {
	cell: OnceLock<Arc<NGramModel>>,
}

impl LazyModel {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the model, building it on first use.
	pub fn get(&self) -> Arc<NGramModel> {
		self.cell.get_or_init(|| Arc::new(build_model())).clone()
	}

	/// `true` once the model has been built.
	pub fn is_built(&self) -> bool {
		self.cell.get().is_some()
	}
}
