//! Top-level module for the next-token prediction engine.
//!
//! Data flows leaf-first:
//! - Text is split by the tokenizer (`tokenizer`)
//! - The fixed corpus is counted into unigram / bigram / trigram tables (`ngram_model`)
//! - A prompt is answered by the most specific table with enough data (`predictor`)
//! - Raw weights become a top-k probability list (`formatter`)
//! - A session samples from that list, appends and repeats (`session`)

/// Tokenizer shared by corpus ingestion and prediction.
pub mod tokenizer;

/// Built-in training corpus and starter phrases.
pub mod corpus;

/// Insertion-ordered token counter.
///
/// Backing store for the unigram table and every successor row.
/// Not exposed publicly.
mod counts;

/// Internal representation of a single context (bigram predecessor or
/// trigram predecessor pair) and its successor counts.
pub mod state;

/// Unigram, bigram and trigram tables, built once and read-only afterwards.
///
/// Supports lazy construction, loading an extra corpus file,
/// parallel construction and merging.
pub mod ngram_model;

/// Part-of-speech-like word lists driving the unigram fallback boost.
pub mod categories;

/// Trigram -> bigram -> boosted unigram backoff.
pub mod predictor;

/// Temperature-scaled softmax over raw weights, truncated to top-k.
pub mod formatter;

/// Injected randomness (uniform draws and index picks).
pub mod random;

/// Weighted sampling from a formatted prediction list.
pub mod sampler;

/// Stateful "predict -> append -> repeat" controller.
pub mod session;
