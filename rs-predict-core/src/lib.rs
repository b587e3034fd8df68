//! Word-level n-gram next-token prediction library.
//!
//! This crate provides a small statistical language model including:
//! - A tokenizer preserving contractions and standalone punctuation
//! - Unigram / bigram / trigram count tables built from a fixed corpus
//! - Hierarchical backoff prediction with a word-category heuristic
//! - Temperature-scaled top-k probability formatting
//! - A stateful "predict, append, repeat" generation session
//!
//! The model is built once and is read-only afterwards. Randomness is
//! injected through [`model::random::RandomSource`] so callers decide
//! which generator drives sampling.

/// Core n-gram model, prediction and generation logic.
pub mod model;

/// Error type for the fallible surfaces (corpus files, model merging).
pub mod error;

/// I/O utilities (corpus file loading).
///
/// Not exposed
pub(crate) mod io;
