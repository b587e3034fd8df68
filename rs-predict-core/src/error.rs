use std::io;

use thiserror::Error;

/// Errors raised while building or combining models.
///
/// Prediction and sampling never fail; only the operations touching the
/// filesystem or combining partial models can.
#[derive(Debug, Error)]
pub enum ModelError {
	#[error("failed to read corpus: {0}")]
	Io(#[from] io::Error),

	#[error("context key mismatch: {expected} != {found}")]
	KeyMismatch { expected: String, found: String },

	#[error("corpus file {0} contains no sentences")]
	EmptyCorpus(String),

	#[error("expected {expected} partial models, received {received}")]
	WorkerFailed { expected: usize, received: usize },
}
