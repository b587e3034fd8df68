use rand::Rng;

/// Source of randomness for sampling and starter selection.
///
/// Every `rand` generator implements it, so callers pass
/// `rand::rngs::StdRng::seed_from_u64(..)` for reproducible runs or
/// [`ThreadRandom`] for the thread-local generator.
pub trait RandomSource {
	/// Uniform draw in `[0, 1)`.
	fn next_uniform(&mut self) -> f64;

	/// Uniform index in `[0, len)`. `len` must be non-zero.
	fn pick_index(&mut self, len: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
	fn next_uniform(&mut self) -> f64 {
		self.random::<f64>()
	}

	fn pick_index(&mut self, len: usize) -> usize {
		self.random_range(0..len)
	}
}

/// Delegates to `rand::rng()` on every call.
///
/// Unlike `ThreadRng` itself this is `Send`, so it can live inside state
/// shared between threads (a server session behind a mutex).
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
	fn next_uniform(&mut self) -> f64 {
		rand::rng().random::<f64>()
	}

	fn pick_index(&mut self, len: usize) -> usize {
		rand::rng().random_range(0..len)
	}
}
