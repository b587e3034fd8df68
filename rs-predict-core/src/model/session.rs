use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::Serialize;

use super::corpus::STARTERS;
use super::formatter::Prediction;
use super::ngram_model::NGramModel;
use super::random::RandomSource;
use super::sampler::{append_token, sample_next};
use super::tokenizer::END_TOKEN;

/// Where the session stands between two actions.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	Idle,
	ManualPredicting,
	AutoGenerating,
}

/// Generation knobs.
///
/// Defaults follow the interactive demo: temperature 1.0, top-5, a step
/// every 800 ms, a 500 ms pause before reseeding, 20 prompt tokens at most.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
	pub temperature: f64,
	pub top_k: usize,
	/// Delay before the next auto-generation step.
	pub step_delay: Duration,
	/// Extra pause after an end-of-sequence restart.
	pub restart_delay: Duration,
	/// Auto-generation stops once the prompt holds this many
	/// whitespace-separated tokens.
	pub max_prompt_tokens: usize,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			temperature: 1.0,
			top_k: 5,
			step_delay: Duration::from_millis(800),
			restart_delay: Duration::from_millis(500),
			max_prompt_tokens: 20,
		}
	}
}

/// What an `append` or `tick` did.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StepEvent {
	/// No usable prediction; nothing changed.
	Disabled,
	/// Deferred step fired after auto-generation was cancelled.
	Skipped,
	/// Auto-generation started from an empty prompt with this starter.
	Started { starter: String },
	/// A sampled token was appended to the prompt.
	Appended { token: String, end_of_sequence: bool },
	/// Enough consecutive end-of-sequence tokens: prompt replaced by a starter.
	Restarted { starter: String },
}

/// Outcome of one session step.
///
/// `next_in` is the delay after which the caller should call
/// [`GenerationSession::tick`]; `None` means nothing is scheduled.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Step {
	#[serde(flatten)]
	pub event: StepEvent,
	#[serde(rename = "next_in_ms", serialize_with = "serialize_delay")]
	pub next_in: Option<Duration>,
}

fn serialize_delay<S: serde::Serializer>(delay: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
	match delay {
		Some(delay) => serializer.serialize_some(&delay_millis(*delay)),
		None => serializer.serialize_none(),
	}
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn delay_millis(delay: Duration) -> u64 {
	u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

impl Step {
	fn done(event: StepEvent) -> Self {
		Self { event, next_in: None }
	}
}

/// Serializable view of a session.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
	pub state: SessionState,
	pub prompt: String,
	pub predictions: Vec<Prediction>,
	pub eos_count: usize,
	pub auto_generating: bool,
	pub can_append: bool,
}

/// Stateful "predict → append → repeat" controller.
///
/// The session never sleeps. Steps that continue auto-generation return
/// a delay, and the caller invokes [`tick`](Self::tick) once it elapses.
/// Cancelling (manual predict, prompt edit, clear) only clears the
/// auto-generation flag; a tick arriving afterwards finds the flag cleared
/// and does nothing.
///
/// # Responsibilities
/// - Own the prompt and the latest prediction list
/// - Sample, append and re-predict on each step
/// - Count consecutive end-of-sequence tokens and reseed after 2 or 3
///
/// # Invariants
/// - `predictions` is the prediction for `prompt` unless `stale`
/// - `eos_threshold` is `Some` only while `eos_count > 0`
/// - `state == AutoGenerating` iff `auto_generating`
pub struct GenerationSession<R: RandomSource> {
	model: Arc<NGramModel>,
	random: R,
	config: SessionConfig,
	prompt: String,
	predictions: Vec<Prediction>,
	/// Prompt edited since `predictions` was computed.
	stale: bool,
	append_enabled: bool,
	eos_count: usize,
	eos_threshold: Option<usize>,
	auto_generating: bool,
	state: SessionState,
}

impl<R: RandomSource> GenerationSession<R> {
	pub fn new(model: Arc<NGramModel>, random: R, config: SessionConfig) -> Self {
		Self {
			model,
			random,
			config,
			prompt: String::new(),
			predictions: Vec::new(),
			stale: false,
			append_enabled: false,
			eos_count: 0,
			eos_threshold: None,
			auto_generating: false,
			state: SessionState::Idle,
		}
	}

	pub fn prompt(&self) -> &str {
		&self.prompt
	}

	pub fn predictions(&self) -> &[Prediction] {
		&self.predictions
	}

	/// Most likely next token of the latest prediction.
	pub fn top_prediction(&self) -> Option<&Prediction> {
		self.predictions.first()
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	pub fn eos_count(&self) -> usize {
		self.eos_count
	}

	pub fn is_auto_generating(&self) -> bool {
		self.auto_generating
	}

	/// `false` after an empty prediction or a clear, until the prompt
	/// changes or a non-empty prediction is produced.
	pub fn can_append(&self) -> bool {
		self.append_enabled
	}

	/// Whitespace-separated tokens in the visible prompt.
	pub fn prompt_token_count(&self) -> usize {
		self.prompt.split_whitespace().count()
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			state: self.state,
			prompt: self.prompt.clone(),
			predictions: self.predictions.clone(),
			eos_count: self.eos_count,
			auto_generating: self.auto_generating,
			can_append: self.append_enabled,
		}
	}

	/// Replaces the prompt as a user edit would.
	///
	/// Cancels auto-generation. Appending is enabled for a non-empty
	/// prompt, or for an empty one when a prediction is already on hand.
	pub fn set_prompt(&mut self, text: &str) {
		self.cancel(SessionState::Idle);
		self.prompt = text.to_owned();
		self.stale = true;
		self.append_enabled = !self.prompt.trim().is_empty() || !self.predictions.is_empty();
	}

	/// Manual prediction over the current prompt.
	///
	/// Always cancels auto-generation first.
	pub fn predict(&mut self) -> &[Prediction] {
		self.cancel(SessionState::ManualPredicting);
		self.refresh();
		&self.predictions
	}

	/// Stops auto-generation, empties the prompt and disables appending
	/// until the next prediction.
	pub fn clear(&mut self) {
		self.cancel(SessionState::Idle);
		self.prompt.clear();
		self.predictions.clear();
		self.stale = false;
		self.append_enabled = false;
	}

	/// The "append" action.
	///
	/// - Disabled without a usable prediction
	/// - On an empty prompt, starts auto-generation from a random starter
	/// - Otherwise samples one token and appends it
	pub fn append(&mut self) -> Step {
		if !self.append_enabled {
			return Step::done(StepEvent::Disabled);
		}

		if self.prompt.trim().is_empty() {
			self.auto_generating = true;
			self.state = SessionState::AutoGenerating;
			self.reset_eos();
			let starter = self.reseed();
			debug!("Auto-generation started with {:?}", starter);
			let next_in = self.continue_after(self.config.step_delay);
			return Step { event: StepEvent::Started { starter }, next_in };
		}

		self.advance()
	}

	/// Deferred continuation of auto-generation.
	///
	/// No-op unless auto-generation is still active.
	pub fn tick(&mut self) -> Step {
		if !self.auto_generating {
			debug!("Stale tick ignored");
			return Step::done(StepEvent::Skipped);
		}
		if !self.append_enabled {
			self.cancel(SessionState::Idle);
			return Step::done(StepEvent::Disabled);
		}
		self.advance()
	}

	/// Samples from the latest prediction and applies the result.
	fn advance(&mut self) -> Step {
		if self.stale {
			self.refresh();
		}
		let Some(token) = sample_next(&self.predictions, &mut self.random).map(|p| p.token.clone()) else {
			self.append_enabled = false;
			if self.auto_generating {
				self.cancel(SessionState::Idle);
			}
			return Step::done(StepEvent::Disabled);
		};

		if token == END_TOKEN {
			return self.on_end_of_sequence();
		}

		self.reset_eos();
		append_token(&mut self.prompt, &token);
		self.refresh();

		let next_in = if self.prompt_token_count() < self.config.max_prompt_tokens {
			self.continue_after(self.config.step_delay)
		} else {
			if self.auto_generating {
				debug!("Prompt reached {} tokens, auto-generation stops", self.config.max_prompt_tokens);
				self.cancel(SessionState::Idle);
			}
			None
		};
		Step { event: StepEvent::Appended { token, end_of_sequence: false }, next_in }
	}

	fn on_end_of_sequence(&mut self) -> Step {
		self.eos_count += 1;
		let threshold = match self.eos_threshold {
			Some(threshold) => threshold,
			None => {
				let threshold = 2 + self.random.pick_index(2);
				self.eos_threshold = Some(threshold);
				threshold
			}
		};

		if self.eos_count >= threshold {
			self.reset_eos();
			self.auto_generating = true;
			self.state = SessionState::AutoGenerating;
			let starter = self.reseed();
			debug!("{} end-of-sequence tokens, restarting with {:?}", threshold, starter);
			let next_in = self.continue_after(self.config.restart_delay + self.config.step_delay);
			return Step { event: StepEvent::Restarted { starter }, next_in };
		}

		append_token(&mut self.prompt, END_TOKEN);
		self.refresh();
		let next_in = self.continue_after(self.config.step_delay);
		Step {
			event: StepEvent::Appended { token: END_TOKEN.to_owned(), end_of_sequence: true },
			next_in,
		}
	}

	/// `Some(delay)` when a follow-up step makes sense. An empty prediction
	/// ends auto-generation.
	fn continue_after(&mut self, delay: Duration) -> Option<Duration> {
		if !self.auto_generating {
			return None;
		}
		if !self.append_enabled {
			debug!("Empty prediction, auto-generation stops");
			self.cancel(SessionState::Idle);
			return None;
		}
		Some(delay)
	}

	/// Replaces the prompt with a random starter and predicts for it.
	fn reseed(&mut self) -> String {
		let starter = STARTERS[self.random.pick_index(STARTERS.len())].to_owned();
		self.prompt = starter.clone();
		self.refresh();
		starter
	}

	fn refresh(&mut self) {
		self.predictions = self.model.predict(&self.prompt, self.config.temperature, self.config.top_k);
		self.stale = false;
		self.append_enabled = !self.predictions.is_empty();
	}

	fn cancel(&mut self, state: SessionState) {
		self.auto_generating = false;
		self.reset_eos();
		self.state = state;
	}

	fn reset_eos(&mut self) {
		self.eos_count = 0;
		self.eos_threshold = None;
	}
}
