use super::formatter::Prediction;
use super::random::RandomSource;
use super::tokenizer::END_TOKEN;

/// Picks one entry of `predictions` with probability proportional to its
/// listed probability.
///
/// Draws `u` in `[0, 1)`, walks the list in order accumulating probability
/// and returns the first entry whose cumulative mass reaches `u`. When
/// rounding leaves `u` above the final sum, the first entry is returned.
///
/// Returns `None` for an empty list without drawing.
pub fn sample_next<'p, R: RandomSource + ?Sized>(
	predictions: &'p [Prediction],
	random: &mut R,
) -> Option<&'p Prediction> {
	let first = predictions.first()?;
	let draw = random.next_uniform();

	let mut cumulative = 0.0;
	for prediction in predictions {
		cumulative += prediction.probability;
		if draw <= cumulative {
			return Some(prediction);
		}
	}
	Some(first)
}

/// Appends `token` to `prompt`, space-separated.
pub fn append_token(prompt: &mut String, token: &str) {
	if !prompt.is_empty() {
		prompt.push(' ');
	}
	prompt.push_str(token);
}

/// Samples the next token from `predictions` and appends it to `prompt`.
///
/// Returns the sampled token and whether it is the end-of-sequence
/// sentinel. The sentinel is appended like any other token. `None` (and an
/// untouched prompt) for an empty prediction list.
pub fn sample_and_append<R: RandomSource + ?Sized>(
	prompt: &mut String,
	predictions: &[Prediction],
	random: &mut R,
) -> Option<(String, bool)> {
	let token = sample_next(predictions, random)?.token.clone();
	append_token(prompt, &token);
	let end_of_sequence = token == END_TOKEN;
	Some((token, end_of_sequence))
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Replays fixed uniform draws.
	struct Draws(Vec<f64>);

	impl RandomSource for Draws {
		fn next_uniform(&mut self) -> f64 {
			self.0.remove(0)
		}

		fn pick_index(&mut self, _len: usize) -> usize {
			0
		}
	}

	fn predictions() -> Vec<Prediction> {
		vec![
			Prediction { token: "a".to_owned(), probability: 0.5 },
			Prediction { token: "b".to_owned(), probability: 0.3 },
			Prediction { token: END_TOKEN.to_owned(), probability: 0.2 },
		]
	}

	#[test]
	fn cumulative_mass_selects_entry() {
		let predictions = predictions();
		let mut draws = Draws(vec![0.0, 0.5, 0.51, 0.79, 0.81, 0.99]);
		let picked: Vec<&str> = (0..6)
			.map(|_| sample_next(&predictions, &mut draws).unwrap().token.as_str())
			.collect();
		assert_eq!(picked, vec!["a", "a", "b", "b", END_TOKEN, END_TOKEN]);
	}

	#[test]
	fn overflowing_draw_falls_back_to_first() {
		let predictions = vec![Prediction { token: "a".to_owned(), probability: 0.4 }];
		let mut draws = Draws(vec![0.9]);
		assert_eq!(sample_next(&predictions, &mut draws).unwrap().token, "a");
	}

	#[test]
	fn empty_list_samples_nothing() {
		let mut draws = Draws(vec![]);
		let mut prompt = "the cat".to_owned();
		assert!(sample_and_append(&mut prompt, &[], &mut draws).is_none());
		assert_eq!(prompt, "the cat");
	}

	#[test]
	fn appends_with_space_and_flags_end_of_sequence() {
		let predictions = predictions();
		let mut draws = Draws(vec![0.1, 0.95]);
		let mut prompt = String::new();

		assert_eq!(
			sample_and_append(&mut prompt, &predictions, &mut draws),
			Some(("a".to_owned(), false))
		);
		assert_eq!(prompt, "a");
		assert_eq!(
			sample_and_append(&mut prompt, &predictions, &mut draws),
			Some((END_TOKEN.to_owned(), true))
		);
		assert_eq!(prompt, "a </s>");
	}
}
