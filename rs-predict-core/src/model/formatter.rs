use serde::{Deserialize, Serialize};

/// Lowest temperature used; smaller (or NaN) values are raised to it.
pub const MIN_TEMPERATURE: f64 = 0.05;

/// Largest top-k accepted; the smallest is 1.
pub const MAX_TOP_K: usize = 10;

/// One candidate next token and its displayed probability.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Prediction {
	pub token: String,
	pub probability: f64,
}

/// Clamps a requested temperature to the floor.
pub fn clamp_temperature(temperature: f64) -> f64 {
	// f64::max ignores NaN operands
	temperature.max(MIN_TEMPERATURE)
}

/// Clamps a requested top-k to `[1, 10]`.
pub fn clamp_top_k(top_k: usize) -> usize {
	top_k.clamp(1, MAX_TOP_K)
}

/// Numerically stable softmax: subtracts the max logit before exponentiating.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
	let max_logit = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
	let exps: Vec<f64> = logits.iter().map(|logit| (logit - max_logit).exp()).collect();
	let sum: f64 = exps.iter().sum();
	exps.into_iter().map(|e| e / sum).collect()
}

/// Turns raw weights into a ranked, truncated probability list.
///
/// # Behavior
/// - Drops entries whose weight is not strictly positive; none left → empty list
/// - Logit per entry is `ln(1 + weight) / temperature`
/// - Softmax over the kept entries, sorted by descending probability
///   (stable: ties keep input order)
/// - Truncated to `top_k`, then renormalized so the returned list sums to 1
///
/// # Notes
/// The renormalization hides the probability mass outside the top-k. The
/// displayed values are therefore relative to the shown candidates only.
pub fn format_predictions(weights: &[(&str, f64)], temperature: f64, top_k: usize) -> Vec<Prediction> {
	let temperature = clamp_temperature(temperature);
	let top_k = clamp_top_k(top_k);

	let entries: Vec<(&str, f64)> = weights
		.iter()
		.copied()
		.filter(|(_, weight)| *weight > 0.0)
		.collect();
	if entries.is_empty() {
		return Vec::new();
	}

	let logits: Vec<f64> = entries
		.iter()
		.map(|(_, weight)| weight.ln_1p() / temperature)
		.collect();
	let probabilities = softmax(&logits);

	let mut scored: Vec<Prediction> = entries
		.iter()
		.zip(probabilities)
		.map(|((token, _), probability)| Prediction { token: (*token).to_owned(), probability })
		.collect();
	scored.sort_by(|a, b| b.probability.total_cmp(&a.probability));
	scored.truncate(top_k);

	let kept: f64 = scored.iter().map(|prediction| prediction.probability).sum();
	if kept > 0.0 {
		for prediction in &mut scored {
			prediction.probability /= kept;
		}
	}
	scored
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sum(predictions: &[Prediction]) -> f64 {
		predictions.iter().map(|p| p.probability).sum()
	}

	#[test]
	fn clamps_inputs() {
		assert_eq!(clamp_temperature(0.0), MIN_TEMPERATURE);
		assert_eq!(clamp_temperature(-3.0), MIN_TEMPERATURE);
		assert_eq!(clamp_temperature(f64::NAN), MIN_TEMPERATURE);
		assert_eq!(clamp_temperature(1.5), 1.5);
		assert_eq!(clamp_top_k(0), 1);
		assert_eq!(clamp_top_k(42), MAX_TOP_K);
		assert_eq!(clamp_top_k(4), 4);
	}

	#[test]
	fn softmax_is_stable_for_large_logits() {
		let probabilities = softmax(&[1000.0, 1000.0]);
		assert_eq!(probabilities, vec![0.5, 0.5]);
	}

	#[test]
	fn non_positive_weights_yield_nothing() {
		assert!(format_predictions(&[("a", 0.0), ("b", -1.0)], 1.0, 5).is_empty());
		assert!(format_predictions(&[], 1.0, 5).is_empty());
	}

	#[test]
	fn ranks_by_weight_and_truncates() {
		let weights = [("low", 1.0), ("high", 9.0), ("mid", 3.0), ("zero", 0.0)];
		let predictions = format_predictions(&weights, 1.0, 2);

		let tokens: Vec<&str> = predictions.iter().map(|p| p.token.as_str()).collect();
		assert_eq!(tokens, vec!["high", "mid"]);
		assert!((sum(&predictions) - 1.0).abs() < 1e-9);
	}

	#[test]
	fn matches_log_smoothed_softmax() {
		let predictions = format_predictions(&[("a", 1.0), ("b", 3.0)], 1.0, 10);
		// exp(ln 4) / (exp(ln 2) + exp(ln 4)) = 4 / 6
		assert_eq!(predictions[0].token, "b");
		assert!((predictions[0].probability - 4.0 / 6.0).abs() < 1e-12);
		assert!((predictions[1].probability - 2.0 / 6.0).abs() < 1e-12);
	}

	#[test]
	fn ties_keep_input_order() {
		let weights = [("x", 2.0), ("y", 5.0), ("z", 2.0), ("w", 2.0)];
		let predictions = format_predictions(&weights, 1.0, 10);
		let tokens: Vec<&str> = predictions.iter().map(|p| p.token.as_str()).collect();
		assert_eq!(tokens, vec!["y", "x", "z", "w"]);
	}

	#[test]
	fn low_temperature_sharpens() {
		let weights = [("a", 1.0), ("b", 3.0)];
		let sharp = format_predictions(&weights, 0.0, 10);
		let flat = format_predictions(&weights, 5.0, 10);
		assert!(sharp[0].probability > flat[0].probability);
		assert!(sharp[0].probability > 0.99);
	}
}
