use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rs_predict_core::model::formatter::{Prediction, MAX_TOP_K};
use rs_predict_core::model::ngram_model::{build_model, context_key, NGramModel};
use rs_predict_core::model::predictor::{backoff, Backoff};
use rs_predict_core::model::sampler::{sample_and_append, sample_next};
use rs_predict_core::model::tokenizer::{is_sentinel, tokenize, END_TOKEN};

static MODEL: LazyLock<NGramModel> = LazyLock::new(build_model);

fn assert_well_formed(predictions: &[Prediction], top_k: usize) {
	assert!(predictions.len() <= top_k.clamp(1, MAX_TOP_K));
	for pair in predictions.windows(2) {
		assert!(pair[0].probability >= pair[1].probability);
	}
	if !predictions.is_empty() {
		let sum: f64 = predictions.iter().map(|p| p.probability).sum();
		assert!((sum - 1.0).abs() < 1e-9, "sum = {sum}");
	}
}

#[test]
fn building_twice_gives_identical_tables() {
	let first = build_model();
	let second = build_model();
	assert_eq!(first, second);
	assert_eq!(first.summary(), second.summary());
	assert_eq!(first.vocabulary(), second.vocabulary());
}

#[test]
fn predict_is_deterministic() {
	let first = MODEL.predict("i like", 1.0, 5);
	let second = MODEL.predict("i like", 1.0, 5);
	assert_eq!(first, second);
	assert_eq!(first.len(), 5);
}

#[test]
fn empty_prompt_draws_from_non_sentinel_vocabulary() {
	for (temperature, top_k) in [(0.1, 1), (1.0, 5), (2.0, 10)] {
		let predictions = MODEL.predict("", temperature, top_k);
		assert_eq!(predictions.len(), top_k);
		for prediction in &predictions {
			assert!(!is_sentinel(&prediction.token));
			assert!(MODEL.vocabulary().contains(&prediction.token));
		}
	}
}

#[test]
fn trigram_support_is_exactly_its_successor_set() {
	let tokens = tokenize("i like");
	let raw = backoff(&MODEL, &tokens);
	assert_eq!(raw.source, Backoff::Trigram { context: "i|like".to_owned() });

	let state = MODEL.trigram("i", "like").unwrap();
	assert!(state.total() >= 2);
	let support: HashSet<&str> = raw.weights.iter().map(|(token, _)| *token).collect();
	let successors: HashSet<&str> = state.distribution().into_iter().map(|(token, _)| token).collect();
	assert_eq!(support, successors);

	let predictions = MODEL.predict("i like", 1.0, MAX_TOP_K);
	assert!(predictions.iter().all(|p| successors.contains(p.token.as_str())));
}

#[test]
fn appending_moves_the_trigram_context() {
	let mut prompt = "the cat".to_owned();
	let tokens = tokenize(&prompt);
	assert_eq!(context_key(&tokens[0], &tokens[1]), "the|cat");

	prompt.push_str(" sat");
	let tokens = tokenize(&prompt);
	let [.., prev2, prev1] = tokens.as_slice() else {
		panic!("expected at least two tokens");
	};
	assert_eq!(context_key(prev2, prev1), "cat|sat");

	// "cat sat" was only seen once, so the lookup backs off to "sat"
	assert_eq!(MODEL.trigram("cat", "sat").unwrap().total(), 1);
	let raw = backoff(&MODEL, &tokens);
	assert_eq!(raw.source, Backoff::Bigram { context: "sat".to_owned() });
	assert_eq!(MODEL.trigram("the", "cat").unwrap().occurrence("sat"), 1);
}

#[test]
fn pathological_prompts_do_not_panic() {
	for prompt in ["", "x", ".", "?!;:", "   ", "</s>", "ÉÀÜ", "zzzz qqqq"] {
		let predictions = MODEL.predict(prompt, 1.0, 5);
		assert_well_formed(&predictions, 5);
		assert!(!predictions.is_empty(), "{prompt:?}");
	}
}

#[test]
fn out_of_vocabulary_prompt_uses_unigram_fallback() {
	let raw = backoff(&MODEL, &tokenize("supercalifragilistic"));
	assert_eq!(raw.source, Backoff::Unigram { boosted: None });
}

#[test]
fn empirical_frequencies_follow_probabilities() {
	let predictions = vec![
		Prediction { token: "a".to_owned(), probability: 0.5 },
		Prediction { token: "b".to_owned(), probability: 0.3 },
		Prediction { token: END_TOKEN.to_owned(), probability: 0.2 },
	];
	let mut random = StdRng::seed_from_u64(42);
	let draws = 20_000;

	let mut counts: HashMap<String, usize> = HashMap::new();
	for _ in 0..draws {
		let picked = sample_next(&predictions, &mut random).unwrap();
		*counts.entry(picked.token.clone()).or_default() += 1;
	}

	for prediction in &predictions {
		let observed = counts[&prediction.token] as f64 / draws as f64;
		let p = prediction.probability;
		// five standard errors
		let tolerance = 5.0 * (p * (1.0 - p) / draws as f64).sqrt();
		assert!((observed - p).abs() < tolerance, "{}: {observed} vs {p}", prediction.token);
	}
}

#[test]
fn sample_and_append_reports_end_of_sequence() {
	let predictions = vec![Prediction { token: END_TOKEN.to_owned(), probability: 1.0 }];
	let mut random = StdRng::seed_from_u64(1);
	let mut prompt = "the cat".to_owned();

	let (token, end_of_sequence) = sample_and_append(&mut prompt, &predictions, &mut random).unwrap();
	assert_eq!(token, END_TOKEN);
	assert!(end_of_sequence);
	assert_eq!(prompt, "the cat </s>");
}

proptest! {
	#[test]
	fn predictions_are_bounded_sorted_and_normalized(
		prompt in "[a-z ,.!?']{0,40}",
		temperature in -1.0f64..5.0,
		top_k in 0usize..20,
	) {
		let predictions = MODEL.predict(&prompt, temperature, top_k);
		assert_well_formed(&predictions, top_k);
		prop_assert!(!predictions.is_empty());
	}

	#[test]
	fn corpus_words_keep_predictions_in_vocabulary(
		words in proptest::collection::vec(
			proptest::sample::select(vec!["i", "like", "the", "cat", "my", "is", "pizza", "that", "of"]),
			0..6,
		),
	) {
		let prompt = words.join(" ");
		for prediction in MODEL.predict(&prompt, 1.0, 10) {
			prop_assert!(MODEL.vocabulary().contains(&prediction.token));
		}
	}
}
