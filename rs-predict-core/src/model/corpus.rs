use crate::io::corpus_lines;

/// Built-in training corpus, one sentence per line.
///
/// Blank lines and `#` topic headers are skipped during ingestion.
pub const CORPUS: &str = include_str!("../../data/corpus.txt");

/// Phrases used to (re)seed an auto-generation session.
pub const STARTERS: [&str; 15] = [
	"i like",
	"i love",
	"i think",
	"the cat",
	"the dog",
	"my friend",
	"what is",
	"this is",
	"machine learning",
	"neural networks",
	"the sky",
	"pizza is",
	"music is",
	"today is",
	"i want",
];

/// Iterates over the sentences of the built-in corpus, in file order.
pub fn sentences() -> impl Iterator<Item = &'static str> {
	corpus_lines(CORPUS)
}
