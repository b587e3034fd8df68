use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::io;

/// Reads a corpus file and returns its sentences.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
/// - Skips blank lines and `#` comment lines
pub(crate) fn read_corpus_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(corpus_lines(&contents).map(str::to_owned).collect())
}

/// Iterates over the sentences of an in-memory corpus.
///
/// Same filtering rules as [`read_corpus_file`].
pub(crate) fn corpus_lines(contents: &str) -> impl Iterator<Item = &str> {
	contents
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
}
