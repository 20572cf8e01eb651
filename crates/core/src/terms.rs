//! Term extraction and the overlap score.
//!
//! Every corpus ranks with [`overlap_score`]: the fraction of unique query
//! terms that occur anywhere in the candidate text. There is no weighting,
//! stemming or position awareness.

use std::collections::HashSet;

/// Tokens this short carry no signal and are dropped.
const MAX_DROPPED_LEN: usize = 2;

/// Articles, prepositions and conjunctions long enough to survive the length
/// filter.
const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "nor", "yet", "with", "from", "into", "onto", "upon", "about",
    "above", "below", "over", "under", "after", "before", "between", "through", "during",
    "without", "within", "across", "against", "among", "toward", "towards", "than", "via", "per",
    "because", "while", "although", "unless", "until", "whether", "also", "either", "neither",
];

/// Lowercase `text` and split it into word tokens, dropping short tokens and
/// stop-words. Order is preserved and duplicates are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > MAX_DROPPED_LEN)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// The unique terms of `text`.
pub fn term_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Fraction of unique `query_terms` found in `tokenize(text)`, in `[0, 1]`.
///
/// Returns 0 when either side has no terms.
pub fn overlap_score<S: AsRef<str>>(query_terms: &[S], text: &str) -> f32 {
    let unique: HashSet<&str> = query_terms.iter().map(AsRef::as_ref).collect();
    if unique.is_empty() {
        return 0.0;
    }
    let target = term_set(text);
    if target.is_empty() {
        return 0.0;
    }
    let hits = unique.iter().filter(|term| target.contains(**term)).count();
    hits as f32 / unique.len() as f32
}
