//! Word-set tokenization and Jaccard similarity shared by ICI and drift.

use std::collections::HashSet;

/// Lower-case the text and split on whitespace into a set of words.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the word sets of `a` and `b`.
///
/// Two empty texts are identical (1.0); exactly one empty text shares
/// nothing (0.0).
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    match (tokens_a.is_empty(), tokens_b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}
