//! Canonical form for free-text answers.

const STRIPPED_PUNCTUATION: &[char] = &['.', ',', '!', '?', '\'', '"'];

const ARTICLES: &[&str] = &["a", "an", "the"];

const DIGIT_WORDS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
];

/// Canonicalize an answer for comparison.
///
/// Lower-cases, drops `. , ! ? ' "`, removes the articles "a", "an" and "the",
/// turns spelled-out digits into numerals and collapses whitespace. Total and
/// idempotent: `normalize(&normalize(s)) == normalize(s)` for every `s`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .trim()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    stripped
        .split_whitespace()
        .filter(|word| !ARTICLES.contains(word))
        .map(digit_for_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn digit_for_word(word: &str) -> &str {
    DIGIT_WORDS
        .iter()
        .find(|(spelled, _)| *spelled == word)
        .map(|(_, digit)| *digit)
        .unwrap_or(word)
}
