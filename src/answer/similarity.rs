//! Typo-tolerant string similarity.

use std::collections::HashMap;

/// Sørensen-Dice coefficient over character bigrams, ignoring whitespace.
///
/// Returns a score in `[0, 1]`: 1 for identical strings, 0 when either side
/// has fewer than two characters (and they differ). Deterministic.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_default() += 1;
    }

    let mut shared = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    (2 * shared) as f64 / ((a.len() - 1) + (b.len() - 1)) as f64
}
