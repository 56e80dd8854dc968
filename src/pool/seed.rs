//! Built-in question content shipped with the binary.

use crate::types::Question;

/// Bump whenever `data/questions.json` changes so cached copies are rebuilt
pub const SEED_VERSION: u32 = 1;

const SEED_JSON: &str = include_str!("../../data/questions.json");

/// Parse the built-in questions
pub fn builtin_questions() -> Result<Vec<Question>, serde_json::Error> {
    serde_json::from_str(SEED_JSON)
}
