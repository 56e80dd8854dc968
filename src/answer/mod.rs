//! Answer checking: normalization, fuzzy matching and scoring.

mod normalize;
mod similarity;

pub use normalize::normalize;
pub use similarity::dice_coefficient;

use crate::types::{Question, Verdict};

/// Similarity a typed answer must exceed to count as a typo of an accepted answer
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.8;

/// Normalized submissions this short are only ever matched exactly
const FUZZY_MIN_LEN: usize = 3;

/// Outcome of checking one submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verification {
    pub verdict: Verdict,
    pub points_delta: i32,
}

/// Judge a submission against a question.
///
/// `None` means the team passed. Otherwise the submission is CORRECT when its
/// normalized form equals any normalized accepted answer, or (for submissions
/// longer than two characters) is more than [`FUZZY_MATCH_THRESHOLD`] similar
/// to one. Points are the question's base value, negated for wrong answers.
pub fn verify(submitted: Option<&str>, question: &Question) -> Verification {
    let Some(submitted) = submitted else {
        return Verification {
            verdict: Verdict::Pass,
            points_delta: 0,
        };
    };

    let verdict = if is_accepted(submitted, question) {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    };

    let base = question.difficulty.base_points();
    let points_delta = match verdict {
        Verdict::Correct => base,
        Verdict::Incorrect => -base,
        Verdict::Pass => 0,
    };

    Verification {
        verdict,
        points_delta,
    }
}

fn is_accepted(submitted: &str, question: &Question) -> bool {
    let submitted = normalize(submitted);
    let candidates: Vec<String> = question.accepted_answers().map(normalize).collect();

    if candidates.iter().any(|c| *c == submitted) {
        return true;
    }

    if submitted.chars().count() < FUZZY_MIN_LEN {
        return false;
    }

    candidates
        .iter()
        .any(|c| dice_coefficient(&submitted, c) > FUZZY_MATCH_THRESHOLD)
}
