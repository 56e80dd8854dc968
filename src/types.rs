use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type TeamId = String;
pub type QuestionId = String;
pub type DisputeId = String;

/// Questions each team answers before the turn passes to the next team
pub const QUESTIONS_PER_ROTATION: u32 = 4;

/// Category filter value meaning "no filter"
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Points won for a correct answer (and lost for an incorrect one)
    pub fn base_points(self) -> i32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub category: String,
    pub difficulty: Difficulty,
    /// The prompt read out to the teams
    pub question: String,
    /// Canonical answer shown on reveal
    pub answer: String,
    /// Other spellings or phrasings that also count as correct
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptable_answers: Vec<String>,
    pub explanation: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl Question {
    /// Canonical answer followed by every acceptable alternative
    pub fn accepted_answers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.answer.as_str()).chain(self.acceptable_answers.iter().map(String::as_str))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub score: i32,
    /// Questions this team has played; drives rotation
    pub question_count: u32,
    /// Delta of the most recently resolved attempt (display only)
    pub last_round_delta: i32,
}

impl Team {
    pub fn new(name: String) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name,
            score: 0,
            question_count: 0,
            last_round_delta: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Correct,
    Incorrect,
    Pass,
}

/// One team's try at the current question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attempt {
    pub question_id: QuestionId,
    pub team_id: TeamId,
    /// `None` when the team passed
    pub submitted_answer: Option<String>,
    pub verdict: Verdict,
    pub points_delta: i32,
    /// Set once the delta has been committed to the team's score
    pub processed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Setup,
    Question,
    Reveal,
    /// Every team has completed a full rotation
    RoundScore,
    GameOver,
}

/// Regional bias applied on top of the category filter
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Us,
    Ca,
    #[default]
    Mix,
}

impl Region {
    /// Tag a question must carry (besides `Global`) to be selected
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Region::Us => Some("US"),
            Region::Ca => Some("CA"),
            Region::Mix => None,
        }
    }

    pub fn admits(self, question: &Question) -> bool {
        match self.tag() {
            Some(tag) => question.has_tag("Global") || question.has_tag(tag),
            None => true,
        }
    }
}

// ========== Disputes ==========

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    Pending,
    Resolved,
    Rejected,
}

/// A team's claim that their answer was judged wrongly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub question_id: QuestionId,
    pub question_text: String,
    pub correct_answer: String,
    pub team_name: String,
    pub submitted_answer: Option<String>,
    pub team_explanation: String,
    /// ISO8601 timestamp
    pub timestamp: String,
    pub status: DisputeStatus,
    #[serde(default)]
    pub resolution_note: Option<String>,
    #[serde(default)]
    pub ai_analysis: Option<DisputeAnalysis>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisVerdict {
    /// The team's answer is right
    Correct,
    /// The team's answer is wrong
    Incorrect,
    /// The question itself needs fixing
    Ambiguous,
}

/// Replacement fields proposed by the fact checker; absent fields stay as they are
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuggestedFix {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl SuggestedFix {
    pub fn is_empty(&self) -> bool {
        self.question.is_none() && self.answer.is_none() && self.explanation.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisputeAnalysis {
    pub verdict: AnalysisVerdict,
    /// 0-100
    pub confidence: u8,
    pub reasoning: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<SuggestedFix>,
}
