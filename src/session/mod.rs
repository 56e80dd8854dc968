//! The game session state machine.
//!
//! A [`Session`] owns everything about one game in progress: the teams, the
//! questions drawn for this game, whose turn it is and the attempt currently
//! on screen. It is mutated only through the transition methods in
//! `setup.rs` and `turn.rs`; each one either applies completely or leaves the
//! session untouched.
//!
//! ```text
//! SETUP -> QUESTION -> REVEAL -> QUESTION -> ... -> GAME_OVER
//!                        |                     ^
//!                        +--> ROUND_SCORE -----+ (continue)
//! ```

mod setup;
mod turn;
mod view;

pub use view::{QuestionView, SessionView};

use serde::{Deserialize, Serialize};

use crate::pool::PoolError;
use crate::types::*;

/// Rejections of `start_game`; the session is left unchanged
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("Cannot start a game during {0:?}")]
    InvalidPhase(Phase),

    #[error("At least one team is required to start")]
    NoTeams,

    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    teams: Vec<Team>,
    /// Drawn at game start, never resampled
    questions: Vec<Question>,
    current_question_index: usize,
    phase: Phase,
    /// Index into `teams` of the team whose turn it is
    turn: usize,
    typed_answer: String,
    attempt: Option<Attempt>,
    num_rounds: u32,
    category: String,
    region: Region,
    /// Processed attempts since the game started
    history: Vec<Attempt>,
}

/// Rounds used when none are configured
pub const DEFAULT_NUM_ROUNDS: u32 = 10;

impl Session {
    pub fn new() -> Self {
        Self {
            teams: Vec::new(),
            questions: Vec::new(),
            current_question_index: 0,
            phase: Phase::Setup,
            turn: 0,
            typed_answer: String::new(),
            attempt: None,
            num_rounds: DEFAULT_NUM_ROUNDS,
            category: ALL_CATEGORIES.to_string(),
            region: Region::Mix,
            history: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    /// Question at the cursor; `None` before the game starts and once it is over
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    /// The team on turn. Only defined while a question is being played or revealed.
    pub fn active_team(&self) -> Option<&Team> {
        match self.phase {
            Phase::Question | Phase::Reveal => self.teams.get(self.turn),
            _ => None,
        }
    }

    pub fn active_team_id(&self) -> Option<&TeamId> {
        self.active_team().map(|t| &t.id)
    }

    pub fn typed_answer(&self) -> &str {
        &self.typed_answer
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    pub fn history(&self) -> &[Attempt] {
        &self.history
    }

    pub fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Teams ordered by score, highest first; ties keep list order
    pub fn standings(&self) -> Vec<&Team> {
        let mut standings: Vec<&Team> = self.teams.iter().collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }

    /// Questions in one full round: every team plays a whole rotation
    fn round_length(&self) -> usize {
        self.teams.len() * QUESTIONS_PER_ROTATION as usize
    }

    fn is_in_progress(&self) -> bool {
        matches!(self.phase, Phase::Question | Phase::Reveal | Phase::RoundScore)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
