use super::Session;
use crate::answer;
use crate::types::*;

impl Session {
    /// Update the typed-answer buffer. Only while a question is open.
    pub fn set_typed_answer(&mut self, text: impl Into<String>) -> bool {
        if self.phase != Phase::Question {
            return false;
        }
        self.typed_answer = text.into();
        true
    }

    /// Judge the buffered answer for the active team and reveal the result.
    pub fn submit_answer(&mut self) -> bool {
        let submitted = self.typed_answer.clone();
        self.record_attempt(Some(submitted))
    }

    /// The active team passes: no points either way.
    pub fn pass_question(&mut self) -> bool {
        if !self.record_attempt(None) {
            return false;
        }
        self.typed_answer.clear();
        true
    }

    fn record_attempt(&mut self, submitted: Option<String>) -> bool {
        if self.phase != Phase::Question {
            tracing::debug!("Ignoring answer during {:?}", self.phase);
            return false;
        }
        let (Some(team), Some(question)) = (self.active_team(), self.current_question()) else {
            tracing::warn!("Question phase without an active team or question");
            return false;
        };

        let result = answer::verify(submitted.as_deref(), question);
        let attempt = Attempt {
            question_id: question.id.clone(),
            team_id: team.id.clone(),
            submitted_answer: submitted,
            verdict: result.verdict,
            points_delta: result.points_delta,
            processed: false,
        };

        tracing::info!(
            "Team {} answered {}: {:?} ({:+})",
            team.name,
            attempt.question_id,
            attempt.verdict,
            attempt.points_delta
        );
        self.attempt = Some(attempt);
        self.phase = Phase::Reveal;
        true
    }

    /// Commit the revealed attempt and move on.
    ///
    /// Applies the delta to the acting team, hands the turn to the next team
    /// once the acting team has finished a rotation, and advances the cursor.
    /// The next phase is GAME_OVER when the questions run out, ROUND_SCORE when
    /// every team has finished a rotation, QUESTION otherwise. A second call for
    /// the same attempt is ignored.
    pub fn advance_to_score_update(&mut self) -> bool {
        if self.phase != Phase::Reveal {
            tracing::debug!("Ignoring advance during {:?}", self.phase);
            return false;
        }
        let Some(attempt) = self.attempt.as_mut().filter(|a| !a.processed) else {
            tracing::debug!("Ignoring advance without an unprocessed attempt");
            return false;
        };
        let Some(acting) = self.teams.iter().position(|t| t.id == attempt.team_id) else {
            tracing::warn!("Attempt references unknown team {}", attempt.team_id);
            return false;
        };

        attempt.processed = true;
        let delta = attempt.points_delta;
        self.history.push(attempt.clone());

        for (i, team) in self.teams.iter_mut().enumerate() {
            if i == acting {
                team.score += delta;
                team.question_count += 1;
                team.last_round_delta = delta;
            } else {
                team.last_round_delta = 0;
            }
        }

        if self.teams[acting].question_count % QUESTIONS_PER_ROTATION == 0 {
            self.turn = (acting + 1) % self.teams.len();
        }

        self.current_question_index += 1;
        self.phase = if self.current_question_index >= self.questions.len() {
            Phase::GameOver
        } else if self.current_question_index % self.round_length() == 0 {
            Phase::RoundScore
        } else {
            Phase::Question
        };
        self.typed_answer.clear();

        tracing::debug!(
            "Advanced to question {} ({:?})",
            self.current_question_index,
            self.phase
        );
        true
    }

    /// Leave the round scoreboard and resume play.
    pub fn continue_to_next_round(&mut self) -> bool {
        if self.phase != Phase::RoundScore {
            tracing::debug!("Ignoring continue during {:?}", self.phase);
            return false;
        }
        self.phase = Phase::Question;
        true
    }

    /// Stop the game early. An unprocessed attempt is discarded, not scored.
    pub fn end_game(&mut self) -> bool {
        if !self.is_in_progress() {
            tracing::debug!("Ignoring end_game during {:?}", self.phase);
            return false;
        }
        if self.attempt.as_ref().is_some_and(|a| !a.processed) {
            tracing::info!("Discarding unscored attempt on early end");
            self.attempt = None;
        }
        self.current_question_index = self.questions.len();
        self.typed_answer.clear();
        self.phase = Phase::GameOver;
        tracing::info!("Game ended by operator");
        true
    }
}
