use rand::Rng;

use super::{Session, SessionError};
use crate::pool::{self, category_filter};
use crate::types::*;

impl Session {
    /// Add a team with a zero score. Ignored outside SETUP.
    pub fn add_team(&mut self, name: impl Into<String>) -> Option<TeamId> {
        if self.phase != Phase::Setup {
            tracing::debug!("Ignoring add_team during {:?}", self.phase);
            return None;
        }

        let team = Team::new(name.into());
        let id = team.id.clone();
        tracing::info!("Team added: {} ({})", team.name, id);
        self.teams.push(team);
        Some(id)
    }

    /// Remove a team by id. Ignored outside SETUP.
    pub fn remove_team(&mut self, id: &str) -> bool {
        if self.phase != Phase::Setup {
            tracing::debug!("Ignoring remove_team during {:?}", self.phase);
            return false;
        }

        let before = self.teams.len();
        self.teams.retain(|t| t.id != id);
        let removed = self.teams.len() != before;
        if removed {
            tracing::info!("Team removed: {}", id);
        }
        removed
    }

    /// Restrict the game to one category (`"All"` for every category)
    pub fn set_category(&mut self, category: impl Into<String>) -> bool {
        if self.phase != Phase::Setup {
            tracing::debug!("Ignoring set_category during {:?}", self.phase);
            return false;
        }
        let category = category.into();
        self.category = match category_filter(&category) {
            Some(c) => c.to_string(),
            None => ALL_CATEGORIES.to_string(),
        };
        true
    }

    pub fn set_region(&mut self, region: Region) -> bool {
        if self.phase != Phase::Setup {
            tracing::debug!("Ignoring set_region during {:?}", self.phase);
            return false;
        }
        self.region = region;
        true
    }

    /// Set the minimum number of questions for the game. Must be at least 1.
    pub fn set_num_rounds(&mut self, num_rounds: u32) -> bool {
        if self.phase != Phase::Setup || num_rounds == 0 {
            tracing::debug!(
                "Ignoring set_num_rounds({}) during {:?}",
                num_rounds,
                self.phase
            );
            return false;
        }
        self.num_rounds = num_rounds;
        true
    }

    /// Draw the questions and begin play with the first team.
    ///
    /// Allowed from SETUP, or from GAME_OVER to replay with the same teams.
    /// Returns the number of questions drawn. On error nothing changes.
    pub fn start_game<R: Rng + ?Sized>(
        &mut self,
        pool: &[Question],
        rng: &mut R,
    ) -> Result<usize, SessionError> {
        if !matches!(self.phase, Phase::Setup | Phase::GameOver) {
            return Err(SessionError::InvalidPhase(self.phase));
        }
        if self.teams.is_empty() {
            return Err(SessionError::NoTeams);
        }

        let count = pool::required_count(self.num_rounds, self.teams.len());
        let questions = pool::select(
            pool,
            category_filter(&self.category),
            self.region,
            count,
            rng,
        )?;

        for team in &mut self.teams {
            team.score = 0;
            team.question_count = 0;
            team.last_round_delta = 0;
        }
        self.questions = questions;
        self.current_question_index = 0;
        self.turn = 0;
        self.typed_answer.clear();
        self.attempt = None;
        self.history.clear();
        self.phase = Phase::Question;

        tracing::info!(
            "Game started: {} teams, {} questions, category {}",
            self.teams.len(),
            self.questions.len(),
            self.category
        );
        Ok(self.questions.len())
    }

    /// Back to SETUP with no teams and no questions. Configuration is kept.
    pub fn reset_game(&mut self) {
        self.teams.clear();
        self.questions.clear();
        self.current_question_index = 0;
        self.turn = 0;
        self.typed_answer.clear();
        self.attempt = None;
        self.history.clear();
        self.phase = Phase::Setup;
        tracing::info!("Game reset");
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{easy_pool, rng, started};
    use super::*;
    use crate::pool::PoolError;

    #[test]
    fn test_add_and_remove_team() {
        let mut session = Session::new();
        let a = session.add_team("Alpha").unwrap();
        let b = session.add_team("Beta").unwrap();

        assert_eq!(session.teams().len(), 2);
        assert_eq!(session.teams()[0].name, "Alpha");
        assert_eq!(session.teams()[0].score, 0);

        assert!(session.remove_team(&a));
        assert!(!session.remove_team(&a));
        assert_eq!(session.teams().len(), 1);
        assert_eq!(session.teams()[0].id, b);
    }

    #[test]
    fn test_setup_operations_ignored_after_start() {
        let mut session = started(&["Alpha", "Beta"], 5, 10);
        let alpha = session.teams()[0].id.clone();

        assert!(session.add_team("Gamma").is_none());
        assert!(!session.remove_team(&alpha));
        assert!(!session.set_category("Science"));
        assert!(!session.set_region(Region::Us));
        assert!(!session.set_num_rounds(3));

        assert_eq!(session.teams().len(), 2);
        assert_eq!(session.category(), ALL_CATEGORIES);
        assert_eq!(session.region(), Region::Mix);
        assert_eq!(session.num_rounds(), 5);
    }

    #[test]
    fn test_set_num_rounds_rejects_zero() {
        let mut session = Session::new();
        assert!(!session.set_num_rounds(0));
        assert!(session.set_num_rounds(3));
        assert_eq!(session.num_rounds(), 3);
    }

    #[test]
    fn test_set_category_normalizes_all() {
        let mut session = Session::new();
        assert!(session.set_category(" Science "));
        assert_eq!(session.category(), "Science");
        assert!(session.set_category("all"));
        assert_eq!(session.category(), ALL_CATEGORIES);
    }

    #[test]
    fn test_start_requires_team() {
        let mut session = Session::new();
        let result = session.start_game(&easy_pool(10), &mut rng());
        assert_eq!(result, Err(SessionError::NoTeams));
        assert_eq!(session.phase(), Phase::Setup);
    }

    #[test]
    fn test_start_fails_with_insufficient_pool() {
        let mut session = Session::new();
        session.add_team("Alpha");
        session.add_team("Beta");
        session.set_num_rounds(5);

        let result = session.start_game(&easy_pool(7), &mut rng());

        assert_eq!(
            result,
            Err(SessionError::Pool(PoolError::InsufficientQuestions {
                available: 7,
                required: 8
            }))
        );
        assert_eq!(session.phase(), Phase::Setup);
        assert!(session.questions().is_empty());
    }

    #[test]
    fn test_start_respects_category() {
        let mut pool = easy_pool(8);
        for q in pool.iter_mut().take(4) {
            q.category = "Science".to_string();
        }
        let mut session = Session::new();
        session.add_team("Solo");
        session.set_num_rounds(1);
        session.set_category("Science");

        assert_eq!(session.start_game(&pool, &mut rng()), Ok(4));
        assert!(session.questions().iter().all(|q| q.category == "Science"));
    }

    #[test]
    fn test_start_rejected_mid_game() {
        let mut session = started(&["Alpha"], 4, 8);
        let questions = session.questions().to_vec();

        let result = session.start_game(&easy_pool(8), &mut rng());
        assert_eq!(result, Err(SessionError::InvalidPhase(Phase::Question)));
        assert_eq!(session.questions(), questions.as_slice());
    }

    #[test]
    fn test_restart_from_game_over_resets_scores() {
        let mut session = started(&["Alpha"], 4, 8);
        while session.phase() != Phase::GameOver {
            let answer = session.current_question().unwrap().answer.clone();
            session.set_typed_answer(answer);
            session.submit_answer();
            session.advance_to_score_update();
        }
        assert_eq!(session.teams()[0].score, 4);

        session.start_game(&easy_pool(8), &mut rng()).unwrap();
        assert_eq!(session.phase(), Phase::Question);
        assert_eq!(session.teams()[0].score, 0);
        assert_eq!(session.teams()[0].question_count, 0);
        assert!(session.history().is_empty());
        assert_eq!(session.current_question_index(), 0);
    }

    #[test]
    fn test_reset_from_any_phase() {
        let mut in_reveal = started(&["A", "B"], 8, 8);
        in_reveal.pass_question();

        let mut over = started(&["A"], 4, 4);
        over.end_game();

        for mut session in [Session::new(), started(&["A"], 4, 4), in_reveal, over] {
            session.reset_game();
            assert_eq!(session.phase(), Phase::Setup);
            assert!(session.teams().is_empty());
            assert!(session.questions().is_empty());
            assert!(session.attempt().is_none());
            assert_eq!(session.typed_answer(), "");
            assert_eq!(session.current_question_index(), 0);
        }
    }
}
