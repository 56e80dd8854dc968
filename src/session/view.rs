//! Serializable snapshot of a session for display clients.

use serde::Serialize;

use super::Session;
use crate::types::*;

/// The question as shown on screen. Answer fields stay hidden until reveal.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub category: String,
    pub difficulty: Difficulty,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionView {
    pub phase: Phase,
    pub teams: Vec<Team>,
    /// Team ids ordered by score, highest first
    pub standings: Vec<TeamId>,
    pub question: Option<QuestionView>,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub active_team_id: Option<TeamId>,
    pub typed_answer: String,
    pub attempt: Option<Attempt>,
    pub num_rounds: u32,
    pub category: String,
    pub region: Region,
    /// Attempts committed so far
    pub history_len: usize,
}

impl Session {
    pub fn view(&self) -> SessionView {
        let revealed = self.phase == Phase::Reveal;
        let question = match self.phase {
            Phase::Question | Phase::Reveal => self.current_question().map(|q| QuestionView {
                id: q.id.clone(),
                category: q.category.clone(),
                difficulty: q.difficulty,
                question: q.question.clone(),
                answer: revealed.then(|| q.answer.clone()),
                explanation: revealed.then(|| q.explanation.clone()),
                source_url: q.source_url.clone().filter(|_| revealed),
                source_name: q.source_name.clone().filter(|_| revealed),
            }),
            _ => None,
        };

        SessionView {
            phase: self.phase,
            teams: self.teams.clone(),
            standings: self.standings().into_iter().map(|t| t.id.clone()).collect(),
            question,
            current_question_index: self.current_question_index,
            total_questions: self.questions.len(),
            active_team_id: self.active_team_id().cloned(),
            typed_answer: self.typed_answer.clone(),
            attempt: self.attempt.clone(),
            num_rounds: self.num_rounds,
            category: self.category.clone(),
            region: self.region,
            history_len: self.history.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::started;
    use super::*;

    #[test]
    fn test_answer_hidden_until_reveal() {
        let mut session = started(&["A"], 4, 4);

        let view = session.view();
        let question = view.question.unwrap();
        assert!(question.answer.is_none());
        assert!(question.explanation.is_none());

        session.pass_question();
        let expected = session.current_question().unwrap().answer.clone();
        let question = session.view().question.unwrap();
        assert_eq!(question.answer, Some(expected));
        assert!(question.explanation.is_some());
    }

    #[test]
    fn test_view_serializes_phase() {
        let session = started(&["A", "B"], 8, 8);
        let json = serde_json::to_value(session.view()).unwrap();

        assert_eq!(json["phase"], "QUESTION");
        assert_eq!(json["total_questions"], 8);
        assert_eq!(json["teams"].as_array().unwrap().len(), 2);
        assert_eq!(json["active_team_id"], json["teams"][0]["id"]);
        assert!(json["question"].get("answer").is_none());
    }

    #[test]
    fn test_no_question_outside_play() {
        let mut session = started(&["A"], 4, 4);
        session.end_game();
        let view = session.view();
        assert!(view.question.is_none());
        assert!(view.active_team_id.is_none());
        assert_eq!(view.phase, Phase::GameOver);
    }

    #[test]
    fn test_standings_follow_scores() {
        let mut session = started(&["A", "B"], 8, 8);
        let a = session.teams()[0].id.clone();
        let b = session.teams()[1].id.clone();
        assert_eq!(session.view().standings, vec![a.clone(), b.clone()]);

        session.set_typed_answer("definitely not it");
        session.submit_answer();
        session.advance_to_score_update();

        let view = session.view();
        assert_eq!(view.standings, vec![b, a]);
        assert_eq!(serde_json::to_value(&view).unwrap()["standings"].as_array().unwrap().len(), 2);
    }
}
