use super::AppState;
use crate::protocol::SessionCommand;
use crate::session::{SessionError, SessionView};

/// Two-word display name such as "Brave Otter"
fn generated_team_name() -> String {
    petname::petname(2, " ")
        .map(|name| {
            name.split(' ')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<String>>()
                .join(" ")
        })
        .unwrap_or_else(|| "Team".to_string())
}

impl AppState {
    pub async fn get_session_view(&self) -> SessionView {
        self.session.read().await.view()
    }

    /// Apply one command to the session and broadcast the result.
    ///
    /// Commands that do not fit the current phase leave the session untouched
    /// and still return the current snapshot. Only a rejected `start_game`
    /// is an error.
    pub async fn apply_command(&self, cmd: SessionCommand) -> Result<SessionView, SessionError> {
        let (applied, view) = {
            let mut session = self.session.write().await;
            let applied = match cmd {
                SessionCommand::AddTeam { name } => {
                    let name = name
                        .map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(generated_team_name);
                    session.add_team(name).is_some()
                }
                SessionCommand::RemoveTeam { team_id } => session.remove_team(&team_id),
                SessionCommand::SetCategory { category } => session.set_category(category),
                SessionCommand::SetRegion { region } => session.set_region(region),
                SessionCommand::SetNumRounds { num_rounds } => session.set_num_rounds(num_rounds),
                SessionCommand::StartGame => {
                    let pool = self.pool.read().await;
                    session.start_game(pool.questions(), &mut rand::rng())?;
                    true
                }
                SessionCommand::SetTypedAnswer { text } => session.set_typed_answer(text),
                SessionCommand::SubmitAnswer { text } => {
                    if let Some(text) = text {
                        session.set_typed_answer(text);
                    }
                    session.submit_answer()
                }
                SessionCommand::PassQuestion => session.pass_question(),
                SessionCommand::Advance => session.advance_to_score_update(),
                SessionCommand::ContinueRound => session.continue_to_next_round(),
                SessionCommand::EndGame => session.end_game(),
                SessionCommand::ResetGame => {
                    session.reset_game();
                    true
                }
            };
            (applied, session.view())
        };

        if applied {
            self.broadcast_session(view.clone());
        }
        Ok(view)
    }

    /// Push a snapshot to display clients. Having no subscribers is fine.
    pub fn broadcast_session(&self, view: SessionView) {
        let _ = self.broadcast.send(view);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::state_with_questions;
    use super::*;
    use crate::types::*;

    #[test]
    fn test_generated_team_name() {
        let name = generated_team_name();
        assert!(!name.is_empty());
        assert!(name.split(' ').all(|w| w.chars().next().is_some_and(char::is_uppercase)));
    }

    #[tokio::test]
    async fn test_add_team_generates_name_when_blank() {
        let state = state_with_questions(8);
        let view = state
            .apply_command(SessionCommand::AddTeam {
                name: Some("   ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(view.teams.len(), 1);
        assert!(!view.teams[0].name.trim().is_empty());

        let view = state
            .apply_command(SessionCommand::AddTeam {
                name: Some(" Alpha ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(view.teams[1].name, "Alpha");
    }

    #[tokio::test]
    async fn test_start_game_without_teams_is_rejected() {
        let state = state_with_questions(8);
        let result = state.apply_command(SessionCommand::StartGame).await;
        assert!(matches!(result, Err(SessionError::NoTeams)));
        assert_eq!(state.get_session_view().await.phase, Phase::Setup);
    }

    #[tokio::test]
    async fn test_start_game_with_small_pool_is_rejected() {
        let state = state_with_questions(3);
        state
            .apply_command(SessionCommand::AddTeam { name: None })
            .await
            .unwrap();
        let result = state.apply_command(SessionCommand::StartGame).await;
        assert!(matches!(result, Err(SessionError::Pool(_))));
    }

    #[tokio::test]
    async fn test_play_through_commands() {
        let state = state_with_questions(8);
        for name in ["Alpha", "Beta"] {
            state
                .apply_command(SessionCommand::AddTeam {
                    name: Some(name.to_string()),
                })
                .await
                .unwrap();
        }
        state
            .apply_command(SessionCommand::SetNumRounds { num_rounds: 5 })
            .await
            .unwrap();

        let view = state.apply_command(SessionCommand::StartGame).await.unwrap();
        assert_eq!(view.phase, Phase::Question);
        assert_eq!(view.total_questions, 8);
        assert_eq!(view.active_team_id.as_ref(), Some(&view.teams[0].id));

        let answer = state
            .session
            .read()
            .await
            .current_question()
            .unwrap()
            .answer
            .clone();
        let view = state
            .apply_command(SessionCommand::SubmitAnswer { text: Some(answer) })
            .await
            .unwrap();
        assert_eq!(view.phase, Phase::Reveal);
        assert_eq!(view.attempt.as_ref().unwrap().verdict, Verdict::Correct);

        let view = state.apply_command(SessionCommand::Advance).await.unwrap();
        assert_eq!(view.phase, Phase::Question);
        assert_eq!(view.teams[0].score, 1);
        assert_eq!(view.current_question_index, 1);
        assert_eq!(view.history_len, 1);
    }

    #[tokio::test]
    async fn test_applied_commands_are_broadcast() {
        let state = state_with_questions(8);
        let mut rx = state.broadcast.subscribe();

        state
            .apply_command(SessionCommand::AddTeam {
                name: Some("Alpha".to_string()),
            })
            .await
            .unwrap();
        let view = rx.recv().await.unwrap();
        assert_eq!(view.teams.len(), 1);

        // Out-of-phase command: no broadcast
        state.apply_command(SessionCommand::Advance).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
