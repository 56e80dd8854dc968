use crate::session::SessionView;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Commands that drive the session, accepted over HTTP and WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum SessionCommand {
    AddTeam {
        /// A generated name is used when absent or blank
        #[serde(default)]
        name: Option<String>,
    },
    RemoveTeam {
        team_id: TeamId,
    },
    SetCategory {
        category: String,
    },
    SetRegion {
        region: Region,
    },
    SetNumRounds {
        num_rounds: u32,
    },
    StartGame,
    SetTypedAnswer {
        text: String,
    },
    /// Judge the typed answer, optionally replacing it first
    SubmitAnswer {
        #[serde(default)]
        text: Option<String>,
    },
    PassQuestion,
    Advance,
    ContinueRound,
    EndGame,
    ResetGame,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        session: SessionView,
        server_now: String,
    },
    Session {
        session: SessionView,
    },
    Error {
        code: String,
        msg: String,
    },
}
