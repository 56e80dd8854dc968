mod dispute;
mod questions;
mod session;

pub use dispute::{DisputeError, DisputeSubmission, Resolution};
pub use questions::QuestionError;

use crate::llm::{LlmConfig, LlmProvider};
use crate::pool::{MemoryStore, QuestionPool, QuestionStore};
use crate::session::{Session, SessionView};
use crate::types::*;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The one game in progress; every transition goes through this lock
    pub session: Arc<RwLock<Session>>,
    pub pool: Arc<RwLock<QuestionPool>>,
    pub store: Arc<dyn QuestionStore>,
    /// Disputes in submission order
    pub disputes: Arc<RwLock<Vec<Dispute>>>,
    /// Fact checker for disputes (None if no provider is configured)
    pub analyzer: Option<Arc<dyn LlmProvider>>,
    pub llm_config: LlmConfig,
    /// Session snapshots for display clients
    pub broadcast: broadcast::Sender<SessionView>,
}

impl AppState {
    pub fn new(pool: QuestionPool, store: Arc<dyn QuestionStore>) -> Self {
        Self::new_with_llm(pool, store, None, LlmConfig::default())
    }

    pub fn new_with_llm(
        pool: QuestionPool,
        store: Arc<dyn QuestionStore>,
        analyzer: Option<Arc<dyn LlmProvider>>,
        llm_config: LlmConfig,
    ) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            session: Arc::new(RwLock::new(Session::new())),
            pool: Arc::new(RwLock::new(pool)),
            store,
            disputes: Arc::new(RwLock::new(Vec::new())),
            analyzer,
            llm_config,
            broadcast: tx,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(QuestionPool::default(), Arc::new(MemoryStore::new()))
    }
}
