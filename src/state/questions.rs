use super::AppState;
use crate::pool::{PoolError, QuestionDraft, QuestionPatch, QuestionPool, StoreError, STORAGE_KEY};
use crate::types::*;

#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Failed to persist questions: {0}")]
    Store(#[from] StoreError),
}

impl AppState {
    pub async fn list_questions(&self) -> Vec<Question> {
        self.pool.read().await.questions().to_vec()
    }

    pub async fn list_categories(&self) -> Vec<String> {
        self.pool.read().await.categories().to_vec()
    }

    /// Author a new custom question and persist the pool
    pub async fn add_question(&self, draft: QuestionDraft) -> Result<Question, QuestionError> {
        let question = draft.into_question()?;
        let added = question.clone();
        self.update_pool(move |pool| pool.add(question)).await?;
        Ok(added)
    }

    pub async fn edit_question(
        &self,
        id: &str,
        patch: QuestionPatch,
    ) -> Result<Question, QuestionError> {
        self.update_pool(|pool| pool.edit(id, patch)).await
    }

    pub(super) async fn apply_fix_to_question(
        &self,
        id: &str,
        fix: &SuggestedFix,
    ) -> Result<Question, QuestionError> {
        self.update_pool(|pool| pool.apply_fix(id, fix)).await
    }

    /// Run a mutation on a copy of the pool, persist it, then swap it in.
    /// A failed save leaves the in-memory pool as it was.
    async fn update_pool<T>(
        &self,
        mutate: impl FnOnce(&mut QuestionPool) -> Result<T, PoolError>,
    ) -> Result<T, QuestionError> {
        let mut pool = self.pool.write().await;
        let mut next = pool.clone();
        let result = mutate(&mut next)?;
        self.store.save(STORAGE_KEY, &next.to_stored()).await?;
        *pool = next;
        Ok(result)
    }
}
