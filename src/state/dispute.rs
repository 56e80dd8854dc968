use super::questions::QuestionError;
use super::AppState;
use crate::llm::LlmError;
use crate::types::*;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum DisputeError {
    #[error("Invalid dispute: {0}")]
    Validation(String),

    #[error("Dispute {0} not found")]
    NotFound(DisputeId),

    #[error("Dispute {0} has already been decided")]
    AlreadyDecided(DisputeId),

    #[error("No AI analyzer is configured")]
    AnalyzerUnavailable,

    #[error("Dispute {0} has no suggested fix")]
    NoSuggestedFix(DisputeId),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] LlmError),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// What a team sends when contesting a verdict
#[derive(Debug, Clone, Deserialize)]
pub struct DisputeSubmission {
    pub question_id: QuestionId,
    pub question_text: String,
    pub correct_answer: String,
    pub team_name: String,
    #[serde(default)]
    pub submitted_answer: Option<String>,
    pub team_explanation: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Accept,
    Reject,
}

impl AppState {
    pub async fn submit_dispute(&self, submission: DisputeSubmission) -> Result<Dispute, DisputeError> {
        let explanation = submission.team_explanation.trim();
        if explanation.is_empty() {
            return Err(DisputeError::Validation(
                "an explanation is required".to_string(),
            ));
        }
        if submission.question_id.trim().is_empty() {
            return Err(DisputeError::Validation("question_id is required".to_string()));
        }

        let dispute = Dispute {
            id: ulid::Ulid::new().to_string(),
            question_id: submission.question_id,
            question_text: submission.question_text,
            correct_answer: submission.correct_answer,
            team_name: submission.team_name,
            submitted_answer: submission.submitted_answer.filter(|a| !a.trim().is_empty()),
            team_explanation: explanation.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: DisputeStatus::Pending,
            resolution_note: None,
            ai_analysis: None,
        };

        tracing::info!(
            "Dispute {} submitted by {} on question {}",
            dispute.id,
            dispute.team_name,
            dispute.question_id
        );
        self.disputes.write().await.push(dispute.clone());
        Ok(dispute)
    }

    pub async fn list_disputes(&self) -> Vec<Dispute> {
        self.disputes.read().await.clone()
    }

    /// Drop every dispute, returning how many there were
    pub async fn clear_disputes(&self) -> usize {
        let mut disputes = self.disputes.write().await;
        let count = disputes.len();
        disputes.clear();
        tracing::info!("Cleared {} disputes", count);
        count
    }

    async fn get_dispute(&self, id: &str) -> Result<Dispute, DisputeError> {
        self.disputes
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| DisputeError::NotFound(id.to_string()))
    }

    async fn update_dispute<T>(
        &self,
        id: &str,
        update: impl FnOnce(&mut Dispute) -> Result<T, DisputeError>,
    ) -> Result<T, DisputeError> {
        let mut disputes = self.disputes.write().await;
        let dispute = disputes
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DisputeError::NotFound(id.to_string()))?;
        update(dispute)
    }

    /// Ask the configured analyzer to fact-check a dispute and store the result.
    /// The dispute lock is not held while the analyzer runs.
    pub async fn analyze_dispute(&self, id: &str) -> Result<Dispute, DisputeError> {
        let analyzer = self
            .analyzer
            .clone()
            .ok_or(DisputeError::AnalyzerUnavailable)?;
        let dispute = self.get_dispute(id).await?;

        let request = self.llm_config.request(
            dispute.question_text.clone(),
            dispute.correct_answer.clone(),
            dispute
                .submitted_answer
                .clone()
                .unwrap_or_else(|| "(no answer)".to_string()),
            dispute.team_explanation.clone(),
        );

        tracing::info!("Analyzing dispute {} with {}", id, analyzer.name());
        let response = analyzer.analyze(request).await.map_err(|e| {
            tracing::error!("Dispute analysis failed for {}: {}", id, e);
            e
        })?;
        tracing::info!(
            "Dispute {} analyzed by {}/{} in {}ms: {:?} ({}%)",
            id,
            response.metadata.provider,
            response.metadata.model,
            response.metadata.latency_ms,
            response.analysis.verdict,
            response.analysis.confidence
        );

        self.update_dispute(id, |dispute| {
            dispute.ai_analysis = Some(response.analysis);
            Ok(dispute.clone())
        })
        .await
    }

    /// Accept or reject a pending dispute
    pub async fn resolve_dispute(
        &self,
        id: &str,
        resolution: Resolution,
        note: Option<String>,
    ) -> Result<Dispute, DisputeError> {
        self.update_dispute(id, |dispute| {
            if dispute.status != DisputeStatus::Pending {
                return Err(DisputeError::AlreadyDecided(dispute.id.clone()));
            }
            let (status, default_note) = match resolution {
                Resolution::Accept => (DisputeStatus::Resolved, "Accepted by admin"),
                Resolution::Reject => (DisputeStatus::Rejected, "Rejected by admin"),
            };
            dispute.status = status;
            dispute.resolution_note = Some(
                note.map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| default_note.to_string()),
            );
            tracing::info!("Dispute {} marked {:?}", dispute.id, status);
            Ok(dispute.clone())
        })
        .await
    }

    /// Merge the analyzer's suggested fix into the disputed question.
    /// The dispute's own status is left alone.
    pub async fn apply_dispute_fix(&self, id: &str) -> Result<Question, DisputeError> {
        let dispute = self.get_dispute(id).await?;
        let fix = dispute
            .ai_analysis
            .and_then(|a| a.suggested_fix)
            .filter(|fix| !fix.is_empty())
            .ok_or_else(|| DisputeError::NoSuggestedFix(id.to_string()))?;

        let question = self
            .apply_fix_to_question(&dispute.question_id, &fix)
            .await?;
        tracing::info!(
            "Applied suggested fix from dispute {} to question {}",
            id,
            question.id
        );
        Ok(question)
    }
}
