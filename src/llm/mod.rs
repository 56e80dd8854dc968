mod ollama;
mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::types::{AnalysisVerdict, DisputeAnalysis, SuggestedFix};

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// A dispute to fact-check
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub question: String,
    /// The answer the game accepts
    pub correct_answer: String,
    /// What the team answered
    pub submitted_answer: String,
    /// Why the team thinks they were right
    pub explanation: String,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct AnalysisResponse {
    pub analysis: DisputeAnalysis,
    pub metadata: ResponseMetadata,
}

/// Metadata about the LLM response
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// Name of the provider (e.g., "openai", "ollama")
    pub provider: String,
    pub model: String,
    /// Tokens consumed (if available)
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

/// Trait that all LLM providers must implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Fact-check a dispute. Unparsable model output is not an error: it
    /// comes back as an AMBIGUOUS verdict with zero confidence.
    async fn analyze(&self, request: AnalysisRequest) -> LlmResult<AnalysisResponse>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Configuration for LLM providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    /// Alternate OpenAI-compatible endpoint
    pub openai_base_url: Option<String>,
    pub openai_model: String,
    pub ollama_base_url: Option<String>,
    pub ollama_model: String,
    pub default_timeout: Duration,
    pub default_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            openai_model: "gpt-4o".to_string(),
            ollama_base_url: None,
            ollama_model: "llama3.2".to_string(),
            default_timeout: Duration::from_secs(30),
            default_max_tokens: 1024,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env_non_empty("OPENAI_API_KEY"),
            openai_base_url: env_non_empty("OPENAI_BASE_URL"),
            openai_model: env_non_empty("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            ollama_base_url: env_non_empty("OLLAMA_BASE_URL"),
            ollama_model: env_non_empty("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            default_timeout: env_non_empty("LLM_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            default_max_tokens: env_non_empty("LLM_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_max_tokens),
        }
    }

    /// Build the dispute analyzer. OpenAI wins when both providers are configured.
    pub fn build_provider(&self) -> LlmResult<Arc<dyn LlmProvider>> {
        if let Some(api_key) = &self.openai_api_key {
            return Ok(Arc::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_base_url.clone(),
                self.openai_model.clone(),
            )));
        }

        if let Some(base_url) = &self.ollama_base_url {
            return Ok(Arc::new(OllamaProvider::new(
                base_url.clone(),
                self.ollama_model.clone(),
            )?));
        }

        Err(LlmError::ConfigError(
            "No LLM provider configured. Set OPENAI_API_KEY or OLLAMA_BASE_URL".to_string(),
        ))
    }

    /// Request skeleton carrying the configured limits
    pub fn request(
        &self,
        question: String,
        correct_answer: String,
        submitted_answer: String,
        explanation: String,
    ) -> AnalysisRequest {
        AnalysisRequest {
            question,
            correct_answer,
            submitted_answer,
            explanation,
            max_tokens: Some(self.default_max_tokens),
            timeout: self.default_timeout,
        }
    }
}

const FACT_CHECK_SYSTEM_PROMPT: &str =
    "You are a fact-checking assistant for a trivia game. Always respond with valid JSON.";

/// User prompt asking the model to adjudicate a dispute
fn build_prompt(request: &AnalysisRequest) -> String {
    format!(
        r#"You are a Trivia Fact Checker. Analyze this dispute:

Question: "{question}"
Game's Correct Answer: "{correct}"
User's Claimed Answer: "{submitted}"
User's Explanation: "{explanation}"

Task:
1. Verify if the User's Claimed Answer is factually correct.
2. Verify if the Game's Correct Answer is factually correct.
3. Determine if the question is ambiguous or flawed.

Return JSON format:
{{
  "verdict": "CORRECT" (User is right) | "INCORRECT" (User is wrong) | "AMBIGUOUS" (Question needs fix),
  "confidence": 0-100,
  "reasoning": "Short explanation...",
  "suggested_fix": {{
    "question": "Reworded question...",
    "answer": "Corrected answer...",
    "explanation": "Better explanation..."
  }},
  "sources": ["List of credible sources or domains"]
}}

Only include suggested_fix if there's a problem with the question or answer."#,
        question = request.question,
        correct = request.correct_answer,
        submitted = request.submitted_answer,
        explanation = request.explanation,
    )
}

/// Loosely-typed model output; every field may be missing or oddly shaped
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    verdict: Option<String>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    sources: Option<Vec<String>>,
    #[serde(default, alias = "suggestedFix")]
    suggested_fix: Option<SuggestedFix>,
}

const DEFAULT_CONFIDENCE: u8 = 50;

/// Turn model output into an analysis, degrading instead of failing.
///
/// Garbage yields AMBIGUOUS with confidence 0. Valid JSON with missing fields
/// gets AMBIGUOUS / 50 / a stock reasoning / no sources.
pub fn parse_analysis(text: &str) -> DisputeAnalysis {
    let Some(raw) = extract_json_object(text).and_then(|json| serde_json::from_str::<RawAnalysis>(json).ok())
    else {
        tracing::warn!("Unparsable dispute analysis: {}", text);
        return DisputeAnalysis {
            verdict: AnalysisVerdict::Ambiguous,
            confidence: 0,
            reasoning: "Failed to parse AI response.".to_string(),
            sources: Vec::new(),
            suggested_fix: None,
        };
    };

    let verdict = match raw.verdict.as_deref().map(|v| v.trim().to_ascii_uppercase()) {
        Some(v) if v == "CORRECT" => AnalysisVerdict::Correct,
        Some(v) if v == "INCORRECT" => AnalysisVerdict::Incorrect,
        _ => AnalysisVerdict::Ambiguous,
    };

    let confidence = raw
        .confidence
        .and_then(|value| match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
            _ => None,
        })
        .map(|c| c.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(DEFAULT_CONFIDENCE);

    let reasoning = raw
        .reasoning
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "Analysis could not be completed.".to_string());

    let sources = raw
        .sources
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let suggested_fix = raw.suggested_fix.map(tidy_fix).filter(|fix| !fix.is_empty());

    DisputeAnalysis {
        verdict,
        confidence,
        reasoning,
        sources,
        suggested_fix,
    }
}

/// Models sometimes wrap JSON in prose or code fences
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn tidy_fix(fix: SuggestedFix) -> SuggestedFix {
    let clean = |field: Option<String>| {
        field
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    SuggestedFix {
        question: clean(fix.question),
        answer: clean(fix.answer),
        explanation: clean(fix.explanation),
    }
}
