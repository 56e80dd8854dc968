use super::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Local Ollama provider
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::ConfigError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    /// Constrains the model to emit a JSON document
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn analyze(&self, request: AnalysisRequest) -> LlmResult<AnalysisResponse> {
        let start = Instant::now();

        let ollama_request = OllamaGenerateRequest {
            model: self.model.clone(),
            system: FACT_CHECK_SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(&request),
            stream: false,
            format: "json",
            options: request.max_tokens.map(|max| OllamaOptions {
                num_predict: Some(max),
            }),
        };

        let url = format!("{}/api/generate", self.base_url);

        let ollama_response = tokio::time::timeout(request.timeout, async {
            let response = self
                .client
                .post(&url)
                .json(&ollama_request)
                .send()
                .await
                .map_err(|e| LlmError::ApiError(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::ApiError(format!(
                    "Ollama returned {}: {}",
                    status, body
                )));
            }

            response
                .json::<OllamaGenerateResponse>()
                .await
                .map_err(|e| LlmError::ParseError(e.to_string()))
        })
        .await
        .map_err(|_| LlmError::Timeout(request.timeout))??;

        let latency_ms = start.elapsed().as_millis() as u64;
        let tokens_used = match (ollama_response.prompt_eval_count, ollama_response.eval_count) {
            (None, None) => None,
            (prompt, eval) => Some(prompt.unwrap_or(0) + eval.unwrap_or(0)),
        };

        Ok(AnalysisResponse {
            analysis: parse_analysis(&ollama_response.response),
            metadata: ResponseMetadata {
                provider: "ollama".to_string(),
                model: self.model.clone(),
                tokens_used,
                latency_ms,
            },
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
