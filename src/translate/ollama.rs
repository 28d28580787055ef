use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, SubtransError};
use super::TranslationBackend;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Client for the ollama HTTP API. Holds one connection pool that is reused
/// by every request of a run.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
}

impl OllamaClient {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("subtrans/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout_secs.filter(|secs| *secs > 0) {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single non-streaming generate call
    pub async fn try_generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubtransError::ServiceStatus(status.as_u16()));
        }

        let body: GenerateResponse = response.json().await?;
        debug!("Raw ollama response: {}", body.response);
        Ok(body.response)
    }

    /// Check if ollama is reachable and the model is pulled
    pub async fn check_availability(&self, model: &str) -> Result<()> {
        let url = format!("{}/api/show", self.endpoint);

        let response = self.client
            .post(&url)
            .json(&json!({ "name": model }))
            .send()
            .await
            .map_err(|e| SubtransError::Translation(format!("Failed to connect to ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", model);
            Ok(())
        } else {
            Err(SubtransError::Translation(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                model, model
            )))
        }
    }
}

/// Render a failed request the way it appears in the translated file
pub fn error_marker(error: &SubtransError) -> String {
    match error {
        SubtransError::ServiceStatus(code) => format!("Error: {}", code),
        other => format!("Error: {}", other),
    }
}

#[async_trait]
impl TranslationBackend for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str) -> String {
        match self.try_generate(model, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Translation request failed: {}", e);
                error_marker(&e)
            }
        }
    }
}
