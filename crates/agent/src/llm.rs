use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cursus_core::config::NluConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, options: CompletionOptions) -> Result<String>;
    async fn health(&self) -> Result<()>;
}

/// Client for a local Ollama endpoint. All connection settings come from
/// the explicit [`NluConfig`]; nothing is read from the environment here.
pub struct OllamaClient {
    http: reqwest::Client,
    config: NluConfig,
}

impl OllamaClient {
    pub fn new(config: NluConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building nlu http client")?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str, options: CompletionOptions) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let response = self
            .http
            .post(self.endpoint("api/generate"))
            .json(&request)
            .send()
            .await
            .context("sending completion request")?
            .error_for_status()
            .context("completion request rejected")?;

        let body: GenerateResponse =
            response.json().await.context("decoding completion response")?;
        Ok(body.response)
    }

    async fn health(&self) -> Result<()> {
        self.http
            .get(self.endpoint("api/tags"))
            .send()
            .await
            .context("reaching nlu endpoint")?
            .error_for_status()
            .context("nlu endpoint unhealthy")?;
        Ok(())
    }
}
