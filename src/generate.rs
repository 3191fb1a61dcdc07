// src/generate.rs

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Text generation against a hosted language model. The prompt goes out,
/// the model's raw text comes back; no parsing or post-processing.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// `Generator` posting to an Ollama-compatible `generate` endpoint.
pub struct HttpGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl HttpGenerator {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });
        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("failed to reach the generation backend")?;
        if !resp.status().is_success() {
            bail!(
                "generation request failed: {} {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        let parsed: GenerateResponse = resp
            .json()
            .await
            .context("failed to parse generation response")?;
        Ok(parsed.response)
    }
}
