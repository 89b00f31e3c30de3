// In crates/advisor/src/ollama.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Advisor, Error, Result};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Advisor backed by an Ollama server's `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaAdvisor {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaAdvisor {
    pub fn new(base_url: &str, model: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Advisor for OllamaAdvisor {
    fn name(&self) -> &str {
        "ollama"
    }

    fn invoke(&self, _prompt: &str) -> Result<String> {
        // The HTTP client is async-only; callers inside the runtime use `invoke_async`.
        Err(Error::Unavailable("ollama advisor only supports async invocation".to_string()))
    }

    async fn invoke_async(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest { model: &self.model, prompt, stream: false, format: "json" };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Unavailable(format!("status {}", response.status())));
        }

        let body = response.json::<GenerateResponse>().await?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let advisor = OllamaAdvisor::new("http://localhost:11434/", "gpt-oss:120b-cloud", Duration::from_secs(5)).unwrap();
        assert_eq!(advisor.base_url, "http://localhost:11434");
        assert_eq!(advisor.model(), "gpt-oss:120b-cloud");
    }

    #[test]
    fn blocking_invocation_is_unavailable() {
        let advisor = OllamaAdvisor::new("http://localhost:11434", "m", Duration::from_secs(1)).unwrap();
        assert!(matches!(advisor.invoke("hi"), Err(Error::Unavailable(_))));
    }
}
