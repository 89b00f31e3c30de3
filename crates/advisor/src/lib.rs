// In crates/advisor/src/lib.rs

//! The optional generative advisor consulted by the decision agents.
//!
//! The advisor only ever sees rendered text and returns raw text. Parsing the
//! reply is the job of the consuming agent, which always has a deterministic
//! fallback ready when the advisor fails, times out or talks nonsense.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub mod error;
pub mod ollama;
pub mod prompt;

pub use error::{Error, Result};
pub use ollama::OllamaAdvisor;
pub use prompt::{Prompt, extract_json_object, first_present, number, string_list};

/// A text-in, text-out decision capability.
#[async_trait]
pub trait Advisor: Send + Sync {
    fn name(&self) -> &str;

    /// Blocking invocation.
    fn invoke(&self, prompt: &str) -> Result<String>;

    /// Non-blocking invocation. Defaults to the blocking path.
    async fn invoke_async(&self, prompt: &str) -> Result<String> {
        self.invoke(prompt)
    }
}

/// An advisor that always answers with the same text. Handy for dry runs.
#[derive(Debug, Clone)]
pub struct StaticAdvisor {
    response: String,
}

impl StaticAdvisor {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

impl Advisor for StaticAdvisor {
    fn name(&self) -> &str {
        "static"
    }

    fn invoke(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}

/// Shared advisor plus the deadline applied to every call.
#[derive(Clone)]
pub struct AdvisorHandle {
    inner: Arc<dyn Advisor>,
    timeout: Duration,
}

impl std::fmt::Debug for AdvisorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorHandle")
            .field("advisor", &self.inner.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AdvisorHandle {
    pub fn new(advisor: Arc<dyn Advisor>, timeout: Duration) -> Self {
        Self { inner: advisor, timeout }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends the rendered prompt and waits at most `timeout` for the reply.
    pub async fn ask(&self, prompt: &Prompt) -> Result<String> {
        let rendered = prompt.render();
        match tokio::time::timeout(self.timeout, self.inner.invoke_async(&rendered)).await {
            Ok(reply) => reply,
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }

    /// Like [`ask`](Self::ask), then extracts the JSON object from the reply.
    pub async fn ask_json(&self, prompt: &Prompt) -> Result<Map<String, Value>> {
        let raw = self.ask(prompt).await?;
        debug!(advisor = self.name(), chars = raw.len(), "Advisor replied");
        extract_json_object(&raw)
    }
}

/// Logs an advisor failure in a uniform way before the caller falls back.
pub fn log_fallback(component: &str, err: &Error) {
    warn!(component, error = %err, "Advisor failed, using deterministic fallback");
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowAdvisor;

    #[async_trait]
    impl Advisor for SlowAdvisor {
        fn name(&self) -> &str {
            "slow"
        }

        fn invoke(&self, _prompt: &str) -> Result<String> {
            Err(Error::Unavailable("blocking calls not supported".to_string()))
        }

        async fn invoke_async(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("{}".to_string())
        }
    }

    #[tokio::test]
    async fn static_advisor_goes_through_the_default_async_path() {
        let handle = AdvisorHandle::new(Arc::new(StaticAdvisor::new(r#"{"ok": 1}"#)), Duration::from_secs(1));
        let map = handle.ask_json(&Prompt::new("ping")).await.unwrap();
        assert_eq!(map["ok"], 1);
    }

    #[tokio::test]
    async fn slow_advisor_times_out() {
        let handle = AdvisorHandle::new(Arc::new(SlowAdvisor), Duration::from_millis(20));
        let err = handle.ask(&Prompt::new("ping")).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }
}
