// In crates/engine/src/lib.rs

//! The decision cycle: governance, feature computation, parameter
//! adaptation, signal generation, risk review and execution planning.

pub mod adapt;
pub mod cycle;
pub mod error;
pub mod machine;
pub mod orchestrator;

use std::sync::Arc;
use std::time::Duration;

use advisor::{AdvisorHandle, OllamaAdvisor};
use app_config::AdvisorSettings;

pub use cycle::{CycleInput, CycleResult, CycleStage};
pub use error::{Error, Result};
pub use machine::{AgentBundle, DecisionStateMachine};
pub use orchestrator::{Orchestrator, RoutedCycle};

/// Builds the configured advisor, or `None` when it is disabled.
pub fn build_advisor(settings: &AdvisorSettings) -> Result<Option<AdvisorHandle>> {
    if !settings.enabled {
        return Ok(None);
    }
    let timeout = Duration::from_millis(settings.timeout_ms);
    let advisor = OllamaAdvisor::new(&settings.base_url, &settings.model, timeout)?;
    tracing::info!(model = %settings.model, url = %settings.base_url, "Advisor enabled");
    Ok(Some(AdvisorHandle::new(Arc::new(advisor), timeout)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_advisor_is_not_built() {
        assert!(build_advisor(&AdvisorSettings::default()).unwrap().is_none());
    }

    #[test]
    fn enabled_advisor_carries_the_timeout() {
        let settings = AdvisorSettings { enabled: true, timeout_ms: 250, ..Default::default() };
        let handle = build_advisor(&settings).unwrap().unwrap();
        assert_eq!(handle.timeout(), Duration::from_millis(250));
    }
}
