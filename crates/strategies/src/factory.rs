// In crates/strategies/src/factory.rs

use advisor::AdvisorHandle;
use risk::RiskManager;

use crate::types::AgentThresholds;
use crate::{IntradaySignalAgent, SignalAgent, SwingSignalAgent};

/// Builds the signal agent matching the thresholds' scenario.
pub fn create_signal_agent(
    thresholds: &AgentThresholds,
    risk_manager: Option<RiskManager>,
    advisor: Option<AdvisorHandle>,
) -> Box<dyn SignalAgent> {
    match thresholds {
        AgentThresholds::Intraday(t) => Box::new(
            IntradaySignalAgent::new(t.clone())
                .with_risk_manager(risk_manager)
                .with_advisor(advisor),
        ),
        AgentThresholds::Swing(t) => Box::new(
            SwingSignalAgent::new(t.clone())
                .with_risk_manager(risk_manager)
                .with_advisor(advisor),
        ),
    }
}
