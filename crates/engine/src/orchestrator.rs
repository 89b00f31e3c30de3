// In crates/engine/src/orchestrator.rs

use std::sync::Arc;

use advisor::AdvisorHandle;
use app_config::Settings;
use core_types::Scenario;
use futures::future;
use governance::{GovernanceController, GovernanceDecision};
use serde::Serialize;
use tracing::info;

use crate::cycle::{CycleInput, CycleResult};
use crate::machine::DecisionStateMachine;
use crate::Result;

/// Outcome of a cycle whose scenario was picked by governance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedCycle {
    pub scenario: Scenario,
    pub decision: GovernanceDecision,
    pub result: CycleResult,
}

/// Owns one machine per scenario and lets governance choose between them.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    governance: GovernanceController,
    intraday: Arc<DecisionStateMachine>,
    swing: Arc<DecisionStateMachine>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), None)
    }
}

impl Orchestrator {
    pub fn from_settings(settings: &Settings, advisor: Option<AdvisorHandle>) -> Self {
        Self {
            governance: GovernanceController::new(settings.governance).with_advisor(advisor.clone()),
            intraday: Arc::new(DecisionStateMachine::from_settings(Scenario::Intraday, settings, advisor.clone())),
            swing: Arc::new(DecisionStateMachine::from_settings(Scenario::Swing, settings, advisor)),
        }
    }

    pub fn machine(&self, scenario: Scenario) -> Arc<DecisionStateMachine> {
        match scenario {
            Scenario::Intraday => Arc::clone(&self.intraday),
            Scenario::Swing => Arc::clone(&self.swing),
        }
    }

    /// Runs the cycle on an explicitly chosen scenario.
    pub async fn evaluate(&self, scenario: Scenario, input: CycleInput) -> Result<CycleResult> {
        self.machine(scenario).run(input).await
    }

    /// Asks governance (without a preference) which scenario fits the account
    /// and runs that machine.
    pub async fn evaluate_auto(&self, input: CycleInput) -> Result<RoutedCycle> {
        let decision = self.governance.decide(&input.account, None).await;
        info!(symbol = %input.symbol, scenario = %decision.scenario, "Routing cycle");
        let result = self.evaluate(decision.scenario, input).await?;
        Ok(RoutedCycle { scenario: decision.scenario, decision, result })
    }

    /// Runs independent cycles concurrently, one per input.
    pub async fn evaluate_batch(&self, inputs: Vec<CycleInput>) -> Vec<Result<RoutedCycle>> {
        future::join_all(inputs.into_iter().map(|input| self.evaluate_auto(input))).await
    }
}
