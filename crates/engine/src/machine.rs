// In crates/engine/src/machine.rs

use advisor::AdvisorHandle;
use app_config::{ScenarioProfile, Settings};
use core_types::{AccountState, Bar, FeatureRow, OrderRequest, Quote, Scenario, Signal, SignalAction, Symbol, Timeframe};
use execution::{ExecutionAgent, ExecutionPlan, ExecutionPlanner, ExecutionReport, ExecutionSettings};
use features::{IndicatorSettings, SummaryStats, compute_feature_set};
use governance::{GovernanceController, GovernanceDecision};
use risk::{RiskAgent, RiskAssessment, RiskManager, RiskParameters, RiskReport};
use serde_json::json;
use strategies::{AgentThresholds, SignalAgent, SignalContext, create_signal_agent};
use tracing::{debug, info, warn};

use crate::adapt::{self, Adjustments};
use crate::cycle::{CycleInput, CycleResult, CycleStage};
use crate::Result;

/// The components one cycle works with. Built in IDLE, rebuilt after SETUP
/// adapts the parameters, dropped at SUMMARY.
pub struct AgentBundle {
    pub thresholds: AgentThresholds,
    pub risk_parameters: RiskParameters,
    pub signal_agent: Box<dyn SignalAgent>,
    pub risk_agent: RiskAgent,
    pub execution_agent: ExecutionAgent,
}

impl AgentBundle {
    fn assemble(
        thresholds: AgentThresholds,
        risk_parameters: RiskParameters,
        execution: ExecutionSettings,
        advisor: Option<&AdvisorHandle>,
    ) -> Self {
        let manager = RiskManager::new(risk_parameters.clone());
        let signal_agent = create_signal_agent(&thresholds, Some(manager.clone()), advisor.cloned());
        let risk_agent = RiskAgent::new(risk_parameters.clone()).with_advisor(advisor.cloned());
        let execution_agent = ExecutionAgent::new(ExecutionPlanner::new(manager).with_settings(execution))
            .with_advisor(advisor.cloned());
        Self { thresholds, risk_parameters, signal_agent, risk_agent, execution_agent }
    }
}

/// Everything threaded through the stages of a single cycle.
struct CycleState {
    symbol: Symbol,
    timeframe: Timeframe,
    account: AccountState,
    bars: Vec<Bar>,
    quote: Option<Quote>,
    governance: GovernanceDecision,
    bundle: AgentBundle,
    features: FeatureRow,
    stats: SummaryStats,
    adjustments: Adjustments,
    signal: Option<Signal>,
    risk_assessment: Option<RiskAssessment>,
    risk_report: Option<RiskReport>,
    execution_plan: Option<ExecutionPlan>,
    order_request: Option<OrderRequest>,
    execution_report: Option<ExecutionReport>,
    partial_take_ratio: Option<f64>,
    states: Vec<CycleStage>,
    logs: Vec<String>,
}

impl CycleState {
    fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    fn into_result(self, scenario: Scenario) -> CycleResult {
        let signal = self.signal.unwrap_or_else(|| {
            Signal::new(
                self.symbol.clone(),
                self.timeframe,
                SignalAction::Skip,
                0.0,
                "No signal was produced",
            )
        });
        CycleResult {
            symbol: self.symbol,
            timeframe: self.timeframe,
            scenario,
            governance: self.governance,
            features: self.features,
            stats: self.stats,
            adjustments: self.adjustments,
            thresholds: self.bundle.thresholds,
            latest_quote: self.quote,
            signal,
            risk_assessment: self.risk_assessment,
            risk_report: self.risk_report,
            execution_plan: self.execution_plan,
            order_request: self.order_request,
            execution_report: self.execution_report,
            partial_take_ratio: self.partial_take_ratio,
            states: self.states,
            logs: self.logs,
        }
    }
}

/// Runs IDLE → SETUP → ENTER → (MANAGE → EXIT | skip) → SUMMARY for one
/// scenario.
///
/// The machine itself holds only configuration and can be shared between
/// concurrent cycles; each cycle builds its own [`AgentBundle`].
#[derive(Debug, Clone)]
pub struct DecisionStateMachine {
    scenario: Scenario,
    profile: ScenarioProfile,
    thresholds: AgentThresholds,
    indicators: IndicatorSettings,
    execution: ExecutionSettings,
    governance: GovernanceController,
    advisor: Option<AdvisorHandle>,
}

impl DecisionStateMachine {
    /// A machine with default settings and no advisor.
    pub fn new(scenario: Scenario) -> Self {
        Self::from_settings(scenario, &Settings::default(), None)
    }

    pub fn from_settings(scenario: Scenario, settings: &Settings, advisor: Option<AdvisorHandle>) -> Self {
        let (profile, thresholds) = match scenario {
            Scenario::Intraday => (settings.intraday, AgentThresholds::Intraday(settings.thresholds.intraday.clone())),
            Scenario::Swing => (settings.swing, AgentThresholds::Swing(settings.thresholds.swing.clone())),
        };
        Self {
            scenario,
            profile,
            thresholds,
            indicators: settings.indicators,
            execution: settings.execution,
            governance: GovernanceController::new(settings.governance).with_advisor(advisor.clone()),
            advisor,
        }
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Runs one full cycle. Only structural errors (a signal without side or
    /// price, an invalid stop or target) abort it.
    pub async fn run(&self, input: CycleInput) -> Result<CycleResult> {
        let mut state = self.idle(input).await;
        let mut stage = CycleStage::Setup;

        loop {
            state.states.push(stage);
            info!(symbol = %state.symbol, scenario = %self.scenario, %stage, "Cycle stage");
            stage = match stage {
                CycleStage::Idle => unreachable!("IDLE runs before the stage loop"),
                CycleStage::Setup => {
                    self.setup(&mut state)?;
                    CycleStage::Enter
                }
                CycleStage::Enter => {
                    self.enter(&mut state).await?;
                    if state.signal.as_ref().is_some_and(Signal::requires_management) {
                        CycleStage::Manage
                    } else {
                        CycleStage::Summary
                    }
                }
                CycleStage::Manage => {
                    self.manage(&mut state).await?;
                    CycleStage::Exit
                }
                CycleStage::Exit => {
                    self.exit(&mut state).await?;
                    CycleStage::Summary
                }
                CycleStage::Summary => return Ok(state.into_result(self.scenario)),
            };
        }
    }

    async fn idle(&self, input: CycleInput) -> CycleState {
        info!(symbol = %input.symbol, scenario = %self.scenario, stage = %CycleStage::Idle, "Cycle stage");
        let decision = self.governance.decide(&input.account, Some(self.scenario)).await;

        let default_timeframe = Timeframe::parse_or(
            decision.recommended_timeframe.as_deref(),
            self.scenario.default_timeframe(),
        );
        let timeframe = Timeframe::parse_or(input.timeframe.as_deref(), default_timeframe);

        let adjustments = decision.adjustments.clone();
        let risk_parameters = adapt::baseline_risk_parameters(&self.profile, &input.account, &adjustments);
        let thresholds = self.thresholds.apply(&adjustments);
        let bundle = AgentBundle::assemble(thresholds, risk_parameters, self.execution, self.advisor.as_ref());

        let logs = vec![format!("Governance scenario: {}", decision.scenario)];
        CycleState {
            symbol: input.symbol,
            timeframe,
            account: input.account,
            bars: input.bars,
            quote: input.quote,
            governance: decision,
            bundle,
            features: FeatureRow::default(),
            stats: SummaryStats::default(),
            adjustments,
            signal: None,
            risk_assessment: None,
            risk_report: None,
            execution_plan: None,
            order_request: None,
            execution_report: None,
            partial_take_ratio: None,
            states: vec![CycleStage::Idle],
            logs,
        }
    }

    fn setup(&self, state: &mut CycleState) -> Result<()> {
        if state.bars.is_empty() {
            state.log("Not enough market data to compute indicators");
            return Ok(());
        }

        let feature_set = match compute_feature_set(&state.bars, &self.indicators) {
            Ok(set) => set,
            Err(features::Error::MissingColumns(columns)) => {
                warn!(symbol = %state.symbol, ?columns, "Bars are missing columns; continuing without features");
                state.log(format!("Market data is missing columns: {}", columns.join(", ")));
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let features = feature_set.latest();
        let stats = feature_set.stats;
        let bundle = &state.bundle;
        let nudges = adapt::derive_nudges(&stats, &bundle.thresholds, &bundle.risk_parameters);
        let adjustments = adapt::merge_adjustments(&state.adjustments, &nudges);
        debug!(?nudges, ?adjustments, "Cycle adjustments derived");

        let thresholds = bundle.thresholds.apply(&adjustments);
        let risk_parameters = adapt::adjust_risk_parameters(&bundle.risk_parameters, &adjustments, self.scenario);
        state.bundle = AgentBundle::assemble(thresholds, risk_parameters, self.execution, self.advisor.as_ref());

        state.features = features;
        state.stats = stats;
        state.adjustments = adjustments;
        state.log("Technical indicators updated");
        Ok(())
    }

    async fn enter(&self, state: &mut CycleState) -> Result<()> {
        let ctx = SignalContext {
            symbol: &state.symbol,
            timeframe: state.timeframe,
            features: &state.features,
            stats: &state.stats,
            account: &state.account,
        };
        let mut signal = state.bundle.signal_agent.generate_signal(&ctx).await?;
        signal.apply_feature_defaults(&state.features);

        info!(symbol = %state.symbol, action = %signal.action, side = ?signal.side, confidence = signal.confidence, "Signal generated");
        state.log(format!("Signal generated: {}", signal.action));
        state.signal = Some(signal);
        Ok(())
    }

    async fn manage(&self, state: &mut CycleState) -> Result<()> {
        let Some(signal) = &state.signal else {
            return Ok(());
        };
        let bundle = &state.bundle;
        let assessment = bundle.risk_agent.assess_signal(signal, state.features.atr)?;
        let report = bundle.risk_agent.analyze_account(&state.account).await;

        if let AgentThresholds::Intraday(thresholds) = &mut state.bundle.thresholds {
            let partial = assessment.reward_ratio.clamp(0.5, 1.5);
            thresholds.partial_r = partial;
            state.partial_take_ratio = Some(partial);
        }

        debug!(?assessment, can_trade = report.can_trade, "Risk reviewed");
        state.risk_assessment = Some(assessment);
        state.risk_report = Some(report);
        state.log("Risk parameters updated");
        Ok(())
    }

    async fn exit(&self, state: &mut CycleState) -> Result<()> {
        let Some(signal) = &state.signal else {
            return Ok(());
        };
        let agent = &state.bundle.execution_agent;
        let plan = agent.build_plan(signal, state.quote.as_ref(), state.features.atr, None)?;
        let order = agent.to_order_request(&plan)?;
        let market = json!({ "features": &state.features, "stats": &state.stats });
        let report = agent
            .report(&plan, &state.account, &market, state.risk_report.as_ref())
            .await;

        info!(
            symbol = %plan.trade.symbol,
            side = %plan.trade.side,
            entry = plan.trade.entry_price,
            quantity = plan.trade.quantity,
            status = %report.execution_status,
            "Execution plan prepared"
        );
        state.execution_plan = Some(plan);
        state.order_request = Some(order);
        state.execution_report = Some(report);
        state.log("Execution plan prepared");
        Ok(())
    }
}
