// In crates/risk/src/agent.rs

use advisor::{AdvisorHandle, Prompt, first_present, number, string_list};
use core_types::{AccountState, Signal};
use serde_json::{Map, Value};
use tracing::info;

use crate::manager::RiskManager;
use crate::types::{PortfolioRisk, RiskAssessment, RiskParameters, RiskReport};
use crate::Result;

/// Drawdown (percent) beyond which trading stops.
pub const MAX_DRAWDOWN: f64 = 6.0;
/// Drawdown (percent) beyond which risk is reduced.
pub const DRAWDOWN_CAUTION: f64 = 4.0;
pub const CORRELATION_LIMIT: f64 = 0.65;
pub const REDUCED_RISK_FACTOR: f64 = 0.5;

const INSTRUCTIONS: &str = "You are the risk officer of an automated trading desk. \
Review the account snapshot and answer with the keys can_trade (bool), max_position_size, \
risk_adjustment_factor, violations (list of strings), recommendations (list of strings) and \
portfolio_risk (object with total_exposure, concentration_risk, correlation_risk, drawdown_risk). \
Trading must stop when drawdown exceeds {max_drawdown}%.";

/// Produces account-level risk reports on top of a [`RiskManager`].
#[derive(Debug, Clone)]
pub struct RiskAgent {
    manager: RiskManager,
    advisor: Option<AdvisorHandle>,
}

impl RiskAgent {
    pub fn new(parameters: RiskParameters) -> Self {
        Self { manager: RiskManager::new(parameters), advisor: None }
    }

    pub fn with_advisor(mut self, advisor: Option<AdvisorHandle>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn manager(&self) -> &RiskManager {
        &self.manager
    }

    pub fn assess_signal(&self, signal: &Signal, atr_value: Option<f64>) -> Result<RiskAssessment> {
        self.manager.assess_signal(signal, atr_value)
    }

    /// Asks the advisor for a report and falls back to the rule-based one on
    /// any failure.
    pub async fn analyze_account(&self, account: &AccountState) -> RiskReport {
        let Some(advisor) = &self.advisor else {
            return self.fallback_report(account);
        };

        let params = self.manager.parameters();
        let prompt = Prompt::new(INSTRUCTIONS.replace("{max_drawdown}", &MAX_DRAWDOWN.to_string()))
            .with("account_balance", account.account_balance.unwrap_or(params.account_balance))
            .with("risk_per_trade", params.risk_per_trade * 100.0)
            .with("current_positions", &account.current_positions)
            .with("open_positions", &account.open_positions)
            .with("correlation_data", &account.correlation_data)
            .with("drawdown_history", &account.drawdown_history);

        match advisor.ask_json(&prompt).await.and_then(|map| parse_report(&map)) {
            Ok(report) => {
                info!(advisor = advisor.name(), can_trade = report.can_trade, "Risk report from advisor");
                report
            }
            Err(err) => {
                advisor::log_fallback("risk", &err);
                self.fallback_report(account)
            }
        }
    }

    pub fn fallback_report(&self, account: &AccountState) -> RiskReport {
        let params = self.manager.parameters();
        let balance = account.account_balance.unwrap_or(params.account_balance);
        let exposures: Vec<f64> = account.exposure_positions().iter().map(|p| p.exposure()).collect();
        let correlation_risk = account.correlation_data.max.unwrap_or(0.0);
        let drawdown_risk = account.latest_drawdown();

        let can_trade = self.manager.ensure_can_trade(drawdown_risk, MAX_DRAWDOWN);
        let portfolio_risk = self.manager.score_portfolio_risk(&exposures, correlation_risk, drawdown_risk);

        let mut violations = Vec::new();
        if !can_trade {
            violations.push("Drawdown limit reached".to_string());
        }
        if correlation_risk > CORRELATION_LIMIT {
            violations.push("High correlation between positions".to_string());
        }

        let mut recommendations = Vec::new();
        if correlation_risk > CORRELATION_LIMIT {
            recommendations.push("Reduce exposure to correlated instruments".to_string());
        }
        if drawdown_risk > DRAWDOWN_CAUTION {
            recommendations.push("Pause trading until drawdown recovers".to_string());
        }

        let risk_adjustment_factor = if correlation_risk > CORRELATION_LIMIT || drawdown_risk > DRAWDOWN_CAUTION {
            REDUCED_RISK_FACTOR
        } else {
            1.0
        };

        RiskReport {
            can_trade,
            max_position_size: params.max_position.unwrap_or(balance * params.risk_per_trade),
            risk_adjustment_factor,
            violations,
            recommendations,
            portfolio_risk,
        }
    }
}

fn parse_report(map: &Map<String, Value>) -> advisor::Result<RiskReport> {
    let can_trade = match map.get("can_trade") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(advisor::Error::Malformed(format!("can_trade is not a bool: {other}")));
        }
    };

    let portfolio_risk = match map.get("portfolio_risk") {
        Some(Value::Object(risk)) => {
            let field = |key: &str| risk.get(key).and_then(number).unwrap_or(0.0);
            PortfolioRisk {
                total_exposure: field("total_exposure"),
                concentration_risk: field("concentration_risk"),
                correlation_risk: field("correlation_risk"),
                drawdown_risk: field("drawdown_risk"),
            }
        }
        _ => PortfolioRisk::default(),
    };

    Ok(RiskReport {
        can_trade,
        max_position_size: first_present(map, &["max_position_size"]).and_then(number).unwrap_or(0.0),
        risk_adjustment_factor: first_present(map, &["risk_adjustment_factor"]).and_then(number).unwrap_or(1.0),
        violations: string_list(map.get("violations")),
        recommendations: string_list(map.get("recommendations")),
        portfolio_risk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor::StaticAdvisor;
    use core_types::{CorrelationData, PositionSnapshot};
    use std::sync::Arc;
    use std::time::Duration;

    fn agent() -> RiskAgent {
        RiskAgent::new(RiskParameters { account_balance: 4000.0, ..Default::default() })
    }

    fn handle(reply: &str) -> Option<AdvisorHandle> {
        Some(AdvisorHandle::new(Arc::new(StaticAdvisor::new(reply)), Duration::from_secs(1)))
    }

    #[test]
    fn calm_account_can_trade_at_full_risk() {
        let account = AccountState {
            current_positions: vec![PositionSnapshot { quantity: Some(2.0), price: Some(50.0), ..Default::default() }],
            ..AccountState::with_balance(4000.0)
        };
        let report = agent().fallback_report(&account);
        assert!(report.can_trade);
        assert_eq!(report.risk_adjustment_factor, 1.0);
        assert_eq!(report.max_position_size, 40.0);
        assert_eq!(report.portfolio_risk.total_exposure, 100.0);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn deep_drawdown_blocks_trading() {
        let account = AccountState {
            drawdown_history: vec![2.0, 6.5],
            correlation_data: CorrelationData { max: Some(0.8) },
            ..AccountState::with_balance(4000.0)
        };
        let report = agent().fallback_report(&account);
        assert!(!report.can_trade);
        assert_eq!(report.risk_adjustment_factor, REDUCED_RISK_FACTOR);
        assert_eq!(
            report.violations,
            vec!["Drawdown limit reached".to_string(), "High correlation between positions".to_string()]
        );
        assert_eq!(report.recommendations.len(), 2);
    }

    #[tokio::test]
    async fn advisor_report_is_parsed() {
        let reply = r#"{"can_trade": false, "max_position_size": "3.5", "violations": ["news"], "portfolio_risk": {"total_exposure": 10}}"#;
        let report = agent().with_advisor(handle(reply)).analyze_account(&AccountState::default()).await;
        assert!(!report.can_trade);
        assert_eq!(report.max_position_size, 3.5);
        assert_eq!(report.risk_adjustment_factor, 1.0);
        assert_eq!(report.violations, vec!["news".to_string()]);
        assert_eq!(report.portfolio_risk.total_exposure, 10.0);
    }

    #[tokio::test]
    async fn garbage_from_the_advisor_uses_the_fallback() {
        let account = AccountState::with_balance(4000.0);
        let expected = agent().fallback_report(&account);
        let report = agent().with_advisor(handle("definitely not json")).analyze_account(&account).await;
        assert_eq!(report, expected);
    }
}
