// In crates/execution/src/agent.rs

use advisor::{AdvisorHandle, Prompt, number, string_list};
use chrono::{DateTime, NaiveDateTime, Utc};
use core_types::{AccountState, OrderRequest, OrderType, Quote, Signal};
use risk::{RiskAssessment, RiskReport};
use serde_json::{Map, Value};
use tracing::info;

use crate::planner::ExecutionPlanner;
use crate::types::{ExecutionPlan, ExecutionReport, PENDING_STATUS};
use crate::Result;

const DEFAULT_COMMENT: &str = "ATS";

const INSTRUCTIONS: &str = "You supervise order execution for an automated trading desk. Review the \
planned trade against the account, market and risk context and answer with the keys \
execution_status, order_id, executed_price, executed_volume, sl_price, tp_price, execution_time \
(ISO 8601), errors and warnings (lists of strings).";

/// Prepares trades for execution and produces monitoring reports.
#[derive(Debug, Clone)]
pub struct ExecutionAgent {
    planner: ExecutionPlanner,
    advisor: Option<AdvisorHandle>,
}

impl ExecutionAgent {
    pub fn new(planner: ExecutionPlanner) -> Self {
        Self { planner, advisor: None }
    }

    pub fn with_advisor(mut self, advisor: Option<AdvisorHandle>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn planner(&self) -> &ExecutionPlanner {
        &self.planner
    }

    pub fn build_plan(
        &self,
        signal: &Signal,
        quote: Option<&Quote>,
        atr_value: Option<f64>,
        assessment: Option<RiskAssessment>,
    ) -> Result<ExecutionPlan> {
        self.planner.create_plan(signal, quote, atr_value, assessment)
    }

    /// Market orders carry no price; every other order type is priced at the
    /// planned entry.
    pub fn to_order_request(&self, plan: &ExecutionPlan) -> Result<OrderRequest> {
        let trade = &plan.trade;
        let order = OrderRequest {
            symbol: trade.symbol.clone(),
            side: trade.side,
            quantity: trade.quantity,
            order_type: plan.order_type,
            price: (plan.order_type != OrderType::Market).then_some(trade.entry_price),
            stop_loss: trade.stop_loss,
            take_profit: trade.take_profit,
            comment: if trade.comment.is_empty() { DEFAULT_COMMENT.to_string() } else { trade.comment.clone() },
        };
        order.validate()?;
        Ok(order)
    }

    pub async fn report(
        &self,
        plan: &ExecutionPlan,
        account: &AccountState,
        market: &Value,
        risk_limits: Option<&RiskReport>,
    ) -> ExecutionReport {
        let Some(advisor) = &self.advisor else {
            return self.fallback_report(plan);
        };

        let prompt = Prompt::new(INSTRUCTIONS)
            .with("signal", &plan.trade)
            .with("account_info", account)
            .with("market_data", market)
            .with("risk_limits", risk_limits)
            .with("execution_history", &account.execution_history);

        match advisor.ask_json(&prompt).await {
            Ok(map) => {
                let report = parse_report(&map, plan);
                info!(advisor = advisor.name(), status = %report.execution_status, "Execution report from advisor");
                report
            }
            Err(err) => {
                advisor::log_fallback("execution", &err);
                self.fallback_report(plan)
            }
        }
    }

    pub fn fallback_report(&self, plan: &ExecutionPlan) -> ExecutionReport {
        ExecutionReport {
            execution_status: PENDING_STATUS.to_string(),
            order_id: None,
            executed_price: None,
            executed_volume: None,
            sl_price: plan.trade.stop_loss,
            tp_price: plan.trade.take_profit,
            execution_time: Utc::now(),
            errors: Vec::new(),
            warnings: Vec::new(),
            trade: plan.trade.clone(),
        }
    }
}

fn parse_time(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc()))
        .ok()
}

fn parse_report(map: &Map<String, Value>, plan: &ExecutionPlan) -> ExecutionReport {
    let trade = &plan.trade;
    let text = |key: &str| match map.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let price = |key: &str| map.get(key).and_then(number);

    ExecutionReport {
        execution_status: text("execution_status").unwrap_or_else(|| PENDING_STATUS.to_string()),
        order_id: text("order_id"),
        executed_price: price("executed_price"),
        executed_volume: price("executed_volume"),
        sl_price: price("sl_price").or(trade.stop_loss),
        tp_price: price("tp_price").or(trade.take_profit),
        execution_time: parse_time(map.get("execution_time")).unwrap_or_else(Utc::now),
        errors: string_list(map.get("errors")),
        warnings: string_list(map.get("warnings")),
        trade: trade.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor::StaticAdvisor;
    use core_types::{Side, SignalAction, Symbol, Timeframe};
    use risk::{RiskManager, RiskParameters};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::types::ExecutionSettings;

    fn plan(agent: &ExecutionAgent) -> ExecutionPlan {
        let mut signal = Signal::new(Symbol::from("XAUUSD"), Timeframe::M15, SignalAction::Enter, 0.7, "trend breakout");
        signal.side = Some(Side::Buy);
        signal.entry_price = Some(2010.0);
        agent.build_plan(&signal, None, Some(5.0), None).unwrap()
    }

    fn agent() -> ExecutionAgent {
        ExecutionAgent::new(ExecutionPlanner::new(RiskManager::new(RiskParameters::default())))
    }

    #[tokio::test]
    async fn fallback_report_is_pending_with_trade_brackets() {
        let agent = agent();
        let plan = plan(&agent);
        let report = agent.report(&plan, &AccountState::default(), &json!({}), None).await;
        assert_eq!(report.execution_status, PENDING_STATUS);
        assert_eq!(report.sl_price, plan.trade.stop_loss);
        assert_eq!(report.tp_price, plan.trade.take_profit);
        assert!(report.order_id.is_none());
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn advisor_report_is_read_leniently() {
        let reply = r#"{"execution_status": "filled", "order_id": 42, "executed_price": "2010.4",
            "execution_time": "2024-05-01T10:00:00", "warnings": ["partial fill"]}"#;
        let handle = AdvisorHandle::new(Arc::new(StaticAdvisor::new(reply)), Duration::from_secs(1));
        let agent = agent().with_advisor(Some(handle));
        let plan = plan(&agent);
        let report = agent.report(&plan, &AccountState::default(), &json!({}), None).await;
        assert_eq!(report.execution_status, "filled");
        assert_eq!(report.order_id.as_deref(), Some("42"));
        assert_eq!(report.executed_price, Some(2010.4));
        assert_eq!(report.sl_price, plan.trade.stop_loss);
        assert_eq!(report.execution_time.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(report.warnings, vec!["partial fill".to_string()]);
    }

    #[tokio::test]
    async fn unusable_advisor_reply_falls_back() {
        let handle = AdvisorHandle::new(Arc::new(StaticAdvisor::new("not json")), Duration::from_secs(1));
        let agent = agent().with_advisor(Some(handle));
        let plan = plan(&agent);
        let report = agent.report(&plan, &AccountState::default(), &json!({}), None).await;
        assert_eq!(report.execution_status, PENDING_STATUS);
    }

    #[test]
    fn order_request_prices_only_non_market_orders() {
        let market = agent();
        let order = market.to_order_request(&plan(&market)).unwrap();
        assert_eq!(order.price, None);
        assert_eq!(order.comment, "trend breakout");

        let limit = ExecutionAgent::new(
            ExecutionPlanner::new(RiskManager::new(RiskParameters::default()))
                .with_settings(ExecutionSettings { order_type: OrderType::Limit, slippage: 0.1 }),
        );
        let plan = plan(&limit);
        assert_eq!(plan.slippage, 0.1);
        let order = limit.to_order_request(&plan).unwrap();
        assert_eq!(order.price, Some(2010.0));
    }
}
