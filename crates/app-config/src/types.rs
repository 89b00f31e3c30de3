// In crates/app-config/src/types.rs

use serde::Deserialize;

use execution::ExecutionSettings;
use features::IndicatorSettings;
use governance::GovernanceSettings;
use strategies::{IntradayThresholds, SwingThresholds};

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    pub governance: GovernanceSettings,
    pub indicators: IndicatorSettings,
    /// Baseline risk posture for the intraday scenario.
    pub intraday: ScenarioProfile,
    /// Baseline risk posture for the swing scenario.
    pub swing: ScenarioProfile,
    /// Starting signal thresholds before governance and volatility nudges.
    pub thresholds: ThresholdSettings,
    pub advisor: AdvisorSettings,
    pub execution: ExecutionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            governance: GovernanceSettings::default(),
            indicators: IndicatorSettings::default(),
            intraday: ScenarioProfile::intraday(),
            swing: ScenarioProfile::swing(),
            thresholds: ThresholdSettings::default(),
            advisor: AdvisorSettings::default(),
            execution: ExecutionSettings::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self { environment: "development".to_string(), log_level: "info".to_string() }
    }
}

/// Account defaults and risk-model constants for one scenario.
///
/// A section that is only partly filled in takes the remaining fields from
/// the intraday profile.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ScenarioProfile {
    /// Used when the account snapshot has no balance.
    pub default_balance: f64,
    pub contract_size: f64,
    pub min_position: f64,
    pub max_position: f64,
    pub base_risk_per_trade: f64,
    pub reward_risk: f64,
    pub atr_multiplier: f64,
}

impl ScenarioProfile {
    pub fn intraday() -> Self {
        Self {
            default_balance: 10_000.0,
            contract_size: 1.0,
            min_position: 0.01,
            max_position: 5.0,
            base_risk_per_trade: 0.01,
            reward_risk: 2.0,
            atr_multiplier: 1.5,
        }
    }

    pub fn swing() -> Self {
        Self {
            default_balance: 15_000.0,
            contract_size: 1.0,
            min_position: 0.1,
            max_position: 8.0,
            base_risk_per_trade: 0.008,
            reward_risk: 2.5,
            atr_multiplier: 2.0,
        }
    }
}

impl Default for ScenarioProfile {
    fn default() -> Self {
        Self::intraday()
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ThresholdSettings {
    pub intraday: IntradayThresholds,
    pub swing: SwingThresholds,
}

/// Connection details for the optional generative advisor.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AdvisorSettings {
    /// When false every component uses its rule-based fallback.
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    /// Upper bound for a single advisor call.
    pub timeout_ms: u64,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:11434".to_string(),
            model: "gpt-oss:120b-cloud".to_string(),
            timeout_ms: 30_000,
        }
    }
}
