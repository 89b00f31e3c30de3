// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AdvisorSettings, AppSettings, ScenarioProfile, Settings, ThresholdSettings};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a `config/base.toml` file, if present.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
///
/// Every field has a default, so a missing configuration directory is fine.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name("config/base").required(false))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        // e.g. `APP__ADVISOR__ENABLED=true`. The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").prefix_separator("__").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use core_types::OrderType;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_configuration_uses_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.log_level, "info");
        assert_eq!(settings.governance.swing_threshold, 5000.0);
        assert_eq!(settings.intraday, ScenarioProfile::intraday());
        assert_eq!(settings.swing, ScenarioProfile::swing());
        assert_eq!(settings.indicators.ema_slow, 200);
        assert!(!settings.advisor.enabled);
        assert_eq!(settings.execution.order_type, OrderType::Market);
    }

    #[test]
    fn sections_override_individual_fields() {
        let settings = parse(
            r#"
            [governance]
            swing_threshold = 8000.0

            [thresholds.swing]
            max_positions = 4

            [advisor]
            enabled = true
            timeout_ms = 500

            [execution]
            order_type = "limit"
            slippage = 0.2
            "#,
        );
        assert_eq!(settings.governance.swing_threshold, 8000.0);
        assert_eq!(settings.governance.caution_threshold, 3000.0);
        assert_eq!(settings.thresholds.swing.max_positions, 4);
        assert_eq!(settings.thresholds.swing.donchian_high, 55);
        assert!(settings.advisor.enabled);
        assert_eq!(settings.advisor.timeout_ms, 500);
        assert_eq!(settings.advisor.model, "gpt-oss:120b-cloud");
        assert_eq!(settings.execution.order_type, OrderType::Limit);
    }
}
