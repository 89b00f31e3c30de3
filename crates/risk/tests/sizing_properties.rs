// In crates/risk/tests/sizing_properties.rs

//! Property tests for position sizing and trade assessment.

use core_types::Side;
use proptest::prelude::*;
use risk::{RiskManager, RiskParameters};

fn manager(balance: f64, risk_per_trade: f64) -> RiskManager {
    RiskManager::new(RiskParameters {
        account_balance: balance,
        risk_per_trade,
        min_position: 0.01,
        max_position: None,
        ..Default::default()
    })
}

proptest! {
    #[test]
    fn wider_stops_never_increase_size(
        balance in 1_000.0..100_000.0_f64,
        risk_per_trade in 0.001..0.05_f64,
        entry in 10.0..5_000.0_f64,
        near in 0.01..50.0_f64,
        extra in 0.0..50.0_f64,
        long in any::<bool>(),
    ) {
        let m = manager(balance, risk_per_trade);
        let direction = if long { 1.0 } else { -1.0 };
        let tight = m.position_size(entry, entry - direction * near).unwrap();
        let wide = m.position_size(entry, entry - direction * (near + extra)).unwrap();
        prop_assert!(wide.quantity <= tight.quantity);
        prop_assert_eq!(wide.risk_amount, tight.risk_amount);
    }

    #[test]
    fn assessment_is_idempotent(
        entry in 10.0..5_000.0_f64,
        atr in 0.0..25.0_f64,
        long in any::<bool>(),
    ) {
        let m = manager(10_000.0, 0.01);
        let side = if long { Side::Buy } else { Side::Sell };
        let first = m.assess_trade(side, entry, None, None, Some(atr));
        let second = m.assess_trade(side, entry, None, None, Some(atr));
        prop_assert_eq!(first, second);
    }
}
