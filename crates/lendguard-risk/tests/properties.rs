//! estimator invariants over generated positions

use alloy_primitives::{Address, B256, U256};
use lendguard_risk::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

fn token_a() -> Address {
    Address::repeat_byte(0x0a)
}

fn token_b() -> Address {
    Address::repeat_byte(0x0b)
}

fn decimals() -> HashMap<Address, u8> {
    [(token_a(), 6), (token_b(), 18)].into_iter().collect()
}

fn position(collateral_a: u64, collateral_b: u64, borrowed_a: u64, borrowed_b: u64) -> PoolPosition {
    let scale_b = U256::from(10u64).pow(U256::from(12u64));
    PoolPosition {
        pool_id: B256::repeat_byte(0x77),
        token_a: token_a(),
        token_b: token_b(),
        position: Position {
            collateral_a: U256::from(collateral_a),
            // token b has 18 decimals, lift to the same display magnitude as a
            collateral_b: U256::from(collateral_b) * scale_b,
            borrowed_a: U256::from(borrowed_a),
            borrowed_b: U256::from(borrowed_b) * scale_b,
        },
    }
}

fn factor_strategy() -> impl Strategy<Value = CollateralFactor> {
    (1u64..100).prop_map(|pct| CollateralFactor::from_percent(U256::from(pct)).unwrap())
}

proptest! {
    #[test]
    fn zero_debt_is_always_safe(
        ca in 0u64..1_000_000_000_000,
        cb in 0u64..1_000_000_000_000,
        factor in factor_strategy(),
    ) {
        let summary = aggregate_risk(&[position(ca, cb, 0, 0)], &decimals(), factor);
        prop_assert_eq!(summary.health_factor, HealthFactor::Safe);
    }

    #[test]
    fn available_to_borrow_matches_formula(
        ca in 0u64..1_000_000_000_000,
        cb in 0u64..1_000_000_000_000,
        ba in 0u64..1_000_000_000_000,
        bb in 0u64..1_000_000_000_000,
        factor in factor_strategy(),
    ) {
        let summary = aggregate_risk(&[position(ca, cb, ba, bb)], &decimals(), factor);
        let expected = (summary.total_collateral_value * factor.value()
            - summary.total_borrowed_value)
            .max(Decimal::ZERO);
        prop_assert!(summary.available_to_borrow >= Decimal::ZERO);
        prop_assert_eq!(summary.available_to_borrow, expected);
    }

    #[test]
    fn health_factor_decreases_as_debt_grows(
        collateral in 1u64..1_000_000_000,
        debt in 1u64..1_000_000_000,
        extra in 1u64..1_000_000_000,
        factor in factor_strategy(),
    ) {
        let lower = aggregate_risk(&[position(collateral, 0, debt, 0)], &decimals(), factor);
        let higher = aggregate_risk(&[position(collateral, 0, debt + extra, 0)], &decimals(), factor);

        match (lower.health_factor, higher.health_factor) {
            (HealthFactor::Ratio(l), HealthFactor::Ratio(h)) => {
                prop_assert!(h < l);
                let c = lower.total_collateral_value;
                let d = lower.total_borrowed_value;
                prop_assert_eq!(l, c * factor.value() / d);
            }
            // ratio above the ceiling collapses to safe
            (HealthFactor::Safe, _) => {}
            (l, h) => prop_assert!(false, "unexpected {:?} / {:?}", l, h),
        }
    }

    #[test]
    fn withdrawable_never_exceeds_deposit(
        deposited_a in 0u64..1_000_000,
        deposited_b in 0u64..1_000_000,
        borrowed in 0u64..1_000_000,
        factor in factor_strategy(),
    ) {
        let summary = aggregate_risk(&[position(deposited_a, deposited_b, 0, borrowed)], &decimals(), factor);
        if let Some(valued) = summary.positions.first() {
            let amount = max_withdrawable(valued, &token_a(), factor, SafetyBuffer::default());
            prop_assert!(amount <= valued.amounts.collateral_a);
            prop_assert!(amount >= Decimal::ZERO);

            let min_required = valued.debt_value / factor.value() * dec!(1.1);
            if valued.debt_value > Decimal::ZERO && valued.collateral_value <= min_required {
                prop_assert_eq!(amount, Decimal::ZERO);
            }
        }
    }

    #[test]
    fn repayable_bounded_by_debt_and_balance(
        borrowed in 0u64..1_000_000,
        balance in 0u64..1_000_000,
    ) {
        let factor = CollateralFactor::new(dec!(0.75)).unwrap();
        let summary = aggregate_risk(&[position(2_000_000, 0, borrowed, 0)], &decimals(), factor);
        let valued = &summary.positions[0];
        let balance = Decimal::new(balance as i64, 6);
        let r = max_repayable(valued, &token_a(), Some(balance));
        prop_assert!(r.max_repayable <= r.current_borrowed.min(balance));
    }
}
