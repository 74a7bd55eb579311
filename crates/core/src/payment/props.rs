//! Property-based tests for payment allocation.

use proptest::prelude::*;
use tillbook_shared::Amount;

use super::allocation::{PaymentAllocation, DEFAULT_TOLERANCE};
use super::types::{AllocationContext, PaymentLeg, PaymentMethod};
use crate::ledger::LedgerError;

/// Strategy to generate a method that never needs a customer.
fn method() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::DebitCard),
        Just(PaymentMethod::CreditCard),
        Just(PaymentMethod::Transfer),
        Just(PaymentMethod::Qr),
        Just(PaymentMethod::Check),
    ]
}

fn context() -> AllocationContext {
    AllocationContext {
        concept: "prop".into(),
        ..AllocationContext::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A split is accepted iff it lands within one cent of the total.
    #[test]
    fn prop_balanced_iff_within_tolerance(
        legs in prop::collection::vec((method(), 1i64..1_000_000), 1..6),
        skew in -5i64..=5,
    ) {
        let legs: Vec<PaymentLeg> = legs
            .into_iter()
            .map(|(m, cents)| PaymentLeg::new(m, Amount::from_minor_units(cents)))
            .collect();
        let leg_cents: i64 = legs.iter().map(|l| l.amount.to_minor_units().unwrap()).sum();
        let total = Amount::from_minor_units(leg_cents + skew);

        let result = PaymentAllocation::plan(total, &legs, &context(), DEFAULT_TOLERANCE);
        if skew.abs() <= 1 {
            let plan = result.unwrap();
            prop_assert_eq!(plan.legs.len(), legs.len());
            prop_assert_eq!(plan.rounding_difference, Amount::from_minor_units(-skew));
        } else {
            let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedPayment { .. }));
            prop_assert!(is_unbalanced);
        }
    }
}
