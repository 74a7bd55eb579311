//! Property-based tests for LedgerService.
//!
//! - Applying accepted plans in order produces an intact chain
//! - Non-negative kinds never end below zero
//! - Limited customers never end below `-credit_limit` through charges

use proptest::prelude::*;
use tillbook_shared::types::{AccountId, TenantId};
use tillbook_shared::Amount;

use super::account::LedgerAccount;
use super::chain::{verify_chain, ChainLink};
use super::credit::CreditLimitPolicy;
use super::kind::AccountKind;
use super::movement::MovementType;
use super::service::LedgerService;

/// Strategy to generate positive cent magnitudes (0.01 to 5,000.00).
fn magnitude() -> impl Strategy<Value = i64> {
    1i64..500_000i64
}

/// Strategy to generate a movement type valid for cash envelopes.
fn cash_movement() -> impl Strategy<Value = MovementType> {
    prop_oneof![
        Just(MovementType::Income),
        Just(MovementType::Received),
        Just(MovementType::TransferIn),
        Just(MovementType::Expense),
        Just(MovementType::Paid),
        Just(MovementType::TransferOut),
    ]
}

/// Strategy to generate a movement type valid for customers.
fn customer_movement() -> impl Strategy<Value = MovementType> {
    prop_oneof![
        3 => Just(MovementType::Charge),
        1 => Just(MovementType::Payment),
        1 => Just(MovementType::Credit),
    ]
}

fn new_account(kind: AccountKind, opening: Amount, limit: Amount) -> LedgerAccount {
    LedgerAccount {
        id: AccountId::new(),
        tenant_id: TenantId::new(),
        kind,
        owner_id: None,
        name: "prop".into(),
        balance: opening,
        opening_balance: opening,
        credit_limit: limit,
        is_active: true,
        version: 0,
    }
}

/// Applies each movement through `plan_post`, skipping rejected ones.
fn apply_all(account: &mut LedgerAccount, ops: &[(MovementType, i64)]) -> Vec<ChainLink> {
    let mut links = Vec::new();
    for (movement_type, cents) in ops {
        let Some(amount) = account
            .kind
            .signed(*movement_type, Amount::from_minor_units(*cents))
        else {
            continue;
        };
        let before = account.clone();
        match LedgerService::plan_post(account, *movement_type, amount, &CreditLimitPolicy) {
            Ok(plan) => {
                links.push(ChainLink {
                    sequence: plan.sequence,
                    amount,
                    balance_before: plan.balance_before,
                    balance_after: plan.balance_after,
                });
                account.balance = plan.balance_after;
                account.version = plan.new_version;
            }
            Err(_) => assert_eq!(*account, before),
        }
    }
    links
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Accepted plans chain into a replayable history.
    #[test]
    fn prop_accepted_plans_form_intact_chain(
        opening in 0i64..100_000,
        ops in prop::collection::vec((cash_movement(), magnitude()), 1..40),
    ) {
        let opening = Amount::from_minor_units(opening);
        let mut account = new_account(AccountKind::Cash, opening, Amount::ZERO);
        let links = apply_all(&mut account, &ops);
        let report = verify_chain(opening, account.balance, account.version, links);
        prop_assert!(report.is_consistent(), "{:?}", report.first_break);
    }

    /// Cash envelopes never go below zero.
    #[test]
    fn prop_cash_never_negative(
        ops in prop::collection::vec((cash_movement(), magnitude()), 1..40),
    ) {
        let mut account = new_account(AccountKind::Cash, Amount::ZERO, Amount::ZERO);
        let _ = apply_all(&mut account, &ops);
        prop_assert!(!account.balance.is_negative());
    }

    /// A limited customer never ends below `-credit_limit`.
    #[test]
    fn prop_customer_respects_limit(
        limit in 1i64..1_000_000,
        ops in prop::collection::vec((customer_movement(), magnitude()), 1..40),
    ) {
        let limit = Amount::from_minor_units(limit);
        let mut account = new_account(AccountKind::Customer, Amount::ZERO, limit);
        let _ = apply_all(&mut account, &ops);
        prop_assert!(account.balance >= -limit);
    }
}
