//! Register totals and close-out reconciliation.

use serde::{Deserialize, Serialize};
use tillbook_shared::Amount;
use uuid::Uuid;

use super::types::{SessionStatus, SessionTotals};
use crate::ledger::{LedgerError, MovementType};

impl SessionTotals {
    /// Folds `(type, signed amount)` pairs of a register account.
    pub fn from_movements(movements: impl IntoIterator<Item = (MovementType, Amount)>) -> Self {
        let mut totals = Self::default();
        for (movement_type, amount) in movements {
            match movement_type {
                MovementType::Received => {
                    totals.sales_cash_total += amount;
                    totals.sales_count += 1;
                }
                MovementType::Income => {
                    totals.income_total += amount;
                    totals.income_count += 1;
                }
                MovementType::Expense => {
                    totals.expense_total += amount.abs();
                    totals.expense_count += 1;
                }
                _ => {}
            }
        }
        totals
    }

    /// `opening + sales_cash_total + income_total − expense_total`.
    #[must_use]
    pub fn expected_balance(&self, opening_balance: Amount) -> Amount {
        opening_balance + self.sales_cash_total + self.income_total - self.expense_total
    }
}

/// Close-out figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Ledger-derived balance.
    pub expected_balance: Amount,
    /// Counted cash.
    pub declared_balance: Amount,
    /// `declared − expected`; positive surplus, negative shortage.
    pub discrepancy: Amount,
}

impl Reconciliation {
    /// Compares counted cash with the ledger.
    #[must_use]
    pub fn new(expected_balance: Amount, declared_balance: Amount) -> Self {
        Self {
            expected_balance,
            declared_balance,
            discrepancy: declared_balance - expected_balance,
        }
    }
}

/// Session state machine guard.
///
/// # Errors
///
/// `SessionAlreadyClosed` for closed sessions.
pub fn ensure_open(session_id: Uuid, status: SessionStatus) -> Result<(), LedgerError> {
    match status {
        SessionStatus::Open => Ok(()),
        SessionStatus::Closed => Err(LedgerError::SessionAlreadyClosed(session_id)),
    }
}

/// Validates an opening float.
///
/// # Errors
///
/// `InvalidAmount` when negative.
pub fn validate_opening_balance(opening_balance: Amount) -> Result<(), LedgerError> {
    if opening_balance.is_negative() {
        return Err(LedgerError::InvalidAmount(format!(
            "opening balance {opening_balance} cannot be negative"
        )));
    }
    Ok(())
}

/// Validates a counted closing balance.
///
/// # Errors
///
/// `InvalidAmount` when negative.
pub fn validate_declared_balance(declared: Amount) -> Result<(), LedgerError> {
    if declared.is_negative() {
        return Err(LedgerError::InvalidAmount(format!(
            "declared balance {declared} cannot be negative"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reconciliation_example() {
        let opening = Amount::new(dec!(1000));
        let totals = SessionTotals::from_movements([
            (MovementType::Received, Amount::new(dec!(500))),
            (MovementType::Expense, Amount::new(dec!(-200))),
        ]);
        let expected = totals.expected_balance(opening);
        assert_eq!(expected, Amount::new(dec!(1300)));

        let rec = Reconciliation::new(expected, Amount::new(dec!(1250)));
        assert_eq!(rec.discrepancy, Amount::new(dec!(-50)));
    }

    #[test]
    fn test_totals_count_each_kind() {
        let totals = SessionTotals::from_movements([
            (MovementType::Received, Amount::from(10)),
            (MovementType::Received, Amount::from(5)),
            (MovementType::Income, Amount::from(20)),
            (MovementType::Expense, Amount::from(-7)),
        ]);
        assert_eq!(totals.sales_count, 2);
        assert_eq!(totals.sales_cash_total, Amount::from(15));
        assert_eq!(totals.income_count, 1);
        assert_eq!(totals.expense_total, Amount::from(7));
    }

    #[test]
    fn test_state_guards() {
        let id = Uuid::nil();
        assert!(ensure_open(id, SessionStatus::Open).is_ok());
        assert_eq!(
            ensure_open(id, SessionStatus::Closed),
            Err(LedgerError::SessionAlreadyClosed(id))
        );
        assert!(validate_opening_balance(Amount::ZERO).is_ok());
        assert!(validate_opening_balance(Amount::from(-1)).is_err());
        assert!(validate_declared_balance(Amount::from(-1)).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Expected balance equals opening plus the signed sum of register movements.
        #[test]
        fn prop_expected_matches_signed_sum(
            opening in 0i64..1_000_000,
            entries in prop::collection::vec((0u8..3, 1i64..100_000), 0..30),
        ) {
            let opening = Amount::from_minor_units(opening);
            let movements: Vec<(MovementType, Amount)> = entries
                .iter()
                .map(|(k, cents)| match k {
                    0 => (MovementType::Received, Amount::from_minor_units(*cents)),
                    1 => (MovementType::Income, Amount::from_minor_units(*cents)),
                    _ => (MovementType::Expense, -Amount::from_minor_units(*cents)),
                })
                .collect();
            let signed_sum: Amount = movements.iter().map(|(_, a)| *a).sum();
            let totals = SessionTotals::from_movements(movements);
            prop_assert_eq!(totals.expected_balance(opening), opening + signed_sum);
        }
    }
}
