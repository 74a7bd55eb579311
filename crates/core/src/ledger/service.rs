//! Ledger service for posting validation.
//!
//! Pure decision logic behind every balance change. The persistence layer
//! reads the account inside its transaction, asks [`LedgerService::plan_post`]
//! what the movement looks like, then writes exactly that.

use tillbook_shared::Amount;

use super::account::LedgerAccount;
use super::credit::{CreditDecision, CreditDenial, CreditPolicy};
use super::error::LedgerError;
use super::movement::{Direction, MovementType};

/// Fully validated posting, ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedPosting {
    /// Position of the new movement in the chain.
    pub sequence: i64,
    /// Balance snapshot before the movement.
    pub balance_before: Amount,
    /// Balance snapshot after the movement.
    pub balance_after: Amount,
    /// Version the account row must still have when it is updated.
    pub expected_version: i64,
    /// Version written with the new balance.
    pub new_version: i64,
}

/// Ledger service for posting validation.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Trims and validates the concept text.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::MissingConcept` if it is empty after trimming.
    pub fn validate_concept(concept: &str) -> Result<String, LedgerError> {
        let trimmed = concept.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::MissingConcept);
        }
        Ok(trimmed.to_string())
    }

    /// Checks that `amount` is a usable signed delta for `movement_type` on the account kind.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for zero or wrong-signed amounts, `MovementTypeNotAllowed`
    /// when the kind does not define the type.
    pub fn validate_direction(
        account: &LedgerAccount,
        movement_type: MovementType,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(format!(
                "{movement_type} on account {} must be non-zero",
                account.id
            )));
        }

        let direction = account.kind.direction(movement_type).ok_or(
            LedgerError::MovementTypeNotAllowed {
                account_id: account.id.into_inner(),
                kind: account.kind,
                movement_type,
            },
        )?;

        let sign_ok = match direction {
            Direction::Increase => amount.is_positive(),
            Direction::Decrease => amount.is_negative(),
            Direction::Either => true,
        };
        if !sign_ok {
            return Err(LedgerError::InvalidAmount(format!(
                "{movement_type} on {} account {} cannot be {amount}",
                account.kind, account.id
            )));
        }
        Ok(())
    }

    /// Decides whether a movement may be applied to a freshly read account.
    ///
    /// Checks, in order:
    /// 1. Amount sign against the kind's direction table
    /// 2. Inactive accounts only accept the kind's reconciling types
    /// 3. Credit policy for customer debits other than adjustments
    /// 4. Non-negative kinds never go below zero on a debit
    ///
    /// # Errors
    ///
    /// Returns the first rule that fails.
    pub fn plan_post(
        account: &LedgerAccount,
        movement_type: MovementType,
        amount: Amount,
        policy: &dyn CreditPolicy,
    ) -> Result<PlannedPosting, LedgerError> {
        Self::validate_direction(account, movement_type, amount)?;

        if !account.is_active && !account.kind.allows_when_inactive(movement_type) {
            return Err(LedgerError::AccountInactive(account.id.into_inner()));
        }

        let balance_after = account.balance.checked_add(amount).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("{amount} overflows account {}", account.id))
        })?;
        let is_debit = amount.is_negative();

        if is_debit
            && account.kind.enforces_credit_policy()
            && movement_type != MovementType::Adjustment
        {
            match policy.evaluate(account, amount.abs(), balance_after) {
                CreditDecision::Allow => {}
                CreditDecision::Deny(CreditDenial::Inactive) => {
                    return Err(LedgerError::AccountInactive(account.id.into_inner()));
                }
                CreditDecision::Deny(CreditDenial::OverLimit {
                    available,
                    attempted,
                }) => {
                    return Err(LedgerError::InsufficientCredit {
                        account_id: account.id.into_inner(),
                        available,
                        attempted,
                    });
                }
            }
        }

        if is_debit && account.kind.requires_non_negative() && balance_after.is_negative() {
            return Err(LedgerError::InsufficientFunds {
                account_id: account.id.into_inner(),
                balance: account.balance,
                attempted: amount.abs(),
            });
        }

        Ok(PlannedPosting {
            sequence: account.version + 1,
            balance_before: account.balance,
            balance_after,
            expected_version: account.version,
            new_version: account.version + 1,
        })
    }
}
