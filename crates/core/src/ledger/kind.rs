//! Account kinds and the per-kind posting policy.
//!
//! One engine serves every kind; the differences live in this table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tillbook_shared::Amount;

use super::movement::{Direction, MovementType};

/// Kind of ledger account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Customer current account. Negative balance means the customer owes.
    Customer,
    /// Supplier current account. Positive balance means the business owes.
    Supplier,
    /// Internal cash envelope.
    Cash,
    /// Implicit account owned by a cash register session.
    CashRegister,
}

impl AccountKind {
    /// Stable wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Supplier => "supplier",
            Self::Cash => "cash",
            Self::CashRegister => "cash_register",
        }
    }

    /// Direction of `movement_type` on this kind, or `None` if not allowed.
    #[must_use]
    pub const fn direction(self, movement_type: MovementType) -> Option<Direction> {
        use MovementType as M;

        match (self, movement_type) {
            (Self::Customer | Self::Supplier | Self::Cash, M::Adjustment) => {
                Some(Direction::Either)
            }

            (Self::Customer, M::Payment | M::Credit)
            | (Self::Supplier, M::Credit)
            | (Self::Cash, M::Income | M::Received | M::TransferIn)
            | (Self::CashRegister, M::Received | M::Income) => Some(Direction::Increase),

            (Self::Customer, M::Charge)
            | (Self::Supplier | Self::Cash, M::Paid)
            | (Self::Cash, M::Expense | M::TransferOut)
            | (Self::CashRegister, M::Expense) => Some(Direction::Decrease),

            _ => None,
        }
    }

    /// Whether customer credit limits apply to debits.
    #[must_use]
    pub const fn enforces_credit_policy(self) -> bool {
        matches!(self, Self::Customer)
    }

    /// Whether the balance may never go below zero.
    #[must_use]
    pub const fn requires_non_negative(self) -> bool {
        matches!(self, Self::Supplier | Self::Cash | Self::CashRegister)
    }

    /// Whether `movement_type` is accepted while the account is inactive.
    #[must_use]
    pub const fn allows_when_inactive(self, movement_type: MovementType) -> bool {
        use MovementType as M;

        match self {
            Self::Customer => matches!(movement_type, M::Payment | M::Credit | M::Adjustment),
            Self::Supplier => matches!(movement_type, M::Paid | M::Adjustment),
            Self::Cash => matches!(
                movement_type,
                M::Income | M::Received | M::TransferIn | M::Adjustment
            ),
            Self::CashRegister => false,
        }
    }

    /// Whether accounts of this kind can be created directly by callers.
    #[must_use]
    pub const fn is_user_creatable(self) -> bool {
        !matches!(self, Self::CashRegister)
    }

    /// Applies the type's direction to an unsigned magnitude.
    ///
    /// Returns `None` for types that are not allowed or that take either sign.
    #[must_use]
    pub fn signed(self, movement_type: MovementType, magnitude: Amount) -> Option<Amount> {
        match self.direction(movement_type)? {
            Direction::Increase => Some(magnitude.abs()),
            Direction::Decrease => Some(-magnitude.abs()),
            Direction::Either => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "supplier" => Ok(Self::Supplier),
            "cash" => Ok(Self::Cash),
            "cash_register" => Ok(Self::CashRegister),
            other => Err(format!("unknown account kind '{other}'")),
        }
    }
}
