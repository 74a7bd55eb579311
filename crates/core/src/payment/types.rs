//! Payment leg and allocation types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tillbook_shared::types::{CustomerId, SessionId};
use tillbook_shared::Amount;

use crate::ledger::{DocumentLink, Movement};

/// How a payment leg is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Debit card.
    DebitCard,
    /// Credit card.
    CreditCard,
    /// Bank transfer.
    Transfer,
    /// QR wallet payment.
    Qr,
    /// Cheque.
    Check,
    /// Charged to the customer's current account.
    Account,
}

impl PaymentMethod {
    /// All payment methods.
    pub const ALL: [Self; 7] = [
        Self::Cash,
        Self::DebitCard,
        Self::CreditCard,
        Self::Transfer,
        Self::Qr,
        Self::Check,
        Self::Account,
    ];

    /// Stable wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::DebitCard => "DEBIT_CARD",
            Self::CreditCard => "CREDIT_CARD",
            Self::Transfer => "TRANSFER",
            Self::Qr => "QR",
            Self::Check => "CHECK",
            Self::Account => "ACCOUNT",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown payment method '{s}'"))
    }
}

/// One (method, amount) pair settling part of a total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLeg {
    /// Settlement method.
    pub method: PaymentMethod,
    /// Positive amount.
    pub amount: Amount,
    /// Last four card digits, informational.
    #[serde(default)]
    pub card_last_four: Option<String>,
    /// Bank transfer reference, informational.
    #[serde(default)]
    pub transfer_reference: Option<String>,
}

impl PaymentLeg {
    /// Creates a leg without card or transfer details.
    #[must_use]
    pub fn new(method: PaymentMethod, amount: Amount) -> Self {
        Self {
            method,
            amount,
            card_last_four: None,
            transfer_reference: None,
        }
    }
}

/// What the legs are paying for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationContext {
    /// Customer for ACCOUNT legs.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Register session that receives CASH legs.
    #[serde(default)]
    pub register_session_id: Option<SessionId>,
    /// Concept written on every movement.
    pub concept: String,
    /// External reference written on every movement.
    #[serde(default)]
    pub reference: Option<String>,
    /// Source document written on every movement.
    #[serde(default)]
    pub document: Option<DocumentLink>,
}

/// Where a leg's money lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegRoute {
    /// RECEIVED on the session's register account.
    RegisterSession(SessionId),
    /// RECEIVED on whatever account the method maps to, if any.
    MappedMethod(PaymentMethod),
    /// CHARGE on the customer's account.
    CustomerAccount(CustomerId),
}

/// A validated leg with its route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedLeg {
    /// Index of the leg in the request.
    pub index: usize,
    /// The leg.
    pub leg: PaymentLeg,
    /// Destination.
    pub route: LegRoute,
}

/// Validated allocation ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Legs in request order.
    pub legs: Vec<RoutedLeg>,
    /// Σ legs.
    pub leg_total: Amount,
    /// `leg_total − total_due`, within tolerance.
    pub rounding_difference: Amount,
}

/// A leg accepted without ledger effect because its method has no account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedLeg {
    /// Index of the leg in the request.
    pub index: usize,
    /// Method that had no mapping.
    pub method: PaymentMethod,
    /// Leg amount.
    pub amount: Amount,
}

/// Outcome of a committed allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Movements written, in leg order.
    pub movements: Vec<Movement>,
    /// Legs with no ledger effect.
    pub unmapped: Vec<UnmappedLeg>,
    /// Σ legs.
    pub leg_total: Amount,
    /// `leg_total − total_due`.
    pub rounding_difference: Amount,
}
