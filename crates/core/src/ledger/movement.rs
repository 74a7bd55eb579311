//! Movement types and the immutable movement record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tillbook_shared::types::{AccountId, ActorId, MovementId, SessionId, SupplierId, TenantId, TransferGroupId};
use tillbook_shared::Amount;
use uuid::Uuid;

/// Kind of balance transition recorded by a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Customer is charged (owes more).
    Charge,
    /// Customer pays down their balance.
    Payment,
    /// Manual correction; either sign.
    Adjustment,
    /// Credit note for a customer, or a supplier invoice.
    Credit,
    /// Business pays out.
    Paid,
    /// Cash received into an envelope or register.
    Received,
    /// Incoming leg of a cash transfer.
    TransferIn,
    /// Outgoing leg of a cash transfer.
    TransferOut,
    /// Miscellaneous cash income.
    Income,
    /// Cash expense.
    Expense,
}

impl MovementType {
    /// All movement types.
    pub const ALL: [Self; 10] = [
        Self::Charge,
        Self::Payment,
        Self::Adjustment,
        Self::Credit,
        Self::Paid,
        Self::Received,
        Self::TransferIn,
        Self::TransferOut,
        Self::Income,
        Self::Expense,
    ];

    /// Stable wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Charge => "CHARGE",
            Self::Payment => "PAYMENT",
            Self::Adjustment => "ADJUSTMENT",
            Self::Credit => "CREDIT",
            Self::Paid => "PAID",
            Self::Received => "RECEIVED",
            Self::TransferIn => "TRANSFER_IN",
            Self::TransferOut => "TRANSFER_OUT",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown movement type '{s}'"))
    }
}

/// Which way a movement type moves the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Amount must be positive.
    Increase,
    /// Amount must be negative.
    Decrease,
    /// Either sign (adjustments).
    Either,
}

/// A document the movement was produced from (invoice, receipt, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLink {
    /// Opaque document type, e.g. `invoice`.
    pub document_type: String,
    /// Document identifier in the owning system.
    pub document_id: Uuid,
}

/// How the caller names the account to post to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "id", rename_all = "snake_case")]
pub enum AccountRef {
    /// A ledger account id.
    Account(AccountId),
    /// The supplier's current account; created on first use.
    Supplier(SupplierId),
}

/// Request to post one movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMovement {
    /// Target account.
    pub account: AccountRef,
    /// Signed delta.
    pub amount: Amount,
    /// Movement type.
    pub movement_type: MovementType,
    /// Required description.
    pub concept: String,
    /// Optional external reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Optional linked document.
    #[serde(default)]
    pub document: Option<DocumentLink>,
}

impl PostMovement {
    /// Creates a post request without reference or document.
    #[must_use]
    pub fn new(
        account: AccountRef,
        amount: Amount,
        movement_type: MovementType,
        concept: impl Into<String>,
    ) -> Self {
        Self {
            account,
            amount,
            movement_type,
            concept: concept.into(),
            reference: None,
            document: None,
        }
    }

    /// Sets the external reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the linked document.
    #[must_use]
    pub fn with_document(mut self, document: DocumentLink) -> Self {
        self.document = Some(document);
        self
    }
}

/// One committed balance transition. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Movement id.
    pub id: MovementId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Account whose balance changed.
    pub account_id: AccountId,
    /// Movement type.
    pub movement_type: MovementType,
    /// Signed delta.
    pub amount: Amount,
    /// 1-based position in the account chain.
    pub sequence: i64,
    /// Balance before this movement.
    pub balance_before: Amount,
    /// Balance after this movement.
    pub balance_after: Amount,
    /// Description.
    pub concept: String,
    /// External reference.
    pub reference: Option<String>,
    /// Register income/expense category.
    pub category: Option<String>,
    /// Linked document.
    pub document: Option<DocumentLink>,
    /// Register session the movement belongs to.
    pub session_id: Option<SessionId>,
    /// Shared by both legs of a transfer.
    pub transfer_group_id: Option<TransferGroupId>,
    /// Who posted it.
    pub actor_id: ActorId,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_round_trip_names() {
        for t in MovementType::ALL {
            assert_eq!(t.as_str().parse::<MovementType>(), Ok(t));
        }
        assert_eq!("transfer_in".parse::<MovementType>(), Ok(MovementType::TransferIn));
        assert!("REFUND".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_movement_type_serde_matches_storage_name() {
        let json = serde_json::to_string(&MovementType::TransferOut).unwrap();
        assert_eq!(json, "\"TRANSFER_OUT\"");
    }

    #[test]
    fn test_account_ref_serde() {
        let id = SupplierId::new();
        let json = serde_json::to_value(AccountRef::Supplier(id)).unwrap();
        assert_eq!(json["by"], "supplier");
        assert_eq!(json["id"], id.to_string());
    }
}
