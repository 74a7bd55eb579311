//! String-backed enums stored in the ledger tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tillbook_core::ledger;
use tillbook_core::payment;
use tillbook_core::register;

/// Stored form of [`ledger::AccountKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountKind {
    /// Customer current account.
    #[sea_orm(string_value = "customer")]
    Customer,
    /// Supplier current account.
    #[sea_orm(string_value = "supplier")]
    Supplier,
    /// Cash envelope.
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Register session account.
    #[sea_orm(string_value = "cash_register")]
    CashRegister,
}

impl From<ledger::AccountKind> for AccountKind {
    fn from(kind: ledger::AccountKind) -> Self {
        match kind {
            ledger::AccountKind::Customer => Self::Customer,
            ledger::AccountKind::Supplier => Self::Supplier,
            ledger::AccountKind::Cash => Self::Cash,
            ledger::AccountKind::CashRegister => Self::CashRegister,
        }
    }
}

impl From<AccountKind> for ledger::AccountKind {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Customer => Self::Customer,
            AccountKind::Supplier => Self::Supplier,
            AccountKind::Cash => Self::Cash,
            AccountKind::CashRegister => Self::CashRegister,
        }
    }
}

/// Stored form of [`ledger::MovementType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MovementType {
    /// CHARGE.
    #[sea_orm(string_value = "CHARGE")]
    Charge,
    /// PAYMENT.
    #[sea_orm(string_value = "PAYMENT")]
    Payment,
    /// ADJUSTMENT.
    #[sea_orm(string_value = "ADJUSTMENT")]
    Adjustment,
    /// CREDIT.
    #[sea_orm(string_value = "CREDIT")]
    Credit,
    /// PAID.
    #[sea_orm(string_value = "PAID")]
    Paid,
    /// RECEIVED.
    #[sea_orm(string_value = "RECEIVED")]
    Received,
    /// TRANSFER_IN.
    #[sea_orm(string_value = "TRANSFER_IN")]
    TransferIn,
    /// TRANSFER_OUT.
    #[sea_orm(string_value = "TRANSFER_OUT")]
    TransferOut,
    /// INCOME.
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// EXPENSE.
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

impl From<ledger::MovementType> for MovementType {
    fn from(t: ledger::MovementType) -> Self {
        match t {
            ledger::MovementType::Charge => Self::Charge,
            ledger::MovementType::Payment => Self::Payment,
            ledger::MovementType::Adjustment => Self::Adjustment,
            ledger::MovementType::Credit => Self::Credit,
            ledger::MovementType::Paid => Self::Paid,
            ledger::MovementType::Received => Self::Received,
            ledger::MovementType::TransferIn => Self::TransferIn,
            ledger::MovementType::TransferOut => Self::TransferOut,
            ledger::MovementType::Income => Self::Income,
            ledger::MovementType::Expense => Self::Expense,
        }
    }
}

impl From<MovementType> for ledger::MovementType {
    fn from(t: MovementType) -> Self {
        match t {
            MovementType::Charge => Self::Charge,
            MovementType::Payment => Self::Payment,
            MovementType::Adjustment => Self::Adjustment,
            MovementType::Credit => Self::Credit,
            MovementType::Paid => Self::Paid,
            MovementType::Received => Self::Received,
            MovementType::TransferIn => Self::TransferIn,
            MovementType::TransferOut => Self::TransferOut,
            MovementType::Income => Self::Income,
            MovementType::Expense => Self::Expense,
        }
    }
}

/// Stored form of [`register::SessionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum SessionStatus {
    /// Open.
    #[sea_orm(string_value = "open")]
    Open,
    /// Closed.
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl From<register::SessionStatus> for SessionStatus {
    fn from(s: register::SessionStatus) -> Self {
        match s {
            register::SessionStatus::Open => Self::Open,
            register::SessionStatus::Closed => Self::Closed,
        }
    }
}

impl From<SessionStatus> for register::SessionStatus {
    fn from(s: SessionStatus) -> Self {
        match s {
            SessionStatus::Open => Self::Open,
            SessionStatus::Closed => Self::Closed,
        }
    }
}

/// Stored form of [`payment::PaymentMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentMethod {
    /// CASH.
    #[sea_orm(string_value = "CASH")]
    Cash,
    /// DEBIT_CARD.
    #[sea_orm(string_value = "DEBIT_CARD")]
    DebitCard,
    /// CREDIT_CARD.
    #[sea_orm(string_value = "CREDIT_CARD")]
    CreditCard,
    /// TRANSFER.
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    /// QR.
    #[sea_orm(string_value = "QR")]
    Qr,
    /// CHECK.
    #[sea_orm(string_value = "CHECK")]
    Check,
    /// ACCOUNT.
    #[sea_orm(string_value = "ACCOUNT")]
    Account,
}

impl From<payment::PaymentMethod> for PaymentMethod {
    fn from(m: payment::PaymentMethod) -> Self {
        match m {
            payment::PaymentMethod::Cash => Self::Cash,
            payment::PaymentMethod::DebitCard => Self::DebitCard,
            payment::PaymentMethod::CreditCard => Self::CreditCard,
            payment::PaymentMethod::Transfer => Self::Transfer,
            payment::PaymentMethod::Qr => Self::Qr,
            payment::PaymentMethod::Check => Self::Check,
            payment::PaymentMethod::Account => Self::Account,
        }
    }
}

impl From<PaymentMethod> for payment::PaymentMethod {
    fn from(m: PaymentMethod) -> Self {
        match m {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::DebitCard => Self::DebitCard,
            PaymentMethod::CreditCard => Self::CreditCard,
            PaymentMethod::Transfer => Self::Transfer,
            PaymentMethod::Qr => Self::Qr,
            PaymentMethod::Check => Self::Check,
            PaymentMethod::Account => Self::Account,
        }
    }
}
