//! `SeaORM` entity definitions.
//!
//! Money columns hold integer minor units (`*_minor`), converted to and from
//! [`tillbook_shared::Amount`] at the repository boundary.

pub mod cash_register_sessions;
pub mod ledger_accounts;
pub mod movements;
pub mod payment_method_accounts;
pub mod sea_orm_active_enums;

pub mod prelude {
    //! Entity re-exports.
    pub use super::cash_register_sessions::Entity as CashRegisterSessions;
    pub use super::ledger_accounts::Entity as LedgerAccounts;
    pub use super::movements::Entity as Movements;
    pub use super::payment_method_accounts::Entity as PaymentMethodAccounts;
}
