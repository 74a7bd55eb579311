//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every balance change goes through [`store::apply_movement`] inside a store
//! transaction.

pub mod account;
pub mod allocation;
pub mod cash_register;
pub mod ledger;
pub mod payment_method;
mod store;

pub use account::{AccountFilter, AccountRepository, CreateAccountInput};
pub use allocation::PaymentAllocator;
pub use cash_register::{CashRegisterRepository, RegisterEntry};
pub use ledger::{LedgerEngine, TransferRequest, TransferResult};
pub use payment_method::{PaymentMethodMapping, PaymentMethodRepository, PaymentMethodResolver};
