//! Shared fixtures for the store-backed tests.

#![allow(dead_code)]

use std::path::PathBuf;

use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tillbook_core::ledger::{AccountKind, LedgerAccount};
use tillbook_db::migration::Migrator;
use tillbook_db::repositories::{AccountRepository, CreateAccountInput};
use tillbook_shared::types::{ActorId, TenantId};
use tillbook_shared::{Amount, LedgerConfig, TenantContext};
use uuid::Uuid;

/// Fresh migrated in-memory database.
///
/// A single pooled connection keeps the in-memory database alive and
/// serializes writers the way row locks do on PostgreSQL.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Migrated file-backed database behind a pool of several connections.
///
/// Unlike [`setup_db`], writers really overlap here: each pooled connection
/// runs its own transaction against a WAL journal, so lost races reach the
/// version guard and the retry loop. The files are removed on drop.
pub struct SharedDb {
    pub db: DatabaseConnection,
    path: PathBuf,
}

impl Drop for SharedDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

pub async fn setup_shared_db(connections: u32) -> SharedDb {
    let path = std::env::temp_dir().join(format!("tillbook-test-{}.db", Uuid::now_v7()));
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let bootstrap = Database::connect(url.as_str())
        .await
        .expect("Failed to create database file");
    bootstrap
        .execute_unprepared("PRAGMA journal_mode=WAL")
        .await
        .expect("Failed to enable WAL");
    Migrator::up(&bootstrap, None)
        .await
        .expect("Failed to run migrations");
    drop(bootstrap);

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(connections)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open database pool");
    SharedDb { db, path }
}

/// Ledger settings for heavily contended tests.
pub fn contended_config() -> LedgerConfig {
    LedgerConfig {
        max_retries: 50,
        ..LedgerConfig::default()
    }
}

pub fn tenant_ctx() -> TenantContext {
    TenantContext::new(TenantId::new(), ActorId::new(), "cashier")
}

pub fn ledger_config() -> LedgerConfig {
    LedgerConfig::default()
}

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value)
}

pub async fn create_customer(
    db: &DatabaseConnection,
    ctx: &TenantContext,
    customer_id: Uuid,
    credit_limit: Amount,
) -> LedgerAccount {
    AccountRepository::new(db.clone())
        .create(
            ctx,
            CreateAccountInput {
                kind: AccountKind::Customer,
                name: "Customer".to_string(),
                owner_id: Some(customer_id),
                credit_limit,
            },
        )
        .await
        .expect("Failed to create customer account")
}

pub async fn create_cash(db: &DatabaseConnection, ctx: &TenantContext, name: &str) -> LedgerAccount {
    AccountRepository::new(db.clone())
        .create(
            ctx,
            CreateAccountInput {
                kind: AccountKind::Cash,
                name: name.to_string(),
                owner_id: None,
                credit_limit: Amount::ZERO,
            },
        )
        .await
        .expect("Failed to create cash account")
}
