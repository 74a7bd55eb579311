//! Database seeder for Tillbook development and testing.
//!
//! Seeds a demo tenant with cash envelopes, a customer with a credit limit,
//! payment method mappings and an opening float. Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use rust_decimal::Decimal;
use tillbook_core::ledger::{AccountKind, AccountRef, LedgerAccount, MovementType, PostMovement};
use tillbook_core::payment::PaymentMethod;
use tillbook_db::repositories::{
    AccountFilter, AccountRepository, CreateAccountInput, LedgerEngine, PaymentMethodRepository,
};
use tillbook_shared::types::{ActorId, PageRequest, TenantId};
use tillbook_shared::{Amount, AppConfig, TenantContext};
use tracing::info;
use uuid::Uuid;

/// Demo tenant ID (consistent for all seeds)
const DEMO_TENANT_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);
/// Demo operator ID (consistent for all seeds)
const DEMO_ACTOR_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0002);
/// Demo customer ID
const DEMO_CUSTOMER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0003);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seeder=info,tillbook=info".into()),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = tillbook_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    let ctx = TenantContext::new(
        TenantId::from(DEMO_TENANT_ID),
        ActorId::from(DEMO_ACTOR_ID),
        "admin",
    );
    let accounts = AccountRepository::new(db.clone());
    let mappings = PaymentMethodRepository::new(db.clone());
    let engine = LedgerEngine::new(db.clone(), &config.ledger);

    info!("Seeding cash accounts...");
    let till = seed_cash_account(&accounts, &ctx, "Front till").await?;
    let bank = seed_cash_account(&accounts, &ctx, "Bank account").await?;

    info!("Seeding demo customer...");
    let customer = match accounts
        .find_by_owner(&ctx, AccountKind::Customer, DEMO_CUSTOMER_ID)
        .await?
    {
        Some(existing) => existing,
        None => {
            accounts
                .create(
                    &ctx,
                    CreateAccountInput {
                        kind: AccountKind::Customer,
                        name: "Demo customer".to_string(),
                        owner_id: Some(DEMO_CUSTOMER_ID),
                        credit_limit: Amount::from(1000),
                    },
                )
                .await?
        }
    };

    info!("Seeding payment method mappings...");
    mappings.set(&ctx, PaymentMethod::Cash, till.id).await?;
    for method in [
        PaymentMethod::DebitCard,
        PaymentMethod::CreditCard,
        PaymentMethod::Transfer,
        PaymentMethod::Qr,
    ] {
        mappings.set(&ctx, method, bank.id).await?;
    }

    if till.version == 0 {
        info!("Seeding opening float...");
        engine
            .post(
                &ctx,
                &PostMovement::new(
                    AccountRef::Account(till.id),
                    Amount::new(Decimal::new(20_000, 2)),
                    MovementType::Income,
                    "Opening float",
                ),
            )
            .await?;
    }

    info!(
        tenant_id = %ctx.tenant_id,
        till = %till.id,
        bank = %bank.id,
        customer = %customer.id,
        "Seeding complete"
    );
    Ok(())
}

async fn seed_cash_account(
    accounts: &AccountRepository,
    ctx: &TenantContext,
    name: &str,
) -> anyhow::Result<LedgerAccount> {
    let filter = AccountFilter {
        kind: Some(AccountKind::Cash),
        is_active: None,
    };
    let existing = accounts
        .list(ctx, filter, PageRequest::default())
        .await?
        .data
        .into_iter()
        .find(|a| a.name == name);
    if let Some(account) = existing {
        return Ok(account);
    }

    let account = accounts
        .create(
            ctx,
            CreateAccountInput {
                kind: AccountKind::Cash,
                name: name.to_string(),
                owner_id: None,
                credit_limit: Amount::ZERO,
            },
        )
        .await?;
    Ok(account)
}
