//! Ledger schema.
//!
//! - `ledger_accounts`: running balances with an optimistic `version`
//! - `movements`: append-only chain, unique `(account_id, sequence)`
//! - `cash_register_sessions`: unique `(tenant_id, open_scope_key)` while open
//! - `payment_method_accounts`: per-tenant payment method to account mapping

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum LedgerAccounts {
    Table,
    Id,
    TenantId,
    Kind,
    OwnerId,
    Name,
    BalanceMinor,
    OpeningBalanceMinor,
    CreditLimitMinor,
    IsActive,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    TenantId,
    AccountId,
    MovementType,
    AmountMinor,
    Sequence,
    BalanceBeforeMinor,
    BalanceAfterMinor,
    Concept,
    Reference,
    Category,
    DocumentType,
    DocumentId,
    SessionId,
    TransferGroupId,
    ActorId,
    CreatedAt,
}

#[derive(Iden)]
enum CashRegisterSessions {
    Table,
    Id,
    TenantId,
    LocationId,
    OperatorId,
    ScopeKey,
    OpenScopeKey,
    Status,
    AccountId,
    OpeningBalanceMinor,
    ClosingBalanceDeclaredMinor,
    ExpectedBalanceMinor,
    DiscrepancyMinor,
    Notes,
    OpenedAt,
    OpenedBy,
    ClosedAt,
    ClosedBy,
}

#[derive(Iden)]
enum PaymentMethodAccounts {
    Table,
    Id,
    TenantId,
    Method,
    AccountId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Ledger accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerAccounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LedgerAccounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LedgerAccounts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(LedgerAccounts::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerAccounts::OwnerId).uuid())
                    .col(ColumnDef::new(LedgerAccounts::Name).string().not_null())
                    .col(
                        ColumnDef::new(LedgerAccounts::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::OpeningBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::CreditLimitMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_accounts_tenant_kind")
                    .table(LedgerAccounts::Table)
                    .col(LedgerAccounts::TenantId)
                    .col(LedgerAccounts::Kind)
                    .to_owned(),
            )
            .await?;

        // One current account per customer / supplier.
        manager
            .create_index(
                Index::create()
                    .name("uq_ledger_accounts_owner")
                    .table(LedgerAccounts::Table)
                    .col(LedgerAccounts::TenantId)
                    .col(LedgerAccounts::Kind)
                    .col(LedgerAccounts::OwnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Movements::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Movements::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Movements::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Movements::MovementType).string_len(16).not_null())
                    .col(ColumnDef::new(Movements::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Movements::Sequence).big_integer().not_null())
                    .col(
                        ColumnDef::new(Movements::BalanceBeforeMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Movements::BalanceAfterMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::Concept).string().not_null())
                    .col(ColumnDef::new(Movements::Reference).string())
                    .col(ColumnDef::new(Movements::Category).string())
                    .col(ColumnDef::new(Movements::DocumentType).string_len(64))
                    .col(ColumnDef::new(Movements::DocumentId).uuid())
                    .col(ColumnDef::new(Movements::SessionId).uuid())
                    .col(ColumnDef::new(Movements::TransferGroupId).uuid())
                    .col(ColumnDef::new(Movements::ActorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Movements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movements_account")
                            .from(Movements::Table, Movements::AccountId)
                            .to(LedgerAccounts::Table, LedgerAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Serializes writers: two posts can never claim the same slot.
        manager
            .create_index(
                Index::create()
                    .name("uq_movements_account_sequence")
                    .table(Movements::Table)
                    .col(Movements::AccountId)
                    .col(Movements::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movements_session")
                    .table(Movements::Table)
                    .col(Movements::SessionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Cash register sessions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CashRegisterSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashRegisterSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashRegisterSessions::TenantId).uuid().not_null())
                    .col(ColumnDef::new(CashRegisterSessions::LocationId).uuid().not_null())
                    .col(ColumnDef::new(CashRegisterSessions::OperatorId).uuid().not_null())
                    .col(
                        ColumnDef::new(CashRegisterSessions::ScopeKey)
                            .string_len(96)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashRegisterSessions::OpenScopeKey).string_len(96))
                    .col(
                        ColumnDef::new(CashRegisterSessions::Status)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashRegisterSessions::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(CashRegisterSessions::OpeningBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashRegisterSessions::ClosingBalanceDeclaredMinor).big_integer())
                    .col(ColumnDef::new(CashRegisterSessions::ExpectedBalanceMinor).big_integer())
                    .col(ColumnDef::new(CashRegisterSessions::DiscrepancyMinor).big_integer())
                    .col(ColumnDef::new(CashRegisterSessions::Notes).text())
                    .col(
                        ColumnDef::new(CashRegisterSessions::OpenedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashRegisterSessions::OpenedBy).uuid().not_null())
                    .col(ColumnDef::new(CashRegisterSessions::ClosedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CashRegisterSessions::ClosedBy).uuid())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cash_register_sessions_account")
                            .from(CashRegisterSessions::Table, CashRegisterSessions::AccountId)
                            .to(LedgerAccounts::Table, LedgerAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // NULLs are distinct, so only open sessions compete for the key.
        manager
            .create_index(
                Index::create()
                    .name("uq_cash_register_sessions_open_scope")
                    .table(CashRegisterSessions::Table)
                    .col(CashRegisterSessions::TenantId)
                    .col(CashRegisterSessions::OpenScopeKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cash_register_sessions_tenant_status")
                    .table(CashRegisterSessions::Table)
                    .col(CashRegisterSessions::TenantId)
                    .col(CashRegisterSessions::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Payment method mapping
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PaymentMethodAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentMethodAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentMethodAccounts::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaymentMethodAccounts::Method)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentMethodAccounts::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaymentMethodAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_method_accounts_account")
                            .from(PaymentMethodAccounts::Table, PaymentMethodAccounts::AccountId)
                            .to(LedgerAccounts::Table, LedgerAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_payment_method_accounts_tenant_method")
                    .table(PaymentMethodAccounts::Table)
                    .col(PaymentMethodAccounts::TenantId)
                    .col(PaymentMethodAccounts::Method)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentMethodAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CashRegisterSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerAccounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
