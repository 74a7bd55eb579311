//! `SeaORM` Entity for cash_register_sessions table.
//!
//! `open_scope_key` equals `scope_key` while the session is open and is
//! cleared on close; a unique index on `(tenant_id, open_scope_key)` allows a
//! single open session per scope.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SessionStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_register_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub location_id: Uuid,
    pub operator_id: Uuid,
    pub scope_key: String,
    pub open_scope_key: Option<String>,
    pub status: SessionStatus,
    pub account_id: Uuid,
    pub opening_balance_minor: i64,
    pub closing_balance_declared_minor: Option<i64>,
    pub expected_balance_minor: Option<i64>,
    pub discrepancy_minor: Option<i64>,
    pub notes: Option<String>,
    pub opened_at: DateTimeUtc,
    pub opened_by: Uuid,
    pub closed_at: Option<DateTimeUtc>,
    pub closed_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ledger_accounts::Entity",
        from = "Column::AccountId",
        to = "super::ledger_accounts::Column::Id"
    )]
    LedgerAccounts,
}

impl Related<super::ledger_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
