//! Caller identity supplied by the authentication collaborator.

use serde::{Deserialize, Serialize};

use super::id::{ActorId, TenantId};

/// Who is calling, and on behalf of which tenant.
///
/// The ledger trusts this value; authentication and role resolution happen
/// upstream. Every query is filtered by `tenant_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Tenant whose books are being touched.
    pub tenant_id: TenantId,
    /// User recorded on every movement written.
    pub actor_id: ActorId,
    /// Role name as resolved upstream. Recorded for audit only.
    pub role: String,
}

impl TenantContext {
    /// Creates a context.
    #[must_use]
    pub fn new(tenant_id: TenantId, actor_id: ActorId, role: impl Into<String>) -> Self {
        Self {
            tenant_id,
            actor_id,
            role: role.into(),
        }
    }
}
