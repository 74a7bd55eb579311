//! Caller identity supplied by the gateway.
//!
//! Authentication happens upstream. The gateway forwards the resolved
//! identity in three headers, which are trusted as-is:
//! `x-tenant-id`, `x-actor-id` and `x-actor-role`.

use axum::{extract::FromRequestParts, http::request::Parts};
use tillbook_shared::types::{ActorId, TenantId};
use tillbook_shared::{AppError, TenantContext};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the tenant id.
pub const TENANT_HEADER: &str = "x-tenant-id";
/// Header carrying the acting user id.
pub const ACTOR_HEADER: &str = "x-actor-id";
/// Header carrying the acting user's role.
pub const ROLE_HEADER: &str = "x-actor-role";

/// Extractor for the authenticated tenant context.
///
/// ```ignore
/// async fn handler(AuthTenant(ctx): AuthTenant) -> impl IntoResponse {
///     let tenant = ctx.tenant_id;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthTenant(pub TenantContext);

impl AuthTenant {
    /// Returns the inner context.
    #[must_use]
    pub fn context(&self) -> &TenantContext {
        &self.0
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn uuid_header(parts: &Parts, name: &str) -> Result<Uuid, AppError> {
    let raw = header(parts, name)
        .ok_or_else(|| AppError::Unauthorized(format!("{name} header is required")))?;
    Uuid::parse_str(raw).map_err(|_| AppError::Unauthorized(format!("{name} must be a UUID")))
}

impl<S> FromRequestParts<S> for AuthTenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = TenantId::from(uuid_header(parts, TENANT_HEADER)?);
        let actor_id = ActorId::from(uuid_header(parts, ACTOR_HEADER)?);
        let role = header(parts, ROLE_HEADER).unwrap_or("operator");

        Ok(Self(TenantContext::new(tenant_id, actor_id, role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(request: Request<()>) -> Result<AuthTenant, ApiError> {
        let (mut parts, ()) = request.into_parts();
        AuthTenant::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_gateway_headers() {
        let tenant = Uuid::now_v7();
        let actor = Uuid::now_v7();
        let request = Request::builder()
            .header(TENANT_HEADER, tenant.to_string())
            .header(ACTOR_HEADER, actor.to_string())
            .header(ROLE_HEADER, "manager")
            .body(())
            .unwrap();

        let AuthTenant(ctx) = extract(request).await.unwrap();
        assert_eq!(ctx.tenant_id.into_inner(), tenant);
        assert_eq!(ctx.actor_id.into_inner(), actor);
        assert_eq!(ctx.role, "manager");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_identity_is_unauthorized() {
        let request = Request::builder()
            .header(TENANT_HEADER, Uuid::now_v7().to_string())
            .body(())
            .unwrap();
        let err = extract(request).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .header(TENANT_HEADER, "not-a-uuid")
            .header(ACTOR_HEADER, Uuid::now_v7().to_string())
            .body(())
            .unwrap();
        let err = extract(request).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
