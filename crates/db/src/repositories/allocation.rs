//! Multi-method payment allocator.
//!
//! Splits one total across payment legs and posts every ledger-affecting leg
//! inside a single store transaction: either all legs land or none do.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tillbook_core::ledger::{
    AccountKind, CreditLimitPolicy, CreditPolicy, LedgerError, Movement, MovementType,
};
use tillbook_core::payment::{
    AllocationContext, AllocationResult, LegRoute, PaymentAllocation, PaymentLeg, UnmappedLeg,
};
use tillbook_core::register::ensure_open;
use tillbook_shared::types::{AccountId, CustomerId, SessionId};
use tillbook_shared::{Amount, LedgerConfig, TenantContext};
use tracing::{info, warn};

use super::payment_method::PaymentMethodResolver;
use super::store::{
    apply_movement, find_session, lock_account, lock_owner_account, store_error, with_retry,
    MovementDraft,
};

/// Resolved destination of one leg.
#[derive(Debug, Clone, Copy)]
enum Target {
    Session(SessionId),
    Account(AccountId),
    Customer(CustomerId),
}

#[derive(Debug, Clone)]
struct TargetedLeg {
    index: usize,
    leg: PaymentLeg,
    target: Target,
}

/// Allocates payments across ledger accounts.
#[derive(Clone)]
pub struct PaymentAllocator {
    db: DatabaseConnection,
    resolver: Arc<dyn PaymentMethodResolver>,
    policy: Arc<dyn CreditPolicy>,
    tolerance: Decimal,
    max_retries: u32,
}

impl PaymentAllocator {
    /// Creates an allocator with the default [`CreditLimitPolicy`].
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        resolver: Arc<dyn PaymentMethodResolver>,
        config: &LedgerConfig,
    ) -> Self {
        Self {
            db,
            resolver,
            policy: Arc::new(CreditLimitPolicy),
            tolerance: config.allocation_tolerance,
            max_retries: config.max_retries,
        }
    }

    /// Replaces the credit policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn CreditPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Validates the split and commits one movement per ledger-affecting leg.
    ///
    /// Legs whose method has no mapped account are accepted and reported in
    /// [`AllocationResult::unmapped`].
    ///
    /// # Errors
    ///
    /// `UnbalancedPayment`, `InvalidAmount`, `MissingConcept` and
    /// `MissingCustomer` before anything is written. A leg that fails to post
    /// rolls back every leg and comes back as `LegRejected`, carrying the leg
    /// index and the underlying `AccountNotFound`, `SessionAlreadyClosed`,
    /// `InsufficientCredit` or other posting error.
    pub async fn allocate(
        &self,
        ctx: &TenantContext,
        total_due: Amount,
        legs: &[PaymentLeg],
        context: &AllocationContext,
    ) -> Result<AllocationResult, LedgerError> {
        let plan = PaymentAllocation::plan(total_due, legs, context, self.tolerance)?;
        let concept = context.concept.trim().to_string();

        let mut targeted = Vec::with_capacity(plan.legs.len());
        let mut unmapped = Vec::new();
        for routed in plan.legs {
            let target = match routed.route {
                LegRoute::RegisterSession(session_id) => Target::Session(session_id),
                LegRoute::CustomerAccount(customer_id) => Target::Customer(customer_id),
                LegRoute::MappedMethod(method) => {
                    if let Some(account_id) = self.resolver.resolve(ctx.tenant_id, method).await? {
                        Target::Account(account_id)
                    } else {
                        warn!(
                            tenant_id = %ctx.tenant_id,
                            leg_index = routed.index,
                            %method,
                            amount = %routed.leg.amount,
                            "payment method has no mapped account, leg recorded without ledger effect"
                        );
                        unmapped.push(UnmappedLeg {
                            index: routed.index,
                            method,
                            amount: routed.leg.amount,
                        });
                        continue;
                    }
                }
            };
            targeted.push(TargetedLeg {
                index: routed.index,
                leg: routed.leg,
                target,
            });
        }

        let movements = with_retry("allocate", self.max_retries, || {
            self.allocate_once(ctx, &targeted, &concept, context)
        })
        .await?;

        info!(
            tenant_id = %ctx.tenant_id,
            %total_due,
            leg_total = %plan.leg_total,
            movements = movements.len(),
            unmapped = unmapped.len(),
            "payment allocated"
        );
        Ok(AllocationResult {
            movements,
            unmapped,
            leg_total: plan.leg_total,
            rounding_difference: plan.rounding_difference,
        })
    }

    async fn allocate_once(
        &self,
        ctx: &TenantContext,
        legs: &[TargetedLeg],
        concept: &str,
        context: &AllocationContext,
    ) -> Result<Vec<Movement>, LedgerError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        let mut movements = Vec::with_capacity(legs.len());

        for targeted in legs {
            let movement = self
                .post_leg(&txn, ctx, targeted, concept, context)
                .await
                .map_err(|err| {
                    warn!(
                        leg_index = targeted.index,
                        method = %targeted.leg.method,
                        error = %err,
                        "payment leg rejected"
                    );
                    if err.is_retryable() {
                        err
                    } else {
                        LedgerError::LegRejected {
                            leg_index: targeted.index,
                            source: Box::new(err),
                        }
                    }
                })?;
            movements.push(movement);
        }

        txn.commit().await.map_err(store_error)?;
        Ok(movements)
    }

    async fn post_leg(
        &self,
        txn: &DatabaseTransaction,
        ctx: &TenantContext,
        targeted: &TargetedLeg,
        concept: &str,
        context: &AllocationContext,
    ) -> Result<Movement, LedgerError> {
        let tenant = ctx.tenant_id.into_inner();
        let leg = &targeted.leg;
        let base = MovementDraft {
            reference: leg
                .transfer_reference
                .as_deref()
                .or(context.reference.as_deref()),
            category: Some(leg.method.as_str()),
            document: context.document.as_ref(),
            ..MovementDraft::new(MovementType::Received, leg.amount, concept)
        };

        let (row, draft) = match targeted.target {
            Target::Session(session_id) => {
                let session = find_session(txn, tenant, session_id.into_inner()).await?;
                ensure_open(session.id, session.status.into())?;
                let row = lock_account(txn, tenant, session.account_id).await?;
                (
                    row,
                    MovementDraft {
                        session_id: Some(session_id),
                        ..base
                    },
                )
            }
            Target::Account(account_id) => {
                (lock_account(txn, tenant, account_id.into_inner()).await?, base)
            }
            Target::Customer(customer_id) => {
                let row = lock_owner_account(
                    txn,
                    tenant,
                    AccountKind::Customer,
                    customer_id.into_inner(),
                )
                .await?
                .ok_or(LedgerError::AccountNotFound(customer_id.into_inner()))?;
                (
                    row,
                    MovementDraft {
                        movement_type: MovementType::Charge,
                        amount: -leg.amount,
                        ..base
                    },
                )
            }
        };

        apply_movement(txn, ctx, self.policy.as_ref(), row, &draft).await
    }
}
