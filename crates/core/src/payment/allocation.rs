//! Validation and routing of multi-method payments.
//!
//! Nothing here touches storage. The allocator in the persistence layer
//! calls [`PaymentAllocation::plan`] first and only opens a transaction for
//! a plan that passed.

use rust_decimal::Decimal;
use tillbook_shared::Amount;

use super::types::{AllocationContext, AllocationPlan, LegRoute, PaymentLeg, PaymentMethod, RoutedLeg};
use crate::ledger::LedgerError;

/// Default allowed gap between Σ legs and the total due.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Payment allocation rules.
pub struct PaymentAllocation;

impl PaymentAllocation {
    /// Validates the split and decides where each leg goes.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for no legs, a non-positive leg, a negative total,
    ///   or legs too large to sum
    /// - `UnbalancedPayment` when `|Σ legs − total_due| > tolerance`
    /// - `MissingCustomer` for an ACCOUNT leg without a customer
    /// - `MissingConcept` for an empty concept
    pub fn plan(
        total_due: Amount,
        legs: &[PaymentLeg],
        context: &AllocationContext,
        tolerance: Decimal,
    ) -> Result<AllocationPlan, LedgerError> {
        if legs.is_empty() {
            return Err(LedgerError::InvalidAmount(
                "at least one payment leg is required".to_string(),
            ));
        }
        if total_due.is_negative() {
            return Err(LedgerError::InvalidAmount(format!(
                "total due {total_due} cannot be negative"
            )));
        }
        if context.concept.trim().is_empty() {
            return Err(LedgerError::MissingConcept);
        }

        for (index, leg) in legs.iter().enumerate() {
            if !leg.amount.is_positive() {
                return Err(LedgerError::InvalidAmount(format!(
                    "payment leg {index} ({}) must be positive, got {}",
                    leg.method, leg.amount
                )));
            }
        }

        let leg_total = legs
            .iter()
            .try_fold(Amount::ZERO, |acc, leg| acc.checked_add(leg.amount))
            .ok_or_else(|| {
                LedgerError::InvalidAmount("payment legs overflow when summed".to_string())
            })?;
        let rounding_difference = leg_total.checked_sub(total_due).ok_or_else(|| {
            LedgerError::InvalidAmount(format!(
                "leg total {leg_total} cannot be compared with total due {total_due}"
            ))
        })?;
        if rounding_difference.abs().value() > tolerance {
            return Err(LedgerError::UnbalancedPayment {
                total_due,
                leg_total,
            });
        }

        let routed = legs
            .iter()
            .enumerate()
            .map(|(index, leg)| {
                Self::route(index, leg, context).map(|route| RoutedLeg {
                    index,
                    leg: leg.clone(),
                    route,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AllocationPlan {
            legs: routed,
            leg_total,
            rounding_difference,
        })
    }

    /// Decides the destination of one leg.
    fn route(index: usize, leg: &PaymentLeg, context: &AllocationContext) -> Result<LegRoute, LedgerError> {
        match leg.method {
            PaymentMethod::Account => context
                .customer_id
                .map(LegRoute::CustomerAccount)
                .ok_or(LedgerError::MissingCustomer { leg_index: index }),
            PaymentMethod::Cash => Ok(context
                .register_session_id
                .map_or(LegRoute::MappedMethod(PaymentMethod::Cash), LegRoute::RegisterSession)),
            method => Ok(LegRoute::MappedMethod(method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tillbook_shared::types::{CustomerId, SessionId};

    fn ctx() -> AllocationContext {
        AllocationContext {
            concept: "Sale #1".into(),
            ..AllocationContext::default()
        }
    }

    fn leg(method: PaymentMethod, value: Decimal) -> PaymentLeg {
        PaymentLeg::new(method, Amount::new(value))
    }

    #[test]
    fn test_three_way_split() {
        let customer = CustomerId::new();
        let session = SessionId::new();
        let context = AllocationContext {
            customer_id: Some(customer),
            register_session_id: Some(session),
            ..ctx()
        };
        let legs = vec![
            leg(PaymentMethod::Cash, dec!(40)),
            leg(PaymentMethod::DebitCard, dec!(35)),
            leg(PaymentMethod::Account, dec!(25)),
        ];
        let plan = PaymentAllocation::plan(Amount::new(dec!(100)), &legs, &context, DEFAULT_TOLERANCE).unwrap();
        assert_eq!(plan.leg_total, Amount::new(dec!(100)));
        assert_eq!(plan.rounding_difference, Amount::ZERO);
        assert_eq!(plan.legs[0].route, LegRoute::RegisterSession(session));
        assert_eq!(plan.legs[1].route, LegRoute::MappedMethod(PaymentMethod::DebitCard));
        assert_eq!(plan.legs[2].route, LegRoute::CustomerAccount(customer));
    }

    #[test]
    fn test_cash_without_session_uses_mapping() {
        let legs = vec![leg(PaymentMethod::Cash, dec!(10))];
        let plan = PaymentAllocation::plan(Amount::new(dec!(10)), &legs, &ctx(), DEFAULT_TOLERANCE).unwrap();
        assert_eq!(plan.legs[0].route, LegRoute::MappedMethod(PaymentMethod::Cash));
    }

    #[test]
    fn test_tolerance_edges() {
        let total = Amount::new(dec!(100));
        let within = vec![leg(PaymentMethod::Cash, dec!(99.99))];
        let plan = PaymentAllocation::plan(total, &within, &ctx(), DEFAULT_TOLERANCE).unwrap();
        assert_eq!(plan.rounding_difference, Amount::new(dec!(-0.01)));

        let over = vec![leg(PaymentMethod::Cash, dec!(100.01))];
        assert!(PaymentAllocation::plan(total, &over, &ctx(), DEFAULT_TOLERANCE).is_ok());

        let outside = vec![leg(PaymentMethod::Cash, dec!(99.98))];
        let err = PaymentAllocation::plan(total, &outside, &ctx(), DEFAULT_TOLERANCE).unwrap_err();
        assert_eq!(
            err,
            LedgerError::UnbalancedPayment {
                total_due: total,
                leg_total: Amount::new(dec!(99.98)),
            }
        );
    }

    #[test]
    fn test_account_leg_requires_customer() {
        let legs = vec![
            leg(PaymentMethod::Cash, dec!(5)),
            leg(PaymentMethod::Account, dec!(5)),
        ];
        let err = PaymentAllocation::plan(Amount::new(dec!(10)), &legs, &ctx(), DEFAULT_TOLERANCE).unwrap_err();
        assert_eq!(err, LedgerError::MissingCustomer { leg_index: 1 });
    }

    #[test]
    fn test_rejects_empty_and_non_positive_legs() {
        let total = Amount::new(dec!(10));
        assert!(matches!(
            PaymentAllocation::plan(total, &[], &ctx(), DEFAULT_TOLERANCE),
            Err(LedgerError::InvalidAmount(_))
        ));
        let legs = vec![leg(PaymentMethod::Qr, dec!(15)), leg(PaymentMethod::Qr, dec!(-5))];
        assert!(matches!(
            PaymentAllocation::plan(total, &legs, &ctx(), DEFAULT_TOLERANCE),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_rejects_blank_concept() {
        let context = AllocationContext {
            concept: "  ".into(),
            ..AllocationContext::default()
        };
        let legs = vec![leg(PaymentMethod::Cash, dec!(1))];
        assert_eq!(
            PaymentAllocation::plan(Amount::new(dec!(1)), &legs, &context, DEFAULT_TOLERANCE),
            Err(LedgerError::MissingConcept)
        );
    }

    #[test]
    fn test_huge_legs_fail_instead_of_overflowing() {
        let legs = vec![
            PaymentLeg::new(PaymentMethod::Cash, Amount::new(Decimal::MAX)),
            PaymentLeg::new(PaymentMethod::Cash, Amount::new(Decimal::MAX)),
        ];
        let result = PaymentAllocation::plan(Amount::from(1), &legs, &ctx(), DEFAULT_TOLERANCE);
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn test_method_names() {
        assert_eq!("debit_card".parse::<PaymentMethod>(), Ok(PaymentMethod::DebitCard));
        assert_eq!(PaymentMethod::Qr.to_string(), "QR");
    }
}
