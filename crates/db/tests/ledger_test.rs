//! Ledger engine tests against an in-memory store.
//!
//! Covers the posting chain, atomicity of rejected posts, the credit
//! boundary, supplier auto-creation, cash transfers and chain audits.

mod common;

use common::{amount, create_cash, create_customer, ledger_config, setup_db, tenant_ctx};
use rust_decimal_macros::dec;
use tillbook_core::ledger::{AccountKind, AccountRef, LedgerError, MovementType, PostMovement};
use tillbook_db::repositories::{AccountRepository, LedgerEngine, TransferRequest};
use tillbook_shared::Amount;
use tillbook_shared::types::{PageRequest, SupplierId};
use uuid::Uuid;

fn post(account: AccountRef, value: Amount, movement_type: MovementType, concept: &str) -> PostMovement {
    PostMovement::new(account, value, movement_type, concept)
}

#[tokio::test]
async fn test_posts_chain_snapshots() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let customer = create_customer(&db, &ctx, Uuid::now_v7(), Amount::ZERO).await;
    let target = AccountRef::Account(customer.id);

    let first = engine
        .post(&ctx, &post(target, amount(dec!(100)), MovementType::Payment, "Payment"))
        .await
        .unwrap();
    let second = engine
        .post(&ctx, &post(target, amount(dec!(-30.50)), MovementType::Charge, "Invoice 7").with_reference("INV-7"))
        .await
        .unwrap();
    let third = engine
        .post(&ctx, &post(target, amount(dec!(-4.50)), MovementType::Adjustment, "Rounding"))
        .await
        .unwrap();

    assert_eq!((first.sequence, second.sequence, third.sequence), (1, 2, 3));
    assert_eq!(first.balance_before, Amount::ZERO);
    assert_eq!(second.balance_before, first.balance_after);
    assert_eq!(third.balance_before, second.balance_after);
    assert_eq!(third.balance_after, amount(dec!(65)));
    assert_eq!(second.reference.as_deref(), Some("INV-7"));
    assert_eq!(first.actor_id, ctx.actor_id);

    let view = engine.get_balance(&ctx, customer.id).await.unwrap();
    assert_eq!(view.balance, amount(dec!(65)));
    assert_eq!(view.version, 3);

    let page = engine
        .list_movements(&ctx, customer.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 3);
    let sequences: Vec<i64> = page.data.iter().map(|m| m.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);

    let report = engine.verify_chain(&ctx, customer.id).await.unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.movement_count, 3);
    assert_eq!(report.replayed_balance, view.balance);
}

#[tokio::test]
async fn test_rejected_post_changes_nothing() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let cash = create_cash(&db, &ctx, "Petty cash").await;
    let target = AccountRef::Account(cash.id);

    engine
        .post(&ctx, &post(target, amount(dec!(20)), MovementType::Income, "Float"))
        .await
        .unwrap();

    let err = engine
        .post(&ctx, &post(target, amount(dec!(-20.01)), MovementType::Expense, "Courier"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    let err = engine
        .post(&ctx, &post(target, amount(dec!(-5)), MovementType::Charge, "Wrong type"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MovementTypeNotAllowed { .. }));

    let view = engine.get_balance(&ctx, cash.id).await.unwrap();
    assert_eq!(view.balance, amount(dec!(20)));
    assert_eq!(view.version, 1);
    let page = engine
        .list_movements(&ctx, cash.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 1);
}

#[tokio::test]
async fn test_rejects_zero_amount_and_blank_concept() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let cash = create_cash(&db, &ctx, "Drawer").await;
    let target = AccountRef::Account(cash.id);

    let err = engine
        .post(&ctx, &post(target, Amount::ZERO, MovementType::Income, "Nothing"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    let err = engine
        .post(&ctx, &post(target, amount(dec!(1)), MovementType::Income, "   "))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::MissingConcept);
}

#[tokio::test]
async fn test_credit_boundary() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let customer = create_customer(&db, &ctx, Uuid::now_v7(), amount(dec!(1000))).await;
    let target = AccountRef::Account(customer.id);

    engine
        .post(&ctx, &post(target, amount(dec!(-1000)), MovementType::Charge, "Full limit"))
        .await
        .unwrap();

    let err = engine
        .post(&ctx, &post(target, amount(dec!(-0.01)), MovementType::Charge, "One cent"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientCredit { available, attempted, .. }
            if available == Amount::ZERO && attempted == amount(dec!(0.01))
    ));
    assert!(err.to_string().contains("insufficient credit: available 0.00, attempted 0.01"));

    engine
        .post(&ctx, &post(target, amount(dec!(0.01)), MovementType::Payment, "Cent back"))
        .await
        .unwrap();
    engine
        .post(&ctx, &post(target, amount(dec!(250)), MovementType::Adjustment, "Goodwill"))
        .await
        .unwrap();

    let view = engine.get_balance(&ctx, customer.id).await.unwrap();
    assert_eq!(view.balance, amount(dec!(-749.99)));
    assert_eq!(view.available_credit, Some(amount(dec!(250.01))));
}

#[tokio::test]
async fn test_inactive_customer_accepts_settlement_only() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let accounts = AccountRepository::new(db.clone());
    let customer = create_customer(&db, &ctx, Uuid::now_v7(), Amount::ZERO).await;
    let target = AccountRef::Account(customer.id);

    engine
        .post(&ctx, &post(target, amount(dec!(-80)), MovementType::Charge, "Sale"))
        .await
        .unwrap();
    accounts.set_active(&ctx, customer.id, false).await.unwrap();

    let err = engine
        .post(&ctx, &post(target, amount(dec!(-1)), MovementType::Charge, "Another sale"))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::AccountInactive(customer.id.into_inner()));

    let movement = engine
        .post(&ctx, &post(target, amount(dec!(80)), MovementType::Payment, "Settle"))
        .await
        .unwrap();
    assert_eq!(movement.balance_after, Amount::ZERO);
}

#[tokio::test]
async fn test_supplier_account_created_on_first_post() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let accounts = AccountRepository::new(db.clone());
    let supplier = SupplierId::new();
    let target = AccountRef::Supplier(supplier);

    assert!(
        accounts
            .find_by_owner(&ctx, AccountKind::Supplier, supplier.into_inner())
            .await
            .unwrap()
            .is_none()
    );

    let invoice = engine
        .post(&ctx, &post(target, amount(dec!(200)), MovementType::Credit, "PO 12 invoice"))
        .await
        .unwrap();
    let paid = engine
        .post(&ctx, &post(target, amount(dec!(-50)), MovementType::Paid, "Partial payment"))
        .await
        .unwrap();
    assert_eq!(invoice.account_id, paid.account_id);
    assert_eq!(paid.balance_after, amount(dec!(150)));

    let err = engine
        .post(&ctx, &post(target, amount(dec!(-150.01)), MovementType::Paid, "Overpay"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    let account = accounts
        .find_by_owner(&ctx, AccountKind::Supplier, supplier.into_inner())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.id, invoice.account_id);
    assert_eq!(account.balance, amount(dec!(150)));
}

#[tokio::test]
async fn test_transfer_moves_cash_atomically() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let till = create_cash(&db, &ctx, "Till").await;
    let bank = create_cash(&db, &ctx, "Bank").await;

    engine
        .post(&ctx, &post(AccountRef::Account(till.id), amount(dec!(100)), MovementType::Income, "Float"))
        .await
        .unwrap();

    let request = TransferRequest {
        from_account_id: till.id,
        to_account_id: bank.id,
        amount: amount(dec!(40)),
        concept: "Deposit".to_string(),
        reference: Some("DEP-1".to_string()),
    };
    let result = engine.transfer(&ctx, &request).await.unwrap();
    assert_eq!(result.outgoing.movement_type, MovementType::TransferOut);
    assert_eq!(result.incoming.movement_type, MovementType::TransferIn);
    assert_eq!(result.outgoing.transfer_group_id, Some(result.transfer_group_id));
    assert_eq!(result.incoming.transfer_group_id, Some(result.transfer_group_id));
    assert_eq!(result.outgoing.amount, amount(dec!(-40)));

    let too_much = TransferRequest {
        amount: amount(dec!(60.01)),
        ..request.clone()
    };
    let err = engine.transfer(&ctx, &too_much).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    let same = TransferRequest {
        to_account_id: till.id,
        ..request.clone()
    };
    assert!(matches!(
        engine.transfer(&ctx, &same).await.unwrap_err(),
        LedgerError::InvalidAmount(_)
    ));

    assert_eq!(engine.get_balance(&ctx, till.id).await.unwrap().balance, amount(dec!(60)));
    assert_eq!(engine.get_balance(&ctx, bank.id).await.unwrap().balance, amount(dec!(40)));
}

#[tokio::test]
async fn test_transfer_into_customer_rolls_back() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let till = create_cash(&db, &ctx, "Till").await;
    let customer = create_customer(&db, &ctx, Uuid::now_v7(), Amount::ZERO).await;

    engine
        .post(&ctx, &post(AccountRef::Account(till.id), amount(dec!(10)), MovementType::Income, "Float"))
        .await
        .unwrap();

    let request = TransferRequest {
        from_account_id: till.id,
        to_account_id: customer.id,
        amount: amount(dec!(5)),
        concept: "Misrouted".to_string(),
        reference: None,
    };
    let err = engine.transfer(&ctx, &request).await.unwrap_err();
    assert!(matches!(err, LedgerError::MovementTypeNotAllowed { .. }));

    let view = engine.get_balance(&ctx, till.id).await.unwrap();
    assert_eq!(view.balance, amount(dec!(10)));
    assert_eq!(view.version, 1);
}

#[tokio::test]
async fn test_accounts_are_tenant_scoped() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let other = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let cash = create_cash(&db, &ctx, "Drawer").await;

    let err = engine.get_balance(&other, cash.id).await.unwrap_err();
    assert_eq!(err, LedgerError::AccountNotFound(cash.id.into_inner()));

    let err = engine
        .post(&other, &post(AccountRef::Account(cash.id), amount(dec!(1)), MovementType::Income, "Intrusion"))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::AccountNotFound(cash.id.into_inner()));
}

#[tokio::test]
async fn test_account_admin_rules() {
    let db = setup_db().await;
    let ctx = tenant_ctx();
    let engine = LedgerEngine::new(db.clone(), &ledger_config());
    let accounts = AccountRepository::new(db.clone());
    let owner = Uuid::now_v7();
    let customer = create_customer(&db, &ctx, owner, Amount::ZERO).await;

    let duplicate = accounts
        .create(
            &ctx,
            tillbook_db::repositories::CreateAccountInput {
                kind: AccountKind::Customer,
                name: "Again".to_string(),
                owner_id: Some(owner),
                credit_limit: Amount::ZERO,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(duplicate, LedgerError::AccountAlreadyExists { .. }));

    let updated = accounts
        .set_credit_limit(&ctx, customer.id, amount(dec!(300)))
        .await
        .unwrap();
    assert_eq!(updated.credit_limit, amount(dec!(300)));
    assert!(matches!(
        accounts.set_credit_limit(&ctx, customer.id, amount(dec!(-1))).await,
        Err(LedgerError::InvalidAccount(_))
    ));

    engine
        .post(&ctx, &post(AccountRef::Account(customer.id), amount(dec!(-10)), MovementType::Charge, "Sale"))
        .await
        .unwrap();
    assert_eq!(
        accounts.delete(&ctx, customer.id).await.unwrap_err(),
        LedgerError::AccountHasMovements(customer.id.into_inner())
    );

    let unused = create_cash(&db, &ctx, "Unused").await;
    accounts.delete(&ctx, unused.id).await.unwrap();
    assert_eq!(
        accounts.get(&ctx, unused.id).await.unwrap_err(),
        LedgerError::AccountNotFound(unused.id.into_inner())
    );
}
