use chrono::Duration;

use engine::{EngineError, GrantLoanCmd, LoanStatus, Money, TransactionKind};

mod common;
use common::engine_with_db;

#[tokio::test]
async fn deposit_moves_pocket_into_bank() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    let account = env.engine.deposit("alice", Money::new(4000)).await.unwrap();

    assert_eq!(account.bank_balance, Money::new(4000));
    assert_eq!(
        env.engine.balance("alice").await.unwrap(),
        starting - Money::new(4000)
    );

    let history = env.engine.list_transactions("alice", 10).await.unwrap();
    assert_eq!(history[0].kind, TransactionKind::BankDeposit);
}

#[tokio::test]
async fn deposit_shortfall_leaves_both_balances_unchanged() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    let err = env
        .engine
        .deposit("alice", starting + Money::new(1))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientFunds("alice".to_string()));

    assert_eq!(env.engine.balance("alice").await.unwrap(), starting);
    // The rolled-back deposit must not even have opened the account.
    assert!(env.engine.bank_account("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn withdraw_round_trips_and_guards_the_bank_balance() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    env.engine.deposit("alice", Money::new(4000)).await.unwrap();
    let account = env
        .engine
        .withdraw("alice", Money::new(1500))
        .await
        .unwrap();

    assert_eq!(account.bank_balance, Money::new(2500));
    assert_eq!(
        env.engine.balance("alice").await.unwrap(),
        starting - Money::new(2500)
    );

    let err = env
        .engine
        .withdraw("alice", Money::new(9999))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientFunds("alice".to_string()));

    let err = env
        .engine
        .withdraw("nobody", Money::new(1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("bank account not exists".to_string())
    );
}

#[tokio::test]
async fn interest_accrues_once_per_period() {
    let env = engine_with_db().await;
    env.engine
        .deposit("alice", Money::new(10000))
        .await
        .unwrap();

    // Within the first period nothing is due.
    assert_eq!(env.engine.accrue_interest().await.unwrap(), 0);

    env.clock.advance(Duration::hours(25));
    assert_eq!(env.engine.accrue_interest().await.unwrap(), 1);
    let account = env.engine.bank_account("alice").await.unwrap().unwrap();
    assert_eq!(account.bank_balance, Money::new(10100));

    // A second run in the same period must not double-credit.
    assert_eq!(env.engine.accrue_interest().await.unwrap(), 0);
    let account = env.engine.bank_account("alice").await.unwrap().unwrap();
    assert_eq!(account.bank_balance, Money::new(10100));

    // The next period compounds on the new balance.
    env.clock.advance(Duration::hours(24));
    assert_eq!(env.engine.accrue_interest().await.unwrap(), 1);
    let account = env.engine.bank_account("alice").await.unwrap().unwrap();
    assert_eq!(account.bank_balance, Money::new(10201));

    let history = env.engine.list_transactions("alice", 10).await.unwrap();
    assert_eq!(history[0].kind, TransactionKind::BankInterest);
    assert_eq!(history[0].amount, Money::new(101));
}

#[tokio::test]
async fn grant_loan_credits_the_pocket() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    let loan = env
        .engine
        .grant_loan(GrantLoanCmd::new("alice", Money::new(10000), 7))
        .await
        .unwrap();

    assert_eq!(loan.status, LoanStatus::Active);
    assert_eq!(loan.principal, Money::new(10000));
    assert_eq!(loan.remaining_amount, Money::new(10000));
    assert_eq!(
        env.engine.balance("alice").await.unwrap(),
        starting + Money::new(10000)
    );

    let active = env.engine.active_loan("alice").await.unwrap().unwrap();
    assert_eq!(active.id, loan.id);
}

#[tokio::test]
async fn loan_policy_limits_are_enforced() {
    let env = engine_with_db().await;
    let max_amount = env.engine.policy().bank.max_loan_amount;
    let max_days = env.engine.policy().bank.max_loan_days;

    let err = env
        .engine
        .grant_loan(GrantLoanCmd::new("alice", max_amount + Money::new(1), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::LoanLimitExceeded(_)));

    let err = env
        .engine
        .grant_loan(GrantLoanCmd::new("alice", Money::new(100), max_days + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::LoanLimitExceeded(_)));

    env.engine
        .grant_loan(GrantLoanCmd::new("alice", Money::new(100), 1))
        .await
        .unwrap();
    let err = env
        .engine
        .grant_loan(GrantLoanCmd::new("alice", Money::new(100), 1))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::LoanAlreadyActive("alice".to_string()));
}

#[tokio::test]
async fn chunked_payments_settle_the_loan() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    env.engine
        .grant_loan(GrantLoanCmd::new("alice", Money::new(10000), 7))
        .await
        .unwrap();

    let loan = env
        .engine
        .pay_loan("alice", Money::new(7000))
        .await
        .unwrap();
    assert_eq!(loan.remaining_amount, Money::new(3000));
    assert_eq!(loan.status, LoanStatus::Active);

    let loan = env
        .engine
        .pay_loan("alice", Money::new(3000))
        .await
        .unwrap();
    assert_eq!(loan.remaining_amount, Money::ZERO);
    assert_eq!(loan.status, LoanStatus::Paid);

    // Grant and repayment cancel out.
    assert_eq!(env.engine.balance("alice").await.unwrap(), starting);
    assert!(env.engine.active_loan("alice").await.unwrap().is_none());

    let err = env
        .engine
        .pay_loan("alice", Money::new(1))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("active loan".to_string()));
}

#[tokio::test]
async fn overpayment_only_takes_the_remaining_amount() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    env.engine
        .grant_loan(GrantLoanCmd::new("alice", Money::new(1000), 3))
        .await
        .unwrap();

    let loan = env
        .engine
        .pay_loan("alice", Money::new(5000))
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Paid);
    assert_eq!(loan.remaining_amount, Money::ZERO);

    // Only the remaining 1000 was debited, not the requested 5000.
    assert_eq!(env.engine.balance("alice").await.unwrap(), starting);
}

#[tokio::test]
async fn payment_requires_the_full_requested_amount_in_pocket() {
    let env = engine_with_db().await;

    env.engine
        .grant_loan(GrantLoanCmd::new("alice", Money::new(1000), 3))
        .await
        .unwrap();
    let pocket = env.engine.balance("alice").await.unwrap();

    let err = env
        .engine
        .pay_loan("alice", pocket + Money::new(1))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientFunds("alice".to_string()));

    let loan = env.engine.active_loan("alice").await.unwrap().unwrap();
    assert_eq!(loan.remaining_amount, Money::new(1000));
    assert_eq!(env.engine.balance("alice").await.unwrap(), pocket);
}

#[tokio::test]
async fn overdue_loans_default_without_penalty() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    env.engine
        .grant_loan(GrantLoanCmd::new("alice", Money::new(1000), 3))
        .await
        .unwrap();

    // Not yet due.
    assert_eq!(env.engine.loan_default_sweep().await.unwrap(), 0);

    env.clock.advance(Duration::days(4));
    assert_eq!(env.engine.loan_default_sweep().await.unwrap(), 1);
    assert_eq!(env.engine.loan_default_sweep().await.unwrap(), 0);

    assert!(env.engine.active_loan("alice").await.unwrap().is_none());
    let loans = env.engine.loans("alice").await.unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].status, LoanStatus::Defaulted);
    // No penalty was charged.
    assert_eq!(
        env.engine.balance("alice").await.unwrap(),
        starting + Money::new(1000)
    );

    // A defaulted loan no longer accepts payments.
    let err = env
        .engine
        .pay_loan("alice", Money::new(100))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("active loan".to_string()));
}
