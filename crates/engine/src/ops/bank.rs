//! Bank operations: interest-bearing deposits and short-term loans.
//!
//! Pocket and bank balances only move together inside one unit of work, so a
//! failure in either half rolls the whole operation back instead of stranding
//! funds between the two.

use chrono::Duration;
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, GrantLoanCmd, Money, ResultEngine, TransferCmd,
    bank_accounts::{self, BankAccount},
    loans::{self, Loan, LoanStatus},
    transactions::{LedgerTransaction, TransactionKind},
};

use super::{Engine, with_tx};

impl Engine {
    /// Move pocket money into the owner's bank balance, opening the account
    /// at the configured interest rate on first use.
    pub async fn deposit(&self, owner_id: &str, amount: Money) -> ResultEngine<BankAccount> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "deposit must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.apply_transfer(
                &db_tx,
                &TransferCmd::new(amount, TransactionKind::BankDeposit, "bank deposit")
                    .from(owner_id),
            )
            .await?;

            self.ensure_bank_account(&db_tx, owner_id).await?;
            bank_accounts::Entity::update_many()
                .col_expr(
                    bank_accounts::Column::BankBalance,
                    Expr::col(bank_accounts::Column::BankBalance).add(amount.minor()),
                )
                .filter(bank_accounts::Column::OwnerId.eq(owner_id))
                .exec(&db_tx)
                .await?;

            self.require_bank_account(&db_tx, owner_id).await
        })
    }

    /// Move bank money back into the owner's pocket.
    pub async fn withdraw(&self, owner_id: &str, amount: Money) -> ResultEngine<BankAccount> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "withdrawal must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.require_bank_account(&db_tx, owner_id).await?;

            // Guarded decrement, mirroring the pocket-debit discipline.
            let result = bank_accounts::Entity::update_many()
                .col_expr(
                    bank_accounts::Column::BankBalance,
                    Expr::col(bank_accounts::Column::BankBalance).sub(amount.minor()),
                )
                .filter(bank_accounts::Column::OwnerId.eq(owner_id))
                .filter(bank_accounts::Column::BankBalance.gte(amount.minor()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::InsufficientFunds(owner_id.to_string()));
            }

            self.apply_transfer(
                &db_tx,
                &TransferCmd::new(amount, TransactionKind::BankWithdraw, "bank withdrawal")
                    .to(owner_id),
            )
            .await?;

            self.require_bank_account(&db_tx, owner_id).await
        })
    }

    /// Credit one period of interest to every funded account whose last
    /// accrual is at least one period old. Safe to run on any cadence: the
    /// age gate plus the conditional update keep it idempotent per period.
    ///
    /// Returns the number of accounts credited.
    pub async fn accrue_interest(&self) -> ResultEngine<u64> {
        let now = self.now();
        let cutoff = now - Duration::hours(self.policy.bank.interest_period_hours);

        with_tx!(self, |db_tx| {
            let due: Vec<bank_accounts::Model> = bank_accounts::Entity::find()
                .filter(bank_accounts::Column::BankBalance.gt(0))
                .filter(bank_accounts::Column::LastInterestAt.lte(cutoff))
                .all(&db_tx)
                .await?;

            let mut credited = 0u64;
            for model in due {
                let account = BankAccount::from(model.clone());
                let interest = account.interest_due();

                // Conditional on last_interest_at so a concurrent accrual of
                // the same period affects zero rows here.
                let result = bank_accounts::Entity::update_many()
                    .col_expr(
                        bank_accounts::Column::BankBalance,
                        Expr::col(bank_accounts::Column::BankBalance).add(interest.minor()),
                    )
                    .col_expr(bank_accounts::Column::LastInterestAt, Expr::value(now))
                    .filter(bank_accounts::Column::OwnerId.eq(model.owner_id.clone()))
                    .filter(bank_accounts::Column::LastInterestAt.eq(model.last_interest_at))
                    .exec(&db_tx)
                    .await?;
                if result.rows_affected == 0 {
                    continue;
                }

                if interest.is_positive() {
                    let record = LedgerTransaction::new(
                        None,
                        Some(account.owner_id.clone()),
                        interest,
                        TransactionKind::BankInterest,
                        "deposit interest".to_string(),
                        now,
                    )?;
                    self.record_transaction(&db_tx, &record).await?;
                    credited += 1;
                }
            }

            if credited > 0 {
                tracing::info!(accounts = credited, "interest accrued");
            }
            Ok(credited)
        })
    }

    /// Grant a loan within the configured caps; the loan row and the pocket
    /// credit commit together.
    pub async fn grant_loan(&self, cmd: GrantLoanCmd) -> ResultEngine<Loan> {
        if !cmd.amount.is_positive() || cmd.days <= 0 {
            return Err(EngineError::InvalidAmount(
                "loan amount and days must be > 0".to_string(),
            ));
        }
        if cmd.amount > self.policy.bank.max_loan_amount {
            return Err(EngineError::LoanLimitExceeded(format!(
                "amount {} exceeds maximum {}",
                cmd.amount, self.policy.bank.max_loan_amount
            )));
        }
        if cmd.days > self.policy.bank.max_loan_days {
            return Err(EngineError::LoanLimitExceeded(format!(
                "{} days exceeds maximum {}",
                cmd.days, self.policy.bank.max_loan_days
            )));
        }

        let now = self.now();
        with_tx!(self, |db_tx| {
            if self
                .find_active_loan(&db_tx, &cmd.owner_id)
                .await?
                .is_some()
            {
                return Err(EngineError::LoanAlreadyActive(cmd.owner_id.clone()));
            }

            let loan = Loan::new(
                cmd.owner_id.clone(),
                cmd.amount,
                self.policy.bank.loan_interest_rate,
                now,
                now + Duration::days(cmd.days),
            );
            loans::ActiveModel::from(&loan).insert(&db_tx).await?;

            self.apply_transfer(
                &db_tx,
                &TransferCmd::new(cmd.amount, TransactionKind::LoanGrant, "loan granted")
                    .to(cmd.owner_id.clone()),
            )
            .await?;

            tracing::info!(owner = %cmd.owner_id, principal = %cmd.amount, days = cmd.days, "loan granted");
            Ok(loan)
        })
    }

    /// Pay down the owner's active loan. Pays `min(amount, remaining)` and
    /// transitions to PAID when the remaining amount reaches zero.
    pub async fn pay_loan(&self, owner_id: &str, amount: Money) -> ResultEngine<Loan> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "payment must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let loan = self
                .find_active_loan(&db_tx, owner_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("active loan".to_string()))?;

            let pocket = self.ensure_account(&db_tx, owner_id).await?;
            if pocket < amount {
                return Err(EngineError::InsufficientFunds(owner_id.to_string()));
            }

            let payment = amount.min(loan.remaining_amount);
            let remaining = loan.remaining_amount - payment;
            let status = if remaining.is_zero() {
                LoanStatus::Paid
            } else {
                LoanStatus::Active
            };

            // Versioned write: the observed remaining amount is the version.
            let result = loans::Entity::update_many()
                .col_expr(
                    loans::Column::RemainingAmount,
                    Expr::value(remaining.minor()),
                )
                .col_expr(loans::Column::Status, Expr::value(status.as_str()))
                .filter(loans::Column::Id.eq(loan.id.to_string()))
                .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
                .filter(loans::Column::RemainingAmount.eq(loan.remaining_amount.minor()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::AlreadyResolved(loan.id.to_string()));
            }

            self.apply_transfer(
                &db_tx,
                &TransferCmd::new(payment, TransactionKind::LoanPayment, "loan payment")
                    .from(owner_id),
            )
            .await?;

            tracing::info!(owner = owner_id, payment = %payment, remaining = %remaining, "loan payment");
            Ok(Loan {
                remaining_amount: remaining,
                status,
                ..loan
            })
        })
    }

    /// Mark active loans past their due date as DEFAULTED. No penalty is
    /// applied and no money moves; the status transition only makes the
    /// default visible. Returns the number of loans marked.
    pub async fn loan_default_sweep(&self) -> ResultEngine<u64> {
        let now = self.now();
        let result = loans::Entity::update_many()
            .col_expr(
                loans::Column::Status,
                Expr::value(LoanStatus::Defaulted.as_str()),
            )
            .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
            .filter(loans::Column::DueAt.lte(now))
            .exec(&self.database)
            .await?;

        if result.rows_affected > 0 {
            tracing::warn!(loans = result.rows_affected, "loans defaulted");
        }
        Ok(result.rows_affected)
    }

    /// Return the owner's bank account, if one has been opened.
    pub async fn bank_account(&self, owner_id: &str) -> ResultEngine<Option<BankAccount>> {
        let model = bank_accounts::Entity::find_by_id(owner_id.to_string())
            .one(&self.database)
            .await?;
        Ok(model.map(BankAccount::from))
    }

    /// Return the owner's ACTIVE loan, if any.
    pub async fn active_loan(&self, owner_id: &str) -> ResultEngine<Option<Loan>> {
        let model = loans::Entity::find()
            .filter(loans::Column::OwnerId.eq(owner_id))
            .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
            .one(&self.database)
            .await?;
        model.map(Loan::try_from).transpose()
    }

    /// Full loan history for one owner, newest first.
    pub async fn loans(&self, owner_id: &str) -> ResultEngine<Vec<Loan>> {
        let models = loans::Entity::find()
            .filter(loans::Column::OwnerId.eq(owner_id))
            .order_by_desc(loans::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Loan::try_from).collect()
    }

    async fn ensure_bank_account(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<()> {
        if bank_accounts::Entity::find_by_id(owner_id.to_string())
            .one(db_tx)
            .await?
            .is_none()
        {
            let account =
                BankAccount::new(owner_id, self.policy.bank.interest_rate, self.now());
            bank_accounts::ActiveModel::from(&account)
                .insert(db_tx)
                .await?;
        }
        Ok(())
    }

    async fn require_bank_account(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<BankAccount> {
        bank_accounts::Entity::find_by_id(owner_id.to_string())
            .one(db_tx)
            .await?
            .map(BankAccount::from)
            .ok_or_else(|| EngineError::KeyNotFound("bank account not exists".to_string()))
    }

    async fn find_active_loan(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<Option<Loan>> {
        let model = loans::Entity::find()
            .filter(loans::Column::OwnerId.eq(owner_id))
            .filter(loans::Column::Status.eq(LoanStatus::Active.as_str()))
            .one(db_tx)
            .await?;
        model.map(Loan::try_from).transpose()
    }
}
