//! Ledger operations: the only mutation path for pocket balances.
//!
//! Every debit is a guarded `UPDATE ... WHERE balance >= amount`, so two
//! concurrent debits of the same owner can never overdraw: the row update is
//! atomic in the store and the loser simply affects zero rows.

use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, TransferCmd,
    accounts::{self, Account},
    transactions::{self, LedgerTransaction, TransactionKind},
};

use super::{Engine, normalize_reason, with_tx};

impl Engine {
    /// Current pocket balance. Never fails: an unknown owner reads as the
    /// configured starting balance without being persisted.
    pub async fn balance(&self, owner_id: &str) -> ResultEngine<Money> {
        let model = accounts::Entity::find_by_id(owner_id.to_string())
            .one(&self.database)
            .await?;
        Ok(model
            .map(|m| Money::new(m.balance))
            .unwrap_or(self.policy.starting_balance))
    }

    /// Move money between owners (or create/destroy it for one-sided admin
    /// and bank kinds). Debit, credit and the audit row commit as one unit.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            let id = self.apply_transfer(&db_tx, &cmd).await?;
            Ok(id)
        })
    }

    /// Administrative balance override, recorded as an `ADMIN_SET` row for
    /// the delta it applies. Setting the current value records nothing.
    pub async fn set_balance(
        &self,
        owner_id: &str,
        amount: Money,
        reason: &str,
    ) -> ResultEngine<()> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "balance must be >= 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let current = self.ensure_account(&db_tx, owner_id).await?;
            let delta = amount - current;
            if !delta.is_zero() {
                accounts::Entity::update_many()
                    .col_expr(accounts::Column::Balance, Expr::value(amount.minor()))
                    .filter(accounts::Column::OwnerId.eq(owner_id))
                    .exec(&db_tx)
                    .await?;

                let (from, to) = if delta.is_positive() {
                    (None, Some(owner_id.to_string()))
                } else {
                    (Some(owner_id.to_string()), None)
                };
                let record = LedgerTransaction::new(
                    from,
                    to,
                    if delta.is_negative() { -delta } else { delta },
                    TransactionKind::AdminSet,
                    normalize_reason(reason),
                    self.now(),
                )?;
                self.record_transaction(&db_tx, &record).await?;

                tracing::info!(owner = owner_id, balance = %amount, "balance override");
            }
            Ok(())
        })
    }

    /// Mint money into an owner's pocket.
    pub async fn admin_add(
        &self,
        owner_id: &str,
        amount: Money,
        reason: &str,
    ) -> ResultEngine<Uuid> {
        self.transfer(TransferCmd::new(amount, TransactionKind::AdminAdd, reason).to(owner_id))
            .await
    }

    /// Burn money from an owner's pocket; fails rather than going negative.
    pub async fn admin_remove(
        &self,
        owner_id: &str,
        amount: Money,
        reason: &str,
    ) -> ResultEngine<Uuid> {
        self.transfer(
            TransferCmd::new(amount, TransactionKind::AdminRemove, reason).from(owner_id),
        )
        .await
    }

    /// Audit trail for one owner, most recent first.
    pub async fn list_transactions(
        &self,
        owner_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<LedgerTransaction>> {
        let models = transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::FromOwnerId.eq(owner_id))
                    .add(transactions::Column::ToOwnerId.eq(owner_id)),
            )
            .order_by_desc(transactions::Column::RecordedAt)
            .limit(limit)
            .all(&self.database)
            .await?;

        models
            .into_iter()
            .map(LedgerTransaction::try_from)
            .collect()
    }

    /// The transfer primitive every component funnels through. Runs inside
    /// the caller's transaction so multi-step operations stay one unit.
    pub(super) async fn apply_transfer(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &TransferCmd,
    ) -> ResultEngine<Uuid> {
        if cmd.kind == TransactionKind::Transfer
            && (cmd.from_owner_id.is_none() || cmd.to_owner_id.is_none())
        {
            return Err(EngineError::InvalidAmount(
                "a plain transfer needs both parties".to_string(),
            ));
        }

        if let Some(key) = &cmd.idempotency_key
            && let Some(existing) = transactions::Entity::find()
                .filter(transactions::Column::IdempotencyKey.eq(key.clone()))
                .one(db_tx)
                .await?
        {
            // Replay of an already-applied call: report the original outcome.
            return Uuid::parse_str(&existing.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()));
        }

        let mut record = LedgerTransaction::new(
            cmd.from_owner_id.clone(),
            cmd.to_owner_id.clone(),
            cmd.amount,
            cmd.kind,
            normalize_reason(&cmd.reason),
            self.now(),
        )?;
        if let Some(key) = &cmd.idempotency_key {
            record = record.idempotency_key(key.clone());
        }

        if let Some(from) = &cmd.from_owner_id {
            self.debit_pocket(db_tx, from, cmd.amount).await?;
        }
        if let Some(to) = &cmd.to_owner_id {
            self.credit_pocket(db_tx, to, cmd.amount).await?;
        }
        self.record_transaction(db_tx, &record).await?;

        tracing::info!(
            from = cmd.from_owner_id.as_deref(),
            to = cmd.to_owner_id.as_deref(),
            amount = %cmd.amount,
            kind = cmd.kind.as_str(),
            "transfer applied"
        );
        Ok(record.id)
    }

    /// Loads the owner's balance, persisting the account at the starting
    /// balance on first mutation.
    pub(super) async fn ensure_account(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
    ) -> ResultEngine<Money> {
        match accounts::Entity::find_by_id(owner_id.to_string())
            .one(db_tx)
            .await?
        {
            Some(model) => Ok(Money::new(model.balance)),
            None => {
                let account = Account::new(owner_id, self.policy.starting_balance);
                accounts::ActiveModel::from(&account).insert(db_tx).await?;
                Ok(self.policy.starting_balance)
            }
        }
    }

    pub(super) async fn debit_pocket(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        amount: Money,
    ) -> ResultEngine<()> {
        self.ensure_account(db_tx, owner_id).await?;

        // Guarded debit: zero rows means the balance check failed.
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).sub(amount.minor()),
            )
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .filter(accounts::Column::Balance.gte(amount.minor()))
            .exec(db_tx)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::InsufficientFunds(owner_id.to_string()));
        }
        Ok(())
    }

    pub(super) async fn credit_pocket(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        amount: Money,
    ) -> ResultEngine<()> {
        self.ensure_account(db_tx, owner_id).await?;

        accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(amount.minor()),
            )
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .exec(db_tx)
            .await?;
        Ok(())
    }

    pub(super) async fn record_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        record: &LedgerTransaction,
    ) -> ResultEngine<()> {
        transactions::ActiveModel::from(record).insert(db_tx).await?;
        Ok(())
    }
}
