//! Ledger transaction primitives.
//!
//! A `LedgerTransaction` is the immutable audit record of one balance
//! mutation. Rows naming both parties are closed transfers; rows with one
//! side absent are explicit money-supply changes (admin adjustments, loan
//! grants, bank escrow movements, interest).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Transfer,
    AdminSet,
    AdminAdd,
    AdminRemove,
    MarketBuy,
    MarketSell,
    BankDeposit,
    BankWithdraw,
    BankInterest,
    LoanGrant,
    LoanPayment,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::AdminSet => "admin_set",
            Self::AdminAdd => "admin_add",
            Self::AdminRemove => "admin_remove",
            Self::MarketBuy => "market_buy",
            Self::MarketSell => "market_sell",
            Self::BankDeposit => "bank_deposit",
            Self::BankWithdraw => "bank_withdraw",
            Self::BankInterest => "bank_interest",
            Self::LoanGrant => "loan_grant",
            Self::LoanPayment => "loan_payment",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transfer" => Ok(Self::Transfer),
            "admin_set" => Ok(Self::AdminSet),
            "admin_add" => Ok(Self::AdminAdd),
            "admin_remove" => Ok(Self::AdminRemove),
            "market_buy" => Ok(Self::MarketBuy),
            "market_sell" => Ok(Self::MarketSell),
            "bank_deposit" => Ok(Self::BankDeposit),
            "bank_withdraw" => Ok(Self::BankWithdraw),
            "bank_interest" => Ok(Self::BankInterest),
            "loan_grant" => Ok(Self::LoanGrant),
            "loan_payment" => Ok(Self::LoanPayment),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: Uuid,
    pub from_owner_id: Option<String>,
    pub to_owner_id: Option<String>,
    pub amount: Money,
    pub kind: TransactionKind,
    pub reason: String,
    pub idempotency_key: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerTransaction {
    pub fn new(
        from_owner_id: Option<String>,
        to_owner_id: Option<String>,
        amount: Money,
        kind: TransactionKind,
        reason: String,
        recorded_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if from_owner_id.is_none() && to_owner_id.is_none() {
            return Err(EngineError::InvalidAmount(
                "at least one of from/to must be present".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            from_owner_id,
            to_owner_id,
            amount,
            kind,
            reason,
            idempotency_key: None,
            recorded_at,
        })
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub from_owner_id: Option<String>,
    pub to_owner_id: Option<String>,
    pub amount: i64,
    pub kind: String,
    pub reason: String,
    pub idempotency_key: Option<String>,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerTransaction> for ActiveModel {
    fn from(tx: &LedgerTransaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            from_owner_id: ActiveValue::Set(tx.from_owner_id.clone()),
            to_owner_id: ActiveValue::Set(tx.to_owner_id.clone()),
            amount: ActiveValue::Set(tx.amount.minor()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            reason: ActiveValue::Set(tx.reason.clone()),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
            recorded_at: ActiveValue::Set(tx.recorded_at),
        }
    }
}

impl TryFrom<Model> for LedgerTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            from_owner_id: model.from_owner_id,
            to_owner_id: model.to_owner_id,
            amount: Money::new(model.amount),
            kind: TransactionKind::try_from(model.kind.as_str())?,
            reason: model.reason,
            idempotency_key: model.idempotency_key,
            recorded_at: model.recorded_at,
        })
    }
}
