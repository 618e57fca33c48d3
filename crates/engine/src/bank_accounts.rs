//! Interest-bearing bank accounts.
//!
//! The bank balance is separate from the owner's pocket [`Account`] balance;
//! moving value between the two is a ledger transfer plus a bank-side
//! mutation, committed as one unit of work.
//!
//! [`Account`]: crate::accounts::Account

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::Money;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub owner_id: String,
    pub bank_balance: Money,
    /// Per-period fraction, e.g. `0.01` for 1% per interest period.
    pub interest_rate: f64,
    pub last_interest_at: DateTime<Utc>,
}

impl BankAccount {
    pub fn new(owner_id: impl Into<String>, interest_rate: f64, opened_at: DateTime<Utc>) -> Self {
        Self {
            owner_id: owner_id.into(),
            bank_balance: Money::ZERO,
            interest_rate,
            last_interest_at: opened_at,
        }
    }

    /// The interest one period would credit right now, truncated toward zero.
    #[must_use]
    pub fn interest_due(&self) -> Money {
        Money::new((self.bank_balance.minor() as f64 * self.interest_rate) as i64)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: String,
    pub bank_balance: i64,
    pub interest_rate: f64,
    pub last_interest_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BankAccount> for ActiveModel {
    fn from(account: &BankAccount) -> Self {
        Self {
            owner_id: ActiveValue::Set(account.owner_id.clone()),
            bank_balance: ActiveValue::Set(account.bank_balance.minor()),
            interest_rate: ActiveValue::Set(account.interest_rate),
            last_interest_at: ActiveValue::Set(account.last_interest_at),
        }
    }
}

impl From<Model> for BankAccount {
    fn from(model: Model) -> Self {
        Self {
            owner_id: model.owner_id,
            bank_balance: Money::new(model.bank_balance),
            interest_rate: model.interest_rate,
            last_interest_at: model.last_interest_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interest_truncates_toward_zero() {
        let mut account = BankAccount::new("alice", 0.05, Utc::now());
        account.bank_balance = Money::new(99);
        // 99 * 0.05 = 4.95 -> 4
        assert_eq!(account.interest_due(), Money::new(4));
    }

    #[test]
    fn zero_balance_earns_nothing() {
        let account = BankAccount::new("alice", 0.05, Utc::now());
        assert_eq!(account.interest_due(), Money::ZERO);
    }
}
