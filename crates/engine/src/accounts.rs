//! Per-actor pocket balances.
//!
//! An `Account` is created lazily the first time its owner is part of a
//! balance mutation; reads of an unknown owner report the configured starting
//! balance without persisting anything.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::Money;

/// The general-purpose ("pocket") balance of one actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub owner_id: String,
    pub balance: Money,
}

impl Account {
    pub fn new(owner_id: impl Into<String>, balance: Money) -> Self {
        Self {
            owner_id: owner_id.into(),
            balance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: String,
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            owner_id: ActiveValue::Set(account.owner_id.clone()),
            balance: ActiveValue::Set(account.balance.minor()),
        }
    }
}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            owner_id: model.owner_id,
            balance: Money::new(model.balance),
        }
    }
}
