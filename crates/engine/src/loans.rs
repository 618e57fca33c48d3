//! Short-term loans.
//!
//! At most one ACTIVE loan per owner. `remaining_amount` starts at the
//! principal and only ever decreases through payments; the recorded interest
//! rate is informational and never capitalized onto the remaining amount.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Paid,
    Defaulted,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paid => "paid",
            Self::Defaulted => "defaulted",
        }
    }
}

impl TryFrom<&str> for LoanStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "paid" => Ok(Self::Paid),
            "defaulted" => Ok(Self::Defaulted),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid loan status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub owner_id: String,
    pub principal: Money,
    /// Per-day fraction recorded at grant time.
    pub interest_rate: f64,
    pub remaining_amount: Money,
    pub created_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub status: LoanStatus,
}

impl Loan {
    pub fn new(
        owner_id: impl Into<String>,
        principal: Money,
        interest_rate: f64,
        created_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            principal,
            interest_rate,
            remaining_amount: principal,
            created_at,
            due_at,
            status: LoanStatus::Active,
        }
    }

    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Active && now >= self.due_at
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub principal: i64,
    pub interest_rate: f64,
    pub remaining_amount: i64,
    pub created_at: DateTimeUtc,
    pub due_at: DateTimeUtc,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Loan> for ActiveModel {
    fn from(loan: &Loan) -> Self {
        Self {
            id: ActiveValue::Set(loan.id.to_string()),
            owner_id: ActiveValue::Set(loan.owner_id.clone()),
            principal: ActiveValue::Set(loan.principal.minor()),
            interest_rate: ActiveValue::Set(loan.interest_rate),
            remaining_amount: ActiveValue::Set(loan.remaining_amount.minor()),
            created_at: ActiveValue::Set(loan.created_at),
            due_at: ActiveValue::Set(loan.due_at),
            status: ActiveValue::Set(loan.status.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for Loan {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("loan not exists".to_string()))?,
            owner_id: model.owner_id,
            principal: Money::new(model.principal),
            interest_rate: model.interest_rate,
            remaining_amount: Money::new(model.remaining_amount),
            created_at: model.created_at,
            due_at: model.due_at,
            status: LoanStatus::try_from(model.status.as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn new_loan_owes_the_principal() {
        let now = Utc::now();
        let loan = Loan::new("alice", Money::new(10_000), 0.05, now, now + Duration::days(7));
        assert_eq!(loan.remaining_amount, loan.principal);
        assert_eq!(loan.status, LoanStatus::Active);
    }

    #[test]
    fn overdue_only_while_active() {
        let now = Utc::now();
        let mut loan = Loan::new("alice", Money::new(100), 0.0, now, now + Duration::days(1));
        assert!(!loan.is_overdue(now));
        assert!(loan.is_overdue(now + Duration::days(2)));

        loan.status = LoanStatus::Paid;
        assert!(!loan.is_overdue(now + Duration::days(2)));
    }
}
