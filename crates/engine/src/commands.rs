//! Command structs for engine operations.
//!
//! These types group parameters for the wide write operations
//! (transfer/grant_loan/create_listing), keeping call sites readable and
//! avoiding long argument lists.

use chrono::Duration;

use crate::{Money, listings::ItemDescriptor, transactions::TransactionKind};

/// Move money between owners, or create/destroy it for one-sided kinds.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_owner_id: Option<String>,
    pub to_owner_id: Option<String>,
    pub amount: Money,
    pub kind: TransactionKind,
    pub reason: String,
    pub idempotency_key: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(amount: Money, kind: TransactionKind, reason: impl Into<String>) -> Self {
        Self {
            from_owner_id: None,
            to_owner_id: None,
            amount,
            kind,
            reason: reason.into(),
            idempotency_key: None,
        }
    }

    /// A plain owner-to-owner transfer.
    #[must_use]
    pub fn between(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: Money,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(amount, TransactionKind::Transfer, reason)
            .from(from)
            .to(to)
    }

    #[must_use]
    pub fn from(mut self, owner_id: impl Into<String>) -> Self {
        self.from_owner_id = Some(owner_id.into());
        self
    }

    #[must_use]
    pub fn to(mut self, owner_id: impl Into<String>) -> Self {
        self.to_owner_id = Some(owner_id.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Grant a short-term loan to an owner.
#[derive(Clone, Debug)]
pub struct GrantLoanCmd {
    pub owner_id: String,
    pub amount: Money,
    pub days: i64,
}

impl GrantLoanCmd {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, amount: Money, days: i64) -> Self {
        Self {
            owner_id: owner_id.into(),
            amount,
            days,
        }
    }
}

/// Put an item up for fixed-price sale.
#[derive(Clone, Debug)]
pub struct CreateListingCmd {
    pub seller_id: String,
    pub item: ItemDescriptor,
    pub price: Money,
    /// Overrides the configured default listing duration.
    pub duration: Option<Duration>,
}

impl CreateListingCmd {
    #[must_use]
    pub fn new(seller_id: impl Into<String>, item: ItemDescriptor, price: Money) -> Self {
        Self {
            seller_id: seller_id.into(),
            item,
            price,
            duration: None,
        }
    }

    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}
