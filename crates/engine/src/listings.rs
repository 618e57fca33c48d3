//! Auction-house listings.
//!
//! A `Listing` offers one item payload at a fixed price until it expires.
//! `status` is write-once terminal: once SOLD, CANCELLED or EXPIRED it never
//! changes again, and every resolution path goes through the same conditional
//! status update so exactly one claimant wins.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Sold,
    Cancelled,
    Expired,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Sold => "sold",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl TryFrom<&str> for ListingStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "sold" => Ok(Self::Sold),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid listing status: {other}"
            ))),
        }
    }
}

/// Opaque payload describing the traded asset.
///
/// The engine only checks that the item name is non-empty and the quantity is
/// positive; everything else is the inventory adapter's business.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub item: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl ItemDescriptor {
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
            metadata: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub(crate) fn encode(&self) -> ResultEngine<String> {
        serde_json::to_string(self)
            .map_err(|err| EngineError::InvalidAmount(format!("invalid item payload: {err}")))
    }

    pub(crate) fn decode(raw: &str) -> ResultEngine<Self> {
        serde_json::from_str(raw)
            .map_err(|err| EngineError::InvalidAmount(format!("invalid item payload: {err}")))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: String,
    pub item: ItemDescriptor,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: ListingStatus,
    pub buyer_id: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Listing {
    pub fn new(
        seller_id: impl Into<String>,
        item: ItemDescriptor,
        price: Money,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !price.is_positive() {
            return Err(EngineError::InvalidAmount(
                "price must be > 0".to_string(),
            ));
        }
        if item.item.trim().is_empty() || item.quantity == 0 {
            return Err(EngineError::InvalidAmount(
                "item payload must name an item with quantity > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            seller_id: seller_id.into(),
            item,
            price,
            created_at,
            expires_at,
            status: ListingStatus::Active,
            buyer_id: None,
            resolved_at: None,
        })
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub seller_id: String,
    pub item_descriptor: String,
    pub price: i64,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
    pub status: String,
    pub buyer_id: Option<String>,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Listing> for ActiveModel {
    type Error = EngineError;

    fn try_from(listing: &Listing) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(listing.id.to_string()),
            seller_id: ActiveValue::Set(listing.seller_id.clone()),
            item_descriptor: ActiveValue::Set(listing.item.encode()?),
            price: ActiveValue::Set(listing.price.minor()),
            created_at: ActiveValue::Set(listing.created_at),
            expires_at: ActiveValue::Set(listing.expires_at),
            status: ActiveValue::Set(listing.status.as_str().to_string()),
            buyer_id: ActiveValue::Set(listing.buyer_id.clone()),
            resolved_at: ActiveValue::Set(listing.resolved_at),
        })
    }
}

impl TryFrom<Model> for Listing {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("listing not exists".to_string()))?,
            seller_id: model.seller_id,
            item: ItemDescriptor::decode(&model.item_descriptor)?,
            price: Money::new(model.price),
            created_at: model.created_at,
            expires_at: model.expires_at,
            status: ListingStatus::try_from(model.status.as_str())?,
            buyer_id: model.buyer_id,
            resolved_at: model.resolved_at,
        })
    }
}
