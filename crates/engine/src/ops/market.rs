//! Marketplace operations: fixed-price listings with expiry.
//!
//! Every resolution path (buy, cancel, expiry) claims the listing through the
//! same conditional status update, so concurrent claimants on one listing get
//! exactly one winner and the losers a typed failure. Money only moves on a
//! successful buy, inside the same unit of work as the claim.

use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    CreateListingCmd, EngineError, Money, ResultEngine, TransferCmd,
    listings::{self, Listing, ListingStatus},
    transactions::TransactionKind,
};

use super::{Engine, with_tx};

/// Outcome of a successful purchase.
#[derive(Clone, Debug)]
pub struct Purchase {
    pub listing: Listing,
    /// Sale tax retained by the market; the seller received `price - tax`.
    pub tax: Money,
}

/// Filters for browsing active listings.
#[derive(Clone, Debug, Default)]
pub struct MarketFilter {
    pub max_price: Option<Money>,
    pub limit: Option<u64>,
}

impl Engine {
    /// Put an item up for sale. The item itself must already have been taken
    /// from the seller's inventory by the calling adapter.
    pub async fn create_listing(&self, cmd: CreateListingCmd) -> ResultEngine<Listing> {
        let now = self.now();
        let duration = cmd
            .duration
            .unwrap_or_else(|| chrono::Duration::hours(self.policy.market.default_duration_hours));
        let listing = Listing::new(cmd.seller_id, cmd.item, cmd.price, now, now + duration)?;

        with_tx!(self, |db_tx| {
            let active = listings::Entity::find()
                .filter(listings::Column::SellerId.eq(listing.seller_id.clone()))
                .filter(listings::Column::Status.eq(ListingStatus::Active.as_str()))
                .count(&db_tx)
                .await?;
            if active >= self.policy.market.max_listings_per_seller {
                return Err(EngineError::ListingLimitExceeded(format!(
                    "{} already has {active} active listings",
                    listing.seller_id
                )));
            }

            listings::ActiveModel::try_from(&listing)?
                .insert(&db_tx)
                .await?;

            tracing::info!(
                listing = %listing.id,
                seller = %listing.seller_id,
                price = %listing.price,
                "listing created"
            );
            Ok(listing)
        })
    }

    /// Buy a listing at its asking price.
    ///
    /// The ACTIVE→SOLD transition is conditional on the listing still being
    /// ACTIVE and unexpired at commit time; of two racing buyers exactly one
    /// wins and the other fails with `AlreadyResolved`, funds untouched.
    pub async fn buy(&self, buyer_id: &str, listing_id: Uuid) -> ResultEngine<Purchase> {
        let now = self.now();

        let purchase = with_tx!(self, |db_tx| {
            let listing = self.require_listing(&db_tx, listing_id).await?;
            if listing.seller_id == buyer_id {
                return Err(EngineError::PermissionDenied(
                    "cannot buy your own listing".to_string(),
                ));
            }

            // Claim the listing. Zero rows affected means we lost the race
            // or the listing expired; re-read to tell the two apart.
            let result = listings::Entity::update_many()
                .col_expr(
                    listings::Column::Status,
                    Expr::value(ListingStatus::Sold.as_str()),
                )
                .col_expr(listings::Column::BuyerId, Expr::value(buyer_id))
                .col_expr(listings::Column::ResolvedAt, Expr::value(now))
                .filter(listings::Column::Id.eq(listing_id.to_string()))
                .filter(listings::Column::Status.eq(ListingStatus::Active.as_str()))
                .filter(listings::Column::ExpiresAt.gt(now))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                let current = self.require_listing(&db_tx, listing_id).await?;
                return Err(if current.status.is_terminal() {
                    EngineError::AlreadyResolved(listing_id.to_string())
                } else {
                    EngineError::Expired(listing_id.to_string())
                });
            }

            let tax = self.policy.market.sale_tax(listing.price);
            let proceeds = listing.price - tax;

            self.apply_transfer(
                &db_tx,
                &TransferCmd::new(
                    listing.price,
                    TransactionKind::MarketBuy,
                    format!("auction purchase: {}", listing.item.item),
                )
                .from(buyer_id),
            )
            .await?;
            if proceeds.is_positive() {
                self.apply_transfer(
                    &db_tx,
                    &TransferCmd::new(
                        proceeds,
                        TransactionKind::MarketSell,
                        format!("auction sale: {}", listing.item.item),
                    )
                    .to(listing.seller_id.clone()),
                )
                .await?;
            }

            tracing::info!(
                listing = %listing_id,
                buyer = buyer_id,
                price = %listing.price,
                tax = %tax,
                "listing sold"
            );
            Ok(Purchase {
                listing: Listing {
                    status: ListingStatus::Sold,
                    buyer_id: Some(buyer_id.to_string()),
                    resolved_at: Some(now),
                    ..listing
                },
                tax,
            })
        })?;

        // The sale stands regardless of delivery; a rejected delivery is the
        // adapter's compensation concern (funds have already moved).
        if !self
            .inventory
            .add(buyer_id, &purchase.listing.item)
        {
            tracing::warn!(
                listing = %listing_id,
                buyer = buyer_id,
                "item delivery rejected by inventory"
            );
        }

        Ok(purchase)
    }

    /// Cancel an ACTIVE listing and return the item to the seller. No money
    /// moves.
    pub async fn cancel(&self, seller_id: &str, listing_id: Uuid) -> ResultEngine<Listing> {
        let now = self.now();

        let cancelled = with_tx!(self, |db_tx| {
            let listing = self.require_listing(&db_tx, listing_id).await?;
            if listing.seller_id != seller_id {
                return Err(EngineError::PermissionDenied(
                    "only the seller may cancel a listing".to_string(),
                ));
            }

            let result = listings::Entity::update_many()
                .col_expr(
                    listings::Column::Status,
                    Expr::value(ListingStatus::Cancelled.as_str()),
                )
                .col_expr(listings::Column::ResolvedAt, Expr::value(now))
                .filter(listings::Column::Id.eq(listing_id.to_string()))
                .filter(listings::Column::Status.eq(ListingStatus::Active.as_str()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::AlreadyResolved(listing_id.to_string()));
            }

            tracing::info!(listing = %listing_id, seller = seller_id, "listing cancelled");
            Ok(Listing {
                status: ListingStatus::Cancelled,
                resolved_at: Some(now),
                ..listing
            })
        })?;

        if !self.inventory.add(seller_id, &cancelled.item) {
            tracing::warn!(
                listing = %listing_id,
                seller = seller_id,
                "item return rejected by inventory"
            );
        }

        Ok(cancelled)
    }

    /// Expire every ACTIVE listing past its deadline and return the items to
    /// their sellers. A listing claimed by a concurrent buy is skipped; the
    /// conditional update guarantees each listing is resolved exactly once.
    ///
    /// Returns the number of listings expired.
    pub async fn expiry_sweep(&self) -> ResultEngine<u64> {
        let now = self.now();

        let due: Vec<listings::Model> = listings::Entity::find()
            .filter(listings::Column::Status.eq(ListingStatus::Active.as_str()))
            .filter(listings::Column::ExpiresAt.lte(now))
            .all(&self.database)
            .await?;

        let mut expired = 0u64;
        for model in due {
            let listing = match Listing::try_from(model) {
                Ok(listing) => listing,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping undecodable listing in sweep");
                    continue;
                }
            };

            let result = listings::Entity::update_many()
                .col_expr(
                    listings::Column::Status,
                    Expr::value(ListingStatus::Expired.as_str()),
                )
                .col_expr(listings::Column::ResolvedAt, Expr::value(now))
                .filter(listings::Column::Id.eq(listing.id.to_string()))
                .filter(listings::Column::Status.eq(ListingStatus::Active.as_str()))
                .exec(&self.database)
                .await?;
            if result.rows_affected == 0 {
                // A buy won the race at the last instant.
                continue;
            }

            expired += 1;
            if !self.inventory.add(&listing.seller_id, &listing.item) {
                tracing::warn!(
                    listing = %listing.id,
                    seller = %listing.seller_id,
                    "item return rejected by inventory"
                );
            }
        }

        if expired > 0 {
            tracing::info!(listings = expired, "listings expired");
        }
        Ok(expired)
    }

    /// Look up one listing.
    pub async fn listing(&self, listing_id: Uuid) -> ResultEngine<Listing> {
        let model = listings::Entity::find_by_id(listing_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("listing not exists".to_string()))?;
        Listing::try_from(model)
    }

    /// Browse buyable listings in creation order. Listings past their expiry
    /// are omitted even before the sweep has caught up with them.
    pub async fn list_active(&self, filter: MarketFilter) -> ResultEngine<Vec<Listing>> {
        let now = self.now();
        let mut query = listings::Entity::find()
            .filter(listings::Column::Status.eq(ListingStatus::Active.as_str()))
            .filter(listings::Column::ExpiresAt.gt(now))
            .order_by_asc(listings::Column::CreatedAt);

        if let Some(max_price) = filter.max_price {
            query = query.filter(listings::Column::Price.lte(max_price.minor()));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Listing::try_from).collect()
    }

    /// All listings of one seller, optionally narrowed to a status.
    pub async fn list_by_seller(
        &self,
        seller_id: &str,
        status: Option<ListingStatus>,
    ) -> ResultEngine<Vec<Listing>> {
        let mut query = listings::Entity::find()
            .filter(listings::Column::SellerId.eq(seller_id))
            .order_by_asc(listings::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(listings::Column::Status.eq(status.as_str()));
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Listing::try_from).collect()
    }

    async fn require_listing(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        listing_id: Uuid,
    ) -> ResultEngine<Listing> {
        let model = listings::Entity::find_by_id(listing_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("listing not exists".to_string()))?;
        Listing::try_from(model)
    }
}
