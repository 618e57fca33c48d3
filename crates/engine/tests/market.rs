use chrono::Duration;

use engine::{
    CreateListingCmd, EngineError, ItemDescriptor, ListingStatus, MarketFilter, Money,
    TransactionKind,
};

mod common;
use common::{TestEnv, engine_with_db};

fn sword() -> ItemDescriptor {
    ItemDescriptor::new("iron_sword", 1)
}

async fn listed(env: &TestEnv, seller: &str, price: i64) -> engine::Listing {
    env.engine
        .create_listing(CreateListingCmd::new(seller, sword(), Money::new(price)))
        .await
        .unwrap()
}

#[tokio::test]
async fn create_listing_validates_and_limits() {
    let env = engine_with_db().await;
    let max = env.engine.policy().market.max_listings_per_seller;

    let err = env
        .engine
        .create_listing(CreateListingCmd::new("seller", sword(), Money::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    for _ in 0..max {
        listed(&env, "seller", 100).await;
    }
    let err = env
        .engine
        .create_listing(CreateListingCmd::new("seller", sword(), Money::new(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ListingLimitExceeded(_)));

    // Resolving one listing frees a slot.
    let listings = env.engine.list_by_seller("seller", None).await.unwrap();
    env.engine
        .cancel("seller", listings[0].id)
        .await
        .unwrap();
    listed(&env, "seller", 100).await;
}

#[tokio::test]
async fn buy_moves_money_taxes_the_sale_and_delivers() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    let listing = listed(&env, "seller", 500).await;
    let purchase = env.engine.buy("buyer", listing.id).await.unwrap();

    // 5% sale tax is retained by the market at resolution.
    assert_eq!(purchase.tax, Money::new(25));
    assert_eq!(purchase.listing.status, ListingStatus::Sold);
    assert_eq!(purchase.listing.buyer_id.as_deref(), Some("buyer"));

    assert_eq!(
        env.engine.balance("buyer").await.unwrap(),
        starting - Money::new(500)
    );
    assert_eq!(
        env.engine.balance("seller").await.unwrap(),
        starting + Money::new(475)
    );

    // The item landed in the buyer's inventory.
    assert_eq!(env.inventory.count("buyer", "iron_sword"), 1);

    let buyer_history = env.engine.list_transactions("buyer", 10).await.unwrap();
    assert_eq!(buyer_history[0].kind, TransactionKind::MarketBuy);
    let seller_history = env.engine.list_transactions("seller", 10).await.unwrap();
    assert_eq!(seller_history[0].kind, TransactionKind::MarketSell);

    let stored = env.engine.listing(listing.id).await.unwrap();
    assert_eq!(stored.status, ListingStatus::Sold);
    assert!(stored.resolved_at.is_some());
}

#[tokio::test]
async fn a_listing_sells_exactly_once() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    let listing = listed(&env, "seller", 500).await;

    env.engine.buy("first", listing.id).await.unwrap();
    let err = env.engine.buy("second", listing.id).await.unwrap_err();
    assert_eq!(err, EngineError::AlreadyResolved(listing.id.to_string()));

    // The loser's balance is untouched and nothing was delivered.
    assert_eq!(env.engine.balance("second").await.unwrap(), starting);
    assert_eq!(env.inventory.count("second", "iron_sword"), 0);
}

#[tokio::test]
async fn sellers_cannot_buy_their_own_listing() {
    let env = engine_with_db().await;
    let listing = listed(&env, "seller", 500).await;

    let err = env.engine.buy("seller", listing.id).await.unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));
    assert_eq!(
        env.engine.listing(listing.id).await.unwrap().status,
        ListingStatus::Active
    );
}

#[tokio::test]
async fn a_failed_purchase_leaves_the_listing_buyable() {
    let env = engine_with_db().await;

    let listing = listed(&env, "seller", 500).await;
    env.engine
        .set_balance("pauper", Money::new(100), "seed")
        .await
        .unwrap();

    let err = env.engine.buy("pauper", listing.id).await.unwrap_err();
    assert_eq!(err, EngineError::InsufficientFunds("pauper".to_string()));

    // The claim was rolled back with the debit; someone else can still buy.
    assert_eq!(
        env.engine.listing(listing.id).await.unwrap().status,
        ListingStatus::Active
    );
    env.engine.buy("buyer", listing.id).await.unwrap();
}

#[tokio::test]
async fn expired_listings_are_unbuyable_and_swept_exactly_once() {
    let env = engine_with_db().await;

    let listing = env
        .engine
        .create_listing(
            CreateListingCmd::new("seller", sword(), Money::new(500))
                .duration(Duration::hours(1)),
        )
        .await
        .unwrap();

    env.clock.advance(Duration::hours(2));

    let err = env.engine.buy("buyer", listing.id).await.unwrap_err();
    assert_eq!(err, EngineError::Expired(listing.id.to_string()));

    // Not offered for browsing even before the sweep runs.
    assert!(
        env.engine
            .list_active(MarketFilter::default())
            .await
            .unwrap()
            .is_empty()
    );

    assert_eq!(env.engine.expiry_sweep().await.unwrap(), 1);
    assert_eq!(env.inventory.count("seller", "iron_sword"), 1);

    // The sweep resolves each listing exactly once.
    assert_eq!(env.engine.expiry_sweep().await.unwrap(), 0);
    assert_eq!(env.inventory.count("seller", "iron_sword"), 1);

    let stored = env.engine.listing(listing.id).await.unwrap();
    assert_eq!(stored.status, ListingStatus::Expired);
}

#[tokio::test]
async fn expiry_cutover_has_one_winner() {
    let env = engine_with_db().await;

    let listing = env
        .engine
        .create_listing(
            CreateListingCmd::new("seller", sword(), Money::new(500))
                .duration(Duration::hours(1)),
        )
        .await
        .unwrap();

    // At the exact expiry instant the buy loses and the sweep wins.
    env.clock.set(listing.expires_at);
    let err = env.engine.buy("buyer", listing.id).await.unwrap_err();
    assert_eq!(err, EngineError::Expired(listing.id.to_string()));
    assert_eq!(env.engine.expiry_sweep().await.unwrap(), 1);

    // One instant earlier the buy wins and the sweep finds nothing.
    let listing = env
        .engine
        .create_listing(
            CreateListingCmd::new("seller", sword(), Money::new(500))
                .duration(Duration::hours(1)),
        )
        .await
        .unwrap();
    env.clock.set(listing.expires_at - Duration::seconds(1));
    env.engine.buy("buyer", listing.id).await.unwrap();
    assert_eq!(env.engine.expiry_sweep().await.unwrap(), 0);
}

#[tokio::test]
async fn cancel_is_seller_only_and_moves_no_money() {
    let env = engine_with_db().await;
    let starting = env.engine.policy().starting_balance;

    let listing = listed(&env, "seller", 500).await;

    let err = env.engine.cancel("mallory", listing.id).await.unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    let cancelled = env.engine.cancel("seller", listing.id).await.unwrap();
    assert_eq!(cancelled.status, ListingStatus::Cancelled);
    assert_eq!(env.inventory.count("seller", "iron_sword"), 1);
    assert_eq!(env.engine.balance("seller").await.unwrap(), starting);

    let err = env.engine.cancel("seller", listing.id).await.unwrap_err();
    assert_eq!(err, EngineError::AlreadyResolved(listing.id.to_string()));

    // A resolved listing cannot be bought either.
    let err = env.engine.buy("buyer", listing.id).await.unwrap_err();
    assert_eq!(err, EngineError::AlreadyResolved(listing.id.to_string()));
}

#[tokio::test]
async fn browsing_is_in_creation_order_with_filters() {
    let env = engine_with_db().await;

    for price in [100, 200, 300] {
        env.clock.advance(Duration::seconds(1));
        listed(&env, "seller", price).await;
    }
    env.clock.advance(Duration::seconds(1));
    let other = listed(&env, "other", 150).await;

    let all = env
        .engine
        .list_active(MarketFilter::default())
        .await
        .unwrap();
    let prices: Vec<i64> = all.iter().map(|l| l.price.minor()).collect();
    assert_eq!(prices, vec![100, 200, 300, 150]);

    let cheap = env
        .engine
        .list_active(MarketFilter {
            max_price: Some(Money::new(200)),
            ..MarketFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(cheap.len(), 3);

    let limited = env
        .engine
        .list_active(MarketFilter {
            limit: Some(2),
            ..MarketFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);

    let by_seller = env
        .engine
        .list_by_seller("other", Some(ListingStatus::Active))
        .await
        .unwrap();
    assert_eq!(by_seller.len(), 1);
    assert_eq!(by_seller[0].id, other.id);

    env.engine.cancel("other", other.id).await.unwrap();
    assert!(
        env.engine
            .list_by_seller("other", Some(ListingStatus::Active))
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        env.engine
            .list_by_seller("other", None)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn unknown_listings_are_reported_as_missing() {
    let env = engine_with_db().await;
    let err = env
        .engine
        .buy("buyer", uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("listing not exists".to_string())
    );
}
