use std::sync::Arc;

use chrono::Utc;
use sea_orm::{Database, DatabaseConnection};

use engine::{EconomyPolicy, Engine, ManualClock, MemoryInventory};
use migration::MigratorTrait;

pub struct TestEnv {
    pub engine: Engine,
    pub clock: ManualClock,
    pub inventory: Arc<MemoryInventory>,
    pub db: DatabaseConnection,
}

pub async fn engine_with_db() -> TestEnv {
    engine_with_policy(EconomyPolicy::default()).await
}

pub async fn engine_with_policy(policy: EconomyPolicy) -> TestEnv {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let clock = ManualClock::new(Utc::now());
    let inventory = Arc::new(MemoryInventory::new());
    let engine = Engine::builder()
        .database(db.clone())
        .policy(policy)
        .clock(Arc::new(clock.clone()))
        .inventory(inventory.clone())
        .build()
        .await
        .unwrap();

    TestEnv {
        engine,
        clock,
        inventory,
        db,
    }
}
