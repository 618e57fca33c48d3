use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::{
    EconomyPolicy,
    clock::{Clock, SystemClock},
    inventory::{Inventory, MemoryInventory},
};

mod bank;
mod ledger;
mod market;

pub use market::{MarketFilter, Purchase};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The economic engine: ledger, bank and marketplace over one durable store.
///
/// Cheap to clone; clones share the connection pool and collaborators.
#[derive(Clone)]
pub struct Engine {
    database: DatabaseConnection,
    policy: EconomyPolicy,
    clock: Arc<dyn Clock>,
    inventory: Arc<dyn Inventory>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn policy(&self) -> &EconomyPolicy {
        &self.policy
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

fn normalize_reason(value: &str) -> String {
    value.trim().to_string()
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    policy: EconomyPolicy,
    clock: Arc<dyn Clock>,
    inventory: Arc<dyn Inventory>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            policy: EconomyPolicy::default(),
            clock: Arc::new(SystemClock),
            inventory: Arc::new(MemoryInventory::new()),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn policy(mut self, policy: EconomyPolicy) -> EngineBuilder {
        self.policy = policy;
        self
    }

    /// Override the time source (tests, simulations).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> EngineBuilder {
        self.clock = clock;
        self
    }

    /// Plug in the inventory collaborator; defaults to [`MemoryInventory`].
    pub fn inventory(mut self, inventory: Arc<dyn Inventory>) -> EngineBuilder {
        self.inventory = inventory;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> crate::ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            policy: self.policy,
            clock: self.clock,
            inventory: self.inventory,
        })
    }
}
