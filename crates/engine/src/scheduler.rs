//! Periodic triggers for the time-driven operations.
//!
//! The scheduler is pure glue: interest accrual, listing expiry and loan
//! default are all idempotent engine operations, so the cadence here is a
//! tuning knob rather than a correctness concern. Buy-time expiry checks
//! remain the first line of defense; the sweep is the backstop.

use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::Engine;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// How often to check whether an interest period has elapsed.
    pub interest_check: Duration,
    /// How often to run the listing-expiry and loan-default sweeps.
    pub sweep: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interest_check: Duration::from_secs(3600),
            sweep: Duration::from_secs(60),
        }
    }
}

pub struct Scheduler {
    tasks: JoinSet<()>,
}

impl Scheduler {
    /// Spawn the periodic tasks on the current tokio runtime.
    pub fn spawn(engine: Engine, config: SchedulerConfig) -> Self {
        let mut tasks = JoinSet::new();

        {
            let engine = engine.clone();
            tasks.spawn(async move {
                let mut ticker = tokio::time::interval(config.interest_check);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if let Err(err) = engine.accrue_interest().await {
                        tracing::error!("interest accrual failed: {err}");
                    }
                }
            });
        }

        tasks.spawn(async move {
            let mut ticker = tokio::time::interval(config.sweep);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = engine.expiry_sweep().await {
                    tracing::error!("listing expiry sweep failed: {err}");
                }
                if let Err(err) = engine.loan_default_sweep().await {
                    tracing::error!("loan default sweep failed: {err}");
                }
            }
        });

        Self { tasks }
    }

    /// Stop all periodic tasks.
    pub async fn shutdown(mut self) {
        self.tasks.shutdown().await;
    }
}
