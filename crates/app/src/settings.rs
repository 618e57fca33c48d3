//! Handles settings for the application. Configuration is written in
//! `settings.toml`.
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Economy {
    /// Pocket balance for owners seen for the first time, in minor units.
    pub starting_balance: i64,
    pub bank: Bank,
    pub market: Market,
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            starting_balance: engine::EconomyPolicy::default().starting_balance.minor(),
            bank: Bank::default(),
            market: Market::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Bank {
    pub interest_rate: f64,
    pub interest_period_hours: i64,
    pub max_loan_amount: i64,
    pub loan_interest_rate: f64,
    pub max_loan_days: i64,
}

impl Default for Bank {
    fn default() -> Self {
        let policy = engine::BankPolicy::default();
        Self {
            interest_rate: policy.interest_rate,
            interest_period_hours: policy.interest_period_hours,
            max_loan_amount: policy.max_loan_amount.minor(),
            loan_interest_rate: policy.loan_interest_rate,
            max_loan_days: policy.max_loan_days,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Market {
    pub max_listings_per_seller: u64,
    pub default_duration_hours: i64,
    pub tax_rate: f64,
}

impl Default for Market {
    fn default() -> Self {
        let policy = engine::MarketPolicy::default();
        Self {
            max_listings_per_seller: policy.max_listings_per_seller,
            default_duration_hours: policy.default_duration_hours,
            tax_rate: policy.tax_rate,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scheduler {
    pub interest_check_secs: u64,
    pub sweep_secs: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            interest_check_secs: 3600,
            sweep_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub database: Database,
    #[serde(default)]
    pub economy: Economy,
    #[serde(default)]
    pub scheduler: Scheduler,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}

impl Economy {
    pub fn into_policy(self) -> engine::EconomyPolicy {
        engine::EconomyPolicy {
            starting_balance: engine::Money::new(self.starting_balance),
            bank: engine::BankPolicy {
                interest_rate: self.bank.interest_rate,
                interest_period_hours: self.bank.interest_period_hours,
                max_loan_amount: engine::Money::new(self.bank.max_loan_amount),
                loan_interest_rate: self.bank.loan_interest_rate,
                max_loan_days: self.bank.max_loan_days,
            },
            market: engine::MarketPolicy {
                max_listings_per_seller: self.market.max_listings_per_seller,
                default_duration_hours: self.market.default_duration_hours,
                tax_rate: self.market.tax_rate,
            },
        }
    }
}

impl Scheduler {
    pub fn into_config(self) -> engine::SchedulerConfig {
        engine::SchedulerConfig {
            interest_check: std::time::Duration::from_secs(self.interest_check_secs),
            sweep: std::time::Duration::from_secs(self.sweep_secs),
        }
    }
}
