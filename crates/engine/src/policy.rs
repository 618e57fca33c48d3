//! Policy knobs for the economy.
//!
//! The engine never reads configuration files; adapters deserialize whatever
//! format they like and hand over one of these.

use crate::Money;

#[derive(Clone, Debug, PartialEq)]
pub struct EconomyPolicy {
    /// Balance reported (and persisted on first mutation) for unknown owners.
    pub starting_balance: Money,
    pub bank: BankPolicy,
    pub market: MarketPolicy,
}

impl Default for EconomyPolicy {
    fn default() -> Self {
        Self {
            starting_balance: Money::new(100_00),
            bank: BankPolicy::default(),
            market: MarketPolicy::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BankPolicy {
    /// Per-period deposit interest, as a fraction.
    pub interest_rate: f64,
    /// Length of one interest period in hours.
    pub interest_period_hours: i64,
    pub max_loan_amount: Money,
    /// Per-day loan interest recorded on the loan row.
    pub loan_interest_rate: f64,
    pub max_loan_days: i64,
}

impl Default for BankPolicy {
    fn default() -> Self {
        Self {
            interest_rate: 0.01,
            interest_period_hours: 24,
            max_loan_amount: Money::new(10_000_00),
            loan_interest_rate: 0.05,
            max_loan_days: 7,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarketPolicy {
    pub max_listings_per_seller: u64,
    pub default_duration_hours: i64,
    /// Fraction of the sale price retained by the market at resolution.
    pub tax_rate: f64,
}

impl Default for MarketPolicy {
    fn default() -> Self {
        Self {
            max_listings_per_seller: 5,
            default_duration_hours: 24,
            tax_rate: 0.05,
        }
    }
}

impl MarketPolicy {
    /// Sale tax for a price, truncated toward zero.
    #[must_use]
    pub fn sale_tax(&self, price: Money) -> Money {
        Money::new((price.minor() as f64 * self.tax_rate) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_tax_truncates() {
        let market = MarketPolicy {
            tax_rate: 0.05,
            ..MarketPolicy::default()
        };
        assert_eq!(market.sale_tax(Money::new(500)), Money::new(25));
        // 99 * 0.05 = 4.95 -> 4
        assert_eq!(market.sale_tax(Money::new(99)), Money::new(4));
        assert_eq!(market.sale_tax(Money::new(1)), Money::ZERO);
    }
}
