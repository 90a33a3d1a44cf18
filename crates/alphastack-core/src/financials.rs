//! Valuation inputs: a company's base-year financials and the forecast
//! assumptions applied to them.
//!
//! Both are plain value objects. Percent fields are percentage points
//! (`10` means 10%), matching how assumptions are entered and displayed.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AlphaStackError;
use crate::types::{Currency, Money, Percent};
use crate::AlphaStackResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Base-year financials for one company, in a single currency and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Ticker the figures belong to, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default)]
    pub currency: Currency,
    /// Base-year revenue
    pub revenue: Money,
    /// Operating profit. When absent, EBIT is derived as revenue x EBIT margin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebit: Option<Money>,
    pub capital_expenditure: Money,
    pub depreciation: Money,
    /// Investment in working capital; negative when working capital is released
    pub change_in_working_capital: Money,
    pub cash: Money,
    pub debt: Money,
    pub shares_outstanding: Decimal,
    /// Net income, required by the relative P/E model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_income: Option<Money>,
    /// Total dividends paid in the base year, required by the dividend discount model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividends: Option<Money>,
}

/// Forecast parameters. Every field can be overridden independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionSet {
    pub revenue_growth_rate: Percent,
    pub ebit_margin: Percent,
    pub tax_rate: Percent,
    /// Discount rate (WACC)
    pub discount_rate: Percent,
    pub terminal_growth_rate: Percent,
    pub forecast_years: u32,
}

impl Default for AssumptionSet {
    fn default() -> Self {
        AssumptionSet {
            revenue_growth_rate: dec!(10),
            ebit_margin: dec!(20),
            tax_rate: dec!(25),
            discount_rate: dec!(10),
            terminal_growth_rate: dec!(3),
            forecast_years: 5,
        }
    }
}

/// Partial assumption set; `Some` fields replace the corresponding base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumptionOverrides {
    pub revenue_growth_rate: Option<Percent>,
    pub ebit_margin: Option<Percent>,
    pub tax_rate: Option<Percent>,
    pub discount_rate: Option<Percent>,
    pub terminal_growth_rate: Option<Percent>,
    pub forecast_years: Option<u32>,
}

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

impl FinancialSnapshot {
    /// Reject share counts that cannot produce a per-share value.
    pub fn validate(&self) -> AlphaStackResult<()> {
        if self.shares_outstanding <= Decimal::ZERO {
            return Err(AlphaStackError::snapshot(
                "shares_outstanding",
                format!(
                    "Shares outstanding must be positive, got {}",
                    self.shares_outstanding
                ),
            ));
        }
        Ok(())
    }

    /// Cash minus debt, added to enterprise value to reach equity value.
    pub fn net_cash(&self) -> Money {
        self.cash - self.debt
    }
}

impl AssumptionSet {
    /// Apply caller overrides on top of this set.
    pub fn merged(&self, overrides: &AssumptionOverrides) -> AssumptionSet {
        AssumptionSet {
            revenue_growth_rate: overrides
                .revenue_growth_rate
                .unwrap_or(self.revenue_growth_rate),
            ebit_margin: overrides.ebit_margin.unwrap_or(self.ebit_margin),
            tax_rate: overrides.tax_rate.unwrap_or(self.tax_rate),
            discount_rate: overrides.discount_rate.unwrap_or(self.discount_rate),
            terminal_growth_rate: overrides
                .terminal_growth_rate
                .unwrap_or(self.terminal_growth_rate),
            forecast_years: overrides.forecast_years.unwrap_or(self.forecast_years),
        }
    }
}

impl AssumptionOverrides {
    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn or(self, other: AssumptionOverrides) -> AssumptionOverrides {
        AssumptionOverrides {
            revenue_growth_rate: other.revenue_growth_rate.or(self.revenue_growth_rate),
            ebit_margin: other.ebit_margin.or(self.ebit_margin),
            tax_rate: other.tax_rate.or(self.tax_rate),
            discount_rate: other.discount_rate.or(self.discount_rate),
            terminal_growth_rate: other.terminal_growth_rate.or(self.terminal_growth_rate),
            forecast_years: other.forecast_years.or(self.forecast_years),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
