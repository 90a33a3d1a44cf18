//! Two-stage dividend discount model.
//!
//! Base-year dividends grow at the revenue growth rate through the explicit
//! forecast, followed by a Gordon growth terminal value. Shares the projection
//! and terminal-value machinery with the DCF, so the same
//! discount-rate-above-terminal-growth precondition applies.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AlphaStackError;
use crate::financials::{AssumptionSet, FinancialSnapshot};
use crate::AlphaStackResult;

use super::dcf::{
    compute_terminal_value, out_of_range, project_cash_flows, sum_discounted,
    validate_forecast_years,
};
use super::model::{ModelKind, ValuationModel, ValuationResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendDiscount;

impl ValuationModel for DividendDiscount {
    fn kind(&self) -> ModelKind {
        ModelKind::DividendDiscount
    }

    fn valuate(
        &self,
        snapshot: &FinancialSnapshot,
        assumptions: &AssumptionSet,
    ) -> AlphaStackResult<ValuationResult> {
        snapshot.validate()?;
        validate_forecast_years(assumptions)?;
        let dividends = snapshot.dividends.ok_or_else(|| {
            AlphaStackError::snapshot("dividends", "Required for the dividend discount model")
        })?;

        let projection = project_cash_flows(dividends, assumptions)?;
        let last = projection
            .last()
            .map(|p| p.projected)
            .ok_or_else(|| AlphaStackError::assumptions("forecast_years", "No projection years"))?;
        let terminal = compute_terminal_value(last, assumptions)?;

        let pv_of_cash_flows = sum_discounted(&projection, assumptions.forecast_years)?;
        let equity_value = pv_of_cash_flows
            .checked_add(terminal.discounted_terminal_value)
            .ok_or_else(|| out_of_range(assumptions.forecast_years))?;
        let enterprise_value = equity_value
            .checked_sub(snapshot.net_cash())
            .ok_or_else(|| out_of_range(assumptions.forecast_years))?;
        let intrinsic_value_per_share = equity_value
            .checked_div(snapshot.shares_outstanding)
            .ok_or_else(|| out_of_range(assumptions.forecast_years))?;

        debug!(
            model = "dividend_discount",
            equity_value = %equity_value,
            intrinsic_value_per_share = %intrinsic_value_per_share,
            "valuation complete"
        );

        Ok(ValuationResult {
            model: ModelKind::DividendDiscount,
            base_cash_flow: dividends,
            projection,
            pv_of_cash_flows,
            terminal_value: terminal.terminal_value,
            discounted_terminal_value: terminal.discounted_terminal_value,
            enterprise_value,
            equity_value,
            intrinsic_value_per_share,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use rust_decimal_macros::dec;

    fn snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            ticker: None,
            currency: Currency::INR,
            revenue: dec!(1000),
            ebit: None,
            capital_expenditure: dec!(100),
            depreciation: dec!(50),
            change_in_working_capital: dec!(-20),
            cash: dec!(200),
            debt: dec!(100),
            shares_outstanding: dec!(50),
            net_income: Some(dec!(150)),
            dividends: Some(dec!(60)),
        }
    }

    #[test]
    fn test_ddm_with_zero_growth_is_annuity_plus_perpetuity() {
        let a = AssumptionSet {
            revenue_growth_rate: dec!(0),
            terminal_growth_rate: dec!(0),
            discount_rate: dec!(10),
            forecast_years: 1,
            ..AssumptionSet::default()
        };
        let out = DividendDiscount.valuate(&snapshot(), &a).unwrap();
        // 60/1.1 + (60/0.10)/1.1 = 660/1.1 = 600
        assert!((out.equity_value - dec!(600)).abs() < dec!(0.0000001));
        assert!((out.intrinsic_value_per_share - dec!(12)).abs() < dec!(0.0000001));
        assert_eq!(out.enterprise_value, out.equity_value - dec!(100));
    }

    #[test]
    fn test_ddm_requires_dividends() {
        let mut snap = snapshot();
        snap.dividends = None;
        let err = DividendDiscount
            .valuate(&snap, &AssumptionSet::default())
            .unwrap_err();
        assert!(err.to_string().contains("dividends"));
    }

    #[test]
    fn test_ddm_shares_terminal_precondition() {
        let a = AssumptionSet {
            discount_rate: dec!(3),
            terminal_growth_rate: dec!(3),
            ..AssumptionSet::default()
        };
        let err = DividendDiscount.valuate(&snapshot(), &a).unwrap_err();
        assert!(matches!(err, AlphaStackError::InvalidAssumptions { .. }));
    }
}
