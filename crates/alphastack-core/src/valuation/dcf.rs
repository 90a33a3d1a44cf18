use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AlphaStackError;
use crate::financials::{AssumptionSet, FinancialSnapshot};
use crate::types::{to_rate, Money, Percent};
use crate::AlphaStackResult;

use super::model::{ModelKind, ValuationModel, ValuationResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Build-up of the base-year free cash flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeCashFlowBuild {
    pub ebit: Money,
    pub tax: Money,
    pub nopat: Money,
    pub plus_depreciation: Money,
    pub less_capex: Money,
    pub less_working_capital: Money,
    pub free_cash_flow: Money,
}

/// One forecast year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedCashFlow {
    /// 1-indexed forecast year
    pub year: u32,
    pub projected: Money,
    pub discounted: Money,
}

/// Forecast years in chronological order, year 1 first.
pub type CashFlowProjection = Vec<ProjectedCashFlow>;

/// Gordon growth terminal value and its present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalValue {
    pub terminal_value: Money,
    pub discounted_terminal_value: Money,
}

/// Free cash flow to the firm, two-stage (explicit years + Gordon perpetuity).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountedCashFlow;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Base-year free cash flow: NOPAT + depreciation - capex - working capital investment.
///
/// Negative values are legitimate (loss-making or heavy-investment years) and
/// propagate unchanged.
pub fn compute_free_cash_flow(snapshot: &FinancialSnapshot, assumptions: &AssumptionSet) -> Money {
    free_cash_flow_build(snapshot, assumptions).free_cash_flow
}

/// Same as [`compute_free_cash_flow`] but keeps every intermediate line.
pub fn free_cash_flow_build(
    snapshot: &FinancialSnapshot,
    assumptions: &AssumptionSet,
) -> FreeCashFlowBuild {
    let ebit = snapshot
        .ebit
        .unwrap_or_else(|| snapshot.revenue * to_rate(assumptions.ebit_margin));
    let tax = ebit * to_rate(assumptions.tax_rate);
    let nopat = ebit - tax;
    let free_cash_flow = nopat + snapshot.depreciation
        - snapshot.capital_expenditure
        - snapshot.change_in_working_capital;

    FreeCashFlowBuild {
        ebit,
        tax,
        nopat,
        plus_depreciation: snapshot.depreciation,
        less_capex: snapshot.capital_expenditure,
        less_working_capital: snapshot.change_in_working_capital,
        free_cash_flow,
    }
}

/// Project `forecast_years` cash flows compounding off the base value.
///
/// Each year is computed directly from the base and the elapsed years, never
/// from the previous year's value.
pub fn project_cash_flows(
    base_cash_flow: Money,
    assumptions: &AssumptionSet,
) -> AlphaStackResult<CashFlowProjection> {
    validate_discount_rate(assumptions.discount_rate)?;

    (1..=assumptions.forecast_years)
        .map(|year| {
            let projected = base_cash_flow
                .checked_mul(compound(assumptions.revenue_growth_rate, year)?)
                .ok_or_else(|| out_of_range(year))?;
            let discounted = projected
                .checked_div(compound(assumptions.discount_rate, year)?)
                .ok_or_else(|| out_of_range(year))?;
            Ok(ProjectedCashFlow {
                year,
                projected,
                discounted,
            })
        })
        .collect()
}

/// Gordon growth terminal value on the last projected cash flow, discounted
/// back over the forecast horizon.
pub fn compute_terminal_value(
    last_projected: Money,
    assumptions: &AssumptionSet,
) -> AlphaStackResult<TerminalValue> {
    validate_discount_rate(assumptions.discount_rate)?;

    let r = to_rate(assumptions.discount_rate);
    let g = to_rate(assumptions.terminal_growth_rate);
    if r <= g {
        return Err(AlphaStackError::assumptions(
            "terminal_growth_rate",
            format!(
                "Discount rate ({}%) must exceed terminal growth rate ({}%)",
                assumptions.discount_rate, assumptions.terminal_growth_rate
            ),
        ));
    }

    let years = assumptions.forecast_years;
    let terminal_value = last_projected
        .checked_mul(Decimal::ONE + g)
        .and_then(|v| v.checked_div(r - g))
        .ok_or_else(|| out_of_range(years))?;
    let discounted_terminal_value = terminal_value
        .checked_div(compound(assumptions.discount_rate, years)?)
        .ok_or_else(|| out_of_range(years))?;

    Ok(TerminalValue {
        terminal_value,
        discounted_terminal_value,
    })
}

/// Run the full DCF: base FCF, projection, terminal value, equity bridge.
pub fn valuate(
    snapshot: &FinancialSnapshot,
    assumptions: &AssumptionSet,
) -> AlphaStackResult<ValuationResult> {
    snapshot.validate()?;
    validate_forecast_years(assumptions)?;

    let base = compute_free_cash_flow(snapshot, assumptions);
    let projection = project_cash_flows(base, assumptions)?;
    let last = projection
        .last()
        .map(|p| p.projected)
        .ok_or_else(|| AlphaStackError::assumptions("forecast_years", "No projection years"))?;
    let terminal = compute_terminal_value(last, assumptions)?;

    let pv_of_cash_flows = sum_discounted(&projection, assumptions.forecast_years)?;
    let enterprise_value = pv_of_cash_flows
        .checked_add(terminal.discounted_terminal_value)
        .ok_or_else(|| out_of_range(assumptions.forecast_years))?;
    let equity_value = enterprise_value
        .checked_add(snapshot.net_cash())
        .ok_or_else(|| out_of_range(assumptions.forecast_years))?;
    let intrinsic_value_per_share = equity_value
        .checked_div(snapshot.shares_outstanding)
        .ok_or_else(|| out_of_range(assumptions.forecast_years))?;

    debug!(
        model = "dcf",
        base_fcf = %base,
        enterprise_value = %enterprise_value,
        intrinsic_value_per_share = %intrinsic_value_per_share,
        "valuation complete"
    );

    Ok(ValuationResult {
        model: ModelKind::Dcf,
        base_cash_flow: base,
        projection,
        pv_of_cash_flows,
        terminal_value: terminal.terminal_value,
        discounted_terminal_value: terminal.discounted_terminal_value,
        enterprise_value,
        equity_value,
        intrinsic_value_per_share,
    })
}

impl ValuationModel for DiscountedCashFlow {
    fn kind(&self) -> ModelKind {
        ModelKind::Dcf
    }

    fn valuate(
        &self,
        snapshot: &FinancialSnapshot,
        assumptions: &AssumptionSet,
    ) -> AlphaStackResult<ValuationResult> {
        valuate(snapshot, assumptions)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// (1 + pct/100)^years with an exact integer power.
pub(crate) fn compound(pct: Percent, years: u32) -> AlphaStackResult<Decimal> {
    (Decimal::ONE + to_rate(pct))
        .checked_powu(u64::from(years))
        .ok_or_else(|| out_of_range(years))
}

pub(crate) fn sum_discounted(projection: &[ProjectedCashFlow], years: u32) -> AlphaStackResult<Money> {
    projection
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.discounted))
        .ok_or_else(|| out_of_range(years))
}

/// Compounding past the decimal range over a long horizon.
pub(crate) fn out_of_range(years: u32) -> AlphaStackError {
    AlphaStackError::assumptions(
        "forecast_years",
        format!("Values exceed the representable range when compounded over {years} years"),
    )
}

pub(crate) fn validate_discount_rate(discount_rate: Percent) -> AlphaStackResult<()> {
    if discount_rate <= dec!(-100) {
        return Err(AlphaStackError::assumptions(
            "discount_rate",
            format!("Discount rate must be greater than -100%, got {discount_rate}%"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_forecast_years(assumptions: &AssumptionSet) -> AlphaStackResult<()> {
    if assumptions.forecast_years == 0 {
        return Err(AlphaStackError::assumptions(
            "forecast_years",
            "At least one forecast year is required",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
