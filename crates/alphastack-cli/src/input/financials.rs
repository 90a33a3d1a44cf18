//! Historical financials upload (`--financials file.csv`).
//!
//! One row per fiscal year with columns Year, Revenue, EBIT, Net Income,
//! CapEx, Depreciation, ΔWC, Cash, Debt, Shares and optionally Dividends.
//! History is reduced to a base-year snapshot plus derived growth and margin.

use std::str::FromStr;

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use alphastack_core::{AssumptionOverrides, Currency, FinancialSnapshot, Money, Percent};

use super::file;

#[derive(Debug, Clone, PartialEq)]
struct HistoricalRow {
    year: i32,
    revenue: Money,
    ebit: Money,
    net_income: Option<Money>,
    capex: Money,
    depreciation: Money,
    change_in_wc: Money,
    cash: Money,
    debt: Money,
    shares: Decimal,
    dividends: Option<Money>,
}

/// What an upload yields: the latest year as a snapshot and assumption seeds.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFinancials {
    pub snapshot: FinancialSnapshot,
    pub overrides: AssumptionOverrides,
    pub capex_pct: Percent,
    pub depreciation_pct: Percent,
    pub working_capital_pct: Percent,
    pub warnings: Vec<String>,
}

pub fn read_financials(path: &str) -> Result<DerivedFinancials, Box<dyn std::error::Error>> {
    let (canonical, contents) = file::read_text(path)?;
    parse_financials(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

pub fn parse_financials(contents: &str) -> Result<DerivedFinancials, Box<dyn std::error::Error>> {
    let mut rows = read_rows(contents)?;
    rows.sort_by_key(|r| r.year);
    derive(&rows)
}

fn read_rows(contents: &str) -> Result<Vec<HistoricalRow>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());
    let headers = reader.headers()?.clone();

    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let require = |names: &[&str]| {
        find(names).ok_or_else(|| format!("missing '{}' column", names[0]))
    };

    let year = require(&["Year"])?;
    let revenue = require(&["Revenue"])?;
    let ebit = require(&["EBIT"])?;
    let capex = require(&["CapEx", "Capital Expenditure"])?;
    let depreciation = require(&["Depreciation"])?;
    let change_in_wc = require(&["ΔWC", "Change in WC", "Change in Working Capital"])?;
    let cash = require(&["Cash"])?;
    let debt = require(&["Debt"])?;
    let shares = require(&["Shares", "Shares Outstanding"])?;
    let net_income = find(&["Net Income"]);
    let dividends = find(&["Dividends"]);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = i + 2;
        let field = |idx: usize, name: &str| -> Result<Decimal, String> {
            let raw = record.get(idx).unwrap_or_default().replace(',', "");
            Decimal::from_str(&raw)
                .map_err(|e| format!("line {}: bad {} '{}': {}", line, name, raw, e))
        };
        let optional = |idx: Option<usize>, name: &str| -> Result<Option<Decimal>, String> {
            match idx {
                Some(idx) if !record.get(idx).unwrap_or_default().is_empty() => {
                    field(idx, name).map(Some)
                }
                _ => Ok(None),
            }
        };

        let raw_year = record.get(year).unwrap_or_default();
        rows.push(HistoricalRow {
            year: raw_year
                .parse()
                .map_err(|e| format!("line {}: bad Year '{}': {}", line, raw_year, e))?,
            revenue: field(revenue, "Revenue")?,
            ebit: field(ebit, "EBIT")?,
            net_income: optional(net_income, "Net Income")?,
            capex: field(capex, "CapEx")?,
            depreciation: field(depreciation, "Depreciation")?,
            change_in_wc: field(change_in_wc, "ΔWC")?,
            cash: field(cash, "Cash")?,
            debt: field(debt, "Debt")?,
            shares: field(shares, "Shares")?,
            dividends: optional(dividends, "Dividends")?,
        });
    }
    Ok(rows)
}

fn mean_pct_of_revenue(rows: &[HistoricalRow], pick: impl Fn(&HistoricalRow) -> Money) -> Percent {
    let total: Decimal = rows.iter().map(|r| pick(r) / r.revenue).sum();
    total / Decimal::from(rows.len()) * dec!(100)
}

fn derive(rows: &[HistoricalRow]) -> Result<DerivedFinancials, Box<dyn std::error::Error>> {
    let (first, latest) = match (rows.first(), rows.last()) {
        (Some(first), Some(latest)) => (first, latest),
        _ => return Err("no data rows".into()),
    };
    if let Some(row) = rows.iter().find(|r| r.revenue.is_zero()) {
        return Err(format!("year {}: revenue is zero, ratios are undefined", row.year).into());
    }

    let mut warnings = Vec::new();
    let span = latest.year - first.year;
    let annual = if span > 0 && first.revenue > Decimal::ZERO && latest.revenue > Decimal::ZERO {
        (latest.revenue / first.revenue).checked_powd(Decimal::ONE / Decimal::from(span))
    } else {
        None
    };
    let revenue_growth_rate = match annual {
        Some(annual) => Some(((annual - Decimal::ONE) * dec!(100)).round_dp(4)),
        None => {
            warnings.push(
                "Revenue growth not derived: need two years of positive revenue".to_string(),
            );
            None
        }
    };

    let ebit_margin = mean_pct_of_revenue(rows, |r| r.ebit);
    let capex_pct = mean_pct_of_revenue(rows, |r| r.capex);
    let depreciation_pct = mean_pct_of_revenue(rows, |r| r.depreciation);
    let working_capital_pct = mean_pct_of_revenue(rows, |r| r.change_in_wc);

    let of_revenue = |pct: Percent| latest.revenue * pct / dec!(100);
    let snapshot = FinancialSnapshot {
        ticker: None,
        currency: Currency::default(),
        revenue: latest.revenue,
        ebit: None,
        capital_expenditure: of_revenue(capex_pct),
        depreciation: of_revenue(depreciation_pct),
        change_in_working_capital: of_revenue(working_capital_pct),
        cash: latest.cash,
        debt: latest.debt,
        shares_outstanding: latest.shares,
        net_income: latest.net_income,
        dividends: latest.dividends,
    };

    Ok(DerivedFinancials {
        snapshot,
        overrides: AssumptionOverrides {
            revenue_growth_rate,
            ebit_margin: Some(ebit_margin),
            ..Default::default()
        },
        capex_pct,
        depreciation_pct,
        working_capital_pct,
        warnings,
    })
}
