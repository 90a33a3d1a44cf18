use std::time::Instant;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use alphastack_core::types::with_metadata;
use alphastack_core::valuation::{ModelKind, ValuationMethod, ValuationModel};
use alphastack_core::{AssumptionOverrides, AssumptionSet, Currency, FinancialSnapshot};

use crate::input;
use crate::input::config::CliConfig;

/// Forecast assumption flags, shared by `value` and `report`.
#[derive(Args, Debug, Clone, Default)]
pub struct AssumptionFlags {
    /// Revenue growth rate, % per year (e.g. 10 for 10%)
    #[arg(long, allow_hyphen_values = true, alias = "growth")]
    pub revenue_growth: Option<Decimal>,

    /// EBIT margin, % of revenue
    #[arg(long, allow_hyphen_values = true, alias = "margin")]
    pub ebit_margin: Option<Decimal>,

    /// Tax rate, % of EBIT
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Discount rate (WACC), %
    #[arg(long, alias = "wacc")]
    pub discount_rate: Option<Decimal>,

    /// Terminal growth rate, %
    #[arg(long, allow_hyphen_values = true)]
    pub terminal_growth: Option<Decimal>,

    /// Forecast horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Path to a JSON or YAML assumptions file
    #[arg(long)]
    pub config: Option<String>,
}

impl AssumptionFlags {
    pub fn overrides(&self) -> AssumptionOverrides {
        AssumptionOverrides {
            revenue_growth_rate: self.revenue_growth,
            ebit_margin: self.ebit_margin,
            tax_rate: self.tax_rate,
            discount_rate: self.discount_rate,
            terminal_growth_rate: self.terminal_growth,
            forecast_years: self.years,
        }
    }

    pub fn load_config(&self) -> Result<CliConfig, Box<dyn std::error::Error>> {
        match self.config {
            Some(ref path) => input::config::read_config(path),
            None => Ok(CliConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    Dcf,
    RelativePe,
    DividendDiscount,
}

/// Model selection flags, shared by `value` and `report`.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelFlags {
    /// Valuation model
    #[arg(long, value_enum)]
    pub model: Option<ModelArg>,

    /// Peer trailing P/E ratios for the relative P/E model (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub peer_pe: Vec<Decimal>,
}

impl ModelFlags {
    /// Flags win over the config file, which wins over plain DCF.
    pub fn method(&self, config: &CliConfig) -> ValuationMethod {
        let configured = config.method.clone().unwrap_or_default();
        let method = match self.model {
            Some(ModelArg::Dcf) => ValuationMethod::Dcf,
            Some(ModelArg::DividendDiscount) => ValuationMethod::DividendDiscount,
            Some(ModelArg::RelativePe) => match configured {
                ValuationMethod::RelativePe { peer_pe_ratios } => {
                    ValuationMethod::RelativePe { peer_pe_ratios }
                }
                _ => ValuationMethod::RelativePe {
                    peer_pe_ratios: Vec::new(),
                },
            },
            None => configured,
        };
        if self.peer_pe.is_empty() {
            method
        } else {
            method.with_peer_multiples(self.peer_pe.clone())
        }
    }
}

/// Base-year financial flags.
#[derive(Args, Debug, Clone, Default)]
pub struct SnapshotFlags {
    /// Ticker the figures belong to
    #[arg(long)]
    pub ticker: Option<String>,

    /// Reporting currency (INR, USD, GBP, EUR, JPY)
    #[arg(long)]
    pub currency: Option<String>,

    /// Base-year revenue
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Base-year EBIT; derived from the margin when omitted
    #[arg(long, allow_hyphen_values = true)]
    pub ebit: Option<Decimal>,

    /// Capital expenditure
    #[arg(long)]
    pub capex: Option<Decimal>,

    /// Depreciation
    #[arg(long)]
    pub depreciation: Option<Decimal>,

    /// Change in working capital (negative when released)
    #[arg(long, allow_hyphen_values = true)]
    pub change_in_wc: Option<Decimal>,

    /// Cash and equivalents
    #[arg(long)]
    pub cash: Option<Decimal>,

    /// Total debt
    #[arg(long)]
    pub debt: Option<Decimal>,

    /// Shares outstanding
    #[arg(long)]
    pub shares: Option<Decimal>,

    /// Net income (relative P/E model)
    #[arg(long, allow_hyphen_values = true)]
    pub net_income: Option<Decimal>,

    /// Total dividends paid (dividend discount model)
    #[arg(long)]
    pub dividends: Option<Decimal>,
}

impl SnapshotFlags {
    fn currency(&self) -> Currency {
        match self.currency.as_deref().map(|c| c.to_ascii_uppercase()) {
            None => Currency::default(),
            Some(code) => match code.as_str() {
                "INR" => Currency::INR,
                "USD" => Currency::USD,
                "GBP" => Currency::GBP,
                "EUR" => Currency::EUR,
                "JPY" => Currency::JPY,
                _ => Currency::Other(code),
            },
        }
    }

    /// Build a snapshot from flags alone. Every balance-sheet and cash-flow
    /// figure must be given; nothing is defaulted.
    pub fn to_snapshot(&self) -> Result<FinancialSnapshot, Box<dyn std::error::Error>> {
        Ok(FinancialSnapshot {
            ticker: self.ticker.clone(),
            currency: self.currency(),
            revenue: self
                .revenue
                .ok_or("--revenue is required (or provide --input / --financials)")?,
            ebit: self.ebit,
            capital_expenditure: self
                .capex
                .ok_or("--capex is required (or provide --input / --financials)")?,
            depreciation: self
                .depreciation
                .ok_or("--depreciation is required (or provide --input / --financials)")?,
            change_in_working_capital: self
                .change_in_wc
                .ok_or("--change-in-wc is required (or provide --input / --financials)")?,
            cash: self
                .cash
                .ok_or("--cash is required (or provide --input / --financials)")?,
            debt: self
                .debt
                .ok_or("--debt is required (or provide --input / --financials)")?,
            shares_outstanding: self
                .shares
                .ok_or("--shares is required (or provide --input / --financials)")?,
            net_income: self.net_income,
            dividends: self.dividends,
        })
    }

    /// Apply any snapshot flags given alongside `--input` or `--financials`
    /// over the snapshot loaded from there. Flags win field by field.
    pub fn patch(&self, mut snapshot: FinancialSnapshot) -> FinancialSnapshot {
        if self.ticker.is_some() {
            snapshot.ticker = self.ticker.clone();
        }
        if self.currency.is_some() {
            snapshot.currency = self.currency();
        }
        if self.ebit.is_some() {
            snapshot.ebit = self.ebit;
        }
        if self.net_income.is_some() {
            snapshot.net_income = self.net_income;
        }
        if self.dividends.is_some() {
            snapshot.dividends = self.dividends;
        }

        let figures = [
            (&mut snapshot.revenue, self.revenue),
            (&mut snapshot.capital_expenditure, self.capex),
            (&mut snapshot.depreciation, self.depreciation),
            (&mut snapshot.change_in_working_capital, self.change_in_wc),
            (&mut snapshot.cash, self.cash),
            (&mut snapshot.debt, self.debt),
            (&mut snapshot.shares_outstanding, self.shares),
        ];
        for (field, flag) in figures {
            if let Some(value) = flag {
                *field = value;
            }
        }
        snapshot
    }
}

/// Arguments for a single-company valuation
#[derive(Args)]
pub struct ValueArgs {
    /// Path to JSON input file ({snapshot, assumptions, method})
    #[arg(long)]
    pub input: Option<String>,

    /// Historical financials CSV to derive the snapshot and seed growth/margin from
    #[arg(long)]
    pub financials: Option<String>,

    #[command(flatten)]
    pub snapshot: SnapshotFlags,

    #[command(flatten)]
    pub assumptions: AssumptionFlags,

    #[command(flatten)]
    pub model: ModelFlags,
}

/// Shape of `value --input` files and piped stdin.
#[derive(Debug, Deserialize)]
struct ValueInput {
    snapshot: FinancialSnapshot,
    #[serde(default)]
    assumptions: Option<AssumptionSet>,
    #[serde(default)]
    method: Option<ValuationMethod>,
}

/// Snapshot, layered assumptions, method and notes for one valuation.
pub struct ResolvedInputs {
    pub snapshot: FinancialSnapshot,
    pub assumptions: AssumptionSet,
    pub method: ValuationMethod,
    pub warnings: Vec<String>,
}

/// Layering, lowest first: defaults or the input file's set, history-derived
/// seeds, the config file, then flags.
pub fn resolve_inputs(args: &ValueArgs) -> Result<ResolvedInputs, Box<dyn std::error::Error>> {
    let config = args.assumptions.load_config()?;
    let mut warnings = Vec::new();

    let from_input: Option<ValueInput> = if let Some(ref path) = args.input {
        Some(input::file::read_json(path)?)
    } else if args.financials.is_none() && args.snapshot.revenue.is_none() {
        input::stdin::read_stdin("{snapshot, assumptions, method}")?
    } else {
        None
    };

    let (snapshot, base, input_method, derived) = match (from_input, &args.financials) {
        (Some(inp), _) => (
            args.snapshot.patch(inp.snapshot),
            inp.assumptions.unwrap_or_default(),
            inp.method,
            AssumptionOverrides::default(),
        ),
        (None, Some(path)) => {
            let derived = input::financials::read_financials(path)?;
            debug!(
                capex_pct = %derived.capex_pct,
                depreciation_pct = %derived.depreciation_pct,
                working_capital_pct = %derived.working_capital_pct,
                "derived ratios from history"
            );
            warnings.extend(derived.warnings);
            (
                args.snapshot.patch(derived.snapshot),
                AssumptionSet::default(),
                None,
                derived.overrides,
            )
        }
        (None, None) => (
            args.snapshot.to_snapshot()?,
            AssumptionSet::default(),
            None,
            AssumptionOverrides::default(),
        ),
    };

    let overrides = derived
        .or(config.assumptions.clone())
        .or(args.assumptions.overrides());
    let assumptions = base.merged(&overrides);

    let mut config = config;
    if input_method.is_some() && config.method.is_none() {
        config.method = input_method;
    }
    let method = args.model.method(&config);

    Ok(ResolvedInputs {
        snapshot,
        assumptions,
        method,
        warnings,
    })
}

pub fn methodology(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Dcf => "Discounted Cash Flow (FCFF, Gordon growth terminal value)",
        ModelKind::RelativePe => "Relative valuation (net income x median peer P/E)",
        ModelKind::DividendDiscount => "Dividend Discount (projected dividends, Gordon growth)",
    }
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let inputs = resolve_inputs(&args)?;

    let result = inputs.method.valuate(&inputs.snapshot, &inputs.assumptions)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        methodology(result.model),
        &json!({
            "snapshot": inputs.snapshot,
            "assumptions": inputs.assumptions,
            "method": inputs.method,
        }),
        inputs.warnings,
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
