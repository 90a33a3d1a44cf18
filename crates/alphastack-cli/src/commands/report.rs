use std::time::Instant;

use chrono::Duration;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::info;

use alphastack_core::market_data::{
    run_valuation, CachedMarketData, PeerDirectory, StaticMarketData, ValuationRequest,
    DEFAULT_TTL_SECS,
};
use alphastack_core::report::{compare_to_market, DEFAULT_FAIR_VALUE_BAND};
use alphastack_core::stress::historical_events;
use alphastack_core::types::with_metadata;
use alphastack_core::AssumptionSet;

use crate::commands::valuation::{methodology, AssumptionFlags, ModelFlags};
use crate::input;
use crate::input::config::CliConfig;

/// Arguments for comparing an intrinsic value with the market
#[derive(Args)]
pub struct VerdictArgs {
    /// Intrinsic value per share
    #[arg(long, allow_hyphen_values = true)]
    pub intrinsic_value: Decimal,

    /// Current market price per share
    #[arg(long, allow_hyphen_values = true)]
    pub market_price: Decimal,

    /// Half-width of the fair-value band, %
    #[arg(long)]
    pub fair_value_band: Option<Decimal>,
}

pub fn run_verdict(args: VerdictArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let band = args.fair_value_band.unwrap_or(DEFAULT_FAIR_VALUE_BAND);
    let comparison = compare_to_market(args.intrinsic_value, args.market_price, band)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let insight = comparison.insight();
    let mut value = serde_json::to_value(with_metadata(
        "Intrinsic value vs market price",
        &json!({
            "intrinsic_value": args.intrinsic_value,
            "market_price": args.market_price,
            "fair_value_band": band,
        }),
        Vec::new(),
        elapsed,
        comparison,
    ))?;
    if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
        result.insert("insight".into(), Value::String(insight));
    }
    Ok(value)
}

/// Arguments for the full valuation report over a market-data file
#[derive(Args)]
pub struct ReportArgs {
    /// Ticker to value, e.g. TCS.NS
    #[arg(long)]
    pub ticker: Option<String>,

    /// JSON market-data file (fundamentals, prices, peers per ticker)
    #[arg(long)]
    pub market_data: String,

    /// Path to a JSON valuation request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Historical financials CSV to use instead of the file's fundamentals
    #[arg(long)]
    pub financials: Option<String>,

    #[command(flatten)]
    pub assumptions: AssumptionFlags,

    #[command(flatten)]
    pub model: ModelFlags,

    /// Stress event to replay (repeatable)
    #[arg(long = "event")]
    pub events: Vec<String>,

    /// Replay every catalog event
    #[arg(long)]
    pub all_events: bool,

    /// Market price to compare against instead of the file's quote
    #[arg(long)]
    pub market_price: Option<Decimal>,

    /// Half-width of the fair-value band, %
    #[arg(long)]
    pub fair_value_band: Option<Decimal>,

    /// Skip peer lookup
    #[arg(long)]
    pub no_peers: bool,

    /// Seconds market-data lookups stay cached
    #[arg(long)]
    pub cache_ttl: Option<i64>,
}

fn build_request(
    args: &ReportArgs,
    config: &CliConfig,
) -> Result<ValuationRequest, Box<dyn std::error::Error>> {
    let ticker = args
        .ticker
        .clone()
        .ok_or("--ticker is required (or provide --input)")?;

    let mut request = ValuationRequest::new(&ticker);
    let mut overrides = config.assumptions.clone();

    if let Some(ref path) = args.financials {
        let derived = input::financials::read_financials(path)?;
        let mut snapshot = derived.snapshot;
        snapshot.ticker = Some(ticker.to_uppercase());
        request.snapshot = Some(snapshot);
        overrides = derived.overrides.or(overrides);
    }

    request.assumptions = AssumptionSet::default().merged(&overrides.or(args.assumptions.overrides()));
    request.method = args.model.method(config);
    request.stress_events = if args.all_events {
        historical_events().into_iter().map(|e| e.id).collect()
    } else {
        args.events.clone()
    };
    request.fair_value_band = args
        .fair_value_band
        .or(config.fair_value_band)
        .unwrap_or(DEFAULT_FAIR_VALUE_BAND);
    request.market_price = args.market_price;
    request.include_peers = !args.no_peers;
    Ok(request)
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let config = args.assumptions.load_config()?;

    let request: ValuationRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        build_request(&args, &config)?
    };

    let (_, contents) = input::file::read_text(&args.market_data)?;
    let market_data = StaticMarketData::from_json_str(&contents)?;
    let ttl = args
        .cache_ttl
        .or(config.cache_ttl_secs)
        .unwrap_or(DEFAULT_TTL_SECS);
    info!(companies = market_data.companies.len(), ttl, "loaded market data");
    let provider = CachedMarketData::with_ttl(market_data, Duration::seconds(ttl));

    let report = run_valuation(&provider, &PeerDirectory::nse_defaults(), &request)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let insight = report.insight();
    let warnings = report.warnings.clone();
    let mut value = serde_json::to_value(with_metadata(
        methodology(report.valuation.model),
        &request,
        warnings,
        elapsed,
        report,
    ))?;
    if let (Some(insight), Some(result)) = (
        insight,
        value.get_mut("result").and_then(Value::as_object_mut),
    ) {
        result.insert("insight".into(), Value::String(insight));
    }
    Ok(value)
}
