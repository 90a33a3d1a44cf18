use std::time::Instant;

use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use alphastack_core::report::{MarketComparison, DEFAULT_FAIR_VALUE_BAND};
use alphastack_core::stress::find_event;
use alphastack_core::types::with_metadata;
use alphastack_core::valuation::{ModelKind, ValuationMethod, ValuationModel};
use alphastack_core::{AssumptionSet, FinancialSnapshot, PricePoint};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn elapsed_us(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ValuateInput {
    snapshot: FinancialSnapshot,
    #[serde(default)]
    assumptions: AssumptionSet,
    #[serde(default)]
    method: ValuationMethod,
}

#[napi]
pub fn valuate(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let input: ValuateInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = input
        .method
        .valuate(&input.snapshot, &input.assumptions)
        .map_err(to_napi_error)?;
    let methodology = match result.model {
        ModelKind::Dcf => "Discounted Cash Flow",
        ModelKind::RelativePe => "Relative P/E",
        ModelKind::DividendDiscount => "Dividend Discount",
    };
    let output = with_metadata(
        methodology,
        &input.assumptions,
        Vec::new(),
        elapsed_us(start),
        result,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Stress testing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DrawdownInput {
    event_name: String,
    current_price: Decimal,
    start_price: Option<Decimal>,
    end_price: Option<Decimal>,
}

#[napi]
pub fn simulate_drawdown(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let input: DrawdownInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = alphastack_core::stress::simulate_drawdown(
        &input.event_name,
        input.current_price,
        input.start_price,
        input.end_price,
    )
    .map_err(to_napi_error)?;
    let output = with_metadata(
        "Historical drawdown replay",
        &serde_json::json!({ "event_name": input.event_name }),
        Vec::new(),
        elapsed_us(start),
        result,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct ReplayInput {
    event: String,
    current_price: Decimal,
    closes: Vec<PricePoint>,
}

#[napi]
pub fn replay_event(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let input: ReplayInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let event = find_event(&input.event).map_err(to_napi_error)?;
    let result = alphastack_core::stress::replay_event(&event, input.current_price, &input.closes)
        .map_err(to_napi_error)?;
    let output = with_metadata(
        "Historical drawdown replay over price history",
        &event,
        Vec::new(),
        elapsed_us(start),
        result,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn historical_events() -> NapiResult<String> {
    serde_json::to_string(&alphastack_core::stress::historical_events()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CompareInput {
    intrinsic_value_per_share: Decimal,
    market_price: Decimal,
    fair_value_band: Option<Decimal>,
}

#[derive(Serialize)]
struct CompareOutput {
    #[serde(flatten)]
    comparison: MarketComparison,
    insight: String,
}

#[napi]
pub fn compare_to_market(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let input: CompareInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let band = input.fair_value_band.unwrap_or(DEFAULT_FAIR_VALUE_BAND);
    let comparison = alphastack_core::report::compare_to_market(
        input.intrinsic_value_per_share,
        input.market_price,
        band,
    )
    .map_err(to_napi_error)?;
    let output = with_metadata(
        "Intrinsic value vs market price",
        &serde_json::json!({ "fair_value_band": band }),
        Vec::new(),
        elapsed_us(start),
        CompareOutput {
            insight: comparison.insight(),
            comparison,
        },
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}
