//! One valuation request, top to bottom: fundamentals, model, verdict,
//! peers, stress tests.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::financials::{AssumptionSet, FinancialSnapshot};
use crate::report::{ValuationReport, DEFAULT_FAIR_VALUE_BAND};
use crate::stress::{find_event, replay_event};
use crate::types::{Money, Percent};
use crate::valuation::{ValuationMethod, ValuationModel};
use crate::AlphaStackResult;

use super::peers::{peer_pe_ratios, resolve_peers, PeerDirectory};
use super::provider::MarketDataProvider;

fn default_band() -> Percent {
    DEFAULT_FAIR_VALUE_BAND
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub ticker: String,
    /// Financials to use instead of the provider's (e.g. from an uploaded file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<FinancialSnapshot>,
    #[serde(default)]
    pub assumptions: AssumptionSet,
    #[serde(default)]
    pub method: ValuationMethod,
    /// Catalog ids or names of events to replay
    #[serde(default)]
    pub stress_events: Vec<String>,
    #[serde(default = "default_band")]
    pub fair_value_band: Percent,
    /// Price to compare against instead of the provider's quote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_price: Option<Money>,
    #[serde(default = "default_true")]
    pub include_peers: bool,
}

impl ValuationRequest {
    pub fn new(ticker: &str) -> Self {
        ValuationRequest {
            ticker: ticker.to_string(),
            snapshot: None,
            assumptions: AssumptionSet::default(),
            method: ValuationMethod::default(),
            stress_events: Vec::new(),
            fair_value_band: DEFAULT_FAIR_VALUE_BAND,
            market_price: None,
            include_peers: true,
        }
    }
}

/// Run a full valuation against `provider`.
///
/// Fails only when the valuation itself cannot be produced (no fundamentals,
/// invalid assumptions, unknown stress event, non-positive comparison price).
/// Missing prices, peers, or event history become report warnings.
pub fn run_valuation<P: MarketDataProvider + ?Sized>(
    provider: &P,
    directory: &PeerDirectory,
    request: &ValuationRequest,
) -> AlphaStackResult<ValuationReport> {
    let ticker = request.ticker.as_str();
    info!(ticker, model = %request.method.kind(), "running valuation");

    let snapshot = match &request.snapshot {
        Some(s) => s.clone(),
        None => provider.company_snapshot(ticker)?,
    };

    let peers = if request.include_peers || request.method.needs_peer_multiples() {
        resolve_peers(provider, directory, ticker)
    } else {
        Vec::new()
    };

    let method = if request.method.needs_peer_multiples() {
        request
            .method
            .clone()
            .with_peer_multiples(peer_pe_ratios(&peers))
    } else {
        request.method.clone()
    };

    let valuation = method.valuate(&snapshot, &request.assumptions)?;
    let mut report = ValuationReport::new(Some(ticker.to_uppercase()), valuation);

    if request.include_peers {
        if peers.is_empty() {
            report.warn("No peer data found");
        }
        report = report.with_peers(peers);
    }

    let market_price = match request.market_price {
        Some(p) => Some(p),
        None => match provider.current_price(ticker) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(ticker, error = %e, "no current price, skipping verdict");
                report.warn(format!("No market price: {e}"));
                None
            }
        },
    };

    if let Some(price) = market_price {
        report = report.with_market_price(price, request.fair_value_band)?;
    }

    for name in &request.stress_events {
        let event = find_event(name)?;
        let Some(price) = market_price else {
            report.warn(format!("{}: skipped, no current price", event.name));
            continue;
        };
        let outcome = provider
            .price_history(ticker, event.start, event.end)
            .and_then(|closes| replay_event(&event, price, &closes));
        match outcome {
            Ok(result) => {
                debug!(event = %event.name, percent_drop = %result.percent_drop, "stress replayed");
                report = report.with_stress_test(result);
            }
            Err(e) => {
                warn!(event = %event.name, error = %e, "stress event has no data");
                report.warn(format!("{}: no data available ({e})", event.name));
            }
        }
    }

    Ok(report)
}
