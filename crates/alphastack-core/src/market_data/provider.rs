//! Boundary to wherever fundamentals and prices come from.
//!
//! The valuation core never calls a provider itself; the pipeline and the CLI
//! do. [`StaticMarketData`] is the in-memory implementation used offline and
//! in tests.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AlphaStackError;
use crate::financials::FinancialSnapshot;
use crate::types::{Money, Multiple, Percent, PeerQuote, PricePoint};
use crate::AlphaStackResult;

/// Source of company fundamentals, prices, and peers.
pub trait MarketDataProvider {
    fn company_snapshot(&self, ticker: &str) -> AlphaStackResult<FinancialSnapshot>;

    fn current_price(&self, ticker: &str) -> AlphaStackResult<Money>;

    /// Closing prices with `start <= date < end`, oldest first.
    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AlphaStackResult<Vec<PricePoint>>;

    /// Candidate peer tickers, best match first.
    fn peer_tickers(&self, ticker: &str) -> AlphaStackResult<Vec<String>>;

    fn peer_quote(&self, ticker: &str) -> AlphaStackResult<PeerQuote>;
}

/// Everything known about one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<FinancialSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
    #[serde(default)]
    pub prices: Vec<PricePoint>,
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<Multiple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<Percent>,
}

/// Provider backed by an in-memory map, typically loaded from a JSON fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticMarketData {
    #[serde(default)]
    pub companies: HashMap<String, CompanyRecord>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> AlphaStackResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, ticker: &str, record: CompanyRecord) {
        self.companies.insert(ticker.to_uppercase(), record);
    }

    fn record(&self, ticker: &str) -> AlphaStackResult<&CompanyRecord> {
        self.companies
            .get(ticker)
            .or_else(|| {
                self.companies
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(ticker))
                    .map(|(_, v)| v)
            })
            .ok_or_else(|| unavailable(ticker, "ticker not found"))
    }
}

impl MarketDataProvider for StaticMarketData {
    fn company_snapshot(&self, ticker: &str) -> AlphaStackResult<FinancialSnapshot> {
        let mut snapshot = self
            .record(ticker)?
            .snapshot
            .clone()
            .ok_or_else(|| unavailable(ticker, "no fundamentals"))?;
        if snapshot.ticker.is_none() {
            snapshot.ticker = Some(ticker.to_uppercase());
        }
        Ok(snapshot)
    }

    fn current_price(&self, ticker: &str) -> AlphaStackResult<Money> {
        let record = self.record(ticker)?;
        record
            .current_price
            .or_else(|| record.prices.iter().max_by_key(|p| p.date).map(|p| p.close))
            .ok_or_else(|| unavailable(ticker, "no price"))
    }

    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AlphaStackResult<Vec<PricePoint>> {
        let mut prices: Vec<PricePoint> = self
            .record(ticker)?
            .prices
            .iter()
            .filter(|p| p.date >= start && p.date < end)
            .cloned()
            .collect();
        prices.sort_by_key(|p| p.date);
        Ok(prices)
    }

    fn peer_tickers(&self, ticker: &str) -> AlphaStackResult<Vec<String>> {
        Ok(self.record(ticker)?.peers.clone())
    }

    fn peer_quote(&self, ticker: &str) -> AlphaStackResult<PeerQuote> {
        let record = self.record(ticker)?;
        Ok(PeerQuote {
            ticker: ticker.to_uppercase(),
            trailing_pe: record.trailing_pe,
            market_cap: record.market_cap,
            revenue_growth: record.revenue_growth,
        })
    }
}

fn unavailable(ticker: &str, reason: &str) -> AlphaStackError {
    AlphaStackError::MarketDataUnavailable {
        ticker: ticker.to_string(),
        reason: reason.to_string(),
    }
}
