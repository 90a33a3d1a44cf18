#![cfg(feature = "market_data")]

use std::cell::Cell;

use alphastack_core::market_data::{
    run_valuation, CachedMarketData, ManualClock, MarketDataProvider,
    PeerDirectory, StaticMarketData, ValuationRequest,
};
use alphastack_core::report::Verdict;
use alphastack_core::valuation::{ModelKind, ValuationMethod};
use alphastack_core::{
    AlphaStackError, AlphaStackResult, Currency, FinancialSnapshot, PeerQuote, PricePoint,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const FIXTURE: &str = r#"{
  "companies": {
    "TCS.NS": {
      "snapshot": {
        "revenue": "1000",
        "capital_expenditure": "100",
        "depreciation": "50",
        "change_in_working_capital": "-20",
        "cash": "200",
        "debt": "100",
        "shares_outstanding": "50",
        "net_income": "150"
      },
      "current_price": "40",
      "prices": [
        {"date": "2020-02-17", "close": "100"},
        {"date": "2020-03-02", "close": "85"},
        {"date": "2020-03-20", "close": "70"}
      ]
    },
    "INFY.NS": {"trailing_pe": "24"},
    "WIPRO.NS": {"trailing_pe": "20"},
    "HCLTECH.NS": {"trailing_pe": "22"}
  }
}"#;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fixture() -> StaticMarketData {
    StaticMarketData::from_json_str(FIXTURE).unwrap()
}

// ===========================================================================
// Pipeline
// ===========================================================================

#[test]
fn test_full_pipeline_with_stress_and_peers() {
    let mut request = ValuationRequest::new("tcs.ns");
    request.stress_events = vec!["covid-2020".into(), "gfc-2008".into()];

    let report = run_valuation(&fixture(), &PeerDirectory::nse_defaults(), &request).unwrap();

    assert_eq!(report.ticker.as_deref(), Some("TCS.NS"));
    assert_eq!(report.valuation.model, ModelKind::Dcf);
    assert_eq!(report.valuation.base_cash_flow, dec!(120));

    let comparison = report.comparison.as_ref().unwrap();
    assert_eq!(comparison.market_price, dec!(40));
    // ~49.31 intrinsic vs 40 market
    assert_eq!(comparison.verdict, Verdict::Undervalued);

    // TECHM.NS has no record and is skipped
    let peers: Vec<&str> = report.peers.iter().map(|p| p.ticker.as_str()).collect();
    assert_eq!(peers, vec!["INFY.NS", "WIPRO.NS", "HCLTECH.NS"]);

    assert_eq!(report.stress_tests.len(), 1);
    let covid = &report.stress_tests[0];
    assert_eq!(covid.percent_drop, dec!(-30));
    assert_eq!(covid.simulated_current_price, dec!(28));

    // GFC window has no closes
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("2008 Financial Crisis"));
}

#[test]
fn test_relative_pe_uses_peer_multiples() {
    let mut request = ValuationRequest::new("TCS.NS");
    request.method = ValuationMethod::RelativePe {
        peer_pe_ratios: vec![],
    };
    request.include_peers = false;

    let report = run_valuation(&fixture(), &PeerDirectory::nse_defaults(), &request).unwrap();
    // Median of 24, 20, 22 = 22; 150 * 22 / 50
    assert_eq!(report.valuation.intrinsic_value_per_share, dec!(66));
    assert!(report.peers.is_empty());
}

#[test]
fn test_snapshot_override_and_market_price_override() {
    let mut request = ValuationRequest::new("UNLISTED");
    request.snapshot = Some(FinancialSnapshot {
        ticker: None,
        currency: Currency::USD,
        revenue: dec!(1000),
        ebit: Some(dec!(200)),
        capital_expenditure: dec!(100),
        depreciation: dec!(50),
        change_in_working_capital: dec!(-20),
        cash: dec!(200),
        debt: dec!(100),
        shares_outstanding: dec!(50),
        net_income: None,
        dividends: None,
    });
    request.market_price = Some(dec!(49));
    request.include_peers = false;

    let report = run_valuation(&StaticMarketData::new(), &PeerDirectory::new(), &request).unwrap();
    assert_eq!(
        report.comparison.unwrap().verdict,
        Verdict::FairlyValued
    );
    assert!(report.warnings.is_empty());
}

#[test]
fn test_missing_price_is_a_warning() {
    let mut md = fixture();
    let mut record = md.companies["TCS.NS"].clone();
    record.current_price = None;
    record.prices.clear();
    md.insert("TCS.NS", record);

    let mut request = ValuationRequest::new("TCS.NS");
    request.include_peers = false;
    request.stress_events = vec!["Scam 1992".into()];

    let report = run_valuation(&md, &PeerDirectory::new(), &request).unwrap();
    assert!(report.comparison.is_none());
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn test_unknown_event_and_unknown_ticker_fail() {
    let mut request = ValuationRequest::new("TCS.NS");
    request.stress_events = vec!["Tulip Mania".into()];
    let err = run_valuation(&fixture(), &PeerDirectory::new(), &request).unwrap_err();
    assert!(matches!(err, AlphaStackError::UnknownEvent(_)));

    let err = run_valuation(&fixture(), &PeerDirectory::new(), &ValuationRequest::new("NOPE"))
        .unwrap_err();
    assert!(matches!(err, AlphaStackError::MarketDataUnavailable { .. }));
}

#[test]
fn test_request_from_json_defaults() {
    let request: ValuationRequest = serde_json::from_str(
        r#"{"ticker": "TCS.NS", "method": {"model": "dividend_discount"}}"#,
    )
    .unwrap();
    assert_eq!(request.fair_value_band, dec!(10));
    assert!(request.include_peers);
    assert_eq!(request.assumptions.forecast_years, 5);
}

// ===========================================================================
// Cache
// ===========================================================================

struct CountingProvider {
    inner: StaticMarketData,
    calls: Cell<u32>,
}

impl MarketDataProvider for CountingProvider {
    fn company_snapshot(&self, ticker: &str) -> AlphaStackResult<FinancialSnapshot> {
        self.calls.set(self.calls.get() + 1);
        self.inner.company_snapshot(ticker)
    }

    fn current_price(&self, ticker: &str) -> AlphaStackResult<Decimal> {
        self.calls.set(self.calls.get() + 1);
        self.inner.current_price(ticker)
    }

    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AlphaStackResult<Vec<PricePoint>> {
        self.calls.set(self.calls.get() + 1);
        self.inner.price_history(ticker, start, end)
    }

    fn peer_tickers(&self, ticker: &str) -> AlphaStackResult<Vec<String>> {
        self.calls.set(self.calls.get() + 1);
        self.inner.peer_tickers(ticker)
    }

    fn peer_quote(&self, ticker: &str) -> AlphaStackResult<PeerQuote> {
        self.calls.set(self.calls.get() + 1);
        self.inner.peer_quote(ticker)
    }
}

#[test]
fn test_cached_provider_memoizes_within_ttl() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    let provider = CountingProvider {
        inner: fixture(),
        calls: Cell::new(0),
    };
    let cached = CachedMarketData::with_clock(provider, Duration::seconds(3600), clock.clone());

    cached.current_price("TCS.NS").unwrap();
    cached.current_price("tcs.ns").unwrap();
    cached
        .price_history("TCS.NS", day(2020, 2, 15), day(2020, 3, 23))
        .unwrap();
    cached
        .price_history("TCS.NS", day(2020, 2, 15), day(2020, 3, 23))
        .unwrap();
    assert_eq!(cached.inner().calls.get(), 2);

    clock.advance(Duration::seconds(3600));
    cached.current_price("TCS.NS").unwrap();
    assert_eq!(cached.inner().calls.get(), 3);
}

#[test]
fn test_cached_provider_does_not_cache_failures() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    let provider = CountingProvider {
        inner: fixture(),
        calls: Cell::new(0),
    };
    let cached = CachedMarketData::with_clock(provider, Duration::seconds(60), clock);

    assert!(cached.peer_quote("MISSING.NS").is_err());
    assert!(cached.peer_quote("MISSING.NS").is_err());
    assert_eq!(cached.inner().calls.get(), 2);
}

#[test]
fn test_pipeline_over_cached_provider_matches_uncached() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    let cached = CachedMarketData::with_clock(fixture(), Duration::seconds(3600), clock);
    let request = ValuationRequest::new("TCS.NS");

    let direct = run_valuation(&fixture(), &PeerDirectory::nse_defaults(), &request).unwrap();
    let first = run_valuation(&cached, &PeerDirectory::nse_defaults(), &request).unwrap();
    let second = run_valuation(&cached, &PeerDirectory::nse_defaults(), &request).unwrap();
    assert_eq!(direct, first);
    assert_eq!(first, second);
}
