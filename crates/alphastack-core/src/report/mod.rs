pub mod summary;
pub mod verdict;

pub use summary::ValuationReport;
pub use verdict::{compare_to_market, MarketComparison, Verdict, DEFAULT_FAIR_VALUE_BAND};
