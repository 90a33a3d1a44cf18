pub mod error;
pub mod financials;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "stress")]
pub mod stress;

#[cfg(feature = "report")]
pub mod report;

#[cfg(feature = "market_data")]
pub mod market_data;

pub use error::AlphaStackError;
pub use financials::{AssumptionOverrides, AssumptionSet, FinancialSnapshot};
pub use types::*;

/// Standard result type for all AlphaStack operations
pub type AlphaStackResult<T> = Result<T, AlphaStackError>;
