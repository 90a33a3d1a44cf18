use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentage points (10 = 10%). Every user-facing assumption is a Percent.
pub type Percent = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Multiples (e.g., 22.5x P/E)
pub type Multiple = Decimal;

/// Convert percentage points into a decimal rate.
pub fn to_rate(p: Percent) -> Rate {
    p / dec!(100)
}

/// Currency code
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    INR,
    USD,
    GBP,
    EUR,
    JPY,
    Other(String),
}

/// A single closing price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Money,
}

/// Trading snapshot of a peer company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerQuote {
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<Multiple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Money>,
    /// Year-on-year revenue growth in percentage points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<Percent>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a computation result with methodology, inputs and timing.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_rate() {
        assert_eq!(to_rate(dec!(10)), dec!(0.10));
        assert_eq!(to_rate(dec!(-2.5)), dec!(-0.025));
    }

    #[test]
    fn test_envelope_carries_inputs() {
        let out = with_metadata("Test", &serde_json::json!({"a": 1}), vec![], 7, dec!(1.5));
        assert_eq!(out.methodology, "Test");
        assert_eq!(out.assumptions["a"], 1);
        assert_eq!(out.metadata.computation_time_us, 7);
        assert_eq!(out.result, dec!(1.5));
    }
}
