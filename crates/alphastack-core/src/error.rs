use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlphaStackError {
    #[error("Invalid assumptions: {field} — {reason}")]
    InvalidAssumptions { field: String, reason: String },

    #[error("Invalid snapshot: {field} — {reason}")]
    InvalidSnapshot { field: String, reason: String },

    #[error("Invalid market price: {field} — {reason}")]
    InvalidMarketPrice { field: String, reason: String },

    #[error("Insufficient historical data: {0}")]
    InsufficientHistoricalData(String),

    #[error("Market data unavailable for {ticker}: {reason}")]
    MarketDataUnavailable { ticker: String, reason: String },

    #[error("Unknown stress event: {0}")]
    UnknownEvent(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AlphaStackError {
    pub(crate) fn assumptions(field: &str, reason: impl Into<String>) -> Self {
        AlphaStackError::InvalidAssumptions {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn snapshot(field: &str, reason: impl Into<String>) -> Self {
        AlphaStackError::InvalidSnapshot {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AlphaStackError {
    fn from(e: serde_json::Error) -> Self {
        AlphaStackError::SerializationError(e.to_string())
    }
}
