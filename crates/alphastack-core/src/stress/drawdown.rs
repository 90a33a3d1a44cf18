use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AlphaStackError;
use crate::types::{Money, Percent};
use crate::AlphaStackResult;

/// Outcome of replaying a historical move onto today's price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressTestResult {
    pub event_name: String,
    pub start_price: Money,
    pub end_price: Money,
    /// Signed move over the event window; negative for a fall
    pub percent_drop: Percent,
    pub simulated_current_price: Money,
}

/// Scale `current_price` by the percentage move between the historical start
/// and end prices.
///
/// Prices come from the caller; nothing is fetched here.
pub fn simulate_drawdown(
    event_name: &str,
    current_price: Money,
    historical_start_price: Option<Money>,
    historical_end_price: Option<Money>,
) -> AlphaStackResult<StressTestResult> {
    let (start_price, end_price) = match (historical_start_price, historical_end_price) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(AlphaStackError::InsufficientHistoricalData(format!(
                "{event_name}: start and end prices are both required"
            )))
        }
    };
    if start_price.is_zero() {
        return Err(AlphaStackError::InsufficientHistoricalData(format!(
            "{event_name}: historical start price is zero"
        )));
    }

    let percent_drop = (end_price - start_price) / start_price * dec!(100);
    let simulated_current_price = current_price * (Decimal::ONE + percent_drop / dec!(100));

    Ok(StressTestResult {
        event_name: event_name.to_string(),
        start_price,
        end_price,
        percent_drop,
        simulated_current_price,
    })
}
