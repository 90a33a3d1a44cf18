use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AlphaStackError;
use crate::types::{Money, Percent};
use crate::AlphaStackResult;

/// Default half-width of the fair-value band, in percent of the market price.
pub const DEFAULT_FAIR_VALUE_BAND: Percent = dec!(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Undervalued,
    Overvalued,
    FairlyValued,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Undervalued => write!(f, "Undervalued"),
            Verdict::Overvalued => write!(f, "Overvalued"),
            Verdict::FairlyValued => write!(f, "Fairly valued"),
        }
    }
}

/// Intrinsic value against the quoted price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketComparison {
    pub intrinsic_value_per_share: Money,
    pub market_price: Money,
    /// (intrinsic - market) / market, in percent
    pub percent_difference: Percent,
    pub verdict: Verdict,
    pub fair_value_band: Percent,
}

impl MarketComparison {
    /// One-line summary, e.g. "Undervalued by 20.00% (market 100.00 vs intrinsic 120.00)".
    pub fn insight(&self) -> String {
        let market = self.market_price.round_dp(2);
        let intrinsic = self.intrinsic_value_per_share.round_dp(2);
        match self.verdict {
            Verdict::FairlyValued => format!(
                "Fairly valued: within {:.2}% of market (market {:.2} vs intrinsic {:.2})",
                self.fair_value_band, market, intrinsic
            ),
            v => format!(
                "{v} by {:.2}% (market {:.2} vs intrinsic {:.2})",
                self.percent_difference.abs().round_dp(2),
                market,
                intrinsic
            ),
        }
    }
}

/// Classify intrinsic value against the market price.
///
/// A difference strictly inside `fair_value_band` is `FairlyValued`.
pub fn compare_to_market(
    intrinsic_value_per_share: Money,
    current_market_price: Money,
    fair_value_band: Percent,
) -> AlphaStackResult<MarketComparison> {
    if current_market_price <= Decimal::ZERO {
        return Err(AlphaStackError::InvalidMarketPrice {
            field: "current_market_price".into(),
            reason: format!("Market price must be positive, got {current_market_price}"),
        });
    }
    if fair_value_band < Decimal::ZERO {
        return Err(AlphaStackError::assumptions(
            "fair_value_band",
            "Fair-value band cannot be negative",
        ));
    }

    let percent_difference =
        (intrinsic_value_per_share - current_market_price) / current_market_price * dec!(100);

    let verdict = if percent_difference.abs() < fair_value_band || percent_difference.is_zero() {
        Verdict::FairlyValued
    } else if percent_difference > Decimal::ZERO {
        Verdict::Undervalued
    } else {
        Verdict::Overvalued
    };

    Ok(MarketComparison {
        intrinsic_value_per_share,
        market_price: current_market_price,
        percent_difference,
        verdict,
        fair_value_band,
    })
}
