use serde::{Deserialize, Serialize};

use crate::stress::StressTestResult;
use crate::types::{Money, Percent, PeerQuote};
use crate::valuation::ValuationResult;
use crate::AlphaStackResult;

use super::verdict::{compare_to_market, MarketComparison};

/// Everything one valuation request produced, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub valuation: ValuationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<MarketComparison>,
    #[serde(default)]
    pub stress_tests: Vec<StressTestResult>,
    #[serde(default)]
    pub peers: Vec<PeerQuote>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ValuationReport {
    pub fn new(ticker: Option<String>, valuation: ValuationResult) -> Self {
        ValuationReport {
            ticker,
            valuation,
            comparison: None,
            stress_tests: Vec::new(),
            peers: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Attach a verdict against `market_price`.
    pub fn with_market_price(
        mut self,
        market_price: Money,
        fair_value_band: Percent,
    ) -> AlphaStackResult<Self> {
        self.comparison = Some(compare_to_market(
            self.valuation.intrinsic_value_per_share,
            market_price,
            fair_value_band,
        )?);
        Ok(self)
    }

    pub fn with_stress_test(mut self, result: StressTestResult) -> Self {
        self.stress_tests.push(result);
        self
    }

    pub fn with_peers(mut self, peers: Vec<PeerQuote>) -> Self {
        self.peers = peers;
        self
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Verdict sentence, if a market price was attached.
    pub fn insight(&self) -> Option<String> {
        self.comparison.as_ref().map(MarketComparison::insight)
    }

    /// The most severe simulated price across the attached stress tests.
    pub fn worst_stress_case(&self) -> Option<&StressTestResult> {
        self.stress_tests
            .iter()
            .min_by(|a, b| a.percent_drop.cmp(&b.percent_drop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::verdict::{Verdict, DEFAULT_FAIR_VALUE_BAND};
    use crate::stress::simulate_drawdown;
    use crate::valuation::ModelKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn valuation(per_share: Money) -> ValuationResult {
        ValuationResult {
            model: ModelKind::Dcf,
            base_cash_flow: dec!(120),
            projection: Vec::new(),
            pv_of_cash_flows: Decimal::ZERO,
            terminal_value: Decimal::ZERO,
            discounted_terminal_value: Decimal::ZERO,
            enterprise_value: per_share * dec!(50),
            equity_value: per_share * dec!(50),
            intrinsic_value_per_share: per_share,
        }
    }

    #[test]
    fn test_report_verdict() {
        let report = ValuationReport::new(Some("TCS.NS".into()), valuation(dec!(120)))
            .with_market_price(dec!(100), DEFAULT_FAIR_VALUE_BAND)
            .unwrap();
        let comparison = report.comparison.as_ref().unwrap();
        assert_eq!(comparison.verdict, Verdict::Undervalued);
        assert!(report.insight().unwrap().starts_with("Undervalued by 20.00%"));
    }

    #[test]
    fn test_invalid_market_price_propagates() {
        let result = ValuationReport::new(None, valuation(dec!(120)))
            .with_market_price(Decimal::ZERO, DEFAULT_FAIR_VALUE_BAND);
        assert!(result.is_err());
    }

    #[test]
    fn test_worst_stress_case() {
        let report = ValuationReport::new(None, valuation(dec!(120)))
            .with_stress_test(
                simulate_drawdown("Mild", dec!(100), Some(dec!(100)), Some(dec!(90))).unwrap(),
            )
            .with_stress_test(
                simulate_drawdown("Severe", dec!(100), Some(dec!(100)), Some(dec!(55))).unwrap(),
            );
        assert_eq!(report.worst_stress_case().unwrap().event_name, "Severe");
        assert!(report.insight().is_none());
    }
}
