use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AlphaStackError;
use crate::financials::{AssumptionSet, FinancialSnapshot};
use crate::types::Multiple;
use crate::AlphaStackResult;

use super::model::{ModelKind, ValuationModel, ValuationResult};

/// Prices equity at the median trailing P/E of a peer set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativePe {
    pub peer_pe_ratios: Vec<Multiple>,
}

impl RelativePe {
    pub fn new(peer_pe_ratios: Vec<Multiple>) -> Self {
        RelativePe { peer_pe_ratios }
    }

    /// Median of the positive peer multiples. Loss-making peers (P/E <= 0)
    /// carry no pricing information and are dropped.
    pub fn benchmark_multiple(&self) -> AlphaStackResult<Multiple> {
        let mut usable: Vec<Multiple> = self
            .peer_pe_ratios
            .iter()
            .copied()
            .filter(|pe| *pe > Decimal::ZERO)
            .collect();
        if usable.is_empty() {
            return Err(AlphaStackError::assumptions(
                "peer_pe_ratios",
                "At least one positive peer P/E ratio is required",
            ));
        }
        usable.sort();

        let mid = usable.len() / 2;
        let median = if usable.len() % 2 == 0 {
            (usable[mid - 1] + usable[mid]) / dec!(2)
        } else {
            usable[mid]
        };
        Ok(median)
    }
}

impl ValuationModel for RelativePe {
    fn kind(&self) -> ModelKind {
        ModelKind::RelativePe
    }

    fn valuate(
        &self,
        snapshot: &FinancialSnapshot,
        _assumptions: &AssumptionSet,
    ) -> AlphaStackResult<ValuationResult> {
        snapshot.validate()?;
        let net_income = snapshot.net_income.ok_or_else(|| {
            AlphaStackError::snapshot("net_income", "Required for the relative P/E model")
        })?;
        let multiple = self.benchmark_multiple()?;

        let equity_value = net_income * multiple;
        let enterprise_value = equity_value - snapshot.net_cash();
        let intrinsic_value_per_share = equity_value / snapshot.shares_outstanding;

        debug!(
            model = "relative_pe",
            median_pe = %multiple,
            equity_value = %equity_value,
            intrinsic_value_per_share = %intrinsic_value_per_share,
            "valuation complete"
        );

        Ok(ValuationResult {
            model: ModelKind::RelativePe,
            base_cash_flow: net_income,
            projection: Vec::new(),
            pv_of_cash_flows: Decimal::ZERO,
            terminal_value: Decimal::ZERO,
            discounted_terminal_value: Decimal::ZERO,
            enterprise_value,
            equity_value,
            intrinsic_value_per_share,
        })
    }
}
