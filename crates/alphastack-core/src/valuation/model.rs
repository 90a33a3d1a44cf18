//! The valuation capability shared by every model.
//!
//! Each model consumes the same `(FinancialSnapshot, AssumptionSet)` pair and
//! produces a [`ValuationResult`]. [`ValuationMethod`] is the serializable
//! selector callers use to choose a model by configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::financials::{AssumptionSet, FinancialSnapshot};
use crate::types::{Money, Multiple};
use crate::AlphaStackResult;

use super::dcf::{CashFlowProjection, DiscountedCashFlow};
use super::dividend_discount::DividendDiscount;
use super::relative_pe::RelativePe;

/// Which model produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Dcf,
    RelativePe,
    DividendDiscount,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Dcf => write!(f, "Discounted Cash Flow"),
            ModelKind::RelativePe => write!(f, "Relative P/E"),
            ModelKind::DividendDiscount => write!(f, "Dividend Discount"),
        }
    }
}

/// Output of any valuation model, in the snapshot's currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub model: ModelKind,
    /// Base-year flow the model starts from (FCF, dividends, or net income)
    pub base_cash_flow: Money,
    /// Explicit forecast years; empty for multiple-based models
    pub projection: CashFlowProjection,
    /// Sum of the discounted explicit-period flows
    pub pv_of_cash_flows: Money,
    pub terminal_value: Money,
    pub discounted_terminal_value: Money,
    pub enterprise_value: Money,
    pub equity_value: Money,
    pub intrinsic_value_per_share: Money,
}

/// A model that turns financials and assumptions into an intrinsic value.
pub trait ValuationModel {
    fn kind(&self) -> ModelKind;

    fn valuate(
        &self,
        snapshot: &FinancialSnapshot,
        assumptions: &AssumptionSet,
    ) -> AlphaStackResult<ValuationResult>;
}

/// Serializable model selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ValuationMethod {
    #[default]
    Dcf,
    RelativePe {
        /// Peer trailing P/E ratios; when empty, callers may fill them from peer quotes
        #[serde(default)]
        peer_pe_ratios: Vec<Multiple>,
    },
    DividendDiscount,
}

impl ValuationMethod {
    /// Relative P/E with no peer ratios yet.
    pub fn needs_peer_multiples(&self) -> bool {
        matches!(self, ValuationMethod::RelativePe { peer_pe_ratios } if peer_pe_ratios.is_empty())
    }

    /// Replace the peer set of a relative P/E selection; other models are unchanged.
    pub fn with_peer_multiples(self, ratios: Vec<Decimal>) -> Self {
        match self {
            ValuationMethod::RelativePe { .. } => ValuationMethod::RelativePe {
                peer_pe_ratios: ratios,
            },
            other => other,
        }
    }
}

impl ValuationModel for ValuationMethod {
    fn kind(&self) -> ModelKind {
        match self {
            ValuationMethod::Dcf => ModelKind::Dcf,
            ValuationMethod::RelativePe { .. } => ModelKind::RelativePe,
            ValuationMethod::DividendDiscount => ModelKind::DividendDiscount,
        }
    }

    fn valuate(
        &self,
        snapshot: &FinancialSnapshot,
        assumptions: &AssumptionSet,
    ) -> AlphaStackResult<ValuationResult> {
        match self {
            ValuationMethod::Dcf => DiscountedCashFlow.valuate(snapshot, assumptions),
            ValuationMethod::RelativePe { peer_pe_ratios } => {
                RelativePe::new(peer_pe_ratios.clone()).valuate(snapshot, assumptions)
            }
            ValuationMethod::DividendDiscount => DividendDiscount.valuate(snapshot, assumptions),
        }
    }
}
