pub mod dcf;
pub mod dividend_discount;
pub mod model;
pub mod relative_pe;

pub use dcf::{
    compute_free_cash_flow, compute_terminal_value, project_cash_flows, valuate,
    CashFlowProjection, DiscountedCashFlow, ProjectedCashFlow, TerminalValue,
};
pub use dividend_discount::DividendDiscount;
pub use model::{ModelKind, ValuationMethod, ValuationModel, ValuationResult};
pub use relative_pe::RelativePe;
