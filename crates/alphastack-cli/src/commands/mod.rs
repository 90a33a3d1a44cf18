pub mod report;
pub mod stress;
pub mod valuation;
