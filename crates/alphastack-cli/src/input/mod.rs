pub mod config;
pub mod file;
pub mod financials;
pub mod prices;
pub mod stdin;
