pub mod drawdown;
pub mod events;

pub use drawdown::{simulate_drawdown, StressTestResult};
pub use events::{find_event, historical_events, replay_event, HistoricalEvent};
