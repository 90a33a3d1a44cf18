pub mod cache;
pub mod peers;
pub mod pipeline;
pub mod provider;

pub use cache::{CachedMarketData, Clock, ManualClock, SystemClock, TtlCache, DEFAULT_TTL_SECS};
pub use peers::{peer_pe_ratios, peer_tickers, resolve_peers, PeerDirectory, MAX_PEERS};
pub use pipeline::{run_valuation, ValuationRequest};
pub use provider::{CompanyRecord, MarketDataProvider, StaticMarketData};
