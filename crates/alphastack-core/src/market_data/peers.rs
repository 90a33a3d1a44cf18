use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Multiple, PeerQuote};

use super::provider::MarketDataProvider;

/// Most peers shown for one company.
pub const MAX_PEERS: usize = 5;

/// Fallback peer lists, consulted when the provider has none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDirectory {
    #[serde(default)]
    fallback: HashMap<String, Vec<String>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Large-cap NSE sector groupings.
    pub fn nse_defaults() -> Self {
        let mut dir = PeerDirectory::new();
        dir.insert("TCS.NS", &["INFY.NS", "WIPRO.NS", "HCLTECH.NS", "TECHM.NS"]);
        dir.insert("BRITANNIA.NS", &["NESTLEIND.NS", "HINDUNILVR.NS", "ITC.NS"]);
        dir.insert("RELIANCE.NS", &["IOC.NS", "ONGC.NS", "BPCL.NS"]);
        dir.insert("HDFCBANK.NS", &["ICICIBANK.NS", "AXISBANK.NS", "SBIN.NS"]);
        dir
    }

    pub fn insert(&mut self, ticker: &str, peers: &[&str]) {
        self.fallback.insert(
            ticker.to_uppercase(),
            peers.iter().map(|p| p.to_uppercase()).collect(),
        );
    }

    pub fn fallback_for(&self, ticker: &str) -> Vec<String> {
        self.fallback
            .get(&ticker.to_uppercase())
            .cloned()
            .unwrap_or_default()
    }
}

/// Peer tickers for `ticker`: the provider's list, else the directory's.
///
/// The company itself and duplicates are dropped and the list is capped at
/// [`MAX_PEERS`].
pub fn peer_tickers<P: MarketDataProvider + ?Sized>(
    provider: &P,
    directory: &PeerDirectory,
    ticker: &str,
) -> Vec<String> {
    let from_provider = match provider.peer_tickers(ticker) {
        Ok(list) => list,
        Err(e) => {
            warn!(ticker, error = %e, "peer lookup failed, using fallback directory");
            Vec::new()
        }
    };
    let candidates = if from_provider.is_empty() {
        directory.fallback_for(ticker)
    } else {
        from_provider
    };

    let mut peers: Vec<String> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.to_uppercase();
        if !candidate.eq_ignore_ascii_case(ticker) && !peers.contains(&candidate) {
            peers.push(candidate);
        }
        if peers.len() >= MAX_PEERS {
            break;
        }
    }
    debug!(ticker, count = peers.len(), "resolved peers");
    peers
}

/// Quotes for every resolvable peer. Peers the provider cannot quote are skipped.
pub fn resolve_peers<P: MarketDataProvider + ?Sized>(
    provider: &P,
    directory: &PeerDirectory,
    ticker: &str,
) -> Vec<PeerQuote> {
    peer_tickers(provider, directory, ticker)
        .into_iter()
        .filter_map(|peer| match provider.peer_quote(&peer) {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!(peer = %peer, error = %e, "skipping peer without quote");
                None
            }
        })
        .collect()
}

/// Trailing P/E ratios that are present in the quotes.
pub fn peer_pe_ratios(quotes: &[PeerQuote]) -> Vec<Multiple> {
    quotes.iter().filter_map(|q| q.trailing_pe).collect()
}
