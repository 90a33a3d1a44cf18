use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AlphaStackError;
use crate::types::{Money, PricePoint};
use crate::AlphaStackResult;

use super::drawdown::{simulate_drawdown, StressTestResult};

/// A named market crash and the window its price move is measured over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    /// Short identifier, e.g. `gfc-2008`
    pub id: String,
    /// Display name
    pub name: String,
    /// First day of the window (inclusive)
    pub start: NaiveDate,
    /// Last day of the window (exclusive)
    pub end: NaiveDate,
}

impl HistoricalEvent {
    fn new(id: &str, name: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> Option<Self> {
        Some(HistoricalEvent {
            id: id.into(),
            name: name.into(),
            start: NaiveDate::from_ymd_opt(start.0, start.1, start.2)?,
            end: NaiveDate::from_ymd_opt(end.0, end.1, end.2)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// The built-in crash catalog.
pub fn historical_events() -> Vec<HistoricalEvent> {
    [
        HistoricalEvent::new("covid-2020", "COVID-19 (2020)", (2020, 2, 15), (2020, 3, 23)),
        HistoricalEvent::new(
            "gfc-2008",
            "2008 Financial Crisis",
            (2008, 9, 1),
            (2008, 10, 15),
        ),
        HistoricalEvent::new(
            "great-depression",
            "Great Depression",
            (1929, 9, 1),
            (1930, 6, 1),
        ),
        HistoricalEvent::new("scam-1992", "Scam 1992", (1992, 4, 1), (1992, 5, 15)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Look up an event by id or display name, ignoring case.
pub fn find_event(name: &str) -> AlphaStackResult<HistoricalEvent> {
    let wanted = name.trim().to_lowercase();
    historical_events()
        .into_iter()
        .find(|e| e.id == wanted || e.name.to_lowercase() == wanted)
        .ok_or_else(|| AlphaStackError::UnknownEvent(name.to_string()))
}

/// Replay `event` using the closes that fall inside its window.
///
/// `closes` may be unsorted and may extend beyond the window.
pub fn replay_event(
    event: &HistoricalEvent,
    current_price: Money,
    closes: &[PricePoint],
) -> AlphaStackResult<StressTestResult> {
    let mut window: Vec<&PricePoint> = closes.iter().filter(|p| event.contains(p.date)).collect();
    window.sort_by_key(|p| p.date);

    if window.is_empty() {
        return Err(AlphaStackError::InsufficientHistoricalData(format!(
            "No prices between {} and {} for {}",
            event.start, event.end, event.name
        )));
    }

    simulate_drawdown(
        &event.name,
        current_price,
        window.first().map(|p| p.close),
        window.last().map(|p| p.close),
    )
}
