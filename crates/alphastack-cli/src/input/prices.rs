//! Closing-price history files for stress replays: CSV with `Date` and
//! `Close` columns, or a JSON array of `{date, close}` points.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use alphastack_core::PricePoint;

use super::file;

pub fn read_price_history(path: &str) -> Result<Vec<PricePoint>, Box<dyn std::error::Error>> {
    let (canonical, contents) = file::read_text(path)?;
    let parsed = if file::extension(&canonical).as_deref() == Some("json") {
        serde_json::from_str(&contents).map_err(Into::into)
    } else {
        parse_price_csv(&contents)
    };
    parsed.map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

pub fn parse_price_csv(contents: &str) -> Result<Vec<PricePoint>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("missing '{}' column", name))
    };
    let date_idx = column("Date")?;
    let close_idx = column("Close")?;

    let mut points = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        // Timestamps like "2020-03-02 00:00:00+05:30" keep only the date part
        let date_part = raw_date.get(..10).unwrap_or(raw_date);
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|e| format!("row {}: bad date '{}': {}", line + 1, raw_date, e))?;
        let raw_close = record.get(close_idx).unwrap_or_default();
        let close = Decimal::from_str(raw_close)
            .or_else(|_| Decimal::from_scientific(raw_close))
            .map_err(|e| format!("row {}: bad close '{}': {}", line + 1, raw_close, e))?;
        points.push(PricePoint { date, close });
    }
    Ok(points)
}
