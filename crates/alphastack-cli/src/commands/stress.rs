use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use alphastack_core::stress::{
    find_event, historical_events, replay_event, simulate_drawdown, StressTestResult,
};
use alphastack_core::types::with_metadata;

use crate::input;

/// Arguments for a drawdown stress test
#[derive(Args)]
pub struct StressTestArgs {
    /// Path to JSON input file ({event_name, current_price, start_price, end_price})
    #[arg(long)]
    pub input: Option<String>,

    /// Catalog event id or name (see `alphastack events`)
    #[arg(long)]
    pub event: Option<String>,

    /// Label for a custom scenario when no catalog event is used
    #[arg(long, default_value = "Custom scenario")]
    pub name: String,

    /// Today's share price
    #[arg(long)]
    pub current_price: Option<Decimal>,

    /// Historical price at the start of the window
    #[arg(long)]
    pub start_price: Option<Decimal>,

    /// Historical price at the end of the window
    #[arg(long)]
    pub end_price: Option<Decimal>,

    /// Closing-price history (CSV with Date/Close, or JSON) to replay the event over
    #[arg(long)]
    pub prices: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DrawdownInput {
    event_name: String,
    current_price: Decimal,
    start_price: Option<Decimal>,
    end_price: Option<Decimal>,
}

pub fn run_stress_test(args: StressTestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let piped: Option<DrawdownInput> = if let Some(ref path) = args.input {
        Some(input::file::read_json(path)?)
    } else if args.current_price.is_none() {
        input::stdin::read_stdin("{event_name, current_price, start_price, end_price}")?
    } else {
        None
    };

    let result: StressTestResult = if let Some(inp) = piped {
        simulate_drawdown(&inp.event_name, inp.current_price, inp.start_price, inp.end_price)?
    } else {
        let current_price = args
            .current_price
            .ok_or("--current-price is required (or provide --input)")?;
        match (&args.event, &args.prices) {
            (Some(name), Some(path)) => {
                let event = find_event(name)?;
                let closes = input::prices::read_price_history(path)?;
                replay_event(&event, current_price, &closes)?
            }
            (Some(name), None) => {
                let event = find_event(name)?;
                simulate_drawdown(&event.name, current_price, args.start_price, args.end_price)?
            }
            (None, _) => {
                simulate_drawdown(&args.name, current_price, args.start_price, args.end_price)?
            }
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        "Historical drawdown replay (percentage move applied to current price)",
        &json!({
            "event": args.event,
            "current_price": args.current_price,
            "start_price": args.start_price,
            "end_price": args.end_price,
            "prices": args.prices,
        }),
        Vec::new(),
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_events() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(historical_events())?)
}
