mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::report::{ReportArgs, VerdictArgs};
use commands::stress::StressTestArgs;
use commands::valuation::ValueArgs;

/// Intrinsic equity valuation and historical stress testing
#[derive(Parser)]
#[command(
    name = "alphastack",
    version,
    about = "Intrinsic equity valuation and historical stress testing",
    long_about = "Values a company from its base-year financials (DCF, relative P/E or \
                  dividend discount), compares the result with the market price, and \
                  replays historical crashes onto today's price. All arithmetic uses \
                  decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Value a company (DCF, relative P/E or dividend discount)
    Value(ValueArgs),
    /// Replay a historical drawdown onto the current price
    StressTest(StressTestArgs),
    /// Compare an intrinsic value with the market price
    Verdict(VerdictArgs),
    /// Full report: valuation, verdict, peers and stress tests from a market-data file
    Report(ReportArgs),
    /// List the built-in historical stress events
    Events,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // stdout carries results only
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Value(args) => commands::valuation::run_value(args),
        Commands::StressTest(args) => commands::stress::run_stress_test(args),
        Commands::Verdict(args) => commands::report::run_verdict(args),
        Commands::Report(args) => commands::report::run_report(args),
        Commands::Events => commands::stress::run_events(),
        Commands::Version => {
            println!("alphastack {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
