mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::AnalyzeArgs;
use commands::cashflow::{IrrArgs, SimulateArgs};

/// Rolling-window DCA return analysis over historical price data
#[derive(Parser)]
#[command(
    name = "dcah",
    version,
    about = "Rolling-window DCA return analysis over historical price data",
    long_about = "Evaluates the annualized internal rate of return of a fixed monthly \
                  investment plan for every (horizon, start-year) window of a price \
                  history, and summarizes best/worst/average returns and success \
                  rates per horizon."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep every horizon and start year and summarize IRR statistics
    Analyze(AnalyzeArgs),
    /// Simulate a single (start-year, horizon) window in detail
    Simulate(SimulateArgs),
    /// Solve the IRR of an explicit cash-flow series
    Irr(IrrArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Simulate(args) => commands::cashflow::run_simulate(args),
        Commands::Irr(args) => commands::cashflow::run_irr(args),
        Commands::Version => {
            println!("dcah {}", env!("CARGO_PKG_VERSION"));
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
