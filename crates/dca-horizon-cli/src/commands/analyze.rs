use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde_json::Value;

use dca_horizon_core::analysis::{run_analysis, AnalysisConfig, SkipReason, WindowOutcome};
use dca_horizon_core::types::PriceField;

use crate::input;

/// Arguments for the full horizon sweep
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the price history (JSON array of quotes or month points,
    /// or CSV with date,adj_close,close columns); stdin when piped
    #[arg(long)]
    pub prices: Option<String>,

    /// Path to a JSON/YAML analysis config file (flags override it)
    #[arg(long)]
    pub config: Option<String>,

    /// Ticker symbol recorded in the report metadata
    #[arg(long)]
    pub ticker: Option<String>,

    /// Monthly contribution amount
    #[arg(long)]
    pub contribution: Option<Decimal>,

    /// Shortest horizon to analyze, in years
    #[arg(long)]
    pub min_years: Option<u16>,

    /// Longest horizon to analyze, in years
    #[arg(long)]
    pub max_years: Option<u16>,

    /// Ignore samples dated before this day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Ignore samples dated after this day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Quote field used to price purchases
    #[arg(long, value_enum)]
    pub price_field: Option<PriceFieldArg>,

    /// Write the chart series JSON to this path for external plotting
    #[arg(long)]
    pub chart_out: Option<String>,

    /// Print one line per processed window
    #[arg(long)]
    pub verbose: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriceFieldArg {
    AdjClose,
    Close,
}

impl From<PriceFieldArg> for PriceField {
    fn from(arg: PriceFieldArg) -> Self {
        match arg {
            PriceFieldArg::AdjClose => PriceField::AdjClose,
            PriceFieldArg::Close => PriceField::Close,
        }
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config: AnalysisConfig = match args.config {
        Some(ref path) => input::file::read_config(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(ticker) = args.ticker {
        config.ticker_symbol = Some(ticker);
    }
    if let Some(contribution) = args.contribution {
        config.monthly_contribution = contribution;
    }
    if let Some(years) = args.min_years {
        config.min_horizon_years = years;
    }
    if let Some(years) = args.max_years {
        config.max_horizon_years = years;
    }
    if let Some(date) = args.from {
        config.start_date = Some(date);
    }
    if let Some(date) = args.to {
        config.end_date = Some(date);
    }
    if let Some(field) = args.price_field {
        config.price_field = field.into();
    }

    let data = input::prices::load_price_data(args.prices.as_deref())?;
    let series = input::prices::build_series(
        &data,
        config.price_field,
        config.start_date,
        config.end_date,
    )?;

    // The enumeration is restartable, so counting it first is free.
    let total_windows = config.window_plan(&series).windows(&series).count();
    let bar = if args.no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total_windows as u64)
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("=>-"),
    );

    let verbose = args.verbose;
    let output = run_analysis(&config, &series, |record| {
        bar.inc(1);
        bar.set_message(format!(
            "{}y from {}",
            record.horizon_years, record.start_year
        ));
        if verbose {
            let end_year = record.start_year + i32::from(record.horizon_years) - 1;
            let line = match record.outcome {
                WindowOutcome::Computed { annualized } => format!(
                    "  {} to {}: IRR = {:.2}%",
                    record.start_year,
                    end_year,
                    annualized * Decimal::ONE_HUNDRED
                ),
                WindowOutcome::Skipped { reason } => {
                    let msg = format!(
                        "  {} to {}: skipped ({})",
                        record.start_year,
                        end_year,
                        skip_label(reason)
                    );
                    msg.as_str().yellow().to_string()
                }
            };
            bar.suspend(|| eprintln!("{line}"));
        }
    })?;
    bar.finish_and_clear();

    if let Some(ref path) = args.chart_out {
        std::fs::write(path, serde_json::to_string_pretty(&output.result.chart)?)?;
    }

    Ok(serde_json::to_value(output)?)
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::EmptyCashFlows => "no cash flows",
        SkipReason::NoSignChange => "no sign change in cash flows",
        SkipReason::NoConvergence => "IRR did not converge",
    }
}
