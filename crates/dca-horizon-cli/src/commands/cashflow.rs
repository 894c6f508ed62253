use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use dca_horizon_core::analysis::{simulate_window, WindowSimulationInput};
use dca_horizon_core::time_value::{cash_flow_irr, CashFlowIrrInput};
use dca_horizon_core::types::PriceField;

use super::analyze::PriceFieldArg;
use crate::input;

/// Arguments for a single-window simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to the price history (JSON or CSV); stdin when piped
    #[arg(long)]
    pub prices: Option<String>,

    /// First calendar year of the window
    #[arg(long)]
    pub start_year: i32,

    /// Window length in years
    #[arg(long)]
    pub years: u16,

    /// Monthly contribution amount
    #[arg(long, default_value = "1000")]
    pub contribution: Decimal,

    /// Quote field used to price purchases
    #[arg(long, value_enum)]
    pub price_field: Option<PriceFieldArg>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::prices::load_price_data(args.prices.as_deref())?;
    let field = args
        .price_field
        .map(PriceField::from)
        .unwrap_or_default();
    let series = input::prices::build_series(&data, field, None, None)?;

    let sim_input = WindowSimulationInput {
        start_year: args.start_year,
        horizon_years: args.years,
        monthly_contribution: args.contribution,
    };
    let result = simulate_window(&sim_input, &series)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a standalone IRR calculation
#[derive(Args)]
pub struct IrrArgs {
    /// Periodic cash flows (comma-separated, e.g. "-1000,-1000,13000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Vec<Decimal>,

    /// Compounding periods per year for annualization
    #[arg(long, default_value = "12")]
    pub periods_per_year: u32,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.cash_flows.is_empty() {
        return Err("--cash-flows is required (e.g. \"-1000,-1000,13000\")".into());
    }
    // Reject degenerate all-zero input before the solver sees it.
    if args.cash_flows.iter().all(|cf| *cf == dec!(0)) {
        return Err("cash flows are all zero".into());
    }

    let irr_input = CashFlowIrrInput {
        cash_flows: args.cash_flows,
        periods_per_year: args.periods_per_year,
    };
    let result = cash_flow_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}
