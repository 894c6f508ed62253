use napi::Result as NapiResult;
use napi_derive::napi;

use dca_horizon_core::analysis::{run_analysis, simulate_window, AnalysisConfig};
use dca_horizon_core::series::PriceSeries;
use dca_horizon_core::time_value::{cash_flow_irr, CashFlowIrrInput};
use dca_horizon_core::types::{PricePoint, RawQuote};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Price history accepted over the bindings: raw dated quotes awaiting
/// month-end resampling, or already-resampled month points.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum PriceDataInput {
    Quotes(Vec<RawQuote>),
    Points(Vec<PricePoint>),
}

fn build_series(data: PriceDataInput, config: &AnalysisConfig) -> NapiResult<PriceSeries> {
    match data {
        PriceDataInput::Quotes(quotes) => {
            PriceSeries::from_quotes(&quotes, config.price_field).map_err(to_napi_error)
        }
        PriceDataInput::Points(points) => {
            PriceSeries::from_points(points).map_err(to_napi_error)
        }
    }
}

// ---------------------------------------------------------------------------
// Horizon analysis
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct AnalysisBindingInput {
    #[serde(default)]
    config: AnalysisConfig,
    prices: PriceDataInput,
}

#[napi]
pub fn run_horizon_analysis(input_json: String) -> NapiResult<String> {
    let binding_input: AnalysisBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let series = build_series(binding_input.prices, &binding_input.config)?;
    let output = run_analysis(&binding_input.config, &series, |_| {}).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Single-window simulation
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct SimulationBindingInput {
    #[serde(flatten)]
    input: dca_horizon_core::analysis::WindowSimulationInput,
    #[serde(default)]
    config: AnalysisConfig,
    prices: PriceDataInput,
}

#[napi]
pub fn simulate_dca_window(input_json: String) -> NapiResult<String> {
    let binding_input: SimulationBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let series = build_series(binding_input.prices, &binding_input.config)?;
    let output = simulate_window(&binding_input.input, &series).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Cash-flow IRR
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_cash_flow_irr(input_json: String) -> NapiResult<String> {
    let input: CashFlowIrrInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cash_flow_irr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
