use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::HorizonError;
use crate::report::{build_report, chart_series, ChartSeries, HorizonSummaryRow};
use crate::series::PriceSeries;
use crate::simulation::build_cash_flows;
use crate::stats::StatsAggregator;
use crate::time_value::{annualize, irr, DEFAULT_IRR_GUESS};
use crate::types::{with_metadata, ComputationOutput, Money, MonthStamp, PriceField, Rate};
use crate::windows::WindowPlan;
use crate::HorizonResult;

const COMPOUNDING_PERIODS_PER_YEAR: u32 = 12;

/// Configuration for a horizon analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Instrument label carried through to the report metadata
    pub ticker_symbol: Option<String>,
    /// Date bounds the data collaborator applied (or should apply) to the
    /// retrieved history; echoed in the assumptions
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub monthly_contribution: Money,
    pub min_horizon_years: u16,
    pub max_horizon_years: u16,
    /// First candidate start year; defaults to the series' first year
    pub min_start_year: Option<i32>,
    /// See `WindowPlan::last_available_year`; defaults to the year after
    /// the series' last year
    pub last_available_year: Option<i32>,
    pub price_field: PriceField,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ticker_symbol: None,
            start_date: None,
            end_date: None,
            monthly_contribution: dec!(1000),
            min_horizon_years: 1,
            max_horizon_years: 40,
            min_start_year: None,
            last_available_year: None,
            price_field: PriceField::default(),
        }
    }
}

impl AnalysisConfig {
    fn validate(&self) -> HorizonResult<()> {
        if self.monthly_contribution <= Decimal::ZERO {
            return Err(HorizonError::InvalidInput {
                field: "monthly_contribution".into(),
                reason: "Monthly contribution must be positive".into(),
            });
        }
        if self.min_horizon_years == 0 {
            return Err(HorizonError::InvalidInput {
                field: "min_horizon_years".into(),
                reason: "Horizon must be at least one year".into(),
            });
        }
        if self.min_horizon_years > self.max_horizon_years {
            return Err(HorizonError::InvalidInput {
                field: "max_horizon_years".into(),
                reason: "Maximum horizon must not be below the minimum".into(),
            });
        }
        Ok(())
    }

    /// The enumeration bounds for this config over `series`.
    pub fn window_plan(&self, series: &PriceSeries) -> WindowPlan {
        let mut plan =
            WindowPlan::from_series(series, self.min_horizon_years, self.max_horizon_years);
        if let Some(year) = self.min_start_year {
            plan.min_start_year = year;
        }
        if let Some(year) = self.last_available_year {
            plan.last_available_year = year;
        }
        plan
    }
}

/// Why a window contributed nothing to the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyCashFlows,
    NoSignChange,
    NoConvergence,
}

/// Outcome of one attempted window, streamed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowOutcome {
    Computed { annualized: Rate },
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub horizon_years: u16,
    pub start_year: i32,
    pub outcome: WindowOutcome,
}

/// Final result of a horizon analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub rows: Vec<HorizonSummaryRow>,
    pub chart: ChartSeries,
    pub windows_computed: u32,
    pub windows_skipped: u32,
}

/// Run the full sweep: enumerate every complete (horizon, start-year)
/// window, simulate the monthly purchases, solve and annualize the IRR,
/// and fold the result into per-horizon statistics.
///
/// Per-window failures are contained: the window is skipped, reported to
/// `progress`, and counted in the warnings. Only an invalid configuration
/// aborts the run.
pub fn run_analysis(
    config: &AnalysisConfig,
    series: &PriceSeries,
    mut progress: impl FnMut(&WindowRecord),
) -> HorizonResult<ComputationOutput<AnalysisOutput>> {
    let start = Instant::now();
    config.validate()?;

    let plan = config.window_plan(series);
    let mut aggregator = StatsAggregator::new();
    let mut computed: u32 = 0;
    let mut skipped: u32 = 0;

    for window in plan.windows(series) {
        let skipped_record = |reason: SkipReason| WindowRecord {
            horizon_years: window.horizon_years,
            start_year: window.start_year,
            outcome: WindowOutcome::Skipped { reason },
        };

        let cash_flows = match build_cash_flows(window.periods, config.monthly_contribution) {
            Ok(cf) => cf,
            Err(HorizonError::EmptySeries) => {
                skipped += 1;
                progress(&skipped_record(SkipReason::EmptyCashFlows));
                continue;
            }
            Err(e) => return Err(e),
        };

        let periodic = match irr(&cash_flows.flows, DEFAULT_IRR_GUESS) {
            Ok(rate) => rate,
            Err(HorizonError::NoSignChange) => {
                skipped += 1;
                progress(&skipped_record(SkipReason::NoSignChange));
                continue;
            }
            Err(HorizonError::ConvergenceFailure { .. })
            | Err(HorizonError::InsufficientData(_)) => {
                skipped += 1;
                progress(&skipped_record(SkipReason::NoConvergence));
                continue;
            }
            Err(e) => return Err(e),
        };

        let annualized = annualize(periodic, COMPOUNDING_PERIODS_PER_YEAR);
        aggregator.record(window.horizon_years, window.start_year, annualized);
        computed += 1;
        progress(&WindowRecord {
            horizon_years: window.horizon_years,
            start_year: window.start_year,
            outcome: WindowOutcome::Computed { annualized },
        });
    }

    let rows = build_report(&aggregator, config.min_horizon_years, config.max_horizon_years);
    let chart = chart_series(&rows);

    let mut warnings = Vec::new();
    if skipped > 0 {
        warnings.push(format!("{skipped} window(s) produced no usable IRR and were skipped"));
    }
    let empty_horizons = rows.iter().filter(|r| r.total_periods == 0).count();
    if empty_horizons > 0 {
        warnings.push(format!("{empty_horizons} horizon(s) have no valid periods"));
    }

    let output = AnalysisOutput {
        rows,
        chart,
        windows_computed: computed,
        windows_skipped: skipped,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rolling-window DCA simulation; monthly IRR via Newton-Raphson with bisection \
         fallback, annualized as (1+r)^12 - 1",
        &serde_json::json!({
            "ticker_symbol": config.ticker_symbol,
            "monthly_contribution": config.monthly_contribution.to_string(),
            "min_horizon_years": plan.min_horizon_years,
            "max_horizon_years": plan.max_horizon_years,
            "min_start_year": plan.min_start_year,
            "last_available_year": plan.last_available_year,
            "start_date": config.start_date,
            "end_date": config.end_date,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Input for a single-window simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSimulationInput {
    pub start_year: i32,
    pub horizon_years: u16,
    #[serde(default = "default_contribution")]
    pub monthly_contribution: Money,
}

fn default_contribution() -> Money {
    dec!(1000)
}

/// Output of a single-window simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSimulationOutput {
    pub start_year: i32,
    pub horizon_years: u16,
    pub cash_flows: Vec<Money>,
    pub final_value: Money,
    pub total_contributed: Money,
    pub shares_held: Decimal,
    pub value_trail: Vec<Money>,
    /// None when the solver could not produce a rate for this window
    pub periodic_irr: Option<Rate>,
    pub annualized_irr: Option<Rate>,
}

/// Simulate one concrete (start-year, horizon) window and solve its IRR.
pub fn simulate_window(
    input: &WindowSimulationInput,
    series: &PriceSeries,
) -> HorizonResult<ComputationOutput<WindowSimulationOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.horizon_years == 0 {
        return Err(HorizonError::InvalidInput {
            field: "horizon_years".into(),
            reason: "Horizon must be at least one year".into(),
        });
    }

    let months = usize::from(input.horizon_years) * 12;
    let begin = MonthStamp::new(input.start_year, 1);
    let periods = series.slice(begin, months).ok_or_else(|| {
        HorizonError::InsufficientData(format!(
            "series does not cover {} month(s) starting {begin}",
            months
        ))
    })?;

    let cash_flows = build_cash_flows(periods, input.monthly_contribution)?;

    let periodic = match irr(&cash_flows.flows, DEFAULT_IRR_GUESS) {
        Ok(rate) => Some(rate),
        Err(e @ (HorizonError::NoSignChange | HorizonError::ConvergenceFailure { .. })) => {
            warnings.push(format!("IRR calculation warning: {e}"));
            None
        }
        Err(e) => return Err(e),
    };
    let annualized = periodic.map(|r| annualize(r, COMPOUNDING_PERIODS_PER_YEAR));

    let state = cash_flows.state;
    let output = WindowSimulationOutput {
        start_year: input.start_year,
        horizon_years: input.horizon_years,
        cash_flows: cash_flows.flows,
        final_value: cash_flows.final_value,
        total_contributed: state.total_contributed,
        shares_held: state.shares_held,
        value_trail: state.value_trail,
        periodic_irr: periodic,
        annualized_irr: annualized,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Single-window DCA simulation with monthly IRR",
        &serde_json::json!({
            "start_year": input.start_year,
            "horizon_years": input.horizon_years,
            "monthly_contribution": input.monthly_contribution.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
