use chrono::NaiveDate;
use dca_horizon_core::analysis::{
    run_analysis, simulate_window, AnalysisConfig, WindowOutcome, WindowSimulationInput,
};
use dca_horizon_core::series::PriceSeries;
use dca_horizon_core::types::{PriceField, RawQuote};
use dca_horizon_core::HorizonError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Helpers
// ===========================================================================

fn quote(year: i32, month: u32, price: Decimal) -> RawQuote {
    RawQuote {
        date: NaiveDate::from_ymd_opt(year, month, 28).unwrap(),
        adj_close: Some(price),
        close: None,
    }
}

/// `years` full calendar years of one price per month, starting January of
/// `first_year`, produced by `price_at(month_index)`.
fn series_from(first_year: i32, years: i32, price_at: impl Fn(usize) -> Decimal) -> PriceSeries {
    let mut quotes = Vec::new();
    let mut idx = 0;
    for y in first_year..first_year + years {
        for m in 1..=12 {
            quotes.push(quote(y, m, price_at(idx)));
            idx += 1;
        }
    }
    PriceSeries::from_quotes(&quotes, PriceField::AdjClose).unwrap()
}

fn config(min_years: u16, max_years: u16) -> AnalysisConfig {
    AnalysisConfig {
        min_horizon_years: min_years,
        max_horizon_years: max_years,
        ..AnalysisConfig::default()
    }
}

// ===========================================================================
// Full-sweep behavior
// ===========================================================================

#[test]
fn test_flat_market_sweep_returns_zero_irr() {
    let series = series_from(1970, 3, |_| dec!(100));
    let output = run_analysis(&config(1, 2), &series, |_| {}).unwrap();
    let result = &output.result;

    assert_eq!(result.windows_computed, 5); // 3 one-year + 2 two-year
    assert_eq!(result.windows_skipped, 0);
    assert_eq!(result.rows.len(), 2);

    let one_year = &result.rows[0];
    assert_eq!(one_year.total_periods, 3);
    // No growth means a zero return, within solver tolerance.
    assert!(one_year.best_irr_pct.unwrap().abs() < dec!(0.01));
    assert!(one_year.min_irr_pct.unwrap().abs() < dec!(0.01));
    assert!(one_year.average_irr_pct.unwrap().abs() < dec!(0.01));
    // Identical windows tie; the earliest start year wins.
    assert_eq!(one_year.best_start_year, Some(1970));
}

#[test]
fn test_growing_market_sweep_is_always_positive() {
    // 1% monthly growth; every window of every horizon gains.
    let mut prices = Vec::new();
    let mut p = dec!(50);
    for _ in 0..36 {
        prices.push(p);
        p *= dec!(1.01);
    }
    let series = series_from(1970, 3, |i| prices[i]);

    let output = run_analysis(&config(1, 3), &series, |_| {}).unwrap();
    for row in &output.result.rows {
        assert_eq!(row.positive_periods, row.total_periods);
        assert_eq!(row.success_rate_pct, Some(dec!(100)));
        let avg = row.average_irr_pct.unwrap();
        assert!(avg > Decimal::ZERO);
        assert!(row.min_irr_pct.unwrap() <= avg && avg <= row.max_irr_pct.unwrap());
        assert_eq!(row.best_irr_pct, row.max_irr_pct);
    }
    assert!(output.warnings.is_empty());
}

#[test]
fn test_horizons_beyond_span_keep_their_rows() {
    let series = series_from(1970, 3, |_| dec!(100));
    let output = run_analysis(&config(1, 5), &series, |_| {}).unwrap();
    let rows = &output.result.rows;

    assert_eq!(rows.len(), 5);
    for row in &rows[3..] {
        assert_eq!(row.total_periods, 0);
        assert!(row.best_start_year.is_none());
        assert!(row.min_irr_pct.is_none());
        assert!(row.success_rate_pct.is_none());
    }
    assert!(output
        .warnings
        .iter()
        .any(|w| w.contains("no valid periods")));
}

#[test]
fn test_unusable_prices_skip_windows_without_aborting() {
    // Every month quotes a zero price: nothing is ever bought, cash flows
    // never change sign, and every window is skipped.
    let series = series_from(1970, 2, |_| dec!(0));
    let output = run_analysis(&config(1, 1), &series, |_| {}).unwrap();
    let result = &output.result;

    assert_eq!(result.windows_computed, 0);
    assert_eq!(result.windows_skipped, 2);
    assert_eq!(result.rows[0].total_periods, 0);
    assert!(output.warnings.iter().any(|w| w.contains("skipped")));
}

#[test]
fn test_progress_records_cover_every_window_in_order() {
    let series = series_from(1970, 3, |_| dec!(100));
    let mut records = Vec::new();
    let output = run_analysis(&config(1, 2), &series, |r| records.push(*r)).unwrap();

    assert_eq!(
        records.len() as u32,
        output.result.windows_computed + output.result.windows_skipped
    );

    // Within a horizon, start years arrive in increasing order.
    for pair in records.windows(2) {
        if pair[0].horizon_years == pair[1].horizon_years {
            assert!(pair[0].start_year < pair[1].start_year);
        }
    }
    assert!(records
        .iter()
        .all(|r| matches!(r.outcome, WindowOutcome::Computed { .. })));
}

#[test]
fn test_min_start_year_override() {
    let series = series_from(1970, 3, |_| dec!(100));
    let cfg = AnalysisConfig {
        min_start_year: Some(1971),
        ..config(1, 1)
    };
    let output = run_analysis(&cfg, &series, |_| {}).unwrap();
    assert_eq!(output.result.windows_computed, 2);
}

#[test]
fn test_chart_series_tracks_rows() {
    let series = series_from(1970, 3, |_| dec!(100));
    let output = run_analysis(&config(1, 4), &series, |_| {}).unwrap();
    let chart = &output.result.chart;

    assert_eq!(chart.horizon_years, vec![1, 2, 3, 4]);
    assert_eq!(chart.best_irr_pct.len(), 4);
    assert!(chart.best_irr_pct[3].is_none());
    assert_eq!(
        chart.average_irr_pct[0],
        output.result.rows[0].average_irr_pct
    );
}

#[test]
fn test_invalid_contribution_aborts() {
    let series = series_from(1970, 1, |_| dec!(100));
    let cfg = AnalysisConfig {
        monthly_contribution: dec!(0),
        ..config(1, 1)
    };
    let err = run_analysis(&cfg, &series, |_| {}).unwrap_err();
    assert!(matches!(err, HorizonError::InvalidInput { .. }));
}

#[test]
fn test_inverted_horizon_range_aborts() {
    let series = series_from(1970, 1, |_| dec!(100));
    let err = run_analysis(&config(5, 2), &series, |_| {}).unwrap_err();
    assert!(matches!(err, HorizonError::InvalidInput { .. }));
}

// ===========================================================================
// Single-window simulation
// ===========================================================================

#[test]
fn test_simulate_window_flat_year() {
    let series = series_from(1970, 2, |_| dec!(100));
    let input = WindowSimulationInput {
        start_year: 1970,
        horizon_years: 1,
        monthly_contribution: dec!(1000),
    };
    let output = simulate_window(&input, &series).unwrap();
    let result = &output.result;

    assert_eq!(result.cash_flows.len(), 12);
    assert_eq!(result.final_value, dec!(12000));
    assert_eq!(result.total_contributed, dec!(12000));
    assert_eq!(result.shares_held, dec!(120));
    assert!(result.periodic_irr.unwrap().abs() < dec!(0.0001));
    assert!(result.annualized_irr.unwrap().abs() < dec!(0.002));
}

#[test]
fn test_simulate_window_outside_series_fails() {
    let series = series_from(1970, 2, |_| dec!(100));
    let input = WindowSimulationInput {
        start_year: 1969,
        horizon_years: 1,
        monthly_contribution: dec!(1000),
    };
    let err = simulate_window(&input, &series).unwrap_err();
    assert!(matches!(err, HorizonError::InsufficientData(_)));
}

#[test]
fn test_simulate_window_solver_failure_is_a_warning() {
    let series = series_from(1970, 1, |_| dec!(0));
    let input = WindowSimulationInput {
        start_year: 1970,
        horizon_years: 1,
        monthly_contribution: dec!(1000),
    };
    let output = simulate_window(&input, &series).unwrap();
    assert!(output.result.periodic_irr.is_none());
    assert!(output.result.annualized_irr.is_none());
    assert_eq!(output.warnings.len(), 1);
}
