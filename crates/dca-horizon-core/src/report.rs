use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::stats::StatsAggregator;
use crate::types::Rate;

/// One row of the final report. Horizons that produced no usable window
/// keep their row with the statistics nulled out, so the report stays
/// dense and horizon-indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonSummaryRow {
    pub horizon_years: u16,
    pub total_periods: u32,
    pub positive_periods: u32,
    pub best_start_year: Option<i32>,
    pub best_irr_pct: Option<Rate>,
    pub min_irr_pct: Option<Rate>,
    pub max_irr_pct: Option<Rate>,
    pub average_irr_pct: Option<Rate>,
    pub success_rate_pct: Option<Rate>,
}

/// Per-horizon summary series for an external charting collaborator, one
/// entry per horizon in the report's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub horizon_years: Vec<u16>,
    pub best_irr_pct: Vec<Option<Rate>>,
    pub min_irr_pct: Vec<Option<Rate>>,
    pub max_irr_pct: Vec<Option<Rate>>,
    pub average_irr_pct: Vec<Option<Rate>>,
}

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Assemble the dense per-horizon report from the aggregator's final state.
pub fn build_report(
    aggregator: &StatsAggregator,
    min_horizon_years: u16,
    max_horizon_years: u16,
) -> Vec<HorizonSummaryRow> {
    (min_horizon_years..=max_horizon_years)
        .map(|horizon| match aggregator.finalize(horizon) {
            Some(stats) => HorizonSummaryRow {
                horizon_years: horizon,
                total_periods: stats.total_periods,
                positive_periods: stats.positive_count,
                best_start_year: stats.best_start_year,
                best_irr_pct: Some(stats.best_irr * HUNDRED),
                min_irr_pct: Some(stats.min_irr * HUNDRED),
                max_irr_pct: Some(stats.max_irr * HUNDRED),
                average_irr_pct: stats.average_irr().map(|r| r * HUNDRED),
                success_rate_pct: stats.success_rate().map(|r| r * HUNDRED),
            },
            None => HorizonSummaryRow {
                horizon_years: horizon,
                total_periods: 0,
                positive_periods: 0,
                best_start_year: None,
                best_irr_pct: None,
                min_irr_pct: None,
                max_irr_pct: None,
                average_irr_pct: None,
                success_rate_pct: None,
            },
        })
        .collect()
}

/// Project the report rows into the chart series handed to the plotting
/// collaborator.
pub fn chart_series(rows: &[HorizonSummaryRow]) -> ChartSeries {
    ChartSeries {
        horizon_years: rows.iter().map(|r| r.horizon_years).collect(),
        best_irr_pct: rows.iter().map(|r| r.best_irr_pct).collect(),
        min_irr_pct: rows.iter().map(|r| r.min_irr_pct).collect(),
        max_irr_pct: rows.iter().map(|r| r.max_irr_pct).collect(),
        average_irr_pct: rows.iter().map(|r| r.average_irr_pct).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_report_is_dense_over_horizon_range() {
        let mut agg = StatsAggregator::new();
        agg.record(2, 1950, dec!(0.06));

        let rows = build_report(&agg, 1, 3);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].horizon_years, 1);
        assert_eq!(rows[0].total_periods, 0);
        assert!(rows[0].best_irr_pct.is_none());

        assert_eq!(rows[1].horizon_years, 2);
        assert_eq!(rows[1].total_periods, 1);
        assert_eq!(rows[1].best_irr_pct, Some(dec!(6)));
        assert_eq!(rows[1].best_start_year, Some(1950));
        assert_eq!(rows[1].success_rate_pct, Some(dec!(100)));

        assert_eq!(rows[2].horizon_years, 3);
        assert!(rows[2].average_irr_pct.is_none());
    }

    #[test]
    fn test_percentages_scale_rates() {
        let mut agg = StatsAggregator::new();
        agg.record(1, 1970, dec!(-0.015));
        agg.record(1, 1971, dec!(0.045));

        let rows = build_report(&agg, 1, 1);
        assert_eq!(rows[0].min_irr_pct, Some(dec!(-1.5)));
        assert_eq!(rows[0].max_irr_pct, Some(dec!(4.5)));
        assert_eq!(rows[0].average_irr_pct, Some(dec!(1.5)));
        assert_eq!(rows[0].success_rate_pct, Some(dec!(50)));
    }

    #[test]
    fn test_chart_series_alignment() {
        let mut agg = StatsAggregator::new();
        agg.record(1, 1970, dec!(0.02));
        agg.record(3, 1970, dec!(0.08));

        let rows = build_report(&agg, 1, 3);
        let chart = chart_series(&rows);

        assert_eq!(chart.horizon_years, vec![1, 2, 3]);
        assert_eq!(chart.best_irr_pct, vec![Some(dec!(2)), None, Some(dec!(8))]);
        assert_eq!(chart.average_irr_pct.len(), chart.horizon_years.len());
    }
}
