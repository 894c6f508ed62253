use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

/// Running statistics for one horizon length, folded incrementally as
/// windows complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonStats {
    /// Windows that produced a usable annualized return
    pub total_periods: u32,
    /// Windows with a strictly positive annualized return
    pub positive_count: u32,
    pub min_irr: Rate,
    pub max_irr: Rate,
    pub sum_irr: Rate,
    pub best_irr: Rate,
    pub best_start_year: Option<i32>,
}

impl HorizonStats {
    /// Initial values are materialized explicitly: min at the type maximum,
    /// max and best at the type minimum, so the first observation always
    /// replaces them.
    fn new() -> Self {
        Self {
            total_periods: 0,
            positive_count: 0,
            min_irr: Decimal::MAX,
            max_irr: Decimal::MIN,
            sum_irr: Decimal::ZERO,
            best_irr: Decimal::MIN,
            best_start_year: None,
        }
    }

    fn record(&mut self, start_year: i32, annualized: Rate) {
        self.total_periods += 1;
        if annualized > Decimal::ZERO {
            self.positive_count += 1;
        }
        if annualized < self.min_irr {
            self.min_irr = annualized;
        }
        if annualized > self.max_irr {
            self.max_irr = annualized;
        }
        self.sum_irr += annualized;
        // Strictly greater: on ties the earlier start year is kept.
        if annualized > self.best_irr {
            self.best_irr = annualized;
            self.best_start_year = Some(start_year);
        }
    }

    pub fn average_irr(&self) -> Option<Rate> {
        if self.total_periods == 0 {
            None
        } else {
            Some(self.sum_irr / Decimal::from(self.total_periods))
        }
    }

    /// Fraction of windows with a strictly positive return, in [0, 1].
    pub fn success_rate(&self) -> Option<Rate> {
        if self.total_periods == 0 {
            None
        } else {
            Some(Decimal::from(self.positive_count) / Decimal::from(self.total_periods))
        }
    }
}

/// Owns the horizon-to-stats mapping for one run. Observations for a fixed
/// horizon must arrive in increasing start-year order so the tie-break on
/// `best_start_year` is deterministic.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    by_horizon: BTreeMap<u16, HorizonStats>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, horizon_years: u16, start_year: i32, annualized: Rate) {
        self.by_horizon
            .entry(horizon_years)
            .or_insert_with(HorizonStats::new)
            .record(start_year, annualized);
    }

    /// The finalized stats for a horizon, or None when no window for it
    /// produced a usable return.
    pub fn finalize(&self, horizon_years: u16) -> Option<&HorizonStats> {
        self.by_horizon
            .get(&horizon_years)
            .filter(|s| s.total_periods > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_observation() {
        let mut agg = StatsAggregator::new();
        agg.record(5, 1950, dec!(0.07));

        let stats = agg.finalize(5).unwrap();
        assert_eq!(stats.total_periods, 1);
        assert_eq!(stats.positive_count, 1);
        assert_eq!(stats.min_irr, dec!(0.07));
        assert_eq!(stats.max_irr, dec!(0.07));
        assert_eq!(stats.best_irr, dec!(0.07));
        assert_eq!(stats.best_start_year, Some(1950));
        assert_eq!(stats.average_irr(), Some(dec!(0.07)));
    }

    #[test]
    fn test_tie_break_keeps_earlier_start_year() {
        let mut agg = StatsAggregator::new();
        agg.record(10, 1950, dec!(0.08));
        agg.record(10, 1951, dec!(0.08));
        agg.record(10, 1952, dec!(0.05));

        let stats = agg.finalize(10).unwrap();
        assert_eq!(stats.best_irr, dec!(0.08));
        assert_eq!(stats.best_start_year, Some(1950));
    }

    #[test]
    fn test_strictly_greater_updates_best() {
        let mut agg = StatsAggregator::new();
        agg.record(10, 1950, dec!(0.05));
        agg.record(10, 1951, dec!(0.09));

        let stats = agg.finalize(10).unwrap();
        assert_eq!(stats.best_irr, dec!(0.09));
        assert_eq!(stats.best_start_year, Some(1951));
    }

    #[test]
    fn test_min_average_max_ordering() {
        let mut agg = StatsAggregator::new();
        for (year, irr) in [(1950, dec!(-0.02)), (1951, dec!(0.04)), (1952, dec!(0.10))] {
            agg.record(7, year, irr);
        }

        let stats = agg.finalize(7).unwrap();
        let avg = stats.average_irr().unwrap();
        assert!(stats.min_irr <= avg && avg <= stats.max_irr);
        assert_eq!(stats.best_irr, stats.max_irr);
        assert_eq!(stats.min_irr, dec!(-0.02));
        assert_eq!(stats.max_irr, dec!(0.10));
        assert_eq!(stats.positive_count, 2);
        assert_eq!(stats.success_rate(), Some(Decimal::from(2) / Decimal::from(3)));
    }

    #[test]
    fn test_zero_return_is_not_positive() {
        let mut agg = StatsAggregator::new();
        agg.record(1, 1970, dec!(0));

        let stats = agg.finalize(1).unwrap();
        assert_eq!(stats.total_periods, 1);
        assert_eq!(stats.positive_count, 0);
        assert_eq!(stats.success_rate(), Some(dec!(0)));
    }

    #[test]
    fn test_finalize_without_data_is_none() {
        let agg = StatsAggregator::new();
        assert!(agg.finalize(3).is_none());
    }

    #[test]
    fn test_horizons_are_independent() {
        let mut agg = StatsAggregator::new();
        agg.record(1, 1970, dec!(0.02));
        agg.record(2, 1970, dec!(0.15));

        assert_eq!(agg.finalize(1).unwrap().max_irr, dec!(0.02));
        assert_eq!(agg.finalize(2).unwrap().max_irr, dec!(0.15));
    }
}
