use crate::series::PriceSeries;
use crate::types::{MonthStamp, PricePoint};

/// The enumeration bounds of a sweep: which horizons to analyze and which
/// start years are candidates for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub min_horizon_years: u16,
    pub max_horizon_years: u16,
    pub min_start_year: i32,
    /// Exclusive-style upper bound: the last candidate start year for a
    /// horizon of `h` years is `last_available_year - h`.
    pub last_available_year: i32,
}

impl WindowPlan {
    /// Derive bounds from the series itself: start years from the first
    /// sample's year, candidates up to the year after the last sample's
    /// year. Incomplete trailing windows are dropped by the slice check.
    pub fn from_series(series: &PriceSeries, min_horizon_years: u16, max_horizon_years: u16) -> Self {
        Self {
            min_horizon_years,
            max_horizon_years,
            min_start_year: series.first_month().year,
            last_available_year: series.last_month().year + 1,
        }
    }

    /// Lazily enumerate every complete window. Repeated calls over the
    /// same immutable series yield identical windows.
    pub fn windows<'a>(&self, series: &'a PriceSeries) -> Windows<'a> {
        Windows {
            series,
            plan: *self,
            horizon: self.min_horizon_years,
            start_year: self.min_start_year,
        }
    }
}

/// One concrete (horizon, start-year) simulation slice: exactly
/// `horizon_years * 12` contiguous months starting in January.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub horizon_years: u16,
    pub start_year: i32,
    pub periods: &'a [PricePoint],
}

/// Iterator over the complete windows of a plan, in horizon-major,
/// start-year-ascending order.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    series: &'a PriceSeries,
    plan: WindowPlan,
    horizon: u16,
    start_year: i32,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Window<'a>> {
        while self.horizon <= self.plan.max_horizon_years {
            let last_start = self.plan.last_available_year - i32::from(self.horizon);
            if self.start_year > last_start {
                self.horizon += 1;
                self.start_year = self.plan.min_start_year;
                continue;
            }

            let start_year = self.start_year;
            self.start_year += 1;

            let months = usize::from(self.horizon) * 12;
            if let Some(periods) = self.series.slice(MonthStamp::new(start_year, 1), months) {
                return Some(Window {
                    horizon_years: self.horizon,
                    start_year,
                    periods,
                });
            }
            // Not enough data for this pair; skip it silently.
        }
        None
    }
}
