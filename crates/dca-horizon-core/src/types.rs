use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// A calendar month at year-month granularity, the resolution of the
/// resampled price history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MonthStamp {
    pub year: i32,
    /// 1-based calendar month
    pub month: u32,
}

impl MonthStamp {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        Self { year, month }
    }

    /// The month a raw sample date falls in.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The immediately following calendar month.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(self, earlier: MonthStamp) -> i64 {
        i64::from(self.year - earlier.year) * 12 + i64::from(self.month) - i64::from(earlier.month)
    }
}

impl fmt::Display for MonthStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Why a month carries no usable price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidPrice {
    /// No observation for the month
    Missing,
    /// A value that is present but unusable (e.g. negative)
    NonNumeric,
    /// A quoted price of exactly zero
    Zero,
}

impl fmt::Display for InvalidPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidPrice::Missing => write!(f, "missing"),
            InvalidPrice::NonNumeric => write!(f, "non-numeric"),
            InvalidPrice::Zero => write!(f, "zero"),
        }
    }
}

/// A month's price, decided once at ingestion. Downstream code matches on
/// this instead of re-checking numeric validity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PriceSample {
    Valid(Money),
    Invalid(InvalidPrice),
}

impl PriceSample {
    pub fn valid(self) -> Option<Money> {
        match self {
            PriceSample::Valid(p) => Some(p),
            PriceSample::Invalid(_) => None,
        }
    }
}

/// One month of the resampled price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub month: MonthStamp,
    pub sample: PriceSample,
}

/// Which quote field to price purchases with. The preferred field falls
/// back to the other when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    #[default]
    AdjClose,
    Close,
}

/// A raw dated quote as delivered by the data collaborator, before
/// month-end resampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuote {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adj_close: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<Money>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_succ_rolls_over_year() {
        let dec = MonthStamp::new(1999, 12);
        assert_eq!(dec.succ(), MonthStamp::new(2000, 1));
        assert_eq!(MonthStamp::new(2000, 1).succ(), MonthStamp::new(2000, 2));
    }

    #[test]
    fn test_months_since() {
        let a = MonthStamp::new(1928, 1);
        let b = MonthStamp::new(1930, 3);
        assert_eq!(b.months_since(a), 26);
        assert_eq!(a.months_since(b), -26);
        assert_eq!(a.months_since(a), 0);
    }

    #[test]
    fn test_month_display() {
        assert_eq!(MonthStamp::new(1928, 1).to_string(), "1928-01");
        assert_eq!(MonthStamp::new(2023, 12).to_string(), "2023-12");
    }

    #[test]
    fn test_month_ordering() {
        assert!(MonthStamp::new(1928, 12) < MonthStamp::new(1929, 1));
        assert!(MonthStamp::new(1929, 1) < MonthStamp::new(1929, 2));
    }
}
