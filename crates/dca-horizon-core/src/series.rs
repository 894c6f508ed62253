use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::HorizonError;
use crate::types::{InvalidPrice, MonthStamp, PriceField, PricePoint, PriceSample, RawQuote};
use crate::HorizonResult;

/// An ordered, contiguous monthly price history. One `PricePoint` per
/// calendar month between the first and last observed sample; months
/// without a usable price carry an explicit invalid marker.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from raw dated quotes by month-end resampling: the
    /// date-latest quote in each calendar month wins, interior months with
    /// no observation are marked missing.
    pub fn from_quotes(quotes: &[RawQuote], field: PriceField) -> HorizonResult<Self> {
        if quotes.is_empty() {
            return Err(HorizonError::DataUnavailable(
                "no price samples in the requested range".into(),
            ));
        }

        let mut sorted: Vec<&RawQuote> = quotes.iter().collect();
        sorted.sort_by_key(|q| q.date);

        // Last observation per month wins (month-end resampling).
        let mut by_month: BTreeMap<MonthStamp, &RawQuote> = BTreeMap::new();
        for quote in sorted {
            by_month.insert(MonthStamp::from_date(quote.date), quote);
        }

        let (first, last) = match (by_month.keys().next(), by_month.keys().next_back()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => {
                return Err(HorizonError::DataUnavailable(
                    "no price samples in the requested range".into(),
                ))
            }
        };

        let mut points = Vec::with_capacity(last.months_since(first) as usize + 1);
        let mut month = first;
        loop {
            let sample = match by_month.get(&month) {
                Some(quote) => classify(quote, field),
                None => PriceSample::Invalid(InvalidPrice::Missing),
            };
            points.push(PricePoint { month, sample });
            if month == last {
                break;
            }
            month = month.succ();
        }

        Ok(Self { points })
    }

    /// Build a series from already-resampled month points. The points must
    /// be strictly increasing and contiguous at monthly granularity.
    pub fn from_points(points: Vec<PricePoint>) -> HorizonResult<Self> {
        if points.is_empty() {
            return Err(HorizonError::DataUnavailable(
                "no price samples in the requested range".into(),
            ));
        }

        for pair in points.windows(2) {
            if pair[1].month != pair[0].month.succ() {
                return Err(HorizonError::InvalidInput {
                    field: "points".into(),
                    reason: format!(
                        "months must be contiguous; {} is followed by {}",
                        pair[0].month, pair[1].month
                    ),
                });
            }
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects empty input, but keep the pair for idiom.
        self.points.is_empty()
    }

    pub fn first_month(&self) -> MonthStamp {
        self.points[0].month
    }

    pub fn last_month(&self) -> MonthStamp {
        self.points[self.points.len() - 1].month
    }

    /// The contiguous run of `months` points starting at `start`, or None
    /// if the series does not fully cover it.
    pub fn slice(&self, start: MonthStamp, months: usize) -> Option<&[PricePoint]> {
        let offset = start.months_since(self.first_month());
        if offset < 0 {
            return None;
        }
        let begin = offset as usize;
        let end = begin.checked_add(months)?;
        if end > self.points.len() {
            return None;
        }
        Some(&self.points[begin..end])
    }
}

fn classify(quote: &RawQuote, field: PriceField) -> PriceSample {
    let price = match field {
        PriceField::AdjClose => quote.adj_close.or(quote.close),
        PriceField::Close => quote.close.or(quote.adj_close),
    };
    match price {
        None => PriceSample::Invalid(InvalidPrice::Missing),
        Some(p) if p.is_zero() => PriceSample::Invalid(InvalidPrice::Zero),
        Some(p) if p < Decimal::ZERO => PriceSample::Invalid(InvalidPrice::NonNumeric),
        Some(p) => PriceSample::Valid(p),
    }
}
