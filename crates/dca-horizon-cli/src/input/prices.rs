use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

use dca_horizon_core::series::PriceSeries;
use dca_horizon_core::types::{MonthStamp, PriceField, PricePoint, RawQuote};

use super::{file, stdin};

/// Price history as delivered by the data collaborator: either raw dated
/// quotes awaiting month-end resampling, or an already-resampled list of
/// month points.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceData {
    Quotes(Vec<RawQuote>),
    Points(Vec<PricePoint>),
}

/// Load price data from a file (`--prices`) or piped stdin.
pub fn load_price_data(path: Option<&str>) -> Result<PriceData, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        let is_csv = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            return Ok(PriceData::Quotes(read_quote_csv(path)?));
        }
        return file::read_json(path);
    }

    if let Some(value) = stdin::read_stdin()? {
        return Ok(serde_json::from_value(value)?);
    }

    Err("--prices <file.{json,csv}> or piped stdin is required".into())
}

/// Clip to the configured date range and build the monthly series.
pub fn build_series(
    data: &PriceData,
    field: PriceField,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    match data {
        PriceData::Quotes(quotes) => {
            let clipped: Vec<RawQuote> = quotes
                .iter()
                .filter(|q| from.map_or(true, |d| q.date >= d) && to.map_or(true, |d| q.date <= d))
                .cloned()
                .collect();
            Ok(PriceSeries::from_quotes(&clipped, field)?)
        }
        PriceData::Points(points) => {
            let first = from.map(MonthStamp::from_date);
            let last = to.map(MonthStamp::from_date);
            let clipped: Vec<PricePoint> = points
                .iter()
                .filter(|p| {
                    first.map_or(true, |m| p.month >= m) && last.map_or(true, |m| p.month <= m)
                })
                .copied()
                .collect();
            Ok(PriceSeries::from_points(clipped)?)
        }
    }
}

/// Parse a CSV quote file with `date,adj_close,close` columns.
fn read_quote_csv(path: &str) -> Result<Vec<RawQuote>, Box<dyn std::error::Error>> {
    let resolved = file::resolve_path(path)?;
    let mut reader = csv::Reader::from_path(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;

    let mut quotes = Vec::new();
    for record in reader.deserialize() {
        let quote: RawQuote =
            record.map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e))?;
        quotes.push(quote);
    }
    Ok(quotes)
}
