/// data.rs — Price series loading
///
/// Reads a CSV with at least `Date` and `Price` columns.  Rows may arrive in
/// any order; the loaded series is sorted ascending by date.
///
/// Coercion rules:
///   - unparseable date  → `None`, row kept, sorted after every dated row
///   - unparseable price → `None`, row kept, dropped by `prices()`
///
/// The sort is stable, so rows sharing a date (or all lacking one) keep
/// their file order.
use std::fs::File;
use std::path::Path;

use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result};

pub const DATE_COLUMN: &str = "Date";
pub const PRICE_COLUMN: &str = "Price";

/// Date layouts tried in order.  Brent exports mix `20-May-87` with
/// `Apr 22, 2020`; ISO dates come from the cleaned dataset.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date:  Option<NaiveDate>,
    pub price: Option<f64>,
}

/// Ordered (date, price) observations, ascending by date, missing dates last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from raw points, applying the chronological sort.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| (p.date.is_none(), p.date));
        Self { points }
    }

    /// Build a series from raw string cells, coercing bad values to missing.
    pub fn from_raw<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
    {
        let points = rows
            .into_iter()
            .map(|(d, p)| PricePoint {
                date:  d.and_then(parse_date),
                price: p.and_then(parse_price),
            })
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Price column with missing values dropped.
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.price).collect()
    }

    /// Dates aligned index-for-index with `prices()`.
    pub fn price_dates(&self) -> Vec<Option<NaiveDate>> {
        self.points
            .iter()
            .filter(|p| p.price.is_some())
            .map(|p| p.date)
            .collect()
    }

    /// Rows carrying both a date and a price.
    pub fn dated_prices(&self) -> Vec<(NaiveDate, f64)> {
        self.points
            .iter()
            .filter_map(|p| Some((p.date?, p.price?)))
            .collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.iter().find_map(|p| p.date)
    }

    /// Last known date.  Undated rows sort last, so scan from the back.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.iter().rev().find_map(|p| p.date)
    }

    /// Row-count split: `[0, at)` and `[at, len)`.
    pub fn split_at(&self, at: usize) -> (PriceSeries, PriceSeries) {
        let at = at.min(self.points.len());
        let (head, tail) = self.points.split_at(at);
        (
            PriceSeries { points: head.to_vec() },
            PriceSeries { points: tail.to_vec() },
        )
    }
}

/// Load and sort a price CSV.
pub fn load_prices(path: &Path) -> Result<PriceSeries> {
    let file = File::open(path)?;

    // Every column as string; coercion happens row by row below.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()?;

    let dates  = string_column(&df, DATE_COLUMN)?;
    let prices = string_column(&df, PRICE_COLUMN)?;

    let series = PriceSeries::from_raw(dates.into_iter().zip(prices.into_iter()));

    let undated = series.points.iter().filter(|p| p.date.is_none()).count();
    if undated > 0 {
        warn!("{} rows with unparseable dates coerced to missing", undated);
    }
    info!(
        "Loaded {} rows from {}  ({:?} → {:?})",
        series.len(),
        path.display(),
        series.first_date(),
        series.last_date()
    );
    Ok(series)
}

fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    let column = df
        .column(name)
        .map_err(|_| AnalysisError::MissingColumn(name.to_owned()))?;
    Ok(column.as_materialized_series().str()?)
}

/// Parse a date cell against the known layouts, then RFC 3339.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }
    debug!("unparseable date {:?}", s);
    None
}

/// Parse a price cell, tolerating thousands separators.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
