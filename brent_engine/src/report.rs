/// report.rs — Chart-ready JSON output
///
/// Plots are drawn elsewhere; a run only emits the series a chart needs.
///
///   arima_forecast.json    actual prices + ARIMA forecast
///   garch_volatility.json  actual prices + GARCH variance
///   report.json            the full AnalysisReport
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::error::Result;

pub const ARIMA_CHART_FILE: &str = "arima_forecast.json";
pub const GARCH_CHART_FILE: &str = "garch_volatility.json";
pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub date:  Option<NaiveDate>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Pair dates with values; surplus values get no date.
    pub fn new(label: &str, dates: &[Option<NaiveDate>], values: &[f64]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &value)| ChartPoint { date: dates.get(i).copied().flatten(), value })
            .collect();
        Self { label: label.to_owned(), points }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub title:   String,
    pub x_label: String,
    pub y_label: String,
    pub series:  Vec<ChartSeries>,
}

/// Serialise `value` as pretty JSON into `dir/name`, creating `dir` if needed.
pub fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, value).map_err(std::io::Error::from)?;
    info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_pairs_dates_with_values() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 1);
        let s = ChartSeries::new("ARIMA Forecast", &[d, None], &[1.0, 2.0, 3.0]);
        assert_eq!(s.points.len(), 3);
        assert_eq!(s.points[0].date, d);
        assert_eq!(s.points[1].date, None);
        assert_eq!(s.points[2].date, None);
    }

    #[test]
    fn chart_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let chart = Chart {
            title:   "Brent Oil Price Forecast (ARIMA)".into(),
            x_label: "Year".into(),
            y_label: "Price (USD per Barrel)".into(),
            series:  vec![ChartSeries::new(
                "Actual Prices",
                &[NaiveDate::from_ymd_opt(2020, 1, 2)],
                &[61.5],
            )],
        };
        let path = write_json(&dir.path().join("charts"), ARIMA_CHART_FILE, &chart).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed["series"][0]["points"][0]["date"], "2020-01-02");
        assert_eq!(parsed["series"][0]["points"][0]["value"], 61.5);
    }
}
