/// routes.rs — Dashboard API handlers
use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

/// One row of the price chart, in the shape the frontend reads.
#[derive(Debug, Serialize)]
pub struct PriceRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Price")]
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct BrentSummary {
    pub count:        usize,
    pub first_date:   Option<NaiveDate>,
    pub last_date:    Option<NaiveDate>,
    pub min_price:    Option<f64>,
    pub max_price:    Option<f64>,
    pub latest_price: Option<f64>,
}

/// GET /api/prices
pub async fn prices(State(state): State<AppState>) -> Json<Vec<PriceRow>> {
    let rows = state
        .series
        .dated_prices()
        .into_iter()
        .map(|(date, price)| PriceRow { date, price })
        .collect();
    Json(rows)
}

/// GET /api/brent-data
pub async fn brent_data(State(state): State<AppState>) -> Json<BrentSummary> {
    let prices = state.series.prices();
    let min_price = prices.iter().copied().reduce(f64::min);
    let max_price = prices.iter().copied().reduce(f64::max);
    Json(BrentSummary {
        count: prices.len(),
        first_date: state.series.first_date(),
        last_date: state.series.last_date(),
        min_price,
        max_price,
        latest_price: prices.last().copied(),
    })
}

/// GET /api/forecast
pub async fn forecast(State(state): State<AppState>) -> Json<Value> {
    match state.forecast.as_ref() {
        Some(fc) => Json(json!({
            "model": format!("ARIMA{}", fc.order),
            "order": fc.order,
            "forecast": fc.dates.iter().zip(&fc.values).map(|(d, v)| {
                json!({ "Date": d, "Price": v })
            }).collect::<Vec<_>>(),
        })),
        None => Json(json!({ "message": "Forecast data not available" })),
    }
}

/// GET /api/change-points
pub async fn change_points() -> Json<Value> {
    Json(json!({
        "message": "Change point analysis not yet available",
        "change_points": [],
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
