//! # brent_dashboard
//!
//! HTTP surface over the Brent analysis: price history, a startup ARIMA
//! forecast and placeholders for analyses still to come.

pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the dashboard router around prepared state.
pub fn router(state: AppState) -> Router {
    // The frontend is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/prices", get(routes::prices))
        .route("/api/brent-data", get(routes::brent_data))
        .route("/api/forecast", get(routes::forecast))
        .route("/api/change-points", get(routes::change_points))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use brent_engine::data::PriceSeries;
    use brent_engine::models::ModelOrder;
    use brent_engine::ArimaForecast;
    use chrono::NaiveDate;
    use serde_json::Value;
    use tower::ServiceExt;

    fn sample_series() -> PriceSeries {
        PriceSeries::from_raw(vec![
            (Some("2020-01-02"), Some("61.5")),
            (Some("2020-01-01"), Some("60.0")),
            (Some("bad date"), Some("99.0")),
            (Some("2020-01-03"), Some("")),
        ])
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn prices_are_dated_rows_in_order() {
        let (status, body) = get_json(AppState::new(sample_series(), None), "/api/prices").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Date"], "2020-01-01");
        assert_eq!(rows[0]["Price"], 60.0);
        assert_eq!(rows[1]["Date"], "2020-01-02");
    }

    #[tokio::test]
    async fn brent_data_summarises_series() {
        let (_, body) = get_json(AppState::new(sample_series(), None), "/api/brent-data").await;
        assert_eq!(body["count"], 3);
        assert_eq!(body["first_date"], "2020-01-01");
        assert_eq!(body["max_price"], 99.0);
        assert_eq!(body["min_price"], 60.0);
    }

    #[tokio::test]
    async fn forecast_falls_back_to_placeholder() {
        let (status, body) = get_json(AppState::default(), "/api/forecast").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn forecast_serves_startup_result() {
        let fc = ArimaForecast {
            order: ModelOrder::new(0, 1, 0),
            values: vec![61.5, 61.5],
            dates: vec![
                NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 3).unwrap(),
            ],
        };
        let (_, body) = get_json(AppState::new(sample_series(), Some(fc)), "/api/forecast").await;
        assert_eq!(body["model"], "ARIMA(0, 1, 0)");
        assert_eq!(body["forecast"].as_array().unwrap().len(), 2);
        assert_eq!(body["forecast"][1]["Date"], "2020-01-03");
    }

    #[tokio::test]
    async fn placeholders_and_health_return_json() {
        let (_, cp) = get_json(AppState::default(), "/api/change-points").await;
        assert!(cp["change_points"].as_array().unwrap().is_empty());
        let (status, health) = get_json(AppState::default(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "alive");
    }
}
