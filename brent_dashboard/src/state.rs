/// state.rs — Shared dashboard state
///
/// Built once at startup and shared read-only across handlers.
use std::sync::Arc;

use brent_engine::data::PriceSeries;
use brent_engine::ArimaForecast;

#[derive(Clone, Default)]
pub struct AppState {
    pub series: Arc<PriceSeries>,
    /// `None` when the startup analysis failed
    pub forecast: Arc<Option<ArimaForecast>>,
}

impl AppState {
    pub fn new(series: PriceSeries, forecast: Option<ArimaForecast>) -> Self {
        Self { series: Arc::new(series), forecast: Arc::new(forecast) }
    }
}
