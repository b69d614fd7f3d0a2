pub mod arima;
pub mod garch;
pub mod order_select;
pub mod stationarity;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use arima::ArimaModel;
pub use garch::{Garch11, GarchForecast};
pub use order_select::{select_order, OrderSearch, SelectedOrder};
pub use stationarity::{adf_test, kpss_test, AdfReport, KpssReport};

/// ARIMA order (p, d, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ModelOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}
