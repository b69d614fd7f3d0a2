/// models/order_select.rs — Stepwise ARIMA order search
///
/// Differencing order d is chosen first by repeated KPSS tests; (p, q) and
/// the constant are then found by a Hyndman–Khandakar stepwise walk over
/// candidate models, minimising AIC.
///
/// ```text
///   start set:  (2,d,2) (0,d,0) (1,d,0) (0,d,1)          constant if d < 2
///               (0,d,0) without constant                 when the above carry one
///   neighbours: p ± 1,  q ± 1,  (p ± 1, q ± 1) jointly,  constant toggled
///   bounds:     p ≤ max_p,  q ≤ max_q,  p + q ≤ max_order
/// ```
///
/// The walk moves to the first neighbour that improves AIC and stops when
/// a full neighbourhood brings no improvement.
use ahash::AHashSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::models::arima::ArimaModel;
use crate::models::stationarity::{difference, is_constant, kpss_test};
use crate::models::ModelOrder;

const KPSS_ALPHA: f64 = 0.05;
const MAX_STEPS: usize = 100;

#[derive(Debug, Clone)]
pub struct OrderSearch {
    pub max_p:     usize,
    pub max_d:     usize,
    pub max_q:     usize,
    pub max_order: usize,
}

impl Default for OrderSearch {
    fn default() -> Self {
        Self { max_p: 5, max_d: 2, max_q: 5, max_order: 5 }
    }
}

/// Outcome of the search: the winning order and whether it carried a constant.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SelectedOrder {
    pub order:    ModelOrder,
    pub constant: bool,
    pub aic:      f64,
    /// Number of distinct candidate models attempted
    pub fits:     usize,
}

/// Select an ARIMA order for `series` with the default search bounds.
pub fn select_order(series: &[f64]) -> Result<SelectedOrder> {
    OrderSearch::default().select(series)
}

impl OrderSearch {
    pub fn select(&self, series: &[f64]) -> Result<SelectedOrder> {
        if series.is_empty() {
            return Err(AnalysisError::InsufficientData { required: 1, actual: 0 });
        }
        let d = self.ndiffs(series);
        let allow_constant = d < 2;

        // Nothing left to model once differencing flattens the series.
        let w = difference(series, d);
        if is_constant(&w) {
            let order = ModelOrder::new(0, d, 0);
            info!("Differenced series is constant; selecting ARIMA{}", order);
            return Ok(SelectedOrder { order, constant: false, aic: f64::NAN, fits: 0 });
        }

        let mut visited: AHashSet<(usize, usize, bool)> = AHashSet::new();
        let mut best: Option<(ModelOrder, bool, f64)> = None;

        let try_fit = |p: usize, q: usize, constant: bool, visited: &mut AHashSet<_>| -> Option<f64> {
            if !self.in_bounds(p, q) || !visited.insert((p, q, constant)) {
                return None;
            }
            let order = ModelOrder::new(p, d, q);
            match ArimaModel::fit_with(series, order, constant) {
                Ok(model) if model.aic.is_finite() => {
                    debug!("ARIMA{} constant={} AIC={:.3}", order, constant, model.aic);
                    Some(model.aic)
                }
                Ok(_) => None,
                Err(e) => {
                    debug!("ARIMA{} constant={} failed: {}", order, constant, e);
                    None
                }
            }
        };

        // ── Start set ────────────────────────────────────────────────────
        let c = allow_constant;
        let mut starts = vec![(2, 2, c), (0, 0, c), (1, 0, c), (0, 1, c)];
        if allow_constant {
            starts.push((0, 0, false));
        }
        for (p, q, c) in starts {
            if let Some(aic) = try_fit(p, q, c, &mut visited) {
                if best.map_or(true, |(_, _, b)| aic < b) {
                    best = Some((ModelOrder::new(p, d, q), c, aic));
                }
            }
        }

        let Some(mut current) = best else {
            return Err(AnalysisError::Fit(format!(
                "no candidate ARIMA model could be fitted to {} observations",
                series.len()
            )));
        };

        // ── Stepwise walk ────────────────────────────────────────────────
        for _ in 0..MAX_STEPS {
            let (order, constant, aic) = current;
            let mut improved = false;
            for (p, q, c) in self.neighbours(order.p, order.q, constant, allow_constant) {
                if let Some(cand) = try_fit(p, q, c, &mut visited) {
                    if cand < aic {
                        current = (ModelOrder::new(p, d, q), c, cand);
                        improved = true;
                        break;
                    }
                }
            }
            if !improved {
                break;
            }
        }

        let (order, constant, aic) = current;
        info!(
            "Stepwise search chose ARIMA{} (constant={}) AIC={:.3} after {} fits",
            order,
            constant,
            aic,
            visited.len()
        );
        Ok(SelectedOrder { order, constant, aic, fits: visited.len() })
    }

    /// Differencing order from repeated KPSS tests.
    pub fn ndiffs(&self, series: &[f64]) -> usize {
        let mut w = series.to_vec();
        let mut d = 0;
        while d < self.max_d && !is_constant(&w) {
            match kpss_test(&w) {
                Ok(report) if report.p_value < KPSS_ALPHA => {
                    d += 1;
                    w = difference(&w, 1);
                }
                _ => break,
            }
        }
        d
    }

    fn in_bounds(&self, p: usize, q: usize) -> bool {
        p <= self.max_p && q <= self.max_q && p + q <= self.max_order
    }

    fn neighbours(&self, p: usize, q: usize, constant: bool, allow_constant: bool) -> Vec<(usize, usize, bool)> {
        let steps: [(isize, isize); 8] = [
            (-1, 0), (1, 0), (0, -1), (0, 1),
            (-1, -1), (1, 1), (-1, 1), (1, -1),
        ];
        let mut out: Vec<(usize, usize, bool)> = steps
            .iter()
            .filter_map(|&(dp, dq)| {
                let np = p.checked_add_signed(dp)?;
                let nq = q.checked_add_signed(dq)?;
                Some((np, nq, constant))
            })
            .collect();
        if allow_constant {
            out.push((p, q, !constant));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stationarity::tests::noise;

    #[test]
    fn orders_are_within_bounds() {
        let mut y = 0.0;
        let data: Vec<f64> = noise(5, 200)
            .into_iter()
            .map(|e| {
                y = 0.6 * y + e;
                y
            })
            .collect();
        let sel = select_order(&data).unwrap();
        let o = sel.order;
        assert!(o.p <= 5 && o.q <= 5 && o.p + o.q <= 5 && o.d <= 2);
        assert!(sel.aic.is_finite());
        assert!(sel.fits >= 4);
    }

    #[test]
    fn linear_trend_differenced_to_constant() {
        let data: Vec<f64> = (0..100).map(|i| 50.0 + i as f64).collect();
        let sel = select_order(&data).unwrap();
        assert!(sel.order.d >= 1);
        assert_eq!((sel.order.p, sel.order.q), (0, 0));
    }

    #[test]
    fn trending_walk_needs_differencing() {
        let mut y = 100.0;
        let data: Vec<f64> = noise(9, 300)
            .into_iter()
            .map(|e| {
                y += 0.4 + e;
                y
            })
            .collect();
        assert!(OrderSearch::default().ndiffs(&data) >= 1);
    }

    #[test]
    fn constant_series_needs_no_differencing() {
        let data = vec![3.0; 40];
        assert_eq!(OrderSearch::default().ndiffs(&data), 0);
        let sel = select_order(&data).unwrap();
        assert_eq!(sel.order, ModelOrder::new(0, 0, 0));
    }

    #[test]
    fn neighbours_respect_zero_floor() {
        let s = OrderSearch::default();
        let n = s.neighbours(0, 0, true, true);
        assert!(n.contains(&(1, 0, true)));
        assert!(n.contains(&(0, 0, false)));
        assert!(n.iter().all(|&(p, q, _)| p <= 1 && q <= 1));
    }

    #[test]
    fn empty_series_is_rejected() {
        assert!(select_order(&[]).is_err());
    }
}
