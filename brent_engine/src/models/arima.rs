/// models/arima.rs — ARIMA(p,d,q) estimation and forecasting
///
/// ```text
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
///   w_t = Δ^d y_t
///   (w_t − μ) = Σ_{i=1..p} φ_i (w_{t-i} − μ) + ε_t + Σ_{j=1..q} θ_j ε_{t-j}
///
///   μ is estimated only when the model carries a constant; otherwise μ = 0.
///
/// ESTIMATION: conditional sum of squares (CSS)
///   ε_t = 0 for t < p, residual recursion for t ≥ p
///   CSS(φ, θ, μ) = Σ_{t≥p} ε_t²,     σ̂² = CSS / n_eff
///   Start values: Hannan–Rissanen (long AR → lagged residuals → OLS),
///   refined by Nelder–Mead on CSS.
///
///   ln L = −n_eff/2 · (ln 2πσ̂² + 1)
///   k    = p + q + [constant] + 1        (σ² counts as a parameter)
///   AIC  = −2 ln L + 2k,   BIC = −2 ln L + k ln n_eff
///
/// FORECAST
///   ŵ_{n+h} = μ + Σ φ_i (ŵ_{n+h-i} − μ) + Σ θ_j ε̂_{n+h-j},  ε̂_{>n} = 0
///   then integrate d times from the last observed value of each
///   difference level.
/// ─────────────────────────────────────────────────────────────────────────
/// ```
use std::fmt;

use nalgebra::DVector;
use serde::Serialize;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::linalg::{design, ols};
use crate::models::stationarity::difference;
use crate::models::ModelOrder;
use crate::optim::NelderMead;

/// Extra observations required beyond p + q after differencing.
const MIN_EXTRA_OBS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ArimaModel {
    pub order:     ModelOrder,
    pub constant:  bool,
    /// Mean of the differenced series (0 without a constant)
    pub mu:        f64,
    pub ar_coeffs: Vec<f64>,
    pub ma_coeffs: Vec<f64>,
    pub sigma2:    f64,
    pub log_likelihood: f64,
    pub aic:       f64,
    pub bic:       f64,
    pub n_obs:     usize,
    /// Last value of each difference level 0..d, used to integrate forecasts
    #[serde(skip)]
    tails:     Vec<f64>,
    /// Trailing differenced observations (≥ p of them)
    #[serde(skip)]
    recent_w:  Vec<f64>,
    /// Trailing residuals (≥ q of them)
    #[serde(skip)]
    recent_e:  Vec<f64>,
}

impl ArimaModel {
    /// Fit with the default trend rule: a constant only for d = 0.
    pub fn fit(series: &[f64], order: ModelOrder) -> Result<Self> {
        Self::fit_with(series, order, order.d == 0)
    }

    /// Fit with an explicit constant choice.
    pub fn fit_with(series: &[f64], order: ModelOrder, constant: bool) -> Result<Self> {
        let ModelOrder { p, d, q } = order;

        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::Fit("ARIMA input contains non-finite values".into()));
        }
        let required = d + p + q + MIN_EXTRA_OBS;
        if series.len() < required {
            return Err(AnalysisError::InsufficientData { required, actual: series.len() });
        }

        let w = difference(series, d);
        let tails: Vec<f64> = (0..d)
            .map(|k| *difference(series, k).last().unwrap_or(&0.0))
            .collect();

        // ── Start values ─────────────────────────────────────────────────
        let w_mean = w.iter().sum::<f64>() / w.len() as f64;
        let mu0 = if constant { w_mean } else { 0.0 };
        let (ar0, ma0) = hannan_rissanen(&w, p, q, mu0).unwrap_or((vec![0.0; p], vec![0.0; q]));

        let mut x0: Vec<f64> = Vec::with_capacity(p + q + 1);
        x0.extend_from_slice(&ar0);
        x0.extend_from_slice(&ma0);
        if constant {
            x0.push(mu0);
        }

        let w_sd = (w.iter().map(|v| (v - w_mean).powi(2)).sum::<f64>() / w.len() as f64).sqrt();
        let mut steps = vec![0.1; p + q];
        if constant {
            steps.push((0.1 * w_sd).max(1e-3));
        }

        // ── CSS refinement ───────────────────────────────────────────────
        let objective = |theta: &[f64]| {
            let (ar, ma, mu) = unpack(theta, p, q, constant);
            css(&w, ar, ma, mu)
        };
        let nm = NelderMead { max_iter: 1_000 * (p + q + 1), f_tol: 1e-10, x_tol: 1e-8 };
        let minimum = nm.minimize(objective, &x0, &steps);
        if !minimum.fx.is_finite() {
            return Err(AnalysisError::Fit(format!(
                "ARIMA{} conditional sum of squares diverged",
                order
            )));
        }
        debug!(
            "ARIMA{} CSS={:.6} after {} iterations (converged={})",
            order, minimum.fx, minimum.iterations, minimum.converged
        );

        let (ar, ma, mu) = unpack(&minimum.x, p, q, constant);
        let residuals = residuals(&w, ar, ma, mu);
        let n_eff = residuals.len();
        if n_eff == 0 {
            return Err(AnalysisError::InsufficientData { required, actual: series.len() });
        }

        let sigma2 = (minimum.fx / n_eff as f64).max(f64::EPSILON);
        let n = n_eff as f64;
        let log_likelihood = -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        let k = (p + q + usize::from(constant) + 1) as f64;
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n.ln();

        let keep_w = p.max(1);
        let keep_e = q.max(1);
        Ok(Self {
            order,
            constant,
            mu,
            ar_coeffs: ar.to_vec(),
            ma_coeffs: ma.to_vec(),
            sigma2,
            log_likelihood,
            aic,
            bic,
            n_obs: series.len(),
            tails,
            recent_w: w[w.len().saturating_sub(keep_w)..].to_vec(),
            recent_e: residuals[residuals.len().saturating_sub(keep_e)..].to_vec(),
        })
    }

    /// Point forecast for `steps` periods after the fitted sample.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        let p = self.order.p;
        let q = self.order.q;

        let mut w = self.recent_w.clone();
        let mut e = self.recent_e.clone();
        let mut out = Vec::with_capacity(steps);

        for _ in 0..steps {
            let mut next = self.mu;
            for i in 0..p {
                next += self.ar_coeffs[i] * (w[w.len() - 1 - i] - self.mu);
            }
            for j in 0..q {
                next += self.ma_coeffs[j] * e[e.len() - 1 - j];
            }
            w.push(next);
            e.push(0.0);
            out.push(next);
        }

        // Integrate back through each difference level, innermost first.
        for level in (0..self.order.d).rev() {
            let mut acc = self.tails[level];
            for v in out.iter_mut() {
                acc += *v;
                *v = acc;
            }
        }
        out
    }

    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArimaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ARIMA{} Model Summary", self.order)?;
        writeln!(f, "{}", "=".repeat(40))?;
        for (i, c) in self.ar_coeffs.iter().enumerate() {
            writeln!(f, "  φ{} = {:.6}", i + 1, c)?;
        }
        for (i, c) in self.ma_coeffs.iter().enumerate() {
            writeln!(f, "  θ{} = {:.6}", i + 1, c)?;
        }
        if self.constant {
            writeln!(f, "  μ  = {:.6}", self.mu)?;
        }
        writeln!(f, "Sigma²: {:.6}", self.sigma2)?;
        writeln!(f, "Log-likelihood: {:.2}", self.log_likelihood)?;
        writeln!(f, "AIC: {:.2}", self.aic)?;
        write!(f, "BIC: {:.2}", self.bic)
    }
}

fn unpack(theta: &[f64], p: usize, q: usize, constant: bool) -> (&[f64], &[f64], f64) {
    let mu = if constant { theta[p + q] } else { 0.0 };
    (&theta[..p], &theta[p..p + q], mu)
}

/// Residual recursion, ε_t for t ≥ p.
fn residuals(w: &[f64], ar: &[f64], ma: &[f64], mu: f64) -> Vec<f64> {
    let p = ar.len();
    let q = ma.len();
    let n = w.len();
    let mut e = vec![0.0; n];
    for t in p..n {
        let mut pred = mu;
        for i in 0..p {
            pred += ar[i] * (w[t - 1 - i] - mu);
        }
        for j in 0..q {
            if t > j {
                pred += ma[j] * e[t - 1 - j];
            }
        }
        e[t] = w[t] - pred;
    }
    e.split_off(p)
}

fn css(w: &[f64], ar: &[f64], ma: &[f64], mu: f64) -> f64 {
    residuals(w, ar, ma, mu).iter().map(|r| r * r).sum()
}

/// Hannan–Rissanen start values.
///
/// A long AR fit supplies proxy innovations; the ARMA coefficients are
/// then the OLS fit of w on its own lags and the lagged proxies.
fn hannan_rissanen(w: &[f64], p: usize, q: usize, mu: f64) -> Option<(Vec<f64>, Vec<f64>)> {
    if p + q == 0 {
        return Some((Vec::new(), Vec::new()));
    }
    let n = w.len();
    let centred: Vec<f64> = w.iter().map(|v| v - mu).collect();

    let proxies = if q > 0 {
        let m = (p + q).max((n as f64).ln().ceil() as usize).min(n / 3);
        if m == 0 {
            return None;
        }
        let rows: Vec<Vec<f64>> = (m..n).map(|t| (1..=m).map(|i| centred[t - i]).collect()).collect();
        let y = DVector::from_column_slice(&centred[m..]);
        let fit = ols(&design(&rows)?, &y)?;
        let mut e = vec![0.0; n];
        for (row, t) in (m..n).enumerate() {
            e[t] = fit.residuals[row];
        }
        Some((e, m))
    } else {
        None
    };

    let start = proxies.as_ref().map_or(p, |(_, m)| m + q).max(p);
    if n <= start + p + q {
        return None;
    }
    let rows: Vec<Vec<f64>> = (start..n)
        .map(|t| {
            let mut r: Vec<f64> = (1..=p).map(|i| centred[t - i]).collect();
            if let Some((e, _)) = &proxies {
                r.extend((1..=q).map(|j| e[t - j]));
            }
            r
        })
        .collect();
    let y = DVector::from_column_slice(&centred[start..]);
    let fit = ols(&design(&rows)?, &y)?;

    let ar: Vec<f64> = fit.beta.iter().take(p).map(|c| c.clamp(-0.99, 0.99)).collect();
    let ma: Vec<f64> = fit.beta.iter().skip(p).take(q).map(|c| c.clamp(-0.99, 0.99)).collect();
    Some((ar, ma))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stationarity::tests::noise;

    fn ar1(phi: f64, n: usize) -> Vec<f64> {
        let mut y = 0.0;
        noise(11, n)
            .into_iter()
            .map(|e| {
                y = phi * y + e;
                y
            })
            .collect()
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let data = ar1(0.7, 400);
        let model = ArimaModel::fit(&data, ModelOrder::new(1, 0, 0)).unwrap();
        assert!((model.ar_coeffs[0] - 0.7).abs() < 0.1, "φ = {}", model.ar_coeffs[0]);
        assert!(model.constant);
        assert!(model.sigma2 > 0.0);
    }

    #[test]
    fn forecast_length_matches_horizon() {
        let data: Vec<f64> = (1..=50).map(|x| x as f64 + (x as f64 * 0.1).sin()).collect();
        let model = ArimaModel::fit(&data, ModelOrder::new(1, 1, 1)).unwrap();
        assert_eq!(model.forecast(30).len(), 30);
        assert!(model.forecast(0).is_empty());
    }

    #[test]
    fn random_walk_forecast_is_flat_at_last_value() {
        let data: Vec<f64> = (0..60).map(|i| 50.0 + i as f64).collect();
        let model = ArimaModel::fit(&data, ModelOrder::new(0, 1, 0)).unwrap();
        assert!(!model.constant);
        let fc = model.forecast(5);
        assert!(fc.iter().all(|v| (v - 109.0).abs() < 1e-9), "{fc:?}");
    }

    #[test]
    fn drift_term_extends_trend() {
        let data: Vec<f64> = (0..60).map(|i| 50.0 + i as f64).collect();
        let model = ArimaModel::fit_with(&data, ModelOrder::new(0, 1, 0), true).unwrap();
        let fc = model.forecast(3);
        assert!((fc[0] - 110.0).abs() < 1e-6);
        assert!((fc[2] - 112.0).abs() < 1e-6);
    }

    #[test]
    fn second_order_integration() {
        // Quadratic: second differences are constant 2.
        let data: Vec<f64> = (0..40).map(|i| (i * i) as f64).collect();
        let model = ArimaModel::fit_with(&data, ModelOrder::new(0, 2, 0), false).unwrap();
        // Without a constant the second difference forecast is 0, so the
        // first difference stays at its last value (2·39 − 1 = 77).
        let fc = model.forecast(2);
        assert!((fc[0] - (1521.0 + 77.0)).abs() < 1e-9);
        assert!((fc[1] - (1521.0 + 154.0)).abs() < 1e-9);
    }

    #[test]
    fn too_short_for_order_is_fit_error() {
        let err = ArimaModel::fit(&[1.0, 2.0, 3.0, 4.0], ModelOrder::new(2, 1, 2)).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn aic_prefers_true_order_over_white_noise() {
        let data = ar1(0.8, 300);
        let ar = ArimaModel::fit(&data, ModelOrder::new(1, 0, 0)).unwrap();
        let wn = ArimaModel::fit(&data, ModelOrder::new(0, 0, 0)).unwrap();
        assert!(ar.aic < wn.aic);
    }
}
