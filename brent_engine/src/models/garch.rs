/// models/garch.rs — GARCH(1,1) Volatility Estimation and Forecasting
///
/// ```text
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// GARCH(1,1): Bollerslev (1986), constant mean, Gaussian innovations
///
///   Innovation:          ε_t = y_t − μ
///   Conditional variance:
///
///       σ²_t = ω  +  α · ε²_{t-1}  +  β · σ²_{t-1}
///
///   Constraints (covariance stationarity):
///     ω > 0,  α ≥ 0,  β ≥ 0,  α + β < 1
///
///   Initialisation (backcast):
///       b    = Σ_{i<m} 0.94^i ε²_i / Σ_{i<m} 0.94^i,   m = min(75, n)
///       σ²_0 = ω + (α + β) · b
///
///   Log-likelihood:
///       ln L = −½ Σ_t [ ln 2π + ln σ²_t + ε²_t / σ²_t ]
///
///   Unconstrained parametrisation for the optimiser:
///       ω = exp(a),   u = sigmoid(b_),   v = sigmoid(c)
///       α = u · v,    β = u · (1 − v)          ⇒ α + β = u < 1
///
///   One-step forecast anchored at t:
///       σ²_{t+1|t} = ω + α · ε²_t + β · σ²_t
///
///   Multi-step forecast:
///       σ²_{t+h|t} = σ²_∞ + (α+β)^(h−1) · (σ²_{t+1|t} − σ²_∞)
///       σ²_∞       = ω / (1 − α − β)
/// ─────────────────────────────────────────────────────────────────────────
/// ```
use serde::Serialize;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::models::stationarity::is_constant;
use crate::optim::NelderMead;

/// Fewest observations accepted by the likelihood fit.
pub const MIN_GARCH_OBS: usize = 10;

const BACKCAST_DECAY: f64 = 0.94;
const BACKCAST_SPAN: usize = 75;

// Keeps α + β strictly inside the unit interval after rounding.
const MAX_PERSISTENCE: f64 = 1.0 - 1e-9;

#[derive(Debug, Clone, Serialize)]
pub struct Garch11 {
    /// ω: constant variance term
    pub omega: f64,
    /// α: ARCH (shock) coefficient
    pub alpha: f64,
    /// β: GARCH (persistence) coefficient
    pub beta: f64,
    /// Current conditional variance σ²_t
    pub sigma2: f64,
    /// Current innovation ε_t
    pub prev_epsilon: f64,
}

/// Maximum-likelihood GARCH(1,1) fit over a whole series.
#[derive(Debug, Clone, Serialize)]
pub struct GarchFit {
    pub mu: f64,
    /// Filter state after the last observation
    pub model: Garch11,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub n_obs: usize,
    pub converged: bool,
    #[serde(skip)]
    pub residuals: Vec<f64>,
    #[serde(skip)]
    pub conditional_variance: Vec<f64>,
}

/// Variance estimates starting at index `start` of the fitted series.
///
/// In the anchored window `variance[i]` is the one-step forecast made at
/// observation `start + i`.  Out of sample, `start == n_obs` and
/// `variance[i]` is the (i+1)-step forecast from the end of the data.
#[derive(Debug, Clone, Serialize)]
pub struct GarchForecast {
    pub start: usize,
    pub variance: Vec<f64>,
    pub out_of_sample: bool,
}

impl Garch11 {
    /// Construct GARCH(1,1) with given parameters; σ² starts at σ²_∞.
    pub fn new(omega: f64, alpha: f64, beta: f64) -> Result<Self> {
        if !(omega > 0.0) {
            return Err(invalid("omega", format!("must be positive, got {omega}")));
        }
        if !(alpha >= 0.0 && beta >= 0.0) {
            return Err(invalid("alpha/beta", format!("must be non-negative, got α={alpha}, β={beta}")));
        }
        if !(alpha + beta < 1.0) {
            return Err(invalid(
                "alpha/beta",
                format!("covariance stationarity requires α+β < 1, got α={alpha}, β={beta}"),
            ));
        }
        Ok(Self {
            omega,
            alpha,
            beta,
            sigma2: omega / (1.0 - alpha - beta),
            prev_epsilon: 0.0,
        })
    }

    /// Feed the innovation for the next observation.
    ///
    /// σ²_t = ω + α·ε²_{t-1} + β·σ²_{t-1}, then ε_t becomes the stored shock.
    pub fn update(&mut self, epsilon: f64) {
        self.sigma2 = self.next_variance();
        self.prev_epsilon = epsilon;
    }

    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    pub fn long_run_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence())
    }

    /// σ²_{t+1|t} from the current state.
    pub fn next_variance(&self) -> f64 {
        self.omega + self.alpha * self.prev_epsilon.powi(2) + self.beta * self.sigma2
    }

    /// h-step ahead variance forecast (h ≥ 1).
    pub fn forecast_variance(&self, h: usize) -> f64 {
        let longrun = self.long_run_variance();
        let steps = h.max(1) - 1;
        longrun + self.persistence().powi(steps as i32) * (self.next_variance() - longrun)
    }

    /// Fit ω, α, β and the mean μ by Gaussian maximum likelihood.
    pub fn fit(series: &[f64]) -> Result<GarchFit> {
        let n = series.len();
        if n < MIN_GARCH_OBS {
            return Err(AnalysisError::InsufficientData { required: MIN_GARCH_OBS, actual: n });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::Fit("GARCH input contains non-finite values".into()));
        }
        if is_constant(series) {
            return Err(AnalysisError::Fit("GARCH input has zero variance".into()));
        }

        let mean = series.iter().sum::<f64>() / n as f64;
        let var = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let centred: Vec<f64> = series.iter().map(|v| v - mean).collect();
        let backcast = backcast(&centred);

        // Start at persistence 0.95 with α = 0.10, β = 0.85.
        let x0 = [mean, (0.05 * var).ln(), logit(0.95), logit(0.10 / 0.95)];
        let steps = [0.1 * var.sqrt(), 0.5, 0.5, 0.5];

        let objective = |theta: &[f64]| {
            let (mu, model) = transform(theta, backcast);
            -log_likelihood(series, mu, &model, backcast)
        };
        let nm = NelderMead { max_iter: 5_000, f_tol: 1e-10, x_tol: 1e-8 };
        let minimum = nm.minimize(objective, &x0, &steps);
        if !minimum.fx.is_finite() {
            return Err(AnalysisError::Fit("GARCH likelihood diverged".into()));
        }

        let (mu, mut model) = transform(&minimum.x, backcast);
        debug!(
            "GARCH(1,1) μ={:.4} ω={:.6} α={:.4} β={:.4} after {} iterations",
            mu, model.omega, model.alpha, model.beta, minimum.iterations
        );

        let residuals: Vec<f64> = series.iter().map(|v| v - mu).collect();
        let conditional_variance = garch_filter(&mut model, &residuals);

        let log_likelihood = -minimum.fx;
        let k = 4.0;
        Ok(GarchFit {
            mu,
            model,
            log_likelihood,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * (n as f64).ln(),
            n_obs: n,
            converged: minimum.converged,
            residuals,
            conditional_variance,
        })
    }
}

impl GarchFit {
    /// One-step variance forecasts anchored at each of the last `window`
    /// observations (the whole series when it is shorter).
    pub fn forecast_window(&self, window: usize) -> GarchForecast {
        let start = self.n_obs.saturating_sub(window);
        let variance = (start..self.n_obs)
            .map(|t| {
                self.model.omega
                    + self.model.alpha * self.residuals[t].powi(2)
                    + self.model.beta * self.conditional_variance[t]
            })
            .collect();
        GarchForecast { start, variance, out_of_sample: false }
    }

    /// Variance forecasts for the `horizon` periods after the last observation.
    pub fn forecast_ahead(&self, horizon: usize) -> GarchForecast {
        let variance = (1..=horizon).map(|h| self.model.forecast_variance(h)).collect();
        GarchForecast { start: self.n_obs, variance, out_of_sample: true }
    }
}

/// Run GARCH(1,1) over an innovation series, return all σ²_t values.
pub fn garch_filter(garch: &mut Garch11, innovations: &[f64]) -> Vec<f64> {
    let mut variances = Vec::with_capacity(innovations.len());
    for &e in innovations {
        garch.update(e);
        variances.push(garch.sigma2);
    }
    variances
}

fn log_likelihood(series: &[f64], mu: f64, model: &Garch11, backcast: f64) -> f64 {
    let ln_2pi = (2.0 * std::f64::consts::PI).ln();
    let mut state = seeded(model, backcast);
    let mut ll = 0.0;
    for &y in series {
        let e = y - mu;
        state.update(e);
        if !(state.sigma2 > 0.0) {
            return f64::NEG_INFINITY;
        }
        ll -= 0.5 * (ln_2pi + state.sigma2.ln() + e * e / state.sigma2);
    }
    ll
}

/// Filter state positioned so the first update yields ω + (α+β)·backcast.
fn seeded(model: &Garch11, backcast: f64) -> Garch11 {
    Garch11 { sigma2: backcast, prev_epsilon: backcast.sqrt(), ..model.clone() }
}

fn transform(theta: &[f64], backcast: f64) -> (f64, Garch11) {
    let u = sigmoid(theta[2]).min(MAX_PERSISTENCE);
    let v = sigmoid(theta[3]);
    let model = Garch11 {
        omega: theta[1].exp(),
        alpha: u * v,
        beta: u * (1.0 - v),
        sigma2: backcast,
        prev_epsilon: backcast.sqrt(),
    };
    (theta[0], model)
}

fn backcast(residuals: &[f64]) -> f64 {
    let m = residuals.len().min(BACKCAST_SPAN);
    let (num, den) = residuals[..m]
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, e)| {
            let w = BACKCAST_DECAY.powi(i as i32);
            (num + w * e * e, den + w)
        });
    if den > 0.0 { num / den } else { 0.0 }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

fn invalid(name: &str, reason: String) -> AnalysisError {
    AnalysisError::InvalidParameter { name: name.to_owned(), reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stationarity::tests::noise;

    /// Simulated GARCH(1,1) returns with unit-variance uniform shocks.
    fn simulate(omega: f64, alpha: f64, beta: f64, n: usize) -> Vec<f64> {
        let mut g = Garch11::new(omega, alpha, beta).unwrap();
        noise(17, n)
            .into_iter()
            .map(|z| {
                let e = z * 3f64.sqrt() * g.next_variance().sqrt();
                g.update(e);
                e
            })
            .collect()
    }

    #[test]
    fn garch_stationarity() {
        let g = Garch11::new(1e-6, 0.10, 0.85).unwrap();
        let longrun = 1e-6 / (1.0 - 0.10 - 0.85);
        assert!((g.sigma2 - longrun).abs() < 1e-12);
        assert!(Garch11::new(1e-6, 0.5, 0.5).is_err());
        assert!(Garch11::new(0.0, 0.1, 0.1).is_err());
    }

    #[test]
    fn garch_update_monotonic() {
        let mut g = Garch11::new(1e-6, 0.10, 0.85).unwrap();
        g.update(0.05);
        g.update(0.0);
        let after_shock = g.sigma2;
        g.update(0.0);
        let after_calm = g.sigma2;
        assert!(after_shock > after_calm);
    }

    #[test]
    fn fitted_parameters_satisfy_constraints() {
        let data = simulate(0.1, 0.15, 0.75, 600);
        let fit = Garch11::fit(&data).unwrap();
        let m = &fit.model;
        assert!(m.omega > 0.0);
        assert!(m.alpha >= 0.0 && m.beta >= 0.0);
        assert!(m.alpha + m.beta < 1.0);
        assert!(fit.log_likelihood.is_finite());
        assert_eq!(fit.conditional_variance.len(), 600);
    }

    #[test]
    fn anchored_window_covers_last_observations() {
        let data: Vec<f64> = (0..100).map(|i| 50.0 + i as f64).collect();
        let fit = Garch11::fit(&data).unwrap();
        let fc = fit.forecast_window(30);
        assert_eq!(fc.start, 70);
        assert_eq!(fc.variance.len(), 30);
        assert!(!fc.out_of_sample);
        assert!(fc.variance.iter().all(|v| v.is_finite() && *v > 0.0));
        // The last anchored value is the genuine next-period forecast.
        let last = *fc.variance.last().unwrap();
        assert!((last - fit.model.next_variance()).abs() < 1e-9 * last.max(1.0));
    }

    #[test]
    fn short_series_window_is_whole_series() {
        let data: Vec<f64> = (0..12).map(|i| (i as f64 * 0.7).sin()).collect();
        let fit = Garch11::fit(&data).unwrap();
        let fc = fit.forecast_window(30);
        assert_eq!(fc.start, 0);
        assert_eq!(fc.variance.len(), 12);
    }

    #[test]
    fn out_of_sample_forecast_reverts_to_long_run() {
        let data = simulate(0.2, 0.10, 0.80, 400);
        let fit = Garch11::fit(&data).unwrap();
        let fc = fit.forecast_ahead(500);
        assert_eq!(fc.start, 400);
        assert_eq!(fc.variance.len(), 500);
        assert!((fc.variance[0] - fit.model.next_variance()).abs() < 1e-12);
        let longrun = fit.model.long_run_variance();
        let tail = *fc.variance.last().unwrap();
        let head_gap = (fc.variance[0] - longrun).abs();
        assert!((tail - longrun).abs() <= head_gap + 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(matches!(
            Garch11::fit(&[1.0, 2.0, 3.0]),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(Garch11::fit(&[5.0; 40]), Err(AnalysisError::Fit(_))));
    }
}
