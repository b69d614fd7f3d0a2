/// models/stationarity.rs — Unit-root and stationarity tests
///
/// ```text
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// AUGMENTED DICKEY-FULLER (constant, no trend)
///   H0: unit root (non-stationary)
///
///     Δy_t = γ·y_{t-1} + Σ_{i=1..k} δ_i·Δy_{t-i} + c + ε_t
///
///   Statistic:  τ = γ̂ / se(γ̂)
///   Lag order k ∈ [0, maxlag] minimises AIC on a common sample, with
///       maxlag = ⌈12 · (n/100)^{1/4}⌉  capped at n/2 − 2
///   then the regression is re-run on the longest sample for that k.
///
///   p-value: MacKinnon (1994) response surface
///       p = Φ(Σ_j b_j · τ^j)
///   using the small-p polynomial for τ ≤ τ*, the large-p one otherwise.
///   Critical values: MacKinnon (2010)  cv = β∞ + β1/T + β2/T² + β3/T³
///
/// KPSS (level stationarity)
///   H0: stationary
///       η = Σ S_t² / (n² · s²(l)),   S_t = Σ_{i≤t} (y_i − ȳ)
///   s²(l): Newey-West long-run variance with Bartlett weights,
///       l = ⌊3·√n / 13⌋
///   p-value interpolated on the (0.347, 0.463, 0.574, 0.739) ↔
///   (0.10, 0.05, 0.025, 0.01) table, clipped to [0.01, 0.10].
/// ─────────────────────────────────────────────────────────────────────────
/// ```
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::linalg::ols;

/// Fewest observations for which the ADF regression is attempted.
pub const MIN_ADF_OBS: usize = 10;

// MacKinnon (1994), regression "c", one variable.
const TAU_MAX:  f64 = 2.74;
const TAU_MIN:  f64 = -18.86;
const TAU_STAR: f64 = -1.61;
const TAU_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010), regression "c", one variable: 1%, 5%, 10%.
const TAU_CRIT: [(&str, [f64; 4]); 3] = [
    ("1%",  [-3.43035, -6.5393, -16.786, -79.433]),
    ("5%",  [-2.86154, -2.8903, -4.234, -40.040]),
    ("10%", [-2.56677, -1.5384, -2.809, 0.0]),
];

const KPSS_CRIT:  [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const KPSS_PVALS: [f64; 4] = [0.10, 0.05, 0.025, 0.01];

#[derive(Debug, Clone, Serialize)]
pub struct AdfReport {
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub n_obs: usize,
    pub critical_values: Vec<(String, f64)>,
}

impl AdfReport {
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KpssReport {
    pub statistic: f64,
    pub p_value: f64,
    pub lags: usize,
}

/// Augmented Dickey-Fuller test with AIC lag selection.
pub fn adf_test(series: &[f64]) -> Result<AdfReport> {
    let n = series.len();
    if n < MIN_ADF_OBS {
        return Err(AnalysisError::InsufficientData { required: MIN_ADF_OBS, actual: n });
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::Fit("ADF input contains non-finite values".into()));
    }

    // A flat series has no unit root to speak of.
    if is_constant(series) {
        debug!("ADF on constant series: reporting stationary");
        return Ok(AdfReport {
            statistic: f64::NEG_INFINITY,
            p_value: 0.0,
            used_lag: 0,
            n_obs: n - 1,
            critical_values: critical_values(n - 1),
        });
    }

    let diff = difference(series, 1);
    let maxlag = ((12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize).min(n / 2 - 2);

    // ── Lag selection on the common sample ───────────────────────────────
    let mut best_lag = 0;
    let mut best_aic = f64::INFINITY;
    for lag in 0..=maxlag {
        if let Some(fit) = adf_regression(series, &diff, lag, maxlag) {
            let aic = fit.aic();
            if aic < best_aic {
                best_aic = aic;
                best_lag = lag;
            }
        }
    }

    // ── Final regression on the longest sample for the chosen lag ────────
    let fit = adf_regression(series, &diff, best_lag, best_lag)
        .ok_or_else(|| AnalysisError::Fit("ADF regression is singular".into()))?;

    let statistic = fit.t_value(0);
    let p_value = if statistic.is_nan() { 1.0 } else { mackinnon_p(statistic) };
    let n_obs = fit.nobs;

    Ok(AdfReport {
        statistic,
        p_value,
        used_lag: best_lag,
        n_obs,
        critical_values: critical_values(n_obs),
    })
}

/// Regress Δy_t on [y_{t-1}, Δy_{t-1..t-lag}, 1] over t ≥ trim.
///
/// `trim` fixes the first usable difference so every lag order in the
/// selection loop sees the same observations.
fn adf_regression(
    levels: &[f64],
    diff: &[f64],
    lag: usize,
    trim: usize,
) -> Option<crate::linalg::OlsFit> {
    let nobs = diff.len().checked_sub(trim)?;
    let k = lag + 2;
    if nobs <= k {
        return None;
    }

    let mut x = DMatrix::<f64>::zeros(nobs, k);
    let mut y = DVector::<f64>::zeros(nobs);
    for (row, t) in (trim..diff.len()).enumerate() {
        y[row] = diff[t];
        // diff[t] = levels[t+1] − levels[t]  ⇒  y_{t-1} ≡ levels[t]
        x[(row, 0)] = levels[t];
        for i in 1..=lag {
            x[(row, i)] = diff[t - i];
        }
        x[(row, k - 1)] = 1.0;
    }
    ols(&x, &y)
}

/// MacKinnon (1994) approximate p-value for the "c" case.
pub fn mackinnon_p(tau: f64) -> f64 {
    if tau > TAU_MAX {
        return 1.0;
    }
    if tau < TAU_MIN {
        return 0.0;
    }
    let z = if tau <= TAU_STAR {
        polyval(&TAU_SMALLP, tau)
    } else {
        polyval(&TAU_LARGEP, tau)
    };
    // Normal::new(0, 1) is always valid
    Normal::new(0.0, 1.0).map(|n| n.cdf(z)).unwrap_or(f64::NAN)
}

fn critical_values(nobs: usize) -> Vec<(String, f64)> {
    let t = nobs as f64;
    TAU_CRIT
        .iter()
        .map(|(label, b)| {
            let cv = b[0] + b[1] / t + b[2] / t.powi(2) + b[3] / t.powi(3);
            ((*label).to_owned(), cv)
        })
        .collect()
}

/// Σ c_j · x^j
fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// KPSS level-stationarity test.
pub fn kpss_test(series: &[f64]) -> Result<KpssReport> {
    let n = series.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData { required: 3, actual: n });
    }

    let mean = series.iter().sum::<f64>() / n as f64;
    let resid: Vec<f64> = series.iter().map(|v| v - mean).collect();

    let lags = ((3.0 * (n as f64).sqrt() / 13.0).floor() as usize).min(n - 1);

    // Newey-West long-run variance
    let mut s2 = resid.iter().map(|r| r * r).sum::<f64>() / n as f64;
    for l in 1..=lags {
        let w = 1.0 - l as f64 / (lags + 1) as f64;
        let gamma = resid[l..]
            .iter()
            .zip(&resid[..n - l])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64;
        s2 += 2.0 * w * gamma;
    }

    let mut cumsum = 0.0;
    let eta_num: f64 = resid
        .iter()
        .map(|r| {
            cumsum += r;
            cumsum * cumsum
        })
        .sum();
    let statistic = eta_num / (n as f64).powi(2) / s2;

    Ok(KpssReport { statistic, p_value: kpss_p(statistic), lags })
}

fn kpss_p(stat: f64) -> f64 {
    if !stat.is_finite() || stat >= KPSS_CRIT[3] {
        return KPSS_PVALS[3];
    }
    if stat <= KPSS_CRIT[0] {
        return KPSS_PVALS[0];
    }
    for i in 0..3 {
        let (lo, hi) = (KPSS_CRIT[i], KPSS_CRIT[i + 1]);
        if stat <= hi {
            let w = (stat - lo) / (hi - lo);
            return KPSS_PVALS[i] + w * (KPSS_PVALS[i + 1] - KPSS_PVALS[i]);
        }
    }
    KPSS_PVALS[3]
}

/// d-th order differencing.
pub fn difference(data: &[f64], d: usize) -> Vec<f64> {
    let mut result = data.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// True when every value equals the first (to rounding).
pub fn is_constant(data: &[f64]) -> bool {
    let Some(&first) = data.first() else { return true };
    let scale = first.abs().max(1.0);
    data.iter().all(|v| (v - first).abs() <= 1e-12 * scale)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Deterministic xorshift noise in [-1, 1).
    pub(crate) fn noise(seed: u64, n: usize) -> Vec<f64> {
        let mut s = seed.max(1);
        (0..n)
            .map(|_| {
                s ^= s << 13;
                s ^= s >> 7;
                s ^= s << 17;
                (s >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
            })
            .collect()
    }

    fn random_walk_with_drift(n: usize) -> Vec<f64> {
        let mut y = 100.0;
        noise(42, n)
            .into_iter()
            .map(|e| {
                y += 0.5 + e;
                y
            })
            .collect()
    }

    #[test]
    fn random_walk_is_non_stationary_until_differenced() {
        let walk = random_walk_with_drift(300);
        let before = adf_test(&walk).unwrap();
        assert!(before.p_value > 0.05, "p = {}", before.p_value);

        let after = adf_test(&difference(&walk, 1)).unwrap();
        assert!(after.p_value < 0.05, "p = {}", after.p_value);
        assert!(after.p_value < before.p_value);
    }

    #[test]
    fn white_noise_rejects_unit_root() {
        let report = adf_test(&noise(7, 250)).unwrap();
        assert!(report.is_stationary(0.05), "tau = {}", report.statistic);
    }

    #[test]
    fn constant_series_is_stationary() {
        let report = adf_test(&[5.0; 40]).unwrap();
        assert_eq!(report.p_value, 0.0);
    }

    #[test]
    fn short_series_is_insufficient() {
        let err = adf_test(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { required: 10, actual: 3 }));
    }

    #[test]
    fn mackinnon_p_is_monotone_and_bounded() {
        let taus = [-20.0, -5.0, -3.5, -2.86, -1.61, -1.0, 0.0, 1.0, 3.0];
        let ps: Vec<f64> = taus.iter().map(|&t| mackinnon_p(t)).collect();
        assert!(ps.windows(2).all(|w| w[0] <= w[1]), "{ps:?}");
        assert_eq!(ps[0], 0.0);
        assert_eq!(*ps.last().unwrap(), 1.0);
        // τ at the 5% critical value maps close to 0.05
        assert!((mackinnon_p(-2.8623) - 0.05).abs() < 0.01);
    }

    #[test]
    fn critical_values_are_ordered() {
        let cv = critical_values(200);
        assert!(cv[0].1 < cv[1].1 && cv[1].1 < cv[2].1);
    }

    #[test]
    fn adf_survives_collinear_lag_columns() {
        // Constant differences make every lag column a copy of the intercept.
        let trend: Vec<f64> = (0..100).map(|i| 50.0 + i as f64).collect();
        let report = adf_test(&trend).unwrap();
        assert!((0.0..=1.0).contains(&report.p_value));
        assert_eq!(report.critical_values.len(), 3);
    }

    #[test]
    fn kpss_flags_trend() {
        let trend: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let on_trend = kpss_test(&trend).unwrap();
        assert_eq!(on_trend.p_value, 0.01);

        let on_noise = kpss_test(&noise(3, 200)).unwrap();
        assert!(on_noise.statistic < on_trend.statistic);
    }

    #[test]
    fn kpss_p_interpolates_table() {
        assert_eq!(kpss_p(0.1), 0.10);
        assert!((kpss_p(0.405) - 0.075).abs() < 1e-9);
        assert_eq!(kpss_p(2.0), 0.01);
    }

    #[test]
    fn difference_orders() {
        let data = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&data, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&data, 2), vec![1.0, 1.0, 1.0]);
        assert!(difference(&[1.0], 1).is_empty());
    }
}
