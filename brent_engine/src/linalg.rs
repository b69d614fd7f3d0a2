/// linalg.rs — Ordinary least squares
///
/// ```text
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
///   y = X·β + ε,    β̂ = (X'X)⁻¹ X'y
///
/// Full-rank designs invert X'X directly.  When X'X is rank deficient
/// (singular values below TOL × the largest) the Moore–Penrose inverse
/// (X'X)⁺ is used instead, giving the minimum-norm β̂; collinear columns
/// share their coefficient and the rank drops accordingly.
///
///   σ̂² = SSE / (n − rank)
///   se(β̂_k) = √(σ̂² · [(X'X)⁻¹]_kk)
///   ln L = −n/2 · (ln 2π + ln(SSE/n) + 1)
///   AIC  = −2 ln L + 2·rank
/// ─────────────────────────────────────────────────────────────────────────
/// ```
use nalgebra::{DMatrix, DVector};

const TOL: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct OlsFit {
    pub beta:      DVector<f64>,
    pub residuals: DVector<f64>,
    pub sse:       f64,
    /// (X'X)⁻¹, or (X'X)⁺ for rank-deficient designs
    pub xtx_inv:   DMatrix<f64>,
    pub rank:      usize,
    pub nobs:      usize,
}

impl OlsFit {
    pub fn sigma2(&self) -> f64 {
        let dof = self.nobs.saturating_sub(self.rank).max(1);
        self.sse / dof as f64
    }

    pub fn std_err(&self, k: usize) -> f64 {
        (self.sigma2() * self.xtx_inv[(k, k)]).sqrt()
    }

    pub fn t_value(&self, k: usize) -> f64 {
        self.beta[k] / self.std_err(k)
    }

    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.sse / n).ln() + 1.0)
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.rank as f64
    }
}

/// Fit y on X.  `None` when there are no rows or no identifiable column.
pub fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let (n, k) = x.shape();
    if n == 0 || k == 0 || y.len() != n {
        return None;
    }

    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;

    // Numerical rank from the singular values of X'X
    let singular = xtx.singular_values();
    let eps = TOL * singular.max();
    let rank = singular.iter().filter(|s| **s > eps).count();
    if rank == 0 {
        return None;
    }

    let xtx_inv = if rank == k {
        match xtx.clone().try_inverse() {
            Some(inv) => inv,
            None => xtx.pseudo_inverse(eps).ok()?,
        }
    } else {
        xtx.pseudo_inverse(eps).ok()?
    };

    let beta = &xtx_inv * xty;
    let residuals = y - x * &beta;
    let sse = residuals.norm_squared();

    Some(OlsFit { beta, residuals, sse, xtx_inv, rank, nobs: n })
}

/// Build a design matrix from per-row regressor vectors.
pub fn design(rows: &[Vec<f64>]) -> Option<DMatrix<f64>> {
    let n = rows.len();
    let k = rows.first()?.len();
    if rows.iter().any(|r| r.len() != k) {
        return None;
    }
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Some(DMatrix::from_row_slice(n, k, &flat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f64]]) -> DMatrix<f64> {
        design(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn recovers_exact_line() {
        // y = 2 + 3x
        let x = matrix(&[&[1.0, 0.0], &[1.0, 1.0], &[1.0, 2.0], &[1.0, 3.0]]);
        let y = DVector::from_vec(vec![2.0, 5.0, 8.0, 11.0]);
        let fit = ols(&x, &y).unwrap();
        assert!((fit.beta[0] - 2.0).abs() < 1e-9);
        assert!((fit.beta[1] - 3.0).abs() < 1e-9);
        assert!(fit.sse < 1e-12);
        assert_eq!(fit.rank, 2);
    }

    #[test]
    fn inverse_matches_closed_form() {
        let x = matrix(&[&[1.0, 1.0], &[1.0, 2.0], &[1.0, 4.0]]);
        let y = DVector::from_vec(vec![1.0, 2.0, 2.0]);
        let fit = ols(&x, &y).unwrap();
        // X'X = [[3, 7], [7, 21]], det = 14
        assert!((fit.xtx_inv[(0, 0)] - 21.0 / 14.0).abs() < 1e-9);
        assert!((fit.xtx_inv[(0, 1)] + 7.0 / 14.0).abs() < 1e-9);
        assert!((fit.xtx_inv[(1, 1)] - 3.0 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn collinear_column_falls_back_to_pseudo_inverse() {
        // Third column duplicates the intercept; y = 1 + 2x.
        let x = matrix(&[
            &[1.0, 0.0, 1.0],
            &[1.0, 1.0, 1.0],
            &[1.0, 2.0, 1.0],
            &[1.0, 3.0, 1.0],
        ]);
        let y = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0]);
        let fit = ols(&x, &y).unwrap();
        assert_eq!(fit.rank, 2);
        assert!((fit.beta[1] - 2.0).abs() < 1e-8);
        // Minimum-norm solution splits the intercept evenly.
        assert!((fit.beta[0] - 0.5).abs() < 1e-8);
        assert!((fit.beta[2] - 0.5).abs() < 1e-8);
        assert!(fit.sse < 1e-12);
    }

    #[test]
    fn design_shapes_rows() {
        let m = design(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m[(2, 1)], 6.0);
        assert!(design(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn empty_design_is_rejected() {
        let x = DMatrix::<f64>::zeros(0, 2);
        let y = DVector::<f64>::zeros(0);
        assert!(ols(&x, &y).is_none());
    }
}
