/// optim.rs — Derivative-free minimisation (Nelder–Mead)
///
/// Used for the ARIMA conditional-sum-of-squares fit and the GARCH(1,1)
/// likelihood.  Both objectives are cheap and low-dimensional (≤ 12
/// parameters), which is where the simplex method is at home.
///
///   reflection   x_r = x̄ + α(x̄ − x_worst)      α = 1
///   expansion    x_e = x̄ + γ(x_r − x̄)          γ = 2
///   contraction  x_c = x̄ + ρ(x_worst − x̄)      ρ = 0.5
///   shrink       x_i = x_best + σ(x_i − x_best) σ = 0.5
///
/// Non-finite objective values are treated as +∞ so infeasible regions
/// are rejected rather than propagated.

const ALPHA: f64 = 1.0;
const GAMMA: f64 = 2.0;
const RHO:   f64 = 0.5;
const SIGMA: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct NelderMead {
    pub max_iter: usize,
    /// Stop when the spread of simplex values falls below this (relative)
    pub f_tol: f64,
    /// Stop when the simplex diameter falls below this
    pub x_tol: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self { max_iter: 2_000, f_tol: 1e-10, x_tol: 1e-10 }
    }
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub fx: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl NelderMead {
    /// Minimise `f` starting at `x0`, with initial simplex offsets `steps`.
    pub fn minimize<F>(&self, f: F, x0: &[f64], steps: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = x0.len();
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_finite() { v } else { f64::INFINITY }
        };

        if n == 0 {
            return Minimum { x: Vec::new(), fx: eval(x0), iterations: 0, converged: true };
        }

        // ── Initial simplex ──────────────────────────────────────────────
        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(x0.to_vec());
        for i in 0..n {
            let mut v = x0.to_vec();
            let step = steps.get(i).copied().unwrap_or(0.1);
            v[i] += if step != 0.0 { step } else { 0.1 };
            simplex.push(v);
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            iterations += 1;

            // Order: best first, worst last
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            let spread = (values[n] - values[0]).abs();
            let diameter = simplex[1..]
                .iter()
                .map(|v| max_abs_diff(v, &simplex[0]))
                .fold(0.0, f64::max);
            if values[0].is_finite()
                && spread <= self.f_tol * (1.0 + values[0].abs())
                && diameter <= self.x_tol
            {
                converged = true;
                break;
            }

            // Centroid of all but the worst
            let mut centroid = vec![0.0; n];
            for v in &simplex[..n] {
                for (c, x) in centroid.iter_mut().zip(v) {
                    *c += x / n as f64;
                }
            }

            let reflected = affine(&centroid, &simplex[n], -ALPHA);
            let f_r = eval(&reflected);

            if f_r < values[0] {
                let expanded = affine(&centroid, &reflected, GAMMA);
                let f_e = eval(&expanded);
                if f_e < f_r {
                    simplex[n] = expanded;
                    values[n] = f_e;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_r;
                }
                continue;
            }

            if f_r < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_r;
                continue;
            }

            let contracted = affine(&centroid, &simplex[n], RHO);
            let f_c = eval(&contracted);
            if f_c < values[n] {
                simplex[n] = contracted;
                values[n] = f_c;
                continue;
            }

            // Shrink towards the best vertex
            let best = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = affine(&best, &simplex[i], SIGMA);
                values[i] = eval(&simplex[i]);
            }
        }

        let (best, fx) = simplex
            .into_iter()
            .zip(values)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or_else(|| (x0.to_vec(), f64::INFINITY));

        Minimum { x: best, fx, iterations, converged }
    }
}

/// origin + t·(point − origin)
fn affine(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimises_shifted_quadratic() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let m = NelderMead::default().minimize(f, &[0.0, 0.0], &[0.5, 0.5]);
        assert!((m.x[0] - 3.0).abs() < 1e-4, "x0 = {}", m.x[0]);
        assert!((m.x[1] + 1.0).abs() < 1e-4, "x1 = {}", m.x[1]);
        assert!(m.fx < 1e-8);
    }

    #[test]
    fn minimises_rosenbrock() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let nm = NelderMead { max_iter: 10_000, ..NelderMead::default() };
        let m = nm.minimize(f, &[-1.2, 1.0], &[0.1, 0.1]);
        assert!((m.x[0] - 1.0).abs() < 1e-3);
        assert!((m.x[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn infeasible_region_is_avoided() {
        // Objective undefined for x ≤ 0
        let f = |x: &[f64]| if x[0] <= 0.0 { f64::NAN } else { (x[0].ln()).powi(2) };
        let m = NelderMead::default().minimize(f, &[2.0], &[0.5]);
        assert!((m.x[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_dimensional_problem_evaluates_once() {
        let m = NelderMead::default().minimize(|_| 4.0, &[], &[]);
        assert_eq!(m.fx, 4.0);
        assert!(m.converged);
    }
}
