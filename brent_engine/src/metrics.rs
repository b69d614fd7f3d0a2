/// metrics.rs — Forecast Accuracy Metrics
///
/// ```text
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// MEAN ABSOLUTE ERROR
///   MAE  = (1/n) Σ |y_i − ŷ_i|
///
/// ROOT MEAN SQUARED ERROR
///   RMSE = √( (1/n) Σ (y_i − ŷ_i)² )
///
///   Both are taken over the first n = min(len(y), len(ŷ)) pairs.
///
/// COEFFICIENT OF DETERMINATION
///   SS_res = Σ (y_i − ŷ_i)²
///   SS_tot = Σ (y_i − ȳ)²
///   R²     = 1 − SS_res / SS_tot
///
///   Only computed when len(y) = len(ŷ); fewer than two points give NaN.
///   A constant y (SS_tot = 0) scores 1 for a perfect prediction and 0
///   otherwise.
/// ─────────────────────────────────────────────────────────────────────────
/// ```
use serde::Serialize;

/// Accuracy of one model's predictions against observed values.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationMetrics {
    pub label: String,
    pub n:     usize,
    pub mae:   f64,
    pub rmse:  f64,
    pub r2:    Option<f64>,
}

impl EvaluationMetrics {
    /// Diagnostic lines in the console layout of an analysis run.
    pub fn console_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{} Model Evaluation:", self.label),
            format!("MAE: {}", self.mae),
            format!("RMSE: {}", self.rmse),
        ];
        if let Some(r2) = self.r2 {
            lines.push(format!("R-squared: {}", r2));
        }
        lines
    }
}

impl std::fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  {} — EVALUATION", self.label.to_uppercase())?;
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  Points     : {}", self.n)?;
        writeln!(f, "  MAE        : {:.4}", self.mae)?;
        writeln!(f, "  RMSE       : {:.4}", self.rmse)?;
        match self.r2 {
            Some(r2) => writeln!(f, "  R-squared  : {:.4}", r2)?,
            None => writeln!(f, "  R-squared  : n/a (length mismatch)")?,
        }
        writeln!(f, "════════════════════════════════════════════")
    }
}

/// Score `predicted` against `actual`.
pub fn evaluate(actual: &[f64], predicted: &[f64], label: &str) -> EvaluationMetrics {
    let n = actual.len().min(predicted.len());
    let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

    let mae = mean(&errors.iter().map(|e| e.abs()).collect::<Vec<_>>()).unwrap_or(f64::NAN);
    let mse = mean(&errors.iter().map(|e| e * e).collect::<Vec<_>>()).unwrap_or(f64::NAN);

    let r2 = if actual.len() == predicted.len() { r_squared(actual, predicted) } else { None };

    EvaluationMetrics { label: label.to_owned(), n, mae, rmse: mse.sqrt(), r2 }
}

/// R² for equal-length inputs; NaN for fewer than two points.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() {
        return None;
    }
    if actual.len() < 2 {
        return Some(f64::NAN);
    }
    let y_bar = mean(actual)?;
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - y_bar).powi(2)).sum();

    if ss_tot == 0.0 {
        return Some(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}

// ── Statistical helpers ───────────────────────────────────────────────────

fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}
