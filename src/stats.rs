//! Statistical helpers
//!
//! Small numeric building blocks shared by the analyzers: least-squares
//! trend, population variance, Pearson correlation and the t-statistic
//! confidence ladder.

/// Ordinary-least-squares slope of `values` against their index positions.
///
/// Returns the change per step (per week for weekly rates), 0 for fewer than
/// two values.
pub fn linear_trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * sum_x2 - sum_x.powi(2);
    if denominator == 0.0 {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Population variance (mean of squared deviations), 0 for an empty slice
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Pearson correlation coefficient using the sum-based formula.
///
/// ```text
/// r = (nΣxy − ΣxΣy) / sqrt((nΣx² − (Σx)²)(nΣy² − (Σy)²))
/// ```
///
/// A zero denominator (no variance in either series) yields 0.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|b| b * b).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x.powi(2)) * (n * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        (numerator / denominator).clamp(-1.0, 1.0)
    }
}

/// Approximate confidence level of a correlation from its t-statistic.
///
/// `t = r * sqrt((n - 2) / (1 - r²))`, bucketed on the usual two-tailed
/// critical values.
pub fn confidence_level(r: f64, sample_size: usize) -> f64 {
    if sample_size <= 2 {
        return 0.5;
    }

    let r_squared = r * r;
    let t = if r_squared >= 1.0 {
        f64::INFINITY
    } else {
        (r * ((sample_size as f64 - 2.0) / (1.0 - r_squared)).sqrt()).abs()
    };

    if t >= 2.576 {
        0.99
    } else if t >= 1.96 {
        0.95
    } else if t >= 1.645 {
        0.90
    } else if t >= 1.282 {
        0.80
    } else {
        0.50
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
