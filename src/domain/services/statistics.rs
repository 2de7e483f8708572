/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
///
/// Returns 0.0 for fewer than two values rather than NaN.
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Weighted mean of `(value, weight)` pairs.
///
/// `None` when the slice is empty or the weights do not sum to a positive number.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
    if pairs.is_empty() || total_weight <= 0.0 || !total_weight.is_finite() {
        return None;
    }

    let weighted_sum: f64 = pairs.iter().map(|(v, w)| v * w).sum();
    Some(weighted_sum / total_weight)
}

/// Standard deviation relative to the mean; 0.0 when the mean is not positive
pub fn relative_standard_deviation(values: &[f64]) -> f64 {
    match mean(values) {
        Some(avg) if avg > 0.0 => standard_deviation(values) / avg,
        _ => 0.0,
    }
}
