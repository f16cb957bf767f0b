//! Portfolio risk statistics
//!
//! Closed-form helpers: simple returns, sample covariance, portfolio variance,
//! parametric Value-at-Risk and the Herfindahl-Hirschman concentration index.
//! Everything here is pure and synchronous.

use crate::core::domain::risk::MAX_RISK_SCORE;
use crate::core::error::AppError;
use crate::core::result::AppResult;

/// Parametric VaR breakdown for a portfolio
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VarReport {
    pub variance: f64,
    pub sigma: f64,
    pub value_at_risk: f64,
    /// VaR as a percentage of portfolio value, capped at 100
    pub risk_score: f64,
}

/// Arithmetic mean; `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Simple period-over-period returns
///
/// Pairs with a non-positive previous price are skipped, as are non-finite
/// results.
pub fn compute_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .filter(|r| r.is_finite())
        .collect()
}

/// Sample covariance (n - 1 denominator)
///
/// Series of different length are aligned on their most recent points.
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }

    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];
    let mean_a = mean(a);
    let mean_b = mean(b);

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();

    sum / (n - 1) as f64
}

/// Portfolio variance `Σ_i Σ_j w_i w_j cov(r_i, r_j)`
pub fn portfolio_variance(weights: &[f64], return_matrix: &[Vec<f64>]) -> AppResult<f64> {
    if weights.len() != return_matrix.len() {
        return Err(AppError::risk(format!(
            "weights ({}) and return series ({}) differ in length",
            weights.len(),
            return_matrix.len()
        )));
    }

    let mut variance = 0.0;
    for (i, wi) in weights.iter().enumerate() {
        for (j, wj) in weights.iter().enumerate() {
            variance += wi * wj * covariance(&return_matrix[i], &return_matrix[j]);
        }
    }

    Ok(variance)
}

/// Parametric Value-at-Risk at the given z-score
pub fn calculate_var(
    portfolio_value: f64,
    weights: &[f64],
    return_matrix: &[Vec<f64>],
    confidence_z: f64,
) -> AppResult<VarReport> {
    let variance = portfolio_variance(weights, return_matrix)?;

    if portfolio_value <= 0.0 {
        return Ok(VarReport {
            variance,
            ..VarReport::default()
        });
    }

    // Rounding can push a near-zero variance slightly negative
    let sigma = variance.max(0.0).sqrt();
    let value_at_risk = confidence_z * sigma * portfolio_value;
    let risk_score = (value_at_risk / portfolio_value * 100.0).min(MAX_RISK_SCORE);

    Ok(VarReport {
        variance,
        sigma,
        value_at_risk,
        risk_score,
    })
}

/// Herfindahl-Hirschman index of the weights
pub fn compute_hhi(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}

/// HHI scaled to the 0-100 score range
pub fn hhi_score(hhi: f64) -> f64 {
    (hhi * 100.0).clamp(0.0, MAX_RISK_SCORE)
}

/// Normalize values into weights; all zeros when the total is not positive
pub fn portfolio_weights(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_compute_returns() {
        let returns = compute_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.10).abs() < EPS);
        assert!((returns[1] + 0.10).abs() < EPS);
    }

    #[test]
    fn test_compute_returns_skips_zero_prices() {
        assert_eq!(compute_returns(&[0.0, 5.0, 10.0]), vec![1.0]);
        assert!(compute_returns(&[5.0]).is_empty());
    }

    #[test]
    fn test_covariance_of_series_with_itself_is_variance() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        // sample variance of 1..4 is 5/3
        assert!((covariance(&xs, &xs) - 5.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_covariance_aligns_on_recent_points() {
        let long = [100.0, 1.0, 2.0, 3.0];
        let short = [1.0, 2.0, 3.0];
        assert!((covariance(&long, &short) - 1.0).abs() < EPS);
        assert_eq!(covariance(&[1.0], &[2.0]), 0.0);
    }

    #[test]
    fn test_portfolio_variance_single_asset() {
        let series = vec![vec![0.01, -0.02, 0.03, -0.01]];
        let var = portfolio_variance(&[1.0], &series).unwrap();
        assert!((var - covariance(&series[0], &series[0])).abs() < EPS);
    }

    #[test]
    fn test_portfolio_variance_rejects_mismatched_inputs() {
        let result = portfolio_variance(&[0.5, 0.5], &[vec![0.1, 0.2]]);
        assert!(matches!(result, Err(AppError::Risk { .. })));
    }

    #[test]
    fn test_calculate_var() {
        let series = vec![vec![0.02, -0.02, 0.02, -0.02]];
        let report = calculate_var(1_000.0, &[1.0], &series, 1.65).unwrap();

        let expected_sigma = covariance(&series[0], &series[0]).sqrt();
        assert!((report.sigma - expected_sigma).abs() < EPS);
        assert!((report.value_at_risk - 1.65 * expected_sigma * 1_000.0).abs() < 1e-9);
        assert!((report.risk_score - 1.65 * expected_sigma * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_var_caps_score_at_100() {
        let wild = vec![vec![5.0, -0.9, 4.0, -0.8]];
        let report = calculate_var(10.0, &[1.0], &wild, 1.65).unwrap();
        assert_eq!(report.risk_score, 100.0);
    }

    #[test]
    fn test_calculate_var_zero_value() {
        let report = calculate_var(0.0, &[1.0], &[vec![0.1, 0.2, 0.3]], 1.65).unwrap();
        assert_eq!(report.risk_score, 0.0);
        assert_eq!(report.value_at_risk, 0.0);
    }

    #[test]
    fn test_hhi() {
        assert_eq!(compute_hhi(&[1.0]), 1.0);
        assert_eq!(compute_hhi(&[0.5, 0.5]), 0.5);
        assert_eq!(hhi_score(compute_hhi(&[0.25; 4])), 25.0);
    }

    #[test]
    fn test_portfolio_weights() {
        assert_eq!(portfolio_weights(&[3.0, 1.0]), vec![0.75, 0.25]);
        assert_eq!(portfolio_weights(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    proptest! {
        #[test]
        fn prop_hhi_bounded_for_normalized_weights(values in prop::collection::vec(0.01f64..1_000.0, 1..12)) {
            let weights = portfolio_weights(&values);
            let hhi = compute_hhi(&weights);
            prop_assert!(hhi <= 1.0 + 1e-9);
            prop_assert!(hhi >= 1.0 / values.len() as f64 - 1e-9);
        }

        #[test]
        fn prop_var_score_in_range(
            returns in prop::collection::vec(-0.5f64..0.5, 3..40),
            value in 1.0f64..1e7,
        ) {
            let report = calculate_var(value, &[1.0], &[returns], 1.65).unwrap();
            prop_assert!(report.risk_score >= 0.0);
            prop_assert!(report.risk_score <= 100.0);
        }
    }
}
