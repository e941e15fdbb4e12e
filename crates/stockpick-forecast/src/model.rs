//! Difference-model fitting.
//!
//! Both models work on first differences of the close, so the null
//! hypothesis is a random walk with drift. The autoregressive fit adds
//! lagged differences chosen from a fixed small grid.

use ndarray::{Array1, Array2};
use tracing::debug;

/// Lag counts tried by the autoregressive order search.
pub const LAG_GRID: [usize; 4] = [1, 2, 3, 7];

/// A fitted model over first differences.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffModelFit {
    /// Intercept (equals the drift for the naive model).
    pub intercept: f64,
    /// AR coefficients over the most recent differences, newest first.
    /// Empty for the naive-drift model.
    pub coefficients: Vec<f64>,
    /// Stddev of in-sample residuals (n−1 denominator).
    pub residual_stddev: f64,
    /// In-sample mean squared error.
    pub mse: f64,
}

impl DiffModelFit {
    /// Predict the next `steps` differences, recursing on predictions.
    /// `history` holds observed differences in time order.
    pub fn forecast_diffs(&self, history: &[f64], steps: usize) -> Vec<f64> {
        let mut recent: Vec<f64> = history.to_vec();
        let mut predicted = Vec::with_capacity(steps);

        for _ in 0..steps {
            let mut value = self.intercept;
            for (lag, coefficient) in self.coefficients.iter().enumerate() {
                // coefficients[0] applies to the newest difference; a
                // missing lag contributes nothing.
                if let Some(index) = recent.len().checked_sub(lag + 1) {
                    value += coefficient * recent[index];
                }
            }
            recent.push(value);
            predicted.push(value);
        }
        predicted
    }
}

/// Fit the naive-drift model: every difference is predicted by the mean
/// difference.
pub fn fit_naive_drift(diffs: &[f64]) -> DiffModelFit {
    let n = diffs.len();
    let drift = if n == 0 {
        0.0
    } else {
        diffs.iter().sum::<f64>() / n as f64
    };

    let residuals: Vec<f64> = diffs.iter().map(|d| d - drift).collect();
    DiffModelFit {
        intercept: drift,
        coefficients: Vec::new(),
        residual_stddev: stddev(&residuals),
        mse: mean_square(&residuals),
    }
}

/// Fit an AR(p) model over differences, selecting `p` from [`LAG_GRID`]
/// by minimum in-sample MSE. Falls back to the drift-only fit when no
/// grid entry has enough data or every system is singular.
pub fn fit_autoregressive(diffs: &[f64]) -> DiffModelFit {
    let mut best: Option<DiffModelFit> = None;

    for &lag in &LAG_GRID {
        let Some(candidate) = fit_ar_with_lag(diffs, lag) else {
            continue;
        };
        let better = best
            .as_ref()
            .is_none_or(|current| candidate.mse < current.mse);
        if better {
            debug!(lag, mse = candidate.mse, "autoregressive order candidate");
            best = Some(candidate);
        }
    }

    best.unwrap_or_else(|| fit_naive_drift(diffs))
}

/// Least-squares AR(p) fit with intercept. `None` when there is too
/// little data or the normal equations are singular.
fn fit_ar_with_lag(diffs: &[f64], lag: usize) -> Option<DiffModelFit> {
    let rows = diffs.len().checked_sub(lag)?;
    // Require a few more rows than parameters so the fit is not vacuous.
    if rows < lag + 3 {
        return None;
    }

    let cols = lag + 1;
    let mut x = Array2::<f64>::zeros((rows, cols));
    let mut y = Array1::<f64>::zeros(rows);

    for row in 0..rows {
        let t = row + lag;
        x[[row, 0]] = 1.0;
        for k in 0..lag {
            // Column k+1 holds the difference k+1 steps back.
            x[[row, k + 1]] = diffs[t - 1 - k];
        }
        y[row] = diffs[t];
    }

    let xtx = x.t().dot(&x);
    let xty = x.t().dot(&y);
    let beta = solve_symmetric(xtx, xty)?;

    let mut residuals = Vec::with_capacity(rows);
    for row in 0..rows {
        let mut fitted = beta[0];
        for k in 0..lag {
            fitted += beta[k + 1] * x[[row, k + 1]];
        }
        residuals.push(y[row] - fitted);
    }

    Some(DiffModelFit {
        intercept: beta[0],
        coefficients: beta.iter().skip(1).copied().collect(),
        residual_stddev: stddev(&residuals),
        mse: mean_square(&residuals),
    })
}

/// Gaussian elimination with partial pivoting. `None` on a singular
/// system (pivot below tolerance).
fn solve_symmetric(a: Array2<f64>, b: Array1<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let mut m = a;
    let mut rhs = b;

    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_value = m[[col, col]].abs();
        for row in (col + 1)..n {
            let value = m[[row, col]].abs();
            if value > pivot_value {
                pivot_row = row;
                pivot_value = value;
            }
        }
        if pivot_value < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for k in 0..n {
                let tmp = m[[col, k]];
                m[[col, k]] = m[[pivot_row, k]];
                m[[pivot_row, k]] = tmp;
            }
            rhs.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            for k in col..n {
                m[[row, k]] -= factor * m[[col, k]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let mut value = rhs[row];
        for k in (row + 1)..n {
            value -= m[[row, k]] * solution[k];
        }
        solution[row] = value / m[[row, row]];
    }
    Some(solution)
}

/// Two-sided normal quantile for a confidence level, e.g. 0.95 → ≈1.96.
///
/// Uses the Beasley-Springer-Moro rational approximation of the inverse
/// normal CDF; absolute error is far below anything visible in an
/// interval bound.
pub fn normal_quantile_two_sided(confidence: f64) -> f64 {
    let p = 0.5 + confidence / 2.0;
    inverse_normal_cdf(p)
}

fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 4] = [
        2.50662823884,
        -18.61500062529,
        41.39119773534,
        -25.44106049637,
    ];
    const B: [f64; 4] = [
        -8.47351093090,
        23.08336743743,
        -21.06224101826,
        3.13082909833,
    ];
    const C: [f64; 9] = [
        0.3374754822726147,
        0.9761690190917186,
        0.1607979714918209,
        0.0276438810333863,
        0.0038405729373609,
        0.0003951896511919,
        0.0000321767881768,
        0.0000002888167364,
        0.0000003960315187,
    ];

    let u = p - 0.5;
    if u.abs() < 0.42 {
        let r = u * u;
        let numerator = u * (((A[3] * r + A[2]) * r + A[1]) * r + A[0]);
        let denominator = (((B[3] * r + B[2]) * r + B[1]) * r + B[0]) * r + 1.0;
        return numerator / denominator;
    }

    let mut r = if u < 0.0 { p } else { 1.0 - p };
    r = (-r.ln()).ln();
    let mut value = C[0];
    let mut power = 1.0;
    for coefficient in &C[1..] {
        power *= r;
        value += coefficient * power;
    }
    if u < 0.0 {
        -value
    } else {
        value
    }
}

pub(crate) fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

fn mean_square(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64
}
