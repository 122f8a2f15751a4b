//! Newey-West t-test of a mean.
//!
//! Regressing a series on a constant, the HAC variance of the estimated mean
//! with Bartlett kernel and `L` lags is
//!
//! ```text
//! Var(mean) = (1/T^2) * [ sum_t u_t^2 + 2 * sum_{l=1}^{L} w_l * sum_{t>l} u_t u_{t-l} ]
//! u_t = y_t - mean,  w_l = 1 - l / (L + 1)
//! ```
//!
//! The t-statistic is referred to a Student t distribution with `T - 1`
//! degrees of freedom.

use ndarray::{Array1, s};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::MathError;

/// Result of a HAC t-test that a mean is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanTest {
    /// Sample mean.
    pub mean: f64,
    /// HAC standard error of the mean.
    pub std_error: f64,
    /// `mean / std_error`.
    pub t_stat: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Observations used.
    pub n_obs: usize,
    /// Lag truncation used.
    pub lags: usize,
}

/// Bartlett kernel weight `1 - lag / (max_lag + 1)`, zero beyond `max_lag`.
#[must_use]
pub fn bartlett_weight(lag: usize, max_lag: usize) -> f64 {
    if lag == 0 {
        1.0
    } else if lag <= max_lag {
        1.0 - (lag as f64) / (max_lag as f64 + 1.0)
    } else {
        0.0
    }
}

/// Test whether the mean of `values` differs from zero.
///
/// Missing observations must be dropped by the caller.
///
/// # Errors
/// Returns `MathError::InsufficientData` with fewer than two observations.
pub fn newey_west_mean_test(values: &[f64], lags: usize) -> Result<MeanTest, MathError> {
    let n_obs = values.len();
    if n_obs < 2 {
        return Err(MathError::InsufficientData { required: 2, actual: n_obs });
    }

    let y = Array1::from_vec(values.to_vec());
    let t = n_obs as f64;
    let mean = y.sum() / t;
    let u = &y - mean;

    let mut s_hac = u.dot(&u);
    for lag in 1..=lags.min(n_obs - 1) {
        let cross = u.slice(s![lag..]).dot(&u.slice(s![..n_obs - lag]));
        s_hac += 2.0 * bartlett_weight(lag, lags) * cross;
    }

    let std_error = (s_hac / (t * t)).sqrt();
    let t_stat = mean / std_error;

    let dist = StudentsT::new(0.0, 1.0, t - 1.0)
        .map_err(|e| MathError::Distribution(e.to_string()))?;
    let p_value = if t_stat.is_nan() {
        f64::NAN
    } else if t_stat.is_infinite() {
        0.0
    } else {
        2.0 * (1.0 - dist.cdf(t_stat.abs()))
    };

    Ok(MeanTest { mean, std_error, t_stat, p_value, n_obs, lags })
}
