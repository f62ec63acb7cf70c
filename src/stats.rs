use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the paired statistics.
#[derive(Debug, PartialEq, Error)]
pub enum StatsError {
    #[error("sample lengths differ: {0} != {1}")]
    LengthMismatch(usize, usize),

    #[error("all x values are identical, slope is undefined")]
    DegenerateInput,
}

/// Ordinary least squares fit of `y = slope * x + intercept`.
///
/// The raw aggregates are kept so callers can derive further quantities
/// without scanning the data again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
    pub x_mean: f64,
    pub y_mean: f64,
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_xx: f64,
    pub sum_yy: f64,
    pub sum_xy: f64,
    /// Number of complete pairs.
    pub n: usize,
}

fn valid(sample: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    sample.iter().flatten().copied().filter(|val| !val.is_nan())
}

fn valid_pairs<'a>(
    a: &'a [Option<f64>],
    b: &'a [Option<f64>],
) -> Result<impl Iterator<Item = (f64, f64)> + 'a, StatsError> {
    if a.len() != b.len() {
        return Err(StatsError::LengthMismatch(a.len(), b.len()));
    }
    Ok(a.iter().zip(b).filter_map(|pair| match pair {
        (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => Some((*a, *b)),
        _ => None,
    }))
}

/// Arithmetic mean of the valid entries, 0 if there are none.
pub fn mean(sample: &[Option<f64>]) -> f64 {
    let (n_vals, sum) = valid(sample).fold((0, 0.0), |(n, s), val| (n + 1, s + val));
    if n_vals == 0 {
        return 0.0;
    }
    sum / n_vals as f64
}

/// Number of valid entries.
pub fn count_valid(sample: &[Option<f64>]) -> usize {
    valid(sample).count()
}

pub fn sum(sample: &[Option<f64>]) -> f64 {
    valid(sample).sum()
}

pub fn sum_squares(sample: &[Option<f64>]) -> f64 {
    valid(sample).map(|val| val * val).sum()
}

/// Sum of index-paired products, skipping pairs with an invalid side.
pub fn sum_products(a: &[Option<f64>], b: &[Option<f64>]) -> Result<f64, StatsError> {
    Ok(valid_pairs(a, b)?.map(|(a, b)| a * b).sum())
}

/// Standard error of the mean, using the Bessel-corrected standard deviation.
///
/// Returns 0 when fewer than two valid entries exist.
pub fn std_error_of_mean(sample: &[Option<f64>]) -> f64 {
    let vals: Vec<_> = valid(sample).collect();
    let n_vals = vals.len();
    if n_vals < 2 {
        return 0.0;
    }
    let mean = vals.iter().sum::<f64>() / n_vals as f64;
    let var = vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n_vals - 1) as f64;
    (var / n_vals as f64).sqrt()
}

/// Least squares regression of `y` on `x` over the complete pairs.
///
/// # Errors
/// Returns [`StatsError::LengthMismatch`] if the samples differ in length and
/// [`StatsError::DegenerateInput`] if the x values have no spread.
pub fn linear_regression(
    x: &[Option<f64>],
    y: &[Option<f64>],
) -> Result<RegressionResult, StatsError> {
    let (xs, ys): (Vec<_>, Vec<_>) = valid_pairs(x, y)?
        .map(|(x, y)| (Some(x), Some(y)))
        .unzip();
    let n = xs.len();
    let sum_x = sum(&xs);
    let sum_y = sum(&ys);
    let sum_xx = sum_squares(&xs);
    let sum_yy = sum_squares(&ys);
    let sum_xy = sum_products(&xs, &ys)?;

    // Rounding leaves residue in the denominator for repeated non-dyadic x.
    let n_f = n as f64;
    let denom = n_f * sum_xx - sum_x * sum_x;
    if xs.iter().all(|x| Some(x) == xs.first()) || denom <= 0.0 {
        return Err(StatsError::DegenerateInput);
    }

    let x_mean = mean(&xs);
    let y_mean = mean(&ys);
    let slope = (n_f * sum_xy - sum_x * sum_y) / denom;
    let intercept = y_mean - slope * x_mean;

    let x_var = sum_xx - sum_x * sum_x / n_f;
    let y_var = sum_yy - sum_y * sum_y / n_f;
    let cov = sum_xy - sum_x * sum_y / n_f;
    let r = if x_var * y_var == 0.0 {
        0.0
    } else {
        cov / (x_var * y_var).sqrt()
    };

    Ok(RegressionResult {
        slope,
        intercept,
        r,
        x_mean,
        y_mean,
        sum_x,
        sum_y,
        sum_xx,
        sum_yy,
        sum_xy,
        n,
    })
}
