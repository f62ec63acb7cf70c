use serde::{Deserialize, Serialize};
use std::fmt;

const MISSING: &str = "—";

/// A value and its uncertainty, rounded for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: String,
    pub uncertainty: String,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ± {}", self.value, self.uncertainty)
    }
}

/// Round `uncertainty` to one significant digit and `value` to the same decimal place.
///
/// If either number is unusable the value is passed through unrounded and the
/// uncertainty is reported as missing. Non-finite values are spelled `NaN` and
/// `Infinity`.
pub fn format_with_uncertainty(value: f64, uncertainty: f64) -> Measurement {
    if !value.is_finite() || !uncertainty.is_finite() || uncertainty <= 0.0 {
        return Measurement {
            value: plain(value),
            uncertainty: MISSING.to_string(),
        };
    }

    let mut magnitude = uncertainty.log10().floor() as i32;
    let mut first_digit = (uncertainty / 10f64.powi(magnitude)).round();
    // A leading 9.5 or above rounds up into the next decade.
    if first_digit >= 10.0 {
        magnitude += 1;
        first_digit = 1.0;
    }

    let rounded_unc = first_digit * 10f64.powi(magnitude);
    let decimals = (-magnitude).max(0) as usize;

    Measurement {
        value: format!("{value:.decimals$}"),
        uncertainty: format!("{rounded_unc:.decimals$}"),
    }
}

fn plain(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{sign}Infinity")
    } else {
        value.to_string()
    }
}
