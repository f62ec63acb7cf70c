use crate::config::{Config, SampleAxis};
use crate::format::{Measurement, format_with_uncertainty};
use crate::sheet::{Cells, Sheet};
use crate::stats::{self, RegressionResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufWriter, path::Path};

/// Descriptive statistics of one sample.
#[derive(Debug, Serialize, Deserialize)]
pub struct SampleReport {
    pub header: Option<String>,
    pub n_valid: usize,
    pub mean: f64,
    pub sum: f64,
    pub sum_squares: f64,
    pub sem: f64,
    /// Mean with its standard error, rounded for reporting.
    pub result: Measurement,
}

impl SampleReport {
    fn new(header: Option<String>, sample: &[Option<f64>]) -> Self {
        let mean = stats::mean(sample);
        let sem = stats::std_error_of_mean(sample);
        Self {
            header,
            n_valid: stats::count_valid(sample),
            mean,
            sum: stats::sum(sample),
            sum_squares: stats::sum_squares(sample),
            sem,
            result: format_with_uncertainty(mean, sem),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegressionReport {
    pub x: usize,
    pub y: usize,
    pub fit: RegressionResult,
    /// Slope with its standard error, rounded for reporting.
    pub slope: Measurement,
    /// Intercept with its standard error, rounded for reporting.
    pub intercept: Measurement,
}

impl RegressionReport {
    fn new(x: usize, y: usize, fit: RegressionResult) -> Self {
        let (slope_se, intercept_se) = standard_errors(&fit);
        Self {
            x,
            y,
            slope: format_with_uncertainty(fit.slope, slope_se),
            intercept: format_with_uncertainty(fit.intercept, intercept_se),
            fit,
        }
    }
}

/// Standard errors of slope and intercept, recomputed from the raw aggregates.
///
/// Both are NaN with fewer than three pairs, where the residual variance is undefined.
fn standard_errors(fit: &RegressionResult) -> (f64, f64) {
    if fit.n < 3 {
        return (f64::NAN, f64::NAN);
    }
    let n = fit.n as f64;
    let s_xx = fit.sum_xx - fit.sum_x * fit.sum_x / n;
    let s_yy = fit.sum_yy - fit.sum_y * fit.sum_y / n;
    let s_xy = fit.sum_xy - fit.sum_x * fit.sum_y / n;
    let ss_res = (s_yy - fit.slope * s_xy).max(0.0);
    let slope_se = (ss_res / (n - 2.0) / s_xx).sqrt();
    let intercept_se = slope_se * (fit.sum_xx / n).sqrt();
    (slope_se, intercept_se)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Report {
    pub samples: Vec<SampleReport>,
    pub regression: Option<RegressionReport>,
}

/// Analyzes the cells of a lab according to its config.
pub struct Analyzer {
    cfg: Config,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn analyze(&self, cells: &Cells) -> Result<Report> {
        let layout = &self.cfg.sheet;
        let sheet = Sheet::new(layout, cells);

        let (samples, headers): (Vec<_>, &[String]) = match self.cfg.analysis.by {
            SampleAxis::Row => (
                (0..layout.rows).map(|row| sheet.row(row)).collect(),
                layout.row_headers.as_slice(),
            ),
            SampleAxis::Column => (
                (0..layout.cols).map(|col| sheet.column(col)).collect(),
                layout.col_headers.as_slice(),
            ),
        };

        let sample_reports = samples
            .iter()
            .enumerate()
            .map(|(idx, sample)| SampleReport::new(headers.get(idx).cloned(), sample))
            .collect();

        let regression = match self.cfg.analysis.regression() {
            Some((x, y)) => {
                let fit = stats::linear_regression(&samples[x], &samples[y])
                    .with_context(|| format!("failed to fit sample {y} against sample {x}"))?;
                log::info!("fitted slope {} with r = {}", fit.slope, fit.r);
                Some(RegressionReport::new(x, y, fit))
            }
            None => None,
        };

        Ok(Report {
            samples: sample_reports,
            regression,
        })
    }

    pub fn save_results<P: AsRef<Path>>(&self, report: &Report, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, report).context("failed to serialize report")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::sheet::SheetLayout;

    fn config(by: SampleAxis, x: Option<usize>, y: Option<usize>) -> Config {
        Config {
            app_key: "test".to_string(),
            sheet: SheetLayout {
                rows: 2,
                cols: 4,
                prefix: "L".to_string(),
                row_headers: vec!["x".to_string(), "y".to_string()],
                col_headers: vec![],
                default_values: vec![1.0, 2.0, 3.0, 4.0, 3.0, 5.0, 7.0, 9.0],
            },
            analysis: AnalysisConfig { by, x, y },
        }
    }

    #[test]
    fn row_samples_and_regression() {
        let cfg = config(SampleAxis::Row, Some(0), Some(1));
        let cells = cfg.sheet.default_cells();
        let report = Analyzer::new(cfg).analyze(&cells).expect("analysis failed");

        assert_eq!(report.samples.len(), 2);
        let x = &report.samples[0];
        assert_eq!(x.header.as_deref(), Some("x"));
        assert_eq!(x.n_valid, 4);
        assert_eq!(x.mean, 2.5);
        assert_eq!(x.sum, 10.0);
        assert_eq!(x.sum_squares, 30.0);

        let reg = report.regression.expect("missing regression");
        assert!((reg.fit.slope - 2.0).abs() < 1e-12);
        assert!((reg.fit.intercept - 1.0).abs() < 1e-12);
        assert!((reg.fit.r - 1.0).abs() < 1e-12);
        assert_eq!(reg.slope.uncertainty, "—");
    }

    #[test]
    fn column_samples_without_regression() {
        let cfg = config(SampleAxis::Column, None, None);
        let mut cells = cfg.sheet.default_cells();
        cells.insert("L5".to_string(), String::new());
        let report = Analyzer::new(cfg).analyze(&cells).expect("analysis failed");

        assert_eq!(report.samples.len(), 4);
        assert_eq!(report.samples[0].header, None);
        assert_eq!(report.samples[0].n_valid, 1);
        assert_eq!(report.samples[1].mean, 3.5);
        assert!(report.regression.is_none());
    }

    #[test]
    fn degenerate_regression_fails() {
        let cfg = config(SampleAxis::Row, Some(0), Some(1));
        let mut cells = cfg.sheet.default_cells();
        for id in ["L1", "L2", "L3", "L4"] {
            cells.insert(id.to_string(), "1".to_string());
        }
        assert!(Analyzer::new(cfg).analyze(&cells).is_err());
    }

    #[test]
    fn nan_entries_are_not_counted() {
        let report = SampleReport::new(None, &[Some(2.0), Some(f64::NAN), None, Some(4.0)]);
        assert_eq!(report.n_valid, 2);
        assert_eq!(report.mean, 3.0);
        assert_eq!(report.result.to_string(), "3 ± 1");
    }

    #[test]
    fn noisy_fit_has_finite_errors() {
        let fit = stats::linear_regression(
            &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
            &[Some(2.1), Some(3.9), Some(6.2), Some(7.8)],
        )
        .expect("regression failed");
        let (slope_se, intercept_se) = standard_errors(&fit);
        assert!(slope_se > 0.0 && slope_se < 0.2);
        assert!(intercept_se > slope_se);
    }
}
