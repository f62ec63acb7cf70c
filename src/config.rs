use crate::sheet::SheetLayout;
use crate::store::check_app_key;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Lab configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Key the cell contents are stored under.
    pub app_key: String,

    /// Measurement grid.
    pub sheet: SheetLayout,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Direction in which the grid is split into samples.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleAxis {
    /// Every row is a sample.
    #[default]
    Row,
    /// Every column is a sample.
    Column,
}

/// Analysis settings.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Whether samples are rows or columns.
    #[serde(default)]
    pub by: SampleAxis,
    /// Sample used as the regression abscissa.
    pub x: Option<usize>,
    /// Sample used as the regression ordinate.
    pub y: Option<usize>,
}

impl AnalysisConfig {
    /// The `(x, y)` sample indices, if a regression is requested.
    pub fn regression(&self) -> Option<(usize, usize)> {
        self.x.zip(self.y)
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Number of samples the grid splits into.
    pub fn n_samples(&self) -> usize {
        match self.analysis.by {
            SampleAxis::Row => self.sheet.rows,
            SampleAxis::Column => self.sheet.cols,
        }
    }

    fn validate(&self) -> Result<()> {
        check_app_key(&self.app_key).context("invalid application key")?;

        let sheet = &self.sheet;
        check_num(sheet.rows, 1..1000).context("invalid number of rows")?;
        check_num(sheet.cols, 1..1000).context("invalid number of columns")?;
        if sheet.prefix.is_empty() {
            bail!("cell id prefix must not be empty");
        }
        if sheet.prefix.ends_with(|c: char| c.is_ascii_digit()) {
            bail!("cell id prefix must not end with a digit");
        }
        check_num(sheet.row_headers.len(), 0..=sheet.rows)
            .context("invalid number of row headers")?;
        check_num(sheet.col_headers.len(), 0..=sheet.cols)
            .context("invalid number of column headers")?;
        check_num(sheet.default_values.len(), 0..=sheet.n_cells())
            .context("invalid number of default values")?;

        let analysis = &self.analysis;
        if analysis.x.is_some() != analysis.y.is_some() {
            bail!("regression needs both x and y");
        }
        if let Some((x, y)) = analysis.regression() {
            let n_samples = self.n_samples();
            check_num(x, 0..n_samples).context("invalid regression x")?;
            check_num(y, 0..n_samples).context("invalid regression y")?;
            if x == y {
                bail!("regression x and y must differ");
            }
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
