use crate::sheet::Cells;
use anyhow::{Context, Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Flat key-value storage of cell contents, one TOML file per application key.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Write `cells` under `app_key`, replacing any previous contents.
    pub fn save(&self, app_key: &str, cells: &Cells) -> Result<()> {
        let file = self.entry_file(app_key)?;
        let contents = toml::to_string(cells).context("failed to serialize cells")?;
        fs::write(&file, contents).with_context(|| format!("failed to write {file:?}"))?;
        log::info!("saved cells under {app_key:?}");
        Ok(())
    }

    /// Read the cells stored under `app_key`.
    ///
    /// A missing entry is empty. An unreadable entry is logged and treated as
    /// empty as well.
    pub fn load(&self, app_key: &str) -> Result<Cells> {
        let file = self.entry_file(app_key)?;
        if !file.exists() {
            return Ok(Cells::new());
        }

        let cells = fs::read_to_string(&file)
            .with_context(|| format!("failed to read {file:?}"))
            .and_then(|contents| toml::from_str(&contents).context("failed to parse cells"));
        match cells {
            Ok(cells) => {
                log::info!("loaded cells under {app_key:?}");
                Ok(cells)
            }
            Err(error) => {
                log::warn!("ignoring stored cells under {app_key:?}: {error:#}");
                Ok(Cells::new())
            }
        }
    }

    fn entry_file(&self, app_key: &str) -> Result<PathBuf> {
        check_app_key(app_key)?;
        Ok(self.dir.join(format!("{app_key}.toml")))
    }
}

pub fn check_app_key(app_key: &str) -> Result<()> {
    if app_key.is_empty() {
        bail!("application key must not be empty");
    }
    if !app_key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        || app_key.starts_with('.')
    {
        bail!("application key {app_key:?} must only contain ASCII letters, digits, '-', '_' and '.'");
    }
    Ok(())
}
