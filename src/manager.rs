use crate::analysis::Analyzer;
use crate::config::Config;
use crate::sheet::{Cells, NavKey, Sheet, navigate};
use crate::store::Store;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// A lab directory: its config, stored cells and results.
pub struct Manager {
    lab_dir: PathBuf,
    cfg: Config,
    store: Store,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(lab_dir: P) -> Result<Self> {
        let lab_dir = lab_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(lab_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        let store = Store::new(&lab_dir);

        Ok(Self {
            lab_dir,
            cfg,
            store,
        })
    }

    /// Reset every cell to its default value.
    pub fn init_cells(&self) -> Result<()> {
        let cells = self.cfg.sheet.default_cells();
        self.store
            .save(&self.cfg.app_key, &cells)
            .context("failed to save cells")?;
        log::info!("initialized {} cells", cells.len());
        Ok(())
    }

    pub fn set_cell(&self, id: &str, value: &str) -> Result<()> {
        self.check_cell(id)?;
        let mut cells = self.load_cells()?;
        cells.insert(id.to_string(), value.trim().to_string());
        self.store
            .save(&self.cfg.app_key, &cells)
            .context("failed to save cells")?;
        Ok(())
    }

    pub fn show_cells(&self) -> Result<String> {
        let cells = self.load_cells()?;
        Ok(Sheet::new(&self.cfg.sheet, &cells).render())
    }

    /// Id of the cell reached from `id` with `key`; `id` itself at the grid edge.
    pub fn move_from(&self, id: &str, key: NavKey) -> Result<String> {
        let layout = &self.cfg.sheet;
        let idx = self.check_cell(id)?;
        let target = match navigate(idx, key, layout.cols, layout.n_cells()) {
            Some(target) => target,
            None => {
                log::warn!("cannot move {key:?} from {id}");
                idx
            }
        };
        Ok(layout.cell_id(target / layout.cols, target % layout.cols))
    }

    pub fn analyze_cells(&self) -> Result<()> {
        let cells = self.load_cells()?;
        let analyzer = Analyzer::new(self.cfg.clone());

        let report = analyzer.analyze(&cells).context("failed to analyze cells")?;

        let results_file = self.results_file();
        analyzer
            .save_results(&report, &results_file)
            .context("failed to save results")?;
        log::info!("saved {results_file:?}");

        Ok(())
    }

    fn load_cells(&self) -> Result<Cells> {
        let stored = self
            .store
            .load(&self.cfg.app_key)
            .context("failed to load cells")?;
        Ok(self.cfg.sheet.overlay(stored))
    }

    fn check_cell(&self, id: &str) -> Result<usize> {
        match self.cfg.sheet.cell_index(id) {
            Some(idx) => Ok(idx),
            None => bail!("{id:?} is not a cell of the sheet"),
        }
    }

    fn results_file(&self) -> PathBuf {
        self.lab_dir.join("results.json")
    }
}
