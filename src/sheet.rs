//! Measurement grid layout, cell navigation and sample extraction.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw cell text keyed by cell id.
pub type Cells = BTreeMap<String, String>;

/// Shape and labelling of a measurement grid.
///
/// Cells are numbered row-major starting from 1, so a grid with prefix `L`
/// has ids `L1, L2, ...`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Number of rows.
    pub rows: usize,
    /// Number of cells per row.
    pub cols: usize,
    /// Prefix of every cell id.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Labels shown before each row (may be shorter than `rows`).
    #[serde(default)]
    pub row_headers: Vec<String>,
    /// Labels shown above the columns (may be shorter than `cols`).
    #[serde(default)]
    pub col_headers: Vec<String>,
    /// Initial cell values in row-major order (may be shorter than the grid).
    #[serde(default)]
    pub default_values: Vec<f64>,
}

fn default_prefix() -> String {
    "L".to_string()
}

impl SheetLayout {
    pub fn n_cells(&self) -> usize {
        self.rows * self.cols
    }

    pub fn cell_id(&self, row: usize, col: usize) -> String {
        format!("{}{}", self.prefix, row * self.cols + col + 1)
    }

    /// All cell ids in row-major order.
    pub fn cell_ids(&self) -> Vec<String> {
        (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| self.cell_id(row, col)))
            .collect()
    }

    /// Position of a cell id in row-major order.
    ///
    /// Only canonical ids are accepted, so `L04` or `L+4` are not cells.
    pub fn cell_index(&self, id: &str) -> Option<usize> {
        let num: usize = id.strip_prefix(&self.prefix)?.parse().ok()?;
        let idx = num.checked_sub(1).filter(|&idx| idx < self.n_cells())?;
        (self.cell_id(idx / self.cols, idx % self.cols) == id).then_some(idx)
    }

    /// Every cell with its default value, or empty text where none is given.
    pub fn default_cells(&self) -> Cells {
        self.cell_ids()
            .into_iter()
            .enumerate()
            .map(|(idx, id)| {
                let text = self
                    .default_values
                    .get(idx)
                    .map(|val| val.to_string())
                    .unwrap_or_default();
                (id, text)
            })
            .collect()
    }

    /// Stored cell text laid over the defaults.
    ///
    /// Stored ids that are not cells of this layout are dropped.
    pub fn overlay(&self, stored: Cells) -> Cells {
        let mut cells = self.default_cells();
        for (id, text) in stored {
            match cells.get_mut(&id) {
                Some(cell) => *cell = text,
                None => log::debug!("dropping stored cell {id:?}"),
            }
        }
        cells
    }
}

/// Keys that move the focus between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
}

/// Index of the cell reached from `idx` with `key`, if it lies inside the grid.
///
/// Left and right wrap between rows, as focus order does in a form.
pub fn navigate(idx: usize, key: NavKey, cols: usize, n_cells: usize) -> Option<usize> {
    let target = match key {
        NavKey::Up => idx.checked_sub(cols)?,
        NavKey::Down => idx + cols,
        NavKey::Left => idx.checked_sub(1)?,
        NavKey::Right | NavKey::Enter => idx + 1,
    };
    (target < n_cells).then_some(target)
}

/// Parse raw cell text into a sample entry.
pub fn parse_entry(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|val| val.is_finite())
}

/// A layout together with the current cell contents.
pub struct Sheet<'a> {
    layout: &'a SheetLayout,
    cells: &'a Cells,
}

impl<'a> Sheet<'a> {
    pub fn new(layout: &'a SheetLayout, cells: &'a Cells) -> Self {
        Self { layout, cells }
    }

    fn entry(&self, row: usize, col: usize) -> Option<f64> {
        self.text(row, col).and_then(parse_entry)
    }

    fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.cells
            .get(&self.layout.cell_id(row, col))
            .map(String::as_str)
    }

    pub fn row(&self, row: usize) -> Vec<Option<f64>> {
        (0..self.layout.cols)
            .map(|col| self.entry(row, col))
            .collect()
    }

    pub fn column(&self, col: usize) -> Vec<Option<f64>> {
        (0..self.layout.rows)
            .map(|row| self.entry(row, col))
            .collect()
    }

    /// Plain-text rendering of the grid with its headers.
    pub fn render(&self) -> String {
        let layout = self.layout;
        let has_row_headers = !layout.row_headers.is_empty();

        let mut lines: Vec<Vec<String>> = Vec::new();
        if !layout.col_headers.is_empty() {
            let mut line = Vec::new();
            if has_row_headers {
                line.push(String::new());
            }
            line.extend((0..layout.cols).map(|col| {
                layout.col_headers.get(col).cloned().unwrap_or_default()
            }));
            lines.push(line);
        }
        for row in 0..layout.rows {
            let mut line = Vec::new();
            if has_row_headers {
                line.push(layout.row_headers.get(row).cloned().unwrap_or_default());
            }
            line.extend((0..layout.cols).map(|col| {
                match self.text(row, col) {
                    Some(text) if !text.is_empty() => text.to_string(),
                    _ => "·".to_string(),
                }
            }));
            lines.push(line);
        }

        let n_fields = lines.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..n_fields)
            .map(|i_field| {
                lines
                    .iter()
                    .filter_map(|line| line.get(i_field))
                    .map(|field| field.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        for line in lines {
            let fields: Vec<_> = line
                .iter()
                .zip(&widths)
                .map(|(field, &width)| format!("{field:>width$}"))
                .collect();
            out.push_str(fields.join("  ").trim_end());
            out.push('\n');
        }
        out
    }
}
