// Catalog sheet: a grid of cells plus the engine's view of it

use std::path::Path;

use stockfern_recon::config::CatalogLayout;
use stockfern_recon::model::CatalogRow;
use stockfern_recon::ReconError;

use crate::IoError;

/// One spreadsheet cell, kept close enough to the source to write it back.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Text as a user would read it; integral numbers lose the `.0`.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }

    /// Lenient quantity: numbers truncate, numeric text parses, anything
    /// else counts as 0.
    pub fn as_quantity(&self) -> i64 {
        match self {
            Cell::Empty => 0,
            Cell::Number(n) => truncate(*n),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(truncate))
                    .unwrap_or(0)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn truncate(n: f64) -> i64 {
    if n.is_finite() {
        n.trunc() as i64
    } else {
        0
    }
}

/// The catalog worksheet as loaded: every row and column, including the
/// ones the engine never looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl CatalogSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Load by extension: delimited text through the CSV reader, workbooks
    /// through calamine. `sheet` only applies to workbooks; a missing or
    /// unknown name falls back to the first sheet.
    pub fn load(path: &Path, sheet: Option<&str>) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" => {
                let rows = crate::csv::import_rows(path, None)?;
                Ok(Self::new(file_stem(path), rows))
            }
            "tsv" => {
                let rows = crate::csv::import_rows(path, Some(b'\t'))?;
                Ok(Self::new(file_stem(path), rows))
            }
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => crate::xlsx::import_sheet(path, sheet),
            other => Err(IoError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{other}")
            })),
        }
    }

    /// Widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    /// Engine rows for everything below the header, in sheet order.
    pub fn catalog_rows(&self, layout: &CatalogLayout) -> Result<Vec<CatalogRow>, ReconError> {
        let data_rows = self.rows.len().saturating_sub(layout.header_rows);
        if data_rows == 0 {
            return Ok(Vec::new());
        }
        let width = self.width();
        if width <= layout.code {
            return Err(ReconError::malformed(
                self.name.clone(),
                0,
                format!(
                    "sheet has {width} column(s), code column {} is missing",
                    layout.code + 1
                ),
            ));
        }

        let rows = (layout.header_rows..self.rows.len())
            .map(|r| {
                CatalogRow::new(
                    self.cell(r, layout.code).display(),
                    self.cell(r, layout.attribute).display(),
                    self.cell(r, layout.quantity).as_quantity(),
                )
            })
            .collect::<Vec<_>>();
        log::debug!("sheet '{}': {} catalog rows", self.name, rows.len());
        Ok(rows)
    }

    /// Copy of the sheet with the quantity column replaced by `rows`'
    /// quantities. Every other cell is kept as loaded.
    pub fn with_quantities(&self, layout: &CatalogLayout, rows: &[CatalogRow]) -> CatalogSheet {
        let mut out = self.clone();
        for (sheet_row, row) in out.rows.iter_mut().skip(layout.header_rows).zip(rows) {
            if sheet_row.len() <= layout.quantity {
                sheet_row.resize(layout.quantity + 1, Cell::Empty);
            }
            sheet_row[layout.quantity] = Cell::Number(row.quantity as f64);
        }
        out
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string()
}
