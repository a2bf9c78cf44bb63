// Excel import (xlsx, xls, xlsb, ods) and the three result workbooks

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use stockfern_recon::model::{AuditLogEntry, CandidateRecord, QuarantineRecord};

use crate::catalog::{CatalogSheet, Cell};
use crate::{IoError, MAX_SHEET_NAME_LEN};

/// Second sheet of the result workbook.
pub const EXTRACT_SHEET_NAME: &str = "PDF_Extract";

pub const EXTRACT_HEADERS: [&str; 5] = ["full", "qty", "file", "page", "color_guess"];
pub const LOG_HEADERS: [&str; 4] = ["PDF_SKU", "Matched_SKU", "Color", "Confidence(%)"];
pub const UNKNOWN_HEADERS: [&str; 4] = ["full", "color", "qty", "file"];

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Load one worksheet. `sheet` picks it by name; a missing or unknown name
/// falls back to the first sheet.
pub fn import_sheet(path: &Path, sheet: Option<&str>) -> Result<CatalogSheet, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::read(path, e))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let name = match sheet {
        Some(wanted) if sheet_names.iter().any(|n| n == wanted) => wanted.to_string(),
        other => {
            let first = sheet_names
                .first()
                .cloned()
                .ok_or_else(|| IoError::read(path, "workbook contains no sheets"))?;
            if let Some(wanted) = other {
                log::warn!(
                    "{}: no sheet named '{wanted}', using '{first}'",
                    path.display()
                );
            }
            first
        }
    };
    log::debug!("{}: reading sheet '{name}'", path.display());

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| IoError::read(path, format!("sheet '{name}': {e}")))?;

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_from_data));
        while cells.last().is_some_and(Cell::is_empty) {
            cells.pop();
        }
        rows.push(cells);
    }
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }

    Ok(CatalogSheet::new(name, rows))
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Excel-safe sheet name: forbidden characters replaced, capped at 31 chars,
/// never colliding with the extract sheet.
pub fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .collect();
    let cleaned: String = cleaned
        .trim_matches('\'')
        .trim()
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else if cleaned.eq_ignore_ascii_case(EXTRACT_SHEET_NAME) {
        "Catalog".to_string()
    } else {
        cleaned
    }
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            ws.write_string(row, col, s.as_str())?;
        }
        Cell::Number(n) => {
            ws.write_number(row, col, *n)?;
        }
    }
    Ok(())
}

fn write_headers(ws: &mut Worksheet, headers: &[&str]) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    Ok(())
}

/// Header row plus one row of cells per record.
fn write_table(ws: &mut Worksheet, headers: &[&str], rows: impl Iterator<Item = Vec<Cell>>) -> Result<(), XlsxError> {
    write_headers(ws, headers)?;
    for (i, row) in rows.enumerate() {
        for (col, cell) in row.iter().enumerate() {
            write_cell(ws, (i + 1) as u32, col as u16, cell)?;
        }
    }
    Ok(())
}

fn text(s: &str) -> Cell {
    if s.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(s.to_string())
    }
}

/// Updated catalog (headerless, as loaded) followed by the extracted
/// candidates on [`EXTRACT_SHEET_NAME`].
pub fn export_result_workbook(
    catalog: &CatalogSheet,
    candidates: &[CandidateRecord],
    path: &Path,
) -> Result<(), IoError> {
    let save = || -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();

        let ws = workbook.add_worksheet().set_name(sheet_name(&catalog.name))?;
        for (r, row) in catalog.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                write_cell(ws, r as u32, c as u16, cell)?;
            }
        }

        let ws = workbook.add_worksheet().set_name(EXTRACT_SHEET_NAME)?;
        write_table(
            ws,
            &EXTRACT_HEADERS,
            candidates.iter().map(|c| {
                vec![
                    text(&c.context),
                    Cell::Number(c.quantity as f64),
                    text(&c.source_tag),
                    Cell::Number(c.page as f64),
                    text(&c.attribute_guess),
                ]
            }),
        )?;

        workbook.save(path)
    };
    save().map_err(|e| IoError::write(path, e))
}

/// One row per candidate: context, matched code, matched attribute, confidence.
pub fn export_log_workbook(entries: &[AuditLogEntry], path: &Path) -> Result<(), IoError> {
    let save = || -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        write_table(
            ws,
            &LOG_HEADERS,
            entries.iter().map(|e| {
                vec![
                    text(&e.context),
                    text(&e.matched_code),
                    text(&e.matched_attribute),
                    Cell::Number(f64::from(e.confidence)),
                ]
            }),
        )?;
        workbook.save(path)
    };
    save().map_err(|e| IoError::write(path, e))
}

/// Quarantined candidates for manual review.
pub fn export_unknown_workbook(records: &[QuarantineRecord], path: &Path) -> Result<(), IoError> {
    let save = || -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        write_table(
            ws,
            &UNKNOWN_HEADERS,
            records.iter().map(|q| {
                vec![
                    text(&q.context),
                    text(&q.attribute_guess),
                    Cell::Number(q.quantity as f64),
                    text(&q.source_tag),
                ]
            }),
        )?;
        workbook.save(path)
    };
    save().map_err(|e| IoError::write(path, e))
}
