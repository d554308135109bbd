//! On-disk snapshot of an in-memory workbook.
//!
//! The format is JSON: sheet names in order, and for each sheet the non-empty
//! cells keyed by A1 address. Files that are not snapshots still open, as an
//! empty workbook.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::address::Cell;
use super::model::{BookData, CellData, SheetData, State};
use crate::error::HostResult;
use crate::serialize::serialize;
use crate::value::HostValue;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    sheets: Vec<SheetSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SheetSnapshot {
    name: String,
    #[serde(default)]
    cells: Map<String, Value>,
    #[serde(default)]
    formulas: Map<String, Value>,
}

pub(crate) fn write_book(book: &BookData, path: &Path) -> HostResult<()> {
    let snapshot = Snapshot {
        sheets: book.sheets.iter().map(snapshot_sheet).collect(),
    };
    let text = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| anyhow::anyhow!("encoding workbook '{}': {e}", book.name))?;
    fs::write(path, text)?;
    tracing::debug!("Saved workbook '{}' to {}", book.name, path.display());
    Ok(())
}

fn snapshot_sheet(sheet: &SheetData) -> SheetSnapshot {
    let mut cells = Map::new();
    let mut formulas = Map::new();
    for (cell, data) in &sheet.cells {
        if !data.value.is_null() {
            cells.insert(cell.to_string(), serialize(&data.value));
        }
        if let Some(formula) = &data.formula {
            formulas.insert(cell.to_string(), Value::String(formula.clone()));
        }
    }
    SheetSnapshot {
        name: sheet.name.clone(),
        cells,
        formulas,
    }
}

/// Sheets stored in `path`, or `None` when the file is not a snapshot.
pub(crate) fn read_sheets(state: &mut State, path: &Path) -> HostResult<Option<Vec<SheetData>>> {
    let bytes = fs::read(path)?;
    let Ok(snapshot) = serde_json::from_slice::<Snapshot>(&bytes) else {
        return Ok(None);
    };
    if snapshot.sheets.is_empty() {
        return Ok(None);
    }

    let mut sheets = Vec::with_capacity(snapshot.sheets.len());
    for stored in snapshot.sheets {
        let mut sheet = SheetData::new(state.next_id(), stored.name);
        for (address, value) in stored.cells {
            let cell = Cell::parse(&address)?;
            sheet.cells.entry(cell).or_default().value = HostValue::from(value);
        }
        for (address, formula) in stored.formulas {
            let cell = Cell::parse(&address)?;
            if let Value::String(text) = formula {
                sheet.cells.entry(cell).or_insert_with(CellData::default).formula = Some(text);
            }
        }
        sheets.push(sheet);
    }
    Ok(Some(sheets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let mut state = State::default();
        let mut book = state.new_book("report.xlsx".into(), None);
        let sheet = &mut book.sheets[0];
        sheet.cells.entry(Cell::new(0, 0)).or_default().value = HostValue::Int(7);
        sheet.cells.entry(Cell::new(1, 1)).or_default().formula = Some("=A1*2".into());

        write_book(&book, &path).unwrap();
        let sheets = read_sheets(&mut state, &path).unwrap().unwrap();

        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Sheet1");
        assert!(matches!(sheets[0].cells[&Cell::new(0, 0)].value, HostValue::Int(7)));
        assert_eq!(
            sheets[0].cells[&Cell::new(1, 1)].formula.as_deref(),
            Some("=A1*2")
        );
    }

    #[test]
    fn test_foreign_file_is_not_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.xlsx");
        fs::write(&path, b"PK\x03\x04 binary").unwrap();

        let mut state = State::default();
        assert!(read_sheets(&mut state, &path).unwrap().is_none());
    }
}
