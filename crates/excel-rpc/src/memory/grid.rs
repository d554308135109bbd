//! Reading and writing blocks of cells.
//!
//! Reads follow the automation binding's shape rules: one cell gives a
//! scalar, one row or one column gives a flat list, anything larger gives a
//! list of rows. Writes start at the top-left cell of the target and take the
//! shape of the written value.

use serde_json::Value;

use super::address::{Block, Cell};
use super::model::{CellData, SheetData};
use crate::adapter::FrameOptions;
use crate::error::{HostError, HostResult};
use crate::serialize::serialize;
use crate::value::{DataFrame, HostValue};

pub(crate) fn read_rows(sheet: &SheetData, block: Block) -> Vec<Vec<HostValue>> {
    (block.start.row..=block.end.row)
        .map(|row| {
            (block.start.col..=block.end.col)
                .map(|col| {
                    sheet
                        .cells
                        .get(&Cell::new(row, col))
                        .map(|c| c.value.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

pub(crate) fn read_values(sheet: &SheetData, block: Block) -> HostValue {
    shaped(block, read_rows(sheet, block))
}

pub(crate) fn read_formulas(sheet: &SheetData, block: Block) -> HostValue {
    let rows = (block.start.row..=block.end.row)
        .map(|row| {
            (block.start.col..=block.end.col)
                .map(|col| {
                    let text = sheet
                        .cells
                        .get(&Cell::new(row, col))
                        .map(formula_text)
                        .unwrap_or_default();
                    HostValue::Str(text)
                })
                .collect()
        })
        .collect();
    shaped(block, rows)
}

fn shaped(block: Block, mut rows: Vec<Vec<HostValue>>) -> HostValue {
    if block.is_single() {
        return rows
            .pop()
            .and_then(|mut row| row.pop())
            .unwrap_or_default();
    }
    if block.rows() == 1 || block.cols() == 1 {
        return HostValue::List(rows.into_iter().flatten().collect());
    }
    HostValue::List(rows.into_iter().map(HostValue::List).collect())
}

/// What the formula bar shows for a cell.
fn formula_text(cell: &CellData) -> String {
    if let Some(formula) = &cell.formula {
        return formula.clone();
    }
    match &cell.value {
        HostValue::Null => String::new(),
        HostValue::Bool(true) => "TRUE".to_string(),
        HostValue::Bool(false) => "FALSE".to_string(),
        other => match serialize(other) {
            Value::String(s) => s,
            json => json.to_string(),
        },
    }
}

pub(crate) fn clear(sheet: &mut SheetData, block: Block) {
    sheet.cells.retain(|cell, _| !block.contains(*cell));
}

/// Write `value` with its top-left corner at the top-left of `block`.
/// A scalar fills the whole block.
pub(crate) fn write_value(sheet: &mut SheetData, block: Block, value: HostValue) -> HostResult<()> {
    match value {
        HostValue::List(items) => {
            let rows = into_rows(items)?;
            write_rows(sheet, block.start, rows, Entry::Value)?;
        }
        HostValue::Array(array) => write_value(sheet, block, array.to_nested())?,
        HostValue::Frame(frame) => {
            let options = FrameOptions {
                header: true,
                index: true,
            };
            write_frame(sheet, block.start, &frame, options)?;
        }
        HostValue::Series(series) => {
            let rows = series
                .index()
                .iter()
                .zip(series.values())
                .map(|(label, value)| vec![label.clone(), value.clone()])
                .collect();
            write_rows(sheet, block.start, rows, Entry::Value)?;
        }
        HostValue::Map(_) => {
            return Err(HostError::invalid_argument(
                "a mapping cannot be written to a range",
            ))
        }
        scalar => {
            let cell_value = to_cell(scalar)?;
            for cell in block.cells() {
                put(sheet, cell, cell_value.clone(), Entry::Value);
            }
        }
    }
    Ok(())
}

/// Like [`write_value`], but text is entered as formulas.
pub(crate) fn write_formula(
    sheet: &mut SheetData,
    block: Block,
    formula: HostValue,
) -> HostResult<()> {
    match formula {
        HostValue::List(items) => {
            let rows = into_rows(items)?;
            write_rows(sheet, block.start, rows, Entry::Formula)?;
        }
        single => {
            let cell_value = to_cell(single)?;
            for cell in block.cells() {
                put(sheet, cell, cell_value.clone(), Entry::Formula);
            }
        }
    }
    Ok(())
}

pub(crate) fn write_frame(
    sheet: &mut SheetData,
    start: Cell,
    frame: &DataFrame,
    options: FrameOptions,
) -> HostResult<Block> {
    let mut rows = Vec::with_capacity(frame.index().len() + 1);
    if options.header {
        let mut header = Vec::with_capacity(frame.columns().len() + 1);
        if options.index {
            header.push(HostValue::Null);
        }
        header.extend(frame.columns().iter().cloned());
        rows.push(header);
    }
    for (label, cells) in frame.index().iter().zip(frame.rows()) {
        let mut row = Vec::with_capacity(cells.len() + 1);
        if options.index {
            row.push(label.clone());
        }
        row.extend(cells.iter().cloned());
        rows.push(row);
    }
    write_rows(sheet, start, rows, Entry::Value)
}

pub(crate) fn read_frame(
    sheet: &SheetData,
    block: Block,
    options: FrameOptions,
) -> HostResult<DataFrame> {
    let mut rows = read_rows(sheet, block);

    let mut columns = if options.header && !rows.is_empty() {
        rows.remove(0)
    } else {
        (0..block.cols() as i64).map(HostValue::Int).collect()
    };

    if options.index {
        if !columns.is_empty() {
            columns.remove(0);
        }
        let mut index = Vec::with_capacity(rows.len());
        for row in &mut rows {
            index.push(if row.is_empty() { HostValue::Null } else { row.remove(0) });
        }
        DataFrame::new(index, columns, rows)
    } else {
        DataFrame::from_rows(columns, rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Value,
    Formula,
}

fn into_rows(items: Vec<HostValue>) -> HostResult<Vec<Vec<HostValue>>> {
    let nested = items.iter().filter(|i| matches!(i, HostValue::List(_))).count();
    if nested == 0 {
        return Ok(vec![items]);
    }
    if nested != items.len() {
        return Err(HostError::invalid_argument(
            "a 2-D value must contain only rows",
        ));
    }
    let rows: Vec<Vec<HostValue>> = items
        .into_iter()
        .map(|i| match i {
            HostValue::List(row) => row,
            _ => Vec::new(),
        })
        .collect();
    let width = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != width) {
        return Err(HostError::invalid_argument(
            "all rows of a 2-D value must have the same length",
        ));
    }
    Ok(rows)
}

fn write_rows(
    sheet: &mut SheetData,
    start: Cell,
    rows: Vec<Vec<HostValue>>,
    entry: Entry,
) -> HostResult<Block> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let block = Block::sized(start, rows.len() as u32, width as u32)?;
    let cells = rows
        .into_iter()
        .map(|row| row.into_iter().map(to_cell).collect::<HostResult<Vec<_>>>())
        .collect::<HostResult<Vec<_>>>()?;
    for (r, row) in cells.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            let cell = Cell::new(start.row + r as u32, start.col + c as u32);
            put(sheet, cell, value, entry);
        }
    }
    Ok(block)
}

/// Only scalars fit in a cell. Opaque values are stored as their text.
fn to_cell(value: HostValue) -> HostResult<HostValue> {
    match value {
        HostValue::Null
        | HostValue::Bool(_)
        | HostValue::Int(_)
        | HostValue::Float(_)
        | HostValue::Str(_)
        | HostValue::Date(_)
        | HostValue::DateTime(_) => Ok(value),
        HostValue::Scalar(s) => Ok(HostValue::from(s.to_json())),
        HostValue::Object(o) => Ok(HostValue::Str(o.to_string())),
        HostValue::Handle(h) => Ok(HostValue::Str(h.attributes().to_string())),
        HostValue::List(_)
        | HostValue::Map(_)
        | HostValue::Array(_)
        | HostValue::Frame(_)
        | HostValue::Series(_) => Err(HostError::invalid_argument(
            "a cell can only hold a single value",
        )),
    }
}

fn put(sheet: &mut SheetData, cell: Cell, value: HostValue, entry: Entry) {
    let data = match value {
        HostValue::Null => {
            sheet.cells.remove(&cell);
            return;
        }
        HostValue::Str(text) if text.starts_with('=') => CellData {
            value: HostValue::Null,
            formula: Some(text),
        },
        HostValue::Str(text) if entry == Entry::Formula => CellData {
            value: parse_constant(text),
            formula: None,
        },
        other => CellData {
            value: other,
            formula: None,
        },
    };
    sheet.cells.insert(cell, data);
}

/// Text typed into the formula bar that is not a formula.
fn parse_constant(text: String) -> HostValue {
    if let Ok(n) = text.parse::<i64>() {
        return HostValue::Int(n);
    }
    if let Ok(x) = text.parse::<f64>() {
        if x.is_finite() {
            return HostValue::Float(x);
        }
    }
    match text.to_ascii_uppercase().as_str() {
        "TRUE" => HostValue::Bool(true),
        "FALSE" => HostValue::Bool(false),
        _ => HostValue::Str(text),
    }
}
