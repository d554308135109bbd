//! A1-style cell references for the in-memory host.

use std::fmt;

use crate::error::{HostError, HostResult};

/// Number of rows in a worksheet.
pub const MAX_ROWS: u32 = 1_048_576;
/// Number of columns in a worksheet (A..XFD).
pub const MAX_COLS: u32 = 16_384;

/// A single cell, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse `A1`, `$A$1`, `a1` and the mixed forms.
    pub fn parse(text: &str) -> HostResult<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('$').unwrap_or(text);

        let letters_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if letters_end == 0 {
            return Err(bad_address(text, "missing column letters"));
        }
        let col = column_index(&rest[..letters_end])?;

        let digits = &rest[letters_end..];
        let digits = digits.strip_prefix('$').unwrap_or(digits);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad_address(text, "missing row number"));
        }
        let row: u32 = digits
            .parse()
            .map_err(|_| bad_address(text, "row number out of range"))?;
        if row == 0 || row > MAX_ROWS {
            return Err(bad_address(text, "row number out of range"));
        }

        Ok(Self { row: row - 1, col })
    }

    /// `$A$1` form.
    pub fn absolute(&self) -> String {
        format!("${}${}", column_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row + 1)
    }
}

/// A rectangular block of cells. `start` is always top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub start: Cell,
    pub end: Cell,
}

impl Block {
    pub fn new(a: Cell, b: Cell) -> Self {
        Self {
            start: Cell::new(a.row.min(b.row), a.col.min(b.col)),
            end: Cell::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn single(cell: Cell) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    /// Parse `A1`, `A1:B2` or `Sheet1!A1:B2` (the sheet prefix is ignored).
    pub fn parse(text: &str) -> HostResult<Self> {
        let (_, reference) = split_sheet(text);
        match reference.split_once(':') {
            Some((a, b)) => Ok(Self::new(Cell::parse(a)?, Cell::parse(b)?)),
            None => Ok(Self::single(Cell::parse(reference)?)),
        }
    }

    /// A block of `rows` x `cols` cells anchored at `start`.
    pub fn sized(start: Cell, rows: u32, cols: u32) -> HostResult<Self> {
        let end_row = start.row + rows.max(1) - 1;
        let end_col = start.col + cols.max(1) - 1;
        if end_row >= MAX_ROWS || end_col >= MAX_COLS {
            return Err(HostError::Range(format!(
                "{rows}x{cols} block at {start} runs off the sheet"
            )));
        }
        Ok(Self::new(start, Cell::new(end_row, end_col)))
    }

    pub fn rows(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let Block { start, end } = *self;
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| Cell::new(row, col)))
    }

    /// `$A$1:$B$2`, or `$A$1` for a single cell.
    pub fn absolute(&self) -> String {
        if self.is_single() {
            self.start.absolute()
        } else {
            format!("{}:{}", self.start.absolute(), self.end.absolute())
        }
    }
}

/// Split `Sheet1!A1` into its sheet name and reference.
pub fn split_sheet(text: &str) -> (Option<&str>, &str) {
    match text.trim().rsplit_once('!') {
        Some((sheet, reference)) => (Some(sheet.trim_matches('\'')), reference),
        None => (None, text.trim()),
    }
}

/// `0` → `A`, `26` → `AA`.
pub fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// `A` → `0`, `aa` → `26`.
pub fn column_index(letters: &str) -> HostResult<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return Err(bad_address(letters, "invalid column letters"));
    }
    let mut n: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(bad_address(letters, "invalid column letters"));
        }
        n = n * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
    }
    if n > MAX_COLS {
        return Err(bad_address(letters, "column out of range"));
    }
    Ok(n - 1)
}

fn bad_address(text: &str, reason: &str) -> HostError {
    HostError::Range(format!("Invalid address '{text}': {reason}"))
}
