//! Plain data behind [`super::MemoryHost`]: apps own books, books own
//! sheets, sheets own cells and charts.
//!
//! Every object carries a stable id so handles can find it again after other
//! objects are added or removed.

use std::collections::BTreeMap;
use std::path::PathBuf;

use excel_rpc_protocol::{ChartRef, SheetRef};

use super::address::{Block, Cell};
use crate::adapter::{AxisSettings, CalculationMode, SheetPath};
use crate::error::{HostError, HostResult, Target};
use crate::platform::LegendPosition;
use crate::value::HostValue;

pub(crate) const DEFAULT_VERSION: &str = "16.0";
pub(crate) const DEFAULT_ROW_HEIGHT: f64 = 15.0;
pub(crate) const DEFAULT_COLUMN_WIDTH: f64 = 8.43;
pub(crate) const DEFAULT_CHART_TYPE: &str = "column_clustered";
const FIRST_PID: u32 = 4000;

/// Where a sheet lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Loc {
    pub pid: u32,
    pub book: u64,
    pub sheet: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CellData {
    pub value: HostValue,
    /// Formula text as entered, when the cell holds one.
    pub formula: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct ChartData {
    pub id: u64,
    pub name: String,
    pub chart_type: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub source: Option<String>,
    pub title: Option<String>,
    pub has_legend: bool,
    pub legend_position: Option<LegendPosition>,
    pub axis_x: AxisSettings,
    pub axis_y: AxisSettings,
}

#[derive(Debug, Clone)]
pub(crate) struct SheetData {
    pub id: u64,
    pub name: String,
    pub cells: BTreeMap<Cell, CellData>,
    pub charts: Vec<ChartData>,
    pub chart_counter: u32,
}

impl SheetData {
    pub fn new(id: u64, name: String) -> Self {
        Self {
            id,
            name,
            cells: BTreeMap::new(),
            charts: Vec::new(),
            chart_counter: 0,
        }
    }

    /// Smallest block holding every non-empty cell, `A1` when there is none.
    pub fn used_block(&self) -> Block {
        let mut filled = self
            .cells
            .iter()
            .filter(|(_, c)| !c.value.is_null() || c.formula.is_some())
            .map(|(cell, _)| *cell);
        let Some(first) = filled.next() else {
            return Block::single(Cell::new(0, 0));
        };
        filled.fold(Block::single(first), |block, cell| {
            Block::new(
                Cell::new(block.start.row.min(cell.row), block.start.col.min(cell.col)),
                Cell::new(block.end.row.max(cell.row), block.end.col.max(cell.col)),
            )
        })
    }

    pub fn chart_position(&self, chart: &ChartRef) -> HostResult<usize> {
        let found = match chart {
            ChartRef::Index(i) => Some(*i as usize).filter(|i| *i < self.charts.len()),
            ChartRef::Name(name) => self.charts.iter().position(|c| &c.name == name),
        };
        found.ok_or_else(|| {
            HostError::not_found(Target::Chart, format!("Chart '{chart}' not found"))
        })
    }

    pub fn chart_by_id(&self, id: u64) -> Option<&ChartData> {
        self.charts.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BookData {
    pub id: u64,
    pub name: String,
    /// Absolute file path once the book has been opened from or saved to
    /// disk.
    pub path: Option<PathBuf>,
    pub read_only: bool,
    pub sheets: Vec<SheetData>,
    pub active_sheet: u64,
    pub sheet_counter: u32,
}

impl BookData {
    pub fn fullname(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| self.name.clone(), |p| p.display().to_string())
    }

    pub fn sheet_position(&self, sheet: &SheetRef) -> HostResult<usize> {
        let found = match sheet {
            SheetRef::Index(i) => Some(*i as usize).filter(|i| *i < self.sheets.len()),
            SheetRef::Name(name) => self
                .sheets
                .iter()
                .position(|s| s.name.eq_ignore_ascii_case(name)),
        };
        found.ok_or_else(|| {
            HostError::not_found(
                Target::Sheet,
                format!("Sheet '{sheet}' not found in workbook '{}'", self.name),
            )
        })
    }

    pub fn has_sheet_named(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn sheet_by_id(&self, id: u64) -> Option<&SheetData> {
        self.sheets.iter().find(|s| s.id == id)
    }

    pub fn sheet_by_id_mut(&mut self, id: u64) -> Option<&mut SheetData> {
        self.sheets.iter_mut().find(|s| s.id == id)
    }

    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.fullname() == name
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AppData {
    pub pid: u32,
    pub version: String,
    pub visible: bool,
    pub calculation: CalculationMode,
    pub screen_updating: bool,
    pub display_alerts: bool,
    pub books: Vec<BookData>,
    pub book_counter: u32,
}

#[derive(Debug, Default)]
pub(crate) struct State {
    next_id: u64,
    next_pid: u32,
    pub apps: Vec<AppData>,
    /// The most recently created app that is still running.
    pub active_app: Option<u32>,
}

impl State {
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_app(&mut self, visible: bool) -> u32 {
        let pid = FIRST_PID.max(self.next_pid);
        self.next_pid = pid + 1;
        self.apps.push(AppData {
            pid,
            version: DEFAULT_VERSION.to_string(),
            visible,
            calculation: CalculationMode::Automatic,
            screen_updating: true,
            display_alerts: true,
            books: Vec::new(),
            book_counter: 0,
        });
        self.active_app = Some(pid);
        pid
    }

    pub fn remove_app(&mut self, pid: u32) -> Option<AppData> {
        let pos = self.apps.iter().position(|a| a.pid == pid)?;
        let app = self.apps.remove(pos);
        if self.active_app == Some(pid) {
            self.active_app = self.apps.last().map(|a| a.pid);
        }
        Some(app)
    }

    /// A fresh workbook with one empty sheet.
    pub fn new_book(&mut self, name: String, path: Option<PathBuf>) -> BookData {
        let sheet_id = self.next_id();
        BookData {
            id: self.next_id(),
            name,
            path,
            read_only: false,
            sheets: vec![SheetData::new(sheet_id, "Sheet1".to_string())],
            active_sheet: sheet_id,
            sheet_counter: 1,
        }
    }

    pub fn app(&self, pid: u32) -> Option<&AppData> {
        self.apps.iter().find(|a| a.pid == pid)
    }

    pub fn app_mut(&mut self, pid: u32) -> Option<&mut AppData> {
        self.apps.iter_mut().find(|a| a.pid == pid)
    }

    pub fn book(&self, pid: u32, id: u64) -> Option<&BookData> {
        self.app(pid)?.books.iter().find(|b| b.id == id)
    }

    pub fn book_mut(&mut self, pid: u32, id: u64) -> Option<&mut BookData> {
        self.app_mut(pid)?.books.iter_mut().find(|b| b.id == id)
    }

    pub fn sheet(&self, loc: Loc) -> Option<&SheetData> {
        self.book(loc.pid, loc.book)?.sheet_by_id(loc.sheet)
    }

    pub fn sheet_mut(&mut self, loc: Loc) -> Option<&mut SheetData> {
        self.book_mut(loc.pid, loc.book)?.sheet_by_id_mut(loc.sheet)
    }

    /// The app with `pid`, or the active one.
    pub fn resolve_app(&self, pid: Option<u32>) -> HostResult<u32> {
        match pid {
            Some(pid) => self.app(pid).map(|a| a.pid).ok_or_else(|| {
                HostError::not_found(
                    Target::App,
                    format!("No Excel application found with PID {pid}"),
                )
            }),
            None => self
                .active_app
                .ok_or_else(|| HostError::not_found(Target::App, "No active Excel application")),
        }
    }

    /// Find a workbook by name or full path. Without a pid every running app
    /// is searched, the active one first.
    pub fn resolve_book(&self, name: &str, pid: Option<u32>) -> HostResult<(u32, u64)> {
        let candidates: Vec<u32> = match pid {
            Some(_) => vec![self.resolve_app(pid)?],
            None => self
                .active_app
                .into_iter()
                .chain(self.apps.iter().map(|a| a.pid))
                .collect(),
        };
        candidates
            .into_iter()
            .filter_map(|pid| self.app(pid))
            .find_map(|app| {
                app.books
                    .iter()
                    .find(|b| b.matches(name))
                    .map(|b| (app.pid, b.id))
            })
            .ok_or_else(|| {
                HostError::not_found(Target::Workbook, format!("Workbook '{name}' not found"))
            })
    }

    pub fn resolve_sheet(&self, at: &SheetPath) -> HostResult<Loc> {
        let (pid, book_id) = self.resolve_book(&at.book, at.pid)?;
        let book = self.resolved_book(pid, book_id)?;
        let pos = book.sheet_position(&at.sheet)?;
        Ok(Loc {
            pid,
            book: book_id,
            sheet: book.sheets[pos].id,
        })
    }

    pub fn resolved_sheet(&self, loc: Loc) -> HostResult<&SheetData> {
        self.sheet(loc).ok_or_else(deleted)
    }

    pub fn resolved_sheet_mut(&mut self, loc: Loc) -> HostResult<&mut SheetData> {
        self.sheet_mut(loc).ok_or_else(deleted)
    }

    pub fn resolved_book_mut(&mut self, pid: u32, id: u64) -> HostResult<&mut BookData> {
        self.book_mut(pid, id).ok_or_else(deleted)
    }

    pub fn resolved_book(&self, pid: u32, id: u64) -> HostResult<&BookData> {
        self.book(pid, id).ok_or_else(deleted)
    }
}

/// Error for a handle whose object no longer exists.
pub(crate) fn deleted() -> HostError {
    HostError::Automation("The object has been deleted".to_string())
}
