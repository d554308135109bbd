//! Live handle views over the in-memory state.
//!
//! A view stores ids, not data. Each attribute read locks the state and looks
//! the object up again, so views observe later changes and fail cleanly once
//! their object is gone.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::address::Block;
use super::grid;
use super::model::{
    deleted, AppData, BookData, ChartData, Loc, SheetData, State, DEFAULT_COLUMN_WIDTH,
    DEFAULT_ROW_HEIGHT,
};
use crate::error::HostResult;
use crate::handle::{AppObject, BookObject, ChartObject, RangeObject, SheetObject};
use crate::value::HostValue;

pub(crate) type Shared = Arc<Mutex<State>>;

pub(crate) fn lock(state: &Shared) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct AppView {
    pub state: Shared,
    pub pid: u32,
}

impl AppView {
    fn read<T>(&self, f: impl FnOnce(&AppData) -> T) -> HostResult<T> {
        let state = lock(&self.state);
        state.app(self.pid).map(f).ok_or_else(deleted)
    }
}

impl AppObject for AppView {
    fn pid(&self) -> HostResult<u32> {
        self.read(|a| a.pid)
    }

    fn version(&self) -> HostResult<String> {
        self.read(|a| a.version.clone())
    }

    fn visible(&self) -> HostResult<bool> {
        self.read(|a| a.visible)
    }

    fn calculation(&self) -> HostResult<String> {
        self.read(|a| a.calculation.as_str().to_string())
    }

    fn screen_updating(&self) -> HostResult<bool> {
        self.read(|a| a.screen_updating)
    }

    fn display_alerts(&self) -> HostResult<bool> {
        self.read(|a| a.display_alerts)
    }
}

pub(crate) struct BookView {
    pub state: Shared,
    pub pid: u32,
    pub book: u64,
}

impl BookView {
    fn read<T>(&self, f: impl FnOnce(&BookData) -> T) -> HostResult<T> {
        let state = lock(&self.state);
        state.book(self.pid, self.book).map(f).ok_or_else(deleted)
    }
}

impl BookObject for BookView {
    fn name(&self) -> HostResult<String> {
        self.read(|b| b.name.clone())
    }

    fn fullname(&self) -> HostResult<String> {
        self.read(BookData::fullname)
    }

    fn app_pid(&self) -> HostResult<u32> {
        self.read(|_| self.pid)
    }

    fn sheet_names(&self) -> HostResult<Vec<String>> {
        self.read(|b| b.sheets.iter().map(|s| s.name.clone()).collect())
    }
}

pub(crate) struct SheetView {
    pub state: Shared,
    pub loc: Loc,
}

impl SheetView {
    fn read<T>(&self, f: impl FnOnce(&BookData, &SheetData) -> T) -> HostResult<T> {
        let state = lock(&self.state);
        let book = state.book(self.loc.pid, self.loc.book).ok_or_else(deleted)?;
        let sheet = book.sheet_by_id(self.loc.sheet).ok_or_else(deleted)?;
        Ok(f(book, sheet))
    }
}

impl SheetObject for SheetView {
    fn name(&self) -> HostResult<String> {
        self.read(|_, s| s.name.clone())
    }

    fn book_name(&self) -> HostResult<String> {
        self.read(|b, _| b.name.clone())
    }

    fn index(&self) -> HostResult<u32> {
        self.read(|b, s| {
            let pos = b.sheets.iter().position(|x| x.id == s.id).unwrap_or_default();
            pos as u32 + 1
        })
    }

    fn used_range_address(&self) -> HostResult<String> {
        self.read(|_, s| s.used_block().absolute())
    }
}

pub(crate) struct RangeView {
    pub state: Shared,
    pub loc: Loc,
    pub block: Block,
}

impl RangeView {
    fn read<T>(&self, f: impl FnOnce(&BookData, &SheetData) -> T) -> HostResult<T> {
        let state = lock(&self.state);
        let book = state.book(self.loc.pid, self.loc.book).ok_or_else(deleted)?;
        let sheet = book.sheet_by_id(self.loc.sheet).ok_or_else(deleted)?;
        Ok(f(book, sheet))
    }
}

impl RangeObject for RangeView {
    fn address(&self) -> HostResult<String> {
        Ok(self.block.absolute())
    }

    fn sheet_name(&self) -> HostResult<String> {
        self.read(|_, s| s.name.clone())
    }

    fn book_name(&self) -> HostResult<String> {
        self.read(|b, _| b.name.clone())
    }

    fn value(&self) -> HostResult<HostValue> {
        self.read(|_, s| grid::read_values(s, self.block))
    }

    fn formula(&self) -> HostResult<HostValue> {
        self.read(|_, s| grid::read_formulas(s, self.block))
    }

    fn shape(&self) -> HostResult<(usize, usize)> {
        Ok((self.block.rows() as usize, self.block.cols() as usize))
    }

    fn row(&self) -> HostResult<u32> {
        Ok(self.block.start.row + 1)
    }

    fn column(&self) -> HostResult<u32> {
        Ok(self.block.start.col + 1)
    }

    fn row_height(&self) -> HostResult<f64> {
        self.read(|_, _| DEFAULT_ROW_HEIGHT)
    }

    fn column_width(&self) -> HostResult<f64> {
        self.read(|_, _| DEFAULT_COLUMN_WIDTH)
    }
}

pub(crate) struct ChartView {
    pub state: Shared,
    pub loc: Loc,
    pub chart: u64,
}

impl ChartView {
    fn read<T>(&self, f: impl FnOnce(&BookData, &SheetData, &ChartData) -> T) -> HostResult<T> {
        let state = lock(&self.state);
        let book = state.book(self.loc.pid, self.loc.book).ok_or_else(deleted)?;
        let sheet = book.sheet_by_id(self.loc.sheet).ok_or_else(deleted)?;
        let chart = sheet.chart_by_id(self.chart).ok_or_else(deleted)?;
        Ok(f(book, sheet, chart))
    }
}

impl ChartObject for ChartView {
    fn name(&self) -> HostResult<String> {
        self.read(|_, _, c| c.name.clone())
    }

    fn chart_type(&self) -> HostResult<String> {
        self.read(|_, _, c| c.chart_type.clone())
    }

    fn sheet_name(&self) -> HostResult<String> {
        self.read(|_, s, _| s.name.clone())
    }

    fn book_name(&self) -> HostResult<String> {
        self.read(|b, _, _| b.name.clone())
    }

    fn left(&self) -> HostResult<f64> {
        self.read(|_, _, c| c.left)
    }

    fn top(&self) -> HostResult<f64> {
        self.read(|_, _, c| c.top)
    }

    fn width(&self) -> HostResult<f64> {
        self.read(|_, _, c| c.width)
    }

    fn height(&self) -> HostResult<f64> {
        self.read(|_, _, c| c.height)
    }
}
