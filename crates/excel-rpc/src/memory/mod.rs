//! An [`ExcelHost`](crate::adapter::ExcelHost) that keeps everything in
//! memory.
//!
//! `MemoryHost` models apps, workbooks, sheets, cells and charts closely
//! enough to serve the full method table without Excel. Formulas are stored
//! but never evaluated. Saving writes a JSON snapshot of the workbook, which
//! a later `open_book` reads back.

mod address;
mod chart;
mod grid;
mod model;
mod objects;
mod sheet;
mod storage;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapter::{
    AppAdapter, AppHandle, BookAdapter, BookHandle, CalculationMode, OpenOptions, SheetHandle,
};
use crate::error::{HostError, HostResult};

pub use address::{Block, Cell, MAX_COLS, MAX_ROWS};

use model::{BookData, Loc, State};
use objects::{lock, AppView, BookView, ChartView, RangeView, SheetView, Shared};

/// In-memory automation host. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Shared,
}

impl MemoryHost {
    /// A host with no running application.
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with one visible application holding an empty `Book1`.
    pub fn with_workbook() -> Self {
        let host = Self::new();
        {
            let mut state = lock(&host.state);
            let pid = state.add_app(true);
            add_book(&mut state, pid);
        }
        host
    }

    fn app_view(&self, pid: u32) -> AppHandle {
        Arc::new(AppView {
            state: self.state.clone(),
            pid,
        })
    }

    fn book_view(&self, pid: u32, book: u64) -> BookHandle {
        Arc::new(BookView {
            state: self.state.clone(),
            pid,
            book,
        })
    }

    fn sheet_view(&self, loc: Loc) -> SheetHandle {
        Arc::new(SheetView {
            state: self.state.clone(),
            loc,
        })
    }

    fn range_view(&self, loc: Loc, block: Block) -> crate::adapter::RangeHandle {
        Arc::new(RangeView {
            state: self.state.clone(),
            loc,
            block,
        })
    }

    fn chart_view(&self, loc: Loc, chart: u64) -> crate::adapter::ChartHandle {
        Arc::new(ChartView {
            state: self.state.clone(),
            loc,
            chart,
        })
    }
}

impl std::fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MemoryHost")
            .field("apps", &state.apps.iter().map(|a| a.pid).collect::<Vec<_>>())
            .finish()
    }
}

/// Add a new `BookN` to `pid` and return its id.
fn add_book(state: &mut State, pid: u32) -> Option<u64> {
    let counter = {
        let app = state.app_mut(pid)?;
        app.book_counter += 1;
        app.book_counter
    };
    let book = state.new_book(format!("Book{counter}"), None);
    let id = book.id;
    state.app_mut(pid)?.books.push(book);
    Some(id)
}

/// The app to put a new workbook in: `pid`, the active app, or a new one.
fn target_app(state: &mut State, pid: Option<u32>) -> HostResult<u32> {
    match pid {
        Some(_) => state.resolve_app(pid),
        None => match state.active_app {
            Some(pid) => Ok(pid),
            None => Ok(state.add_app(true)),
        },
    }
}

fn save_to(book: &mut BookData, path: Option<&str>) -> HostResult<()> {
    let target = match path {
        Some(p) => PathBuf::from(p),
        None => book.path.clone().ok_or_else(|| {
            HostError::invalid_argument(format!(
                "Workbook '{}' has never been saved; a path is required",
                book.name
            ))
        })?,
    };
    if book.read_only && book.path.as_deref() == Some(target.as_path()) {
        return Err(HostError::PermissionDenied(format!(
            "Workbook '{}' is read-only",
            book.name
        )));
    }

    storage::write_book(book, &target)?;

    let target = fs::canonicalize(&target).unwrap_or(target);
    if let Some(file_name) = file_name(&target) {
        book.name = file_name;
    }
    book.path = Some(target);
    book.read_only = false;
    Ok(())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

impl AppAdapter for MemoryHost {
    fn list_apps(&mut self) -> HostResult<Vec<AppHandle>> {
        let pids: Vec<u32> = lock(&self.state).apps.iter().map(|a| a.pid).collect();
        Ok(pids.into_iter().map(|pid| self.app_view(pid)).collect())
    }

    fn get_app(&mut self, pid: Option<u32>) -> HostResult<AppHandle> {
        let pid = lock(&self.state).resolve_app(pid)?;
        Ok(self.app_view(pid))
    }

    fn create_app(&mut self, visible: bool, add_book_to_app: bool) -> HostResult<AppHandle> {
        let pid = {
            let mut state = lock(&self.state);
            let pid = state.add_app(visible);
            if add_book_to_app {
                add_book(&mut state, pid);
            }
            pid
        };
        tracing::info!("Started application {pid}");
        Ok(self.app_view(pid))
    }

    fn quit_app(&mut self, pid: u32, save_changes: bool) -> HostResult<()> {
        let mut state = lock(&self.state);
        let pid = state.resolve_app(Some(pid))?;
        if save_changes {
            if let Some(app) = state.app(pid) {
                for book in app.books.iter().filter(|b| b.path.is_some() && !b.read_only) {
                    if let Some(path) = &book.path {
                        storage::write_book(book, path)?;
                    }
                }
            }
        }
        state.remove_app(pid);
        tracing::info!("Quit application {pid}");
        Ok(())
    }

    fn set_calculation(&mut self, pid: u32, mode: CalculationMode) -> HostResult<AppHandle> {
        {
            let mut state = lock(&self.state);
            let pid = state.resolve_app(Some(pid))?;
            if let Some(app) = state.app_mut(pid) {
                app.calculation = mode;
            }
        }
        Ok(self.app_view(pid))
    }

    fn get_calculation(&mut self, pid: u32) -> HostResult<String> {
        let state = lock(&self.state);
        let pid = state.resolve_app(Some(pid))?;
        Ok(state
            .app(pid)
            .map(|a| a.calculation.as_str().to_string())
            .unwrap_or_default())
    }

    fn app_books(&mut self, pid: u32) -> HostResult<Vec<BookHandle>> {
        self.list_books(Some(pid))
    }
}

impl BookAdapter for MemoryHost {
    fn list_books(&mut self, pid: Option<u32>) -> HostResult<Vec<BookHandle>> {
        let found: Vec<(u32, u64)> = {
            let state = lock(&self.state);
            let pids = match pid {
                Some(_) => vec![state.resolve_app(pid)?],
                None => state.apps.iter().map(|a| a.pid).collect(),
            };
            pids.into_iter()
                .filter_map(|pid| state.app(pid))
                .flat_map(|app| app.books.iter().map(move |b| (app.pid, b.id)))
                .collect()
        };
        Ok(found
            .into_iter()
            .map(|(pid, id)| self.book_view(pid, id))
            .collect())
    }

    fn get_book(&mut self, name: &str, pid: Option<u32>) -> HostResult<BookHandle> {
        let (pid, id) = lock(&self.state).resolve_book(name, pid)?;
        Ok(self.book_view(pid, id))
    }

    fn open_book(
        &mut self,
        path: &str,
        pid: Option<u32>,
        options: &OpenOptions,
    ) -> HostResult<BookHandle> {
        let file = Path::new(path);
        if !file.is_file() {
            return Err(HostError::FileNotFound(path.to_string()));
        }
        let full = fs::canonicalize(file)?;
        let name = file_name(&full).unwrap_or_else(|| path.to_string());

        let mut state = lock(&self.state);
        let pid = target_app(&mut state, pid)?;

        let full_text = full.display().to_string();
        if let Ok((open_pid, id)) = state.resolve_book(&full_text, Some(pid)) {
            drop(state);
            tracing::debug!("Workbook '{name}' is already open");
            return Ok(self.book_view(open_pid, id));
        }

        let sheets = storage::read_sheets(&mut state, &full)?;
        let mut book = state.new_book(name.clone(), Some(full));
        if let Some(sheets) = sheets {
            book.active_sheet = sheets[0].id;
            book.sheet_counter = sheets.len() as u32;
            book.sheets = sheets;
        }
        book.read_only = options.read_only;
        let id = book.id;

        let app = state.app_mut(pid).ok_or_else(model::deleted)?;
        app.books.push(book);
        drop(state);

        tracing::info!("Opened workbook '{name}'");
        Ok(self.book_view(pid, id))
    }

    fn create_book(&mut self, pid: Option<u32>) -> HostResult<BookHandle> {
        let mut state = lock(&self.state);
        let pid = target_app(&mut state, pid)?;
        let id = add_book(&mut state, pid).ok_or_else(model::deleted)?;
        drop(state);
        Ok(self.book_view(pid, id))
    }

    fn close_book(
        &mut self,
        name: &str,
        pid: Option<u32>,
        save: bool,
        path: Option<&str>,
    ) -> HostResult<()> {
        let mut state = lock(&self.state);
        let (pid, id) = state.resolve_book(name, pid)?;
        let book = state.resolved_book_mut(pid, id)?;

        if save {
            if book.read_only {
                tracing::warn!("Not saving read-only workbook '{}'", book.name);
            } else if path.is_some() || book.path.is_some() {
                save_to(book, path)?;
            } else {
                tracing::debug!("Workbook '{}' has no path; closing without saving", book.name);
            }
        }

        if let Some(app) = state.app_mut(pid) {
            app.books.retain(|b| b.id != id);
        }
        tracing::info!("Closed workbook '{name}'");
        Ok(())
    }

    fn save_book(
        &mut self,
        name: &str,
        pid: Option<u32>,
        path: Option<&str>,
    ) -> HostResult<BookHandle> {
        let (pid, id) = {
            let mut state = lock(&self.state);
            let (pid, id) = state.resolve_book(name, pid)?;
            save_to(state.resolved_book_mut(pid, id)?, path)?;
            (pid, id)
        };
        tracing::info!("Saved workbook '{name}'");
        Ok(self.book_view(pid, id))
    }

    fn book_sheets(&mut self, name: &str, pid: Option<u32>) -> HostResult<Vec<SheetHandle>> {
        let locs: Vec<Loc> = {
            let state = lock(&self.state);
            let (pid, id) = state.resolve_book(name, pid)?;
            state
                .resolved_book(pid, id)?
                .sheets
                .iter()
                .map(|s| Loc {
                    pid,
                    book: id,
                    sheet: s.id,
                })
                .collect()
        };
        Ok(locs.into_iter().map(|loc| self.sheet_view(loc)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Target;
    use crate::handle::Handle;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_new_host_is_empty() {
        let mut host = MemoryHost::new();
        assert!(host.list_apps().unwrap().is_empty());
        let err = host.get_app(None).unwrap_err();
        assert!(matches!(
            err,
            HostError::NotFound {
                target: Target::App,
                ..
            }
        ));
    }

    #[test]
    fn test_create_and_quit_app() {
        let mut host = MemoryHost::new();
        let app = host.create_app(false, true).unwrap();
        let pid = app.pid().unwrap();

        let books = host.app_books(pid).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].name().unwrap(), "Book1");
        assert!(!app.visible().unwrap());

        host.quit_app(pid, false).unwrap();
        assert!(host.list_apps().unwrap().is_empty());
        // the handle outlives its app, its attributes do not
        assert!(app.visible().is_err());
    }

    #[test]
    fn test_quit_unknown_pid() {
        let mut host = MemoryHost::with_workbook();
        let err = host.quit_app(999_999, true).unwrap_err();
        assert_eq!(err.to_string(), "No Excel application found with PID 999999");
    }

    #[test]
    fn test_calculation_mode() {
        let mut host = MemoryHost::with_workbook();
        let pid = host.get_app(None).unwrap().pid().unwrap();
        host.set_calculation(pid, CalculationMode::Manual).unwrap();
        assert_eq!(host.get_calculation(pid).unwrap(), "manual");
    }

    #[test]
    fn test_open_missing_file() {
        let mut host = MemoryHost::with_workbook();
        let err = host
            .open_book("/no/such/file.xlsx", None, &OpenOptions::default())
            .unwrap_err();
        assert!(matches!(err, HostError::FileNotFound(ref p) if p == "/no/such/file.xlsx"));
    }

    #[test]
    fn test_save_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let path_text = path.display().to_string();

        let mut host = MemoryHost::with_workbook();
        let book = host.save_book("Book1", None, Some(&path_text)).unwrap();
        assert_eq!(book.name().unwrap(), "report.xlsx");
        host.close_book("report.xlsx", None, false, None).unwrap();
        assert!(host.get_book("report.xlsx", None).is_err());

        let reopened = host
            .open_book(&path_text, None, &OpenOptions::default())
            .unwrap();
        assert_eq!(reopened.name().unwrap(), "report.xlsx");
        assert_eq!(reopened.sheet_names().unwrap(), vec!["Sheet1".to_string()]);

        // opening again returns the same workbook
        host.open_book(&path_text, None, &OpenOptions::default())
            .unwrap();
        assert_eq!(host.list_books(None).unwrap().len(), 1);
    }

    #[test]
    fn test_save_without_path() {
        let mut host = MemoryHost::with_workbook();
        let err = host.save_book("Book1", None, None).unwrap_err();
        assert!(matches!(err, HostError::InvalidArgument(_)));
    }

    #[test]
    fn test_read_only_book_cannot_be_saved_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.xlsx");
        fs::write(&path, b"").unwrap();

        let mut host = MemoryHost::new();
        let options = OpenOptions {
            read_only: true,
            password: None,
        };
        host.open_book(&path.display().to_string(), None, &options)
            .unwrap();
        let err = host.save_book("locked.xlsx", None, None).unwrap_err();
        assert!(matches!(err, HostError::PermissionDenied(_)));
    }

    #[test]
    fn test_book_attributes() {
        let mut host = MemoryHost::with_workbook();
        let book = host.get_book("book1", None).unwrap();
        let pid = host.get_app(None).unwrap().pid().unwrap();
        assert_eq!(
            Handle::Book(book).attributes(),
            json!({
                "name": "Book1",
                "fullname": "Book1",
                "path": "Book1",
                "app_id": pid,
                "sheets": ["Sheet1"]
            })
        );
    }
}
