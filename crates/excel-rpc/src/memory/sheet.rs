//! Sheets and ranges of the in-memory host.

use super::address::Block;
use super::grid;
use super::model::{Loc, SheetData};
use super::objects::lock;
use super::MemoryHost;
use crate::adapter::{
    BookAdapter, FrameOptions, RangeAdapter, RangeHandle, SheetAdapter, SheetHandle, SheetPath,
    SheetPlacement,
};
use crate::error::{HostError, HostResult};
use crate::value::{DataFrame, HostValue};

const MAX_SHEET_NAME: usize = 31;
const FORBIDDEN_IN_SHEET_NAME: &[char] = &['\\', '/', '?', '*', '[', ']', ':'];

fn check_sheet_name(name: &str) -> HostResult<()> {
    if name.trim().is_empty() {
        return Err(HostError::invalid_argument("sheet name cannot be empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME {
        return Err(HostError::invalid_argument(format!(
            "sheet name '{name}' is longer than {MAX_SHEET_NAME} characters"
        )));
    }
    if name.contains(FORBIDDEN_IN_SHEET_NAME) || name.starts_with('\'') || name.ends_with('\'') {
        return Err(HostError::invalid_argument(format!(
            "sheet name '{name}' contains a forbidden character"
        )));
    }
    Ok(())
}

fn duplicate_sheet(name: &str, book: &str) -> HostError {
    HostError::Automation(format!(
        "A sheet named '{name}' already exists in workbook '{book}'"
    ))
}

impl MemoryHost {
    pub(super) fn locate(&self, at: &SheetPath) -> HostResult<Loc> {
        lock(&self.state).resolve_sheet(at)
    }

    /// Resolve `at` and run `f` on the sheet.
    pub(super) fn with_sheet<T>(
        &self,
        at: &SheetPath,
        f: impl FnOnce(&SheetData) -> HostResult<T>,
    ) -> HostResult<T> {
        let state = lock(&self.state);
        let loc = state.resolve_sheet(at)?;
        f(state.resolved_sheet(loc)?)
    }

    /// Resolve `at` and run `f` on the sheet, mutably.
    pub(super) fn with_sheet_mut<T>(
        &self,
        at: &SheetPath,
        f: impl FnOnce(Loc, &mut SheetData) -> HostResult<T>,
    ) -> HostResult<T> {
        let mut state = lock(&self.state);
        let loc = state.resolve_sheet(at)?;
        f(loc, state.resolved_sheet_mut(loc)?)
    }
}

impl SheetAdapter for MemoryHost {
    fn list_sheets(&mut self, book: &str, pid: Option<u32>) -> HostResult<Vec<SheetHandle>> {
        self.book_sheets(book, pid)
    }

    fn get_sheet(&mut self, at: &SheetPath) -> HostResult<SheetHandle> {
        let loc = self.locate(at)?;
        Ok(self.sheet_view(loc))
    }

    fn add_sheet(
        &mut self,
        book: &str,
        pid: Option<u32>,
        name: Option<&str>,
        placement: &SheetPlacement,
    ) -> HostResult<SheetHandle> {
        let loc = {
            let mut state = lock(&self.state);
            let (pid, book_id) = state.resolve_book(book, pid)?;
            let sheet_id = state.next_id();
            let book = state.resolved_book_mut(pid, book_id)?;

            let name = match name {
                Some(name) => {
                    check_sheet_name(name)?;
                    if book.has_sheet_named(name) {
                        return Err(duplicate_sheet(name, &book.name));
                    }
                    name.to_string()
                }
                None => loop {
                    book.sheet_counter += 1;
                    let candidate = format!("Sheet{}", book.sheet_counter);
                    if !book.has_sheet_named(&candidate) {
                        break candidate;
                    }
                },
            };

            let position = match (&placement.before, &placement.after) {
                (Some(before), _) => book.sheet_position(before)?,
                (None, Some(after)) => book.sheet_position(after)? + 1,
                (None, None) => book
                    .sheets
                    .iter()
                    .position(|s| s.id == book.active_sheet)
                    .unwrap_or(0),
            };
            book.sheets.insert(position, SheetData::new(sheet_id, name));
            book.active_sheet = sheet_id;

            Loc {
                pid,
                book: book_id,
                sheet: sheet_id,
            }
        };
        Ok(self.sheet_view(loc))
    }

    fn delete_sheet(&mut self, at: &SheetPath) -> HostResult<()> {
        let mut state = lock(&self.state);
        let loc = state.resolve_sheet(at)?;
        let book = state.resolved_book_mut(loc.pid, loc.book)?;
        if book.sheets.len() == 1 {
            return Err(HostError::Automation(
                "A workbook must contain at least one visible worksheet".to_string(),
            ));
        }

        let position = book
            .sheets
            .iter()
            .position(|s| s.id == loc.sheet)
            .ok_or_else(super::model::deleted)?;
        let removed = book.sheets.remove(position);
        if book.active_sheet == removed.id {
            let next = position.min(book.sheets.len() - 1);
            book.active_sheet = book.sheets[next].id;
        }
        tracing::debug!("Deleted sheet '{}' from '{}'", removed.name, book.name);
        Ok(())
    }

    fn rename_sheet(&mut self, at: &SheetPath, new_name: &str) -> HostResult<SheetHandle> {
        check_sheet_name(new_name)?;
        let loc = {
            let mut state = lock(&self.state);
            let loc = state.resolve_sheet(at)?;
            let book = state.resolved_book_mut(loc.pid, loc.book)?;
            let taken = book
                .sheets
                .iter()
                .any(|s| s.id != loc.sheet && s.name.eq_ignore_ascii_case(new_name));
            if taken {
                return Err(duplicate_sheet(new_name, &book.name));
            }
            let sheet = book
                .sheet_by_id_mut(loc.sheet)
                .ok_or_else(super::model::deleted)?;
            sheet.name = new_name.to_string();
            loc
        };
        Ok(self.sheet_view(loc))
    }

    fn clear_sheet(&mut self, at: &SheetPath) -> HostResult<SheetHandle> {
        let loc = self.with_sheet_mut(at, |loc, sheet| {
            sheet.cells.clear();
            Ok(loc)
        })?;
        Ok(self.sheet_view(loc))
    }

    fn used_range(&mut self, at: &SheetPath) -> HostResult<RangeHandle> {
        let (loc, block) = {
            let state = lock(&self.state);
            let loc = state.resolve_sheet(at)?;
            (loc, state.resolved_sheet(loc)?.used_block())
        };
        Ok(self.range_view(loc, block))
    }

    fn activate_sheet(&mut self, at: &SheetPath) -> HostResult<SheetHandle> {
        let loc = {
            let mut state = lock(&self.state);
            let loc = state.resolve_sheet(at)?;
            state.resolved_book_mut(loc.pid, loc.book)?.active_sheet = loc.sheet;
            state.active_app = Some(loc.pid);
            loc
        };
        Ok(self.sheet_view(loc))
    }
}

impl RangeAdapter for MemoryHost {
    fn get_range(&mut self, at: &SheetPath, address: &str) -> HostResult<RangeHandle> {
        let block = Block::parse(address)?;
        let loc = self.locate(at)?;
        Ok(self.range_view(loc, block))
    }

    fn get_range_value(&mut self, at: &SheetPath, address: &str) -> HostResult<HostValue> {
        let block = Block::parse(address)?;
        self.with_sheet(at, |sheet| Ok(grid::read_values(sheet, block)))
    }

    fn set_range_value(
        &mut self,
        at: &SheetPath,
        address: &str,
        value: HostValue,
    ) -> HostResult<RangeHandle> {
        let block = Block::parse(address)?;
        let loc = self.with_sheet_mut(at, |loc, sheet| {
            grid::write_value(sheet, block, value)?;
            Ok(loc)
        })?;
        Ok(self.range_view(loc, block))
    }

    fn get_range_formula(&mut self, at: &SheetPath, address: &str) -> HostResult<HostValue> {
        let block = Block::parse(address)?;
        self.with_sheet(at, |sheet| Ok(grid::read_formulas(sheet, block)))
    }

    fn set_range_formula(
        &mut self,
        at: &SheetPath,
        address: &str,
        formula: HostValue,
    ) -> HostResult<RangeHandle> {
        let block = Block::parse(address)?;
        let loc = self.with_sheet_mut(at, |loc, sheet| {
            grid::write_formula(sheet, block, formula)?;
            Ok(loc)
        })?;
        Ok(self.range_view(loc, block))
    }

    fn clear_range(&mut self, at: &SheetPath, address: &str) -> HostResult<RangeHandle> {
        let block = Block::parse(address)?;
        let loc = self.with_sheet_mut(at, |loc, sheet| {
            grid::clear(sheet, block);
            Ok(loc)
        })?;
        Ok(self.range_view(loc, block))
    }

    fn range_as_frame(
        &mut self,
        at: &SheetPath,
        address: &str,
        options: FrameOptions,
    ) -> HostResult<DataFrame> {
        let block = Block::parse(address)?;
        self.with_sheet(at, |sheet| grid::read_frame(sheet, block, options))
    }

    fn set_range_frame(
        &mut self,
        at: &SheetPath,
        address: &str,
        frame: &DataFrame,
        options: FrameOptions,
    ) -> HostResult<RangeHandle> {
        let anchor = Block::parse(address)?.start;
        let (loc, written) = self.with_sheet_mut(at, |loc, sheet| {
            let written = grid::write_frame(sheet, anchor, frame, options)?;
            Ok((loc, written))
        })?;
        Ok(self.range_view(loc, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Target;
    use crate::handle::Handle;
    use crate::serialize::serialize;
    use excel_rpc_protocol::SheetRef;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sheet1() -> SheetPath {
        SheetPath {
            pid: None,
            book: "Book1".into(),
            sheet: SheetRef::from("Sheet1"),
        }
    }

    fn names(host: &mut MemoryHost) -> Vec<String> {
        host.list_sheets("Book1", None)
            .unwrap()
            .iter()
            .map(|s| s.name().unwrap())
            .collect()
    }

    #[test]
    fn test_add_sheet_placement() {
        let mut host = MemoryHost::with_workbook();
        // new sheets go before the active one, and become active
        host.add_sheet("Book1", None, None, &SheetPlacement::default())
            .unwrap();
        assert_eq!(names(&mut host), vec!["Sheet2", "Sheet1"]);

        let after = SheetPlacement {
            before: None,
            after: Some(SheetRef::from("Sheet1")),
        };
        let added = host.add_sheet("Book1", None, Some("Data"), &after).unwrap();
        assert_eq!(names(&mut host), vec!["Sheet2", "Sheet1", "Data"]);
        assert_eq!(added.index().unwrap(), 3);

        let before = SheetPlacement {
            before: Some(SheetRef::Index(0)),
            after: None,
        };
        host.add_sheet("Book1", None, Some("First"), &before)
            .unwrap();
        assert_eq!(names(&mut host), vec!["First", "Sheet2", "Sheet1", "Data"]);
    }

    #[test]
    fn test_duplicate_sheet_name() {
        let mut host = MemoryHost::with_workbook();
        let err = host
            .add_sheet("Book1", None, Some("sheet1"), &SheetPlacement::default())
            .unwrap_err();
        assert!(matches!(err, HostError::Automation(_)));
    }

    #[test]
    fn test_rename_and_lookup() {
        let mut host = MemoryHost::with_workbook();
        let sheet = host.get_sheet(&sheet1()).unwrap();
        host.rename_sheet(&sheet1(), "Summary").unwrap();
        // the old handle follows the sheet
        assert_eq!(sheet.name().unwrap(), "Summary");

        let err = host.get_sheet(&sheet1()).unwrap_err();
        assert!(matches!(
            err,
            HostError::NotFound {
                target: Target::Sheet,
                ..
            }
        ));
        assert!(host.rename_sheet(&sheet1(), "a/b").is_err());
    }

    #[test]
    fn test_cannot_delete_last_sheet() {
        let mut host = MemoryHost::with_workbook();
        assert!(matches!(
            host.delete_sheet(&sheet1()).unwrap_err(),
            HostError::Automation(_)
        ));

        host.add_sheet("Book1", None, None, &SheetPlacement::default())
            .unwrap();
        let old = host.get_sheet(&sheet1()).unwrap();
        host.delete_sheet(&sheet1()).unwrap();
        assert_eq!(names(&mut host), vec!["Sheet2"]);
        assert!(old.name().is_err());
    }

    #[test]
    fn test_set_value_returns_live_range() {
        let mut host = MemoryHost::with_workbook();
        let range = host
            .set_range_value(
                &sheet1(),
                "A1:B2",
                HostValue::from(json!([[1, 2], [3, 4]])),
            )
            .unwrap();
        let attributes = Handle::Range(range).attributes();
        assert_eq!(attributes["address"], json!("$A$1:$B$2"));
        assert_eq!(attributes["value"], json!([[1, 2], [3, 4]]));
        assert_eq!(attributes["shape"], json!([2, 2]));
        assert_eq!(attributes["row"], json!(1));
        assert_eq!(attributes["column"], json!(1));
    }

    #[test]
    fn test_used_range_and_clear() {
        let mut host = MemoryHost::with_workbook();
        host.set_range_value(&sheet1(), "B2:C3", 5.into()).unwrap();
        let used = host.used_range(&sheet1()).unwrap();
        assert_eq!(used.address().unwrap(), "$B$2:$C$3");

        host.clear_range(&sheet1(), "B2").unwrap();
        assert!(host.get_range_value(&sheet1(), "B2").unwrap().is_null());

        host.clear_sheet(&sheet1()).unwrap();
        let used = host.used_range(&sheet1()).unwrap();
        assert_eq!(used.address().unwrap(), "$A$1");
    }

    #[test]
    fn test_formula_round_trip() {
        let mut host = MemoryHost::with_workbook();
        host.set_range_formula(&sheet1(), "C1", "=SUM(A1:B1)".into())
            .unwrap();
        let formula = host.get_range_formula(&sheet1(), "C1").unwrap();
        assert_eq!(formula.as_str(), Some("=SUM(A1:B1)"));
    }

    #[test]
    fn test_bad_address() {
        let mut host = MemoryHost::with_workbook();
        let err = host.get_range(&sheet1(), "not-an-address").unwrap_err();
        assert!(matches!(err, HostError::Range(_)));
    }

    #[test]
    fn test_frame_write_then_read() {
        let mut host = MemoryHost::with_workbook();
        let df = DataFrame::from_rows(
            vec!["x".into(), "y".into()],
            vec![vec![1.into(), 2.into()], vec![3.into(), 4.into()]],
        )
        .unwrap();
        let options = FrameOptions::default();
        let written = host.set_range_frame(&sheet1(), "B2", &df, options).unwrap();
        assert_eq!(written.address().unwrap(), "$B$2:$C$4");

        let back = host.range_as_frame(&sheet1(), "B2:C4", options).unwrap();
        assert_eq!(serialize(&back.into()), serialize(&df.into()));
    }
}
