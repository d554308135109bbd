//! `sheet.*`: worksheets.

use excel_rpc_protocol::SheetRef;

use super::{handle, handles, sheet_path, Methods};
use crate::adapter::SheetPlacement;
use crate::value::HostValue;

pub(super) fn register(methods: Methods) -> Methods {
    methods
        .bind("sheet.list", |host, args| {
            let book: String = args.required("book", 0)?;
            let pid = args.optional("pid", 1)?;
            Ok(handles(host.list_sheets(&book, pid)?))
        })
        .bind("sheet.get", |host, args| {
            let at = sheet_path(args, 2)?;
            Ok(handle(host.get_sheet(&at)?))
        })
        .bind("sheet.add", |host, args| {
            let book: String = args.required("book", 0)?;
            let name: Option<String> = args.optional("name", 1)?;
            let placement = SheetPlacement {
                before: args.optional::<SheetRef>("before", 2)?,
                after: args.optional::<SheetRef>("after", 3)?,
            };
            let pid = args.optional("pid", 4)?;
            Ok(handle(host.add_sheet(&book, pid, name.as_deref(), &placement)?))
        })
        .bind("sheet.delete", |host, args| {
            let at = sheet_path(args, 2)?;
            host.delete_sheet(&at)?;
            Ok(HostValue::Bool(true))
        })
        .bind("sheet.rename", |host, args| {
            let at = sheet_path(args, 3)?;
            let new_name: String = args.required("new_name", 2)?;
            Ok(handle(host.rename_sheet(&at, &new_name)?))
        })
        .bind("sheet.clear", |host, args| {
            let at = sheet_path(args, 2)?;
            Ok(handle(host.clear_sheet(&at)?))
        })
        .bind("sheet.get_used_range", |host, args| {
            let at = sheet_path(args, 2)?;
            Ok(handle(host.used_range(&at)?))
        })
        .bind("sheet.activate", |host, args| {
            let at = sheet_path(args, 2)?;
            Ok(handle(host.activate_sheet(&at)?))
        })
}
