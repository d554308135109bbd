//! `book.*`: workbooks.

use super::{handle, handles, Methods};
use crate::adapter::OpenOptions;
use crate::value::HostValue;

pub(super) fn register(methods: Methods) -> Methods {
    methods
        .bind("book.list", |host, args| {
            let pid = args.optional("pid", 0)?;
            Ok(handles(host.list_books(pid)?))
        })
        .bind("book.get", |host, args| {
            let name: String = args.required("name", 0)?;
            let pid = args.optional("pid", 1)?;
            Ok(handle(host.get_book(&name, pid)?))
        })
        .bind("book.open", |host, args| {
            let path: String = args.required("path", 0)?;
            let pid = args.optional("pid", 1)?;
            let options = OpenOptions {
                read_only: args.or("read_only", 2, false)?,
                password: args.optional("password", 3)?,
            };
            Ok(handle(host.open_book(&path, pid, &options)?))
        })
        .bind("book.create", |host, args| {
            let pid = args.optional("pid", 0)?;
            Ok(handle(host.create_book(pid)?))
        })
        .bind("book.close", |host, args| {
            let name: String = args.required("name", 0)?;
            let pid = args.optional("pid", 1)?;
            let save = args.or("save", 2, true)?;
            let path: Option<String> = args.optional("path", 3)?;
            host.close_book(&name, pid, save, path.as_deref())?;
            Ok(HostValue::Bool(true))
        })
        .bind("book.save", |host, args| {
            let name: String = args.required("name", 0)?;
            let pid = args.optional("pid", 1)?;
            let path: Option<String> = args.optional("path", 2)?;
            Ok(handle(host.save_book(&name, pid, path.as_deref())?))
        })
        .bind("book.get_sheets", |host, args| {
            let name: String = args.required("name", 0)?;
            let pid = args.optional("pid", 1)?;
            Ok(handles(host.book_sheets(&name, pid)?))
        })
}
