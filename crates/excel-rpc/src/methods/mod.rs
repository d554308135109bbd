//! The JSON-RPC method table: `app.*`, `book.*`, `sheet.*`, `range.*` and
//! `chart.*`.
//!
//! Every handler decodes its parameters, then runs one job on the
//! automation thread. Parameters are accepted by name or by position, in
//! the order each handler reads them.

mod app;
mod book;
mod chart;
mod range;
mod sheet;

use std::sync::Arc;

use excel_rpc_protocol::SheetRef;

use crate::adapter::{ExcelHost, SheetPath};
use crate::automation::Automation;
use crate::error::HostResult;
use crate::handle::Handle;
use crate::params::Args;
use crate::platform::Platform;
use crate::registry::{MethodRegistry, RegistryBuilder};
use crate::serialize::serialize;
use crate::value::HostValue;

/// Settings shared by all handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodContext {
    /// Vocabulary chart types and legend positions are translated into.
    pub platform: Platform,
}

/// Build the full method table on top of `automation`.
pub fn registry(automation: Automation, ctx: MethodContext) -> MethodRegistry {
    let methods = Methods {
        builder: MethodRegistry::builder(),
        automation,
        ctx,
    };
    let methods = app::register(methods);
    let methods = book::register(methods);
    let methods = sheet::register(methods);
    let methods = range::register(methods);
    let methods = chart::register(methods);
    methods.builder.build()
}

/// Registration helper that binds handlers to the automation thread.
struct Methods {
    builder: RegistryBuilder,
    automation: Automation,
    ctx: MethodContext,
}

impl Methods {
    /// Register `name` as a job on the automation thread.
    ///
    /// The result is serialized inside the job: handle attributes are host
    /// calls and must be read on the automation thread too.
    fn bind<F>(mut self, name: &str, job: F) -> Self
    where
        F: Fn(&mut dyn ExcelHost, &Args) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        let automation = self.automation.clone();
        let job = Arc::new(job);
        self.builder = self.builder.method(name, move |params| {
            let automation = automation.clone();
            let job = Arc::clone(&job);
            async move {
                let args = Args::new(params);
                automation
                    .run(move |host| {
                        job(host, &args).map(|value| HostValue::from(serialize(&value)))
                    })
                    .await
            }
        });
        self
    }

    /// Register `name` as a handler that never touches the host.
    fn local<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Args) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.builder = self.builder.method(name, move |params| {
            let f = Arc::clone(&f);
            async move { f(&Args::new(params)) }
        });
        self
    }
}

/// `book` and `sheet` always come first; `pid` comes after the
/// method's own parameters.
fn sheet_path(args: &Args, pid_position: usize) -> HostResult<SheetPath> {
    Ok(SheetPath {
        book: args.required("book", 0)?,
        sheet: args.required::<SheetRef>("sheet", 1)?,
        pid: args.optional("pid", pid_position)?,
    })
}

fn handle<T: Into<Handle>>(item: T) -> HostValue {
    HostValue::Handle(item.into())
}

/// Handles as a list value.
fn handles<T: Into<Handle>>(items: Vec<T>) -> HostValue {
    HostValue::List(items.into_iter().map(handle).collect())
}
