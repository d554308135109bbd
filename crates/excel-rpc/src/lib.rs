//! # excel-rpc
//!
//! JSON-RPC 2.0 access to spreadsheet automation.
//!
//! The crate turns raw JSON-RPC payloads into calls against an automation
//! host and turns whatever the host returns into JSON:
//!
//! - [`Dispatcher`] validates envelopes, runs batches and maps failures to
//!   error codes.
//! - [`serialize()`](serialize::serialize) converts any [`HostValue`] (frames,
//!   numeric arrays and live object handles included) into JSON and never
//!   fails.
//! - [`methods::registry`] builds the `app.*`, `book.*`, `sheet.*`,
//!   `range.*` and `chart.*` method table on top of an [`Automation`]
//!   thread that owns an [`ExcelHost`].
//! - [`MemoryHost`] is a complete in-memory host, for tests and for running
//!   without Excel.
//!
//! ## Example
//!
//! ```no_run
//! use excel_rpc::{methods, Automation, Dispatcher, MemoryHost, MethodContext};
//!
//! # async fn run() -> excel_rpc::HostResult<()> {
//! let automation = Automation::start(|| Ok(MemoryHost::with_workbook()))?;
//! let dispatcher = Dispatcher::new(methods::registry(automation, MethodContext::default()));
//!
//! let reply = dispatcher
//!     .handle_payload(r#"{"jsonrpc":"2.0","method":"book.list","id":1}"#)
//!     .await;
//! if let Some(reply) = reply {
//!     println!("{}", reply.to_json().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod automation;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod mapper;
pub mod memory;
pub mod methods;
pub mod params;
pub mod platform;
pub mod registry;
pub mod serialize;
pub mod value;

pub use adapter::ExcelHost;
pub use automation::Automation;
pub use dispatcher::{DispatchOptions, Dispatcher, Reply};
pub use error::{HostError, HostResult};
pub use handle::Handle;
pub use memory::MemoryHost;
pub use methods::MethodContext;
pub use platform::Platform;
pub use registry::MethodRegistry;
pub use value::HostValue;

pub use excel_rpc_protocol as protocol;
