//! Classification of host failures into wire error objects.

use std::error::Error as StdError;
use std::io;

use excel_rpc_protocol::{ErrorCode, ErrorObject};
use serde_json::json;

use crate::error::{HostError, Target};

/// Map a failure to an error object.
///
/// With `verbose` set, the object carries `data = {"kind", "causes"}`
/// describing the failure and its source chain. The code and message are the
/// same either way.
pub fn map_error(err: &HostError, verbose: bool) -> ErrorObject {
    let mut object = classify(err);
    if verbose {
        object = object.with_data(json!({
            "kind": err.kind(),
            "causes": causes(err),
        }));
    }
    object
}

fn classify(err: &HostError) -> ErrorObject {
    match err {
        HostError::Automation(text) => ErrorObject::with_message(ErrorCode::ExcelError, text),
        HostError::Connection(_) => {
            ErrorObject::with_message(ErrorCode::ExcelNotFound, "Failed to connect to Excel")
        }
        HostError::FileNotFound(text) => ErrorObject::with_message(
            ErrorCode::WorkbookNotFound,
            format!("File not found: {text}"),
        ),
        HostError::InvalidArgument(text) => {
            ErrorObject::with_message(invalid_argument_code(text), text)
        }
        HostError::PermissionDenied(text) => {
            ErrorObject::with_message(ErrorCode::PermissionDenied, text)
        }
        HostError::Timeout(_) => ErrorObject::new(ErrorCode::Timeout),
        HostError::NotFound { target, message } => {
            let code = match target {
                Target::App => ErrorCode::ExcelNotFound,
                Target::Workbook => ErrorCode::WorkbookNotFound,
                Target::Sheet => ErrorCode::SheetNotFound,
                Target::Chart => ErrorCode::ChartNotFound,
            };
            ErrorObject::with_message(code, message)
        }
        HostError::Range(text) => ErrorObject::with_message(ErrorCode::RangeError, text),
        HostError::Other(inner) => {
            if let Some(host) = inner.downcast_ref::<HostError>() {
                return classify(host);
            }
            if let Some(io_err) = inner.downcast_ref::<io::Error>() {
                let reclassified = HostError::from(io::Error::new(io_err.kind(), io_err.to_string()));
                if !matches!(reclassified, HostError::Other(_)) {
                    return classify(&reclassified);
                }
            }
            ErrorObject::with_message(ErrorCode::InternalError, format!("Internal error: {inner}"))
        }
    }
}

/// Invalid arguments are refined by their message text.
fn invalid_argument_code(text: &str) -> ErrorCode {
    if text.contains("Chart") && text.contains("not found") {
        ErrorCode::ChartNotFound
    } else if text.contains("chart type") {
        ErrorCode::ChartTypeError
    } else {
        ErrorCode::InvalidParams
    }
}

fn causes(err: &HostError) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    match err {
        HostError::Other(inner) => {
            chain.extend(inner.chain().skip(1).map(ToString::to_string));
        }
        _ => {
            let mut source = err.source();
            while let Some(cause) = source {
                chain.push(cause.to_string());
                source = cause.source();
            }
        }
    }
    chain
}
