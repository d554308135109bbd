//! Live references to automation objects and their attribute maps.
//!
//! A handle is never sent over the wire as-is. Serialization reads a fixed set
//! of attributes from it, each through its own fallible getter. A getter that
//! fails degrades only its own field to a sentinel and logs a warning; the
//! rest of the map is still produced.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::HostResult;
use crate::serialize::serialize;
use crate::value::{float_to_json, HostValue};

/// A running Excel instance.
pub trait AppObject: Send + Sync {
    fn pid(&self) -> HostResult<u32>;
    fn version(&self) -> HostResult<String>;
    fn visible(&self) -> HostResult<bool>;
    fn calculation(&self) -> HostResult<String>;
    fn screen_updating(&self) -> HostResult<bool>;
    fn display_alerts(&self) -> HostResult<bool>;
}

/// An open workbook.
pub trait BookObject: Send + Sync {
    fn name(&self) -> HostResult<String>;
    fn fullname(&self) -> HostResult<String>;
    fn app_pid(&self) -> HostResult<u32>;
    fn sheet_names(&self) -> HostResult<Vec<String>>;
}

/// A worksheet.
pub trait SheetObject: Send + Sync {
    fn name(&self) -> HostResult<String>;
    fn book_name(&self) -> HostResult<String>;
    /// 1-based position within the workbook.
    fn index(&self) -> HostResult<u32>;
    fn used_range_address(&self) -> HostResult<String>;
}

/// A block of cells.
pub trait RangeObject: Send + Sync {
    fn address(&self) -> HostResult<String>;
    fn sheet_name(&self) -> HostResult<String>;
    fn book_name(&self) -> HostResult<String>;
    fn value(&self) -> HostResult<HostValue>;
    fn formula(&self) -> HostResult<HostValue>;
    /// `(rows, columns)`
    fn shape(&self) -> HostResult<(usize, usize)>;
    fn row(&self) -> HostResult<u32>;
    fn column(&self) -> HostResult<u32>;
    fn row_height(&self) -> HostResult<f64>;
    fn column_width(&self) -> HostResult<f64>;
}

/// An embedded chart.
pub trait ChartObject: Send + Sync {
    fn name(&self) -> HostResult<String>;
    fn chart_type(&self) -> HostResult<String>;
    fn sheet_name(&self) -> HostResult<String>;
    fn book_name(&self) -> HostResult<String>;
    fn left(&self) -> HostResult<f64>;
    fn top(&self) -> HostResult<f64>;
    fn width(&self) -> HostResult<f64>;
    fn height(&self) -> HostResult<f64>;
}

/// A live host object.
#[derive(Clone)]
pub enum Handle {
    App(Arc<dyn AppObject>),
    Book(Arc<dyn BookObject>),
    Sheet(Arc<dyn SheetObject>),
    Range(Arc<dyn RangeObject>),
    Chart(Arc<dyn ChartObject>),
}

impl Handle {
    pub fn kind(&self) -> &'static str {
        match self {
            Handle::App(_) => "app",
            Handle::Book(_) => "book",
            Handle::Sheet(_) => "sheet",
            Handle::Range(_) => "range",
            Handle::Chart(_) => "chart",
        }
    }

    /// The flat attribute map for this handle. Never fails.
    pub fn attributes(&self) -> Value {
        let mut fields = Fields::new(self.kind());
        match self {
            Handle::App(app) => {
                fields.read("id", app.pid(), Value::Null, Value::from);
                fields.read("version", app.version(), "unknown".into(), Value::from);
                fields.read("visible", app.visible(), Value::Null, Value::from);
                fields.read("calculation", app.calculation(), "unknown".into(), Value::from);
                fields.read("screen_updating", app.screen_updating(), Value::Null, Value::from);
                fields.read("display_alerts", app.display_alerts(), Value::Null, Value::from);
            }
            Handle::Book(book) => {
                fields.read("name", book.name(), "unknown".into(), Value::from);
                fields.read("fullname", book.fullname(), Value::Null, Value::from);
                fields.read("path", book.fullname(), Value::Null, Value::from);
                fields.read("app_id", book.app_pid(), Value::Null, Value::from);
                fields.read("sheets", book.sheet_names(), Value::Array(Vec::new()), Value::from);
            }
            Handle::Sheet(sheet) => {
                fields.read("name", sheet.name(), "unknown".into(), Value::from);
                fields.read("book_name", sheet.book_name(), Value::Null, Value::from);
                fields.read("index", sheet.index(), Value::Null, Value::from);
                fields.read("used_range", sheet.used_range_address(), Value::Null, Value::from);
            }
            Handle::Range(range) => {
                fields.read("address", range.address(), "unknown".into(), Value::from);
                fields.read("sheet_name", range.sheet_name(), Value::Null, Value::from);
                fields.read("book_name", range.book_name(), Value::Null, Value::from);
                fields.read("value", range.value(), Value::Null, |v| serialize(&v));
                fields.read("formula", range.formula(), Value::Null, |v| serialize(&v));
                fields.read("shape", range.shape(), Value::Null, |(r, c)| {
                    Value::from(vec![r, c])
                });
                fields.read("row", range.row(), Value::Null, Value::from);
                fields.read("column", range.column(), Value::Null, Value::from);
                fields.read("row_height", range.row_height(), Value::Null, float_to_json);
                fields.read("column_width", range.column_width(), Value::Null, float_to_json);
            }
            Handle::Chart(chart) => {
                fields.read("name", chart.name(), "unknown".into(), Value::from);
                fields.read("chart_type", chart.chart_type(), "unknown".into(), Value::from);
                fields.read("sheet_name", chart.sheet_name(), Value::Null, Value::from);
                fields.read("book_name", chart.book_name(), Value::Null, Value::from);
                fields.read("left", chart.left(), Value::Null, float_to_json);
                fields.read("top", chart.top(), Value::Null, float_to_json);
                fields.read("width", chart.width(), Value::Null, float_to_json);
                fields.read("height", chart.height(), Value::Null, float_to_json);
            }
        }
        Value::Object(fields.map)
    }
}

macro_rules! impl_from_object {
    ($($object:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<Arc<dyn $object>> for Handle {
                fn from(object: Arc<dyn $object>) -> Self {
                    Handle::$variant(object)
                }
            }

            impl fmt::Debug for dyn $object {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(stringify!($object))
                }
            }
        )*
    };
}

impl_from_object! {
    AppObject => App,
    BookObject => Book,
    SheetObject => Sheet,
    RangeObject => Range,
    ChartObject => Chart,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle::{}", self.kind())
    }
}

/// Accumulates independently guarded attribute reads.
struct Fields {
    kind: &'static str,
    map: Map<String, Value>,
}

impl Fields {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            map: Map::new(),
        }
    }

    fn read<T>(
        &mut self,
        key: &str,
        attempt: HostResult<T>,
        sentinel: Value,
        convert: impl FnOnce(T) -> Value,
    ) {
        let value = match attempt {
            Ok(v) => convert(v),
            Err(e) => {
                tracing::warn!("Error getting {} {key}: {e}", self.kind);
                sentinel
            }
        };
        self.map.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct FlakyApp;

    impl AppObject for FlakyApp {
        fn pid(&self) -> HostResult<u32> {
            Ok(4242)
        }
        fn version(&self) -> HostResult<String> {
            Err(HostError::Automation("version unavailable".into()))
        }
        fn visible(&self) -> HostResult<bool> {
            Ok(true)
        }
        fn calculation(&self) -> HostResult<String> {
            Err(HostError::Automation("k.missing_value".into()))
        }
        fn screen_updating(&self) -> HostResult<bool> {
            Err(HostError::Automation("nope".into()))
        }
        fn display_alerts(&self) -> HostResult<bool> {
            Ok(false)
        }
    }

    struct BrokenBook;

    impl BookObject for BrokenBook {
        fn name(&self) -> HostResult<String> {
            Err(HostError::Automation("closed".into()))
        }
        fn fullname(&self) -> HostResult<String> {
            Ok("/tmp/a.xlsx".into())
        }
        fn app_pid(&self) -> HostResult<u32> {
            Err(HostError::Automation("closed".into()))
        }
        fn sheet_names(&self) -> HostResult<Vec<String>> {
            Err(HostError::Automation("closed".into()))
        }
    }

    #[test]
    fn test_app_failures_degrade_per_field() {
        let attrs = Handle::App(Arc::new(FlakyApp)).attributes();
        assert_eq!(
            attrs,
            json!({
                "id": 4242,
                "version": "unknown",
                "visible": true,
                "calculation": "unknown",
                "screen_updating": null,
                "display_alerts": false
            })
        );
    }

    #[test]
    fn test_object_debug() {
        let app: Arc<dyn AppObject> = Arc::new(FlakyApp);
        assert_eq!(format!("{app:?}"), "AppObject");
        let result: HostResult<Arc<dyn BookObject>> = Err(HostError::Automation("closed".into()));
        assert!(matches!(result.unwrap_err(), HostError::Automation(_)));
    }

    #[test]
    fn test_book_sentinels() {
        let attrs = Handle::Book(Arc::new(BrokenBook)).attributes();
        assert_eq!(
            attrs,
            json!({
                "name": "unknown",
                "fullname": "/tmp/a.xlsx",
                "path": "/tmp/a.xlsx",
                "app_id": null,
                "sheets": []
            })
        );
    }
}
