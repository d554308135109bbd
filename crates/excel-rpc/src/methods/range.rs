//! `range.*`: cell blocks addressed in A1 notation.

use serde_json::Value;

use super::{handle, sheet_path, Methods};
use crate::adapter::FrameOptions;
use crate::error::{HostError, HostResult};
use crate::params::Args;
use crate::serialize::{deserialize, frame_from_map};
use crate::value::{DataFrame, HostValue};

pub(super) fn register(methods: Methods) -> Methods {
    methods
        .bind("range.get", |host, args| {
            let at = sheet_path(args, 3)?;
            let address: String = args.required("address", 2)?;
            Ok(handle(host.get_range(&at, &address)?))
        })
        .bind("range.get_value", |host, args| {
            let at = sheet_path(args, 3)?;
            let address: String = args.required("address", 2)?;
            host.get_range_value(&at, &address)
        })
        .bind("range.set_value", |host, args| {
            let at = sheet_path(args, 4)?;
            let address: String = args.required("address", 2)?;
            let value = deserialize(args.value("value", 3)?)?;
            Ok(handle(host.set_range_value(&at, &address, value)?))
        })
        .bind("range.get_formula", |host, args| {
            let at = sheet_path(args, 3)?;
            let address: String = args.required("address", 2)?;
            host.get_range_formula(&at, &address)
        })
        .bind("range.set_formula", |host, args| {
            let at = sheet_path(args, 4)?;
            let address: String = args.required("address", 2)?;
            let formula = deserialize(args.value("formula", 3)?)?;
            Ok(handle(host.set_range_formula(&at, &address, formula)?))
        })
        .bind("range.clear", |host, args| {
            let at = sheet_path(args, 3)?;
            let address: String = args.required("address", 2)?;
            Ok(handle(host.clear_range(&at, &address)?))
        })
        .bind("range.get_as_dataframe", |host, args| {
            let at = sheet_path(args, 5)?;
            let address: String = args.required("address", 2)?;
            let options = frame_options(args, 3)?;
            Ok(HostValue::Frame(host.range_as_frame(&at, &address, options)?))
        })
        .bind("range.set_dataframe", |host, args| {
            let at = sheet_path(args, 6)?;
            let address: String = args.required("address", 2)?;
            let frame = frame_param(args.value("dataframe", 3)?)?;
            let options = frame_options(args, 4)?;
            Ok(handle(host.set_range_frame(&at, &address, &frame, options)?))
        })
}

/// `header` and `index` at `first` and `first + 1`.
fn frame_options(args: &Args, first: usize) -> HostResult<FrameOptions> {
    let defaults = FrameOptions::default();
    Ok(FrameOptions {
        header: args.or("header", first, defaults.header)?,
        index: args.or("index", first + 1, defaults.index)?,
    })
}

/// A tabular payload, tagged or not. Without `index` the rows are numbered.
fn frame_param(value: Value) -> HostResult<DataFrame> {
    let Value::Object(mut map) = value else {
        return Err(HostError::invalid_argument(
            "invalid parameter 'dataframe': expected an object with 'data' and 'columns'",
        ));
    };
    if !map.contains_key("index") {
        let rows = map.get("data").and_then(Value::as_array).map_or(0, Vec::len);
        map.insert("index".to_string(), (0..rows as i64).collect());
    }
    frame_from_map(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::Automation;
    use crate::dispatcher::Dispatcher;
    use crate::memory::MemoryHost;
    use crate::methods::{registry, MethodContext};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        let automation = Automation::start(|| Ok(MemoryHost::with_workbook())).unwrap();
        Dispatcher::new(registry(automation, MethodContext::default()))
    }

    async fn call(d: &Dispatcher, method: &str, params: Value) -> Value {
        let request = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 3});
        serde_json::to_value(d.dispatch(request).await.unwrap()).unwrap()
    }

    fn at(extra: Value) -> Value {
        let mut params = json!({"book": "Book1", "sheet": "Sheet1"});
        if let (Some(map), Value::Object(extra)) = (params.as_object_mut(), extra) {
            map.extend(extra);
        }
        params
    }

    #[tokio::test]
    async fn test_set_and_get_value() {
        let d = dispatcher();
        let set = call(
            &d,
            "range.set_value",
            at(json!({"address": "A1:B2", "value": [[1, 2], [3, 4]]})),
        )
        .await;
        assert_eq!(set["result"]["value"], json!([[1, 2], [3, 4]]));
        assert_eq!(set["result"]["address"], json!("$A$1:$B$2"));

        let cell = call(&d, "range.get_value", at(json!({"address": "B2"}))).await;
        assert_eq!(cell["result"], json!(4));

        let column = call(&d, "range.get_value", json!(["Book1", "Sheet1", "A1:A2"])).await;
        assert_eq!(column["result"], json!([1, 3]));
    }

    #[tokio::test]
    async fn test_formulas() {
        let d = dispatcher();
        call(
            &d,
            "range.set_formula",
            at(json!({"address": "C1", "formula": "=A1+B1"})),
        )
        .await;
        let formula = call(&d, "range.get_formula", at(json!({"address": "C1"}))).await;
        assert_eq!(formula["result"], json!("=A1+B1"));
    }

    #[tokio::test]
    async fn test_dataframe_round_trip() {
        let d = dispatcher();
        let frame = json!({
            "type": "dataframe",
            "index": ["a", "b"],
            "columns": ["x", "y"],
            "data": [[1, 2.5], [3, null]]
        });
        let set = call(
            &d,
            "range.set_dataframe",
            at(json!({"address": "A1", "dataframe": frame, "index": true})),
        )
        .await;
        assert_eq!(set["result"]["address"], json!("$A$1:$C$3"));

        let got = call(
            &d,
            "range.get_as_dataframe",
            at(json!({"address": "A1:C3", "index": true})),
        )
        .await;
        assert_eq!(got["result"], frame);
    }

    #[tokio::test]
    async fn test_untagged_dataframe_gets_default_index() {
        let d = dispatcher();
        let set = call(
            &d,
            "range.set_dataframe",
            at(json!({"address": "B2", "dataframe": {"columns": ["n"], "data": [[1], [2]]}})),
        )
        .await;
        assert_eq!(set["result"]["value"], json!(["n", 1, 2]));
    }

    #[tokio::test]
    async fn test_bad_address_is_range_error() {
        let d = dispatcher();
        let response = call(&d, "range.get", at(json!({"address": "ZZZZ0"}))).await;
        assert_eq!(response["error"]["code"], json!(-32003));
    }

    #[test]
    fn test_frame_param_rejects_scalars() {
        assert!(frame_param(json!(5)).is_err());
    }
}
