//! Conversion between host values and JSON.
//!
//! [`serialize`] is total: every [`HostValue`] has a JSON form, falling back
//! to its textual representation when nothing better exists. It is also
//! idempotent: `serialize(&HostValue::from(serialize(&x))) == serialize(&x)`.
//!
//! [`deserialize`] is the partial inverse. It rebuilds frames and series from
//! their tagged payloads and otherwise keeps the JSON structure.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde_json::{json, Map, Value};

use crate::error::{HostError, HostResult};
use crate::value::{float_to_json, DataFrame, HostValue, Series};

pub const DATAFRAME_TAG: &str = "dataframe";
pub const SERIES_TAG: &str = "series";

/// Convert a host value into JSON.
pub fn serialize(value: &HostValue) -> Value {
    match value {
        HostValue::Null => Value::Null,
        HostValue::Bool(b) => Value::Bool(*b),
        HostValue::Int(n) => Value::from(*n),
        HostValue::Float(x) => float_to_json(*x),
        HostValue::Str(s) => Value::String(s.clone()),
        HostValue::Date(d) => Value::String(format_date(d)),
        HostValue::DateTime(dt) => Value::String(format_datetime(dt)),
        HostValue::List(items) => Value::Array(items.iter().map(serialize).collect()),
        HostValue::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (k, v) in entries {
                map.insert(key_string(k), serialize(v));
            }
            Value::Object(map)
        }
        HostValue::Array(arr) => serialize(&arr.to_nested()),
        HostValue::Frame(df) => json!({
            "type": DATAFRAME_TAG,
            "index": serialize_all(df.index()),
            "columns": serialize_all(df.columns()),
            "data": df
                .rows()
                .iter()
                .map(|row| Value::Array(serialize_all(row)))
                .collect::<Vec<_>>(),
        }),
        HostValue::Series(s) => json!({
            "type": SERIES_TAG,
            "index": serialize_all(s.index()),
            "data": serialize_all(s.values()),
        }),
        HostValue::Handle(h) => h.attributes(),
        HostValue::Scalar(s) => s.to_json(),
        HostValue::Object(o) => Value::String(o.to_string()),
    }
}

fn serialize_all(values: &[HostValue]) -> Vec<Value> {
    values.iter().map(serialize).collect()
}

fn key_string(key: &HostValue) -> String {
    match serialize(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DDTHH:MM:SS`, plus six fractional digits when the microsecond
/// part is non-zero.
fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Convert JSON into a host value, rebuilding tagged frames and series.
///
/// A map tagged `"dataframe"` is rebuilt only when `data`, `columns` and
/// `index` are all present; a map tagged `"series"` needs `data` and
/// `index`. Anything else stays a plain map. A tagged payload whose parts
/// are not rectangular is rejected.
pub fn deserialize(value: Value) -> HostResult<HostValue> {
    match value {
        Value::Array(items) => Ok(HostValue::List(
            items
                .into_iter()
                .map(deserialize)
                .collect::<HostResult<_>>()?,
        )),
        Value::Object(map) => {
            match map.get("type").and_then(Value::as_str) {
                Some(DATAFRAME_TAG) if has_keys(&map, &["data", "columns", "index"]) => {
                    return frame_from_map(map).map(HostValue::Frame);
                }
                Some(SERIES_TAG) if has_keys(&map, &["data", "index"]) => {
                    return series_from_map(map).map(HostValue::Series);
                }
                _ => {}
            }
            let entries = map
                .into_iter()
                .map(|(k, v)| Ok((HostValue::Str(k), deserialize(v)?)))
                .collect::<HostResult<_>>()?;
            Ok(HostValue::Map(entries))
        }
        primitive => Ok(HostValue::from(primitive)),
    }
}

fn has_keys(map: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().all(|k| map.contains_key(*k))
}

/// Build a frame from `data`/`columns`/`index` members, ignoring any tag.
pub fn frame_from_map(mut map: Map<String, Value>) -> HostResult<DataFrame> {
    let index = take_list(&mut map, "index")?;
    let columns = take_list(&mut map, "columns")?;
    let data = match map.remove("data") {
        Some(Value::Array(rows)) => rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Array(cells) => cells.into_iter().map(deserialize).collect(),
                _ => Err(HostError::invalid_argument(format!(
                    "dataframe row {i} is not a list"
                ))),
            })
            .collect::<HostResult<Vec<Vec<HostValue>>>>()?,
        _ => return Err(HostError::invalid_argument("dataframe 'data' must be a list")),
    };
    DataFrame::new(index, columns, data)
}

fn series_from_map(mut map: Map<String, Value>) -> HostResult<Series> {
    let index = take_list(&mut map, "index")?;
    let data = take_list(&mut map, "data")?;
    Series::new(index, data)
}

fn take_list(map: &mut Map<String, Value>, key: &str) -> HostResult<Vec<HostValue>> {
    match map.remove(key) {
        Some(Value::Array(items)) => items.into_iter().map(deserialize).collect(),
        _ => Err(HostError::invalid_argument(format!("'{key}' must be a list"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{NdArray, Scalar};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primitives_pass_through() {
        assert_eq!(serialize(&HostValue::Null), Value::Null);
        assert_eq!(serialize(&true.into()), json!(true));
        assert_eq!(serialize(&42.into()), json!(42));
        assert_eq!(serialize(&1.25.into()), json!(1.25));
        assert_eq!(serialize(&"abc".into()), json!("abc"));
    }

    #[test]
    fn test_dates_are_iso8601() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(serialize(&d.into()), json!("2024-03-09"));

        let dt = d.and_hms_opt(14, 5, 0).unwrap();
        assert_eq!(serialize(&dt.into()), json!("2024-03-09T14:05:00"));

        let frac = d.and_hms_micro_opt(14, 5, 0, 250_000).unwrap();
        assert_eq!(serialize(&frac.into()), json!("2024-03-09T14:05:00.250000"));

        let micro = d.and_hms_micro_opt(14, 5, 0, 7).unwrap();
        assert_eq!(serialize(&micro.into()), json!("2024-03-09T14:05:00.000007"));
    }

    #[test]
    fn test_large_unsigned_integers_stay_exact() {
        let big = json!(u64::MAX);
        let value = HostValue::from(big.clone());
        assert!(matches!(value, HostValue::Scalar(Scalar::U64(u64::MAX))));
        assert_eq!(serialize(&value), big);
    }

    #[test]
    fn test_map_keys_coerced_to_strings() {
        let value = HostValue::Map(vec![
            (HostValue::Int(1), "one".into()),
            (HostValue::Bool(true), "yes".into()),
            ("name".into(), HostValue::Null),
        ]);
        assert_eq!(
            serialize(&value),
            json!({"1": "one", "true": "yes", "name": null})
        );
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let value = HostValue::map([("zeta", 1.into()), ("alpha", 2.into())]);
        assert_eq!(serde_json::to_string(&serialize(&value)).unwrap(), r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_numeric_array_uses_nested_lists() {
        let arr = NdArray::from_rows(&[vec![1.5f64, 2.0], vec![3.0, 4.5]]).unwrap();
        assert_eq!(serialize(&arr.into()), json!([[1.5, 2.0], [3.0, 4.5]]));
    }

    #[test]
    fn test_frame_payload() {
        let df = DataFrame::new(
            vec!["r1".into(), "r2".into()],
            vec!["a".into(), "b".into()],
            vec![vec![1.into(), 2.into()], vec![3.into(), HostValue::Null]],
        )
        .unwrap();
        assert_eq!(
            serialize(&df.into()),
            json!({
                "type": "dataframe",
                "index": ["r1", "r2"],
                "columns": ["a", "b"],
                "data": [[1, 2], [3, null]]
            })
        );
    }

    #[test]
    fn test_series_payload() {
        let s = Series::new(vec![0.into(), 1.into()], vec![1.5.into(), 2.5.into()]).unwrap();
        assert_eq!(
            serialize(&s.into()),
            json!({"type": "series", "index": [0, 1], "data": [1.5, 2.5]})
        );
    }

    #[test]
    fn test_scalar_and_opaque_fallback() {
        assert_eq!(serialize(&Scalar::I16(12).into()), json!(12));
        let value = HostValue::object(std::net::Ipv4Addr::LOCALHOST);
        assert_eq!(serialize(&value), json!("127.0.0.1"));
    }

    #[test]
    fn test_nan_inside_list() {
        let value = HostValue::List(vec![f64::NAN.into(), 1.0.into()]);
        assert_eq!(serialize(&value), json!(["NaN", 1.0]));
    }

    #[test]
    fn test_deserialize_frame() {
        let payload = json!({
            "type": "dataframe",
            "index": [0, 1],
            "columns": ["x", "y"],
            "data": [[1, "a"], [2, "b"]]
        });
        let HostValue::Frame(df) = deserialize(payload.clone()).unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(serialize(&HostValue::Frame(df)), payload);
    }

    #[test]
    fn test_deserialize_series() {
        let payload = json!({"type": "series", "index": ["a"], "data": [true]});
        assert!(matches!(deserialize(payload).unwrap(), HostValue::Series(_)));
    }

    #[test]
    fn test_incomplete_tag_stays_a_map() {
        let payload = json!({"type": "dataframe", "data": [[1]]});
        let value = deserialize(payload.clone()).unwrap();
        assert!(matches!(value, HostValue::Map(_)));
        assert_eq!(serialize(&value), payload);
    }

    #[test]
    fn test_ragged_frame_rejected() {
        let payload = json!({
            "type": "dataframe",
            "index": [0, 1],
            "columns": ["x"],
            "data": [[1], [2, 3]]
        });
        assert!(matches!(
            deserialize(payload),
            Err(HostError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_nested_frames_are_rebuilt() {
        let payload = json!({
            "frames": [{"type": "series", "index": [0], "data": [9]}]
        });
        let HostValue::Map(entries) = deserialize(payload).unwrap() else {
            panic!("expected a map");
        };
        let HostValue::List(items) = &entries[0].1 else {
            panic!("expected a list");
        };
        assert!(matches!(items[0], HostValue::Series(_)));
    }
}
