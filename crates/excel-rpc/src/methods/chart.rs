//! `chart.*`: embedded charts. Chart types and legend positions are
//! translated for the configured platform before they reach the host.

use excel_rpc_protocol::ChartRef;
use serde_json::{json, Value};

use super::{handle, handles, sheet_path, Methods};
use crate::adapter::{ChartPlacement, ChartSettings, PdfQuality};
use crate::error::{HostError, HostResult};
use crate::platform::{LegendPosition, Platform};
use crate::value::HostValue;

pub(super) fn register(methods: Methods) -> Methods {
    let platform = methods.ctx.platform;
    methods
        .bind("chart.list", |host, args| {
            let at = sheet_path(args, 2)?;
            Ok(handles(host.list_charts(&at)?))
        })
        .bind("chart.get", |host, args| {
            let at = sheet_path(args, 3)?;
            let chart: ChartRef = args.required("chart", 2)?;
            Ok(handle(host.get_chart(&at, &chart)?))
        })
        .bind("chart.add", |host, args| {
            let at = sheet_path(args, 6)?;
            let placement = ChartPlacement {
                left: args.optional("left", 2)?,
                top: args.optional("top", 3)?,
                width: args.optional("width", 4)?,
                height: args.optional("height", 5)?,
            };
            Ok(handle(host.add_chart(&at, placement)?))
        })
        .bind("chart.delete", |host, args| {
            let at = sheet_path(args, 3)?;
            let chart: ChartRef = args.required("chart", 2)?;
            host.delete_chart(&at, &chart)?;
            Ok(HostValue::Bool(true))
        })
        .bind("chart.set_source_data", |host, args| {
            let at = sheet_path(args, 4)?;
            let chart: ChartRef = args.required("chart", 2)?;
            let range: String = args.required("range", 3)?;
            Ok(handle(host.set_source_data(&at, &chart, &range)?))
        })
        .bind("chart.set_chart_type", move |host, args| {
            let at = sheet_path(args, 4)?;
            let chart: ChartRef = args.required("chart", 2)?;
            let chart_type: String = args.required("type", 3)?;
            let native = platform.chart_type(&chart_type);
            Ok(handle(host.set_chart_type(&at, &chart, &native)?))
        })
        .bind("chart.export_as_pdf", |host, args| {
            let at = sheet_path(args, 5)?;
            let chart: ChartRef = args.required("chart", 2)?;
            let path: Option<String> = args.optional("path", 3)?;
            let quality: PdfQuality = args
                .or("quality", 4, "standard".to_string())?
                .parse()?;
            let written = host.export_pdf(&at, &chart, path.as_deref(), quality)?;
            Ok(json!({"path": written.display().to_string()}).into())
        })
        .bind("chart.export_as_picture", |host, args| {
            let at = sheet_path(args, 4)?;
            let chart: ChartRef = args.required("chart", 2)?;
            let path: Option<String> = args.optional("path", 3)?;
            let written = host.export_picture(&at, &chart, path.as_deref())?;
            Ok(json!({"path": written.display().to_string()}).into())
        })
        .bind("chart.customize", move |host, args| {
            let at = sheet_path(args, 4)?;
            let chart: ChartRef = args.required("chart", 2)?;
            let settings = chart_settings(platform, args.value("settings", 3)?)?;
            Ok(handle(host.customize_chart(&at, &chart, &settings)?))
        })
        .local("chart.get_types", move |_| {
            Ok(platform.supported_chart_types().into())
        })
}

/// Decode customization settings and translate them for `platform`.
fn chart_settings(platform: Platform, raw: Value) -> HostResult<ChartSettings> {
    let legend_position = match raw.get("legend_position") {
        None | Some(Value::Null) => None,
        Some(Value::String(position)) => Some(position.parse::<LegendPosition>()?),
        Some(other) => {
            return Err(HostError::invalid_argument(format!(
                "invalid legend position {other}"
            )))
        }
    };
    let mut settings: ChartSettings = serde_json::from_value(raw)
        .map_err(|e| HostError::invalid_argument(format!("invalid parameter 'settings': {e}")))?;
    settings.chart_type = settings.chart_type.map(|t| platform.chart_type(&t));
    settings.legend_position = legend_position;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::Automation;
    use crate::dispatcher::Dispatcher;
    use crate::memory::MemoryHost;
    use crate::methods::{registry, MethodContext};
    use pretty_assertions::assert_eq;

    fn dispatcher(platform: Platform) -> Dispatcher {
        let automation = Automation::start(|| Ok(MemoryHost::with_workbook())).unwrap();
        Dispatcher::new(registry(automation, MethodContext { platform }))
    }

    async fn call(d: &Dispatcher, method: &str, params: Value) -> Value {
        let request = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 9});
        serde_json::to_value(d.dispatch(request).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_chart_type_is_translated_on_macos() {
        let d = dispatcher(Platform::MacOs);
        call(&d, "chart.add", json!({"book": "Book1", "sheet": 0})).await;
        let updated = call(
            &d,
            "chart.set_chart_type",
            json!({"book": "Book1", "sheet": 0, "chart": 0, "type": "bar"}),
        )
        .await;
        assert_eq!(updated["result"]["chart_type"], json!("bar_clustered"));
    }

    #[tokio::test]
    async fn test_unknown_chart_type() {
        let d = dispatcher(Platform::Windows);
        call(&d, "chart.add", json!({"book": "Book1", "sheet": 0})).await;
        let response = call(
            &d,
            "chart.set_chart_type",
            json!({"book": "Book1", "sheet": 0, "chart": "Chart 1", "type": "sparkle"}),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(-32008));
    }

    #[tokio::test]
    async fn test_missing_chart() {
        let d = dispatcher(Platform::Windows);
        let response = call(
            &d,
            "chart.get",
            json!({"book": "Book1", "sheet": 0, "chart": "Chart 5"}),
        )
        .await;
        assert_eq!(response["error"]["code"], json!(-32007));
        assert_eq!(response["error"]["message"], json!("Chart 'Chart 5' not found"));
    }

    #[tokio::test]
    async fn test_add_customize_export() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(Platform::Windows);

        let added = call(
            &d,
            "chart.add",
            json!({"book": "Book1", "sheet": "Sheet1", "left": 20, "width": 300}),
        )
        .await;
        assert_eq!(added["result"]["name"], json!("Chart 1"));
        assert_eq!(added["result"]["left"], json!(20.0));
        assert_eq!(added["result"]["width"], json!(300.0));

        let customized = call(
            &d,
            "chart.customize",
            json!({
                "book": "Book1",
                "sheet": "Sheet1",
                "chart": "Chart 1",
                "settings": {"name": "Revenue", "has_legend": true, "legend_position": "bottom"}
            }),
        )
        .await;
        assert_eq!(customized["result"]["name"], json!("Revenue"));

        let path = dir.path().join("revenue.pdf").display().to_string();
        let exported = call(
            &d,
            "chart.export_as_pdf",
            json!({"book": "Book1", "sheet": "Sheet1", "chart": "Revenue", "path": path}),
        )
        .await;
        assert_eq!(exported["result"], json!({"path": path}));

        let bad_quality = call(
            &d,
            "chart.export_as_pdf",
            json!({"book": "Book1", "sheet": "Sheet1", "chart": 0, "quality": "high"}),
        )
        .await;
        assert_eq!(bad_quality["error"]["code"], json!(-32602));

        let deleted = call(
            &d,
            "chart.delete",
            json!({"book": "Book1", "sheet": "Sheet1", "chart": "Revenue"}),
        )
        .await;
        assert_eq!(deleted["result"], json!(true));
    }

    #[test]
    fn test_invalid_legend_position() {
        let err = chart_settings(
            Platform::Windows,
            json!({"has_legend": true, "legend_position": "middle"}),
        )
        .unwrap_err();
        assert!(matches!(err, HostError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_get_types_per_platform() {
        let d = dispatcher(Platform::MacOs);
        let types = call(&d, "chart.get_types", json!(null)).await;
        let types = types["result"].as_array().unwrap();
        assert!(types.contains(&json!("column_clustered")));
        assert!(!types.contains(&json!("column")));
    }
}
