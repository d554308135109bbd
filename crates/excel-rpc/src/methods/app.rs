//! `app.*`: Excel application instances.

use super::{handle, handles, Methods};
use crate::adapter::CalculationMode;
use crate::value::HostValue;

pub(super) fn register(methods: Methods) -> Methods {
    methods
        .bind("app.list", |host, _| Ok(handles(host.list_apps()?)))
        .bind("app.get", |host, args| {
            let pid = args.optional("pid", 0)?;
            Ok(handle(host.get_app(pid)?))
        })
        .bind("app.create", |host, args| {
            let visible = args.or("visible", 0, true)?;
            let add_book = args.or("add_book", 1, true)?;
            Ok(handle(host.create_app(visible, add_book)?))
        })
        .bind("app.quit", |host, args| {
            let pid = args.required("pid", 0)?;
            let save_changes = args.or("save_changes", 1, true)?;
            host.quit_app(pid, save_changes)?;
            Ok(HostValue::Bool(true))
        })
        .bind("app.set_calculation", |host, args| {
            let pid = args.required("pid", 0)?;
            let mode: CalculationMode = args.required::<String>("mode", 1)?.parse()?;
            Ok(handle(host.set_calculation(pid, mode)?))
        })
        .bind("app.get_calculation", |host, args| {
            let pid = args.required("pid", 0)?;
            Ok(HostValue::Str(host.get_calculation(pid)?))
        })
        .bind("app.get_books", |host, args| {
            let pid = args.required("pid", 0)?;
            Ok(handles(host.app_books(pid)?))
        })
}

#[cfg(test)]
mod tests {
    use crate::automation::Automation;
    use crate::dispatcher::Dispatcher;
    use crate::memory::MemoryHost;
    use crate::methods::{registry, MethodContext};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn dispatcher() -> Dispatcher {
        let automation = Automation::start(|| Ok(MemoryHost::new())).unwrap();
        Dispatcher::new(registry(automation, MethodContext::default()))
    }

    async fn call(d: &Dispatcher, method: &str, params: Value) -> Value {
        let request = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1});
        serde_json::to_value(d.dispatch(request).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_create_list_quit() {
        let d = dispatcher();
        let created = call(&d, "app.create", json!({"visible": false})).await;
        let app = &created["result"];
        assert_eq!(app["visible"], json!(false));
        assert_eq!(app["calculation"], json!("automatic"));
        let pid = app["id"].clone();

        let listed = call(&d, "app.list", json!({})).await;
        assert_eq!(listed["result"].as_array().unwrap().len(), 1);

        let books = call(&d, "app.get_books", json!([pid])).await;
        assert_eq!(books["result"][0]["name"], json!("Book1"));

        let quit = call(&d, "app.quit", json!({"pid": pid, "save_changes": false})).await;
        assert_eq!(quit["result"], json!(true));
    }

    #[tokio::test]
    async fn test_calculation_modes() {
        let d = dispatcher();
        let created = call(&d, "app.create", json!({})).await;
        let pid = created["result"]["id"].clone();

        let set = call(&d, "app.set_calculation", json!({"pid": pid, "mode": "Manual"})).await;
        assert_eq!(set["result"]["calculation"], json!("manual"));
        let got = call(&d, "app.get_calculation", json!({"pid": pid})).await;
        assert_eq!(got["result"], json!("manual"));

        let bad = call(&d, "app.set_calculation", json!({"pid": pid, "mode": "often"})).await;
        assert_eq!(bad["error"]["code"], json!(-32602));
    }

    #[tokio::test]
    async fn test_quit_unknown_app() {
        let d = dispatcher();
        let response = call(&d, "app.quit", json!({"pid": 999999})).await;
        assert_eq!(response["error"]["code"], json!(-32000));
        assert_eq!(
            response["error"]["message"],
            json!("No Excel application found with PID 999999")
        );
    }
}
