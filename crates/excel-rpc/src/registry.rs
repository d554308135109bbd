//! The method table.
//!
//! A [`MethodRegistry`] is assembled once through [`RegistryBuilder`] and is
//! read-only afterwards; the dispatcher shares it behind an `Arc`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use excel_rpc_protocol::Params;
use futures::future::BoxFuture;

use crate::error::HostResult;
use crate::value::HostValue;

pub type HandlerFuture = BoxFuture<'static, HostResult<HostValue>>;

/// An asynchronous method handler. Receives the request params only when
/// they are present and non-empty.
pub type Handler = Arc<dyn Fn(Option<Params>) -> HandlerFuture + Send + Sync>;

/// Immutable mapping from method name to handler.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Handler>,
}

impl MethodRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, method: &str) -> Option<&Handler> {
        self.methods.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    methods: HashMap<String, Handler>,
}

impl RegistryBuilder {
    /// Register `name`. A later registration under the same name replaces
    /// the earlier one.
    pub fn method<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Option<Params>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HostResult<HostValue>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |params| Box::pin(handler(params)));
        self.methods.insert(name.into(), handler);
        self
    }

    pub fn build(self) -> MethodRegistry {
        MethodRegistry {
            methods: self.methods,
        }
    }
}
