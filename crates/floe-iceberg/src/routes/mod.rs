//! Route handlers for REST catalog endpoints.

pub mod catalog;
pub mod config;
pub mod namespaces;
pub mod openapi;
pub mod sidecars;
pub mod tables;
pub(crate) mod utils;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    use floe_catalog::{Catalog, MemoryCatalog};

    use crate::router::rest_router;
    use crate::state::AppState;

    pub(crate) fn memory_app() -> (Arc<MemoryCatalog>, Router) {
        let catalog = Arc::new(MemoryCatalog::new());
        let state = AppState::new(Arc::clone(&catalog) as Arc<dyn Catalog>);
        (catalog, rest_router(state))
    }

    pub(crate) async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub(crate) fn table_body(name: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "schema": {
                "type": "struct",
                "schema-id": 0,
                "fields": [{"id": 1, "name": "id", "required": true, "type": "long"}]
            }
        })
    }
}
