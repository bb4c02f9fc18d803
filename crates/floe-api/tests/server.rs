//! Server-level tests against the composed router.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use floe_api::config::{Config, CorsConfig, CorsOrigins};
use floe_api::server::Server;
use floe_catalog::{Catalog, FollowerCatalog, MemoryCatalog};

async fn call(router: &Router, request: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .map_err(|err| -> anyhow::Error { match err {} })?;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .context("read response body")?;
    Ok((status, body.to_vec()))
}

fn get(uri: &str) -> Result<Request<Body>> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .context("build request")
}

#[tokio::test]
async fn config_endpoint_reflects_environment() -> Result<()> {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("FLOE_CONFIG_DEFAULTS", "clients=4"),
        ("FLOE_CONFIG_OVERRIDES", "warehouse=s3://lake"),
    ]);
    let config = Config::from_lookup(|name| vars.get(name).map(ToString::to_string))?;
    let router = Server::new(config).router();

    let (status, body) = call(&router, get("/v1/config")?).await?;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).context("parse JSON body")?;
    assert_eq!(json["defaults"], json!({"clients": "4"}));
    assert_eq!(json["overrides"], json!({"warehouse": "s3://lake"}));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let router = Server::new(Config::default()).router();
    let (status, body) = call(&router, get("/openapi.json")?).await?;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).context("parse JSON body")?;
    assert!(json["paths"].get("/v1/transactions/commit").is_some());
    Ok(())
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() -> Result<()> {
    let config = Config {
        cors: CorsConfig {
            origins: CorsOrigins::List(vec!["http://ui.test".to_string()]),
            ..CorsConfig::default()
        },
        ..Config::default()
    };
    let router = Server::new(config).router();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/v1/namespaces")
        .header(header::ORIGIN, "http://ui.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .context("build request")?;
    let response = router.oneshot(request).await.map_err(|err| -> anyhow::Error { match err {} })?;

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://ui.test")
    );
    Ok(())
}

#[tokio::test]
async fn cors_disabled_by_default() -> Result<()> {
    let router = Server::new(Config::default()).router();
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://ui.test")
        .body(Body::empty())
        .context("build request")?;
    let response = router.oneshot(request).await.map_err(|err| -> anyhow::Error { match err {} })?;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
    Ok(())
}

#[tokio::test]
async fn metrics_rendered_after_requests() -> Result<()> {
    floe_iceberg::metrics::install_recorder().context("install recorder")?;
    let router = Server::new(Config::default()).router();

    let (status, _) = call(&router, get("/v1/namespaces")?).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&router, get("/metrics")?).await?;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).context("metrics are utf-8")?;
    assert!(text.contains("floe_request_total"));
    assert!(text.contains("route=\"/v1/namespaces\""));
    Ok(())
}

#[tokio::test]
async fn transactions_reach_configured_followers() -> Result<()> {
    let primary = Arc::new(MemoryCatalog::new());
    let replica = Arc::new(MemoryCatalog::new().with_name("replica-0"));
    let server = Server::with_catalog(
        Config::default(),
        Arc::clone(&primary) as Arc<dyn Catalog>,
        vec![Arc::clone(&replica) as Arc<dyn FollowerCatalog>],
    );
    let router = server.router();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/transactions/commit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!([{"set_kv_sidecar": {"key": "epoch", "value": "3"}}]).to_string(),
        ))
        .context("build request")?;
    let (status, body) = call(&router, request).await?;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).context("parse JSON body")?;
    assert_eq!(json["committed"], 1);

    assert_eq!(replica.get_sidecar("epoch").await?, "3");
    assert_eq!(primary.get_sidecar("epoch").await?, "3");
    Ok(())
}
