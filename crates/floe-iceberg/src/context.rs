//! Request context extraction for REST handlers.

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::HeaderName;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request context derived from headers and the connection.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing/correlation.
    pub request_id: String,
    /// Best-effort client address.
    pub client_ip: Option<String>,
}

impl RequestContext {
    fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let request_id =
            header_string(headers, REQUEST_ID_HEADER).unwrap_or_else(|| ulid::Ulid::new().to_string());
        Self {
            request_id,
            client_ip: client_ip(headers, peer),
        }
    }
}

/// Proxy headers win over the socket peer: first `X-Forwarded-For` entry,
/// then `X-Real-IP`.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    header_string(headers, "x-forwarded-for")
        .and_then(|value| {
            value
                .split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
        })
        .or_else(|| header_string(headers, "x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn add_request_id_header(response: &mut Response, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
}

/// Middleware that injects a [`RequestContext`], echoes the request ID and
/// logs the request outcome.
pub async fn context_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let (mut parts, body) = req.into_parts();

    let ctx = match parts.extensions.get::<RequestContext>() {
        Some(existing) => existing.clone(),
        None => {
            let peer = parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);
            RequestContext::from_parts(&parts.headers, peer)
        }
    };
    parts.extensions.insert(ctx.clone());

    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let mut response = next.run(Request::from_parts(parts, body)).await;
    add_request_id_header(&mut response, &ctx.request_id);

    tracing::info!(
        request_id = %ctx.request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        client_ip = ctx.client_ip.as_deref().unwrap_or("-"),
        "request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-Id", HeaderValue::from_static("req-42"));

        let ctx = RequestContext::from_parts(&headers, None);
        assert_eq!(ctx.request_id, "req-42");
        assert_eq!(ctx.client_ip, None);
    }

    #[test]
    fn test_request_id_generated() {
        let ctx = RequestContext::from_parts(&HeaderMap::new(), None);
        assert_eq!(ctx.request_id.len(), 26);
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().expect("addr");
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("10.0.0.9"));

        headers.insert("X-Real-IP", HeaderValue::from_static("192.168.1.1"));
        assert_eq!(
            client_ip(&headers, Some(peer)).as_deref(),
            Some("192.168.1.1")
        );

        headers.insert(
            "X-Forwarded-For",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            client_ip(&headers, Some(peer)).as_deref(),
            Some("203.0.113.7")
        );
    }
}
