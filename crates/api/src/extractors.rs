//! Request extractors.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, OriginalUri},
    http::{header, request::Parts, HeaderMap},
};
use directory_core::{parse_cookie_header, RequestContext};

use crate::state::AppState;

/// Paths under this prefix always get JSON denials.
const AJAX_PATH_PREFIX: &str = "/admin/api/";

/// Everything the session gate needs from the current request.
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub ctx: RequestContext,
    /// XHR-style caller that expects JSON instead of a redirect
    pub is_ajax: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for GateRequest {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = parse_cookie_header(
            parts
                .headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let ClientIp(ip) = ClientIp::from_request_parts(parts, state).await?;
        let uri = request_uri(parts);
        let is_ajax = is_ajax(&parts.headers, &uri);

        let ctx = RequestContext::new(user_agent)
            .with_cookies(&cookies, state.gate.config())
            .with_ip(ip)
            .with_request_uri(uri)
            .with_https(is_https(parts));

        Ok(GateRequest { ctx, is_ajax })
    }
}

/// Path and query as the client sent it, before any router nesting.
fn request_uri(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Whether the request arrived over TLS, directly or via a proxy.
fn is_https(parts: &Parts) -> bool {
    if parts.uri.scheme_str() == Some("https") {
        return true;
    }
    parts
        .headers
        .get("X-Forwarded-Proto")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Whether the caller wants a JSON answer rather than a page.
pub fn is_ajax(headers: &HeaderMap, uri: &str) -> bool {
    let xhr = headers
        .get("X-Requested-With")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

    let prefers_json = headers
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .and_then(|accept| accept.split(',').next())
        .is_some_and(|first| first.trim().starts_with("application/json"));

    xhr || prefers_json || uri.starts_with(AJAX_PATH_PREFIX)
}

/// Client IP address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Try X-Forwarded-For first (for proxied requests)
        if let Some(xff) = parts.headers.get("X-Forwarded-For") {
            if let Ok(xff_str) = xff.to_str() {
                // Take the first IP in the chain
                if let Some(ip) = xff_str.split(',').next() {
                    return Ok(ClientIp(Some(ip.trim().to_string())));
                }
            }
        }

        // Try X-Real-IP
        if let Some(real_ip) = parts.headers.get("X-Real-IP") {
            if let Ok(ip) = real_ip.to_str() {
                return Ok(ClientIp(Some(ip.to_string())));
            }
        }

        // Fall back to the socket peer when served with connect info
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientIp(peer))
    }
}
