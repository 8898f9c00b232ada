//! Request snapshot consumed by the filter engine.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderName, Request};

/// Header used by script clients to mark a request as XHR.
pub const X_REQUESTED_WITH: &str = "x-requested-with";

/// Transport the request arrived on.
///
/// Inserted as a request extension by the server when the listener terminates TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSecurity {
    Plain,
    Encrypted,
}

/// How the HTTP layer derives a [`RequestContext`].
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Header carrying the client address when running behind a proxy
    /// (e.g. `X-Forwarded-For`). The first comma-separated entry is used.
    pub client_ip_header: Option<HeaderName>,
}

/// Read-only view of one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Client IP address, without port.
    pub source_address: String,
    /// Raw User-Agent header value, empty when absent. Bytes that are not
    /// UTF-8 are replaced, never dropped.
    pub client_agent: String,
    pub is_xhr: bool,
    pub is_secure: bool,
    pub path: String,
}

impl RequestContext {
    /// Snapshot the fields the filter needs from an HTTP request.
    pub fn from_request<B>(req: &Request<B>, options: &ContextOptions) -> Self {
        let headers = req.headers();

        let forwarded = options
            .client_ip_header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let source_address = forwarded.unwrap_or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
                .unwrap_or_default()
        });

        let client_agent = headers
            .get(header::USER_AGENT)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();

        let is_xhr = headers
            .get(X_REQUESTED_WITH)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
            .unwrap_or(false);

        // Only the listener knows the transport; the request line is client input.
        let is_secure = matches!(
            req.extensions().get::<TransportSecurity>(),
            Some(TransportSecurity::Encrypted)
        );

        Self {
            source_address,
            client_agent,
            is_xhr,
            is_secure,
            path: req.uri().path().to_string(),
        }
    }
}
