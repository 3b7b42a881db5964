//! Helpers shared by self-service flows.

use http::{header::HOST, request::Parts};

/// Request extension set by the transport when the connection is TLS-terminated
/// in-process. Only consulted when the request URI carries no scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlsConnection;

/// Reconstruct the absolute URL a flow was initiated from.
///
/// The host comes from the `Host` header, falling back to the URI authority.
/// The scheme is the URI's own when present, otherwise `https` if the
/// connection carries [`TlsConnection`] and `http` if not.
pub fn request_url(parts: &Parts) -> String {
    let host = parts
        .headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or_default();

    let scheme = match parts.uri.scheme_str() {
        Some(scheme) => scheme,
        None if parts.extensions.get::<TlsConnection>().is_some() => "https",
        None => "http",
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("{}://{}{}", scheme, host, path_and_query)
}
