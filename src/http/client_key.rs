//! Client identity derivation for the per-client limiter.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Key for unattributable traffic. All such clients share one bucket; that
/// degradation is accepted rather than letting headerless traffic through
/// unmetered.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the rate-limit key for a request.
///
/// Precedence: first `X-Forwarded-For` entry (the client as seen by the
/// outermost proxy), then `X-Real-IP`, then the transport peer address,
/// else [`UNKNOWN_CLIENT`].
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let headers = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1, 10.0.0.2")]);
        assert_eq!(client_key(&headers, None), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_is_trimmed() {
        let headers = headers(&[("x-forwarded-for", "  203.0.113.7 , 10.0.0.1")]);
        assert_eq!(client_key(&headers, None), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_wins_over_real_ip() {
        let headers = headers(&[
            ("x-forwarded-for", "203.0.113.7"),
            ("x-real-ip", "198.51.100.4"),
        ]);
        assert_eq!(client_key(&headers, None), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let headers = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_key(&headers, None), "198.51.100.4");
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let headers = headers(&[("x-forwarded-for", ""), ("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_key(&headers, None), "198.51.100.4");
    }

    #[test]
    fn test_peer_address_fallback() {
        let peer: SocketAddr = "192.0.2.1:52044".parse().unwrap();
        assert_eq!(client_key(&HeaderMap::new(), Some(peer)), "192.0.2.1");
    }

    #[test]
    fn test_unknown_when_nothing_available() {
        assert_eq!(client_key(&HeaderMap::new(), None), UNKNOWN_CLIENT);
    }
}
