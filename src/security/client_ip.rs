//! Client identity and scheme behind at most one trusted proxy.
//!
//! With zero trusted hops the socket peer is the client and forwarded
//! headers are ignored. With one hop the peer is our proxy, so the client is
//! the right-most `X-Forwarded-For` entry and the scheme comes from
//! `X-Forwarded-Proto`.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Key used when neither a socket address nor a trusted header is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Socket peer recorded by `into_make_service_with_connect_info`.
pub fn peer_addr<B>(request: &Request<B>) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Resolve the client address used for rate limiting.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_hops: u8) -> Option<IpAddr> {
    if trust_proxy_hops == 1 {
        let forwarded = headers
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .last()
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }
    peer.map(|addr| addr.ip())
}

/// Rate-limit key for a request.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_hops: u8) -> String {
    client_ip(headers, peer, trust_proxy_hops)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// True when the proxy in front of us reports an HTTPS client connection.
pub fn forwarded_https(headers: &HeaderMap, trust_proxy_hops: u8) -> bool {
    if trust_proxy_hops != 1 {
        return false;
    }
    headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}
