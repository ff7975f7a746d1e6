//! Fixed-window rate limiting per client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::http::error::RelayError;
use crate::observability::metrics;
use crate::security::client_ip::{client_key, peer_addr};

pub const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Counter for one client's current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's window resets.
    pub reset_after: Duration,
}

impl Admission {
    /// Seconds until reset, rounded up.
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

/// Per-client admission control over fixed windows.
///
/// The check for a key runs under that key's map shard lock, so concurrent
/// requests from one client are counted exactly.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count a request from `key` and decide whether it is admitted.
    pub fn admit(&self, key: &str) -> Admission {
        self.admit_at(key, Instant::now())
    }

    fn admit_at(&self, key: &str, now: Instant) -> Admission {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert(Window { count: 0, started: now });

        if now.saturating_duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.saturating_duration_since(entry.started);
        Admission {
            allowed: entry.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(elapsed),
        }
    }

    /// Drop windows that have expired.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Standard rate-limit headers describing an admission.
    pub fn write_headers(&self, admission: &Admission, headers: &mut HeaderMap) {
        let policy = format!("{};w={}", self.max_requests, self.window.as_secs());
        if let Ok(value) = HeaderValue::from_str(&policy) {
            headers.insert(RATELIMIT_POLICY, value);
        }
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(admission.limit));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(admission.remaining));
        headers.insert(RATELIMIT_RESET, HeaderValue::from(admission.reset_secs()));
    }
}

/// Periodically evict expired windows until shutdown.
pub async fn run_sweeper(limiter: Arc<RateLimiter>, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
    let mut interval = tokio::time::interval(limiter.window());
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                limiter.sweep();
                tracing::debug!(tracked = limiter.tracked_clients(), "Rate limit windows swept");
            }
            _ = shutdown.recv() => break,
        }
    }
}

/// State for the rate limiting middleware.
#[derive(Clone)]
pub struct RateLimitGate {
    pub limiter: Arc<RateLimiter>,
    pub trust_proxy_hops: u8,
}

/// Middleware function for per-client rate limiting.
pub async fn rate_limit_middleware(
    State(gate): State<RateLimitGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(request.headers(), peer_addr(&request), gate.trust_proxy_hops);
    let admission = gate.limiter.admit(&key);

    let mut response = if admission.allowed {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, limit = admission.limit, "Rate limit exceeded");
        metrics::record_security_rejection("rate_limited");
        RelayError::RateLimited {
            retry_after_secs: admission.reset_secs(),
        }
        .into_response()
    };

    gate.limiter.write_headers(&admission, response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_request_crossing_quota() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        let results: Vec<bool> = (0..4).map(|_| limiter.admit_at("1.2.3.4", now).allowed).collect();
        assert_eq!(results, vec![true, true, true, false]);
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();
        assert_eq!(limiter.admit_at("k", now).remaining, 1);
        assert_eq!(limiter.admit_at("k", now).remaining, 0);
        assert_eq!(limiter.admit_at("k", now).remaining, 0);
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.admit_at("k", start).allowed);
        assert!(!limiter.admit_at("k", start + Duration::from_secs(59)).allowed);

        let later = limiter.admit_at("k", start + Duration::from_secs(60));
        assert!(later.allowed);
        assert_eq!(later.reset_after, Duration::from_secs(60));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.admit_at("a", now).allowed);
        assert!(limiter.admit_at("b", now).allowed);
        assert!(!limiter.admit_at("a", now).allowed);
    }

    #[test]
    fn test_reset_seconds_round_up() {
        let limiter = RateLimiter::new(5, Duration::from_secs(900));
        let start = Instant::now();
        limiter.admit_at("k", start);
        let admission = limiter.admit_at("k", start + Duration::from_millis(1500));
        assert_eq!(admission.reset_secs(), 899);
    }

    #[test]
    fn test_sweep_drops_only_expired_windows() {
        let limiter = RateLimiter::new(5, Duration::from_secs(10));
        let start = Instant::now();
        limiter.admit_at("old", start);
        limiter.admit_at("new", start + Duration::from_secs(8));
        limiter.sweep_at(start + Duration::from_secs(12));
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.windows.contains_key("new"));
    }

    #[test]
    fn test_headers() {
        let limiter = RateLimiter::new(100, Duration::from_secs(900));
        let admission = limiter.admit("k");
        let mut headers = HeaderMap::new();
        limiter.write_headers(&admission, &mut headers);
        assert_eq!(headers[RATELIMIT_POLICY], "100;w=900");
        assert_eq!(headers[RATELIMIT_LIMIT], "100");
        assert_eq!(headers[RATELIMIT_REMAINING], "99");
        assert_eq!(headers[RATELIMIT_RESET], "900");
    }

    #[test]
    fn test_concurrent_admissions_are_counted_exactly() {
        let limiter = Arc::new(RateLimiter::new(50, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..25).filter(|_| limiter.admit("burst").allowed).count())
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }
}
