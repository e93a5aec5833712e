//! Token bucket rate limiter for the credential endpoints.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;

use crate::error::AppError;

/// Simple in-memory token bucket rate limiter keyed by client address.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<Buckets>>,
    max_tokens: u32,
    /// Tokens regained per second.
    refill_rate: f64,
    window: Duration,
    /// Key on the first `x-forwarded-for` hop instead of the socket peer. Only safe when
    /// a reverse proxy overwrites that header.
    trust_forwarded: bool,
}

#[derive(Debug)]
struct Buckets {
    entries: HashMap<String, TokenBucket>,
    last_sweep: Instant,
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Allows `max_requests` per `window`, refilled continuously.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let window_secs = window.as_secs_f64().max(f64::EPSILON);
        Self {
            state: Arc::new(Mutex::new(Buckets {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            max_tokens: max_requests,
            refill_rate: max_requests as f64 / window_secs,
            window,
            trust_forwarded: false,
        }
    }

    pub fn trust_forwarded(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }

    pub fn limit(&self) -> u32 {
        self.max_tokens
    }

    /// Attempts to consume a token for the given key. On refusal, returns how long the
    /// caller has to wait for the next token.
    pub async fn check(&self, key: &str) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        // Buckets that have refilled completely carry no information; drop them once
        // per window so the map only holds recently active clients.
        if now.duration_since(state.last_sweep) >= self.window {
            let max = self.max_tokens as f64;
            let rate = self.refill_rate;
            state.entries.retain(|_, bucket| {
                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                bucket.tokens + elapsed * rate < max
            });
            state.last_sweep = now;
        }

        let bucket = state.entries.entry(key.to_string()).or_insert(TokenBucket {
            tokens: self.max_tokens as f64,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.max_tokens as f64);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - bucket.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate.max(f64::EPSILON)))
        }
    }

    /// Number of clients currently holding a bucket.
    pub async fn tracked_clients(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Client key: the socket peer address, or the first `x-forwarded-for` hop when the
    /// limiter is configured to trust the proxy in front of it.
    fn client_key(&self, request: &Request) -> String {
        if self.trust_forwarded {
            if let Some(forwarded) = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
            {
                return forwarded.to_string();
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// rate_limit_middleware
///
/// Rejects with 429 once the caller's bucket is empty, advertising the limit and the
/// wait through `RateLimit-Limit` and `Retry-After`.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = limiter.client_key(&request);
    if let Err(wait) = limiter.check(&key).await {
        tracing::warn!(client = %key, path = %request.uri().path(), "auth rate limit exceeded");

        let retry_after = wait.as_secs_f64().ceil().max(1.0) as u64;
        let mut response = AppError::TooManyRequests.into_response();
        let headers = response.headers_mut();
        headers.insert(
            HeaderName::from_static("ratelimit-limit"),
            HeaderValue::from(limiter.limit()),
        );
        headers.insert(
            HeaderName::from_static("ratelimit-remaining"),
            HeaderValue::from(0u32),
        );
        headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_from(peer: [u8; 4], forwarded: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/auth/login");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
        request
    }

    #[tokio::test]
    async fn exhausts_after_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(600));
        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(limiter.check("1.2.3.4").await.is_ok());

        let wait = limiter.check("1.2.3.4").await.unwrap_err();
        assert!(wait > Duration::from_secs(100) && wait <= Duration::from_secs(200));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(600));
        assert!(limiter.check("a").await.is_ok());
        assert!(limiter.check("a").await.is_err());
        assert!(limiter.check("b").await.is_ok());
    }

    #[test]
    fn forwarded_header_is_ignored_by_default() {
        let limiter = RateLimiter::new(1, Duration::from_secs(600));
        let request = request_from([192, 168, 1, 9], Some("10.0.0.1"));
        assert_eq!(limiter.client_key(&request), "192.168.1.9");
    }

    #[test]
    fn forwarded_header_is_used_behind_trusted_proxy() {
        let limiter = RateLimiter::new(1, Duration::from_secs(600)).trust_forwarded(true);
        let request = request_from([192, 168, 1, 9], Some("10.0.0.1, 172.16.0.1"));
        assert_eq!(limiter.client_key(&request), "10.0.0.1");

        let without_header = request_from([192, 168, 1, 9], None);
        assert_eq!(limiter.client_key(&without_header), "192.168.1.9");
    }

    #[tokio::test]
    async fn refilled_buckets_are_evicted() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));
        assert!(limiter.check("a").await.is_ok());
        assert_eq!(limiter.tracked_clients().await, 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(limiter.check("b").await.is_ok());
        assert_eq!(limiter.tracked_clients().await, 1);
    }
}
