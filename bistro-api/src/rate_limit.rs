//! Fixed-window rate limiting for the public write routes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ApiError;
use crate::state::AppState;

pub const RESERVATION_LIMIT: u32 = 5;
pub const REVIEW_LIMIT: u32 = 3;
pub const LOGIN_LIMIT: u32 = 5;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    window: Duration,
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, route: &'static str, ip: &str, max_requests: u32) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Drops entries whose window has elapsed.
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < self.window);
        }
        map.retain(|_, route_map| !route_map.is_empty());
    }

    pub async fn tracked_clients(&self) -> usize {
        self.inner.lock().await.values().map(HashMap::len).sum()
    }
}

/// First `X-Forwarded-For` entry, then the peer address.
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn limit(
    state: &AppState,
    route: &'static str,
    max_requests: u32,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = client_ip(&request);
    if !state.rate_limiter.check(route, &ip, max_requests).await {
        tracing::warn!(route, %ip, "rate limit exceeded");
        return Err(ApiError::TooManyRequests.into_response());
    }
    Ok(next.run(request).await)
}

pub async fn reservation_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(&state, "reservations", RESERVATION_LIMIT, request, next).await
}

pub async fn review_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(&state, "reviews", REVIEW_LIMIT, request, next).await
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(&state, "login", LOGIN_LIMIT, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_per_route_and_ip() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("reviews", "10.0.0.1", 3).await);
        }
        assert!(!limiter.check("reviews", "10.0.0.1", 3).await);
        assert!(limiter.check("reviews", "10.0.0.2", 3).await);
        assert!(limiter.check("login", "10.0.0.1", 3).await);
    }

    #[tokio::test]
    async fn test_window_resets_and_cleanup() {
        let limiter = RateLimiter::new(Duration::from_millis(20));
        assert!(limiter.check("login", "10.0.0.1", 1).await);
        assert!(!limiter.check("login", "10.0.0.1", 1).await);

        tokio::time::sleep(Duration::from_millis(30)).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_clients().await, 0);
        assert!(limiter.check("login", "10.0.0.1", 1).await);
    }
}
