//! Fixed-window rate limiting for API routes
//!
//! Clients are identified by the first `X-Forwarded-For` entry. Requests
//! to chat routes count against the chat limiter, everything else under
//! `/api/` against the general one.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// Entries beyond this count trigger a sweep of expired windows
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    /// Epoch milliseconds at which the window ends
    reset: u64,
}

/// Outcome of one rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds at which the window ends
    pub reset: u64,
}

impl RateLimitResult {
    fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert("X-RateLimit-Limit", HeaderValue::from(self.limit));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from(self.remaining));
        headers.insert("X-RateLimit-Reset", HeaderValue::from(self.reset));
    }
}

/// Per-client fixed-window counter
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window_ms: u64,
    entries: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window_ms: window.as_millis() as u64,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count a request from `identifier` at `now_ms`
    pub fn check_at(&self, identifier: &str, now_ms: u64) -> RateLimitResult {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if entries.len() > SWEEP_THRESHOLD {
            entries.retain(|_, w| w.reset >= now_ms);
        }

        match entries.get_mut(identifier) {
            Some(window) if now_ms <= window.reset => {
                window.count = window.count.saturating_add(1);
                if window.count > self.limit {
                    RateLimitResult {
                        success: false,
                        limit: self.limit,
                        remaining: 0,
                        reset: window.reset,
                    }
                } else {
                    RateLimitResult {
                        success: true,
                        limit: self.limit,
                        remaining: self.limit - window.count,
                        reset: window.reset,
                    }
                }
            }
            _ => {
                let reset = now_ms + self.window_ms;
                entries.insert(identifier.to_string(), Window { count: 1, reset });
                RateLimitResult {
                    success: self.limit > 0,
                    limit: self.limit,
                    remaining: self.limit.saturating_sub(1),
                    reset,
                }
            }
        }
    }
}

/// Chat and general API limiters
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub chat: Arc<RateLimiter>,
    pub api: Arc<RateLimiter>,
}

impl RateLimits {
    pub fn from_config(config: &crate::config::ServerConfig) -> Self {
        let window = Duration::from_secs(config.rate_window_secs);
        Self {
            chat: Arc::new(RateLimiter::new(config.chat_rate_limit, window)),
            api: Arc::new(RateLimiter::new(config.api_rate_limit, window)),
        }
    }

    fn for_path(&self, path: &str) -> &RateLimiter {
        if path.contains("/chat") {
            &self.chat
        } else {
            &self.api
        }
    }
}

/// First `X-Forwarded-For` entry, or `anonymous`
pub fn client_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

/// Axum middleware enforcing the limits on `/api/` routes
pub async fn rate_limit_middleware(
    State(limits): State<RateLimits>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if !path.starts_with("/api/") {
        return next.run(request).await;
    }

    let identifier = client_identifier(request.headers());
    let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let result = limits.for_path(path).check_at(&identifier, now_ms);

    if !result.success {
        warn!("Rate limit exceeded for {} on {}", identifier, path);
        let retry_after = result.reset.saturating_sub(now_ms).div_ceil(1000);
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Too Many Requests",
                "message": "Rate limit exceeded. Please try again later.",
                "retryAfter": retry_after,
            })),
        )
            .into_response();
        result.apply_headers(response.headers_mut());
        response.headers_mut().insert("Retry-After", HeaderValue::from(retry_after));
        return response;
    }

    let mut response = next.run(request).await;
    result.apply_headers(response.headers_mut());
    response
}
