//! Fixed-window request limiter.
//!
//! Each client key gets `permits` requests per `window`. The window restarts
//! on the first request after it has elapsed. Rejected requests are not
//! queued. Fully elapsed windows are swept at most once per window length.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tracing::warn;

use super::auth::BasicAuthenticator;
use super::error::ApiError;
use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

#[derive(Debug)]
pub struct FixedWindowLimiter {
    windows: DashMap<String, Window>,
    permits: u32,
    window: Duration,
    last_sweep: Mutex<Instant>,
}

impl FixedWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            permits: config.permits,
            window: config.window,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Take one permit for `key`. Returns false when the window is used up.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        self.sweep(now);

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            used: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                used: 0,
            };
        }

        if entry.used < self.permits {
            entry.used += 1;
            true
        } else {
            false
        }
    }

    /// Remove elapsed windows, unless a sweep ran less than one window ago.
    fn sweep(&self, now: Instant) {
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if now.duration_since(*last) < self.window {
            return;
        }
        *last = now;
        drop(last);

        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }
}

/// Middleware state: the limiter and the credentials used to key it.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub limiter: Arc<FixedWindowLimiter>,
    pub auth: Arc<BasicAuthenticator>,
}

/// Client key: authenticated username, else peer IP, else `anon`.
fn client_key(request: &Request, auth: &BasicAuthenticator) -> String {
    if let Ok(username) = auth.verify(request.headers()) {
        return format!("user:{username}");
    }
    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "anon".to_string(),
    }
}

/// Layer returning 429 once a client exceeds its window.
pub async fn limit_requests(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request, &state.auth);
    if state.limiter.allow(&key) {
        next.run(request).await
    } else {
        warn!(client = %key, path = %request.uri().path(), "rate limit exceeded");
        ApiError::TooManyRequests.into_response()
    }
}
