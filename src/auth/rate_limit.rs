use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::AppState;

/// Login/signup attempts allowed per client per path in one window.
pub const AUTH_MAX_REQUESTS: u32 = 5;
pub const AUTH_WINDOW: Duration = Duration::from_secs(60);

/// Fixed-window counter keyed by client and path. In-memory, so limits are
/// per instance.
#[derive(Clone)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
    max_requests: u32,
    window: Duration,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new(AUTH_MAX_REQUESTS, AUTH_WINDOW)
    }
}

impl RateLimitState {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Counts one attempt against `key`. Returns the attempts left in the
    /// current window, or the time until it reopens.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get_mut(key) {
            Some(entry) if now.duration_since(entry.window_start) <= self.window => {
                if entry.count >= self.max_requests {
                    let elapsed = now.duration_since(entry.window_start);
                    return Err(self.window.saturating_sub(elapsed));
                }
                entry.count += 1;
                Ok(self.max_requests - entry.count)
            }
            // First attempt, or the previous window has lapsed
            _ if self.max_requests == 0 => Err(self.window),
            _ => {
                entries.insert(
                    key.to_owned(),
                    RateLimitEntry {
                        count: 1,
                        window_start: now,
                    },
                );
                Ok(self.max_requests - 1)
            }
        }
    }

    /// Drops keys whose window ended long ago.
    pub async fn cleanup(&self) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let keep_for = self.window * 2;

        entries.retain(|_, entry| now.duration_since(entry.window_start) < keep_for);
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Runs `cleanup` on an interval for the life of the process.
pub fn spawn_cleanup_worker(limiter: RateLimitState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window * 5);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });
}

/// Middleware for /api/login and /api/signup.
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = addr.ip().to_string();
    let path = req.uri().path().to_string();

    // IP + path so login and signup have separate allowances
    let key = format!("{}:{}", ip, path);

    match state.rate_limiter.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, path = %path, remaining = remaining, "Rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                path = %path,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}
