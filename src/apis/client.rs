/// Base HTTP client and per-provider rate limiter
///
/// The limiter admits up to `requests_per_minute` calls per 60 s window.
/// Callers above the ceiling wait in a FIFO queue and are released when the
/// window resets; they are never rejected.
use super::retry::{self, RetryPolicy};
use super::stats::{ApiStats, ApiStatsTracker};
use crate::errors::{ApiError, ConfigError};
use crate::logger::{self, LogTag};
use chrono::Utc;
use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Length of one admission window
pub const WINDOW: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("tokenscope/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// RATE LIMITER
// ============================================================================

struct LimiterState {
    current_requests: u32,
    queue: VecDeque<oneshot::Sender<()>>,
    /// Unix milliseconds of the next scheduled reset
    reset_at_ms: i64,
}

/// Snapshot returned by [`RateLimiter::status`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterStatus {
    pub name: String,
    pub current_requests: u32,
    pub limit: u32,
    pub queue_size: usize,
    pub reset_time: i64,
}

pub struct RateLimiter {
    name: String,
    requests_per_minute: u32,
    state: Mutex<LimiterState>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    pub fn new(name: &str, requests_per_minute: u32) -> Result<Self, ConfigError> {
        if requests_per_minute == 0 {
            return Err(ConfigError::invalid(
                &format!("{}.rate_limit_per_minute", name.to_lowercase()),
                "rate limit must be greater than 0",
            ));
        }

        Ok(Self {
            name: name.to_string(),
            requests_per_minute,
            state: Mutex::new(LimiterState {
                current_requests: 0,
                queue: VecDeque::new(),
                reset_at_ms: next_reset_ms(),
            }),
            reset_task: Mutex::new(None),
        })
    }

    /// Spawn the window-reset task
    ///
    /// The task holds only a weak reference, so dropping the last `Arc`
    /// ends it. Calling `start` twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.reset_task.lock();
        if task.is_some() {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + WINDOW, WINDOW);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(limiter) => limiter.reset_window(),
                    None => break,
                }
            }
        }));
    }

    /// Stop the reset task and release every queued caller
    pub fn stop(&self) {
        if let Some(task) = self.reset_task.lock().take() {
            task.abort();
        }

        let released: Vec<_> = self.state.lock().queue.drain(..).collect();
        let count = released.len();
        for waiter in released {
            let _ = waiter.send(());
        }

        if count > 0 {
            logger::debug(
                LogTag::RateLimit,
                &format!("{}: released {} queued requests on stop", self.name, count),
            );
        }
    }

    /// Wait until the caller may issue one request
    pub async fn acquire(&self) {
        let receiver = {
            let mut state = self.state.lock();
            if state.current_requests < self.requests_per_minute {
                state.current_requests += 1;
                return;
            }

            let (sender, receiver) = oneshot::channel();
            state.queue.push_back(sender);
            logger::debug(
                LogTag::RateLimit,
                &format!("{}: request queued. Queue size: {}", self.name, state.queue.len()),
            );
            receiver
        };

        // A dropped sender only happens when the limiter itself is gone
        let _ = receiver.await;
    }

    /// Start a new window and admit queued callers up to the ceiling
    ///
    /// Normally driven by the task from [`RateLimiter::start`].
    pub fn reset_window(&self) {
        let mut state = self.state.lock();
        state.current_requests = 0;
        state.reset_at_ms = next_reset_ms();

        while state.current_requests < self.requests_per_minute {
            let Some(waiter) = state.queue.pop_front() else {
                break;
            };
            // Callers that gave up while queued do not consume a slot
            if waiter.send(()).is_ok() {
                state.current_requests += 1;
            }
        }
    }

    pub fn status(&self) -> RateLimiterStatus {
        let state = self.state.lock();
        RateLimiterStatus {
            name: self.name.clone(),
            current_requests: state.current_requests,
            limit: self.requests_per_minute,
            queue_size: state.queue.len(),
            reset_time: state.reset_at_ms,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(task) = self.reset_task.get_mut().take() {
            task.abort();
        }
    }
}

fn next_reset_ms() -> i64 {
    Utc::now().timestamp_millis() + WINDOW.as_millis() as i64
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

/// HTTP client wrapper with timeout
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self, String> {
        if timeout_secs == 0 {
            return Err("Timeout must be greater than zero".to_string());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// ============================================================================
// PROVIDER TRANSPORT
// ============================================================================

/// Longest error body kept in stats and error messages
const MAX_ERROR_BODY_CHARS: usize = 300;

/// One provider's outbound path: rate limiter, retry policy, stats
///
/// Every attempt (including retries) acquires its own limiter slot.
pub struct ApiTransport {
    name: String,
    http_client: HttpClient,
    rate_limiter: Arc<RateLimiter>,
    stats: Arc<ApiStatsTracker>,
    retry: RetryPolicy,
    enabled: bool,
}

impl ApiTransport {
    pub fn new(
        name: &str,
        enabled: bool,
        requests_per_minute: u32,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        let http_client = HttpClient::new(timeout_secs)
            .map_err(|e| ConfigError::invalid(&format!("{}.timeout_secs", name.to_lowercase()), e))?;

        Ok(Self {
            name: name.to_string(),
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(name, requests_per_minute)?),
            stats: Arc::new(ApiStatsTracker::new()),
            retry,
            enabled,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn rate_limiter_status(&self) -> RateLimiterStatus {
        self.rate_limiter.status()
    }

    pub fn stats(&self) -> ApiStats {
        self.stats.get_stats()
    }

    /// GET `url` with `query` and decode the JSON body, under retry
    pub async fn get_json<T>(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        if !self.enabled {
            return Err(ApiError::Disabled);
        }

        let label = format!("{} {}", self.name, endpoint);
        retry::execute(&label, &self.retry, || self.attempt::<T>(endpoint, url, query)).await
    }

    async fn attempt<T>(&self, endpoint: &str, url: &str, query: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.rate_limiter.acquire().await;

        logger::debug(
            LogTag::Api,
            &format!("{}: GET {} params={:?}", self.name, endpoint, query),
        );

        let start = Instant::now();
        let response = self
            .http_client
            .client()
            .get(url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;

        let response = match response {
            Ok(response) => response,
            Err(err) => return Err(self.record_failure(endpoint, elapsed, ApiError::from_reqwest(&err))),
        };

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(self.record_failure(endpoint, elapsed, ApiError::from_status(status.as_u16(), body)));
        }

        match response.json::<T>().await {
            Ok(value) => {
                self.stats.record_request(true, elapsed);
                Ok(value)
            }
            Err(err) => Err(self.record_failure(endpoint, elapsed, ApiError::from_reqwest(&err))),
        }
    }

    fn record_failure(&self, endpoint: &str, elapsed_ms: f64, error: ApiError) -> ApiError {
        self.stats.record_request(false, elapsed_ms);
        self.stats.record_error(format!("{}: {}", endpoint, error));
        logger::debug(
            LogTag::Api,
            &format!("{}: {} failed after {:.0}ms: {}", self.name, endpoint, elapsed_ms, error),
        );
        error
    }
}
