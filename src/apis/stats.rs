/// Per-client request statistics exposed on the health endpoint
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
    pub last_error: Option<String>,
    /// Unix milliseconds of the last recorded error
    pub last_error_at: Option<i64>,
}

impl ApiStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }
}

#[derive(Debug, Default)]
pub struct ApiStatsTracker {
    inner: Mutex<ApiStats>,
}

impl ApiStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished request with its latency
    pub fn record_request(&self, success: bool, elapsed_ms: f64) {
        let mut stats = self.inner.lock();
        stats.total_requests += 1;
        if success {
            stats.successful_requests += 1;
        } else {
            stats.failed_requests += 1;
        }
        // running mean
        let n = stats.total_requests as f64;
        stats.average_response_time_ms += (elapsed_ms - stats.average_response_time_ms) / n;
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let mut stats = self.inner.lock();
        stats.last_error = Some(message.into());
        stats.last_error_at = Some(Utc::now().timestamp_millis());
    }

    pub fn get_stats(&self) -> ApiStats {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_average() {
        let tracker = ApiStatsTracker::new();
        tracker.record_request(true, 100.0);
        tracker.record_request(false, 300.0);
        tracker.record_error("HTTP 500");

        let stats = tracker.get_stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.successful_requests, 1);
        assert_eq!(stats.failed_requests, 1);
        assert!((stats.average_response_time_ms - 200.0).abs() < 1e-9);
        assert_eq!(stats.last_error.as_deref(), Some("HTTP 500"));
        assert!((stats.success_rate() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_success_rate() {
        assert_eq!(ApiStats::default().success_rate(), 0.0);
    }
}
