//! Cache store with automatic in-process fallback
//!
//! Values are serialized to JSON. When the shared backend is unreachable
//! every operation transparently uses [`storage::FallbackStore`]; callers
//! never see cache errors. A periodic PING restores the backend, and the
//! fallback entries are discarded (not migrated) when it comes back.

pub mod backend;
pub mod storage;

pub use backend::{CacheBackend, RedisBackend};
pub use storage::{pattern_to_regex, FallbackStore};

use crate::config::CacheConfig;
use crate::errors::CacheError;
use crate::logger::{self, LogTag};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    fallback: FallbackStore,
    connected: AtomicBool,
    /// Seconds; 0 or less disables expiry
    default_ttl_secs: i64,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl CacheStore {
    /// Store over `backend`; `connected` is the initial connectivity state
    pub fn with_backend(backend: Arc<dyn CacheBackend>, default_ttl_secs: i64, connected: bool) -> Self {
        Self {
            backend: Some(backend),
            fallback: FallbackStore::new(),
            connected: AtomicBool::new(connected),
            default_ttl_secs,
            health_task: Mutex::new(None),
        }
    }

    /// Store with no shared backend; everything lives in process memory
    pub fn in_memory(default_ttl_secs: i64) -> Self {
        Self {
            backend: None,
            fallback: FallbackStore::new(),
            connected: AtomicBool::new(false),
            default_ttl_secs,
            health_task: Mutex::new(None),
        }
    }

    /// Build the store described by `config`
    ///
    /// Never fails: an invalid URL or unreachable server yields a store that
    /// starts in fallback mode.
    pub async fn connect(config: &CacheConfig) -> Self {
        if !config.redis_enabled {
            logger::info(LogTag::Cache, "Redis disabled, using in-process cache only");
            return Self::in_memory(config.ttl_secs);
        }

        let backend = match RedisBackend::new(
            &config.redis_url,
            Duration::from_secs(config.connect_timeout_secs.max(1)),
        ) {
            Ok(backend) => backend,
            Err(e) => {
                logger::error(
                    LogTag::Cache,
                    &format!("Invalid Redis URL '{}': {} - using in-process cache", config.redis_url, e),
                );
                return Self::in_memory(config.ttl_secs);
            }
        };

        let store = Self::with_backend(Arc::new(backend), config.ttl_secs, false);
        store.check_health().await;
        if !store.is_ready() {
            logger::warning(
                LogTag::Cache,
                "Redis unreachable at startup, using in-memory fallback until it recovers",
            );
        }
        store
    }

    /// True while the shared backend is in use
    pub fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn default_ttl_secs(&self) -> i64 {
        self.default_ttl_secs
    }

    /// Entries currently held by the fallback store
    pub fn fallback_len(&self) -> usize {
        self.fallback.len()
    }

    fn active_backend(&self) -> Option<&Arc<dyn CacheBackend>> {
        if self.is_ready() {
            self.backend.as_ref()
        } else {
            None
        }
    }

    fn mark_unavailable(&self, operation: &str, key: &str, error: &CacheError) {
        logger::error(
            LogTag::Cache,
            &format!("Cache {} error for '{}': {} - switching to fallback", operation, key, error),
        );
        self.connected.store(false, Ordering::SeqCst);
    }

    fn effective_ttl(&self, ttl_secs: Option<i64>) -> Option<Duration> {
        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        if ttl > 0 {
            Some(Duration::from_secs(ttl as u64))
        } else {
            None
        }
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = match self.active_backend() {
            Some(backend) => match backend.get(key).await {
                Ok(raw) => raw,
                Err(e) => {
                    self.mark_unavailable("get", key, &e);
                    self.fallback.get(key)
                }
            },
            None => self.fallback.get(key),
        }?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                logger::error(
                    LogTag::Cache,
                    &format!("Cache get error for '{}': undecodable value: {}", key, e),
                );
                None
            }
        }
    }

    /// Store `value`; `ttl_secs` of None uses the default TTL
    pub async fn set<T>(&self, key: &str, value: &T, ttl_secs: Option<i64>)
    where
        T: Serialize + ?Sized,
    {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                logger::error(
                    LogTag::Cache,
                    &format!("Cache set error for '{}': cannot serialize: {}", key, e),
                );
                return;
            }
        };
        let ttl = self.effective_ttl(ttl_secs);

        if let Some(backend) = self.active_backend() {
            match backend.set(key, &raw, ttl).await {
                Ok(()) => {
                    logger::debug(
                        LogTag::Cache,
                        &format!("Cache set: {} (ttl={:?})", key, ttl.map(|t| t.as_secs())),
                    );
                    return;
                }
                Err(e) => self.mark_unavailable("set", key, &e),
            }
        }

        self.fallback.set(key, raw, ttl);
    }

    pub async fn delete(&self, key: &str) {
        if let Some(backend) = self.active_backend() {
            match backend.delete(key).await {
                Ok(()) => return,
                Err(e) => self.mark_unavailable("delete", key, &e),
            }
        }
        self.fallback.delete(key);
    }

    /// Delete every key matching a `*` glob (anchored)
    pub async fn delete_pattern(&self, pattern: &str) {
        if let Some(backend) = self.active_backend() {
            match backend.delete_pattern(pattern).await {
                Ok(removed) => {
                    logger::debug(
                        LogTag::Cache,
                        &format!("Deleted {} keys matching pattern: {}", removed, pattern),
                    );
                    return;
                }
                Err(e) => self.mark_unavailable("delete_pattern", pattern, &e),
            }
        }

        match pattern_to_regex(pattern) {
            Ok(regex) => {
                let removed = self.fallback.delete_matching(&regex);
                logger::debug(
                    LogTag::Cache,
                    &format!("Deleted {} fallback keys matching pattern: {}", removed, pattern),
                );
            }
            Err(e) => logger::error(
                LogTag::Cache,
                &format!("Cache delete_pattern error for '{}': {}", pattern, e),
            ),
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        if let Some(backend) = self.active_backend() {
            match backend.exists(key).await {
                Ok(exists) => return exists,
                Err(e) => self.mark_unavailable("exists", key, &e),
            }
        }
        self.fallback.exists(key)
    }

    // ========================================================================
    // CONNECTIVITY
    // ========================================================================

    /// Probe the backend once and update the connectivity state
    ///
    /// A transition back to connected discards the fallback entries.
    pub async fn check_health(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };

        let was_connected = self.is_ready();
        match backend.ping().await {
            Ok(()) => {
                if !was_connected {
                    self.connected.store(true, Ordering::SeqCst);
                    let discarded = self.fallback.clear();
                    logger::info(
                        LogTag::Cache,
                        &format!(
                            "Cache backend connected (discarded {} fallback entries)",
                            discarded
                        ),
                    );
                }
            }
            Err(e) => {
                if was_connected {
                    logger::warning(
                        LogTag::Cache,
                        &format!("Cache backend health check failed: {} - using fallback", e),
                    );
                }
                self.connected.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Spawn the periodic health probe (no-op without a backend)
    pub fn start_health_monitor(self: &Arc<Self>, interval: Duration) {
        if self.backend.is_none() {
            return;
        }
        let mut task = self.health_task.lock();
        if task.is_some() {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let period = interval.max(Duration::from_millis(100));
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(store) => store.check_health().await,
                    None => break,
                }
            }
        }));
    }

    /// Stop the health probe and stop using the backend
    pub fn disconnect(&self) {
        if let Some(task) = self.health_task.lock().take() {
            task.abort();
        }
        if self.connected.swap(false, Ordering::SeqCst) {
            logger::info(LogTag::Cache, "Cache backend disconnected");
        }
    }
}

impl Drop for CacheStore {
    fn drop(&mut self) {
        if let Some(task) = self.health_task.get_mut().take() {
            task.abort();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ToggleBackend;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_backend_falls_back_with_ttl() {
        let backend = Arc::new(ToggleBackend::default());
        backend.set_down(true);
        let store = CacheStore::with_backend(backend.clone(), 30, true);

        store.set("tokens:all", &vec![1, 2, 3], None).await;
        assert!(!store.is_ready());
        assert_eq!(store.get::<Vec<i32>>("tokens:all").await, Some(vec![1, 2, 3]));
        assert!(store.exists("tokens:all").await);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.get::<Vec<i32>>("tokens:all").await, None);
        assert!(!store.exists("tokens:all").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_positive_ttl_never_expires() {
        let store = CacheStore::in_memory(30);
        store.set("pinned", "v", Some(0)).await;
        store.set("negative", "v", Some(-5)).await;

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(store.exists("pinned").await);
        assert!(store.exists("negative").await);
    }

    #[tokio::test]
    async fn test_healthy_backend_is_used() {
        let backend = Arc::new(ToggleBackend::default());
        let store = CacheStore::with_backend(backend.clone(), 30, true);

        store.set("k", &42u32, None).await;
        assert!(store.is_ready());
        assert!(backend.data.lock().contains_key("k"));
        assert_eq!(store.fallback_len(), 0);
        assert_eq!(store.get::<u32>("k").await, Some(42));

        store.delete("k").await;
        assert!(!store.exists("k").await);
    }

    #[tokio::test]
    async fn test_reconnect_discards_fallback_entries() {
        let backend = Arc::new(ToggleBackend::default());
        backend.set_down(true);
        let store = CacheStore::with_backend(backend.clone(), 30, true);

        store.set("during-outage", &"x", None).await;
        assert_eq!(store.fallback_len(), 1);

        backend.set_down(false);
        store.check_health().await;

        assert!(store.is_ready());
        assert_eq!(store.fallback_len(), 0);
        assert_eq!(store.get::<String>("during-outage").await, None);
    }

    #[tokio::test]
    async fn test_delete_pattern_in_fallback() {
        let store = CacheStore::in_memory(30);
        store.set("tokens:all", &1, None).await;
        store.set("tokens:page", &2, None).await;
        store.set("metrics", &3, None).await;

        store.delete_pattern("tokens:*").await;
        assert!(!store.exists("tokens:all").await);
        assert!(!store.exists("tokens:page").await);
        assert!(store.exists("metrics").await);
    }

    #[tokio::test]
    async fn test_undecodable_value_reads_as_none() {
        let store = CacheStore::in_memory(30);
        store.set("k", &"not a number", None).await;
        assert_eq!(store.get::<u64>("k").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_monitor_restores_backend() {
        let backend = Arc::new(ToggleBackend::default());
        backend.set_down(true);
        let store = Arc::new(CacheStore::with_backend(backend.clone(), 30, false));
        store.start_health_monitor(Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!store.is_ready());

        backend.set_down(false);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(store.is_ready());

        store.disconnect();
        assert!(!store.is_ready());
    }
}
