/// Shared cache backends
///
/// `CacheStore` talks to a `CacheBackend`; Redis is the production backend.
/// Values are opaque strings (JSON produced by the store).
use crate::errors::CacheError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::OnceCell;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// `ttl` of None stores without expiry
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key matching a `*` glob; returns the number removed
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Connectivity probe used by the health task
    async fn ping(&self) -> Result<(), CacheError>;
}

// ============================================================================
// REDIS
// ============================================================================

const SCAN_BATCH: usize = 200;

/// Redis backend over a multiplexed, auto-reconnecting connection
///
/// The connection is established lazily; while Redis is down every call
/// fails fast with `CacheError::Unavailable` after at most `connect_timeout`.
pub struct RedisBackend {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    connect_timeout: Duration,
}

impl RedisBackend {
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            connect_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                tokio::time::timeout(self.connect_timeout, ConnectionManager::new(self.client.clone()))
                    .await
                    .map_err(|_| CacheError::Unavailable("connection timed out".to_string()))?
                    .map_err(CacheError::from)
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let match_pattern = scan_match_pattern(pattern);
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&match_pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                removed += count;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Escape every Redis glob metacharacter except `*`
///
/// Keeps `SCAN MATCH` in step with the fallback store, where `*` is the only
/// wildcard.
fn scan_match_pattern(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '?' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_pattern_keeps_only_star_wildcard() {
        assert_eq!(scan_match_pattern("tokens:*"), "tokens:*");
        assert_eq!(scan_match_pattern("a?b"), "a\\?b");
        assert_eq!(scan_match_pattern("list[1]:*"), "list\\[1\\]:*");
        assert_eq!(scan_match_pattern("dir\\key"), "dir\\\\key");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RedisBackend::new("not a url", Duration::from_secs(1)).is_err());
        assert!(RedisBackend::new("redis://localhost:6379", Duration::from_secs(1)).is_ok());
    }
}
