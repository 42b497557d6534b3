/// In-process fallback storage
///
/// Used whenever the shared backend is unreachable. Same TTL semantics as the
/// backend; expiry is checked lazily on read and exists, never swept.
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct FallbackEntry {
    value: String,
    /// None persists until deletion or process exit
    expires_at: Option<Instant>,
}

impl FallbackEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

#[derive(Debug, Default)]
pub struct FallbackStore {
    entries: Mutex<HashMap<String, FallbackEntry>>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .lock()
            .insert(key.to_string(), FallbackEntry { value, expires_at });
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Remove every key matching `pattern`; returns how many were removed
    pub fn delete_matching(&self, pattern: &Regex) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !pattern.is_match(key));
        before - entries.len()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drop everything; returns how many entries were held
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Entries held, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Translate a glob (`*` = any substring) into an anchored regex
pub fn pattern_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let re = pattern_to_regex("tokens:*").unwrap();
        assert!(re.is_match("tokens:all"));
        assert!(re.is_match("tokens:"));
        assert!(!re.is_match("old:tokens:all"));

        let exact = pattern_to_regex("tokens:all").unwrap();
        assert!(exact.is_match("tokens:all"));
        assert!(!exact.is_match("tokens:all:v2"));
    }

    #[test]
    fn test_pattern_escapes_regex_metacharacters() {
        let re = pattern_to_regex("a.b*").unwrap();
        assert!(re.is_match("a.bc"));
        assert!(!re.is_match("axbc"));

        let middle = pattern_to_regex("user:*:profile").unwrap();
        assert!(middle.is_match("user:42:profile"));
        assert!(!middle.is_match("user:42:settings"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry() {
        let store = FallbackStore::new();
        store.set("short", "1".to_string(), Some(Duration::from_secs(5)));
        store.set("forever", "2".to_string(), None);

        assert_eq!(store.get("short").as_deref(), Some("1"));
        tokio::time::advance(Duration::from_secs(6)).await;

        // still held until read
        assert_eq!(store.len(), 2);
        assert!(!store.exists("short"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("forever").as_deref(), Some("2"));
    }

    #[test]
    fn test_delete_matching() {
        let store = FallbackStore::new();
        store.set("tokens:all", "a".into(), None);
        store.set("tokens:page:1", "b".into(), None);
        store.set("other", "c".into(), None);

        let removed = store.delete_matching(&pattern_to_regex("tokens:*").unwrap());
        assert_eq!(removed, 2);
        assert!(store.exists("other"));
        assert!(!store.exists("tokens:all"));
    }
}
