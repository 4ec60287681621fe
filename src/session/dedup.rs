//! Enrichment-dedup cache (§4.4): per-session record of which table keys
//! have already had full semantic context delivered recently.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default per-entry TTL: how long a `(session, key)` pair counts as
/// "recently sent".
pub const DEFAULT_ENTRY_TTL: Duration = Duration::from_secs(5 * 60);

/// Default session idle TTL before a whole session's entries are dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// One exported `(session, key, sent_at)` triple. `sent_at` is a Unix
/// epoch offset in milliseconds rather than an [`Instant`], since
/// `Instant` carries no meaning across process boundaries and the export
/// format exists specifically to support cross-process persistence (§4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupEntry {
    pub session_id: String,
    pub key: String,
    pub sent_at_millis: u64,
}

/// Session-scoped dedup cache: has full context already been sent for a
/// given table key recently?
pub struct DedupCache {
    entry_ttl: Duration,
    session_ttl: Duration,
    sessions: RwLock<HashMap<String, HashMap<String, Instant>>>,
}

impl DedupCache {
    /// Build a cache with explicit entry/session TTLs.
    pub fn new(entry_ttl: Duration, session_ttl: Duration) -> Self {
        Self {
            entry_ttl,
            session_ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// A cache using [`DEFAULT_ENTRY_TTL`] / [`DEFAULT_SESSION_TTL`].
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_ENTRY_TTL, DEFAULT_SESSION_TTL)
    }

    /// Stamp `now` at `(session, key)`, marking it as sent.
    pub fn mark_sent(&self, session: &str, key: &str) {
        let mut sessions = self.sessions.write();
        sessions
            .entry(session.to_string())
            .or_default()
            .insert(key.to_string(), Instant::now());
    }

    /// Whether `(session, key)` was sent recently: an entry exists and is
    /// younger than the entry TTL.
    pub fn was_sent_recently(&self, session: &str, key: &str) -> bool {
        let sessions = self.sessions.read();
        sessions
            .get(session)
            .and_then(|keys| keys.get(key))
            .is_some_and(|t| t.elapsed() < self.entry_ttl)
    }

    /// Remove entries older than the entry TTL, and whole sessions whose
    /// youngest remaining entry is older than the session TTL.
    pub fn evict_expired(&self) {
        let mut sessions = self.sessions.write();
        sessions.retain(|_, keys| {
            keys.retain(|_, t| t.elapsed() < self.entry_ttl);
            keys.values()
                .map(Instant::elapsed)
                .min()
                .is_none_or(|youngest| youngest < self.session_ttl)
        });
    }

    /// Export the entire set of `(session, key) → time` pairs as a flat,
    /// serializable list. `Instant` has no stable epoch, so each entry's
    /// remaining age is converted to a wall-clock timestamp relative to
    /// the moment of export.
    pub fn export(&self) -> Vec<DedupEntry> {
        let now_millis = system_now_millis();
        let sessions = self.sessions.read();
        let mut out = Vec::new();
        for (session_id, keys) in sessions.iter() {
            for (key, instant) in keys.iter() {
                let age_millis = instant.elapsed().as_millis() as u64;
                let sent_at_millis = now_millis.saturating_sub(age_millis);
                out.push(DedupEntry {
                    session_id: session_id.clone(),
                    key: key.clone(),
                    sent_at_millis,
                });
            }
        }
        out
    }

    /// Load a previously exported snapshot, replacing all current state.
    /// Entries older than the entry TTL relative to "now" are dropped on
    /// load rather than carried forward as already-expired rows.
    pub fn load(&self, entries: Vec<DedupEntry>) {
        let now_millis = system_now_millis();
        let mut sessions = HashMap::new();
        for entry in entries {
            let age_millis = now_millis.saturating_sub(entry.sent_at_millis);
            if Duration::from_millis(age_millis) >= self.entry_ttl {
                continue;
            }
            let age = Duration::from_millis(age_millis);
            let instant = Instant::now()
                .checked_sub(age)
                .unwrap_or_else(Instant::now);
            sessions
                .entry(entry.session_id)
                .or_insert_with(HashMap::new)
                .insert(entry.key, instant);
        }
        *self.sessions.write() = sessions;
    }
}

fn system_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_then_check_recent() {
        let cache = DedupCache::with_defaults();
        assert!(!cache.was_sent_recently("s1", "c.s.t"));
        cache.mark_sent("s1", "c.s.t");
        assert!(cache.was_sent_recently("s1", "c.s.t"));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = DedupCache::new(Duration::from_millis(10), Duration::from_secs(60));
        cache.mark_sent("s1", "c.s.t");
        std::thread::sleep(Duration::from_millis(30));
        assert!(!cache.was_sent_recently("s1", "c.s.t"));
    }

    #[test]
    fn dedup_scenario_full_then_reference_then_full_again() {
        // Scenario 6 (§8), minus the reference/full response shaping which
        // is the enrichment engine's job -- this only covers the cache.
        let cache = DedupCache::new(Duration::from_millis(20), Duration::from_secs(60));
        assert!(!cache.was_sent_recently("s1", "c.s.t"));
        cache.mark_sent("s1", "c.s.t");
        assert!(cache.was_sent_recently("s1", "c.s.t"));
        std::thread::sleep(Duration::from_millis(40));
        assert!(!cache.was_sent_recently("s1", "c.s.t"));
    }

    #[test]
    fn export_import_round_trip() {
        let cache = DedupCache::with_defaults();
        cache.mark_sent("s1", "c.s.t");
        cache.mark_sent("s2", "c.s.u");

        let exported_once = cache.export();

        let reloaded = DedupCache::with_defaults();
        reloaded.load(exported_once.clone());
        let exported_twice = reloaded.export();

        let mut a = exported_once;
        let mut b = exported_twice;
        a.sort_by(|x, y| (x.session_id.clone(), x.key.clone()).cmp(&(y.session_id.clone(), y.key.clone())));
        b.sort_by(|x, y| (x.session_id.clone(), x.key.clone()).cmp(&(y.session_id.clone(), y.key.clone())));
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.session_id, y.session_id);
            assert_eq!(x.key, y.key);
            // Millisecond timestamps may shift by a few ms across the two
            // export calls; compare the recovered "is recent" view instead
            // of exact equality.
            assert!(x.sent_at_millis.abs_diff(y.sent_at_millis) < 1000);
        }
    }

    #[test]
    fn load_drops_already_expired_entries() {
        let cache = DedupCache::with_defaults();
        let stale = vec![DedupEntry {
            session_id: "s1".to_string(),
            key: "c.s.t".to_string(),
            sent_at_millis: 0,
        }];
        cache.load(stale);
        assert!(!cache.was_sent_recently("s1", "c.s.t"));
    }

    #[test]
    fn concurrent_access_does_not_panic() {
        use std::sync::Arc;
        let cache = Arc::new(DedupCache::with_defaults());
        let mut handles = Vec::new();
        for i in 0..100 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                let session = format!("s{}", i % 5);
                cache.mark_sent(&session, "c.s.t");
                let _ = cache.was_sent_recently(&session, "c.s.t");
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
