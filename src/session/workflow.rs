//! Workflow tracker (§4.3): detects discovery-before-query patterns per
//! session.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Default session idle TTL before the background cleanup evicts an entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Per-session workflow record.
#[derive(Debug, Clone)]
struct SessionRecord {
    discovered: bool,
    discovery_count: u64,
    warning_count: u64,
    last_touch: Instant,
}

impl SessionRecord {
    fn new() -> Self {
        Self {
            discovered: false,
            discovery_count: 0,
            warning_count: 0,
            last_touch: Instant::now(),
        }
    }
}

/// A snapshot of a session's workflow state, returned by [`WorkflowTracker::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkflowStatus {
    pub discovered: bool,
    pub discovery_count: u64,
    pub warning_count: u64,
}

/// Tracks, per session, whether a discovery tool has run before any query
/// tool. Discovery and query tool sets are disjoint string sets, defaults
/// provided and overridable per §4.3.
pub struct WorkflowTracker {
    discovery_tools: HashSet<String>,
    query_tools: HashSet<String>,
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl WorkflowTracker {
    /// Build a tracker from explicit discovery/query tool sets.
    pub fn new(discovery_tools: HashSet<String>, query_tools: HashSet<String>, ttl: Duration) -> Self {
        Self {
            discovery_tools,
            query_tools,
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// A tracker with the default discovery/query sets and [`DEFAULT_TTL`].
    pub fn with_defaults() -> Self {
        let discovery_tools = [
            "platform_info",
            "datahub_search",
            "list_connections",
            "list_tables",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        let query_tools = ["trino_query", "s3_get_object"]
            .into_iter()
            .map(String::from)
            .collect();
        Self::new(discovery_tools, query_tools, DEFAULT_TTL)
    }

    /// Whether `tool` is in the query set.
    pub fn is_query(&self, tool: &str) -> bool {
        self.query_tools.contains(tool)
    }

    /// Whether `tool` is in the discovery set.
    pub fn is_discovery(&self, tool: &str) -> bool {
        self.discovery_tools.contains(tool)
    }

    /// Record a tool call for `session`. Discovery tools mark the session
    /// as having performed discovery, bump the discovery count, and reset
    /// the warning count to zero. Tools in neither set still touch the
    /// session's last-touch time so idle eviction sees recent activity.
    pub fn record(&self, session: &str, tool: &str) {
        let mut sessions = self.sessions.write();
        let record = sessions
            .entry(session.to_string())
            .or_insert_with(SessionRecord::new);
        record.last_touch = Instant::now();
        if self.discovery_tools.contains(tool) {
            record.discovered = true;
            record.discovery_count += 1;
            record.warning_count = 0;
        }
    }

    /// Increment and return the new warning count for `session`, called
    /// externally when a query tool runs without prior discovery.
    pub fn increment_warning(&self, session: &str) -> u64 {
        let mut sessions = self.sessions.write();
        let record = sessions
            .entry(session.to_string())
            .or_insert_with(SessionRecord::new);
        record.last_touch = Instant::now();
        record.warning_count += 1;
        record.warning_count
    }

    /// The current workflow status for `session`, or the zero value if the
    /// session has never been recorded.
    pub fn status(&self, session: &str) -> WorkflowStatus {
        let sessions = self.sessions.read();
        sessions
            .get(session)
            .map(|r| WorkflowStatus {
                discovered: r.discovered,
                discovery_count: r.discovery_count,
                warning_count: r.warning_count,
            })
            .unwrap_or_default()
    }

    /// Evict sessions idle longer than the configured TTL. Driveable
    /// manually for tests, per §4.3: "cleanup must be driveable manually
    /// for tests".
    pub fn evict_idle(&self) {
        let ttl = self.ttl;
        let mut sessions = self.sessions.write();
        sessions.retain(|_, r| r.last_touch.elapsed() < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> WorkflowTracker {
        WorkflowTracker::new(
            ["discover".to_string()].into_iter().collect(),
            ["query".to_string()].into_iter().collect(),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn discovery_call_marks_session_discovered() {
        let t = tracker();
        t.record("s1", "discover");
        let status = t.status("s1");
        assert!(status.discovered);
        assert_eq!(status.discovery_count, 1);
    }

    #[test]
    fn query_call_alone_does_not_mark_discovery() {
        let t = tracker();
        t.record("s1", "query");
        let status = t.status("s1");
        assert!(!status.discovered);
    }

    #[test]
    fn discovery_resets_warning_count() {
        let t = tracker();
        t.record("s1", "query");
        t.increment_warning("s1");
        t.increment_warning("s1");
        assert_eq!(t.status("s1").warning_count, 2);
        t.record("s1", "discover");
        assert_eq!(t.status("s1").warning_count, 0);
    }

    #[test]
    fn increment_warning_returns_new_count() {
        let t = tracker();
        assert_eq!(t.increment_warning("s1"), 1);
        assert_eq!(t.increment_warning("s1"), 2);
    }

    #[test]
    fn is_query_and_is_discovery_reflect_configured_sets() {
        let t = tracker();
        assert!(t.is_discovery("discover"));
        assert!(!t.is_discovery("query"));
        assert!(t.is_query("query"));
        assert!(!t.is_query("discover"));
    }

    #[test]
    fn evict_idle_removes_stale_sessions() {
        let t = WorkflowTracker::new(
            ["discover".to_string()].into_iter().collect(),
            HashSet::new(),
            Duration::from_millis(10),
        );
        t.record("s1", "discover");
        std::thread::sleep(Duration::from_millis(30));
        t.evict_idle();
        assert!(!t.status("s1").discovered);
    }
}
