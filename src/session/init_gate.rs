//! Initialization gate (§4.2): every session must call the distinguished
//! init tool before any other non-exempt tool runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Default init tool name, matching §4.2's "by default `platform_info`".
pub const DEFAULT_INIT_TOOL: &str = "platform_info";

/// Default entry TTL: a session is initialized for 30 minutes after its
/// last `record_init` call.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default background-eviction interval.
pub const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome of a gate check on a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The call may proceed.
    Allow,
    /// The call is refused; the session has not yet called the init tool.
    Deny,
}

/// Per-session initialization gate. Keyed by `session_id`, protected by a
/// single read/write lock over its internal map, following the teacher's
/// `CancellationManager` shape (`server/cancellation.rs`) generalized from
/// an async lock to `parking_lot` since no callback runs while the lock is
/// held.
pub struct InitGate {
    init_tool: String,
    exempt: Vec<String>,
    ttl: Duration,
    entries: RwLock<HashMap<String, Instant>>,
    gate_violations: AtomicU64,
    retries: AtomicU64,
}

impl InitGate {
    /// Build a gate with the given init tool, exempt set, and TTL.
    pub fn new(init_tool: impl Into<String>, exempt: Vec<String>, ttl: Duration) -> Self {
        Self {
            init_tool: init_tool.into(),
            exempt,
            ttl,
            entries: RwLock::new(HashMap::new()),
            gate_violations: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    /// A gate using [`DEFAULT_INIT_TOOL`] and [`DEFAULT_TTL`] with no
    /// additional exempt tools.
    pub fn with_defaults(exempt: Vec<String>) -> Self {
        Self::new(DEFAULT_INIT_TOOL, exempt, DEFAULT_TTL)
    }

    /// The configured init tool name.
    pub fn init_tool(&self) -> &str {
        &self.init_tool
    }

    /// Number of gate-violation responses returned so far.
    pub fn gate_violation_count(&self) -> u64 {
        self.gate_violations.load(Ordering::Relaxed)
    }

    /// Number of times `record_init` observed an already-existing entry.
    pub fn retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Record initialization for `session`. If an entry already existed
    /// (regardless of whether it had expired), the retry counter
    /// increments — §4.2: "if an entry for S already existed, increment
    /// retry counter".
    pub fn record_init(&self, session: &str) {
        let mut entries = self.entries.write();
        if entries.insert(session.to_string(), Instant::now()).is_some() {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Whether `session` is currently initialized: an entry exists and is
    /// younger than the TTL.
    pub fn is_initialized(&self, session: &str) -> bool {
        let entries = self.entries.read();
        entries
            .get(session)
            .is_some_and(|t| t.elapsed() < self.ttl)
    }

    /// Apply the gate's behavior matrix (§4.2) to a `(session, tool)`
    /// call. Callers that get [`GateDecision::Allow`] back for the init
    /// tool or an exempt tool have already had any init-recording side
    /// effect applied; callers that get [`GateDecision::Deny`] should
    /// return a `setup_required` error naming both `tool` and the init
    /// tool, and must not invoke the rest of the pipeline.
    pub fn check_access(&self, session: &str, tool: &str) -> GateDecision {
        if tool == self.init_tool {
            self.record_init(session);
            return GateDecision::Allow;
        }
        if self.exempt.iter().any(|e| e == tool) {
            return GateDecision::Allow;
        }
        if self.is_initialized(session) {
            return GateDecision::Allow;
        }
        self.gate_violations.fetch_add(1, Ordering::Relaxed);
        GateDecision::Deny
    }

    /// Remove entries older than the TTL. Called by the background ticker
    /// and directly by tests.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        let mut entries = self.entries.write();
        entries.retain(|_, t| t.elapsed() < ttl);
    }
}

/// Spawn a background ticker that calls [`InitGate::evict_expired`] every
/// `interval` until the returned token is cancelled. Mirrors the teacher's
/// `CancellationManager::clear` shutdown discipline: dropping or
/// cancelling the token stops the loop, and stopping twice is safe.
pub fn spawn_eviction_ticker(
    gate: Arc<InitGate>,
    interval: Duration,
) -> tokio_util::sync::CancellationToken {
    let token = tokio_util::sync::CancellationToken::new();
    let stop = token.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => gate.evict_expired(),
                _ = stop.cancelled() => break,
            }
        }
    });
    token
}
