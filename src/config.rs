//! Pipeline configuration (SPEC_FULL.md §4.2+/4.8+): typed, builder-style
//! configuration for every tunable spec.md names — TTLs, exempt sets,
//! discovery/query tool sets, dedup mode, icon maps, visibility patterns —
//! following the teacher's `ObservabilityConfig`/`TokenValidatorConfig`
//! builder pattern (`server/observability/config.rs`): a `Default` impl
//! carrying the spec's defaults, `with_*` builder methods, and named
//! presets where the teacher shows that pattern for comparable concerns.

use std::collections::HashSet;
use std::time::Duration;

use crate::enrichment::DedupMode;
use crate::icons::IconConfig;
use crate::session::init_gate::{DEFAULT_EVICTION_INTERVAL, DEFAULT_INIT_TOOL};
use crate::visibility::VisibilityFilter;

/// Configuration for the session gate (§4.2).
#[derive(Debug, Clone)]
pub struct SessionGateConfig {
    pub init_tool: String,
    pub exempt: Vec<String>,
    pub ttl: Duration,
    pub eviction_interval: Duration,
}

impl Default for SessionGateConfig {
    fn default() -> Self {
        Self {
            init_tool: DEFAULT_INIT_TOOL.to_string(),
            exempt: Vec::new(),
            ttl: crate::session::init_gate::DEFAULT_TTL,
            eviction_interval: DEFAULT_EVICTION_INTERVAL,
        }
    }
}

impl SessionGateConfig {
    /// Replace the init tool name.
    pub fn with_init_tool(mut self, tool: impl Into<String>) -> Self {
        self.init_tool = tool.into();
        self
    }

    /// Add tools the gate exempts from requiring init first.
    pub fn with_exempt(mut self, exempt: Vec<String>) -> Self {
        self.exempt = exempt;
        self
    }

    /// Override the initialization TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Configuration for the workflow tracker (§4.3).
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub discovery_tools: HashSet<String>,
    pub query_tools: HashSet<String>,
    pub ttl: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            discovery_tools: [
                "platform_info",
                "datahub_search",
                "list_connections",
                "list_tables",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            query_tools: ["trino_query", "s3_get_object"]
                .into_iter()
                .map(String::from)
                .collect(),
            ttl: crate::session::workflow::DEFAULT_TTL,
        }
    }
}

impl WorkflowConfig {
    /// Replace the discovery tool set.
    pub fn with_discovery_tools(mut self, tools: HashSet<String>) -> Self {
        self.discovery_tools = tools;
        self
    }

    /// Replace the query tool set.
    pub fn with_query_tools(mut self, tools: HashSet<String>) -> Self {
        self.query_tools = tools;
        self
    }
}

/// Configuration for the enrichment-dedup cache (§4.4) and the dedup
/// shaping mode applied on repeat delivery (§4.5 "Dedup policy").
#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub entry_ttl: Duration,
    pub session_ttl: Duration,
    pub mode: DedupMode,
    /// Whether a dedup cache is installed at all. `false` disables dedup
    /// entirely — every call gets full enrichment (§4.5: "Absence of the
    /// cache disables dedup").
    pub enabled: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            entry_ttl: crate::session::dedup::DEFAULT_ENTRY_TTL,
            session_ttl: crate::session::dedup::DEFAULT_SESSION_TTL,
            mode: DedupMode::Reference,
            enabled: true,
        }
    }
}

impl DedupConfig {
    /// Disable the dedup cache; every enrichment call gets full context.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Select the dedup shaping mode for repeat deliveries.
    pub fn with_mode(mut self, mode: DedupMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Aggregate pipeline configuration: one place to tune every session-state,
/// enrichment, visibility, and icon knob spec.md names, assembled by
/// [`crate::pipeline::presets::PipelinePreset`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub session_gate: SessionGateConfig,
    pub workflow: WorkflowConfig,
    pub dedup: DedupConfig,
    pub visibility: VisibilityFilter,
    pub icons: IconConfig,
}

impl PipelineConfig {
    /// A permissive preset suited to local development: the session gate
    /// TTL is long, every tool is visible, and dedup uses the `reference`
    /// mode (cheapest to eyeball in logs). Mirrors the teacher's
    /// `development()`/`production()` preset pairing in
    /// `server/observability/config.rs`.
    pub fn development() -> Self {
        Self {
            session_gate: SessionGateConfig::default().with_ttl(Duration::from_secs(24 * 60 * 60)),
            workflow: WorkflowConfig::default(),
            dedup: DedupConfig::default().with_mode(DedupMode::Reference),
            visibility: VisibilityFilter::default(),
            icons: IconConfig::default(),
        }
    }

    /// A stricter preset suited to production deployment: spec-default
    /// TTLs and the `summary` dedup mode, which keeps full context
    /// flowing (annotated) rather than collapsing repeat calls down to a
    /// bare reference.
    pub fn production() -> Self {
        Self {
            session_gate: SessionGateConfig::default(),
            workflow: WorkflowConfig::default(),
            dedup: DedupConfig::default().with_mode(DedupMode::Summary),
            visibility: VisibilityFilter::default(),
            icons: IconConfig::default(),
        }
    }
}
