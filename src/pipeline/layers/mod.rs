//! Individual pipeline layers (§2's layer table), each a small
//! [`crate::pipeline::Layer`] implementation. `crate::pipeline::presets`
//! assembles these into the ordered chain spec.md §4.1's invariants
//! require.

pub mod audit;
pub mod authentication;
pub mod authorization;
pub mod context_init;
pub mod enrichment;
pub mod session_gate;
pub mod token_bridge;
pub mod tool_gate;
pub mod toolkit_lookup;
pub mod workflow_tracker;

pub use audit::AuditLayer;
pub use authentication::AuthenticationLayer;
pub use authorization::AuthorizationLayer;
pub use context_init::{build_context, extract_session_id, ContextInitLayer};
pub use enrichment::EnrichmentLayer;
pub use session_gate::SessionGateLayer;
pub use token_bridge::TokenBridgeLayer;
pub use tool_gate::recognizes_tool_call;
pub use toolkit_lookup::ToolkitLookupLayer;
pub use workflow_tracker::WorkflowTrackerLayer;
