//! A request-interception middleware core for a data-platform
//! tool-invocation server.
//!
//! This crate implements the layer chain, session-state registries, SQL
//! table-reference extraction, and response-enrichment engine that sit
//! between a transport (stdio, HTTP/SSE — out of scope here) and a set of
//! tool handlers (also out of scope). It answers "should this call
//! proceed, and what context should be attached to its result", never
//! "how is this call framed on the wire" or "what does the tool actually
//! do".
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolgate_core::config::PipelineConfig;
//! use toolgate_core::pipeline::presets::PipelinePreset;
//! use toolgate_core::testing::{MockAuthenticator, MockPolicyEngine, MockToolkitRegistry, RecordingAuditSink};
//!
//! # async fn build() {
//! let preset = PipelinePreset::new(
//!     PipelineConfig::production(),
//!     Arc::new(MockAuthenticator::new("demo-user")),
//!     Arc::new(MockPolicyEngine::allow("analyst")),
//!     Arc::new(MockToolkitRegistry::new()),
//!     Arc::new(RecordingAuditSink::new()),
//! );
//! let assembled = preset.build();
//! let _ = assembled.layers();
//! # }
//! ```

pub mod audit;
pub mod auth;
pub mod authz;
pub mod config;
pub mod context;
pub mod enrichment;
pub mod error;
pub mod icons;
pub mod pipeline;
pub mod protocol;
pub mod session;
pub mod sql;
pub mod testing;
pub mod toolkit;
pub mod visibility;

pub use config::PipelineConfig;
pub use context::RequestContext;
pub use error::{Error, ErrorCategory, Result};
pub use pipeline::presets::{AssembledPipeline, PipelinePreset};
pub use pipeline::Pipeline;
