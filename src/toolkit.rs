//! Toolkit lookup collaborator interface (`GetToolkitForTool`, §1/§4).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A toolkit binding: kind (dispatch key for enrichment, §4.5), name, and
/// default connection. Tool-call arguments may override `connection`
/// (§4's "Toolkit lookup" row: "lets request arguments override
/// connection").
#[derive(Debug, Clone, Default)]
pub struct ToolkitBinding {
    /// Toolkit kind, e.g. `"trino"`, `"datahub"`, `"s3"`. Drives the
    /// enrichment dispatch table (§4.5).
    pub kind: String,
    /// Toolkit instance name.
    pub name: String,
    /// Default connection identifier.
    pub connection: String,
}

impl ToolkitBinding {
    /// Apply a request-supplied connection override, if the arguments
    /// carry a `connection` string field.
    pub fn with_argument_override(mut self, arguments: &Value) -> Self {
        if let Some(conn) = arguments.get("connection").and_then(Value::as_str) {
            self.connection = conn.to_string();
        }
        self
    }
}

/// The toolkit registry behind `GetToolkitForTool` (spec.md §1: out of
/// scope, referenced only through this interface). Lookup failures leave
/// toolkit fields empty on the context and the pipeline continues (§7
/// "Recovery policy": "Toolkit-lookup failures leave toolkit fields empty
/// on the context and continue").
#[async_trait]
pub trait ToolkitRegistry: Send + Sync {
    /// Resolve the toolkit backing `tool_name`, if any is registered.
    async fn toolkit_for_tool(&self, tool_name: &str) -> Result<Option<ToolkitBinding>>;
}
