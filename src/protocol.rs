//! Wire-level protocol types recognized by the pipeline (§6).
//!
//! The transport itself (framing, the JSON-RPC envelope, request/response
//! correlation) is out of scope — see spec.md §1. This module only models
//! the method names and payload shapes the CORE inspects or rewrites.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Methods the pipeline recognizes specifically. Every other method string
/// passes through every layer unchanged (§4.1's method-dispatch invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `tools/call` — the only method that drives the context-dependent
    /// layers (auth, session gate, enrichment, audit).
    ToolsCall,
    /// `tools/list` — subject to the visibility filter and icon injector.
    ToolsList,
    /// `resources/templates/list` — subject to the icon injector.
    ResourceTemplatesList,
    /// `prompts/list` — subject to the icon injector.
    PromptsList,
    /// Anything else; passed through untouched.
    Other,
}

impl Method {
    /// Parse the wire method string.
    pub fn parse(method: &str) -> Method {
        match method {
            "tools/call" => Method::ToolsCall,
            "tools/list" => Method::ToolsList,
            "resources/templates/list" => Method::ResourceTemplatesList,
            "prompts/list" => Method::PromptsList,
            _ => Method::Other,
        }
    }

    /// The wire string for this method, or `None` for [`Method::Other`]
    /// (callers that need the original string should keep it alongside).
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Method::ToolsCall => Some("tools/call"),
            Method::ToolsList => Some("tools/list"),
            Method::ResourceTemplatesList => Some("resources/templates/list"),
            Method::PromptsList => Some("prompts/list"),
            Method::Other => None,
        }
    }
}

/// A request id, newtype'd so call sites can't confuse it with a session id
/// or tool name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `tools/call` params: tool name plus raw JSON arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to invoke.
    pub name: String,
    /// Tool arguments, still an open `Value` at the ingress boundary per
    /// Design Notes' "parameter extraction via decoded maps" guidance —
    /// layers commit to typed fields only once a semantic field is
    /// recognized.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Content block variants a tool result (or an enrichment append) may
/// carry. Tagged so a malformed or unexpected variant is a deserialization
/// error rather than silently treated as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain or JSON-encoded text.
    Text {
        /// The text payload.
        text: String,
    },
    /// Inline binary image data.
    Image {
        /// Base64-encoded image bytes.
        data: String,
        /// MIME type, e.g. `image/png`.
        mime_type: String,
    },
    /// Inline binary audio data.
    Audio {
        /// Base64-encoded audio bytes.
        data: String,
        /// MIME type, e.g. `audio/wav`.
        mime_type: String,
    },
    /// A link to a resource rather than inline content, used by the
    /// catalog-toolkit enrichment path (§4.5) to point at
    /// `schema://`/`availability://` URIs.
    ResourceLink {
        /// The resource URI.
        uri: String,
        /// Human-readable name for the link.
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ContentBlock {
    /// Construct a text block from any JSON-serializable value.
    pub fn json(value: &serde_json::Value) -> Self {
        ContentBlock::Text {
            text: value.to_string(),
        }
    }

    /// The text payload, if this is a [`ContentBlock::Text`] block whose
    /// body parses as JSON.
    pub fn as_json(&self) -> Option<serde_json::Value> {
        match self {
            ContentBlock::Text { text } => serde_json::from_str(text).ok(),
            _ => None,
        }
    }
}

/// `tools/call` result envelope (§6). `isError` tool-level failures still
/// carry `content`; the category is attached out-of-band via
/// [`crate::error::Error::category`] at the point the error was raised,
/// not reconstructed from this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Result content. Block 0 is always the original tool output;
    /// enrichment appends additional blocks after it.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Whether this result represents a tool-level error.
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// A successful result wrapping a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        CallToolResult {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// An error result wrapping a single text block.
    pub fn error(message: impl Into<String>) -> Self {
        CallToolResult {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Icon metadata attached by the icon injector (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Icon {
    /// Where the icon asset lives (URL, data URI, bundled path — opaque
    /// to this crate).
    pub source: String,
    /// MIME type of the icon asset.
    pub mime_type: String,
}

/// A single tool description, as returned by `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolInfo {
    /// Tool name, matched against visibility patterns and icon config.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icons attached so far; the icon injector appends to this sequence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<Icon>,
}

/// `tools/list` result.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListToolsResult {
    /// Tools visible to this caller (pre-filter; the visibility layer
    /// mutates this in place).
    pub tools: Vec<ToolInfo>,
}

/// A single resource template, as returned by `resources/templates/list`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResourceTemplateInfo {
    /// URI template, e.g. `schema://{catalog}/{schema}/{table}`.
    pub uri_template: String,
    /// Icons attached so far.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<Icon>,
}

/// `resources/templates/list` result.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListResourceTemplatesResult {
    /// Templates visible to this caller.
    pub resource_templates: Vec<ResourceTemplateInfo>,
}

/// A single prompt description, as returned by `prompts/list`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptInfo {
    /// Prompt name.
    pub name: String,
    /// Icons attached so far.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<Icon>,
}

/// `prompts/list` result.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListPromptsResult {
    /// Prompts visible to this caller.
    pub prompts: Vec<PromptInfo>,
}

/// A tagged sum type over every result shape the CORE can produce or
/// rewrite, per Design Notes' "dynamic result polymorphism" guidance. The
/// method string selects the expected arm; a mismatch is a protocol-level
/// error, never a silent downcast.
#[derive(Debug, Clone)]
pub enum ProtocolResult {
    /// `tools/list` response.
    Tools(ListToolsResult),
    /// `resources/templates/list` response.
    ResourceTemplates(ListResourceTemplatesResult),
    /// `prompts/list` response.
    Prompts(ListPromptsResult),
    /// `tools/call` response.
    ToolCall(CallToolResult),
}

impl ProtocolResult {
    /// Borrow the `tools/call` result, or `None` if this is a different arm.
    pub fn as_tool_call(&self) -> Option<&CallToolResult> {
        match self {
            ProtocolResult::ToolCall(r) => Some(r),
            _ => None,
        }
    }

    /// Mutably borrow the `tools/call` result, or `None` if this is a
    /// different arm.
    pub fn as_tool_call_mut(&mut self) -> Option<&mut CallToolResult> {
        match self {
            ProtocolResult::ToolCall(r) => Some(r),
            _ => None,
        }
    }

    /// Mutably borrow the `tools/list` result, or `None` if this is a
    /// different arm.
    pub fn as_tools_mut(&mut self) -> Option<&mut ListToolsResult> {
        match self {
            ProtocolResult::Tools(r) => Some(r),
            _ => None,
        }
    }

    /// Mutably borrow the `resources/templates/list` result, or `None`.
    pub fn as_resource_templates_mut(&mut self) -> Option<&mut ListResourceTemplatesResult> {
        match self {
            ProtocolResult::ResourceTemplates(r) => Some(r),
            _ => None,
        }
    }

    /// Mutably borrow the `prompts/list` result, or `None`.
    pub fn as_prompts_mut(&mut self) -> Option<&mut ListPromptsResult> {
        match self {
            ProtocolResult::Prompts(r) => Some(r),
            _ => None,
        }
    }
}

/// An info-level client-log notification (§4.5 "Client log").
#[derive(Debug, Clone, Serialize)]
pub struct LogNotification {
    /// Always `"info"` for the enrichment client-log; kept as a field
    /// rather than a constant so the shape matches a general notification
    /// envelope.
    pub level: &'static str,
    /// Human-readable message naming the tool and elapsed time.
    pub message: String,
    /// Extra structured fields (tool name, duration_ms).
    pub data: HashMap<String, serde_json::Value>,
}

/// The client-session notification sink (§4.5 "Client log"), the one
/// surface the CORE uses to reach back into the transport (spec.md §1:
/// transport is out of scope, referenced only through this interface).
///
/// Implementations decide, per session, whether a handle exists and
/// whether the client raised its log level enough to want this
/// notification — both are transport-side facts the CORE cannot see.
/// Returning `false` (no handle, level not raised, or delivery failed) is
/// not an error; the enrichment layer treats it as "best-effort, do
/// nothing further" per §4.5's "Client log" contract.
#[async_trait::async_trait]
pub trait ClientNotifier: Send + Sync {
    /// Attempt to deliver `notification` to `session_id`. Returns whether
    /// it was actually sent.
    async fn notify(&self, session_id: &str, notification: LogNotification) -> bool;
}
