//! Tool-call gate (§2's "Tool-call gate" row, §4.1): recognizes the
//! tool-invocation method and passes every other method through untouched.
//!
//! Per the explicit-context design, method recognition happens before a
//! [`RequestEnvelope`] is even constructed — only `tools/call` is modeled
//! as one. The `tools/list` / `resources/templates/list` / `prompts/list`
//! responses the visibility filter and icon injector act on never enter
//! the `Layer`/`Pipeline` chain; they are shaped directly by
//! [`crate::pipeline::presets`] once the underlying handler returns. This
//! module exists to hold [`recognizes_tool_call`], the single predicate
//! both the preset assembly and any transport adapter need to agree on.

use crate::protocol::Method;

/// Whether `method` is `tools/call` — the only method that drives the
/// context-dependent layer chain (auth, session gate, enrichment, audit).
/// Every other recognized or unrecognized method bypasses the chain
/// entirely per §4.1's method-dispatch invariant.
pub fn recognizes_tool_call(method: &str) -> bool {
    matches!(Method::parse(method), Method::ToolsCall)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_call_is_recognized() {
        assert!(recognizes_tool_call("tools/call"));
    }

    #[test]
    fn other_methods_are_not_recognized() {
        assert!(!recognizes_tool_call("tools/list"));
        assert!(!recognizes_tool_call("resources/templates/list"));
        assert!(!recognizes_tool_call("prompts/list"));
        assert!(!recognizes_tool_call("ping"));
    }
}
