//! Tool visibility filter (§4's "Visibility filter" row, §8's `visible`
//! property).

use crate::protocol::ListToolsResult;

/// Allow/deny glob pattern sets applied to `tools/list` results.
///
/// `visible(T) ⇔ (allow = ∅ ∨ ∃a ∈ allow: matches(a, T)) ∧ (¬∃d ∈ deny:
/// matches(d, T))` — an empty allow-set means "allow everything not
/// explicitly denied", matching §8's quantified property.
#[derive(Debug, Clone, Default)]
pub struct VisibilityFilter {
    allow: Vec<String>,
    deny: Vec<String>,
}

impl VisibilityFilter {
    /// Build a filter from raw glob pattern strings.
    pub fn new(allow: Vec<String>, deny: Vec<String>) -> Self {
        Self { allow, deny }
    }

    /// Whether `tool_name` is visible under this filter.
    pub fn is_visible(&self, tool_name: &str) -> bool {
        let allowed = self.allow.is_empty() || self.allow.iter().any(|p| pattern_matches(p, tool_name));
        let denied = self.deny.iter().any(|p| pattern_matches(p, tool_name));
        allowed && !denied
    }

    /// Drop non-visible entries from a `tools/list` result in place.
    pub fn apply(&self, result: &mut ListToolsResult) {
        result.tools.retain(|t| self.is_visible(&t.name));
    }
}

/// A malformed glob pattern never matches anything (§8: "Malformed patterns
/// never match"), rather than erroring the whole filter.
fn pattern_matches(pattern: &str, tool_name: &str) -> bool {
    glob::Pattern::new(pattern)
        .map(|p| p.matches(tool_name))
        .unwrap_or(false)
}
