//! Dedup-aware shaping of an enrichment block (§4.5 "Dedup policy").
//!
//! The Open Question in spec.md §9 ("the source surfaces two semantics for
//! the dedup 'reference' block... either shape is acceptable") is resolved
//! here in favor of a structured object, distinguishable from full context
//! by the presence of the `metadata_reference` key (see DESIGN.md).

use serde_json::{json, Value};

use crate::session::DedupCache;

/// The three dedup shapes a session can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Prior deliveries are replaced with a back-reference block.
    Reference,
    /// Full context is still sent, annotated with a summarizing note.
    Summary,
    /// No enrichment block at all once already delivered.
    None,
}

/// Decide what enrichment block (if any) to attach, given the table keys
/// this call implicates and a fully-built `full_block` the caller would
/// attach on first access.
///
/// Returns `None` when the caller has no cache configured — the docstring
/// on [`crate::session::DedupCache`] notwithstanding, that case is handled
/// by the caller passing `cache = None`, in which case every call gets
/// full enrichment (§4.5: "Absence of the cache disables dedup").
pub fn shape_block(
    cache: Option<&DedupCache>,
    session_id: &str,
    table_keys: &[String],
    mode: DedupMode,
    full_block: Value,
) -> Option<Value> {
    let Some(cache) = cache else {
        return Some(full_block);
    };
    if table_keys.is_empty() {
        return Some(full_block);
    }

    let already_sent = table_keys
        .iter()
        .all(|key| cache.was_sent_recently(session_id, key));

    if !already_sent {
        for key in table_keys {
            cache.mark_sent(session_id, key);
        }
        return Some(full_block);
    }

    match mode {
        DedupMode::None => None,
        DedupMode::Reference => Some(json!({
            "metadata_reference": {
                "tables": table_keys,
                "note": "full semantic context for these tables was already sent this session",
            }
        })),
        DedupMode::Summary => {
            let mut block = full_block;
            if let Value::Object(ref mut map) = block {
                map.insert(
                    "note".to_string(),
                    json!("summarized: full context already sent recently"),
                );
            }
            Some(block)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_access_is_always_full_and_marks_sent() {
        let cache = DedupCache::with_defaults();
        let keys = vec!["c.s.t".to_string()];
        let block = shape_block(Some(&cache), "s1", &keys, DedupMode::Reference, json!({"x": 1}));
        assert_eq!(block, Some(json!({"x": 1})));
        assert!(cache.was_sent_recently("s1", "c.s.t"));
    }

    #[test]
    fn second_access_in_reference_mode_returns_metadata_reference() {
        let cache = DedupCache::with_defaults();
        let keys = vec!["c.s.t".to_string()];
        cache.mark_sent("s1", "c.s.t");
        let block = shape_block(Some(&cache), "s1", &keys, DedupMode::Reference, json!({"x": 1}));
        let block = block.unwrap();
        assert!(block.get("metadata_reference").is_some());
    }

    #[test]
    fn second_access_in_none_mode_returns_nothing() {
        let cache = DedupCache::with_defaults();
        let keys = vec!["c.s.t".to_string()];
        cache.mark_sent("s1", "c.s.t");
        let block = shape_block(Some(&cache), "s1", &keys, DedupMode::None, json!({"x": 1}));
        assert!(block.is_none());
    }

    #[test]
    fn second_access_in_summary_mode_keeps_full_block_plus_note() {
        let cache = DedupCache::with_defaults();
        let keys = vec!["c.s.t".to_string()];
        cache.mark_sent("s1", "c.s.t");
        let block = shape_block(Some(&cache), "s1", &keys, DedupMode::Summary, json!({"x": 1}))
            .unwrap();
        assert_eq!(block["x"], json!(1));
        assert!(block.get("note").is_some());
    }

    #[test]
    fn no_cache_always_returns_full_block() {
        let keys = vec!["c.s.t".to_string()];
        let block = shape_block(None, "s1", &keys, DedupMode::None, json!({"x": 1}));
        assert_eq!(block, Some(json!({"x": 1})));
    }

    #[test]
    fn expired_entry_is_treated_as_first_access_again() {
        let cache = DedupCache::new(Duration::from_millis(10), Duration::from_secs(60));
        let keys = vec!["c.s.t".to_string()];
        cache.mark_sent("s1", "c.s.t");
        std::thread::sleep(Duration::from_millis(30));
        let block = shape_block(Some(&cache), "s1", &keys, DedupMode::None, json!({"x": 1}));
        assert_eq!(block, Some(json!({"x": 1})));
    }
}
