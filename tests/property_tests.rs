//! Property-based tests for the SQL identifier lexer, the table-reference
//! extractor's CTE exclusion, and the dedup cache's export/import round
//! trip.
//!
//! Uses proptest to verify invariants across randomized inputs, same
//! intent as the loadtest config/error proptests this crate's dependency
//! stack is modeled on: generate arbitrary-but-bounded inputs and assert
//! an invariant holds for all of them, rather than a handful of fixed
//! cases.

use std::time::Duration;

use proptest::prelude::*;

use toolgate_core::session::DedupCache;
use toolgate_core::sql::{extract_identifiers, extract_table_references};

/// A bareword identifier: ASCII letter/underscore start, alphanumeric/`_`
/// continuation. Avoids SQL punctuation so the generated snippets stay
/// parseable by both the tokenizer and `sqlparser`.
fn arb_bareword() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,12}"
}

/// A CTE name distinct from the literal table name used alongside it in
/// `prop_cte_name_never_surfaces_as_bare_table`.
fn arb_cte_and_table() -> impl Strategy<Value = (String, String)> {
    (arb_bareword(), arb_bareword()).prop_filter("cte name must differ from table name", |(cte, table)| {
        cte.to_lowercase() != table.to_lowercase()
    })
}

proptest! {
    /// §8's identifier-extractor subset property: every identifier the
    /// lexer returns is a lower-cased substring of the input. Holds for
    /// arbitrary combinations of barewords, single-quoted string
    /// literals, and `--` comments glued together.
    #[test]
    fn prop_extracted_identifiers_are_lowercase_substrings(
        words in prop::collection::vec(arb_bareword(), 1..8),
        literal in "[a-zA-Z0-9 _]{0,20}",
        comment in "[a-zA-Z0-9 _]{0,20}",
    ) {
        let sql = format!(
            "SELECT {} FROM t WHERE x = '{}' -- {}",
            words.join(", "),
            literal,
            comment,
        );
        let lowered = sql.to_lowercase();
        let ids = extract_identifiers(&sql);
        for id in &ids {
            prop_assert_eq!(id, &id.to_lowercase());
            prop_assert!(lowered.contains(id.as_str()));
        }
    }

    /// Identifiers inside a single-quoted string never appear in the
    /// output, whatever the surrounding bareword traffic looks like.
    #[test]
    fn prop_quoted_literal_contents_never_extracted(
        prefix_words in prop::collection::vec(arb_bareword(), 0..4),
        hidden in "[a-zA-Z][a-zA-Z0-9_]{3,15}",
        suffix_words in prop::collection::vec(arb_bareword(), 0..4),
    ) {
        let sql = format!(
            "SELECT {} '{}' {} FROM t",
            prefix_words.join(", "),
            hidden,
            suffix_words.join(", "),
        );
        let ids = extract_identifiers(&sql);
        prop_assert!(!ids.contains(&hidden.to_lowercase()));
    }

    /// §8's CTE-exclusion property: a name declared as a CTE via `WITH
    /// <name> AS (...)` never surfaces as a bare (catalog-less,
    /// schema-less) table reference, regardless of what other real table
    /// it's queried alongside.
    #[test]
    fn prop_cte_name_never_surfaces_as_bare_table(
        (cte, table) in arb_cte_and_table(),
    ) {
        let sql = format!("WITH {cte} AS (SELECT 1) SELECT * FROM {cte}, {table}");
        let refs = extract_table_references(&sql);
        prop_assert!(refs
            .iter()
            .all(|r| !(r.catalog.is_empty() && r.schema.is_empty() && r.table.eq_ignore_ascii_case(&cte))));
    }

    /// §4.4's export/import round trip: marking an arbitrary set of
    /// `(session, key)` pairs as sent, exporting, loading into a fresh
    /// cache, and exporting again yields the same set of pairs with
    /// timestamps within a few milliseconds of each other.
    #[test]
    fn prop_dedup_export_import_round_trip(
        pairs in prop::collection::vec((arb_bareword(), arb_bareword()), 1..10),
    ) {
        let cache = DedupCache::with_defaults();
        for (session, key) in &pairs {
            cache.mark_sent(session, key);
        }

        let exported_once = cache.export();
        let reloaded = DedupCache::with_defaults();
        reloaded.load(exported_once.clone());
        let exported_twice = reloaded.export();

        let key_of = |e: &toolgate_core::session::DedupEntry| (e.session_id.clone(), e.key.clone());
        let mut once_keys: Vec<_> = exported_once.iter().map(key_of).collect();
        let mut twice_keys: Vec<_> = exported_twice.iter().map(key_of).collect();
        once_keys.sort();
        once_keys.dedup();
        twice_keys.sort();
        twice_keys.dedup();
        prop_assert_eq!(once_keys, twice_keys);

        for entry in &exported_twice {
            prop_assert!(reloaded.was_sent_recently(&entry.session_id, &entry.key));
        }
    }

    /// A pair loaded with a `sent_at_millis` far in the past (older than
    /// the entry TTL) is dropped on load and never reports as recently
    /// sent, for any session/key text.
    #[test]
    fn prop_stale_loaded_entries_are_always_dropped(
        session in arb_bareword(),
        key in arb_bareword(),
    ) {
        let cache = DedupCache::new(Duration::from_secs(1), Duration::from_secs(60));
        let stale = vec![toolgate_core::session::DedupEntry {
            session_id: session.clone(),
            key: key.clone(),
            sent_at_millis: 0,
        }];
        cache.load(stale);
        prop_assert!(!cache.was_sent_recently(&session, &key));
    }
}
