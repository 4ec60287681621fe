//! Table-reference extractor (§4.7 "Table-reference extractor"): combines
//! CTE-name exclusion, an Elasticsearch `raw_query` table-function regex,
//! a SQL-parser walk, and a regex fallback.

use regex::Regex;
use sqlparser::ast::{Cte, Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::sync::LazyLock;

/// Where a table reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSource {
    From,
    Join,
    TableFunction,
}

impl ReferenceSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceSource::From => "FROM",
            ReferenceSource::Join => "JOIN",
            ReferenceSource::TableFunction => "TABLE_FUNCTION",
        }
    }
}

/// An immutable table reference (§3 "Table reference").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub full_path: String,
    pub source: ReferenceSource,
}

impl TableReference {
    fn new(catalog: String, schema: String, table: String, source: ReferenceSource) -> Self {
        let full_path = [&catalog, &schema, &table]
            .into_iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(".");
        TableReference {
            catalog,
            schema,
            table,
            full_path,
            source,
        }
    }
}

static CTE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:WITH|,)\s+([a-zA-Z_]\w*)\s+AS\s*\(").expect("static regex")
});

static ES_RAW_QUERY_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)TABLE\s*\(\s*elasticsearch\.system\.raw_query\s*\(").expect("static regex")
});

static ES_SCHEMA_ARG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)schema\s*=>\s*'([^']*)'").expect("static regex"));

static ES_INDEX_ARG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)index\s*=>\s*'([^']*)'").expect("static regex"));

static FROM_JOIN_FALLBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(FROM|JOIN)\s+([a-zA-Z_]\w*(?:\.[a-zA-Z_]\w*){0,2})(?:\s+(?:AS\s+)?[a-zA-Z_]\w*)?(?=\s|,|;|\)|$)",
    )
    .expect("static regex")
});

/// Step 1: CTE names declared anywhere in `sql`.
fn extract_cte_names(sql: &str) -> Vec<String> {
    CTE_NAME_RE
        .captures_iter(sql)
        .map(|c| c[1].to_lowercase())
        .collect()
}

/// Step 2: Elasticsearch `raw_query` table-function references.
fn extract_elasticsearch_raw_query_refs(sql: &str) -> Vec<TableReference> {
    let Some(call) = ES_RAW_QUERY_CALL_RE.find(sql) else {
        return Vec::new();
    };
    let rest = &sql[call.end()..];
    let schema = ES_SCHEMA_ARG_RE
        .captures(rest)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "default".to_string());
    let Some(index_arg) = ES_INDEX_ARG_RE.captures(rest) else {
        return Vec::new();
    };
    index_arg[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|index| {
            TableReference::new(
                "elasticsearch".to_string(),
                schema.clone(),
                index.to_string(),
                ReferenceSource::TableFunction,
            )
        })
        .collect()
}

fn unquote(part: &str) -> String {
    let trimmed = part.trim();
    let stripped = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .or_else(|| trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')));
    stripped.unwrap_or(trimmed).to_string()
}

/// Split a dotted qualified name into `(catalog, schema, table)`: the
/// table name is the last component; the remaining qualifier is split
/// once on `.` into catalog and schema. Exposed for reuse by the
/// catalog-toolkit enrichment path, which derives the same tuple from a
/// URN's embedded dataset path.
pub fn split_qualified_name(full: &str) -> (String, String, String) {
    let parts: Vec<String> = full.split('.').map(unquote).collect();
    let Some((table, qualifier_parts)) = parts.split_last() else {
        return (String::new(), String::new(), String::new());
    };
    if qualifier_parts.is_empty() {
        return (String::new(), String::new(), table.clone());
    }
    let qualifier = qualifier_parts.join(".");
    match qualifier.split_once('.') {
        Some((catalog, schema)) => (catalog.to_string(), schema.to_string(), table.clone()),
        None => (String::new(), qualifier, table.clone()),
    }
}

fn table_factor_refs(factor: &TableFactor, source: ReferenceSource, out: &mut Vec<TableReference>) {
    match factor {
        TableFactor::Table { name, .. } => {
            let (catalog, schema, table) = split_qualified_name(&name.to_string());
            out.push(TableReference::new(catalog, schema, table, source));
        }
        TableFactor::Derived { subquery, .. } => walk_query(subquery, out),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => walk_table_with_joins(table_with_joins, out),
        _ => {}
    }
}

fn walk_table_with_joins(twj: &TableWithJoins, out: &mut Vec<TableReference>) {
    table_factor_refs(&twj.relation, ReferenceSource::From, out);
    for join in &twj.joins {
        table_factor_refs(&join.relation, ReferenceSource::Join, out);
    }
}

fn walk_cte(cte: &Cte, out: &mut Vec<TableReference>) {
    walk_query(&cte.query, out);
}

fn walk_query(query: &Query, out: &mut Vec<TableReference>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            walk_cte(cte, out);
        }
    }
    walk_set_expr(&query.body, out);
}

fn walk_set_expr(expr: &SetExpr, out: &mut Vec<TableReference>) {
    match expr {
        SetExpr::Select(select) => {
            for twj in &select.from {
                walk_table_with_joins(twj, out);
            }
        }
        SetExpr::Query(q) => walk_query(q, out),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left, out);
            walk_set_expr(right, out);
        }
        _ => {}
    }
}

/// Step 3: parse `sql` and collect every qualified-table-expression node.
/// Returns `None` if the parser found no statements or no tables at all,
/// signaling the caller to fall back to the regex scan (step 4).
fn extract_via_parser(sql: &str) -> Option<Vec<TableReference>> {
    let statements = Parser::parse_sql(&GenericDialect {}, sql).ok()?;
    let mut out = Vec::new();
    for statement in &statements {
        if let Statement::Query(query) = statement {
            walk_query(query, &mut out);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Step 4: fallback regex scan for `FROM`/`JOIN` followed by a dotted
/// name, used only when the parser yields no tables at all (malformed or
/// dialect-specific SQL the parser can't handle).
fn extract_via_regex_fallback(sql: &str) -> Vec<TableReference> {
    let mut out = Vec::new();
    for cap in FROM_JOIN_FALLBACK_RE.captures_iter(sql) {
        let source = if cap[1].eq_ignore_ascii_case("FROM") {
            ReferenceSource::From
        } else {
            ReferenceSource::Join
        };
        let (catalog, schema, table) = split_qualified_name(&cap[2]);
        out.push(TableReference::new(catalog, schema, table, source));
    }
    out
}

/// Extract, dedup (by `full_path`, first-seen order), and CTE-filter the
/// table references in `sql`.
pub fn extract_table_references(sql: &str) -> Vec<TableReference> {
    let cte_names = extract_cte_names(sql);

    let mut combined = extract_elasticsearch_raw_query_refs(sql);
    match extract_via_parser(sql) {
        Some(parsed) => combined.extend(parsed),
        None => combined.extend(extract_via_regex_fallback(sql)),
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for reference in combined {
        if !seen.insert(reference.full_path.clone()) {
            continue;
        }
        let is_cte = reference.catalog.is_empty()
            && reference.schema.is_empty()
            && cte_names.iter().any(|c| c == &reference.table.to_lowercase());
        if is_cte {
            continue;
        }
        out.push(reference);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cte_reference_is_filtered_out() {
        // Scenario 4 (§8).
        let sql = "WITH x AS (SELECT 1) SELECT * FROM x JOIN catalog.schema.t ON 1=1";
        let refs = extract_table_references(sql);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].full_path, "catalog.schema.t");
        assert_eq!(refs[0].catalog, "catalog");
        assert_eq!(refs[0].schema, "schema");
        assert_eq!(refs[0].table, "t");
        assert_eq!(refs[0].source.as_str(), "JOIN");
    }

    #[test]
    fn elasticsearch_raw_query_expands_index_list() {
        // Scenario 5 (§8).
        let sql = "SELECT * FROM TABLE(elasticsearch.system.raw_query(schema => 'sales', index => 'idx1,idx2', query => '{}'))";
        let refs = extract_table_references(sql);
        let paths: Vec<&str> = refs.iter().map(|r| r.full_path.as_str()).collect();
        assert!(paths.contains(&"elasticsearch.sales.idx1"));
        assert!(paths.contains(&"elasticsearch.sales.idx2"));
        assert!(refs.iter().all(|r| r.source.as_str() == "TABLE_FUNCTION"));
    }

    #[test]
    fn simple_from_single_part_name_has_empty_catalog_and_schema() {
        let refs = extract_table_references("SELECT * FROM orders");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].catalog, "");
        assert_eq!(refs[0].schema, "");
        assert_eq!(refs[0].table, "orders");
        assert_eq!(refs[0].full_path, "orders");
    }

    #[test]
    fn two_part_name_treated_as_schema_table() {
        let refs = extract_table_references("SELECT * FROM sales.orders");
        assert_eq!(refs[0].catalog, "");
        assert_eq!(refs[0].schema, "sales");
        assert_eq!(refs[0].table, "orders");
    }

    #[test]
    fn joins_are_deduplicated_by_full_path() {
        let sql = "SELECT * FROM a.b.c JOIN a.b.c ON 1=1 JOIN a.b.d ON 1=1";
        let refs = extract_table_references(sql);
        let paths: Vec<&str> = refs.iter().map(|r| r.full_path.as_str()).collect();
        assert_eq!(paths, vec!["a.b.c", "a.b.d"]);
    }

    #[test]
    fn cte_property_no_bare_table_matches_cte_name() {
        for cte in ["recent_orders", "base", "agg"] {
            let sql = format!(
                "WITH {cte} AS (SELECT 1) SELECT * FROM {cte}, real_table",
                cte = cte
            );
            let refs = extract_table_references(&sql);
            assert!(refs
                .iter()
                .all(|r| !(r.catalog.is_empty() && r.schema.is_empty() && r.table == cte)));
        }
    }
}
