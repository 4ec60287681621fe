//! SQL-query toolkit enrichment path (§4.5, first dispatch-table entry).

use serde_json::{json, Map, Value};

use crate::enrichment::dedup_policy::{shape_block, DedupMode};
use crate::enrichment::providers::SemanticCatalogProvider;
use crate::error::Result;
use crate::session::DedupCache;
use crate::sql::{extract_table_references, split_qualified_name, TableReference};

/// Target tables for a `tools/call` request against a SQL-query toolkit.
/// Index 0 is always the primary table.
fn make_reference(catalog: String, schema: String, table: String) -> TableReference {
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
        source: crate::sql::ReferenceSource::From,
    }
}

fn target_tables(arguments: &Value) -> Vec<TableReference> {
    let table_field = arguments
        .get("table")
        .and_then(Value::as_str)
        .or_else(|| arguments.get("table_name").and_then(Value::as_str));

    if let Some(table_field) = table_field {
        let catalog = arguments.get("catalog").and_then(Value::as_str);
        let schema = arguments.get("schema").and_then(Value::as_str);
        let reference = if catalog.is_some() || schema.is_some() {
            make_reference(
                catalog.unwrap_or_default().to_string(),
                schema.unwrap_or_default().to_string(),
                table_field.to_string(),
            )
        } else {
            let (catalog, schema, table) = split_qualified_name(table_field);
            make_reference(catalog, schema, table)
        };
        return vec![reference];
    }

    arguments
        .get("sql")
        .and_then(Value::as_str)
        .map(extract_table_references)
        .unwrap_or_default()
}

/// Build the enrichment block for a SQL-query toolkit call and shape it
/// according to the session's dedup configuration. Returns `None` if there
/// is nothing to enrich (no resolvable target table) or dedup suppressed
/// the block entirely.
pub async fn build_enrichment_block(
    arguments: &Value,
    semantic: &dyn SemanticCatalogProvider,
    dedup: Option<&DedupCache>,
    session_id: &str,
    mode: DedupMode,
) -> Result<Option<Value>> {
    let tables = target_tables(arguments);
    let Some((primary, additional)) = tables.split_first() else {
        return Ok(None);
    };

    let mut block = Map::new();

    if let Some(ctx) = semantic.table_context(primary).await? {
        block.insert("semantic_context".to_string(), ctx);
    }
    if let Some(col) = semantic.column_context(primary).await? {
        block.insert("column_context".to_string(), col);
    }
    let inheritance = semantic.inheritance_sources(primary).await?;
    if !inheritance.is_empty() {
        block.insert("inheritance_sources".to_string(), json!(inheritance));
    }

    let mut additional_out = Vec::new();
    for table in additional {
        if let Some(ctx) = semantic.table_context(table).await? {
            additional_out.push(json!({ "table": table.full_path, "semantic_context": ctx }));
        }
    }
    if !additional_out.is_empty() {
        block.insert("additional_tables".to_string(), json!(additional_out));
    }

    if block.is_empty() {
        return Ok(None);
    }

    let table_keys: Vec<String> = tables.iter().map(|t| t.full_path.clone()).collect();
    Ok(shape_block(
        dedup,
        session_id,
        &table_keys,
        mode,
        Value::Object(block),
    ))
}
