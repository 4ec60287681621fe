//! Object-storage toolkit enrichment path (§4.5, third dispatch-table
//! entry).

use serde_json::{json, Value};

use crate::enrichment::providers::SemanticCatalogProvider;
use crate::error::Result;

/// `(bucket, prefix)` to search the semantic catalog at, derived from
/// `bucket`/`prefix`/`key` request arguments. If `key` is given without
/// `prefix`, the key's parent directory is used as the prefix.
fn target_path(arguments: &Value) -> Option<(String, String)> {
    let bucket = arguments.get("bucket").and_then(Value::as_str)?.to_string();
    if let Some(prefix) = arguments.get("prefix").and_then(Value::as_str) {
        return Some((bucket, prefix.to_string()));
    }
    if let Some(key) = arguments.get("key").and_then(Value::as_str) {
        let prefix = key.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        return Some((bucket, prefix.to_string()));
    }
    None
}

/// Build the `{"semantic_context": [...]}` enrichment block for an
/// object-storage toolkit call. Returns `None` if the request carries no
/// resolvable path or the catalog has nothing at that path.
pub async fn build_enrichment_block(
    arguments: &Value,
    semantic: &dyn SemanticCatalogProvider,
) -> Result<Option<Value>> {
    let Some((bucket, prefix)) = target_path(arguments) else {
        return Ok(None);
    };

    let datasets = semantic.datasets_at_path(&bucket, &prefix).await?;
    if datasets.is_empty() {
        return Ok(None);
    }

    Ok(Some(json!({ "semantic_context": datasets })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::TableReference;
    use async_trait::async_trait;

    struct StubCatalog {
        datasets: Vec<Value>,
    }

    #[async_trait]
    impl SemanticCatalogProvider for StubCatalog {
        async fn table_context(&self, _table: &TableReference) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn column_context(&self, _table: &TableReference) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn inheritance_sources(&self, _table: &TableReference) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn datasets_at_path(&self, _bucket: &str, _prefix: &str) -> Result<Vec<Value>> {
            Ok(self.datasets.clone())
        }
    }

    #[test]
    fn key_without_prefix_uses_parent_directory() {
        let arguments = json!({"bucket": "b", "key": "a/b/c.parquet"});
        let (bucket, prefix) = target_path(&arguments).unwrap();
        assert_eq!(bucket, "b");
        assert_eq!(prefix, "a/b");
    }

    #[test]
    fn explicit_prefix_wins_over_key() {
        let arguments = json!({"bucket": "b", "prefix": "explicit", "key": "a/b/c.parquet"});
        let (_, prefix) = target_path(&arguments).unwrap();
        assert_eq!(prefix, "explicit");
    }

    #[tokio::test]
    async fn no_bucket_yields_no_block() {
        let arguments = json!({"key": "a/b/c.parquet"});
        let catalog = StubCatalog { datasets: vec![] };
        let block = build_enrichment_block(&arguments, &catalog).await.unwrap();
        assert!(block.is_none());
    }

    #[tokio::test]
    async fn hits_are_wrapped_as_semantic_context_array() {
        let arguments = json!({"bucket": "b", "prefix": "p"});
        let catalog = StubCatalog {
            datasets: vec![json!({"name": "dataset_one"})],
        };
        let block = build_enrichment_block(&arguments, &catalog).await.unwrap().unwrap();
        assert_eq!(block["semantic_context"][0]["name"], json!("dataset_one"));
    }
}
