//! Catalog-backend collaborator interfaces (§1: "the catalog backends
//! behind the semantic/query/storage provider interfaces" — out of scope,
//! referenced only through these traits).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::sql::TableReference;

/// Semantic metadata for cataloged tables and buckets. Return `None`/empty
/// where the backend has nothing cataloged for the lookup; that is not an
/// error.
#[async_trait]
pub trait SemanticCatalogProvider: Send + Sync {
    /// Table-level semantic context, e.g. description, owners, tags.
    async fn table_context(&self, table: &TableReference) -> Result<Option<Value>>;

    /// Per-column semantic context for `table`.
    async fn column_context(&self, table: &TableReference) -> Result<Option<Value>>;

    /// URNs of upstream datasets `table` inherits lineage/semantics from.
    async fn inheritance_sources(&self, table: &TableReference) -> Result<Vec<String>>;

    /// Datasets cataloged under an object-storage `bucket`/`prefix` path.
    async fn datasets_at_path(&self, bucket: &str, prefix: &str) -> Result<Vec<Value>>;
}

/// Query-engine availability for a cataloged dataset URN (e.g. is it
/// queryable today, from which engine).
#[async_trait]
pub trait QueryAvailabilityProvider: Send + Sync {
    async fn query_availability(&self, urn: &str) -> Result<Option<Value>>;
}

/// Object-storage availability for a cataloged dataset URN whose platform
/// component is `s3`.
#[async_trait]
pub trait StorageAvailabilityProvider: Send + Sync {
    async fn storage_availability(&self, urn: &str) -> Result<Option<Value>>;
}
