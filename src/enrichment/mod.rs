//! The response-enrichment engine (§4.5): toolkit-dispatched attachment of
//! semantic/query/storage context to successful tool results, with
//! session-scoped deduplication.

pub mod catalog_toolkit;
pub mod dedup_policy;
pub mod providers;
pub mod sql_toolkit;
pub mod storage_toolkit;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::warn;

pub use dedup_policy::DedupMode;
pub use providers::{QueryAvailabilityProvider, SemanticCatalogProvider, StorageAvailabilityProvider};

use crate::context::RequestContext;
use crate::protocol::{CallToolResult, ContentBlock, LogNotification};
use crate::session::DedupCache;

/// Toolkit kinds the enrichment engine dispatches on (§4.5's dispatch
/// table). Any other `toolkit_kind` is not enrichment-eligible and passes
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EligibleKind {
    SqlQuery,
    Catalog,
    ObjectStorage,
}

fn classify_kind(toolkit_kind: &str) -> Option<EligibleKind> {
    match toolkit_kind {
        "trino" | "sql" => Some(EligibleKind::SqlQuery),
        "datahub" | "catalog" => Some(EligibleKind::Catalog),
        "s3" | "object-storage" => Some(EligibleKind::ObjectStorage),
        _ => None,
    }
}

/// Bundles the external catalog collaborators the engine dispatches to.
/// Any of these may be absent (`None`); a missing provider for a toolkit
/// kind that would need it just yields no enrichment for that kind rather
/// than an error.
#[derive(Clone)]
pub struct EnrichmentProviders {
    pub semantic: Option<Arc<dyn SemanticCatalogProvider>>,
    pub query_availability: Option<Arc<dyn QueryAvailabilityProvider>>,
    pub storage_availability: Option<Arc<dyn StorageAvailabilityProvider>>,
}

impl Default for EnrichmentProviders {
    fn default() -> Self {
        Self {
            semantic: None,
            query_availability: None,
            storage_availability: None,
        }
    }
}

/// The response-enrichment engine: providers plus dedup configuration.
pub struct EnrichmentEngine {
    providers: EnrichmentProviders,
    dedup: Option<Arc<DedupCache>>,
    dedup_mode: DedupMode,
}

impl EnrichmentEngine {
    pub fn new(providers: EnrichmentProviders, dedup: Option<Arc<DedupCache>>, dedup_mode: DedupMode) -> Self {
        Self {
            providers,
            dedup,
            dedup_mode,
        }
    }

    /// Attempt to enrich `result` in place after a successful tool call.
    /// Any failure inside the enrichment path is logged and recovered:
    /// the original result is left untouched and `Ok(())` is still
    /// returned (§7 "Recovery policy": "Enrichment failures are always
    /// recovered locally").
    pub async fn enrich(
        &self,
        ctx: &mut RequestContext,
        arguments: &Value,
        result: &mut CallToolResult,
    ) {
        let Some(kind) = ctx.toolkit_kind.as_deref().and_then(classify_kind) else {
            return;
        };

        let outcome = match kind {
            EligibleKind::SqlQuery => self.enrich_sql(ctx, arguments).await,
            EligibleKind::Catalog => self.enrich_catalog(result).await,
            EligibleKind::ObjectStorage => self.enrich_storage(arguments).await,
        };

        match outcome {
            Ok(None) => {}
            Ok(Some(blocks)) => {
                result.content.extend(blocks);
                ctx.enrichment_applied = true;
            }
            Err(err) => {
                warn!(error = %err, tool = ?ctx.tool_name, "enrichment failed, returning original result");
            }
        }
    }

    async fn enrich_sql(
        &self,
        ctx: &RequestContext,
        arguments: &Value,
    ) -> crate::error::Result<Option<Vec<ContentBlock>>> {
        let Some(semantic) = &self.providers.semantic else {
            return Ok(None);
        };
        let block = sql_toolkit::build_enrichment_block(
            arguments,
            semantic.as_ref(),
            self.dedup.as_deref(),
            &ctx.session_id,
            self.dedup_mode,
        )
        .await?;
        Ok(block.map(|b| vec![ContentBlock::json(&b)]))
    }

    async fn enrich_catalog(
        &self,
        result: &CallToolResult,
    ) -> crate::error::Result<Option<Vec<ContentBlock>>> {
        let (Some(query), Some(storage)) =
            (&self.providers.query_availability, &self.providers.storage_availability)
        else {
            return Ok(None);
        };
        let urns = catalog_toolkit::extract_urns(&result.content);
        catalog_toolkit::build_enrichment_blocks(&urns, query.as_ref(), storage.as_ref()).await
    }

    async fn enrich_storage(
        &self,
        arguments: &Value,
    ) -> crate::error::Result<Option<Vec<ContentBlock>>> {
        let Some(semantic) = &self.providers.semantic else {
            return Ok(None);
        };
        let block = storage_toolkit::build_enrichment_block(arguments, semantic.as_ref()).await?;
        Ok(block.map(|b| vec![ContentBlock::json(&b)]))
    }
}

/// Build the best-effort client-log notification emitted after a
/// successful enriched call (§4.5 "Client log"). Callers decide whether a
/// session handle and a raised log level exist; this function only shapes
/// the payload once those preconditions hold.
pub fn build_client_log_notification(tool_name: &str, started: Instant) -> LogNotification {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let mut data = HashMap::new();
    data.insert("tool_name".to_string(), Value::String(tool_name.to_string()));
    data.insert("duration_ms".to_string(), Value::from(elapsed_ms));
    LogNotification {
        level: "info",
        message: format!("enriched {} in {}ms", tool_name, elapsed_ms),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_kinds() {
        assert_eq!(classify_kind("trino"), Some(EligibleKind::SqlQuery));
        assert_eq!(classify_kind("datahub"), Some(EligibleKind::Catalog));
        assert_eq!(classify_kind("s3"), Some(EligibleKind::ObjectStorage));
        assert_eq!(classify_kind("unrelated"), None);
    }

    #[test]
    fn client_log_notification_carries_tool_name_and_duration() {
        let started = Instant::now();
        let note = build_client_log_notification("trino_query", started);
        assert_eq!(note.level, "info");
        assert_eq!(note.data["tool_name"], Value::String("trino_query".to_string()));
        assert!(note.data.contains_key("duration_ms"));
    }
}
