//! Catalog toolkit enrichment path (§4.5, second dispatch-table entry).

use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

use crate::enrichment::providers::{QueryAvailabilityProvider, StorageAvailabilityProvider};
use crate::error::Result;
use crate::protocol::ContentBlock;
use crate::sql::split_qualified_name;

/// DataHub-style URN shape: `urn:li:dataset:(urn:li:dataPlatform:<platform>,<path>,<env>)`.
/// Platform classification and the (catalog, schema, table) tuple used for
/// resource-link derivation are both read off this shape; URNs that don't
/// match pass through with no platform and no derivable path.
static DATASET_URN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)urn:li:dataset:\(urn:li:dataPlatform:([^,]+),([^,]+),[^)]*\)")
        .expect("static regex")
});

struct ParsedUrn {
    platform: String,
    path: String,
}

fn parse_urn(urn: &str) -> Option<ParsedUrn> {
    let caps = DATASET_URN_RE.captures(urn)?;
    Some(ParsedUrn {
        platform: caps[1].to_string(),
        path: caps[2].to_string(),
    })
}

/// Collect every string value of a case-insensitive `urn` key, walking the
/// JSON decoded from the result's text content blocks.
pub fn extract_urns(content: &[ContentBlock]) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for block in content {
        if let Some(value) = block.as_json() {
            walk_for_urns(&value, &mut out, &mut seen);
        }
    }
    out
}

fn walk_for_urns(value: &Value, out: &mut Vec<String>, seen: &mut std::collections::HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key.eq_ignore_ascii_case("urn") {
                    if let Some(s) = v.as_str() {
                        if seen.insert(s.to_string()) {
                            out.push(s.to_string());
                        }
                    }
                }
                walk_for_urns(v, out, seen);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_for_urns(item, out, seen);
            }
        }
        _ => {}
    }
}

/// Build the catalog-toolkit enrichment blocks: a text block with
/// `query_context`/`storage_context`, plus resource-link blocks per URN.
/// Returns `None` if there were no URNs to enrich.
pub async fn build_enrichment_blocks(
    urns: &[String],
    query: &dyn QueryAvailabilityProvider,
    storage: &dyn StorageAvailabilityProvider,
) -> Result<Option<Vec<ContentBlock>>> {
    if urns.is_empty() {
        return Ok(None);
    }

    let mut query_context = Map::new();
    let mut storage_context = Map::new();
    let mut links = Vec::new();

    for urn in urns {
        let availability = query.query_availability(urn).await?;
        if let Some(value) = availability.clone() {
            query_context.insert(urn.clone(), value);
        }

        let is_s3 = parse_urn(urn).is_some_and(|p| p.platform.eq_ignore_ascii_case("s3"));
        let storage_availability = if is_s3 {
            storage.storage_availability(urn).await?
        } else {
            None
        };
        if let Some(value) = storage_availability.clone() {
            storage_context.insert(urn.clone(), value);
        }

        if let Some(parsed) = parse_urn(urn) {
            let (catalog, schema, table) = split_qualified_name(&parsed.path);
            let parts: Vec<&str> = [catalog.as_str(), schema.as_str(), table.as_str()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect();
            if !parts.is_empty() {
                let joined = parts.join("/");
                links.push(ContentBlock::ResourceLink {
                    uri: format!("schema://{}", joined),
                    name: Some(urn.clone()),
                });
                if availability.is_some() || storage_availability.is_some() {
                    links.push(ContentBlock::ResourceLink {
                        uri: format!("availability://{}", joined),
                        name: Some(urn.clone()),
                    });
                }
            }
        }
    }

    let mut block = Map::new();
    if !query_context.is_empty() {
        block.insert("query_context".to_string(), Value::Object(query_context));
    }
    if !storage_context.is_empty() {
        block.insert("storage_context".to_string(), Value::Object(storage_context));
    }

    let mut blocks = Vec::new();
    if !block.is_empty() {
        blocks.push(ContentBlock::json(&Value::Object(block)));
    }
    blocks.extend(links);

    if blocks.is_empty() {
        Ok(None)
    } else {
        Ok(Some(blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubQuery;
    struct StubStorage;

    #[async_trait]
    impl QueryAvailabilityProvider for StubQuery {
        async fn query_availability(&self, _urn: &str) -> Result<Option<Value>> {
            Ok(Some(json!({"available": true})))
        }
    }

    #[async_trait]
    impl StorageAvailabilityProvider for StubStorage {
        async fn storage_availability(&self, _urn: &str) -> Result<Option<Value>> {
            Ok(Some(json!({"region": "us-east-1"})))
        }
    }

    #[test]
    fn extracts_urn_keys_case_insensitively_and_dedups() {
        let content = vec![ContentBlock::Text {
            text: json!({"results": [{"URN": "urn:a"}, {"urn": "urn:a"}, {"urn": "urn:b"}]})
                .to_string(),
        }];
        let urns = extract_urns(&content);
        assert_eq!(urns, vec!["urn:a".to_string(), "urn:b".to_string()]);
    }

    #[test]
    fn classifies_s3_platform_from_urn() {
        let urn = "urn:li:dataset:(urn:li:dataPlatform:s3,my-bucket/prefix,PROD)";
        let parsed = parse_urn(urn).unwrap();
        assert_eq!(parsed.platform, "s3");
    }

    #[tokio::test]
    async fn s3_urn_gets_storage_context_non_s3_does_not() {
        let urns = vec![
            "urn:li:dataset:(urn:li:dataPlatform:s3,bucket.prefix.key,PROD)".to_string(),
            "urn:li:dataset:(urn:li:dataPlatform:trino,c.s.t,PROD)".to_string(),
        ];
        let blocks = build_enrichment_blocks(&urns, &StubQuery, &StubStorage)
            .await
            .unwrap()
            .unwrap();
        let text_block = blocks
            .iter()
            .find_map(ContentBlock::as_json)
            .expect("one text block");
        assert_eq!(text_block["query_context"].as_object().unwrap().len(), 2);
        assert_eq!(text_block["storage_context"].as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_urns_yields_no_blocks() {
        let blocks = build_enrichment_blocks(&[], &StubQuery, &StubStorage).await.unwrap();
        assert!(blocks.is_none());
    }
}
