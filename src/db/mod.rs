pub mod store;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::info;

use crate::config::AppConfig;
use crate::paths::ProjectPaths;
use crate::table::models::{GroupAggregate, GroupKey};
use crate::table::parquet::{read_aggregates, read_scored};

use self::store::{to_document, DocumentStore, AUTHOR_AVERAGES, FACT_CHECKING, PARTY_AVERAGES};

/// Aggregate row as stored: the group name sits under `author` or `party`.
pub fn aggregate_document(group: &GroupAggregate, key: GroupKey) -> Result<Map<String, Value>> {
    let mut doc = to_document(group)?;
    if let Some(name) = doc.remove("key") {
        doc.insert(key.column().to_string(), name);
    }
    Ok(doc)
}

/// Push the aggregate tables, and optionally the statement table, into the
/// document store.
pub async fn sync(config: &AppConfig, paths: &ProjectPaths) -> Result<()> {
    let db_path = paths.database(config);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = DocumentStore::open(&db_path.to_string_lossy()).await?;

    for (key, path, collection) in [
        (GroupKey::Party, paths.party_averages(), PARTY_AVERAGES),
        (GroupKey::Author, paths.author_averages(), AUTHOR_AVERAGES),
    ] {
        let groups = read_aggregates(&path, key)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let docs = groups
            .iter()
            .map(|g| aggregate_document(g, key))
            .collect::<Result<Vec<_>>>()?;
        store.upsert_grouped(collection, &docs, key.column()).await;
    }

    if config.storage.sync_statements {
        let path = paths.scored_statements();
        let rows =
            read_scored(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        store.upsert_new(FACT_CHECKING, &rows, "id").await;
    }

    store.close().await;
    info!(path = %db_path.display(), "Store sync finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::models::Orientation;

    #[test]
    fn test_aggregate_document_renames_key() {
        let group = GroupAggregate {
            key: "Lega".into(),
            average_score: -0.5,
            count: 2,
            normalized_score: -0.5,
            orientation: Some(Orientation::Right),
            image_url: None,
        };
        let doc = aggregate_document(&group, GroupKey::Party).unwrap();
        assert_eq!(doc["party"], "Lega");
        assert!(!doc.contains_key("key"));
        assert_eq!(doc["orientation"], "right");
        assert_eq!(doc["image_url"], Value::Null);
        assert!(!doc.contains_key("normalized_score"));
    }

    #[tokio::test]
    async fn test_stored_aggregate_has_no_normalized_score() {
        let store = DocumentStore::open(":memory:").await.expect("should open store");
        let group = GroupAggregate {
            key: "Partito Democratico".into(),
            average_score: 0.25,
            count: 4,
            normalized_score: 0.25,
            orientation: Some(Orientation::Left),
            image_url: None,
        };
        let docs = vec![aggregate_document(&group, GroupKey::Party).unwrap()];
        store.upsert_grouped(PARTY_AVERAGES, &docs, "party").await;

        let stored = store
            .get(PARTY_AVERAGES, "partito_democratico")
            .await
            .unwrap()
            .expect("document should exist");
        let stored = stored.as_object().expect("document is an object");
        assert_eq!(stored["average_score"], 0.25);
        assert_eq!(stored["count"], 4);
        assert!(!stored.contains_key("normalized_score"));
    }
}
