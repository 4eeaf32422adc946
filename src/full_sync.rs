//! One-time bulk load of every non-system collection
//!
//! Each collection is scanned by its own task; the table is created lazily
//! from the first document's shape and every document is inserted with the
//! retry-once-then-drop policy. The load is complete when every per-collection
//! task has finished. Concurrent writes to MongoDB during the scan may or may
//! not be reflected; the guarantee is baseline parity with the scan start.

use std::sync::Arc;

use anyhow::Result;
use futures::future::try_join_all;

use crate::mongodb::MongoSource;
use crate::postgresql::PgStore;
use crate::rows::{project_document, SanitizeMode};
use crate::types::{fields_from_document, TypeMapping};

/// Collections whose name contains this marker belong to the store itself
/// and are never mirrored.
const SYSTEM_COLLECTION_MARKER: &str = "system.";

/// Scan every non-system collection concurrently and load it into PostgreSQL.
pub async fn run_full_sync(
    mongo: Arc<MongoSource>,
    pg: Arc<PgStore>,
    mapping: Arc<TypeMapping>,
    sanitize: SanitizeMode,
) -> Result<()> {
    let collection_names = mongo.list_collection_names().await?;
    tracing::info!("Found {} collections in MongoDB", collection_names.len());

    let mut tasks = Vec::new();
    for collection in collection_names {
        if collection.contains(SYSTEM_COLLECTION_MARKER) {
            tracing::debug!("Skipping system collection '{collection}'");
            continue;
        }
        let mongo = mongo.clone();
        let pg = pg.clone();
        let mapping = mapping.clone();
        tasks.push(tokio::spawn(async move {
            load_collection(&mongo, &pg, &collection, &mapping, sanitize).await
        }));
    }

    for result in try_join_all(tasks).await? {
        result?;
    }
    tracing::info!("Bulk load complete");
    Ok(())
}

/// Load one collection: create the table from the first document, then insert
/// every document, repairing missing columns on failure.
async fn load_collection(
    mongo: &MongoSource,
    pg: &PgStore,
    collection: &str,
    mapping: &TypeMapping,
    sanitize: SanitizeMode,
) -> Result<()> {
    let mut cursor = mongo.find(collection, bson::Document::new()).await?;
    let mut created = false;
    let mut inserted = 0u64;
    let mut dropped = 0u64;

    while cursor.advance().await? {
        let doc: bson::Document = cursor.current().try_into()?;

        if !created {
            let fields = fields_from_document(&doc, mapping);
            pg.create_table_if_not_exists(collection, &fields).await?;
            tracing::info!("Created table \"{collection}\"");
            created = true;
        }

        let rows = project_document(&doc, sanitize);
        if let Err(e) = pg.insert(collection, &rows).await {
            tracing::debug!("Insert into '{collection}' failed, repairing columns: {e:#}");
            let fields = fields_from_document(&doc, mapping);
            pg.add_column_if_not_exists(collection, &fields).await;
            if let Err(e) = pg.insert(collection, &rows).await {
                // Retry-once-then-drop: forward progress over per-record durability
                tracing::warn!("Dropping document from '{collection}': {e:#}");
                dropped += 1;
                continue;
            }
        }
        inserted += 1;
    }

    tracing::info!("Loaded collection '{collection}': {inserted} inserted, {dropped} dropped");
    Ok(())
}
