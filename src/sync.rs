//! Incremental change synchronizer
//!
//! One long-running background task per synchronizer keeps a single
//! collection's table up to date: poll documents whose monitored field
//! exceeds the watermark, upsert them, then idle until the interval elapses
//! or a stop is requested. The watermark is read from the table itself (the
//! greatest value of the monitored column), which makes the synchronizer
//! resumable across process restarts without a separate checkpoint store, at
//! the cost of one query per idle cycle. The monitored field must be
//! monotonically non-decreasing, and should be indexed for efficient
//! max-retrieval.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::mongodb::MongoSource;
use crate::postgresql::PgStore;
use crate::rows::{project_document, SanitizeMode};
use crate::types::{fields_from_document, TypeMapping};

/// A running synchronizer's control handle.
pub struct SynchronizerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SynchronizerHandle {
    /// Request a stop and wait for the background task to acknowledge it.
    ///
    /// A poll pass in flight runs its cursor to completion first; the stop
    /// takes effect at the idle boundary.
    pub async fn stop(self) {
        // The task may already have exited; both results are fine to ignore
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

pub struct Synchronizer {
    mongo: Arc<MongoSource>,
    pg: Arc<PgStore>,
    collection: String,
    monitor_field: String,
    interval: Duration,
    mapping: Arc<TypeMapping>,
    sanitize: SanitizeMode,
}

impl Synchronizer {
    pub fn new(
        mongo: Arc<MongoSource>,
        pg: Arc<PgStore>,
        collection: impl Into<String>,
        monitor_field: impl Into<String>,
        interval: Duration,
        mapping: Arc<TypeMapping>,
        sanitize: SanitizeMode,
    ) -> Self {
        Synchronizer {
            mongo,
            pg,
            collection: collection.into(),
            monitor_field: monitor_field.into(),
            interval,
            mapping,
            sanitize,
        }
    }

    /// Read the initial watermark and launch the background loop.
    ///
    /// A failed watermark read here is fatal: the synchronizer does not
    /// start, and the error is returned to the caller. Run the bulk load
    /// first so the table exists and holds at least one row.
    pub async fn start(self) -> Result<SynchronizerHandle> {
        let mut watermark = self
            .pg
            .last_update_time(&self.collection, &self.monitor_field)
            .await?;
        tracing::info!(
            "Starting synchronizer for '{}' from watermark {watermark}",
            self.collection
        );

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                match self.poll_once(watermark).await {
                    Ok(count) if count > 0 => {
                        tracing::debug!("Upserted {count} changed documents in '{}'", self.collection)
                    }
                    Ok(_) => {}
                    // Decode and cursor errors end the pass, not the synchronizer
                    Err(e) => tracing::warn!(
                        "Poll pass over '{}' ended early: {e:#}",
                        self.collection
                    ),
                }

                tokio::select! {
                    _ = stop_rx.changed() => {
                        tracing::info!("Synchronizer for '{}' stopped", self.collection);
                        return;
                    }
                    _ = tokio::time::sleep(self.interval) => {
                        match self
                            .pg
                            .last_update_time(&self.collection, &self.monitor_field)
                            .await
                        {
                            Ok(t) => watermark = t,
                            // Keep the stale watermark; the next pass re-queries with it,
                            // which is safe because the upsert is idempotent
                            Err(e) => tracing::debug!(
                                "Watermark refresh for '{}' failed, keeping {watermark}: {e:#}",
                                self.collection
                            ),
                        }
                    }
                }
            }
        });

        Ok(SynchronizerHandle { stop_tx, task })
    }

    /// One polling pass: upsert every document whose monitored field exceeds
    /// the watermark, in cursor order.
    async fn poll_once(&self, watermark: DateTime<Utc>) -> Result<u64> {
        let mut filter = bson::Document::new();
        filter.insert(
            self.monitor_field.as_str(),
            bson::doc! { "$gt": bson::DateTime::from_chrono(watermark) },
        );

        let mut cursor = self.mongo.find(&self.collection, filter).await?;
        let mut upserted = 0u64;

        while cursor.advance().await? {
            let doc: bson::Document = cursor.current().try_into()?;
            let rows = project_document(&doc, self.sanitize);

            if let Err(e) = self.pg.insert_and_update(&self.collection, &rows).await {
                tracing::debug!(
                    "Upsert into '{}' failed, repairing columns: {e:#}",
                    self.collection
                );
                let fields = fields_from_document(&doc, &self.mapping);
                self.pg
                    .add_column_if_not_exists(&self.collection, &fields)
                    .await;
                if let Err(e) = self.pg.insert_and_update(&self.collection, &rows).await {
                    // Retry-once-then-drop, same as the bulk load
                    tracing::warn!(
                        "Dropping changed document in '{}': {e:#}",
                        self.collection
                    );
                    continue;
                }
            }
            upserted += 1;
        }

        Ok(upserted)
    }
}
