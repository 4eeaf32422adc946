//! PostgreSQL store client
//!
//! [`PgStore`] owns the connection and executes the statements built by
//! [`crate::statements`]. Every statement-issuing operation takes the store
//! guard in read mode, so any number of collections can issue statements
//! concurrently. The write mode of the guard is reserved for future
//! administrative operations (for example connection reconfiguration) that
//! must exclude all statement traffic; nothing takes it today.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls};

use crate::rows::Row;
use crate::statements;
use crate::types::Field;

pub struct PgStore {
    client: RwLock<Client>,
}

impl PgStore {
    /// Connect and spawn the connection driver task.
    pub async fn connect(url: &str) -> Result<Self> {
        tracing::debug!("Connecting to PostgreSQL");
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {e}");
            }
        });
        tracing::debug!("PostgreSQL connection established");
        Ok(PgStore {
            client: RwLock::new(client),
        })
    }

    /// Create the table for a collection from its first observed shape.
    ///
    /// Idempotent: a no-op when the table already exists. Errors are surfaced,
    /// since a missing table makes every later statement fail.
    pub async fn create_table_if_not_exists(&self, table: &str, fields: &[Field]) -> Result<()> {
        let stmt = statements::create_table(table, fields)?;
        let client = self.client.read().await;
        client.batch_execute(&stmt).await?;
        Ok(())
    }

    /// Add one column per field, best effort.
    ///
    /// The store cannot cheaply know which columns already exist, so each
    /// ALTER is issued independently and failures (typically "column already
    /// exists") are swallowed; a failing field never aborts the rest.
    pub async fn add_column_if_not_exists(&self, table: &str, fields: &[Field]) {
        let client = self.client.read().await;
        for field in fields {
            let stmt = statements::add_column(table, field);
            if let Err(e) = client.batch_execute(&stmt).await {
                tracing::debug!(
                    "Skipped adding column '{}' to '{}': {e}",
                    field.name,
                    table
                );
            }
        }
    }

    /// Insert a projected document, keeping the first-seen row on identifier
    /// conflict.
    pub async fn insert(&self, table: &str, rows: &[Row]) -> Result<()> {
        let stmt = statements::insert(table, rows)?;
        let client = self.client.read().await;
        client.batch_execute(&stmt).await?;
        Ok(())
    }

    /// Insert a projected document, overwriting every non-identifier column
    /// on identifier conflict.
    pub async fn insert_and_update(&self, table: &str, rows: &[Row]) -> Result<()> {
        let stmt = statements::insert_and_update(table, rows)?;
        let client = self.client.read().await;
        client.batch_execute(&stmt).await?;
        Ok(())
    }

    /// Read the watermark: the greatest value of the monitored column.
    ///
    /// Fails when the table is missing, empty, or the column does not hold
    /// timestamps; callers decide whether that is fatal.
    pub async fn last_update_time(&self, table: &str, field: &str) -> Result<DateTime<Utc>> {
        let stmt = statements::latest_value(table, field);
        let client = self.client.read().await;
        let row = client.query_one(&stmt, &[]).await?;
        let watermark: DateTime<Utc> = row.try_get(0)?;
        Ok(watermark)
    }
}
