//! MongoDB source client
//!
//! Thin wrapper over the driver: connection with explicit timeouts,
//! collection and database enumeration, and filtered forward cursors over
//! raw BSON documents.

use std::time::Duration;

use anyhow::Result;
use bson::Document;
use mongodb::{options::ClientOptions, Client, Cursor, Database};

pub struct MongoSource {
    client: Client,
    db: Database,
}

impl MongoSource {
    /// Connect to the given URI and select the database to mirror.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        tracing::debug!("Parsing MongoDB connection options from URI");
        let mut options = ClientOptions::parse(uri).await?;
        // Bounded timeouts so an unreachable server fails startup instead of hanging
        options.connect_timeout = Some(Duration::from_secs(10));
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client = Client::with_options(options)?;
        let db = client.database(database);
        tracing::debug!("MongoDB client created for database '{database}'");
        Ok(MongoSource { client, db })
    }

    /// Enumerate database names on the server (administrative).
    pub async fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.client.list_database_names().await?)
    }

    /// Enumerate collection names in the mirrored database.
    pub async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self.db.list_collection_names().await?)
    }

    /// Open a forward cursor over a collection with the given filter.
    pub async fn find(&self, collection: &str, filter: Document) -> Result<Cursor<Document>> {
        let cursor = self.db.collection::<Document>(collection).find(filter).await?;
        Ok(cursor)
    }
}
