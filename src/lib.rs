//! mongo-pg-sync library
//!
//! Continuously replicates documents from MongoDB into PostgreSQL, inferring
//! relational schema on the fly and keeping the relational copy incrementally
//! up to date.
//!
//! # How it works
//!
//! - The bulk loader ([`run_full_sync`]) scans every non-system collection
//!   concurrently, creates each table lazily from the first document's shape,
//!   and inserts every document (first write wins on conflict).
//! - The change synchronizer ([`Synchronizer`]) then keeps one designated
//!   collection in sync: it polls for documents whose monitored timestamp
//!   field exceeds the table's watermark and upserts them (last write wins).
//!
//! Schema is inferred incrementally and monotonically: columns accrete as new
//! document shapes are observed and are never removed or retyped. Statements
//! that fail because a column does not exist yet are repaired by adding the
//! missing columns and retried exactly once; a second failure drops that one
//! record and processing continues.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mongo_pg_sync::{
//!     run_full_sync, MongoSource, PgStore, SanitizeMode, Synchronizer, TypeMapping,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mongo = Arc::new(MongoSource::connect("mongodb://localhost:27017", "appdb").await?);
//! let pg = Arc::new(PgStore::connect("host=localhost user=postgres").await?);
//! let mapping = Arc::new(TypeMapping::default());
//!
//! run_full_sync(mongo.clone(), pg.clone(), mapping.clone(), SanitizeMode::default()).await?;
//!
//! let synchronizer = Synchronizer::new(
//!     mongo,
//!     pg,
//!     "users",
//!     "updatedAt",
//!     Duration::from_secs(1),
//!     mapping,
//!     SanitizeMode::default(),
//! );
//! let handle = synchronizer.start().await?;
//! // ... until shutdown:
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod full_sync;
pub mod mongodb;
pub mod postgresql;
pub mod rows;
pub mod statements;
pub mod sync;
pub mod types;
pub mod value;

pub use full_sync::run_full_sync;
pub use mongodb::MongoSource;
pub use postgresql::PgStore;
pub use rows::{project_document, Row, SanitizeMode};
pub use statements::ID_COLUMN;
pub use sync::{Synchronizer, SynchronizerHandle};
pub use types::{fields_from_document, Field, SqlType, TypeMapping};
pub use value::{DocumentValue, ValueKind};
