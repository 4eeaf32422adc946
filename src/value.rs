//! Runtime value model for documents read from MongoDB
//!
//! This module reduces BSON values to the closed set of categories the
//! relational mapping cares about. Everything the mapping does not recognize
//! collapses into the [`ValueKind::Unknown`] fallback arm and is mirrored as
//! text. That is deliberate policy: a document must never be rejected because
//! of its value types.

use bson::Bson;
use chrono::{DateTime, Utc};

/// Category tag for a document field value.
///
/// The Type Mapper and Row Projector dispatch on this tag rather than on BSON
/// directly, so the set of recognized categories lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// UTF-8 string
    Text,
    /// MongoDB ObjectId
    Identifier,
    /// Date/time instant
    Timestamp,
    /// 32-bit integer
    Integer,
    /// Boolean
    Boolean,
    /// 64-bit floating point
    Float,
    /// Nested document
    Object,
    /// Nested array
    Array,
    /// Anything else (Int64, Decimal128, null, binary, ...)
    Unknown,
}

impl ValueKind {
    /// Classify a BSON value into its mapping category.
    pub fn of(value: &Bson) -> ValueKind {
        match value {
            Bson::String(_) => ValueKind::Text,
            Bson::ObjectId(_) => ValueKind::Identifier,
            Bson::DateTime(_) => ValueKind::Timestamp,
            Bson::Int32(_) => ValueKind::Integer,
            Bson::Boolean(_) => ValueKind::Boolean,
            Bson::Double(_) => ValueKind::Float,
            Bson::Document(_) => ValueKind::Object,
            Bson::Array(_) => ValueKind::Array,
            _ => ValueKind::Unknown,
        }
    }
}

/// A document field value carried alongside its category.
///
/// [`DocumentValue::Unknown`] keeps the original BSON so the projector can
/// fall back to its default textual rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentValue {
    Text(String),
    Identifier(bson::oid::ObjectId),
    Timestamp(DateTime<Utc>),
    Integer(i32),
    Boolean(bool),
    Float(f64),
    Object(bson::Document),
    Array(bson::Array),
    Unknown(Bson),
}

impl DocumentValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            DocumentValue::Text(_) => ValueKind::Text,
            DocumentValue::Identifier(_) => ValueKind::Identifier,
            DocumentValue::Timestamp(_) => ValueKind::Timestamp,
            DocumentValue::Integer(_) => ValueKind::Integer,
            DocumentValue::Boolean(_) => ValueKind::Boolean,
            DocumentValue::Float(_) => ValueKind::Float,
            DocumentValue::Object(_) => ValueKind::Object,
            DocumentValue::Array(_) => ValueKind::Array,
            DocumentValue::Unknown(_) => ValueKind::Unknown,
        }
    }
}

impl From<Bson> for DocumentValue {
    fn from(value: Bson) -> Self {
        match value {
            Bson::String(s) => DocumentValue::Text(s),
            Bson::ObjectId(oid) => DocumentValue::Identifier(oid),
            Bson::DateTime(dt) => DocumentValue::Timestamp(dt.to_chrono()),
            Bson::Int32(i) => DocumentValue::Integer(i),
            Bson::Boolean(b) => DocumentValue::Boolean(b),
            Bson::Double(f) => DocumentValue::Float(f),
            Bson::Document(doc) => DocumentValue::Object(doc),
            Bson::Array(arr) => DocumentValue::Array(arr),
            other => DocumentValue::Unknown(other),
        }
    }
}
