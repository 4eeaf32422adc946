//! Type mapping from document value categories to PostgreSQL column types
//!
//! The mapping table is policy, not mechanism: the baseline table mirrors the
//! mirroring semantics this tool has always had (short text and identifiers as
//! TEXT, floats as fixed-point NUMERIC, nested values as JSON), but callers
//! can build a [`TypeMapping`] with different entries and thread it through
//! the bulk loader and synchronizer.

use std::collections::HashMap;

use bson::Document;

use crate::value::ValueKind;

/// PostgreSQL column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    TimestampTz,
    Integer,
    Boolean,
    Numeric,
    Json,
}

impl SqlType {
    /// The DDL spelling of this type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            SqlType::Integer => "INT",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Numeric => "NUMERIC(15, 2)",
            SqlType::Json => "JSON",
        }
    }
}

/// A column descriptor derived from one document field.
///
/// `default` is a literal rendered into the DDL; the empty string means no
/// explicit default. Fields are transient and recomputed every time schema
/// may have drifted.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub sql_type: SqlType,
    pub default: String,
}

/// Category-to-column-type policy.
///
/// Lookups for a category without an entry resolve to the [`ValueKind::Unknown`]
/// entry; the unknown entry itself always exists (TEXT, no default, unless
/// overridden). Unrecognized value types are therefore never an error.
#[derive(Debug, Clone)]
pub struct TypeMapping {
    entries: HashMap<ValueKind, (SqlType, String)>,
}

impl Default for TypeMapping {
    fn default() -> Self {
        let mut entries = HashMap::new();
        entries.insert(ValueKind::Text, (SqlType::Text, String::new()));
        entries.insert(ValueKind::Identifier, (SqlType::Text, String::new()));
        entries.insert(ValueKind::Timestamp, (SqlType::TimestampTz, String::new()));
        entries.insert(ValueKind::Integer, (SqlType::Integer, String::new()));
        entries.insert(ValueKind::Boolean, (SqlType::Boolean, String::new()));
        entries.insert(ValueKind::Float, (SqlType::Numeric, String::new()));
        entries.insert(ValueKind::Object, (SqlType::Json, String::new()));
        entries.insert(ValueKind::Array, (SqlType::Json, String::new()));
        entries.insert(ValueKind::Unknown, (SqlType::Text, String::new()));
        TypeMapping { entries }
    }
}

impl TypeMapping {
    /// Override the entry for one category, returning the modified mapping.
    pub fn with_entry(
        mut self,
        kind: ValueKind,
        sql_type: SqlType,
        default: impl Into<String>,
    ) -> Self {
        self.entries.insert(kind, (sql_type, default.into()));
        self
    }

    /// Resolve a category to its column type and default literal.
    pub fn entry(&self, kind: ValueKind) -> (SqlType, &str) {
        let (sql_type, default) = self
            .entries
            .get(&kind)
            .or_else(|| self.entries.get(&ValueKind::Unknown))
            .map(|(t, d)| (*t, d.as_str()))
            .unwrap_or((SqlType::Text, ""));
        (sql_type, default)
    }
}

/// Derive one [`Field`] per key of a document.
pub fn fields_from_document(doc: &Document, mapping: &TypeMapping) -> Vec<Field> {
    doc.iter()
        .map(|(name, value)| {
            let (sql_type, default) = mapping.entry(ValueKind::of(value));
            Field {
                name: name.clone(),
                sql_type,
                default: default.to_string(),
            }
        })
        .collect()
}
