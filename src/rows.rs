//! Row projection: one document into relational literal text
//!
//! Projection is pure: the same document and sanitization mode always produce
//! the same rows. Values are rendered as the literal text that will be
//! embedded, quoted, into generated statements, so sanitization happens here
//! and nowhere else.

use bson::{Bson, Document};

use crate::value::DocumentValue;

/// One projected column value, ready to embed as a quoted literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub field: String,
    pub value: String,
}

/// Quote-stripping mode applied to every rendered value.
///
/// Exactly one mode is active per projection call. This is a minimal
/// mitigation for values being embedded as quoted literals in generated
/// statements, not a general escaping mechanism; do not rely on it for
/// security-sensitive data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SanitizeMode {
    /// Replace every single-quote character with a space.
    #[default]
    StripSingleQuotes,
    /// Replace every double-quote character with a space.
    StripDoubleQuotes,
}

impl SanitizeMode {
    fn apply(&self, value: String) -> String {
        match self {
            SanitizeMode::StripSingleQuotes => value.replace('\'', " "),
            SanitizeMode::StripDoubleQuotes => value.replace('"', " "),
        }
    }
}

/// Project a document into one [`Row`] per key.
///
/// Key order follows document order; no ordering is guaranteed across
/// documents.
pub fn project_document(doc: &Document, mode: SanitizeMode) -> Vec<Row> {
    doc.iter()
        .map(|(name, value)| Row {
            field: name.clone(),
            value: mode.apply(render_value(value)),
        })
        .collect()
}

/// Render one BSON value as relational literal text.
///
/// Timestamps render as `YYYY-MM-DD HH:MM:SS[.frac] +0000 UTC` with the
/// trailing three characters cut, removing the `UTC` zone name but keeping
/// the explicit `+0000` offset. The offset matters: the literal lands in a
/// timestamptz column, and a zoneless literal would be reinterpreted under
/// the server's session `TimeZone`, shifting stored instants and the
/// watermark derived from them. The truncation must track the format string
/// if the rendering ever changes.
fn render_value(value: &Bson) -> String {
    match DocumentValue::from(value.clone()) {
        DocumentValue::Timestamp(dt) => {
            let text = dt.format("%Y-%m-%d %H:%M:%S%.f %z UTC").to_string();
            let cut = text.len().saturating_sub(3);
            text[..cut].to_string()
        }
        DocumentValue::Object(doc) => Bson::Document(doc).into_relaxed_extjson().to_string(),
        DocumentValue::Array(arr) => Bson::Array(arr).into_relaxed_extjson().to_string(),
        DocumentValue::Text(s) => s,
        DocumentValue::Identifier(oid) => oid.to_hex(),
        DocumentValue::Integer(i) => i.to_string(),
        DocumentValue::Boolean(b) => b.to_string(),
        DocumentValue::Float(f) => f.to_string(),
        DocumentValue::Unknown(other) => other.into_relaxed_extjson().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use chrono::TimeZone;

    #[test]
    fn test_projection_is_deterministic() {
        let doc = doc! {
            "_id": "1",
            "name": "Alice O'Brien",
            "age": 30_i32,
            "tags": [1_i32, 2_i32],
        };
        let first = project_document(&doc, SanitizeMode::default());
        let second = project_document(&doc, SanitizeMode::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_quote_sanitization() {
        let doc = doc! { "name": "Alice O'Brien" };
        let rows = project_document(&doc, SanitizeMode::StripSingleQuotes);
        assert_eq!(rows[0].value, "Alice O Brien");
        assert!(!rows[0].value.contains('\''));
        // Replacement, not removal: length is preserved
        assert_eq!(rows[0].value.len(), "Alice O'Brien".len());
    }

    #[test]
    fn test_double_quote_sanitization() {
        let doc = doc! { "name": "say \"hi\"" };
        let rows = project_document(&doc, SanitizeMode::StripDoubleQuotes);
        assert_eq!(rows[0].value, "say  hi ");
        // Single quotes survive in this mode
        let doc = doc! { "name": "O'Brien" };
        let rows = project_document(&doc, SanitizeMode::StripDoubleQuotes);
        assert_eq!(rows[0].value, "O'Brien");
    }

    #[test]
    fn test_timestamp_truncation() {
        let instant = chrono::Utc.with_ymd_and_hms(2009, 11, 10, 23, 0, 0).unwrap();
        let doc = doc! { "updatedAt": bson::DateTime::from_chrono(instant) };
        let rows = project_document(&doc, SanitizeMode::default());
        // Rendered as "2009-11-10 23:00:00 +0000 UTC"; the last 3 chars are cut
        assert_eq!(rows[0].value, "2009-11-10 23:00:00 +0000 ");
    }

    #[test]
    fn test_timestamp_truncation_keeps_millis() {
        let instant = chrono::Utc
            .timestamp_millis_opt(1_257_894_000_123)
            .unwrap();
        let doc = doc! { "updatedAt": bson::DateTime::from_chrono(instant) };
        let rows = project_document(&doc, SanitizeMode::default());
        assert_eq!(rows[0].value, "2009-11-10 23:00:00.123 +0000 ");
    }

    #[test]
    fn test_timestamp_literal_keeps_explicit_offset() {
        // The offset survives truncation, so a timestamptz column stores the
        // same instant regardless of the server's session TimeZone
        let instant = chrono::Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        let doc = doc! { "updatedAt": bson::DateTime::from_chrono(instant) };
        let rows = project_document(&doc, SanitizeMode::default());
        assert!(rows[0].value.contains("+0000"));
        assert!(!rows[0].value.contains("UTC"));
    }

    #[test]
    fn test_nested_values_render_as_compact_json() {
        let doc = doc! {
            "profile": { "city": "HK", "zip": 999_i32 },
            "tags": ["a", "b"],
        };
        let rows = project_document(&doc, SanitizeMode::default());
        assert_eq!(rows[0].value, r#"{"city":"HK","zip":999}"#);
        // Default mode strips nothing here; double quotes are JSON structure
        assert_eq!(rows[1].value, r#"["a","b"]"#);
        // The rendered text is valid JSON
        let parsed: serde_json::Value = serde_json::from_str(&rows[0].value).unwrap();
        assert_eq!(parsed, serde_json::json!({"city": "HK", "zip": 999}));
    }

    #[test]
    fn test_scalar_rendering() {
        let doc = doc! {
            "age": 30_i32,
            "active": true,
            "score": 25.5_f64,
            "whole": 30.0_f64,
            "big": bson::Bson::Int64(7),
            "missing": bson::Bson::Null,
        };
        let rows = project_document(&doc, SanitizeMode::default());
        let values: Vec<&str> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["30", "true", "25.5", "30", "7", "null"]);
    }
}
