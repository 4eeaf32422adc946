//! SQL statement building
//!
//! All generated statements embed column names and pre-sanitized literal
//! values directly; nothing here is parameterized. That mirrors the wire
//! behavior this tool has always had, and keeping every piece of string
//! assembly in this one module means a parameterized implementation can
//! replace it without touching the executors.
//!
//! Identifiers (table and column names) are always double-quoted so that
//! mixed-case document field names like `updatedAt` survive PostgreSQL's
//! lowercase folding.

use anyhow::Result;

use crate::rows::Row;
use crate::types::Field;

/// The unique-keyed identifier column present in every mirrored table.
pub const ID_COLUMN: &str = "_id";

fn quoted(name: &str) -> String {
    format!("\"{name}\"")
}

fn column_clause(field: &Field) -> String {
    if field.default.is_empty() {
        format!("{} {}", quoted(&field.name), field.sql_type.as_sql())
    } else {
        format!(
            "{} {} DEFAULT '{}'",
            quoted(&field.name),
            field.sql_type.as_sql(),
            field.default
        )
    }
}

/// Build a `CREATE TABLE IF NOT EXISTS` statement with one column per field
/// and a uniqueness constraint over the identifier column.
pub fn create_table(table: &str, fields: &[Field]) -> Result<String> {
    if fields.is_empty() {
        anyhow::bail!("cannot create table '{table}' from a document with no fields");
    }
    let columns: Vec<String> = fields.iter().map(column_clause).collect();
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({}, UNIQUE({}));",
        quoted(table),
        columns.join(", "),
        quoted(ID_COLUMN)
    ))
}

/// Build an `ALTER TABLE ... ADD` statement for one field.
pub fn add_column(table: &str, field: &Field) -> String {
    if field.default.is_empty() {
        format!(
            "ALTER TABLE {} ADD {} {};",
            quoted(table),
            quoted(&field.name),
            field.sql_type.as_sql()
        )
    } else {
        format!(
            "ALTER TABLE {} ADD {} {} DEFAULT '{}';",
            quoted(table),
            quoted(&field.name),
            field.sql_type.as_sql(),
            field.default
        )
    }
}

fn insert_prefix(table: &str, rows: &[Row]) -> Result<String> {
    if rows.is_empty() {
        anyhow::bail!("cannot insert into '{table}' from a document with no fields");
    }
    let columns: Vec<String> = rows.iter().map(|r| quoted(&r.field)).collect();
    let values: Vec<String> = rows.iter().map(|r| format!("'{}'", r.value)).collect();
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(table),
        columns.join(", "),
        values.join(", ")
    ))
}

/// Build an insert that preserves the first-seen row on identifier conflict.
pub fn insert(table: &str, rows: &[Row]) -> Result<String> {
    Ok(format!(
        "{} ON CONFLICT ({}) DO NOTHING;",
        insert_prefix(table, rows)?,
        quoted(ID_COLUMN)
    ))
}

/// Build an insert that overwrites every non-identifier column on identifier
/// conflict (last write wins).
///
/// A document carrying nothing but its identifier has no columns to update,
/// so the conflict action degrades to DO NOTHING.
pub fn insert_and_update(table: &str, rows: &[Row]) -> Result<String> {
    let prefix = insert_prefix(table, rows)?;
    let updates: Vec<String> = rows
        .iter()
        .filter(|r| r.field != ID_COLUMN)
        .map(|r| format!("{} = '{}'", quoted(&r.field), r.value))
        .collect();
    if updates.is_empty() {
        return Ok(format!(
            "{} ON CONFLICT ({}) DO NOTHING;",
            prefix,
            quoted(ID_COLUMN)
        ));
    }
    Ok(format!(
        "{} ON CONFLICT ({}) DO UPDATE SET {};",
        prefix,
        quoted(ID_COLUMN),
        updates.join(", ")
    ))
}

/// Build the watermark lookup: the greatest value of the monitored column.
pub fn latest_value(table: &str, field: &str) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {} DESC LIMIT 1;",
        quoted(field),
        quoted(table),
        quoted(field)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    fn field(name: &str, sql_type: SqlType, default: &str) -> Field {
        Field {
            name: name.to_string(),
            sql_type,
            default: default.to_string(),
        }
    }

    fn row(field: &str, value: &str) -> Row {
        Row {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_create_table() {
        let fields = vec![
            field("_id", SqlType::Text, ""),
            field("name", SqlType::Text, ""),
            field("age", SqlType::Integer, ""),
        ];
        let stmt = create_table("users", &fields).unwrap();
        assert_eq!(
            stmt,
            "CREATE TABLE IF NOT EXISTS \"users\" (\"_id\" TEXT, \"name\" TEXT, \"age\" INT, UNIQUE(\"_id\"));"
        );
    }

    #[test]
    fn test_create_table_with_default() {
        let fields = vec![
            field("_id", SqlType::Text, ""),
            field("active", SqlType::Boolean, "false"),
        ];
        let stmt = create_table("users", &fields).unwrap();
        assert_eq!(
            stmt,
            "CREATE TABLE IF NOT EXISTS \"users\" (\"_id\" TEXT, \"active\" BOOLEAN DEFAULT 'false', UNIQUE(\"_id\"));"
        );
    }

    #[test]
    fn test_create_table_rejects_empty_document() {
        assert!(create_table("users", &[]).is_err());
    }

    #[test]
    fn test_add_column() {
        let stmt = add_column("users", &field("nickname", SqlType::Text, ""));
        assert_eq!(stmt, "ALTER TABLE \"users\" ADD \"nickname\" TEXT;");

        let stmt = add_column("users", &field("score", SqlType::Numeric, "0"));
        assert_eq!(
            stmt,
            "ALTER TABLE \"users\" ADD \"score\" NUMERIC(15, 2) DEFAULT '0';"
        );
    }

    #[test]
    fn test_insert_does_nothing_on_conflict() {
        let rows = vec![row("_id", "1"), row("name", "Alice O Brien")];
        let stmt = insert("users", &rows).unwrap();
        assert_eq!(
            stmt,
            "INSERT INTO \"users\" (\"_id\", \"name\") VALUES ('1', 'Alice O Brien') ON CONFLICT (\"_id\") DO NOTHING;"
        );
    }

    #[test]
    fn test_insert_and_update_overwrites_non_identifier_columns() {
        let rows = vec![row("_id", "1"), row("name", "Bob"), row("age", "25")];
        let stmt = insert_and_update("users", &rows).unwrap();
        assert_eq!(
            stmt,
            "INSERT INTO \"users\" (\"_id\", \"name\", \"age\") VALUES ('1', 'Bob', '25') \
             ON CONFLICT (\"_id\") DO UPDATE SET \"name\" = 'Bob', \"age\" = '25';"
        );
    }

    #[test]
    fn test_insert_and_update_identifier_only_document() {
        let rows = vec![row("_id", "1")];
        let stmt = insert_and_update("users", &rows).unwrap();
        assert_eq!(
            stmt,
            "INSERT INTO \"users\" (\"_id\") VALUES ('1') ON CONFLICT (\"_id\") DO NOTHING;"
        );
    }

    #[test]
    fn test_insert_rejects_empty_document() {
        assert!(insert("users", &[]).is_err());
        assert!(insert_and_update("users", &[]).is_err());
    }

    #[test]
    fn test_schema_drift_repair_sequence() {
        use crate::rows::{project_document, SanitizeMode};
        use crate::types::{fields_from_document, TypeMapping};
        use bson::doc;

        let mapping = TypeMapping::default();

        // Table created from the first document's shape knows nothing of
        // later fields
        let first = doc! { "_id": "1", "name": "Alice" };
        let create = create_table("users", &fields_from_document(&first, &mapping)).unwrap();
        assert!(!create.contains("\"nickname\""));

        // A drifted document references the missing column, so this statement
        // is the one the store rejects
        let drifted = doc! { "_id": "2", "name": "Carol", "nickname": "Caz" };
        let rows = project_document(&drifted, SanitizeMode::default());
        let attempt = insert("users", &rows).unwrap();
        assert!(attempt.contains("\"nickname\""));

        // The repair pass recomputes fields from the same document and issues
        // one ALTER per field; exactly one of them introduces the new column
        let fields = fields_from_document(&drifted, &mapping);
        let alters: Vec<String> = fields.iter().map(|f| add_column("users", f)).collect();
        assert_eq!(alters.len(), 3);
        assert_eq!(
            alters
                .iter()
                .filter(|a| a.contains("\"nickname\""))
                .count(),
            1
        );
        assert!(alters.contains(&"ALTER TABLE \"users\" ADD \"nickname\" TEXT;".to_string()));

        // The retried statement is byte-identical to the rejected one
        let retry = insert("users", &rows).unwrap();
        assert_eq!(retry, attempt);
    }

    #[test]
    fn test_latest_value() {
        assert_eq!(
            latest_value("users", "updatedAt"),
            "SELECT \"updatedAt\" FROM \"users\" ORDER BY \"updatedAt\" DESC LIMIT 1;"
        );
    }
}
