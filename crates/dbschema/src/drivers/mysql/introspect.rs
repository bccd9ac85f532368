//! Live schema introspection from INFORMATION_SCHEMA.
//!
//! Reads the current database (`DATABASE()`) in four queries: tables,
//! columns, index statistics and foreign keys. Catalog values are CAST to
//! CHAR so that collation and binary-string differences between MySQL and
//! MariaDB versions do not leak into the results.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::core::field::{FieldSchema, ForeignKeyActionType, IndexType};
use crate::core::identifier::name_key;
use crate::core::schema::Schema;
use crate::core::table::TableSchema;
use crate::core::traits::{QueryResult, QueryRow, SqlExecutor};
use crate::error::{DbSchemaError, Result};

use super::adapter::ENGINE_NAME;
use super::types::{collation_from_name, parse_column_type};

const TABLES_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
        CAST(TABLE_COMMENT AS CHAR(2048)) AS TABLE_COMMENT
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(COLUMN_TYPE AS CHAR(4096)) AS COLUMN_TYPE,
        CAST(IS_NULLABLE AS CHAR(3)) AS IS_NULLABLE,
        CAST(EXTRA AS CHAR(255)) AS EXTRA,
        CAST(COLLATION_NAME AS CHAR(255)) AS COLLATION_NAME,
        CAST(COLUMN_COMMENT AS CHAR(2048)) AS COLUMN_COMMENT
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

const INDEXES_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
        CAST(INDEX_NAME AS CHAR(255)) AS INDEX_NAME,
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(NON_UNIQUE AS SIGNED) AS NON_UNIQUE
    FROM INFORMATION_SCHEMA.STATISTICS
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME, INDEX_NAME, SEQ_IN_INDEX
"#;

const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT
        CAST(kcu.TABLE_NAME AS CHAR(255)) AS TABLE_NAME,
        CAST(kcu.CONSTRAINT_NAME AS CHAR(255)) AS CONSTRAINT_NAME,
        CAST(kcu.COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(kcu.REFERENCED_TABLE_NAME AS CHAR(255)) AS REFERENCED_TABLE_NAME,
        CAST(kcu.REFERENCED_COLUMN_NAME AS CHAR(255)) AS REFERENCED_COLUMN_NAME,
        CAST(rc.UPDATE_RULE AS CHAR(64)) AS UPDATE_RULE,
        CAST(rc.DELETE_RULE AS CHAR(64)) AS DELETE_RULE
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
    JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
        ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
        AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
        AND rc.TABLE_NAME = kcu.TABLE_NAME
    WHERE kcu.TABLE_SCHEMA = DATABASE()
    ORDER BY kcu.TABLE_NAME, kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
"#;

/// Index or constraint gathered from catalog rows, possibly multi-column.
struct CatalogKey {
    table: String,
    name: String,
    unique: bool,
    columns: Vec<String>,
    reference: Option<Reference>,
}

#[derive(Clone)]
struct Reference {
    ref_table: String,
    ref_field: String,
    on_update: ForeignKeyActionType,
    on_delete: ForeignKeyActionType,
}

/// Key roles found for one column.
#[derive(Default)]
struct ColumnKeys {
    primary: bool,
    foreign: Option<(String, Reference)>,
    indexes: Vec<(String, bool)>,
}

/// Read the schema of the executor's current database.
pub async fn read_schema(executor: &dyn SqlExecutor) -> Result<Schema> {
    let tables = executor.query(TABLES_QUERY, &[]).await?;
    let columns = executor.query(COLUMNS_QUERY, &[]).await?;
    let indexes = executor.query(INDEXES_QUERY, &[]).await?;
    let foreign_keys = executor.query(FOREIGN_KEYS_QUERY, &[]).await?;

    let schema = build_schema(&tables, &columns, &indexes, &foreign_keys)?;

    info!(
        "Introspected {} tables from MySQL ({} columns)",
        schema.tables.len(),
        columns.len()
    );

    Ok(schema)
}

fn build_schema(
    tables: &QueryResult,
    columns: &QueryResult,
    indexes: &QueryResult,
    foreign_keys: &QueryResult,
) -> Result<Schema> {
    let mut schema = Schema::new("");

    for row in tables.iter() {
        schema.tables.push(
            TableSchema::new(row.required("TABLE_NAME")?).with_description(row.text("TABLE_COMMENT")),
        );
    }

    for row in columns.iter() {
        let table_name = row.required("TABLE_NAME")?;
        // Columns of views are listed too.
        let Some(table) = schema.table_mut(table_name) else {
            continue;
        };
        let field = column_to_field(table_name, &row)?;
        table.fields.push(field);
    }

    let mut keys = collect_keys(indexes, foreign_keys)?;

    for table in &mut schema.tables {
        for field in &mut table.fields {
            if let Some(column_keys) = keys.remove(&(name_key(&table.name), name_key(&field.name))) {
                apply_keys(&table.name, field, column_keys);
            }
        }
        debug!("Table {}: {} fields", table.name, table.fields.len());
    }

    Ok(schema)
}

fn column_to_field(table: &str, row: &QueryRow<'_>) -> Result<FieldSchema> {
    let name = row.required("COLUMN_NAME")?;
    let native_type = row.required("COLUMN_TYPE")?;

    let parsed = parse_column_type(native_type).ok_or_else(|| DbSchemaError::UnsupportedNativeType {
        engine: ENGINE_NAME.to_string(),
        table: table.to_string(),
        field: name.to_string(),
        native_type: native_type.to_string(),
    })?;

    let mut field = FieldSchema::new(name, parsed.data_type);
    field.length = parsed.length;
    field.unsigned = parsed.unsigned;
    field.enum_values = parsed.enum_values;
    field.not_null = !row.flag("IS_NULLABLE");
    field.autoincrement = row.text("EXTRA").to_lowercase().contains("auto_increment");
    field.description = row.text("COLUMN_COMMENT").to_string();
    if field.data_type.has_collation() {
        field.collation_type = collation_from_name(row.text("COLLATION_NAME"));
    }

    Ok(field)
}

/// Group catalog rows by key and index them by (table, column).
fn collect_keys(
    indexes: &QueryResult,
    foreign_keys: &QueryResult,
) -> Result<HashMap<(String, String), ColumnKeys>> {
    let mut grouped: BTreeMap<(String, String, bool), CatalogKey> = BTreeMap::new();

    for row in indexes.iter() {
        let table = row.required("TABLE_NAME")?;
        let name = row.required("INDEX_NAME")?;
        grouped
            .entry((name_key(table), name.to_string(), false))
            .or_insert_with(|| CatalogKey {
                table: table.to_string(),
                name: name.to_string(),
                unique: row.int("NON_UNIQUE") == 0,
                columns: Vec::new(),
                reference: None,
            })
            .columns
            .push(row.required("COLUMN_NAME")?.to_string());
    }

    for row in foreign_keys.iter() {
        let table = row.required("TABLE_NAME")?;
        let name = row.required("CONSTRAINT_NAME")?;
        let reference = Reference {
            ref_table: row.required("REFERENCED_TABLE_NAME")?.to_string(),
            ref_field: row.required("REFERENCED_COLUMN_NAME")?.to_string(),
            on_update: foreign_key_action(row.text("UPDATE_RULE"))?,
            on_delete: foreign_key_action(row.text("DELETE_RULE"))?,
        };
        grouped
            .entry((name_key(table), name.to_string(), true))
            .or_insert_with(|| CatalogKey {
                table: table.to_string(),
                name: name.to_string(),
                unique: false,
                columns: Vec::new(),
                reference: Some(reference),
            })
            .columns
            .push(row.required("COLUMN_NAME")?.to_string());
    }

    let mut keys: HashMap<(String, String), ColumnKeys> = HashMap::new();

    for key in grouped.into_values() {
        let is_primary = key.reference.is_none() && key.name.eq_ignore_ascii_case("PRIMARY");

        if key.columns.len() > 1 && !is_primary {
            warn!(
                "Skipping multi-column key {}.{} ({}): only single-column keys are modelled",
                key.table,
                key.name,
                key.columns.join(", ")
            );
            continue;
        }

        for column in &key.columns {
            let entry = keys.entry((name_key(&key.table), name_key(column))).or_default();
            if is_primary {
                entry.primary = true;
            } else if let Some(reference) = &key.reference {
                entry.foreign = Some((key.name.clone(), reference.clone()));
            } else {
                entry.indexes.push((key.name.clone(), key.unique));
            }
        }
    }

    Ok(keys)
}

/// Resolve the single role a field carries:
/// ForeignPrimary > Primary > ForeignKey > Unique > Simple.
fn apply_keys(table: &str, field: &mut FieldSchema, keys: ColumnKeys) {
    if let Some((name, reference)) = keys.foreign {
        field.index_type = if keys.primary {
            IndexType::ForeignPrimary
        } else {
            IndexType::ForeignKey
        };
        field.index_name = name;
        field.ref_table = reference.ref_table;
        field.ref_field = reference.ref_field;
        field.on_update_foreign_key = reference.on_update;
        field.on_delete_foreign_key = reference.on_delete;
        return;
    }

    if keys.primary {
        field.index_type = IndexType::Primary;
        return;
    }

    let mut indexes = keys.indexes;
    // Unique first, then by name for a stable pick.
    indexes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if indexes.len() > 1 {
        debug!(
            "Field {}.{} has {} indexes; keeping {}",
            table,
            field.name,
            indexes.len(),
            indexes[0].0
        );
    }
    if let Some((name, unique)) = indexes.into_iter().next() {
        field.index_type = if unique { IndexType::Unique } else { IndexType::Simple };
        field.index_name = name;
    }
}

fn foreign_key_action(rule: &str) -> Result<ForeignKeyActionType> {
    ForeignKeyActionType::from_sql(rule).ok_or_else(|| DbSchemaError::UnsupportedForeignKeyAction {
        engine: ENGINE_NAME.to_string(),
        action: rule.to_string(),
    })
}
