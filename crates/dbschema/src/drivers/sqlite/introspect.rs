//! Live schema introspection from `sqlite_master` and the table PRAGMAs.
//!
//! PRAGMA output does not carry everything the model needs. AUTOINCREMENT,
//! COLLATE clauses and foreign key constraint names are read from the column
//! definitions of the stored CREATE TABLE statement.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::core::field::{FieldSchema, ForeignKeyActionType, IndexType};
use crate::core::identifier::{name_key, quote_sqlite};
use crate::core::schema::Schema;
use crate::core::table::TableSchema;
use crate::core::traits::SqlExecutor;
use crate::error::{DbSchemaError, Result};

use super::adapter::ENGINE_NAME;
use super::types::{collation_from_name, parse_declared_type};

const TABLES_QUERY: &str = r#"
    SELECT name, sql
    FROM sqlite_master
    WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
    ORDER BY name
"#;

/// Column attributes only found in the CREATE TABLE text.
#[derive(Debug, Default, PartialEq, Eq)]
struct ColumnClauses {
    autoincrement: bool,
    collation: Option<String>,
    constraint_name: Option<String>,
}

/// Read the schema of the executor's main database.
pub async fn read_schema(executor: &dyn SqlExecutor) -> Result<Schema> {
    let tables = executor.query(TABLES_QUERY, &[]).await?;
    let mut schema = Schema::new("");

    for row in tables.iter() {
        let name = row.required("name")?;
        let table = read_table(executor, name, row.text("sql")).await?;
        debug!("Table {}: {} fields", table.name, table.fields.len());
        schema.tables.push(table);
    }

    info!("Introspected {} tables from SQLite", schema.tables.len());
    Ok(schema)
}

async fn read_table(executor: &dyn SqlExecutor, name: &str, create_sql: &str) -> Result<TableSchema> {
    let quoted = quote_sqlite(name)?;
    let clauses = column_clauses(create_sql);
    let mut table = TableSchema::new(name);

    let columns = executor
        .query(&format!("PRAGMA table_info({})", quoted), &[])
        .await?;
    for row in columns.iter() {
        let column = row.required("name")?;
        let declared = row.text("type");
        let data_type = parse_declared_type(declared).ok_or_else(|| DbSchemaError::UnsupportedNativeType {
            engine: ENGINE_NAME.to_string(),
            table: name.to_string(),
            field: column.to_string(),
            native_type: declared.to_string(),
        })?;

        let mut field = FieldSchema::new(column, data_type);
        field.not_null = row.flag("notnull");
        if row.int("pk") > 0 {
            field.index_type = IndexType::Primary;
        }
        if let Some(extra) = clauses.get(&name_key(column)) {
            field.autoincrement = extra.autoincrement && data_type.is_integer();
            if let Some(collation) = &extra.collation {
                field.collation_type = collation_from_name(collation);
            }
        }
        table.fields.push(field);
    }

    read_foreign_keys(executor, &quoted, &mut table, &clauses).await?;
    read_indexes(executor, &quoted, &mut table).await?;

    Ok(table)
}

async fn read_foreign_keys(
    executor: &dyn SqlExecutor,
    quoted: &str,
    table: &mut TableSchema,
    clauses: &HashMap<String, ColumnClauses>,
) -> Result<()> {
    let rows = executor
        .query(&format!("PRAGMA foreign_key_list({})", quoted), &[])
        .await?;

    let mut by_id: HashMap<i64, Vec<_>> = HashMap::new();
    for row in rows.iter() {
        by_id.entry(row.int("id")).or_default().push(row);
    }

    let table_name = table.name.clone();
    for (_, key_rows) in by_id {
        if key_rows.len() > 1 {
            warn!(
                "Skipping multi-column foreign key on {} referencing {}: only single-column keys are modelled",
                table_name,
                key_rows[0].text("table")
            );
            continue;
        }
        let row = &key_rows[0];
        let column = row.required("from")?;
        let Some(field) = table.field_mut(column) else {
            continue;
        };

        field.index_type = if field.index_type.is_primary() {
            IndexType::ForeignPrimary
        } else {
            IndexType::ForeignKey
        };
        field.ref_table = row.required("table")?.to_string();
        field.ref_field = row.text("to").to_string();
        field.on_update_foreign_key = foreign_key_action(row.text("on_update"))?;
        field.on_delete_foreign_key = foreign_key_action(row.text("on_delete"))?;
        match clauses.get(&name_key(column)).and_then(|c| c.constraint_name.clone()) {
            Some(constraint) => field.index_name = constraint,
            None => field.set_safe_index_name(&table_name),
        }
    }

    Ok(())
}

async fn read_indexes(executor: &dyn SqlExecutor, quoted: &str, table: &mut TableSchema) -> Result<()> {
    let indexes = executor
        .query(&format!("PRAGMA index_list({})", quoted), &[])
        .await?;

    for index in indexes.iter() {
        // Automatic indexes backing a PRIMARY KEY are part of the key.
        if index.text("origin") == "pk" {
            continue;
        }
        let index_name = index.required("name")?;
        let columns = executor
            .query(&format!("PRAGMA index_info({})", quote_sqlite(index_name)?), &[])
            .await?;

        if columns.len() != 1 {
            warn!(
                "Skipping multi-column index {}.{}: only single-column indexes are modelled",
                table.name, index_name
            );
            continue;
        }
        let Some(column) = columns.iter().next().and_then(|c| c.get("name")) else {
            continue;
        };
        let Some(field) = table.field_mut(column) else {
            continue;
        };

        match field.index_type {
            IndexType::None => {
                field.index_type = if index.flag("unique") {
                    IndexType::Unique
                } else {
                    IndexType::Simple
                };
                field.index_name = index_name.to_string();
            }
            IndexType::Simple if index.flag("unique") => {
                field.index_type = IndexType::Unique;
                field.index_name = index_name.to_string();
            }
            _ => debug!("Index {} on {} ignored: field already has a key role", index_name, field.name),
        }
    }

    Ok(())
}

fn foreign_key_action(action: &str) -> Result<ForeignKeyActionType> {
    ForeignKeyActionType::from_sql(action).ok_or_else(|| DbSchemaError::UnsupportedForeignKeyAction {
        engine: ENGINE_NAME.to_string(),
        action: action.to_string(),
    })
}

/// Extract per-column clauses from a CREATE TABLE statement, keyed by
/// column name.
fn column_clauses(create_sql: &str) -> HashMap<String, ColumnClauses> {
    let mut clauses = HashMap::new();
    let (Some(open), Some(close)) = (create_sql.find('('), create_sql.rfind(')')) else {
        return clauses;
    };
    if close <= open {
        return clauses;
    }

    for segment in split_top_level(&create_sql[open + 1..close]) {
        let tokens = tokenize(&segment);
        let Some(first) = tokens.first() else {
            continue;
        };
        if matches!(
            first.to_uppercase().as_str(),
            "CONSTRAINT" | "PRIMARY" | "UNIQUE" | "CHECK" | "FOREIGN"
        ) {
            continue;
        }

        let mut column = ColumnClauses::default();
        for (i, token) in tokens.iter().enumerate() {
            let next = tokens.get(i + 1);
            match token.to_uppercase().as_str() {
                "AUTOINCREMENT" => column.autoincrement = true,
                "COLLATE" => column.collation = next.cloned(),
                "CONSTRAINT" => {
                    let references = tokens
                        .get(i + 2)
                        .is_some_and(|t| t.eq_ignore_ascii_case("REFERENCES"));
                    if references {
                        column.constraint_name = next.cloned();
                    }
                }
                _ => {}
            }
        }
        clauses.insert(name_key(first), column);
    }

    clauses
}

/// Split on commas outside parentheses and quotes.
fn split_top_level(body: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in body.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '[') => quote = Some(']'),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                segments.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        segments.push(current);
    }
    segments
}

/// Split a column definition into words, unquoting identifiers.
///
/// Parenthesized groups stay attached to the preceding word; doubled quote
/// characters inside identifiers are unescaped.
fn tokenize(segment: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = segment.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let closing = match c {
            '"' => Some('"'),
            '`' => Some('`'),
            '[' => Some(']'),
            _ => None,
        };

        let mut token = String::new();
        if let Some(closing) = closing {
            chars.next();
            while let Some(c) = chars.next() {
                if c == closing {
                    if closing != ']' && chars.peek() == Some(&closing) {
                        token.push(c);
                        chars.next();
                        continue;
                    }
                    break;
                }
                token.push(c);
            }
        } else {
            let mut depth = 0usize;
            while let Some(&c) = chars.peek() {
                if depth == 0 && c.is_whitespace() {
                    break;
                }
                match c {
                    '(' => depth += 1,
                    ')' => depth = depth.saturating_sub(1),
                    _ => {}
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    tokens
}
