//! Schema comparison.
//!
//! [`compare`] walks a gauge schema against an actual schema and reports
//! every difference as a [`SchemaError`] carrying the statements that repair
//! it. The comparison is pure: it never touches a connection, and the engine
//! adapter only decides what counts as a difference and how to express the
//! repair.
//!
//! Errors come back sorted by [`SchemaErrorType`]; applying the repairable
//! ones in that order creates tables before altering fields and drops
//! indexes after the fields they depend on change.

pub mod types;

pub use types::{SchemaError, SchemaErrorType};

use tracing::{debug, info};

use crate::core::field::{FieldSchema, IndexType};
use crate::core::schema::Schema;
use crate::core::table::TableSchema;
use crate::core::traits::EngineAdapter;
use crate::error::Result;

/// Compare `actual` against `gauge`.
///
/// # Errors
///
/// Fails when the adapter cannot express a gauge table at all (unsupported
/// feature) or a gauge identifier cannot be quoted. Differences the adapter cannot
/// repair are reported as unrepairable errors, not failures.
pub fn compare(gauge: &Schema, actual: &Schema, adapter: &dyn EngineAdapter) -> Result<Vec<SchemaError>> {
    let mut errors = Vec::new();

    for gauge_table in gauge.tables_in_create_order() {
        match actual.table(&gauge_table.name) {
            None => errors.push(SchemaError::new(
                SchemaErrorType::TableMissing,
                &gauge_table.name,
                None,
                format!("Table '{}' is missing", gauge_table.name.trim()),
                Some(adapter.create_table_statements(gauge_table)?),
            )),
            Some(actual_table) => compare_tables(gauge_table, actual_table, adapter, &mut errors)?,
        }
    }

    // Referencing tables are dropped before the tables they reference.
    for actual_table in actual.tables_in_create_order().into_iter().rev() {
        if gauge.table(&actual_table.name).is_none() {
            errors.push(SchemaError::new(
                SchemaErrorType::TableObsolete,
                &actual_table.name,
                None,
                format!("Table '{}' is obsolete", actual_table.name.trim()),
                Some(adapter.drop_table_statements(actual_table)?),
            ));
        }
    }

    errors.sort_by_key(|e| e.error_type);

    info!(
        "Schema comparison found {} differences ({} unrepairable)",
        errors.len(),
        errors.iter().filter(|e| !e.is_repairable).count()
    );

    Ok(errors)
}

fn compare_tables(
    gauge: &TableSchema,
    actual: &TableSchema,
    adapter: &dyn EngineAdapter,
    errors: &mut Vec<SchemaError>,
) -> Result<()> {
    // Statements address the table by its live name.
    let table = actual.name.trim();
    debug!("Comparing table {}", table);

    // Key statements address one field at a time, so they cannot rebuild a
    // multi-column primary key.
    let composite_key =
        gauge.primary_key_fields().count() > 1 || actual.primary_key_fields().count() > 1;
    let key_locked = |gauge_field: &FieldSchema, actual_field: &FieldSchema| {
        composite_key && (gauge_field.index_type.is_primary() || actual_field.index_type.is_primary())
    };

    for gauge_field in &gauge.fields {
        let Some(actual_field) = actual.field(&gauge_field.name) else {
            errors.push(SchemaError::new(
                SchemaErrorType::FieldMissing,
                table,
                Some(&gauge_field.name),
                format!("Field is missing: {}", gauge_field.definition()),
                adapter.add_field_statements(table, gauge_field)?,
            ));
            continue;
        };

        let schema_match = adapter.field_schema_match(gauge_field, actual_field)?;
        let index_match = adapter.field_index_match(gauge_field, actual_field)?;

        match (schema_match, index_match) {
            (true, true) => {}
            (false, true) => errors.push(SchemaError::new(
                SchemaErrorType::FieldDefinitionObsolete,
                table,
                Some(&gauge_field.name),
                obsolete_description(gauge_field, actual_field),
                adapter.alter_field_statements(table, gauge_field, actual_field)?,
            )),
            (false, false) => {
                let statements = if key_locked(gauge_field, actual_field) {
                    None
                } else {
                    adapter.replace_field_statements(table, gauge_field, actual_field)?
                };
                errors.push(SchemaError::new(
                    SchemaErrorType::FieldDefinitionObsolete,
                    table,
                    Some(&gauge_field.name),
                    obsolete_description(gauge_field, actual_field),
                    statements,
                ))
            }
            (true, false) => {
                let error = index_error(table, gauge_field, actual_field, adapter)?;
                errors.push(if key_locked(gauge_field, actual_field) {
                    error.unrepairable()
                } else {
                    error
                })
            }
        }
    }

    for actual_field in &actual.fields {
        if gauge.field(&actual_field.name).is_none() {
            errors.push(SchemaError::new(
                SchemaErrorType::FieldObsolete,
                table,
                Some(&actual_field.name),
                format!("Field is redundant: {}", actual_field.definition()),
                adapter.drop_field_statements(table, actual_field)?,
            ));
        }
    }

    Ok(())
}

/// Classify an index-only difference: missing, redundant or changed.
fn index_error(
    table: &str,
    gauge: &FieldSchema,
    actual: &FieldSchema,
    adapter: &dyn EngineAdapter,
) -> Result<SchemaError> {
    let field = Some(gauge.name.as_str());

    if actual.index_type == IndexType::None {
        return Ok(SchemaError::new(
            SchemaErrorType::IndexMissing,
            table,
            field,
            format!("Index is missing: {}", gauge.definition()),
            adapter.add_index_statements(table, gauge)?,
        ));
    }

    if gauge.index_type == IndexType::None {
        return Ok(SchemaError::new(
            SchemaErrorType::IndexObsolete,
            table,
            field,
            format!("Index is redundant: {}", actual.definition()),
            adapter.drop_index_statements(table, actual)?,
        ));
    }

    let statements = match (
        adapter.drop_index_statements(table, actual)?,
        adapter.add_index_statements(table, gauge)?,
    ) {
        (Some(mut drop), Some(add)) => {
            drop.extend(add);
            Some(drop)
        }
        _ => None,
    };

    Ok(SchemaError::new(
        SchemaErrorType::IndexObsolete,
        table,
        field,
        format!(
            "Index is obsolete: expected {}, found {}",
            gauge.definition(),
            actual.definition()
        ),
        statements,
    ))
}

fn obsolete_description(gauge: &FieldSchema, actual: &FieldSchema) -> String {
    format!(
        "Field definition is obsolete: expected {}, found {}",
        gauge.definition(),
        actual.definition()
    )
}

/// Render comparison results, one difference per line.
pub fn format_report(errors: &[SchemaError]) -> String {
    if errors.is_empty() {
        return "Schema is up to date.".to_string();
    }

    let unrepairable = errors.iter().filter(|e| !e.is_repairable).count();
    let mut report = format!(
        "{} differences found ({} repairable, {} unrepairable):",
        errors.len(),
        errors.len() - unrepairable,
        unrepairable
    );
    for error in errors {
        report.push('\n');
        report.push_str(&error.to_string());
    }
    report
}
