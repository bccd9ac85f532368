//! Repair statements executed against an in-memory SQLite database and
//! read back through introspection.

#![cfg(feature = "sqlite")]

use dbschema::drivers::sqlite::SqliteExecutor;
use dbschema::repair::{apply_repairs, check_schema, create_database_statements};
use dbschema::{
    CollationType, DbDataType, DbSchemaError, EngineAdapter, FieldSchema, ForeignKeyActionType, IndexType,
    RepairConfig, Schema, SqlExecutor, SqliteAdapter, TableSchema,
};

fn gauge() -> Schema {
    let mut schema = Schema::new("shop")
        .with_table(
            TableSchema::new("orders")
                .with_field(
                    FieldSchema::new("id", DbDataType::IntegerBig)
                        .not_null()
                        .autoincrement()
                        .primary(),
                )
                .with_field(
                    FieldSchema::new("customer_id", DbDataType::Integer)
                        .references("", "customers", "id")
                        .on_delete(ForeignKeyActionType::Cascade),
                )
                .with_field(FieldSchema::new("total", DbDataType::Decimal).not_null())
                .with_field(
                    FieldSchema::new("reference", DbDataType::VarChar)
                        .with_length(32)
                        .with_collation(CollationType::AsciiCaseInsensitive)
                        .indexed(IndexType::Unique, ""),
                )
                .with_field(
                    FieldSchema::new("placed_at", DbDataType::DateTime)
                        .indexed(IndexType::Simple, ""),
                ),
        )
        .with_table(
            TableSchema::new("customers")
                .with_field(FieldSchema::new("id", DbDataType::Integer).not_null().primary())
                .with_field(FieldSchema::new("photo", DbDataType::Blob)),
        );
    schema.set_safe_index_names();
    schema
}

async fn executor() -> SqliteExecutor {
    SqliteExecutor::connect("sqlite::memory:").await.unwrap()
}

#[tokio::test]
async fn test_created_schema_introspects_as_gauge() {
    let adapter = SqliteAdapter::new();
    let executor = executor().await;
    let gauge = gauge();

    executor
        .execute_batch(&create_database_statements(&gauge, &adapter).unwrap())
        .await
        .unwrap();

    let actual = adapter.introspect_schema(&executor).await.unwrap();
    for gauge_table in &gauge.tables {
        let actual_table = actual.table(&gauge_table.name).unwrap();
        for gauge_field in &gauge_table.fields {
            let actual_field = actual_table.field(&gauge_field.name).unwrap();
            assert!(
                adapter.field_schema_match(gauge_field, actual_field).unwrap(),
                "{} vs {}",
                gauge_field.definition(),
                actual_field.definition()
            );
            assert!(adapter.field_index_match(gauge_field, actual_field).unwrap());
        }
    }

    let orders = actual.table("orders").unwrap();
    assert_eq!(orders.field("customer_id").unwrap().index_name, "orders_customer_id_fk");
    assert_eq!(orders.field("reference").unwrap().index_name, "orders_reference_idx");
}

#[tokio::test]
async fn test_missing_table_repair_then_check_is_clean() {
    let adapter = SqliteAdapter::new();
    let executor = executor().await;
    let gauge = gauge();

    let errors = check_schema(&gauge, &adapter, &executor).await.unwrap();
    assert_eq!(errors.len(), 2);

    let options = RepairConfig {
        use_transaction: true,
        suspend_foreign_keys: true,
    };
    let outcome = apply_repairs(&errors, &adapter, &executor, &options)
        .await
        .unwrap();
    assert!(outcome.is_complete());

    let errors = check_schema(&gauge, &adapter, &executor).await.unwrap();
    assert!(errors.is_empty(), "{:?}", errors);
}

#[tokio::test]
async fn test_added_field_is_repaired() {
    let adapter = SqliteAdapter::new();
    let executor = executor().await;
    let mut gauge = gauge();

    executor
        .execute_batch(&create_database_statements(&gauge, &adapter).unwrap())
        .await
        .unwrap();

    let customers = gauge.table_mut("customers").unwrap();
    customers
        .fields
        .push(FieldSchema::new("name", DbDataType::VarChar).with_length(80).not_null());
    customers.fields.push(
        FieldSchema::new("tier", DbDataType::IntegerTiny).indexed(IndexType::Simple, "customers_tier_idx"),
    );

    let errors = check_schema(&gauge, &adapter, &executor).await.unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.is_repairable));

    apply_repairs(&errors, &adapter, &executor, &RepairConfig::default())
        .await
        .unwrap();
    assert!(check_schema(&gauge, &adapter, &executor).await.unwrap().is_empty());
}

fn order_lines(autoincrement: bool) -> Schema {
    let line_no = FieldSchema::new("line_no", DbDataType::Integer).not_null().primary();
    Schema::new("lines").with_table(
        TableSchema::new("lines")
            .with_field(FieldSchema::new("order_id", DbDataType::Integer).not_null().primary())
            .with_field(if autoincrement { line_no.autoincrement() } else { line_no })
            .with_field(FieldSchema::new("quantity", DbDataType::Integer).not_null()),
    )
}

#[tokio::test]
async fn test_composite_key_autoincrement_is_rejected() {
    let adapter = SqliteAdapter::new();

    match create_database_statements(&order_lines(true), &adapter) {
        Err(DbSchemaError::UnsupportedFeature { table, field, .. }) => {
            assert_eq!(table, "lines");
            assert_eq!(field, "line_no");
        }
        other => panic!("expected UnsupportedFeature, got {:?}", other),
    }

    // Without AUTOINCREMENT the composite key converges.
    let executor = executor().await;
    let gauge = order_lines(false);
    executor
        .execute_batch(&create_database_statements(&gauge, &adapter).unwrap())
        .await
        .unwrap();

    let actual = adapter.introspect_schema(&executor).await.unwrap();
    let lines = actual.table("lines").unwrap();
    assert_eq!(lines.primary_key_fields().count(), 2);
    assert!(check_schema(&gauge, &adapter, &executor).await.unwrap().is_empty());
}
