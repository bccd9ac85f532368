//! Comparison rules shared by the engine adapters.
//!
//! Both adapters compare the same column attributes; they differ in which
//! attributes the engine can actually store. [`MatchRules`] captures that
//! difference so the comparison itself is written once.

use crate::core::data_type::DbDataType;
use crate::core::field::FieldSchema;
use crate::core::identifier::names_equal;

/// Attributes an engine preserves, and therefore compares.
#[derive(Debug, Clone, Copy)]
pub struct MatchRules {
    /// UNSIGNED on numeric types.
    pub unsigned: bool,
    /// Length of Char/VarChar.
    pub length: bool,
    /// Enum value sets.
    pub enum_values: bool,
    /// Collation of character types.
    pub collation: bool,
    /// Primary key columns are always stored NOT NULL.
    pub primary_implies_not_null: bool,
}

/// Compare the column attributes of two fields, data type excluded.
///
/// Attributes that do not apply to the gauge's type are ignored, so a stale
/// `length` on an Integer field never causes a difference.
pub fn column_attributes_match(gauge: &FieldSchema, actual: &FieldSchema, rules: MatchRules) -> bool {
    let data_type = gauge.data_type;
    let not_null = |f: &FieldSchema| {
        f.not_null || (rules.primary_implies_not_null && f.index_type.is_primary())
    };

    if not_null(gauge) != not_null(actual) {
        return false;
    }
    if data_type.is_integer() && gauge.autoincrement != actual.autoincrement {
        return false;
    }
    if rules.unsigned && data_type.is_numeric() && gauge.unsigned != actual.unsigned {
        return false;
    }
    if rules.length && data_type.has_length() && gauge.length != actual.length {
        return false;
    }
    if rules.enum_values
        && data_type == DbDataType::Enum
        && gauge.enum_value_set() != actual.enum_value_set()
    {
        return false;
    }
    if rules.collation && data_type.has_collation() && gauge.collation_type != actual.collation_type {
        return false;
    }
    true
}

/// Compare the referenced column and referential actions of two foreign keys.
pub fn foreign_details_match(gauge: &FieldSchema, actual: &FieldSchema) -> bool {
    names_equal(&gauge.ref_table, &actual.ref_table)
        && names_equal(&gauge.ref_field, &actual.ref_field)
        && gauge.on_update_foreign_key == actual.on_update_foreign_key
        && gauge.on_delete_foreign_key == actual.on_delete_foreign_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::{CollationType, ForeignKeyActionType};

    const ALL_RULES: MatchRules = MatchRules {
        unsigned: true,
        length: true,
        enum_values: true,
        collation: true,
        primary_implies_not_null: true,
    };

    const NO_RULES: MatchRules = MatchRules {
        unsigned: false,
        length: false,
        enum_values: false,
        collation: false,
        primary_implies_not_null: false,
    };

    #[test]
    fn test_length_compared_only_for_length_types() {
        let a = FieldSchema::new("n", DbDataType::VarChar).with_length(50);
        let b = FieldSchema::new("n", DbDataType::VarChar).with_length(40);
        assert!(!column_attributes_match(&a, &b, ALL_RULES));
        assert!(column_attributes_match(&a, &b, NO_RULES));

        let a = FieldSchema::new("n", DbDataType::Integer).with_length(5);
        let b = FieldSchema::new("n", DbDataType::Integer);
        assert!(column_attributes_match(&a, &b, ALL_RULES));
    }

    #[test]
    fn test_not_null_always_compared() {
        let a = FieldSchema::new("n", DbDataType::Text).not_null();
        let b = FieldSchema::new("n", DbDataType::Text);
        assert!(!column_attributes_match(&a, &b, NO_RULES));

        let a = FieldSchema::new("id", DbDataType::Integer).primary();
        let b = FieldSchema::new("id", DbDataType::Integer).not_null().primary();
        assert!(column_attributes_match(&a, &b, ALL_RULES));
        assert!(!column_attributes_match(&a, &b, NO_RULES));
    }

    #[test]
    fn test_unsigned_and_collation_rules() {
        let a = FieldSchema::new("n", DbDataType::Integer).unsigned();
        let b = FieldSchema::new("n", DbDataType::Integer);
        assert!(!column_attributes_match(&a, &b, ALL_RULES));
        assert!(column_attributes_match(&a, &b, NO_RULES));

        let a = FieldSchema::new("n", DbDataType::Text).with_collation(CollationType::AsciiBinary);
        let b = FieldSchema::new("n", DbDataType::Text);
        assert!(!column_attributes_match(&a, &b, ALL_RULES));
    }

    #[test]
    fn test_foreign_details_match() {
        let a = FieldSchema::new("user_id", DbDataType::Integer).references("fk", "Users", "ID");
        let b = FieldSchema::new("user_id", DbDataType::Integer).references("fk", "users", "id");
        assert!(foreign_details_match(&a, &b));

        let c = b.clone().on_delete(ForeignKeyActionType::Cascade);
        assert!(!foreign_details_match(&a, &c));
    }
}
