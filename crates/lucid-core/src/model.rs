//! The `Model` trait: struct <-> table mapping.

use crate::Result;
use crate::row::Row;
use crate::value::Value;

/// Static metadata for a single model field.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// Column name
    pub name: &'static str,
    /// Whether this field is the primary key
    pub primary_key: bool,
    /// Whether the database generates this value on insert
    pub auto_increment: bool,
}

impl FieldInfo {
    /// A plain column.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            primary_key: false,
            auto_increment: false,
        }
    }

    /// An auto-incrementing integer primary key.
    #[must_use]
    pub const fn auto_pk(name: &'static str) -> Self {
        Self {
            name,
            primary_key: true,
            auto_increment: true,
        }
    }
}

/// Trait implemented by structs that map to a database table.
///
/// Each instance hydrated from a row is an independent copy; fetching the
/// same database row twice yields two unrelated instances.
pub trait Model: Sized {
    /// The table name.
    const TABLE_NAME: &'static str;

    /// The primary key column name.
    const PRIMARY_KEY: &'static str;

    /// Field metadata, in column order.
    fn fields() -> &'static [FieldInfo];

    /// Convert this model to (column, value) pairs for persistence.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Hydrate a model from a result row.
    fn from_row(row: &Row) -> Result<Self>;

    /// The current primary key value (`Value::Null` when unset).
    fn primary_key_value(&self) -> Value;

    /// Whether this instance has not been persisted yet.
    fn is_new(&self) -> bool {
        self.primary_key_value().is_null()
    }

    /// All column names, in field order.
    fn column_names() -> Vec<&'static str> {
        Self::fields().iter().map(|f| f.name).collect()
    }
}

/// Models with a database-generated integer primary key.
///
/// Lets insert paths write the generated id back into the instance.
pub trait AutoIncrement: Model {
    /// Store the database-assigned id.
    fn set_id(&mut self, id: i64);
}
