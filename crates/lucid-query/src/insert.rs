//! INSERT statement builder.

use lucid_core::{BuilderErrorKind, Error, Model, Result, Value};

/// Builds a parameterized INSERT for a model instance.
///
/// Auto-increment columns whose value is NULL are skipped so the database
/// assigns them.
#[derive(Debug)]
pub struct InsertBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl InsertBuilder {
    /// Create an insert from a model instance.
    pub fn new<M: Model>(model: &M) -> Self {
        let mut columns = Vec::new();
        let mut values = Vec::new();

        for (name, value) in model.to_row() {
            let auto = M::fields()
                .iter()
                .any(|f| f.name == name && f.auto_increment);
            if auto && value.is_null() {
                continue;
            }
            columns.push(name);
            values.push(value);
        }

        Self {
            table: M::TABLE_NAME,
            columns,
            values,
        }
    }

    /// Build the SQL and bind parameters.
    pub fn build(self) -> Result<(String, Vec<Value>)> {
        if self.columns.is_empty() {
            return Err(Error::builder(
                BuilderErrorKind::EmptyWrite,
                format!("no insertable columns for table '{}'", self.table),
            ));
        }

        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            placeholders
        );
        Ok((sql, self.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_core::{FieldInfo, Row};

    struct User {
        id: Option<i64>,
        name: String,
        email: String,
    }

    impl Model for User {
        const TABLE_NAME: &'static str = "users";
        const PRIMARY_KEY: &'static str = "id";

        fn fields() -> &'static [FieldInfo] {
            const FIELDS: &[FieldInfo] = &[
                FieldInfo::auto_pk("id"),
                FieldInfo::new("name"),
                FieldInfo::new("email"),
            ];
            FIELDS
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", self.id.into()),
                ("name", self.name.clone().into()),
                ("email", self.email.clone().into()),
            ]
        }

        fn from_row(row: &Row) -> Result<Self> {
            Ok(Self {
                id: row.get_named("id")?,
                name: row.get_named("name")?,
                email: row.get_named("email")?,
            })
        }

        fn primary_key_value(&self) -> Value {
            self.id.into()
        }
    }

    #[test]
    fn test_insert_skips_unset_auto_increment() {
        let user = User {
            id: None,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        };

        let (sql, params) = InsertBuilder::new(&user).build().unwrap();
        assert_eq!(sql, "INSERT INTO users (name, email) VALUES (?, ?)");
        assert_eq!(
            params,
            vec![
                Value::Text("Alice".to_string()),
                Value::Text("alice@example.com".to_string()),
            ]
        );
    }

    #[test]
    fn test_insert_keeps_explicit_primary_key() {
        let user = User {
            id: Some(42),
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
        };

        let (sql, params) = InsertBuilder::new(&user).build().unwrap();
        assert_eq!(sql, "INSERT INTO users (id, name, email) VALUES (?, ?, ?)");
        assert_eq!(params[0], Value::Int(42));
    }
}
