//! SQLite-backed connection.

use lucid_core::{
    ColumnInfo, Connection, ConnectionError, ConnectionErrorKind, Error, QueryError,
    QueryErrorKind, Result, Row, TransactionError, TransactionErrorKind, Value,
};
use rusqlite::types::ValueRef;
use std::path::Path;
use std::sync::Arc;

/// A synchronous connection to a SQLite database.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open a database file, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = rusqlite::Connection::open(path).map_err(open_error)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(open_error)?;
        Ok(Self { conn })
    }

    /// Run multiple statements separated by semicolons (for DDL setup).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| query_error(e, sql))
    }
}

impl Connection for SqliteConnection {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        tracing::debug!(sql = %sql, bind_count = params.len(), "query");
        let mut stmt = self.conn.prepare(sql).map_err(|e| query_error(e, sql))?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|s| (*s).to_string()).collect();
        let columns = Arc::new(ColumnInfo::new(column_names));
        let column_count = columns.len();

        let mut sql_rows = stmt
            .query(rusqlite::params_from_iter(params.iter().map(to_sqlite)))
            .map_err(|e| query_error(e, sql))?;

        let mut rows = Vec::new();
        while let Some(sql_row) = sql_rows.next().map_err(|e| query_error(e, sql))? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value_ref = sql_row.get_ref(i).map_err(|e| query_error(e, sql))?;
                values.push(from_sqlite(value_ref));
            }
            rows.push(Row::with_columns(Arc::clone(&columns), values));
        }
        Ok(rows)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        tracing::debug!(sql = %sql, bind_count = params.len(), "execute");
        let affected = self
            .conn
            .execute(sql, rusqlite::params_from_iter(params.iter().map(to_sqlite)))
            .map_err(|e| query_error(e, sql))?;
        Ok(affected as u64)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
        self.execute(sql, params)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn begin(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN").map_err(|e| {
            Error::Transaction(TransactionError {
                kind: TransactionErrorKind::AlreadyActive,
                message: e.to_string(),
            })
        })
    }

    fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT").map_err(|e| {
            Error::Transaction(TransactionError {
                kind: TransactionErrorKind::NotActive,
                message: e.to_string(),
            })
        })
    }

    fn rollback(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK").map_err(|e| {
            Error::Transaction(TransactionError {
                kind: TransactionErrorKind::NotActive,
                message: e.to_string(),
            })
        })
    }
}

fn to_sqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        Value::Int(i) => rusqlite::types::Value::Integer(*i),
        Value::Float(f) => rusqlite::types::Value::Real(*f),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

fn open_error(err: rusqlite::Error) -> Error {
    Error::Connection(ConnectionError {
        kind: ConnectionErrorKind::Open,
        message: err.to_string(),
        source: Some(Box::new(err)),
    })
}

fn query_error(err: rusqlite::Error, sql: &str) -> Error {
    let message = err.to_string();
    let kind = match &err {
        rusqlite::Error::SqliteFailure(ffi, _)
            if ffi.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            QueryErrorKind::Constraint
        }
        _ if message.contains("syntax error") => QueryErrorKind::Syntax,
        _ if message.contains("no such table") || message.contains("no such column") => {
            QueryErrorKind::NotFound
        }
        _ => QueryErrorKind::Database,
    };
    Error::Query(QueryError {
        kind,
        sql: Some(sql.to_string()),
        message,
        source: Some(Box::new(err)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SqliteConnection {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL, score REAL)",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_insert_returns_last_id() {
        let conn = setup();
        let id = conn
            .insert(
                "INSERT INTO notes (body) VALUES (?)",
                &[Value::Text("first".into())],
            )
            .unwrap();
        assert_eq!(id, 1);

        let id = conn
            .insert(
                "INSERT INTO notes (body) VALUES (?)",
                &[Value::Text("second".into())],
            )
            .unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn test_query_round_trips_values() {
        let conn = setup();
        conn.insert(
            "INSERT INTO notes (body, score) VALUES (?, ?)",
            &[Value::Text("hello".into()), Value::Float(2.5)],
        )
        .unwrap();

        let rows = conn.query("SELECT id, body, score FROM notes", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_by_name("id"), Some(&Value::Int(1)));
        assert_eq!(rows[0].get_by_name("body"), Some(&Value::Text("hello".into())));
        assert_eq!(rows[0].get_by_name("score"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_null_round_trip() {
        let conn = setup();
        conn.insert(
            "INSERT INTO notes (body, score) VALUES (?, ?)",
            &[Value::Text("x".into()), Value::Null],
        )
        .unwrap();

        let rows = conn.query("SELECT score FROM notes", &[]).unwrap();
        assert_eq!(rows[0].get(0), Some(&Value::Null));
    }

    #[test]
    fn test_syntax_error_maps_to_syntax_kind() {
        let conn = setup();
        let err = conn.query("SELEKT * FROM notes", &[]).unwrap_err();
        match err {
            Error::Query(q) => assert_eq!(q.kind, QueryErrorKind::Syntax),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_table_maps_to_not_found() {
        let conn = setup();
        let err = conn.query("SELECT * FROM nope", &[]).unwrap_err();
        match err {
            Error::Query(q) => assert_eq!(q.kind, QueryErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_constraint_violation_kind() {
        let conn = setup();
        let err = conn
            .insert("INSERT INTO notes (body) VALUES (?)", &[Value::Null])
            .unwrap_err();
        match err {
            Error::Query(q) => assert_eq!(q.kind, QueryErrorKind::Constraint),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_transaction_rollback_discards_writes() {
        let conn = setup();
        conn.begin().unwrap();
        conn.insert(
            "INSERT INTO notes (body) VALUES (?)",
            &[Value::Text("temp".into())],
        )
        .unwrap();
        conn.rollback().unwrap();

        let rows = conn.query("SELECT COUNT(*) AS num FROM notes", &[]).unwrap();
        assert_eq!(rows[0].get_named::<i64>("num").unwrap(), 0);
    }

    #[test]
    fn test_commit_without_begin_is_transaction_error() {
        let conn = setup();
        assert!(matches!(
            conn.commit().unwrap_err(),
            Error::Transaction(_)
        ));
    }
}
