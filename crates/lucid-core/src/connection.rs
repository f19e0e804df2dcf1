//! Database connection abstraction.

use crate::Result;
use crate::row::Row;
use crate::value::Value;
use std::cell::Cell;

/// A synchronous database connection.
///
/// Execution is blocking and single-threaded: one statement runs at a time
/// on the calling thread. Parameters bind positionally to `?` placeholders,
/// in slice order.
pub trait Connection {
    /// Run a query and return all result rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a query and return the first row, if any.
    fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Run an INSERT and return the last inserted row id.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64>;

    /// Begin a transaction.
    fn begin(&self) -> Result<()>;

    /// Commit the current transaction.
    fn commit(&self) -> Result<()>;

    /// Roll back the current transaction.
    fn rollback(&self) -> Result<()>;
}

/// A connection wrapper that counts issued statements.
///
/// Useful for asserting query counts, e.g. that eager loading a relation
/// touches the database exactly once regardless of collection size.
pub struct QueryCounter<C> {
    inner: C,
    statements: Cell<u64>,
}

impl<C: Connection> QueryCounter<C> {
    /// Wrap a connection.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            statements: Cell::new(0),
        }
    }

    /// Number of statements issued since creation or the last reset.
    pub fn count(&self) -> u64 {
        self.statements.get()
    }

    /// Reset the statement counter to zero.
    pub fn reset(&self) {
        self.statements.set(0);
    }

    /// Unwrap the inner connection.
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn tick(&self) {
        self.statements.set(self.statements.get() + 1);
    }
}

impl<C: Connection> Connection for QueryCounter<C> {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.tick();
        self.inner.query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.tick();
        self.inner.execute(sql, params)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
        self.tick();
        self.inner.insert(sql, params)
    }

    fn begin(&self) -> Result<()> {
        self.inner.begin()
    }

    fn commit(&self) -> Result<()> {
        self.inner.commit()
    }

    fn rollback(&self) -> Result<()> {
        self.inner.rollback()
    }
}
