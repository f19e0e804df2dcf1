//! Core types and traits for the Lucid ORM.
//!
//! This crate provides the foundational abstractions:
//!
//! - `Value` dynamic SQL value and its hashable `Key` projection
//! - `Row` / `ColumnInfo` result rows with shared column metadata
//! - `Model` trait for struct <-> table mapping
//! - `Connection` trait for synchronous database access
//! - `Tracked` snapshot-based change tracking

pub mod connection;
pub mod error;
pub mod model;
pub mod row;
pub mod tracked;
pub mod value;

pub use connection::{Connection, QueryCounter};
pub use error::{
    BuilderError, BuilderErrorKind, ConnectionError, ConnectionErrorKind, Error, QueryError,
    QueryErrorKind, Result, TransactionError, TransactionErrorKind, TypeError,
};
pub use model::{AutoIncrement, FieldInfo, Model};
pub use row::{ColumnInfo, FromValue, Row};
pub use tracked::Tracked;
pub use value::{Key, Value};
