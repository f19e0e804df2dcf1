//! SQLite driver for the Lucid ORM, backed by `rusqlite` with the bundled
//! engine so tests run without a system SQLite.

pub mod connection;

pub use connection::SqliteConnection;
