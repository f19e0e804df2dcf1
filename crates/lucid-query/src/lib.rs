//! Fluent SQL query builder for the Lucid ORM.
//!
//! Builds parameterized statements with positional `?` placeholders; bind
//! values are always collected in placeholder order. User input never lands
//! in the SQL string.

pub mod clause;
pub mod expr;
pub mod insert;
pub mod join;
pub mod op;
pub mod query;

pub use clause::{Direction, GroupBy, OrderBy};
pub use expr::{Connector, Expr, Predicate, WhereClause};
pub use insert::InsertBuilder;
pub use join::{Join, JoinType};
pub use op::Op;
pub use query::{PageSource, Query};
