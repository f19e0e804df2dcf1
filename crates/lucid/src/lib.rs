//! Lucid ORM: explicit relationships and batched eager loading over a
//! fluent query builder.
//!
//! The layer below (`lucid-query`) renders one parameterized statement per
//! query expression; this crate adds what an application actually works
//! with:
//!
//! - relationship descriptors ([`HasOne`], [`HasMany`], [`BelongsTo`],
//!   [`ManyToMany`]) that resolve lazily and cache the result per instance
//! - [`Collection`] with batched eager loading, so resolving a relation for
//!   N owners costs one query instead of N
//! - persistence helpers ([`find`], [`save`], [`delete`])
//!
//! # Quick start
//!
//! ```ignore
//! use lucid::prelude::*;
//!
//! struct Customer {
//!     id: Option<i64>,
//!     name: String,
//!     orders: HasMany<Order>,
//! }
//!
//! impl Customer {
//!     fn orders(&self, conn: &impl Connection) -> Result<&[Order]> {
//!         self.orders.get(conn, &self.primary_key_value())
//!     }
//! }
//!
//! fn example(conn: &impl Connection) -> Result<()> {
//!     let customer: Option<Customer> = lucid::find(conn, 1)?;
//!
//!     // one query per collection, not per member
//!     let customers: Collection<Customer> =
//!         Query::<Customer>::new().all(conn)?.into();
//!     customers.load_has_many(conn, |c| &c.orders)?;
//!     Ok(())
//! }
//! ```
//!
//! Everything takes an explicit connection; there is no ambient registry or
//! global state.

pub mod collection;
pub mod persist;
pub mod relations;

pub use collection::{Collection, MorphTarget};
pub use persist::{delete, find, save, save_tracked};
pub use relations::{BelongsTo, HasMany, HasOne, ManyToMany};

// Re-export the lower layers so applications depend on one crate.
pub use lucid_core::{
    AutoIncrement, Connection, Error, FieldInfo, Key, Model, QueryCounter, Result, Row, Tracked,
    Value,
};
pub use lucid_query::{Direction, InsertBuilder, Op, PageSource, Query};

/// Common imports for application code.
pub mod prelude {
    pub use crate::collection::{Collection, MorphTarget};
    pub use crate::persist::{delete, find, save, save_tracked};
    pub use crate::relations::{BelongsTo, HasMany, HasOne, ManyToMany};
    pub use lucid_core::{
        AutoIncrement, Connection, Error, FieldInfo, Model, Result, Row, Tracked, Value,
    };
    pub use lucid_query::{Direction, Op, PageSource, Query};
}
