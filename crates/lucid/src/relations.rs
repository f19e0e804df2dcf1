//! Relationship descriptors with memoized resolution.
//!
//! A descriptor names the columns an association runs through and caches the
//! resolved value on first access. Resolution is a one-way state machine:
//! unresolved -> one query -> resolved for the rest of the instance's
//! lifetime. Only re-fetching the owning model resets it.
//!
//! Descriptors are registered explicitly on each model struct; nothing is
//! inferred from field names.

use lucid_core::{Connection, Model, Result, Row, Value};
use lucid_query::{Op, Query};
use serde::ser::{Serialize, Serializer};
use std::cell::OnceCell;
use std::fmt;

/// A one-to-one association: the related table carries a foreign key
/// pointing at the owner's primary key.
pub struct HasOne<R: Model> {
    foreign_key: &'static str,
    cell: OnceCell<Option<R>>,
}

impl<R: Model> HasOne<R> {
    /// Declare the association through the given column on the related table.
    #[must_use]
    pub fn new(foreign_key: &'static str) -> Self {
        Self {
            foreign_key,
            cell: OnceCell::new(),
        }
    }

    /// Resolve the related model, querying at most once.
    ///
    /// A NULL owner key resolves to `None` without touching the database.
    pub fn get(&self, conn: &impl Connection, owner_pk: &Value) -> Result<Option<&R>> {
        if let Some(resolved) = self.cell.get() {
            return Ok(resolved.as_ref());
        }
        let fetched = if owner_pk.is_null() {
            None
        } else {
            Query::<R>::new()
                .filter(self.foreign_key, Op::Eq, owner_pk.clone())
                .first(conn)?
        };
        Ok(self.cell.get_or_init(|| fetched).as_ref())
    }

    /// The already-resolved value, if any. Never queries.
    pub fn cached(&self) -> Option<&R> {
        self.cell.get().and_then(Option::as_ref)
    }

    /// Whether the association has been resolved (including resolved-absent).
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Store an externally resolved value (used by eager loading).
    /// Ignored if the association is already resolved.
    pub fn set_resolved(&self, value: Option<R>) {
        let _ = self.cell.set(value);
    }

    /// The foreign key column on the related table.
    pub fn foreign_key(&self) -> &'static str {
        self.foreign_key
    }
}

/// A one-to-many association: many related rows carry a foreign key
/// pointing at the owner's primary key.
pub struct HasMany<R: Model> {
    foreign_key: &'static str,
    cell: OnceCell<Vec<R>>,
}

impl<R: Model> HasMany<R> {
    /// Declare the association through the given column on the related table.
    #[must_use]
    pub fn new(foreign_key: &'static str) -> Self {
        Self {
            foreign_key,
            cell: OnceCell::new(),
        }
    }

    /// Resolve the related models, querying at most once.
    ///
    /// Row order is whatever the database returns; callers wanting a stable
    /// order should fetch through a query with `order_by` instead.
    pub fn get(&self, conn: &impl Connection, owner_pk: &Value) -> Result<&[R]> {
        if let Some(resolved) = self.cell.get() {
            return Ok(resolved);
        }
        let fetched = if owner_pk.is_null() {
            Vec::new()
        } else {
            Query::<R>::new()
                .filter(self.foreign_key, Op::Eq, owner_pk.clone())
                .all(conn)?
        };
        Ok(self.cell.get_or_init(|| fetched))
    }

    /// The already-resolved rows, if any. Never queries.
    pub fn cached(&self) -> Option<&[R]> {
        self.cell.get().map(Vec::as_slice)
    }

    /// Whether the association has been resolved (including resolved-empty).
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Store externally resolved rows (used by eager loading).
    /// Ignored if the association is already resolved.
    pub fn set_resolved(&self, values: Vec<R>) {
        let _ = self.cell.set(values);
    }

    /// The foreign key column on the related table.
    pub fn foreign_key(&self) -> &'static str {
        self.foreign_key
    }
}

/// The inverse association: the *owner* row carries the foreign key, and it
/// points at the related table's primary key.
pub struct BelongsTo<R: Model> {
    cell: OnceCell<Option<R>>,
}

impl<R: Model> BelongsTo<R> {
    /// Declare the association. The owner supplies its foreign key value at
    /// resolution time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Resolve the parent model, querying at most once.
    ///
    /// A NULL foreign key resolves to `None` without touching the database.
    pub fn get(&self, conn: &impl Connection, foreign_key_value: &Value) -> Result<Option<&R>> {
        if let Some(resolved) = self.cell.get() {
            return Ok(resolved.as_ref());
        }
        let fetched = if foreign_key_value.is_null() {
            None
        } else {
            Query::<R>::new()
                .filter(R::PRIMARY_KEY, Op::Eq, foreign_key_value.clone())
                .first(conn)?
        };
        Ok(self.cell.get_or_init(|| fetched).as_ref())
    }

    /// The already-resolved parent, if any. Never queries.
    pub fn cached(&self) -> Option<&R> {
        self.cell.get().and_then(Option::as_ref)
    }

    /// Whether the association has been resolved (including resolved-absent).
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Store an externally resolved parent (used by eager loading).
    /// Ignored if the association is already resolved.
    pub fn set_resolved(&self, value: Option<R>) {
        let _ = self.cell.set(value);
    }
}

impl<R: Model> Default for BelongsTo<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// A many-to-many association through a junction table.
///
/// The junction table holds one row per link: a column pointing at the
/// owner's primary key and a column pointing at the related row's primary
/// key.
pub struct ManyToMany<R: Model> {
    junction_table: &'static str,
    owner_fk: &'static str,
    related_fk: &'static str,
    pivot_columns: Vec<&'static str>,
    cell: OnceCell<Vec<R>>,
    rows: OnceCell<Vec<Row>>,
}

impl<R: Model> ManyToMany<R> {
    /// Declare the association through the given junction table.
    #[must_use]
    pub fn new(
        junction_table: &'static str,
        owner_fk: &'static str,
        related_fk: &'static str,
    ) -> Self {
        Self {
            junction_table,
            owner_fk,
            related_fk,
            pivot_columns: Vec::new(),
            cell: OnceCell::new(),
            rows: OnceCell::new(),
        }
    }

    /// Additionally select junction columns, aliased `pivot_{col}` on the
    /// joined rows (readable via [`pivot_rows`](Self::pivot_rows)).
    #[must_use]
    pub fn with_pivot(mut self, columns: &[&'static str]) -> Self {
        self.pivot_columns.extend_from_slice(columns);
        self
    }

    /// Resolve the related models, querying at most once.
    ///
    /// The query joins the related table through the junction table and
    /// filters on the owner's primary key.
    pub fn get(&self, conn: &impl Connection, owner_pk: &Value) -> Result<&[R]> {
        if let Some(resolved) = self.cell.get() {
            return Ok(resolved);
        }

        let raw = if owner_pk.is_null() {
            Vec::new()
        } else {
            let mut columns = vec![format!("{}.*", R::TABLE_NAME)];
            for col in &self.pivot_columns {
                columns.push(format!(
                    "{}.{} AS pivot_{}",
                    self.junction_table, col, col
                ));
            }
            let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();

            Query::<R>::new()
                .select(&column_refs)
                .join(
                    self.junction_table,
                    &format!("{}.{}", R::TABLE_NAME, R::PRIMARY_KEY),
                    &format!("{}.{}", self.junction_table, self.related_fk),
                )
                .filter(
                    &format!("{}.{}", self.junction_table, self.owner_fk),
                    Op::Eq,
                    owner_pk.clone(),
                )
                .rows(conn)?
        };

        let models = raw.iter().map(R::from_row).collect::<Result<Vec<R>>>()?;
        let _ = self.rows.set(raw);
        Ok(self.cell.get_or_init(|| models))
    }

    /// The raw joined rows, including any `pivot_` columns.
    ///
    /// Empty until the association has been resolved.
    pub fn pivot_rows(&self) -> &[Row] {
        self.rows.get().map_or(&[], Vec::as_slice)
    }

    /// The already-resolved rows, if any. Never queries.
    pub fn cached(&self) -> Option<&[R]> {
        self.cell.get().map(Vec::as_slice)
    }

    /// Whether the association has been resolved (including resolved-empty).
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The junction table name.
    pub fn junction_table(&self) -> &'static str {
        self.junction_table
    }
}

impl<R: Model> fmt::Debug for HasOne<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasOne")
            .field("foreign_key", &self.foreign_key)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<R: Model> fmt::Debug for HasMany<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasMany")
            .field("foreign_key", &self.foreign_key)
            .field("resolved", &self.is_resolved())
            .field("len", &self.cached().map_or(0, <[R]>::len))
            .finish()
    }
}

impl<R: Model> fmt::Debug for BelongsTo<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsTo")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<R: Model> fmt::Debug for ManyToMany<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManyToMany")
            .field("junction_table", &self.junction_table)
            .field("owner_fk", &self.owner_fk)
            .field("related_fk", &self.related_fk)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<R: Model + Clone> Clone for HasOne<R> {
    fn clone(&self) -> Self {
        let cloned = Self::new(self.foreign_key);
        if let Some(value) = self.cell.get() {
            let _ = cloned.cell.set(value.clone());
        }
        cloned
    }
}

impl<R: Model + Clone> Clone for HasMany<R> {
    fn clone(&self) -> Self {
        let cloned = Self::new(self.foreign_key);
        if let Some(values) = self.cell.get() {
            let _ = cloned.cell.set(values.clone());
        }
        cloned
    }
}

impl<R: Model + Clone> Clone for BelongsTo<R> {
    fn clone(&self) -> Self {
        let cloned = Self::new();
        if let Some(value) = self.cell.get() {
            let _ = cloned.cell.set(value.clone());
        }
        cloned
    }
}

impl<R: Model + Clone> Clone for ManyToMany<R> {
    fn clone(&self) -> Self {
        let mut cloned = Self::new(self.junction_table, self.owner_fk, self.related_fk);
        cloned.pivot_columns = self.pivot_columns.clone();
        if let Some(values) = self.cell.get() {
            let _ = cloned.cell.set(values.clone());
        }
        if let Some(rows) = self.rows.get() {
            let _ = cloned.rows.set(rows.clone());
        }
        cloned
    }
}

// Unresolved single associations serialize as null, unresolved collections
// as an empty array, matching what a caller would see after resolving
// against an empty table.

impl<R: Model + Serialize> Serialize for HasOne<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.cached() {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<R: Model + Serialize> Serialize for HasMany<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.cached().unwrap_or(&[]).serialize(serializer)
    }
}

impl<R: Model + Serialize> Serialize for BelongsTo<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.cached() {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<R: Model + Serialize> Serialize for ManyToMany<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.cached().unwrap_or(&[]).serialize(serializer)
    }
}
