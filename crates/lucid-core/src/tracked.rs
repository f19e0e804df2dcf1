//! Snapshot-based change tracking for partial updates.

use crate::model::Model;
use crate::value::Value;
use std::collections::HashMap;

/// A model instance paired with a snapshot of its persisted state.
///
/// Comparing the current column values against the snapshot yields the set
/// of dirty columns, so a save can update only what actually changed.
#[derive(Debug)]
pub struct Tracked<M: Model> {
    inner: M,
    snapshot: HashMap<&'static str, Value>,
}

impl<M: Model> Tracked<M> {
    /// Wrap a model, snapshotting its current column values.
    pub fn new(inner: M) -> Self {
        let snapshot = inner.to_row().into_iter().collect();
        Self { inner, snapshot }
    }

    /// Access the wrapped model.
    pub fn get(&self) -> &M {
        &self.inner
    }

    /// Mutably access the wrapped model.
    pub fn get_mut(&mut self) -> &mut M {
        &mut self.inner
    }

    /// Unwrap, discarding the snapshot.
    pub fn into_inner(self) -> M {
        self.inner
    }

    /// Columns whose current value differs from the snapshot.
    pub fn dirty_columns(&self) -> Vec<(&'static str, Value)> {
        let dirty: Vec<_> = self
            .inner
            .to_row()
            .into_iter()
            .filter(|(name, value)| self.snapshot.get(name) != Some(value))
            .collect();
        tracing::trace!(
            table = M::TABLE_NAME,
            dirty_count = dirty.len(),
            "dirty check"
        );
        dirty
    }

    /// Whether any column has changed since the snapshot.
    pub fn is_dirty(&self) -> bool {
        !self.dirty_columns().is_empty()
    }

    /// Re-snapshot the current state, marking everything clean.
    pub fn mark_clean(&mut self) {
        self.snapshot = self.inner.to_row().into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use crate::model::FieldInfo;
    use crate::row::Row;

    struct Counter {
        id: Option<i64>,
        name: String,
        hits: i64,
    }

    impl Model for Counter {
        const TABLE_NAME: &'static str = "counters";
        const PRIMARY_KEY: &'static str = "id";

        fn fields() -> &'static [FieldInfo] {
            const FIELDS: &[FieldInfo] = &[
                FieldInfo::auto_pk("id"),
                FieldInfo::new("name"),
                FieldInfo::new("hits"),
            ];
            FIELDS
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", self.id.into()),
                ("name", self.name.clone().into()),
                ("hits", self.hits.into()),
            ]
        }

        fn from_row(row: &Row) -> Result<Self> {
            Ok(Self {
                id: row.get_named("id")?,
                name: row.get_named("name")?,
                hits: row.get_named("hits")?,
            })
        }

        fn primary_key_value(&self) -> Value {
            self.id.into()
        }
    }

    #[test]
    fn test_clean_after_wrap() {
        let tracked = Tracked::new(Counter {
            id: Some(1),
            name: "page".to_string(),
            hits: 10,
        });
        assert!(!tracked.is_dirty());
        assert!(tracked.dirty_columns().is_empty());
    }

    #[test]
    fn test_dirty_columns_are_only_the_changed_ones() {
        let mut tracked = Tracked::new(Counter {
            id: Some(1),
            name: "page".to_string(),
            hits: 10,
        });
        tracked.get_mut().hits = 11;

        let dirty = tracked.dirty_columns();
        assert_eq!(dirty, vec![("hits", Value::Int(11))]);

        tracked.mark_clean();
        assert!(!tracked.is_dirty());
    }
}
