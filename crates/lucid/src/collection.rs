//! Ordered model collections with batched eager loading.
//!
//! Every loader here issues exactly one query per invocation, no matter how
//! many members the collection has (`load_morphs` issues one per matched
//! parent type). That is the whole point: resolving a relation per member
//! would cost one query each.

use crate::relations::{BelongsTo, HasMany, HasOne};
use lucid_core::{Connection, Key, Model, Result, Row, Value};
use lucid_query::Query;
use std::collections::{HashMap, HashSet};

/// A polymorphic parent type a collection can resolve against.
#[derive(Debug, Clone, Copy)]
pub struct MorphTarget {
    /// The discriminator value stored on child rows.
    pub name: &'static str,
    /// The parent table.
    pub table: &'static str,
    /// The parent table's primary key column.
    pub primary_key: &'static str,
}

/// An ordered sequence of models from a multi-row fetch.
///
/// Beyond plain iteration, a collection carries side tables for loaded
/// relation counts and resolved polymorphic parents, both indexed by member
/// position.
#[derive(Debug)]
pub struct Collection<M> {
    items: Vec<M>,
    counts: HashMap<String, Vec<u64>>,
    morphs: HashMap<String, Vec<Option<Row>>>,
}

impl<M> Collection<M> {
    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            counts: HashMap::new(),
            morphs: HashMap::new(),
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Member at a position.
    pub fn get(&self, index: usize) -> Option<&M> {
        self.items.get(index)
    }

    /// Iterate over members.
    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.items.iter()
    }

    /// Iterate mutably over members.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, M> {
        self.items.iter_mut()
    }

    /// The members as a slice.
    pub fn as_slice(&self) -> &[M] {
        &self.items
    }

    /// Discard the side tables and return the members.
    pub fn into_vec(self) -> Vec<M> {
        self.items
    }

    /// A loaded relation count for one member, 0 when the member has no
    /// related rows or the name was never loaded.
    pub fn count_of(&self, name: &str, index: usize) -> u64 {
        self.counts
            .get(name)
            .and_then(|counts| counts.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// A resolved polymorphic parent row for one member, `None` when the
    /// member's discriminator matched no target or the attribute was never
    /// loaded.
    pub fn morph_of(&self, attr: &str, index: usize) -> Option<&Row> {
        self.morphs
            .get(attr)
            .and_then(|parents| parents.get(index))
            .and_then(Option::as_ref)
    }
}

impl<M: Model> Collection<M> {
    /// Batch-resolve a has-many relation for every member with one query.
    ///
    /// Collects the distinct member primary keys, fetches all related rows
    /// with a single `WHERE fk IN (...)`, partitions them by foreign key
    /// value, and stores each partition into its owner's descriptor. Members
    /// with no related rows get an empty, resolved descriptor.
    pub fn load_has_many<R>(
        &self,
        conn: &impl Connection,
        relation: impl Fn(&M) -> &HasMany<R>,
    ) -> Result<()>
    where
        R: Model + Clone,
    {
        if self.items.is_empty() {
            return Ok(());
        }
        let foreign_key = relation(&self.items[0]).foreign_key();
        let keys = distinct_keys(self.items.iter().map(Model::primary_key_value));

        tracing::debug!(
            table = R::TABLE_NAME,
            fk = foreign_key,
            owners = self.items.len(),
            keys = keys.len(),
            "eager load has_many"
        );

        let rows = Query::<R>::new().filter_in(foreign_key, keys).rows(conn)?;
        let mut by_key: HashMap<Key, Vec<R>> = HashMap::new();
        for row in &rows {
            let Some(key) = row.get_by_name(foreign_key).and_then(Value::as_key) else {
                continue;
            };
            by_key.entry(key).or_default().push(R::from_row(row)?);
        }

        for member in &self.items {
            let related = member
                .primary_key_value()
                .as_key()
                .and_then(|key| by_key.get(&key).cloned())
                .unwrap_or_default();
            relation(member).set_resolved(related);
        }
        Ok(())
    }

    /// Batch-resolve a has-one relation for every member with one query.
    ///
    /// Same batching as [`load_has_many`](Self::load_has_many); when the
    /// database holds several related rows for one owner, the first returned
    /// row wins.
    pub fn load_has_one<R>(
        &self,
        conn: &impl Connection,
        relation: impl Fn(&M) -> &HasOne<R>,
    ) -> Result<()>
    where
        R: Model + Clone,
    {
        if self.items.is_empty() {
            return Ok(());
        }
        let foreign_key = relation(&self.items[0]).foreign_key();
        let keys = distinct_keys(self.items.iter().map(Model::primary_key_value));

        tracing::debug!(
            table = R::TABLE_NAME,
            fk = foreign_key,
            owners = self.items.len(),
            "eager load has_one"
        );

        let rows = Query::<R>::new().filter_in(foreign_key, keys).rows(conn)?;
        let mut by_key: HashMap<Key, R> = HashMap::new();
        for row in &rows {
            let Some(key) = row.get_by_name(foreign_key).and_then(Value::as_key) else {
                continue;
            };
            by_key.entry(key).or_insert(R::from_row(row)?);
        }

        for member in &self.items {
            let related = member
                .primary_key_value()
                .as_key()
                .and_then(|key| by_key.get(&key).cloned());
            relation(member).set_resolved(related);
        }
        Ok(())
    }

    /// Batch-resolve a belongs-to relation for every member with one query.
    ///
    /// Collects the distinct non-NULL foreign key values across members and
    /// fetches all parents with a single `WHERE pk IN (...)`. Members with a
    /// NULL foreign key resolve to `None`.
    pub fn load_belongs_to<R>(
        &self,
        conn: &impl Connection,
        foreign_key_value: impl Fn(&M) -> Value,
        relation: impl Fn(&M) -> &BelongsTo<R>,
    ) -> Result<()>
    where
        R: Model + Clone,
    {
        if self.items.is_empty() {
            return Ok(());
        }
        let keys = distinct_keys(self.items.iter().map(&foreign_key_value));

        tracing::debug!(
            table = R::TABLE_NAME,
            owners = self.items.len(),
            keys = keys.len(),
            "eager load belongs_to"
        );

        let parents = Query::<R>::new()
            .filter_in(R::PRIMARY_KEY, keys)
            .all(conn)?;
        let mut by_key: HashMap<Key, R> = HashMap::new();
        for parent in parents {
            if let Some(key) = parent.primary_key_value().as_key() {
                by_key.insert(key, parent);
            }
        }

        for member in &self.items {
            let parent = foreign_key_value(member)
                .as_key()
                .and_then(|key| by_key.get(&key).cloned());
            relation(member).set_resolved(parent);
        }
        Ok(())
    }

    /// Batch-count related rows per member with one `GROUP BY` query.
    ///
    /// Stores the counts in a side table under `name`, readable via
    /// [`count_of`](Self::count_of). Members with no related rows read 0.
    pub fn load_count<R: Model, C: Connection>(
        &mut self,
        conn: &C,
        name: &str,
        foreign_key: &str,
    ) -> Result<()> {
        if self.items.is_empty() {
            self.counts.insert(name.to_string(), Vec::new());
            return Ok(());
        }
        let keys = distinct_keys(self.items.iter().map(Model::primary_key_value));

        tracing::debug!(
            table = R::TABLE_NAME,
            fk = foreign_key,
            name = name,
            "eager load count"
        );

        let rows = Query::<R>::new()
            .select(&[foreign_key, "COUNT(*) AS num"])
            .filter_in(foreign_key, keys)
            .group_by(&[foreign_key])
            .rows(conn)?;

        let mut by_key: HashMap<Key, u64> = HashMap::new();
        for row in &rows {
            if let Some(key) = row.get_by_name(foreign_key).and_then(Value::as_key) {
                by_key.insert(key, row.get_named("num")?);
            }
        }

        let counts = self
            .items
            .iter()
            .map(|member| {
                member
                    .primary_key_value()
                    .as_key()
                    .and_then(|key| by_key.get(&key).copied())
                    .unwrap_or(0)
            })
            .collect();
        self.counts.insert(name.to_string(), counts);
        Ok(())
    }

    /// Batch-resolve polymorphic parents for every member.
    ///
    /// Each member supplies a discriminator and a parent id through the
    /// accessor. Members are grouped by discriminator and one `WHERE pk IN
    /// (...)` query is issued per *matched* target type. A member whose
    /// discriminator matches no target stays unresolved (`None`); that is
    /// not an error.
    pub fn load_morphs(
        &mut self,
        conn: &impl Connection,
        attr: &str,
        targets: &[MorphTarget],
        discriminator: impl Fn(&M) -> (Option<String>, Value),
    ) -> Result<()> {
        let mut resolved: Vec<Option<Row>> = vec![None; self.items.len()];

        // member indices grouped by discriminator value
        let mut by_type: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, member) in self.items.iter().enumerate() {
            if let (Some(type_name), _) = discriminator(member) {
                by_type.entry(type_name).or_default().push(index);
            }
        }

        for target in targets {
            let Some(indices) = by_type.get(target.name) else {
                continue;
            };
            let keys = distinct_keys(
                indices
                    .iter()
                    .map(|&index| discriminator(&self.items[index]).1),
            );
            if keys.is_empty() {
                continue;
            }

            let placeholders = vec!["?"; keys.len()].join(", ");
            let sql = format!(
                "SELECT * FROM {} WHERE {} IN ({})",
                target.table, target.primary_key, placeholders
            );
            tracing::debug!(
                table = target.table,
                attr = attr,
                members = indices.len(),
                "eager load morphs"
            );
            let rows = conn.query(&sql, &keys)?;

            let mut by_key: HashMap<Key, Row> = HashMap::new();
            for row in rows {
                if let Some(key) = row.get_by_name(target.primary_key).and_then(Value::as_key) {
                    by_key.insert(key, row);
                }
            }

            for &index in indices {
                let (_, id) = discriminator(&self.items[index]);
                resolved[index] = id.as_key().and_then(|key| by_key.get(&key).cloned());
            }
        }

        self.morphs.insert(attr.to_string(), resolved);
        Ok(())
    }
}

/// Distinct hashable key values, in first-seen order. NULL and float values
/// are dropped: they never participate in key matching.
fn distinct_keys(values: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut seen: HashSet<Key> = HashSet::new();
    let mut distinct = Vec::new();
    for value in values {
        if let Some(key) = value.as_key() {
            if seen.insert(key) {
                distinct.push(value);
            }
        }
    }
    distinct
}

impl<M> Default for Collection<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> From<Vec<M>> for Collection<M> {
    fn from(items: Vec<M>) -> Self {
        Self {
            items,
            counts: HashMap::new(),
            morphs: HashMap::new(),
        }
    }
}

impl<M> FromIterator<M> for Collection<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<M>>())
    }
}

impl<M> IntoIterator for Collection<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, M> IntoIterator for &'a Collection<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<M> std::ops::Index<usize> for Collection<M> {
    type Output = M;

    fn index(&self, index: usize) -> &M {
        &self.items[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keys_preserves_order_and_drops_unkeyable() {
        let keys = distinct_keys(
            vec![
                Value::Int(2),
                Value::Int(1),
                Value::Int(2),
                Value::Null,
                Value::Float(1.5),
                Value::Text("a".to_string()),
            ]
            .into_iter(),
        );
        assert_eq!(
            keys,
            vec![Value::Int(2), Value::Int(1), Value::Text("a".to_string())]
        );
    }

    #[test]
    fn test_side_table_defaults() {
        let collection: Collection<()> = Collection::from(vec![(), ()]);
        assert_eq!(collection.count_of("orders", 0), 0);
        assert!(collection.morph_of("parent", 1).is_none());
    }

    #[test]
    fn test_collection_iteration() {
        let collection = Collection::from(vec![1, 2, 3]);
        assert_eq!(collection.len(), 3);
        assert_eq!(collection[1], 2);
        let doubled: Vec<i32> = collection.iter().map(|n| n * 2).collect();
        assert_eq!(doubled, vec![2, 4, 6]);
        assert_eq!(collection.into_vec(), vec![1, 2, 3]);
    }
}
