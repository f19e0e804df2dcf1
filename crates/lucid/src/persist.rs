//! Model persistence: find, save, delete.

use lucid_core::{
    AutoIncrement, BuilderErrorKind, Connection, Error, Model, Result, Tracked, Value,
};
use lucid_query::{InsertBuilder, Op, Query};

/// Fetch a model by primary key. Absence is `Ok(None)`, not an error.
pub fn find<M: Model>(conn: &impl Connection, pk: impl Into<Value>) -> Result<Option<M>> {
    Query::<M>::new()
        .filter(M::PRIMARY_KEY, Op::Eq, pk)
        .first(conn)
}

/// Persist a model: INSERT when its primary key is unset, UPDATE by primary
/// key otherwise. On insert, the database-assigned id is written back.
pub fn save<M>(conn: &impl Connection, model: &mut M) -> Result<()>
where
    M: Model + AutoIncrement,
{
    if model.is_new() {
        let (sql, params) = InsertBuilder::new(model).build()?;
        tracing::debug!(table = M::TABLE_NAME, "insert");
        let id = conn.insert(&sql, &params)?;
        model.set_id(id);
        Ok(())
    } else {
        let sets = non_key_columns(model);
        update_by_pk(conn, model, &sets)?;
        Ok(())
    }
}

/// Persist a tracked model, writing only the columns that changed since the
/// snapshot. A clean tracked model is a no-op; after a successful write the
/// snapshot is refreshed.
pub fn save_tracked<M>(conn: &impl Connection, tracked: &mut Tracked<M>) -> Result<()>
where
    M: Model + AutoIncrement,
{
    if tracked.get().is_new() {
        save(conn, tracked.get_mut())?;
        tracked.mark_clean();
        return Ok(());
    }

    let dirty = tracked.dirty_columns();
    if dirty.is_empty() {
        return Ok(());
    }
    let sets: Vec<(&str, Value)> = dirty
        .into_iter()
        .filter(|(name, _)| *name != M::PRIMARY_KEY)
        .collect();
    if !sets.is_empty() {
        update_by_pk(conn, tracked.get(), &sets)?;
    }
    tracked.mark_clean();
    Ok(())
}

/// Delete a model's row by primary key. Returns the number of rows removed
/// (0 when the row was already gone).
pub fn delete<M: Model>(conn: &impl Connection, model: &M) -> Result<u64> {
    let pk = model.primary_key_value();
    if pk.is_null() {
        return Err(Error::builder(
            BuilderErrorKind::MissingPrimaryKey,
            format!("cannot delete from '{}': primary key is unset", M::TABLE_NAME),
        ));
    }
    tracing::debug!(table = M::TABLE_NAME, "delete");
    Query::<M>::new()
        .filter(M::PRIMARY_KEY, Op::Eq, pk)
        .delete(conn)
}

fn update_by_pk<M: Model>(
    conn: &impl Connection,
    model: &M,
    sets: &[(&str, Value)],
) -> Result<u64> {
    let pk = model.primary_key_value();
    if pk.is_null() {
        return Err(Error::builder(
            BuilderErrorKind::MissingPrimaryKey,
            format!("cannot update '{}': primary key is unset", M::TABLE_NAME),
        ));
    }
    tracing::debug!(table = M::TABLE_NAME, columns = sets.len(), "update");
    Query::<M>::new()
        .filter(M::PRIMARY_KEY, Op::Eq, pk)
        .update(conn, sets)
}

fn non_key_columns<M: Model>(model: &M) -> Vec<(&'static str, Value)> {
    model
        .to_row()
        .into_iter()
        .filter(|(name, _)| *name != M::PRIMARY_KEY)
        .collect()
}
