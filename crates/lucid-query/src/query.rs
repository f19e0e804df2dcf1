//! The fluent query builder.

use crate::clause::{Direction, GroupBy, OrderBy};
use crate::expr::{Connector, Expr, WhereClause};
use crate::join::{Join, JoinType};
use crate::op::Op;
use lucid_core::{BuilderErrorKind, Connection, Error, Model, Result, Row, Value};
use std::marker::PhantomData;

/// Supplies the current page number for pagination.
///
/// Keeps request handling out of the query layer: whatever owns the page
/// number (an HTTP request, a CLI flag) implements this and gets injected.
pub trait PageSource {
    /// The requested page, if one was supplied.
    fn current_page(&self) -> Option<u64>;
}

/// A fluent SELECT / UPDATE / DELETE builder for a model's table.
///
/// Builds exactly one parameterized statement; bind values are collected in
/// the order their placeholders appear in the SQL. Terminal methods consume
/// the builder.
#[derive(Debug)]
pub struct Query<M: Model> {
    columns: Vec<String>,
    distinct: bool,
    where_clause: WhereClause,
    joins: Vec<Join>,
    order_by: Vec<OrderBy>,
    group_by: Option<GroupBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    allow_unfiltered: bool,
    _marker: PhantomData<M>,
}

impl<M: Model> Default for Query<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Query<M> {
    /// Start a query against the model's table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            distinct: false,
            where_clause: WhereClause::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            group_by: None,
            limit: None,
            offset: None,
            allow_unfiltered: false,
            _marker: PhantomData,
        }
    }

    /// Select specific columns. Additive across calls; when never called,
    /// `*` is selected.
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns.extend(columns.iter().map(|&c| c.to_string()));
        self
    }

    /// SELECT DISTINCT.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Add an AND predicate: `column <op> ?`.
    #[must_use]
    pub fn filter(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.where_clause.push(
            Connector::And,
            Expr::Cmp {
                column: column.to_string(),
                op,
                value: value.into(),
            },
        );
        self
    }

    /// Alias for [`filter`](Self::filter).
    #[must_use]
    pub fn and_filter(self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.filter(column, op, value)
    }

    /// Add an OR predicate: `column <op> ?`.
    #[must_use]
    pub fn or_filter(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.where_clause.push(
            Connector::Or,
            Expr::Cmp {
                column: column.to_string(),
                op,
                value: value.into(),
            },
        );
        self
    }

    /// Add an AND `column IN (...)` predicate.
    ///
    /// An empty list matches nothing (rendered as `1 = 0`).
    #[must_use]
    pub fn filter_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.where_clause.push(
            Connector::And,
            Expr::InList {
                column: column.to_string(),
                values,
                negated: false,
            },
        );
        self
    }

    /// Add an AND `column NOT IN (...)` predicate.
    ///
    /// An empty list matches everything (rendered as `1 = 1`).
    #[must_use]
    pub fn filter_not_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.where_clause.push(
            Connector::And,
            Expr::InList {
                column: column.to_string(),
                values,
                negated: true,
            },
        );
        self
    }

    /// Add an OR `column IN (...)` predicate.
    #[must_use]
    pub fn or_filter_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.where_clause.push(
            Connector::Or,
            Expr::InList {
                column: column.to_string(),
                values,
                negated: false,
            },
        );
        self
    }

    /// Add an OR `column NOT IN (...)` predicate.
    #[must_use]
    pub fn or_filter_not_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.where_clause.push(
            Connector::Or,
            Expr::InList {
                column: column.to_string(),
                values,
                negated: true,
            },
        );
        self
    }

    /// Add an AND `column IS NULL` predicate.
    #[must_use]
    pub fn filter_null(mut self, column: &str) -> Self {
        self.where_clause.push(
            Connector::And,
            Expr::Null {
                column: column.to_string(),
                negated: false,
            },
        );
        self
    }

    /// Add an AND `column IS NOT NULL` predicate.
    #[must_use]
    pub fn filter_not_null(mut self, column: &str) -> Self {
        self.where_clause.push(
            Connector::And,
            Expr::Null {
                column: column.to_string(),
                negated: true,
            },
        );
        self
    }

    /// Add an OR `column IS NULL` predicate.
    #[must_use]
    pub fn or_filter_null(mut self, column: &str) -> Self {
        self.where_clause.push(
            Connector::Or,
            Expr::Null {
                column: column.to_string(),
                negated: false,
            },
        );
        self
    }

    /// Add an OR `column IS NOT NULL` predicate.
    #[must_use]
    pub fn or_filter_not_null(mut self, column: &str) -> Self {
        self.where_clause.push(
            Connector::Or,
            Expr::Null {
                column: column.to_string(),
                negated: true,
            },
        );
        self
    }

    /// INNER JOIN another table on column equality.
    #[must_use]
    pub fn join(mut self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.joins
            .push(Join::new(JoinType::Inner, table, left_col, right_col));
        self
    }

    /// LEFT JOIN another table on column equality.
    #[must_use]
    pub fn left_join(mut self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.joins
            .push(Join::new(JoinType::Left, table, left_col, right_col));
        self
    }

    /// RIGHT JOIN another table on column equality.
    #[must_use]
    pub fn right_join(mut self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.joins
            .push(Join::new(JoinType::Right, table, left_col, right_col));
        self
    }

    /// Add an ORDER BY entry. Additive; entries render in call order.
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order_by.push(OrderBy::new(column, direction));
        self
    }

    /// Set the GROUP BY columns. Replaces any previous call.
    #[must_use]
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by = Some(GroupBy::new(columns));
        self
    }

    /// Set the LIMIT. Last call wins.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set the OFFSET. Last call wins.
    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Limit/offset for the given page (1-based; values below 1 clamp to 1).
    #[must_use]
    pub fn paginate(self, per_page: u64, page: u64) -> Self {
        let page = page.max(1);
        self.limit(per_page).offset((page - 1) * per_page)
    }

    /// Paginate using a page number from an injected source, defaulting to
    /// the first page.
    #[must_use]
    pub fn paginate_from(self, per_page: u64, source: &impl PageSource) -> Self {
        self.paginate(per_page, source.current_page().unwrap_or(1))
    }

    /// Permit an UPDATE or DELETE without any WHERE predicate.
    ///
    /// Without this, unfiltered writes are rejected as a contract error.
    #[must_use]
    pub fn allow_unfiltered(mut self) -> Self {
        self.allow_unfiltered = true;
        self
    }

    /// Render the SELECT statement and its bind parameters.
    pub fn build_select(&self) -> (String, Vec<Value>) {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&columns);
        sql.push_str(" FROM ");
        sql.push_str(M::TABLE_NAME);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        let mut params = Vec::new();
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause.build(&mut params));
        }

        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.to_sql());
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let entries: Vec<String> = self.order_by.iter().map(OrderBy::to_sql).collect();
            sql.push_str(&entries.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, params)
    }

    /// Execute and return raw rows (useful for projections and joins).
    pub fn rows(self, conn: &impl Connection) -> Result<Vec<Row>> {
        let (sql, params) = self.build_select();
        tracing::debug!(sql = %sql, bind_count = params.len(), "select");
        conn.query(&sql, &params)
    }

    /// Execute and hydrate all matching models.
    pub fn all(self, conn: &impl Connection) -> Result<Vec<M>> {
        self.rows(conn)?.iter().map(M::from_row).collect()
    }

    /// Execute with `LIMIT 1` and hydrate the first match, if any.
    ///
    /// No match is `Ok(None)`, not an error.
    pub fn first(self, conn: &impl Connection) -> Result<Option<M>> {
        let (sql, params) = self.limit(1).build_select();
        tracing::debug!(sql = %sql, bind_count = params.len(), "select first");
        match conn.query_one(&sql, &params)? {
            Some(row) => Ok(Some(M::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Execute `SELECT COUNT(*)` with the current predicates and joins.
    pub fn count(self, conn: &impl Connection) -> Result<u64> {
        let mut sql = format!("SELECT COUNT(*) AS num FROM {}", M::TABLE_NAME);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        let mut params = Vec::new();
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause.build(&mut params));
        }

        tracing::debug!(sql = %sql, bind_count = params.len(), "count");
        match conn.query_one(&sql, &params)? {
            Some(row) => row.get_named::<u64>("num"),
            None => Ok(0),
        }
    }

    /// Execute an UPDATE with the current predicates.
    ///
    /// SET parameters bind before WHERE parameters, matching placeholder
    /// order. Refuses to run without predicates unless
    /// [`allow_unfiltered`](Self::allow_unfiltered) was called.
    pub fn update(self, conn: &impl Connection, sets: &[(&str, Value)]) -> Result<u64> {
        self.check_filtered("update")?;
        if sets.is_empty() {
            return Err(Error::builder(
                BuilderErrorKind::EmptyWrite,
                format!("update of '{}' with no SET columns", M::TABLE_NAME),
            ));
        }

        let mut params = Vec::new();
        let assignments: Vec<String> = sets
            .iter()
            .map(|(col, value)| {
                params.push(value.clone());
                format!("{} = ?", col)
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            M::TABLE_NAME,
            assignments.join(", ")
        );
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause.build(&mut params));
        }

        tracing::debug!(sql = %sql, bind_count = params.len(), "update");
        conn.execute(&sql, &params)
    }

    /// Execute a DELETE with the current predicates.
    ///
    /// Refuses to run without predicates unless
    /// [`allow_unfiltered`](Self::allow_unfiltered) was called.
    pub fn delete(self, conn: &impl Connection) -> Result<u64> {
        self.check_filtered("delete")?;

        let mut sql = format!("DELETE FROM {}", M::TABLE_NAME);
        let mut params = Vec::new();
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause.build(&mut params));
        }

        tracing::debug!(sql = %sql, bind_count = params.len(), "delete");
        conn.execute(&sql, &params)
    }

    fn check_filtered(&self, verb: &str) -> Result<()> {
        if self.where_clause.is_empty() && !self.allow_unfiltered {
            return Err(Error::builder(
                BuilderErrorKind::UnfilteredWrite,
                format!(
                    "refusing to {} '{}' without a WHERE clause; call allow_unfiltered() to opt in",
                    verb,
                    M::TABLE_NAME
                ),
            ));
        }
        Ok(())
    }
}
