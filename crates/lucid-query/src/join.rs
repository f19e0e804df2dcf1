//! JOIN clause support.

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
        }
    }
}

/// A JOIN clause joining on an equality between two columns.
#[derive(Debug, Clone)]
pub struct Join {
    join_type: JoinType,
    table: String,
    left_col: String,
    right_col: String,
}

impl Join {
    /// Create a join. Columns should be table-qualified
    /// (e.g. `users.id`, `orders.user_id`).
    pub fn new(
        join_type: JoinType,
        table: impl Into<String>,
        left_col: impl Into<String>,
        right_col: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            table: table.into(),
            left_col: left_col.into(),
            right_col: right_col.into(),
        }
    }

    /// Generate SQL for this join.
    pub fn to_sql(&self) -> String {
        format!(
            "{} {} ON {} = {}",
            self.join_type.as_str(),
            self.table,
            self.left_col,
            self.right_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_sql() {
        let join = Join::new(JoinType::Inner, "orders", "users.id", "orders.user_id");
        assert_eq!(
            join.to_sql(),
            "INNER JOIN orders ON users.id = orders.user_id"
        );

        let left = Join::new(JoinType::Left, "profiles", "users.id", "profiles.user_id");
        assert_eq!(
            left.to_sql(),
            "LEFT JOIN profiles ON users.id = profiles.user_id"
        );
    }
}
