//! SQL clause types (ORDER BY, GROUP BY).

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// ORDER BY clause entry.
#[derive(Debug, Clone)]
pub struct OrderBy {
    column: String,
    direction: Direction,
}

impl OrderBy {
    /// Create an order by clause.
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Create an ascending order by clause.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    /// Create a descending order by clause.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }

    /// Generate SQL for this ORDER BY entry.
    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction.as_str())
    }
}

/// GROUP BY clause.
#[derive(Debug, Clone)]
pub struct GroupBy {
    columns: Vec<String>,
}

impl GroupBy {
    /// Create a new GROUP BY clause.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|&s| s.to_string()).collect(),
        }
    }

    /// Generate SQL for this GROUP BY clause.
    pub fn to_sql(&self) -> String {
        self.columns.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_sql() {
        assert_eq!(OrderBy::asc("name").to_sql(), "name ASC");
        assert_eq!(OrderBy::desc("created_at").to_sql(), "created_at DESC");
    }

    #[test]
    fn test_group_by_sql() {
        assert_eq!(GroupBy::new(&["a", "b"]).to_sql(), "a, b");
    }
}
