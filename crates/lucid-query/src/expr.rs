//! Predicate expressions and WHERE clause rendering.

use crate::op::Op;
use lucid_core::Value;

/// A single predicate expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `column <op> ?`
    Cmp {
        column: String,
        op: Op,
        value: Value,
    },
    /// `column [NOT] IN (?, ...)`
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: String, negated: bool },
}

impl Expr {
    /// Render this expression, pushing bind values in placeholder order.
    pub fn build(&self, params: &mut Vec<Value>) -> String {
        match self {
            Expr::Cmp { column, op, value } => {
                params.push(value.clone());
                format!("{} {} ?", column, op.as_str())
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    // IN () is a syntax error in most dialects; an empty list
                    // means "matches nothing" (or everything, when negated).
                    return if *negated {
                        "1 = 1".to_string()
                    } else {
                        "1 = 0".to_string()
                    };
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                params.extend(values.iter().cloned());
                let kw = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", column, kw, placeholders)
            }
            Expr::Null { column, negated } => {
                if *negated {
                    format!("{} IS NOT NULL", column)
                } else {
                    format!("{} IS NULL", column)
                }
            }
        }
    }
}

/// How a predicate chains onto the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

/// One predicate plus its connector.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub connector: Connector,
    pub expr: Expr,
}

/// An ordered list of predicates forming a WHERE clause.
///
/// The first predicate's connector is ignored when rendering; the rest
/// join with ` AND ` / ` OR ` in insertion order.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    predicates: Vec<Predicate>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Append a predicate.
    pub fn push(&mut self, connector: Connector, expr: Expr) {
        self.predicates.push(Predicate { connector, expr });
    }

    /// Whether any predicate has been added.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render the clause body (without the `WHERE` keyword), pushing bind
    /// values in placeholder order.
    pub fn build(&self, params: &mut Vec<Value>) -> String {
        let mut sql = String::new();
        for (i, pred) in self.predicates.iter().enumerate() {
            if i > 0 {
                sql.push_str(match pred.connector {
                    Connector::And => " AND ",
                    Connector::Or => " OR ",
                });
            }
            sql.push_str(&pred.expr.build(params));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_renders_placeholder() {
        let mut params = Vec::new();
        let sql = Expr::Cmp {
            column: "age".to_string(),
            op: Op::Ge,
            value: Value::Int(18),
        }
        .build(&mut params);

        assert_eq!(sql, "age >= ?");
        assert_eq!(params, vec![Value::Int(18)]);
    }

    #[test]
    fn test_in_list_placeholders_match_values() {
        let mut params = Vec::new();
        let sql = Expr::InList {
            column: "id".to_string(),
            values: vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            negated: false,
        }
        .build(&mut params);

        assert_eq!(sql, "id IN (?, ?, ?)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let mut params = Vec::new();
        let sql = Expr::InList {
            column: "id".to_string(),
            values: vec![],
            negated: false,
        }
        .build(&mut params);

        assert_eq!(sql, "1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_empty_not_in_list_matches_everything() {
        let mut params = Vec::new();
        let sql = Expr::InList {
            column: "id".to_string(),
            values: vec![],
            negated: true,
        }
        .build(&mut params);

        assert_eq!(sql, "1 = 1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_null_checks_bind_nothing() {
        let mut params = Vec::new();
        let is_null = Expr::Null {
            column: "deleted_at".to_string(),
            negated: false,
        }
        .build(&mut params);
        let not_null = Expr::Null {
            column: "deleted_at".to_string(),
            negated: true,
        }
        .build(&mut params);

        assert_eq!(is_null, "deleted_at IS NULL");
        assert_eq!(not_null, "deleted_at IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_where_clause_connectors_in_order() {
        let mut clause = WhereClause::new();
        clause.push(
            Connector::And,
            Expr::Cmp {
                column: "status".to_string(),
                op: Op::Eq,
                value: Value::Text("active".to_string()),
            },
        );
        clause.push(
            Connector::And,
            Expr::Cmp {
                column: "age".to_string(),
                op: Op::Gt,
                value: Value::Int(21),
            },
        );
        clause.push(
            Connector::Or,
            Expr::Cmp {
                column: "vip".to_string(),
                op: Op::Eq,
                value: Value::Bool(true),
            },
        );

        let mut params = Vec::new();
        let sql = clause.build(&mut params);
        assert_eq!(sql, "status = ? AND age > ? OR vip = ?");
        assert_eq!(
            params,
            vec![
                Value::Text("active".to_string()),
                Value::Int(21),
                Value::Bool(true),
            ]
        );
    }
}
