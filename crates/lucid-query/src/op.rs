//! Comparison operators.

use lucid_core::{BuilderErrorKind, Error, Result};

/// A comparison operator for column predicates.
///
/// Closed set: an operator that isn't one of these is a caller error, not
/// something to pass through to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

impl Op {
    /// SQL text for this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
        }
    }

    /// Parse an operator from its SQL text.
    ///
    /// Accepts `<>` as an alias for `!=`. Unknown text is rejected
    /// immediately rather than interpolated into SQL.
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "=" => Ok(Op::Eq),
            "!=" | "<>" => Ok(Op::Ne),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Le),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Ge),
            "LIKE" | "like" => Ok(Op::Like),
            "NOT LIKE" | "not like" => Ok(Op::NotLike),
            other => Err(Error::builder(
                BuilderErrorKind::UnknownOperator,
                format!("unknown operator '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for op in [
            Op::Eq,
            Op::Ne,
            Op::Lt,
            Op::Le,
            Op::Gt,
            Op::Ge,
            Op::Like,
            Op::NotLike,
        ] {
            assert_eq!(Op::from_str(op.as_str()).unwrap(), op);
        }
    }

    #[test]
    fn test_ne_alias() {
        assert_eq!(Op::from_str("<>").unwrap(), Op::Ne);
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = Op::from_str("; DROP TABLE users").unwrap_err();
        assert!(matches!(
            err,
            Error::Builder(e) if e.kind == BuilderErrorKind::UnknownOperator
        ));
    }
}
