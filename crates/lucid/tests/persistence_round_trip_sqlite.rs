//! Save / find / delete semantics against a real SQLite database.

use lucid::prelude::*;
use lucid::QueryCounter;
use lucid_core::{BuilderError, BuilderErrorKind};
use lucid_sqlite::SqliteConnection;

#[derive(Debug, Clone, PartialEq)]
struct Customer {
    id: Option<i64>,
    name: String,
    email: Option<String>,
}

impl Model for Customer {
    const TABLE_NAME: &'static str = "customers";
    const PRIMARY_KEY: &'static str = "id";

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::auto_pk("id"),
            FieldInfo::new("name"),
            FieldInfo::new("email"),
        ];
        FIELDS
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("email", self.email.clone().into()),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_named("id")?,
            name: row.get_named("name")?,
            email: row.get_named("email")?,
        })
    }

    fn primary_key_value(&self) -> Value {
        self.id.into()
    }
}

impl AutoIncrement for Customer {
    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

fn setup() -> SqliteConnection {
    let conn = SqliteConnection::open_in_memory().expect("open sqlite memory db");
    conn.execute_batch(
        "CREATE TABLE customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT
        )",
    )
    .expect("create schema");
    conn
}

#[test]
fn save_then_find_round_trips_attributes() {
    let conn = setup();
    let mut customer = Customer {
        id: None,
        name: "Alice".to_string(),
        email: Some("alice@example.com".to_string()),
    };

    lucid::save(&conn, &mut customer).unwrap();
    let id = customer.id.expect("insert writes back the generated id");

    let found: Customer = lucid::find(&conn, id).unwrap().expect("row exists");
    assert_eq!(found, customer);
}

#[test]
fn save_on_existing_row_updates_it() {
    let conn = setup();
    let mut customer = Customer {
        id: None,
        name: "Bob".to_string(),
        email: None,
    };
    lucid::save(&conn, &mut customer).unwrap();
    let id = customer.id.unwrap();

    customer.email = Some("bob@example.com".to_string());
    lucid::save(&conn, &mut customer).unwrap();

    // the id did not change and the new value is persisted
    assert_eq!(customer.id, Some(id));
    let found: Customer = lucid::find(&conn, id).unwrap().unwrap();
    assert_eq!(found.email.as_deref(), Some("bob@example.com"));
}

#[test]
fn find_missing_row_is_none_not_error() {
    let conn = setup();
    let found: Option<Customer> = lucid::find(&conn, 999).unwrap();
    assert!(found.is_none());
}

#[test]
fn delete_removes_the_row() {
    let conn = setup();
    let mut customer = Customer {
        id: None,
        name: "Carol".to_string(),
        email: None,
    };
    lucid::save(&conn, &mut customer).unwrap();
    let id = customer.id.unwrap();

    assert_eq!(lucid::delete(&conn, &customer).unwrap(), 1);
    let gone: Option<Customer> = lucid::find(&conn, id).unwrap();
    assert!(gone.is_none());
    // deleting an already-gone row affects nothing
    assert_eq!(lucid::delete(&conn, &customer).unwrap(), 0);
}

#[test]
fn delete_without_primary_key_is_a_contract_error() {
    let conn = setup();
    let unsaved = Customer {
        id: None,
        name: "ghost".to_string(),
        email: None,
    };
    let err = lucid::delete(&conn, &unsaved).unwrap_err();
    assert!(matches!(
        err,
        Error::Builder(BuilderError {
            kind: BuilderErrorKind::MissingPrimaryKey,
            ..
        })
    ));
}

#[test]
fn tracked_save_writes_only_dirty_columns() {
    let conn = setup();
    let mut customer = Customer {
        id: None,
        name: "Dave".to_string(),
        email: Some("dave@example.com".to_string()),
    };
    lucid::save(&conn, &mut customer).unwrap();
    let id = customer.id.unwrap();

    let counted = QueryCounter::new(conn);
    let mut tracked = Tracked::new(customer);

    // clean: saving issues no statement at all
    lucid::save_tracked(&counted, &mut tracked).unwrap();
    assert_eq!(counted.count(), 0);

    tracked.get_mut().name = "David".to_string();
    lucid::save_tracked(&counted, &mut tracked).unwrap();
    assert_eq!(counted.count(), 1);
    assert!(!tracked.is_dirty());

    let found: Customer = lucid::find(&counted, id).unwrap().unwrap();
    assert_eq!(found.name, "David");
    assert_eq!(found.email.as_deref(), Some("dave@example.com"));
}

#[test]
fn unfiltered_mass_writes_are_refused_by_default() {
    let conn = setup();
    let mut customer = Customer {
        id: None,
        name: "Eve".to_string(),
        email: None,
    };
    lucid::save(&conn, &mut customer).unwrap();

    let err = Query::<Customer>::new().delete(&conn).unwrap_err();
    assert!(matches!(
        err,
        Error::Builder(BuilderError {
            kind: BuilderErrorKind::UnfilteredWrite,
            ..
        })
    ));

    let err = Query::<Customer>::new()
        .update(&conn, &[("name", Value::Text("x".to_string()))])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Builder(BuilderError {
            kind: BuilderErrorKind::UnfilteredWrite,
            ..
        })
    ));

    // nothing was touched
    let found: Customer = lucid::find(&conn, customer.id.unwrap()).unwrap().unwrap();
    assert_eq!(found.name, "Eve");
}

#[test]
fn unfiltered_mass_writes_run_with_explicit_opt_in() {
    let conn = setup();
    for name in ["a", "b", "c"] {
        let mut customer = Customer {
            id: None,
            name: name.to_string(),
            email: None,
        };
        lucid::save(&conn, &mut customer).unwrap();
    }

    let updated = Query::<Customer>::new()
        .allow_unfiltered()
        .update(&conn, &[("email", Value::Text("all@example.com".to_string()))])
        .unwrap();
    assert_eq!(updated, 3);

    let deleted = Query::<Customer>::new()
        .allow_unfiltered()
        .delete(&conn)
        .unwrap();
    assert_eq!(deleted, 3);
    assert_eq!(Query::<Customer>::new().count(&conn).unwrap(), 0);
}

#[test]
fn empty_in_list_executes_cleanly_and_matches_nothing() {
    let conn = setup();
    for name in ["a", "b"] {
        let mut customer = Customer {
            id: None,
            name: name.to_string(),
            email: None,
        };
        lucid::save(&conn, &mut customer).unwrap();
    }

    // IN () would be a SQLite syntax error; the builder must render a
    // predicate that runs and matches no rows
    let none = Query::<Customer>::new()
        .filter_in("id", vec![])
        .all(&conn)
        .unwrap();
    assert!(none.is_empty());

    // the negated form matches every row
    let all = Query::<Customer>::new()
        .filter_not_in("id", vec![])
        .all(&conn)
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn constraint_violation_surfaces_as_storage_error() {
    let conn = setup();
    let err = conn
        .insert("INSERT INTO customers (name) VALUES (?)", &[Value::Null])
        .unwrap_err();
    assert!(err.is_constraint_violation());
}
