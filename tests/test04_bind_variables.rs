#![cfg(feature = "sqlite")]

mod common;

use common::{connected, seed_customers};
use sql_session::bind::MAX_CHAR_LENGTH;
use sql_session::prelude::*;

#[test]
fn prepared_insert_reports_one_row() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    conn.execute_dml("CREATE TABLE t (c1 TEXT)")?;

    let mut vars = BoundVariables::new();
    vars.bind("p1", "text", "hello");
    let inserted = conn.execute_prepared_dml("INSERT INTO t (c1) VALUES (:p1)", &mut vars)?;
    assert_eq!(inserted, 1);
    assert_eq!(vars.value("p1"), Some("hello"));
    assert!(log.entries().contains(&format!("BIND :p1 Chr {MAX_CHAR_LENGTH}")));

    let stored = conn.query(ResultMode::FirstRowFirstColumn, "SELECT c1 FROM t")?;
    assert_eq!(stored, QueryResult::Value(RowValues::Text("hello".into())));
    Ok(())
}

#[test]
fn clob_values_are_staged_and_released() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    conn.execute_dml("CREATE TABLE docs (id INTEGER, body TEXT)")?;
    let body = "x".repeat(40_000);

    let mut vars = BoundVariables::new();
    vars.bind("id", "text", "1").bind("body", "CLOB", body.clone());
    conn.execute_prepared_dml("INSERT INTO docs VALUES (:id, :body)", &mut vars)?;
    assert_eq!(log.count("CREATE LOB"), 1);
    assert_eq!(log.count("FREE LOB"), 1);
    assert!(log.entries().contains(&"BIND :body Clob -1".to_string()));
    assert!(vars.get("body").is_some_and(|v| v.staged_lob().is_none()));

    let length = conn.query(
        ResultMode::FirstRowFirstColumn,
        "SELECT length(body) FROM docs WHERE id = 1",
    )?;
    assert_eq!(length, QueryResult::Value(RowValues::Int(40_000)));
    Ok(())
}

#[test]
fn empty_clob_binds_as_text() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    conn.execute_dml("CREATE TABLE docs (body TEXT)")?;
    let mut vars = BoundVariables::new();
    vars.bind("body", "clob", "");
    conn.execute_prepared_dml("INSERT INTO docs VALUES (:body)", &mut vars)?;
    assert_eq!(log.count("CREATE LOB"), 0);
    assert_eq!(vars.get("body").map(|v| v.logical_type()), Some(LogicalType::Text));
    Ok(())
}

#[test]
fn unknown_placeholder_fails_and_releases_lobs() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    conn.execute_dml("CREATE TABLE docs (body TEXT)")?;

    let mut vars = BoundVariables::new();
    vars.bind("body", "clob", "text").bind("nope", "text", "x");
    let err = conn
        .execute_prepared_dml("INSERT INTO docs VALUES (:body)", &mut vars)
        .unwrap_err();
    assert!(matches!(err, SqlSessionError::ExecuteFailed(ref e) if e.code == 1036));
    assert_eq!(log.count("FREE LOB"), 1);
    assert!(conn.last_error().unwrap_or_default().starts_with("1036 - "));

    let suppressed = conn.execute_prepared_dml_with(
        "INSERT INTO docs VALUES (:body)",
        &mut vars,
        &ErrorMode::suppress("insert skipped"),
    )?;
    assert_eq!(suppressed, None);
    Ok(())
}

#[test]
fn binds_can_come_from_the_parameter_store() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;
    seed_customers(&mut conn)?;
    conn.store_mut().set("P_CITY", "Helsinki".to_string());

    let mut vars = BoundVariables::new();
    vars.bind_from_store(conn.store(), "P_CITY", "text");
    let name = conn
        .query_prepared(
            ResultMode::FirstRowFirstColumn,
            "SELECT name FROM customers WHERE city = :P_CITY",
            &mut vars,
            &QueryOptions::default(),
        )?
        .ok_or("not suppressed")?;
    assert_eq!(name, QueryResult::Value(RowValues::Text("Linus".into())));
    assert_eq!(conn.last_total_rows(), 1);
    Ok(())
}

#[test]
fn rowid_binds_match_sqlite_rowids() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[("caseQuery", "lower")])?;
    seed_customers(&mut conn)?;

    let mut vars = BoundVariables::new();
    vars.bind("rid", "rowid", "2");
    let row = conn
        .query_prepared(
            ResultMode::FirstRow,
            "SELECT name FROM customers WHERE rowid = :rid",
            &mut vars,
            &QueryOptions::default(),
        )?
        .ok_or("not suppressed")?;
    assert_eq!(
        row.as_row().and_then(|r| r.get("name")),
        Some(&RowValues::Text("Grace".into()))
    );
    Ok(())
}

#[test]
fn dml_counts_every_affected_row() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;
    seed_customers(&mut conn)?;
    let mut vars = BoundVariables::new();
    vars.bind(":min_id", "text", "2");
    let updated = conn.execute_prepared_dml(
        "UPDATE customers SET city = 'Remote' WHERE cust_id >= :min_id",
        &mut vars,
    )?;
    assert_eq!(updated, 2);
    assert_eq!(conn.execute_dml("DELETE FROM customers WHERE 1 = 0")?, 0);
    Ok(())
}
