#![cfg(feature = "sqlite")]

mod common;

use common::{config, connected, seed_customers};
use sql_session::prelude::*;
use tempfile::TempDir;

const COUNT: &str = "SELECT count(*) FROM customers";

fn count(conn: &mut Connection) -> Result<Option<i64>, SqlSessionError> {
    let result = conn.query(ResultMode::FirstRowFirstColumn, COUNT)?;
    Ok(result.as_value().and_then(RowValues::as_int).copied())
}

#[test]
fn savepoint_is_issued_once() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    seed_customers(&mut conn)?;

    conn.start_transaction(Some("before_cleanup"))?;
    conn.start_transaction(Some("before_cleanup"))?;
    conn.start_transaction(None)?;
    assert!(conn.in_transaction());
    assert_eq!(log.count("SAVEPOINT before_cleanup"), 1);
    Ok(())
}

#[test]
fn rollback_to_savepoint_keeps_earlier_work() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    seed_customers(&mut conn)?;

    conn.start_transaction(None)?;
    conn.execute_dml("INSERT INTO customers VALUES (10, 'Barbara', 'Boston')")?;
    conn.execute_dml("SAVEPOINT sp1")?;
    conn.execute_dml("DELETE FROM customers")?;
    assert_eq!(count(&mut conn)?, Some(0));

    conn.rollback(Some("sp1"))?;
    assert_eq!(count(&mut conn)?, Some(4));
    assert!(log.entries().contains(&"ROLLBACK TO SAVEPOINT sp1".to_string()));

    conn.rollback(None)?;
    assert_eq!(count(&mut conn)?, Some(3));
    assert!(conn.in_transaction(), "rollback keeps explicit mode");
    Ok(())
}

#[test]
fn commit_keeps_explicit_mode() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    seed_customers(&mut conn)?;

    conn.start_transaction(None)?;
    conn.execute_dml("DELETE FROM customers WHERE cust_id = 1")?;
    conn.commit()?;
    assert!(conn.in_transaction());
    assert_eq!(log.count("COMMIT"), 1);

    conn.execute_dml("DELETE FROM customers WHERE cust_id = 2")?;
    conn.rollback(None)?;
    assert_eq!(count(&mut conn)?, Some(2));
    Ok(())
}

#[test]
fn commit_and_rollback_are_no_ops_in_auto_commit() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    seed_customers(&mut conn)?;
    conn.commit()?;
    conn.rollback(None)?;
    conn.rollback(Some("never_made"))?;
    assert_eq!(log.count("COMMIT"), 0);
    assert_eq!(log.count("ROLLBACK"), 0);
    assert_eq!(count(&mut conn)?, Some(3));
    Ok(())
}

#[test]
fn savepoint_names_are_validated() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, log) = connected(&[])?;
    let err = conn.start_transaction(Some("x; DROP TABLE customers")).unwrap_err();
    assert!(matches!(err, SqlSessionError::InvalidIdentifier(_)));
    assert!(!conn.in_transaction());
    assert!(!log.entries().iter().any(|e| e.contains("DROP")));
    Ok(())
}

#[test]
fn unknown_savepoint_fails_the_rollback() -> Result<(), Box<dyn std::error::Error>> {
    let (mut conn, _) = connected(&[])?;
    seed_customers(&mut conn)?;
    conn.start_transaction(None)?;
    conn.execute_dml("DELETE FROM customers")?;
    let err = conn.rollback(Some("nope")).unwrap_err();
    assert!(matches!(err, SqlSessionError::ExecuteFailed(_)));
    assert!(conn.last_error().unwrap_or_default().contains("no such savepoint"));
    Ok(())
}

fn file_config(dir: &TempDir, auto_commit: &str) -> Connection {
    let path = dir.path().join("tx.db").to_string_lossy().into_owned();
    Connection::builder(SqliteConnector::new())
        .config(config(
            "main",
            &[("connection", path.as_str()), ("autoCommit", auto_commit)],
        ))
        .build()
}

#[test]
fn disconnect_rolls_back_uncommitted_work() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut setup = file_config(&dir, "true");
    setup.connect("main", false)?;
    seed_customers(&mut setup)?;
    setup.disconnect()?;

    let mut worker = file_config(&dir, "true");
    worker.connect("main", false)?;
    worker.start_transaction(None)?;
    worker.execute_dml("DELETE FROM customers WHERE cust_id = 3")?;
    worker.disconnect()?;

    let mut check = file_config(&dir, "true");
    check.connect("main", false)?;
    assert_eq!(count(&mut check)?, Some(3));
    Ok(())
}

#[test]
fn auto_commit_false_starts_in_a_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut setup = file_config(&dir, "");
    setup.connect("main", false)?;
    seed_customers(&mut setup)?;
    setup.disconnect()?;

    let mut worker = file_config(&dir, "false");
    worker.connect("main", false)?;
    assert!(worker.in_transaction());
    assert!(!worker.auto_commit_enabled());
    worker.execute_dml("DELETE FROM customers WHERE cust_id = 1")?;
    worker.commit()?;
    worker.execute_dml("DELETE FROM customers WHERE cust_id = 2")?;
    drop(worker);

    let mut check = file_config(&dir, "true");
    check.connect("main", false)?;
    assert_eq!(count(&mut check)?, Some(2), "committed delete only");
    Ok(())
}

#[test]
fn rollback_restores_the_old_value() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut setup = file_config(&dir, "true");
    setup.connect("main", false)?;
    setup.execute_dml("CREATE TABLE t (x INTEGER)")?;
    setup.execute_dml("INSERT INTO t (x) VALUES (0)")?;
    setup.disconnect()?;

    let mut conn = file_config(&dir, "false");
    conn.connect("main", false)?;
    conn.start_transaction(None)?;
    assert_eq!(conn.execute_dml("UPDATE t SET x=1")?, 1);
    conn.rollback(None)?;

    let row = conn.query(ResultMode::FirstRow, "SELECT x FROM t")?;
    assert_eq!(
        row.as_row().and_then(|r| r.get("X")),
        Some(&RowValues::Int(0))
    );
    Ok(())
}
