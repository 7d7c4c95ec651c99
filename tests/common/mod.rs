#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sql_session::bind::BindType;
use sql_session::driver::{BindValue, LobId, StatementId};
use sql_session::prelude::*;
use sql_session::types::ConnectMode;
use sql_session::{Connector, Credentials, Driver, ExecuteMode};

/// Statements and transaction calls seen by a [`RecordingDriver`], in order.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Wraps the SQLite connector and records what its drivers are asked to do.
pub struct RecordingConnector {
    inner: SqliteConnector,
    log: Log,
}

impl RecordingConnector {
    pub fn new(inner: SqliteConnector) -> (Self, Log) {
        let log = Log::default();
        (
            Self {
                inner,
                log: log.clone(),
            },
            log,
        )
    }
}

impl Connector for RecordingConnector {
    fn connect(
        &self,
        credentials: &Credentials,
        mode: ConnectMode,
    ) -> Result<Box<dyn Driver>, DriverError> {
        let inner = self.inner.connect(credentials, mode)?;
        self.log.push("CONNECT");
        Ok(Box::new(RecordingDriver {
            inner,
            log: self.log.clone(),
        }))
    }
}

pub struct RecordingDriver {
    inner: Box<dyn Driver>,
    log: Log,
}

impl Driver for RecordingDriver {
    fn parse(&mut self, sql: &str) -> Result<StatementId, DriverError> {
        self.log.push(sql);
        self.inner.parse(sql)
    }

    fn bind_by_name(
        &mut self,
        stmt: StatementId,
        name: &str,
        value: BindValue,
        max_length: i32,
        bind_type: BindType,
    ) -> Result<(), DriverError> {
        self.log.push(format!("BIND :{name} {bind_type:?} {max_length}"));
        self.inner.bind_by_name(stmt, name, value, max_length, bind_type)
    }

    fn set_row_limit(&mut self, stmt: StatementId, limit: usize) -> Result<(), DriverError> {
        self.log.push(format!("ROW LIMIT {limit}"));
        self.inner.set_row_limit(stmt, limit)
    }

    fn execute(&mut self, stmt: StatementId, mode: ExecuteMode) -> Result<(), DriverError> {
        self.inner.execute(stmt, mode)
    }

    fn column_names(&self, stmt: StatementId) -> Result<Vec<String>, DriverError> {
        self.inner.column_names(stmt)
    }

    fn fetch_row(&mut self, stmt: StatementId) -> Result<Option<Vec<RowValues>>, DriverError> {
        self.inner.fetch_row(stmt)
    }

    fn rows_affected(&self, stmt: StatementId) -> Result<usize, DriverError> {
        self.inner.rows_affected(stmt)
    }

    fn bound_value(&self, stmt: StatementId, name: &str) -> Option<String> {
        self.inner.bound_value(stmt, name)
    }

    fn free_statement(&mut self, stmt: StatementId) {
        self.inner.free_statement(stmt);
    }

    fn create_temporary_lob(&mut self) -> Result<LobId, DriverError> {
        self.log.push("CREATE LOB");
        self.inner.create_temporary_lob()
    }

    fn write_lob(&mut self, lob: LobId, data: &str) -> Result<usize, DriverError> {
        self.inner.write_lob(lob, data)
    }

    fn read_lob(&self, lob: LobId) -> Option<String> {
        self.inner.read_lob(lob)
    }

    fn free_lob(&mut self, lob: LobId) {
        self.log.push("FREE LOB");
        self.inner.free_lob(lob);
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.log.push("COMMIT");
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.log.push("ROLLBACK");
        self.inner.rollback()
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.log.push("CLOSE");
        self.inner.close()
    }
}

/// A single configuration section named `section`.
pub fn config(section: &str, pairs: &[(&str, &str)]) -> HashMap<String, HashMap<String, String>> {
    let values = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    HashMap::from([(section.to_string(), values)])
}

/// A connected in-memory session with `pairs` added to its `main` section.
pub fn connected(pairs: &[(&str, &str)]) -> Result<(Connection, Log), SqlSessionError> {
    connected_with(SqliteConnector::new(), pairs)
}

pub fn connected_with(
    connector: SqliteConnector,
    pairs: &[(&str, &str)],
) -> Result<(Connection, Log), SqlSessionError> {
    let (connector, log) = RecordingConnector::new(connector);
    let mut all = vec![("username", "tester"), ("connection", ":memory:")];
    all.extend_from_slice(pairs);
    let mut conn = Connection::builder(connector)
        .config(config("main", &all))
        .build();
    conn.connect("main", false)?;
    Ok((conn, log))
}

/// `customers` with three rows: (1, 'Ada', 'London'), (2, 'Grace', 'Arlington'),
/// (3, 'Linus', 'Helsinki').
pub fn seed_customers(conn: &mut Connection) -> Result<(), SqlSessionError> {
    conn.execute_dml(
        "CREATE TABLE customers (cust_id INTEGER PRIMARY KEY, name TEXT, city TEXT)",
    )?;
    conn.execute_dml(
        "INSERT INTO customers VALUES (1, 'Ada', 'London'), (2, 'Grace', 'Arlington'), \
         (3, 'Linus', 'Helsinki')",
    )?;
    Ok(())
}
