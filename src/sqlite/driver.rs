use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use rusqlite::types::Value;
use tracing::debug;

use crate::bind::BindType;
use crate::driver::{BindValue, Connector, Credentials, Driver, ExecuteMode, LobId, StatementId};
use crate::error::DriverError;
use crate::types::{ConnectMode, RowValues};

use super::params::{driver_error, from_value_ref, to_sqlite_value};
use super::procedure::{Procedure, ProcedureArgs, ProcedureCall};
use super::session::{SqliteHandle, acquire, parse_alter_session};

fn not_connected() -> DriverError {
    DriverError::new(3114, "not connected to the database")
}

fn invalid_cursor() -> DriverError {
    DriverError::new(1001, "invalid cursor")
}

fn invalid_lob() -> DriverError {
    DriverError::new(22275, "invalid LOB locator specified")
}

/// Opens SQLite sessions. The connect descriptor is the database path; an empty
/// descriptor or `:memory:` opens a private in-memory database.
#[derive(Clone, Default)]
pub struct SqliteConnector {
    procedures: Arc<HashMap<String, Procedure>>,
}

impl SqliteConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stored procedure callable as `BEGIN name(:a, :b); END;`.
    ///
    /// Names match case-insensitively, schema prefix included.
    #[must_use]
    pub fn with_procedure<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&rusqlite::Connection, &mut ProcedureArgs) -> rusqlite::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Arc::make_mut(&mut self.procedures).insert(name.to_ascii_uppercase(), Arc::new(body));
        self
    }
}

impl Connector for SqliteConnector {
    fn connect(
        &self,
        credentials: &Credentials,
        mode: ConnectMode,
    ) -> Result<Box<dyn Driver>, DriverError> {
        match credentials.character_set.to_ascii_uppercase().as_str() {
            "" | "UTF8" | "UTF-8" | "AL32UTF8" => {}
            _ => {
                return Err(DriverError::new(
                    12705,
                    "invalid or unknown NLS parameter value specified",
                ));
            }
        }
        let handle = acquire(credentials, mode)?;
        debug!(target: "sql_session::sqlite", key = handle.key(), ?mode, "session opened");
        Ok(Box::new(SqliteDriver::new(handle, Arc::clone(&self.procedures))))
    }
}

enum StatementKind {
    Sql,
    AlterSession { name: String, value: String },
    Call(ProcedureCall),
}

struct Prepared {
    sql: String,
    kind: StatementKind,
    placeholders: Vec<String>,
    binds: HashMap<String, (BindValue, BindType)>,
    columns: Vec<String>,
    rows: VecDeque<Vec<RowValues>>,
    row_limit: Option<usize>,
    affected: usize,
    outputs: HashMap<String, String>,
}

impl Prepared {
    fn placeholder(&self, name: &str) -> Option<&str> {
        self.placeholders
            .iter()
            .find(|p| p.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }
}

fn bind_text(lobs: &HashMap<u64, String>, value: &BindValue) -> Result<String, DriverError> {
    match value {
        BindValue::Text(text) => Ok(text.clone()),
        BindValue::Lob(lob) => lobs.get(&lob.0).cloned().ok_or_else(invalid_lob),
    }
}

fn not_all_bound() -> DriverError {
    DriverError::new(1008, "not all variables bound")
}

/// A [`Driver`] over one SQLite handle. Query rows are buffered at execute time, up to
/// the statement's row limit.
pub struct SqliteDriver {
    handle: Option<Arc<SqliteHandle>>,
    procedures: Arc<HashMap<String, Procedure>>,
    statements: HashMap<u64, Prepared>,
    lobs: HashMap<u64, String>,
    next_id: u64,
}

impl SqliteDriver {
    pub(crate) fn new(handle: Arc<SqliteHandle>, procedures: Arc<HashMap<String, Procedure>>) -> Self {
        Self {
            handle: Some(handle),
            procedures,
            statements: HashMap::new(),
            lobs: HashMap::new(),
            next_id: 0,
        }
    }

    fn handle(&self) -> Result<&Arc<SqliteHandle>, DriverError> {
        self.handle.as_ref().ok_or_else(not_connected)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn run_sql(
        conn: &rusqlite::Connection,
        prepared: &mut Prepared,
        lobs: &HashMap<u64, String>,
    ) -> Result<(), DriverError> {
        let mut stmt = conn.prepare(&prepared.sql).map_err(|e| driver_error(&e))?;
        for index in 1..=stmt.parameter_count() {
            let Some(name) = stmt.parameter_name(index) else {
                return Err(not_all_bound());
            };
            let name = name.trim_start_matches([':', '@', '$']);
            let (value, bind_type) = prepared
                .binds
                .iter()
                .find(|(bound, _)| bound.eq_ignore_ascii_case(name))
                .map(|(_, bind)| bind)
                .ok_or_else(not_all_bound)?;
            let value = match value {
                BindValue::Text(text) => to_sqlite_value(text, *bind_type),
                BindValue::Lob(_) => Value::Text(bind_text(lobs, value)?),
            };
            stmt.raw_bind_parameter(index, value)
                .map_err(|e| driver_error(&e))?;
        }

        if stmt.column_count() == 0 {
            prepared.affected = stmt.raw_execute().map_err(|e| driver_error(&e))?;
            return Ok(());
        }

        prepared.columns = stmt.column_names().iter().map(ToString::to_string).collect();
        let width = prepared.columns.len();
        let limit = prepared.row_limit.unwrap_or(usize::MAX);
        let mut rows = stmt.raw_query();
        while prepared.rows.len() < limit
            && let Some(row) = rows.next().map_err(|e| driver_error(&e))?
        {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_value_ref(row.get_ref(i).map_err(|e| driver_error(&e))?));
            }
            prepared.rows.push_back(values);
        }
        prepared.affected = prepared.rows.len();
        Ok(())
    }

    fn run_call(
        conn: &rusqlite::Connection,
        call: &ProcedureCall,
        procedures: &HashMap<String, Procedure>,
        prepared: &mut Prepared,
        lobs: &mut HashMap<u64, String>,
    ) -> Result<(), DriverError> {
        let body = procedures.get(&call.name).ok_or_else(|| {
            DriverError::new(
                6550,
                format!("PLS-00201: identifier '{}' must be declared", call.name),
            )
        })?;
        let mut args = Vec::with_capacity(call.placeholders.len());
        for name in &call.placeholders {
            let (value, _) = prepared.binds.get(name).ok_or_else(not_all_bound)?;
            args.push((name.clone(), bind_text(lobs, value)?));
        }
        let mut args = ProcedureArgs::new(args);
        debug!(target: "sql_session::sqlite", procedure = %call.name, ?args, "call");
        body(conn, &mut args).map_err(|e| driver_error(&e))?;

        for (name, value) in args.into_inner() {
            if let Some((BindValue::Lob(lob), _)) = prepared.binds.get(&name) {
                lobs.insert(lob.0, value.clone());
            }
            prepared.outputs.insert(name, value);
        }
        Ok(())
    }
}

impl Driver for SqliteDriver {
    fn parse(&mut self, sql: &str) -> Result<StatementId, DriverError> {
        let handle = self.handle()?;
        let (kind, placeholders) = if let Some((name, value)) = parse_alter_session(sql) {
            (StatementKind::AlterSession { name, value }, Vec::new())
        } else if let Some(call) = ProcedureCall::parse(sql)? {
            let placeholders = call.placeholders.clone();
            (StatementKind::Call(call), placeholders)
        } else {
            let conn = handle.conn();
            let stmt = conn.prepare(sql).map_err(|e| driver_error(&e))?;
            let placeholders = (1..=stmt.parameter_count())
                .filter_map(|i| stmt.parameter_name(i))
                .map(|name| name.trim_start_matches([':', '@', '$']).to_string())
                .collect();
            (StatementKind::Sql, placeholders)
        };
        let id = self.next_id();
        self.statements.insert(
            id,
            Prepared {
                sql: sql.to_string(),
                kind,
                placeholders,
                binds: HashMap::new(),
                columns: Vec::new(),
                rows: VecDeque::new(),
                row_limit: None,
                affected: 0,
                outputs: HashMap::new(),
            },
        );
        Ok(StatementId(id))
    }

    fn bind_by_name(
        &mut self,
        stmt: StatementId,
        name: &str,
        value: BindValue,
        _max_length: i32,
        bind_type: BindType,
    ) -> Result<(), DriverError> {
        if let BindValue::Lob(lob) = &value
            && !self.lobs.contains_key(&lob.0)
        {
            return Err(invalid_lob());
        }
        let prepared = self.statements.get_mut(&stmt.0).ok_or_else(invalid_cursor)?;
        let placeholder = prepared
            .placeholder(name.trim_start_matches(':'))
            .ok_or_else(|| DriverError::new(1036, "illegal variable name/number"))?
            .to_string();
        prepared.binds.insert(placeholder, (value, bind_type));
        Ok(())
    }

    fn set_row_limit(&mut self, stmt: StatementId, limit: usize) -> Result<(), DriverError> {
        let prepared = self.statements.get_mut(&stmt.0).ok_or_else(invalid_cursor)?;
        prepared.row_limit = Some(limit);
        Ok(())
    }

    fn execute(&mut self, stmt: StatementId, mode: ExecuteMode) -> Result<(), DriverError> {
        let handle = Arc::clone(self.handle()?);
        let prepared = self.statements.get_mut(&stmt.0).ok_or_else(invalid_cursor)?;
        prepared.rows.clear();
        prepared.columns.clear();
        prepared.outputs.clear();
        prepared.affected = 0;

        let conn = handle.conn();
        if mode == ExecuteMode::NoAutoCommit && conn.is_autocommit() {
            conn.execute_batch("BEGIN").map_err(|e| driver_error(&e))?;
        }
        match &prepared.kind {
            StatementKind::Sql => Self::run_sql(&conn, prepared, &self.lobs)?,
            StatementKind::AlterSession { name, value } => handle.set_parameter(name, value),
            StatementKind::Call(call) => {
                let call = call.clone();
                Self::run_call(&conn, &call, &self.procedures, prepared, &mut self.lobs)?;
            }
        }
        if mode == ExecuteMode::CommitOnSuccess && !conn.is_autocommit() {
            conn.execute_batch("COMMIT").map_err(|e| driver_error(&e))?;
        }
        Ok(())
    }

    fn column_names(&self, stmt: StatementId) -> Result<Vec<String>, DriverError> {
        self.statements
            .get(&stmt.0)
            .map(|p| p.columns.clone())
            .ok_or_else(invalid_cursor)
    }

    fn fetch_row(&mut self, stmt: StatementId) -> Result<Option<Vec<RowValues>>, DriverError> {
        self.statements
            .get_mut(&stmt.0)
            .map(|p| p.rows.pop_front())
            .ok_or_else(invalid_cursor)
    }

    fn rows_affected(&self, stmt: StatementId) -> Result<usize, DriverError> {
        self.statements
            .get(&stmt.0)
            .map(|p| p.affected)
            .ok_or_else(invalid_cursor)
    }

    fn bound_value(&self, stmt: StatementId, name: &str) -> Option<String> {
        let prepared = self.statements.get(&stmt.0)?;
        let placeholder = prepared.placeholder(name.trim_start_matches(':'))?;
        if let Some(out) = prepared.outputs.get(placeholder) {
            return Some(out.clone());
        }
        match prepared.binds.get(placeholder) {
            Some((BindValue::Text(text), _)) => Some(text.clone()),
            _ => None,
        }
    }

    fn free_statement(&mut self, stmt: StatementId) {
        self.statements.remove(&stmt.0);
    }

    fn create_temporary_lob(&mut self) -> Result<LobId, DriverError> {
        self.handle()?;
        let id = self.next_id();
        self.lobs.insert(id, String::new());
        Ok(LobId(id))
    }

    fn write_lob(&mut self, lob: LobId, data: &str) -> Result<usize, DriverError> {
        let slot = self.lobs.get_mut(&lob.0).ok_or_else(invalid_lob)?;
        data.clone_into(slot);
        Ok(data.len())
    }

    fn read_lob(&self, lob: LobId) -> Option<String> {
        self.lobs.get(&lob.0).cloned()
    }

    fn free_lob(&mut self, lob: LobId) {
        self.lobs.remove(&lob.0);
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        let conn = self.handle()?.conn();
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT").map_err(|e| driver_error(&e))?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        let conn = self.handle()?.conn();
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK").map_err(|e| driver_error(&e))?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        let handle = self.handle.take().ok_or_else(not_connected)?;
        self.statements.clear();
        self.lobs.clear();
        debug!(target: "sql_session::sqlite", key = handle.key(), "session closed");
        Ok(())
    }
}
