use tracing::debug;

use crate::bind::BoundVariables;
use crate::driver::{Driver, ExecuteMode};
use crate::error::SqlSessionError;
use crate::executor::{ErrorMode, Statement};
use crate::results::transform::{self, index_field};
use crate::results::{Keyed, QueryOptions, QueryResult, ResultMode};

use super::{Connection, QueryMetadata, qualified_identifier};

/// Parse, optionally bind, execute and return the affected row count.
///
/// The statement is freed and any variables released before this returns.
pub(crate) fn run_dml(
    driver: &mut dyn Driver,
    sql: &str,
    vars: Option<&mut BoundVariables>,
    mode: ExecuteMode,
) -> Result<usize, SqlSessionError> {
    let mut stmt = Statement::parse(driver, sql)?;
    match vars {
        Some(vars) => stmt.execute_bound(vars, mode)?,
        None => stmt.execute(mode)?,
    }
    let affected = stmt.rows_affected()?;
    debug!(target: "sql_session::sql", affected, "dml");
    Ok(affected)
}

impl Connection {
    fn execute_mode(&self) -> ExecuteMode {
        ExecuteMode::for_transaction(self.in_transaction)
    }

    fn run_query(
        &mut self,
        mode: ResultMode,
        sql: &str,
        vars: Option<&mut BoundVariables>,
        index_field_name: Option<&str>,
    ) -> Result<QueryResult, SqlSessionError> {
        self.metadata = QueryMetadata::default();
        let case = self.query_case;
        let exec_mode = self.execute_mode();
        if mode == ResultMode::AllRowsAssoc {
            index_field(index_field_name, case)?;
        }
        let shaped = self.with_driver(|driver| {
            let mut stmt = Statement::parse(driver, sql)?;
            if let Some(limit) = mode.row_limit() {
                stmt.limit_rows(limit)?;
            }
            match vars {
                Some(vars) => stmt.execute_bound(vars, exec_mode)?,
                None => stmt.execute(exec_mode)?,
            }
            transform::shape(&mut stmt, mode, index_field_name, case)
        })?;
        debug!(target: "sql_session::sql", %mode, rows = shaped.total_rows, "query");
        self.metadata = QueryMetadata {
            column_names: shaped.columns,
            total_rows: shaped.total_rows,
        };
        Ok(shaped.result)
    }

    /// Run a query and shape its rows per `mode`.
    ///
    /// Column names and the row count are available afterwards from
    /// [`Connection::last_column_names`] and [`Connection::last_total_rows`]; both are
    /// reset at the start of every query.
    ///
    /// # Errors
    /// `NotConnected`, `ParseFailed`, `ExecuteFailed`, or `MissingIndexField` /
    /// `UnknownIndexField` for [`ResultMode::AllRowsAssoc`].
    pub fn query(&mut self, mode: ResultMode, sql: &str) -> Result<QueryResult, SqlSessionError> {
        let outcome = self.run_query(mode, sql, None, None);
        self.record(outcome)
    }

    /// [`Connection::query`] with per-call options. `Ok(None)` is a suppressed failure;
    /// the diagnostic is in the error slot.
    ///
    /// # Errors
    /// As [`Connection::query`], unless the failure came from the database and the
    /// options carry an exception message.
    pub fn query_with(
        &mut self,
        mode: ResultMode,
        sql: &str,
        options: &QueryOptions,
    ) -> Result<Option<QueryResult>, SqlSessionError> {
        let outcome = self.run_query(mode, sql, None, options.index_field.as_deref());
        self.report(outcome, &options.error_mode)
    }

    /// A query with bound variables. The variables are released (and OUT values copied
    /// back) before the result is shaped.
    ///
    /// # Errors
    /// As [`Connection::query_with`], plus `LobWriteFailed`.
    pub fn query_prepared(
        &mut self,
        mode: ResultMode,
        sql: &str,
        vars: &mut BoundVariables,
        options: &QueryOptions,
    ) -> Result<Option<QueryResult>, SqlSessionError> {
        let outcome = self.run_query(mode, sql, Some(vars), options.index_field.as_deref());
        self.report(outcome, &options.error_mode)
    }

    /// Execute a statement without bind variables and return the affected row count.
    ///
    /// # Errors
    /// `NotConnected`, `ParseFailed` or `ExecuteFailed`.
    pub fn execute_dml(&mut self, sql: &str) -> Result<usize, SqlSessionError> {
        let mode = self.execute_mode();
        let outcome = self.with_driver(|driver| run_dml(driver, sql, None, mode));
        self.record(outcome)
    }

    /// [`Connection::execute_dml`] with an error mode; `Ok(None)` is a suppressed failure.
    ///
    /// # Errors
    /// As [`Connection::execute_dml`], unless suppressed.
    pub fn execute_dml_with(
        &mut self,
        sql: &str,
        error_mode: &ErrorMode,
    ) -> Result<Option<usize>, SqlSessionError> {
        let mode = self.execute_mode();
        let outcome = self.with_driver(|driver| run_dml(driver, sql, None, mode));
        self.report(outcome, error_mode)
    }

    /// Execute a statement with bind variables and return the affected row count.
    ///
    /// After the call each variable holds the value left in its placeholder, including on
    /// failure.
    ///
    /// # Errors
    /// `NotConnected`, `ParseFailed`, `ExecuteFailed` or `LobWriteFailed`.
    pub fn execute_prepared_dml(
        &mut self,
        sql: &str,
        vars: &mut BoundVariables,
    ) -> Result<usize, SqlSessionError> {
        let mode = self.execute_mode();
        let outcome = self.with_driver(|driver| run_dml(driver, sql, Some(vars), mode));
        self.record(outcome)
    }

    /// [`Connection::execute_prepared_dml`] with an error mode.
    ///
    /// # Errors
    /// As [`Connection::execute_prepared_dml`], unless suppressed.
    pub fn execute_prepared_dml_with(
        &mut self,
        sql: &str,
        vars: &mut BoundVariables,
        error_mode: &ErrorMode,
    ) -> Result<Option<usize>, SqlSessionError> {
        let mode = self.execute_mode();
        let outcome = self.with_driver(|driver| run_dml(driver, sql, Some(vars), mode));
        self.report(outcome, error_mode)
    }

    fn run_procedure(
        &mut self,
        procedure: &str,
        vars: &mut BoundVariables,
    ) -> Result<Keyed<String>, SqlSessionError> {
        let procedure = qualified_identifier(procedure)?;
        let mode = self.execute_mode();
        let case = self.procedure_case;
        self.with_driver(|driver| {
            let params: Vec<String> = vars.names().into_iter().map(String::from).collect();
            let params: Vec<&str> = params.iter().map(String::as_str).collect();
            let sql = driver.procedure_call_sql(procedure, &params);
            run_dml(driver, &sql, Some(vars), mode)
        })?;
        Ok(vars.outputs(case).into_iter().collect())
    }

    /// Call a stored procedure with every variable in `vars` as an argument, in binding
    /// order. Returns the OUT and IN_OUT values keyed by variable name in the configured
    /// procedure key case; `vars` holds them too.
    ///
    /// # Errors
    /// `InvalidIdentifier` for a malformed procedure name, otherwise as
    /// [`Connection::execute_prepared_dml`].
    pub fn execute_stored_procedure(
        &mut self,
        procedure: &str,
        vars: &mut BoundVariables,
    ) -> Result<Keyed<String>, SqlSessionError> {
        let outcome = self.run_procedure(procedure, vars);
        self.record(outcome)
    }

    /// [`Connection::execute_stored_procedure`] with an error mode.
    ///
    /// # Errors
    /// As [`Connection::execute_stored_procedure`], unless suppressed.
    pub fn execute_stored_procedure_with(
        &mut self,
        procedure: &str,
        vars: &mut BoundVariables,
        error_mode: &ErrorMode,
    ) -> Result<Option<Keyed<String>>, SqlSessionError> {
        let outcome = self.run_procedure(procedure, vars);
        self.report(outcome, error_mode)
    }
}
