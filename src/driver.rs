//! The driver seam: an opaque, exclusively owned handle to one database session.
//!
//! The connection layer talks to the backend only through [`Driver`], using the classic
//! call-level sequence: parse a statement, bind variables by name, execute under a commit
//! mode, fetch rows, free the statement. Temporary large objects are driver resources too.

use std::fmt;

use crate::bind::BindType;
use crate::error::DriverError;
use crate::types::{ConnectMode, RowValues};

/// Handle to a parsed statement, valid until [`Driver::free_statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementId(pub u64);

/// Handle to a temporary large object, valid until [`Driver::free_lob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LobId(pub u64);

/// Commit behaviour of a single execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    /// Commit pending work once the statement succeeds.
    CommitOnSuccess,
    /// Leave the transaction open.
    NoAutoCommit,
}

impl ExecuteMode {
    #[must_use]
    pub fn for_transaction(in_transaction: bool) -> Self {
        if in_transaction {
            ExecuteMode::NoAutoCommit
        } else {
            ExecuteMode::CommitOnSuccess
        }
    }
}

/// What a placeholder is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    /// A temporary LOB; the driver reads its content at execute time.
    Lob(LobId),
}

pub trait Driver: Send {
    /// Prepare `sql` and return a statement handle.
    ///
    /// # Errors
    /// Returns the driver's diagnostic if the statement cannot be prepared.
    fn parse(&mut self, sql: &str) -> Result<StatementId, DriverError>;

    /// Bind `value` to the placeholder `:name`.
    ///
    /// # Errors
    /// Returns the driver's diagnostic if the statement has no such placeholder.
    fn bind_by_name(
        &mut self,
        stmt: StatementId,
        name: &str,
        value: BindValue,
        max_length: i32,
        bind_type: BindType,
    ) -> Result<(), DriverError>;

    /// Cap the rows the caller will fetch from `stmt`. Set before [`Driver::execute`];
    /// a driver that reads ahead stops once it holds `limit` rows.
    ///
    /// # Errors
    /// Returns a diagnostic for an unknown statement handle.
    fn set_row_limit(&mut self, stmt: StatementId, limit: usize) -> Result<(), DriverError>;

    /// Execute a parsed statement.
    ///
    /// # Errors
    /// Returns the driver's diagnostic if execution fails.
    fn execute(&mut self, stmt: StatementId, mode: ExecuteMode) -> Result<(), DriverError>;

    /// Column names of an executed query, in select-list order.
    ///
    /// # Errors
    /// Returns a diagnostic for an unknown statement handle.
    fn column_names(&self, stmt: StatementId) -> Result<Vec<String>, DriverError>;

    /// Next row of an executed query, `None` once exhausted.
    ///
    /// # Errors
    /// Returns a diagnostic for an unknown statement handle.
    fn fetch_row(&mut self, stmt: StatementId) -> Result<Option<Vec<RowValues>>, DriverError>;

    /// Rows touched by an executed DML statement.
    ///
    /// # Errors
    /// Returns a diagnostic for an unknown statement handle.
    fn rows_affected(&self, stmt: StatementId) -> Result<usize, DriverError>;

    /// Current value of a bound placeholder; reflects OUT parameters after execute.
    fn bound_value(&self, stmt: StatementId, name: &str) -> Option<String>;

    /// Release a statement. Unknown handles are ignored.
    fn free_statement(&mut self, stmt: StatementId);

    /// Create an empty temporary LOB scoped to this session.
    ///
    /// # Errors
    /// Returns the driver's diagnostic if the LOB cannot be allocated.
    fn create_temporary_lob(&mut self) -> Result<LobId, DriverError>;

    /// Replace the content of a temporary LOB, returning the bytes written.
    ///
    /// # Errors
    /// Returns a diagnostic for an unknown or released LOB.
    fn write_lob(&mut self, lob: LobId, data: &str) -> Result<usize, DriverError>;

    fn read_lob(&self, lob: LobId) -> Option<String>;

    /// Release a temporary LOB. Unknown handles are ignored.
    fn free_lob(&mut self, lob: LobId);

    /// # Errors
    /// Returns the driver's diagnostic if the commit fails.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns the driver's diagnostic if the rollback fails.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// Release the session handle. Further calls fail.
    ///
    /// # Errors
    /// Returns the driver's diagnostic if the handle cannot be released cleanly.
    fn close(&mut self) -> Result<(), DriverError>;

    /// Text of an anonymous block calling `procedure` with the given placeholders.
    fn procedure_call_sql(&self, procedure: &str, params: &[&str]) -> String {
        if params.is_empty() {
            return format!("BEGIN {procedure}; END;");
        }
        let args: Vec<String> = params.iter().map(|p| format!(":{p}")).collect();
        format!("BEGIN {procedure}({}); END;", args.join(", "))
    }
}

/// Login details resolved from configuration.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Connect descriptor (a database path for SQLite).
    pub descriptor: String,
    pub character_set: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("descriptor", &self.descriptor)
            .field("character_set", &self.character_set)
            .finish()
    }
}

/// Opens driver sessions.
pub trait Connector: Send {
    /// # Errors
    /// Returns the driver's diagnostic if the backend rejects the credentials.
    fn connect(
        &self,
        credentials: &Credentials,
        mode: ConnectMode,
    ) -> Result<Box<dyn Driver>, DriverError>;
}
