//! Connection state: the exclusively owned driver handle plus the session flags.
//!
//! ```text
//! Disconnected --connect--> Connected(AutoCommit) --start_transaction--> Connected(Explicit)
//!       ^                              |                                        |
//!       +-------------------------- disconnect <-------------------------------+
//! ```
//!
//! Commit and rollback keep an explicit transaction open, so a connection that entered
//! explicit mode stays in it until `disconnect`.

mod query;
mod tx;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::config::{ConfigSource, ConnectionConfig};
use crate::driver::{Connector, Credentials, Driver, ExecuteMode};
use crate::error::SqlSessionError;
use crate::executor::ErrorMode;
use crate::store::{ERROR_SLOT, MemoryStore, ParameterStore};
use crate::types::{ConnectMode, KeyCase};

use std::collections::HashMap;

pub(crate) use query::run_dml;

lazy_static! {
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]*$").expect("static regex");
    static ref QUALIFIED_IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]*(\.[A-Za-z][A-Za-z0-9_$#]*){0,2}$")
            .expect("static regex");
}

pub(crate) fn identifier(name: &str) -> Result<&str, SqlSessionError> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(SqlSessionError::InvalidIdentifier(name.to_string()))
    }
}

pub(crate) fn qualified_identifier(name: &str) -> Result<&str, SqlSessionError> {
    if QUALIFIED_IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(SqlSessionError::InvalidIdentifier(name.to_string()))
    }
}

/// Column names and row count of the most recent `query` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMetadata {
    pub column_names: Vec<String>,
    pub total_rows: usize,
}

/// A database session.
///
/// Not shareable between threads; use one `Connection` per worker.
///
/// ```rust,no_run
/// use sql_session::prelude::*;
///
/// # fn demo(mut conn: Connection) -> Result<(), SqlSessionError> {
/// conn.connect("main", false)?;
/// let mut vars = BoundVariables::new();
/// vars.bind("p1", "text", "hello");
/// let inserted = conn.execute_prepared_dml("INSERT INTO t (c1) VALUES (:p1)", &mut vars)?;
/// assert_eq!(inserted, 1);
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    connector: Box<dyn Connector>,
    config: Box<dyn ConfigSource>,
    store: Box<dyn ParameterStore>,
    handle: Option<Box<dyn Driver>>,
    in_transaction: bool,
    auto_commit: bool,
    query_case: KeyCase,
    procedure_case: KeyCase,
    metadata: QueryMetadata,
}

/// Fluent builder for a [`Connection`].
pub struct ConnectionBuilder {
    connector: Box<dyn Connector>,
    config: Box<dyn ConfigSource>,
    store: Box<dyn ParameterStore>,
}

impl ConnectionBuilder {
    #[must_use]
    pub fn config(mut self, config: impl ConfigSource + 'static) -> Self {
        self.config = Box::new(config);
        self
    }

    #[must_use]
    pub fn store(mut self, store: impl ParameterStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    #[must_use]
    pub fn build(self) -> Connection {
        Connection {
            connector: self.connector,
            config: self.config,
            store: self.store,
            handle: None,
            in_transaction: false,
            auto_commit: true,
            query_case: KeyCase::default(),
            procedure_case: KeyCase::default(),
            metadata: QueryMetadata::default(),
        }
    }
}

impl Connection {
    /// Start building a connection over `connector`; configuration defaults to empty and
    /// the parameter store to a fresh [`MemoryStore`].
    #[must_use]
    pub fn builder(connector: impl Connector + 'static) -> ConnectionBuilder {
        ConnectionBuilder {
            connector: Box::new(connector),
            config: Box::new(HashMap::<String, HashMap<String, String>>::new()),
            store: Box::new(MemoryStore::new()),
        }
    }

    /// Connect using configuration section `section`. A no-op when already connected.
    ///
    /// `persistent` forces the persistent connect strategy regardless of `connectMode`.
    ///
    /// # Errors
    /// `ConfigError` for a missing or malformed section, `ConnectFailed` if the driver
    /// rejects the credentials, `ParseFailed`/`ExecuteFailed` if session initialisation
    /// SQL fails (the handle is released again in that case).
    pub fn connect(&mut self, section: &str, persistent: bool) -> Result<(), SqlSessionError> {
        if self.handle.is_some() {
            return Ok(());
        }
        let outcome = self.open(section, persistent);
        self.record(outcome)
    }

    /// [`Connection::connect`] with an error mode; `Ok(false)` is a suppressed failure.
    ///
    /// # Errors
    /// As [`Connection::connect`], unless suppressed.
    pub fn connect_with(
        &mut self,
        section: &str,
        persistent: bool,
        mode: &ErrorMode,
    ) -> Result<bool, SqlSessionError> {
        if self.handle.is_some() {
            return Ok(true);
        }
        let outcome = self.open(section, persistent);
        self.report(outcome, mode).map(|done| done.is_some())
    }

    fn open(&mut self, section: &str, persistent: bool) -> Result<(), SqlSessionError> {
        let values = self.config.section(section).ok_or_else(|| {
            SqlSessionError::ConfigError(format!("no configuration section named {section:?}"))
        })?;
        let cfg = ConnectionConfig::from_section(&values)?;
        let auto_commit = cfg.auto_commit()?;
        let mode = if persistent {
            ConnectMode::Persistent
        } else {
            cfg.connect_mode()
        };
        let credentials = Credentials {
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            descriptor: cfg.connection.clone(),
            character_set: cfg.character_set.clone(),
        };
        info!(
            target: "sql_session",
            section,
            username = %credentials.username,
            descriptor = %credentials.descriptor,
            ?mode,
            "connect"
        );
        let mut driver = self
            .connector
            .connect(&credentials, mode)
            .map_err(SqlSessionError::ConnectFailed)?;

        for sql in cfg.session_statements() {
            if let Err(err) = run_dml(driver.as_mut(), &sql, None, ExecuteMode::CommitOnSuccess) {
                if let Err(close_err) = driver.close() {
                    warn!(target: "sql_session", error = %close_err, "close after failed session setup");
                }
                return Err(err);
            }
        }

        self.handle = Some(driver);
        self.auto_commit = auto_commit;
        self.in_transaction = !auto_commit;
        self.query_case = cfg.query_case();
        self.procedure_case = cfg.procedure_case();
        Ok(())
    }

    /// Roll back an open transaction and release the handle. A no-op when disconnected.
    ///
    /// # Errors
    /// `ExecuteFailed` if the rollback or close fails; the connection is disconnected
    /// either way.
    pub fn disconnect(&mut self) -> Result<(), SqlSessionError> {
        let Some(mut driver) = self.handle.take() else {
            return Ok(());
        };
        let rolled_back = if self.in_transaction {
            driver.rollback().map_err(SqlSessionError::ExecuteFailed)
        } else {
            Ok(())
        };
        let closed = driver.close().map_err(SqlSessionError::ExecuteFailed);
        self.in_transaction = false;
        self.auto_commit = true;
        info!(target: "sql_session", "disconnect");
        let outcome = rolled_back.and(closed);
        self.record(outcome)
    }

    #[must_use]
    pub fn connected(&self) -> bool {
        self.handle.is_some()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    #[must_use]
    pub fn auto_commit_enabled(&self) -> bool {
        self.auto_commit
    }

    #[must_use]
    pub fn query_case(&self) -> KeyCase {
        self.query_case
    }

    #[must_use]
    pub fn procedure_case(&self) -> KeyCase {
        self.procedure_case
    }

    /// Contents of the error slot: the diagnostic of the last failed operation.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.store.get(ERROR_SLOT)
    }

    #[must_use]
    pub fn store(&self) -> &dyn ParameterStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn ParameterStore {
        self.store.as_mut()
    }

    #[must_use]
    pub fn metadata(&self) -> &QueryMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn last_column_names(&self) -> &[String] {
        &self.metadata.column_names
    }

    #[must_use]
    pub fn last_total_rows(&self) -> usize {
        self.metadata.total_rows
    }

    pub(crate) fn with_driver<T>(
        &mut self,
        func: impl FnOnce(&mut dyn Driver) -> Result<T, SqlSessionError>,
    ) -> Result<T, SqlSessionError> {
        match self.handle.as_deref_mut() {
            Some(driver) => func(driver),
            None => Err(SqlSessionError::NotConnected),
        }
    }

    /// Write the diagnostic of a failed outcome to the error slot.
    pub(crate) fn record<T>(
        &mut self,
        outcome: Result<T, SqlSessionError>,
    ) -> Result<T, SqlSessionError> {
        if let Err(err) = &outcome {
            self.store.set(ERROR_SLOT, err.diagnostic());
        }
        outcome
    }

    /// [`Connection::record`], then turn a suppressible failure into `Ok(None)` when the
    /// error mode asks for it.
    pub(crate) fn report<T>(
        &mut self,
        outcome: Result<T, SqlSessionError>,
        mode: &ErrorMode,
    ) -> Result<Option<T>, SqlSessionError> {
        match self.record(outcome) {
            Ok(value) => Ok(Some(value)),
            Err(err) => match mode {
                ErrorMode::Suppress(message) if err.is_suppressible() => {
                    warn!(target: "sql_session", %message, error = %err, "suppressed failure");
                    Ok(None)
                }
                _ => Err(err),
            },
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.handle.is_some()
            && let Err(err) = self.disconnect()
        {
            warn!(target: "sql_session", error = %err, "disconnect on drop");
        }
    }
}
