//! Statement lifecycle: parse, bind, execute, fetch, free.
//!
//! [`Statement`] owns the driver's statement handle for the duration of one call and frees
//! it when dropped, so every exit path (early return, `?`, success) releases it.

use std::borrow::Cow;

use tracing::debug;

use crate::bind::BoundVariables;
use crate::driver::{Driver, ExecuteMode, StatementId};
use crate::error::SqlSessionError;
use crate::types::RowValues;

/// How a failed operation is reported.
///
/// Every public operation has a variant taking an `ErrorMode`. With `Raise` a failure is
/// an `Err`. With `Suppress` a database failure becomes a sentinel return (`Ok(None)`)
/// and the caller reads the diagnostic from the error slot instead.
///
/// ```rust
/// use sql_session::executor::ErrorMode;
///
/// assert_eq!(ErrorMode::from_message(None), ErrorMode::Raise);
/// assert_eq!(ErrorMode::from_message(Some("")), ErrorMode::Raise);
/// assert!(ErrorMode::from_message(Some("lookup failed")).is_suppressed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorMode {
    #[default]
    Raise,
    Suppress(String),
}

impl ErrorMode {
    /// A non-empty exception message suppresses raising.
    #[must_use]
    pub fn from_message(message: Option<&str>) -> Self {
        match message {
            Some(msg) if !msg.is_empty() => ErrorMode::Suppress(msg.to_string()),
            _ => ErrorMode::Raise,
        }
    }

    #[must_use]
    pub fn suppress(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_message(Some(&message))
    }

    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        matches!(self, ErrorMode::Suppress(_))
    }
}

/// Convert CR-LF line endings to LF. Borrows when there is nothing to change.
#[must_use]
pub fn normalize_sql(sql: &str) -> Cow<'_, str> {
    if sql.contains("\r\n") {
        Cow::Owned(sql.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(sql)
    }
}

fn attach_sql(err: SqlSessionError, sql: &str) -> SqlSessionError {
    match err {
        SqlSessionError::ExecuteFailed(e) => SqlSessionError::ExecuteFailed(e.with_sql(sql)),
        SqlSessionError::LobWriteFailed { name, source } => SqlSessionError::LobWriteFailed {
            name,
            source: source.with_sql(sql),
        },
        other => other,
    }
}

/// A parsed statement, freed on drop.
pub(crate) struct Statement<'d> {
    driver: &'d mut dyn Driver,
    id: StatementId,
    sql: String,
}

impl<'d> Statement<'d> {
    pub(crate) fn parse(driver: &'d mut dyn Driver, sql: &str) -> Result<Self, SqlSessionError> {
        let sql = normalize_sql(sql);
        debug!(target: "sql_session::sql", sql = %sql, "parse");
        let id = driver
            .parse(&sql)
            .map_err(|e| SqlSessionError::ParseFailed(e.with_sql(&sql)))?;
        Ok(Self {
            driver,
            id,
            sql: sql.into_owned(),
        })
    }

    pub(crate) fn limit_rows(&mut self, limit: usize) -> Result<(), SqlSessionError> {
        self.driver
            .set_row_limit(self.id, limit)
            .map_err(|e| SqlSessionError::ExecuteFailed(e.with_sql(&self.sql)))
    }

    pub(crate) fn execute(&mut self, mode: ExecuteMode) -> Result<(), SqlSessionError> {
        debug!(target: "sql_session::sql", ?mode, "execute");
        self.driver
            .execute(self.id, mode)
            .map_err(|e| SqlSessionError::ExecuteFailed(e.with_sql(&self.sql)))
    }

    /// Bind `vars`, execute, then release the variables whatever the outcome.
    pub(crate) fn execute_bound(
        &mut self,
        vars: &mut BoundVariables,
        mode: ExecuteMode,
    ) -> Result<(), SqlSessionError> {
        if !vars.is_empty() {
            debug!(target: "sql_session::sql", binds = %vars.summary(), "bind");
        }
        let outcome = vars
            .attach(&mut *self.driver, self.id)
            .map_err(|e| attach_sql(e, &self.sql))
            .and_then(|()| self.execute(mode));
        vars.release(&mut *self.driver, self.id);
        outcome
    }

    pub(crate) fn column_names(&self) -> Result<Vec<String>, SqlSessionError> {
        self.driver
            .column_names(self.id)
            .map_err(|e| SqlSessionError::ExecuteFailed(e.with_sql(&self.sql)))
    }

    pub(crate) fn fetch(&mut self) -> Result<Option<Vec<RowValues>>, SqlSessionError> {
        self.driver
            .fetch_row(self.id)
            .map_err(|e| SqlSessionError::ExecuteFailed(e.with_sql(&self.sql)))
    }

    pub(crate) fn rows_affected(&self) -> Result<usize, SqlSessionError> {
        self.driver
            .rows_affected(self.id)
            .map_err(|e| SqlSessionError::ExecuteFailed(e.with_sql(&self.sql)))
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        self.driver.free_statement(self.id);
    }
}
