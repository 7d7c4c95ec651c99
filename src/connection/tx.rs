use tracing::debug;

use crate::driver::ExecuteMode;
use crate::error::SqlSessionError;

use super::{Connection, identifier, run_dml};

impl Connection {
    /// Enter explicit-transaction mode, optionally marking a savepoint first.
    ///
    /// A no-op when a transaction is already open; the savepoint is not issued again.
    ///
    /// # Errors
    /// `NotConnected`, `InvalidIdentifier` for a malformed savepoint name, or the
    /// failure of the `SAVEPOINT` statement.
    pub fn start_transaction(&mut self, savepoint: Option<&str>) -> Result<(), SqlSessionError> {
        if !self.connected() {
            return self.record(Err(SqlSessionError::NotConnected));
        }
        if self.in_transaction {
            return Ok(());
        }
        if let Some(name) = savepoint {
            let outcome = identifier(name).and_then(|name| {
                let sql = format!("SAVEPOINT {name}");
                self.with_driver(|driver| {
                    run_dml(driver, &sql, None, ExecuteMode::NoAutoCommit).map(|_| ())
                })
            });
            self.record(outcome)?;
        }
        self.in_transaction = true;
        debug!(target: "sql_session", savepoint, "transaction started");
        Ok(())
    }

    /// Commit pending work. A no-op outside a transaction.
    ///
    /// The connection stays in explicit-transaction mode afterwards.
    ///
    /// # Errors
    /// `ExecuteFailed` if the driver cannot commit.
    pub fn commit(&mut self) -> Result<(), SqlSessionError> {
        if !self.in_transaction {
            return Ok(());
        }
        let outcome = self.with_driver(|driver| {
            driver.commit().map_err(|e| SqlSessionError::ExecuteFailed(e.with_sql("COMMIT")))
        });
        self.record(outcome)?;
        debug!(target: "sql_session", "commit");
        Ok(())
    }

    /// Roll back to `savepoint`, or the whole transaction. A no-op outside a transaction.
    ///
    /// # Errors
    /// `InvalidIdentifier` for a malformed savepoint name, `ExecuteFailed` if the driver
    /// cannot roll back (including an unknown savepoint).
    pub fn rollback(&mut self, savepoint: Option<&str>) -> Result<(), SqlSessionError> {
        if !self.in_transaction {
            return Ok(());
        }
        let outcome = match savepoint {
            Some(name) => identifier(name).and_then(|name| {
                let sql = format!("ROLLBACK TO SAVEPOINT {name}");
                self.with_driver(|driver| {
                    run_dml(driver, &sql, None, ExecuteMode::NoAutoCommit).map(|_| ())
                })
            }),
            None => self.with_driver(|driver| {
                driver
                    .rollback()
                    .map_err(|e| SqlSessionError::ExecuteFailed(e.with_sql("ROLLBACK")))
            }),
        };
        self.record(outcome)?;
        debug!(target: "sql_session", savepoint, "rollback");
        Ok(())
    }
}
