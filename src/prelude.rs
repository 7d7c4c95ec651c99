//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types
//! to make it easier to get started with the library.

pub use crate::bind::{BoundVariables, Direction, LogicalType};
pub use crate::config::{ConfigSource, JsonConfig};
pub use crate::connection::Connection;
pub use crate::error::{DriverError, SqlSessionError};
pub use crate::executor::ErrorMode;
pub use crate::results::{Keyed, QueryOptions, QueryResult, ResultMode, Row};
pub use crate::store::{MemoryStore, ParameterStore};
pub use crate::types::{KeyCase, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{ProcedureArgs, SqliteConnector};
