//! Session-oriented SQL access.
//!
//! A [`Connection`] owns one driver session and layers on top of it: named bind variables
//! with large-object staging, result shaping into the seven [`ResultMode`]s, explicit
//! transactions with savepoints, and a dual error convention where database failures can
//! be raised or suppressed per call. Every failure's diagnostic is also written to the
//! `DB_ERROR` slot of the connection's [`ParameterStore`].
//!
//! The backend is reached through the [`Driver`] and [`Connector`] traits. The `sqlite`
//! feature (on by default) provides [`sqlite::SqliteConnector`].

pub mod bind;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod executor;
pub mod helpers;
pub mod prelude;
pub mod results;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod store;
pub mod types;

pub use bind::{BoundVariable, BoundVariables, Direction, LogicalType};
pub use config::{ConfigSource, ConnectionConfig, JsonConfig};
pub use connection::{Connection, ConnectionBuilder, QueryMetadata};
pub use driver::{Connector, Credentials, Driver, ExecuteMode};
pub use error::{DriverError, SqlSessionError};
pub use executor::ErrorMode;
pub use results::{Keyed, QueryOptions, QueryResult, ResultMode, Row};
pub use store::{ERROR_SLOT, MemoryStore, ParameterStore};
pub use types::{ConnectMode, KeyCase, RowValues};
