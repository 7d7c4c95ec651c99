// SQLite backend - a Driver over rusqlite
//
// - session: opened handles, the cached/persistent handle registries, session parameters
// - params: bind values in, column values out, error mapping
// - procedure: anonymous call blocks dispatched to registered procedures
// - driver: the statement/LOB bookkeeping behind the Driver trait

mod driver;
mod params;
mod procedure;
mod session;

pub use driver::{SqliteConnector, SqliteDriver};
pub use procedure::{Procedure, ProcedureArgs};
pub use session::{close_persistent_handles, persistent_handle_count};
