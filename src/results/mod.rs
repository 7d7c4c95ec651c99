// Query results - row representation and result shaping
//
// - row: column set shared by a result's rows, and the row itself
// - keyed: insertion-ordered keyed map used by the keyed result modes
// - mode: result modes, per-call options and the shaped result enum
// - transform: turns a fetched cursor into the requested shape

pub mod keyed;
pub mod mode;
pub mod row;
pub(crate) mod transform;

pub use keyed::Keyed;
pub use mode::{QueryOptions, QueryResult, ResultMode};
pub use row::{ColumnSet, Row};
