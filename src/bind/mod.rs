// Bind variables - type resolution and the per-call variable registry
//
// - resolver: logical type name + value -> driver bind type and buffer length
// - registry: named variables, LOB staging, OUT value read-back

pub mod registry;
pub mod resolver;

pub use registry::{BoundVariable, BoundVariables, Direction};
pub use resolver::{
    BindType, LogicalType, MAX_CHAR_LENGTH, ResolvedBind, UNBOUNDED_LENGTH, resolve, resolve_name,
};
