use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::types::Value;

use crate::error::DriverError;

use super::params::value_to_text;

lazy_static! {
    static ref CALL_BLOCK: Regex = Regex::new(
        r"(?is)^\s*BEGIN\s+([A-Za-z][A-Za-z0-9_$#.]*)\s*(?:\((.*)\))?\s*;\s*END\s*;?\s*$"
    )
    .expect("static regex");
}

/// A stored procedure body run in-process against the session's SQLite connection.
pub type Procedure =
    Arc<dyn Fn(&rusqlite::Connection, &mut ProcedureArgs) -> rusqlite::Result<()> + Send + Sync>;

/// `BEGIN name(:a, :b); END;` parsed into the procedure name and its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcedureCall {
    pub name: String,
    pub placeholders: Vec<String>,
}

impl ProcedureCall {
    /// `Ok(None)` when `sql` is not an anonymous call block.
    pub(crate) fn parse(sql: &str) -> Result<Option<Self>, DriverError> {
        let Some(caps) = CALL_BLOCK.captures(sql) else {
            return Ok(None);
        };
        let name = caps[1].to_ascii_uppercase();
        let mut placeholders = Vec::new();
        if let Some(args) = caps.get(2) {
            for arg in args.as_str().split(',').map(str::trim) {
                match arg.strip_prefix(':') {
                    Some(p) if !p.is_empty() => placeholders.push(p.to_string()),
                    _ => {
                        return Err(DriverError::new(
                            6550,
                            format!("PLS-00103: unsupported procedure argument {arg:?}"),
                        ));
                    }
                }
            }
        }
        Ok(Some(Self { name, placeholders }))
    }
}

/// Named arguments of a procedure call, in call order. Values written with
/// [`ProcedureArgs::set`] come back through the OUT placeholders.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct ProcedureArgs {
    args: Vec<(String, String)>,
}

impl ProcedureArgs {
    pub(crate) fn new(args: Vec<(String, String)>) -> Self {
        Self { args }
    }

    /// Value of argument `name`; placeholder names match case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite argument `name` with the text form of `value` (NULL becomes the empty
    /// string). Returns `false` if the call has no such argument.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> bool {
        match self.args.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, slot)) => {
                *slot = value_to_text(&value.into());
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub(crate) fn into_inner(self) -> Vec<(String, String)> {
        self.args
    }
}

impl fmt::Debug for ProcedureArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.args.iter().map(|(n, v)| (n, v.len())))
            .finish()
    }
}
