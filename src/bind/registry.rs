use crate::driver::{BindValue, Driver, LobId, StatementId};
use crate::error::SqlSessionError;
use crate::store::ParameterStore;
use crate::types::KeyCase;

use super::resolver::{BindType, LogicalType, UNBOUNDED_LENGTH, resolve};

/// Values longer than this are logged as a byte count.
const TRACE_VALUE_LIMIT: usize = 255;

/// Parameter direction, parsed from a string holding `IN` and/or `OUT` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    input: bool,
    output: bool,
}

impl Direction {
    pub const IN: Direction = Direction {
        input: true,
        output: false,
    };
    pub const OUT: Direction = Direction {
        input: false,
        output: true,
    };
    pub const IN_OUT: Direction = Direction {
        input: true,
        output: true,
    };

    /// `"IN"`, `"OUT"`, `"IN_OUT"`, `"in out"`... A string with neither token is `IN`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let upper = text.to_ascii_uppercase();
        let input = upper.contains("IN");
        let output = upper.contains("OUT");
        if input || output {
            Direction { input, output }
        } else {
            Direction::IN
        }
    }

    #[must_use]
    pub fn is_input(self) -> bool {
        self.input
    }

    #[must_use]
    pub fn is_output(self) -> bool {
        self.output
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::IN
    }
}

/// One named variable of a call.
///
/// Before the call `value` holds what the caller bound; after the call it holds the value
/// the driver left in the placeholder, which is how OUT parameters are read back.
#[derive(Debug, Clone)]
pub struct BoundVariable {
    name: String,
    logical_type: LogicalType,
    direction: Direction,
    value: String,
    bound: Option<BindValue>,
    bind_type: Option<BindType>,
    length: i32,
    staged: Option<LobId>,
}

impl BoundVariable {
    fn new(name: &str, logical_type: LogicalType, value: String, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            logical_type,
            direction,
            value,
            bound: None,
            bind_type: None,
            length: 0,
            staged: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Resolved bind type, once the variable has been bound to a statement.
    #[must_use]
    pub fn bind_type(&self) -> Option<BindType> {
        self.bind_type
    }

    #[must_use]
    pub fn length(&self) -> i32 {
        self.length
    }

    /// The temporary LOB backing this variable while a call is in flight.
    #[must_use]
    pub fn staged_lob(&self) -> Option<LobId> {
        self.staged
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    fn trace_value(&self) -> String {
        if self.logical_type == LogicalType::Clob || self.value.len() > TRACE_VALUE_LIMIT {
            format!("<{} bytes>", self.value.len())
        } else {
            format!("{:?}", self.value)
        }
    }
}

/// The variables of one call, passed by `&mut` so OUT values can be read back afterwards.
///
/// ```rust
/// use sql_session::bind::{BoundVariables, LogicalType};
///
/// let mut vars = BoundVariables::new();
/// vars.bind("p1", "text", "hello")
///     .bind_with_direction("total", "", "", "OUT");
/// assert_eq!(vars.len(), 2);
/// assert_eq!(vars.get("p1").unwrap().logical_type(), LogicalType::Text);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BoundVariables {
    vars: Vec<BoundVariable>,
}

impl BoundVariables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an IN variable, replacing any variable of the same name.
    pub fn bind(&mut self, name: &str, type_name: &str, value: impl Into<String>) -> &mut Self {
        self.bind_with_direction(name, type_name, value, "IN")
    }

    /// Register a variable with an explicit direction (`IN`, `OUT`, `IN_OUT`).
    pub fn bind_with_direction(
        &mut self,
        name: &str,
        type_name: &str,
        value: impl Into<String>,
        direction: &str,
    ) -> &mut Self {
        let name = name.trim_start_matches(':');
        let var = BoundVariable::new(
            name,
            LogicalType::from_name(type_name),
            value.into(),
            Direction::parse(direction),
        );
        match self.vars.iter_mut().find(|v| v.name == name) {
            Some(existing) => *existing = var,
            None => self.vars.push(var),
        }
        self
    }

    /// Bind `name` with the value the parameter store holds for it (empty if absent).
    pub fn bind_from_store(
        &mut self,
        store: &dyn ParameterStore,
        name: &str,
        type_name: &str,
    ) -> &mut Self {
        let value = store.get(name).unwrap_or_default();
        self.bind(name, type_name, value)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundVariable> {
        let name = name.trim_start_matches(':');
        self.vars.iter().find(|v| v.name == name)
    }

    /// Value of a variable; after a call this is the OUT value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(BoundVariable::value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundVariable> {
        self.vars.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.vars.iter().map(|v| v.name.as_str()).collect()
    }

    /// OUT and IN_OUT values keyed by variable name in the requested case.
    #[must_use]
    pub fn outputs(&self, case: KeyCase) -> Vec<(String, String)> {
        self.vars
            .iter()
            .filter(|v| v.direction.is_output())
            .map(|v| (case.apply(&v.name), v.value.clone()))
            .collect()
    }

    /// One-line description for the trace log.
    #[must_use]
    pub fn summary(&self) -> String {
        self.vars
            .iter()
            .map(|v| {
                let dir = match (v.direction.is_input(), v.direction.is_output()) {
                    (true, true) => "IN_OUT",
                    (false, true) => "OUT",
                    _ => "IN",
                };
                format!(
                    ":{}[{},{}]={}",
                    v.name,
                    v.logical_type.as_str(),
                    dir,
                    v.trace_value()
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Bind every variable to `stmt`, staging LOB content.
    ///
    /// Whatever happens, [`BoundVariables::release`] must follow; it frees any LOB staged
    /// before a failure.
    pub(crate) fn attach(
        &mut self,
        driver: &mut dyn Driver,
        stmt: StatementId,
    ) -> Result<(), SqlSessionError> {
        for var in &mut self.vars {
            let resolved = resolve(var.logical_type, &var.value);
            var.logical_type = resolved.logical_type;
            var.bind_type = Some(resolved.bind_type);
            var.length = resolved.max_length;

            let bound = if resolved.bind_type.is_lob() {
                let lob = driver.create_temporary_lob().map_err(|source| {
                    SqlSessionError::LobWriteFailed {
                        name: var.name.clone(),
                        source,
                    }
                })?;
                var.staged = Some(lob);
                var.length = UNBOUNDED_LENGTH;
                BindValue::Lob(lob)
            } else {
                BindValue::Text(std::mem::take(&mut var.value))
            };
            var.bound = Some(bound.clone());

            driver
                .bind_by_name(stmt, &var.name, bound, var.length, resolved.bind_type)
                .map_err(SqlSessionError::ExecuteFailed)?;

            if let Some(lob) = var.staged
                && var.direction.is_input()
            {
                driver
                    .write_lob(lob, &var.value)
                    .map_err(|source| SqlSessionError::LobWriteFailed {
                        name: var.name.clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Free staged LOBs and copy each placeholder's current value back into the variable.
    ///
    /// Idempotent: variables already released are skipped.
    pub(crate) fn release(&mut self, driver: &mut dyn Driver, stmt: StatementId) {
        for var in &mut self.vars {
            let staged = var.staged.take();
            let Some(bound) = var.bound.take() else {
                if let Some(lob) = staged {
                    driver.free_lob(lob);
                }
                continue;
            };
            let current = match bound {
                BindValue::Lob(lob) => driver
                    .read_lob(lob)
                    .unwrap_or_else(|| std::mem::take(&mut var.value)),
                BindValue::Text(text) => driver.bound_value(stmt, &var.name).unwrap_or(text),
            };
            if let Some(lob) = staged {
                driver.free_lob(lob);
            }
            var.value = current;
        }
    }
}
