//! The parameter store collaborator: named scalar values shared with the caller.
//!
//! Besides feeding [`BoundVariables::bind_from_store`](crate::bind::BoundVariables::bind_from_store),
//! the store holds the error slot that receives the structured diagnostic of every
//! failed operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Name of the entry that receives `code - message\nsqltext` diagnostics.
pub const ERROR_SLOT: &str = "DB_ERROR";

pub trait ParameterStore: Send {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: String);
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }
}

impl ParameterStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: String) {
        self.values.insert(name.to_string(), value);
    }
}

impl ParameterStore for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }

    fn set(&mut self, name: &str, value: String) {
        self.insert(name.to_string(), value);
    }
}

/// Lets several connections (and the caller) share one store.
impl<S: ParameterStore> ParameterStore for Arc<Mutex<S>> {
    fn get(&self, name: &str) -> Option<String> {
        let guard = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(name)
    }

    fn set(&mut self, name: &str, value: String) {
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.set(name, value);
    }
}
