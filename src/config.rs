//! Connection settings supplied by the configuration collaborator.
//!
//! A configuration source hands out named sections of string settings. The keys understood
//! here are `connectMode`, `username`, `password`, `connection`, `characterSet`,
//! `autoCommit`, `connectSQL`, `caseQuery` and `caseStoredProcedure`.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::SqlSessionError;
use crate::types::{ConnectMode, KeyCase};

/// Statement injected at connect time when `connectSQL` does not set a date format.
pub const DEFAULT_DATE_FORMAT_SQL: &str =
    "ALTER SESSION SET NLS_DATE_FORMAT = 'YYYY-MM-DD HH24:MI:SS'";

lazy_static! {
    static ref DATE_FORMAT_SETTING: Regex =
        Regex::new(r"(?i)\bNLS_DATE_FORMAT\b").expect("static regex");
}

/// Supplies named configuration sections.
pub trait ConfigSource: Send {
    fn section(&self, name: &str) -> Option<HashMap<String, String>>;
}

impl ConfigSource for HashMap<String, HashMap<String, String>> {
    fn section(&self, name: &str) -> Option<HashMap<String, String>> {
        self.get(name).cloned()
    }
}

/// A JSON document whose top-level keys are section names.
///
/// ```rust
/// use sql_session::config::{ConfigSource, JsonConfig};
///
/// let cfg = JsonConfig::from_str(r#"{"main": {"connection": ":memory:", "autoCommit": false}}"#)?;
/// let section = cfg.section("main").unwrap();
/// assert_eq!(section["autoCommit"], "false");
/// # Ok::<(), sql_session::SqlSessionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonConfig(JsonValue);

impl JsonConfig {
    /// Parse a JSON configuration document.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConfigError` if the text is not a JSON object.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self, SqlSessionError> {
        let value: JsonValue = serde_json::from_str(text)
            .map_err(|e| SqlSessionError::ConfigError(format!("invalid JSON config: {e}")))?;
        if !value.is_object() {
            return Err(SqlSessionError::ConfigError(
                "JSON config must be an object of sections".into(),
            ));
        }
        Ok(Self(value))
    }
}

impl ConfigSource for JsonConfig {
    fn section(&self, name: &str) -> Option<HashMap<String, String>> {
        let object = self.0.get(name)?.as_object()?;
        Some(
            object
                .iter()
                .map(|(key, value)| {
                    let text = match value {
                        JsonValue::String(s) => s.clone(),
                        JsonValue::Null => String::new(),
                        other => other.to_string(),
                    };
                    (key.clone(), text)
                })
                .collect(),
        )
    }
}

/// One connection section.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    pub connect_mode: String,
    pub username: String,
    pub password: String,
    pub connection: String,
    pub character_set: String,
    pub auto_commit: String,
    #[serde(rename = "connectSQL")]
    pub connect_sql: String,
    pub case_query: String,
    pub case_stored_procedure: String,
}

impl ConnectionConfig {
    /// Build the settings from a string section. Unknown keys are ignored; missing keys
    /// are empty.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConfigError` if `autoCommit` is neither `true`, `false` nor empty.
    pub fn from_section(section: &HashMap<String, String>) -> Result<Self, SqlSessionError> {
        let config: Self = serde_json::to_value(section)
            .and_then(serde_json::from_value)
            .map_err(|e| SqlSessionError::ConfigError(e.to_string()))?;
        config.auto_commit()?;
        Ok(config)
    }

    #[must_use]
    pub fn connect_mode(&self) -> ConnectMode {
        ConnectMode::from_setting(&self.connect_mode)
    }

    /// Autocommit is on unless the section says `false`.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConfigError` for values other than `true`/`false`/empty.
    pub fn auto_commit(&self) -> Result<bool, SqlSessionError> {
        match self.auto_commit.trim().to_ascii_lowercase().as_str() {
            "" | "true" => Ok(true),
            "false" => Ok(false),
            other => Err(SqlSessionError::ConfigError(format!(
                "autoCommit must be true or false, got {other:?}"
            ))),
        }
    }

    #[must_use]
    pub fn query_case(&self) -> KeyCase {
        KeyCase::from_setting(&self.case_query)
    }

    #[must_use]
    pub fn procedure_case(&self) -> KeyCase {
        KeyCase::from_setting(&self.case_stored_procedure)
    }

    /// Session initialisation statements in execution order.
    ///
    /// `connectSQL` is split on `;`; blank entries are dropped. The default date-format
    /// statement leads the list unless one of the entries already sets `NLS_DATE_FORMAT`.
    #[must_use]
    pub fn session_statements(&self) -> Vec<String> {
        let mut statements: Vec<String> = self
            .connect_sql
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !statements.iter().any(|s| DATE_FORMAT_SETTING.is_match(s)) {
            statements.insert(0, DEFAULT_DATE_FORMAT_SQL.to_string());
        }
        statements
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("connect_mode", &self.connect_mode)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connection", &self.connection)
            .field("character_set", &self.character_set)
            .field("auto_commit", &self.auto_commit)
            .field("connect_sql", &self.connect_sql)
            .field("case_query", &self.case_query)
            .field("case_stored_procedure", &self.case_stored_procedure)
            .finish()
    }
}
