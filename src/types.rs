use clap::ValueEnum;
use serde::{Serialize, Serializer};

/// Values that can be stored in a database row.
///
/// ```rust
/// use sql_session::prelude::*;
///
/// let value = RowValues::Text("alice".into());
/// assert_eq!(value.as_text(), Some("alice"));
/// assert_eq!(RowValues::Int(7).to_key(), "7");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// NULL value
    Null,
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Render the value as a map key. NULL becomes the empty string.
    #[must_use]
    pub fn to_key(&self) -> String {
        match self {
            RowValues::Int(i) => i.to_string(),
            RowValues::Float(f) => f.to_string(),
            RowValues::Text(s) => s.clone(),
            RowValues::Null => String::new(),
            RowValues::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Int(i) => serializer.serialize_i64(*i),
            RowValues::Float(f) => serializer.serialize_f64(*f),
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Null => serializer.serialize_none(),
            RowValues::Blob(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
        }
    }
}

/// Case convention applied to result keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum KeyCase {
    #[default]
    Upper,
    Lower,
}

impl KeyCase {
    /// `lower` (any case) selects lowercase; every other value keeps the upper default.
    #[must_use]
    pub fn from_setting(setting: &str) -> Self {
        if setting.trim().eq_ignore_ascii_case("lower") {
            KeyCase::Lower
        } else {
            KeyCase::Upper
        }
    }

    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            KeyCase::Upper => name.to_uppercase(),
            KeyCase::Lower => name.to_lowercase(),
        }
    }
}

/// How a connection handle is obtained from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum ConnectMode {
    /// A fresh handle on every connect.
    #[default]
    Plain,
    /// Reuse a live handle opened with the same credentials.
    Cached,
    /// Keep the handle in a process-wide registry; it outlives `disconnect`.
    Persistent,
}

impl ConnectMode {
    /// Map the `connectMode` setting; empty or unrecognised values select `Plain`.
    #[must_use]
    pub fn from_setting(setting: &str) -> Self {
        match setting.trim().to_ascii_lowercase().as_str() {
            "cached" => ConnectMode::Cached,
            "persistent" => ConnectMode::Persistent,
            _ => ConnectMode::Plain,
        }
    }
}
