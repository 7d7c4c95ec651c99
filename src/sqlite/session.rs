use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use tracing::debug;

use crate::driver::Credentials;
use crate::error::DriverError;
use crate::types::ConnectMode;

use super::params::driver_error;

const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD HH24:MI:SS";

lazy_static! {
    static ref ALTER_SESSION: Regex = Regex::new(
        r"(?is)^\s*ALTER\s+SESSION\s+SET\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*'((?:[^']|'')*)'\s*;?\s*$"
    )
    .expect("static regex");
    static ref DATE_TOKEN: Regex =
        Regex::new(r"(?i)YYYY|HH24|HH12|HH|MI|SS|MONTH|MON|MM|DD|DY|YY|AM|PM").expect("static regex");

    /// Handles kept open across connects, keyed by `username@descriptor`.
    static ref PERSISTENT: Mutex<HashMap<String, Arc<SqliteHandle>>> = Mutex::new(HashMap::new());
    /// Handles reused while some session still holds them.
    static ref CACHED: Mutex<HashMap<String, Weak<SqliteHandle>>> = Mutex::new(HashMap::new());
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// `ALTER SESSION SET name = 'value'`, if `sql` is one.
pub(crate) fn parse_alter_session(sql: &str) -> Option<(String, String)> {
    let caps = ALTER_SESSION.captures(sql)?;
    Some((caps[1].to_ascii_uppercase(), caps[2].replace("''", "'")))
}

/// Translate a date format model (`YYYY-MM-DD HH24:MI:SS`) into a chrono format string.
pub(crate) fn chrono_format(model: &str) -> String {
    let mut out = String::with_capacity(model.len());
    let mut last = 0;
    for m in DATE_TOKEN.find_iter(model) {
        out.push_str(&model[last..m.start()].replace('%', "%%"));
        let directive = match m.as_str().to_ascii_uppercase().as_str() {
            "YYYY" => "%Y",
            "YY" => "%y",
            "MM" => "%m",
            "MON" => "%b",
            "MONTH" => "%B",
            "DD" => "%d",
            "DY" => "%a",
            "HH24" => "%H",
            "HH" | "HH12" => "%I",
            "MI" => "%M",
            "SS" => "%S",
            _ => "%p",
        };
        out.push_str(directive);
        last = m.end();
    }
    out.push_str(&model[last..].replace('%', "%%"));
    out
}

/// One open SQLite database plus the session parameters set on it.
///
/// SQL sees the parameters through `session_parameter(name)`, and `sysdate()` formats the
/// current time with `NLS_DATE_FORMAT`.
pub(crate) struct SqliteHandle {
    key: String,
    conn: Mutex<rusqlite::Connection>,
    date_format: Arc<Mutex<String>>,
    parameters: Arc<Mutex<HashMap<String, String>>>,
}

impl SqliteHandle {
    fn open(key: String, path: &str) -> Result<Self, DriverError> {
        let conn = if path.is_empty() || path == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(path)
        }
        .map_err(|e| driver_error(&e))?;

        let date_format = Arc::new(Mutex::new(chrono_format(DEFAULT_DATE_FORMAT)));
        let format = Arc::clone(&date_format);
        conn.create_scalar_function(
            "sysdate",
            0,
            FunctionFlags::SQLITE_UTF8,
            move |_ctx| {
                let fmt = lock(&format).clone();
                Ok(Local::now().format(&fmt).to_string())
            },
        )
        .map_err(|e| driver_error(&e))?;

        let parameters = Arc::new(Mutex::new(HashMap::new()));
        let lookup = Arc::clone(&parameters);
        conn.create_scalar_function(
            "session_parameter",
            1,
            FunctionFlags::SQLITE_UTF8,
            move |ctx| {
                let name = ctx.get::<String>(0)?.to_ascii_uppercase();
                Ok(lock(&lookup).get(&name).cloned())
            },
        )
        .map_err(|e| driver_error(&e))?;
        conn.execute_batch("CREATE TEMP VIEW IF NOT EXISTS dual AS SELECT 'X' AS dummy;")
            .map_err(|e| driver_error(&e))?;

        Ok(Self {
            key,
            conn: Mutex::new(conn),
            date_format,
            parameters,
        })
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, rusqlite::Connection> {
        lock(&self.conn)
    }

    /// Record a session parameter; `NLS_DATE_FORMAT` also changes what `sysdate()` returns.
    pub(crate) fn set_parameter(&self, name: &str, value: &str) {
        if name == "NLS_DATE_FORMAT" {
            *lock(&self.date_format) = chrono_format(value);
        }
        lock(&self.parameters).insert(name.to_string(), value.to_string());
    }
}

/// Open (or reuse) the handle for `credentials` under `mode`.
pub(crate) fn acquire(
    credentials: &Credentials,
    mode: ConnectMode,
) -> Result<Arc<SqliteHandle>, DriverError> {
    let key = format!("{}@{}", credentials.username, credentials.descriptor);
    match mode {
        ConnectMode::Plain => Ok(Arc::new(SqliteHandle::open(key, &credentials.descriptor)?)),
        ConnectMode::Cached => {
            let mut cached = lock(&CACHED);
            if let Some(handle) = cached.get(&key).and_then(Weak::upgrade) {
                debug!(target: "sql_session::sqlite", %key, "reusing cached handle");
                return Ok(handle);
            }
            let handle = Arc::new(SqliteHandle::open(key.clone(), &credentials.descriptor)?);
            cached.insert(key, Arc::downgrade(&handle));
            Ok(handle)
        }
        ConnectMode::Persistent => {
            let mut persistent = lock(&PERSISTENT);
            if let Some(handle) = persistent.get(&key) {
                debug!(target: "sql_session::sqlite", %key, "reusing persistent handle");
                return Ok(Arc::clone(handle));
            }
            let handle = Arc::new(SqliteHandle::open(key.clone(), &credentials.descriptor)?);
            persistent.insert(key, Arc::clone(&handle));
            Ok(handle)
        }
    }
}

/// Number of persistent handles currently held open.
#[must_use]
pub fn persistent_handle_count() -> usize {
    lock(&PERSISTENT).len()
}

/// Close every persistent handle not in use by a live session.
pub fn close_persistent_handles() {
    lock(&PERSISTENT).retain(|_, handle| Arc::strong_count(handle) > 1);
}
