/// Size of the driver's character bind buffer.
pub const CHAR_BUFFER_SIZE: i32 = 32766;

/// Longest character value bound inline; half the buffer to leave room for multi-byte text.
pub const MAX_CHAR_LENGTH: i32 = CHAR_BUFFER_SIZE / 2;

/// Length sentinel for binds whose size the driver determines.
pub const UNBOUNDED_LENGTH: i32 = -1;

/// Declared type of a bind variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicalType {
    #[default]
    Text,
    Clob,
    RowId,
    Cursor,
}

impl LogicalType {
    /// Case-insensitive; names other than `clob`, `rowid` and `cursor` mean text.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "clob" => LogicalType::Clob,
            "rowid" => LogicalType::RowId,
            "cursor" => LogicalType::Cursor,
            _ => LogicalType::Text,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalType::Text => "text",
            LogicalType::Clob => "clob",
            LogicalType::RowId => "rowid",
            LogicalType::Cursor => "cursor",
        }
    }
}

/// Driver bind type. [`BindType::code`] is the OCI external type number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindType {
    Chr,
    RowId,
    Clob,
    Cursor,
}

impl BindType {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            BindType::Chr => 1,
            BindType::RowId => 104,
            BindType::Clob => 112,
            BindType::Cursor => 116,
        }
    }

    #[must_use]
    pub const fn is_lob(self) -> bool {
        matches!(self, BindType::Clob)
    }
}

/// Outcome of resolving one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBind {
    /// Effective logical type (an empty `clob` becomes `text`).
    pub logical_type: LogicalType,
    pub bind_type: BindType,
    pub max_length: i32,
}

/// Map a logical type and value to the driver bind type and buffer length.
#[must_use]
pub fn resolve(logical_type: LogicalType, value: &str) -> ResolvedBind {
    // An empty CLOB locator cannot be bound; send it as plain text.
    let logical_type = if logical_type == LogicalType::Clob && value.is_empty() {
        LogicalType::Text
    } else {
        logical_type
    };
    let (bind_type, max_length) = match logical_type {
        LogicalType::Text => (BindType::Chr, MAX_CHAR_LENGTH),
        LogicalType::Clob => (BindType::Clob, UNBOUNDED_LENGTH),
        LogicalType::RowId => (BindType::RowId, UNBOUNDED_LENGTH),
        LogicalType::Cursor => (BindType::Cursor, UNBOUNDED_LENGTH),
    };
    ResolvedBind {
        logical_type,
        bind_type,
        max_length,
    }
}

/// [`resolve`] from a type name; an empty name is text.
#[must_use]
pub fn resolve_name(type_name: &str, value: &str) -> ResolvedBind {
    resolve(LogicalType::from_name(type_name), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_names_resolve_to_bounded_chr() {
        for name in ["", "text", "varchar2", "NUMBER", "date", "blob", "clobber"] {
            let r = resolve_name(name, "x");
            assert_eq!(r.bind_type, BindType::Chr, "type name {name:?}");
            assert_eq!(r.max_length, 16383);
            assert_eq!(r.logical_type, LogicalType::Text);
        }
    }

    #[test]
    fn special_names_resolve_unbounded() {
        assert_eq!(resolve_name("clob", "x").bind_type, BindType::Clob);
        assert_eq!(resolve_name("ROWID", "x").bind_type, BindType::RowId);
        assert_eq!(resolve_name("Cursor", "").bind_type, BindType::Cursor);
        for name in ["clob", "rowid", "cursor"] {
            assert_eq!(resolve_name(name, "x").max_length, UNBOUNDED_LENGTH);
        }
    }

    #[test]
    fn empty_clob_binds_as_text() {
        let r = resolve(LogicalType::Clob, "");
        assert_eq!(r.logical_type, LogicalType::Text);
        assert_eq!(r.bind_type, BindType::Chr);
        assert_eq!(r.max_length, MAX_CHAR_LENGTH);
    }

    #[test]
    fn codes_match_oci_numbering() {
        assert_eq!(BindType::Chr.code(), 1);
        assert_eq!(BindType::RowId.code(), 104);
        assert_eq!(BindType::Clob.code(), 112);
        assert_eq!(BindType::Cursor.code(), 116);
        assert!(BindType::Clob.is_lob());
        assert!(!BindType::RowId.is_lob());
    }
}
