//! The two managed resource kinds and the identifiers used to address them.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::http::HttpMethod;

/// Characters escaped when a key is placed in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One of the entity kinds the API manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Department,
    Employee,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Resource::Department => "Department",
            Resource::Employee => "Employee",
        }
    }

    /// Lowercase singular, for log lines.
    pub fn singular(self) -> &'static str {
        match self {
            Resource::Department => "department",
            Resource::Employee => "employee",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Resource::Department => "departments",
            Resource::Employee => "employees",
        }
    }

    /// Departments are patched, employees replaced.
    pub fn update_method(self) -> HttpMethod {
        match self {
            Resource::Department => HttpMethod::Patch,
            Resource::Employee => HttpMethod::Put,
        }
    }

    /// Collection root, relative to the API base address.
    pub fn collection_path(self) -> &'static str {
        match self {
            Resource::Department => "/departments",
            Resource::Employee => "/employees",
        }
    }

    /// Path used to list every record.
    ///
    /// The employee listing lives at `/employees/departments` on the backend,
    /// not at the collection root.
    pub fn list_path(self) -> &'static str {
        match self {
            Resource::Department => "/departments",
            Resource::Employee => "/employees/departments",
        }
    }

    /// Collection root plus the key as one percent-encoded segment.
    pub fn item_path(self, id: &RecordKey) -> String {
        let id = id.to_string();
        format!(
            "{}/{}",
            self.collection_path(),
            utf8_percent_encode(&id, PATH_SEGMENT)
        )
    }

    /// Fallback text for a 409 response without a message.
    pub fn conflict_message(self) -> &'static str {
        match self {
            Resource::Department => "Department name already exists",
            Resource::Employee => "Conflict occurred",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record identifier as supplied by a caller.
///
/// UI code hands over ids both as numbers and as text (route parameters), so
/// both are accepted. In a path the key is always one escaped segment.
/// Matching against a cached record comes in two flavours, see [`RecordKey::matches_coerced`]
/// and [`RecordKey::matches_exact`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Number(i64),
    Text(String),
}

impl RecordKey {
    /// Zero and the empty string do not identify anything.
    pub fn is_present(&self) -> bool {
        match self {
            RecordKey::Number(n) => *n != 0,
            RecordKey::Text(s) => !s.is_empty(),
        }
    }

    /// Leading-integer reading of the key: `"42"` and `" 42abc"` both give 42.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            RecordKey::Number(n) => Some(*n),
            RecordKey::Text(s) => leading_integer(s),
        }
    }

    /// Compares after coercing the key to a number. Used when replacing an
    /// updated record in a cache.
    pub fn matches_coerced(&self, id: i64) -> bool {
        self.as_number() == Some(id)
    }

    /// Compares without coercion: only a numeric key can equal a numeric id.
    /// Used when dropping a deleted record from a cache.
    pub fn matches_exact(&self, id: i64) -> bool {
        matches!(self, RecordKey::Number(n) if *n == id)
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Number(n) => write!(f, "{n}"),
            RecordKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(id: i64) -> Self {
        RecordKey::Number(id)
    }
}

impl From<i32> for RecordKey {
    fn from(id: i32) -> Self {
        RecordKey::Number(i64::from(id))
    }
}

impl From<&str> for RecordKey {
    fn from(id: &str) -> Self {
        RecordKey::Text(id.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(id: String) -> Self {
        RecordKey::Text(id)
    }
}
