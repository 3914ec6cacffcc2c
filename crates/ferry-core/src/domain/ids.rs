//! Domain identifiers.
//!
//! Task identifiers are chosen by the caller, so unlike generated ids they are
//! plain strings. The newtype keeps them from being mixed up with request
//! payloads or error messages that are also `String`s.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a task, supplied by the caller at `send_task` time.
///
/// The executor does not enforce uniqueness: sending twice with the same id
/// overwrites whatever the storage backend holds for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&TaskId> for TaskId {
    fn from(id: &TaskId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// HashMap<TaskId, _> を &str で引けるようにする
impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
