//! Errors - エラー型と分類
//!
//! - `ExecutorError`: returned synchronously to callers of the executor.
//! - `StorageError`: what a storage backend reports.
//! - `HandlerError`: a handler failure as recorded on the task.
//! - `ConfigError`: config file loading.

use std::time::Duration;

use thiserror::Error;

use super::ids::TaskId;

/// Boxed error returned by handlers. Anything implementing `std::error::Error`
/// (and plain `String` / `&str`) converts into it with `?` or `.into()`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced to executor callers.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The admission buffer stayed full for the whole send timeout.
    /// The task was never created or persisted; retrying later is fine.
    #[error("too many tasks to process: task_id={task_id} was not admitted within {waited:?}")]
    AdmissionTimeout { task_id: TaskId, waited: Duration },

    /// The storage backend failed while looking a task up.
    #[error("lookup failed for task_id={task_id}: {source}")]
    Lookup {
        task_id: TaskId,
        #[source]
        source: StorageError,
    },

    /// No record for the id: unknown, or not admitted yet.
    #[error("task:{0} not found")]
    NotFound(TaskId),

    #[error("task id must not be empty")]
    InvalidTaskId,

    /// The executor was shut down and no longer accepts tasks.
    #[error("executor is shut down")]
    ShutDown,
}

/// Errors reported by a `TaskStorage` implementation.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A handler failure, rebuilt from the message stored on the task record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors while loading an `ExecutorConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_timeout_mentions_capacity_problem() {
        let err = ExecutorError::AdmissionTimeout {
            task_id: TaskId::new("t1"),
            waited: Duration::from_millis(100),
        };
        let msg = err.to_string();
        assert!(msg.contains("too many tasks"));
        assert!(msg.contains("t1"));
    }

    #[test]
    fn lookup_error_keeps_storage_source() {
        let err = ExecutorError::Lookup {
            task_id: TaskId::new("t1"),
            source: StorageError::Backend("connection reset".into()),
        };
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("connection reset"));
    }

    #[test]
    fn handler_error_displays_message_verbatim() {
        let err = HandlerError::new("bad input");
        assert_eq!(err.to_string(), "bad input");
        assert_eq!(err.message(), "bad input");
    }

    #[test]
    fn box_error_accepts_strings() {
        let err: BoxError = "plain message".into();
        assert_eq!(err.to_string(), "plain message");
    }
}
