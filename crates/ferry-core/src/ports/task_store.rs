//! TaskStorage port - タスク記録の正本（source of truth）
//!
//! The executor writes a record three times per task (Init at admission,
//! Processing when picked up, Done when the handler returns) and reads only
//! when a caller asks for a result. It never holds a lock across these calls.

use async_trait::async_trait;

use crate::domain::{StorageError, TaskId, TaskRecord};

/// Persists and retrieves task records by id.
///
/// # Contract
/// - Must be safe under concurrent calls for distinct ids.
/// - Writes for one id arrive sequentially (admission, then the single runner
///   for that task), so per-id serialization is not required.
/// - `get` returns `Ok(None)` for unknown ids; `Err` is reserved for backend
///   failures.
#[async_trait]
pub trait TaskStorage<Req, Resp>: Send + Sync {
    /// Insert or overwrite the record stored under `task_id`.
    async fn set(&self, task_id: &TaskId, record: &TaskRecord<Req, Resp>) -> Result<(), StorageError>;

    async fn get(&self, task_id: &TaskId) -> Result<Option<TaskRecord<Req, Resp>>, StorageError>;
}
