//! TaskHandler port - ユーザーが実装する業務ロジック
//!
//! # Cancellation
//! The `TaskContext` passed to a handler carries a cancellation token that
//! fires when the task's execution timeout elapses or when the executor shuts
//! down. Cancellation is advisory: the executor never aborts a running
//! handler, so a handler that ignores the token keeps running and its task
//! stays at Processing until it returns.

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::{BoxError, TaskId};

/// Per-invocation context given to a handler.
#[derive(Debug, Clone)]
pub struct TaskContext {
    task_id: TaskId,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl TaskContext {
    pub fn new(task_id: TaskId, token: CancellationToken, deadline: Option<Instant>) -> Self {
        Self {
            task_id,
            token,
            deadline,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// When the execution timeout fires, if the task has one.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the timeout elapses or the executor shuts down.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// The underlying token, e.g. to hand to a child operation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Runs the business logic for one task.
///
/// Invoked exactly once per admitted task, never retried.
///
/// # 使用例
/// ```ignore
/// struct Echo;
///
/// #[async_trait]
/// impl TaskHandler<String, String> for Echo {
///     async fn handle(&self, _ctx: TaskContext, request: String) -> Result<String, BoxError> {
///         Ok(request)
///     }
/// }
/// ```
#[async_trait]
pub trait TaskHandler<Req, Resp>: Send + Sync {
    async fn handle(&self, ctx: TaskContext, request: Req) -> Result<Resp, BoxError>;
}
