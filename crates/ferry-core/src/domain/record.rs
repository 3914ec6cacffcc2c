//! Task record: request + lifecycle state + result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::BoxError;
use super::ids::TaskId;
use super::options::TaskOptions;
use super::state::TaskStatus;

/// Bounds shared by request and response payloads.
///
/// Records are cloned into storage and the request is cloned into the handler
/// call, and both cross task boundaries.
pub trait Payload: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Payload for T {}

/// Everything known about one submitted task.
///
/// Design:
/// - The storage backend holds the copy callers read; the executor keeps no
///   index of its own.
/// - Only one unit of control mutates a record at a time: the admission path,
///   then the runner it is handed to.
/// - Transitions go through the `mark_*` / `complete` methods, which ignore
///   out-of-order calls so a Done record never changes again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord<Req, Resp> {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub request: Req,

    /// Set once, when the handler returns successfully.
    pub response: Option<Resp>,

    pub create_time: DateTime<Utc>,

    /// Immediately before the handler is invoked.
    pub start_time: Option<DateTime<Utc>>,

    /// Immediately after the handler returns.
    pub done_time: Option<DateTime<Utc>>,

    /// Handler error message; empty when the handler succeeded.
    pub error: String,
    pub is_error: bool,

    pub task_options: TaskOptions,
}

impl<Req, Resp> TaskRecord<Req, Resp> {
    pub fn new(task_id: TaskId, request: Req, task_options: TaskOptions, now: DateTime<Utc>) -> Self {
        Self {
            task_id,
            status: TaskStatus::Init,
            request,
            response: None,
            create_time: now,
            start_time: None,
            done_time: None,
            error: String::new(),
            is_error: false,
            task_options,
        }
    }

    /// Init -> Processing.
    pub fn mark_processing(&mut self) {
        if self.status.can_transition_to(TaskStatus::Processing) {
            self.status = TaskStatus::Processing;
        }
    }

    /// Stamp the handler start time (only while Processing).
    pub fn mark_started(&mut self, at: DateTime<Utc>) {
        if self.status == TaskStatus::Processing {
            self.start_time = Some(at);
        }
    }

    /// Processing -> Done, recording the handler's result.
    ///
    /// On error the message comes from the error's `Display` and the response
    /// stays empty.
    pub fn complete(&mut self, result: Result<Resp, BoxError>, done_at: DateTime<Utc>) {
        if !self.status.can_transition_to(TaskStatus::Done) {
            return;
        }
        match result {
            Ok(response) => {
                self.response = Some(response);
            }
            Err(err) => {
                self.error = err.to_string();
                self.is_error = true;
            }
        }
        self.done_time = Some(done_at);
        self.status = TaskStatus::Done;
    }
}
