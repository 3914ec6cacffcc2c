//! Result view handed to callers of `get_result`.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::errors::HandlerError;
use super::ids::TaskId;
use super::record::TaskRecord;
use super::state::TaskStatus;

/// Read-only snapshot of a task, built from a storage lookup.
///
/// The snapshot does not update itself; poll `get_result` again to observe
/// progress.
#[derive(Debug, Clone)]
pub struct TaskResult<Req, Resp> {
    task_id: TaskId,
    status: TaskStatus,
    request: Req,
    response: Option<Resp>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    error_message: String,
    is_error: bool,
}

impl<Req, Resp> TaskResult<Req, Resp> {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn request(&self) -> &Req {
        &self.request
    }

    /// The handler's response; `None` until Done, and after a handler error.
    pub fn response(&self) -> Option<&Resp> {
        self.response.as_ref()
    }

    pub fn into_response(self) -> Option<Resp> {
        self.response
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Handler run time. `None` ("unavailable") unless the task is Done.
    ///
    /// A clock that stepped backwards between start and end yields zero
    /// rather than a negative duration.
    pub fn elapsed(&self) -> Option<Duration> {
        if !self.is_done() {
            return None;
        }
        let (start, end) = (self.start?, self.end?);
        Some((end - start).to_std().unwrap_or(Duration::ZERO))
    }

    /// The handler's error, if it returned one.
    pub fn error(&self) -> Option<HandlerError> {
        self.is_error
            .then(|| HandlerError::new(self.error_message.clone()))
    }
}

impl<Req, Resp> From<TaskRecord<Req, Resp>> for TaskResult<Req, Resp> {
    fn from(record: TaskRecord<Req, Resp>) -> Self {
        Self {
            task_id: record.task_id,
            status: record.status,
            request: record.request,
            response: record.response,
            start: record.start_time,
            end: record.done_time,
            error_message: record.error,
            is_error: record.is_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskId, TaskOptions};
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + millis).unwrap()
    }

    fn record() -> TaskRecord<u32, String> {
        TaskRecord::new(TaskId::new("t1"), 7, TaskOptions::default(), at(0))
    }

    #[test]
    fn elapsed_is_unavailable_before_done() {
        let mut rec = record();
        let view = TaskResult::from(rec.clone());
        assert!(!view.is_done());
        assert_eq!(view.elapsed(), None);

        rec.mark_processing();
        rec.mark_started(at(5));
        let view = TaskResult::from(rec);
        assert_eq!(view.status(), TaskStatus::Processing);
        assert_eq!(view.elapsed(), None);
    }

    #[test]
    fn elapsed_is_end_minus_start_once_done() {
        let mut rec = record();
        rec.mark_processing();
        rec.mark_started(at(10));
        rec.complete(Ok("ok".to_string()), at(260));

        let view = TaskResult::from(rec);
        assert!(view.is_done());
        assert_eq!(view.elapsed(), Some(Duration::from_millis(250)));
        assert_eq!(view.response().map(String::as_str), Some("ok"));
        assert_eq!(view.request(), &7);
        assert!(view.error().is_none());
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let mut rec = record();
        rec.mark_processing();
        rec.mark_started(at(100));
        rec.complete(Ok("ok".to_string()), at(40));

        let view = TaskResult::from(rec);
        assert_eq!(view.elapsed(), Some(Duration::ZERO));
    }

    #[test]
    fn error_is_rebuilt_from_stored_message() {
        let mut rec = record();
        rec.mark_processing();
        rec.mark_started(at(0));
        rec.complete(Err("upstream unavailable".into()), at(1));

        let view = TaskResult::from(rec);
        let err = view.error().unwrap();
        assert_eq!(err.to_string(), "upstream unavailable");
        assert!(view.response().is_none());
        assert_eq!(view.into_response(), None);
    }
}
