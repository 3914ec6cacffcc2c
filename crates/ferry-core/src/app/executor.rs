//! Executor - タスク投入と結果参照の表面
//!
//! # send_task のフロー
//! 1. id を検証（空は不可）
//! 2. Init レコードを作る
//! 3. 受付バッファの枠を予約（send timeout まで待つ）
//! 4. Init を保存（失敗は warn してそのまま続行）
//! 5. 予約した枠にレコードを流す
//!
//! Persisting between reserve and hand-off means the dispatch loop can never
//! see a record whose Init write is still in flight, so a later Processing
//! write is never overwritten by a stale Init.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::admission::{AdmissionError, AdmissionQueue};
use super::limiter::ConcurrencyLimiter;
use crate::domain::{ExecutorError, Payload, TaskId, TaskOptions, TaskRecord, TaskResult};
use crate::ports::{Clock, TaskStorage};

/// A running executor. Build one with [`ExecutorBuilder`](super::ExecutorBuilder).
///
/// `send_task` and `get_result` take `&self`, so share it behind an `Arc`
/// when several callers submit tasks.
pub struct Executor<Req, Resp> {
    admission: AdmissionQueue<Req, Resp>,
    storage: Arc<dyn TaskStorage<Req, Resp>>,
    clock: Arc<dyn Clock>,
    limiter: ConcurrencyLimiter,
    shutdown: CancellationToken,
    dispatch: JoinHandle<()>,
}

impl<Req: Payload, Resp: Payload> Executor<Req, Resp> {
    pub(crate) fn new(
        admission: AdmissionQueue<Req, Resp>,
        storage: Arc<dyn TaskStorage<Req, Resp>>,
        clock: Arc<dyn Clock>,
        limiter: ConcurrencyLimiter,
        shutdown: CancellationToken,
        dispatch: JoinHandle<()>,
    ) -> Self {
        Self {
            admission,
            storage,
            clock,
            limiter,
            shutdown,
            dispatch,
        }
    }

    /// Submit a task for asynchronous execution.
    ///
    /// Returns once the task is admitted, without waiting for it to run.
    /// If the admission buffer stays full for the task's send timeout this
    /// fails with [`ExecutorError::AdmissionTimeout`] and nothing is stored.
    ///
    /// Reusing an id overwrites the earlier record.
    pub async fn send_task(
        &self,
        task_id: impl Into<TaskId>,
        request: Req,
        options: TaskOptions,
    ) -> Result<(), ExecutorError> {
        let task_id = task_id.into();
        if task_id.is_empty() {
            return Err(ExecutorError::InvalidTaskId);
        }
        if self.shutdown.is_cancelled() {
            return Err(ExecutorError::ShutDown);
        }

        let record = TaskRecord::new(task_id, request, options, self.clock.now());
        let wait = options.send_timeout();

        let slot = match self.admission.reserve(wait).await {
            Ok(slot) => slot,
            Err(AdmissionError::TimedOut(waited)) => {
                warn!(
                    task_id = %record.task_id,
                    waited_ms = waited.as_millis() as u64,
                    "admission buffer full; task rejected"
                );
                return Err(ExecutorError::AdmissionTimeout {
                    task_id: record.task_id,
                    waited,
                });
            }
            Err(AdmissionError::Closed) => return Err(ExecutorError::ShutDown),
        };

        if let Err(err) = self.storage.set(&record.task_id, &record).await {
            // Init が保存できなくても実行は続ける（後続の書き込みで上書きされる）
            warn!(
                task_id = %record.task_id,
                error = %err,
                "failed to persist Init status; dispatching anyway"
            );
        }

        debug!(task_id = %record.task_id, "task admitted");
        slot.admit(record);
        Ok(())
    }

    /// Look up the current state of a task.
    ///
    /// Never blocks on the task itself: an admitted task that has not
    /// finished comes back with `is_done() == false`.
    pub async fn get_result(&self, task_id: impl Into<TaskId>) -> Result<TaskResult<Req, Resp>, ExecutorError> {
        let task_id = task_id.into();
        match self.storage.get(&task_id).await {
            Ok(Some(record)) => Ok(TaskResult::from(record)),
            Ok(None) => Err(ExecutorError::NotFound(task_id)),
            Err(source) => Err(ExecutorError::Lookup { task_id, source }),
        }
    }

    /// Stop accepting tasks and cancel the context of every running handler.
    ///
    /// Records still waiting in the admission buffer are abandoned and stay
    /// at Init. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("executor shutting down");
        }
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Execution slots not currently held by a running task.
    pub fn available_slots(&self) -> usize {
        self.limiter.available()
    }

    /// Admission buffer slots in use: records waiting for dispatch plus
    /// sends that have reserved a slot and are still persisting Init.
    pub fn queued(&self) -> usize {
        self.admission.len()
    }

    /// Shut down and wait for the dispatch loop to exit.
    ///
    /// Handlers already running are not awaited; they see a cancelled
    /// context and finish on their own.
    pub async fn shutdown_and_join(mut self) {
        self.shutdown();
        if let Err(err) = (&mut self.dispatch).await {
            warn!(error = %err, "dispatch loop ended abnormally");
        }
    }
}

impl<Req, Resp> Drop for Executor<Req, Resp> {
    fn drop(&mut self) {
        // dispatch loop を止めないと受信側が残り続ける
        self.shutdown.cancel();
    }
}
