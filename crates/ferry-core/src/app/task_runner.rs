//! TaskRunner - 1 タスク分の実行
//!
//! # フロー
//! 1. (dispatch loop が ExecutionSlot を取得済み)
//! 2. status=Processing を保存（失敗したらここで中断）
//! 3. 実効タイムアウトを決める（タスク個別 > グローバル > 無制限）
//! 4. TaskContext を作って handler を呼ぶ
//! 5. 呼び出し直前/直後に start/done を記録
//! 6. 成功なら response、失敗なら error/is_error
//! 7. status=Done を保存
//! 8. ExecutionSlot を返す（drop）
//!
//! A panic anywhere in 2-7 is caught here, logged with the backtrace taken
//! at the panic site (see `panic_trace`), and the
//! task is given up on: the slot still goes back, but no further writes are
//! made, so the stored record stays wherever it last was (usually
//! Processing).

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::limiter::ExecutionSlot;
use super::panic_trace::{self, TracePanics};
use crate::domain::{Payload, TaskRecord};
use crate::ports::{Clock, TaskContext, TaskHandler, TaskStorage};

pub struct TaskRunner<Req, Resp> {
    handler: Arc<dyn TaskHandler<Req, Resp>>,
    storage: Arc<dyn TaskStorage<Req, Resp>>,
    clock: Arc<dyn Clock>,
    global_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl<Req: Payload, Resp: Payload> TaskRunner<Req, Resp> {
    pub fn new(
        handler: Arc<dyn TaskHandler<Req, Resp>>,
        storage: Arc<dyn TaskStorage<Req, Resp>>,
        clock: Arc<dyn Clock>,
        global_timeout: Option<Duration>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            handler,
            storage,
            clock,
            global_timeout,
            shutdown,
        }
    }

    /// Run one task to completion, holding `slot` for the duration.
    ///
    /// Never panics and never returns an error: every failure ends up either
    /// on the stored record or in the log.
    pub async fn run(&self, record: TaskRecord<Req, Resp>, slot: ExecutionSlot) {
        let task_id = record.task_id.clone();

        panic_trace::install_hook();
        let traced = TracePanics::new(self.execute(record));
        if let Err(panic) = AssertUnwindSafe(traced).catch_unwind().await {
            // catch 直後なので panic したのと同じスレッド
            let backtrace = panic_trace::take_backtrace()
                .map(|bt| bt.to_string())
                .unwrap_or_else(|| "unavailable".to_string());
            error!(
                task_id = %task_id,
                panic = %panic_message(&*panic),
                %backtrace,
                "task runner panicked; task is left without a terminal status"
            );
        }

        // ここで slot を返す（panic しても必ず通る）
        drop(slot);
    }

    async fn execute(&self, mut record: TaskRecord<Req, Resp>) {
        record.mark_processing();
        if let Err(err) = self.storage.set(&record.task_id, &record).await {
            error!(
                task_id = %record.task_id,
                error = %err,
                "failed to persist Processing status; task will not run"
            );
            return;
        }

        let timeout = record.task_options.effective_timeout(self.global_timeout);
        let token = self.shutdown.child_token();
        let deadline = timeout.map(|t| Instant::now() + t);
        if let Some(deadline) = deadline {
            spawn_deadline(token.clone(), deadline);
        }
        // handler が戻ったら token を cancel して deadline タスクを片付ける
        let _cancel_on_exit = token.clone().drop_guard();

        let ctx = TaskContext::new(record.task_id.clone(), token, deadline);
        let request = record.request.clone();

        debug!(task_id = %record.task_id, timeout = ?timeout, "invoking handler");
        record.mark_started(self.clock.now());
        let result = self.handler.handle(ctx, request).await;
        let done_at = self.clock.now();

        if let Err(err) = &result {
            debug!(task_id = %record.task_id, error = %err, "handler returned an error");
        }
        record.complete(result, done_at);

        if let Err(err) = self.storage.set(&record.task_id, &record).await {
            warn!(
                task_id = %record.task_id,
                error = %err,
                "failed to persist Done status"
            );
            return;
        }
        debug!(task_id = %record.task_id, is_error = record.is_error, "task done");
    }
}

/// Cancel `token` at `deadline` unless it is cancelled first.
fn spawn_deadline(token: CancellationToken, deadline: Instant) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => token.cancel(),
            _ = token.cancelled() => {}
        }
    });
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
