//! DispatchLoop - 受付バッファからタスクを取り出して実行に回す
//!
//! # フロー
//! 1. shutdown か次のレコードを待つ（FIFO）
//! 2. ConcurrencyLimiter の slot を取る（これも shutdown と競合させる）
//! 3. TaskRunner を spawn（完了は待たない）
//!
//! Taking the slot here, before spawning, keeps the loop from draining the
//! buffer faster than tasks can run: while the pool is saturated the loop
//! holds at most one record and the rest stay queued, which is what makes
//! `send_task` time out under overload.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::admission::AdmissionReceiver;
use super::limiter::ConcurrencyLimiter;
use super::task_runner::TaskRunner;
use crate::domain::Payload;

pub struct DispatchLoop<Req, Resp> {
    receiver: AdmissionReceiver<Req, Resp>,
    limiter: ConcurrencyLimiter,
    runner: Arc<TaskRunner<Req, Resp>>,
    shutdown: CancellationToken,
}

impl<Req: Payload, Resp: Payload> DispatchLoop<Req, Resp> {
    pub fn new(
        receiver: AdmissionReceiver<Req, Resp>,
        limiter: ConcurrencyLimiter,
        runner: Arc<TaskRunner<Req, Resp>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            limiter,
            runner,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until shutdown is requested or every sender is dropped.
    ///
    /// Records still buffered at that point are dropped without running.
    pub async fn run(mut self) {
        info!(concurrency = self.limiter.capacity(), "dispatch loop started");

        loop {
            let record = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                next = self.receiver.next() => match next {
                    Some(record) => record,
                    // 送信側がすべて drop された
                    None => break,
                },
            };

            let slot = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!(task_id = %record.task_id, "shutdown while waiting for a slot; task abandoned");
                    break;
                }
                slot = self.limiter.acquire() => match slot {
                    Some(slot) => slot,
                    None => break,
                },
            };

            debug!(task_id = %record.task_id, "dispatching task");
            let runner = Arc::clone(&self.runner);
            // runner 側で panic を握りつぶすので JoinHandle は捨ててよい
            tokio::spawn(async move {
                runner.run(record, slot).await;
            });
        }

        info!("dispatch loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::admission;
    use crate::domain::{BoxError, TaskId, TaskOptions, TaskRecord, TaskStatus};
    use crate::impls::{InMemoryTaskStorage, handler_fn};
    use crate::ports::{SystemClock, TaskContext, TaskStorage};
    use chrono::Utc;
    use std::time::Duration;

    fn record(id: &str) -> TaskRecord<String, String> {
        TaskRecord::new(TaskId::new(id), id.to_string(), TaskOptions::default(), Utc::now())
    }

    fn runner(storage: Arc<InMemoryTaskStorage<String, String>>, shutdown: CancellationToken) -> Arc<TaskRunner<String, String>> {
        let handler = handler_fn(|_ctx: TaskContext, req: String| async move {
            if req == "boom" {
                panic!("boom");
            }
            Ok::<_, BoxError>(req)
        });
        Arc::new(TaskRunner::new(
            Arc::new(handler),
            storage,
            Arc::new(SystemClock),
            None,
            shutdown,
        ))
    }

    async fn wait_done(storage: &InMemoryTaskStorage<String, String>, id: &str) -> bool {
        for _ in 0..100 {
            if let Ok(Some(rec)) = storage.get(&TaskId::new(id)).await
                && rec.status == TaskStatus::Done
            {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn loop_keeps_running_after_a_panicking_task() {
        let storage = Arc::new(InMemoryTaskStorage::new());
        let shutdown = CancellationToken::new();
        let (queue, rx) = admission::channel(8);
        let dispatch = DispatchLoop::new(
            rx,
            ConcurrencyLimiter::new(1),
            runner(storage.clone(), shutdown.clone()),
            shutdown.clone(),
        );
        let join = dispatch.spawn();

        for id in ["boom", "after"] {
            queue.reserve(Duration::from_millis(50)).await.unwrap().admit(record(id));
        }

        assert!(wait_done(&storage, "after").await);
        assert!(!join.is_finished());

        shutdown.cancel();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn loop_stops_when_senders_are_dropped() {
        let storage = Arc::new(InMemoryTaskStorage::new());
        let shutdown = CancellationToken::new();
        let (queue, rx) = admission::channel::<String, String>(1);
        let join = DispatchLoop::new(rx, ConcurrencyLimiter::new(1), runner(storage, shutdown.clone()), shutdown)
            .spawn();

        drop(queue);
        tokio::time::timeout(Duration::from_secs(1), join)
            .await
            .expect("loop should exit")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_abandons_buffered_records() {
        let storage = Arc::new(InMemoryTaskStorage::new());
        let shutdown = CancellationToken::new();
        let (queue, rx) = admission::channel(4);
        shutdown.cancel();

        queue.reserve(Duration::from_millis(10)).await.unwrap().admit(record("never"));
        let join = DispatchLoop::new(
            rx,
            ConcurrencyLimiter::new(1),
            runner(storage.clone(), shutdown.clone()),
            shutdown,
        )
        .spawn();
        join.await.unwrap();

        assert!(storage.get(&TaskId::new("never")).await.unwrap().is_none());
        assert!(queue.is_closed());
    }
}
