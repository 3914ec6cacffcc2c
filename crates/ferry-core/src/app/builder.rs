//! ExecutorBuilder - Executor の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（tokio runtime がなければ build で失敗させる）
//! - 設定ファイルと個別指定の両方を受け付ける

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::admission;
use super::config::ExecutorConfig;
use super::dispatch_loop::DispatchLoop;
use super::executor::Executor;
use super::limiter::ConcurrencyLimiter;
use super::task_runner::TaskRunner;
use crate::domain::Payload;
use crate::ports::{Clock, SystemClock, TaskHandler, TaskStorage};

/// ExecutorBuilder は Executor を構築
///
/// # 使用例
/// ```ignore
/// let executor = ExecutorBuilder::new(Arc::new(handler), Arc::new(InMemoryTaskStorage::new()))
///     .concurrency(4)
///     .task_timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub struct ExecutorBuilder<Req, Resp> {
    handler: Arc<dyn TaskHandler<Req, Resp>>,
    storage: Arc<dyn TaskStorage<Req, Resp>>,
    clock: Arc<dyn Clock>,
    config: ExecutorConfig,
    /// Set through `task_timeout`; wins over `config.task_timeout_ms`.
    task_timeout: Option<Duration>,
    parent_token: Option<CancellationToken>,
}

/// BuildError は Executor 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("ExecutorBuilder::build must be called from within a tokio runtime")]
    NoRuntime,
}

impl<Req: Payload, Resp: Payload> ExecutorBuilder<Req, Resp> {
    pub fn new(handler: Arc<dyn TaskHandler<Req, Resp>>, storage: Arc<dyn TaskStorage<Req, Resp>>) -> Self {
        Self {
            handler,
            storage,
            clock: Arc::new(SystemClock),
            config: ExecutorConfig::default(),
            task_timeout: None,
            parent_token: None,
        }
    }

    /// Replace every setting with `config`. Later setters still apply on top.
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self.task_timeout = None;
        self
    }

    /// 同時実行数（0 はデフォルト）
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// 受付バッファの容量（0 はデフォルト）
    pub fn task_buffer(mut self, task_buffer: usize) -> Self {
        self.config.task_buffer = task_buffer;
        self
    }

    /// Global execution timeout, used by tasks that don't set their own.
    ///
    /// Kept at full precision; zero means unbounded.
    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Tie the executor's lifetime to an outer token: cancelling `parent`
    /// shuts the executor down. Shutting the executor down leaves `parent`
    /// alone.
    pub fn shutdown_token(mut self, parent: CancellationToken) -> Self {
        self.parent_token = Some(parent);
        self
    }

    /// Wire everything up and start the dispatch loop.
    ///
    /// # 検証
    /// - tokio runtime の中で呼ばれているか（dispatch loop を spawn するため）
    pub fn build(self) -> Result<Executor<Req, Resp>, BuildError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let concurrency = self.config.concurrency();
        let task_buffer = self.config.task_buffer();
        let task_timeout = match self.task_timeout {
            Some(timeout) => Some(timeout).filter(|t| !t.is_zero()),
            None => self.config.task_timeout(),
        };

        let shutdown = match &self.parent_token {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let (queue, receiver) = admission::channel(task_buffer);
        let limiter = ConcurrencyLimiter::new(concurrency);
        let runner = Arc::new(TaskRunner::new(
            self.handler,
            Arc::clone(&self.storage),
            Arc::clone(&self.clock),
            task_timeout,
            shutdown.clone(),
        ));

        let dispatch = DispatchLoop::new(receiver, limiter.clone(), runner, shutdown.clone());
        let join = runtime.spawn(dispatch.run());

        info!(
            concurrency,
            task_buffer,
            ?task_timeout,
            "executor started"
        );

        Ok(Executor::new(queue, self.storage, self.clock, limiter, shutdown, join))
    }
}
