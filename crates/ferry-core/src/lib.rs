//! ferry-core
//!
//! In-process asynchronous task executor.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, state, options, record, result, errors）
//! - **ports**: 抽象化レイヤー（TaskHandler, TaskStorage, Clock）
//! - **app**: アプリケーションロジック（builder, executor, dispatch_loop, task_runner, など）
//! - **impls**: 実装（InMemoryTaskStorage, FnHandler）
//!
//! # 使用例
//! ```ignore
//! let storage = Arc::new(InMemoryTaskStorage::<String, String>::new());
//! let handler = handler_fn(|_ctx: TaskContext, name: String| async move {
//!     Ok::<_, BoxError>(format!("hello, {name}"))
//! });
//! let executor = ExecutorBuilder::new(Arc::new(handler), storage).build()?;
//!
//! executor.send_task("t1", "world".to_string(), TaskOptions::default()).await?;
//! let result = executor.get_result("t1").await?;
//! ```

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;

pub use app::{BuildError, Executor, ExecutorBuilder, ExecutorConfig};
pub use domain::{
    BoxError, ExecutorError, HandlerError, StorageError, TaskId, TaskOptions, TaskRecord, TaskResult, TaskStatus,
};
pub use impls::{InMemoryTaskStorage, handler_fn};
pub use ports::{Clock, TaskContext, TaskHandler, TaskStorage};
