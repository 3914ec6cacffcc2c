//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて Executor を実装します。
//!
//! # 主要コンポーネント
//! - **ExecutorBuilder**: 設定とワイヤリング
//! - **Executor**: send_task / get_result の表面
//! - **Admission queue**: 受付バッファ（send timeout 付き）
//! - **ConcurrencyLimiter**: 同時実行数の上限
//! - **DispatchLoop**: バッファ → slot 取得 → runner の spawn
//! - **TaskRunner**: 1 タスク分の実行（timeout, panic 捕捉, 状態保存）

pub mod admission;
pub mod builder;
pub mod config;
pub mod dispatch_loop;
pub mod executor;
pub mod limiter;
pub mod panic_trace;
pub mod task_runner;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ExecutorBuilder};
pub use self::config::{DEFAULT_CONCURRENCY, DEFAULT_TASK_BUFFER, ExecutorConfig};
pub use self::dispatch_loop::DispatchLoop;
pub use self::executor::Executor;
pub use self::limiter::{ConcurrencyLimiter, ExecutionSlot};
pub use self::task_runner::TaskRunner;
