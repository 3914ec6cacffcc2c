//! Impls - 実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryTaskStorage**: 開発用のストレージ
//! - **FnHandler**: async closure を TaskHandler にするアダプタ
//!
//! Production storage backends live outside this crate.

pub mod fn_handler;
pub mod inmem_storage;

pub use self::fn_handler::{FnHandler, handler_fn};
pub use self::inmem_storage::InMemoryTaskStorage;
