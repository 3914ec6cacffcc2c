//! Ports - 抽象化レイヤー
//!
//! Interfaces the executor calls but does not implement:
//! - **TaskStorage**: persistence of task records (source of truth)
//! - **TaskHandler**: the business logic run for each task
//! - **Clock**: where timestamps come from

pub mod clock;
pub mod handler;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::handler::{TaskContext, TaskHandler};
pub use self::task_store::TaskStorage;
