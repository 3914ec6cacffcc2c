//! Domain model (ids, status, records, options, result views, errors).

pub mod errors;
pub mod ids;
pub mod options;
pub mod record;
pub mod result;
pub mod state;

pub use self::errors::{BoxError, ConfigError, ExecutorError, HandlerError, StorageError};
pub use self::ids::TaskId;
pub use self::options::{DEFAULT_SEND_TIMEOUT, TaskOptions};
pub use self::record::{Payload, TaskRecord};
pub use self::result::TaskResult;
pub use self::state::TaskStatus;
