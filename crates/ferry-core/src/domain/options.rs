//! Per-task options given to `send_task`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long `send_task` waits for buffer space when none is given.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// Options for a single task.
///
/// Zero durations mean "not set": a zero send timeout falls back to
/// [`DEFAULT_SEND_TIMEOUT`], a zero execution timeout falls back to the
/// executor-wide timeout.
///
/// ```ignore
/// let opts = TaskOptions::new()
///     .with_send_timeout(Duration::from_millis(500))
///     .with_timeout(Duration::from_secs(3));
/// executor.send_task("t1", req, opts).await?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOptions {
    send_timeout: Duration,
    timeout: Option<Duration>,
}

impl TaskOptions {
    pub fn new() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            timeout: None,
        }
    }

    /// Bound on how long admission may wait before the send is rejected.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Bound on handler run time for this task, overriding the global one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn send_timeout(&self) -> Duration {
        if self.send_timeout.is_zero() {
            DEFAULT_SEND_TIMEOUT
        } else {
            self.send_timeout
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }

    /// Per-task timeout if set, else the global one if set, else unbounded.
    pub fn effective_timeout(&self, global: Option<Duration>) -> Option<Duration> {
        self.timeout().or(global.filter(|t| !t.is_zero()))
    }
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MS10: Duration = Duration::from_millis(10);
    const MS50: Duration = Duration::from_millis(50);

    #[test]
    fn defaults_to_100ms_send_timeout_and_no_execution_timeout() {
        let opts = TaskOptions::default();
        assert_eq!(opts.send_timeout(), Duration::from_millis(100));
        assert_eq!(opts.timeout(), None);
    }

    #[test]
    fn zero_send_timeout_falls_back_to_default() {
        let opts = TaskOptions::new().with_send_timeout(Duration::ZERO);
        assert_eq!(opts.send_timeout(), DEFAULT_SEND_TIMEOUT);
    }

    #[rstest]
    #[case(None, None, None)]
    #[case(None, Some(MS50), Some(MS50))]
    #[case(Some(MS10), None, Some(MS10))]
    #[case(Some(MS10), Some(MS50), Some(MS10))]
    #[case(Some(Duration::ZERO), Some(MS50), Some(MS50))]
    #[case(Some(Duration::ZERO), Some(Duration::ZERO), None)]
    fn effective_timeout_prefers_per_task_value(
        #[case] per_task: Option<Duration>,
        #[case] global: Option<Duration>,
        #[case] expected: Option<Duration>,
    ) {
        let mut opts = TaskOptions::new();
        if let Some(t) = per_task {
            opts = opts.with_timeout(t);
        }
        assert_eq!(opts.effective_timeout(global), expected);
    }
}
