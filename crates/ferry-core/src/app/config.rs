//! ExecutorConfig - 起動時の設定
//!
//! ```toml
//! concurrency = 20
//! task_buffer = 100
//! task_timeout_ms = 30000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_TASK_BUFFER: usize = 100;

/// Executor-wide settings.
///
/// Zero counts mean "use the default", matching what an empty config file
/// produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Max handler invocations running at once.
    pub concurrency: usize,

    /// Capacity of the admission buffer.
    pub task_buffer: usize,

    /// Global execution timeout in milliseconds. Absent means unbounded.
    pub task_timeout_ms: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            task_buffer: DEFAULT_TASK_BUFFER,
            task_timeout_ms: None,
        }
    }
}

impl ExecutorConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn concurrency(&self) -> usize {
        if self.concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            self.concurrency
        }
    }

    pub fn task_buffer(&self) -> usize {
        if self.task_buffer == 0 {
            DEFAULT_TASK_BUFFER
        } else {
            self.task_buffer
        }
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_documented_values() {
        let config = ExecutorConfig::default();
        assert_eq!(config.concurrency(), 20);
        assert_eq!(config.task_buffer(), 100);
        assert_eq!(config.task_timeout(), None);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ExecutorConfig::from_toml("").unwrap();
        assert_eq!(config, ExecutorConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let config = ExecutorConfig::from_toml(
            r#"
            concurrency = 4
            task_buffer = 8
            task_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.concurrency(), 4);
        assert_eq!(config.task_buffer(), 8);
        assert_eq!(config.task_timeout(), Some(Duration::from_millis(250)));
    }

    #[rstest]
    #[case("concurrency = 0", 20, 100)]
    #[case("task_buffer = 0", 20, 100)]
    #[case("concurrency = 1\ntask_buffer = 2", 1, 2)]
    fn zero_counts_fall_back_to_defaults(
        #[case] toml: &str,
        #[case] concurrency: usize,
        #[case] task_buffer: usize,
    ) {
        let config = ExecutorConfig::from_toml(toml).unwrap();
        assert_eq!(config.concurrency(), concurrency);
        assert_eq!(config.task_buffer(), task_buffer);
    }

    #[test]
    fn zero_timeout_means_unbounded() {
        let config = ExecutorConfig::from_toml("task_timeout_ms = 0").unwrap();
        assert_eq!(config.task_timeout(), None);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = ExecutorConfig::from_toml("concurrency = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ExecutorConfig::from_file("/definitely/not/here/ferry.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
