//! Messaging configuration.
//!
//! Values come from environment variables; anything unset falls back to the
//! defaults below.
//!
//! | variable | default |
//! |----------|---------|
//! | `SWITCHYARD_COMMAND_CHANNEL` | `commands` |
//! | `SWITCHYARD_EVENT_CHANNEL` | `events` |
//! | `SWITCHYARD_POLL_INTERVAL_MS` | `100` |
//! | `SWITCHYARD_WORKER_BATCH_SIZE` | `32` |

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the command channel.
pub const COMMAND_CHANNEL_VAR: &str = "SWITCHYARD_COMMAND_CHANNEL";
/// Environment variable naming the event channel.
pub const EVENT_CHANNEL_VAR: &str = "SWITCHYARD_EVENT_CHANNEL";
/// Environment variable for the worker poll interval in milliseconds.
pub const POLL_INTERVAL_VAR: &str = "SWITCHYARD_POLL_INTERVAL_MS";
/// Environment variable for the worker batch size.
pub const BATCH_SIZE_VAR: &str = "SWITCHYARD_WORKER_BATCH_SIZE";

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// A variable does not parse as the expected type.
    #[error("{key} must be a valid {expected}: {value:?}")]
    Invalid {
        /// The offending variable.
        key: &'static str,
        /// What the value should have been.
        expected: &'static str,
        /// The value found.
        value: String,
    },
}

/// Channel names and worker settings for queueing buses and dispatchers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Channel that queueing command buses write to.
    pub command_channel: String,
    /// Channel that queueing event dispatchers write to.
    pub event_channel: String,
    /// Delay between worker polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum messages a worker handles per poll.
    pub worker_batch_size: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            command_channel: "commands".to_owned(),
            event_channel: "events".to_owned(),
            poll_interval_ms: 100,
            worker_batch_size: 32,
        }
    }
}

impl MessagingConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for empty or unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for empty or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            command_channel: channel(&lookup, COMMAND_CHANNEL_VAR)?
                .unwrap_or(defaults.command_channel),
            event_channel: channel(&lookup, EVENT_CHANNEL_VAR)?.unwrap_or(defaults.event_channel),
            poll_interval_ms: number(&lookup, POLL_INTERVAL_VAR, "u64")?
                .unwrap_or(defaults.poll_interval_ms),
            worker_batch_size: number(&lookup, BATCH_SIZE_VAR, "usize")?
                .unwrap_or(defaults.worker_batch_size),
        };
        if config.worker_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: BATCH_SIZE_VAR,
                expected: "positive usize",
                value: "0".to_owned(),
            });
        }
        Ok(config)
    }

    /// Worker poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn channel<F>(lookup: &F, key: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty(key)),
        Some(value) => Ok(Some(value.trim().to_owned())),
    }
}

fn number<F, T>(lookup: &F, key: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key,
                expected,
                value,
            }),
    }
}
