//! Polling until a condition holds.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.async_timeout(),
            interval: config.poll_interval(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from_config(&Config::defaults())
    }
}

/// Call `check` until it succeeds or `options.timeout` elapses.
///
/// `check` runs at least once. On timeout the last error is returned.
pub async fn wait_for<T, E, F>(mut check: F, options: WaitOptions) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
{
    let deadline = Instant::now() + options.timeout;
    let mut attempts = 0usize;
    loop {
        attempts += 1;
        let err = match check() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if Instant::now() >= deadline {
            tracing::debug!(attempts, timeout = ?options.timeout, "wait_for timed out");
            return Err(err);
        }
        sleep(options.interval).await;
    }
}
