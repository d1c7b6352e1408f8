use std::time::Duration;

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tuning knobs for file hashing and progress polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    pub buffer_size: usize,
    pub poll_interval: Duration,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl HasherConfig {
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = if buffer_size == 0 { DEFAULT_BUFFER_SIZE } else { buffer_size };
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        // tokio::time::interval panics on a zero period
        self.poll_interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        self
    }
}
