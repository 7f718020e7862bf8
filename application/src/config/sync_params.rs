//! Sync parameters: offline retry and edit debounce timing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing for the offline queue and debounced persona edits.
///
/// The retry loop first waits `initial_retry_delay`, then `retry_delay`
/// between every later probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncParams {
    pub initial_retry_delay: Duration,
    pub retry_delay: Duration,
    pub debounce: Duration,
}

impl Default for SyncParams {
    fn default() -> Self {
        Self {
            initial_retry_delay: Duration::from_secs(5),
            retry_delay: Duration::from_secs(10),
            debounce: Duration::from_millis(1000),
        }
    }
}

impl SyncParams {
    /// Endless sequence of waits between reachability probes
    pub fn retry_delays(&self) -> impl Iterator<Item = Duration> + use<> {
        std::iter::once(self.initial_retry_delay).chain(std::iter::repeat(self.retry_delay))
    }

    pub fn with_retry_delays(mut self, initial: Duration, repeat: Duration) -> Self {
        self.initial_retry_delay = initial;
        self.retry_delay = repeat;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delays() {
        let delays: Vec<_> = SyncParams::default().retry_delays().take(3).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(10)
            ]
        );
    }

    #[test]
    fn test_debounce_default() {
        assert_eq!(SyncParams::default().debounce, Duration::from_millis(1000));
    }
}
