//! Session counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters updated by the session worker, readable from any thread.
#[derive(Debug)]
pub struct SessionStats {
    frames_published: AtomicU64,
    empty_ticks: AtomicU64,
    commands_executed: AtomicU64,
    commands_failed: AtomicU64,
    start_time: Instant,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            frames_published: AtomicU64::new(0),
            empty_ticks: AtomicU64::new(0),
            commands_executed: AtomicU64::new(0),
            commands_failed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub(crate) fn record_tick(&self, had_frame: bool) {
        if had_frame {
            self.frames_published.fetch_add(1, Ordering::Relaxed);
        } else {
            self.empty_ticks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_command(&self, succeeded: bool) {
        self.commands_executed.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Ticks that published a frame.
    pub fn frames_published(&self) -> u64 {
        self.frames_published.load(Ordering::Acquire)
    }

    /// Ticks where the engine had no frame.
    pub fn empty_ticks(&self) -> u64 {
        self.empty_ticks.load(Ordering::Acquire)
    }

    pub fn commands_executed(&self) -> u64 {
        self.commands_executed.load(Ordering::Acquire)
    }

    pub fn commands_failed(&self) -> u64 {
        self.commands_failed.load(Ordering::Acquire)
    }

    /// Average published frames per second since the session started.
    pub fn average_fps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.frames_published() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = SessionStats::new();
        stats.record_tick(true);
        stats.record_tick(false);
        stats.record_command(true);
        stats.record_command(false);

        assert_eq!(stats.frames_published(), 1);
        assert_eq!(stats.empty_ticks(), 1);
        assert_eq!(stats.commands_executed(), 2);
        assert_eq!(stats.commands_failed(), 1);
        assert!(stats.average_fps() >= 0.0);
    }
}
