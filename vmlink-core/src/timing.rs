//! Named stopwatch for timing remote calls

use std::time::{Duration, Instant};
use tracing::debug;

/// Measures how long a named operation takes
#[derive(Debug)]
pub struct Stopwatch {
    label: String,
    started: Instant,
}

impl Stopwatch {
    /// Start timing `label`
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }

    /// Time elapsed since start
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Log the elapsed time at debug level and return it
    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        debug!(
            operation = %self.label,
            elapsed_ms = elapsed.as_millis() as u64,
            "{} completed in {:.2}s",
            self.label,
            elapsed.as_secs_f64()
        );
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let watch = Stopwatch::start("probe");
        let first = watch.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert!(watch.finish() >= first + Duration::from_millis(5));
    }
}
