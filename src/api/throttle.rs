use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Enforces a minimum spacing between calls, across threads.
///
/// The lock is held while sleeping, so concurrent callers queue up and are
/// released one interval apart.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Block until at least `min_interval` has passed since the previous call.
    pub fn wait(&self) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_call_does_not_wait() {
        let throttle = Throttle::new(Duration::from_secs(5));
        let start = Instant::now();
        throttle.wait();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_spacing_between_calls() {
        let throttle = Throttle::new(Duration::from_millis(40));
        let start = Instant::now();
        throttle.wait();
        throttle.wait();
        throttle.wait();
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_spacing_across_threads() {
        let throttle = Arc::new(Throttle::new(Duration::from_millis(30)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let t = Arc::clone(&throttle);
                thread::spawn(move || t.wait())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
