use std::time::{Duration, Instant};

/// Collapses bursts of resize notifications into one recompute per window.
///
/// The first request opens a window; requests inside it are absorbed.
/// Polling at or after the end of the window fires once and closes it.
#[derive(Debug, Clone)]
pub struct ResizeCoalescer {
    window: Duration,
    pending_since: Option<Instant>,
}

impl ResizeCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending_since: None,
        }
    }

    /// Returns true when this request opened a new window
    pub fn request(&mut self, now: Instant) -> bool {
        if self.pending_since.is_some() {
            return false;
        }
        self.pending_since = Some(now);
        true
    }

    /// True exactly once per window, when it has elapsed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.window => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_fires_once() {
        let start = Instant::now();
        let mut resize = ResizeCoalescer::new(Duration::from_millis(10));

        assert!(resize.request(start));
        for ms in 1..9 {
            assert!(!resize.request(start + Duration::from_millis(ms)));
            assert!(!resize.poll(start + Duration::from_millis(ms)));
        }
        assert!(resize.poll(start + Duration::from_millis(10)));
        assert!(!resize.poll(start + Duration::from_millis(20)));
        assert!(!resize.is_pending());
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut resize = ResizeCoalescer::new(Duration::from_millis(10));
        resize.request(start);
        resize.cancel();
        assert!(!resize.poll(start + Duration::from_secs(1)));
    }
}
