//! Per-request retry ceiling.
//!
//! A cache operation may be replayed when the connection it ran on dies, or
//! while it waits for the supervisor to bring a connection back. Each of those
//! counts as one retry.

/// Counts retries for a single operation against an optional ceiling.
#[derive(Debug, Clone)]
pub struct RetryLimit {
    max: Option<u32>,
    used: u32,
}

impl RetryLimit {
    /// `None` allows unlimited retries.
    pub fn new(max: Option<u32>) -> Self {
        Self { max, used: 0 }
    }

    /// Record one retry. Returns `false` once the ceiling is exceeded.
    pub fn record(&mut self) -> bool {
        self.used = self.used.saturating_add(1);
        match self.max {
            Some(max) => self.used <= max,
            None => true,
        }
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_allows_up_to_max() {
        let mut limit = RetryLimit::new(Some(2));
        assert!(limit.record());
        assert!(limit.record());
        assert!(!limit.record());
        assert_eq!(limit.used(), 3);
    }

    #[test]
    fn test_zero_means_no_retries() {
        let mut limit = RetryLimit::new(Some(0));
        assert!(!limit.record());
    }

    #[test]
    fn test_unlimited() {
        let mut limit = RetryLimit::new(None);
        for _ in 0..10_000 {
            assert!(limit.record());
        }
    }
}
