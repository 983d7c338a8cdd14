//! Per-source duplicate suppression.

use dashmap::DashSet;

/// Thread-safe set of names a source has already emitted.
///
/// Scoped to one source instance; never shrinks.
#[derive(Debug, Default)]
pub struct NameFilter {
    seen: DashSet<String>,
}

impl NameFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-and-insert in one step.
    ///
    /// Returns `true` if `name` was already seen, otherwise records it and
    /// returns `false`.
    pub fn is_duplicate(&self, name: &str) -> bool {
        !self.seen.insert(name.to_string())
    }

    /// Number of distinct names recorded.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_second_sighting_is_duplicate() {
        let filter = NameFilter::new();
        assert!(!filter.is_duplicate("api.example.com"));
        assert!(filter.is_duplicate("api.example.com"));
        assert!(!filter.is_duplicate("www.example.com"));
        assert_eq!(filter.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_admit_exactly_one() {
        let filter = Arc::new(NameFilter::new());
        let mut handles = Vec::new();

        for _ in 0..32 {
            let filter = Arc::clone(&filter);
            handles.push(tokio::spawn(async move {
                !filter.is_duplicate("race.example.com")
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(filter.len(), 1);
    }
}
