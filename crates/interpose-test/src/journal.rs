//! Shared call journal.

use parking_lot::Mutex;
use std::sync::Arc;

/// An ordered, thread-safe log of events recorded by test interceptors and
/// fixtures.
///
/// Clones share the same underlying log.
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns a snapshot of all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns true if `entry` was recorded at least once.
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.entries.lock().iter().any(|e| e == entry)
    }

    /// Returns how many entries equal `entry`.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Asserts that the journal holds exactly `expected`, in order.
    ///
    /// # Panics
    ///
    /// Panics with both sequences if they differ.
    #[track_caller]
    pub fn assert_entries(&self, expected: &[&str]) {
        let actual = self.entries();
        assert!(
            actual.iter().map(String::as_str).eq(expected.iter().copied()),
            "journal mismatch\n  expected: {expected:?}\n  actual:   {actual:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let journal = CallJournal::new();
        let other = journal.clone();

        journal.record("a");
        other.record("b");

        assert_eq!(journal.entries(), vec!["a", "b"]);
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn test_count_and_clear() {
        let journal = CallJournal::new();
        journal.record("x");
        journal.record("x");
        journal.record("y");

        assert_eq!(journal.count("x"), 2);
        assert!(journal.contains("y"));

        journal.clear();
        assert!(journal.is_empty());
    }

    #[test]
    #[should_panic(expected = "journal mismatch")]
    fn test_assert_entries_mismatch() {
        let journal = CallJournal::new();
        journal.record("a");
        journal.assert_entries(&["b"]);
    }
}
