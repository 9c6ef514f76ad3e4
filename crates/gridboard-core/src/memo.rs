//! Per-cycle memoization of rendered sections
//!
//! Several surfaces often show the same device or the same aggregate. The
//! first surface to ask for a key pays for formatting it; everyone else in the
//! same cycle gets the stored text. The cache is cleared once per cycle so no
//! text outlives the snapshot it was built from.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoCache {
    entries: HashMap<String, String>,
    hits: usize,
    misses: usize,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries and reset the counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Return the text stored under `key`, generating it on first use
    pub fn get_or_generate<F>(&mut self, key: &str, generate: F) -> &str
    where
        F: FnOnce() -> String,
    {
        if self.entries.contains_key(key) {
            self.hits += 1;
        } else {
            self.entries.insert(key.to_string(), generate());
            self.misses += 1;
        }
        &self.entries[key]
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_runs_once_per_key() {
        let mut cache = MemoCache::new();
        let mut calls = 0;

        let first = cache
            .get_or_generate("42", || {
                calls += 1;
                "piston".to_string()
            })
            .to_string();
        assert_eq!((cache.hits(), cache.misses()), (0, 1));

        let second = cache
            .get_or_generate("42", || {
                calls += 1;
                "other".to_string()
            })
            .to_string();

        assert_eq!(calls, 1);
        assert_eq!(first, "piston");
        assert_eq!(second, "piston");
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_clear_scopes_entries_to_one_cycle() {
        let mut cache = MemoCache::new();
        cache.get_or_generate("power", || "old".to_string());
        cache.get_or_generate("power", || "unused".to_string());

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!((cache.hits(), cache.misses()), (0, 0));

        let mut regenerated = false;
        let text = cache.get_or_generate("power", || {
            regenerated = true;
            "new".to_string()
        });
        assert_eq!(text, "new");
        assert!(regenerated);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut cache = MemoCache::new();
        cache.get_or_generate("cargo", || "a".to_string());
        cache.get_or_generate("production", || "b".to_string());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.misses(), 2);
    }
}
