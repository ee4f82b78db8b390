//! Internal helpers for text matching and ordered grouping.
//!
//! These utilities are **not** part of the public API.

use std::{collections::HashMap, hash::Hash};

use unicode_normalization::UnicodeNormalization;

/// Folds text for case-insensitive comparison (NFKC, then lowercase).
pub(crate) fn fold(input: &str) -> String {
    input.nfkc().flat_map(char::to_lowercase).collect()
}

/// Case-insensitive substring test. The needle is used as given; an empty
/// needle never matches.
pub(crate) fn contains_folded(haystack: &str, needle: &str) -> bool {
    let needle = fold(needle);
    if needle.is_empty() || haystack.is_empty() {
        return false;
    }
    fold(haystack).contains(&needle)
}

/// Truncates to at most `width` characters (not bytes).
pub(crate) fn truncate_chars(input: &str, width: usize) -> String {
    input.chars().take(width).collect()
}

/// Grouping map that remembers the order in which keys were first seen.
#[derive(Debug)]
pub(crate) struct Ordered<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K: Eq + Hash + Clone, V: Default> Ordered<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn entry(&mut self, key: K) -> &mut V {
        let pos = match self.index.get(&key) {
            Some(pos) => *pos,
            None => {
                self.entries.push((key.clone(), V::default()));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub(crate) fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_folded_ignores_case_and_empty_needles() {
        assert!(contains_folded("CB CARREFOUR MARKET", "carrefour"));
        assert!(contains_folded("Café Lumière", "CAFÉ"));
        assert!(!contains_folded("CB CARREFOUR", ""));
        assert!(!contains_folded("CB CARREFOUR", "   "));
        assert!(contains_folded("PRLV EDF", " edf"));
        assert!(!contains_folded("EDF PRLV", " edf"));
        assert!(!contains_folded("", "x"));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("éèà", 2), "éè");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn ordered_keeps_first_seen_order() {
        let mut grouped: Ordered<&str, i32> = Ordered::new();
        *grouped.entry("b") += 1;
        *grouped.entry("a") += 2;
        *grouped.entry("b") += 3;
        assert_eq!(grouped.into_entries(), vec![("b", 4), ("a", 2)]);
    }
}
