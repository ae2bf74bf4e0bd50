//! Lien Store - the vault's insertion-ordered record of positions.
//!
//! Entries live in a `Vec` with an id -> index map beside it. Removal is
//! swap-with-last-and-truncate, so it is O(1) per entry and only the moved
//! entry changes index. Entries are never dropped implicitly; settled
//! positions stay until [`LienStore::retain`] compacts them away.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::lien::{Lien, LienId};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER ENTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// A tracked lien
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LienEntry {
    /// Last known lien data
    pub lien: Lien,
    /// Lien id
    pub lien_id: LienId,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIEN STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Insertion-ordered lien entries plus an id index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LienStore {
    entries: Vec<LienEntry>,
    index: HashMap<LienId, usize>,
}

impl LienStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry
    pub fn record(&mut self, lien: Lien, lien_id: LienId) -> Result<()> {
        if self.index.contains_key(&lien_id) {
            return Err(Error::DuplicateLien(lien_id));
        }
        self.index.insert(lien_id, self.entries.len());
        self.entries.push(LienEntry { lien, lien_id });
        Ok(())
    }

    /// Overwrite the lien data of a tracked entry in place
    pub fn replace(&mut self, lien_id: LienId, lien: Lien) -> Result<()> {
        let index = *self.index.get(&lien_id).ok_or(Error::UnknownLien(lien_id))?;
        self.entries[index].lien = lien;
        Ok(())
    }

    /// Look up an entry by id
    pub fn get(&self, lien_id: LienId) -> Option<&LienEntry> {
        self.index.get(&lien_id).map(|&index| &self.entries[index])
    }

    /// Whether `lien_id` is tracked
    pub fn contains(&self, lien_id: LienId) -> bool {
        self.index.contains_key(&lien_id)
    }

    /// Number of tracked entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in store order
    pub fn iter(&self) -> std::slice::Iter<'_, LienEntry> {
        self.entries.iter()
    }

    /// `count` entries starting at `start`, produced lazily.
    ///
    /// The returned iterator is `Clone`, so a caller can restart the walk.
    pub fn get_by_index(&self, start: usize, count: usize) -> Result<LienSlice<'_>> {
        let out_of_range = Error::IndexOutOfRange {
            start,
            count,
            len: self.entries.len(),
        };
        let end = start.checked_add(count).ok_or(out_of_range.clone())?;
        if end > self.entries.len() {
            return Err(out_of_range);
        }
        Ok(LienSlice {
            inner: self.entries[start..end].iter(),
        })
    }

    /// Keep entries for which `keep` holds, compacting the rest away.
    ///
    /// Returns the removed ids. Removal swaps the last entry into the hole,
    /// so surviving entries may change order.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<LienId>
    where
        F: FnMut(&LienEntry) -> bool,
    {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if keep(&self.entries[i]) {
                i += 1;
                continue;
            }
            let entry = self.entries.swap_remove(i);
            self.index.remove(&entry.lien_id);
            if let Some(moved) = self.entries.get(i) {
                self.index.insert(moved.lien_id, i);
            }
            removed.push(entry.lien_id);
        }
        removed
    }

    /// Whether the id index and the entry list agree exactly
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.entries.len()
            && self
                .entries
                .iter()
                .enumerate()
                .all(|(i, entry)| self.index.get(&entry.lien_id) == Some(&i))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIEN SLICE
// ═══════════════════════════════════════════════════════════════════════════════

/// Lazy, finite, restartable walk over `(lien, lien_id)` pairs
#[derive(Debug, Clone)]
pub struct LienSlice<'a> {
    inner: std::slice::Iter<'a, LienEntry>,
}

impl<'a> Iterator for LienSlice<'a> {
    type Item = (&'a Lien, LienId);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.lien, entry.lien_id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for LienSlice<'_> {}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lien::tests::sample_lien;
    use proptest::prelude::*;

    fn lien_with_amount(amount: u128) -> Lien {
        Lien {
            amount,
            ..sample_lien()
        }
    }

    fn store_with(ids: &[LienId]) -> LienStore {
        let mut store = LienStore::new();
        for &id in ids {
            store.record(lien_with_amount(u128::from(id)), id).unwrap();
        }
        store
    }

    #[test]
    fn test_record_and_lookup() {
        let store = store_with(&[10, 20, 30]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(20).unwrap().lien.amount, 20);
        assert!(store.get(40).is_none());
        assert!(store.is_consistent());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut store = store_with(&[10]);
        assert_eq!(
            store.record(sample_lien(), 10),
            Err(Error::DuplicateLien(10))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut store = store_with(&[1, 2, 3]);
        store.replace(2, lien_with_amount(99)).unwrap();
        assert_eq!(store.get(2).unwrap().lien.amount, 99);
        assert_eq!(store.replace(4, sample_lien()), Err(Error::UnknownLien(4)));

        let ids: Vec<LienId> = store.iter().map(|entry| entry.lien_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.len(), 3);
        assert!(store.is_consistent());
    }

    #[test]
    fn test_get_by_index_is_lazy_and_restartable() {
        let store = store_with(&[1, 2, 3, 4]);

        let slice = store.get_by_index(1, 2).unwrap();
        assert_eq!(slice.len(), 2);
        let first: Vec<LienId> = slice.clone().map(|(_, id)| id).collect();
        let again: Vec<LienId> = slice.map(|(_, id)| id).collect();
        assert_eq!(first, vec![2, 3]);
        assert_eq!(first, again);

        assert_eq!(store.get_by_index(4, 0).unwrap().count(), 0);
        assert!(matches!(
            store.get_by_index(3, 2),
            Err(Error::IndexOutOfRange { start: 3, count: 2, len: 4 })
        ));
        assert!(store.get_by_index(5, 0).is_err());
        assert!(store.get_by_index(1, usize::MAX).is_err());
    }

    #[test]
    fn test_retain_swaps_last_into_hole() {
        let mut store = store_with(&[1, 2, 3, 4]);
        let removed = store.retain(|entry| entry.lien_id != 2);

        assert_eq!(removed, vec![2]);
        let order: Vec<LienId> = store.iter().map(|e| e.lien_id).collect();
        assert_eq!(order, vec![1, 4, 3]);
        assert!(store.is_consistent());
    }

    #[test]
    fn test_retain_everything_is_noop() {
        let mut store = store_with(&[1, 2]);
        assert!(store.retain(|_| true).is_empty());
        assert_eq!(store.len(), 2);

        let removed = store.retain(|_| false);
        assert_eq!(removed.len(), 2);
        assert!(store.is_empty());
        assert!(store.is_consistent());
    }

    proptest! {
        #[test]
        fn prop_retain_preserves_bijection(
            ids in prop::collection::hash_set(0u64..1000, 0..64),
            drop_mask in prop::collection::vec(any::<bool>(), 64),
        ) {
            let ids: Vec<LienId> = ids.into_iter().collect();
            let mut store = store_with(&ids);
            let dropped: Vec<LienId> = ids
                .iter()
                .zip(drop_mask.iter())
                .filter(|(_, drop)| **drop)
                .map(|(id, _)| *id)
                .collect();

            let mut removed = store.retain(|entry| !dropped.contains(&entry.lien_id));
            removed.sort_unstable();
            let mut expected = dropped.clone();
            expected.sort_unstable();

            prop_assert_eq!(removed, expected);
            prop_assert_eq!(store.len(), ids.len() - dropped.len());
            prop_assert!(store.is_consistent());
            for id in &ids {
                prop_assert_eq!(store.contains(*id), !dropped.contains(id));
            }
        }
    }
}
