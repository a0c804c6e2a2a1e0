//! A balanced ordered bag of search hits keyed by distance.
//!
//! Backed by a `BTreeMap` keyed on (distance, insertion sequence), so
//! duplicate distances are permitted and equal-distance items keep their
//! insertion order. Min/max peeks and deletions are logarithmic, which
//! keeps a bounded top-K search at O(M log K) over M database entries.

use std::collections::BTreeMap;

/// Map a (non-NaN) distance to bits that order the same way `total_cmp`
/// does.
fn distance_bits(d: f64) -> u64 {
    let bits = d.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | 0x8000_0000_0000_0000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    bits: u64,
    seq: u64,
}

/// An ordered multiset of items ranked by distance.
#[derive(Debug, Clone)]
pub struct RankedSet<T> {
    map: BTreeMap<RankKey, (T, f64)>,
    seq: u64,
}

impl<T> RankedSet<T> {
    pub fn new() -> RankedSet<T> {
        RankedSet {
            map: BTreeMap::new(),
            seq: 0,
        }
    }

    /// Number of items held.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Insert an item at the given distance. Distances must not be NaN.
    pub fn insert(&mut self, item: T, distance: f64) {
        debug_assert!(!distance.is_nan(), "NaN distance in ranked set");
        let key = RankKey {
            bits: distance_bits(distance),
            seq: self.seq,
        };
        self.seq += 1;
        self.map.insert(key, (item, distance));
    }

    /// The smallest distance held, if any.
    pub fn min_distance(&self) -> Option<f64> {
        self.map.first_key_value().map(|(_, &(_, d))| d)
    }

    /// The largest distance held, if any.
    pub fn max_distance(&self) -> Option<f64> {
        self.map.last_key_value().map(|(_, &(_, d))| d)
    }

    /// Remove and return the nearest item.
    pub fn delete_min(&mut self) -> Option<(T, f64)> {
        self.map.pop_first().map(|(_, v)| v)
    }

    /// Remove and return the farthest item.
    pub fn delete_max(&mut self) -> Option<(T, f64)> {
        self.map.pop_last().map(|(_, v)| v)
    }

    /// Items in ascending distance order; equal distances keep insertion
    /// order.
    pub fn in_order(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.map.values().map(|(item, d)| (item, *d))
    }

    /// Items in the exact reverse of [`in_order`].
    ///
    /// [`in_order`]: RankedSet::in_order
    pub fn in_order_reverse(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.map.values().rev().map(|(item, d)| (item, *d))
    }
}

impl<T> Default for RankedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
