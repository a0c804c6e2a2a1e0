//! Bounded top-K similarity search over a database.
//!
//! A query — any [`BowSource`], or a prebuilt [`Entry`] — is compared
//! against every entry under the chosen metric. Hits are kept in a
//! [`RankedSet`] bounded at the result limit, so memory stays at O(K)
//! and work at O(M log K) for M entries.

use physalia_core::{PhysaliaError, Result};
use physalia_frag::bow::Bow;
use physalia_frag::source::{BowBuilder, BowSource};

use crate::db::{Database, Entry};
use crate::rank::RankedSet;

/// Distance metric for ranking. The discriminants are wire constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    Euclid = 0,
    Cosine = 1,
}

impl Metric {
    /// The wire constant for this metric.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Distance between two vectors under this metric.
    pub fn distance(self, a: &Bow, b: &Bow) -> Result<f64> {
        match self {
            Metric::Euclid => a.euclid(b),
            Metric::Cosine => a.cosine(b),
        }
    }
}

impl TryFrom<u8> for Metric {
    type Error = PhysaliaError;

    fn try_from(code: u8) -> Result<Metric> {
        match code {
            0 => Ok(Metric::Euclid),
            1 => Ok(Metric::Cosine),
            other => Err(PhysaliaError::InvalidInput(format!(
                "unknown metric code {}",
                other
            ))),
        }
    }
}

/// Result ordering direction. The discriminants are wire constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Order {
    Asc = 0,
    Desc = 1,
}

impl Order {
    /// The wire constant for this order.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Order {
    type Error = PhysaliaError;

    fn try_from(code: u8) -> Result<Order> {
        match code {
            0 => Ok(Order::Asc),
            1 => Ok(Order::Desc),
            other => Err(PhysaliaError::InvalidInput(format!(
                "unknown order code {}",
                other
            ))),
        }
    }
}

/// Settings for one search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOptions {
    /// Maximum number of results; negative means unbounded.
    pub limit: i32,
    /// Inclusive lower bound on the `sort_by` distance.
    pub min: f64,
    /// Inclusive upper bound on the `sort_by` distance.
    pub max: f64,
    /// Metric used for filtering and ranking.
    pub sort_by: Metric,
    /// Ranking direction.
    pub order: Order,
}

/// The 25 nearest entries by cosine distance.
impl Default for SearchOptions {
    fn default() -> SearchOptions {
        SearchOptions {
            limit: 25,
            min: 0.0,
            max: f64::MAX,
            sort_by: Metric::Cosine,
            order: Order::Asc,
        }
    }
}

impl SearchOptions {
    /// Every entry within cosine distance 0.35, nearest first.
    pub fn close() -> SearchOptions {
        SearchOptions {
            limit: -1,
            min: 0.0,
            max: 0.35,
            sort_by: Metric::Cosine,
            order: Order::Asc,
        }
    }
}

/// One search hit, with both distances to the query precomputed.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    pub entry: Entry,
    pub cosine: f64,
    pub euclid: f64,
}

impl SearchResult {
    fn new(query: &Entry, entry: Entry) -> Result<SearchResult> {
        let cosine = query.bow.cosine(&entry.bow)?;
        let euclid = query.bow.euclid(&entry.bow)?;
        Ok(SearchResult {
            entry,
            cosine,
            euclid,
        })
    }
}

impl Database {
    /// Summarize `source` against this database's library, then search.
    pub fn search(
        &self,
        opts: SearchOptions,
        source: &dyn BowSource,
    ) -> Result<Vec<SearchResult>> {
        let mut builder = BowBuilder::new(&self.library);
        let query = Entry {
            id: source.id(),
            bow: builder.build(source),
        };
        self.search_entry(opts, &query)
    }

    /// Search with a prebuilt query entry.
    ///
    /// Results are sorted by the `sort_by` distance in the requested
    /// direction. Under `Asc`, equal distances rank in database order;
    /// `Desc` is the exact reverse.
    pub fn search_entry(&self, opts: SearchOptions, query: &Entry) -> Result<Vec<SearchResult>> {
        if opts.limit == 0 {
            return Ok(Vec::new());
        }

        let distances = self.distances(opts.sort_by, &query.bow)?;

        let mut tree: RankedSet<&Entry> = RankedSet::new();
        for (entry, dist) in self.entries.iter().zip(distances) {
            if dist < opts.min || dist > opts.max {
                continue;
            }

            // At the limit, an entry no better than the current worst hit
            // cannot make the cut; skip the insert/evict churn.
            if opts.limit >= 0 && tree.len() == opts.limit as usize {
                let skip = match opts.order {
                    Order::Asc => tree.max_distance().map_or(false, |worst| dist >= worst),
                    Order::Desc => tree.min_distance().map_or(false, |worst| dist <= worst),
                };
                if skip {
                    continue;
                }
            }

            tree.insert(entry, dist);

            if opts.limit >= 0 && tree.len() > opts.limit as usize {
                match opts.order {
                    Order::Asc => tree.delete_max(),
                    Order::Desc => tree.delete_min(),
                };
            }
        }

        let mut results = Vec::with_capacity(tree.len());
        match opts.order {
            Order::Asc => {
                for (entry, _) in tree.in_order() {
                    results.push(SearchResult::new(query, (*entry).clone())?);
                }
            }
            Order::Desc => {
                for (entry, _) in tree.in_order_reverse() {
                    results.push(SearchResult::new(query, (*entry).clone())?);
                }
            }
        }
        Ok(results)
    }

    /// The `metric` distance from `query` to every entry, in entry order.
    fn distances(&self, metric: Metric, query: &Bow) -> Result<Vec<f64>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.entries
                .par_iter()
                .map(|e| metric.distance(query, &e.bow))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.entries
                .iter()
                .map(|e| metric.distance(query, &e.bow))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physalia_frag::library::FragmentLibrary;
    use std::path::PathBuf;

    fn ca_line(serial: usize, seq: usize, x: f64, y: f64, z: f64) -> String {
        format!(
            "ATOM  {:>5}  CA  ALA A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00",
            serial, seq, x, y, z
        )
    }

    fn test_library() -> FragmentLibrary {
        let mut text = String::new();
        for &spacing in &[3.8, 8.0, 12.0] {
            text.push_str(&ca_line(1, 1, 0.0, 0.0, 0.0));
            text.push('\n');
            text.push_str(&ca_line(2, 2, spacing, 0.0, 0.0));
            text.push_str("\nTER\n");
        }
        FragmentLibrary::parse("test", &text).unwrap()
    }

    fn entry(id: &str, freqs: &[u32]) -> Entry {
        Entry {
            id: id.to_string(),
            bow: Bow {
                freqs: freqs.to_vec(),
            },
        }
    }

    /// An in-memory database; search never touches the disk.
    fn database(entries: Vec<Entry>) -> Database {
        Database {
            name: "mem".to_string(),
            path: PathBuf::from("mem"),
            library: test_library(),
            entries,
        }
    }

    /// Ten entries at increasing cosine distance from `[5, 0, 0]`.
    fn graded_database() -> Database {
        let entries = (0..10u32)
            .map(|i| entry(&format!("E{}", i), &[10 - i, i, 0]))
            .collect();
        database(entries)
    }

    fn query() -> Entry {
        entry("query", &[5, 0, 0])
    }

    #[test]
    fn wire_constants() {
        assert_eq!(Metric::Euclid.code(), 0);
        assert_eq!(Metric::Cosine.code(), 1);
        assert_eq!(Order::Asc.code(), 0);
        assert_eq!(Order::Desc.code(), 1);
        assert_eq!(Metric::try_from(1).unwrap(), Metric::Cosine);
        assert_eq!(Order::try_from(1).unwrap(), Order::Desc);
        assert!(Metric::try_from(7).is_err());
        assert!(Order::try_from(7).is_err());
    }

    #[test]
    fn presets() {
        let default = SearchOptions::default();
        assert_eq!(default.limit, 25);
        assert_eq!(default.sort_by, Metric::Cosine);
        assert_eq!(default.order, Order::Asc);

        let close = SearchOptions::close();
        assert_eq!(close.limit, -1);
        assert_eq!(close.max, 0.35);
    }

    #[test]
    fn bounded_results_are_sorted_and_exact() {
        let db = graded_database();
        let opts = SearchOptions {
            limit: 3,
            ..SearchOptions::default()
        };
        let results = db.search_entry(opts, &query()).unwrap();
        assert_eq!(results.len(), 3);

        // Non-decreasing cosine, and every reported distance is the true one.
        for pair in results.windows(2) {
            assert!(pair[0].cosine <= pair[1].cosine);
        }
        for r in &results {
            let true_cosine = query().bow.cosine(&r.entry.bow).unwrap();
            let true_euclid = query().bow.euclid(&r.entry.bow).unwrap();
            assert_eq!(r.cosine, true_cosine);
            assert_eq!(r.euclid, true_euclid);
        }
        // E0 is colinear with the query.
        assert_eq!(results[0].entry.id, "E0");
        assert!(results[0].cosine.abs() < 1e-12);
    }

    #[test]
    fn unbounded_search_returns_everything_in_range() {
        let db = graded_database();
        let opts = SearchOptions {
            limit: -1,
            ..SearchOptions::default()
        };
        let results = db.search_entry(opts, &query()).unwrap();
        assert_eq!(results.len(), 10);
    }

    #[test]
    fn zero_limit_returns_nothing() {
        let db = graded_database();
        let opts = SearchOptions {
            limit: 0,
            ..SearchOptions::default()
        };
        assert!(db.search_entry(opts, &query()).unwrap().is_empty());
    }

    #[test]
    fn min_max_filter_is_inclusive() {
        let db = graded_database();
        let unbounded = SearchOptions {
            limit: -1,
            ..SearchOptions::default()
        };
        let all = db.search_entry(unbounded, &query()).unwrap();
        let lo = all[2].cosine;
        let hi = all[6].cosine;

        let opts = SearchOptions {
            limit: -1,
            min: lo,
            max: hi,
            ..SearchOptions::default()
        };
        let results = db.search_entry(opts, &query()).unwrap();
        assert_eq!(results.len(), 5);
        for r in &results {
            assert!(r.cosine >= lo && r.cosine <= hi);
        }
    }

    #[test]
    fn descending_order_reverses() {
        let db = graded_database();
        let asc = SearchOptions {
            limit: -1,
            ..SearchOptions::default()
        };
        let desc = SearchOptions {
            limit: -1,
            order: Order::Desc,
            ..SearchOptions::default()
        };
        let up = db.search_entry(asc, &query()).unwrap();
        let down = db.search_entry(desc, &query()).unwrap();
        assert_eq!(up.len(), down.len());
        for (a, b) in up.iter().zip(down.iter().rev()) {
            assert_eq!(a.entry.id, b.entry.id);
        }
    }

    #[test]
    fn descending_keeps_farthest_under_limit() {
        let db = graded_database();
        let opts = SearchOptions {
            limit: 2,
            order: Order::Desc,
            ..SearchOptions::default()
        };
        let results = db.search_entry(opts, &query()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].cosine >= results[1].cosine);
        // The two farthest entries overall.
        assert_eq!(results[0].entry.id, "E9");
        assert_eq!(results[1].entry.id, "E8");
    }

    #[test]
    fn euclid_metric_ranks_by_euclid() {
        let db = database(vec![
            entry("near", &[5, 0, 1]),
            entry("far", &[5, 0, 9]),
            entry("exact", &[5, 0, 0]),
        ]);
        let opts = SearchOptions {
            limit: -1,
            sort_by: Metric::Euclid,
            ..SearchOptions::default()
        };
        let results = db.search_entry(opts, &query()).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "near", "far"]);
        assert_eq!(results[0].euclid, 0.0);
    }

    #[test]
    fn ties_rank_in_database_order() {
        // Three identical entries: all distances tie.
        let db = database(vec![
            entry("first", &[1, 1, 0]),
            entry("second", &[1, 1, 0]),
            entry("third", &[1, 1, 0]),
        ]);
        let opts = SearchOptions {
            limit: 2,
            ..SearchOptions::default()
        };
        let results = db.search_entry(opts, &query()).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.entry.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn end_to_end_disk_search() {
        use crate::db::{DbWriter, WriteOptions};
        use physalia_struct::types::Point3D;

        #[derive(Clone)]
        struct TwoChunkSource {
            id: String,
            tight_len: usize,
            wide_len: usize,
        }

        impl BowSource for TwoChunkSource {
            fn id(&self) -> String {
                self.id.clone()
            }

            fn atom_chunks(&self) -> Vec<Vec<Point3D>> {
                let line = |n: usize, spacing: f64| -> Vec<Point3D> {
                    (0..n)
                        .map(|i| Point3D::new(i as f64 * spacing, 0.0, 0.0))
                        .collect()
                };
                vec![line(self.tight_len, 3.8), line(self.wide_len, 8.0)]
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("bows");
        let mut writer =
            DbWriter::create(test_library(), &dir, WriteOptions::default()).unwrap();
        for i in 0..10 {
            writer
                .add(TwoChunkSource {
                    id: format!("S{}", i),
                    tight_len: 4,
                    wide_len: i,
                })
                .unwrap();
        }
        writer.close().unwrap();

        let db = Database::open(&dir).unwrap();
        assert_eq!(db.len(), 10);

        let q = TwoChunkSource {
            id: "query".into(),
            tight_len: 4,
            wide_len: 0,
        };
        let all = db
            .search(
                SearchOptions {
                    limit: -1,
                    ..SearchOptions::default()
                },
                &q,
            )
            .unwrap();
        let top = db
            .search(
                SearchOptions {
                    limit: 3,
                    ..SearchOptions::default()
                },
                &q,
            )
            .unwrap();

        assert_eq!(top.len(), 3);
        for pair in top.windows(2) {
            assert!(pair[0].cosine <= pair[1].cosine);
        }
        // The bounded search keeps exactly the head of the full ranking.
        for (bounded, full) in top.iter().zip(&all) {
            assert_eq!(bounded.cosine, full.cosine);
        }
        // The query matches the pure tight-spacing entry exactly.
        assert!(top[0].cosine.abs() < 1e-12);
        // Results carry the stored entries, not copies reshaped in flight.
        for r in &top {
            let stored = db.entries.iter().find(|e| e.id == r.entry.id).unwrap();
            assert_eq!(r.entry.bow, stored.bow);
        }
    }

    #[test]
    fn search_builds_query_from_source() {
        use physalia_frag::source::BowSource;
        use physalia_struct::types::Point3D;

        struct LineSource {
            id: String,
            spacing: f64,
        }

        impl BowSource for LineSource {
            fn id(&self) -> String {
                self.id.clone()
            }

            fn atom_chunks(&self) -> Vec<Vec<Point3D>> {
                vec![(0..4)
                    .map(|i| Point3D::new(i as f64 * self.spacing, 0.0, 0.0))
                    .collect()]
            }
        }

        // Entries as the builder would produce them for 3.8 / 8.0 spacing
        // lines of 4 CAs: three windows each.
        let db = database(vec![
            entry("tight", &[3, 0, 0]),
            entry("wide", &[0, 3, 0]),
        ]);

        let source = LineSource {
            id: "q".into(),
            spacing: 3.8,
        };
        let results = db
            .search(SearchOptions::default(), &source)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].entry.id, "tight");
        assert!(results[0].cosine.abs() < 1e-12);
        assert_eq!(results[1].entry.id, "wide");
    }
}
