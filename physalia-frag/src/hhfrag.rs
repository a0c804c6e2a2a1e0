//! Query-side fragment maps from HMM template hits.
//!
//! An external HHfrag pipeline slides windows over a query sequence, runs
//! HMM-HMM search for each window, and resolves every hit to the template's
//! alpha-carbon coordinates. This module consumes the result: a
//! [`FragmentMap`] of per-window [`Segment`]s, each holding zero or more
//! [`Hit`]s. A map is itself a [`BowSource`], so a sequence with no known
//! structure can still be summarized as a bag of fragments and searched
//! against a structure database.
//!
//! Hits whose coordinates could not be resolved (a query/template length
//! mismatch, or template residues without ATOM records) are *corrupt* and
//! contribute nothing.

use core::fmt;

use physalia_struct::types::Point3D;

use crate::source::BowSource;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// One HMM-HMM hit: a match between a window of the query and a stretch of
/// a template of known structure.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hit {
    /// Template identifier (e.g. a PDB code).
    pub template_name: String,
    /// Query residue range of the match (1-based, inclusive).
    pub query_start: usize,
    pub query_end: usize,
    /// Template residue range of the match (1-based, inclusive).
    pub template_start: usize,
    pub template_end: usize,
    /// Hit probability reported by the search.
    pub prob: f64,
    /// Alpha-carbon coordinates of the matched template stretch, or `None`
    /// when they could not be resolved.
    pub ca_atoms: Option<Vec<Point3D>>,
}

impl Hit {
    /// True when the hit could not be paired with alpha-carbon positions
    /// for every residue of the matched template stretch.
    pub fn is_corrupt(&self) -> bool {
        self.ca_atoms.is_none()
    }
}

/// All hits found for one query window.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Query window range (0-based, half-open).
    pub start: usize,
    pub end: usize,
    /// Hits for this window, best first.
    pub hits: Vec<Hit>,
}

/// Tabular listing of the segment's hits.
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} {:>12} {:>12} {:>9}  {}",
            "Hit", "Query", "Template", "Prob", "Corrupt"
        )?;
        for hit in &self.hits {
            writeln!(
                f,
                "{:<10} {:>12} {:>12} {:>9.4}  {}",
                hit.template_name,
                format!("({}-{})", hit.query_start, hit.query_end),
                format!("({}-{})", hit.template_start, hit.template_end),
                hit.prob,
                if hit.is_corrupt() { "corrupt" } else { "" },
            )?;
        }
        Ok(())
    }
}

/// A query sequence's fragment map: one segment per searched window,
/// ordered by window start.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentMap {
    /// Query sequence name.
    pub name: String,
    segments: Vec<Segment>,
}

impl FragmentMap {
    /// Build a map from segments, ordering them by window start.
    pub fn new(name: impl Into<String>, mut segments: Vec<Segment>) -> FragmentMap {
        segments.sort_by_key(|s| s.start);
        FragmentMap {
            name: name.into(),
            segments,
        }
    }

    /// The segments, ordered by window start.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total number of usable (non-corrupt) hits across all segments.
    pub fn hit_count(&self) -> usize {
        self.segments
            .iter()
            .flat_map(|s| &s.hits)
            .filter(|h| !h.is_corrupt())
            .count()
    }
}

/// One region per non-corrupt hit; corrupt hits are silently skipped. The
/// adapter does no sliding of its own.
impl BowSource for FragmentMap {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn atom_chunks(&self) -> Vec<Vec<Point3D>> {
        self.segments
            .iter()
            .flat_map(|s| &s.hits)
            .filter_map(|h| h.ca_atoms.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use crate::library::FragmentLibrary;
    use crate::source::BowBuilder;

    fn hit(template: &str, cas: Option<Vec<Point3D>>) -> Hit {
        Hit {
            template_name: template.into(),
            query_start: 1,
            query_end: 4,
            template_start: 11,
            template_end: 14,
            prob: 0.93,
            ca_atoms: cas,
        }
    }

    fn line(n: usize, spacing: f64) -> Vec<Point3D> {
        (0..n)
            .map(|i| Point3D::new(i as f64 * spacing, 0.0, 0.0))
            .collect()
    }

    fn ca_line(serial: usize, seq: usize, x: f64, y: f64, z: f64) -> String {
        format!(
            "ATOM  {:>5}  CA  ALA A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00",
            serial, seq, x, y, z
        )
    }

    fn chunk(points: &[(f64, f64, f64)]) -> String {
        let mut lines: Vec<String> = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| ca_line(i + 1, i + 1, x, y, z))
            .collect();
        lines.push("TER".to_string());
        lines.join("\n") + "\n"
    }

    fn spacing_library() -> FragmentLibrary {
        let f0 = chunk(&[(0.0, 0.0, 0.0), (3.8, 0.0, 0.0)]);
        let f1 = chunk(&[(0.0, 0.0, 0.0), (8.0, 0.0, 0.0)]);
        FragmentLibrary::parse("spacing", &format!("{}{}", f0, f1)).unwrap()
    }

    #[test]
    fn corrupt_hits_are_skipped() {
        let map = FragmentMap::new(
            "query1",
            vec![Segment {
                start: 0,
                end: 6,
                hits: vec![
                    hit("1abc", Some(line(2, 3.8))),
                    hit("2def", None),
                    hit("3ghi", Some(line(2, 8.0))),
                ],
            }],
        );
        assert_eq!(map.id(), "query1");
        assert_eq!(map.hit_count(), 2);
        assert_eq!(map.atom_chunks().len(), 2);
    }

    #[test]
    fn segments_sorted_by_start() {
        let map = FragmentMap::new(
            "q",
            vec![
                Segment {
                    start: 9,
                    end: 15,
                    hits: vec![],
                },
                Segment {
                    start: 0,
                    end: 6,
                    hits: vec![],
                },
            ],
        );
        assert_eq!(map.segments()[0].start, 0);
        assert_eq!(map.segments()[1].start, 9);
    }

    #[test]
    fn map_builds_a_bow() {
        let lib = spacing_library();
        let map = FragmentMap::new(
            "q",
            vec![
                Segment {
                    start: 0,
                    end: 6,
                    hits: vec![hit("1abc", Some(line(2, 3.8))), hit("2def", None)],
                },
                Segment {
                    start: 3,
                    end: 9,
                    hits: vec![hit("3ghi", Some(line(2, 8.0)))],
                },
            ],
        );
        let mut builder = BowBuilder::new(&lib);
        let bow = builder.build(&map);
        // One window per usable hit: one 3.8 A pair, one 8.0 A pair.
        assert_eq!(bow.freqs, vec![1, 1]);
    }

    #[test]
    fn undersized_hits_contribute_nothing() {
        let lib = spacing_library();
        let map = FragmentMap::new(
            "q",
            vec![Segment {
                start: 0,
                end: 6,
                hits: vec![hit("1abc", Some(line(1, 3.8)))],
            }],
        );
        let mut builder = BowBuilder::new(&lib);
        assert_eq!(builder.build(&map).total(), 0);
    }

    #[test]
    fn display_marks_corrupt_hits() {
        let seg = Segment {
            start: 0,
            end: 6,
            hits: vec![hit("1abc", Some(line(2, 3.8))), hit("2def", None)],
        };
        let text = seg.to_string();
        assert!(text.contains("1abc"));
        assert!(text.contains("(1-4)"));
        assert!(text.contains("(11-14)"));
        let corrupt_lines: Vec<&str> =
            text.lines().filter(|l| l.contains("corrupt")).collect();
        assert_eq!(corrupt_lines.len(), 1);
        assert!(corrupt_lines[0].contains("2def"));
    }
}
