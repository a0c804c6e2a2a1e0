//! Pointwise differences between bag-of-fragments vectors.

use core::fmt;

use physalia_core::{PhysaliaError, Result};

use crate::bow::Bow;

use alloc::format;
use alloc::vec::Vec;

/// The difference between two bag-of-fragments vectors: for each fragment,
/// the signed change in frequency from an old vector to a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BowDiff {
    /// Signed per-fragment frequency deltas (`new − old`).
    pub freqs: Vec<i32>,
}

impl BowDiff {
    /// Compute `new − old` pointwise.
    pub fn new(old: &Bow, new: &Bow) -> Result<BowDiff> {
        if old.len() != new.len() {
            return Err(PhysaliaError::LengthMismatch {
                expected: old.len(),
                got: new.len(),
            });
        }
        Ok(BowDiff {
            freqs: old
                .freqs
                .iter()
                .zip(&new.freqs)
                .map(|(&o, &n)| n as i32 - o as i32)
                .collect(),
        })
    }

    /// True when there are no differences (all deltas are zero).
    pub fn is_same(&self) -> bool {
        self.freqs.iter().all(|&d| d == 0)
    }

    /// Apply this diff to the vector it was computed against, recovering the
    /// new vector. Fails if a delta would drive a count negative.
    pub fn apply(&self, old: &Bow) -> Result<Bow> {
        if old.len() != self.freqs.len() {
            return Err(PhysaliaError::LengthMismatch {
                expected: self.freqs.len(),
                got: old.len(),
            });
        }
        let mut freqs = Vec::with_capacity(old.len());
        for (i, (&o, &d)) in old.freqs.iter().zip(&self.freqs).enumerate() {
            let v = i64::from(o) + i64::from(d);
            if v < 0 {
                return Err(PhysaliaError::InvalidInput(format!(
                    "diff drives fragment {} count negative ({} + {})",
                    i, o, d
                )));
            }
            freqs.push(v as u32);
        }
        Ok(Bow { freqs })
    }
}

/// Displays only fragments with non-zero delta, in ascending fragment order:
/// `{1: -4, 3: 1}`.
impl fmt::Display for BowDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (i, &d) in self.freqs.iter().enumerate() {
            if d != 0 {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", i, d)?;
                first = false;
            }
        }
        write!(f, "}}")
    }
}
