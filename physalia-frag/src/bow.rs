//! Bag-of-fragments count vectors and their similarity metrics.

use core::fmt;

use physalia_core::{PhysaliaError, Result};

use alloc::vec;
use alloc::vec::Vec;

/// A bag-of-fragments vector of size N for a particular fragment library,
/// where N is the number of fragments in the library.
///
/// `freqs[i]` is the number of windows of the summarized backbone whose
/// nearest library fragment was fragment `i`. Semantically a multiset over
/// `{0, …, N-1}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bow {
    /// Frequency of each fragment, indexed by fragment identifier.
    pub freqs: Vec<u32>,
}

impl Bow {
    /// A bag-of-fragments with all fragment frequencies set to 0.
    pub fn new(size: usize) -> Bow {
        Bow {
            freqs: vec![0; size],
        }
    }

    /// The dimension of the vector. Always equal to the size of the
    /// originating library.
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    /// Whether the vector has zero dimension.
    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Bump the count of one fragment slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is outside the library range.
    pub fn increment(&mut self, slot: usize) {
        self.freqs[slot] += 1;
    }

    /// Total number of windows counted across all slots.
    pub fn total(&self) -> u64 {
        self.freqs.iter().map(|&f| u64::from(f)).sum()
    }

    /// Pointwise sum of two vectors.
    pub fn add(&self, other: &Bow) -> Result<Bow> {
        self.check_len(other)?;
        Ok(Bow {
            freqs: self
                .freqs
                .iter()
                .zip(&other.freqs)
                .map(|(a, b)| a + b)
                .collect(),
        })
    }

    /// Dot product.
    pub fn dot(&self, other: &Bow) -> Result<f64> {
        self.check_len(other)?;
        let dot: u64 = self
            .freqs
            .iter()
            .zip(&other.freqs)
            .map(|(&a, &b)| u64::from(a) * u64::from(b))
            .sum();
        Ok(dot as f64)
    }

    /// Vector length.
    pub fn magnitude(&self) -> f64 {
        let sq: u64 = self.freqs.iter().map(|&f| u64::from(f) * u64::from(f)).sum();
        (sq as f64).sqrt()
    }

    /// Euclidean distance between two vectors.
    pub fn euclid(&self, other: &Bow) -> Result<f64> {
        self.check_len(other)?;
        let square_sum: i64 = self
            .freqs
            .iter()
            .zip(&other.freqs)
            .map(|(&a, &b)| {
                let d = i64::from(a) - i64::from(b);
                d * d
            })
            .sum();
        Ok((square_sum as f64).sqrt())
    }

    /// Cosine distance between two vectors: `1 − dot/(|a|·|b|)`.
    ///
    /// When either vector is all zero the distance is 1.0 (maximally
    /// dissimilar).
    pub fn cosine(&self, other: &Bow) -> Result<f64> {
        self.check_len(other)?;
        // Hot path: dot and both magnitudes fused into one pass.
        let mut dot = 0u64;
        let mut mag1 = 0u64;
        let mut mag2 = 0u64;
        for (&a, &b) in self.freqs.iter().zip(&other.freqs) {
            let (a, b) = (u64::from(a), u64::from(b));
            dot += a * b;
            mag1 += a * a;
            mag2 += b * b;
        }
        let r = 1.0 - (dot as f64 / ((mag1 as f64) * (mag2 as f64)).sqrt());
        if r.is_nan() {
            Ok(1.0)
        } else {
            Ok(r)
        }
    }

    fn check_len(&self, other: &Bow) -> Result<()> {
        if self.len() != other.len() {
            return Err(PhysaliaError::LengthMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        Ok(())
    }
}

/// Displays only fragments with non-zero frequency, in ascending fragment
/// order: `{1: 4, 3: 1}`.
impl fmt::Display for Bow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (i, &freq) in self.freqs.iter().enumerate() {
            if freq > 0 {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", i, freq)?;
                first = false;
            }
        }
        write!(f, "}}")
    }
}
