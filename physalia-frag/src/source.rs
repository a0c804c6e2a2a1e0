//! Sources of backbone coordinates and the bag-of-fragments builder.
//!
//! Anything that can offer contiguous alpha-carbon regions is a
//! [`BowSource`]: a single chain, a whole structure (one region per protein
//! chain), or an HHfrag fragment map (one region per template hit). The
//! builder slides K-sized windows inside each region — never across a
//! region boundary — and counts nearest fragments.

use physalia_struct::qcp::QcpScratch;
use physalia_struct::types::{Chain, Point3D, Structure};

use crate::bow::Bow;
use crate::library::FragmentLibrary;

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// A source of backbone regions that can be summarized as a bag of
/// fragments.
pub trait BowSource {
    /// A short globally-unique tag for the source (e.g. PDB code plus chain
    /// letter).
    fn id(&self) -> String;

    /// Contiguous alpha-carbon regions. Windows slide within a region and
    /// never across region boundaries.
    fn atom_chunks(&self) -> Vec<Vec<Point3D>>;
}

/// A whole structure is one region per protein chain.
impl BowSource for Structure {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn atom_chunks(&self) -> Vec<Vec<Point3D>> {
        self.protein_chains()
            .iter()
            .map(|c| c.ca_atoms())
            .collect()
    }
}

/// A single chain of a named entry; the source id is the entry id with the
/// chain letter appended (e.g. `1CTFA`).
#[derive(Debug, Clone)]
pub struct ChainSource {
    pub entry_id: String,
    pub chain: Chain,
}

impl ChainSource {
    pub fn new(entry_id: impl Into<String>, chain: Chain) -> ChainSource {
        ChainSource {
            entry_id: entry_id.into(),
            chain,
        }
    }
}

impl BowSource for ChainSource {
    fn id(&self) -> String {
        format!("{}{}", self.entry_id, self.chain.id)
    }

    fn atom_chunks(&self) -> Vec<Vec<Point3D>> {
        vec![self.chain.ca_atoms()]
    }
}

/// Computes bag-of-fragments vectors against one library.
///
/// A builder owns one RMSD scratch buffer, so it is cheap to reuse across
/// many sources but must not be shared between threads; give each worker
/// its own builder.
pub struct BowBuilder<'l> {
    library: &'l FragmentLibrary,
    scratch: QcpScratch,
}

impl<'l> BowBuilder<'l> {
    /// Create a builder for `library`.
    pub fn new(library: &'l FragmentLibrary) -> BowBuilder<'l> {
        BowBuilder {
            library,
            scratch: library.scratch(),
        }
    }

    /// The library this builder counts against.
    pub fn library(&self) -> &FragmentLibrary {
        self.library
    }

    /// Summarize a source as a bag of fragments.
    ///
    /// Every region shorter than K contributes nothing; a region of length
    /// L ≥ K contributes exactly `L − K + 1` counts.
    pub fn build(&mut self, source: &dyn BowSource) -> Bow {
        let k = self.library.fragment_size();
        let mut bow = Bow::new(self.library.size());
        for chunk in source.atom_chunks() {
            if chunk.len() < k {
                continue;
            }
            for i in 0..=chunk.len() - k {
                let window = &chunk[i..i + k];
                bow.increment(self.library.best_fragment(window, &mut self.scratch));
            }
        }
        bow
    }
}
