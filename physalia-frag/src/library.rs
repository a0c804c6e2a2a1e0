//! Fragment library loading and nearest-fragment lookup.
//!
//! A library lives on disk as a single text file of concatenated mini-PDB
//! chunks, each delimited by a line whose first three bytes are `TER`. Chunk
//! order defines fragment identifiers: the i-th non-empty chunk becomes
//! fragment `i`. Every fragment must yield the same number K of alpha-carbon
//! coordinates.

use core::fmt;

use physalia_core::{hash, Annotated, ContentAddressable, PhysaliaError, Result};
use physalia_struct::geometry::centered;
use physalia_struct::pdb::parse_pdb;
use physalia_struct::qcp::{qcp_rmsd_precentered, QcpScratch};
use physalia_struct::types::Point3D;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// One fragment of a library: a stable identifier and K alpha-carbon
/// coordinates, stored centered on their centroid.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    /// Dense identifier in `[0, N)`, assigned by chunk order.
    pub ident: usize,
    /// Centered alpha-carbon coordinates, length K.
    pub atoms: Vec<Point3D>,
}

/// An immutable fragment library.
///
/// Libraries are fixed both in the number of fragments and in the size of
/// each fragment. Load one at process start and share it read-only.
#[derive(Debug, Clone)]
pub struct FragmentLibrary {
    name: String,
    fragment_size: usize,
    fragments: Vec<Fragment>,
    /// Original file contents, kept verbatim so a database can embed a
    /// byte-identical copy.
    raw: String,
}

impl FragmentLibrary {
    /// Parse a library from the text contents of a library file.
    ///
    /// # Errors
    ///
    /// Fails if the text contains no fragments, if any chunk cannot be
    /// parsed or has no alpha-carbons, or if fragment sizes are inconsistent.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<FragmentLibrary> {
        let mut fragments: Vec<Fragment> = Vec::new();
        let mut fragment_size = 0usize;

        for chunk in split_chunks(text) {
            let ident = fragments.len();
            let structure = parse_pdb(&chunk)
                .map_err(|e| PhysaliaError::Parse(format!("fragment {}: {}", ident, e)))?;
            let cas: Vec<Point3D> = structure
                .chains
                .iter()
                .flat_map(|c| c.ca_atoms())
                .collect();
            if cas.is_empty() {
                return Err(PhysaliaError::Parse(format!(
                    "fragment {}: no alpha-carbons",
                    ident
                )));
            }
            if fragment_size == 0 {
                fragment_size = cas.len();
            } else if fragment_size != cas.len() {
                return Err(PhysaliaError::Parse(format!(
                    "fragment {} has length {}, but others have length {}",
                    ident,
                    cas.len(),
                    fragment_size
                )));
            }
            fragments.push(Fragment {
                ident,
                atoms: centered(&cas),
            });
        }

        if fragments.is_empty() {
            return Err(PhysaliaError::Parse("empty fragment library".into()));
        }

        Ok(FragmentLibrary {
            name: name.into(),
            fragment_size,
            fragments,
            raw: text.to_string(),
        })
    }

    /// Load a library from a file. The library name is the file stem.
    #[cfg(feature = "std")]
    pub fn from_file(path: impl AsRef<::std::path::Path>) -> Result<FragmentLibrary> {
        let path = path.as_ref();
        let text = ::std::fs::read_to_string(path).map_err(|e| {
            PhysaliaError::Io(::std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "library".to_string());
        Self::parse(name, &text)
    }

    /// The number of fragments N.
    pub fn size(&self) -> usize {
        self.fragments.len()
    }

    /// The number K of alpha-carbons in each fragment.
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// All fragments, in identifier order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// A fragment by identifier.
    pub fn fragment(&self, ident: usize) -> Option<&Fragment> {
        self.fragments.get(ident)
    }

    /// Scratch memory sized for this library's fragment windows.
    pub fn scratch(&self) -> QcpScratch {
        QcpScratch::new(self.fragment_size)
    }

    /// The identifier of the fragment with minimal RMSD to `window`.
    ///
    /// The window is centered into the scratch buffers per call; fragments
    /// are compared as stored, already centered from load time.
    ///
    /// Deterministic: when several fragments tie, the lowest identifier
    /// wins.
    ///
    /// # Panics
    ///
    /// Panics if `window` does not have exactly [`fragment_size`] points
    /// (programmer error; the builder always slices exact windows).
    ///
    /// [`fragment_size`]: FragmentLibrary::fragment_size
    pub fn best_fragment(&self, window: &[Point3D], scratch: &mut QcpScratch) -> usize {
        let mut best = 0usize;
        let mut best_rmsd = f64::INFINITY;
        for frag in &self.fragments {
            let r = qcp_rmsd_precentered(window, &frag.atoms, scratch);
            if r < best_rmsd {
                best_rmsd = r;
                best = frag.ident;
            }
        }
        best
    }

    /// Write a byte-identical copy of the source library file to `dest`.
    #[cfg(feature = "std")]
    pub fn copy_to(&self, dest: impl AsRef<::std::path::Path>) -> Result<()> {
        let dest = dest.as_ref();
        ::std::fs::write(dest, self.raw.as_bytes()).map_err(|e| {
            PhysaliaError::Io(::std::io::Error::new(
                e.kind(),
                format!("{}: {}", dest.display(), e),
            ))
        })
    }
}

impl Annotated for FragmentLibrary {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ContentAddressable for FragmentLibrary {
    fn content_hash(&self) -> String {
        hash::sha256(self.raw.as_bytes())
    }
}

/// `name (N, K)`
impl fmt::Display for FragmentLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.name,
            self.fragments.len(),
            self.fragment_size
        )
    }
}

/// Split library text into chunks on `TER` lines, dropping all-blank chunks.
fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.starts_with("TER") {
            if !current.trim().is_empty() {
                chunks.push(core::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}
