//! Protein 3D structure primitives for the Physalia ecosystem.
//!
//! - **Coordinate types** — [`Point3D`], [`Atom`], [`Chain`], [`Structure`]
//! - **PDB parsing** — Read alpha-carbon backbones with [`pdb::parse_pdb`]
//! - **Geometry** — Centroids and window centering in [`geometry`]
//! - **RMSD** — The quaternion characteristic polynomial kernel in [`qcp`]
//!
//! # Quick start
//!
//! ```
//! use physalia_struct::pdb::parse_pdb;
//!
//! let pdb_text = "\
//! HEADER                                                        1TST
//! ATOM      1  N   ALA A   1       1.000   2.000   3.000  1.00  0.00
//! ATOM      2  CA  ALA A   1       2.000   2.000   3.000  1.00  0.00
//! ATOM      3  C   ALA A   1       3.000   2.000   3.000  1.00  0.00
//! TER
//! END
//! ";
//!
//! let structure = parse_pdb(pdb_text).unwrap();
//! assert_eq!(structure.chain_count(), 1);
//! assert_eq!(structure.get_chain('A').unwrap().ca_atoms().len(), 1);
//! ```

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod geometry;
pub mod pdb;
pub mod qcp;
pub mod types;

pub use geometry::{centered, centroid};
pub use pdb::parse_pdb;
pub use qcp::{qcp_rmsd, qcp_rmsd_precentered, QcpScratch};
pub use types::{Atom, Chain, Point3D, Residue, Structure};
