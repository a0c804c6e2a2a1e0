//! Core types for protein 3D structure representation.
//!
//! The bag-of-fragments engine only ever looks at alpha-carbon backbones, so
//! these types keep just enough of each PDB record to recover them.

use physalia_core::{Annotated, Summarizable};

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// A point in 3D Cartesian space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    /// Create a new point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Dot product.
    pub fn dot(&self, other: &Point3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Vector magnitude.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Vector addition.
    pub fn add(&self, other: &Point3D) -> Point3D {
        Point3D {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    /// Vector subtraction.
    pub fn sub(&self, other: &Point3D) -> Point3D {
        Point3D {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Scalar multiplication.
    pub fn scale(&self, s: f64) -> Point3D {
        Point3D {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

/// A single atom in a macromolecular structure.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atom {
    /// Atom serial number.
    pub serial: u32,
    /// Atom name (e.g. "CA", "N", "CB").
    pub name: String,
    /// Alternate location indicator.
    pub alt_loc: Option<char>,
    /// 3D coordinates in Angstroms.
    pub coords: Point3D,
    /// Whether this is a HETATM record.
    pub is_hetatm: bool,
}

impl Atom {
    /// Whether this is an alpha carbon.
    pub fn is_alpha_carbon(&self) -> bool {
        self.name.trim() == "CA"
    }
}

/// The twenty standard amino acids plus selenomethionine, which PDB files
/// record as a modified residue but which still carries a Cα.
const AMINO_ACIDS: &[&str] = &[
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE", "LEU", "LYS", "MET",
    "MSE", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
];

/// A residue (amino acid or nucleotide) in a chain.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Residue {
    /// Three-letter residue name (e.g. "ALA", "GLY").
    pub name: String,
    /// Sequence number from the PDB file.
    pub seq_num: i32,
    /// Insertion code.
    pub i_code: Option<char>,
    /// Atoms belonging to this residue.
    pub atoms: Vec<Atom>,
}

impl Residue {
    /// Get an atom by name, returning the first match.
    pub fn get_atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name.trim() == name)
    }

    /// Get the alpha carbon atom.
    pub fn get_alpha_carbon(&self) -> Option<&Atom> {
        self.get_atom("CA")
    }

    /// Whether this residue is a (standard) amino acid.
    pub fn is_amino_acid(&self) -> bool {
        AMINO_ACIDS.contains(&self.name.trim())
    }
}

impl Annotated for Residue {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A polypeptide chain.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chain {
    /// Single-character chain identifier.
    pub id: char,
    /// Residues in this chain, in sequence order.
    pub residues: Vec<Residue>,
    /// String form of chain ID for trait impl.
    chain_id_str: String,
}

impl Chain {
    /// Create a new chain.
    pub fn new(id: char, residues: Vec<Residue>) -> Self {
        Self {
            id,
            residues,
            chain_id_str: format!("Chain {}", id),
        }
    }

    /// Number of residues.
    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    /// Alpha-carbon coordinates in residue order, skipping residues that
    /// have no Cα atom.
    pub fn ca_atoms(&self) -> Vec<Point3D> {
        self.residues
            .iter()
            .filter_map(|r| r.get_alpha_carbon())
            .map(|a| a.coords)
            .collect()
    }

    /// Whether this chain is a protein chain: it must contain at least one
    /// amino-acid residue with an alpha carbon.
    pub fn is_protein(&self) -> bool {
        self.residues
            .iter()
            .any(|r| r.is_amino_acid() && r.get_alpha_carbon().is_some())
    }
}

impl Annotated for Chain {
    fn name(&self) -> &str {
        &self.chain_id_str
    }
}

/// A complete macromolecular structure (one or more chains).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Structure {
    /// PDB identifier or user-supplied name.
    pub id: String,
    /// Chains in this structure.
    pub chains: Vec<Chain>,
}

impl Structure {
    /// Number of chains.
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Total residues across all chains.
    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|c| c.residue_count()).sum()
    }

    /// Get a chain by its single-character ID.
    pub fn get_chain(&self, id: char) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Chains that look like protein chains.
    pub fn protein_chains(&self) -> Vec<&Chain> {
        self.chains.iter().filter(|c| c.is_protein()).collect()
    }
}

impl Annotated for Structure {
    fn name(&self) -> &str {
        &self.id
    }
}

impl Summarizable for Structure {
    fn summary(&self) -> String {
        format!(
            "Structure {} — {} chain(s), {} residue(s)",
            self.id,
            self.chain_count(),
            self.residue_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn make_atom(name: &str, x: f64, y: f64, z: f64) -> Atom {
        Atom {
            serial: 1,
            name: name.into(),
            alt_loc: None,
            coords: Point3D::new(x, y, z),
            is_hetatm: false,
        }
    }

    fn make_residue(name: &str, seq_num: i32, atoms: Vec<Atom>) -> Residue {
        Residue {
            name: name.into(),
            seq_num,
            i_code: None,
            atoms,
        }
    }

    #[test]
    fn point3d_arithmetic() {
        let a = Point3D::new(1.0, 2.0, 3.0);
        let b = Point3D::new(4.0, 5.0, 6.0);
        assert_eq!(a.add(&b), Point3D::new(5.0, 7.0, 9.0));
        assert_eq!(a.sub(&b), Point3D::new(-3.0, -3.0, -3.0));
        assert!((a.dot(&b) - 32.0).abs() < 1e-10);
        assert!((a.scale(2.0).x - 2.0).abs() < 1e-10);
        assert!((a.distance_to(&b) - (27.0_f64).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn atom_alpha_carbon_detection() {
        assert!(make_atom("CA", 0.0, 0.0, 0.0).is_alpha_carbon());
        assert!(make_atom(" CA ", 0.0, 0.0, 0.0).is_alpha_carbon());
        assert!(!make_atom("CB", 0.0, 0.0, 0.0).is_alpha_carbon());
    }

    #[test]
    fn chain_ca_atoms_skips_missing() {
        let chain = Chain::new(
            'A',
            vec![
                make_residue("ALA", 1, vec![make_atom("CA", 1.0, 0.0, 0.0)]),
                make_residue("GLY", 2, vec![make_atom("N", 0.0, 0.0, 0.0)]),
                make_residue("VAL", 3, vec![make_atom("CA", 3.0, 0.0, 0.0)]),
            ],
        );
        let cas = chain.ca_atoms();
        assert_eq!(cas.len(), 2);
        assert_eq!(cas[1], Point3D::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn protein_chain_detection() {
        let protein = Chain::new(
            'A',
            vec![make_residue("ALA", 1, vec![make_atom("CA", 1.0, 0.0, 0.0)])],
        );
        let water = Chain::new(
            'W',
            vec![make_residue("HOH", 1, vec![make_atom("O", 0.0, 0.0, 0.0)])],
        );
        assert!(protein.is_protein());
        assert!(!water.is_protein());
    }

    #[test]
    fn structure_summary() {
        let s = Structure {
            id: "1ABC".into(),
            chains: vec![Chain::new(
                'A',
                vec![make_residue("GLY", 1, vec![make_atom("CA", 1.0, 2.0, 3.0)])],
            )],
        };
        assert!(s.summary().contains("1ABC"));
        assert!(s.summary().contains("1 chain"));
        assert_eq!(s.protein_chains().len(), 1);
    }
}
