//! PDB format parser.
//!
//! Parses ATOM, HETATM, TER, HEADER, and MODEL/ENDMDL records from PDB-format
//! text. Only the first MODEL is returned for multi-model (NMR) files.
//!
//! The parser keeps only what the fragment engine consumes: atom names and
//! coordinates grouped into residues and chains. Occupancy, B-factors, and
//! element columns are ignored.

use physalia_core::{PhysaliaError, Result};

use crate::types::{Atom, Chain, Point3D, Residue, Structure};

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Parse a PDB-format string into a [`Structure`].
///
/// # Errors
///
/// Returns an error if no ATOM records are found or if an ATOM record is
/// malformed (wrong column widths, unparseable coordinates).
pub fn parse_pdb(input: &str) -> Result<Structure> {
    let mut id = String::from("UNKN");
    let mut current_chain_id: Option<char> = None;
    let mut current_residue_key: Option<(i32, Option<char>, String)> = None;
    let mut chains: Vec<Chain> = Vec::new();
    let mut residues: Vec<Residue> = Vec::new();
    let mut atoms: Vec<Atom> = Vec::new();
    let mut atom_count = 0u32;
    let mut in_first_model = true;

    for line in input.lines() {
        if line.starts_with("ENDMDL") {
            break; // only first model
        }
        if line.starts_with("MODEL") {
            if !in_first_model {
                break;
            }
            in_first_model = false;
            continue;
        }

        if line.starts_with("HEADER") && line.len() >= 66 {
            let pdb_id = line[62..66].trim();
            if !pdb_id.is_empty() {
                id = pdb_id.into();
            }
        }

        let is_atom = line.starts_with("ATOM  ");
        let is_hetatm = line.starts_with("HETATM");

        if is_atom || is_hetatm {
            let atom = parse_atom_record(line, is_hetatm)?;
            atom_count += 1;

            let chain_id = parse_chain_id(line);
            let seq_num = parse_residue_seq(line)?;
            let i_code = parse_insertion_code(line);
            let res_name = parse_residue_name(line);

            let res_key = (seq_num, i_code, res_name.clone());

            // Chain changed?
            if current_chain_id != Some(chain_id) {
                // Flush current residue
                if !atoms.is_empty() {
                    if let Some((sn, ic, rn)) = current_residue_key.take() {
                        residues.push(Residue {
                            name: rn,
                            seq_num: sn,
                            i_code: ic,
                            atoms: core::mem::take(&mut atoms),
                        });
                    }
                }
                // Flush current chain
                if let Some(cid) = current_chain_id {
                    if !residues.is_empty() {
                        chains.push(Chain::new(cid, core::mem::take(&mut residues)));
                    }
                }
                current_chain_id = Some(chain_id);
                current_residue_key = Some(res_key);
            } else if current_residue_key.as_ref() != Some(&res_key) {
                // Residue changed within same chain
                if !atoms.is_empty() {
                    if let Some((sn, ic, rn)) = current_residue_key.take() {
                        residues.push(Residue {
                            name: rn,
                            seq_num: sn,
                            i_code: ic,
                            atoms: core::mem::take(&mut atoms),
                        });
                    }
                }
                current_residue_key = Some(res_key);
            }

            atoms.push(atom);
        }

        if line.starts_with("TER") {
            // Flush residue + chain
            if !atoms.is_empty() {
                if let Some((sn, ic, rn)) = current_residue_key.take() {
                    residues.push(Residue {
                        name: rn,
                        seq_num: sn,
                        i_code: ic,
                        atoms: core::mem::take(&mut atoms),
                    });
                }
            }
            if let Some(cid) = current_chain_id.take() {
                if !residues.is_empty() {
                    chains.push(Chain::new(cid, core::mem::take(&mut residues)));
                }
            }
        }
    }

    // Flush remaining
    if !atoms.is_empty() {
        if let Some((sn, ic, rn)) = current_residue_key.take() {
            residues.push(Residue {
                name: rn,
                seq_num: sn,
                i_code: ic,
                atoms,
            });
        }
    }
    if let Some(cid) = current_chain_id {
        if !residues.is_empty() {
            chains.push(Chain::new(cid, residues));
        }
    }

    if atom_count == 0 {
        return Err(PhysaliaError::Parse("no ATOM records found".into()));
    }

    Ok(Structure { id, chains })
}

/// Parse a PDB file from disk.
#[cfg(feature = "std")]
pub fn parse_pdb_file(path: impl AsRef<::std::path::Path>) -> Result<Structure> {
    let path = path.as_ref();
    let contents = ::std::fs::read_to_string(path).map_err(|e| {
        PhysaliaError::Io(::std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    parse_pdb(&contents)
}

fn parse_atom_record(line: &str, is_hetatm: bool) -> Result<Atom> {
    // PDB format is fixed-width columns. We need at least 54 chars for coords.
    if line.len() < 54 {
        return Err(PhysaliaError::Parse(format!(
            "ATOM record too short ({} chars): {}",
            line.len(),
            line
        )));
    }

    let serial = safe_slice(line, 6, 11)
        .trim()
        .parse::<u32>()
        .map_err(|e| PhysaliaError::Parse(format!("bad atom serial: {}", e)))?;

    let name = safe_slice(line, 12, 16).to_string();

    let alt_loc = {
        let c = safe_slice(line, 16, 17).chars().next().unwrap_or(' ');
        if c == ' ' {
            None
        } else {
            Some(c)
        }
    };

    let x = safe_slice(line, 30, 38)
        .trim()
        .parse::<f64>()
        .map_err(|e| PhysaliaError::Parse(format!("bad x coordinate: {}", e)))?;
    let y = safe_slice(line, 38, 46)
        .trim()
        .parse::<f64>()
        .map_err(|e| PhysaliaError::Parse(format!("bad y coordinate: {}", e)))?;
    let z = safe_slice(line, 46, 54)
        .trim()
        .parse::<f64>()
        .map_err(|e| PhysaliaError::Parse(format!("bad z coordinate: {}", e)))?;

    Ok(Atom {
        serial,
        name,
        alt_loc,
        coords: Point3D::new(x, y, z),
        is_hetatm,
    })
}

fn parse_chain_id(line: &str) -> char {
    safe_slice(line, 21, 22).chars().next().unwrap_or(' ')
}

fn parse_residue_seq(line: &str) -> Result<i32> {
    safe_slice(line, 22, 26)
        .trim()
        .parse::<i32>()
        .map_err(|e| PhysaliaError::Parse(format!("bad residue seq number: {}", e)))
}

fn parse_insertion_code(line: &str) -> Option<char> {
    let c = safe_slice(line, 26, 27).chars().next().unwrap_or(' ');
    if c == ' ' {
        None
    } else {
        Some(c)
    }
}

fn parse_residue_name(line: &str) -> String {
    safe_slice(line, 17, 20).trim().to_string()
}

/// Safe substring that handles short lines gracefully.
fn safe_slice(s: &str, start: usize, end: usize) -> &str {
    let bytes = s.as_bytes();
    let len = bytes.len();
    if start >= len {
        return "";
    }
    let actual_end = end.min(len);
    // PDB files are ASCII, so byte boundaries = char boundaries
    &s[start..actual_end]
}
