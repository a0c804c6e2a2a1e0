//! Binary encoding of database entry records.
//!
//! All encode/decode logic for the `bow.db` wire format lives here. Each
//! record is big-endian:
//!
//! | field     | bytes   |
//! |-----------|---------|
//! | entry_len | 4 (u32) |
//! | id        | variable, NUL-terminated UTF-8 |
//! | counts    | N × 2 (i16), fragment-index order |
//!
//! with `entry_len = len(id) + 1 + 2·N`. The library size N is not stored;
//! readers know it from the loaded library. Counts are signed 16-bit on the
//! wire but interpreted as nonnegative. EOF between records ends a stream
//! cleanly; EOF inside a record is corruption.
//!
//! Encoder and decoder each reuse one record buffer across calls.

use std::io::Read;

use physalia_core::{PhysaliaError, Result};
use physalia_frag::bow::Bow;

use crate::db::Entry;

/// Serializes entries into the record format, reusing one buffer.
#[derive(Debug, Default)]
pub struct EntryEncoder {
    buf: Vec<u8>,
}

impl EntryEncoder {
    pub fn new() -> EntryEncoder {
        EntryEncoder {
            buf: Vec::with_capacity(256),
        }
    }

    /// Encode one entry, returning the full record (length prefix included).
    /// The returned slice is valid until the next call.
    ///
    /// Counts above `i16::MAX` are out of contract and clamp to the wire
    /// field width.
    pub fn encode(&mut self, entry: &Entry, library_size: usize) -> Result<&[u8]> {
        if entry.bow.len() != library_size {
            return Err(PhysaliaError::LengthMismatch {
                expected: library_size,
                got: entry.bow.len(),
            });
        }
        if entry.id.as_bytes().contains(&0) {
            return Err(PhysaliaError::InvalidInput(format!(
                "entry id {:?} contains a NUL byte",
                entry.id
            )));
        }

        let payload_len = entry.id.len() + 1 + 2 * library_size;
        self.buf.clear();
        self.buf
            .extend_from_slice(&(payload_len as u32).to_be_bytes());
        self.buf.extend_from_slice(entry.id.as_bytes());
        self.buf.push(0);
        for &freq in &entry.bow.freqs {
            let wire = freq.min(i16::MAX as u32) as i16;
            self.buf.extend_from_slice(&wire.to_be_bytes());
        }
        Ok(&self.buf)
    }
}

/// Deserializes entries from the record format, reusing one buffer.
#[derive(Debug)]
pub struct EntryDecoder {
    library_size: usize,
    buf: Vec<u8>,
}

impl EntryDecoder {
    pub fn new(library_size: usize) -> EntryDecoder {
        EntryDecoder {
            library_size,
            buf: Vec::new(),
        }
    }

    /// Read the next record, or `None` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// `Corrupt` on EOF inside a record, on an `entry_len` too small to hold
    /// the fixed fields, on a missing NUL terminator, or on a non-UTF-8 id.
    pub fn read_from<R: Read>(&mut self, r: &mut R) -> Result<Option<Entry>> {
        let mut len_bytes = [0u8; 4];
        if !read_prefix(r, &mut len_bytes)? {
            return Ok(None);
        }
        let entry_len = u32::from_be_bytes(len_bytes) as usize;

        let fixed = 1 + 2 * self.library_size;
        if entry_len < fixed {
            return Err(PhysaliaError::Corrupt(format!(
                "entry length {} is shorter than the {} fixed bytes",
                entry_len, fixed
            )));
        }

        self.buf.resize(entry_len, 0);
        r.read_exact(&mut self.buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                PhysaliaError::Corrupt("unexpected EOF inside an entry record".into())
            } else {
                PhysaliaError::Io(e)
            }
        })?;

        let id_len = entry_len - fixed;
        if self.buf[id_len] != 0 {
            return Err(PhysaliaError::Corrupt(
                "entry id is not NUL-terminated".into(),
            ));
        }
        let id = std::str::from_utf8(&self.buf[..id_len])
            .map_err(|_| PhysaliaError::Corrupt("entry id is not valid UTF-8".into()))?
            .to_string();

        let mut freqs = Vec::with_capacity(self.library_size);
        for pair in self.buf[id_len + 1..].chunks_exact(2) {
            let wire = i16::from_be_bytes([pair[0], pair[1]]);
            freqs.push(wire.max(0) as u32);
        }

        Ok(Some(Entry {
            id,
            bow: Bow { freqs },
        }))
    }
}

/// Fill `buf` from the reader. `Ok(false)` on a clean EOF before the first
/// byte; `Corrupt` on EOF partway through.
fn read_prefix<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(PhysaliaError::Corrupt(
                "unexpected EOF inside an entry length prefix".into(),
            ));
        }
        filled += n;
    }
    Ok(true)
}
