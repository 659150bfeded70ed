//! `.rtab` reference scan table format.
//!
//! Format:
//! - Header (48 bytes):
//!   - Magic: "DRTAB" (5 bytes)
//!   - Version: u8 (1 byte)
//!   - Rows, cols, rays: u32 each (little-endian)
//!   - Min range, max range: f64 each
//!   - Map identity: u64
//!   - Reserved: 6 bytes
//! - Range data: rows * cols * rays f64, little-endian, cell-major

use std::io::{Read, Write};
use std::path::Path;

use crate::sensor::ReferenceScanTable;

use super::{HeaderReader, HeaderWriter, IoError, read_payload};

/// Magic bytes for .rtab format
const MAGIC: &[u8; 5] = b"DRTAB";

/// Current format version
const VERSION: u8 = 1;

/// Header size in bytes
const HEADER_SIZE: usize = 48;

/// Save a table to .rtab binary format
pub fn save_table(table: &ReferenceScanTable, path: &Path) -> Result<(), IoError> {
    let mut file = std::fs::File::create(path)?;
    write_table(table, &mut file)
}

/// Write a table to a writer in .rtab format
pub fn write_table<W: Write>(table: &ReferenceScanTable, writer: &mut W) -> Result<(), IoError> {
    let mut header = [0u8; HEADER_SIZE];
    header[0..5].copy_from_slice(MAGIC);
    header[5] = VERSION;

    let (min, max) = table.range_bounds();
    let mut w = HeaderWriter::new(&mut header, 6);
    w.u32(table.rows());
    w.u32(table.cols());
    w.u32(table.rays());
    w.f64(min);
    w.f64(max);
    w.u64(table.map_id());
    writer.write_all(&header)?;

    let mut data = Vec::with_capacity(table.data().len() * 8);
    for v in table.data() {
        data.extend_from_slice(&v.to_le_bytes());
    }
    writer.write_all(&data)?;
    Ok(())
}

/// Load a table from .rtab binary format
pub fn load_table(path: &Path) -> Result<ReferenceScanTable, IoError> {
    let mut file = std::fs::File::open(path)?;
    read_table(&mut file)
}

/// Read a table from a reader in .rtab format
pub fn read_table<R: Read>(reader: &mut R) -> Result<ReferenceScanTable, IoError> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    if &header[0..5] != MAGIC {
        return Err(IoError::InvalidFormat("Invalid magic bytes".to_string()));
    }
    let version = header[5];
    if version != VERSION {
        return Err(IoError::VersionMismatch {
            expected: VERSION,
            found: version,
        });
    }

    let mut h = HeaderReader::new(&header, 6);
    let rows = h.u32();
    let cols = h.u32();
    let rays = h.u32();
    let min_range = h.f64();
    let max_range = h.f64();
    let map_id = h.u64();

    let raw = read_payload(reader, &[rows, cols, rays], 8)?;
    let data: Vec<f64> = raw
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect();

    ReferenceScanTable::from_parts(rows, cols, rays, min_range, max_range, map_id, data)
        .map_err(|e| IoError::InvalidFormat(e.to_string()))
}
