//! `.omap` occupancy map format.
//!
//! Format:
//! - Header (64 bytes):
//!   - Magic: "DOMAP" (5 bytes)
//!   - Version: u8 (1 byte)
//!   - Rows, cols: u32 each (little-endian)
//!   - Grid rows, grid cols: u32 each
//!   - X limits, Y limits: 2 × f64 each
//!   - Map identity: u64
//!   - Reserved: 2 bytes
//! - Cell data: rows * cols f32, little-endian, row-major

use std::io::{Read, Write};
use std::path::Path;

use crate::core::GridLimits;
use crate::map::OccupancyMap;

use super::{HeaderReader, HeaderWriter, IoError, read_payload};

/// Magic bytes for .omap format
const MAGIC: &[u8; 5] = b"DOMAP";

/// Current format version
const VERSION: u8 = 1;

/// Header size in bytes
const HEADER_SIZE: usize = 64;

/// Save a map to .omap binary format
pub fn save_map(map: &OccupancyMap, path: &Path) -> Result<(), IoError> {
    let mut file = std::fs::File::create(path)?;
    write_map(map, &mut file)
}

/// Write a map to a writer in .omap format
pub fn write_map<W: Write>(map: &OccupancyMap, writer: &mut W) -> Result<(), IoError> {
    let mut header = [0u8; HEADER_SIZE];
    header[0..5].copy_from_slice(MAGIC);
    header[5] = VERSION;

    let (grid_rows, grid_cols) = map.grid_dims();
    let mut w = HeaderWriter::new(&mut header, 6);
    w.u32(map.rows());
    w.u32(map.cols());
    w.u32(grid_rows);
    w.u32(grid_cols);
    w.f64(map.x_limits().lo);
    w.f64(map.x_limits().hi);
    w.f64(map.y_limits().lo);
    w.f64(map.y_limits().hi);
    w.u64(map.id());

    writer.write_all(&header)?;

    let mut cells = Vec::with_capacity(map.cells().len() * 4);
    for v in map.cells() {
        cells.extend_from_slice(&v.to_le_bytes());
    }
    writer.write_all(&cells)?;
    Ok(())
}

/// Load a map from .omap binary format
pub fn load_map(path: &Path) -> Result<OccupancyMap, IoError> {
    let mut file = std::fs::File::open(path)?;
    read_map(&mut file)
}

/// Read a map from a reader in .omap format.
///
/// The identity recomputed from the cells must equal the stored one.
pub fn read_map<R: Read>(reader: &mut R) -> Result<OccupancyMap, IoError> {
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
    let grid_rows = h.u32();
    let grid_cols = h.u32();
    let x_limits = GridLimits::new(h.f64(), h.f64());
    let y_limits = GridLimits::new(h.f64(), h.f64());
    let stored_id = h.u64();

    let raw = read_payload(reader, &[rows, cols], 4)?;
    let cells: Vec<f32> = raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let map = OccupancyMap::from_cells(rows, cols, x_limits, y_limits, cells, grid_rows, grid_cols)
        .map_err(|e| IoError::InvalidFormat(e.to_string()))?;
    if map.id() != stored_id {
        return Err(IoError::MapMismatch {
            expected: stored_id,
            found: map.id(),
        });
    }
    Ok(map)
}
