//! Persistence: binary map and reference-table files plus the table cache.
//!
//! | Extension | Content |
//! |-----------|---------|
//! | `.omap` | occupancy field, limits and low-res grid size |
//! | `.rtab` | reference scans of one map, keyed by map identity |
//!
//! Both formats are little-endian with a fixed-size header starting with
//! magic bytes and a version byte.

use std::io::Read;

mod cache;
mod map_format;
mod table_format;

pub use cache::ReferenceTableCache;
pub use map_format::{load_map, read_map, save_map, write_map};
pub use table_format::{load_table, read_table, save_table, write_table};

/// Error type for I/O operations
#[derive(Debug, Clone, PartialEq)]
pub enum IoError {
    /// File I/O error
    Io(String),
    /// Invalid format
    InvalidFormat(String),
    /// Version mismatch
    VersionMismatch {
        /// Expected format version
        expected: u8,
        /// Found format version
        found: u8,
    },
    /// Stored data belongs to a different map
    MapMismatch {
        /// Identity of the map in use
        expected: u64,
        /// Identity found in the file
        found: u64,
    },
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::Io(msg) => write!(f, "I/O error: {}", msg),
            IoError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            IoError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            IoError::MapMismatch { expected, found } => {
                write!(
                    f,
                    "Map mismatch: expected {:016x}, found {:016x}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(e.to_string())
    }
}

/// Largest payload a header may declare (1 GiB).
const MAX_PAYLOAD_BYTES: usize = 1 << 30;

/// Read the payload declared by header dimensions.
///
/// The size is overflow-checked and capped before anything is allocated,
/// and the buffer grows only as data actually arrives.
fn read_payload<R: Read>(
    reader: &mut R,
    dims: &[usize],
    elem: usize,
) -> Result<Vec<u8>, IoError> {
    let len = dims
        .iter()
        .try_fold(elem, |acc, &d| acc.checked_mul(d))
        .filter(|&len| len <= MAX_PAYLOAD_BYTES)
        .ok_or_else(|| {
            IoError::InvalidFormat(format!("Payload size out of range: {:?} × {}", dims, elem))
        })?;

    let mut raw = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut raw)?;
    if raw.len() != len {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    Ok(raw)
}

/// Little-endian field reader over a fixed header.
struct HeaderReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> HeaderReader<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u32(&mut self) -> usize {
        u32::from_le_bytes(self.take()) as usize
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    fn f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take())
    }
}

/// Little-endian field writer into a fixed header.
struct HeaderWriter<'a> {
    bytes: &'a mut [u8],
    pos: usize,
}

impl<'a> HeaderWriter<'a> {
    fn new(bytes: &'a mut [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn put(&mut self, data: &[u8]) {
        self.bytes[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
    }

    fn u32(&mut self, v: usize) {
        self.put(&(v as u32).to_le_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.put(&v.to_le_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.put(&v.to_le_bytes());
    }
}
