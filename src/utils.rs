//! Utility functions: file helpers and the binary array codec.

use crate::error::{AuxError, Result};

use std::fs;
use std::path::Path;

//-----------------------------------------------------------------------------

// Utilities for working with files.

const SIZE_UNITS: [(f64, &str); 6] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0, "PiB"),
];

/// Returns a human-readable representation of the given number of bytes.
pub fn human_readable_size(bytes: usize) -> String {
    let mut unit = 0;
    let value = bytes as f64;
    while unit + 1 < SIZE_UNITS.len() && value >= SIZE_UNITS[unit + 1].0 {
        unit += 1;
    }
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

/// Returns a human-readable size of the file, or [`None`] if the file does not exist.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    let metadata = fs::metadata(filename).ok()?;
    Some(human_readable_size(metadata.len() as usize))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

//-----------------------------------------------------------------------------

// Array encoding and decoding.

/// A fixed-width unsigned integer type that can be stored in an array blob.
///
/// The auxiliary databases use [`u16`] for coverage values and [`u8`] for
/// nucleotide position flags.
pub trait Element: Copy {
    /// Width of one encoded element in bytes.
    const WIDTH: usize;

    /// Appends the little-endian encoding of the value to the buffer.
    fn write_le(self, buffer: &mut Vec<u8>);

    /// Decodes a value from a little-endian buffer of exactly [`Self::WIDTH`](Element::WIDTH) bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

impl Element for u8 {
    const WIDTH: usize = 1;

    fn write_le(self, buffer: &mut Vec<u8>) {
        buffer.push(self);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Element for u16 {
    const WIDTH: usize = 2;

    fn write_le(self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }
}

/// Encodes a numeric array as a dense little-endian blob.
///
/// The blob stores `values.len() * T::WIDTH` bytes with no length prefix,
/// separators, or compression. See [`decode_array`] for decoding.
pub fn encode_array<T: Element>(values: &[T]) -> Vec<u8> {
    let mut blob: Vec<u8> = Vec::with_capacity(values.len() * T::WIDTH);
    for value in values {
        value.write_le(&mut blob);
    }
    blob
}

/// Decodes a blob encoded with [`encode_array`] back into a numeric array.
///
/// The number of elements is the blob length divided by the element width.
///
/// # Errors
///
/// Fails with [`AuxError::InvalidBlob`] if the blob length is not a multiple
/// of the element width.
pub fn decode_array<T: Element>(blob: &[u8]) -> Result<Vec<T>> {
    if blob.len() % T::WIDTH != 0 {
        return Err(AuxError::InvalidBlob { len: blob.len(), width: T::WIDTH });
    }
    let mut values: Vec<T> = Vec::with_capacity(blob.len() / T::WIDTH);
    for chunk in blob.chunks_exact(T::WIDTH) {
        values.push(T::read_le(chunk));
    }
    Ok(values)
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
