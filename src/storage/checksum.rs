//! CRC32 checksums for document records
//!
//! Every record carries a CRC32 (IEEE polynomial) over its length and body.
//! A mismatch on read is data corruption.

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
