//! Allocation/write overlap analysis for legacy dataset regions.
//!
//! The capture process pre-allocates a byte slot per dataset (`StartByte` to
//! `StopByte`) and records the last byte it actually wrote (`LastByte`). A
//! written extent past the pre-allocated slot means the writer ran over its
//! region - evidence of a truncated or corrupted capture that callers must
//! surface. Detection is informational: the region up to `StopByte` is
//! still readable.

use serde::{Deserialize, Serialize};

/// Pre-allocated and written byte extents of one legacy dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    /// First byte of the pre-allocated region (absolute file offset).
    #[serde(rename = "StartByte")]
    pub start_byte: u64,
    /// End of the pre-allocated region (exclusive).
    #[serde(rename = "StopByte")]
    pub stop_byte: u64,
    /// Last byte actually written by the capture process.
    #[serde(rename = "LastByte")]
    pub last_byte: u64,
}

impl ByteRange {
    /// Compute allocation/write statistics. Pure arithmetic, no I/O.
    pub fn overlap(&self) -> OverlapReport {
        OverlapReport {
            allocated: self.stop_byte.saturating_sub(self.start_byte),
            written: self.last_byte as i64 - self.start_byte as i64,
            overbyte: self.last_byte as i64 - self.stop_byte as i64,
            overlapped: self.last_byte > self.stop_byte,
        }
    }
}

/// Allocation/write statistics for one dataset region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlapReport {
    /// Bytes pre-allocated for the dataset.
    pub allocated: u64,
    /// Bytes actually written (negative when `last_byte` precedes the
    /// region start in a corrupt header).
    pub written: i64,
    /// Bytes written past the allocation (negative when under-full).
    pub overbyte: i64,
    /// True when the writer exceeded its pre-allocated slot.
    pub overlapped: bool,
}
