//! Legacy single-file container format.
//!
//! A legacy capture is one file: a fixed 8192-byte JSON header slot followed
//! by concatenated dataset regions at absolute byte offsets. This module
//! holds the format constants, the header codec, the allocation-overlap
//! analysis and the region reader; the [`crate::cube`] layer drives them.

pub mod format;
pub mod header;
pub mod overlap;
pub mod region;

pub use format::{HEADER_SIZE, POSITION_DATASET, PRIMARY_DATASET};
pub use header::{
    decode_header, encode_header, read_header, read_header_text, LegacyDataset, LegacyHeader,
};
pub use overlap::{ByteRange, OverlapReport};
pub use region::{decode_volume, map_region, read_region, Layout, MappedVolume};
