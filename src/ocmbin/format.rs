//! Legacy container format constants.

/// Size of the textual header slot at the start of a legacy file, in bytes.
pub const HEADER_SIZE: usize = 8192;

/// Padding byte used to fill the unused tail of the header slot.
pub const HEADER_PAD: u8 = 0x00;

/// File extensions recognized as legacy single-file containers.
pub const LEGACY_EXTENSIONS: &[&str] = &["ocmbin", "ocm", "bin"];

/// Name of the distinguished primary dataset.
pub const PRIMARY_DATASET: &str = "cube";

/// Name of the distinguished Z-position dataset.
pub const POSITION_DATASET: &str = "position";

/// Scale factor from stored nanometers to exposed micrometers.
pub const NM_PER_UM: f64 = 1000.0;
