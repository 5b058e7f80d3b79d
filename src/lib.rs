//! # vcube
//!
//! Reader and converter for volumetric imaging "cube" containers
//! produced by optical-imaging instruments.
//!
//! Four physical layouts are supported behind one [`cube::Cube`] type:
//! the legacy single-file binary container with an embedded 8 KiB JSON
//! header, the newer JSON-sidecar-plus-raw-files layout, TIFF page
//! stacks, and Thorlabs `.oct` capture archives.
//!
//! ## Modules
//!
//! - [`util`] - Element types, byte orders, shapes, volumes, errors
//! - [`ocmbin`] - Legacy container primitives (header codec, overlap
//!   analysis, region reading)
//! - [`cube`] - The `Cube` model, its storage backends, and the
//!   path-to-backend facade
//!
//! ## Example
//!
//! ```ignore
//! use vcube::prelude::*;
//!
//! let cube = open_cube("scan.ocmbin")?;
//! println!("{} {}", cube.primary()?.dtype(), cube.primary()?.rank());
//! let bscan = cube.slice(2, 0)?;
//! cube.save("scan.json")?;
//! ```

pub mod cube;
pub mod ocmbin;
pub mod util;

// Re-export commonly used types
pub use cube::{open_cube, save_cube, Cube, CubeFormat};
pub use util::{ByteOrder, ElementType, Error, Result, Shape, Volume};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cube::{detect_format, open_cube, save_cube, Cube, CubeFormat, DatasetDescriptor};
    pub use crate::ocmbin::{ByteRange, Layout, OverlapReport};
    pub use crate::util::{ByteOrder, ElementType, Error, Result, Shape, Volume};
}
