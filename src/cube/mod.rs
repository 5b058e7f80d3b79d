//! The cube layer: one in-memory volumetric dataset behind a closed set
//! of storage backends.
//!
//! [`model::Cube`] owns the lifecycle (open, load, unload, save) and the
//! accessors; each backend module implements load/save against one
//! physical layout. [`facade`] maps paths to backends and drives
//! cross-format conversion.

pub mod dataset;
pub mod facade;
pub(crate) mod legacy;
pub mod model;
pub mod sidecar;
pub(crate) mod thor;
pub(crate) mod tiffstack;

pub use dataset::DatasetDescriptor;
pub use facade::{detect_format, open_cube, save_cube};
pub use model::{Cube, CubeFormat};
pub use sidecar::{decode_sidecar, encode_sidecar, SidecarArray, SidecarEntry, SidecarHeader};
