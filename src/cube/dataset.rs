//! Dataset descriptors - resolved, format-agnostic metadata.

use std::path::PathBuf;

use crate::ocmbin::ByteRange;
use crate::util::{ByteOrder, ElementType, Shape};

/// Fully resolved description of one dataset, independent of the container
/// format it came from. Legacy datasets carry a byte region inside the
/// container file; sidecar datasets reference a whole raw file instead.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetDescriptor {
    pub name: String,
    pub dtype: ElementType,
    pub order: ByteOrder,
    /// True when the header did not declare a byte order and the
    /// little-endian default was assumed.
    pub order_defaulted: bool,
    pub shape: Shape,
    /// Byte region inside a legacy container.
    pub region: Option<ByteRange>,
    /// Backing raw file, relative to the header document (sidecar format).
    pub source: Option<PathBuf>,
}
