//! Dataset shapes - 1 to 3 positive dimensions.

use smallvec::SmallVec;

use super::{Error, Result};

/// Shape of a dataset as declared in container metadata.
///
/// Datasets are vectors, images or volumes; rank 0 and rank > 3 are
/// rejected at construction so downstream code only ever sees 1-3 dims.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; 3]>,
}

impl Shape {
    /// Create a shape from dimension sizes, validating rank and extents.
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() || dims.len() > 3 || dims.iter().any(|&d| d == 0) {
            return Err(Error::UnsupportedShape(dims.to_vec()));
        }
        Ok(Self { dims: SmallVec::from_slice(dims) })
    }

    /// Create from u64 sizes as they appear in headers. Sizes beyond the
    /// address space (possible on 32-bit targets) are rejected, not
    /// truncated; the error payload clamps them for display.
    pub fn from_u64(dims: &[u64]) -> Result<Self> {
        let mut sizes = Vec::with_capacity(dims.len());
        for &d in dims {
            match usize::try_from(d) {
                Ok(v) => sizes.push(v),
                Err(_) => {
                    return Err(Error::UnsupportedShape(
                        dims.iter()
                            .map(|&d| usize::try_from(d).unwrap_or(usize::MAX))
                            .collect(),
                    ))
                }
            }
        }
        Self::new(&sizes)
    }

    /// Number of dimensions (1-3).
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of one dimension.
    pub fn size(&self, dim: usize) -> Option<usize> {
        self.dims.get(dim).copied()
    }

    /// All dimension sizes.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of elements.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, s) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "{}", s)?;
        }
        write!(f, "]")
    }
}
