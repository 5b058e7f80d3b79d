//! Typed n-dimensional arrays.
//!
//! A [`Volume`] is a decoded dataset: one of the ten fixed-width element
//! types behind a dynamic-rank `ndarray` array. Backends construct volumes,
//! the cube facade slices and converts them.

use ndarray::{ArrayD, Axis};

use super::{ElementType, Error, Result};

/// A decoded dataset: element type tag + dynamic-rank array.
#[derive(Clone, Debug, PartialEq)]
pub enum Volume {
    U8(ArrayD<u8>),
    I8(ArrayD<i8>),
    U16(ArrayD<u16>),
    I16(ArrayD<i16>),
    U32(ArrayD<u32>),
    I32(ArrayD<i32>),
    U64(ArrayD<u64>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// Run `$body` against the inner array of any variant.
macro_rules! volume_map {
    ($vol:expr, |$arr:ident| $body:expr) => {
        match $vol {
            Volume::U8($arr) => $body,
            Volume::I8($arr) => $body,
            Volume::U16($arr) => $body,
            Volume::I16($arr) => $body,
            Volume::U32($arr) => $body,
            Volume::I32($arr) => $body,
            Volume::U64($arr) => $body,
            Volume::I64($arr) => $body,
            Volume::F32($arr) => $body,
            Volume::F64($arr) => $body,
        }
    };
}

/// Run `$body` against the inner array, re-wrapping in the same variant.
macro_rules! volume_same {
    ($vol:expr, |$arr:ident| $body:expr) => {
        match $vol {
            Volume::U8($arr) => Volume::U8($body),
            Volume::I8($arr) => Volume::I8($body),
            Volume::U16($arr) => Volume::U16($body),
            Volume::I16($arr) => Volume::I16($body),
            Volume::U32($arr) => Volume::U32($body),
            Volume::I32($arr) => Volume::I32($body),
            Volume::U64($arr) => Volume::U64($body),
            Volume::I64($arr) => Volume::I64($body),
            Volume::F32($arr) => Volume::F32($body),
            Volume::F64($arr) => Volume::F64($body),
        }
    };
}

impl Volume {
    /// Element type of this volume.
    pub fn dtype(&self) -> ElementType {
        match self {
            Self::U8(_) => ElementType::Uint8,
            Self::I8(_) => ElementType::Int8,
            Self::U16(_) => ElementType::Uint16,
            Self::I16(_) => ElementType::Int16,
            Self::U32(_) => ElementType::Uint32,
            Self::I32(_) => ElementType::Int32,
            Self::U64(_) => ElementType::Uint64,
            Self::I64(_) => ElementType::Int64,
            Self::F32(_) => ElementType::Float32,
            Self::F64(_) => ElementType::Float64,
        }
    }

    /// Logical shape.
    pub fn shape(&self) -> &[usize] {
        volume_map!(self, |a| a.shape())
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        volume_map!(self, |a| a.ndim())
    }

    /// Total number of elements.
    pub fn num_elements(&self) -> usize {
        volume_map!(self, |a| a.len())
    }

    /// Cross-section at `index` along `axis`: returns a volume of rank
    /// one less, owning its data.
    pub fn slice_axis(&self, axis: usize, index: usize) -> Result<Volume> {
        let rank = self.rank();
        if axis >= rank {
            return Err(Error::AxisOutOfBounds { axis, rank });
        }
        let count = self.shape()[axis];
        if index >= count {
            return Err(Error::IndexOutOfBounds { index, count });
        }
        // index_axis views inherit the parent's strides; permuted parents
        // (the column-major decode path) would yield non-contiguous pages,
        // so normalize to standard layout here.
        Ok(volume_same!(self, |a| a
            .index_axis(Axis(axis), index)
            .as_standard_layout()
            .into_owned()))
    }

    /// Convert to double precision, element-wise.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            Self::U8(a) => a.mapv(|v| v as f64),
            Self::I8(a) => a.mapv(|v| v as f64),
            Self::U16(a) => a.mapv(|v| v as f64),
            Self::I16(a) => a.mapv(|v| v as f64),
            Self::U32(a) => a.mapv(|v| v as f64),
            Self::I32(a) => a.mapv(|v| v as f64),
            Self::U64(a) => a.mapv(|v| v as f64),
            Self::I64(a) => a.mapv(|v| v as f64),
            Self::F32(a) => a.mapv(|v| v as f64),
            Self::F64(a) => a.clone(),
        }
    }

    /// Encode elements in logical row-major order as little-endian bytes.
    /// This is the sidecar raw-file layout.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.num_elements() * self.dtype().num_bytes());
        volume_map!(self, |a| {
            for v in a.iter() {
                out.extend_from_slice(&v.to_le_bytes());
            }
        });
        out
    }

    pub fn as_u8(&self) -> Option<&ArrayD<u8>> {
        match self {
            Self::U8(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&ArrayD<u16>> {
        match self {
            Self::U16(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&ArrayD<u32>> {
        match self {
            Self::U32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            Self::F32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            Self::F64(a) => Some(a),
            _ => None,
        }
    }
}
