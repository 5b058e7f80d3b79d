//! Region reads: materializing arrays from byte ranges.
//!
//! A region is defined by a byte offset, a declared shape, an element type
//! and a byte order. Reads come in two modes - eager (read fully into owned
//! memory, file handle scoped to the call) and memory-mapped (read-only
//! mapping, pages faulted in on first access) - and both produce identical
//! logical element ordering.
//!
//! Legacy containers store regions column-major relative to the declared
//! shape; the 3-D case is assembled by reshaping into the reversed shape and
//! transposing back, so `A[x, y, z]` is the on-disk element at
//! `x + y*d0 + z*d0*d1`. This reversal is a fixed convention of the capture
//! software, not a heuristic.

use std::cell::OnceCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian as BE, ByteOrder as _, LittleEndian as LE};
use memmap2::Mmap;
use ndarray::{ArrayD, IxDyn};

use crate::util::{ByteOrder, ElementType, Error, Result, Shape, Volume};

/// On-disk element ordering of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Row-major in the declared shape, no transpose (sidecar raw files).
    RowMajor,
    /// Column-major relative to the declared shape (legacy containers,
    /// vendor archives).
    ColumnMajor,
}

/// Decode endian-ordered words into a typed vector.
macro_rules! decode_words {
    ($buf:expr, $order:expr, $ty:ty, $read:ident) => {{
        let mut out = vec![<$ty>::default(); $buf.len() / std::mem::size_of::<$ty>()];
        match $order {
            ByteOrder::Little => LE::$read($buf, &mut out),
            ByteOrder::Big => BE::$read($buf, &mut out),
        }
        out
    }};
}

fn assemble<T>(v: Vec<T>, shape: &Shape, layout: Layout) -> Result<ArrayD<T>> {
    let dims = shape.sizes();
    let shaped = |target: &[usize]| {
        ArrayD::from_shape_vec(IxDyn(target), v)
            .map_err(|e| Error::other(format!("shape mismatch assembling region: {}", e)))
    };
    match layout {
        Layout::RowMajor => shaped(dims),
        Layout::ColumnMajor => match *dims {
            [_] => shaped(dims),
            [d0, d1] => Ok(shaped(&[d0, d1])?.reversed_axes()),
            [d0, d1, d2] => Ok(shaped(&[d2, d1, d0])?.permuted_axes(vec![2, 1, 0])),
            _ => Err(Error::UnsupportedShape(dims.to_vec())),
        },
    }
}

/// Reinterpret a raw byte buffer as a typed, dimension-ordered volume.
pub fn decode_volume(
    buf: &[u8],
    dtype: ElementType,
    order: ByteOrder,
    shape: &Shape,
    layout: Layout,
) -> Result<Volume> {
    let required = shape.num_elements() * dtype.num_bytes();
    if buf.len() < required {
        return Err(Error::TruncatedRegion {
            required: required as u64,
            actual: buf.len() as u64,
        });
    }
    let buf = &buf[..required];
    Ok(match dtype {
        ElementType::Uint8 => Volume::U8(assemble(buf.to_vec(), shape, layout)?),
        ElementType::Int8 => {
            Volume::I8(assemble(bytemuck::cast_slice::<u8, i8>(buf).to_vec(), shape, layout)?)
        }
        ElementType::Uint16 => {
            Volume::U16(assemble(decode_words!(buf, order, u16, read_u16_into), shape, layout)?)
        }
        ElementType::Int16 => {
            Volume::I16(assemble(decode_words!(buf, order, i16, read_i16_into), shape, layout)?)
        }
        ElementType::Uint32 => {
            Volume::U32(assemble(decode_words!(buf, order, u32, read_u32_into), shape, layout)?)
        }
        ElementType::Int32 => {
            Volume::I32(assemble(decode_words!(buf, order, i32, read_i32_into), shape, layout)?)
        }
        ElementType::Uint64 => {
            Volume::U64(assemble(decode_words!(buf, order, u64, read_u64_into), shape, layout)?)
        }
        ElementType::Int64 => {
            Volume::I64(assemble(decode_words!(buf, order, i64, read_i64_into), shape, layout)?)
        }
        ElementType::Float32 => {
            Volume::F32(assemble(decode_words!(buf, order, f32, read_f32_into), shape, layout)?)
        }
        ElementType::Float64 => {
            Volume::F64(assemble(decode_words!(buf, order, f64, read_f64_into), shape, layout)?)
        }
    })
}

fn open_checked(path: &Path, start: u64, required: u64) -> Result<(File, u64)> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    let len = file.metadata()?.len();
    let end = start.saturating_add(required);
    if end > len {
        return Err(Error::TruncatedRegion { required: end, actual: len });
    }
    Ok((file, len))
}

/// Eagerly read a legacy region into an owned volume.
///
/// Opens, seeks, reads and closes within this call; the declared region must
/// fit inside the file or the read fails with [`Error::TruncatedRegion`]
/// before any bytes are touched.
pub fn read_region(
    path: impl AsRef<Path>,
    start: u64,
    shape: &Shape,
    dtype: ElementType,
    order: ByteOrder,
) -> Result<Volume> {
    let required = (shape.num_elements() * dtype.num_bytes()) as u64;
    let (mut file, _) = open_checked(path.as_ref(), start, required)?;
    file.seek(SeekFrom::Start(start))?;
    let mut buf = vec![0u8; required as usize];
    file.read_exact(&mut buf)?;
    decode_volume(&buf, dtype, order, shape, Layout::ColumnMajor)
}

/// Memory-map a region for lazy decoding.
///
/// The mapping is created up front (with the same length validation as the
/// eager path) but no element is decoded until [`MappedVolume::volume`] is
/// first called.
pub fn map_region(
    path: impl AsRef<Path>,
    start: u64,
    shape: &Shape,
    dtype: ElementType,
    order: ByteOrder,
    layout: Layout,
) -> Result<MappedVolume> {
    let required = (shape.num_elements() * dtype.num_bytes()) as u64;
    let (file, _) = open_checked(path.as_ref(), start, required)?;
    // Safety: mapping is read-only and lives as long as this struct.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
    Ok(MappedVolume {
        mmap,
        offset: start as usize,
        dtype,
        order,
        shape: shape.clone(),
        layout,
        cache: OnceCell::new(),
    })
}

/// A memory-mapped, lazily decoded region.
///
/// Holds the mapping open; dropping the value releases it. The decoded
/// volume is cached after the first access, so repeated accessors are cheap.
pub struct MappedVolume {
    mmap: Mmap,
    offset: usize,
    dtype: ElementType,
    order: ByteOrder,
    shape: Shape,
    layout: Layout,
    cache: OnceCell<Volume>,
}

impl MappedVolume {
    /// Raw mapped bytes of the region.
    pub fn bytes(&self) -> &[u8] {
        let required = self.shape.num_elements() * self.dtype.num_bytes();
        &self.mmap[self.offset..self.offset + required]
    }

    /// Decode (on first call) and return the volume. The returned borrow is
    /// tied to this mapping, so the mapping cannot be released underneath it.
    pub fn volume(&self) -> Result<&Volume> {
        if let Some(v) = self.cache.get() {
            return Ok(v);
        }
        let v = decode_volume(self.bytes(), self.dtype, self.order, &self.shape, self.layout)?;
        Ok(self.cache.get_or_init(|| v))
    }

    #[inline]
    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_1d_passthrough() {
        let v = decode_volume(
            &[3, 1, 4, 1, 5],
            ElementType::Uint8,
            ByteOrder::Little,
            &Shape::new(&[5]).unwrap(),
            Layout::ColumnMajor,
        )
        .unwrap();
        assert_eq!(v.as_u8().unwrap().as_slice().unwrap(), &[3, 1, 4, 1, 5]);
    }

    #[test]
    fn test_2d_transpose() {
        // declared (2,3): reshape row-major then transpose -> logical (3,2)
        let v = decode_volume(
            &[0, 1, 2, 3, 4, 5],
            ElementType::Uint8,
            ByteOrder::Little,
            &Shape::new(&[2, 3]).unwrap(),
            Layout::ColumnMajor,
        )
        .unwrap();
        let a = v.as_u8().unwrap();
        assert_eq!(a.shape(), &[3, 2]);
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(a[[j, i]], (i * 3 + j) as u8);
            }
        }
    }

    #[test]
    fn test_3d_reversed_axis_convention() {
        // declared (2,3,4) over 24 sequential on-disk elements:
        // A[x,y,z] must be the element at x + y*2 + z*2*3
        let disk: Vec<u8> = (0..24).collect();
        let v = decode_volume(
            &disk,
            ElementType::Uint8,
            ByteOrder::Little,
            &Shape::new(&[2, 3, 4]).unwrap(),
            Layout::ColumnMajor,
        )
        .unwrap();
        let a = v.as_u8().unwrap();
        assert_eq!(a.shape(), &[2, 3, 4]);
        assert_eq!(a[[0, 0, 0]], 0);
        assert_eq!(a[[1, 0, 0]], 1);
        assert_eq!(a[[0, 1, 0]], 2);
        assert_eq!(a[[1, 2, 0]], 5);
        assert_eq!(a[[0, 0, 1]], 6);
        assert_eq!(a[[1, 2, 3]], 23);
        for x in 0..2 {
            for y in 0..3 {
                for z in 0..4 {
                    assert_eq!(a[[x, y, z]], (x + y * 2 + z * 6) as u8);
                }
            }
        }
    }

    #[test]
    fn test_row_major_layout() {
        let v = decode_volume(
            &[0, 1, 2, 3, 4, 5],
            ElementType::Uint8,
            ByteOrder::Little,
            &Shape::new(&[2, 3]).unwrap(),
            Layout::RowMajor,
        )
        .unwrap();
        let a = v.as_u8().unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a[[1, 0]], 3);
    }

    #[test]
    fn test_big_endian_words() {
        let v = decode_volume(
            &[0x01, 0x02, 0x03, 0x04],
            ElementType::Uint16,
            ByteOrder::Big,
            &Shape::new(&[2]).unwrap(),
            Layout::ColumnMajor,
        )
        .unwrap();
        assert_eq!(v.as_u16().unwrap().as_slice().unwrap(), &[0x0102, 0x0304]);
    }

    #[test]
    fn test_short_buffer() {
        let r = decode_volume(
            &[0u8; 7],
            ElementType::Uint32,
            ByteOrder::Little,
            &Shape::new(&[2]).unwrap(),
            Layout::ColumnMajor,
        );
        assert!(matches!(r, Err(Error::TruncatedRegion { required: 8, actual: 7 })));
    }

    #[test]
    fn test_eager_and_mapped_agree() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let disk: Vec<u8> = (0..24).collect();
        f.write_all(&disk).unwrap();
        f.flush().unwrap();

        let shape = Shape::new(&[2, 3, 4]).unwrap();
        let eager =
            read_region(f.path(), 0, &shape, ElementType::Uint8, ByteOrder::Little).unwrap();
        let mapped = map_region(
            f.path(),
            0,
            &shape,
            ElementType::Uint8,
            ByteOrder::Little,
            Layout::ColumnMajor,
        )
        .unwrap();
        assert_eq!(&eager, mapped.volume().unwrap());
    }

    #[test]
    fn test_region_offset() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[0xAA, 0xBB, 1, 2, 3]).unwrap();
        f.flush().unwrap();

        let shape = Shape::new(&[3]).unwrap();
        let v = read_region(f.path(), 2, &shape, ElementType::Uint8, ByteOrder::Little).unwrap();
        assert_eq!(v.as_u8().unwrap().as_slice().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_truncated_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[0u8; 10]).unwrap();
        f.flush().unwrap();

        let shape = Shape::new(&[4]).unwrap();
        let r = read_region(f.path(), 0, &shape, ElementType::Uint32, ByteOrder::Little);
        assert!(matches!(r, Err(Error::TruncatedRegion { required: 16, actual: 10 })));

        let r = map_region(
            f.path(),
            8,
            &shape,
            ElementType::Uint8,
            ByteOrder::Little,
            Layout::RowMajor,
        );
        assert!(matches!(r, Err(Error::TruncatedRegion { .. })));
    }
}
