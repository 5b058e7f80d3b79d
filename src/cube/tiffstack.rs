//! TIFF stack backend.
//!
//! A volume as an ordered sequence of 2-D grayscale pages: either one
//! multi-page file or a directory of page files (sorted by name). Pages
//! stack along the last axis, so `volume[r, c, z]` is pixel `(r, c)` of
//! page `z`. All pages must agree in size and sample type.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::{ArrayD, IxDyn};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tracing::debug;

use super::dataset::DatasetDescriptor;
use super::model::{Cube, Slot};
use crate::ocmbin::format::PRIMARY_DATASET;
use crate::util::{ByteOrder, Error, Result, Shape, Volume};

/// True when a directory entry looks like a TIFF page file.
pub(crate) fn is_tiff_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("tif") | Some("tiff")
    )
}

/// Page files of a stack directory, sorted by file name.
pub(crate) fn page_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_tiff_file(p))
        .collect();
    files.sort();
    Ok(files)
}

fn page_volume(width: usize, height: usize, img: DecodingResult) -> Result<Volume> {
    let dims = IxDyn(&[height, width]);
    let shaped = |e| Error::other(format!("page does not match its dimensions: {}", e));
    Ok(match img {
        DecodingResult::U8(v) => Volume::U8(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::I8(v) => Volume::I8(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::U16(v) => Volume::U16(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::I16(v) => Volume::I16(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::U32(v) => Volume::U32(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::I32(v) => Volume::I32(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::U64(v) => Volume::U64(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::I64(v) => Volume::I64(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::F32(v) => Volume::F32(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
        DecodingResult::F64(v) => Volume::F64(ArrayD::from_shape_vec(dims, v).map_err(shaped)?),
    })
}

fn read_pages(path: &Path, pages: &mut Vec<Volume>) -> Result<()> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    let mut decoder = Decoder::new(BufReader::new(file))?;
    loop {
        let (width, height) = decoder.dimensions()?;
        let img = decoder.read_image()?;
        pages.push(page_volume(width as usize, height as usize, img)?);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }
    Ok(())
}

/// Concatenate same-typed pages into one `[rows, cols, pages]` volume.
macro_rules! stack_as {
    ($pages:expr, $rows:expr, $cols:expr, $variant:ident, $ty:ty) => {{
        let n = $pages.len();
        let mut data: Vec<$ty> = Vec::with_capacity(n * $rows * $cols);
        for p in $pages {
            match p {
                Volume::$variant(a) => data.extend(a.iter().copied()),
                other => {
                    return Err(Error::TypeMismatch {
                        expected: stringify!($variant).to_string(),
                        actual: other.dtype().to_string(),
                    })
                }
            }
        }
        let arr = ArrayD::from_shape_vec(IxDyn(&[n, $rows, $cols]), data)
            .map_err(|e| Error::other(format!("inconsistent page sizes: {}", e)))?
            .permuted_axes(vec![1, 2, 0]);
        Volume::$variant(arr)
    }};
}

fn stack_pages(pages: Vec<Volume>) -> Result<Volume> {
    let first = pages.first().ok_or_else(|| Error::other("TIFF stack has no pages"))?;
    let (rows, cols) = (first.shape()[0], first.shape()[1]);
    for p in &pages {
        if p.shape() != [rows, cols] {
            return Err(Error::other(format!(
                "page size {:?} differs from first page {:?}",
                p.shape(),
                [rows, cols]
            )));
        }
    }
    Ok(match first {
        Volume::U8(_) => stack_as!(&pages, rows, cols, U8, u8),
        Volume::I8(_) => stack_as!(&pages, rows, cols, I8, i8),
        Volume::U16(_) => stack_as!(&pages, rows, cols, U16, u16),
        Volume::I16(_) => stack_as!(&pages, rows, cols, I16, i16),
        Volume::U32(_) => stack_as!(&pages, rows, cols, U32, u32),
        Volume::I32(_) => stack_as!(&pages, rows, cols, I32, i32),
        Volume::U64(_) => stack_as!(&pages, rows, cols, U64, u64),
        Volume::I64(_) => stack_as!(&pages, rows, cols, I64, i64),
        Volume::F32(_) => stack_as!(&pages, rows, cols, F32, f32),
        Volume::F64(_) => stack_as!(&pages, rows, cols, F64, f64),
    })
}

pub(crate) fn load(cube: &mut Cube, path: &Path) -> Result<()> {
    let mut pages = Vec::new();
    if path.is_dir() {
        let files = page_files(path)?;
        if files.is_empty() {
            return Err(Error::UnrecognizedFormat(path.to_path_buf()));
        }
        for f in &files {
            read_pages(f, &mut pages)?;
        }
    } else {
        read_pages(path, &mut pages)?;
    }
    debug!("tiff stack: {} pages", pages.len());

    let volume = stack_pages(pages)?;
    cube.name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());
    cube.descriptors.push(DatasetDescriptor {
        name: PRIMARY_DATASET.to_string(),
        dtype: volume.dtype(),
        order: ByteOrder::Little,
        order_defaulted: false,
        shape: Shape::new(volume.shape())?,
        region: None,
        source: None,
    });
    cube.insert_dataset(PRIMARY_DATASET, Slot::Owned(volume));
    Ok(())
}

/// Write the primary volume as one grayscale page per index along the last
/// axis. Signed integer volumes have no TIFF grayscale encoding here and
/// are rejected.
pub(crate) fn save(cube: &Cube, path: &Path) -> Result<()> {
    if !cube.is_loaded() {
        return Err(Error::NotLoaded);
    }
    let primary = cube.primary()?;
    let shape = primary.shape();
    if shape.len() != 3 {
        return Err(Error::UnsupportedShape(shape.to_vec()));
    }
    let (rows, cols, npages) = (shape[0], shape[1], shape[2]);

    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(file)?;
    for z in 0..npages {
        let page = primary.slice_axis(2, z)?;
        let (w, h) = (cols as u32, rows as u32);
        match &page {
            Volume::U8(a) => encoder.write_image::<colortype::Gray8>(w, h, as_flat(a)?)?,
            Volume::U16(a) => encoder.write_image::<colortype::Gray16>(w, h, as_flat(a)?)?,
            Volume::U32(a) => encoder.write_image::<colortype::Gray32>(w, h, as_flat(a)?)?,
            Volume::U64(a) => encoder.write_image::<colortype::Gray64>(w, h, as_flat(a)?)?,
            Volume::F32(a) => encoder.write_image::<colortype::Gray32Float>(w, h, as_flat(a)?)?,
            Volume::F64(a) => encoder.write_image::<colortype::Gray64Float>(w, h, as_flat(a)?)?,
            other => {
                return Err(Error::unsupported(format!(
                    "TIFF save of {} volumes",
                    other.dtype()
                )))
            }
        }
    }
    debug!("wrote {} tiff pages to {}", npages, path.display());
    Ok(())
}

fn as_flat<T>(a: &ArrayD<T>) -> Result<&[T]> {
    a.as_slice()
        .ok_or_else(|| Error::other("page buffer is not contiguous"))
}
