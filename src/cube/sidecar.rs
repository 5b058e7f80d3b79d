//! Sidecar backend: JSON header document + one raw file per array.
//!
//! The header lives in `<base>.json`; each array entry references a raw
//! little-endian (unless declared otherwise) file relative to the header's
//! directory, stored row-major in the declared shape. Array files are
//! memory-mapped at load and decoded on first access, so opening a large
//! capture costs nothing until its data is touched.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::dataset::DatasetDescriptor;
use super::model::{Cube, Slot};
use crate::ocmbin::region::{self, Layout};
use crate::util::{ByteOrder, ElementType, Error, Result, Shape};

/// Sidecar header document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SidecarHeader {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub data: Vec<SidecarEntry>,
}

/// One `data` list entry: either a file-backed array descriptor or a
/// single-key inline scalar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SidecarEntry {
    Array(SidecarArray),
    Scalar(Map<String, Value>),
}

/// File-backed array descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SidecarArray {
    pub name: String,
    pub size: Vec<u64>,
    #[serde(rename = "type")]
    pub dtype: String,
    /// Raw file path, relative to the header document.
    pub path: String,
    /// Machine format token; absent means little-endian (recorded as a
    /// defaulted order, not silently).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfmt: Option<String>,
}

/// Parse a sidecar header document.
pub fn decode_sidecar(bytes: &[u8]) -> Result<SidecarHeader> {
    serde_json::from_slice(bytes)
        .map_err(|e| Error::header(format!("unparseable sidecar header: {}", e)))
}

/// Serialize a sidecar header document (pretty-printed).
pub fn encode_sidecar(header: &SidecarHeader) -> Result<Vec<u8>> {
    let mut text = serde_json::to_vec_pretty(header)
        .map_err(|e| Error::header(format!("unencodable sidecar header: {}", e)))?;
    text.push(b'\n');
    Ok(text)
}

/// Header document path for a cube base path, replacing any extension.
pub(crate) fn sidecar_path(path: &Path) -> PathBuf {
    path.with_extension("json")
}

pub(crate) fn load(cube: &mut Cube, path: &Path) -> Result<()> {
    let sidecar = sidecar_path(path);
    let folder = sidecar.parent().map(Path::to_path_buf).unwrap_or_default();
    let bytes = fs::read(&sidecar).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(sidecar.clone())
        } else {
            Error::Io(e)
        }
    })?;
    let hdr = decode_sidecar(&bytes)?;
    debug!("sidecar header {:?}: {} data entries", hdr.name, hdr.data.len());

    cube.name = Some(hdr.name);
    cube.desc = Some(hdr.desc);
    cube.meta = hdr.meta;

    for entry in hdr.data {
        match entry {
            SidecarEntry::Scalar(map) if map.len() == 1 => {
                // Inline scalars are metadata, not arrays.
                for (k, v) in map {
                    cube.meta.insert(k, v);
                }
            }
            SidecarEntry::Scalar(map) => {
                return Err(Error::header(format!(
                    "unrecognized data entry with keys {:?}",
                    map.keys().collect::<Vec<_>>()
                )));
            }
            SidecarEntry::Array(a) => {
                let dtype = ElementType::resolve(&a.dtype);
                let (order, order_defaulted) = match &a.mfmt {
                    Some(token) => (ByteOrder::resolve(&token.to_lowercase())?, false),
                    None => {
                        warn!("assuming default machine format \"ieee-le\" for {}", a.path);
                        (ByteOrder::Little, true)
                    }
                };
                let shape = Shape::from_u64(&a.size)?;
                let file = folder.join(&a.path);
                let mapped =
                    region::map_region(&file, 0, &shape, dtype, order, Layout::RowMajor)?;
                cube.descriptors.push(DatasetDescriptor {
                    name: a.name.clone(),
                    dtype,
                    order,
                    order_defaulted,
                    shape,
                    region: None,
                    source: Some(PathBuf::from(&a.path)),
                });
                cube.insert_dataset(a.name, Slot::Mapped(mapped));
            }
        }
    }

    Ok(())
}

/// Write the header document plus one raw file per array dataset. Requires
/// a loaded cube; every dataset is materialized in memory before writing.
pub(crate) fn save(cube: &Cube, path: &Path) -> Result<()> {
    if !cube.is_loaded() {
        return Err(Error::NotLoaded);
    }
    let sidecar = sidecar_path(path);
    let folder = sidecar.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = sidecar
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| Error::other(format!("save path {} has no file name", sidecar.display())))?;

    let mut entries = Vec::new();
    for (name, slot) in &cube.datasets {
        let volume = slot.volume()?;
        let raw_name = format!("{}.{}.raw", stem, name);
        fs::write(folder.join(&raw_name), volume.to_le_bytes())?;
        entries.push(SidecarEntry::Array(SidecarArray {
            name: name.clone(),
            size: volume.shape().iter().map(|&d| d as u64).collect(),
            dtype: volume.dtype().name().to_string(),
            path: raw_name,
            mfmt: Some(ByteOrder::Little.name().to_string()),
        }));
    }

    let hdr = SidecarHeader {
        name: cube.name.clone().unwrap_or_default(),
        desc: cube.desc.clone().unwrap_or_default(),
        meta: cube.meta.clone(),
        data: entries,
    };
    fs::write(&sidecar, encode_sidecar(&hdr)?)?;
    debug!("wrote sidecar cube to {}", sidecar.display());
    Ok(())
}
