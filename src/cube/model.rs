//! The Cube aggregate: lifecycle, dataset slots and accessors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use serde_json::{Map, Value};

use super::dataset::DatasetDescriptor;
use super::{facade, legacy, sidecar, thor, tiffstack};
use crate::ocmbin::format::{NM_PER_UM, POSITION_DATASET, PRIMARY_DATASET};
use crate::ocmbin::{MappedVolume, OverlapReport};
use crate::util::{Error, Result, Volume};

/// Physical storage layout of a cube. The variant set is closed; every
/// dispatch over it is an exhaustive match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFormat {
    /// Legacy single-file container: 8192-byte header slot + byte regions.
    LegacyBinary,
    /// JSON header document + one raw file per array dataset.
    SidecarJson,
    /// Single multi-page TIFF or a directory of TIFF pages.
    TiffStack,
    /// Vendor .oct capture archive (zip with an XML descriptor).
    ThorOct,
}

impl CubeFormat {
    pub const fn name(self) -> &'static str {
        match self {
            Self::LegacyBinary => "legacy-binary",
            Self::SidecarJson => "sidecar-json",
            Self::TiffStack => "tiff-stack",
            Self::ThorOct => "thor-oct",
        }
    }
}

impl std::fmt::Display for CubeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Backing storage of one materialized dataset.
pub(crate) enum Slot {
    /// Eagerly decoded, owned memory.
    Owned(Volume),
    /// Memory-mapped region, decoded on first access.
    Mapped(MappedVolume),
}

impl Slot {
    pub(crate) fn volume(&self) -> Result<&Volume> {
        match self {
            Slot::Owned(v) => Ok(v),
            Slot::Mapped(m) => m.volume(),
        }
    }
}

/// An in-memory volumetric dataset: a primary 3-D array plus named
/// auxiliary arrays and free-form metadata, bound to one on-disk container.
///
/// A cube is constructed unloaded (metadata only). [`Cube::load`] decodes or
/// maps every dataset and is idempotent; [`Cube::unload`] releases array
/// memory and mappings while retaining decoded metadata, after which the
/// cube can be loaded again. Accessors that need data fail with
/// [`Error::NotLoaded`] on an unloaded cube; borrows handed out by them tie
/// to the cube, so `unload` (which needs `&mut self`) cannot pull a mapping
/// out from under a live view.
pub struct Cube {
    pub(crate) path: Option<PathBuf>,
    pub(crate) format: CubeFormat,
    pub name: Option<String>,
    pub desc: Option<String>,
    /// Free-form metadata: header extras and inline scalar entries.
    pub meta: Map<String, Value>,
    pub(crate) descriptors: Vec<DatasetDescriptor>,
    pub(crate) overlap: BTreeMap<String, OverlapReport>,
    pub(crate) datasets: BTreeMap<String, Slot>,
    pub(crate) loaded: bool,
}

impl Cube {
    /// Resolve `path` to a backend and construct an unloaded cube.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = facade::detect_format(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            format,
            name: None,
            desc: None,
            meta: Map::new(),
            descriptors: Vec::new(),
            overlap: BTreeMap::new(),
            datasets: BTreeMap::new(),
            loaded: false,
        })
    }

    /// Load all datasets from the backing container. No-op when already
    /// loaded.
    pub fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        let path = self
            .path
            .clone()
            .ok_or_else(|| Error::other("cube has no source path"))?;
        self.datasets.clear();
        self.descriptors.clear();
        self.overlap.clear();
        match self.format {
            CubeFormat::LegacyBinary => legacy::load(self, &path)?,
            CubeFormat::SidecarJson => sidecar::load(self, &path)?,
            CubeFormat::TiffStack => tiffstack::load(self, &path)?,
            CubeFormat::ThorOct => thor::load(self, &path)?,
        }
        self.loaded = true;
        Ok(())
    }

    /// Release dataset memory and mappings, retaining decoded metadata.
    pub fn unload(&mut self) {
        self.datasets.clear();
        self.loaded = false;
    }

    /// Save this cube through the backend selected by the destination
    /// extension. See [`facade::save_cube`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        facade::save_cube(self, path.as_ref())
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    pub fn format(&self) -> CubeFormat {
        self.format
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolved descriptors of the declared datasets.
    #[inline]
    pub fn descriptors(&self) -> &[DatasetDescriptor] {
        &self.descriptors
    }

    /// Per-dataset allocation/write reports (legacy containers only).
    /// Overlap is informational; an overlapped dataset still loads.
    #[inline]
    pub fn overlap_reports(&self) -> &BTreeMap<String, OverlapReport> {
        &self.overlap
    }

    /// Names of the materialized datasets.
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// A named dataset's volume, decoding a mapped slot on first access.
    pub fn dataset(&self, name: &str) -> Result<&Volume> {
        if !self.loaded {
            return Err(Error::NotLoaded);
        }
        self.datasets
            .get(name)
            .ok_or_else(|| Error::MissingDataset(name.to_string()))?
            .volume()
    }

    /// The primary volumetric array (dataset named `cube`).
    pub fn primary(&self) -> Result<&Volume> {
        self.dataset(PRIMARY_DATASET)
    }

    /// 2-D cross-section of the primary array at `index` along `axis`.
    pub fn slice(&self, axis: usize, index: usize) -> Result<Volume> {
        self.primary()?.slice_axis(axis, index)
    }

    /// Vertical (Z) positions in micrometers.
    ///
    /// Integer-typed position datasets hold raw nanometers and are scaled
    /// by 1/1000; float datasets are already micrometers.
    pub fn zpos(&self) -> Result<ArrayD<f64>> {
        let v = self.dataset(POSITION_DATASET)?;
        if v.dtype().is_integer() {
            Ok(v.to_f64().mapv(|nm| nm / NM_PER_UM))
        } else {
            Ok(v.to_f64())
        }
    }

    pub(crate) fn insert_dataset(&mut self, name: impl Into<String>, slot: Slot) {
        self.datasets.insert(name.into(), slot);
    }
}
