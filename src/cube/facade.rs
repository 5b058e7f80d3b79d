//! Path-to-backend resolution and cross-format conversion.
//!
//! [`open_cube`] inspects a path, picks the storage layout, and returns
//! a fully loaded [`Cube`]. [`save_cube`] resolves the destination
//! backend from the target extension, so loading a legacy container and
//! saving it with a `.json` target converts it to the sidecar layout.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::model::{Cube, CubeFormat};
use super::{sidecar, tiffstack};
use crate::ocmbin::format::LEGACY_EXTENSIONS;
use crate::util::{Error, Result};

/// Pick the backend for `path`.
///
/// A directory is a TIFF stack when it holds page files. For plain
/// files the extension decides; an unrecognized extension still maps to
/// the sidecar layout when `<path>.json` exists next to it.
pub fn detect_format(path: &Path) -> Result<CubeFormat> {
    if path.is_dir() {
        if !tiffstack::page_files(path)?.is_empty() {
            return Ok(CubeFormat::TiffStack);
        }
        return Err(Error::UnrecognizedFormat(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "tif" | "tiff" => Ok(CubeFormat::TiffStack),
        "oct" => Ok(CubeFormat::ThorOct),
        "json" => Ok(CubeFormat::SidecarJson),
        _ if LEGACY_EXTENSIONS.contains(&ext.as_str()) => Ok(CubeFormat::LegacyBinary),
        _ => {
            if sidecar::sidecar_path(path).is_file() {
                Ok(CubeFormat::SidecarJson)
            } else {
                Err(Error::UnrecognizedFormat(path.to_path_buf()))
            }
        }
    }
}

/// Open and load a cube in one step.
pub fn open_cube(path: impl AsRef<Path>) -> Result<Cube> {
    let mut cube = Cube::open(path)?;
    cube.load()?;
    Ok(cube)
}

/// Resolve a save target against the cube's own directory.
///
/// A relative `path` lands next to the source container; a cube that
/// was built in memory falls back to the current working directory.
fn resolve_target(cube: &Cube, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match cube.path().and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

/// Write `cube` to `path`, choosing the backend from the extension.
///
/// Empty or `json` extensions write the sidecar layout; `tif`/`tiff`
/// writes a page stack. Anything else is an error rather than a guess.
pub fn save_cube(cube: &Cube, path: &Path) -> Result<()> {
    let target = resolve_target(cube, path);
    let ext = target
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    debug!("saving cube to {} as {:?}", target.display(), ext);
    match ext.as_str() {
        "" | "json" => sidecar::save(cube, &target),
        "tif" | "tiff" => tiffstack::save(cube, &target),
        // recognized but read-only layouts
        "oct" => Err(Error::unsupported("saving vendor capture archives")),
        _ if LEGACY_EXTENSIONS.contains(&ext.as_str()) => {
            Err(Error::unsupported("saving the deprecated legacy container"))
        }
        _ => Err(Error::InvalidExtension {
            extension: ext,
            path: target,
        }),
    }
}
