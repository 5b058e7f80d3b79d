//! Thorlabs `.oct` backend.
//!
//! The vendor container is a plain zip archive holding a `Header.xml`
//! descriptor next to the raw acquisition entries it names. Each
//! `DataFile` element carries `Type` and `SizeX`/`SizeY`/`SizeZ`
//! attributes, and its text content is the archive path of the raw
//! bytes (backslash-separated on disk). Capture hardware writes these
//! archives; we only read them.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use super::dataset::DatasetDescriptor;
use super::model::{Cube, Slot};
use crate::ocmbin::format::PRIMARY_DATASET;
use crate::ocmbin::region::{decode_volume, Layout};
use crate::util::{ByteOrder, ElementType, Error, Result, Shape};

const DESCRIPTOR_ENTRY: &str = "Header.xml";

/// One `DataFile` element of the descriptor.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ThorEntry {
    pub kind: String,
    pub entry: String,
    pub dims: Vec<usize>,
    pub dtype: ElementType,
}

fn xml_err(e: impl std::fmt::Display) -> Error {
    Error::header(format!("bad oct descriptor: {}", e))
}

/// Parse the `DataFile` elements out of a descriptor document.
///
/// Elements without size attributes (thumbnails, settings blobs) are
/// skipped. The `Format` attribute is optional; intensity data defaults
/// to single-precision float.
pub(crate) fn parse_descriptor(xml: &str) -> Result<Vec<ThorEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current: Option<ThorEntry> = None;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"DataFile" => {
                let mut kind = String::new();
                let mut dims = [0usize; 3];
                let mut dtype = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(xml_err)?;
                    let value = attr.unescape_value().map_err(xml_err)?;
                    match attr.key.as_ref() {
                        b"Type" => kind = value.into_owned(),
                        b"SizeX" => dims[0] = parse_dim(&value)?,
                        b"SizeY" => dims[1] = parse_dim(&value)?,
                        b"SizeZ" => dims[2] = parse_dim(&value)?,
                        b"Format" => {
                            dtype = Some(ElementType::try_resolve(&value).ok_or_else(|| {
                                Error::header(format!("unknown oct data format {:?}", value))
                            })?)
                        }
                        _ => {}
                    }
                }
                current = Some(ThorEntry {
                    kind,
                    entry: String::new(),
                    dims: dims.iter().copied().filter(|&d| d > 0).collect(),
                    dtype: dtype.unwrap_or(ElementType::Float32),
                });
            }
            Event::Text(t) => {
                if let Some(entry) = current.as_mut() {
                    let text = t.unescape().map_err(xml_err)?;
                    entry.entry.push_str(text.trim());
                }
            }
            Event::End(e) if e.name().as_ref() == b"DataFile" => {
                if let Some(entry) = current.take() {
                    if !entry.dims.is_empty() && !entry.entry.is_empty() {
                        entries.push(entry);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

fn parse_dim(value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::header(format!("bad oct dimension {:?}", value)))
}

/// Dataset name for a descriptor entry: the vendor's `Intensity` slot is
/// the primary volume, anything else keeps its lowercased type tag.
fn dataset_name(kind: &str) -> String {
    if kind.eq_ignore_ascii_case("Intensity") {
        PRIMARY_DATASET.to_string()
    } else {
        kind.to_ascii_lowercase()
    }
}

pub(crate) fn load(cube: &mut Cube, path: &Path) -> Result<()> {
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    let mut archive = ZipArchive::new(file)?;

    let mut xml = String::new();
    archive
        .by_name(DESCRIPTOR_ENTRY)
        .map_err(|e| Error::header(format!("missing {}: {}", DESCRIPTOR_ENTRY, e)))?
        .read_to_string(&mut xml)?;
    let entries = parse_descriptor(&xml)?;
    if entries.is_empty() {
        return Err(Error::header("oct descriptor names no data files"));
    }
    debug!("oct descriptor: {} data files", entries.len());

    cube.name = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    for entry in entries {
        // Descriptor paths are Windows-style inside the archive.
        let archive_path = entry.entry.replace('\\', "/");
        let mut buf = Vec::new();
        archive.by_name(&archive_path)?.read_to_end(&mut buf)?;

        let shape = Shape::new(&entry.dims)?;
        let volume = decode_volume(
            &buf,
            entry.dtype,
            ByteOrder::Little,
            &shape,
            Layout::ColumnMajor,
        )?;
        let name = dataset_name(&entry.kind);
        cube.descriptors.push(DatasetDescriptor {
            name: name.clone(),
            dtype: entry.dtype,
            order: ByteOrder::Little,
            order_defaulted: false,
            shape,
            region: None,
            source: None,
        });
        cube.insert_dataset(&name, Slot::Owned(volume));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Oct>
  <DataFiles>
    <DataFile Type="Intensity" SizeX="2" SizeY="3" SizeZ="4">data\Intensity.data</DataFile>
    <DataFile Type="Surface" SizeX="2" SizeY="3" Format="uint16">data\Surface.data</DataFile>
    <DataFile Type="Preview">data\preview.bmp</DataFile>
  </DataFiles>
</Oct>"#;

    #[test]
    fn test_parse_descriptor() {
        let entries = parse_descriptor(HEADER).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].kind, "Intensity");
        assert_eq!(entries[0].entry, r"data\Intensity.data");
        assert_eq!(entries[0].dims, vec![2, 3, 4]);
        assert_eq!(entries[0].dtype, ElementType::Float32);

        assert_eq!(entries[1].kind, "Surface");
        assert_eq!(entries[1].dims, vec![2, 3]);
        assert_eq!(entries[1].dtype, ElementType::Uint16);
    }

    #[test]
    fn test_parse_descriptor_bad_format() {
        let xml = r#"<DataFile Type="Intensity" SizeX="2" Format="quux">a</DataFile>"#;
        assert!(matches!(parse_descriptor(xml), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_parse_descriptor_bad_dim() {
        let xml = r#"<DataFile Type="Intensity" SizeX="two">a</DataFile>"#;
        assert!(matches!(parse_descriptor(xml), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_dataset_name() {
        assert_eq!(dataset_name("Intensity"), PRIMARY_DATASET);
        assert_eq!(dataset_name("Surface"), "surface");
    }
}
