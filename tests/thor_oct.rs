//! Loading a synthetic Thorlabs .oct capture archive.

use std::io::Write;
use std::path::PathBuf;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use vcube::prelude::*;

const DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Oct>
  <DataFiles>
    <DataFile Type="Intensity" SizeX="2" SizeY="3" SizeZ="4" Format="uint16">data\Intensity.data</DataFile>
    <DataFile Type="Surface" SizeX="2" SizeY="3" Format="uint8">data\Surface.data</DataFile>
    <DataFile Type="Preview">data\preview.bmp</DataFile>
  </DataFiles>
</Oct>"#;

fn write_archive(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("capture.oct");
    let mut zw = ZipWriter::new(std::fs::File::create(&path).unwrap());
    let opts = SimpleFileOptions::default();

    zw.start_file("Header.xml", opts).unwrap();
    zw.write_all(DESCRIPTOR.as_bytes()).unwrap();

    zw.start_file("data/Intensity.data", opts).unwrap();
    for i in 0..24u16 {
        zw.write_all(&i.to_le_bytes()).unwrap();
    }

    zw.start_file("data/Surface.data", opts).unwrap();
    zw.write_all(&[0u8, 1, 2, 3, 4, 5]).unwrap();

    zw.start_file("data/preview.bmp", opts).unwrap();
    zw.write_all(b"not an image").unwrap();

    zw.finish().unwrap();
    path
}

#[test]
fn test_load_oct_archive() {
    let dir = tempfile::tempdir().unwrap();
    let cube = open_cube(write_archive(dir.path())).unwrap();

    assert_eq!(cube.format(), CubeFormat::ThorOct);
    assert_eq!(cube.name.as_deref(), Some("capture"));

    // the Intensity entry is the primary volume, column-major on disk
    let primary = cube.primary().unwrap();
    assert_eq!(primary.dtype(), ElementType::Uint16);
    assert_eq!(primary.shape(), &[2, 3, 4]);
    let a = primary.as_u16().unwrap();
    for x in 0..2 {
        for y in 0..3 {
            for z in 0..4 {
                assert_eq!(a[[x, y, z]], (x + y * 2 + z * 6) as u16);
            }
        }
    }

    // auxiliary entries keep their lowercased type tag; a 2-D column-major
    // region comes out with the declared axes swapped
    let surface = cube.dataset("surface").unwrap();
    assert_eq!(surface.shape(), &[3, 2]);
    let s = surface.as_u8().unwrap();
    assert_eq!(s[[0, 0]], 0);
    assert_eq!(s[[2, 1]], 5);

    // sizeless entries (thumbnails) are skipped
    assert!(matches!(cube.dataset("preview"), Err(Error::MissingDataset(_))));
}

#[test]
fn test_oct_without_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.oct");
    let mut zw = ZipWriter::new(std::fs::File::create(&path).unwrap());
    zw.start_file("readme.txt", SimpleFileOptions::default()).unwrap();
    zw.write_all(b"no descriptor").unwrap();
    zw.finish().unwrap();

    assert!(matches!(open_cube(&path), Err(Error::MalformedHeader(_))));
}

#[test]
fn test_oct_with_truncated_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.oct");
    let mut zw = ZipWriter::new(std::fs::File::create(&path).unwrap());
    let opts = SimpleFileOptions::default();
    zw.start_file("Header.xml", opts).unwrap();
    zw.write_all(
        br#"<Oct><DataFiles><DataFile Type="Intensity" SizeX="4" Format="uint16">raw.data</DataFile></DataFiles></Oct>"#,
    )
    .unwrap();
    zw.start_file("raw.data", opts).unwrap();
    zw.write_all(&[0u8; 5]).unwrap();
    zw.finish().unwrap();

    assert!(matches!(open_cube(&path), Err(Error::TruncatedRegion { .. })));
}

#[test]
fn test_oct_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let cube = open_cube(write_archive(dir.path())).unwrap();
    // capture archives convert out, never back in
    let err = cube.save(dir.path().join("copy.oct")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation(_)));
}
