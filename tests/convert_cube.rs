//! Cross-format conversion: legacy container in, sidecar or TIFF out.

use std::io::Write;
use std::path::PathBuf;

use serde_json::{json, Map};

use vcube::ocmbin::{encode_header, ByteRange, LegacyDataset, LegacyHeader, HEADER_SIZE};
use vcube::prelude::*;

fn write_legacy(dir: &std::path::Path) -> PathBuf {
    let cube_start = HEADER_SIZE as u64;
    let cube_stop = cube_start + 24 * 2;
    let mut extra = Map::new();
    extra.insert("Name".into(), json!("conv"));
    let header = LegacyHeader {
        data: vec![LegacyDataset {
            name: "cube".into(),
            dtype: "u16".into(),
            size: vec![2, 3, 4],
            position: ByteRange {
                start_byte: cube_start,
                stop_byte: cube_stop,
                last_byte: cube_stop,
            },
        }],
        extra,
    };
    let path = dir.join("conv.bin");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&encode_header(&header).unwrap()).unwrap();
    for i in 0..24u16 {
        file.write_all(&i.to_le_bytes()).unwrap();
    }
    path
}

#[test]
fn test_legacy_to_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let cube = open_cube(write_legacy(dir.path())).unwrap();

    let out = dir.path().join("conv2.json");
    cube.save(&out).unwrap();
    assert!(out.is_file());
    assert!(dir.path().join("conv2.cube.raw").is_file());

    let reloaded = open_cube(&out).unwrap();
    assert_eq!(reloaded.format(), CubeFormat::SidecarJson);
    assert_eq!(reloaded.name.as_deref(), Some("conv"));
    assert_eq!(reloaded.primary().unwrap(), cube.primary().unwrap());
    // converted files carry an explicit machine format token
    assert!(!reloaded.descriptors()[0].order_defaulted);
}

#[test]
fn test_relative_save_lands_next_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let cube = open_cube(write_legacy(dir.path())).unwrap();

    cube.save("rel.json").unwrap();
    assert!(dir.path().join("rel.json").is_file());
    assert!(dir.path().join("rel.cube.raw").is_file());
}

#[test]
fn test_legacy_to_tiff_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let cube = open_cube(write_legacy(dir.path())).unwrap();

    let out = dir.path().join("conv.tif");
    cube.save(&out).unwrap();

    let reloaded = open_cube(&out).unwrap();
    assert_eq!(reloaded.format(), CubeFormat::TiffStack);
    let primary = reloaded.primary().unwrap();
    assert_eq!(primary.dtype(), ElementType::Uint16);
    assert_eq!(primary.shape(), &[2, 3, 4]);
    assert_eq!(primary, cube.primary().unwrap());
}

#[test]
fn test_unknown_save_extension() {
    let dir = tempfile::tempdir().unwrap();
    let cube = open_cube(write_legacy(dir.path())).unwrap();
    let err = cube.save(dir.path().join("out.xyz")).unwrap_err();
    match err {
        Error::InvalidExtension { extension, .. } => assert_eq!(extension, "xyz"),
        other => panic!("expected invalid extension, got {:?}", other),
    }
}

#[test]
fn test_save_requires_loaded_cube() {
    let dir = tempfile::tempdir().unwrap();
    let mut cube = open_cube(write_legacy(dir.path())).unwrap();
    cube.unload();
    assert!(matches!(cube.save(dir.path().join("out.json")), Err(Error::NotLoaded)));
}

#[test]
fn test_sidecar_default_byte_order_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    // hand-written sidecar without an mfmt token
    std::fs::write(
        dir.path().join("plain.json"),
        br#"{"name": "plain", "data": [
            {"name": "cube", "size": [2, 2], "type": "u8", "path": "plain.cube.raw"},
            {"wavelength_nm": 1310}
        ]}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("plain.cube.raw"), [1u8, 2, 3, 4]).unwrap();

    let cube = open_cube(dir.path().join("plain.json")).unwrap();
    assert!(cube.descriptors()[0].order_defaulted);
    assert_eq!(cube.meta["wavelength_nm"], serde_json::json!(1310));
    // sidecar raw files are row-major in the declared shape
    assert_eq!(cube.primary().unwrap().as_u8().unwrap()[[1, 0]], 3);
}

#[test]
fn test_unload_releases_mapped_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = open_cube(write_legacy(dir.path())).unwrap();
    let out = dir.path().join("mapped.json");
    legacy.save(&out).unwrap();

    let mut cube = open_cube(&out).unwrap();
    assert_eq!(cube.primary().unwrap().shape(), &[2, 3, 4]);

    // dropping the mappings invalidates every accessor until the next load
    cube.unload();
    assert!(matches!(cube.primary(), Err(Error::NotLoaded)));
    cube.load().unwrap();
    assert_eq!(cube.primary().unwrap().shape(), &[2, 3, 4]);
}

#[test]
fn test_sidecar_bad_byte_order_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("bad.json"),
        br#"{"name": "bad", "data": [
            {"name": "cube", "size": [2], "type": "u8", "path": "bad.cube.raw", "mfmt": "middle-endian"}
        ]}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("bad.cube.raw"), [1u8, 2]).unwrap();

    assert!(matches!(
        open_cube(dir.path().join("bad.json")),
        Err(Error::InvalidByteOrder(_))
    ));
}
