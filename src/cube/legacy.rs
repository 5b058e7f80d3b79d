//! Legacy single-file backend.
//!
//! The one fully working capture path of the original instrument software:
//! header slot, overlap check, then an eager region read per dataset. The
//! format is deprecated and read-only; saving is not supported.

use std::path::Path;

use tracing::{debug, warn};

use super::dataset::DatasetDescriptor;
use super::model::{Cube, Slot};
use crate::ocmbin::format::{NM_PER_UM, POSITION_DATASET};
use crate::ocmbin::{header, region};
use crate::util::{ByteOrder, ElementType, Result, Shape, Volume};

pub(crate) fn load(cube: &mut Cube, path: &Path) -> Result<()> {
    let hdr = header::read_header(path)?;
    debug!("legacy header: {} datasets", hdr.data.len());

    cube.name = hdr
        .extra
        .get("Name")
        .and_then(|v| v.as_str())
        .map(String::from);
    cube.desc = hdr
        .extra
        .get("Description")
        .and_then(|v| v.as_str())
        .map(String::from);
    cube.meta = hdr.extra.clone();

    for d in &hdr.data {
        let shape = Shape::from_u64(&d.size)?;
        let dtype = ElementType::resolve(&d.dtype);
        // Legacy regions carry no byte-order token; the capture hardware
        // is little-endian.
        let desc = DatasetDescriptor {
            name: d.name.clone(),
            dtype,
            order: ByteOrder::Little,
            order_defaulted: false,
            shape,
            region: Some(d.position),
            source: None,
        };

        let report = d.position.overlap();
        if report.overlapped {
            warn!(
                "dataset {:?} wrote {} bytes past its {}-byte allocation",
                d.name, report.overbyte, report.allocated
            );
        }
        cube.overlap.insert(d.name.clone(), report);

        let mut volume =
            region::read_region(path, d.position.start_byte, &desc.shape, dtype, desc.order)?;

        // Positions are stored as integer nanometers; expose micrometers.
        if d.name == POSITION_DATASET && volume.dtype().is_integer() {
            volume = Volume::F64(volume.to_f64().mapv(|nm| nm / NM_PER_UM));
        }

        cube.insert_dataset(d.name.clone(), Slot::Owned(volume));
        cube.descriptors.push(desc);
    }

    Ok(())
}
