// SPDX-License-Identifier: MIT OR Apache-2.0

use super::reader::Reader;
use super::NodeData;
use efiboot_raw::device_path::EDD10_HARDWARE_VENDOR_PATH_GUID;
use uguid::Guid;

/// Vendor-defined node.
///
/// The same layout is used under the hardware, messaging and media types;
/// which one a node belongs to is recorded by the
/// [`DevicePathNode`](super::DevicePathNode) variant that holds it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Vendor {
    /// GUID naming the vendor's layout for the data.
    pub vendor_guid: Guid,
    /// Vendor-defined payload.
    pub vendor_defined_data: Vec<u8>,
}

impl Vendor {
    /// EDD 1.0 hardware vendor node for a BIOS drive number such as `0x80`.
    ///
    /// Belongs under the hardware type; the encoded node is 24 bytes long.
    #[must_use]
    pub fn edd10(device_number: u32) -> Self {
        Self {
            vendor_guid: EDD10_HARDWARE_VENDOR_PATH_GUID,
            vendor_defined_data: device_number.to_le_bytes().to_vec(),
        }
    }

    /// BIOS drive number, if this is an EDD 1.0 node.
    #[must_use]
    pub fn edd10_device_number(&self) -> Option<u32> {
        if self.vendor_guid != EDD10_HARDWARE_VENDOR_PATH_GUID {
            return None;
        }
        let bytes = <[u8; 4]>::try_from(self.vendor_defined_data.as_slice()).ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

impl NodeData for Vendor {
    const MIN_DATA_SIZE: usize = 16;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            vendor_guid: r.guid()?,
            vendor_defined_data: r.rest().to_vec(),
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE + self.vendor_defined_data.len()
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.vendor_guid.to_bytes());
        out.extend_from_slice(&self.vendor_defined_data);
    }
}
