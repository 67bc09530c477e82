// SPDX-License-Identifier: MIT OR Apache-2.0

//! ACPI device path nodes.

use super::reader::Reader;
use super::NodeData;
use efiboot_raw::device_path::EISA_PNP0A03;

/// Device identified by its ACPI `_HID` and `_UID`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Acpi {
    /// Compressed EISA hardware ID.
    pub hid: u32,
    /// Unique ID distinguishing devices with the same `hid`.
    pub uid: u32,
}

impl Acpi {
    /// PCI root bridge (`PNP0A03`) with the given unique ID.
    #[must_use]
    pub const fn pci_root(uid: u32) -> Self {
        Self {
            hid: EISA_PNP0A03,
            uid,
        }
    }

    /// Decode `hid` as an EISA ID such as `PNP0A03`, if it is one.
    #[must_use]
    pub fn eisa_id(&self) -> Option<String> {
        let vendor = (self.hid & 0xffff) as u16;
        let product = (self.hid >> 16) as u16;
        let letters = [(vendor >> 10) & 0x1f, (vendor >> 5) & 0x1f, vendor & 0x1f];
        if letters.iter().any(|&l| l == 0 || l > 26) {
            return None;
        }
        let mut id: String = letters
            .iter()
            .map(|&l| char::from(b'@' + l as u8))
            .collect();
        id.push_str(&format!("{product:04X}"));
        Some(id)
    }
}

impl NodeData for Acpi {
    const MIN_DATA_SIZE: usize = 8;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            hid: r.u32()?,
            uid: r.u32()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.hid.to_le_bytes());
        out.extend_from_slice(&self.uid.to_le_bytes());
    }
}
