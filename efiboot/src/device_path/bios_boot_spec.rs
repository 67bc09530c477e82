// SPDX-License-Identifier: MIT OR Apache-2.0

//! BIOS Boot Specification device path nodes.

use super::reader::Reader;
use super::NodeData;

/// Legacy BIOS boot device.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BootSpecification {
    /// BBS device type, e.g. 0x02 for a hard disk.
    pub device_type: u16,
    /// BBS status flags.
    pub status_flag: u16,
    /// Description as stored, normally ASCII and NUL-terminated.
    pub description_string: Vec<u8>,
}

impl BootSpecification {
    /// The description up to its first NUL, with non-ASCII bytes replaced.
    #[must_use]
    pub fn description(&self) -> String {
        let end = self
            .description_string
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.description_string.len());
        String::from_utf8_lossy(&self.description_string[..end]).into_owned()
    }
}

impl NodeData for BootSpecification {
    const MIN_DATA_SIZE: usize = 4;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            device_type: r.u16()?,
            status_flag: r.u16()?,
            description_string: r.rest().to_vec(),
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE + self.description_string.len()
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.device_type.to_le_bytes());
        out.extend_from_slice(&self.status_flag.to_le_bytes());
        out.extend_from_slice(&self.description_string);
    }
}
