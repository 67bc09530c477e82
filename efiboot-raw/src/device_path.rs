// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device path node header and type codes.
//!
//! Every node of a device path starts with the same four bytes: a type, a
//! sub-type and the little-endian length of the whole node, header included.
//! Nodes are packed back to back with no alignment, so the header is read and
//! written byte by byte rather than overlaid on the buffer.

use crate::{guid, Guid};

newtype_enum! {
/// Type identifier for a device path node.
pub enum DeviceType: u8 => {
    /// Hardware device path: how a device attaches to the resource domain
    /// of the system.
    HARDWARE = 0x01,
    /// ACPI device path: a link into the ACPI namespace.
    ACPI = 0x02,
    /// Messaging device path: connections outside the resource domain,
    /// such as SCSI targets or network addresses.
    MESSAGING = 0x03,
    /// Media device path: the portion of a medium being abstracted, such
    /// as a partition or a file.
    MEDIA = 0x04,
    /// BIOS Boot Specification device path, used to boot legacy operating
    /// systems.
    BIOS_BOOT_SPEC = 0x05,
    /// End of hardware device path. The sub-type says whether an instance
    /// or the entire path ends here.
    END = 0x7F,
}}

/// Sub-type identifier for a device path node.
///
/// The meaning of a sub-type depends on the [`DeviceType`] it is paired with,
/// so the constants below overlap in value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DeviceSubType(pub u8);

impl DeviceSubType {
    /// PCI device path.
    pub const HARDWARE_PCI: Self = Self(1);
    /// PC card device path.
    pub const HARDWARE_PCCARD: Self = Self(2);
    /// Memory-mapped device path.
    pub const HARDWARE_MEMORY_MAPPED: Self = Self(3);
    /// Vendor-defined hardware device path.
    pub const HARDWARE_VENDOR: Self = Self(4);
    /// Controller device path.
    pub const HARDWARE_CONTROLLER: Self = Self(5);

    /// ACPI device path.
    pub const ACPI: Self = Self(1);

    /// ATAPI device path.
    pub const MESSAGING_ATAPI: Self = Self(1);
    /// SCSI device path.
    pub const MESSAGING_SCSI: Self = Self(2);
    /// Fibre Channel device path.
    pub const MESSAGING_FIBRE_CHANNEL: Self = Self(3);
    /// 1394 device path.
    pub const MESSAGING_1394: Self = Self(4);
    /// USB device path.
    pub const MESSAGING_USB: Self = Self(5);
    /// I2O device path.
    pub const MESSAGING_I2O: Self = Self(6);
    /// InfiniBand device path.
    pub const MESSAGING_INFINIBAND: Self = Self(9);
    /// Vendor-defined messaging device path.
    pub const MESSAGING_VENDOR: Self = Self(10);
    /// MAC address device path.
    pub const MESSAGING_MAC_ADDRESS: Self = Self(11);
    /// IPv4 device path.
    pub const MESSAGING_IPV4: Self = Self(12);
    /// IPv6 device path.
    pub const MESSAGING_IPV6: Self = Self(13);
    /// UART device path.
    pub const MESSAGING_UART: Self = Self(14);
    /// USB class device path.
    pub const MESSAGING_USB_CLASS: Self = Self(15);

    /// Hard drive partition device path.
    pub const MEDIA_HARD_DRIVE: Self = Self(1);
    /// CD-ROM boot entry device path.
    pub const MEDIA_CD_ROM: Self = Self(2);
    /// Vendor-defined media device path.
    pub const MEDIA_VENDOR: Self = Self(3);
    /// File path device path.
    pub const MEDIA_FILE_PATH: Self = Self(4);
    /// Media protocol device path.
    pub const MEDIA_PROTOCOL: Self = Self(5);

    /// BIOS Boot Specification device path.
    pub const BIOS_BOOT_SPECIFICATION: Self = Self(1);

    /// End this instance of a device path and start a new one.
    pub const END_INSTANCE: Self = Self(0x01);
    /// End the entire device path.
    pub const END_ENTIRE: Self = Self(0xFF);
}

/// Header that appears at the start of every device path node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DevicePathHeader {
    /// Type of device.
    pub device_type: DeviceType,
    /// Sub-type of device.
    pub sub_type: DeviceSubType,
    /// Size (in bytes) of the whole node, including this header.
    pub length: u16,
}

impl DevicePathHeader {
    /// Size of the encoded header in bytes.
    pub const SIZE: usize = 4;

    /// Header of the node that ends an entire device path.
    pub const END_ENTIRE: Self = Self {
        device_type: DeviceType::END,
        sub_type: DeviceSubType::END_ENTIRE,
        length: Self::SIZE as u16,
    };

    /// Read a header from the start of `bytes`.
    ///
    /// Returns `None` if fewer than [`SIZE`] bytes are available. The length
    /// field is returned as found; checking it against the buffer is up to
    /// the caller.
    ///
    /// [`SIZE`]: Self::SIZE
    #[must_use]
    pub const fn read(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            device_type: DeviceType(bytes[0]),
            sub_type: DeviceSubType(bytes[1]),
            length: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }

    /// Encode the header in its on-disk form.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; Self::SIZE] {
        let length = self.length.to_le_bytes();
        [self.device_type.0, self.sub_type.0, length[0], length[1]]
    }

    /// Tuple of the node's type and sub-type.
    #[must_use]
    pub const fn full_type(&self) -> (DeviceType, DeviceSubType) {
        (self.device_type, self.sub_type)
    }

    /// True if this header belongs to a node that ends an entire path.
    #[must_use]
    pub const fn is_end_entire(&self) -> bool {
        self.device_type.0 == DeviceType::END.0 && self.sub_type.0 == DeviceSubType::END_ENTIRE.0
    }
}

/// Compressed EISA id of `PNP0A03`, the PCI root bridge, as stored in the
/// `_HID` field of an ACPI node.
pub const EISA_PNP0A03: u32 = 0x0a03_41d0;

/// GUID of the device path protocol.
pub const DEVICE_PATH_PROTOCOL_GUID: Guid = guid!("09576e91-6d3f-11d2-8e39-00a0c969723b");

/// Vendor GUID of the EDD 1.0 hardware vendor node, which names a BIOS
/// (int 13h) disk by device number.
pub const EDD10_HARDWARE_VENDOR_PATH_GUID: Guid = guid!("cf31fac5-c24e-11d2-85f3-00a0c93ec93b");

/// Total length of an EDD 1.0 hardware vendor node: header, GUID and a
/// 32-bit device number.
pub const EDD10_HARDWARE_VENDOR_PATH_LENGTH: u16 = 24;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let bytes = [0x04, 0x01, 0x2a, 0x00];
        let header = DevicePathHeader::read(&bytes).unwrap();
        assert_eq!(
            header.full_type(),
            (DeviceType::MEDIA, DeviceSubType::MEDIA_HARD_DRIVE)
        );
        assert_eq!(header.length, 42);
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn test_header_short_buffer() {
        assert!(DevicePathHeader::read(&[0x7f, 0xff, 0x04]).is_none());
    }

    #[test]
    fn test_end_entire() {
        assert!(DevicePathHeader::END_ENTIRE.is_end_entire());
        assert_eq!(DevicePathHeader::END_ENTIRE.to_bytes(), [0x7f, 0xff, 0x04, 0x00]);
    }
}
