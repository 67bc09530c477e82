// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media device path nodes.

use super::reader::Reader;
use super::NodeData;
use crate::data_types::{decode_wstring, encode_wstring, StrError};
use uguid::Guid;

efiboot_raw::newtype_enum! {
/// Partition table type of a [`HardDrive`] node.
pub enum PartitionFormat: u8 => {
    /// Legacy PC-AT master boot record.
    MBR = 0x01,
    /// GUID partition table.
    GPT = 0x02,
}}

efiboot_raw::newtype_enum! {
/// How the signature field of a [`HardDrive`] node is interpreted.
pub enum SignatureType: u8 => {
    /// No signature.
    NONE = 0x00,
    /// 32-bit MBR disk signature in the first four bytes.
    MBR = 0x01,
    /// GPT partition GUID.
    GUID = 0x02,
}}

/// Decoded form of [`HardDrive::partition_signature`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartitionSignature {
    /// No signature.
    None,
    /// 32-bit MBR disk signature.
    Mbr([u8; 4]),
    /// GPT partition GUID.
    Guid(Guid),
    /// Signature of a type this crate does not know.
    Unknown {
        /// Raw signature type.
        signature_type: SignatureType,
        /// Raw signature bytes.
        signature: [u8; 16],
    },
}

/// Partition on a hard drive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HardDrive {
    /// Index of the partition, starting at 1. Zero means the whole disk.
    pub partition_number: u32,
    /// First logical block of the partition.
    pub partition_start: u64,
    /// Size of the partition in logical blocks.
    pub partition_size: u64,
    /// Raw signature; see [`HardDrive::signature`].
    pub partition_signature: [u8; 16],
    /// Partition table type.
    pub partition_format: PartitionFormat,
    /// Signature type.
    pub signature_type: SignatureType,
    /// Bytes following the fixed fields, kept verbatim.
    pub padding: Vec<u8>,
}

impl HardDrive {
    /// Number of zero bytes appended by [`HardDrive::new`].
    pub const PADDING_SIZE: usize = 6;

    /// Build a node with the customary six bytes of trailing padding.
    #[must_use]
    pub fn new(
        partition_number: u32,
        partition_start: u64,
        partition_size: u64,
        signature: PartitionSignature,
        partition_format: PartitionFormat,
    ) -> Self {
        let mut partition_signature = [0; 16];
        let signature_type = match signature {
            PartitionSignature::None => SignatureType::NONE,
            PartitionSignature::Mbr(mbr) => {
                partition_signature[..4].copy_from_slice(&mbr);
                SignatureType::MBR
            }
            PartitionSignature::Guid(guid) => {
                partition_signature = guid.to_bytes();
                SignatureType::GUID
            }
            PartitionSignature::Unknown {
                signature_type,
                signature,
            } => {
                partition_signature = signature;
                signature_type
            }
        };
        Self {
            partition_number,
            partition_start,
            partition_size,
            partition_signature,
            partition_format,
            signature_type,
            padding: vec![0; Self::PADDING_SIZE],
        }
    }

    /// Interpret the signature field according to `signature_type`.
    #[must_use]
    pub fn signature(&self) -> PartitionSignature {
        match self.signature_type {
            SignatureType::NONE => PartitionSignature::None,
            SignatureType::MBR => {
                let [a, b, c, d, ..] = self.partition_signature;
                PartitionSignature::Mbr([a, b, c, d])
            }
            SignatureType::GUID => {
                PartitionSignature::Guid(Guid::from_bytes(self.partition_signature))
            }
            signature_type => PartitionSignature::Unknown {
                signature_type,
                signature: self.partition_signature,
            },
        }
    }
}

impl NodeData for HardDrive {
    const MIN_DATA_SIZE: usize = 38;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            partition_number: r.u32()?,
            partition_start: r.u64()?,
            partition_size: r.u64()?,
            partition_signature: r.array()?,
            partition_format: PartitionFormat(r.u8()?),
            signature_type: SignatureType(r.u8()?),
            padding: r.rest().to_vec(),
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE + self.padding.len()
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.partition_number.to_le_bytes());
        out.extend_from_slice(&self.partition_start.to_le_bytes());
        out.extend_from_slice(&self.partition_size.to_le_bytes());
        out.extend_from_slice(&self.partition_signature);
        out.extend_from_slice(&[self.partition_format.0, self.signature_type.0]);
        out.extend_from_slice(&self.padding);
    }
}

/// El Torito boot image on a CD-ROM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CdRom {
    /// Boot catalog entry.
    pub boot_entry: u32,
    /// First logical block of the image.
    pub partition_start: u64,
    /// Size of the image in logical blocks.
    pub partition_size: u64,
}

impl NodeData for CdRom {
    const MIN_DATA_SIZE: usize = 20;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            boot_entry: r.u32()?,
            partition_start: r.u64()?,
            partition_size: r.u64()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.boot_entry.to_le_bytes());
        out.extend_from_slice(&self.partition_start.to_le_bytes());
        out.extend_from_slice(&self.partition_size.to_le_bytes());
    }
}

/// File path relative to the medium selected by the preceding nodes.
///
/// The UCS-2 bytes are kept exactly as read, terminator included, so that
/// unusual encodings survive a round trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilePath {
    path_name: Vec<u8>,
}

impl FilePath {
    /// Build a node for `path`, e.g. `\EFI\BOOT\BOOTX64.EFI`.
    pub fn new(path: &str) -> Result<Self, StrError> {
        Ok(Self {
            path_name: encode_wstring(path, usize::MAX)?,
        })
    }

    /// The path, up to its terminator.
    #[must_use]
    pub fn path_name(&self) -> String {
        decode_wstring(&self.path_name, usize::MAX)
    }

    /// The encoded path as stored in the node.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.path_name
    }
}

impl NodeData for FilePath {
    const MIN_DATA_SIZE: usize = 0;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            path_name: r.rest().to_vec(),
        })
    }

    fn data_len(&self) -> usize {
        self.path_name.len()
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.path_name);
    }
}

/// Firmware file system protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Protocol {
    /// Protocol GUID.
    pub protocol_guid: Guid,
}

impl NodeData for Protocol {
    const MIN_DATA_SIZE: usize = 16;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            protocol_guid: r.guid()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.protocol_guid.to_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uguid::guid;

    #[test]
    fn test_hard_drive_signature() {
        let part = guid!("5a7c5a34-9d36-4ba2-8d8b-bc8a0bfd8de1");
        let hd = HardDrive::new(1, 0x800, 0x10_0000, PartitionSignature::Guid(part), PartitionFormat::GPT);
        assert_eq!(hd.signature_type, SignatureType::GUID);
        assert_eq!(hd.signature(), PartitionSignature::Guid(part));
        assert_eq!(hd.padding, [0; 6]);

        let mbr = HardDrive::new(2, 63, 1024, PartitionSignature::Mbr([1, 2, 3, 4]), PartitionFormat::MBR);
        assert_eq!(mbr.partition_signature[..4], [1, 2, 3, 4]);
        assert_eq!(mbr.signature(), PartitionSignature::Mbr([1, 2, 3, 4]));

        let odd = HardDrive {
            signature_type: SignatureType(9),
            ..mbr
        };
        assert!(matches!(odd.signature(), PartitionSignature::Unknown { .. }));
    }

    #[test]
    fn test_file_path() {
        let fp = FilePath::new("\\EFI\\BOOT").unwrap();
        assert_eq!(fp.path_name(), "\\EFI\\BOOT");
        assert_eq!(fp.data_len(), 20);
        assert!(FilePath::new("a\0b").is_err());
    }
}
