// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device path nodes and chains.
//!
//! A device path is a packed sequence of variable-length nodes. Each node
//! begins with a [`DevicePathHeader`] giving its type, sub-type and total
//! length; the chain ends with an end-entire node.
//!
//! [`decode_node`] and [`encode_node`] convert a single node. Nodes whose
//! type this crate does not know, or whose layout is a later revision with
//! extra trailing fields, decode to [`DevicePathNode::Unknown`] and encode
//! back to the same bytes. [`decode_chain`] walks a whole chain lazily, and
//! [`DevicePath`] is the owned, validated form used by load options.
//!
//! ```
//! use efiboot::device_path::{decode_chain, encode_chain, media, DevicePathNode};
//!
//! let file = media::FilePath::new(r"\EFI\BOOT\BOOTX64.EFI").unwrap();
//! let bytes = encode_chain(&[DevicePathNode::MediaFilePath(file)]).unwrap();
//!
//! let nodes: Vec<_> = decode_chain(&bytes).collect::<Result<_, _>>().unwrap();
//! assert_eq!(nodes.len(), 2);
//! assert!(nodes[1].is_end_entire());
//! ```

pub mod acpi;
pub mod bios_boot_spec;
pub mod hardware;
pub mod media;
pub mod messaging;

mod chain;
mod reader;
mod text;
mod vendor;

pub use chain::{chain_byte_length, decode_chain, encode_chain, ChainError, DevicePath, Nodes, TruncatedChain};
pub use efiboot_raw::device_path::{DevicePathHeader, DeviceSubType, DeviceType};
pub use vendor::Vendor;

use core::fmt::{self, Display, Formatter};
use log::trace;
use reader::Reader;

/// Payload codec shared by every known node layout.
///
/// The payload is everything after the four-byte header.
pub(crate) trait NodeData: Sized {
    /// Bytes of payload the layout needs at minimum.
    const MIN_DATA_SIZE: usize;

    /// Read the payload. Returns `None` if it is too short.
    fn read(r: &mut Reader<'_>) -> Option<Self>;

    /// Encoded payload size in bytes.
    fn data_len(&self) -> usize;

    /// Append the encoded payload to `out`.
    fn write_data(&self, out: &mut Vec<u8>);
}

/// Node with a type this crate does not decode, kept as raw bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnknownNode {
    /// Node type.
    pub device_type: DeviceType,
    /// Node sub-type.
    pub sub_type: DeviceSubType,
    /// Payload following the header.
    pub data: Vec<u8>,
}

/// One decoded device path node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DevicePathNode {
    HardwarePci(hardware::Pci),
    HardwarePccard(hardware::Pccard),
    HardwareMemoryMapped(hardware::MemoryMapped),
    HardwareVendor(Vendor),
    HardwareController(hardware::Controller),
    AcpiAcpi(acpi::Acpi),
    MessagingAtapi(messaging::Atapi),
    MessagingScsi(messaging::Scsi),
    MessagingFibreChannel(messaging::FibreChannel),
    Messaging1394(messaging::Ieee1394),
    MessagingUsb(messaging::Usb),
    MessagingI2o(messaging::I2o),
    MessagingInfiniband(messaging::Infiniband),
    MessagingVendor(Vendor),
    MessagingMacAddress(messaging::MacAddress),
    MessagingIpv4(messaging::Ipv4),
    MessagingIpv6(messaging::Ipv6),
    MessagingUart(messaging::Uart),
    MessagingUsbClass(messaging::UsbClass),
    MediaHardDrive(media::HardDrive),
    MediaCdRom(media::CdRom),
    MediaVendor(Vendor),
    MediaFilePath(media::FilePath),
    MediaProtocol(media::Protocol),
    BiosBootSpec(bios_boot_spec::BootSpecification),
    /// Separates the instances of a multi-instance path.
    EndInstance,
    /// Ends the whole path.
    EndEntire,
    /// Any node not covered above.
    Unknown(UnknownNode),
}

/// Errors decoding or encoding a single node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeError {
    /// Fewer than four bytes remain at `offset`, so not even a header fits.
    BufferTooSmall {
        /// Offset of the node in the buffer.
        offset: usize,
        /// Bytes remaining from `offset`.
        available: usize,
    },
    /// The header's length field is below the minimum for the node type, or
    /// runs past the end of the buffer.
    InvalidNodeLength {
        /// Offset of the node in the buffer.
        offset: usize,
        /// Node type.
        device_type: DeviceType,
        /// Node sub-type.
        sub_type: DeviceSubType,
        /// Length given in the header.
        length: u16,
    },
    /// The encoded node would not fit the 16-bit length field.
    NodeTooBig {
        /// Node type.
        device_type: DeviceType,
        /// Node sub-type.
        sub_type: DeviceSubType,
        /// Size the node would have in bytes.
        size: usize,
    },
}

impl Display for NodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { offset, available } => write!(
                f,
                "device path node at offset {offset} is cut short: {available} bytes left"
            ),
            Self::InvalidNodeLength {
                offset,
                device_type,
                sub_type,
                length,
            } => write!(
                f,
                "device path node ({:#04x}, {:#04x}) at offset {offset} has invalid length {length}",
                device_type.0, sub_type.0
            ),
            Self::NodeTooBig {
                device_type,
                sub_type,
                size,
            } => write!(
                f,
                "device path node ({:#04x}, {:#04x}) needs {size} bytes, more than a node can hold",
                device_type.0, sub_type.0
            ),
        }
    }
}

impl std::error::Error for NodeError {}

/// Decode `T` from a payload, or return `None` if the payload is longer
/// than `T` accounts for and must be kept opaque.
fn decode_as<T: NodeData>(data: &[u8], invalid: NodeError) -> Result<Option<T>, NodeError> {
    if data.len() < T::MIN_DATA_SIZE {
        return Err(invalid);
    }
    let node = T::read(&mut Reader::new(data)).ok_or(invalid)?;
    if node.data_len() != data.len() {
        return Ok(None);
    }
    Ok(Some(node))
}

/// Decode the node that starts at `offset` in `buffer`.
///
/// Returns the node and the number of bytes it occupies.
pub fn decode_node(buffer: &[u8], offset: usize) -> Result<(DevicePathNode, usize), NodeError> {
    let bytes = buffer.get(offset..).unwrap_or_default();
    let header = DevicePathHeader::read(bytes).ok_or(NodeError::BufferTooSmall {
        offset,
        available: bytes.len(),
    })?;
    let length = usize::from(header.length);
    let invalid = NodeError::InvalidNodeLength {
        offset,
        device_type: header.device_type,
        sub_type: header.sub_type,
        length: header.length,
    };
    if length < DevicePathHeader::SIZE || length > bytes.len() {
        return Err(invalid);
    }
    let data = &bytes[DevicePathHeader::SIZE..length];

    macro_rules! decode {
        ($variant:ident, $ty:ty) => {
            decode_as::<$ty>(data, invalid)?.map(DevicePathNode::$variant)
        };
    }

    let decoded = match header.full_type() {
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCI) => decode!(HardwarePci, hardware::Pci),
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCCARD) => {
            decode!(HardwarePccard, hardware::Pccard)
        }
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_MEMORY_MAPPED) => {
            decode!(HardwareMemoryMapped, hardware::MemoryMapped)
        }
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_VENDOR) => decode!(HardwareVendor, Vendor),
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_CONTROLLER) => {
            decode!(HardwareController, hardware::Controller)
        }
        (DeviceType::ACPI, DeviceSubType::ACPI) => decode!(AcpiAcpi, acpi::Acpi),
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_ATAPI) => {
            decode!(MessagingAtapi, messaging::Atapi)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_SCSI) => {
            decode!(MessagingScsi, messaging::Scsi)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_FIBRE_CHANNEL) => {
            decode!(MessagingFibreChannel, messaging::FibreChannel)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_1394) => {
            decode!(Messaging1394, messaging::Ieee1394)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB) => {
            decode!(MessagingUsb, messaging::Usb)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_I2O) => {
            decode!(MessagingI2o, messaging::I2o)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_INFINIBAND) => {
            decode!(MessagingInfiniband, messaging::Infiniband)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_VENDOR) => {
            decode!(MessagingVendor, Vendor)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_MAC_ADDRESS) => {
            decode!(MessagingMacAddress, messaging::MacAddress)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_IPV4) => {
            decode!(MessagingIpv4, messaging::Ipv4)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_IPV6) => {
            decode!(MessagingIpv6, messaging::Ipv6)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_UART) => {
            decode!(MessagingUart, messaging::Uart)
        }
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB_CLASS) => {
            decode!(MessagingUsbClass, messaging::UsbClass)
        }
        (DeviceType::MEDIA, DeviceSubType::MEDIA_HARD_DRIVE) => {
            decode!(MediaHardDrive, media::HardDrive)
        }
        (DeviceType::MEDIA, DeviceSubType::MEDIA_CD_ROM) => decode!(MediaCdRom, media::CdRom),
        (DeviceType::MEDIA, DeviceSubType::MEDIA_VENDOR) => decode!(MediaVendor, Vendor),
        (DeviceType::MEDIA, DeviceSubType::MEDIA_FILE_PATH) => {
            decode!(MediaFilePath, media::FilePath)
        }
        (DeviceType::MEDIA, DeviceSubType::MEDIA_PROTOCOL) => {
            decode!(MediaProtocol, media::Protocol)
        }
        (DeviceType::BIOS_BOOT_SPEC, DeviceSubType::BIOS_BOOT_SPECIFICATION) => {
            decode!(BiosBootSpec, bios_boot_spec::BootSpecification)
        }
        (DeviceType::END, DeviceSubType::END_INSTANCE | DeviceSubType::END_ENTIRE) => {
            if !data.is_empty() {
                return Err(invalid);
            }
            if header.sub_type == DeviceSubType::END_ENTIRE {
                Some(DevicePathNode::EndEntire)
            } else {
                Some(DevicePathNode::EndInstance)
            }
        }
        _ => None,
    };

    let node = decoded.unwrap_or_else(|| {
        trace!(
            "keeping device path node ({:#04x}, {:#04x}) of {length} bytes opaque",
            header.device_type.0,
            header.sub_type.0
        );
        DevicePathNode::Unknown(UnknownNode {
            device_type: header.device_type,
            sub_type: header.sub_type,
            data: data.to_vec(),
        })
    });
    Ok((node, length))
}

/// Encode a node, header included.
pub fn encode_node(node: &DevicePathNode) -> Result<Vec<u8>, NodeError> {
    let mut out = Vec::with_capacity(node.encoded_len());
    node.write_to(&mut out)?;
    Ok(out)
}

impl DevicePathNode {
    /// Type and sub-type of the node.
    #[must_use]
    pub const fn full_type(&self) -> (DeviceType, DeviceSubType) {
        match self {
            Self::HardwarePci(_) => (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCI),
            Self::HardwarePccard(_) => (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCCARD),
            Self::HardwareMemoryMapped(_) => {
                (DeviceType::HARDWARE, DeviceSubType::HARDWARE_MEMORY_MAPPED)
            }
            Self::HardwareVendor(_) => (DeviceType::HARDWARE, DeviceSubType::HARDWARE_VENDOR),
            Self::HardwareController(_) => {
                (DeviceType::HARDWARE, DeviceSubType::HARDWARE_CONTROLLER)
            }
            Self::AcpiAcpi(_) => (DeviceType::ACPI, DeviceSubType::ACPI),
            Self::MessagingAtapi(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_ATAPI),
            Self::MessagingScsi(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_SCSI),
            Self::MessagingFibreChannel(_) => {
                (DeviceType::MESSAGING, DeviceSubType::MESSAGING_FIBRE_CHANNEL)
            }
            Self::Messaging1394(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_1394),
            Self::MessagingUsb(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB),
            Self::MessagingI2o(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_I2O),
            Self::MessagingInfiniband(_) => {
                (DeviceType::MESSAGING, DeviceSubType::MESSAGING_INFINIBAND)
            }
            Self::MessagingVendor(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_VENDOR),
            Self::MessagingMacAddress(_) => {
                (DeviceType::MESSAGING, DeviceSubType::MESSAGING_MAC_ADDRESS)
            }
            Self::MessagingIpv4(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_IPV4),
            Self::MessagingIpv6(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_IPV6),
            Self::MessagingUart(_) => (DeviceType::MESSAGING, DeviceSubType::MESSAGING_UART),
            Self::MessagingUsbClass(_) => {
                (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB_CLASS)
            }
            Self::MediaHardDrive(_) => (DeviceType::MEDIA, DeviceSubType::MEDIA_HARD_DRIVE),
            Self::MediaCdRom(_) => (DeviceType::MEDIA, DeviceSubType::MEDIA_CD_ROM),
            Self::MediaVendor(_) => (DeviceType::MEDIA, DeviceSubType::MEDIA_VENDOR),
            Self::MediaFilePath(_) => (DeviceType::MEDIA, DeviceSubType::MEDIA_FILE_PATH),
            Self::MediaProtocol(_) => (DeviceType::MEDIA, DeviceSubType::MEDIA_PROTOCOL),
            Self::BiosBootSpec(_) => (
                DeviceType::BIOS_BOOT_SPEC,
                DeviceSubType::BIOS_BOOT_SPECIFICATION,
            ),
            Self::EndInstance => (DeviceType::END, DeviceSubType::END_INSTANCE),
            Self::EndEntire => (DeviceType::END, DeviceSubType::END_ENTIRE),
            Self::Unknown(node) => (node.device_type, node.sub_type),
        }
    }

    /// Node type.
    #[must_use]
    pub const fn device_type(&self) -> DeviceType {
        self.full_type().0
    }

    /// Node sub-type.
    #[must_use]
    pub const fn sub_type(&self) -> DeviceSubType {
        self.full_type().1
    }

    /// True for the node that ends an entire path.
    #[must_use]
    pub const fn is_end_entire(&self) -> bool {
        matches!(self, Self::EndEntire)
    }

    /// True for the separator between instances of a path.
    #[must_use]
    pub const fn is_end_instance(&self) -> bool {
        matches!(self, Self::EndInstance)
    }

    fn payload(&self) -> Option<&dyn Payload> {
        let payload: &dyn Payload = match self {
            Self::HardwarePci(n) => n,
            Self::HardwarePccard(n) => n,
            Self::HardwareMemoryMapped(n) => n,
            Self::HardwareVendor(n) | Self::MessagingVendor(n) | Self::MediaVendor(n) => n,
            Self::HardwareController(n) => n,
            Self::AcpiAcpi(n) => n,
            Self::MessagingAtapi(n) => n,
            Self::MessagingScsi(n) => n,
            Self::MessagingFibreChannel(n) => n,
            Self::Messaging1394(n) => n,
            Self::MessagingUsb(n) => n,
            Self::MessagingI2o(n) => n,
            Self::MessagingInfiniband(n) => n,
            Self::MessagingMacAddress(n) => n,
            Self::MessagingIpv4(n) => n,
            Self::MessagingIpv6(n) => n,
            Self::MessagingUart(n) => n,
            Self::MessagingUsbClass(n) => n,
            Self::MediaHardDrive(n) => n,
            Self::MediaCdRom(n) => n,
            Self::MediaFilePath(n) => n,
            Self::MediaProtocol(n) => n,
            Self::BiosBootSpec(n) => n,
            Self::EndInstance | Self::EndEntire => return None,
            Self::Unknown(n) => &n.data,
        };
        Some(payload)
    }

    /// Size of the encoded node in bytes, header included.
    ///
    /// May exceed what the 16-bit length field can express; [`encode_node`]
    /// rejects such nodes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        DevicePathHeader::SIZE + self.payload().map_or(0, |p| p.payload_len())
    }

    /// Append the encoded node to `out`.
    ///
    /// Nothing is written if the node is too big.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), NodeError> {
        let (device_type, sub_type) = self.full_type();
        let size = self.encoded_len();
        let length = u16::try_from(size).map_err(|_| NodeError::NodeTooBig {
            device_type,
            sub_type,
            size,
        })?;
        let header = DevicePathHeader {
            device_type,
            sub_type,
            length,
        };
        out.extend_from_slice(&header.to_bytes());
        if let Some(payload) = self.payload() {
            payload.write_payload(out);
        }
        Ok(())
    }
}

/// Object-safe view of a node payload.
trait Payload {
    fn payload_len(&self) -> usize;
    fn write_payload(&self, out: &mut Vec<u8>);
}

impl<T: NodeData> Payload for T {
    fn payload_len(&self) -> usize {
        self.data_len()
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        self.write_data(out);
    }
}

impl Payload for Vec<u8> {
    fn payload_len(&self) -> usize {
        self.len()
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

macro_rules! impl_from_node {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DevicePathNode {
                fn from(node: $ty) -> Self {
                    Self::$variant(node)
                }
            }
        )*
    };
}

impl_from_node! {
    hardware::Pci => HardwarePci,
    hardware::Pccard => HardwarePccard,
    hardware::MemoryMapped => HardwareMemoryMapped,
    hardware::Controller => HardwareController,
    acpi::Acpi => AcpiAcpi,
    messaging::Atapi => MessagingAtapi,
    messaging::Scsi => MessagingScsi,
    messaging::FibreChannel => MessagingFibreChannel,
    messaging::Ieee1394 => Messaging1394,
    messaging::Usb => MessagingUsb,
    messaging::I2o => MessagingI2o,
    messaging::Infiniband => MessagingInfiniband,
    messaging::MacAddress => MessagingMacAddress,
    messaging::Ipv4 => MessagingIpv4,
    messaging::Ipv6 => MessagingIpv6,
    messaging::Uart => MessagingUart,
    messaging::UsbClass => MessagingUsbClass,
    media::HardDrive => MediaHardDrive,
    media::CdRom => MediaCdRom,
    media::FilePath => MediaFilePath,
    media::Protocol => MediaProtocol,
    bios_boot_spec::BootSpecification => BiosBootSpec,
    UnknownNode => Unknown,
}
