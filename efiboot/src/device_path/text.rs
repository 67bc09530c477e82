// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text form of device paths, as printed by firmware shells and boot
//! managers.

use super::media::{PartitionFormat, PartitionSignature};
use super::messaging::{Ipv4, Ipv6};
use super::{DevicePath, DevicePathNode, Vendor};
use core::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, Ipv6Addr};

struct Hex<'a>(&'a [u8]);

impl Display for Hex<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

fn write_vendor(f: &mut Formatter<'_>, prefix: &str, vendor: &Vendor) -> fmt::Result {
    write!(f, "{prefix}({}", vendor.vendor_guid)?;
    if !vendor.vendor_defined_data.is_empty() {
        write!(f, ",{}", Hex(&vendor.vendor_defined_data))?;
    }
    f.write_str(")")
}

fn write_protocol(f: &mut Formatter<'_>, protocol: u16) -> fmt::Result {
    match protocol {
        6 => f.write_str("TCP"),
        17 => f.write_str("UDP"),
        _ => write!(f, "0x{protocol:X}"),
    }
}

fn write_ipv4(f: &mut Formatter<'_>, node: &Ipv4) -> fmt::Result {
    write!(f, "IPv4({},", Ipv4Addr::from(node.remote_ip_address))?;
    write_protocol(f, node.protocol)?;
    let origin = if node.static_ip_address != 0 {
        "Static"
    } else {
        "DHCP"
    };
    write!(f, ",{origin},{}", Ipv4Addr::from(node.local_ip_address))?;
    if let Some(gateway) = &node.gateway {
        write!(
            f,
            ",{},{}",
            Ipv4Addr::from(gateway.gateway_ip_address),
            Ipv4Addr::from(gateway.subnet_mask)
        )?;
    }
    f.write_str(")")
}

fn write_ipv6(f: &mut Formatter<'_>, node: &Ipv6) -> fmt::Result {
    write!(f, "IPv6({},", Ipv6Addr::from(node.remote_ip_address))?;
    write_protocol(f, node.protocol)?;
    match node.ip_address_origin {
        0 => f.write_str(",Static")?,
        1 => f.write_str(",StatelessAutoConfigure")?,
        2 => f.write_str(",StatefulAutoConfigure")?,
        other => write!(f, ",0x{other:X}")?,
    }
    write!(f, ",{}", Ipv6Addr::from(node.local_ip_address))?;
    if let Some(routing) = &node.routing {
        write!(
            f,
            ",{},{}",
            Ipv6Addr::from(routing.gateway_ip_address),
            routing.prefix_length
        )?;
    }
    f.write_str(")")
}

impl Display for DevicePathNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwarePci(n) => write!(f, "Pci(0x{:X},0x{:X})", n.device, n.function),
            Self::HardwarePccard(n) => write!(f, "PcCard(0x{:X})", n.socket),
            Self::HardwareMemoryMapped(n) => write!(
                f,
                "MemoryMapped(0x{:X},0x{:X},0x{:X})",
                n.memory_type, n.start_address, n.end_address
            ),
            Self::HardwareVendor(n) => match n.edd10_device_number() {
                Some(device) => write!(f, "EDD10(0x{device:X})"),
                None => write_vendor(f, "VenHw", n),
            },
            Self::HardwareController(n) => write!(f, "Ctrl(0x{:X})", n.controller_number),
            Self::AcpiAcpi(n) => match n.eisa_id() {
                Some(id) if id == "PNP0A03" => write!(f, "PciRoot(0x{:X})", n.uid),
                Some(id) => write!(f, "Acpi({id},0x{:X})", n.uid),
                None => write!(f, "Acpi(0x{:X},0x{:X})", n.hid, n.uid),
            },
            Self::MessagingAtapi(n) => write!(
                f,
                "Ata({},{},0x{:X})",
                if n.primary_secondary == 0 { "Primary" } else { "Secondary" },
                if n.slave_master == 0 { "Master" } else { "Slave" },
                n.logical_unit_number
            ),
            Self::MessagingScsi(n) => {
                write!(f, "Scsi(0x{:X},0x{:X})", n.target_id, n.logical_unit_number)
            }
            Self::MessagingFibreChannel(n) => write!(
                f,
                "Fibre(0x{:X},0x{:X})",
                n.world_wide_name, n.logical_unit_number
            ),
            Self::Messaging1394(n) => write!(f, "I1394(0x{:X})", n.guid),
            Self::MessagingUsb(n) => {
                write!(f, "USB(0x{:X},0x{:X})", n.parent_port_number, n.interface)
            }
            Self::MessagingI2o(n) => write!(f, "I2O(0x{:X})", n.target_id),
            Self::MessagingInfiniband(n) => write!(
                f,
                "Infiniband(0x{:X},0x{:X},0x{:X},0x{:X})",
                n.reserved, n.node_guid, n.ioc_guid, n.device_id
            ),
            Self::MessagingVendor(n) => write_vendor(f, "VenMsg", n),
            Self::MessagingMacAddress(n) => {
                write!(f, "MAC({},0x{:X})", Hex(n.address()), n.interface_type)
            }
            Self::MessagingIpv4(n) => write_ipv4(f, n),
            Self::MessagingIpv6(n) => write_ipv6(f, n),
            Self::MessagingUart(n) => {
                let parity = match n.parity {
                    0 => "D",
                    1 => "N",
                    2 => "E",
                    3 => "O",
                    4 => "M",
                    5 => "S",
                    _ => "x",
                };
                let stop_bits = match n.stop_bits {
                    0 => "D",
                    1 => "1",
                    2 => "1.5",
                    3 => "2",
                    _ => "x",
                };
                write!(f, "Uart({},{},{parity},{stop_bits})", n.baud_rate, n.data_bits)
            }
            Self::MessagingUsbClass(n) => write!(
                f,
                "UsbClass(0x{:X},0x{:X},0x{:X},0x{:X},0x{:X})",
                n.vendor_id, n.product_id, n.device_class, n.device_subclass, n.device_protocol
            ),
            Self::MediaHardDrive(n) => {
                write!(f, "HD({},", n.partition_number)?;
                match n.partition_format {
                    PartitionFormat::MBR => f.write_str("MBR,")?,
                    PartitionFormat::GPT => f.write_str("GPT,")?,
                    other => write!(f, "0x{:X},", other.0)?,
                }
                match n.signature() {
                    PartitionSignature::None => f.write_str("0")?,
                    PartitionSignature::Mbr(mbr) => write!(f, "0x{:08X}", u32::from_le_bytes(mbr))?,
                    PartitionSignature::Guid(guid) => write!(f, "{guid}")?,
                    PartitionSignature::Unknown { signature, .. } => {
                        write!(f, "{}", Hex(&signature))?;
                    }
                }
                write!(f, ",0x{:X},0x{:X})", n.partition_start, n.partition_size)
            }
            Self::MediaCdRom(n) => write!(
                f,
                "CDROM(0x{:X},0x{:X},0x{:X})",
                n.boot_entry, n.partition_start, n.partition_size
            ),
            Self::MediaVendor(n) => write_vendor(f, "VenMedia", n),
            Self::MediaFilePath(n) => f.write_str(&n.path_name()),
            Self::MediaProtocol(n) => write!(f, "Media({})", n.protocol_guid),
            Self::BiosBootSpec(n) => write!(
                f,
                "BBS(0x{:X},{},0x{:X})",
                n.device_type,
                n.description(),
                n.status_flag
            ),
            Self::EndInstance => f.write_str(","),
            Self::EndEntire => Ok(()),
            Self::Unknown(n) => write!(
                f,
                "Path({},{},{})",
                n.device_type.0,
                n.sub_type.0,
                Hex(&n.data)
            ),
        }
    }
}

impl Display for DevicePath {
    /// Nodes are joined with `/`; instances are separated by `,`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut separate = false;
        for node in self {
            if node.is_end_instance() {
                f.write_str(",")?;
                separate = false;
                continue;
            }
            if separate {
                f.write_str("/")?;
            }
            write!(f, "{node}")?;
            separate = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_path::{acpi, hardware, media, messaging, UnknownNode};
    use crate::device_path::{DeviceSubType, DeviceType};
    use uguid::guid;

    #[test]
    fn test_boot_path_text() {
        let part = guid!("5a7c5a34-9d36-4ba2-8d8b-bc8a0bfd8de1");
        let path: DevicePath = [
            DevicePathNode::from(acpi::Acpi::pci_root(0)),
            hardware::Pci {
                function: 2,
                device: 0x1f,
            }
            .into(),
            media::HardDrive::new(
                1,
                0x800,
                0x10_0000,
                media::PartitionSignature::Guid(part),
                media::PartitionFormat::GPT,
            )
            .into(),
            media::FilePath::new(r"\EFI\BOOT\BOOTX64.EFI").unwrap().into(),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            path.to_string(),
            r"PciRoot(0x0)/Pci(0x1F,0x2)/HD(1,GPT,5a7c5a34-9d36-4ba2-8d8b-bc8a0bfd8de1,0x800,0x100000)/\EFI\BOOT\BOOTX64.EFI"
        );
    }

    #[test]
    fn test_node_text() {
        let mac = messaging::MacAddress::new(&[0, 0x1b, 0x21, 0xaa, 0xbb, 0xcc], 1).unwrap();
        assert_eq!(
            DevicePathNode::from(mac).to_string(),
            "MAC(001b21aabbcc,0x1)"
        );

        let ipv4 = messaging::Ipv4 {
            local_ip_address: [0; 4],
            remote_ip_address: [192, 168, 0, 1],
            local_port: 0,
            remote_port: 0,
            protocol: 6,
            static_ip_address: 0,
            gateway: None,
        };
        assert_eq!(
            DevicePathNode::from(ipv4).to_string(),
            "IPv4(192.168.0.1,TCP,DHCP,0.0.0.0)"
        );

        assert_eq!(
            DevicePathNode::HardwareVendor(Vendor::edd10(0x80)).to_string(),
            "EDD10(0x80)"
        );

        let unknown = UnknownNode {
            device_type: DeviceType(0xf0),
            sub_type: DeviceSubType(1),
            data: vec![0xde, 0xad],
        };
        assert_eq!(DevicePathNode::from(unknown).to_string(), "Path(240,1,dead)");
    }

    #[test]
    fn test_multi_instance_text() {
        let path: DevicePath = [
            DevicePathNode::from(hardware::Pci { function: 0, device: 1 }),
            DevicePathNode::EndInstance,
            hardware::Pci { function: 0, device: 2 }.into(),
            hardware::Controller { controller_number: 3 }.into(),
        ]
        .into_iter()
        .collect();
        assert_eq!(path.to_string(), "Pci(0x1,0x0),Pci(0x2,0x0)/Ctrl(0x3)");
    }
}
