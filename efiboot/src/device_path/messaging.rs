// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging device path nodes.

use super::reader::Reader;
use super::NodeData;

/// ATAPI device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Atapi {
    /// 0 for the primary channel, 1 for the secondary.
    pub primary_secondary: u8,
    /// 0 for the master drive, 1 for the slave.
    pub slave_master: u8,
    /// Logical unit number.
    pub logical_unit_number: u16,
}

impl NodeData for Atapi {
    const MIN_DATA_SIZE: usize = 4;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            primary_secondary: r.u8()?,
            slave_master: r.u8()?,
            logical_unit_number: r.u16()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[self.primary_secondary, self.slave_master]);
        out.extend_from_slice(&self.logical_unit_number.to_le_bytes());
    }
}

/// SCSI target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Scsi {
    /// Target ID on the bus.
    pub target_id: u16,
    /// Logical unit number.
    pub logical_unit_number: u16,
}

impl NodeData for Scsi {
    const MIN_DATA_SIZE: usize = 4;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            target_id: r.u16()?,
            logical_unit_number: r.u16()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.target_id.to_le_bytes());
        out.extend_from_slice(&self.logical_unit_number.to_le_bytes());
    }
}

/// Fibre Channel port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FibreChannel {
    /// Reserved.
    pub reserved: u32,
    /// World Wide Name.
    pub world_wide_name: u64,
    /// Logical unit number.
    pub logical_unit_number: u64,
}

impl NodeData for FibreChannel {
    const MIN_DATA_SIZE: usize = 20;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            reserved: r.u32()?,
            world_wide_name: r.u64()?,
            logical_unit_number: r.u64()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.reserved.to_le_bytes());
        out.extend_from_slice(&self.world_wide_name.to_le_bytes());
        out.extend_from_slice(&self.logical_unit_number.to_le_bytes());
    }
}

/// IEEE 1394 device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ieee1394 {
    /// Reserved.
    pub reserved: u32,
    /// 1394 global unique ID.
    pub guid: u64,
}

impl NodeData for Ieee1394 {
    const MIN_DATA_SIZE: usize = 12;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            reserved: r.u32()?,
            guid: r.u64()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.reserved.to_le_bytes());
        out.extend_from_slice(&self.guid.to_le_bytes());
    }
}

/// USB port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Usb {
    /// Port number on the parent hub.
    pub parent_port_number: u8,
    /// USB interface number.
    pub interface: u8,
}

impl NodeData for Usb {
    const MIN_DATA_SIZE: usize = 2;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            parent_port_number: r.u8()?,
            interface: r.u8()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[self.parent_port_number, self.interface]);
    }
}

/// I2O random block storage device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct I2o {
    /// Target ID.
    pub target_id: u32,
}

impl NodeData for I2o {
    const MIN_DATA_SIZE: usize = 4;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            target_id: r.u32()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.target_id.to_le_bytes());
    }
}

/// InfiniBand device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Infiniband {
    /// Reserved.
    pub reserved: u32,
    /// 64-bit node GUID of the IOU.
    pub node_guid: u64,
    /// 64-bit GUID of the IOC.
    pub ioc_guid: u64,
    /// Device ID.
    pub device_id: u64,
}

impl NodeData for Infiniband {
    const MIN_DATA_SIZE: usize = 28;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            reserved: r.u32()?,
            node_guid: r.u64()?,
            ioc_guid: r.u64()?,
            device_id: r.u64()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.reserved.to_le_bytes());
        out.extend_from_slice(&self.node_guid.to_le_bytes());
        out.extend_from_slice(&self.ioc_guid.to_le_bytes());
        out.extend_from_slice(&self.device_id.to_le_bytes());
    }
}

/// Network interface identified by its hardware address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MacAddress {
    /// Hardware address, zero-padded to 32 bytes.
    pub mac_address: [u8; 32],
    /// Network interface type as defined by RFC 3232.
    pub interface_type: u8,
}

impl MacAddress {
    /// Interface type of Ethernet adapters.
    pub const ETHERNET: u8 = 1;

    /// Build a node from a hardware address, zero-padding it to 32 bytes.
    ///
    /// Returns `None` if the address is longer than 32 bytes.
    #[must_use]
    pub fn new(address: &[u8], interface_type: u8) -> Option<Self> {
        let mut mac_address = [0; 32];
        mac_address.get_mut(..address.len())?.copy_from_slice(address);
        Some(Self {
            mac_address,
            interface_type,
        })
    }

    /// The meaningful part of the address: six bytes for Ethernet, all 32
    /// otherwise.
    #[must_use]
    pub fn address(&self) -> &[u8] {
        match self.interface_type {
            0 | Self::ETHERNET => &self.mac_address[..6],
            _ => &self.mac_address,
        }
    }
}

impl NodeData for MacAddress {
    const MIN_DATA_SIZE: usize = 33;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            mac_address: r.array()?,
            interface_type: r.u8()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.mac_address);
        out.push(self.interface_type);
    }
}

/// Gateway and subnet fields present in newer IPv4 nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ipv4Gateway {
    /// Gateway address.
    pub gateway_ip_address: [u8; 4],
    /// Subnet mask.
    pub subnet_mask: [u8; 4],
}

/// IPv4 connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ipv4 {
    /// Local address.
    pub local_ip_address: [u8; 4],
    /// Remote address.
    pub remote_ip_address: [u8; 4],
    /// Local port.
    pub local_port: u16,
    /// Remote port.
    pub remote_port: u16,
    /// IP protocol number, e.g. 6 for TCP.
    pub protocol: u16,
    /// Non-zero if the local address is static rather than from DHCP.
    pub static_ip_address: u8,
    /// Trailing gateway and subnet fields, if the node has them.
    pub gateway: Option<Ipv4Gateway>,
}

impl Ipv4 {
    const GATEWAY_SIZE: usize = 8;
}

impl NodeData for Ipv4 {
    const MIN_DATA_SIZE: usize = 15;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let mut node = Self {
            local_ip_address: r.array()?,
            remote_ip_address: r.array()?,
            local_port: r.u16()?,
            remote_port: r.u16()?,
            protocol: r.u16()?,
            static_ip_address: r.u8()?,
            gateway: None,
        };
        if r.remaining() >= Self::GATEWAY_SIZE {
            node.gateway = Some(Ipv4Gateway {
                gateway_ip_address: r.array()?,
                subnet_mask: r.array()?,
            });
        }
        Some(node)
    }

    fn data_len(&self) -> usize {
        match self.gateway {
            Some(_) => Self::MIN_DATA_SIZE + Self::GATEWAY_SIZE,
            None => Self::MIN_DATA_SIZE,
        }
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.local_ip_address);
        out.extend_from_slice(&self.remote_ip_address);
        out.extend_from_slice(&self.local_port.to_le_bytes());
        out.extend_from_slice(&self.remote_port.to_le_bytes());
        out.extend_from_slice(&self.protocol.to_le_bytes());
        out.push(self.static_ip_address);
        if let Some(gateway) = &self.gateway {
            out.extend_from_slice(&gateway.gateway_ip_address);
            out.extend_from_slice(&gateway.subnet_mask);
        }
    }
}

/// Prefix length and gateway fields present in newer IPv6 nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ipv6Routing {
    /// Subnet prefix length.
    pub prefix_length: u8,
    /// Gateway address.
    pub gateway_ip_address: [u8; 16],
}

/// IPv6 connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ipv6 {
    /// Local address.
    pub local_ip_address: [u8; 16],
    /// Remote address.
    pub remote_ip_address: [u8; 16],
    /// Local port.
    pub local_port: u16,
    /// Remote port.
    pub remote_port: u16,
    /// IP protocol number.
    pub protocol: u16,
    /// 0 for a static address, 1 for stateless and 2 for stateful
    /// auto-configuration.
    pub ip_address_origin: u8,
    /// Trailing prefix and gateway fields, if the node has them.
    pub routing: Option<Ipv6Routing>,
}

impl Ipv6 {
    const ROUTING_SIZE: usize = 17;
}

impl NodeData for Ipv6 {
    const MIN_DATA_SIZE: usize = 39;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let mut node = Self {
            local_ip_address: r.array()?,
            remote_ip_address: r.array()?,
            local_port: r.u16()?,
            remote_port: r.u16()?,
            protocol: r.u16()?,
            ip_address_origin: r.u8()?,
            routing: None,
        };
        if r.remaining() >= Self::ROUTING_SIZE {
            node.routing = Some(Ipv6Routing {
                prefix_length: r.u8()?,
                gateway_ip_address: r.array()?,
            });
        }
        Some(node)
    }

    fn data_len(&self) -> usize {
        match self.routing {
            Some(_) => Self::MIN_DATA_SIZE + Self::ROUTING_SIZE,
            None => Self::MIN_DATA_SIZE,
        }
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.local_ip_address);
        out.extend_from_slice(&self.remote_ip_address);
        out.extend_from_slice(&self.local_port.to_le_bytes());
        out.extend_from_slice(&self.remote_port.to_le_bytes());
        out.extend_from_slice(&self.protocol.to_le_bytes());
        out.push(self.ip_address_origin);
        if let Some(routing) = &self.routing {
            out.push(routing.prefix_length);
            out.extend_from_slice(&routing.gateway_ip_address);
        }
    }
}

/// Serial port settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Uart {
    /// Reserved.
    pub reserved: u32,
    /// Baud rate, or 0 for the device default.
    pub baud_rate: u64,
    /// Data bits per character, or 0 for the device default.
    pub data_bits: u8,
    /// Parity: 0 default, 1 none, 2 even, 3 odd, 4 mark, 5 space.
    pub parity: u8,
    /// Stop bits: 0 default, 1 one, 2 one and a half, 3 two.
    pub stop_bits: u8,
}

impl NodeData for Uart {
    const MIN_DATA_SIZE: usize = 15;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            reserved: r.u32()?,
            baud_rate: r.u64()?,
            data_bits: r.u8()?,
            parity: r.u8()?,
            stop_bits: r.u8()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.reserved.to_le_bytes());
        out.extend_from_slice(&self.baud_rate.to_le_bytes());
        out.extend_from_slice(&[self.data_bits, self.parity, self.stop_bits]);
    }
}

/// USB device matched by class rather than by port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UsbClass {
    /// Vendor ID, or 0xFFFF to match any.
    pub vendor_id: u16,
    /// Product ID, or 0xFFFF to match any.
    pub product_id: u16,
    /// Device class, or 0xFF to match any.
    pub device_class: u8,
    /// Device subclass, or 0xFF to match any.
    pub device_subclass: u8,
    /// Device protocol, or 0xFF to match any.
    pub device_protocol: u8,
}

impl NodeData for UsbClass {
    const MIN_DATA_SIZE: usize = 7;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            vendor_id: r.u16()?,
            product_id: r.u16()?,
            device_class: r.u8()?,
            device_subclass: r.u8()?,
            device_protocol: r.u8()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.vendor_id.to_le_bytes());
        out.extend_from_slice(&self.product_id.to_le_bytes());
        out.extend_from_slice(&[
            self.device_class,
            self.device_subclass,
            self.device_protocol,
        ]);
    }
}
