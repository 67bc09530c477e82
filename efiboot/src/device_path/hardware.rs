// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hardware device path nodes.

use super::reader::Reader;
use super::NodeData;

/// PCI function on the bus selected by the preceding node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pci {
    /// PCI function number.
    pub function: u8,
    /// PCI device number.
    pub device: u8,
}

impl NodeData for Pci {
    const MIN_DATA_SIZE: usize = 2;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            function: r.u8()?,
            device: r.u8()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[self.function, self.device]);
    }
}

/// PC card socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pccard {
    /// Socket number.
    pub socket: u8,
}

impl NodeData for Pccard {
    const MIN_DATA_SIZE: usize = 1;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self { socket: r.u8()? })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.push(self.socket);
    }
}

/// Memory-mapped region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryMapped {
    /// EFI memory type of the region.
    pub memory_type: u32,
    /// First address of the region.
    pub start_address: u64,
    /// Last address of the region.
    pub end_address: u64,
}

impl NodeData for MemoryMapped {
    const MIN_DATA_SIZE: usize = 20;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            memory_type: r.u32()?,
            start_address: r.u64()?,
            end_address: r.u64()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.memory_type.to_le_bytes());
        out.extend_from_slice(&self.start_address.to_le_bytes());
        out.extend_from_slice(&self.end_address.to_le_bytes());
    }
}

/// Controller on a multi-controller device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Controller {
    /// Controller number.
    pub controller_number: u32,
}

impl NodeData for Controller {
    const MIN_DATA_SIZE: usize = 4;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self {
            controller_number: r.u32()?,
        })
    }

    fn data_len(&self) -> usize {
        Self::MIN_DATA_SIZE
    }

    fn write_data(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.controller_number.to_le_bytes());
    }
}
