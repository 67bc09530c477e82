// SPDX-License-Identifier: MIT OR Apache-2.0

//! Variable attributes and vendor namespaces.

use crate::{guid, Guid};
use bitflags::bitflags;

bitflags! {
    /// Flags describing the attributes of a variable.
    ///
    /// Bits not named here are kept as-is when converting with
    /// [`from_bits_retain`], so a value read from firmware can be written back
    /// without losing anything.
    ///
    /// [`from_bits_retain`]: Self::from_bits_retain
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct VariableAttributes: u32 {
        /// Variable is maintained across a power cycle.
        const NON_VOLATILE = 0x01;

        /// Variable is accessible while boot services are active.
        const BOOTSERVICE_ACCESS = 0x02;

        /// Variable is accessible while runtime services are active.
        const RUNTIME_ACCESS = 0x04;

        /// Variable is stored in the portion of NVR allocated for error
        /// records.
        const HARDWARE_ERROR_RECORD = 0x08;

        /// Deprecated count-based authenticated write access.
        const AUTHENTICATED_WRITE_ACCESS = 0x10;

        /// Variable payload begins with an `EFI_VARIABLE_AUTHENTICATION_2`
        /// structure.
        const TIME_BASED_AUTHENTICATED_WRITE_ACCESS = 0x20;

        /// Never returned on read. On write, the payload is appended to the
        /// current value instead of replacing it.
        const APPEND_WRITE = 0x40;
    }
}

impl VariableAttributes {
    /// Attributes used for boot manager variables such as `BootOrder` and
    /// `Boot####`.
    pub const BOOT_VARIABLE: Self = Self::NON_VOLATILE
        .union(Self::BOOTSERVICE_ACCESS)
        .union(Self::RUNTIME_ACCESS);
}

newtype_enum! {
    /// Variable vendor GUID. This serves as a namespace for variables to
    /// avoid naming conflicts between vendors.
    pub enum VariableVendor: Guid => {
        /// Used to access global variables, including the boot manager's.
        GLOBAL_VARIABLE = guid!("8be4df61-93ca-11d2-aa0d-00e098032b8c"),

        /// Used to access EFI signature database variables.
        IMAGE_SECURITY_DATABASE = guid!("d719b2cb-3d3a-4596-a3bc-dad00e67656f"),

        /// Placeholder vendor for block devices of unknown origin.
        BLKX_UNKNOWN = guid!("47c7b225-c42a-11d2-8e57-00a0c969723b"),

        /// Placeholder vendor for EFI system partitions of unknown origin.
        ESP_UNKNOWN = guid!("47c7b226-c42a-11d2-8e57-00a0c969723b"),

        /// Placeholder vendor for directories of unknown origin.
        DIR_UNKNOWN = guid!("47c7b227-c42a-11d2-8e57-00a0c969723b"),
    }
}

impl From<Guid> for VariableVendor {
    fn from(guid: Guid) -> Self {
        Self(guid)
    }
}

impl From<VariableVendor> for Guid {
    fn from(vendor: VariableVendor) -> Self {
        vendor.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bits_retained() {
        let attrs = VariableAttributes::from_bits_retain(0x8000_0007);
        assert!(attrs.contains(VariableAttributes::BOOT_VARIABLE));
        assert_eq!(attrs.bits(), 0x8000_0007);
    }

    #[test]
    fn test_global_variable_bytes() {
        // Mixed-endian layout: the first three fields are little-endian.
        assert_eq!(
            VariableVendor::GLOBAL_VARIABLE.0.to_bytes(),
            [
                0x61, 0xdf, 0xe4, 0x8b, 0xca, 0x93, 0xd2, 0x11, 0xaa, 0x0d, 0x00, 0xe0, 0x98,
                0x03, 0x2b, 0x8c
            ]
        );
    }
}
