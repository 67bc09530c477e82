// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attributes of an `EFI_LOAD_OPTION`.

use bitflags::bitflags;

bitflags! {
    /// Attributes of a load option (the value of a `Boot####`,
    /// `Driver####` or `SysPrep####` variable).
    ///
    /// Unknown bits are retained by [`from_bits_retain`].
    ///
    /// [`from_bits_retain`]: Self::from_bits_retain
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LoadOptionAttributes: u32 {
        /// The boot manager will attempt to boot this option.
        const ACTIVE = 0x0000_0001;

        /// Driver options only: reconnect all drivers after loading.
        const FORCE_RECONNECT = 0x0000_0002;

        /// The option is not shown in menus presented to the user.
        const HIDDEN = 0x0000_0008;

        /// Mask of the category bits.
        const CATEGORY = 0x0000_1F00;

        /// Category value of an application shown in a menu rather than
        /// booted as part of the normal boot order.
        const CATEGORY_APP = 0x0000_0100;
    }
}

impl LoadOptionAttributes {
    /// Size of the encoded attributes in bytes.
    pub const SIZE: usize = 4;
}
