// SPDX-License-Identifier: MIT OR Apache-2.0

//! C-style enums that must tolerate unknown values.
//!
//! Type codes read out of firmware data are open-ended: a newer firmware may
//! hand back a value that did not exist when this crate was written, and that
//! value still has to survive a read-modify-write cycle. Such enums are
//! modeled as transparent newtypes with a set of associated constants rather
//! than as Rust enums.

/// Interface a C-style enum as an integer newtype.
///
/// The generated type is `Copy`, comparable and hashable, and its `Debug`
/// output names the matching constant or falls back to the raw value.
///
/// ```
/// # use efiboot_raw::newtype_enum;
/// newtype_enum! {
///     /// Answer to a yes/no question.
///     pub enum Answer: u8 => {
///         /// No.
///         NO = 0,
///         /// Yes.
///         YES = 1,
///     }
/// }
///
/// assert_eq!(format!("{:?}", Answer::YES), "YES");
/// assert_eq!(format!("{:?}", Answer(7)), "Answer(7)");
/// ```
#[macro_export]
macro_rules! newtype_enum {
    (
        $(#[$type_attrs:meta])*
        $visibility:vis enum $type:ident : $base:ty => $(#[$impl_attrs:meta])* {
            $(
                $(#[$variant_attrs:meta])*
                $variant:ident = $value:expr,
            )*
        }
    ) => {
        $(#[$type_attrs])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Eq, PartialEq, Hash)]
        $visibility struct $type(pub $base);

        $(#[$impl_attrs])*
        #[allow(unused)]
        impl $type {
            $(
                $(#[$variant_attrs])*
                pub const $variant: $type = $type($value);
            )*
        }

        impl core::fmt::Debug for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match *self {
                    $(
                        $type::$variant => write!(f, stringify!($variant)),
                    )*
                    $type(unknown) => {
                        write!(f, "{}({:?})", stringify!($type), unknown)
                    }
                }
            }
        }
    }
}
