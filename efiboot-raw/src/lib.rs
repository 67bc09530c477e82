// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw types for EFI boot configuration data.
//!
//! This crate holds the pieces of the EFI boot configuration format that
//! are pure data: the device path node header and its type codes, the
//! attribute flags of variables and load options, and the vendor GUIDs that
//! scope well-known variables. It does no parsing beyond the fixed 4-byte
//! node header.
//!
//! The [`efiboot`] crate builds the node codecs, the load option codec and
//! the variable store on top of these types.
//!
//! [`efiboot`]: https://crates.io/crates/efiboot

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(
    clippy::all,
    clippy::must_use_candidate,
    clippy::use_self,
    missing_debug_implementations
)]
#![warn(missing_docs, unused)]

#[macro_use]
mod enums;

pub mod device_path;
pub mod load_option;
pub mod variable;

pub use uguid::{guid, Guid};
