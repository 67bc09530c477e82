// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-side access to EFI boot configuration.
//!
//! # Crate organisation
//!
//! The crate is split along the path that boot configuration data takes
//! from the platform's variable store to something a program can reason
//! about:
//!
//! - [`vars`] reads, edits, creates and deletes EFI variables through a
//!   [`VarStore`]. The store talks to one [`Backend`] chosen at start-up
//!   (the `efivarfs` filesystem or the legacy sysfs interface), which in
//!   turn performs raw reads and writes through a [`Transport`].
//! - [`load_option`] splits the value of a `Boot####` variable into its
//!   attributes, description and device paths, and builds such values.
//! - [`device_path`] decodes and encodes device path nodes and chains
//!   byte for byte, and renders them as text.
//! - [`data_types`] holds the GUID helpers and the UCS-2 string codec
//!   shared by everything above.
//! - [`boot`] ties the pieces together for the boot manager variables
//!   (`BootOrder`, `BootNext`, `Boot####`).
//!
//! All codecs are pure functions over byte buffers. Only the variable store
//! performs I/O.
//!
//! # Logging
//!
//! Diagnostics go through the [`log`] facade. The crate never installs a
//! logger; binaries choose their own.
//!
//! [`Backend`]: vars::Backend
//! [`Transport`]: vars::Transport
//! [`VarStore`]: vars::VarStore

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(
    clippy::all,
    clippy::must_use_candidate,
    clippy::use_self,
    missing_debug_implementations
)]
#![warn(missing_docs, unused)]

pub mod boot;
pub mod data_types;
pub mod device_path;
pub mod load_option;
pub mod vars;

mod error;

pub use self::data_types::{guid, Guid};
pub use self::error::{Error, Result};
pub use efiboot_raw as raw;
