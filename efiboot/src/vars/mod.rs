// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access to EFI variables from a running operating system.
//!
//! Variables are reached through three layers:
//!
//! - A [`Transport`] reads and writes raw bytes at a locator string. It
//!   knows nothing about variables: [`FsTransport`] maps locators to files
//!   under a directory, [`MemoryTransport`] keeps them in a map.
//! - A [`Backend`] turns variable operations into transport calls using the
//!   record format and locator scheme of one kernel interface: [`Efivarfs`]
//!   for `/sys/firmware/efi/efivars`, [`Sysfs`] for the legacy
//!   `/sys/firmware/efi/vars`.
//! - A [`VarStore`] owns the backend picked at start-up and serializes
//!   writes to each variable.
//!
//! ```no_run
//! use efiboot::vars::{StoreConfig, VarStore, VariableVendor};
//!
//! let store = VarStore::open(&StoreConfig::default())?;
//! let timeout = store.read("Timeout", VariableVendor::GLOBAL_VARIABLE)?;
//! println!("{:?}", timeout.data);
//! # Ok::<(), efiboot::vars::VarError>(())
//! ```

mod config;
mod efivarfs;
mod immutable;
mod locator;
mod store;
mod sysfs;
mod transport;

pub use config::{BackendKind, StoreConfig, EFIVARFS_ROOT, SYSFS_ROOT};
pub use efiboot_raw::variable::{VariableAttributes, VariableVendor};
pub use efivarfs::Efivarfs;
pub use locator::{mangle, unmangle};
pub use store::VarStore;
pub use sysfs::Sysfs;
pub use transport::{FsTransport, MemoryTransport, Transport, TransportError, TransportErrorKind};

use core::fmt::{self, Debug, Display, Formatter};

/// Identity of a variable: its name within a vendor namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableKey {
    /// Variable name, e.g. `BootOrder`.
    pub name: String,
    /// Vendor namespace.
    pub vendor: VariableVendor,
}

impl VariableKey {
    /// Key for `name` under `vendor`.
    #[must_use]
    pub fn new(name: impl Into<String>, vendor: impl Into<VariableVendor>) -> Self {
        Self {
            name: name.into(),
            vendor: vendor.into(),
        }
    }

    /// Key for `name` in the global namespace.
    #[must_use]
    pub fn global(name: impl Into<String>) -> Self {
        Self::new(name, VariableVendor::GLOBAL_VARIABLE)
    }
}

impl Display for VariableKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.vendor.0)
    }
}

/// A variable together with its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    /// Identity.
    pub key: VariableKey,
    /// Attribute bits. Unknown bits are kept.
    pub attributes: VariableAttributes,
    /// Value.
    pub data: Vec<u8>,
}

impl Variable {
    /// Variable with the given identity, attributes and value.
    #[must_use]
    pub fn new(key: VariableKey, attributes: VariableAttributes, data: Vec<u8>) -> Self {
        Self {
            key,
            attributes,
            data,
        }
    }
}

/// Errors from the variable store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarError {
    /// The variable does not exist.
    NotFound(VariableKey),
    /// The variable already exists.
    AlreadyExists(VariableKey),
    /// The caller may not perform this operation on the variable.
    PermissionDenied(VariableKey),
    /// The platform has no room for the variable, or the value exceeds what
    /// the interface can carry.
    OutOfResources(VariableKey),
    /// The name cannot be used with the selected interface.
    InvalidName(String),
    /// Any other failure of the underlying interface.
    Backend(TransportError),
    /// No usable variable interface was found.
    Unsupported(String),
}

impl VarError {
    /// Map a transport failure on `key` to the matching error class.
    pub(crate) fn from_transport(key: &VariableKey, err: TransportError) -> Self {
        match err.kind {
            TransportErrorKind::NotFound => Self::NotFound(key.clone()),
            TransportErrorKind::AlreadyExists => Self::AlreadyExists(key.clone()),
            TransportErrorKind::PermissionDenied => Self::PermissionDenied(key.clone()),
            TransportErrorKind::OutOfResources => Self::OutOfResources(key.clone()),
            TransportErrorKind::Other => Self::Backend(err),
        }
    }
}

impl Display for VarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "variable {key} not found"),
            Self::AlreadyExists(key) => write!(f, "variable {key} already exists"),
            Self::PermissionDenied(key) => write!(f, "permission denied for variable {key}"),
            Self::OutOfResources(key) => write!(f, "out of resources writing variable {key}"),
            Self::InvalidName(name) => write!(f, "invalid variable name {name:?}"),
            Self::Backend(err) => Display::fmt(err, f),
            Self::Unsupported(reason) => write!(f, "EFI variables unavailable: {reason}"),
        }
    }
}

impl std::error::Error for VarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// One kernel interface for EFI variables.
///
/// Implementations do no locking of their own; [`VarStore`] serializes
/// writes to each variable.
pub trait Backend: Send + Sync + Debug {
    /// Which interface this is.
    fn kind(&self) -> BackendKind;

    /// Locator under which the transport stores `key`.
    fn locator(&self, key: &VariableKey) -> Result<String, VarError>;

    /// Read a variable.
    fn read(&self, key: &VariableKey) -> Result<Variable, VarError>;

    /// Replace the value of an existing variable.
    fn edit(&self, var: &Variable) -> Result<(), VarError>;

    /// Create a new variable.
    fn create(&self, var: &Variable) -> Result<(), VarError>;

    /// Delete a variable.
    fn delete(&self, key: &VariableKey) -> Result<(), VarError>;

    /// Identities of all variables.
    fn keys(&self) -> Result<Vec<VariableKey>, VarError>;
}
