// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

/// Mount point of the `efivarfs` filesystem.
pub const EFIVARFS_ROOT: &str = "/sys/firmware/efi/efivars";

/// Directory of the legacy sysfs variable interface.
pub const SYSFS_ROOT: &str = "/sys/firmware/efi/vars";

/// Kernel interface used to reach the variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// `efivarfs` filesystem.
    Efivarfs,
    /// Legacy sysfs interface.
    Sysfs,
}

/// Where [`VarStore::open`](super::VarStore::open) looks for variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Mount point of `efivarfs`.
    pub efivarfs_root: PathBuf,
    /// Directory of the legacy sysfs interface.
    pub sysfs_root: PathBuf,
    /// Interface to use. `None` picks `efivarfs` if it is mounted and the
    /// legacy interface otherwise.
    pub backend: Option<BackendKind>,
}

impl StoreConfig {
    /// Force the given interface.
    #[must_use]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Look for `efivarfs` under `root`.
    #[must_use]
    pub fn with_efivarfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.efivarfs_root = root.into();
        self
    }

    /// Look for the legacy interface under `root`.
    #[must_use]
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            efivarfs_root: PathBuf::from(EFIVARFS_ROOT),
            sysfs_root: PathBuf::from(SYSFS_ROOT),
            backend: None,
        }
    }
}
