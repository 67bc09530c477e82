// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw byte access underneath the variable backends.

use super::immutable::clear_immutable;
use core::fmt::{self, Debug, Display, Formatter};
use log::trace;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Class of a transport failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Nothing exists at the locator.
    NotFound,
    /// Something already exists at the locator.
    AlreadyExists,
    /// The caller lacks the privilege for the operation.
    PermissionDenied,
    /// The store is full or the value too large.
    OutOfResources,
    /// Anything else.
    Other,
}

/// Failure of a [`Transport`] operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError {
    /// Class of the failure.
    pub kind: TransportErrorKind,
    /// Locator the operation was applied to.
    pub locator: String,
    /// Details for humans.
    pub message: String,
}

impl TransportError {
    /// Error of the given class.
    #[must_use]
    pub fn new(kind: TransportErrorKind, locator: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            locator: locator.to_owned(),
            message: message.into(),
        }
    }

    /// Error of class [`TransportErrorKind::Other`].
    #[must_use]
    pub fn other(locator: &str, message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, locator, message)
    }

    fn from_io(locator: &str, err: &io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => TransportErrorKind::NotFound,
            io::ErrorKind::AlreadyExists => TransportErrorKind::AlreadyExists,
            io::ErrorKind::PermissionDenied => TransportErrorKind::PermissionDenied,
            io::ErrorKind::StorageFull | io::ErrorKind::OutOfMemory => {
                TransportErrorKind::OutOfResources
            }
            _ => TransportErrorKind::Other,
        };
        Self::new(kind, locator, err.to_string())
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.locator, self.message)
    }
}

impl std::error::Error for TransportError {}

/// Privileged raw access to the variable store.
///
/// A locator is a `/`-separated relative path chosen by the backend.
pub trait Transport: Send + Sync + Debug {
    /// Read the whole content at `locator`.
    fn read_raw(&self, locator: &str) -> Result<Vec<u8>, TransportError>;

    /// Write `bytes` to `locator` in a single operation.
    ///
    /// If `create_if_absent` is false the locator must already exist. A write
    /// that stores fewer bytes than given is an error.
    fn write_raw(&self, locator: &str, bytes: &[u8], create_if_absent: bool)
        -> Result<(), TransportError>;

    /// Remove `locator`.
    fn delete_raw(&self, locator: &str) -> Result<(), TransportError>;

    /// Names of the top-level entries.
    fn list(&self) -> Result<Vec<String>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn read_raw(&self, locator: &str) -> Result<Vec<u8>, TransportError> {
        (**self).read_raw(locator)
    }

    fn write_raw(
        &self,
        locator: &str,
        bytes: &[u8],
        create_if_absent: bool,
    ) -> Result<(), TransportError> {
        (**self).write_raw(locator, bytes, create_if_absent)
    }

    fn delete_raw(&self, locator: &str) -> Result<(), TransportError> {
        (**self).delete_raw(locator)
    }

    fn list(&self) -> Result<Vec<String>, TransportError> {
        (**self).list()
    }
}

/// Transport over the files below a directory.
///
/// Writes go out in one `write` call, which the kernel variable filesystems
/// treat as one update of the variable.
///
/// efivarfs marks most of its files immutable, so writes and deletes fail
/// with [`TransportErrorKind::PermissionDenied`] unless the flag is cleared
/// first. See [`FsTransport::clearing_immutable`].
#[derive(Clone, Debug)]
pub struct FsTransport {
    root: PathBuf,
    truncate: bool,
    clear_immutable: bool,
}

impl FsTransport {
    /// Transport rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            truncate: false,
            clear_immutable: false,
        }
    }

    /// Truncate files before writing them.
    ///
    /// Needed for ordinary directories, such as a saved copy of the
    /// variables. The kernel interfaces replace the value on every write and
    /// do not support truncation.
    #[must_use]
    pub fn truncating(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Clear the inode immutable flag of a file before writing or deleting
    /// it.
    ///
    /// Filesystems without inode flags are left alone. Only has an effect
    /// on Linux.
    #[must_use]
    pub fn clearing_immutable(mut self, clear: bool) -> Self {
        self.clear_immutable = clear;
        self
    }

    /// Directory this transport is rooted at.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, locator: &str) -> PathBuf {
        self.root.join(locator)
    }

    fn make_mutable(&self, locator: &str) -> Result<(), TransportError> {
        if !self.clear_immutable {
            return Ok(());
        }
        clear_immutable(&self.path(locator)).map_err(|err| TransportError::from_io(locator, &err))
    }
}

impl Transport for FsTransport {
    fn read_raw(&self, locator: &str) -> Result<Vec<u8>, TransportError> {
        trace!("reading {locator}");
        fs::read(self.path(locator)).map_err(|err| TransportError::from_io(locator, &err))
    }

    fn write_raw(
        &self,
        locator: &str,
        bytes: &[u8],
        create_if_absent: bool,
    ) -> Result<(), TransportError> {
        trace!("writing {} bytes to {locator}", bytes.len());
        self.make_mutable(locator)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(create_if_absent)
            .truncate(self.truncate)
            .open(self.path(locator))
            .map_err(|err| TransportError::from_io(locator, &err))?;
        let written = file
            .write(bytes)
            .map_err(|err| TransportError::from_io(locator, &err))?;
        if written != bytes.len() {
            return Err(TransportError::other(
                locator,
                format!("short write: {written} of {} bytes", bytes.len()),
            ));
        }
        Ok(())
    }

    fn delete_raw(&self, locator: &str) -> Result<(), TransportError> {
        trace!("deleting {locator}");
        self.make_mutable(locator)?;
        fs::remove_file(self.path(locator)).map_err(|err| TransportError::from_io(locator, &err))
    }

    fn list(&self) -> Result<Vec<String>, TransportError> {
        let root = self.root.display().to_string();
        let entries = fs::read_dir(&self.root).map_err(|err| TransportError::from_io(&root, &err))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| TransportError::from_io(&root, &err))?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Transport keeping everything in memory.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryTransport {
    /// Empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Store `bytes` at `locator`, replacing anything there.
    pub fn insert(&self, locator: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries().insert(locator.into(), bytes.into());
    }

    /// Content at `locator`, if any.
    #[must_use]
    pub fn get(&self, locator: &str) -> Option<Vec<u8>> {
        self.entries().get(locator).cloned()
    }

    /// Remove `locator`, returning its content.
    pub fn remove(&self, locator: &str) -> Option<Vec<u8>> {
        self.entries().remove(locator)
    }

    /// All locators, sorted.
    #[must_use]
    pub fn locators(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}

impl Transport for MemoryTransport {
    fn read_raw(&self, locator: &str) -> Result<Vec<u8>, TransportError> {
        self.get(locator).ok_or_else(|| {
            TransportError::new(TransportErrorKind::NotFound, locator, "no such entry")
        })
    }

    fn write_raw(
        &self,
        locator: &str,
        bytes: &[u8],
        create_if_absent: bool,
    ) -> Result<(), TransportError> {
        let mut entries = self.entries();
        match entries.get_mut(locator) {
            Some(value) => *value = bytes.to_vec(),
            None if create_if_absent => {
                entries.insert(locator.to_owned(), bytes.to_vec());
            }
            None => {
                return Err(TransportError::new(
                    TransportErrorKind::NotFound,
                    locator,
                    "no such entry",
                ))
            }
        }
        Ok(())
    }

    fn delete_raw(&self, locator: &str) -> Result<(), TransportError> {
        self.remove(locator).map(drop).ok_or_else(|| {
            TransportError::new(TransportErrorKind::NotFound, locator, "no such entry")
        })
    }

    fn list(&self) -> Result<Vec<String>, TransportError> {
        let mut names: Vec<String> = self
            .entries()
            .keys()
            .map(|locator| locator.split('/').next().unwrap_or(locator).to_owned())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}
