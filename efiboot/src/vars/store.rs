// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    Backend, BackendKind, Efivarfs, FsTransport, StoreConfig, Sysfs, VarError, Variable,
    VariableAttributes, VariableKey, VariableVendor,
};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle to the platform's EFI variables.
///
/// Writes (edit, create, delete) to the same variable are serialized, so a
/// read-modify-write through [`VarStore::edit`] never loses a concurrent
/// update made through the same store. Operations on different variables
/// run in parallel.
#[derive(Debug)]
pub struct VarStore {
    backend: Box<dyn Backend>,
    locks: Mutex<HashMap<VariableKey, Arc<Mutex<()>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

impl VarStore {
    /// Store using `backend`.
    #[must_use]
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    /// Store using an already boxed backend.
    #[must_use]
    pub fn from_boxed(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Find the kernel interface described by `config` and open it.
    pub fn open(config: &StoreConfig) -> Result<Self, VarError> {
        let kind = match config.backend {
            Some(kind) => kind,
            None if has_entries(&config.efivarfs_root) => BackendKind::Efivarfs,
            None if config.sysfs_root.join("new_var").exists() => BackendKind::Sysfs,
            None => {
                return Err(VarError::Unsupported(format!(
                    "neither {} nor {} is available",
                    config.efivarfs_root.display(),
                    config.sysfs_root.display()
                )))
            }
        };
        let root = match kind {
            BackendKind::Efivarfs => &config.efivarfs_root,
            BackendKind::Sysfs => &config.sysfs_root,
        };
        if !root.is_dir() {
            return Err(VarError::Unsupported(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        info!("using {kind:?} variables at {}", root.display());
        let transport = FsTransport::new(root);
        Ok(match kind {
            BackendKind::Efivarfs => Self::new(Efivarfs::new(transport.clearing_immutable(true))),
            BackendKind::Sysfs => Self::new(Sysfs::new(transport)),
        })
    }

    /// Interface in use.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Locator of a variable in the backend's namespace.
    pub fn locator(&self, name: &str, vendor: VariableVendor) -> Result<String, VarError> {
        self.backend.locator(&VariableKey::new(name, vendor))
    }

    /// Run `f` while holding the lock of `key`.
    fn with_lock<R>(&self, key: &VariableKey, f: impl FnOnce() -> R) -> R {
        let entry = Arc::clone(lock(&self.locks).entry(key.clone()).or_default());
        let result = {
            let _guard = lock(&entry);
            f()
        };
        let mut locks = lock(&self.locks);
        // Only the map and this call hold the entry: nobody is waiting.
        if Arc::strong_count(&entry) == 2 {
            locks.remove(key);
        }
        result
    }

    /// Read a variable.
    pub fn read(&self, name: &str, vendor: VariableVendor) -> Result<Variable, VarError> {
        self.backend.read(&VariableKey::new(name, vendor))
    }

    /// True if the variable exists.
    pub fn exists(&self, name: &str, vendor: VariableVendor) -> Result<bool, VarError> {
        match self.read(name, vendor) {
            Ok(_) => Ok(true),
            Err(VarError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Replace the value of an existing variable.
    ///
    /// The current attributes are kept unless `attributes` overrides them.
    pub fn edit(
        &self,
        name: &str,
        vendor: VariableVendor,
        data: &[u8],
        attributes: Option<VariableAttributes>,
    ) -> Result<(), VarError> {
        let key = VariableKey::new(name, vendor);
        self.with_lock(&key, || {
            let current = self.backend.read(&key)?;
            let var = Variable {
                attributes: attributes.unwrap_or(current.attributes),
                data: data.to_vec(),
                key: current.key,
            };
            debug!("editing {} ({} bytes)", var.key, var.data.len());
            self.backend.edit(&var)
        })
    }

    /// Create a variable that does not exist yet.
    pub fn create(&self, var: &Variable) -> Result<(), VarError> {
        self.with_lock(&var.key, || {
            match self.backend.read(&var.key) {
                Ok(_) => return Err(VarError::AlreadyExists(var.key.clone())),
                Err(VarError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
            debug!("creating {} ({} bytes)", var.key, var.data.len());
            self.backend.create(var)
        })
    }

    /// Write a variable, creating it if needed.
    ///
    /// Unlike [`VarStore::edit`], the attributes of `var` are always used.
    pub fn set(&self, var: &Variable) -> Result<(), VarError> {
        self.with_lock(&var.key, || match self.backend.read(&var.key) {
            Ok(_) => self.backend.edit(var),
            Err(VarError::NotFound(_)) => self.backend.create(var),
            Err(err) => Err(err),
        })
    }

    /// Read, change and write back a variable while holding its lock.
    ///
    /// `f` gets the current variable, or `None` if it does not exist, and
    /// returns what the variable should become: `Some` to create or replace
    /// it, `None` to delete it. Nothing is written if the result equals the
    /// current state or if `f` fails. The key of the returned variable is
    /// ignored.
    ///
    /// `f` must not call back into the store for the same variable.
    pub fn update<E, F>(&self, name: &str, vendor: VariableVendor, f: F) -> Result<(), E>
    where
        E: From<VarError>,
        F: FnOnce(Option<Variable>) -> Result<Option<Variable>, E>,
    {
        let key = VariableKey::new(name, vendor);
        self.with_lock(&key, || {
            let current = match self.backend.read(&key) {
                Ok(var) => Some(var),
                Err(VarError::NotFound(_)) => None,
                Err(err) => return Err(err.into()),
            };
            let existed = current.is_some();
            let next = f(current.clone())?.map(|var| Variable {
                key: key.clone(),
                ..var
            });
            if next == current {
                return Ok(());
            }
            match next {
                Some(var) if existed => {
                    debug!("updating {key} ({} bytes)", var.data.len());
                    self.backend.edit(&var)?;
                }
                Some(var) => {
                    debug!("creating {key} ({} bytes)", var.data.len());
                    self.backend.create(&var)?;
                }
                None => {
                    debug!("deleting {key}");
                    self.backend.delete(&key)?;
                }
            }
            Ok(())
        })
    }

    /// Delete a variable.
    pub fn delete(&self, name: &str, vendor: VariableVendor) -> Result<(), VarError> {
        let key = VariableKey::new(name, vendor);
        self.with_lock(&key, || {
            debug!("deleting {key}");
            self.backend.delete(&key)
        })
    }

    /// Identities of all variables.
    pub fn keys(&self) -> Result<Vec<VariableKey>, VarError> {
        self.backend.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::{MemoryTransport, Transport, TransportError};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn store() -> VarStore {
        VarStore::new(Efivarfs::new(MemoryTransport::new()))
    }

    fn timeout(data: Vec<u8>) -> Variable {
        Variable::new(
            VariableKey::global("Timeout"),
            VariableAttributes::BOOT_VARIABLE,
            data,
        )
    }

    #[test]
    fn test_create_read_delete() {
        let store = store();
        let var = timeout(vec![5, 0]);
        assert!(!store.exists("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap());
        store.create(&var).unwrap();
        assert!(store.exists("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap());
        assert_eq!(
            store.create(&var),
            Err(VarError::AlreadyExists(var.key.clone()))
        );
        assert_eq!(store.read("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap(), var);
        assert_eq!(store.keys().unwrap(), [var.key.clone()]);
        store.delete("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap();
        assert_eq!(
            store.delete("Timeout", VariableVendor::GLOBAL_VARIABLE),
            Err(VarError::NotFound(var.key))
        );
    }

    #[test]
    fn test_edit_keeps_attributes() {
        let store = store();
        let mut var = timeout(vec![5, 0]);
        var.attributes |= VariableAttributes::from_bits_retain(0x100);
        store.create(&var).unwrap();

        store
            .edit("Timeout", VariableVendor::GLOBAL_VARIABLE, &[10, 0], None)
            .unwrap();
        let edited = store.read("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap();
        assert_eq!(edited.attributes, var.attributes);
        assert_eq!(edited.data, [10, 0]);

        store
            .edit(
                "Timeout",
                VariableVendor::GLOBAL_VARIABLE,
                &[1, 0],
                Some(VariableAttributes::NON_VOLATILE),
            )
            .unwrap();
        let edited = store.read("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap();
        assert_eq!(edited.attributes, VariableAttributes::NON_VOLATILE);
    }

    #[test]
    fn test_edit_missing() {
        let store = store();
        assert_eq!(
            store.edit("Timeout", VariableVendor::GLOBAL_VARIABLE, &[1], None),
            Err(VarError::NotFound(VariableKey::global("Timeout")))
        );
    }

    #[test]
    fn test_set_upserts() {
        let store = store();
        store.set(&timeout(vec![1, 0])).unwrap();
        store.set(&timeout(vec![2, 0])).unwrap();
        assert_eq!(
            store.read("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap().data,
            [2, 0]
        );
    }

    #[test]
    fn test_update_lifecycle() {
        let store = store();
        let global = VariableVendor::GLOBAL_VARIABLE;

        store
            .update::<VarError, _>("Timeout", global, |current| {
                assert!(current.is_none());
                Ok(Some(timeout(vec![3, 0])))
            })
            .unwrap();
        assert_eq!(store.read("Timeout", global).unwrap().data, [3, 0]);

        store
            .update::<VarError, _>("Timeout", global, |current| {
                let mut var = current.unwrap();
                var.data[0] += 1;
                Ok(Some(var))
            })
            .unwrap();
        assert_eq!(store.read("Timeout", global).unwrap().data, [4, 0]);

        store
            .update::<VarError, _>("Timeout", global, |_| Ok(None))
            .unwrap();
        assert!(!store.exists("Timeout", global).unwrap());

        // Deleting what is not there writes nothing.
        store
            .update::<VarError, _>("Timeout", global, |_| Ok(None))
            .unwrap();
        assert!(lock(&store.locks).is_empty());
    }

    #[test]
    fn test_update_failure_writes_nothing() {
        let store = store();
        store.create(&timeout(vec![1, 0])).unwrap();
        let err = store.update("Timeout", VariableVendor::GLOBAL_VARIABLE, |_| {
            Err(VarError::InvalidName("rejected".to_owned()))
        });
        assert_eq!(err, Err(VarError::InvalidName("rejected".to_owned())));
        assert_eq!(
            store.read("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap().data,
            [1, 0]
        );
    }

    #[test]
    fn test_locks_released() {
        let store = store();
        store.set(&timeout(vec![1, 0])).unwrap();
        store.delete("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap();
        assert!(lock(&store.locks).is_empty());
    }

    #[test]
    fn test_open_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default()
            .with_efivarfs_root(dir.path().join("efivars"))
            .with_sysfs_root(dir.path().join("vars"));
        assert!(matches!(
            VarStore::open(&config),
            Err(VarError::Unsupported(_))
        ));

        // An empty efivarfs mount point means the filesystem is not mounted.
        std::fs::create_dir(dir.path().join("efivars")).unwrap();
        assert!(matches!(
            VarStore::open(&config),
            Err(VarError::Unsupported(_))
        ));
    }

    #[test]
    fn test_open_detects_backend() {
        let dir = tempfile::tempdir().unwrap();
        let efivars = dir.path().join("efivars");
        let vars = dir.path().join("vars");
        std::fs::create_dir(&efivars).unwrap();
        std::fs::create_dir(&vars).unwrap();
        std::fs::write(vars.join("new_var"), b"").unwrap();
        let config = StoreConfig::default()
            .with_efivarfs_root(&efivars)
            .with_sysfs_root(&vars);

        let store = VarStore::open(&config).unwrap();
        assert_eq!(store.backend_kind(), BackendKind::Sysfs);

        std::fs::write(
            efivars.join("Timeout-8be4df61-93ca-11d2-aa0d-00e098032b8c"),
            [7u8, 0, 0, 0, 5, 0],
        )
        .unwrap();
        let store = VarStore::open(&config).unwrap();
        assert_eq!(store.backend_kind(), BackendKind::Efivarfs);
        assert_eq!(
            store.read("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap().data,
            [5, 0]
        );

        let forced = VarStore::open(&config.clone().with_backend(BackendKind::Sysfs)).unwrap();
        assert_eq!(forced.backend_kind(), BackendKind::Sysfs);
    }

    /// Transport that notices overlapping writes to the same locator.
    #[derive(Debug, Default)]
    struct OverlapDetector {
        inner: MemoryTransport,
        writing: AtomicBool,
        overlapped: AtomicBool,
        writes: AtomicUsize,
    }

    impl Transport for OverlapDetector {
        fn read_raw(&self, locator: &str) -> Result<Vec<u8>, TransportError> {
            self.inner.read_raw(locator)
        }

        fn write_raw(
            &self,
            locator: &str,
            bytes: &[u8],
            create_if_absent: bool,
        ) -> Result<(), TransportError> {
            if self.writing.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(2));
            let result = self.inner.write_raw(locator, bytes, create_if_absent);
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.writing.store(false, Ordering::SeqCst);
            result
        }

        fn delete_raw(&self, locator: &str) -> Result<(), TransportError> {
            self.inner.delete_raw(locator)
        }

        fn list(&self) -> Result<Vec<String>, TransportError> {
            self.inner.list()
        }
    }

    #[test]
    fn test_concurrent_edits_serialized() {
        let transport = Arc::new(OverlapDetector::default());
        let store = VarStore::new(Efivarfs::new(Arc::clone(&transport)));
        store.create(&timeout(vec![0, 0])).unwrap();

        thread::scope(|s| {
            for i in 0..8u8 {
                let store = &store;
                s.spawn(move || {
                    store
                        .edit("Timeout", VariableVendor::GLOBAL_VARIABLE, &[i, 0], None)
                        .unwrap();
                });
            }
        });

        assert!(!transport.overlapped.load(Ordering::SeqCst));
        assert_eq!(transport.writes.load(Ordering::SeqCst), 9);
        let last = store.read("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap();
        assert!(last.data[0] < 8);
        assert_eq!(last.attributes, VariableAttributes::BOOT_VARIABLE);
    }

    #[test]
    fn test_concurrent_updates_keep_every_change() {
        let transport = Arc::new(OverlapDetector::default());
        let store = VarStore::new(Efivarfs::new(Arc::clone(&transport)));

        thread::scope(|s| {
            for _ in 0..8 {
                let store = &store;
                s.spawn(move || {
                    store
                        .update::<VarError, _>("Timeout", VariableVendor::GLOBAL_VARIABLE, |cur| {
                            let mut var = cur.unwrap_or_else(|| timeout(vec![0, 0]));
                            var.data[0] += 1;
                            Ok(Some(var))
                        })
                        .unwrap();
                });
            }
        });

        assert!(!transport.overlapped.load(Ordering::SeqCst));
        let last = store.read("Timeout", VariableVendor::GLOBAL_VARIABLE).unwrap();
        assert_eq!(last.data, [8, 0]);
    }
}
