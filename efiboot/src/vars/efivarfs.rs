// SPDX-License-Identifier: MIT OR Apache-2.0

use super::locator::{check_name, mangle, unmangle};
use super::{Backend, BackendKind, Transport, TransportError, VarError, Variable, VariableAttributes, VariableKey};
use log::{debug, warn};

const ATTRIBUTES_SIZE: usize = 4;

/// Backend for the `efivarfs` filesystem.
///
/// Every variable is a file named `Name-guid` whose content is the
/// little-endian attribute word followed by the value.
#[derive(Debug)]
pub struct Efivarfs<T> {
    transport: T,
}

impl<T: Transport> Efivarfs<T> {
    /// Backend over `transport`.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn encode(var: &Variable) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ATTRIBUTES_SIZE + var.data.len());
        bytes.extend_from_slice(&var.attributes.bits().to_le_bytes());
        bytes.extend_from_slice(&var.data);
        bytes
    }

    fn write(&self, var: &Variable, create: bool) -> Result<(), VarError> {
        let locator = self.locator(&var.key)?;
        self.transport
            .write_raw(&locator, &Self::encode(var), create)
            .map_err(|err| VarError::from_transport(&var.key, err))
    }
}

impl<T: Transport> Backend for Efivarfs<T> {
    fn kind(&self) -> BackendKind {
        BackendKind::Efivarfs
    }

    fn locator(&self, key: &VariableKey) -> Result<String, VarError> {
        check_name(&key.name)?;
        Ok(mangle(&key.name, key.vendor))
    }

    fn read(&self, key: &VariableKey) -> Result<Variable, VarError> {
        let locator = self.locator(key)?;
        let bytes = self
            .transport
            .read_raw(&locator)
            .map_err(|err| VarError::from_transport(key, err))?;
        let Some((attributes, data)) = bytes.split_first_chunk::<ATTRIBUTES_SIZE>() else {
            warn!("{locator} holds {} bytes, too few for the attributes", bytes.len());
            return Err(VarError::Backend(TransportError::other(
                &locator,
                "file shorter than the attribute header",
            )));
        };
        Ok(Variable {
            key: key.clone(),
            attributes: VariableAttributes::from_bits_retain(u32::from_le_bytes(*attributes)),
            data: data.to_vec(),
        })
    }

    fn edit(&self, var: &Variable) -> Result<(), VarError> {
        self.write(var, false)
    }

    fn create(&self, var: &Variable) -> Result<(), VarError> {
        self.write(var, true)
    }

    fn delete(&self, key: &VariableKey) -> Result<(), VarError> {
        let locator = self.locator(key)?;
        self.transport
            .delete_raw(&locator)
            .map_err(|err| VarError::from_transport(key, err))
    }

    fn keys(&self) -> Result<Vec<VariableKey>, VarError> {
        let names = self.transport.list().map_err(VarError::Backend)?;
        Ok(names
            .iter()
            .filter_map(|name| {
                let key = unmangle(name);
                if key.is_none() {
                    debug!("skipping {name}");
                }
                key
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::{MemoryTransport, VariableVendor};
    use std::sync::Arc;

    const LOCATOR: &str = "Timeout-8be4df61-93ca-11d2-aa0d-00e098032b8c";

    #[test]
    fn test_file_format() {
        let transport = Arc::new(MemoryTransport::new());
        let backend = Efivarfs::new(Arc::clone(&transport));
        let var = Variable::new(
            VariableKey::global("Timeout"),
            VariableAttributes::BOOT_VARIABLE,
            vec![5, 0],
        );
        backend.create(&var).unwrap();
        assert_eq!(transport.get(LOCATOR).unwrap(), [7, 0, 0, 0, 5, 0]);
        assert_eq!(backend.read(&var.key).unwrap(), var);
    }

    #[test]
    fn test_unknown_attribute_bits_kept() {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert(LOCATOR, vec![0x07, 0x00, 0x00, 0x80, 1]);
        let backend = Efivarfs::new(Arc::clone(&transport));
        let var = backend.read(&VariableKey::global("Timeout")).unwrap();
        assert_eq!(var.attributes.bits(), 0x8000_0007);
        backend.edit(&var).unwrap();
        assert_eq!(transport.get(LOCATOR).unwrap(), [0x07, 0x00, 0x00, 0x80, 1]);
    }

    #[test]
    fn test_short_file() {
        let transport = MemoryTransport::new();
        transport.insert(LOCATOR, vec![7, 0]);
        let backend = Efivarfs::new(transport);
        assert!(matches!(
            backend.read(&VariableKey::global("Timeout")),
            Err(VarError::Backend(_))
        ));
    }

    #[test]
    fn test_errors_by_class() {
        let backend = Efivarfs::new(MemoryTransport::new());
        let key = VariableKey::new("Missing", VariableVendor::DIR_UNKNOWN);
        assert_eq!(backend.read(&key), Err(VarError::NotFound(key.clone())));
        assert_eq!(backend.delete(&key), Err(VarError::NotFound(key.clone())));
        let var = Variable::new(key.clone(), VariableAttributes::empty(), vec![]);
        assert_eq!(backend.edit(&var), Err(VarError::NotFound(key)));
        assert_eq!(
            backend.read(&VariableKey::global("a/b")),
            Err(VarError::InvalidName("a/b".to_owned()))
        );
    }

    #[test]
    fn test_keys() {
        let transport = MemoryTransport::new();
        transport.insert(LOCATOR, vec![7, 0, 0, 0]);
        transport.insert("garbage", vec![]);
        let backend = Efivarfs::new(transport);
        assert_eq!(backend.keys().unwrap(), [VariableKey::global("Timeout")]);
    }
}
