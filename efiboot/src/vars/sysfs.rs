// SPDX-License-Identifier: MIT OR Apache-2.0

//! Legacy sysfs variable interface.
//!
//! Each variable is a directory `Name-guid` whose `raw_var` attribute holds
//! the kernel's `struct efi_variable`:
//!
//! | field         | size                   |
//! |---------------|------------------------|
//! | name          | 1024 (512 UCS-2 units) |
//! | vendor GUID   | 16                     |
//! | data size     | `unsigned long`        |
//! | data          | 1024                   |
//! | status        | `unsigned long`        |
//! | attributes    | 4                      |
//!
//! Variables are created by writing a record to `new_var` and deleted by
//! writing one to `del_var`.

use super::locator::{check_name, mangle, unmangle};
use super::{Backend, BackendKind, Transport, TransportError, VarError, Variable, VariableAttributes, VariableKey};
use crate::data_types::{decode_wstring, encode_wstring, CHAR16_SIZE};
use log::{debug, warn};
use uguid::Guid;

const NAME_SIZE: usize = 1024;
const DATA_SIZE: usize = 1024;
const GUID_SIZE: usize = 16;

const RAW_VAR: &str = "raw_var";
const NEW_VAR: &str = "new_var";
const DEL_VAR: &str = "del_var";

/// Width of the kernel's `unsigned long`, which sizes two record fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecordLayout {
    Long32,
    Long64,
}

impl RecordLayout {
    const NATIVE: Self = if cfg!(target_pointer_width = "32") {
        Self::Long32
    } else {
        Self::Long64
    };

    const fn long_size(self) -> usize {
        match self {
            Self::Long32 => 4,
            Self::Long64 => 8,
        }
    }

    const fn record_size(self) -> usize {
        NAME_SIZE + GUID_SIZE + DATA_SIZE + 2 * self.long_size() + 4
    }

    fn for_record(len: usize) -> Option<Self> {
        [Self::Long64, Self::Long32]
            .into_iter()
            .find(|layout| layout.record_size() == len)
    }

    fn read_long(self, bytes: &[u8]) -> u64 {
        match self {
            Self::Long32 => u64::from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::Long64 => u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }

    fn write_long(self, out: &mut Vec<u8>, value: u64) {
        out.extend_from_slice(&value.to_le_bytes()[..self.long_size()]);
    }
}

/// Decoded `struct efi_variable`.
struct Record {
    name: String,
    vendor: Guid,
    attributes: VariableAttributes,
    status: u64,
    data: Vec<u8>,
}

impl Record {
    fn decode(locator: &str, bytes: &[u8]) -> Result<Self, VarError> {
        let layout = RecordLayout::for_record(bytes.len()).ok_or_else(|| {
            VarError::Backend(TransportError::other(
                locator,
                format!("unexpected record size {}", bytes.len()),
            ))
        })?;
        let long = layout.long_size();
        let (name, rest) = bytes.split_at(NAME_SIZE);
        let (guid, rest) = rest.split_at(GUID_SIZE);
        let (data_size, rest) = rest.split_at(long);
        let (data, rest) = rest.split_at(DATA_SIZE);
        let (status, attributes) = rest.split_at(long);

        let data_size = usize::try_from(layout.read_long(data_size)).unwrap_or(usize::MAX);
        let data = data.get(..data_size).ok_or_else(|| {
            VarError::Backend(TransportError::other(
                locator,
                format!("record claims {data_size} bytes of data"),
            ))
        })?;
        let mut guid_bytes = [0; GUID_SIZE];
        guid_bytes.copy_from_slice(guid);

        Ok(Self {
            name: decode_wstring(name, NAME_SIZE / CHAR16_SIZE),
            vendor: Guid::from_bytes(guid_bytes),
            attributes: VariableAttributes::from_bits_retain(u32::from_le_bytes([
                attributes[0],
                attributes[1],
                attributes[2],
                attributes[3],
            ])),
            status: layout.read_long(status),
            data: data.to_vec(),
        })
    }

    fn encode(var: &Variable, layout: RecordLayout) -> Result<Vec<u8>, VarError> {
        if var.data.len() > DATA_SIZE {
            return Err(VarError::OutOfResources(var.key.clone()));
        }
        let name = encode_wstring(&var.key.name, NAME_SIZE / CHAR16_SIZE).map_err(|err| {
            debug!("cannot encode {:?}: {err}", var.key.name);
            VarError::InvalidName(var.key.name.clone())
        })?;

        let mut out = Vec::with_capacity(layout.record_size());
        out.extend_from_slice(&name);
        out.resize(NAME_SIZE, 0);
        out.extend_from_slice(&var.key.vendor.0.to_bytes());
        layout.write_long(&mut out, var.data.len() as u64);
        out.extend_from_slice(&var.data);
        out.resize(NAME_SIZE + GUID_SIZE + layout.long_size() + DATA_SIZE, 0);
        layout.write_long(&mut out, 0);
        out.extend_from_slice(&var.attributes.bits().to_le_bytes());
        Ok(out)
    }
}

/// Backend for the legacy `/sys/firmware/efi/vars` interface.
#[derive(Debug)]
pub struct Sysfs<T> {
    transport: T,
}

impl<T: Transport> Sysfs<T> {
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

    fn read_record(&self, key: &VariableKey) -> Result<(String, Vec<u8>), VarError> {
        let locator = self.locator(key)?;
        let bytes = self
            .transport
            .read_raw(&locator)
            .map_err(|err| VarError::from_transport(key, err))?;
        Ok((locator, bytes))
    }

    fn write_record(&self, key: &VariableKey, locator: &str, record: &[u8]) -> Result<(), VarError> {
        self.transport
            .write_raw(locator, record, false)
            .map_err(|err| VarError::from_transport(key, err))
    }
}

impl<T: Transport> Backend for Sysfs<T> {
    fn kind(&self) -> BackendKind {
        BackendKind::Sysfs
    }

    fn locator(&self, key: &VariableKey) -> Result<String, VarError> {
        check_name(&key.name)?;
        Ok(format!("{}/{RAW_VAR}", mangle(&key.name, key.vendor)))
    }

    fn read(&self, key: &VariableKey) -> Result<Variable, VarError> {
        let (locator, bytes) = self.read_record(key)?;
        let record = Record::decode(&locator, &bytes)?;
        if record.status != 0 {
            warn!("{locator} reports status {:#x}", record.status);
        }
        if record.name != key.name || record.vendor != key.vendor.0 {
            warn!("{locator} holds {}-{}", record.name, record.vendor);
        }
        Ok(Variable {
            key: key.clone(),
            attributes: record.attributes,
            data: record.data,
        })
    }

    fn edit(&self, var: &Variable) -> Result<(), VarError> {
        let locator = self.locator(&var.key)?;
        let record = Record::encode(var, RecordLayout::NATIVE)?;
        self.write_record(&var.key, &locator, &record)
    }

    fn create(&self, var: &Variable) -> Result<(), VarError> {
        self.locator(&var.key)?;
        let record = Record::encode(var, RecordLayout::NATIVE)?;
        self.write_record(&var.key, NEW_VAR, &record)
    }

    fn delete(&self, key: &VariableKey) -> Result<(), VarError> {
        // The kernel matches the record written to del_var against the
        // stored variable, so hand back exactly what it gave us.
        let (_, record) = self.read_record(key)?;
        self.write_record(key, DEL_VAR, &record)
    }

    fn keys(&self) -> Result<Vec<VariableKey>, VarError> {
        let names = self.transport.list().map_err(VarError::Backend)?;
        Ok(names
            .iter()
            .filter(|name| !matches!(name.as_str(), NEW_VAR | DEL_VAR))
            .filter_map(|name| unmangle(name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::{MemoryTransport, TransportErrorKind};
    use std::sync::{Arc, Mutex};

    /// Stands in for the kernel: applies records written to `new_var` and
    /// `del_var` to the variable directories.
    #[derive(Debug, Default)]
    struct FakeKernel {
        vars: MemoryTransport,
        log: Mutex<Vec<String>>,
    }

    impl Transport for FakeKernel {
        fn read_raw(&self, locator: &str) -> Result<Vec<u8>, TransportError> {
            self.vars.read_raw(locator)
        }

        fn write_raw(
            &self,
            locator: &str,
            bytes: &[u8],
            create_if_absent: bool,
        ) -> Result<(), TransportError> {
            self.log.lock().unwrap().push(locator.to_owned());
            let record = Record::decode(locator, bytes)
                .map_err(|_| TransportError::other(locator, "bad record"))?;
            let dir = mangle(&record.name, record.vendor.into());
            let raw_var = format!("{dir}/{RAW_VAR}");
            match locator {
                NEW_VAR => {
                    if self.vars.get(&raw_var).is_some() {
                        return Err(TransportError::new(
                            TransportErrorKind::AlreadyExists,
                            locator,
                            "exists",
                        ));
                    }
                    self.vars.insert(raw_var, bytes);
                    Ok(())
                }
                DEL_VAR => self.vars.delete_raw(&raw_var),
                _ => self.vars.write_raw(locator, bytes, create_if_absent),
            }
        }

        fn delete_raw(&self, locator: &str) -> Result<(), TransportError> {
            Err(TransportError::new(
                TransportErrorKind::PermissionDenied,
                locator,
                "read-only",
            ))
        }

        fn list(&self) -> Result<Vec<String>, TransportError> {
            let mut names = self.vars.list()?;
            names.extend([NEW_VAR.to_owned(), DEL_VAR.to_owned()]);
            Ok(names)
        }
    }

    fn boot_order() -> Variable {
        Variable::new(
            VariableKey::global("BootOrder"),
            VariableAttributes::BOOT_VARIABLE,
            vec![1, 0, 0, 0],
        )
    }

    #[test]
    fn test_record_layout() {
        let record = Record::encode(&boot_order(), RecordLayout::Long64).unwrap();
        assert_eq!(record.len(), 2084);
        assert_eq!(record[..20], *encode_wstring("BootOrder", usize::MAX).unwrap());
        assert!(record[20..NAME_SIZE].iter().all(|&b| b == 0));
        assert_eq!(record[1024..1040], crate::vars::VariableVendor::GLOBAL_VARIABLE.0.to_bytes());
        assert_eq!(record[1040..1048], [4, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(record[1048..1052], [1, 0, 0, 0]);
        assert_eq!(record[2080..], [7, 0, 0, 0]);

        assert_eq!(RecordLayout::Long32.record_size(), 2076);
        let small = Record::encode(&boot_order(), RecordLayout::Long32).unwrap();
        let decoded = Record::decode("x", &small).unwrap();
        assert_eq!(decoded.name, "BootOrder");
        assert_eq!(decoded.data, [1, 0, 0, 0]);
        assert_eq!(decoded.attributes, VariableAttributes::BOOT_VARIABLE);
    }

    #[test]
    fn test_limits() {
        let mut var = boot_order();
        var.data = vec![0; DATA_SIZE + 1];
        assert_eq!(
            Record::encode(&var, RecordLayout::NATIVE).err(),
            Some(VarError::OutOfResources(var.key.clone()))
        );

        let long_name = Variable::new(
            VariableKey::global("x".repeat(512)),
            VariableAttributes::empty(),
            vec![],
        );
        assert!(matches!(
            Record::encode(&long_name, RecordLayout::NATIVE),
            Err(VarError::InvalidName(_))
        ));
        let max_name = Variable::new(
            VariableKey::global("x".repeat(511)),
            VariableAttributes::empty(),
            vec![],
        );
        assert!(Record::encode(&max_name, RecordLayout::NATIVE).is_ok());
    }

    #[test]
    fn test_lifecycle() {
        let kernel = Arc::new(FakeKernel::default());
        let backend = Sysfs::new(Arc::clone(&kernel));
        let var = boot_order();

        backend.create(&var).unwrap();
        assert_eq!(
            backend.create(&var),
            Err(VarError::AlreadyExists(var.key.clone()))
        );
        assert_eq!(backend.read(&var.key).unwrap(), var);
        assert_eq!(backend.keys().unwrap(), [var.key.clone()]);

        let edited = Variable {
            data: vec![2, 0],
            ..var.clone()
        };
        backend.edit(&edited).unwrap();
        assert_eq!(backend.read(&var.key).unwrap(), edited);

        backend.delete(&var.key).unwrap();
        assert_eq!(backend.read(&var.key), Err(VarError::NotFound(var.key.clone())));
        assert_eq!(backend.delete(&var.key), Err(VarError::NotFound(var.key.clone())));

        let log = kernel.log.lock().unwrap();
        assert_eq!(
            *log,
            [
                NEW_VAR.to_owned(),
                NEW_VAR.to_owned(),
                format!("BootOrder-{}/{RAW_VAR}", var.key.vendor.0),
                DEL_VAR.to_owned(),
            ]
        );
    }
}
