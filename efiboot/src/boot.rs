// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boot manager variables.
//!
//! The boot manager reads its configuration from global variables:
//! `Boot####` holds one [`LoadOption`] each, `BootOrder` lists the option
//! numbers to try, `BootNext` overrides the order for the next boot only and
//! `BootCurrent` tells which option the running system was started from.

use crate::load_option::LoadOption;
use crate::vars::{VarError, VarStore, Variable, VariableAttributes, VariableKey, VariableVendor};
use crate::Result;
use core::fmt::{self, Display, Formatter};
use log::{debug, warn};

/// Name of the boot order variable.
pub const BOOT_ORDER: &str = "BootOrder";

/// Name of the one-shot boot override variable.
pub const BOOT_NEXT: &str = "BootNext";

/// Name of the variable holding the option the system booted from.
pub const BOOT_CURRENT: &str = "BootCurrent";

/// Name of the `Boot####` variable for option `number`.
#[must_use]
pub fn boot_variable_name(number: u16) -> String {
    format!("Boot{number:04X}")
}

/// Option number of a `Boot####` variable name.
///
/// The four digits are hexadecimal and must be upper case, as the boot
/// manager only recognises that form.
#[must_use]
pub fn parse_boot_variable_name(name: &str) -> Option<u16> {
    let digits = name.strip_prefix("Boot")?;
    if digits.len() != 4
        || !digits
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Boot manager variable whose size does not fit its 16-bit number format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidBootValue {
    /// Variable name.
    pub name: &'static str,
    /// Size of the value.
    pub len: usize,
}

impl Display for InvalidBootValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} value of {} bytes is malformed", self.name, self.len)
    }
}

impl std::error::Error for InvalidBootValue {}

/// Ordered list of boot option numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BootOrder(pub Vec<u16>);

impl BootOrder {
    /// Decode a list of little-endian 16-bit numbers.
    pub fn decode(bytes: &[u8]) -> core::result::Result<Self, InvalidBootValue> {
        if bytes.len() % 2 != 0 {
            return Err(InvalidBootValue {
                name: BOOT_ORDER,
                len: bytes.len(),
            });
        }
        Ok(Self(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        ))
    }

    /// Encode as little-endian 16-bit numbers.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.0.iter().flat_map(|n| n.to_le_bytes()).collect()
    }
}

impl Display for BootOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, n) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{n:04X}")?;
        }
        Ok(())
    }
}

fn decode_u16(name: &'static str, data: &[u8]) -> core::result::Result<u16, InvalidBootValue> {
    <[u8; 2]>::try_from(data)
        .map(u16::from_le_bytes)
        .map_err(|_| InvalidBootValue {
            name,
            len: data.len(),
        })
}

fn read_u16(store: &VarStore, name: &'static str) -> Result<Option<u16>> {
    match store.read(name, VariableVendor::GLOBAL_VARIABLE) {
        Ok(var) => Ok(Some(decode_u16(name, &var.data)?)),
        Err(VarError::NotFound(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn global(name: &str, data: Vec<u8>) -> Variable {
    Variable::new(VariableKey::global(name), VariableAttributes::BOOT_VARIABLE, data)
}

/// `BootOrder` holding `order`, keeping the attributes of `current`.
fn order_variable(current: Option<Variable>, order: &BootOrder) -> Variable {
    match current {
        Some(var) => Variable {
            data: order.encode(),
            ..var
        },
        None => global(BOOT_ORDER, order.encode()),
    }
}

impl VarStore {
    /// Current boot order. A missing `BootOrder` is an empty order.
    pub fn boot_order(&self) -> Result<BootOrder> {
        match self.read(BOOT_ORDER, VariableVendor::GLOBAL_VARIABLE) {
            Ok(var) => Ok(BootOrder::decode(&var.data)?),
            Err(VarError::NotFound(_)) => Ok(BootOrder::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the boot order, creating `BootOrder` if needed.
    pub fn set_boot_order(&self, order: &BootOrder) -> Result<()> {
        debug!("setting boot order {order}");
        Ok(self.set(&global(BOOT_ORDER, order.encode()))?)
    }

    /// Read and decode `Boot####`.
    pub fn boot_option(&self, number: u16) -> Result<LoadOption> {
        let var = self.read(&boot_variable_name(number), VariableVendor::GLOBAL_VARIABLE)?;
        Ok(LoadOption::decode(&var.data)?)
    }

    /// Numbers of all `Boot####` variables, sorted.
    pub fn boot_entries(&self) -> Result<Vec<u16>> {
        let mut numbers: Vec<u16> = self
            .keys()?
            .iter()
            .filter(|key| key.vendor == VariableVendor::GLOBAL_VARIABLE)
            .filter_map(|key| parse_boot_variable_name(&key.name))
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        Ok(numbers)
    }

    /// Store `option` under the lowest free `Boot####` number and append it
    /// to the boot order. Returns the number used.
    ///
    /// If the boot order cannot be updated, the new `Boot####` is removed
    /// again before the error is returned.
    pub fn add_boot_option(&self, option: &LoadOption) -> Result<u16> {
        let data = option.encode()?;
        let mut used = self.boot_entries()?;
        let number = loop {
            let number = (0..=u16::MAX)
                .find(|n| used.binary_search(n).is_err())
                .ok_or_else(|| VarError::OutOfResources(VariableKey::global("Boot####")))?;
            match self.create(&global(&boot_variable_name(number), data.clone())) {
                Ok(()) => break number,
                Err(VarError::AlreadyExists(_)) => {
                    debug!("Boot{number:04X} was taken meanwhile");
                    if let Err(pos) = used.binary_search(&number) {
                        used.insert(pos, number);
                    }
                }
                Err(err) => return Err(err.into()),
            }
        };

        let appended = self.update::<crate::Error, _>(
            BOOT_ORDER,
            VariableVendor::GLOBAL_VARIABLE,
            |current| {
                let mut order = match &current {
                    Some(var) => BootOrder::decode(&var.data)?,
                    None => BootOrder::default(),
                };
                if !order.0.contains(&number) {
                    order.0.push(number);
                }
                Ok(Some(order_variable(current, &order)))
            },
        );
        if let Err(err) = appended {
            let name = boot_variable_name(number);
            if let Err(undo) = self.delete(&name, VariableVendor::GLOBAL_VARIABLE) {
                warn!("could not remove {name} after failing to add it: {undo}");
            }
            return Err(err);
        }
        Ok(number)
    }

    /// Delete `Boot####`, drop it from the boot order and clear `BootNext`
    /// if it points there.
    ///
    /// A malformed `BootOrder` or `BootNext` is reported before anything is
    /// changed.
    pub fn remove_boot_option(&self, number: u16) -> Result<()> {
        let name = boot_variable_name(number);
        if !self.exists(&name, VariableVendor::GLOBAL_VARIABLE)? {
            return Err(VarError::NotFound(VariableKey::global(name)).into());
        }
        self.boot_order()?;
        self.boot_next()?;

        self.update::<crate::Error, _>(
            BOOT_ORDER,
            VariableVendor::GLOBAL_VARIABLE,
            |current| {
                let Some(var) = current else {
                    return Ok(None);
                };
                let mut order = BootOrder::decode(&var.data)?;
                order.0.retain(|&n| n != number);
                Ok(Some(order_variable(Some(var), &order)))
            },
        )?;
        self.update::<crate::Error, _>(
            BOOT_NEXT,
            VariableVendor::GLOBAL_VARIABLE,
            |current| match current {
                Some(var) if decode_u16(BOOT_NEXT, &var.data)? == number => Ok(None),
                other => Ok(other),
            },
        )?;
        Ok(self.delete(&name, VariableVendor::GLOBAL_VARIABLE)?)
    }

    /// Option to boot next time only, if set.
    pub fn boot_next(&self) -> Result<Option<u16>> {
        read_u16(self, BOOT_NEXT)
    }

    /// Boot `number` next time only.
    pub fn set_boot_next(&self, number: u16) -> Result<()> {
        Ok(self.set(&global(BOOT_NEXT, number.to_le_bytes().to_vec()))?)
    }

    /// Option the running system was booted from, if the firmware says.
    pub fn boot_current(&self) -> Result<Option<u16>> {
        read_u16(self, BOOT_CURRENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_path::{media, DevicePath, DevicePathNode};
    use crate::vars::{Efivarfs, MemoryTransport, Transport, TransportError};
    use crate::Error;
    use std::thread;
    use std::time::Duration;

    fn store() -> VarStore {
        VarStore::new(Efivarfs::new(MemoryTransport::new()))
    }

    fn option(description: &str) -> LoadOption {
        let path: DevicePath = [DevicePathNode::from(
            media::FilePath::new(r"\EFI\BOOT\BOOTX64.EFI").unwrap(),
        )]
        .into_iter()
        .collect();
        LoadOption::new(description, path)
    }

    #[test]
    fn test_names() {
        assert_eq!(boot_variable_name(1), "Boot0001");
        assert_eq!(boot_variable_name(0xbeef), "BootBEEF");
        assert_eq!(parse_boot_variable_name("Boot0001"), Some(1));
        assert_eq!(parse_boot_variable_name("BootBEEF"), Some(0xbeef));
        for name in ["BootOrder", "BootNext", "Boot001", "Boot00001", "Bootbeef", "Boot+001"] {
            assert_eq!(parse_boot_variable_name(name), None, "{name}");
        }
    }

    #[test]
    fn test_boot_order_codec() {
        let order = BootOrder(vec![1, 0x1000, 3]);
        assert_eq!(order.encode(), [1, 0, 0, 0x10, 3, 0]);
        assert_eq!(BootOrder::decode(&order.encode()).unwrap(), order);
        assert_eq!(order.to_string(), "0001,1000,0003");
        assert_eq!(
            BootOrder::decode(&[1, 0, 2]),
            Err(InvalidBootValue {
                name: BOOT_ORDER,
                len: 3
            })
        );
    }

    #[test]
    fn test_add_and_remove() {
        let store = store();
        assert_eq!(store.boot_order().unwrap(), BootOrder::default());

        assert_eq!(store.add_boot_option(&option("first")).unwrap(), 0);
        assert_eq!(store.add_boot_option(&option("second")).unwrap(), 1);
        assert_eq!(store.boot_order().unwrap(), BootOrder(vec![0, 1]));
        assert_eq!(store.boot_entries().unwrap(), [0, 1]);
        assert_eq!(store.boot_option(1).unwrap(), option("second"));

        store.set_boot_next(0).unwrap();
        store.remove_boot_option(0).unwrap();
        assert_eq!(store.boot_order().unwrap(), BootOrder(vec![1]));
        assert_eq!(store.boot_next().unwrap(), None);

        // The freed number is reused.
        assert_eq!(store.add_boot_option(&option("third")).unwrap(), 0);
        assert_eq!(store.boot_order().unwrap(), BootOrder(vec![1, 0]));
    }

    #[test]
    fn test_remove_missing() {
        let store = store();
        assert!(matches!(
            store.remove_boot_option(7),
            Err(Error::Var(VarError::NotFound(_)))
        ));
    }

    #[test]
    fn test_boot_current() {
        let store = store();
        assert_eq!(store.boot_current().unwrap(), None);
        store
            .create(&Variable::new(
                VariableKey::global(BOOT_CURRENT),
                VariableAttributes::BOOTSERVICE_ACCESS | VariableAttributes::RUNTIME_ACCESS,
                vec![0x02, 0x00],
            ))
            .unwrap();
        assert_eq!(store.boot_current().unwrap(), Some(2));
    }

    /// Memory transport that is slow to read `BootOrder`, so that unlocked
    /// read-modify-write cycles would interleave.
    #[derive(Debug, Default)]
    struct SlowBootOrder(MemoryTransport);

    impl Transport for SlowBootOrder {
        fn read_raw(&self, locator: &str) -> Result<Vec<u8>, TransportError> {
            if locator.starts_with("BootOrder-") {
                thread::sleep(Duration::from_millis(50));
            }
            self.0.read_raw(locator)
        }

        fn write_raw(
            &self,
            locator: &str,
            bytes: &[u8],
            create_if_absent: bool,
        ) -> Result<(), TransportError> {
            self.0.write_raw(locator, bytes, create_if_absent)
        }

        fn delete_raw(&self, locator: &str) -> Result<(), TransportError> {
            self.0.delete_raw(locator)
        }

        fn list(&self) -> Result<Vec<String>, TransportError> {
            self.0.list()
        }
    }

    #[test]
    fn test_concurrent_adds_keep_both_options() {
        let store = VarStore::new(Efivarfs::new(SlowBootOrder::default()));

        let numbers: Vec<u16> = thread::scope(|s| {
            let handles: Vec<_> = ["first", "second"]
                .into_iter()
                .map(|description| {
                    let store = &store;
                    s.spawn(move || store.add_boot_option(&option(description)).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_ne!(numbers[0], numbers[1]);
        let mut order = store.boot_order().unwrap().0;
        assert_eq!(order.len(), 2);
        order.sort_unstable();
        assert_eq!(order, [0, 1]);
        assert_eq!(store.boot_entries().unwrap(), [0, 1]);
    }

    #[test]
    fn test_remove_with_malformed_boot_order() {
        let store = store();
        assert_eq!(store.add_boot_option(&option("first")).unwrap(), 0);
        store.set(&global(BOOT_ORDER, vec![0, 0, 1])).unwrap();

        assert!(matches!(
            store.remove_boot_option(0),
            Err(Error::BootValue(InvalidBootValue { name: BOOT_ORDER, len: 3 }))
        ));
        assert_eq!(store.boot_entries().unwrap(), [0]);
    }

    #[test]
    fn test_remove_with_malformed_boot_next() {
        let store = store();
        assert_eq!(store.add_boot_option(&option("first")).unwrap(), 0);
        store.set(&global(BOOT_NEXT, vec![0])).unwrap();

        assert!(matches!(
            store.remove_boot_option(0),
            Err(Error::BootValue(InvalidBootValue { name: BOOT_NEXT, len: 1 }))
        ));
        assert_eq!(store.boot_entries().unwrap(), [0]);
        assert_eq!(store.boot_order().unwrap(), BootOrder(vec![0]));
    }

    #[test]
    fn test_add_with_malformed_boot_order_rolls_back() {
        let store = store();
        store.set(&global(BOOT_ORDER, vec![0, 0, 1])).unwrap();

        assert!(matches!(
            store.add_boot_option(&option("first")),
            Err(Error::BootValue(_))
        ));
        assert!(store.boot_entries().unwrap().is_empty());
    }
}
