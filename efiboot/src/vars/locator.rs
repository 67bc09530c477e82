// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping between variable identities and the `Name-guid` entry names used
//! by both kernel interfaces.

use super::{VarError, VariableKey, VariableVendor};
use crate::data_types::parse_guid;

/// Length of a GUID in text form.
const GUID_TEXT_LEN: usize = 36;

/// Entry name of a variable: its name, a dash and the lower-case vendor
/// GUID.
#[must_use]
pub fn mangle(name: &str, vendor: VariableVendor) -> String {
    format!("{name}-{}", vendor.0)
}

/// Recover the identity from an entry name or from a locator whose first
/// component is one.
///
/// Returns `None` for names that do not end in `-` and a GUID.
#[must_use]
pub fn unmangle(locator: &str) -> Option<VariableKey> {
    let entry = locator.split('/').next()?;
    let split = entry.len().checked_sub(GUID_TEXT_LEN + 1)?;
    if !entry.is_char_boundary(split) {
        return None;
    }
    let (name, guid) = entry.split_at(split);
    let guid = guid.strip_prefix('-')?;
    if name.is_empty() {
        return None;
    }
    let vendor = parse_guid(guid).ok()?;
    Some(VariableKey::new(name, vendor))
}

/// Reject names that cannot be embedded in a locator.
pub(crate) fn check_name(name: &str) -> Result<(), VarError> {
    if name.is_empty() || name.contains(['/', '\0']) {
        return Err(VarError::InvalidName(name.to_owned()));
    }
    Ok(())
}
