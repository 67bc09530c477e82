// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data types shared by the codecs: GUIDs and UCS-2 strings.

mod guid;
mod strs;

pub use guid::{format_guid, parse_guid, MalformedGuid};
pub use strs::{decode_wstring, encode_wstring, wstrlen, StrError, CHAR16_SIZE};
pub use uguid::{guid, Guid, GuidFromStrError};
