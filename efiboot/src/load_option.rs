// SPDX-License-Identifier: MIT OR Apache-2.0

//! Values of `Boot####` and similar load option variables.
//!
//! A load option is laid out as:
//!
//! | field            | size                  |
//! |------------------|-----------------------|
//! | attributes       | 4                     |
//! | file path length | 2                     |
//! | description      | UCS-2, NUL-terminated |
//! | file path list   | file path length      |
//! | optional data    | rest of the value     |
//!
//! The file path list holds one or more device paths. The first one names
//! the boot target; further ones are used by some boot loaders, e.g. for an
//! initrd.

use crate::data_types::{decode_wstring, encode_wstring, wstrlen, StrError, CHAR16_SIZE};
use crate::device_path::{ChainError, DevicePath, NodeError};
use core::fmt::{self, Display, Formatter};

pub use efiboot_raw::load_option::LoadOptionAttributes;

/// Size of the attributes and file path length fields.
const FIXED_SIZE: usize = LoadOptionAttributes::SIZE + 2;

/// Errors decoding or encoding a load option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOptionError {
    /// The value is too short to hold the fixed fields.
    TooShort {
        /// Size of the value.
        len: usize,
    },
    /// The file path length points past the end of the value.
    FilePathListOverflow {
        /// File path length from the value.
        declared: usize,
        /// Bytes following the fixed fields.
        available: usize,
    },
    /// The description has no terminator before the file path list.
    UnterminatedDescription,
    /// The description cannot be encoded.
    Description(StrError),
    /// The file path list is malformed.
    FilePath(ChainError),
    /// The file path list is longer than a 16-bit length can describe.
    FilePathListTooLong {
        /// Size of the file path list in bytes.
        len: usize,
    },
}

impl Display for LoadOptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "load option of {len} bytes is too short"),
            Self::FilePathListOverflow {
                declared,
                available,
            } => write!(
                f,
                "load option declares a {declared}-byte file path list but has {available} bytes left"
            ),
            Self::UnterminatedDescription => {
                f.write_str("load option description is not terminated")
            }
            Self::Description(err) => write!(f, "invalid load option description: {err}"),
            Self::FilePath(err) => write!(f, "invalid load option file path: {err}"),
            Self::FilePathListTooLong { len } => {
                write!(f, "load option file path list of {len} bytes is too long")
            }
        }
    }
}

impl std::error::Error for LoadOptionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Description(err) => Some(err),
            Self::FilePath(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChainError> for LoadOptionError {
    fn from(err: ChainError) -> Self {
        Self::FilePath(err)
    }
}

impl From<NodeError> for LoadOptionError {
    fn from(err: NodeError) -> Self {
        Self::FilePath(err.into())
    }
}

/// Decoded load option.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOption {
    /// Attribute bits. Unknown bits are kept.
    pub attributes: LoadOptionAttributes,
    /// Human-readable description shown by boot menus.
    pub description: String,
    /// Device path of the boot target.
    pub file_path: DevicePath,
    /// Device paths following the first in the file path list.
    pub extra_file_paths: Vec<DevicePath>,
    /// Data passed to the loaded image, such as a kernel command line.
    pub optional_data: Vec<u8>,
}

impl LoadOption {
    /// Active load option with no optional data.
    #[must_use]
    pub fn new(description: impl Into<String>, file_path: DevicePath) -> Self {
        Self {
            attributes: LoadOptionAttributes::ACTIVE,
            description: description.into(),
            file_path,
            extra_file_paths: Vec::new(),
            optional_data: Vec::new(),
        }
    }

    /// True if the option takes part in boot selection.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.attributes.contains(LoadOptionAttributes::ACTIVE)
    }

    /// Set or clear the active bit.
    pub fn set_active(&mut self, active: bool) {
        self.attributes.set(LoadOptionAttributes::ACTIVE, active);
    }

    /// Decode a load option value.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadOptionError> {
        let (fixed, rest) = bytes
            .split_first_chunk::<FIXED_SIZE>()
            .ok_or(LoadOptionError::TooShort { len: bytes.len() })?;
        let attributes = LoadOptionAttributes::from_bits_retain(u32::from_le_bytes([
            fixed[0], fixed[1], fixed[2], fixed[3],
        ]));
        let file_path_len = usize::from(u16::from_le_bytes([fixed[4], fixed[5]]));

        let description_region = rest.len().checked_sub(file_path_len).ok_or(
            LoadOptionError::FilePathListOverflow {
                declared: file_path_len,
                available: rest.len(),
            },
        )?;
        let description_units = wstrlen(rest, description_region / CHAR16_SIZE);
        let paths_start = (description_units + 1) * CHAR16_SIZE;
        if paths_start > description_region {
            return Err(LoadOptionError::UnterminatedDescription);
        }
        let description = decode_wstring(rest, description_units);

        let paths = &rest[paths_start..paths_start + file_path_len];
        let (file_path, mut offset) = DevicePath::parse_prefix(paths)?;
        let mut extra_file_paths = Vec::new();
        while offset < paths.len() {
            let (path, len) = DevicePath::parse_prefix(&paths[offset..]).map_err(|err| match err {
                ChainError::TruncatedChain { offset: inner } => ChainError::TruncatedChain {
                    offset: offset + inner,
                },
                other => other,
            })?;
            extra_file_paths.push(path);
            offset += len;
        }

        Ok(Self {
            attributes,
            description,
            file_path,
            extra_file_paths,
            optional_data: rest[paths_start + file_path_len..].to_vec(),
        })
    }

    /// Encode the load option.
    pub fn encode(&self) -> Result<Vec<u8>, LoadOptionError> {
        let mut paths = self.file_path.encode()?;
        for path in &self.extra_file_paths {
            paths.extend_from_slice(&path.encode()?);
        }
        let file_path_len = u16::try_from(paths.len())
            .map_err(|_| LoadOptionError::FilePathListTooLong { len: paths.len() })?;
        let description =
            encode_wstring(&self.description, usize::MAX).map_err(LoadOptionError::Description)?;

        let mut out = Vec::with_capacity(
            FIXED_SIZE + description.len() + paths.len() + self.optional_data.len(),
        );
        out.extend_from_slice(&self.attributes.bits().to_le_bytes());
        out.extend_from_slice(&file_path_len.to_le_bytes());
        out.extend_from_slice(&description);
        out.extend_from_slice(&paths);
        out.extend_from_slice(&self.optional_data);
        Ok(out)
    }
}

impl Display for LoadOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.description, self.file_path)?;
        for path in &self.extra_file_paths {
            write!(f, "|{path}")?;
        }
        Ok(())
    }
}

/// Decode a load option value. See [`LoadOption::decode`].
pub fn decode_boot_option(bytes: &[u8]) -> Result<LoadOption, LoadOptionError> {
    LoadOption::decode(bytes)
}

/// Encode a load option value. See [`LoadOption::encode`].
pub fn encode_boot_option(option: &LoadOption) -> Result<Vec<u8>, LoadOptionError> {
    option.encode()
}
