// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crate-wide error type.

use crate::boot::InvalidBootValue;
use crate::data_types::{MalformedGuid, StrError};
use crate::device_path::{ChainError, NodeError};
use crate::load_option::LoadOptionError;
use crate::vars::VarError;
use core::fmt::{self, Display, Formatter};

/// Any error returned by this crate.
///
/// Each layer has its own error type; this enum wraps them so that callers
/// mixing several layers can use `?` throughout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A GUID could not be parsed from text.
    Guid(MalformedGuid),
    /// A string could not be converted to or from UCS-2.
    Str(StrError),
    /// A device path node could not be decoded or encoded.
    Node(NodeError),
    /// A device path chain could not be decoded.
    Chain(ChainError),
    /// A load option value is malformed.
    LoadOption(LoadOptionError),
    /// A boot manager variable is malformed.
    BootValue(InvalidBootValue),
    /// The variable store reported a failure.
    Var(VarError),
}

/// Result type used by the crate-level convenience functions.
pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guid(err) => Display::fmt(err, f),
            Self::Str(err) => Display::fmt(err, f),
            Self::Node(err) => Display::fmt(err, f),
            Self::Chain(err) => Display::fmt(err, f),
            Self::LoadOption(err) => Display::fmt(err, f),
            Self::BootValue(err) => Display::fmt(err, f),
            Self::Var(err) => Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Guid(err) => Some(err),
            Self::Str(err) => Some(err),
            Self::Node(err) => Some(err),
            Self::Chain(err) => Some(err),
            Self::LoadOption(err) => Some(err),
            Self::BootValue(err) => Some(err),
            Self::Var(err) => Some(err),
        }
    }
}

macro_rules! impl_from_error {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(err: $ty) -> Self {
                    Self::$variant(err)
                }
            }
        )*
    };
}

impl_from_error! {
    Guid(MalformedGuid),
    Str(StrError),
    Node(NodeError),
    Chain(ChainError),
    LoadOption(LoadOptionError),
    BootValue(InvalidBootValue),
    Var(VarError),
}
