// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt::{self, Display, Formatter};
use uguid::{Guid, GuidFromStrError};

/// Text that is not a GUID in the canonical `8-4-4-4-12` hex form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedGuid {
    /// The rejected input.
    pub input: String,
    /// What the parser objected to.
    pub reason: GuidFromStrError,
}

impl Display for MalformedGuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "malformed GUID {:?}: {:?}", self.input, self.reason)
    }
}

impl std::error::Error for MalformedGuid {}

/// Parse a GUID from its 36-character text form.
///
/// Hex digits may be upper or lower case. Surrounding braces and whitespace
/// are not accepted.
pub fn parse_guid(text: &str) -> Result<Guid, MalformedGuid> {
    Guid::try_parse(text).map_err(|reason| MalformedGuid {
        input: text.to_owned(),
        reason,
    })
}

/// Format a GUID as lower-case `8-4-4-4-12` text.
///
/// The first three groups are printed from their little-endian encoding, so
/// the text matches what firmware tools and `efivarfs` file names show.
#[must_use]
pub fn format_guid(guid: Guid) -> String {
    guid.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uguid::guid;

    #[test]
    fn test_parse_mixed_case() {
        let lower = parse_guid("8be4df61-93ca-11d2-aa0d-00e098032b8c").unwrap();
        let upper = parse_guid("8BE4DF61-93CA-11D2-AA0D-00E098032B8C").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, guid!("8be4df61-93ca-11d2-aa0d-00e098032b8c"));
    }

    #[test]
    fn test_format_roundtrip() {
        let text = "47c7b227-c42a-11d2-8e57-00a0c969723b";
        assert_eq!(format_guid(parse_guid(text).unwrap()), text);
        assert_eq!(
            format_guid(parse_guid("47C7B227-C42A-11D2-8E57-00A0C969723B").unwrap()),
            text
        );
    }

    #[test]
    fn test_byte_order() {
        let guid = parse_guid("8be4df61-93ca-11d2-aa0d-00e098032b8c").unwrap();
        #[rustfmt::skip]
        assert_eq!(guid.to_bytes(), [
            0x61, 0xdf, 0xe4, 0x8b,
            0xca, 0x93,
            0xd2, 0x11,
            0xaa, 0x0d, 0x00, 0xe0, 0x98, 0x03, 0x2b, 0x8c,
        ]);
    }

    #[test]
    fn test_roundtrip_edge_bytes() {
        let mut patterns = vec![[0u8; 16], [0xff; 16]];
        for i in 0..16 {
            for v in [0x01, 0x80, 0xfe] {
                let mut bytes = [0u8; 16];
                bytes[i] = v;
                patterns.push(bytes);
            }
        }

        for bytes in patterns {
            let guid = Guid::from_bytes(bytes);
            let text = format_guid(guid);
            assert_eq!(text.len(), 36, "{text}");
            assert_eq!(text, text.to_ascii_lowercase());
            assert_eq!(parse_guid(&text).unwrap(), guid, "{text}");
            assert_eq!(parse_guid(&text.to_ascii_uppercase()).unwrap(), guid, "{text}");
            assert_eq!(guid.to_bytes(), bytes);
        }
    }

    #[test]
    fn test_malformed() {
        for text in [
            "",
            "8be4df61-93ca-11d2-aa0d-00e098032b8",
            "8be4df61x93ca-11d2-aa0d-00e098032b8c",
            "8be4df61-93ca-11d2-aa0d-00e098032b8g",
        ] {
            let err = parse_guid(text).unwrap_err();
            assert_eq!(err.input, text);
        }
    }
}
