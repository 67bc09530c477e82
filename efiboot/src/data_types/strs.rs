// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt::{self, Display, Formatter};

/// Size in bytes of one UCS-2 code unit.
pub const CHAR16_SIZE: usize = 2;

/// Errors converting text to UCS-2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrError {
    /// The encoded text, including its terminator, needs more code units
    /// than the destination holds.
    TooLong {
        /// Destination size in code units.
        capacity: usize,
        /// Code units needed, including the terminating NUL.
        required: usize,
    },
    /// The character at this index (counted in `char`s) is outside the
    /// Basic Multilingual Plane.
    InvalidChar(usize),
    /// The character at this index (counted in `char`s) is NUL, which would
    /// end the string early.
    InteriorNul(usize),
}

impl Display for StrError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong { capacity, required } => write!(
                f,
                "string needs {required} UCS-2 code units but only {capacity} fit"
            ),
            Self::InvalidChar(index) => {
                write!(f, "character {index} cannot be represented in UCS-2")
            }
            Self::InteriorNul(index) => write!(f, "character {index} is an interior NUL"),
        }
    }
}

impl std::error::Error for StrError {}

fn code_units(buffer: &[u8], max_chars: usize) -> impl Iterator<Item = u16> + '_ {
    buffer
        .chunks_exact(CHAR16_SIZE)
        .take(max_chars)
        .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
        .take_while(|&unit| unit != 0)
}

/// Count the code units before the first NUL, looking at no more than
/// `max_chars` units and never past the end of `buffer`.
#[must_use]
pub fn wstrlen(buffer: &[u8], max_chars: usize) -> usize {
    code_units(buffer, max_chars).count()
}

/// Decode a little-endian UCS-2 string.
///
/// Decoding stops at the first NUL, after `max_chars` code units, or at the
/// end of `buffer`, whichever comes first; a missing terminator is not an
/// error. A trailing odd byte is ignored. Code units that are not valid
/// characters on their own (unpaired surrogates) become U+FFFD.
#[must_use]
pub fn decode_wstring(buffer: &[u8], max_chars: usize) -> String {
    let mut utf8 = Vec::with_capacity(wstrlen(buffer, max_chars));
    for unit in code_units(buffer, max_chars) {
        let decoded = ucs2::decode_with(&[unit], |bytes| {
            utf8.extend_from_slice(bytes);
            Ok(())
        });
        if decoded.is_err() {
            utf8.extend_from_slice(char::REPLACEMENT_CHARACTER.encode_utf8(&mut [0; 4]).as_bytes());
        }
    }
    match String::from_utf8(utf8) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

/// Encode `text` as little-endian UCS-2 followed by a NUL terminator.
///
/// `capacity` is the size of the destination in code units, terminator
/// included. Pass `usize::MAX` when the destination grows as needed.
pub fn encode_wstring(text: &str, capacity: usize) -> Result<Vec<u8>, StrError> {
    if let Some(index) = text.chars().position(|c| c == '\0') {
        return Err(StrError::InteriorNul(index));
    }

    let mut units = Vec::with_capacity(text.len() + 1);
    ucs2::encode_with(text, |unit| {
        units.push(unit);
        Ok(())
    })
    .map_err(|_| {
        let index = text.chars().position(|c| c.len_utf16() > 1).unwrap_or(0);
        StrError::InvalidChar(index)
    })?;
    units.push(0);

    if units.len() > capacity {
        return Err(StrError::TooLong {
            capacity,
            required: units.len(),
        });
    }

    Ok(units.iter().flat_map(|unit| unit.to_le_bytes()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ascii() {
        assert_eq!(
            encode_wstring("Linux", usize::MAX).unwrap(),
            [b'L', 0, b'i', 0, b'n', 0, b'u', 0, b'x', 0, 0, 0]
        );
        assert_eq!(encode_wstring("", 1).unwrap(), [0, 0]);
    }

    #[test]
    fn test_encode_capacity() {
        let forty = "a".repeat(40);
        assert_eq!(
            encode_wstring(&forty, 10),
            Err(StrError::TooLong {
                capacity: 10,
                required: 41
            })
        );

        let nine = "a".repeat(9);
        assert_eq!(encode_wstring(&nine, 10).unwrap().len(), 20);
        assert!(encode_wstring(&"a".repeat(10), 10).is_err());
    }

    #[test]
    fn test_encode_rejects() {
        assert_eq!(
            encode_wstring("ab😀", usize::MAX),
            Err(StrError::InvalidChar(2))
        );
        assert_eq!(
            encode_wstring("a\0b", usize::MAX),
            Err(StrError::InteriorNul(1))
        );
    }

    #[test]
    fn test_encode_bmp() {
        assert_eq!(encode_wstring("é€", usize::MAX).unwrap(), [0xe9, 0x00, 0xac, 0x20, 0, 0]);
    }

    #[test]
    fn test_decode() {
        let bytes = encode_wstring("Windows Boot Manager", usize::MAX).unwrap();
        assert_eq!(decode_wstring(&bytes, usize::MAX), "Windows Boot Manager");
        assert_eq!(decode_wstring(&bytes, 7), "Windows");
        assert_eq!(wstrlen(&bytes, usize::MAX), 20);
    }

    #[test]
    fn test_decode_unterminated() {
        // No NUL, odd trailing byte.
        let bytes = [b'E', 0, b'F', 0, b'I', 0, 0x41];
        assert_eq!(decode_wstring(&bytes, usize::MAX), "EFI");
        assert_eq!(wstrlen(&bytes, usize::MAX), 3);
        assert_eq!(decode_wstring(&[], 16), "");
    }

    #[test]
    fn test_decode_stops_at_nul() {
        let bytes = [b'a', 0, 0, 0, b'b', 0];
        assert_eq!(decode_wstring(&bytes, usize::MAX), "a");
    }
}
