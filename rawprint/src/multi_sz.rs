//! Multi-string (`REG_MULTI_SZ`-style) decoding
//!
//! A multi-string packs NUL-terminated UTF-16 entries back to back and ends
//! the list with an empty entry, i.e. two consecutive NULs:
//!
//! ```text
//! a l p h a \0 b e t a \0 \0
//! ```
//!
//! Decoding stops at the first empty entry. Entries are decoded lossily:
//! unpaired surrogates become U+FFFD.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultiSzError {
    /// The region ended before the terminating empty entry
    #[error("multi-string is not terminated ({decoded} entries decoded before end of buffer)")]
    Unterminated { decoded: usize },
}

/// Decode a multi-string from a bounded slice of UTF-16 code units.
///
/// Units after the terminator are ignored.
pub fn decode_units(units: &[u16]) -> Result<Vec<String>, MultiSzError> {
    decode(units.iter().copied())
}

/// Decode a multi-string from raw bytes holding native-endian UTF-16 units.
///
/// A trailing odd byte is treated as end of buffer.
pub fn decode_bytes(bytes: &[u8]) -> Result<Vec<String>, MultiSzError> {
    decode(
        bytes
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]])),
    )
}

/// Decode a multi-string by walking raw memory until the empty entry.
///
/// A null `ptr` yields an empty list without touching memory.
///
/// # Safety
///
/// `ptr` must be null or point to readable, 2-byte aligned memory that holds a
/// complete multi-string, including its terminating empty entry. Nothing
/// bounds the walk other than that terminator; prefer [`decode_bytes`] when
/// the size of the surrounding allocation is known.
pub unsafe fn read_multi_sz(ptr: *const u16) -> Vec<String> {
    if ptr.is_null() {
        return Vec::new();
    }

    let units = RawUnits { pos: ptr };
    // An unbounded source never runs dry, so the walk only ends at the terminator.
    decode(units).unwrap_or_default()
}

/// Encode entries as a multi-string, terminator included.
///
/// Empty entries would terminate the list early and are skipped.
pub fn encode_multi_sz<I, S>(entries: I) -> Vec<u16>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut units = Vec::new();
    for entry in entries {
        let entry = entry.as_ref();
        if entry.is_empty() {
            continue;
        }
        units.extend(entry.encode_utf16());
        units.push(0);
    }
    units.push(0);
    units
}

fn decode(units: impl Iterator<Item = u16>) -> Result<Vec<String>, MultiSzError> {
    let mut entries = Vec::new();
    let mut current: Vec<u16> = Vec::new();

    for unit in units {
        if unit != 0 {
            current.push(unit);
            continue;
        }

        if current.is_empty() {
            return Ok(entries);
        }

        entries.push(String::from_utf16_lossy(&current));
        current.clear();
    }

    Err(MultiSzError::Unterminated {
        decoded: entries.len(),
    })
}

/// Endless unit cursor over raw memory
struct RawUnits {
    pos: *const u16,
}

impl Iterator for RawUnits {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        // SAFETY: upheld by the caller of `read_multi_sz`; the decoder stops
        // at the terminator, so no unit past it is ever read.
        unsafe {
            let unit = self.pos.read();
            self.pos = self.pos.add(1);
            Some(unit)
        }
    }
}
