//! Wildcard-aware replacement composition

use crate::error::{Error, Result};

use super::Pattern;

/// Merge a replacement pattern with the bytes currently at an occurrence.
///
/// Bits covered by `replace.mask()` take the replacement value; all other
/// bits keep their original value.
pub fn compose(replace: &Pattern, original: &[u8]) -> Result<Vec<u8>> {
    if original.len() != replace.len() {
        return Err(Error::LengthMismatch {
            expected: replace.len(),
            actual: original.len(),
        });
    }

    Ok(original
        .iter()
        .zip(replace.bytes())
        .zip(replace.mask())
        .map(|((&orig, &value), &mask)| match mask {
            0xFF => value,
            _ => (orig & !mask) | (value & mask),
        })
        .collect())
}
