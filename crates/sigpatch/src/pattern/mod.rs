//! Masked byte patterns
//!
//! A [`Pattern`] is a byte sequence paired with a mask of the same length.
//! Mask bits set to 1 must match exactly; bits set to 0 are wildcards.
//!
//! The text form is a whitespace-separated list of tokens:
//!
//! | Token      | Pattern  | Mask   |
//! |------------|----------|--------|
//! | `??`, `?`  | `00`     | `00`   |
//! | `?X`       | `0X`     | `0F`   |
//! | `X?`       | `X0`     | `F0`   |
//! | `XY`       | `XY`     | `FF`   |
//! | `1?0?????` | per bit  | per bit|

mod compose;
mod matcher;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use compose::compose;
pub use matcher::{Matches, Occurrence, find_all};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    bytes: Vec<u8>,
    mask: Vec<u8>,
}

impl Pattern {
    /// Build a pattern from raw bytes and mask.
    ///
    /// Bits not covered by the mask are cleared from `bytes`.
    pub fn new(bytes: Vec<u8>, mask: Vec<u8>) -> Result<Self> {
        if bytes.len() != mask.len() {
            return Err(Error::LengthMismatch {
                expected: bytes.len(),
                actual: mask.len(),
            });
        }
        let bytes = bytes.iter().zip(&mask).map(|(b, m)| b & m).collect();
        Ok(Self { bytes, mask })
    }

    /// A fully specified pattern (every mask byte `0xFF`).
    pub fn exact(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            mask: vec![0xFF; bytes.len()],
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Test the pattern against a window of exactly `self.len()` bytes.
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() == self.len()
            && window
                .iter()
                .zip(&self.mask)
                .zip(&self.bytes)
                .all(|((b, m), p)| b & m == *p)
    }

    /// First fully specified byte, used to anchor the scan.
    pub(crate) fn anchor(&self) -> Option<(usize, u8)> {
        self.mask
            .iter()
            .position(|&m| m == 0xFF)
            .map(|i| (i, self.bytes[i]))
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        compile(s)
    }
}

impl TryFrom<String> for Pattern {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        compile(&value)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        format(&pattern)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self))
    }
}

/// Compile signature text into a [`Pattern`].
pub fn compile(text: &str) -> Result<Pattern> {
    let mut bytes = Vec::new();
    let mut mask = Vec::new();

    for (index, token) in text.split_whitespace().enumerate() {
        let (byte, bits) = compile_token(token, index)?;
        bytes.push(byte);
        mask.push(bits);
    }

    Ok(Pattern { bytes, mask })
}

fn compile_token(token: &str, index: usize) -> Result<(u8, u8)> {
    let chars: Vec<char> = token.chars().collect();
    match chars.as_slice() {
        ['?'] | ['?', '?'] => Ok((0x00, 0x00)),
        ['?', lo] => {
            let lo = hex_digit(*lo).ok_or_else(|| Error::compile(token, index, "not a hex digit"))?;
            Ok((lo, 0x0F))
        }
        [hi, '?'] => {
            let hi = hex_digit(*hi).ok_or_else(|| Error::compile(token, index, "not a hex digit"))?;
            Ok((hi << 4, 0xF0))
        }
        [hi, lo] => match (hex_digit(*hi), hex_digit(*lo)) {
            (Some(hi), Some(lo)) => Ok(((hi << 4) | lo, 0xFF)),
            _ => Err(Error::compile(token, index, "not a hex byte")),
        },
        bits if bits.len() == 8 => {
            let mut byte = 0u8;
            let mut mask = 0u8;
            for &c in bits {
                byte <<= 1;
                mask <<= 1;
                match c {
                    '0' => mask |= 1,
                    '1' => {
                        byte |= 1;
                        mask |= 1;
                    }
                    '?' => {}
                    _ => return Err(Error::compile(token, index, "binary token must use 0, 1 or ?")),
                }
            }
            Ok((byte, mask))
        }
        _ => Err(Error::compile(
            token,
            index,
            format!("unsupported token length {}", chars.len()),
        )),
    }
}

fn hex_digit(c: char) -> Option<u8> {
    c.to_digit(16).map(|d| d as u8)
}

/// Render a pattern back to its canonical text form.
pub fn format(pattern: &Pattern) -> String {
    pattern
        .bytes
        .iter()
        .zip(&pattern.mask)
        .map(|(&b, &m)| match m {
            0xFF => format!("{:02X}", b),
            0x00 => "??".to_string(),
            0xF0 => format!("{:X}?", b >> 4),
            0x0F => format!("?{:X}", b & 0x0F),
            _ => (0..8)
                .rev()
                .map(|bit| match (m >> bit & 1, b >> bit & 1) {
                    (0, _) => '?',
                    (_, 1) => '1',
                    _ => '0',
                })
                .collect(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
