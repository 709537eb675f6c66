//! Masked pattern scanning

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Pattern;

/// A half-open byte range `[start, end)` where a pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Occurrence {
    pub start: usize,
    pub end: usize,
}

impl Occurrence {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn overlaps(&self, other: &Occurrence) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Lazy iterator over every offset where a pattern matches.
///
/// Overlapping matches are all reported.
pub struct Matches<'a> {
    haystack: &'a [u8],
    pattern: &'a Pattern,
    anchor: Option<(usize, u8)>,
    pos: usize,
}

impl<'a> Matches<'a> {
    pub fn new(haystack: &'a [u8], pattern: &'a Pattern) -> Self {
        Self {
            haystack,
            pattern,
            anchor: pattern.anchor(),
            pos: 0,
        }
    }

    fn last_start(&self) -> Option<usize> {
        if self.pattern.is_empty() {
            return None;
        }
        self.haystack.len().checked_sub(self.pattern.len())
    }
}

impl Iterator for Matches<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        let last = self.last_start()?;
        let len = self.pattern.len();

        while self.pos <= last {
            let start = match self.anchor {
                Some((index, byte)) => {
                    let window = &self.haystack[self.pos + index..=last + index];
                    match memchr::memchr(byte, window) {
                        Some(found) => self.pos + found,
                        None => {
                            self.pos = last + 1;
                            return None;
                        }
                    }
                }
                None => self.pos,
            };

            self.pos = start + 1;
            if self.pattern.matches(&self.haystack[start..start + len]) {
                return Some(Occurrence {
                    start,
                    end: start + len,
                });
            }
        }

        None
    }
}

/// Find every occurrence of `pattern` in `buffer`.
pub fn find_all(buffer: &[u8], pattern: &Pattern) -> Vec<Occurrence> {
    Matches::new(buffer, pattern).collect()
}
