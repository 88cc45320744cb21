//! Per-fragment side channel for values that do not fit in a data word
//!
//! The transform codec produces field values (65536) that a 16-bit word
//! cannot carry. Encode records which lanes held them, keyed by the byte
//! offset of the word and the fragment index; decode reads the record back.
//! Callers store one [`Properties`] per fragment and hand it back unchanged.
//!
//! The text form is one `offset:index=value` line per entry, sorted.

use crate::error::FecError;
use rustc_hash::FxHashMap as HashMap;
use std::fmt;
use std::str::FromStr;

/// Position of a word: byte offset within the fragment and fragment index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueLocation {
    pub offset: u64,
    pub index: usize,
}

impl ValueLocation {
    pub fn new(offset: u64, index: usize) -> Self {
        Self { offset, index }
    }
}

impl fmt::Display for ValueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.offset, self.index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<ValueLocation, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `loc`, replacing any previous value
    pub fn add(&mut self, loc: ValueLocation, value: impl Into<String>) {
        self.entries.insert(loc, value.into());
    }

    pub fn get(&self, loc: ValueLocation) -> Option<&str> {
        self.entries.get(&loc).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by location
    pub fn sorted(&self) -> Vec<(ValueLocation, &str)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(loc, v)| (*loc, v.as_str()))
            .collect();
        entries.sort_unstable_by_key(|(loc, _)| *loc);
        entries
    }

    /// Move every entry of `other` into `self`
    pub fn merge(&mut self, other: Properties) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (loc, value) in self.sorted() {
            writeln!(f, "{}={}", loc, value)?;
        }
        Ok(())
    }
}

impl FromStr for Properties {
    type Err = FecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut props = Properties::new();
        for (line_no, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let bad = || {
                FecError::invalid(format!(
                    "malformed property on line {}: {:?}",
                    line_no + 1,
                    line
                ))
            };
            let (loc, value) = line.split_once('=').ok_or_else(bad)?;
            let (offset, index) = loc.split_once(':').ok_or_else(bad)?;
            let offset = offset.parse().map_err(|_| bad())?;
            let index = index.parse().map_err(|_| bad())?;
            props.add(ValueLocation::new(offset, index), value);
        }
        Ok(props)
    }
}
