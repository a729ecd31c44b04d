/*!
 * Control Surface Types
 */

use crate::memory::MemoryError;
use miette::Diagnostic;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type ControlResult<T> = Result<T, ControlError>;

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ControlError {
    #[error("No such entry: {0}")]
    #[diagnostic(code(control::unknown_entry))]
    UnknownEntry(String),

    #[error("Entry {entry} cannot be {op}")]
    #[diagnostic(code(control::wrong_direction))]
    WrongDirection { entry: Entry, op: &'static str },

    #[error("Malformed request: {0}")]
    #[diagnostic(
        code(control::malformed_request),
        help("Send `read <entry>` or `write <entry> <value>`.")
    )]
    MalformedRequest(String),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(control::serialization))]
    Serialization(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Memory(#[from] MemoryError),
}

/// Entry access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
}

/// Entries published by the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    Ranges,
    HiddenBlocks,
    Scavenge,
    #[cfg(feature = "debug-probe")]
    Probe,
    Stats,
}

impl Entry {
    /// Every published entry
    pub const ALL: &'static [Entry] = &[
        #[cfg(feature = "debug-probe")]
        Entry::Probe,
        Entry::Ranges,
        Entry::Scavenge,
        Entry::HiddenBlocks,
        Entry::Stats,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Entry::Ranges => "ranges",
            Entry::HiddenBlocks => "hidden_blocks",
            Entry::Scavenge => "scavenge",
            #[cfg(feature = "debug-probe")]
            Entry::Probe => "probe",
            Entry::Stats => "stats",
        }
    }

    pub fn access(self) -> Access {
        match self {
            Entry::Ranges | Entry::HiddenBlocks | Entry::Stats => Access::ReadOnly,
            Entry::Scavenge => Access::WriteOnly,
            #[cfg(feature = "debug-probe")]
            Entry::Probe => Access::WriteOnly,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Entry {
    type Err = ControlError;

    fn from_str(s: &str) -> ControlResult<Self> {
        Entry::ALL
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| ControlError::UnknownEntry(s.to_string()))
    }
}
