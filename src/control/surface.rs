/*!
 * Control Surface
 * Read/write entries over a published scavenger
 */

use super::parse::parse_u64;
use super::types::{Access, ControlError, ControlResult, Entry};
use crate::memory::Scavenger;
use std::sync::Arc;
use tracing::debug;

/// Entry dispatch for one [`Scavenger`]
///
/// Only constructed from a fully built scavenger, so a partially started
/// subsystem is never reachable through it.
#[derive(Debug, Clone)]
pub struct ControlSurface {
    scavenger: Arc<Scavenger>,
    capacity: usize,
}

impl ControlSurface {
    pub fn new(scavenger: Arc<Scavenger>, capacity: usize) -> Self {
        Self {
            scavenger,
            capacity,
        }
    }

    pub fn entries(&self) -> &'static [Entry] {
        Entry::ALL
    }

    pub fn scavenger(&self) -> &Arc<Scavenger> {
        &self.scavenger
    }

    /// Render a read-only entry
    pub fn read(&self, entry: Entry) -> ControlResult<String> {
        if entry.access() != Access::ReadOnly {
            return Err(ControlError::WrongDirection { entry, op: "read" });
        }

        match entry {
            Entry::Ranges => Ok(self.scavenger.ranges_report(self.capacity)),
            Entry::HiddenBlocks => Ok(self.scavenger.hidden_blocks_report(self.capacity)),
            Entry::Stats => {
                let mut json = serde_json::to_string(&self.scavenger.stats())
                    .map_err(|e| ControlError::Serialization(e.to_string()))?;
                json.push('\n');
                Ok(json)
            }
            other => Err(ControlError::WrongDirection { entry: other, op: "read" }),
        }
    }

    /// Store `input` into a write-only entry
    ///
    /// Returns the number of input bytes consumed, which is all of them.
    pub fn write(&self, entry: Entry, input: &str) -> ControlResult<usize> {
        if entry.access() != Access::WriteOnly {
            return Err(ControlError::WrongDirection { entry, op: "written" });
        }

        let value = parse_u64(input)?;
        debug!(entry = %entry, value, "Control write");

        match entry {
            Entry::Scavenge => {
                self.scavenger.scavenge(value)?;
            }
            #[cfg(feature = "debug-probe")]
            Entry::Probe => self.scavenger.probe(value)?,
            other => return Err(ControlError::WrongDirection { entry: other, op: "written" }),
        }
        Ok(input.len())
    }

    /// Read an entry by name
    pub fn read_named(&self, name: &str) -> ControlResult<String> {
        self.read(name.parse()?)
    }

    /// Write an entry by name
    pub fn write_named(&self, name: &str, input: &str) -> ControlResult<usize> {
        self.write(name.parse()?, input)
    }
}
