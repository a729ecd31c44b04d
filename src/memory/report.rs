/*!
 * Text Reports
 *
 * Capacity-bounded listings of RAM ranges and coalesced hidden blocks.
 * Every line reads `start-end (size)` in hexadecimal.
 */

use super::types::{BlockSize, HiddenBlock, Range};
use crate::core::types::{PhysAddr, Size};
use std::fmt::{self, Write};

/// `fmt::Write` sink that silently stops at a fixed capacity
#[derive(Debug)]
pub struct BoundedWriter {
    buf: String,
    capacity: usize,
}

impl BoundedWriter {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity.min(crate::core::limits::REPORT_CAPACITY)),
            capacity,
        }
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl Write for BoundedWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.capacity.saturating_sub(self.buf.len());
        if s.len() <= room {
            self.buf.push_str(s);
        } else {
            let mut cut = room;
            while !s.is_char_boundary(cut) {
                cut -= 1;
            }
            self.buf.push_str(&s[..cut]);
        }
        Ok(())
    }
}

/// Hex with the C `%#x` convention: zero has no `0x` prefix
#[derive(Debug, Clone, Copy)]
pub struct Hex(pub u64);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            f.write_str("0")
        } else {
            write!(f, "{:#x}", self.0)
        }
    }
}

/// A run of physically contiguous hidden blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: PhysAddr,
    pub size: Size,
}

impl Run {
    pub fn end(&self) -> PhysAddr {
        self.start + (self.size - 1)
    }
}

/// Merges consecutive blocks whose addresses touch into [`Run`]s
pub struct Coalesce<I> {
    blocks: I,
    block_size: u64,
    current: Option<Run>,
}

impl<'a, I> Iterator for Coalesce<I>
where
    I: Iterator<Item = &'a HiddenBlock>,
{
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        for block in self.blocks.by_ref() {
            match self.current.as_mut() {
                None => {
                    self.current = Some(Run {
                        start: block.addr,
                        size: self.block_size,
                    });
                }
                Some(run) if run.start.checked_add(run.size) == Some(block.addr) => {
                    run.size += self.block_size;
                }
                Some(run) => {
                    let done = *run;
                    *run = Run {
                        start: block.addr,
                        size: self.block_size,
                    };
                    return Some(done);
                }
            }
        }
        self.current.take()
    }
}

/// Coalesce `blocks` (in registry order) into contiguous runs
pub fn coalesce<'a, I>(blocks: I, block_size: BlockSize) -> Coalesce<I::IntoIter>
where
    I: IntoIterator<Item = &'a HiddenBlock>,
{
    Coalesce {
        blocks: blocks.into_iter(),
        block_size: block_size.get(),
        current: None,
    }
}

fn write_line(out: &mut BoundedWriter, start: PhysAddr, end: PhysAddr, size: Size) {
    // BoundedWriter never fails.
    let _ = writeln!(out, "{}-{} ({})", Hex(start), Hex(end), Hex(size));
}

/// One line per RAM range, stopping at `capacity` bytes
pub fn ranges_report<'a, I>(ranges: I, capacity: usize) -> String
where
    I: IntoIterator<Item = &'a Range>,
{
    let mut out = BoundedWriter::new(capacity);
    for range in ranges {
        if out.is_full() {
            break;
        }
        write_line(&mut out, range.start, range.end, range.len());
    }
    out.into_string()
}

/// One line per run of contiguous hidden blocks, stopping at `capacity` bytes
pub fn hidden_blocks_report<'a, I>(blocks: I, block_size: BlockSize, capacity: usize) -> String
where
    I: IntoIterator<Item = &'a HiddenBlock>,
{
    let mut out = BoundedWriter::new(capacity);
    for run in coalesce(blocks, block_size) {
        if out.is_full() {
            break;
        }
        write_line(&mut out, run.start, run.end(), run.size);
    }
    out.into_string()
}
