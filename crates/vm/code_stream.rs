use std::{
    collections::HashSet,
    ops::{Deref, DerefMut},
};

use bytes::Bytes;
use ethereum_types::Address;

use crate::{
    coverage::CodeReads,
    opcodes::{PUSH1, PUSH32, STOP},
};

/// A forward-scanning cursor over contract bytecode.
///
/// The program counter floats free: it is not fenced into
/// `0 <= pc <= len(code)`, and consumers may reassign it between reads.
/// Setting it to a value that would make an addition overflow is a
/// programming error, as is indexing out of range with [`CodeStream::byte`].
///
/// Every byte the stream hands out is recorded in a read set, which
/// [`CodeStream::code_reads`] snapshots into per-contract coverage.
pub struct CodeStream {
    code: Bytes,
    /// Cached so the hot paths never re-ask the buffer.
    length: usize,
    pub pc: usize,
    read_positions: HashSet<usize>,
    valid_positions: HashSet<usize>,
    invalid_positions: HashSet<usize>,
    code_address: Option<Address>,
}

impl CodeStream {
    pub fn new(code: impl Into<Bytes>) -> Self {
        let code = code.into();
        let length = code.len();
        Self {
            code,
            length,
            pc: 0,
            read_positions: HashSet::new(),
            valid_positions: HashSet::new(),
            invalid_positions: HashSet::new(),
            code_address: None,
        }
    }

    pub fn with_address(code: impl Into<Bytes>, address: Address) -> Self {
        let mut stream = Self::new(code);
        stream.code_address = Some(address);
        stream
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the next `size` bytes, clamped at the end of the code, and
    /// advances the program counter past them. Every requested position is
    /// recorded, whether or not it exists.
    pub fn read(&mut self, size: usize) -> &[u8] {
        let start = self.pc;
        let target = start + size;
        for position in start..target {
            self.read_positions.insert(position);
        }
        self.pc = target;
        &self.code[start.min(self.length)..target.min(self.length)]
    }

    /// The byte at `index`. Panics when out of range; callers guarantee
    /// their indices.
    pub fn byte(&mut self, index: usize) -> u8 {
        self.read_positions.insert(index);
        self.code[index]
    }

    /// The byte at the program counter without advancing, or `STOP` past
    /// the end.
    pub fn peek(&mut self) -> u8 {
        let pc = self.pc;
        if pc < self.length {
            self.read_positions.insert(pc);
            self.code[pc]
        } else {
            STOP
        }
    }

    /// An opcode cursor starting at the current program counter. The
    /// consumer may call [`OpcodeIter::set_pc`] between yields, e.g. to hop
    /// over push-data; iteration resumes from the new position. One `STOP`
    /// sentinel is yielded after the final byte.
    pub fn opcodes(&mut self) -> OpcodeIter<'_> {
        OpcodeIter {
            stream: self,
            stop_emitted: false,
        }
    }

    /// Relocates the program counter for the lifetime of the returned guard,
    /// which restores the saved value on every exit path, unwinding
    /// included. The body may keep moving the counter; only the final value
    /// is thrown away.
    pub fn seek(&mut self, target: usize) -> SeekGuard<'_> {
        let anchor = self.pc;
        self.pc = target;
        SeekGuard {
            stream: self,
            anchor,
        }
    }

    /// Whether `position` holds an opcode rather than the data bytes of an
    /// earlier PUSH. Decisions are memoized and never change.
    pub fn is_valid_opcode(&mut self, position: usize) -> bool {
        if position >= self.length {
            return false;
        }
        if self.invalid_positions.contains(&position) {
            return false;
        }
        if self.valid_positions.contains(&position) {
            return true;
        }
        // Look back over the window a PUSH could cover, widest first since
        // PUSH32 is the most common. A PUSHk found `d` bytes back only
        // reaches this position when k >= d, and only disqualifies it when
        // that PUSH is itself an opcode rather than someone else's data.
        let deepest_lookback = position.min(32);
        for bytes_back in (1..=deepest_lookback).rev() {
            let earlier = position - bytes_back;
            let opcode = self.code[earlier];
            if opcode >= PUSH1 + (bytes_back as u8 - 1)
                && opcode <= PUSH32
                && self.is_valid_opcode(earlier)
            {
                self.invalid_positions.insert(position);
                return false;
            }
        }
        self.valid_positions.insert(position);
        true
    }

    /// Coverage snapshot for this contract, when an address is attached.
    pub fn code_reads(&self) -> Option<CodeReads> {
        self.code_address.map(|address| {
            CodeReads::new(address, self.read_positions.clone(), self.length)
        })
    }
}

/// Explicit opcode cursor handed out by [`CodeStream::opcodes`].
pub struct OpcodeIter<'a> {
    stream: &'a mut CodeStream,
    stop_emitted: bool,
}

impl OpcodeIter<'_> {
    pub fn pc(&self) -> usize {
        self.stream.pc
    }

    /// Relocates the cursor; the next yield resumes from the new position.
    pub fn set_pc(&mut self, pc: usize) {
        self.stream.pc = pc;
    }
}

impl Iterator for OpcodeIter<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let pc = self.stream.pc;
        if pc < self.stream.length {
            self.stream.read_positions.insert(pc);
            let opcode = self.stream.code[pc];
            self.stream.pc = pc + 1;
            Some(opcode)
        } else if !self.stop_emitted {
            self.stop_emitted = true;
            Some(STOP)
        } else {
            None
        }
    }
}

/// Scoped program-counter relocation; see [`CodeStream::seek`].
pub struct SeekGuard<'a> {
    stream: &'a mut CodeStream,
    anchor: usize,
}

impl Drop for SeekGuard<'_> {
    fn drop(&mut self) {
        self.stream.pc = self.anchor;
    }
}

impl Deref for SeekGuard<'_> {
    type Target = CodeStream;

    fn deref(&self) -> &CodeStream {
        self.stream
    }
}

impl DerefMut for SeekGuard<'_> {
    fn deref_mut(&mut self) -> &mut CodeStream {
        self.stream
    }
}
