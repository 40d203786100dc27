//! Core bytecode structures plus a compact binary image (`LOXC`).
//!
//! A [`Chunk`] owns three parallel pieces of state:
//! - `code`: raw instruction bytes (opcode byte followed by its operands),
//! - `lines`: one source line **per code byte** (operands included),
//! - `constants`: the append-only constant pool indexed by `OP_CONSTANT`.
//!
//! Chunks are append-only; the only other mutation is [`Chunk::clear`].

use crate::{crc32_ieee, CoreError, CoreResult, OpCode, Value};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

use core::{fmt, ops::Range, slice};

const MAGIC: &[u8; 4] = b"LOXC";
const CHUNK_VERSION: u16 = 1;

const CONST_TAG_F64: u8 = 0x03;

/// Maximum number of constants addressable by the one-byte `OP_CONSTANT` operand.
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

/// Constant pool with stable indices (0-based).
#[derive(Debug, Clone, Default)]
pub struct ConstPool {
    values: Vec<Value>,
}

impl ConstPool {
    /// Create an empty pool.
    pub const fn new() -> Self { Self { values: Vec::new() } }

    /// Number of stored constants.
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Iterate as `(index, &Value)`.
    pub fn iter(&self) -> ConstIter<'_> { ConstIter { inner: self.values.iter().enumerate() } }

    /// Lookup a constant by index.
    pub fn get(&self, idx: usize) -> Option<Value> { self.values.get(idx).copied() }

    /// Read-only view of the stored values.
    pub fn as_slice(&self) -> &[Value] { &self.values }

    fn add(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    fn clear(&mut self) { self.values.clear(); }
}

// Bitwise comparison so that NaN constants compare equal to themselves.
impl PartialEq for ConstPool {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.as_number().to_bits() == b.as_number().to_bits())
    }
}

/// Iterator returned by [`ConstPool::iter`].
pub struct ConstIter<'a> {
    inner: core::iter::Enumerate<slice::Iter<'a, Value>>,
}

impl<'a> Iterator for ConstIter<'a> {
    type Item = (usize, &'a Value);

    fn next(&mut self) -> Option<Self::Item> { self.inner.next() }
}

impl<'a> IntoIterator for &'a ConstPool {
    type Item = (usize, &'a Value);
    type IntoIter = ConstIter<'a>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// Line table (code offset → source line), one entry per code byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    lines: Vec<u32>,
}

impl LineTable {
    /// Create an empty line table.
    pub const fn new() -> Self { Self { lines: Vec::new() } }
    /// Number of stored line entries.
    pub fn len(&self) -> usize { self.lines.len() }
    /// Whether no line was recorded.
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    /// Resolve the source line associated with a code offset.
    pub fn line_for_offset(&self, offset: usize) -> Option<u32> { self.lines.get(offset).copied() }
    /// Iterate over contiguous ranges of the same line number.
    pub fn iter_ranges(&self) -> LineRangeIter<'_> { LineRangeIter { lines: &self.lines, index: 0 } }
    /// Read-only view of the raw entries.
    pub fn as_slice(&self) -> &[u32] { &self.lines }
    fn push(&mut self, line: u32) { self.lines.push(line); }
    fn clear(&mut self) { self.lines.clear(); }
}

/// Iterator yielding contiguous line ranges `(start..end, line)`.
pub struct LineRangeIter<'a> {
    lines: &'a [u32],
    index: usize,
}

impl Iterator for LineRangeIter<'_> {
    type Item = (Range<usize>, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.index;
        let line = *self.lines.get(start)?;
        self.index += 1;
        while self.lines.get(self.index) == Some(&line) {
            self.index += 1;
        }
        Some((start..self.index, line))
    }
}

/// Errors returned when decoding a binary chunk image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// Binary payload does not match the expected chunk layout.
    Format(&'static str),
    /// CRC32 mismatch detected while decoding a payload.
    HashMismatch {
        /// CRC32 recomputed from the payload.
        expected: u32,
        /// CRC32 value read from the payload.
        found: u32,
    },
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::Format(msg) => write!(f, "format error: {msg}"),
            ChunkError::HashMismatch { expected, found } => write!(
                f,
                "hash mismatch (crc32): expected=0x{expected:08X}, found=0x{found:08X}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ChunkError {}

/// Bytecode chunk: instruction bytes, per-byte line table and constant pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    lines: LineTable,
    constants: ConstPool,
}

impl Chunk {
    /// Create an empty chunk.
    pub const fn new() -> Self {
        Self { code: Vec::new(), lines: LineTable::new(), constants: ConstPool::new() }
    }

    /// Append one instruction byte and the source line that produced it.
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append an opcode byte.
    pub fn write_op(&mut self, op: OpCode, line: u32) { self.write(op.into(), line); }

    /// Append a constant and return its index.
    ///
    /// Fails once [`MAX_CONSTANTS`] entries are stored: the index must fit
    /// the one-byte operand of `OP_CONSTANT`.
    pub fn add_constant(&mut self, value: Value) -> CoreResult<u8> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(CoreError::TooManyConstants { limit: MAX_CONSTANTS });
        }
        let idx = self.constants.add(value);
        u8::try_from(idx).map_err(|_| CoreError::TooManyConstants { limit: MAX_CONSTANTS })
    }

    /// Add `value` to the pool and emit `OP_CONSTANT idx` on `line`.
    pub fn write_constant(&mut self, value: Value, line: u32) -> CoreResult<u8> {
        let idx = self.add_constant(value)?;
        self.write_op(OpCode::Constant, line);
        self.write(idx, line);
        Ok(idx)
    }

    /// Reset code, lines and constants; the chunk can be refilled.
    pub fn clear(&mut self) {
        self.code.clear();
        self.lines.clear();
        self.constants.clear();
    }

    /// Instruction bytes.
    pub fn code(&self) -> &[u8] { &self.code }

    /// Line table (same length as [`Chunk::code`]).
    pub fn lines(&self) -> &LineTable { &self.lines }

    /// Constant pool.
    pub fn constants(&self) -> &ConstPool { &self.constants }

    /// Number of code bytes.
    pub fn len(&self) -> usize { self.code.len() }

    /// True if no byte was written.
    pub fn is_empty(&self) -> bool { self.code.is_empty() }

    /// Encode the chunk to a compact binary payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.code.len() * 5 + self.constants.len() * 9);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&CHUNK_VERSION.to_le_bytes());

        write_len(&mut out, self.constants.len());
        for value in self.constants.as_slice() {
            match value {
                Value::Number(n) => {
                    out.push(CONST_TAG_F64);
                    out.extend_from_slice(&n.to_le_bytes());
                }
            }
        }

        write_len(&mut out, self.code.len());
        out.extend_from_slice(&self.code);
        for line in self.lines.as_slice() {
            out.extend_from_slice(&line.to_le_bytes());
        }

        let crc = crc32_ieee(&out);
        out.extend_from_slice(&crc.to_le_bytes());
        out
    }

    /// Decode a chunk from [`Chunk::to_bytes`] output.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ChunkError> {
        if data.len() < MAGIC.len() + 2 + 4 + 4 + 4 {
            return Err(ChunkError::Format("too short"));
        }

        let (payload, crc_bytes) = data.split_at(data.len() - 4);
        let found = read_u32(crc_bytes, &mut 0)?;
        let expected = crc32_ieee(payload);
        if expected != found {
            return Err(ChunkError::HashMismatch { expected, found });
        }

        if &payload[..MAGIC.len()] != MAGIC {
            return Err(ChunkError::Format("bad magic"));
        }
        let mut off = MAGIC.len();

        let version = read_u16(payload, &mut off)?;
        if version != CHUNK_VERSION {
            return Err(ChunkError::Format("unsupported version"));
        }

        let mut chunk = Self::new();

        let const_count = read_u32(payload, &mut off)? as usize;
        if const_count > MAX_CONSTANTS {
            return Err(ChunkError::Format("too many constants"));
        }
        for _ in 0..const_count {
            let value = match read_u8(payload, &mut off)? {
                CONST_TAG_F64 => Value::Number(f64::from_bits(read_u64(payload, &mut off)?)),
                _ => return Err(ChunkError::Format("unknown const tag")),
            };
            chunk.constants.add(value);
        }

        let code_len = read_u32(payload, &mut off)? as usize;
        chunk.code.extend_from_slice(read_exact(payload, &mut off, code_len)?);
        for _ in 0..code_len {
            chunk.lines.push(read_u32(payload, &mut off)?);
        }

        if off != payload.len() {
            return Err(ChunkError::Format("trailing bytes"));
        }

        Ok(chunk)
    }
}

fn write_len(buf: &mut Vec<u8>, len: usize) {
    // Les tailles sont bornées par la mémoire ; u32 suffit pour le format.
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    buf.extend_from_slice(&len.to_le_bytes());
}

fn read_u8(data: &[u8], off: &mut usize) -> Result<u8, ChunkError> {
    let v = *data.get(*off).ok_or(ChunkError::Format("u8 eof"))?;
    *off += 1;
    Ok(v)
}

fn read_u16(data: &[u8], off: &mut usize) -> Result<u16, ChunkError> {
    let bytes = read_exact(data, off, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], off: &mut usize) -> Result<u32, ChunkError> {
    let bytes = read_exact(data, off, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_u64(data: &[u8], off: &mut usize) -> Result<u64, ChunkError> {
    let bytes = read_exact(data, off, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok(u64::from_le_bytes(raw))
}

fn read_exact<'a>(data: &'a [u8], off: &mut usize, len: usize) -> Result<&'a [u8], ChunkError> {
    let end = off.checked_add(len).ok_or(ChunkError::Format("overflow"))?;
    let slice = data.get(*off..end).ok_or(ChunkError::Format("slice eof"))?;
    *off = end;
    Ok(slice)
}
