//! Helper validations reused by tooling.

use crate::{bytecode::chunk::Chunk, CoreError, CoreResult, OpCode};

#[cfg(not(feature = "std"))]
use alloc::{format, vec::Vec};
#[cfg(feature = "std")]
use std::{format, vec::Vec};

/// Offsets at which instructions start, decoded the same way the VM and
/// the disassembler walk the code (unknown bytes count as one-byte
/// instructions).
pub fn instruction_offsets(chunk: &Chunk) -> Vec<usize> {
    let code = chunk.code();
    let mut offsets = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        offsets.push(offset);
        offset += OpCode::try_from(code[offset]).map_or(1, OpCode::width);
    }
    offsets
}

/// Basic structural validation of a chunk.
///
/// Checks that the line table matches the code, that every opcode is
/// known, that no operand is cut off at the end and that constant operands
/// point inside the pool.
pub fn validate_chunk(chunk: &Chunk) -> CoreResult<()> {
    let code = chunk.code();
    if code.len() != chunk.lines().len() {
        return Err(CoreError::corrupted("line/code length mismatch"));
    }

    let pool_len = chunk.constants().len();
    for offset in instruction_offsets(chunk) {
        let op = OpCode::try_from(code[offset])
            .map_err(|byte| CoreError::corrupted(format!("unknown opcode {byte} at {offset}")))?;
        if offset + op.width() > code.len() {
            return Err(CoreError::corrupted(format!(
                "{} at {offset} is missing its operand",
                op.mnemonic()
            )));
        }
        if op == OpCode::Constant {
            let ix = usize::from(code[offset + 1]);
            if ix >= pool_len {
                return Err(CoreError::corrupted(format!(
                    "op {offset} references const {ix} but pool size is {pool_len}"
                )));
            }
        }
    }

    Ok(())
}
