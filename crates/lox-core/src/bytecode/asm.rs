//! Tiny text assembler for hand-written programs.
//!
//! Until a compiler produces chunks, programs are written one instruction
//! per line:
//!
//! ```text
//! ; -((1.2 + 3.4) / 5.6)
//! CONSTANT 1.2
//! CONSTANT 3.4
//! ADD
//! CONSTANT 5.6
//! DIVIDE
//! NEGATE
//! RETURN
//! ```
//!
//! - mnemonics are case-insensitive, the `OP_` prefix is optional;
//! - `;` starts a comment (whole line or trailing);
//! - the 1-based text line becomes the source line of every emitted byte.

use crate::{bytecode::chunk::Chunk, CoreError, CoreResult, OpCode, Value};

#[cfg(not(feature = "std"))]
use alloc::format;
#[cfg(feature = "std")]
use std::format;

/// Assemble a source snippet into a [`Chunk`].
pub fn assemble(source: &str) -> CoreResult<Chunk> {
    let mut chunk = Chunk::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let line = raw_line.split(';').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let mnemonic = parts.next().unwrap_or_default();
        let operand = parts.next();
        if let Some(extra) = parts.next() {
            return Err(CoreError::assembly(line_no, format!("unexpected token `{extra}`")));
        }

        let op = OpCode::from_mnemonic(mnemonic).ok_or_else(|| {
            CoreError::assembly(line_no, format!("unknown instruction `{mnemonic}`"))
        })?;

        match (op, operand) {
            (OpCode::Constant, Some(literal)) => {
                let value = parse_number(literal, line_no)?;
                chunk.write_constant(value, line_no)?;
            }
            (OpCode::Constant, None) => {
                return Err(CoreError::assembly(line_no, "CONSTANT expects a number"));
            }
            (_, Some(literal)) => {
                return Err(CoreError::assembly(
                    line_no,
                    format!("{} takes no operand, got `{literal}`", op.mnemonic()),
                ));
            }
            (_, None) => chunk.write_op(op, line_no),
        }
    }

    Ok(chunk)
}

fn parse_number(literal: &str, line: u32) -> CoreResult<Value> {
    literal
        .parse::<f64>()
        .map(Value::Number)
        .map_err(|_| CoreError::assembly(line, format!("invalid number `{literal}`")))
}
