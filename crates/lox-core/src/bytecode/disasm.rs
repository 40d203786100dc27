//! Textual disassembly of a [`Chunk`].
//!
//! Output format, one line per instruction:
//!
//! ```text
//! == test chunk ==
//! 0000  123 OP_CONSTANT         0 '1.2'
//! 0002    | OP_RETURN
//! ```
//!
//! Disassembly is read-only and fail-soft: unknown opcodes and truncated
//! operands are reported inline and the walk continues.

use crate::bytecode::chunk::{Chunk, ConstPool};
use crate::OpCode;

#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(feature = "std")]
use std::string::String;

use core::fmt::Write;

/// Disassemble a whole chunk under a `== name ==` header.
pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Render the instruction at `offset` into `out`; returns the next offset.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut impl Write) -> usize {
    let code = chunk.code();
    let lines = chunk.lines();

    let _ = write!(out, "{offset:04} ");
    let line = lines.line_for_offset(offset);
    if offset > 0 && line == lines.line_for_offset(offset - 1) {
        let _ = write!(out, "   | ");
    } else {
        let _ = write!(out, "{:4} ", line.unwrap_or_default());
    }

    let Some(&byte) = code.get(offset) else {
        let _ = writeln!(out, "<end of code>");
        return code.len();
    };

    match OpCode::try_from(byte) {
        Ok(op @ OpCode::Constant) => constant_instruction(op, chunk, offset, out),
        Ok(op) => simple_instruction(op, offset, out),
        Err(unknown) => {
            let _ = writeln!(out, "Unknown opcode: {unknown}");
            offset + 1
        }
    }
}

fn simple_instruction(op: OpCode, offset: usize, out: &mut impl Write) -> usize {
    let _ = writeln!(out, "{}", op.mnemonic());
    offset + 1
}

fn constant_instruction(op: OpCode, chunk: &Chunk, offset: usize, out: &mut impl Write) -> usize {
    let Some(&index) = chunk.code().get(offset + 1) else {
        let _ = writeln!(out, "{:<16} <truncated>", op.mnemonic());
        return chunk.len();
    };
    let _ = write!(out, "{:<16} {index:4} ", op.mnemonic());
    match chunk.constants().get(usize::from(index)) {
        Some(value) => {
            let _ = writeln!(out, "'{value}'");
        }
        None => {
            let _ = writeln!(out, "'<invalid>'");
        }
    }
    offset + op.width()
}

/// Verbose variant: summary header, constant table, then the instructions.
pub fn disassemble_full(chunk: &Chunk, title: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        ";; {title}: {} bytes, {} constants",
        chunk.len(),
        chunk.constants().len()
    );
    if !chunk.constants().is_empty() {
        let _ = writeln!(out, ";; constants");
        write_constants(chunk.constants(), &mut out);
    }
    out.push_str(&disassemble(chunk, title));
    out
}

fn write_constants(pool: &ConstPool, out: &mut String) {
    for (idx, value) in pool {
        let _ = writeln!(out, "const[{idx:04}] = {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_constant_listing() {
        let mut chunk = Chunk::new();
        let constant = chunk.add_constant(Value::Number(1.2)).unwrap();
        chunk.write_op(OpCode::Constant, 123);
        chunk.write(constant, 123);
        chunk.write_op(OpCode::Return, 123);

        assert_eq!(
            disassemble(&chunk, "test chunk"),
            "== test chunk ==\n\
             0000  123 OP_CONSTANT         0 '1.2'\n\
             0002    | OP_RETURN\n"
        );
    }

    #[test]
    fn arithmetic_program_listing() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Number(1.2), 1).unwrap();
        chunk.write_constant(Value::Number(3.4), 1).unwrap();
        chunk.write_op(OpCode::Add, 1);
        chunk.write_constant(Value::Number(5.6), 2).unwrap();
        chunk.write_op(OpCode::Divide, 2);
        chunk.write_op(OpCode::Negate, 2);
        chunk.write_op(OpCode::Return, 3);

        let expected = "\
== expr ==
0000    1 OP_CONSTANT         0 '1.2'
0002    | OP_CONSTANT         1 '3.4'
0004    | OP_ADD
0005    2 OP_CONSTANT         2 '5.6'
0007    | OP_DIVIDE
0008    | OP_NEGATE
0009    3 OP_RETURN
";
        assert_eq!(disassemble(&chunk, "expr"), expected);
    }

    #[test]
    fn unknown_opcode_is_fail_soft() {
        let mut chunk = Chunk::new();
        chunk.write(0xEE, 7);
        chunk.write_op(OpCode::Return, 8);
        assert_eq!(
            disassemble(&chunk, "junk"),
            "== junk ==\n0000    7 Unknown opcode: 238\n0001    8 OP_RETURN\n"
        );
    }

    #[test]
    fn truncated_and_dangling_constants() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(9, 1);
        chunk.write_op(OpCode::Constant, 2);
        assert_eq!(
            disassemble(&chunk, "bad"),
            "== bad ==\n\
             0000    1 OP_CONSTANT         9 '<invalid>'\n\
             0002    2 OP_CONSTANT      <truncated>\n"
        );
    }

    #[test]
    fn next_offset_follows_instruction_width() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Number(2.0), 1).unwrap();
        chunk.write_op(OpCode::Negate, 1);
        let mut sink = String::new();
        assert_eq!(disassemble_instruction(&chunk, 0, &mut sink), 2);
        assert_eq!(disassemble_instruction(&chunk, 2, &mut sink), 3);
    }

    #[test]
    fn full_listing_has_constant_table() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Number(0.5), 1).unwrap();
        chunk.write_op(OpCode::Return, 1);
        let text = disassemble_full(&chunk, "main");
        assert!(text.starts_with(";; main: 3 bytes, 1 constants\n;; constants\nconst[0000] = 0.5\n== main ==\n"));
    }
}
