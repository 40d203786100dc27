//! Bytecode helpers: chunk structure, opcodes, disassembler and tiny assembler.

pub mod asm;
pub mod chunk;
pub mod disasm;
pub mod helpers;
pub mod opcode;

pub use chunk::{Chunk, ChunkError, ConstPool, LineTable};
pub use opcode::OpCode;
