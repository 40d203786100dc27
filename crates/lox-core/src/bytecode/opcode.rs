//! Opcode set of the lox bytecode.
//!
//! Each instruction is one opcode byte followed by `operand_len()` operand
//! bytes. Discriminants are part of the binary image format.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Instruction tags.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OpCode {
    /// Push `constants[operand]` (one-byte operand).
    Constant = 0x00,
    /// `a + b`
    Add = 0x01,
    /// `a - b`
    Subtract = 0x02,
    /// `a * b`
    Multiply = 0x03,
    /// `a / b` (IEEE, no trap on zero)
    Divide = 0x04,
    /// `-a`
    Negate = 0x05,
    /// Pop and emit the result, end of execution.
    Return = 0x06,
}

impl OpCode {
    /// Every opcode, in discriminant order.
    pub const ALL: [OpCode; 7] = [
        OpCode::Constant,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Negate,
        OpCode::Return,
    ];

    /// Mnemonic printed by the disassembler.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Return => "OP_RETURN",
        }
    }

    /// Number of operand bytes following the opcode byte.
    pub const fn operand_len(self) -> usize {
        match self {
            OpCode::Constant => 1,
            OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide
            | OpCode::Negate
            | OpCode::Return => 0,
        }
    }

    /// Total encoded width (opcode + operands).
    pub const fn width(self) -> usize { 1 + self.operand_len() }

    /// Lookup by mnemonic, case-insensitive, `OP_` prefix optional.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let bare = upper.strip_prefix("OP_").unwrap_or(upper.as_str());
        Self::ALL.into_iter().find(|op| &op.mnemonic()[3..] == bare)
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op as u8 }
}

impl TryFrom<u8> for OpCode {
    /// The unrecognised byte.
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(OpCode::Constant),
            0x01 => Ok(OpCode::Add),
            0x02 => Ok(OpCode::Subtract),
            0x03 => Ok(OpCode::Multiply),
            0x04 => Ok(OpCode::Divide),
            0x05 => Ok(OpCode::Negate),
            0x06 => Ok(OpCode::Return),
            other => Err(other),
        }
    }
}
