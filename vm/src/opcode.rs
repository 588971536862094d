//! OpCode definitions for the Tidal VM
//!
//! Only the instructions shared with the operator and call-lowering core
//! live here. Instructions are encoded as 32-bit values:
//!
//! Format ABC: [8-bit opcode][8-bit A][8-bit B][8-bit C]
//!
//! Register-based instructions use A, B, C as register indices (0-255).

use std::fmt;

/// Virtual machine instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    // ===== Arithmetic =====
    /// Addition: R[A] = R[B] + R[C]
    Add = 10,
    /// Subtraction: R[A] = R[B] - R[C]
    Sub = 11,
    /// Multiplication: R[A] = R[B] * R[C]
    Mul = 12,
    /// Division: R[A] = R[B] / R[C]
    Div = 13,
    /// Floored modulo: R[A] = R[B] % R[C]
    Mod = 14,
    /// Truncating integer division: R[A] = R[B] // R[C]
    IDiv = 15,
    /// Negation: R[A] = -R[B]
    Unm = 16,

    // ===== Comparison =====
    /// Less Than or Equal: R[A] = R[B] <= R[C]
    Le = 24,

    // ===== Functions =====
    /// Return: return R[A]..R[A+B-2]
    Return = 54,
    /// Call: R[A]..R[A+C-2] = R[A](R[A+1]..R[A+B-1])
    Call = 55,
    /// Fast call: try builtin A on the operands of the CALL found C
    /// instructions ahead (0 when adjacent). On success execution resumes
    /// after that CALL, otherwise it falls through to the generic path.
    FastCall = 57,

    // ===== Special =====
    /// No operation
    Nop = 255,
}

impl OpCode {
    /// Get opcode from byte value
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            10 => Some(OpCode::Add),
            11 => Some(OpCode::Sub),
            12 => Some(OpCode::Mul),
            13 => Some(OpCode::Div),
            14 => Some(OpCode::Mod),
            15 => Some(OpCode::IDiv),
            16 => Some(OpCode::Unm),
            24 => Some(OpCode::Le),
            54 => Some(OpCode::Return),
            55 => Some(OpCode::Call),
            57 => Some(OpCode::FastCall),
            255 => Some(OpCode::Nop),
            _ => None,
        }
    }

    /// Convert opcode to byte value
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",
            OpCode::IDiv => "IDIV",
            OpCode::Unm => "UNM",
            OpCode::Le => "LE",
            OpCode::Return => "RETURN",
            OpCode::Call => "CALL",
            OpCode::FastCall => "FASTCALL",
            OpCode::Nop => "NOP",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Instruction encoding/decoding utilities
pub mod instruction {
    /// Encode instruction in ABC format
    #[inline]
    pub fn encode_abc(opcode: u8, a: u8, b: u8, c: u8) -> u32 {
        ((opcode as u32) << 24) | ((a as u32) << 16) | ((b as u32) << 8) | (c as u32)
    }

    /// Decode instruction opcode
    #[inline]
    pub fn decode_opcode(instruction: u32) -> u8 {
        (instruction >> 24) as u8
    }

    /// Decode A operand
    #[inline]
    pub fn decode_a(instruction: u32) -> u8 {
        ((instruction >> 16) & 0xFF) as u8
    }

    /// Decode B operand
    #[inline]
    pub fn decode_b(instruction: u32) -> u8 {
        ((instruction >> 8) & 0xFF) as u8
    }

    /// Decode C operand
    #[inline]
    pub fn decode_c(instruction: u32) -> u8 {
        (instruction & 0xFF) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use instruction::*;

    #[test]
    fn test_opcode_conversion() {
        assert_eq!(OpCode::Add.as_u8(), 10);
        assert_eq!(OpCode::from_u8(10), Some(OpCode::Add));
        assert_eq!(OpCode::from_u8(57), Some(OpCode::FastCall));
        assert_eq!(OpCode::from_u8(255), Some(OpCode::Nop));
        assert_eq!(OpCode::from_u8(205), None); // 205 is not assigned
    }

    #[test]
    fn test_instruction_encoding() {
        let inst = encode_abc(OpCode::FastCall.as_u8(), 25, 0, 1);
        assert_eq!(decode_opcode(inst), OpCode::FastCall.as_u8());
        assert_eq!(decode_a(inst), 25);
        assert_eq!(decode_b(inst), 0);
        assert_eq!(decode_c(inst), 1);
    }
}
