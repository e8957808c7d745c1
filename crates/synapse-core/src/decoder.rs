//! Instruction decoder for the RV32IM subset.
//!
//! Decoding runs every cycle on the fetched word; there is no decode cache.
//! The decoder classifies the word against [`OPCODE_ENCODING_TABLE`], pulls
//! out register fields and assembles the sign-extended immediate for the
//! instruction's format.
//!
//! [`OPCODE_ENCODING_TABLE`]: crate::encoding::OPCODE_ENCODING_TABLE

use crate::encoding::{classify_opcode, InstructionFields, InstructionFormat, OpcodeEncoding};
use crate::{AluOp, FaultCode, Gpr};

/// Where the ALU's second operand comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandSource {
    /// Value of `rs2`.
    Register,
    /// Sign-extended immediate.
    Immediate,
}

/// Decoded instruction with all fields extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Raw word the instruction was decoded from.
    pub raw: u32,
    /// Classified instruction.
    pub encoding: OpcodeEncoding,
    /// Destination register, for formats that write one.
    pub rd: Option<Gpr>,
    /// First source register.
    pub rs1: Option<Gpr>,
    /// Second source register.
    pub rs2: Option<Gpr>,
    /// Sign-extended immediate as raw bits.
    pub immediate: Option<u32>,
    /// ALU operation, absent for branches and jumps.
    pub alu_op: Option<AluOp>,
    /// Second ALU operand selection.
    pub operand_source: OperandSource,
}

impl DecodedInstruction {
    /// Immediate reinterpreted as a signed value (0 when absent).
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn signed_immediate(&self) -> i32 {
        match self.immediate {
            Some(imm) => imm as i32,
            None => 0,
        }
    }
}

/// Result of decoding an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedOrFault {
    /// Successfully decoded instruction.
    Instruction(DecodedInstruction),
    /// Decoding failed with a fault.
    Fault(FaultCode),
}

impl DecodedOrFault {
    /// Returns the decoded instruction if present.
    #[must_use]
    pub const fn instruction(self) -> Option<DecodedInstruction> {
        match self {
            Self::Instruction(i) => Some(i),
            Self::Fault(_) => None,
        }
    }

    /// Returns the fault if decoding failed.
    #[must_use]
    pub const fn fault(self) -> Option<FaultCode> {
        match self {
            Self::Instruction(_) => None,
            Self::Fault(f) => Some(f),
        }
    }
}

impl From<DecodedOrFault> for Result<DecodedInstruction, FaultCode> {
    fn from(value: DecodedOrFault) -> Self {
        match value {
            DecodedOrFault::Instruction(i) => Ok(i),
            DecodedOrFault::Fault(f) => Err(f),
        }
    }
}

/// Sign-extended I-type immediate (bits 31..20).
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn immediate_i(word: u32) -> u32 {
    ((word as i32) >> 20) as u32
}

/// Sign-extended S-type immediate (bits 31..25 and 11..7).
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn immediate_s(word: u32) -> u32 {
    ((((word as i32) >> 25) << 5) as u32) | ((word >> 7) & 0x1F)
}

/// Sign-extended B-type immediate; always even.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn immediate_b(word: u32) -> u32 {
    let sign = (((word as i32) >> 31) << 12) as u32;
    sign | ((word & 0x80) << 4) | ((word >> 20) & 0x7E0) | ((word >> 7) & 0x1E)
}

/// U-type immediate: bits 31..12 in place, low twelve bits zero.
#[must_use]
pub const fn immediate_u(word: u32) -> u32 {
    word & 0xFFFF_F000
}

/// Sign-extended J-type immediate; always even.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn immediate_j(word: u32) -> u32 {
    let sign = (((word as i32) >> 31) << 20) as u32;
    sign | (word & 0x000F_F000) | ((word >> 9) & 0x800) | ((word >> 20) & 0x7FE)
}

/// Instruction decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes a 32-bit instruction word.
    ///
    /// Anything outside the modeled instruction set, including the all-zero
    /// word, yields [`FaultCode::IllegalEncoding`].
    #[must_use]
    pub fn decode(word: u32) -> DecodedOrFault {
        let fields = InstructionFields::from_word(word);
        let Some(encoding) = classify_opcode(fields.opcode, fields.funct3, fields.funct7) else {
            return DecodedOrFault::Fault(FaultCode::IllegalEncoding);
        };

        let rd = Gpr::from_u5(u32::from(fields.rd));
        let rs1 = Gpr::from_u5(u32::from(fields.rs1));
        let rs2 = Gpr::from_u5(u32::from(fields.rs2));

        let (rd, rs1, rs2, immediate, operand_source) = match encoding.format() {
            InstructionFormat::R => (Some(rd), Some(rs1), Some(rs2), None, OperandSource::Register),
            InstructionFormat::I => {
                let imm = if encoding.is_immediate_shift() {
                    u32::from(fields.rs2)
                } else {
                    immediate_i(word)
                };
                (Some(rd), Some(rs1), None, Some(imm), OperandSource::Immediate)
            }
            InstructionFormat::S => (
                None,
                Some(rs1),
                Some(rs2),
                Some(immediate_s(word)),
                OperandSource::Immediate,
            ),
            InstructionFormat::B => (
                None,
                Some(rs1),
                Some(rs2),
                Some(immediate_b(word)),
                OperandSource::Register,
            ),
            InstructionFormat::U => (
                Some(rd),
                None,
                None,
                Some(immediate_u(word)),
                OperandSource::Immediate,
            ),
            InstructionFormat::J => (
                Some(rd),
                None,
                None,
                Some(immediate_j(word)),
                OperandSource::Immediate,
            ),
        };

        DecodedOrFault::Instruction(DecodedInstruction {
            raw: word,
            encoding,
            rd,
            rs1,
            rs2,
            immediate,
            alu_op: encoding.alu_op(),
            operand_source,
        })
    }
}
