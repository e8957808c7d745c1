//! Instruction encoding into standard RV32 words.
//!
//! The encoder is the inverse of `synapse_core::Decoder` for the supported
//! instruction subset. Immediates are range-checked per format instead of
//! being silently truncated.

use synapse_core::{Gpr, InstructionFormat, OpcodeEncoding};
use thiserror::Error;

/// One instruction ready for encoding.
///
/// Fields a format does not use are ignored (`rd` for S/B, `rs2` for I/U/J).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Instruction kind.
    pub encoding: OpcodeEncoding,
    /// Destination register.
    pub rd: Gpr,
    /// First source register.
    pub rs1: Gpr,
    /// Second source register.
    pub rs2: Gpr,
    /// Signed immediate, offset, shift amount, or 20-bit upper value.
    pub imm: i64,
}

impl Instruction {
    /// Builds an R-type instruction.
    #[must_use]
    pub const fn r(encoding: OpcodeEncoding, rd: Gpr, rs1: Gpr, rs2: Gpr) -> Self {
        Self {
            encoding,
            rd,
            rs1,
            rs2,
            imm: 0,
        }
    }

    /// Builds an I-type instruction (`rd, rs1, imm`).
    #[must_use]
    pub const fn i(encoding: OpcodeEncoding, rd: Gpr, rs1: Gpr, imm: i64) -> Self {
        Self {
            encoding,
            rd,
            rs1,
            rs2: Gpr::ZERO,
            imm,
        }
    }

    /// Builds an S- or B-type instruction (`rs1, rs2, imm`).
    #[must_use]
    pub const fn s(encoding: OpcodeEncoding, rs1: Gpr, rs2: Gpr, imm: i64) -> Self {
        Self {
            encoding,
            rd: Gpr::ZERO,
            rs1,
            rs2,
            imm,
        }
    }

    /// Builds a U- or J-type instruction (`rd, imm`).
    #[must_use]
    pub const fn u(encoding: OpcodeEncoding, rd: Gpr, imm: i64) -> Self {
        Self {
            encoding,
            rd,
            rs1: Gpr::ZERO,
            rs2: Gpr::ZERO,
            imm,
        }
    }
}

/// Error during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Immediate does not fit the instruction's field.
    #[error("immediate {value} out of range for {mnemonic} (expected {min}..={max})")]
    ImmediateOutOfRange {
        /// Instruction mnemonic.
        mnemonic: &'static str,
        /// Rejected value.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },
    /// Branch or jump offset is odd.
    #[error("{mnemonic} offset {value} is not a multiple of 2")]
    OddOffset {
        /// Instruction mnemonic.
        mnemonic: &'static str,
        /// Rejected offset.
        value: i64,
    },
}

/// Inclusive immediate range for an encoding.
#[must_use]
pub const fn immediate_range(encoding: OpcodeEncoding) -> (i64, i64) {
    if encoding.is_immediate_shift() {
        return (0, 31);
    }
    match encoding.format() {
        InstructionFormat::R => (0, 0),
        InstructionFormat::I | InstructionFormat::S => (-2048, 2047),
        InstructionFormat::B => (-4096, 4094),
        InstructionFormat::U => (0, 0xF_FFFF),
        InstructionFormat::J => (-1_048_576, 1_048_574),
    }
}

/// Encodes `instr` into a 32-bit word.
///
/// # Errors
///
/// Returns [`EncodeError::ImmediateOutOfRange`] when the immediate does not
/// fit the format and [`EncodeError::OddOffset`] for odd branch or jump
/// offsets.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode(instr: &Instruction) -> Result<u32, EncodeError> {
    let encoding = instr.encoding;
    let format = encoding.format();
    let mnemonic = encoding.mnemonic();

    if format != InstructionFormat::R {
        let (min, max) = immediate_range(encoding);
        if instr.imm < min || instr.imm > max {
            return Err(EncodeError::ImmediateOutOfRange {
                mnemonic,
                value: instr.imm,
                min,
                max,
            });
        }
    }
    if matches!(format, InstructionFormat::B | InstructionFormat::J) && instr.imm % 2 != 0 {
        return Err(EncodeError::OddOffset {
            mnemonic,
            value: instr.imm,
        });
    }

    let (opcode, funct3, funct7) = encoding.pattern();
    let opcode = u32::from(opcode);
    let funct3 = u32::from(funct3.unwrap_or(0)) << 12;
    let funct7 = u32::from(funct7.unwrap_or(0)) << 25;
    let rd = (instr.rd.index() as u32) << 7;
    let rs1 = (instr.rs1.index() as u32) << 15;
    let rs2 = (instr.rs2.index() as u32) << 20;
    let imm = instr.imm as u32;

    let word = match format {
        InstructionFormat::R => funct7 | rs2 | rs1 | funct3 | rd | opcode,
        InstructionFormat::I if encoding.is_immediate_shift() => {
            funct7 | ((imm & 0x1F) << 20) | rs1 | funct3 | rd | opcode
        }
        InstructionFormat::I => ((imm & 0xFFF) << 20) | rs1 | funct3 | rd | opcode,
        InstructionFormat::S => {
            (((imm >> 5) & 0x7F) << 25) | rs2 | rs1 | funct3 | ((imm & 0x1F) << 7) | opcode
        }
        InstructionFormat::B => {
            (((imm >> 12) & 0x1) << 31)
                | (((imm >> 5) & 0x3F) << 25)
                | rs2
                | rs1
                | funct3
                | (((imm >> 1) & 0xF) << 8)
                | (((imm >> 11) & 0x1) << 7)
                | opcode
        }
        InstructionFormat::U => ((imm & 0xF_FFFF) << 12) | rd | opcode,
        InstructionFormat::J => {
            (((imm >> 20) & 0x1) << 31)
                | (((imm >> 1) & 0x3FF) << 21)
                | (((imm >> 11) & 0x1) << 20)
                | (((imm >> 12) & 0xFF) << 12)
                | rd
                | opcode
        }
    };

    Ok(word)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use synapse_core::{Decoder, Gpr, OpcodeEncoding};

    use super::{encode, EncodeError, Instruction};

    fn x(index: u32) -> Gpr {
        Gpr::from_u5(index)
    }

    #[rstest]
    #[case::addi(Instruction::i(OpcodeEncoding::Addi, x(1), x(0), 1), 0x0010_0093)]
    #[case::add(Instruction::r(OpcodeEncoding::Add, x(2), x(1), x(0)), 0x0000_8133)]
    #[case::sub(Instruction::r(OpcodeEncoding::Sub, x(3), x(1), x(2)), 0x4020_81B3)]
    #[case::srai(Instruction::i(OpcodeEncoding::Srai, x(1), x(1), 3), 0x4030_D093)]
    #[case::lw(Instruction::i(OpcodeEncoding::Lw, x(3), x(0), 8), 0x0080_2183)]
    #[case::sw(Instruction::s(OpcodeEncoding::Sw, x(2), x(4), -4), 0xFE41_2E23)]
    #[case::beq(Instruction::s(OpcodeEncoding::Beq, x(0), x(1), 2048), 0x0010_00E3)]
    #[case::bne_back(Instruction::s(OpcodeEncoding::Bne, x(1), x(0), -4), 0xFE00_9EE3)]
    #[case::jal(Instruction::u(OpcodeEncoding::Jal, x(1), 8), 0x0080_00EF)]
    #[case::jalr(Instruction::i(OpcodeEncoding::Jalr, x(0), x(1), 0), 0x0000_8067)]
    #[case::lui(Instruction::u(OpcodeEncoding::Lui, x(5), 0x12345), 0x1234_52B7)]
    #[case::mul(Instruction::r(OpcodeEncoding::Mul, x(3), x(1), x(2)), 0x0220_81B3)]
    fn encodes_reference_words(#[case] instr: Instruction, #[case] expected: u32) {
        assert_eq!(encode(&instr), Ok(expected));
    }

    #[test]
    fn decoder_recovers_fields_from_encoded_words() {
        let samples = [
            Instruction::i(OpcodeEncoding::Slti, x(7), x(8), -1),
            Instruction::s(OpcodeEncoding::Bgeu, x(9), x(10), -4096),
            Instruction::u(OpcodeEncoding::Jal, x(31), -1_048_576),
            Instruction::u(OpcodeEncoding::Auipc, x(4), 0xF_FFFF),
        ];

        for instr in samples {
            let word = encode(&instr).expect("in range");
            let decoded = Decoder::decode(word)
                .instruction()
                .expect("encoded word decodes");
            assert_eq!(decoded.encoding, instr.encoding);
        }

        let decoded = Decoder::decode(encode(&samples[0]).expect("in range"))
            .instruction()
            .expect("decodes");
        assert_eq!(decoded.rd, Some(x(7)));
        assert_eq!(decoded.rs1, Some(x(8)));
        assert_eq!(decoded.signed_immediate(), -1);
    }

    #[rstest]
    #[case::addi_high(Instruction::i(OpcodeEncoding::Addi, x(1), x(0), 2048))]
    #[case::sw_low(Instruction::s(OpcodeEncoding::Sw, x(0), x(1), -2049))]
    #[case::slli_wide(Instruction::i(OpcodeEncoding::Slli, x(1), x(1), 32))]
    #[case::branch_far(Instruction::s(OpcodeEncoding::Beq, x(0), x(0), 4096))]
    #[case::lui_negative(Instruction::u(OpcodeEncoding::Lui, x(1), -1))]
    fn rejects_out_of_range_immediates(#[case] instr: Instruction) {
        assert!(matches!(
            encode(&instr),
            Err(EncodeError::ImmediateOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_odd_control_flow_offsets() {
        assert_eq!(
            encode(&Instruction::s(OpcodeEncoding::Beq, x(0), x(0), 3)),
            Err(EncodeError::OddOffset {
                mnemonic: "beq",
                value: 3,
            })
        );
        assert!(encode(&Instruction::u(OpcodeEncoding::Jal, x(0), 1)).is_err());
    }
}
