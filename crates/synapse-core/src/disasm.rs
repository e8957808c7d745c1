//! Instruction disassembly for traces and the harness `decode` command.

use crate::decoder::{DecodedInstruction, Decoder};
use crate::encoding::{InstructionFormat, OpcodeEncoding};
use crate::Gpr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Byte address of the instruction.
    pub addr: u32,
    /// Raw instruction word.
    pub raw_word: u32,
    /// Mnemonic (e.g. `addi`), or `.word` for illegal encodings.
    pub mnemonic: String,
    /// Formatted operands (e.g. `x1, x0, 1`).
    pub operands: String,
    /// Whether this word is an illegal encoding.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// Renders the row as a single assembly line.
    #[must_use]
    pub fn text(&self) -> String {
        if self.is_illegal {
            format!("{} {} ; ILLEGAL", self.mnemonic, self.operands)
        } else if self.operands.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, self.operands)
        }
    }
}

/// Disassembles one instruction word.
///
/// Illegal encodings render as `.word 0x........ ; ILLEGAL`.
#[must_use]
pub fn disassemble(word: u32) -> String {
    disassemble_row(0, word).text()
}

/// Disassembles a program image laid out from `base`.
#[must_use]
pub fn disassemble_program(base: u32, words: &[u32]) -> Vec<DisassemblyRow> {
    (0_u32..)
        .zip(words)
        .map(|(index, word)| disassemble_row(base.wrapping_add(index.wrapping_mul(4)), *word))
        .collect()
}

fn disassemble_row(addr: u32, raw_word: u32) -> DisassemblyRow {
    match Decoder::decode(raw_word).instruction() {
        Some(instr) => DisassemblyRow {
            addr,
            raw_word,
            mnemonic: instr.encoding.mnemonic().to_string(),
            operands: format_operands(&instr),
            is_illegal: false,
        },
        None => DisassemblyRow {
            addr,
            raw_word,
            mnemonic: ".word".to_string(),
            operands: format!("{raw_word:#010x}"),
            is_illegal: true,
        },
    }
}

fn format_operands(instr: &DecodedInstruction) -> String {
    let rd = reg_name(instr.rd);
    let rs1 = reg_name(instr.rs1);
    let rs2 = reg_name(instr.rs2);
    let imm = instr.signed_immediate();

    match instr.encoding.format() {
        InstructionFormat::R => format!("{rd}, {rs1}, {rs2}"),
        InstructionFormat::I => match instr.encoding {
            OpcodeEncoding::Lw | OpcodeEncoding::Jalr => format!("{rd}, {imm}({rs1})"),
            _ => format!("{rd}, {rs1}, {imm}"),
        },
        InstructionFormat::S => format!("{rs2}, {imm}({rs1})"),
        InstructionFormat::B => format!("{rs1}, {rs2}, {imm}"),
        InstructionFormat::U => format!("{rd}, {:#x}", instr.immediate.unwrap_or(0) >> 12),
        InstructionFormat::J => format!("{rd}, {imm}"),
    }
}

fn reg_name(reg: Option<Gpr>) -> String {
    reg.unwrap_or(Gpr::ZERO).to_string()
}
