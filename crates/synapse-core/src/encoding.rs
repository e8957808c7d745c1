use crate::AluOp;

/// Major opcode values (bits 6..0) of the modeled RV32IM subset.
pub const OPCODE_LOAD: u8 = 0x03;
/// `OP-IMM` major opcode.
pub const OPCODE_OP_IMM: u8 = 0x13;
/// `AUIPC` major opcode.
pub const OPCODE_AUIPC: u8 = 0x17;
/// `STORE` major opcode.
pub const OPCODE_STORE: u8 = 0x23;
/// `OP` (register-register) major opcode.
pub const OPCODE_OP: u8 = 0x33;
/// `LUI` major opcode.
pub const OPCODE_LUI: u8 = 0x37;
/// `BRANCH` major opcode.
pub const OPCODE_BRANCH: u8 = 0x63;
/// `JALR` major opcode.
pub const OPCODE_JALR: u8 = 0x67;
/// `JAL` major opcode.
pub const OPCODE_JAL: u8 = 0x6F;

/// `funct7` of the base register-register group.
pub const FUNCT7_BASE: u8 = 0x00;
/// `funct7` selecting `SUB`/`SRA` (and `SRAI`).
pub const FUNCT7_ALT: u8 = 0x20;
/// `funct7` of the M extension.
pub const FUNCT7_MULDIV: u8 = 0x01;

/// RV32 instruction formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionFormat {
    /// Register-register.
    R,
    /// Register-immediate, loads and `jalr`.
    I,
    /// Stores.
    S,
    /// Conditional branches.
    B,
    /// Upper immediate.
    U,
    /// `jal`.
    J,
}

/// Every instruction the reference model executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OpcodeEncoding {
    /// `add rd, rs1, rs2`
    Add,
    /// `sub rd, rs1, rs2`
    Sub,
    /// `xor rd, rs1, rs2`
    Xor,
    /// `or rd, rs1, rs2`
    Or,
    /// `and rd, rs1, rs2`
    And,
    /// `sll rd, rs1, rs2`
    Sll,
    /// `srl rd, rs1, rs2`
    Srl,
    /// `sra rd, rs1, rs2`
    Sra,
    /// `slt rd, rs1, rs2`
    Slt,
    /// `sltu rd, rs1, rs2`
    Sltu,
    /// `mul rd, rs1, rs2`, low 32 bits
    Mul,
    /// `div rd, rs1, rs2`, signed
    Div,
    /// `rem rd, rs1, rs2`, signed
    Rem,
    /// `addi rd, rs1, imm`
    Addi,
    /// `slti rd, rs1, imm`
    Slti,
    /// `sltiu rd, rs1, imm`
    Sltiu,
    /// `xori rd, rs1, imm`
    Xori,
    /// `ori rd, rs1, imm`
    Ori,
    /// `andi rd, rs1, imm`
    Andi,
    /// `slli rd, rs1, shamt`
    Slli,
    /// `srli rd, rs1, shamt`
    Srli,
    /// `srai rd, rs1, shamt`
    Srai,
    /// `lw rd, imm(rs1)`
    Lw,
    /// `sw rs2, imm(rs1)`
    Sw,
    /// `beq rs1, rs2, offset`
    Beq,
    /// `bne rs1, rs2, offset`
    Bne,
    /// `blt rs1, rs2, offset`
    Blt,
    /// `bge rs1, rs2, offset`
    Bge,
    /// `bltu rs1, rs2, offset`
    Bltu,
    /// `bgeu rs1, rs2, offset`
    Bgeu,
    /// `jal rd, offset`
    Jal,
    /// `jalr rd, imm(rs1)`
    Jalr,
    /// `lui rd, imm`
    Lui,
    /// `auipc rd, imm`
    Auipc,
}

/// Single source-of-truth encoding table: `(opcode, funct3, funct7, encoding)`.
///
/// `None` in a funct column means the field carries immediate bits and is not
/// matched. Any word that matches no row is illegal by definition.
pub const OPCODE_ENCODING_TABLE: &[(u8, Option<u8>, Option<u8>, OpcodeEncoding)] = &[
    (OPCODE_OP, Some(0x0), Some(FUNCT7_BASE), OpcodeEncoding::Add),
    (OPCODE_OP, Some(0x0), Some(FUNCT7_ALT), OpcodeEncoding::Sub),
    (OPCODE_OP, Some(0x4), Some(FUNCT7_BASE), OpcodeEncoding::Xor),
    (OPCODE_OP, Some(0x6), Some(FUNCT7_BASE), OpcodeEncoding::Or),
    (OPCODE_OP, Some(0x7), Some(FUNCT7_BASE), OpcodeEncoding::And),
    (OPCODE_OP, Some(0x1), Some(FUNCT7_BASE), OpcodeEncoding::Sll),
    (OPCODE_OP, Some(0x5), Some(FUNCT7_BASE), OpcodeEncoding::Srl),
    (OPCODE_OP, Some(0x5), Some(FUNCT7_ALT), OpcodeEncoding::Sra),
    (OPCODE_OP, Some(0x2), Some(FUNCT7_BASE), OpcodeEncoding::Slt),
    (OPCODE_OP, Some(0x3), Some(FUNCT7_BASE), OpcodeEncoding::Sltu),
    (OPCODE_OP, Some(0x0), Some(FUNCT7_MULDIV), OpcodeEncoding::Mul),
    (OPCODE_OP, Some(0x4), Some(FUNCT7_MULDIV), OpcodeEncoding::Div),
    (OPCODE_OP, Some(0x6), Some(FUNCT7_MULDIV), OpcodeEncoding::Rem),
    (OPCODE_OP_IMM, Some(0x0), None, OpcodeEncoding::Addi),
    (OPCODE_OP_IMM, Some(0x2), None, OpcodeEncoding::Slti),
    (OPCODE_OP_IMM, Some(0x3), None, OpcodeEncoding::Sltiu),
    (OPCODE_OP_IMM, Some(0x4), None, OpcodeEncoding::Xori),
    (OPCODE_OP_IMM, Some(0x6), None, OpcodeEncoding::Ori),
    (OPCODE_OP_IMM, Some(0x7), None, OpcodeEncoding::Andi),
    (OPCODE_OP_IMM, Some(0x1), Some(FUNCT7_BASE), OpcodeEncoding::Slli),
    (OPCODE_OP_IMM, Some(0x5), Some(FUNCT7_BASE), OpcodeEncoding::Srli),
    (OPCODE_OP_IMM, Some(0x5), Some(FUNCT7_ALT), OpcodeEncoding::Srai),
    (OPCODE_LOAD, Some(0x2), None, OpcodeEncoding::Lw),
    (OPCODE_STORE, Some(0x2), None, OpcodeEncoding::Sw),
    (OPCODE_BRANCH, Some(0x0), None, OpcodeEncoding::Beq),
    (OPCODE_BRANCH, Some(0x1), None, OpcodeEncoding::Bne),
    (OPCODE_BRANCH, Some(0x4), None, OpcodeEncoding::Blt),
    (OPCODE_BRANCH, Some(0x5), None, OpcodeEncoding::Bge),
    (OPCODE_BRANCH, Some(0x6), None, OpcodeEncoding::Bltu),
    (OPCODE_BRANCH, Some(0x7), None, OpcodeEncoding::Bgeu),
    (OPCODE_JAL, None, None, OpcodeEncoding::Jal),
    (OPCODE_JALR, Some(0x0), None, OpcodeEncoding::Jalr),
    (OPCODE_LUI, None, None, OpcodeEncoding::Lui),
    (OPCODE_AUIPC, None, None, OpcodeEncoding::Auipc),
];

impl OpcodeEncoding {
    /// Instruction format used to lay out operands and immediates.
    #[must_use]
    pub const fn format(self) -> InstructionFormat {
        match self {
            Self::Add
            | Self::Sub
            | Self::Xor
            | Self::Or
            | Self::And
            | Self::Sll
            | Self::Srl
            | Self::Sra
            | Self::Slt
            | Self::Sltu
            | Self::Mul
            | Self::Div
            | Self::Rem => InstructionFormat::R,
            Self::Addi
            | Self::Slti
            | Self::Sltiu
            | Self::Xori
            | Self::Ori
            | Self::Andi
            | Self::Slli
            | Self::Srli
            | Self::Srai
            | Self::Lw
            | Self::Jalr => InstructionFormat::I,
            Self::Sw => InstructionFormat::S,
            Self::Beq | Self::Bne | Self::Blt | Self::Bge | Self::Bltu | Self::Bgeu => {
                InstructionFormat::B
            }
            Self::Jal => InstructionFormat::J,
            Self::Lui | Self::Auipc => InstructionFormat::U,
        }
    }

    /// ALU operation computing the result (or address) of this instruction.
    ///
    /// Branches and jumps return `None`: their comparison and target
    /// arithmetic happen outside the ALU.
    #[must_use]
    pub const fn alu_op(self) -> Option<AluOp> {
        match self {
            Self::Add | Self::Addi | Self::Lw | Self::Sw | Self::Lui | Self::Auipc => {
                Some(AluOp::Add)
            }
            Self::Sub => Some(AluOp::Sub),
            Self::Xor | Self::Xori => Some(AluOp::Xor),
            Self::Or | Self::Ori => Some(AluOp::Or),
            Self::And | Self::Andi => Some(AluOp::And),
            Self::Sll | Self::Slli => Some(AluOp::Sll),
            Self::Srl | Self::Srli => Some(AluOp::Srl),
            Self::Sra | Self::Srai => Some(AluOp::Sra),
            Self::Slt | Self::Slti => Some(AluOp::Slt),
            Self::Sltu | Self::Sltiu => Some(AluOp::Sltu),
            Self::Mul => Some(AluOp::Mul),
            Self::Div => Some(AluOp::Div),
            Self::Rem => Some(AluOp::Rem),
            Self::Beq
            | Self::Bne
            | Self::Blt
            | Self::Bge
            | Self::Bltu
            | Self::Bgeu
            | Self::Jal
            | Self::Jalr => None,
        }
    }

    /// Lower-case assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Xor => "xor",
            Self::Or => "or",
            Self::And => "and",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Rem => "rem",
            Self::Addi => "addi",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Xori => "xori",
            Self::Ori => "ori",
            Self::Andi => "andi",
            Self::Slli => "slli",
            Self::Srli => "srli",
            Self::Srai => "srai",
            Self::Lw => "lw",
            Self::Sw => "sw",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blt => "blt",
            Self::Bge => "bge",
            Self::Bltu => "bltu",
            Self::Bgeu => "bgeu",
            Self::Jal => "jal",
            Self::Jalr => "jalr",
            Self::Lui => "lui",
            Self::Auipc => "auipc",
        }
    }

    /// Returns the `(opcode, funct3, funct7)` pattern for this encoding.
    #[must_use]
    pub fn pattern(self) -> (u8, Option<u8>, Option<u8>) {
        OPCODE_ENCODING_TABLE
            .iter()
            .find(|(_, _, _, encoding)| *encoding == self)
            .map_or((0, None, None), |(opcode, funct3, funct7, _)| {
                (*opcode, *funct3, *funct7)
            })
    }

    /// Returns `true` for the immediate shift forms whose `funct7` is fixed.
    #[must_use]
    pub const fn is_immediate_shift(self) -> bool {
        matches!(self, Self::Slli | Self::Srli | Self::Srai)
    }
}

/// Raw bit fields of a 32-bit instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionFields {
    /// Bits 6..0.
    pub opcode: u8,
    /// Bits 11..7.
    pub rd: u8,
    /// Bits 14..12.
    pub funct3: u8,
    /// Bits 19..15.
    pub rs1: u8,
    /// Bits 24..20.
    pub rs2: u8,
    /// Bits 31..25.
    pub funct7: u8,
}

impl InstructionFields {
    /// Splits a raw word into its fixed-position fields.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: (word & 0x7F) as u8,
            rd: ((word >> 7) & 0x1F) as u8,
            funct3: ((word >> 12) & 0x7) as u8,
            rs1: ((word >> 15) & 0x1F) as u8,
            rs2: ((word >> 20) & 0x1F) as u8,
            funct7: ((word >> 25) & 0x7F) as u8,
        }
    }
}

/// Returns the encoding for an `(opcode, funct3, funct7)` triple.
///
/// `None` means illegal or unsupported encoding.
#[must_use]
pub fn classify_opcode(opcode: u8, funct3: u8, funct7: u8) -> Option<OpcodeEncoding> {
    OPCODE_ENCODING_TABLE
        .iter()
        .find_map(|(entry_op, entry_f3, entry_f7, encoding)| {
            let matches = *entry_op == opcode
                && entry_f3.is_none_or(|f3| f3 == funct3)
                && entry_f7.is_none_or(|f7| f7 == funct7);
            matches.then_some(*encoding)
        })
}
