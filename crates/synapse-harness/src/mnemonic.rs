//! Mnemonic resolution checked against the core opcode tables.

use std::sync::OnceLock;

use synapse_core::{OpcodeEncoding, OPCODE_ENCODING_TABLE};

/// Lookup result for a parsed mnemonic: `(opcode, funct3, funct7, encoding)`.
pub type MnemonicResolution = (u8, Option<u8>, Option<u8>, OpcodeEncoding);

/// Assembler-only spelling of `addi x0, x0, 0`.
pub const NOP_MNEMONIC: &str = "nop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MnemonicEntry {
    name: &'static str,
    opcode: u8,
    funct3: Option<u8>,
    funct7: Option<u8>,
    encoding: OpcodeEncoding,
}

const fn r(
    name: &'static str,
    funct3: u8,
    funct7: u8,
    encoding: OpcodeEncoding,
) -> MnemonicEntry {
    MnemonicEntry {
        name,
        opcode: OP,
        funct3: Some(funct3),
        funct7: Some(funct7),
        encoding,
    }
}

const fn with_funct3(
    name: &'static str,
    opcode: u8,
    funct3: u8,
    encoding: OpcodeEncoding,
) -> MnemonicEntry {
    MnemonicEntry {
        name,
        opcode,
        funct3: Some(funct3),
        funct7: None,
        encoding,
    }
}

const fn shift_imm(
    name: &'static str,
    funct3: u8,
    funct7: u8,
    encoding: OpcodeEncoding,
) -> MnemonicEntry {
    MnemonicEntry {
        name,
        opcode: OP_IMM,
        funct3: Some(funct3),
        funct7: Some(funct7),
        encoding,
    }
}

const fn opcode_only(name: &'static str, opcode: u8, encoding: OpcodeEncoding) -> MnemonicEntry {
    MnemonicEntry {
        name,
        opcode,
        funct3: None,
        funct7: None,
        encoding,
    }
}

const OP: u8 = 0b011_0011;
const OP_IMM: u8 = 0b001_0011;
const LOAD: u8 = 0b000_0011;
const STORE: u8 = 0b010_0011;
const BRANCH: u8 = 0b110_0011;
const JALR: u8 = 0b110_0111;

const MNEMONIC_ENTRIES: &[MnemonicEntry] = &[
    r("add", 0x0, 0x00, OpcodeEncoding::Add),
    r("sub", 0x0, 0x20, OpcodeEncoding::Sub),
    r("xor", 0x4, 0x00, OpcodeEncoding::Xor),
    r("or", 0x6, 0x00, OpcodeEncoding::Or),
    r("and", 0x7, 0x00, OpcodeEncoding::And),
    r("sll", 0x1, 0x00, OpcodeEncoding::Sll),
    r("srl", 0x5, 0x00, OpcodeEncoding::Srl),
    r("sra", 0x5, 0x20, OpcodeEncoding::Sra),
    r("slt", 0x2, 0x00, OpcodeEncoding::Slt),
    r("sltu", 0x3, 0x00, OpcodeEncoding::Sltu),
    r("mul", 0x0, 0x01, OpcodeEncoding::Mul),
    r("div", 0x4, 0x01, OpcodeEncoding::Div),
    r("rem", 0x6, 0x01, OpcodeEncoding::Rem),
    with_funct3("addi", OP_IMM, 0x0, OpcodeEncoding::Addi),
    with_funct3("slti", OP_IMM, 0x2, OpcodeEncoding::Slti),
    with_funct3("sltiu", OP_IMM, 0x3, OpcodeEncoding::Sltiu),
    with_funct3("xori", OP_IMM, 0x4, OpcodeEncoding::Xori),
    with_funct3("ori", OP_IMM, 0x6, OpcodeEncoding::Ori),
    with_funct3("andi", OP_IMM, 0x7, OpcodeEncoding::Andi),
    shift_imm("slli", 0x1, 0x00, OpcodeEncoding::Slli),
    shift_imm("srli", 0x5, 0x00, OpcodeEncoding::Srli),
    shift_imm("srai", 0x5, 0x20, OpcodeEncoding::Srai),
    with_funct3("lw", LOAD, 0x2, OpcodeEncoding::Lw),
    with_funct3("sw", STORE, 0x2, OpcodeEncoding::Sw),
    with_funct3("beq", BRANCH, 0x0, OpcodeEncoding::Beq),
    with_funct3("bne", BRANCH, 0x1, OpcodeEncoding::Bne),
    with_funct3("blt", BRANCH, 0x4, OpcodeEncoding::Blt),
    with_funct3("bge", BRANCH, 0x5, OpcodeEncoding::Bge),
    with_funct3("bltu", BRANCH, 0x6, OpcodeEncoding::Bltu),
    with_funct3("bgeu", BRANCH, 0x7, OpcodeEncoding::Bgeu),
    opcode_only("jal", 0b110_1111, OpcodeEncoding::Jal),
    with_funct3("jalr", JALR, 0x0, OpcodeEncoding::Jalr),
    opcode_only("lui", 0b011_0111, OpcodeEncoding::Lui),
    opcode_only("auipc", 0b001_0111, OpcodeEncoding::Auipc),
];

const fn resolution(entry: &MnemonicEntry) -> MnemonicResolution {
    (entry.opcode, entry.funct3, entry.funct7, entry.encoding)
}

fn entries_verified_against_core() -> &'static [MnemonicEntry] {
    static VERIFIED_ENTRIES: OnceLock<Vec<MnemonicEntry>> = OnceLock::new();
    VERIFIED_ENTRIES.get_or_init(|| {
        for entry in MNEMONIC_ENTRIES {
            let matches_core = OPCODE_ENCODING_TABLE.contains(&resolution(entry))
                && entry.encoding.mnemonic() == entry.name;
            assert!(
                matches_core,
                "mnemonic table diverged from synapse-core table"
            );
        }
        MNEMONIC_ENTRIES.to_vec()
    })
}

/// Resolves a mnemonic string to its `(opcode, funct3, funct7, encoding)`
/// tuple.
///
/// Matching is ASCII case-insensitive.
#[must_use]
pub fn resolve_mnemonic(name: &str) -> Option<MnemonicResolution> {
    entries_verified_against_core()
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
        .map(resolution)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use synapse_core::{OpcodeEncoding, OPCODE_ENCODING_TABLE};

    use super::{resolve_mnemonic, resolution, MNEMONIC_ENTRIES};

    #[test]
    fn every_mnemonic_resolves_to_expected_pattern() {
        for entry in MNEMONIC_ENTRIES {
            assert_eq!(resolve_mnemonic(entry.name), Some(resolution(entry)));
            assert_eq!(
                entry.encoding.pattern(),
                (entry.opcode, entry.funct3, entry.funct7)
            );
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(
            resolve_mnemonic("ADDI"),
            Some((0x13, Some(0x0), None, OpcodeEncoding::Addi))
        );
        assert_eq!(
            resolve_mnemonic("sRaI"),
            Some((0x13, Some(0x5), Some(0x20), OpcodeEncoding::Srai))
        );
        assert_eq!(
            resolve_mnemonic("Rem"),
            Some((0x33, Some(0x6), Some(0x01), OpcodeEncoding::Rem))
        );
    }

    #[test]
    fn unsupported_mnemonics_return_none() {
        assert_eq!(resolve_mnemonic("mulh"), None);
        assert_eq!(resolve_mnemonic("lb"), None);
        assert_eq!(resolve_mnemonic("ecall"), None);
        assert_eq!(resolve_mnemonic(""), None);
    }

    #[test]
    fn mnemonic_table_covers_all_opcode_encodings() {
        let named: HashSet<_> = MNEMONIC_ENTRIES.iter().map(|entry| entry.encoding).collect();
        let core: HashSet<_> = OPCODE_ENCODING_TABLE.iter().map(|row| row.3).collect();

        assert_eq!(core.len(), 34);
        assert_eq!(named, core);
    }

    #[test]
    fn harness_patterns_match_core_rows_exactly() {
        let named: HashSet<_> = MNEMONIC_ENTRIES.iter().map(resolution).collect();
        let core: HashSet<_> = OPCODE_ENCODING_TABLE.iter().copied().collect();

        assert_eq!(named, core);
    }
}
