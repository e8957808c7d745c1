//! Fixed instruction tables from the hardware oracles.
//!
//! Each row pairs an instruction word with the register the oracle samples
//! after that word's cycle and the value it expects there. Row `n` is placed
//! at byte address `4 * n` and sampled after cycle `n + 1`.

use synapse_core::{evaluate_selector, CoreConfig, Gpr};

use crate::errors::HarnessError;
use crate::parser::{CycleExpectation, ParsedProgram, PlacedWord};
use crate::test_format::{Assertion, ComparisonOp, RegisterTarget};
use crate::test_runner::{run_program_tests, TestRunResult};

/// One oracle row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleRow {
    /// Instruction word.
    pub word: u32,
    /// Register sampled after the cycle.
    pub reg: Gpr,
    /// Expected register value.
    pub expected: u32,
}

const fn row(word: u32, reg: u32, expected: u32) -> OracleRow {
    OracleRow {
        word,
        reg: Gpr::from_u5(reg),
        expected,
    }
}

/// Instruction memory and clock oracle.
pub const IMEM_ORACLE: [OracleRow; 3] = [
    row(0x0010_0093, 1, 1), // addi x1, x0, 1
    row(0x0000_8133, 2, 1), // add x2, x1, x0
    row(0x0010_8133, 2, 2), // add x2, x1, x1
];

/// Full datapath oracle.
///
/// Row 12 (`0x40209133`, funct7 0x20 with funct3 1) is not a valid encoding:
/// the model latches an illegal-encoding fault there and the remaining rows
/// observe the frozen register file, which is what their expectations
/// describe.
pub const DATAPATH_ORACLE: [OracleRow; 18] = [
    row(0x0010_0093, 1, 1), // addi x1, x0, 1
    row(0x0020_8133, 2, 1), // add x2, x1, x2
    row(0x4020_81B3, 3, 0), // sub x3, x1, x2
    row(0x0030_0093, 1, 3), // addi x1, x0, 3
    row(0x0000_8133, 2, 3), // add x2, x1, x0
    row(0x0040_0193, 3, 4), // addi x3, x0, 4
    row(0x0010_41B3, 3, 3), // xor x3, x0, x1
    row(0x0030_61B3, 3, 3), // or x3, x0, x3
    row(0x0020_C1B3, 3, 0), // xor x3, x1, x2
    row(0x0020_A1B3, 3, 0), // slt x3, x1, x2
    row(0x0020_5133, 2, 0), // srl x2, x0, x2
    row(0x0020_9133, 2, 3), // sll x2, x1, x2
    row(0x4020_9133, 2, 3), // illegal
    row(0x0000_0063, 0, 0), // beq x0, x0, 0
    row(0x0010_00E3, 0, 0), // beq x0, x1, 2048
    row(0x0000_0113, 2, 3), // addi x2, x0, 0
    row(0x0000_2003, 1, 3), // lw x0, 0(x0)
    row(0x0040_2023, 0, 0), // sw x4, 0(x0)
];

/// One-hot selectors exercised by the ALU oracle, in selector order.
pub const ALU_ORACLE_SELECTORS: [u32; 13] = [
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096,
];

/// One ALU oracle case: `(selector, operand1, operand2, expected)`.
pub type AluCase = (u32, u32, u32, u32);

/// Directed ALU cases over non-negative operands, including division by
/// zero and invalid selectors.
pub const ALU_ORACLE_CASES: &[AluCase] = &[
    (1, 5, 3, 8),
    (2, 5, 3, 2),
    (4, 0b1100, 0b1010, 0b0110),
    (8, 0b1100, 0b1010, 0b1110),
    (16, 0b1100, 0b1010, 0b1000),
    (32, 1, 31, 0x8000_0000),
    (64, 0x7FFF_FFFF, 4, 0x07FF_FFFF),
    (128, 0x7FFF_FFFF, 4, 0x07FF_FFFF),
    (256, 3, 5, 1),
    (512, 5, 3, 0),
    (1024, 6, 7, 42),
    (2048, 100, 7, 14),
    (2048, 100, 0, 0),
    (4096, 100, 7, 2),
    (4096, 100, 0, 0),
    (0, 5, 3, 0),
    (3, 5, 3, 0),
    (8192, 5, 3, 0),
];

/// Outcome of one ALU oracle case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluCheck {
    /// The case.
    pub case: AluCase,
    /// Model output.
    pub actual: u32,
}

impl AluCheck {
    /// Returns true when the model matched the expectation.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.actual == self.case.3
    }
}

/// Lays oracle rows out as a program with one check per cycle.
#[must_use]
pub fn oracle_program(rows: &[OracleRow]) -> ParsedProgram {
    let mut program = ParsedProgram::default();
    for (index, oracle) in (0_u32..).zip(rows) {
        let cycle = u64::from(index) + 1;
        let line = index as usize + 1;
        program.words.push(PlacedWord {
            line,
            addr: index * 4,
            word: oracle.word,
        });
        program.expectations.push(CycleExpectation {
            line,
            cycle,
            assertion: Assertion::Register {
                target: RegisterTarget::Gpr(oracle.reg),
                operator: ComparisonOp::Equal,
                expected: oracle.expected,
            },
        });
    }
    program
}

/// Runs oracle rows on a fresh model.
///
/// # Errors
///
/// Returns [`HarnessError::ProgramTooLarge`] when the table does not fit the
/// configured instruction memory.
pub fn run_oracle(rows: &[OracleRow], config: &CoreConfig) -> Result<TestRunResult, HarnessError> {
    let program = oracle_program(rows);
    run_program_tests(&program, config, program.last_checked_cycle())
}

/// Evaluates every directed ALU case.
#[must_use]
pub fn run_alu_oracle() -> Vec<AluCheck> {
    ALU_ORACLE_CASES
        .iter()
        .map(|case| AluCheck {
            case: *case,
            actual: evaluate_selector(case.1, case.2, case.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use synapse_core::{AluOp, CoreConfig, FaultCode, ALU_SELECTOR_MASK};

    use super::{
        oracle_program, run_alu_oracle, run_oracle, ALU_ORACLE_SELECTORS, DATAPATH_ORACLE,
        IMEM_ORACLE,
    };

    #[test]
    fn imem_oracle_passes() {
        let result = run_oracle(&IMEM_ORACLE, &CoreConfig::default()).expect("fits");
        assert!(result.all_passed(), "{:?}", result.checks);
        assert_eq!(result.fault, None);
    }

    #[test]
    fn datapath_oracle_passes_and_faults_on_row_twelve() {
        let result = run_oracle(&DATAPATH_ORACLE, &CoreConfig::default()).expect("fits");

        assert!(result.all_passed(), "{:?}", result.checks);
        let fault = result.fault.expect("illegal row faults");
        assert_eq!(fault.cycle, 13);
        assert_eq!(fault.pc, 48);
        assert_eq!(fault.cause, FaultCode::IllegalEncoding);
    }

    #[test]
    fn oracle_program_checks_every_cycle() {
        let program = oracle_program(&DATAPATH_ORACLE);
        assert_eq!(program.words.len(), 18);
        assert_eq!(program.last_checked_cycle(), 18);
        assert_eq!(program.words[17].addr, 68);
    }

    #[test]
    fn alu_oracle_passes() {
        for check in run_alu_oracle() {
            assert!(check.passed(), "{check:?}");
        }
    }

    #[test]
    fn selectors_cover_every_operation() {
        let combined = ALU_ORACLE_SELECTORS.iter().fold(0, |acc, sel| acc | sel);
        assert_eq!(combined, ALU_SELECTOR_MASK);
        for (selector, op) in ALU_ORACLE_SELECTORS.iter().zip(AluOp::ALL) {
            assert_eq!(*selector, op.selector());
        }
    }
}
