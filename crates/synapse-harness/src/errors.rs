//! Structured error types for program parsing and harness commands.
//!
//! Parse errors carry the 1-indexed source line and format as
//! ```text
//! line 4: unknown mnemonic 'mulh'
//! ```

use std::path::PathBuf;

use synapse_core::FaultCode;
use thiserror::Error;

use crate::encoder::EncodeError;

/// Error parsing a program listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ProgramParseError {
    /// 1-indexed source line.
    pub line: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl ProgramParseError {
    /// Creates an error at `line`.
    #[must_use]
    pub const fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Classification of program parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Mnemonic not in the supported instruction set.
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
    /// Wrong number of operands.
    #[error("{mnemonic} expects {expected} operand(s), found {found}")]
    OperandCount {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Operands the format needs.
        expected: usize,
        /// Operands present.
        found: usize,
    },
    /// Malformed operand, register, or literal.
    #[error("{0}")]
    InvalidOperand(String),
    /// Placement address is not word aligned.
    #[error("placement address {0:#x} is not word aligned")]
    MisalignedPlacement(u32),
    /// Two statements land on the same address.
    #[error("address {0:#x} is already occupied")]
    OverlappingPlacement(u32),
    /// Branch or jump names a label that is never defined.
    #[error("unknown label '{0}'")]
    UnknownLabel(String),
    /// Label defined twice.
    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),
    /// An `expect` line appears before any statement.
    #[error("'expect' must follow an instruction or '.word'")]
    ExpectWithoutInstruction,
    /// Malformed check after `expect`.
    #[error("invalid check: {0}")]
    InvalidCheck(String),
    /// Immediate rejected by the encoder.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Top-level error for harness commands.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Program file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Program text is malformed.
    #[error(transparent)]
    Parse(#[from] ProgramParseError),
    /// Program image does not fit the configured instruction memory.
    #[error("program image of {words} words does not fit in instruction memory")]
    ProgramTooLarge {
        /// Image size in words.
        words: usize,
        /// Fault reported by the model.
        #[source]
        source: FaultCode,
    },
    /// A check is scheduled after the run's cycle limit.
    #[error("line {line}: check at cycle {cycle} is beyond the cycle limit of {limit}")]
    CycleLimitExceeded {
        /// 1-indexed source line of the check.
        line: usize,
        /// Cycle the check asks for.
        cycle: u64,
        /// Configured cycle limit.
        limit: u64,
    },
    /// Operand or selector text is not a valid number.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// ALU operation named neither by mnemonic nor by a one-hot selector.
    #[error("unknown ALU operation '{0}'")]
    UnknownAluOp(String),
}
