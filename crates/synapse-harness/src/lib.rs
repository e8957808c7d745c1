//! Program runner, oracle tables and lockstep checker for the synapse32
//! reference model.

#[cfg(test)]
use tempfile as _;

/// RV32IM instruction word encoding.
pub mod encoder;
/// Structured parse and harness error types.
pub mod errors;
/// Cycle-by-cycle comparison against another core.
pub mod lockstep;
/// Mnemonic resolution against the core opcode table.
pub mod mnemonic;
/// Fixed instruction and ALU oracle tables.
pub mod oracle;
/// Program listing parser for instructions, labels and checks.
pub mod parser;
/// Check syntax for registers and data memory.
pub mod test_format;
/// Cycle-driven check execution.
pub mod test_runner;
