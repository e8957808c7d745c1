//! Architectural CPU state model primitives.

/// Register file and program counter storage model.
pub mod registers;
/// Host-observable run state.
pub mod run_state;

pub use registers::{ArchitecturalState, Gpr, RegisterFile, GENERAL_REGISTER_COUNT};
pub use run_state::RunState;
