//! Golden reference model for the synapse32 RV32IM single-cycle core.

/// Stateless ALU engine with the one-hot selector contract.
pub mod alu;
pub use alu::{evaluate, evaluate_selector, AluOp, ALU_OP_COUNT, ALU_SELECTOR_MASK};

/// Instruction and data memory with access policies.
pub mod memory;
pub use memory::{
    resolve_data_address, validate_fetch_alignment, validate_word_alignment, DataMemory,
    InstructionMemory, MemoryAccessPolicy, WORD_ACCESS_BYTES,
};

/// Public host-facing API and integration types.
pub mod api;
pub use api::{
    CoreConfig, CoreSnapshot, CoreState, RunBoundary, RunOutcome, SnapshotVersion, StepOutcome,
    TraceEvent, TraceSink, VecTraceSink, DEFAULT_DATA_MEMORY_BYTES,
    DEFAULT_INSTRUCTION_MEMORY_WORDS,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{ArchitecturalState, Gpr, RegisterFile, RunState, GENERAL_REGISTER_COUNT};

/// Opcode tables and instruction classification.
pub mod encoding;
pub use encoding::{
    classify_opcode, InstructionFields, InstructionFormat, OpcodeEncoding, OPCODE_ENCODING_TABLE,
};

/// Instruction decode with field and immediate extraction.
pub mod decoder;
pub use decoder::{DecodedInstruction, DecodedOrFault, Decoder, OperandSource};

/// Fault taxonomy.
pub mod fault;
pub use fault::{FaultClass, FaultCode};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, run, run_with_sink, step_one, step_traced,
    BranchCondition, ExecuteOutcome, ExecuteState,
};

/// Disassembly for traces and tooling.
pub mod disasm;
pub use disasm::{disassemble, disassemble_program, DisassemblyRow};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use serde_json as _;
