//! Public host-facing API for driving the reference model from a harness.

use crate::{
    ArchitecturalState, DataMemory, FaultCode, Gpr, InstructionMemory, MemoryAccessPolicy,
    RunState,
};

/// Default instruction memory capacity in words.
pub const DEFAULT_INSTRUCTION_MEMORY_WORDS: usize = 1024;

/// Default data memory capacity in bytes.
pub const DEFAULT_DATA_MEMORY_BYTES: usize = 4096;

/// Top-level configuration for a core instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Capacity of instruction memory in 32-bit words.
    pub instruction_memory_words: usize,
    /// Capacity of data memory in bytes.
    pub data_memory_bytes: usize,
    /// Program counter after reset.
    pub reset_pc: u32,
    /// What `LW`/`SW` do with unaligned or out-of-range addresses.
    pub memory_policy: MemoryAccessPolicy,
    /// Enables trace event forwarding in [`crate::run_with_sink`].
    pub tracing_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            instruction_memory_words: DEFAULT_INSTRUCTION_MEMORY_WORDS,
            data_memory_bytes: DEFAULT_DATA_MEMORY_BYTES,
            reset_pc: 0,
            memory_policy: MemoryAccessPolicy::Strict,
            tracing_enabled: false,
        }
    }
}

/// Complete host-visible core state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Register file, program counter and retired-cycle counter.
    pub arch: ArchitecturalState,
    /// Harvard instruction memory.
    pub imem: InstructionMemory,
    /// Byte-addressed data memory.
    pub dmem: DataMemory,
    /// Current execution state.
    pub run_state: RunState,
    reset_pc: u32,
}

impl Default for CoreState {
    fn default() -> Self {
        Self::with_config(&CoreConfig::default())
    }
}

impl CoreState {
    /// Creates a zeroed core sized by `config`.
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            arch: ArchitecturalState::with_reset_pc(config.reset_pc),
            imem: InstructionMemory::new(config.instruction_memory_words),
            dmem: DataMemory::new(config.data_memory_bytes),
            run_state: RunState::Running,
            reset_pc: config.reset_pc,
        }
    }

    /// Loads `program` into instruction memory from address 0.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::FetchOutOfBounds`] when the program is larger
    /// than instruction memory.
    pub fn load_program(&mut self, program: &[u32]) -> Result<(), FaultCode> {
        self.imem.load_program(program)
    }

    /// Reads a register as raw bits.
    #[must_use]
    pub const fn register(&self, reg: Gpr) -> u32 {
        self.arch.gpr(reg)
    }

    /// Reads a register as a signed integer.
    #[must_use]
    pub const fn register_signed(&self, reg: Gpr) -> i32 {
        self.arch.registers().read_signed(reg)
    }

    /// Current program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.arch.pc()
    }

    /// Cycles retired since reset.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.arch.cycle()
    }

    /// Program counter restored by [`CoreState::reset`].
    #[must_use]
    pub const fn reset_pc(&self) -> u32 {
        self.reset_pc
    }

    /// Applies reset: zeroes registers and the cycle counter, restores the
    /// reset PC and clears any latched fault. Memory images are preserved.
    pub fn reset(&mut self) {
        self.arch = ArchitecturalState::with_reset_pc(self.reset_pc);
        self.run_state = RunState::Running;
    }
}

/// Output status from one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// Instruction retired.
    Retired {
        /// Program counter of the retired instruction.
        pc: u32,
        /// Program counter selected for the next cycle.
        next_pc: u32,
    },
    /// Fault raised (or still latched); nothing was committed.
    Fault {
        /// Fault code.
        cause: FaultCode,
    },
}

impl StepOutcome {
    /// Returns the fault code for a faulting step.
    #[must_use]
    pub const fn fault(self) -> Option<FaultCode> {
        match self {
            Self::Retired { .. } => None,
            Self::Fault { cause } => Some(cause),
        }
    }
}

/// Stop conditions for [`crate::run`] in addition to the cycle limit.
///
/// A fault always ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunBoundary {
    /// Run until the cycle limit.
    #[default]
    CycleLimit,
    /// Also stop after an instruction that branches or jumps to itself.
    SelfLoop,
}

/// Aggregated outcome from a batched run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of instructions retired during this call.
    pub steps: u64,
    /// Last step-level status, `None` when no cycle ran.
    pub final_step: Option<StepOutcome>,
}

/// Stable snapshot wire-version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema revision.
    V1 = 1,
}

impl SnapshotVersion {
    /// Converts wire value to known snapshot version.
    #[must_use]
    pub const fn from_u16(version: u16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// Serializable full-state snapshot used for replay fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreSnapshot {
    /// Snapshot schema version.
    pub version: SnapshotVersion,
    /// Full host-visible core state.
    pub state: CoreState,
}

impl CoreSnapshot {
    /// Captures the current state.
    #[must_use]
    pub fn capture(state: &CoreState) -> Self {
        Self {
            version: SnapshotVersion::V1,
            state: state.clone(),
        }
    }

    /// Consumes the snapshot, returning the captured state.
    #[must_use]
    pub fn into_state(self) -> CoreState {
        self.state
    }
}

/// Deterministic trace events emitted in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// Instruction fetched.
    InstructionStart {
        /// Fetch address.
        pc: u32,
        /// Raw instruction word.
        raw_word: u32,
    },
    /// Register write-back (never reported for `x0`).
    RegisterWrite {
        /// Destination register.
        reg: Gpr,
        /// Written value.
        value: u32,
    },
    /// Data memory access.
    MemoryAccess {
        /// Requested address (before any truncation).
        addr: u32,
        /// Word read or written.
        value: u32,
        /// True for stores.
        is_write: bool,
    },
    /// Instruction retired.
    InstructionRetired {
        /// Program counter of the retired instruction.
        pc: u32,
        /// Program counter for the next cycle.
        next_pc: u32,
        /// Retired-cycle count after this instruction.
        cycle: u64,
    },
    /// Fault raised.
    FaultRaised {
        /// Fault code.
        cause: FaultCode,
        /// Program counter of the faulting fetch.
        pc: u32,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Trace sink that buffers every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VecTraceSink {
    /// Recorded events, oldest first.
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn on_event(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}
