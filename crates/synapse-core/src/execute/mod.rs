//! Single-cycle execution pipeline.
//!
//! Each clock edge runs fetch, decode, execute, write-back and next-PC
//! selection. Execution computes every side effect into an
//! [`ExecuteState`] without touching the core; [`commit_execution`] applies
//! them afterwards. A faulting instruction therefore commits nothing.

#![allow(clippy::similar_names)]

mod helpers;

pub use helpers::{jalr_target, relative_target, BranchCondition};

use crate::decoder::{DecodedInstruction, OperandSource};
use crate::encoding::OpcodeEncoding;
use crate::{
    evaluate, resolve_data_address, AluOp, CoreConfig, CoreState, Decoder, FaultCode, Gpr,
    RunBoundary, RunOutcome, RunState, StepOutcome, TraceEvent, TraceSink,
};

/// Outcome of executing a single decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Side effects are ready to commit.
    Retired,
    /// Execution faulted; nothing may be committed.
    Fault {
        /// Fault code.
        cause: FaultCode,
    },
}

/// Pending side effects of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// First ALU operand.
    pub operand_a: Option<u32>,
    /// Second ALU operand.
    pub operand_b: Option<u32>,
    /// ALU result (value or effective address).
    pub computed_value: Option<u32>,
    /// Effective data address of a load or store.
    pub memory_addr: Option<u32>,
    /// Word returned by a load.
    pub memory_read_value: Option<u32>,
    /// Word to store.
    pub memory_write_value: Option<u32>,
    /// Destination register.
    pub dest_reg: Option<Gpr>,
    /// Value to write to the destination register.
    pub dest_value: Option<u32>,
    /// Program counter for the next cycle.
    pub next_pc: Option<u32>,
    /// Whether a conditional branch was taken.
    pub branch_taken: bool,
}

/// Executes one decoded instruction against a read-only view of the core.
///
/// The returned [`ExecuteState`] must be passed to [`commit_execution`]
/// only when the outcome is [`ExecuteOutcome::Retired`].
#[must_use]
pub fn execute_instruction(
    instr: &DecodedInstruction,
    state: &CoreState,
    config: &CoreConfig,
) -> (ExecuteOutcome, ExecuteState) {
    let pc = state.pc();
    let fallthrough = pc.wrapping_add(4);
    let imm = instr.immediate.unwrap_or(0);
    let rs1 = read_register(state, instr.rs1);
    let rs2 = read_register(state, instr.rs2);

    let mut exec = ExecuteState {
        next_pc: Some(fallthrough),
        ..ExecuteState::default()
    };

    match instr.encoding {
        OpcodeEncoding::Lw => {
            let addr = evaluate(rs1, imm, AluOp::Add);
            exec.memory_addr = Some(addr);
            match state.dmem.read_word(addr, config.memory_policy) {
                Ok(value) => {
                    exec.memory_read_value = Some(value);
                    exec.dest_reg = instr.rd;
                    exec.dest_value = Some(value);
                }
                Err(cause) => return (ExecuteOutcome::Fault { cause }, exec),
            }
        }
        OpcodeEncoding::Sw => {
            let addr = evaluate(rs1, imm, AluOp::Add);
            if let Err(cause) = resolve_data_address(addr, state.dmem.len(), config.memory_policy)
            {
                return (ExecuteOutcome::Fault { cause }, exec);
            }
            exec.memory_addr = Some(addr);
            exec.memory_write_value = Some(rs2);
        }
        OpcodeEncoding::Beq
        | OpcodeEncoding::Bne
        | OpcodeEncoding::Blt
        | OpcodeEncoding::Bge
        | OpcodeEncoding::Bltu
        | OpcodeEncoding::Bgeu => {
            let taken = BranchCondition::from_encoding(instr.encoding)
                .is_some_and(|condition| condition.is_taken(rs1, rs2));
            exec.branch_taken = taken;
            if taken {
                exec.next_pc = Some(relative_target(pc, imm));
            }
        }
        OpcodeEncoding::Jal => {
            exec.dest_reg = instr.rd;
            exec.dest_value = Some(fallthrough);
            exec.next_pc = Some(relative_target(pc, imm));
        }
        OpcodeEncoding::Jalr => {
            exec.dest_reg = instr.rd;
            exec.dest_value = Some(fallthrough);
            exec.next_pc = Some(jalr_target(rs1, imm));
        }
        _ => {
            let Some(op) = instr.alu_op else {
                return (
                    ExecuteOutcome::Fault {
                        cause: FaultCode::IllegalEncoding,
                    },
                    exec,
                );
            };
            let operand_a = match instr.encoding {
                OpcodeEncoding::Lui => 0,
                OpcodeEncoding::Auipc => pc,
                _ => rs1,
            };
            let operand_b = match instr.operand_source {
                OperandSource::Register => rs2,
                OperandSource::Immediate => imm,
            };
            let result = evaluate(operand_a, operand_b, op);
            exec.operand_a = Some(operand_a);
            exec.operand_b = Some(operand_b);
            exec.computed_value = Some(result);
            exec.dest_reg = instr.rd;
            exec.dest_value = Some(result);
        }
    }

    (ExecuteOutcome::Retired, exec)
}

/// Applies pending side effects: store, register write-back, next PC and
/// the retired-cycle counter.
///
/// # Errors
///
/// Returns the memory fault if the store cannot be performed; in that case
/// nothing is committed.
pub fn commit_execution(
    state: &mut CoreState,
    exec: &ExecuteState,
    config: &CoreConfig,
) -> Result<(), FaultCode> {
    if let (Some(addr), Some(value)) = (exec.memory_addr, exec.memory_write_value) {
        state.dmem.write_word(addr, value, config.memory_policy)?;
    }

    if let (Some(reg), Some(value)) = (exec.dest_reg, exec.dest_value) {
        state.arch.set_gpr(reg, value);
    }

    if let Some(pc) = exec.next_pc {
        state.arch.set_pc(pc);
    }

    state.arch.advance_cycle();
    Ok(())
}

fn read_register(state: &CoreState, reg: Option<Gpr>) -> u32 {
    reg.map_or(0, |reg| state.register(reg))
}

struct NullSink;

impl TraceSink for NullSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Advances the model by exactly one clock cycle.
pub fn step_one(state: &mut CoreState, config: &CoreConfig) -> StepOutcome {
    step_traced(state, config, &mut NullSink)
}

/// Advances the model by one clock cycle, reporting trace events to `sink`.
pub fn step_traced(
    state: &mut CoreState,
    config: &CoreConfig,
    sink: &mut dyn TraceSink,
) -> StepOutcome {
    if let RunState::FaultLatched(cause) = state.run_state {
        return StepOutcome::Fault { cause };
    }

    let pc = state.pc();
    let raw_word = match state.imem.fetch(pc) {
        Ok(word) => word,
        Err(cause) => return latch_fault(state, sink, cause, pc),
    };
    sink.on_event(TraceEvent::InstructionStart { pc, raw_word });

    let decoded: Result<DecodedInstruction, FaultCode> = Decoder::decode(raw_word).into();
    let instruction = match decoded {
        Ok(instruction) => instruction,
        Err(cause) => return latch_fault(state, sink, cause, pc),
    };

    let (outcome, exec) = execute_instruction(&instruction, state, config);
    if let ExecuteOutcome::Fault { cause } = outcome {
        return latch_fault(state, sink, cause, pc);
    }
    if let Err(cause) = commit_execution(state, &exec, config) {
        return latch_fault(state, sink, cause, pc);
    }

    if let Some(addr) = exec.memory_addr {
        sink.on_event(TraceEvent::MemoryAccess {
            addr,
            value: exec
                .memory_write_value
                .or(exec.memory_read_value)
                .unwrap_or_default(),
            is_write: exec.memory_write_value.is_some(),
        });
    }
    if let (Some(reg), Some(value)) = (exec.dest_reg, exec.dest_value) {
        if !reg.is_zero() {
            sink.on_event(TraceEvent::RegisterWrite { reg, value });
        }
    }

    let next_pc = state.pc();
    sink.on_event(TraceEvent::InstructionRetired {
        pc,
        next_pc,
        cycle: state.cycle(),
    });

    StepOutcome::Retired { pc, next_pc }
}

fn latch_fault(
    state: &mut CoreState,
    sink: &mut dyn TraceSink,
    cause: FaultCode,
    pc: u32,
) -> StepOutcome {
    state.run_state = RunState::FaultLatched(cause);
    sink.on_event(TraceEvent::FaultRaised { cause, pc });
    StepOutcome::Fault { cause }
}

/// Runs up to `max_cycles` cycles, stopping early on a fault or the
/// selected boundary.
pub fn run(
    state: &mut CoreState,
    config: &CoreConfig,
    boundary: RunBoundary,
    max_cycles: u64,
) -> RunOutcome {
    run_with_sink(state, config, boundary, max_cycles, &mut NullSink)
}

/// Like [`run`], forwarding trace events to `sink` when
/// [`CoreConfig::tracing_enabled`] is set.
pub fn run_with_sink(
    state: &mut CoreState,
    config: &CoreConfig,
    boundary: RunBoundary,
    max_cycles: u64,
    sink: &mut dyn TraceSink,
) -> RunOutcome {
    let mut steps = 0;
    let mut final_step = None;

    for _ in 0..max_cycles {
        let outcome = if config.tracing_enabled {
            step_traced(state, config, sink)
        } else {
            step_one(state, config)
        };
        final_step = Some(outcome);

        match outcome {
            StepOutcome::Fault { .. } => break,
            StepOutcome::Retired { pc, next_pc } => {
                steps += 1;
                if boundary == RunBoundary::SelfLoop && pc == next_pc {
                    break;
                }
            }
        }
    }

    RunOutcome { steps, final_step }
}
