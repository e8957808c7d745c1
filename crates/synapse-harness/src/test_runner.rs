//! Cycle-driven check execution for parsed programs.
//!
//! ## Execution Model
//!
//! 1. Load the program's placed words into a fresh `synapse-core` instance.
//! 2. Sort checks by cycle (stable, so source order breaks ties).
//! 3. For each check, clock the model until that many cycles have elapsed,
//!    then evaluate the check against the current state.
//! 4. A fault latches the model; later cycles still elapse (without stepping
//!    the frozen model) and later checks still run against the frozen state,
//!    so a listing can assert that a bad instruction left registers untouched.
//! 5. Checks scheduled past the caller's cycle limit are rejected up front.

use std::fmt;

use synapse_core::{step_one, CoreConfig, CoreState, FaultCode, MemoryAccessPolicy, StepOutcome};

use crate::errors::HarnessError;
use crate::parser::{CycleExpectation, ParsedProgram};
use crate::test_format::{Assertion, RegisterTarget};

/// Result of evaluating one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleCheckResult {
    /// 1-indexed source line of the check.
    pub line: usize,
    /// Cycle after which the check ran.
    pub cycle: u64,
    /// The check.
    pub assertion: Assertion,
    /// Observed value, `None` when the location could not be read.
    pub actual: Option<u32>,
    /// Whether the check held.
    pub passed: bool,
}

/// First fault the model raised during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultObservation {
    /// Clock cycle (1-indexed) on which the fault was raised.
    pub cycle: u64,
    /// PC of the faulting fetch.
    pub pc: u32,
    /// Fault code.
    pub cause: FaultCode,
}

/// Result of running every check in a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRunResult {
    /// Check results in cycle order.
    pub checks: Vec<CycleCheckResult>,
    /// First fault, if any.
    pub fault: Option<FaultObservation>,
    /// Clock cycles applied.
    pub cycles_run: u64,
}

impl TestRunResult {
    /// Returns true if every check passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Returns counts for summary reporting.
    #[must_use]
    pub fn summary(&self) -> TestSummary {
        let passed = self.checks.iter().filter(|check| check.passed).count();
        TestSummary {
            passed,
            failed: self.checks.len() - passed,
            total: self.checks.len(),
        }
    }
}

/// Summary counts for test run reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSummary {
    /// Checks that held.
    pub passed: usize,
    /// Checks that failed.
    pub failed: usize,
    /// Total checks.
    pub total: usize,
}

/// Writes a program's placed words into instruction memory.
///
/// # Errors
///
/// Returns [`HarnessError::ProgramTooLarge`] when a word lands beyond the
/// configured instruction memory.
pub fn load_program(state: &mut CoreState, program: &ParsedProgram) -> Result<(), HarnessError> {
    state.imem.clear();
    for placed in &program.words {
        state
            .imem
            .write_word(placed.addr, placed.word)
            .map_err(|source| HarnessError::ProgramTooLarge {
                words: placed.addr as usize / 4 + 1,
                source,
            })?;
    }
    Ok(())
}

/// Runs all checks of `program` on a fresh model built from `config`,
/// clocking at most `max_cycles` times.
///
/// # Errors
///
/// Returns [`HarnessError::CycleLimitExceeded`] when a check is scheduled
/// after `max_cycles`, and [`HarnessError::ProgramTooLarge`] when the program
/// does not fit.
pub fn run_program_tests(
    program: &ParsedProgram,
    config: &CoreConfig,
    max_cycles: u64,
) -> Result<TestRunResult, HarnessError> {
    if let Some(late) = program
        .expectations
        .iter()
        .find(|expectation| expectation.cycle > max_cycles)
    {
        return Err(HarnessError::CycleLimitExceeded {
            line: late.line,
            cycle: late.cycle,
            limit: max_cycles,
        });
    }

    let mut state = CoreState::with_config(config);
    load_program(&mut state, program)?;

    let mut schedule: Vec<&CycleExpectation> = program.expectations.iter().collect();
    schedule.sort_by_key(|expectation| expectation.cycle);

    let mut cycles_run = 0;
    let mut fault = None;
    let mut checks = Vec::with_capacity(schedule.len());

    for expectation in schedule {
        while cycles_run < expectation.cycle {
            if fault.is_some() {
                // The latched model no longer changes; skip the idle edges.
                cycles_run = expectation.cycle;
                break;
            }
            let pc = state.pc();
            cycles_run += 1;
            if let StepOutcome::Fault { cause } = step_one(&mut state, config) {
                fault = Some(FaultObservation {
                    cycle: cycles_run,
                    pc,
                    cause,
                });
            }
        }

        let actual = observe(&state, &expectation.assertion);
        checks.push(CycleCheckResult {
            line: expectation.line,
            cycle: expectation.cycle,
            assertion: expectation.assertion,
            actual,
            passed: actual.is_some_and(|value| holds(&expectation.assertion, value)),
        });
    }

    Ok(TestRunResult {
        checks,
        fault,
        cycles_run,
    })
}

/// Reads the location a check refers to.
///
/// Memory checks read through the strict policy, so unaligned or
/// out-of-range addresses yield `None`.
#[must_use]
pub fn observe(state: &CoreState, assertion: &Assertion) -> Option<u32> {
    match assertion {
        Assertion::Register {
            target: RegisterTarget::Gpr(reg),
            ..
        } => Some(state.register(*reg)),
        Assertion::Register {
            target: RegisterTarget::Pc,
            ..
        } => Some(state.pc()),
        Assertion::Memory { address, .. } => state
            .dmem
            .read_word(*address, MemoryAccessPolicy::Strict)
            .ok(),
    }
}

const fn holds(assertion: &Assertion, actual: u32) -> bool {
    match assertion {
        Assertion::Register {
            operator, expected, ..
        }
        | Assertion::Memory {
            operator, expected, ..
        } => operator.holds(actual, *expected),
    }
}

impl fmt::Display for CycleCheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "PASS" } else { "FAIL" };
        write!(
            f,
            "{status} (line {}, cycle {}): {}",
            self.line, self.cycle, self.assertion
        )?;
        if !self.passed {
            match self.actual {
                Some(actual) => write!(f, " (actual {actual:#010x})")?,
                None => write!(f, " (location unreadable)")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for FaultObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fault at cycle {} (pc {:#010x}): {}",
            self.cycle, self.pc, self.cause
        )
    }
}

impl fmt::Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} passed, {} failed", self.passed, self.failed)
    }
}
