//! Lockstep comparison between the reference model and an observed core.
//!
//! The scheduler clocks both sides exactly once per tick and samples the
//! architectural state only after both ticks complete. Any register or PC
//! mismatch is reported as a [`Divergence`] tagged with the cycle.

use std::fmt;

use synapse_core::{step_one, CoreConfig, CoreState, Gpr, StepOutcome};

use crate::errors::HarnessError;
use crate::parser::ParsedProgram;
use crate::test_format::RegisterTarget;
use crate::test_runner::load_program;

/// A core whose architectural state can be clocked and sampled.
pub trait ObservedCore {
    /// Applies one rising clock edge.
    fn tick(&mut self);
    /// Reads a general-purpose register.
    fn register(&self, reg: Gpr) -> u32;
    /// Reads the program counter.
    fn pc(&self) -> u32;
}

/// The reference model packaged as an [`ObservedCore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCore {
    state: CoreState,
    config: CoreConfig,
    last_step: Option<StepOutcome>,
}

impl ReferenceCore {
    /// Builds a model from `config` with `program` loaded.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ProgramTooLarge`] when the program does not fit.
    pub fn new(config: CoreConfig, program: &ParsedProgram) -> Result<Self, HarnessError> {
        let mut state = CoreState::with_config(&config);
        load_program(&mut state, program)?;
        Ok(Self {
            state,
            config,
            last_step: None,
        })
    }

    /// Current model state.
    #[must_use]
    pub const fn state(&self) -> &CoreState {
        &self.state
    }

    /// Outcome of the most recent tick.
    #[must_use]
    pub const fn last_step(&self) -> Option<StepOutcome> {
        self.last_step
    }
}

impl ObservedCore for ReferenceCore {
    fn tick(&mut self) {
        self.last_step = Some(step_one(&mut self.state, &self.config));
    }

    fn register(&self, reg: Gpr) -> u32 {
        self.state.register(reg)
    }

    fn pc(&self) -> u32 {
        self.state.pc()
    }
}

/// A state mismatch after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    /// Cycle (1-indexed) after which the mismatch was sampled.
    pub cycle: u64,
    /// Mismatched location.
    pub location: RegisterTarget,
    /// Reference model value.
    pub expected: u32,
    /// Observed core value.
    pub observed: u32,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {}: {} expected {:#010x}, observed {:#010x}",
            self.cycle, self.location, self.expected, self.observed
        )
    }
}

/// Result of a lockstep run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockstepReport {
    /// Ticks applied.
    pub cycles: u64,
    /// Mismatches from the first divergent cycle, empty if none.
    pub divergences: Vec<Divergence>,
}

impl LockstepReport {
    /// Returns true when both sides agreed on every cycle.
    #[must_use]
    pub fn in_sync(&self) -> bool {
        self.divergences.is_empty()
    }
}

/// Lockstep scheduler over the reference model and an observed core.
#[derive(Debug)]
pub struct Lockstep<C: ObservedCore> {
    model: ReferenceCore,
    observed: C,
    cycle: u64,
}

impl<C: ObservedCore> Lockstep<C> {
    /// Pairs a reference model with an observed core.
    #[must_use]
    pub const fn new(model: ReferenceCore, observed: C) -> Self {
        Self {
            model,
            observed,
            cycle: 0,
        }
    }

    /// Ticks both sides once and compares PC and every register.
    pub fn tick(&mut self) -> Vec<Divergence> {
        self.model.tick();
        self.observed.tick();
        self.cycle += 1;
        self.compare()
    }

    /// Ticks up to `cycles` times, stopping after the first divergent cycle.
    pub fn run(&mut self, cycles: u64) -> LockstepReport {
        let start = self.cycle;
        for _ in 0..cycles {
            let divergences = self.tick();
            if !divergences.is_empty() {
                return LockstepReport {
                    cycles: self.cycle - start,
                    divergences,
                };
            }
        }
        LockstepReport {
            cycles: self.cycle - start,
            divergences: Vec::new(),
        }
    }

    /// Reference side.
    #[must_use]
    pub const fn model(&self) -> &ReferenceCore {
        &self.model
    }

    /// Observed side.
    #[must_use]
    pub const fn observed(&self) -> &C {
        &self.observed
    }

    fn compare(&self) -> Vec<Divergence> {
        let pc = (
            RegisterTarget::Pc,
            self.model.pc(),
            self.observed.pc(),
        );
        let registers = Gpr::ALL.into_iter().map(|reg| {
            (
                RegisterTarget::Gpr(reg),
                self.model.register(reg),
                self.observed.register(reg),
            )
        });

        std::iter::once(pc)
            .chain(registers)
            .filter(|(_, expected, observed)| expected != observed)
            .map(|(location, expected, observed)| Divergence {
                cycle: self.cycle,
                location,
                expected,
                observed,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use synapse_core::{CoreConfig, Gpr};

    use super::{Divergence, Lockstep, ObservedCore, ReferenceCore};
    use crate::oracle::{oracle_program, DATAPATH_ORACLE};
    use crate::parser::parse_program;
    use crate::test_format::RegisterTarget;

    /// A core that sticks one register bit high from a given cycle on.
    struct StuckBitCore {
        inner: ReferenceCore,
        reg: Gpr,
        from_cycle: u64,
        cycle: u64,
    }

    impl ObservedCore for StuckBitCore {
        fn tick(&mut self) {
            self.inner.tick();
            self.cycle += 1;
        }

        fn register(&self, reg: Gpr) -> u32 {
            let value = self.inner.register(reg);
            if reg == self.reg && self.cycle >= self.from_cycle {
                value | 0x100
            } else {
                value
            }
        }

        fn pc(&self) -> u32 {
            self.inner.pc()
        }
    }

    fn reference(text: &str) -> ReferenceCore {
        let program = parse_program(text).expect("valid listing");
        ReferenceCore::new(CoreConfig::default(), &program).expect("fits")
    }

    #[test]
    fn model_against_itself_stays_in_sync() {
        let program = oracle_program(&DATAPATH_ORACLE);
        let model = ReferenceCore::new(CoreConfig::default(), &program).expect("fits");
        let mut lockstep = Lockstep::new(model.clone(), model);

        let report = lockstep.run(32);

        assert!(report.in_sync());
        assert_eq!(report.cycles, 32);
        assert!(lockstep.model().last_step().is_some());
    }

    #[test]
    fn reports_first_divergent_cycle() {
        let text = "addi x1, x0, 1\naddi x2, x0, 2\naddi x3, x0, 3\n";
        let observed = StuckBitCore {
            inner: reference(text),
            reg: Gpr::from_u5(2),
            from_cycle: 2,
            cycle: 0,
        };
        let mut lockstep = Lockstep::new(reference(text), observed);

        let report = lockstep.run(3);

        assert_eq!(report.cycles, 2);
        assert_eq!(
            report.divergences,
            vec![Divergence {
                cycle: 2,
                location: RegisterTarget::Gpr(Gpr::from_u5(2)),
                expected: 2,
                observed: 0x102,
            }]
        );
        assert_eq!(
            report.divergences[0].to_string(),
            "cycle 2: x2 expected 0x00000002, observed 0x00000102"
        );
        assert_eq!(lockstep.observed().cycle, 2);
    }

    #[test]
    fn pc_mismatch_is_reported() {
        let mut lockstep = Lockstep::new(reference("nop\nnop\n"), reference("jal x0, 8\n"));

        let divergences = lockstep.tick();

        assert_eq!(divergences.len(), 1);
        assert_eq!(divergences[0].location, RegisterTarget::Pc);
        assert_eq!(divergences[0].expected, 4);
        assert_eq!(divergences[0].observed, 8);
    }
}
