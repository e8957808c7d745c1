use core::fmt;

use crate::FaultCode;

/// Number of architecturally visible general-purpose registers (`x0..x31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;

/// General-purpose register identifier (`x0..=x31`).
///
/// A `Gpr` is always in range: decode paths build it from a five-bit field,
/// host paths go through [`Gpr::new`], which rejects wider indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Gpr(u8);

impl Gpr {
    /// The hard-wired zero register.
    pub const ZERO: Self = Self(0);

    /// Ordered list of all general-purpose registers.
    #[allow(clippy::cast_possible_truncation)]
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = {
        let mut all = [Self::ZERO; GENERAL_REGISTER_COUNT];
        let mut idx = 0;
        while idx < GENERAL_REGISTER_COUNT {
            all[idx] = Self(idx as u8);
            idx += 1;
        }
        all
    };

    /// Builds a register from the low five bits of an encoding field.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u5(bits: u32) -> Self {
        Self((bits & 0x1F) as u8)
    }

    /// Builds a register from a host-supplied index.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::RegisterIndexOutOfRange`] when `index >= 32`.
    pub const fn new(index: usize) -> Result<Self, FaultCode> {
        if index < GENERAL_REGISTER_COUNT {
            Ok(Self::ALL[index])
        } else {
            Err(FaultCode::RegisterIndexOutOfRange)
        }
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for `x0`.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<usize> for Gpr {
    type Error = FaultCode;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl fmt::Display for Gpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Thirty-two 32-bit integer registers with `x0` hard-wired to zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    regs: [u32; GENERAL_REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads a register as raw bits.
    #[must_use]
    pub const fn read(&self, reg: Gpr) -> u32 {
        if reg.is_zero() {
            0
        } else {
            self.regs[reg.index()]
        }
    }

    /// Reads a register as a two's-complement integer.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn read_signed(&self, reg: Gpr) -> i32 {
        self.read(reg) as i32
    }

    /// Writes a register. Writes to `x0` are accepted and discarded.
    pub const fn write(&mut self, reg: Gpr, value: u32) {
        if !reg.is_zero() {
            self.regs[reg.index()] = value;
        }
    }

    /// Copies out all registers, `x0` first.
    #[must_use]
    pub const fn snapshot(&self) -> [u32; GENERAL_REGISTER_COUNT] {
        let mut out = self.regs;
        out[0] = 0;
        out
    }
}

/// Architectural state of the single-cycle core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    regs: RegisterFile,
    pc: u32,
    cycle: u64,
}

impl ArchitecturalState {
    /// Creates a zeroed register file starting at `reset_pc`.
    #[must_use]
    pub fn with_reset_pc(reset_pc: u32) -> Self {
        Self {
            pc: reset_pc,
            ..Self::default()
        }
    }

    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Gpr) -> u32 {
        self.regs.read(reg)
    }

    /// Writes a general-purpose register.
    pub const fn set_gpr(&mut self, reg: Gpr, value: u32) {
        self.regs.write(reg, value);
    }

    /// Borrows the register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Number of cycles retired since reset.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Advances the retired-cycle counter by one.
    pub const fn advance_cycle(&mut self) {
        self.cycle = self.cycle.wrapping_add(1);
    }
}
