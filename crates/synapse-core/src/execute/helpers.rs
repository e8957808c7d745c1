//! Branch and jump target helpers.

use crate::encoding::OpcodeEncoding;

/// Comparison performed by a conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BranchCondition {
    /// `BEQ`
    Eq,
    /// `BNE`
    Ne,
    /// `BLT` (signed)
    Lt,
    /// `BGE` (signed)
    Ge,
    /// `BLTU`
    Ltu,
    /// `BGEU`
    Geu,
}

impl BranchCondition {
    /// Maps a branch encoding to its condition.
    #[must_use]
    pub const fn from_encoding(encoding: OpcodeEncoding) -> Option<Self> {
        match encoding {
            OpcodeEncoding::Beq => Some(Self::Eq),
            OpcodeEncoding::Bne => Some(Self::Ne),
            OpcodeEncoding::Blt => Some(Self::Lt),
            OpcodeEncoding::Bge => Some(Self::Ge),
            OpcodeEncoding::Bltu => Some(Self::Ltu),
            OpcodeEncoding::Bgeu => Some(Self::Geu),
            _ => None,
        }
    }

    /// Compares two register values directly, without the ALU.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn is_taken(self, rs1: u32, rs2: u32) -> bool {
        match self {
            Self::Eq => rs1 == rs2,
            Self::Ne => rs1 != rs2,
            Self::Lt => (rs1 as i32) < (rs2 as i32),
            Self::Ge => (rs1 as i32) >= (rs2 as i32),
            Self::Ltu => rs1 < rs2,
            Self::Geu => rs1 >= rs2,
        }
    }
}

/// PC-relative target of a branch or `JAL`.
#[must_use]
pub const fn relative_target(pc: u32, immediate: u32) -> u32 {
    pc.wrapping_add(immediate)
}

/// `JALR` target: `rs1 + imm` with bit 0 cleared.
#[must_use]
pub const fn jalr_target(base: u32, immediate: u32) -> u32 {
    base.wrapping_add(immediate) & !1
}

#[cfg(test)]
mod tests {
    use super::{jalr_target, relative_target, BranchCondition};
    use crate::encoding::OpcodeEncoding;

    #[test]
    fn signed_and_unsigned_compares_differ_on_sign_bit() {
        let minus_one = u32::MAX;
        assert!(BranchCondition::Lt.is_taken(minus_one, 0));
        assert!(!BranchCondition::Ltu.is_taken(minus_one, 0));
        assert!(BranchCondition::Geu.is_taken(minus_one, 0));
        assert!(!BranchCondition::Ge.is_taken(minus_one, 0));
        assert!(BranchCondition::Ge.is_taken(5, 5));
        assert!(BranchCondition::Eq.is_taken(5, 5));
        assert!(BranchCondition::Ne.is_taken(5, 6));
    }

    #[test]
    fn only_branches_map_to_conditions() {
        assert_eq!(
            BranchCondition::from_encoding(OpcodeEncoding::Bgeu),
            Some(BranchCondition::Geu)
        );
        assert_eq!(BranchCondition::from_encoding(OpcodeEncoding::Jal), None);
        assert_eq!(BranchCondition::from_encoding(OpcodeEncoding::Add), None);
    }

    #[test]
    fn targets_wrap_and_jalr_clears_bit_zero() {
        assert_eq!(relative_target(8, 0xFFFF_FFF8), 0);
        assert_eq!(relative_target(0, 0xFFFF_FFFC), 0xFFFF_FFFC);
        assert_eq!(jalr_target(0x101, 0), 0x100);
        assert_eq!(jalr_target(0x100, 3), 0x102);
    }
}
