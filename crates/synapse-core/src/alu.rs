//! Stateless RV32IM arithmetic/logic unit.
//!
//! Operands are raw 32-bit register images. Signedness is a property of the
//! operation, not of the operand: `SLT`, `SRA`, `MUL`, `DIV` and `REM`
//! reinterpret the bits as two's-complement `i32`.
//!
//! The hardware under test selects the operation with a one-hot mask. That
//! numeric contract only exists at [`evaluate_selector`] and
//! [`AluOp::from_selector`]; everything else uses [`AluOp`].

/// Number of ALU operations (and of valid one-hot selector bits).
pub const ALU_OP_COUNT: usize = 13;

/// Mask of every selector bit the ALU recognises.
pub const ALU_SELECTOR_MASK: u32 = (1 << ALU_OP_COUNT) - 1;

/// ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AluOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Bitwise exclusive or.
    Xor,
    /// Bitwise or.
    Or,
    /// Bitwise and.
    And,
    /// Logical left shift by the low five bits of operand 2.
    Sll,
    /// Logical (zero-filling) right shift.
    Srl,
    /// Arithmetic (sign-filling) right shift.
    Sra,
    /// Signed less-than, producing 0 or 1.
    Slt,
    /// Unsigned less-than, producing 0 or 1.
    Sltu,
    /// Low 32 bits of the signed product.
    Mul,
    /// Signed truncating division; 0 when the divisor is 0.
    Div,
    /// Signed truncating remainder; 0 when the divisor is 0.
    Rem,
}

impl AluOp {
    /// Every operation, in selector bit order.
    pub const ALL: [Self; ALU_OP_COUNT] = [
        Self::Add,
        Self::Sub,
        Self::Xor,
        Self::Or,
        Self::And,
        Self::Sll,
        Self::Srl,
        Self::Sra,
        Self::Slt,
        Self::Sltu,
        Self::Mul,
        Self::Div,
        Self::Rem,
    ];

    /// Returns the one-hot selector the hardware uses for this operation.
    #[must_use]
    pub const fn selector(self) -> u32 {
        match self {
            Self::Add => 1,
            Self::Sub => 2,
            Self::Xor => 4,
            Self::Or => 8,
            Self::And => 16,
            Self::Sll => 32,
            Self::Srl => 64,
            Self::Sra => 128,
            Self::Slt => 256,
            Self::Sltu => 512,
            Self::Mul => 1024,
            Self::Div => 2048,
            Self::Rem => 4096,
        }
    }

    /// Decodes a one-hot selector.
    ///
    /// Returns `None` for zero, for masks with more than one bit set, and
    /// for bits above the highest defined operation.
    #[must_use]
    pub const fn from_selector(selector: u32) -> Option<Self> {
        if selector == 0 || !selector.is_power_of_two() || selector & !ALU_SELECTOR_MASK != 0 {
            return None;
        }
        Some(Self::ALL[selector.trailing_zeros() as usize])
    }

    /// Lower-case RISC-V mnemonic of the register-register form.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Xor => "xor",
            Self::Or => "or",
            Self::And => "and",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Rem => "rem",
        }
    }

    /// Looks an operation up by mnemonic, ignoring ASCII case.
    #[must_use]
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
    }
}

const SHAMT_MASK: u32 = 0x1F;

/// Evaluates `op` over two 32-bit operands.
#[must_use]
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]
pub const fn evaluate(operand1: u32, operand2: u32, op: AluOp) -> u32 {
    let signed1 = operand1 as i32;
    let signed2 = operand2 as i32;
    let shamt = operand2 & SHAMT_MASK;

    match op {
        AluOp::Add => operand1.wrapping_add(operand2),
        AluOp::Sub => operand1.wrapping_sub(operand2),
        AluOp::Xor => operand1 ^ operand2,
        AluOp::Or => operand1 | operand2,
        AluOp::And => operand1 & operand2,
        AluOp::Sll => operand1 << shamt,
        AluOp::Srl => operand1 >> shamt,
        AluOp::Sra => (signed1 >> shamt) as u32,
        AluOp::Slt => (signed1 < signed2) as u32,
        AluOp::Sltu => (operand1 < operand2) as u32,
        AluOp::Mul => signed1.wrapping_mul(signed2) as u32,
        // i32::MIN / -1 wraps back to i32::MIN; its remainder is 0.
        AluOp::Div => {
            if operand2 == 0 {
                0
            } else {
                signed1.wrapping_div(signed2) as u32
            }
        }
        AluOp::Rem => {
            if operand2 == 0 {
                0
            } else {
                signed1.wrapping_rem(signed2) as u32
            }
        }
    }
}

/// Evaluates the ALU as the hardware sees it, with a one-hot selector.
///
/// Invalid selectors produce 0.
#[must_use]
pub const fn evaluate_selector(operand1: u32, operand2: u32, selector: u32) -> u32 {
    match AluOp::from_selector(selector) {
        Some(op) => evaluate(operand1, operand2, op),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{evaluate, evaluate_selector, AluOp, ALU_OP_COUNT};
    use rstest::rstest;

    #[test]
    fn selector_bits_follow_declaration_order() {
        for (bit, op) in AluOp::ALL.iter().copied().enumerate() {
            assert_eq!(op.selector(), 1 << bit);
            assert_eq!(AluOp::from_selector(1 << bit), Some(op));
        }
    }

    #[test]
    fn selector_values_match_hardware_encoding() {
        assert_eq!(AluOp::Add.selector(), 1);
        assert_eq!(AluOp::Sub.selector(), 2);
        assert_eq!(AluOp::Xor.selector(), 4);
        assert_eq!(AluOp::Or.selector(), 8);
        assert_eq!(AluOp::And.selector(), 16);
        assert_eq!(AluOp::Rem.selector(), 4096);
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(0x0180)]
    #[case(1 << ALU_OP_COUNT)]
    #[case(u32::MAX)]
    fn invalid_selectors_are_rejected(#[case] selector: u32) {
        assert_eq!(AluOp::from_selector(selector), None);
        assert_eq!(evaluate_selector(7, 5, selector), 0);
    }

    #[test]
    fn mnemonic_lookup_is_case_insensitive() {
        assert_eq!(AluOp::from_mnemonic("SLTU"), Some(AluOp::Sltu));
        assert_eq!(AluOp::from_mnemonic("rem"), Some(AluOp::Rem));
        assert_eq!(AluOp::from_mnemonic("mulh"), None);
    }

    #[rstest]
    #[case(AluOp::Add, 0xFFFF_FFFF, 1, 0)]
    #[case(AluOp::Sub, 0, 1, 0xFFFF_FFFF)]
    #[case(AluOp::Xor, 0b1100, 0b1010, 0b0110)]
    #[case(AluOp::Or, 0b1100, 0b1010, 0b1110)]
    #[case(AluOp::And, 0b1100, 0b1010, 0b1000)]
    #[case(AluOp::Sll, 1, 33, 2)]
    #[case(AluOp::Srl, 0x8000_0000, 31, 1)]
    #[case(AluOp::Sra, 0x8000_0000, 31, 0xFFFF_FFFF)]
    #[case(AluOp::Sra, 3, 2, 0)]
    #[case(AluOp::Slt, 0xFFFF_FFFF, 0, 1)]
    #[case(AluOp::Sltu, 0xFFFF_FFFF, 0, 0)]
    #[case(AluOp::Mul, 0x0001_0000, 0x0001_0000, 0)]
    #[case(AluOp::Mul, 0xFFFF_FFFF, 0xFFFF_FFFF, 1)]
    #[case(AluOp::Div, 7, 0xFFFF_FFFE, 0xFFFF_FFFD)]
    #[case(AluOp::Div, 0x8000_0000, 0xFFFF_FFFF, 0x8000_0000)]
    #[case(AluOp::Rem, 0xFFFF_FFF9, 2, 0xFFFF_FFFF)]
    #[case(AluOp::Rem, 0x8000_0000, 0xFFFF_FFFF, 0)]
    fn table_cases(#[case] op: AluOp, #[case] a: u32, #[case] b: u32, #[case] expected: u32) {
        assert_eq!(evaluate(a, b, op), expected);
    }

    #[test]
    fn zero_divisor_yields_zero() {
        for dividend in [0, 1, 0x7FFF_FFFF, 0x8000_0000, u32::MAX] {
            assert_eq!(evaluate(dividend, 0, AluOp::Div), 0);
            assert_eq!(evaluate(dividend, 0, AluOp::Rem), 0);
        }
    }
}
