//! ALU engine properties over the full 32-bit operand space.

#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use synapse_core::{evaluate, evaluate_selector, AluOp, ALU_SELECTOR_MASK};
use thiserror as _;

fn any_op() -> impl Strategy<Value = AluOp> {
    prop::sample::select(AluOp::ALL.to_vec())
}

fn reference(a: u32, b: u32, op: AluOp) -> u32 {
    let (sa, sb) = (i64::from(a as i32), i64::from(b as i32));
    match op {
        AluOp::Add => ((u64::from(a) + u64::from(b)) & 0xFFFF_FFFF) as u32,
        AluOp::Sub => ((i64::from(a) - i64::from(b)) & 0xFFFF_FFFF) as u32,
        AluOp::Xor => a ^ b,
        AluOp::Or => a | b,
        AluOp::And => a & b,
        AluOp::Sll => ((u64::from(a) << (b % 32)) & 0xFFFF_FFFF) as u32,
        AluOp::Srl => a >> (b % 32),
        AluOp::Sra => ((a as i32) >> (b % 32)) as u32,
        AluOp::Slt => u32::from(sa < sb),
        AluOp::Sltu => u32::from(a < b),
        AluOp::Mul => ((sa * sb) & 0xFFFF_FFFF) as u32,
        AluOp::Div if b == 0 => 0,
        AluOp::Rem if b == 0 => 0,
        AluOp::Div => ((sa / sb) & 0xFFFF_FFFF) as u32,
        AluOp::Rem => ((sa % sb) & 0xFFFF_FFFF) as u32,
    }
}

proptest! {
    #[test]
    fn evaluate_matches_wide_arithmetic_reference(a in any::<u32>(), b in any::<u32>(), op in any_op()) {
        prop_assert_eq!(evaluate(a, b, op), reference(a, b, op));
    }

    #[test]
    fn selector_boundary_agrees_with_enum(a in any::<u32>(), b in any::<u32>(), op in any_op()) {
        prop_assert_eq!(evaluate_selector(a, b, op.selector()), evaluate(a, b, op));
    }

    #[test]
    fn multi_bit_and_out_of_range_selectors_yield_zero(a in any::<u32>(), b in any::<u32>(), selector in any::<u32>()) {
        let valid = selector != 0
            && selector.is_power_of_two()
            && selector & !ALU_SELECTOR_MASK == 0;
        if !valid {
            prop_assert_eq!(evaluate_selector(a, b, selector), 0);
        }
    }

    #[test]
    fn signed_less_than_is_a_strict_order(a in any::<u32>(), b in any::<u32>()) {
        let forward = evaluate(a, b, AluOp::Slt);
        let backward = evaluate(b, a, AluOp::Slt);
        let equal = u32::from(a == b);
        prop_assert_eq!(forward + backward + equal, 1);
    }

    #[test]
    fn unsigned_less_than_is_a_strict_order(a in any::<u32>(), b in any::<u32>()) {
        let forward = evaluate(a, b, AluOp::Sltu);
        let backward = evaluate(b, a, AluOp::Sltu);
        let equal = u32::from(a == b);
        prop_assert_eq!(forward + backward + equal, 1);
    }

    #[test]
    fn shift_amount_is_taken_modulo_32(a in any::<u32>(), b in 0_u32..32, k in any::<u32>()) {
        let shifted = b.wrapping_add(k.wrapping_mul(32));
        for op in [AluOp::Sll, AluOp::Srl, AluOp::Sra] {
            prop_assert_eq!(evaluate(a, b, op), evaluate(a, shifted, op));
        }
    }

    #[test]
    fn add_and_sub_are_inverse(a in any::<u32>(), b in any::<u32>()) {
        prop_assert_eq!(evaluate(evaluate(a, b, AluOp::Add), b, AluOp::Sub), a);
    }

    #[test]
    fn division_identity_holds_for_non_zero_divisors(a in any::<u32>(), b in any::<u32>()) {
        prop_assume!(b != 0);
        let q = evaluate(a, b, AluOp::Div);
        let r = evaluate(a, b, AluOp::Rem);
        prop_assert_eq!(evaluate(evaluate(q, b, AluOp::Mul), r, AluOp::Add), a);
    }

    #[test]
    fn zero_divisor_yields_zero_for_any_dividend(a in any::<u32>()) {
        prop_assert_eq!(evaluate(a, 0, AluOp::Div), 0);
        prop_assert_eq!(evaluate(a, 0, AluOp::Rem), 0);
    }
}

#[rstest]
#[case(3, 2, 0)]
#[case(0xFFFF_FFF8, 1, 0xFFFF_FFFC)]
#[case(0x8000_0000, 32, 0x8000_0000)]
fn sra_oracle_cases(#[case] a: u32, #[case] b: u32, #[case] expected: u32) {
    assert_eq!(evaluate(a, b, AluOp::Sra), expected);
    assert_eq!(evaluate_selector(a, b, 128), expected);
}

#[test]
fn div_by_zero_through_hardware_selector() {
    for dividend in [0, 1, 42, u32::MAX, 0x8000_0000] {
        assert_eq!(evaluate_selector(dividend, 0, 2048), 0);
        assert_eq!(evaluate_selector(dividend, 0, 4096), 0);
    }
}

#[test]
fn signed_overflow_division_wraps() {
    assert_eq!(
        evaluate(0x8000_0000, u32::MAX, AluOp::Div),
        0x8000_0000
    );
    assert_eq!(evaluate(0x8000_0000, u32::MAX, AluOp::Rem), 0);
}
