//! Parsing for per-cycle check syntax.
//!
//! ## Supported Syntax
//!
//! - Register checks: `x2 == 1`, `a0 != 0`, `pc == 0x0c`
//! - Data memory checks (32-bit word): `[0x10] == 0x12345678`
//! - Literals: decimal (optionally negative), `0x` hex, `0b` binary

#![allow(clippy::option_if_let_else)]

use std::fmt;

use synapse_core::Gpr;

/// ABI register names in `x0..x31` order.
const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// A parsed check evaluated against core state after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assertion {
    /// Check a general-purpose register or the PC.
    Register {
        /// The register to check.
        target: RegisterTarget,
        /// The comparison operator.
        operator: ComparisonOp,
        /// The expected value.
        expected: u32,
    },
    /// Check the little-endian word at a data memory address.
    Memory {
        /// Byte address of the word.
        address: u32,
        /// The comparison operator.
        operator: ComparisonOp,
        /// The expected word.
        expected: u32,
    },
}

/// A register that can be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterTarget {
    /// General-purpose register.
    Gpr(Gpr),
    /// Program counter.
    Pc,
}

/// Comparison operator for checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
}

impl ComparisonOp {
    /// Applies the operator.
    #[must_use]
    pub const fn holds(self, actual: u32, expected: u32) -> bool {
        match self {
            Self::Equal => actual == expected,
            Self::NotEqual => actual != expected,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "=="),
            Self::NotEqual => write!(f, "!="),
        }
    }
}

impl fmt::Display for RegisterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpr(reg) => write!(f, "{reg}"),
            Self::Pc => write!(f, "pc"),
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register {
                target,
                operator,
                expected,
            } => write!(f, "{target} {operator} {expected:#010x}"),
            Self::Memory {
                address,
                operator,
                expected,
            } => write!(f, "[{address:#x}] {operator} {expected:#010x}"),
        }
    }
}

/// Parses a single check such as `x2 == 1` or `[0x10] != 0`.
///
/// # Errors
///
/// Returns a description of the first syntax problem.
pub fn parse_assertion(text: &str) -> Result<Assertion, String> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('[') {
        let close = rest
            .find(']')
            .ok_or_else(|| "expected ']' after address".to_string())?;
        let address = parse_word(&rest[..close])?;
        let (operator, value) = parse_comparison_op(&rest[close + 1..])?;
        return Ok(Assertion::Memory {
            address,
            operator,
            expected: parse_word(value)?,
        });
    }

    let (name, rest) = text
        .split_once(char::is_whitespace)
        .ok_or_else(|| "expected 'register operator value'".to_string())?;
    let target = if name.eq_ignore_ascii_case("pc") {
        RegisterTarget::Pc
    } else {
        RegisterTarget::Gpr(parse_register(name)?)
    };
    let (operator, value) = parse_comparison_op(rest)?;

    Ok(Assertion::Register {
        target,
        operator,
        expected: parse_word(value)?,
    })
}

/// Parses a register name: `x0`..`x31` or an ABI name such as `sp`.
///
/// # Errors
///
/// Returns a message naming the unknown register.
pub fn parse_register(text: &str) -> Result<Gpr, String> {
    let lower = text.trim().to_ascii_lowercase();
    let index = lower
        .strip_prefix('x')
        .and_then(|digits| digits.parse::<usize>().ok())
        .or_else(|| ABI_NAMES.iter().position(|name| *name == lower))
        .or_else(|| (lower == "fp").then_some(8));

    index
        .and_then(|index| Gpr::new(index).ok())
        .ok_or_else(|| format!("unknown register '{text}'"))
}

fn parse_comparison_op(text: &str) -> Result<(ComparisonOp, &str), String> {
    let text = text.trim_start();
    if let Some(rest) = text.strip_prefix("==") {
        Ok((ComparisonOp::Equal, rest))
    } else if let Some(rest) = text.strip_prefix("!=") {
        Ok((ComparisonOp::NotEqual, rest))
    } else {
        Err("expected '==' or '!='".to_string())
    }
}

/// Parses a signed integer literal (decimal, `0x` hex, or `0b` binary).
///
/// # Errors
///
/// Returns a message naming the malformed literal.
pub fn parse_value(text: &str) -> Result<i64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("expected a value".to_string());
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(&hex.replace('_', ""), 16)
            .map_err(|_| format!("invalid hex value '{text}'"))?
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        i64::from_str_radix(&bin.replace('_', ""), 2)
            .map_err(|_| format!("invalid binary value '{text}'"))?
    } else {
        digits
            .replace('_', "")
            .parse::<i64>()
            .map_err(|_| format!("invalid decimal value '{text}'"))?
    };

    Ok(if negative { -magnitude } else { magnitude })
}

/// Parses a literal that must fit 32 bits, accepting both signed and
/// unsigned spellings (`-1` and `0xffffffff` are the same word).
///
/// # Errors
///
/// Returns a message when the literal is malformed or out of range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_word(text: &str) -> Result<u32, String> {
    let value = parse_value(text)?;
    if (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
        Ok(value as u32)
    } else {
        Err(format!("value '{}' does not fit in 32 bits", text.trim()))
    }
}
