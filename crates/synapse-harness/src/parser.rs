//! Program listing parser.
//!
//! A listing holds one statement per line:
//!
//! ```text
//! # comment                 ; also a comment
//! @ 0x20                    placement: next statement lands at 0x20
//! loop: addi x1, x1, -1     optional label, then an instruction
//! .word 0x00100093          raw word(s), comma separated
//! expect x1 == 0            check after the preceding statement's cycle
//! expect @12 pc == 0x10     check after an explicit cycle
//! ```
//!
//! Parsing runs in two passes: pass 1 assigns addresses and collects labels,
//! pass 2 encodes instructions and resolves branch and jump targets.

#![allow(clippy::option_if_let_else)]

use std::collections::{HashMap, HashSet};

use synapse_core::{Gpr, InstructionFormat, OpcodeEncoding};

use crate::encoder::{encode, Instruction};
use crate::errors::{ParseErrorKind, ProgramParseError};
use crate::mnemonic::{resolve_mnemonic, NOP_MNEMONIC};
use crate::test_format::{parse_assertion, parse_register, parse_value, parse_word, Assertion};

/// A parsed operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Register (`x5`, `t0`).
    Register(Gpr),
    /// Numeric literal.
    Value(i64),
    /// Label reference, resolved in pass 2.
    Label(String),
    /// `offset(base)` memory operand.
    Memory {
        /// Signed byte offset.
        offset: i64,
        /// Base register.
        base: Gpr,
    },
}

/// A parsed instruction before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// The mnemonic as written.
    pub mnemonic: String,
    /// Resolved instruction kind.
    pub encoding: OpcodeEncoding,
    /// Operands in source order.
    pub operands: Vec<Operand>,
}

/// Content of one source line after the optional label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItem {
    /// `@ addr` placement directive.
    Placement(u32),
    /// Instruction statement.
    Instruction(ParsedInstruction),
    /// `.word` statement.
    Words(Vec<u32>),
    /// `expect` check.
    Expect {
        /// Explicit cycle from `expect @N`, otherwise `None`.
        cycle: Option<u64>,
        /// The check.
        assertion: Assertion,
    },
}

/// One parsed source line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLine {
    /// Label defined on this line.
    pub label: Option<String>,
    /// Line content, `None` for blank and comment-only lines.
    pub item: Option<LineItem>,
}

/// An encoded word at its instruction memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedWord {
    /// 1-indexed source line.
    pub line: usize,
    /// Byte address in instruction memory.
    pub addr: u32,
    /// Encoded instruction word.
    pub word: u32,
}

/// A check scheduled after a given number of clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleExpectation {
    /// 1-indexed source line.
    pub line: usize,
    /// Number of clock cycles to run before checking.
    pub cycle: u64,
    /// The check.
    pub assertion: Assertion,
}

/// A fully parsed and encoded program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedProgram {
    /// Encoded statements in source order.
    pub words: Vec<PlacedWord>,
    /// Checks in source order.
    pub expectations: Vec<CycleExpectation>,
}

impl ParsedProgram {
    /// Number of cycles needed to reach the last check.
    #[must_use]
    pub fn last_checked_cycle(&self) -> u64 {
        self.expectations
            .iter()
            .map(|expectation| expectation.cycle)
            .max()
            .unwrap_or(0)
    }
}

/// Parses and encodes a complete program listing.
///
/// # Errors
///
/// Returns the first [`ProgramParseError`] in source order.
pub fn parse_program(text: &str) -> Result<ParsedProgram, ProgramParseError> {
    let lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| parse_line(line, idx + 1).map(|parsed| (idx + 1, parsed)))
        .collect::<Result<Vec<_>, _>>()?;

    let labels = collect_labels(&lines)?;

    let mut program = ParsedProgram::default();
    let mut occupied = HashSet::new();
    let mut addr = 0_u32;
    let mut statements = 0_u64;

    for (line, parsed) in &lines {
        let line = *line;
        match &parsed.item {
            None => {}
            Some(LineItem::Placement(target)) => addr = *target,
            Some(LineItem::Instruction(instruction)) => {
                let word = encode_instruction(instruction, addr, &labels)
                    .map_err(|kind| ProgramParseError::new(line, kind))?;
                place(&mut program, &mut occupied, line, addr, word)?;
                addr = addr.wrapping_add(4);
                statements += 1;
            }
            Some(LineItem::Words(words)) => {
                for word in words {
                    place(&mut program, &mut occupied, line, addr, *word)?;
                    addr = addr.wrapping_add(4);
                    statements += 1;
                }
            }
            Some(LineItem::Expect { cycle, assertion }) => {
                let cycle = match cycle {
                    Some(cycle) => *cycle,
                    None if statements == 0 => {
                        return Err(ProgramParseError::new(
                            line,
                            ParseErrorKind::ExpectWithoutInstruction,
                        ));
                    }
                    None => statements,
                };
                program.expectations.push(CycleExpectation {
                    line,
                    cycle,
                    assertion: *assertion,
                });
            }
        }
    }

    Ok(program)
}

fn collect_labels(lines: &[(usize, ParsedLine)]) -> Result<HashMap<String, u32>, ProgramParseError> {
    let mut labels = HashMap::new();
    let mut pending = Vec::new();
    let mut addr = 0_u32;

    for (line, parsed) in lines {
        if let Some(name) = &parsed.label {
            pending.push((*line, name.as_str()));
        }
        match &parsed.item {
            Some(LineItem::Placement(target)) => addr = *target,
            Some(LineItem::Instruction(_)) => {
                bind_labels(&mut labels, &mut pending, addr)?;
                addr = addr.wrapping_add(4);
            }
            Some(LineItem::Words(words)) => {
                bind_labels(&mut labels, &mut pending, addr)?;
                let bytes = u32::try_from(words.len() * 4).unwrap_or(u32::MAX);
                addr = addr.wrapping_add(bytes);
            }
            Some(LineItem::Expect { .. }) | None => {}
        }
    }
    bind_labels(&mut labels, &mut pending, addr)?;

    Ok(labels)
}

/// Labels bind to the next placed statement, so a label written before a
/// placement directive names the placed code.
fn bind_labels(
    labels: &mut HashMap<String, u32>,
    pending: &mut Vec<(usize, &str)>,
    addr: u32,
) -> Result<(), ProgramParseError> {
    for (line, name) in pending.drain(..) {
        if labels.insert(name.to_string(), addr).is_some() {
            return Err(ProgramParseError::new(
                line,
                ParseErrorKind::DuplicateLabel(name.to_string()),
            ));
        }
    }
    Ok(())
}

fn place(
    program: &mut ParsedProgram,
    occupied: &mut HashSet<u32>,
    line: usize,
    addr: u32,
    word: u32,
) -> Result<(), ProgramParseError> {
    if !occupied.insert(addr) {
        return Err(ProgramParseError::new(
            line,
            ParseErrorKind::OverlappingPlacement(addr),
        ));
    }
    program.words.push(PlacedWord { line, addr, word });
    Ok(())
}

/// Parses one source line without resolving labels.
///
/// # Errors
///
/// Returns a [`ProgramParseError`] for malformed statements.
pub fn parse_line(line: &str, line_number: usize) -> Result<ParsedLine, ProgramParseError> {
    let err = |kind| ProgramParseError::new(line_number, kind);
    let text = strip_comment(line).trim();

    let (label, text) = match split_label(text) {
        Some((label, rest)) => (Some(label.to_string()), rest.trim()),
        None => (None, text),
    };

    if text.is_empty() {
        return Ok(ParsedLine { label, item: None });
    }

    let item = if let Some(rest) = text.strip_prefix('@') {
        let addr = parse_word(rest).map_err(|msg| err(ParseErrorKind::InvalidOperand(msg)))?;
        if addr % 4 != 0 {
            return Err(err(ParseErrorKind::MisalignedPlacement(addr)));
        }
        LineItem::Placement(addr)
    } else if let Some(rest) = strip_keyword(text, ".word") {
        let words = rest
            .split(',')
            .map(parse_word)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|msg| err(ParseErrorKind::InvalidOperand(msg)))?;
        LineItem::Words(words)
    } else if let Some(rest) = strip_keyword(text, "expect") {
        parse_expect(rest).map_err(err)?
    } else {
        LineItem::Instruction(parse_instruction(text).map_err(err)?)
    };

    Ok(ParsedLine {
        label,
        item: Some(item),
    })
}

fn strip_comment(line: &str) -> &str {
    line.find(['#', ';']).map_or(line, |pos| &line[..pos])
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    let (label, rest) = text.split_once(':')?;
    is_valid_label(label).then_some((label, rest))
}

fn is_valid_label(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '.')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    let rest = &text[keyword.len()..];
    (head.eq_ignore_ascii_case(keyword) && (rest.is_empty() || rest.starts_with(char::is_whitespace)))
        .then_some(rest)
}

fn parse_expect(text: &str) -> Result<LineItem, ParseErrorKind> {
    let text = text.trim();
    let (cycle, check) = match text.strip_prefix('@') {
        Some(rest) => {
            let (cycle, check) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| ParseErrorKind::InvalidCheck("missing check after cycle".into()))?;
            let cycle = parse_value(cycle)
                .ok()
                .and_then(|cycle| u64::try_from(cycle).ok())
                .ok_or_else(|| ParseErrorKind::InvalidCheck(format!("invalid cycle '{cycle}'")))?;
            (Some(cycle), check)
        }
        None => (None, text),
    };

    let assertion = parse_assertion(check).map_err(ParseErrorKind::InvalidCheck)?;
    Ok(LineItem::Expect { cycle, assertion })
}

fn parse_instruction(text: &str) -> Result<ParsedInstruction, ParseErrorKind> {
    let (mnemonic, rest) = text
        .split_once(char::is_whitespace)
        .unwrap_or((text, ""));

    let operands = if rest.trim().is_empty() {
        Vec::new()
    } else {
        rest.split(',')
            .map(parse_operand)
            .collect::<Result<Vec<_>, _>>()?
    };

    if mnemonic.eq_ignore_ascii_case(NOP_MNEMONIC) {
        expect_operand_count(mnemonic, &operands, 0)?;
        return Ok(ParsedInstruction {
            mnemonic: mnemonic.to_string(),
            encoding: OpcodeEncoding::Addi,
            operands: vec![
                Operand::Register(Gpr::ZERO),
                Operand::Register(Gpr::ZERO),
                Operand::Value(0),
            ],
        });
    }

    let (_, _, _, encoding) = resolve_mnemonic(mnemonic)
        .ok_or_else(|| ParseErrorKind::UnknownMnemonic(mnemonic.to_string()))?;

    let expected = match encoding.format() {
        InstructionFormat::R => 3,
        InstructionFormat::I if uses_memory_operand(encoding) => 2,
        InstructionFormat::I | InstructionFormat::B => 3,
        InstructionFormat::S | InstructionFormat::U | InstructionFormat::J => 2,
    };
    expect_operand_count(mnemonic, &operands, expected)?;

    Ok(ParsedInstruction {
        mnemonic: mnemonic.to_string(),
        encoding,
        operands,
    })
}

const fn uses_memory_operand(encoding: OpcodeEncoding) -> bool {
    matches!(encoding, OpcodeEncoding::Lw | OpcodeEncoding::Jalr)
}

fn expect_operand_count(
    mnemonic: &str,
    operands: &[Operand],
    expected: usize,
) -> Result<(), ParseErrorKind> {
    if operands.len() == expected {
        Ok(())
    } else {
        Err(ParseErrorKind::OperandCount {
            mnemonic: mnemonic.to_string(),
            expected,
            found: operands.len(),
        })
    }
}

fn parse_operand(text: &str) -> Result<Operand, ParseErrorKind> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseErrorKind::InvalidOperand("empty operand".into()));
    }

    if let Some(open) = text.find('(') {
        let close = text
            .strip_suffix(')')
            .ok_or_else(|| ParseErrorKind::InvalidOperand(format!("expected ')' in '{text}'")))?;
        let offset_text = text[..open].trim();
        let offset = if offset_text.is_empty() {
            0
        } else {
            parse_value(offset_text).map_err(ParseErrorKind::InvalidOperand)?
        };
        let base = parse_register(&close[open + 1..]).map_err(ParseErrorKind::InvalidOperand)?;
        return Ok(Operand::Memory { offset, base });
    }

    if let Ok(reg) = parse_register(text) {
        return Ok(Operand::Register(reg));
    }
    if is_valid_label(text) {
        return Ok(Operand::Label(text.to_string()));
    }
    parse_value(text)
        .map(Operand::Value)
        .map_err(ParseErrorKind::InvalidOperand)
}

fn encode_instruction(
    instruction: &ParsedInstruction,
    pc: u32,
    labels: &HashMap<String, u32>,
) -> Result<u32, ParseErrorKind> {
    let encoding = instruction.encoding;
    let ops = &instruction.operands;

    let instr = match encoding.format() {
        InstructionFormat::R => Instruction::r(
            encoding,
            register(&ops[0])?,
            register(&ops[1])?,
            register(&ops[2])?,
        ),
        InstructionFormat::I if uses_memory_operand(encoding) => {
            let (offset, base) = memory(&ops[1])?;
            Instruction::i(encoding, register(&ops[0])?, base, offset)
        }
        InstructionFormat::I => Instruction::i(
            encoding,
            register(&ops[0])?,
            register(&ops[1])?,
            value(&ops[2])?,
        ),
        InstructionFormat::S => {
            let (offset, base) = memory(&ops[1])?;
            Instruction::s(encoding, base, register(&ops[0])?, offset)
        }
        InstructionFormat::B => Instruction::s(
            encoding,
            register(&ops[0])?,
            register(&ops[1])?,
            target(&ops[2], pc, labels)?,
        ),
        InstructionFormat::U => Instruction::u(encoding, register(&ops[0])?, value(&ops[1])?),
        InstructionFormat::J => {
            Instruction::u(encoding, register(&ops[0])?, target(&ops[1], pc, labels)?)
        }
    };

    Ok(encode(&instr)?)
}

fn register(operand: &Operand) -> Result<Gpr, ParseErrorKind> {
    match operand {
        Operand::Register(reg) => Ok(*reg),
        other => Err(ParseErrorKind::InvalidOperand(format!(
            "expected register, found {other:?}"
        ))),
    }
}

fn value(operand: &Operand) -> Result<i64, ParseErrorKind> {
    match operand {
        Operand::Value(value) => Ok(*value),
        other => Err(ParseErrorKind::InvalidOperand(format!(
            "expected immediate, found {other:?}"
        ))),
    }
}

fn memory(operand: &Operand) -> Result<(i64, Gpr), ParseErrorKind> {
    match operand {
        Operand::Memory { offset, base } => Ok((*offset, *base)),
        other => Err(ParseErrorKind::InvalidOperand(format!(
            "expected offset(base), found {other:?}"
        ))),
    }
}

fn target(operand: &Operand, pc: u32, labels: &HashMap<String, u32>) -> Result<i64, ParseErrorKind> {
    match operand {
        Operand::Value(offset) => Ok(*offset),
        Operand::Label(name) => labels
            .get(name)
            .map(|addr| i64::from(*addr) - i64::from(pc))
            .ok_or_else(|| ParseErrorKind::UnknownLabel(name.clone())),
        other => Err(ParseErrorKind::InvalidOperand(format!(
            "expected offset or label, found {other:?}"
        ))),
    }
}
