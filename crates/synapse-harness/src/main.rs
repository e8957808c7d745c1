//! CLI entry point for the synapse32 reference model harness.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use synapse_core::{
    disassemble, evaluate_selector, run_with_sink, AluOp, CoreConfig, CoreState, Gpr,
    MemoryAccessPolicy, RunBoundary, StepOutcome, TraceEvent, TraceSink,
};
use synapse_harness::errors::HarnessError;
use synapse_harness::oracle::{run_alu_oracle, run_oracle, DATAPATH_ORACLE, IMEM_ORACLE};
use synapse_harness::parser::{parse_program, ParsedProgram};
use synapse_harness::test_format::{parse_value, parse_word};
use synapse_harness::test_runner::{load_program, run_program_tests, TestRunResult};
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

const DEFAULT_RUN_CYCLES: u64 = 1_000;

const USAGE_TEXT: &str = "\
Usage: synapse-check <command> [options]

Commands:
  run <program> [options]   Run a program listing and print the register file
  test <program> [options]  Run a listing and evaluate its 'expect' checks
  alu <op> <a> <b>          Evaluate one ALU operation (mnemonic or one-hot selector)
  decode <word>             Disassemble one instruction word
  oracle                    Run the built-in oracle tables

Options (run, test):
  -n, --cycles <n>          Cycle limit; test rejects checks past it (default: 1000)
  --trace                   Print one line per trace event to stderr (run only)
  --truncate-addresses      Drop low/high address bits instead of faulting on LW/SW
  --imem-words <n>          Instruction memory size in words (default: 1024)
  --dmem-bytes <n>          Data memory size in bytes (default: 4096)
  -h, --help                Show this help message

Examples:
  synapse-check run program.s -n 64 --trace
  synapse-check test program.s
  synapse-check alu sra 0xfffffff8 1
  synapse-check decode 0x00100093
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(ProgramArgs),
    Test(ProgramArgs),
    Alu(AluArgs),
    Decode(u32),
    Oracle,
}

#[derive(Debug, PartialEq, Eq)]
struct ProgramArgs {
    input: PathBuf,
    cycles: u64,
    config: CoreConfig,
}

#[derive(Debug, PartialEq, Eq)]
struct AluArgs {
    selector: u32,
    operand1: u32,
    operand2: u32,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_program_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        "test" => parse_program_args(args)
            .map(Command::Test)
            .map(ParseResult::Command),
        "alu" => parse_alu_args(args)
            .map(Command::Alu)
            .map(ParseResult::Command),
        "decode" => {
            let [word] = positional::<1>(args)?;
            parse_word(&word)
                .map(Command::Decode)
                .map(ParseResult::Command)
                .map_err(|msg| HarnessError::InvalidValue(msg).to_string())
        }
        "oracle" => {
            let [] = positional::<0>(args)?;
            Ok(ParseResult::Command(Command::Oracle))
        }
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_program_args(mut args: impl Iterator<Item = OsString>) -> Result<ProgramArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut cycles = DEFAULT_RUN_CYCLES;
    let mut config = CoreConfig::default();

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--trace" {
            config.tracing_enabled = true;
            continue;
        }

        if arg == "--truncate-addresses" {
            config.memory_policy = MemoryAccessPolicy::Truncate;
            continue;
        }

        if arg == "-n" || arg == "--cycles" {
            cycles = option_value(&mut args, "-n")?;
            continue;
        }

        if arg == "--imem-words" {
            config.instruction_memory_words = option_value(&mut args, "--imem-words")?;
            continue;
        }

        if arg == "--dmem-bytes" {
            config.data_memory_bytes = option_value(&mut args, "--dmem-bytes")?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(ProgramArgs {
        input,
        cycles,
        config,
    })
}

fn option_value<T: TryFrom<i64>>(
    args: &mut impl Iterator<Item = OsString>,
    name: &str,
) -> Result<T, String> {
    let value = args
        .next()
        .ok_or_else(|| format!("missing value for {name}"))?;
    let text = value.to_string_lossy();
    parse_value(&text)
        .ok()
        .and_then(|number| T::try_from(number).ok())
        .ok_or_else(|| format!("invalid value for {name}: {text}"))
}

fn parse_alu_args(args: impl Iterator<Item = OsString>) -> Result<AluArgs, String> {
    let [op, a, b] = positional::<3>(args)?;

    let selector = match AluOp::from_mnemonic(&op) {
        Some(op) => op.selector(),
        None => parse_word(&op).map_err(|_| HarnessError::UnknownAluOp(op).to_string())?,
    };
    let operand = |text: &str| {
        parse_word(text).map_err(|msg| HarnessError::InvalidValue(msg).to_string())
    };

    Ok(AluArgs {
        selector,
        operand1: operand(&a)?,
        operand2: operand(&b)?,
    })
}

fn positional<const N: usize>(args: impl Iterator<Item = OsString>) -> Result<[String; N], String> {
    let values: Vec<String> = args
        .map(|arg| arg.to_string_lossy().to_string())
        .collect();
    if values.iter().any(|value| value == "--help" || value == "-h") {
        return Err(USAGE_TEXT.to_string());
    }
    let found = values.len();
    values
        .try_into()
        .map_err(|_| format!("expected {N} argument(s), found {found}"))
}

fn read_program(path: &Path) -> Result<ParsedProgram, HarnessError> {
    let text = fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_program(&text)?)
}

/// Prints trace events to stderr, one line each.
struct StderrTraceSink;

impl TraceSink for StderrTraceSink {
    fn on_event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::InstructionStart { pc, raw_word } => {
                eprintln!("{pc:08x}: {raw_word:08x}  {}", disassemble(raw_word));
            }
            TraceEvent::RegisterWrite { reg, value } => {
                eprintln!("          {reg} <- {value:#010x}");
            }
            TraceEvent::MemoryAccess {
                addr,
                value,
                is_write,
            } => {
                let kind = if is_write { "store" } else { "load" };
                eprintln!("          {kind} [{addr:#x}] = {value:#010x}");
            }
            TraceEvent::InstructionRetired { next_pc, cycle, .. } => {
                eprintln!("          cycle {cycle}, next pc {next_pc:#010x}");
            }
            TraceEvent::FaultRaised { cause, pc } => {
                eprintln!("{pc:08x}: fault: {cause}");
            }
        }
    }
}

fn run_run(args: &ProgramArgs) -> Result<(), HarnessError> {
    let program = read_program(&args.input)?;
    let mut state = CoreState::with_config(&args.config);
    load_program(&mut state, &program)?;

    let outcome = run_with_sink(
        &mut state,
        &args.config,
        RunBoundary::SelfLoop,
        args.cycles,
        &mut StderrTraceSink,
    );

    let stop = match outcome.final_step {
        Some(StepOutcome::Fault { cause }) => format!("fault: {cause}"),
        Some(StepOutcome::Retired { pc, next_pc }) if pc == next_pc => "self-loop".to_string(),
        _ => "cycle limit".to_string(),
    };
    println!(
        "Retired {} instruction(s), pc = {:#010x} ({stop})",
        outcome.steps,
        state.pc()
    );
    print_registers(&state);
    Ok(())
}

fn print_registers(state: &CoreState) {
    for row in Gpr::ALL.chunks(4) {
        let line: Vec<String> = row
            .iter()
            .map(|reg| format!("{:>4} = {:#010x}", reg.to_string(), state.register(*reg)))
            .collect();
        println!("{}", line.join("  "));
    }
}

fn run_test(args: &ProgramArgs) -> Result<bool, HarnessError> {
    let program = read_program(&args.input)?;

    if program.expectations.is_empty() {
        println!("No checks found in {}", args.input.display());
        return Ok(true);
    }

    let result = run_program_tests(&program, &args.config, args.cycles)?;
    report_test_result(&result, true);
    Ok(result.all_passed())
}

fn report_test_result(result: &TestRunResult, verbose: bool) {
    for check in &result.checks {
        if verbose || !check.passed {
            println!("{check}");
        }
    }
    if let Some(fault) = &result.fault {
        println!("note: {fault}");
    }
    let summary = result.summary();
    println!("Test Summary: {summary} (total: {})", summary.total);
}

fn run_alu(args: &AluArgs) {
    let result = evaluate_selector(args.operand1, args.operand2, args.selector);
    let name = AluOp::from_selector(args.selector).map_or("invalid", AluOp::mnemonic);
    println!(
        "{name} {:#010x}, {:#010x} = {result:#010x} ({result})",
        args.operand1, args.operand2
    );
}

fn run_oracles() -> Result<bool, HarnessError> {
    let config = CoreConfig::default();
    let mut all_passed = true;

    for (name, rows) in [("imem", &IMEM_ORACLE[..]), ("datapath", &DATAPATH_ORACLE[..])] {
        println!("{name} oracle:");
        let result = run_oracle(rows, &config)?;
        report_test_result(&result, false);
        all_passed &= result.all_passed();
    }

    let alu = run_alu_oracle();
    let failed: Vec<_> = alu.iter().filter(|check| !check.passed()).collect();
    for check in &failed {
        let (selector, a, b, expected) = check.case;
        println!(
            "FAIL alu selector {selector}: {a:#x}, {b:#x} expected {expected:#x}, actual {:#x}",
            check.actual
        );
    }
    println!(
        "alu oracle: {} passed, {} failed",
        alu.len() - failed.len(),
        failed.len()
    );

    Ok(all_passed && failed.is_empty())
}

fn exit_code(result: Result<bool, HarnessError>) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(error) => {
            eprintln!("error: {error}");
            1
        }
    }
}

fn main() {
    let exit = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Run(args))) => exit_code(run_run(&args).map(|()| true)),
        Ok(ParseResult::Command(Command::Test(args))) => exit_code(run_test(&args)),
        Ok(ParseResult::Command(Command::Alu(args))) => {
            run_alu(&args);
            0
        }
        Ok(ParseResult::Command(Command::Decode(word))) => {
            println!("{word:#010x}: {}", disassemble(word));
            0
        }
        Ok(ParseResult::Command(Command::Oracle)) => exit_code(run_oracles()),
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit);
}
