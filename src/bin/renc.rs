//! `renc`: the Ren CLI (spec.md §6 "External interfaces").
//!
//! `renc <entry-module-path> [args...]` type-checks and runs the entry
//! module, forwarding `args` to the Ren `main` function as `string[]`.
//! Exit code is `main`'s integer return, 0 for void, or non-zero on an
//! uncaught exception or compilation failure.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::Level;
use ren::{diagnostics::format_type_errors, interpreter::RunConfig};

/// See the teacher's `bin/why/cli.rs`: a `ValueEnum` log level, not a bare
/// `log::LevelFilter`, so `clap` can print the human-readable variants in
/// `--help` and accept numeric aliases.
#[derive(ValueEnum, Clone, Default, Debug)]
enum LogLevel {
    #[default]
    Warn,
    Error,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EmitStage {
    Ast,
    Ir,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Type checker, IR translator and stack-machine interpreter for Ren")]
struct Cli {
    /// Path to the entry module's source file.
    entry: PathBuf,

    /// Arguments forwarded to the Ren program's `main(string[] args)`.
    args: Vec<String>,

    /// Extra directories searched for non-relative `import from "..."` references.
    #[arg(long = "search-path")]
    search_paths: Vec<PathBuf>,

    /// Maximum call-stack depth before an uncatchable overflow (spec.md §5).
    #[arg(long, default_value_t = 2048)]
    max_stack_depth: usize,

    #[arg(long, value_enum, default_value_t = LogLevel::default())]
    log_level: LogLevel,

    /// Dump an intermediate pipeline stage as JSON instead of running the program.
    #[arg(long, value_enum)]
    emit: Option<EmitStage>,
}

/// `anyhow` covers only the CLI boundary (bad flags, a logger that refuses
/// to install twice); the compiler's own failure mode — an aggregate type
/// error list — is printed and turned into a process exit code directly,
/// mirroring the teacher's `yc.rs::fn main() -> anyhow::Result<()>`.
fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    simple_logger::init_with_level(cli.log_level.clone().into()).context("failed to install logger")?;

    match run(cli) {
        Ok(code) => Ok(exit_code(code)),
        Err(errors) => {
            eprintln!("{}", format_type_errors(&errors));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run(cli: Cli) -> Result<i32, Vec<ren::checker::TypeCheckError>> {
    let compiled = ren::compile_file(&cli.entry, cli.search_paths)?;

    if let Some(stage) = cli.emit {
        print_emit(stage, &compiled);
        return Ok(0);
    }

    let config = RunConfig { max_stack_depth: cli.max_stack_depth, program_args: cli.args };
    Ok(ren::run_compiled_program(&compiled, config))
}

/// The typed AST and the IR instruction table don't derive `Serialize`
/// (`typesys::Type` owns interior-mutable `Rc<RefCell<..>>` cells that
/// can't round-trip through serde without a custom visitor not worth
/// writing for a debug-only flag) — so this emits their `Debug` rendering
/// wrapped in a small JSON envelope instead of a structural dump.
fn print_emit(stage: EmitStage, compiled: &ren::Compiled) {
    let body = match stage {
        EmitStage::Ast => format!("{:#?}", compiled.typed_programs),
        EmitStage::Ir => format!("{:#?}", compiled.ir.functions),
    };
    let doc = serde_json::json!({ "stage": format!("{stage:?}").to_lowercase(), "debug": body });
    println!("{}", serde_json::to_string_pretty(&doc).expect("json envelope always serializes"));
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code.rem_euclid(256)).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
}
