//! `ren`: type checker, IR translator and stack-machine interpreter for the
//! Ren programming language (see `SPEC_FULL.md`).
//!
//! The pipeline, leaf-to-root: [`typesys`] (no dependencies) → [`parser`]
//! (lexing via `pest`, CST, AST reduction) → [`checker`] (whole-program type
//! checking across [`module`]s reached through a [`resolver`]) → [`ir`] (the
//! flat instruction set) → [`translator`] (typed AST → IR) → [`runtime`]
//! (values/frames) → [`interpreter`] (the stack machine that executes IR).
//!
//! `compile_and_run_str`/`compile_and_run_file` are the two entry points the
//! `renc` binary and the integration tests both drive; `compile_only` stops
//! before execution, for callers that just want the typed program or the
//! aggregate diagnostics.

pub mod checker;
pub mod diagnostics;
pub mod interpreter;
pub mod ir;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod resolver;
pub mod runtime;
pub mod translator;
pub mod typesys;

use std::path::{Path, PathBuf};

use checker::{Checker, TypeCheckError, TypedProgram};
use interpreter::{Interpreter, RunConfig};
use module::Module;
use resolver::{FilesystemResolver, ModuleResolver};
use translator::Translator;

/// Everything produced by the front half of the pipeline (parse + check +
/// translate), short of actually running it. Exposed so tooling (e.g. the
/// CLI's `--emit ast|ir`) can serialize an intermediate stage without
/// duplicating the pipeline wiring.
pub struct Compiled {
    pub entry_path: PathBuf,
    pub typed_programs: std::collections::HashMap<PathBuf, TypedProgram>,
    pub ir: ir::Program,
}

/// Parses, registers, and type-checks `entry` and every module it
/// transitively imports, resolved relative to `search_paths` (spec.md §6
/// "Module resolver"). Returns the aggregate diagnostic list on failure
/// (spec.md §7 "After checking, the full list is surfaced as a single
/// aggregate failure"); translation never runs if checking failed.
pub fn compile_file(entry: &Path, search_paths: Vec<PathBuf>) -> Result<Compiled, Vec<TypeCheckError>> {
    let (canonical, module) = checker::declare::parse_entry_module(entry)
        .map_err(|e| vec![parse_failure(entry, e)])?;
    compile_module(canonical, module, search_paths)
}

/// Same pipeline as [`compile_file`], but for source text already in
/// memory (used by the integration tests, which have no file on disk).
/// `virtual_path` is stamped into spans and used as the module's identity
/// for import resolution, exactly as a real file path would be.
pub fn compile_str(
    virtual_path: &Path,
    source: &str,
    search_paths: Vec<PathBuf>,
) -> Result<Compiled, Vec<TypeCheckError>> {
    let program = parser::parse_program(&virtual_path.to_string_lossy(), source)
        .map_err(|e| vec![parse_failure(virtual_path, e)])?;
    let name = lexer::file_stem(virtual_path);
    let module = Module::new(name, virtual_path.to_path_buf(), program);
    compile_module(virtual_path.to_path_buf(), module, search_paths)
}

fn compile_module(
    canonical: PathBuf,
    module: Module,
    search_paths: Vec<PathBuf>,
) -> Result<Compiled, Vec<TypeCheckError>> {
    let resolver: Box<dyn ModuleResolver> = Box::new(FilesystemResolver::new(search_paths));
    let mut checker = Checker::new(resolver);
    let typed_programs = checker.check(&module)?;

    let ir = Translator::new(&mut checker, &typed_programs).translate(&canonical);
    Ok(Compiled { entry_path: canonical, typed_programs, ir })
}

/// A parse error surfaced before the checker ever runs has no `Span` of its
/// own scoped to a single node; spec.md §7 treats lexical/parse failures as
/// a precondition the checker doesn't see, so this wraps it in the same
/// `TypeCheckError` surface (a `ModuleNotFound`-shaped message carrying the
/// whole file as its "location") purely so callers have one error type to
/// match on.
fn parse_failure(path: &Path, err: impl std::fmt::Display) -> TypeCheckError {
    use checker::error::{ModuleNotFound, TypeCheckError as TCE};
    TCE::ModuleNotFound(
        ModuleNotFound { reference: format!("{}: parse error: {err}", path.display()) },
        lexer::Span::synthetic(),
    )
}

/// Compiles and runs `entry`, returning the process exit code (spec.md §6).
pub fn compile_and_run_file(
    entry: &Path,
    search_paths: Vec<PathBuf>,
    config: RunConfig,
) -> Result<i32, Vec<TypeCheckError>> {
    let compiled = compile_file(entry, search_paths)?;
    Ok(run_compiled_program(&compiled, config))
}

/// Compiles and runs in-memory source text; used throughout `tests/`.
pub fn compile_and_run_str(
    virtual_path: &Path,
    source: &str,
    config: RunConfig,
) -> Result<i32, Vec<TypeCheckError>> {
    let compiled = compile_str(virtual_path, source, vec![])?;
    Ok(run_compiled_program(&compiled, config))
}

/// Runs an already-compiled program (spec.md §4.5); split out from
/// `compile_and_run_*` so the CLI's `--emit` flag can compile once and
/// choose between dumping an intermediate stage or actually running it.
pub fn run_compiled_program(compiled: &Compiled, config: RunConfig) -> i32 {
    let args = config.program_args.clone();
    Interpreter::new(&compiled.ir, &config).run(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_one_constant_return() {
        let code = compile_and_run_str(
            Path::new("main.ren"),
            "func int main(string[] args) => 42",
            RunConfig::default(),
        )
        .expect("type-checks");
        assert_eq!(code, 42);
    }

    #[test]
    fn scenario_seven_type_mismatch_is_reported() {
        let errors = compile_and_run_str(
            Path::new("main.ren"),
            "func int main(string[] args) => true",
            RunConfig::default(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("is not assignable to type"));
    }
}
