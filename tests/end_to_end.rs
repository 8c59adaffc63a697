//! The eight literal end-to-end scenarios (spec.md §8). Driven through
//! `ren::compile_and_run_str` rather than spawning a built `renc` binary
//! (the teacher's `tests/*.rs` shell out to `./target/debug/why` via
//! `std::process::Command`; see `SPEC_FULL.md` §4 for why that approach
//! was not carried over here) so these run as plain `cargo test` unit-style
//! integration tests with no build-artifact path to keep in sync.

use std::path::Path;

use ren::{compile_and_run_str, interpreter::RunConfig};

fn run(source: &str) -> Result<i32, Vec<ren::checker::TypeCheckError>> {
    compile_and_run_str(Path::new("main.ren"), source, RunConfig::default())
}

fn run_with_args(source: &str, args: Vec<String>) -> Result<i32, Vec<ren::checker::TypeCheckError>> {
    compile_and_run_str(Path::new("main.ren"), source, RunConfig { program_args: args, ..RunConfig::default() })
}

#[test]
fn scenario_1_integer_literal_return() {
    let code = run("func int main(string[] args) => 42").expect("type-checks");
    assert_eq!(code, 42);
}

#[test]
fn scenario_2_explicit_return_zero() {
    let code = run("func int main(string[] args) => { return 0 }").expect("type-checks");
    assert_eq!(code, 0);
}

#[test]
fn scenario_3_call_and_return_roundtrip() {
    let source = "func int add(int a, int b) => a + b\nfunc int main(string[] args) => add(2, 3)";
    let code = run(source).expect("type-checks");
    assert_eq!(code, 5);
}

#[test]
fn scenario_4_if_else_expression() {
    let code = run("func int main(string[] args) => if (true) 1 else 0").expect("type-checks");
    assert_eq!(code, 1);
}

#[test]
fn scenario_5_for_over_args_with_one_argument() {
    let source = "func int main(string[] args) => { for (c in args) { return 7 }; return 0 }";
    let code = run_with_args(source, vec!["x".to_string()]).expect("type-checks");
    assert_eq!(code, 7);
}

#[test]
fn scenario_5_for_over_args_with_no_arguments() {
    let source = "func int main(string[] args) => { for (c in args) { return 7 }; return 0 }";
    let code = run_with_args(source, vec![]).expect("type-checks");
    assert_eq!(code, 0);
}

#[test]
fn scenario_6_finally_overrides_catch_return() {
    let source = r#"func int main(string[] args) => {
        try { throw "x" } catch (string s) { return 9 } finally { return 8 }
    }"#;
    let code = run(source).expect("type-checks");
    assert_eq!(code, 8);
}

#[test]
fn scenario_7_type_mismatch_is_an_aggregate_failure() {
    let errors = run("func int main(string[] args) => true").unwrap_err();
    assert_eq!(errors.len(), 1);
    let rendered = errors[0].to_string();
    assert!(rendered.contains("Type \"bool\" is not assignable to type \"signed 32-bit integer\""));
    assert!(rendered.contains("1:1"));
}

#[test]
fn scenario_8_uncaught_throw_exits_non_zero() {
    let code = run(r#"func int main(string[] args) => { throw "boom" }"#).expect("type-checks");
    assert_ne!(code, 0);
}
