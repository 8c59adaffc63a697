//! Diagnostic formatting (spec.md §7 "User-visible failure").
//!
//! Shared by the CLI: the aggregate type-error list produced by
//! [`crate::checker::Checker::check`] and the uncaught-exception stack
//! trace the interpreter prints to stderr are both rendered through here,
//! so both surfaces share one `<message> [<path>:<line>:<column>]` format
//! and the same coloring policy (teacher's `colored` dependency).

use colored::Colorize;

use crate::checker::TypeCheckError;

/// Renders the full aggregate list of type errors, one per line, in the
/// order they were produced. Matches spec.md §7's format exactly; color is
/// cosmetic and stripped automatically when stdout/stderr isn't a tty
/// (`colored` checks `NO_COLOR`/terminal support itself).
pub fn format_type_errors(errors: &[TypeCheckError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}", e.to_string().red()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single stack-trace line for an uncaught runtime exception: the
/// function's name and the declaration site it was translated from.
pub struct StackTraceFrame {
    pub function_name: String,
}

pub fn format_uncaught(message: &str, trace: &[StackTraceFrame]) -> String {
    let mut out = format!("{} {}", "uncaught exception:".red().bold(), message);
    for frame in trace {
        out.push_str(&format!("\n  at {}", frame.function_name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::error::{TypeMismatch, TypeCheckError as TCE};
    use crate::lexer::{Position, Span};
    use crate::typesys::{IntWidth, Type};

    #[test]
    fn formats_type_mismatch_per_spec_contract() {
        let err = TCE::TypeMismatch(
            TypeMismatch {
                expected: Type::Integer { width: IntWidth::W32, signed: true },
                actual: Type::Bool,
            },
            Span::new("main.ren", Position::new(1, 1), Position::new(1, 5)),
        );
        let rendered = format_type_errors(&[err]);
        assert!(rendered.contains("Type \"bool\" is not assignable to type \"signed 32-bit integer\""));
        assert!(rendered.contains("[main.ren:1:1]"));
    }
}
