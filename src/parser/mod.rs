//! Parsing: source text → CST (`cst`) → AST (`reduce`), per spec.md §4.2.

pub mod ast;
pub mod cst;
pub mod precedence;
pub mod reduce;

use ast::Program;

#[derive(Debug)]
pub enum ParseError {
    Cst(cst::CstParseError),
    Reduce(reduce::ReduceError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Cst(e) => write!(f, "{e}"),
            ParseError::Reduce(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Cst(e) => Some(e),
            ParseError::Reduce(e) => Some(e),
        }
    }
}

impl From<cst::CstParseError> for ParseError {
    fn from(e: cst::CstParseError) -> Self {
        ParseError::Cst(e)
    }
}

impl From<reduce::ReduceError> for ParseError {
    fn from(e: reduce::ReduceError) -> Self {
        ParseError::Reduce(e)
    }
}

/// Parses a single source file into a `Program<()>` (spec.md §3/§4.2).
/// `file` is used as the logical file name stamped into every `Span`.
pub fn parse_program(file: &str, source: &str) -> Result<Program<()>, ParseError> {
    let pairs = cst::RenParser::parse_program(file, source)?;
    let program = reduce::parse_program(pairs, file)?;
    Ok(program)
}
