//! Concrete syntax tree: the raw `pest` parse of a source file.
//!
//! `reduce` consumes the `Pairs<Rule>` this produces and rewrites it into
//! the AST (`parser::ast`). Nothing here carries semantic meaning; it is
//! exactly what the grammar in `ren.pest` describes.

use pest::iterators::Pairs;
use pest_derive::Parser;
use std::{error::Error, fmt::Display};

#[derive(Parser)]
#[grammar = "parser/ren.pest"]
pub struct RenParser;

#[derive(Debug, Clone)]
pub struct CstParseError {
    pub file: String,
    pub message: String,
}

impl Display for CstParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.message, self.file)
    }
}

impl Error for CstParseError {}

impl RenParser {
    /// Parse a whole compilation unit. Lexical/parse errors are reported by
    /// the external parser layer (spec's "out of scope" boundary); the type
    /// checker only ever sees a well-formed CST.
    pub fn parse_program<'a>(file: &str, source: &'a str) -> Result<Pairs<'a, Rule>, CstParseError> {
        <Self as pest::Parser<Rule>>::parse(Rule::program, source).map_err(|err| CstParseError {
            file: file.to_owned(),
            message: err.to_string(),
        })
    }
}
