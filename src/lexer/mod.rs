//! Source-position tracking shared by every later stage.
//!
//! The actual tokenization is delegated to `pest` (see `parser::cst`); this
//! module only owns the `Span`/`Position` types every AST node and
//! diagnostic carries, plus the per-role span map used to point at a
//! specific sub-part of a node ("the `self` keyword", "the `name` of this
//! field", ...) rather than only the node as a whole.

use std::{collections::HashMap, fmt::Display, path::Path};

/// A single point in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open source range, (start-line, start-column, end-line, end-column).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub file: String,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            file: file.into(),
            start,
            end,
        }
    }

    /// A span covering neither file nor range; used for synthesized nodes
    /// (e.g. the `noop` normalizing an empty block) where no source text
    /// corresponds 1:1, and in tests.
    pub fn synthetic() -> Self {
        Self::default()
    }

    pub fn to_string(&self, message: impl Display) -> String {
        format!(
            "{message} [{file}:{line}:{col}]",
            file = self.file,
            line = self.start.line,
            col = self.start.column
        )
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file, self.start.line, self.start.column
        )
    }
}

pub trait GetPosition {
    fn position(&self) -> Span;
}

/// Per-role span map attached to a node: e.g. a function declaration keeps
/// the span of its `name`, its `self` keyword (for methods) and the whole
/// declaration under distinct roles so diagnostics can point precisely at
/// whichever part is wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Locations {
    roles: HashMap<String, Span>,
}

impl Locations {
    pub fn new(self_span: Span) -> Self {
        let mut roles = HashMap::new();
        roles.insert("self".to_owned(), self_span);
        Self { roles }
    }

    pub fn with(mut self, role: &str, span: Span) -> Self {
        self.roles.insert(role.to_owned(), span);
        self
    }

    pub fn get(&self, role: &str) -> Option<&Span> {
        self.roles.get(role)
    }

    /// The span covering the node's full textual extent.
    pub fn node(&self) -> Span {
        self.roles.get("self").cloned().unwrap_or_default()
    }
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "_".to_owned())
}
