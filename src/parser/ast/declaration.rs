//! Top-level declaration nodes (spec.md §3 "Declarations").

use crate::lexer::Span;

use super::{
    expression::Expression,
    statement::Block,
    type_name::{TypeName, TypeParameterName},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub imported_name: String,
    pub local_alias: String,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportClause {
    /// `import from "mod": alias` — imports the module itself as a
    /// namespace value bound to `alias`.
    Whole(String),
    /// `import from "mod" { a, b as c }`.
    Named(Vec<ImportItem>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: String,
    pub clause: ImportClause,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: TypeName,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function<T> {
    pub name: String,
    pub type_parameters: Vec<TypeParameterName>,
    pub params: Vec<Parameter>,
    pub return_type: TypeName,
    pub body: FunctionBody<T>,
    pub info: T,
    pub position: Span,
}

/// A function's body is either a block (`{ ... }`) or a single expression
/// (`=> expr`); the translator treats the latter as `return expr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionBody<T> {
    Block(Block<T>),
    Expression(Box<Expression<T>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub name: String,
    pub type_parameters: Vec<TypeParameterName>,
    pub value: TypeName,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant<T> {
    pub name: String,
    pub type_annotation: Option<TypeName>,
    pub value: Expression<T>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace<T> {
    pub name: String,
    pub members: Vec<TopLevelStatement<T>>,
    pub position: Span,
}

/// `export name = value` (inline) or `export name` (forwarding an already
/// locally declared name), plus `export default expr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export<T> {
    Inline(Box<TopLevelStatement<T>>),
    Forward { name: String, position: Span },
    Default(Box<Expression<T>>, Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevelStatement<T> {
    Import(Import),
    Export(Export<T>),
    Namespace(Namespace<T>),
    TypeDeclaration(TypeDeclaration),
    Constant(Constant<T>),
    Function(Function<T>),
}

impl<T> TopLevelStatement<T> {
    pub fn position(&self) -> Span {
        match self {
            TopLevelStatement::Import(i) => i.position.clone(),
            TopLevelStatement::Export(Export::Inline(e)) => e.position(),
            TopLevelStatement::Export(Export::Forward { position, .. }) => position.clone(),
            TopLevelStatement::Export(Export::Default(_, s)) => s.clone(),
            TopLevelStatement::Namespace(n) => n.position.clone(),
            TopLevelStatement::TypeDeclaration(t) => t.position.clone(),
            TopLevelStatement::Constant(c) => c.position.clone(),
            TopLevelStatement::Function(f) => f.position.clone(),
        }
    }
}

/// A parsed compilation unit: the ordered list of top-level statements.
/// Owned by a `Module` once registered (see `crate::module`).
pub type Program<T> = Vec<TopLevelStatement<T>>;
