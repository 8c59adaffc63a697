//! Expression nodes of the AST (spec.md §3 "Expressions").
//!
//! Every node is generic over `T`, the type-slot: the parser always
//! produces `Expression<()>`; the checker rewrites that into
//! `Expression<Type>` by assigning exactly one type to each node (set
//! once, per spec.md §3's AST lifecycle). `T: Clone` is all call sites
//! need, matching how the teacher's `Expression<T>` is used throughout
//! `typechecker` and `codegen`.

use crate::lexer::Span;

use super::type_name::TypeName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id<T> {
    pub name: String,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLiteral<T> {
    pub elements: Vec<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleLiteral<T> {
    pub elements: Vec<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructFieldInit<T> {
    pub name: String,
    pub value: Expression<T>,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLiteral<T> {
    pub name: Option<String>,
    pub fields: Vec<StructFieldInit<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaParameter<T> {
    pub name: String,
    pub type_annotation: Option<TypeName>,
    pub info: T,
    pub position: Span,
}

/// A lambda's body is either a block (`{ ... }`, evaluated for its `return`s)
/// or a single expression (`=> expr`), mirroring `FunctionBody`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LambdaBody<T> {
    Block(super::statement::Block<T>),
    Expression(Box<Expression<T>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lambda<T> {
    pub params: Vec<LambdaParameter<T>>,
    pub return_type: Option<TypeName>,
    pub body: LambdaBody<T>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum UnaryOperator {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpression<T> {
    pub operator: UnaryOperator,
    pub operand: Expression<T>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpression<T> {
    pub operator: BinaryOperator,
    pub lhs: Expression<T>,
    pub rhs: Expression<T>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfExpression<T> {
    pub condition: Expression<T>,
    pub then_branch: Expression<T>,
    pub else_branch: Option<Expression<T>>,
    pub info: T,
    pub position: Span,
}

/// `let x[: T] = e`. A variable *declaration expression*, not a statement:
/// it evaluates to the assigned value and introduces `x` into the
/// enclosing scope for the remainder of the block, per spec.md §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration<T> {
    pub name: String,
    pub type_annotation: Option<TypeName>,
    pub value: Expression<T>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application<T> {
    pub callee: Expression<T>,
    pub type_args: Vec<TypeName>,
    pub args: Vec<Expression<T>>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccess<T> {
    pub base: Expression<T>,
    pub field: String,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayAccess<T> {
    pub base: Expression<T>,
    pub index: Expression<T>,
    pub info: T,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression<T> {
    Integer(i64, T, Span),
    Float(u64, T, Span), // bit pattern; floats are not `Eq`, see `FloatBits` helpers below
    Char(char, T, Span),
    Str(String, T, Span),
    Bool(bool, T, Span),
    Id(Id<T>),
    Array(ArrayLiteral<T>),
    Tuple(TupleLiteral<T>),
    Struct(StructLiteral<T>),
    Lambda(Lambda<T>),
    Unary(Box<UnaryExpression<T>>),
    Binary(Box<BinaryExpression<T>>),
    If(Box<IfExpression<T>>),
    VariableDeclaration(Box<VariableDeclaration<T>>),
    Application(Box<Application<T>>),
    FieldAccess(Box<FieldAccess<T>>),
    ArrayAccess(Box<ArrayAccess<T>>),
    Parenthesized(Box<Expression<T>>, Span),
}

impl<T> Expression<T>
where
    T: Clone,
{
    pub fn get_info(&self) -> T {
        match self {
            Expression::Integer(_, info, _)
            | Expression::Float(_, info, _)
            | Expression::Char(_, info, _)
            | Expression::Str(_, info, _)
            | Expression::Bool(_, info, _) => info.clone(),
            Expression::Id(Id { info, .. }) => info.clone(),
            Expression::Array(ArrayLiteral { info, .. }) => info.clone(),
            Expression::Tuple(TupleLiteral { info, .. }) => info.clone(),
            Expression::Struct(StructLiteral { info, .. }) => info.clone(),
            Expression::Lambda(Lambda { info, .. }) => info.clone(),
            Expression::Unary(e) => e.info.clone(),
            Expression::Binary(e) => e.info.clone(),
            Expression::If(e) => e.info.clone(),
            Expression::VariableDeclaration(e) => e.info.clone(),
            Expression::Application(e) => e.info.clone(),
            Expression::FieldAccess(e) => e.info.clone(),
            Expression::ArrayAccess(e) => e.info.clone(),
            Expression::Parenthesized(inner, _) => inner.get_info(),
        }
    }

    pub fn position(&self) -> Span {
        match self {
            Expression::Integer(_, _, s)
            | Expression::Float(_, _, s)
            | Expression::Char(_, _, s)
            | Expression::Str(_, _, s)
            | Expression::Bool(_, _, s) => s.clone(),
            Expression::Id(Id { position, .. }) => position.clone(),
            Expression::Array(ArrayLiteral { position, .. }) => position.clone(),
            Expression::Tuple(TupleLiteral { position, .. }) => position.clone(),
            Expression::Struct(StructLiteral { position, .. }) => position.clone(),
            Expression::Lambda(Lambda { position, .. }) => position.clone(),
            Expression::Unary(e) => e.position.clone(),
            Expression::Binary(e) => e.position.clone(),
            Expression::If(e) => e.position.clone(),
            Expression::VariableDeclaration(e) => e.position.clone(),
            Expression::Application(e) => e.position.clone(),
            Expression::FieldAccess(e) => e.position.clone(),
            Expression::ArrayAccess(e) => e.position.clone(),
            Expression::Parenthesized(_, s) => s.clone(),
        }
    }
}

/// Helpers for the `Float` variant, which stores an IEEE-754 bit pattern
/// rather than `f64` so that `Expression` can derive `Eq`/`Hash` like every
/// other AST node (needed for the checker's memoization keys).
impl<T> Expression<T> {
    pub fn float_literal(value: f64, info: T, position: Span) -> Self {
        Expression::Float(value.to_bits(), info, position)
    }
}

pub fn float_value(bits: u64) -> f64 {
    f64::from_bits(bits)
}
