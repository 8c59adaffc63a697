//! The type checker's diagnostic taxonomy (spec.md §7).

use std::{error::Error, fmt::Display};

use crate::{lexer::Span, parser::ast::TypeName, typesys::Type};

#[derive(Clone, Debug)]
pub enum TypeCheckError {
    TypeMismatch(TypeMismatch, Span),
    ModuleNotFound(ModuleNotFound, Span),
    ExportNotFound(ExportNotFound, Span),
    UndefinedValue(UndefinedValue, Span),
    UndefinedType(UndefinedType, Span),
    NameClash(NameClash, Span),
    ExportClash(ExportClash, Span),
    CircularType(CircularType, Span),
    OperatorNotDefined(OperatorNotDefined, Span),
    LoopControlOutOfRange(LoopControlOutOfRange, Span),
    MainSignatureError(MainSignatureError, Span),
    GenericArityMismatch(GenericArityMismatch, Span),
    ConstraintNotSatisfied(ConstraintNotSatisfied, Span),
    UndefinedField(UndefinedField, Span),
}

impl TypeCheckError {
    pub fn span(&self) -> Span {
        match self {
            TypeCheckError::TypeMismatch(_, s)
            | TypeCheckError::ModuleNotFound(_, s)
            | TypeCheckError::ExportNotFound(_, s)
            | TypeCheckError::UndefinedValue(_, s)
            | TypeCheckError::UndefinedType(_, s)
            | TypeCheckError::NameClash(_, s)
            | TypeCheckError::ExportClash(_, s)
            | TypeCheckError::CircularType(_, s)
            | TypeCheckError::OperatorNotDefined(_, s)
            | TypeCheckError::LoopControlOutOfRange(_, s)
            | TypeCheckError::MainSignatureError(_, s)
            | TypeCheckError::GenericArityMismatch(_, s)
            | TypeCheckError::ConstraintNotSatisfied(_, s)
            | TypeCheckError::UndefinedField(_, s) => s.clone(),
        }
    }

    fn message(&self) -> String {
        match self {
            TypeCheckError::TypeMismatch(e, _) => e.to_string(),
            TypeCheckError::ModuleNotFound(e, _) => e.to_string(),
            TypeCheckError::ExportNotFound(e, _) => e.to_string(),
            TypeCheckError::UndefinedValue(e, _) => e.to_string(),
            TypeCheckError::UndefinedType(e, _) => e.to_string(),
            TypeCheckError::NameClash(e, _) => e.to_string(),
            TypeCheckError::ExportClash(e, _) => e.to_string(),
            TypeCheckError::CircularType(e, _) => e.to_string(),
            TypeCheckError::OperatorNotDefined(e, _) => e.to_string(),
            TypeCheckError::LoopControlOutOfRange(e, _) => e.to_string(),
            TypeCheckError::MainSignatureError(e, _) => e.to_string(),
            TypeCheckError::GenericArityMismatch(e, _) => e.to_string(),
            TypeCheckError::ConstraintNotSatisfied(e, _) => e.to_string(),
            TypeCheckError::UndefinedField(e, _) => e.to_string(),
        }
    }
}

impl Display for TypeCheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.span().to_string(self.message()))
    }
}

impl Error for TypeCheckError {}

#[derive(Clone, Debug)]
pub struct TypeMismatch {
    pub expected: Type,
    pub actual: Type,
}

impl Display for TypeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Type \"{:?}\" is not assignable to type \"{:?}\"",
            self.actual, self.expected
        )
    }
}

#[derive(Clone, Debug)]
pub struct ModuleNotFound {
    pub reference: String,
}

impl Display for ModuleNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Module {} does not exist", self.reference)
    }
}

#[derive(Clone, Debug)]
pub struct ExportNotFound {
    pub module: String,
    pub name: String,
}

impl Display for ExportNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Module {} does not have an export named {}",
            self.module, self.name
        )
    }
}

#[derive(Clone, Debug)]
pub struct UndefinedValue {
    pub name: String,
}

impl Display for UndefinedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Value {} is not defined", self.name)
    }
}

#[derive(Clone, Debug)]
pub struct UndefinedType {
    pub type_name: TypeName,
}

impl Display for UndefinedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Undefined type {:?}", self.type_name)
    }
}

#[derive(Clone, Debug)]
pub struct NameClash {
    pub name: String,
}

impl Display for NameClash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' is already defined in this module", self.name)
    }
}

#[derive(Clone, Debug)]
pub struct ExportClash {
    pub name: String,
}

impl Display for ExportClash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' is already exported from this module", self.name)
    }
}

#[derive(Clone, Debug)]
pub struct CircularType {
    pub name: String,
}

impl Display for CircularType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cannot resolve type, circular dependency found for '{}'", self.name)
    }
}

#[derive(Clone, Debug)]
pub struct OperatorNotDefined {
    pub operator: String,
    pub operand_types: Vec<Type>,
}

impl Display for OperatorNotDefined {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Operator '{}' is not defined for ({})",
            self.operator,
            self.operand_types
                .iter()
                .map(|t| format!("{t:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[derive(Clone, Debug)]
pub struct LoopControlOutOfRange {
    pub depth: u32,
    pub loop_depth: u32,
}

impl Display for LoopControlOutOfRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Loop control depth {} is out of range (current loop depth is {})",
            self.depth, self.loop_depth
        )
    }
}

#[derive(Clone, Debug)]
pub struct MainSignatureError {
    pub found: Option<Type>,
}

impl Display for MainSignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.found {
            Some(t) => write!(
                f,
                "'main' must have signature (string[]) => (void | int), found {t:?}"
            ),
            None => write!(f, "entry module has no 'main' function"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GenericArityMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl Display for GenericArityMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Expected {} type argument(s) but got {}",
            self.expected, self.actual
        )
    }
}

#[derive(Clone, Debug)]
pub struct ConstraintNotSatisfied {
    pub parameter: String,
    pub constraint: Type,
    pub actual: Type,
}

impl Display for ConstraintNotSatisfied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Type argument '{:?}' for '{}' does not satisfy constraint '{:?}'",
            self.actual, self.parameter, self.constraint
        )
    }
}

#[derive(Clone, Debug)]
pub struct UndefinedField {
    pub field: String,
    pub base_type: Type,
}

impl Display for UndefinedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Type \"{:?}\" has no field \"{}\"", self.base_type, self.field)
    }
}
