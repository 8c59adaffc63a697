//! Parsed *syntax* for type expressions (`i32`, `(i32, str)`, `T[]`, ...).
//!
//! This is deliberately distinct from [`crate::typesys::Type`]: `TypeName`
//! is what the grammar produced, before names have been resolved against a
//! module's declarations; `Type` is the semantic type the checker assigns.
//! The checker's `TryFrom<(TypeName, &Context)> for Type` (see
//! `checker::resolve_types`) is the bridge between the two, mirroring the
//! teacher's `TryFrom<(T, &Context)> for Type` in `typechecker/types.rs`.

use crate::lexer::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    /// A bare name: a primitive (`i32`, `bool`, ...) or a user type name.
    Literal(String, Span),
    Fn {
        params: Vec<TypeName>,
        return_type: Box<TypeName>,
        position: Span,
    },
    Tuple(Vec<TypeName>, Span),
    Struct(Vec<(String, TypeName)>, Span),
    Array(Box<TypeName>, Span),
    Union(Vec<TypeName>, Span),
    /// Generic application, `Box<i32>`.
    Specific(Box<TypeName>, Vec<TypeName>, Span),
    Parenthesized(Box<TypeName>, Span),
    NamespaceAccess(Vec<String>, Span),
}

impl TypeName {
    pub fn position(&self) -> Span {
        match self {
            TypeName::Literal(_, s)
            | TypeName::Fn { position: s, .. }
            | TypeName::Tuple(_, s)
            | TypeName::Struct(_, s)
            | TypeName::Array(_, s)
            | TypeName::Union(_, s)
            | TypeName::Specific(_, _, s)
            | TypeName::Parenthesized(_, s)
            | TypeName::NamespaceAccess(_, s) => s.clone(),
        }
    }
}

/// Variance annotation on a declared type parameter (`<+T>`, `<-T>`, `<T>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Variance {
    Covariant,
    Contravariant,
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameterName {
    pub name: String,
    pub variance: Variance,
    pub constraint: Option<TypeName>,
    pub position: Span,
}
