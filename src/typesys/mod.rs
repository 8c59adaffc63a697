//! The type system (spec.md §4.1): a closed family of types, their
//! assignability relation, and the generic utilities the checker needs.
//!
//! No dependency on the parser, checker, or anything above this module.

mod assignability;
mod infer;

pub use assignability::is_assignable_from;
pub use infer::{infer_type_args, specify, substitute};

use std::{
    cell::RefCell,
    fmt,
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    Unbounded,
}

impl IntWidth {
    /// Ordering used by the integer lattice; `Unbounded` is the top.
    pub fn rank(self) -> u8 {
        match self {
            IntWidth::W8 => 0,
            IntWidth::W16 => 1,
            IntWidth::W32 => 2,
            IntWidth::W64 => 3,
            IntWidth::Unbounded => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    W32,
    W64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    Covariant,
    Contravariant,
    Invariant,
}

#[derive(Clone)]
pub struct TypeParameter {
    pub name: String,
    pub variance: Variance,
    pub constraint: Option<Box<Type>>,
}

/// A single-assignment cell: `empty -> resolved`, used for both `inferred`
/// placeholders and `recursive` back-references (spec.md §9 "Design Notes").
/// Reads after resolution are immutable; writes after the first are no-ops
/// from the caller's point of view (`try_resolve` reports whether it won).
#[derive(Clone)]
pub struct TypeCell(Rc<RefCell<Option<Type>>>);

impl TypeCell {
    pub fn empty() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    pub fn get(&self) -> Option<Type> {
        self.0.borrow().clone()
    }

    /// Attempts to resolve the cell. Returns `true` the first time (this
    /// call wins and the value is now fixed), `false` on every later call
    /// (the existing value is left untouched).
    pub fn try_resolve(&self, value: Type) -> bool {
        let mut slot = self.0.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    pub(crate) fn ptr_key(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for TypeCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(t) => write!(f, "{t:?}"),
            None => write!(f, "<unresolved>"),
        }
    }
}

/// The closed family of types (spec.md §3 "Type").
#[derive(Clone)]
pub enum Type {
    Integer { width: IntWidth, signed: bool },
    Float(FloatWidth),
    Char,
    Bool,
    /// The empty tuple; `void` in source surface syntax (spec.md §6).
    Tuple(Vec<Type>),
    Struct(Vec<(String, Type)>),
    Array(Box<Type>),
    Function {
        params: Vec<Type>,
        return_type: Box<Type>,
        type_params: Vec<TypeParameter>,
    },
    /// `>= 2` components; constructing with fewer is a logic error in the
    /// caller (the checker never builds a single-element union).
    Union(Vec<Type>),
    /// Top: assignable from everything.
    Any,
    /// Bottom: assignable to everything; the type of a `throw`-only branch.
    Never,
    /// Error sentinel produced when a subterm's type could not be
    /// determined; propagates silently (assignability with `Unknown` on
    /// either side always succeeds) so the checker does not cascade errors.
    Unknown,
    /// A back-reference to a named type alias still being resolved.
    Recursive(TypeCell),
    /// A placeholder unified at most once (partially-annotated lambdas).
    Inferred(TypeCell),
    TypeParameter {
        name: String,
        variance: Variance,
        constraint: Option<Box<Type>>,
    },
    /// A generic type applied to concrete type arguments, kept around
    /// (rather than eagerly substituted) so diagnostics can still print the
    /// original generic name.
    Generic {
        base: Box<Type>,
        args: Vec<Type>,
    },
}

impl Type {
    pub fn void() -> Self {
        Type::Tuple(vec![])
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Tuple(fields) if fields.is_empty())
    }

    /// Follows `Recursive`/`Inferred` cells to their resolved value, one
    /// layer at a time (mirrors the teacher's single-layer `Reference`
    /// collapsing in `does_eq`). Returns `Unknown` if the cell is still
    /// unresolved (e.g. used before its declaration finished checking).
    pub fn resolve_shallow(&self) -> Type {
        match self {
            Type::Recursive(cell) | Type::Inferred(cell) => {
                cell.get().unwrap_or(Type::Unknown)
            }
            other => other.clone(),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer { width, signed } => {
                let sign = if *signed { "signed" } else { "unsigned" };
                let bits = match width {
                    IntWidth::W8 => "8".to_owned(),
                    IntWidth::W16 => "16".to_owned(),
                    IntWidth::W32 => "32".to_owned(),
                    IntWidth::W64 => "64".to_owned(),
                    IntWidth::Unbounded => "unbounded".to_owned(),
                };
                write!(f, "{sign} {bits}-bit integer")
            }
            Type::Float(FloatWidth::W32) => write!(f, "32-bit float"),
            Type::Float(FloatWidth::W64) => write!(f, "64-bit float"),
            Type::Char => write!(f, "char"),
            Type::Bool => write!(f, "bool"),
            Type::Tuple(fields) if fields.is_empty() => write!(f, "void"),
            Type::Tuple(fields) => f.debug_tuple("Tuple").field(fields).finish(),
            Type::Struct(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{ty:?} {name}")?;
                }
                write!(f, " }}")
            }
            Type::Array(elem) => write!(f, "{elem:?}[]"),
            Type::Function {
                params,
                return_type,
                ..
            } => write!(
                f,
                "({}) => {return_type:?}",
                params
                    .iter()
                    .map(|p| format!("{p:?}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Type::Union(members) => write!(
                f,
                "{}",
                members
                    .iter()
                    .map(|m| format!("{m:?}"))
                    .collect::<Vec<_>>()
                    .join(" | ")
            ),
            Type::Any => write!(f, "any"),
            Type::Never => write!(f, "never"),
            Type::Unknown => write!(f, "unknown"),
            Type::Recursive(cell) => write!(f, "recursive<{cell:?}>"),
            Type::Inferred(cell) => write!(f, "inferred<{cell:?}>"),
            Type::TypeParameter { name, .. } => write!(f, "{name}"),
            Type::Generic { base, args } => write!(
                f,
                "{base:?}<{}>",
                args.iter()
                    .map(|a| format!("{a:?}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Structural equality, collapsing `Recursive`/`Inferred` cells by pointer
/// identity (two distinct unresolved cells are never equal) and otherwise
/// comparing variants field-by-field. Mirrors the teacher's `Type::does_eq`.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Type::Integer { width: w1, signed: s1 },
                Type::Integer { width: w2, signed: s2 },
            ) => w1 == w2 && s1 == s2,
            (Type::Float(a), Type::Float(b)) => a == b,
            (Type::Char, Type::Char) | (Type::Bool, Type::Bool) => true,
            (Type::Tuple(a), Type::Tuple(b)) => a == b,
            (Type::Struct(a), Type::Struct(b)) => a == b,
            (Type::Array(a), Type::Array(b)) => a == b,
            (
                Type::Function {
                    params: p1,
                    return_type: r1,
                    ..
                },
                Type::Function {
                    params: p2,
                    return_type: r2,
                    ..
                },
            ) => p1 == p2 && r1 == r2,
            (Type::Union(a), Type::Union(b)) => a == b,
            (Type::Any, Type::Any) | (Type::Never, Type::Never) | (Type::Unknown, Type::Unknown) => {
                true
            }
            (Type::Recursive(a), Type::Recursive(b)) | (Type::Inferred(a), Type::Inferred(b)) => {
                a.ptr_key() == b.ptr_key()
            }
            (Type::TypeParameter { name: a, .. }, Type::TypeParameter { name: b, .. }) => a == b,
            (Type::Generic { base: b1, args: a1 }, Type::Generic { base: b2, args: a2 }) => {
                b1 == b2 && a1 == a2
            }
            _ => false,
        }
    }
}

/// "The most general type of (A,B)" (spec.md §4.1): `A` if `A ⊒ B`, else `B`
/// if `B ⊒ A`, else `any`. Used to compose the element type of an array
/// literal and the shared result type of if/try expressions.
pub fn most_general(a: &Type, b: &Type) -> Type {
    if is_assignable_from(a, b) {
        a.clone()
    } else if is_assignable_from(b, a) {
        b.clone()
    } else {
        Type::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_general_picks_the_wider_side_or_any() {
        let i32_t = Type::Integer {
            width: IntWidth::W32,
            signed: true,
        };
        let i64_t = Type::Integer {
            width: IntWidth::W64,
            signed: true,
        };
        assert_eq!(most_general(&i64_t, &i32_t), i64_t);
        assert_eq!(most_general(&i32_t, &i64_t), i64_t);
        assert_eq!(most_general(&Type::Bool, &Type::Char), Type::Any);
    }

    #[test]
    fn void_is_empty_tuple() {
        assert!(Type::void().is_void());
        assert!(!Type::Tuple(vec![Type::Bool]).is_void());
    }

    #[test]
    fn cell_resolves_exactly_once() {
        let cell = TypeCell::empty();
        assert!(cell.try_resolve(Type::Bool));
        assert!(!cell.try_resolve(Type::Char));
        assert_eq!(cell.get(), Some(Type::Bool));
    }

    #[test]
    fn debug_formats_integers_like_the_diagnostics_contract() {
        let t = Type::Integer {
            width: IntWidth::W32,
            signed: true,
        };
        assert_eq!(format!("{t:?}"), "signed 32-bit integer");
    }
}
