//! Runtime values and activation frames (spec.md §3 "Value"/"Frame").
//!
//! No dependency on the translator or interpreter's control logic — this is
//! just the data the interpreter pushes, pops, and mutates.

use std::collections::HashMap;

use crate::{
    ir::{FunctionId, Ic, RefId},
    typesys::{FloatWidth, IntWidth, Type},
};

/// A runtime value. Integers and floats carry their width/signedness so
/// `binary-op`/`unary-op` can apply the right wrapping semantics without
/// re-consulting the checker's `Type`; every other variant is exactly the
/// shape its `Type` counterpart describes.
#[derive(Debug, Clone)]
pub enum Value {
    Integer { value: i64, width: IntWidth, signed: bool },
    Float { value: f64, width: FloatWidth },
    Char(char),
    Bool(bool),
    /// `string`, kept as a dedicated variant rather than `Array(Vec<Value>)`
    /// of one-char arrays (spec.md §9 Open Questions: "if distinct storage
    /// is desired, add a single string runtime value variant with the same
    /// operations" — `length`/`index`/`concat`/`equals` all accept it).
    Str(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Struct(Vec<(String, Value)>),
    Function(FunctionId),
}

impl Value {
    pub fn void() -> Self {
        Value::Tuple(vec![])
    }

    /// Reconstructs the `Type` a runtime value corresponds to, used only to
    /// test a thrown value against a `catch`'s declared exception type
    /// (spec.md §4.5 "scan its catches in order; the first whose declared
    /// type the thrown value's type is assignable to wins").
    pub fn runtime_type(&self) -> Type {
        match self {
            Value::Integer { width, signed, .. } => Type::Integer { width: *width, signed: *signed },
            Value::Float { width, .. } => Type::Float(*width),
            Value::Char(_) => Type::Char,
            Value::Bool(_) => Type::Bool,
            Value::Str(_) => Type::Array(Box::new(Type::Char)),
            Value::Array(items) => {
                Type::Array(Box::new(items.first().map(Value::runtime_type).unwrap_or(Type::Unknown)))
            }
            Value::Tuple(items) => Type::Tuple(items.iter().map(Value::runtime_type).collect()),
            Value::Struct(fields) => {
                Type::Struct(fields.iter().map(|(n, v)| (n.clone(), v.runtime_type())).collect())
            }
            Value::Function(_) => Type::Unknown,
        }
    }
}

/// Frame-local name bindings, consulted top-down by identifier lookup and
/// written to by `add-to-scope` (spec.md §3 "Frame"). Every frame kind
/// carries one, since `add-to-scope` always targets whichever frame is
/// topmost.
pub type Bindings = HashMap<String, RefId>;

#[derive(Debug, Clone, Default)]
pub struct ScopeFrame {
    pub bindings: Bindings,
}

#[derive(Debug, Clone)]
pub struct LoopFrame {
    pub start: Ic,
    pub end: Ic,
    pub bindings: Bindings,
}

#[derive(Debug, Clone)]
pub struct TryFrame {
    pub catches: Vec<crate::ir::CatchTarget>,
    pub finally: Option<(Ic, Ic)>,
    pub bindings: Bindings,
}

/// One activation of a translated function. `caller` is `None` only for the
/// outermost call (`main`); every other frame restores `caller`'s
/// `(function_id, ic)` on return (spec.md §4.5 "function epilogue").
#[derive(Debug, Clone)]
pub struct FunctionFrame {
    pub function_id: FunctionId,
    pub caller: Option<(FunctionId, Ic)>,
    /// Where the call's result ref lives in the caller, `None` for `main`.
    pub return_ref: Option<RefId>,
    /// The argument values bound by this activation's `param-ref`s.
    pub args: Vec<Value>,
    pub bindings: Bindings,
}

#[derive(Debug, Clone)]
pub enum Frame {
    Scope(ScopeFrame),
    Loop(LoopFrame),
    Try(TryFrame),
    Function(FunctionFrame),
    /// Not one of spec.md's enumerated frame kinds. Pushed by the interpreter
    /// when a `throw` is caught by a try with a `finally`: the original
    /// `Try` frame is already gone by the time a catch runs (the unwind scan
    /// consumed it), so this carries the still-pending finally range through
    /// the catch body until a `return`/`break`/`continue`/`throw` inside it
    /// (or falling off the end) triggers the finally (see `DESIGN.md`).
    FinallyGuard { start: Ic, end: Ic },
}

impl Frame {
    pub fn bindings(&self) -> &Bindings {
        match self {
            Frame::Scope(f) => &f.bindings,
            Frame::Loop(f) => &f.bindings,
            Frame::Try(f) => &f.bindings,
            Frame::Function(f) => &f.bindings,
            Frame::FinallyGuard { .. } => panic!("add-to-scope can never target a FinallyGuard frame"),
        }
    }

    pub fn bindings_mut(&mut self) -> &mut Bindings {
        match self {
            Frame::Scope(f) => &mut f.bindings,
            Frame::Loop(f) => &mut f.bindings,
            Frame::Try(f) => &mut f.bindings,
            Frame::Function(f) => &mut f.bindings,
            Frame::FinallyGuard { .. } => panic!("add-to-scope can never target a FinallyGuard frame"),
        }
    }
}
