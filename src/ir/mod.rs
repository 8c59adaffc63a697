//! The flat instruction set (spec.md §3, §4.4): every function lowers to an
//! append-only vector of [`Instruction`]s addressed by absolute index. All
//! jump/branch targets are indices within the *same* function's vector.
//!
//! One addition beyond spec.md's enumerated instruction list: [`Call`]. The
//! source text describes how `set-function` instructions materialize a
//! function value and how parameters get bound on entry, but never spells
//! out the instruction that actually invokes one (see `DESIGN.md`, "Call
//! instruction"). Everything else here is the instruction list verbatim.

use crate::typesys::{FloatWidth, IntWidth, Type};

pub type RefId = usize;
pub type ConstId = usize;
pub type FunctionId = usize;
/// An absolute instruction index within one function's instruction vector.
pub type Ic = usize;

/// The closed intrinsic-opcode table standing in for `interop-ref`'s host
/// combinator pointer (spec.md §4.5 / §9 Design Notes, SPEC_FULL.md §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    Length,
    Index,
    Increment,
    LessThan,
    Concat,
    Equals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
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

/// One `catch (T x)` clause's entry in a try-frame, recorded at the point
/// the try instruction is emitted, then back-patched with `catch_start`
/// once the catch's own instructions have been laid out.
#[derive(Debug, Clone)]
pub struct CatchTarget {
    pub catch_start: Ic,
    pub catch_type: Type,
}

#[derive(Debug, Clone)]
pub enum Instruction {
    SetInteger(RefId, i64, IntWidth, bool),
    SetFloat(RefId, u64, FloatWidth),
    SetChar(RefId, char),
    SetBool(RefId, bool),
    SetString(RefId, String),
    SetArray(RefId, Vec<RefId>),
    SetTuple(RefId, Vec<RefId>),
    SetStruct(RefId, Vec<(String, RefId)>),
    SetFunction(RefId, FunctionId),

    ParamRef(RefId, usize),
    ErrorRef(RefId),
    UnaryOp(RefId, UnaryOp, RefId),
    BinaryOp(RefId, BinaryOp, RefId, RefId),
    FieldAccess(RefId, RefId, String),
    ArrayAccess(RefId, RefId, RefId),
    ConstRef(RefId, ConstId),
    CopyRef(RefId, RefId),
    MutateRef(RefId, RefId),
    InteropRef(RefId, Intrinsic, Vec<RefId>),
    /// Not in spec.md's enumerated list; see the module doc comment.
    Call(RefId, RefId, Vec<RefId>),

    PushScopeFrame,
    PushLoopFrame(Ic, Ic),
    PushTryFrame(Vec<CatchTarget>, Option<(Ic, Ic)>),
    PopFrame,
    AddToScope(String, RefId),

    FalseBranch(RefId, Ic),
    TrueBranch(RefId, Ic),
    Jump(Ic),
    ConstBranch(ConstId, Ic),
    Return(RefId),
    Throw(RefId),
    Break(u32),
    Continue(u32),
    ConstSet(ConstId, RefId),
    Noop,
}

/// One translated function: a stable id, its declared arity (the first
/// `param_count` `param-ref`s the prelude emits), and its instruction
/// stream. `name` is kept only for diagnostics (stack traces).
#[derive(Debug, Clone)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub param_count: usize,
    pub instructions: Vec<Instruction>,
}

/// The translator's output: every function reachable from `main`, plus the
/// id of `main` itself.
#[derive(Debug, Default)]
pub struct Program {
    pub functions: Vec<Function>,
    pub entry: FunctionId,
}

impl Program {
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id]
    }
}
