//! The stack-machine interpreter (spec.md §4.5, §5).
//!
//! Executes one [`ir::Function`] at a time using an instruction counter
//! (`ic`), a frame stack, and two value tables: a reference table (one fresh
//! map per live function activation — see `DESIGN.md`, "per-activation ref
//! storage") and a single global, append-mostly constant table.
//!
//! Control transfer (`return`/`throw`/`break`/`continue`/`try`/`finally`) is
//! expressed as plain recursive helper methods rather than the "execution
//! mode" state machine sketched in the source material: `perform_return`,
//! `perform_loop_exit`, and `perform_throw` all funnel through
//! [`Interpreter::execute_finally_block`] whenever an enclosing `finally` is
//! still owed, which is what makes a `finally` with its own `return`
//! correctly override whatever `return`/`throw`/`break`/`continue` it
//! interrupted (`DESIGN.md`, "finally overrides").

use std::collections::HashMap;

use log::trace;

use crate::{
    ir::{self, BinaryOp, FunctionId, Ic, Instruction, Intrinsic, Program, RefId, UnaryOp},
    runtime::{Frame, FunctionFrame, LoopFrame, ScopeFrame, TryFrame, Value},
    typesys::{is_assignable_from, FloatWidth, IntWidth},
};

/// Knobs the CLI (or a test) supplies for a single run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub max_stack_depth: usize,
    pub program_args: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { max_stack_depth: 2048, program_args: Vec::new() }
    }
}

/// The result of running a `finally` block inline, used to unify the three
/// call sites (`perform_return`, `perform_loop_exit`, `perform_throw`) that
/// can interrupt a pending `return`/`break`/`continue`/`throw` with one.
enum FinallyOutcome {
    /// Ran to its trailing noop without itself transferring control.
    Completed,
    /// The `finally` body issued its own `return`/`throw`/`break`/`continue`
    /// that has already moved `ic`/`current_function` elsewhere (or exited
    /// the program); whatever interrupted it must stop unwinding too.
    Superseded,
    /// The finally's own control transfer ended the whole program.
    Exited(i32),
}

pub struct Interpreter<'p> {
    program: &'p Program,
    frames: Vec<Frame>,
    /// One entry per live `Frame::Function`, pushed/popped in lockstep.
    ref_stack: Vec<HashMap<RefId, Value>>,
    consts: Vec<Option<Value>>,
    current_function: FunctionId,
    ic: Ic,
    max_stack_depth: usize,
    /// The value bound to the nearest enclosing catch's `error-ref`.
    current_error: Option<Value>,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p Program, config: &RunConfig) -> Self {
        Self {
            program,
            frames: Vec::new(),
            ref_stack: Vec::new(),
            consts: Vec::new(),
            current_function: program.entry,
            ic: 0,
            max_stack_depth: config.max_stack_depth,
            current_error: None,
        }
    }

    /// Runs `main` to completion, returning the process exit code (spec.md
    /// §6: `main`'s integer return, or 0 for void, or non-zero on an
    /// uncaught exception or stack overflow).
    pub fn run(mut self, program_args: Vec<String>) -> i32 {
        let args = Value::Array(program_args.into_iter().map(Value::Str).collect());
        self.frames.push(Frame::Function(FunctionFrame {
            function_id: self.program.entry,
            caller: None,
            return_ref: None,
            args: vec![args],
            bindings: HashMap::new(),
        }));
        self.ref_stack.push(HashMap::new());

        loop {
            if let Some(code) = self.step() {
                return code;
            }
        }
    }

    fn advance(&mut self) -> Option<i32> {
        self.ic += 1;
        None
    }

    fn get(&self, r: RefId) -> Value {
        self.ref_stack
            .last()
            .and_then(|m| m.get(&r))
            .cloned()
            .unwrap_or_else(|| panic!("read of ref {r} before it was set"))
    }

    fn set_ref(&mut self, r: RefId, value: Value) {
        self.ref_stack.last_mut().expect("at least one activation").insert(r, value);
    }

    fn bool_at(&self, r: RefId) -> bool {
        match self.get(r) {
            Value::Bool(b) => b,
            other => panic!("expected bool, found {other:?}"),
        }
    }

    fn current_args(&self) -> &[Value] {
        for frame in self.frames.iter().rev() {
            if let Frame::Function(f) = frame {
                return &f.args;
            }
        }
        panic!("param-ref outside any function activation")
    }

    fn function_frame_index(&self) -> usize {
        self.frames
            .iter()
            .rposition(|f| matches!(f, Frame::Function(_)))
            .expect("the entry activation's function-frame is never popped while running")
    }

    fn const_is_set(&self, id: usize) -> bool {
        self.consts.get(id).map(Option::is_some).unwrap_or(false)
    }

    fn set_const(&mut self, id: usize, value: Value) {
        if id >= self.consts.len() {
            self.consts.resize(id + 1, None);
        }
        self.consts[id] = Some(value);
    }

    fn const_at(&self, id: usize) -> Value {
        self.consts
            .get(id)
            .and_then(Option::clone)
            .unwrap_or_else(|| panic!("const-ref on unset constant {id}"))
    }

    /// Writes `result` to `target` and advances, or diverts into
    /// [`Interpreter::perform_throw`] if the operation raised a runtime
    /// error (division by zero, index out of bounds, ...).
    fn finish(&mut self, target: RefId, result: Result<Value, Value>) -> Option<i32> {
        match result {
            Ok(value) => {
                self.set_ref(target, value);
                self.advance()
            }
            Err(error) => self.perform_throw(error),
        }
    }

    /// One dispatch step. `None` means "keep running"; `Some(code)` means
    /// the whole program is finished.
    fn step(&mut self) -> Option<i32> {
        // Self-cleaning for the interpreter-only `FinallyGuard` frame
        // (`DESIGN.md`, "FinallyGuard frame"): once normal, uninterrupted
        // execution reaches the finally range it was guarding, its job of
        // redirecting an interrupting return/break/continue/throw is done.
        if let Some(Frame::FinallyGuard { start, .. }) = self.frames.last() {
            if *start == self.ic {
                self.frames.pop();
            }
        }

        let func = self.program.function(self.current_function);
        if self.ic >= func.instructions.len() {
            return self.perform_return(Value::void());
        }
        let instr = func.instructions[self.ic].clone();
        trace!("{}@{}: {instr:?}", func.name, self.ic);

        match instr {
            Instruction::SetInteger(r, v, width, signed) => {
                self.set_ref(r, Value::Integer { value: v, width, signed });
                self.advance()
            }
            Instruction::SetFloat(r, bits, width) => {
                self.set_ref(r, Value::Float { value: f64::from_bits(bits), width });
                self.advance()
            }
            Instruction::SetChar(r, c) => {
                self.set_ref(r, Value::Char(c));
                self.advance()
            }
            Instruction::SetBool(r, b) => {
                self.set_ref(r, Value::Bool(b));
                self.advance()
            }
            Instruction::SetString(r, s) => {
                self.set_ref(r, Value::Str(s));
                self.advance()
            }
            Instruction::SetArray(r, items) => {
                let values = items.into_iter().map(|i| self.get(i)).collect();
                self.set_ref(r, Value::Array(values));
                self.advance()
            }
            Instruction::SetTuple(r, items) => {
                let values = items.into_iter().map(|i| self.get(i)).collect();
                self.set_ref(r, Value::Tuple(values));
                self.advance()
            }
            Instruction::SetStruct(r, fields) => {
                let values = fields.into_iter().map(|(name, i)| (name, self.get(i))).collect();
                self.set_ref(r, Value::Struct(values));
                self.advance()
            }
            Instruction::SetFunction(r, fid) => {
                self.set_ref(r, Value::Function(fid));
                self.advance()
            }

            Instruction::ParamRef(r, i) => {
                let value = self
                    .current_args()
                    .get(i)
                    .unwrap_or_else(|| panic!("param-ref {i} out of range"))
                    .clone();
                self.set_ref(r, value);
                self.advance()
            }
            Instruction::ErrorRef(r) => {
                let value = self.current_error.clone().expect("error-ref outside a catch body");
                self.set_ref(r, value);
                self.advance()
            }
            Instruction::UnaryOp(r, op, operand) => {
                let value = eval_unary(op, self.get(operand));
                self.set_ref(r, value);
                self.advance()
            }
            Instruction::BinaryOp(r, op, lhs, rhs) => {
                let result = eval_binary(op, self.get(lhs), self.get(rhs));
                self.finish(r, result)
            }
            Instruction::FieldAccess(r, base, field) => {
                let result = eval_field_access(self.get(base), &field);
                self.finish(r, result)
            }
            Instruction::ArrayAccess(r, base, index) => {
                let result = eval_array_access(self.get(base), self.get(index));
                self.finish(r, result)
            }
            Instruction::ConstRef(r, id) => {
                let value = self.const_at(id);
                self.set_ref(r, value);
                self.advance()
            }
            Instruction::CopyRef(r, src) => {
                let value = self.get(src);
                self.set_ref(r, value);
                self.advance()
            }
            Instruction::MutateRef(r, src) => {
                let value = self.get(src);
                self.set_ref(r, value);
                self.advance()
            }
            Instruction::InteropRef(r, intrinsic, args) => {
                let values: Vec<Value> = args.into_iter().map(|a| self.get(a)).collect();
                let result = eval_intrinsic(intrinsic, &values);
                self.finish(r, result)
            }
            Instruction::Call(r, callee, args) => self.perform_call(r, callee, &args),

            Instruction::PushScopeFrame => {
                self.frames.push(Frame::Scope(ScopeFrame::default()));
                self.advance()
            }
            Instruction::PushLoopFrame(start, end) => {
                self.frames.push(Frame::Loop(LoopFrame { start, end, bindings: HashMap::new() }));
                self.advance()
            }
            Instruction::PushTryFrame(catches, finally) => {
                self.frames.push(Frame::Try(TryFrame { catches, finally, bindings: HashMap::new() }));
                self.advance()
            }
            Instruction::PopFrame => {
                self.frames.pop().expect("pop-frame with an empty scope stack");
                self.advance()
            }
            Instruction::AddToScope(name, r) => {
                self.frames.last_mut().expect("add-to-scope with an empty scope stack").bindings_mut().insert(name, r);
                self.advance()
            }

            Instruction::FalseBranch(r, target) => {
                if self.bool_at(r) {
                    self.advance()
                } else {
                    self.ic = target;
                    None
                }
            }
            Instruction::TrueBranch(r, target) => {
                if self.bool_at(r) {
                    self.ic = target;
                    None
                } else {
                    self.advance()
                }
            }
            Instruction::Jump(target) => {
                self.ic = target;
                None
            }
            Instruction::ConstBranch(id, target) => {
                if self.const_is_set(id) {
                    self.ic = target;
                    None
                } else {
                    self.advance()
                }
            }
            Instruction::Return(r) => {
                let value = self.get(r);
                self.perform_return(value)
            }
            Instruction::Throw(r) => {
                let value = self.get(r);
                self.perform_throw(value)
            }
            Instruction::Break(n) => self.perform_loop_exit(n, true),
            Instruction::Continue(n) => self.perform_loop_exit(n, false),
            Instruction::ConstSet(id, r) => {
                let value = self.get(r);
                self.set_const(id, value);
                self.advance()
            }
            Instruction::Noop => self.advance(),
        }
    }

    fn perform_call(&mut self, result_ref: RefId, callee_ref: RefId, arg_refs: &[RefId]) -> Option<i32> {
        let callee = match self.get(callee_ref) {
            Value::Function(fid) => fid,
            other => panic!("call target is not a function value: {other:?}"),
        };
        let args: Vec<Value> = arg_refs.iter().map(|r| self.get(*r)).collect();

        let depth = self.frames.iter().filter(|f| matches!(f, Frame::Function(_))).count();
        if depth >= self.max_stack_depth {
            eprintln!("stack overflow: exceeded maximum call depth of {}", self.max_stack_depth);
            return Some(1);
        }

        self.frames.push(Frame::Function(FunctionFrame {
            function_id: callee,
            caller: Some((self.current_function, self.ic + 1)),
            return_ref: Some(result_ref),
            args,
            bindings: HashMap::new(),
        }));
        self.ref_stack.push(HashMap::new());
        self.current_function = callee;
        self.ic = 0;
        None
    }

    /// Finds the nearest `Try`-with-`finally` or `FinallyGuard` frame above
    /// `floor` (the current function-frame's index) — the obligation that a
    /// `return`/`break`/`continue` unwinding past it must honor before it
    /// can proceed (spec.md §4.5 doesn't spell this interaction out
    /// directly; see `DESIGN.md`, "finally overrides").
    fn find_enclosing_finally(&self, floor: usize) -> Option<(usize, Ic, Ic)> {
        for idx in (floor + 1..self.frames.len()).rev() {
            match &self.frames[idx] {
                Frame::Try(t) => {
                    if let Some((s, e)) = t.finally {
                        return Some((idx, s, e));
                    }
                }
                Frame::FinallyGuard { start, end } => return Some((idx, *start, *end)),
                _ => {}
            }
        }
        None
    }

    fn perform_return(&mut self, value: Value) -> Option<i32> {
        loop {
            let boundary = self.function_frame_index();
            if let Some((idx, start, end)) = self.find_enclosing_finally(boundary) {
                self.frames.truncate(idx);
                match self.execute_finally_block(start, end) {
                    FinallyOutcome::Completed => continue,
                    FinallyOutcome::Superseded => return None,
                    FinallyOutcome::Exited(code) => return Some(code),
                }
            }

            self.frames.truncate(boundary + 1);
            let frame = match self.frames.pop() {
                Some(Frame::Function(f)) => f,
                _ => unreachable!("function_frame_index always points at a Frame::Function"),
            };
            self.ref_stack.pop();

            return match frame.caller {
                None => Some(exit_code_of(&value)),
                Some((caller_fn, caller_ic)) => {
                    self.current_function = caller_fn;
                    self.ic = caller_ic;
                    if let Some(target) = frame.return_ref {
                        self.set_ref(target, value);
                    }
                    None
                }
            };
        }
    }

    fn perform_loop_exit(&mut self, n: u32, is_break: bool) -> Option<i32> {
        let boundary = self.function_frame_index();
        let mut scan_top = self.frames.len();
        let mut loops_seen: u32 = 0;

        loop {
            let mut target = None;
            let mut interrupt = None;
            for idx in (boundary + 1..scan_top).rev() {
                match &self.frames[idx] {
                    Frame::Loop(l) => {
                        if loops_seen == n {
                            target = Some((idx, l.start, l.end));
                            break;
                        }
                        loops_seen += 1;
                    }
                    Frame::Try(t) => {
                        if let Some((s, e)) = t.finally {
                            interrupt = Some((idx, s, e));
                            break;
                        }
                    }
                    Frame::FinallyGuard { start, end } => {
                        interrupt = Some((idx, *start, *end));
                        break;
                    }
                    _ => {}
                }
            }

            if let Some((idx, start, end)) = target {
                self.frames.truncate(idx + 1);
                self.ic = if is_break { end } else { start };
                return None;
            }

            if let Some((idx, start, end)) = interrupt {
                self.frames.truncate(idx);
                scan_top = idx;
                match self.execute_finally_block(start, end) {
                    FinallyOutcome::Completed => continue,
                    FinallyOutcome::Superseded => return None,
                    FinallyOutcome::Exited(code) => return Some(code),
                }
            }

            panic!("break/continue({n}) with fewer than {} enclosing loop frames", n + 1);
        }
    }

    fn perform_throw(&mut self, value: Value) -> Option<i32> {
        let mut trace: Vec<FunctionId> = Vec::new();
        let mut active_fn = self.current_function;

        loop {
            match self.frames.pop() {
                None => {
                    self.print_uncaught(&value, &trace);
                    return Some(1);
                }
                Some(Frame::Function(f)) => {
                    self.ref_stack.pop();
                    trace.push(f.function_id);
                    match f.caller {
                        None => {
                            self.print_uncaught(&value, &trace);
                            return Some(1);
                        }
                        Some((caller_fn, _)) => active_fn = caller_fn,
                    }
                }
                Some(Frame::Try(t)) => {
                    let error_type = value.runtime_type();
                    if let Some(target) = t.catches.iter().find(|c| is_assignable_from(&c.catch_type, &error_type)) {
                        self.current_function = active_fn;
                        self.ic = target.catch_start;
                        self.current_error = Some(value);
                        if let Some((start, end)) = t.finally {
                            self.frames.push(Frame::FinallyGuard { start, end });
                        }
                        return None;
                    }
                    if let Some((start, end)) = t.finally {
                        self.current_function = active_fn;
                        match self.execute_finally_block(start, end) {
                            FinallyOutcome::Completed => continue,
                            FinallyOutcome::Superseded => return None,
                            FinallyOutcome::Exited(code) => return Some(code),
                        }
                    }
                }
                Some(Frame::FinallyGuard { start, end }) => {
                    self.current_function = active_fn;
                    match self.execute_finally_block(start, end) {
                        FinallyOutcome::Completed => continue,
                        FinallyOutcome::Superseded => return None,
                        FinallyOutcome::Exited(code) => return Some(code),
                    }
                }
                Some(Frame::Loop(_)) | Some(Frame::Scope(_)) => {}
            }
        }
    }

    /// Runs `[start, end)` of the *current function* inline, used both for
    /// a `finally` reached normally during unwinding and for one reached by
    /// jumping straight into it after truncating a caught try-frame.
    /// `Superseded` means the finally's own control transfer has already
    /// moved execution elsewhere; the caller must not also apply its
    /// original return/throw/break/continue.
    fn execute_finally_block(&mut self, start: Ic, end: Ic) -> FinallyOutcome {
        let owner = self.current_function;
        self.ic = start;
        loop {
            if self.current_function == owner && self.ic == end {
                return FinallyOutcome::Completed;
            }
            match self.step() {
                Some(code) => return FinallyOutcome::Exited(code),
                None => {
                    if self.current_function != owner || self.ic < start || self.ic > end {
                        return FinallyOutcome::Superseded;
                    }
                }
            }
        }
    }

    fn print_uncaught(&self, value: &Value, trace: &[FunctionId]) {
        eprintln!("uncaught exception: {}", display_value(value));
        for fid in trace {
            eprintln!("  at {}", self.program.function(*fid).name);
        }
    }
}

fn exit_code_of(value: &Value) -> i32 {
    match value {
        Value::Tuple(items) if items.is_empty() => 0,
        Value::Integer { value, .. } => *value as i32,
        _ => 0,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Integer { value, .. } => value.to_string(),
        Value::Float { value, .. } => value.to_string(),
        Value::Char(c) => c.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

fn wrap_int(value: i128, width: IntWidth, signed: bool) -> i64 {
    match (width, signed) {
        (IntWidth::W8, true) => value as i8 as i64,
        (IntWidth::W8, false) => value as u8 as i64,
        (IntWidth::W16, true) => value as i16 as i64,
        (IntWidth::W16, false) => value as u16 as i64,
        (IntWidth::W32, true) => value as i32 as i64,
        (IntWidth::W32, false) => value as u32 as i64,
        (IntWidth::W64, true) => value as i64,
        (IntWidth::W64, false) => value as u64 as i64,
        (IntWidth::Unbounded, _) => value as i64,
    }
}

/// The wider/more-permissive of two operand representations — the IR has
/// already erased the checker's computed result type, so arithmetic
/// recovers a representation from the operands themselves (`DESIGN.md`).
fn combine_width(a: (IntWidth, bool), b: (IntWidth, bool)) -> (IntWidth, bool) {
    let width = if a.0.rank() >= b.0.rank() { a.0 } else { b.0 };
    (width, a.1 || b.1)
}

fn eval_unary(op: UnaryOp, operand: Value) -> Value {
    match (op, operand) {
        (UnaryOp::Neg, Value::Integer { value, width, signed }) => {
            Value::Integer { value: wrap_int(-(value as i128), width, signed), width, signed }
        }
        (UnaryOp::Neg, Value::Float { value, width }) => Value::Float { value: -value, width },
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        (op, operand) => panic!("unary {op:?} not defined for {operand:?}"),
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, Value> {
    use BinaryOp::*;
    match (op, &lhs, &rhs) {
        (Add, Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().cloned().chain(b.iter().cloned()).collect()))
        }
        (Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Eq, _, _) => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        (Neq, _, _) => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        (And, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a && *b)),
        (Or, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a || *b)),
        (_, Value::Integer { .. }, Value::Integer { .. }) => eval_integer_binary(op, lhs, rhs),
        (_, Value::Float { .. }, Value::Float { .. }) | (_, Value::Integer { .. }, Value::Float { .. }) | (_, Value::Float { .. }, Value::Integer { .. }) => {
            eval_float_binary(op, lhs, rhs)
        }
        _ => panic!("binary {op:?} not defined for ({lhs:?}, {rhs:?})"),
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Float { value, .. } => *value,
        Value::Integer { value, .. } => *value as f64,
        other => panic!("expected a number, found {other:?}"),
    }
}

fn eval_float_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, Value> {
    use BinaryOp::*;
    let width = match (&lhs, &rhs) {
        (Value::Float { width, .. }, _) | (_, Value::Float { width, .. }) => *width,
        _ => FloatWidth::W64,
    };
    let (a, b) = (as_f64(&lhs), as_f64(&rhs));
    match op {
        Add => Ok(Value::Float { value: a + b, width }),
        Sub => Ok(Value::Float { value: a - b, width }),
        Mul => Ok(Value::Float { value: a * b, width }),
        Div => Ok(Value::Float { value: a / b, width }),
        Mod => Ok(Value::Float { value: a % b, width }),
        Lt => Ok(Value::Bool(a < b)),
        Lte => Ok(Value::Bool(a <= b)),
        Gt => Ok(Value::Bool(a > b)),
        Gte => Ok(Value::Bool(a >= b)),
        Eq | Neq | And | Or | Add if false => unreachable!(),
        _ => panic!("binary {op:?} not defined for floats"),
    }
}

fn eval_integer_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, Value> {
    use BinaryOp::*;
    let (Value::Integer { value: a, width: aw, signed: asig }, Value::Integer { value: b, width: bw, signed: bsig }) =
        (lhs, rhs)
    else {
        unreachable!("caller already matched both operands as Integer");
    };
    let (width, signed) = combine_width((aw, asig), (bw, bsig));
    match op {
        Add => Ok(Value::Integer { value: wrap_int(a as i128 + b as i128, width, signed), width, signed }),
        Sub => Ok(Value::Integer { value: wrap_int(a as i128 - b as i128, width, signed), width, signed }),
        Mul => Ok(Value::Integer { value: wrap_int(a as i128 * b as i128, width, signed), width, signed }),
        Div => {
            if b == 0 {
                return Err(Value::Str("division by zero".to_owned()));
            }
            Ok(Value::Integer { value: wrap_int(a as i128 / b as i128, width, signed), width, signed })
        }
        Mod => {
            if b == 0 {
                return Err(Value::Str("division by zero".to_owned()));
            }
            Ok(Value::Integer { value: wrap_int(a as i128 % b as i128, width, signed), width, signed })
        }
        Lt => Ok(Value::Bool(a < b)),
        Lte => Ok(Value::Bool(a <= b)),
        Gt => Ok(Value::Bool(a > b)),
        Gte => Ok(Value::Bool(a >= b)),
        _ => panic!("binary {op:?} not defined for integers"),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer { value: a, .. }, Value::Integer { value: b, .. }) => a == b,
        (Value::Float { value: a, .. }, Value::Float { value: b, .. }) => a == b,
        (Value::Char(a), Value::Char(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y)),
        (Value::Tuple(a), Value::Tuple(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y)),
        (Value::Struct(a), Value::Struct(b)) => {
            a.len() == b.len()
                && a.iter().all(|(name, v)| b.iter().any(|(n2, v2)| n2 == name && values_equal(v, v2)))
        }
        (Value::Function(a), Value::Function(b)) => a == b,
        _ => false,
    }
}

fn eval_field_access(base: Value, field: &str) -> Result<Value, Value> {
    match base {
        Value::Struct(fields) => fields
            .into_iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
            .ok_or_else(|| Value::Str(format!("struct has no field \"{field}\""))),
        other => panic!("field-access on non-struct value {other:?}"),
    }
}

fn eval_array_access(base: Value, index: Value) -> Result<Value, Value> {
    let i = match index {
        Value::Integer { value, .. } => value,
        other => panic!("array index is not an integer: {other:?}"),
    };
    match base {
        Value::Array(items) => usize::try_from(i)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .ok_or_else(|| Value::Str(format!("array index {i} out of bounds"))),
        Value::Str(s) => usize::try_from(i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(Value::Char)
            .ok_or_else(|| Value::Str(format!("string index {i} out of bounds"))),
        other => panic!("array-access on non-indexable value {other:?}"),
    }
}

fn eval_intrinsic(intrinsic: Intrinsic, args: &[Value]) -> Result<Value, Value> {
    match (intrinsic, args) {
        (Intrinsic::Length, [Value::Array(items)]) => {
            Ok(Value::Integer { value: items.len() as i64, width: IntWidth::Unbounded, signed: true })
        }
        (Intrinsic::Length, [Value::Str(s)]) => {
            Ok(Value::Integer { value: s.chars().count() as i64, width: IntWidth::Unbounded, signed: true })
        }
        (Intrinsic::Index, [base, index]) => eval_array_access(base.clone(), index.clone()),
        (Intrinsic::Increment, [Value::Integer { value, width, signed }]) => {
            Ok(Value::Integer { value: wrap_int(*value as i128 + 1, *width, *signed), width: *width, signed: *signed })
        }
        (Intrinsic::LessThan, [a, b]) => eval_integer_binary(BinaryOp::Lt, a.clone(), b.clone()).or_else(|_| {
            // Reached only if a future caller passes floats through the
            // intrinsic table instead of `binary-op`; today only the
            // `for`-loop lowering emits this, always over integers.
            eval_float_binary(BinaryOp::Lt, a.clone(), b.clone())
        }),
        (Intrinsic::Concat, [Value::Array(a), Value::Array(b)]) => {
            Ok(Value::Array(a.iter().cloned().chain(b.iter().cloned()).collect()))
        }
        (Intrinsic::Concat, [Value::Str(a), Value::Str(b)]) => Ok(Value::Str(format!("{a}{b}"))),
        (Intrinsic::Equals, [a, b]) => Ok(Value::Bool(values_equal(a, b))),
        (intrinsic, args) => panic!("intrinsic {intrinsic:?} not defined for {args:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CatchTarget, Function};
    use crate::typesys::Type;

    fn program_with(functions: Vec<Function>, entry: FunctionId) -> Program {
        Program { functions, entry }
    }

    /// `func int main(string[] args) => 42`
    #[test]
    fn returns_integer_literal() {
        let program = program_with(
            vec![Function {
                id: 0,
                name: "main".into(),
                param_count: 1,
                instructions: vec![
                    Instruction::SetInteger(0, 42, IntWidth::W32, true),
                    Instruction::Return(0),
                ],
            }],
            0,
        );
        let code = Interpreter::new(&program, &RunConfig::default()).run(vec![]);
        assert_eq!(code, 42);
    }

    /// `func int add(int a, int b) => a + b` called with (2, 3).
    #[test]
    fn call_and_return_roundtrip() {
        let add = Function {
            id: 0,
            name: "add".into(),
            param_count: 2,
            instructions: vec![
                Instruction::ParamRef(0, 0),
                Instruction::ParamRef(1, 1),
                Instruction::BinaryOp(2, BinaryOp::Add, 0, 1),
                Instruction::Return(2),
            ],
        };
        let main = Function {
            id: 1,
            name: "main".into(),
            param_count: 1,
            instructions: vec![
                Instruction::SetInteger(0, 2, IntWidth::W32, true),
                Instruction::SetInteger(1, 3, IntWidth::W32, true),
                Instruction::SetFunction(2, 0),
                Instruction::Call(3, 2, vec![0, 1]),
                Instruction::Return(3),
            ],
        };
        let program = program_with(vec![add, main], 1);
        let code = Interpreter::new(&program, &RunConfig::default()).run(vec![]);
        assert_eq!(code, 5);
    }

    /// Recursive factorial — the case that motivated per-activation ref
    /// storage instead of one flat global ref vector.
    #[test]
    fn recursion_does_not_clobber_caller_locals() {
        // func int fact(int n) => if (n <= 1) 1 else n * fact(n - 1)
        let fact = Function {
            id: 0,
            name: "fact".into(),
            param_count: 1,
            instructions: vec![
                Instruction::ParamRef(0, 0),                               // 0: n
                Instruction::SetInteger(1, 1, IntWidth::W32, true),        // 1: 1
                Instruction::BinaryOp(2, BinaryOp::Lte, 0, 1),             // 2: n <= 1
                Instruction::FalseBranch(2, 5),                           // 3
                Instruction::Return(1),                                   // 4: return 1
                Instruction::SetFunction(3, 0),                           // 5: fact
                Instruction::BinaryOp(4, BinaryOp::Sub, 0, 1),             // 6: n - 1
                Instruction::Call(5, 3, vec![4]),                         // 7: fact(n-1)
                Instruction::BinaryOp(6, BinaryOp::Mul, 0, 5),             // 8: n * fact(n-1)
                Instruction::Return(6),                                   // 9
            ],
        };
        let main = Function {
            id: 1,
            name: "main".into(),
            param_count: 1,
            instructions: vec![
                Instruction::SetInteger(0, 5, IntWidth::W32, true),
                Instruction::SetFunction(1, 0),
                Instruction::Call(2, 1, vec![0]),
                Instruction::Return(2),
            ],
        };
        let program = program_with(vec![fact, main], 1);
        let code = Interpreter::new(&program, &RunConfig::default()).run(vec![]);
        assert_eq!(code, 120);
    }

    /// `try { throw "x" } catch (string s) { return 9 } finally { return 8 }`
    #[test]
    fn finally_return_overrides_catch_return() {
        let catch_type = Type::Array(Box::new(Type::Char));
        let main = Function {
            id: 0,
            name: "main".into(),
            param_count: 1,
            instructions: vec![
                Instruction::PushTryFrame(
                    vec![CatchTarget { catch_start: 3, catch_type }],
                    Some((7, 9)),
                ),
                Instruction::SetString(0, "x".into()),
                Instruction::Throw(0),
                // catch (string s) { return 9 } -- starts at ic 3
                Instruction::PushScopeFrame,
                Instruction::ErrorRef(1),
                Instruction::SetInteger(2, 9, IntWidth::W32, true),
                Instruction::Return(2),
                // finally { return 8 } -- starts at ic 7
                Instruction::SetInteger(3, 8, IntWidth::W32, true),
                Instruction::Return(3),
                // trailing noop, ic 9
                Instruction::Noop,
            ],
        };
        let program = program_with(vec![main], 0);
        let code = Interpreter::new(&program, &RunConfig::default()).run(vec![]);
        assert_eq!(code, 8);
    }

    #[test]
    fn uncaught_throw_exits_non_zero() {
        let main = Function {
            id: 0,
            name: "main".into(),
            param_count: 1,
            instructions: vec![Instruction::SetString(0, "boom".into()), Instruction::Throw(0)],
        };
        let program = program_with(vec![main], 0);
        let code = Interpreter::new(&program, &RunConfig::default()).run(vec![]);
        assert_ne!(code, 0);
    }

    #[test]
    fn division_by_zero_is_a_catchable_runtime_error() {
        let catch_type = Type::Integer { width: IntWidth::Unbounded, signed: true };
        let _ = &catch_type; // str is what gets thrown; kept for documentation
        let main = Function {
            id: 0,
            name: "main".into(),
            param_count: 1,
            instructions: vec![
                Instruction::PushTryFrame(
                    vec![CatchTarget {
                        catch_start: 4,
                        catch_type: Type::Array(Box::new(Type::Char)),
                    }],
                    None,
                ),
                Instruction::SetInteger(0, 1, IntWidth::W32, true),
                Instruction::SetInteger(1, 0, IntWidth::W32, true),
                Instruction::BinaryOp(2, BinaryOp::Div, 0, 1),
                // unreachable on the happy path
                Instruction::PushScopeFrame,
                Instruction::ErrorRef(3),
                Instruction::SetInteger(4, 1, IntWidth::W32, true),
                Instruction::Return(4),
            ],
        };
        let program = program_with(vec![main], 0);
        let code = Interpreter::new(&program, &RunConfig::default()).run(vec![]);
        assert_eq!(code, 1);
    }
}
