//! AST → IR lowering (spec.md §4.4).
//!
//! Each function is translated lazily, the first time something actually
//! calls or references it, and memoized by `(module path, local name)` so a
//! function imported from three call sites still gets exactly one
//! `ir::Function` entry. Cross-module identifiers recurse one import hop at
//! a time, mirroring `Checker::resolve_identifier_type`.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    checker::{Checker, TypedProgram},
    ir::{self, BinaryOp, CatchTarget, FunctionId, Ic, Instruction, Intrinsic, RefId, UnaryOp},
    module::Modules,
    parser::ast::{
        Block, Constant, Export, Expression, Function as AstFunction, FunctionBody, LambdaBody, Namespace,
        Statement, TopLevelStatement,
    },
    typesys::{IntWidth, Type},
};

/// Finds a function declaration by local name anywhere in a module's typed
/// program, descending into namespaces and inline exports (export does not
/// rename a declaration, so the local name is unaffected by whether it is
/// exported).
fn find_function<'a>(program: &'a TypedProgram, name: &str) -> Option<&'a AstFunction<Type>> {
    for top in program {
        match top {
            TopLevelStatement::Function(f) if f.name == name => return Some(f),
            TopLevelStatement::Namespace(Namespace { members, .. }) => {
                if let Some(f) = find_function(members, name) {
                    return Some(f);
                }
            }
            TopLevelStatement::Export(Export::Inline(inner)) => {
                if let TopLevelStatement::Function(f) = inner.as_ref() {
                    if f.name == name {
                        return Some(f);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn find_constant<'a>(program: &'a TypedProgram, name: &str) -> Option<&'a Constant<Type>> {
    for top in program {
        match top {
            TopLevelStatement::Constant(c) if c.name == name => return Some(c),
            TopLevelStatement::Namespace(Namespace { members, .. }) => {
                if let Some(c) = find_constant(members, name) {
                    return Some(c);
                }
            }
            TopLevelStatement::Export(Export::Inline(inner)) => {
                if let TopLevelStatement::Constant(c) = inner.as_ref() {
                    if c.name == name {
                        return Some(c);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

pub struct Translator<'a> {
    checker: &'a mut Checker,
    programs: &'a HashMap<PathBuf, TypedProgram>,
    functions: Vec<ir::Function>,
    function_ids: HashMap<(PathBuf, String), FunctionId>,
    const_ids: HashMap<(PathBuf, String), usize>,
    next_ref: RefId,
    next_const: usize,
    next_lambda: usize,
}

impl<'a> Translator<'a> {
    pub fn new(checker: &'a mut Checker, programs: &'a HashMap<PathBuf, TypedProgram>) -> Self {
        Self {
            checker,
            programs,
            functions: Vec::new(),
            function_ids: HashMap::new(),
            const_ids: HashMap::new(),
            next_ref: 0,
            next_const: 0,
            next_lambda: 0,
        }
    }

    /// Translates every function transitively reachable from `entry_path`'s
    /// `main`, returning the finished program.
    pub fn translate(mut self, entry_path: &Path) -> ir::Program {
        let entry = self.function_id(entry_path, "main");
        ir::Program { functions: self.functions, entry }
    }

    fn new_ref(&mut self) -> RefId {
        let r = self.next_ref;
        self.next_ref += 1;
        r
    }

    fn new_const(&mut self) -> usize {
        let c = self.next_const;
        self.next_const += 1;
        c
    }

    /// Looks up (lazily translating if needed) the function id for a local
    /// declaration named `name` in the module at `path`.
    fn function_id(&mut self, path: &Path, name: &str) -> FunctionId {
        let key = (path.to_path_buf(), name.to_owned());
        if let Some(&id) = self.function_ids.get(&key) {
            return id;
        }
        let id = self.functions.len();
        self.functions.push(ir::Function {
            id,
            name: name.to_owned(),
            param_count: 0,
            instructions: vec![],
        });
        self.function_ids.insert(key, id);

        let decl = find_function(&self.programs[path], name)
            .unwrap_or_else(|| panic!("function '{name}' declared but not found during translation"))
            .clone();
        let (param_count, instructions) = self.translate_function(path, &decl);
        self.functions[id].param_count = param_count;
        self.functions[id].instructions = instructions;
        id
    }

    fn translate_function(&mut self, path: &Path, decl: &AstFunction<Type>) -> (usize, Vec<Instruction>) {
        let mut fb = FnBuilder::new(path.to_path_buf());
        for (i, param) in decl.params.iter().enumerate() {
            let r = fb.new_ref(self);
            fb.emit(Instruction::ParamRef(r, i));
            fb.declare(self, param.name.clone(), r);
        }
        match &decl.body {
            FunctionBody::Block(block) => {
                self.translate_block(&mut fb, block);
            }
            FunctionBody::Expression(expr) => {
                let r = self.translate_expression(&mut fb, expr);
                fb.emit(Instruction::Return(r));
            }
        }
        // Guaranteed epilogue: a block body that falls through without an
        // explicit `return` yields void. Harmless dead code on every path
        // that already returned explicitly.
        let void_ref = fb.new_ref(self);
        fb.emit(Instruction::SetTuple(void_ref, vec![]));
        fb.emit(Instruction::Return(void_ref));
        (decl.params.len(), fb.instructions)
    }

    fn translate_block(&mut self, fb: &mut FnBuilder, block: &Block<Type>) {
        fb.push_scope();
        for stmt in &block.statements {
            self.translate_statement(fb, stmt);
        }
        fb.pop_scope();
    }

    fn translate_statement(&mut self, fb: &mut FnBuilder, stmt: &Statement<Type>) {
        match stmt {
            Statement::Block(b) => self.translate_block(fb, b),
            Statement::Expression(e) => {
                self.translate_expression(fb, e);
            }
            Statement::For(f) => self.translate_for(fb, f),
            Statement::While(w) => self.translate_while(fb, w),
            Statement::DoWhile(d) => self.translate_do_while(fb, d),
            Statement::TryCatchFinally(t) => self.translate_try(fb, t),
            Statement::Throw(t) => {
                let r = self.translate_expression(fb, &t.value);
                fb.emit(Instruction::Throw(r));
            }
            Statement::Return(r) => {
                let value_ref = match &r.value {
                    Some(e) => self.translate_expression(fb, e),
                    None => {
                        let v = fb.new_ref(self);
                        fb.emit(Instruction::SetTuple(v, vec![]));
                        v
                    }
                };
                fb.emit(Instruction::Return(value_ref));
            }
            Statement::Break(lc) => fb.emit(Instruction::Break(lc.depth)),
            Statement::Continue(lc) => fb.emit(Instruction::Continue(lc.depth)),
            Statement::Noop(_) => fb.emit(Instruction::Noop),
        };
    }

    fn translate_for(&mut self, fb: &mut FnBuilder, f: &crate::parser::ast::ForLoop<Type>) {
        let iterable_ref = self.translate_expression(fb, &f.iterable);
        let i_ref = fb.new_ref(self);
        fb.emit(Instruction::SetInteger(i_ref, 0, IntWidth::Unbounded, true));

        let push_idx = fb.emit(Instruction::PushLoopFrame(0, 0));
        let check = fb.here();
        let len_ref = fb.new_ref(self);
        fb.emit(Instruction::InteropRef(len_ref, Intrinsic::Length, vec![iterable_ref]));
        let cmp_ref = fb.new_ref(self);
        fb.emit(Instruction::InteropRef(cmp_ref, Intrinsic::LessThan, vec![i_ref, len_ref]));
        let false_idx = fb.emit(Instruction::FalseBranch(cmp_ref, 0));

        let elem_ref = fb.new_ref(self);
        fb.emit(Instruction::InteropRef(elem_ref, Intrinsic::Index, vec![iterable_ref, i_ref]));
        fb.push_scope();
        fb.declare(self, f.binding.clone(), elem_ref);
        for stmt in &f.body.statements {
            self.translate_statement(fb, stmt);
        }
        fb.pop_scope();

        let next_ref = fb.new_ref(self);
        fb.emit(Instruction::InteropRef(next_ref, Intrinsic::Increment, vec![i_ref]));
        fb.emit(Instruction::MutateRef(i_ref, next_ref));
        fb.emit(Instruction::Jump(check));

        let end = fb.here();
        fb.emit(Instruction::Noop);
        fb.patch_target(false_idx, end);
        fb.emit(Instruction::PopFrame);
        fb.patch_loop(push_idx, check, end);
    }

    fn translate_while(&mut self, fb: &mut FnBuilder, w: &crate::parser::ast::WhileLoop<Type>) {
        let push_idx = fb.emit(Instruction::PushLoopFrame(0, 0));
        let start = fb.here();
        let cond_ref = self.translate_expression(fb, &w.condition);
        let false_idx = fb.emit(Instruction::FalseBranch(cond_ref, 0));
        self.translate_block(fb, &w.body);
        fb.emit(Instruction::Jump(start));
        let end = fb.here();
        fb.emit(Instruction::Noop);
        fb.patch_target(false_idx, end);
        fb.emit(Instruction::PopFrame);
        fb.patch_loop(push_idx, start, end);
    }

    fn translate_do_while(&mut self, fb: &mut FnBuilder, d: &crate::parser::ast::DoWhileLoop<Type>) {
        let push_idx = fb.emit(Instruction::PushLoopFrame(0, 0));
        let start = fb.here();
        self.translate_block(fb, &d.body);
        let cond_ref = self.translate_expression(fb, &d.condition);
        fb.emit(Instruction::TrueBranch(cond_ref, start));
        let end = fb.here();
        fb.emit(Instruction::Noop);
        fb.emit(Instruction::PopFrame);
        fb.patch_loop(push_idx, start, end);
    }

    fn translate_try(&mut self, fb: &mut FnBuilder, t: &crate::parser::ast::TryCatchFinally<Type>) {
        let push_idx = fb.emit(Instruction::PushTryFrame(vec![], None));
        self.translate_block(fb, &t.try_block);
        fb.emit(Instruction::PopFrame);
        let jump_after_try = fb.emit(Instruction::Jump(0));

        let mut catch_targets = vec![];
        let mut catch_jumps = vec![];
        for catch in &t.catches {
            let catch_start = fb.here();
            let exception_type = self.checker.resolve_type_name(fb.path(), &catch.exception_type, &[]);
            catch_targets.push(CatchTarget { catch_start, catch_type: exception_type });

            fb.push_scope();
            let err_ref = fb.new_ref(self);
            fb.emit(Instruction::ErrorRef(err_ref));
            fb.declare(self, catch.binding.clone(), err_ref);
            for stmt in &catch.body.statements {
                self.translate_statement(fb, stmt);
            }
            fb.pop_scope();
            catch_jumps.push(fb.emit(Instruction::Jump(0)));
        }

        let end = fb.here();
        fb.patch_target(jump_after_try, end);
        for j in &catch_jumps {
            fb.patch_target(*j, end);
        }

        let finally_range = t.finally_block.as_ref().map(|block| {
            let start = fb.here();
            for stmt in &block.statements {
                self.translate_statement(fb, stmt);
            }
            (start, fb.here())
        });

        fb.emit(Instruction::Noop);
        fb.patch_try(push_idx, catch_targets, finally_range);
    }

    fn translate_expression(&mut self, fb: &mut FnBuilder, expr: &Expression<Type>) -> RefId {
        match expr {
            Expression::Integer(value, ty, _) => {
                let (width, signed) = match ty.resolve_shallow() {
                    Type::Integer { width, signed } => (width, signed),
                    _ => (IntWidth::Unbounded, true),
                };
                let r = fb.new_ref(self);
                fb.emit(Instruction::SetInteger(r, *value, width, signed));
                r
            }
            Expression::Float(bits, ty, _) => {
                let width = match ty.resolve_shallow() {
                    Type::Float(w) => w,
                    _ => crate::typesys::FloatWidth::W64,
                };
                let r = fb.new_ref(self);
                fb.emit(Instruction::SetFloat(r, *bits, width));
                r
            }
            Expression::Char(c, _, _) => {
                let r = fb.new_ref(self);
                fb.emit(Instruction::SetChar(r, *c));
                r
            }
            Expression::Bool(b, _, _) => {
                let r = fb.new_ref(self);
                fb.emit(Instruction::SetBool(r, *b));
                r
            }
            Expression::Str(s, _, _) => {
                let r = fb.new_ref(self);
                fb.emit(Instruction::SetString(r, s.clone()));
                r
            }
            Expression::Id(id) => {
                if let Some(r) = fb.lookup(&id.name) {
                    return r;
                }
                self.translate_identifier(fb, fb.path().to_path_buf().as_path(), &id.name)
            }
            Expression::Array(arr) => {
                let elems: Vec<RefId> = arr.elements.iter().map(|e| self.translate_expression(fb, e)).collect();
                let r = fb.new_ref(self);
                fb.emit(Instruction::SetArray(r, elems));
                r
            }
            Expression::Tuple(tup) => {
                let elems: Vec<RefId> = tup.elements.iter().map(|e| self.translate_expression(fb, e)).collect();
                let r = fb.new_ref(self);
                fb.emit(Instruction::SetTuple(r, elems));
                r
            }
            Expression::Struct(st) => {
                let fields: Vec<(String, RefId)> = st
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), self.translate_expression(fb, &f.value)))
                    .collect();
                let r = fb.new_ref(self);
                fb.emit(Instruction::SetStruct(r, fields));
                r
            }
            Expression::Lambda(l) => self.translate_lambda(fb, l),
            Expression::Unary(u) => {
                let operand = self.translate_expression(fb, &u.operand);
                let op = match u.operator {
                    crate::parser::ast::UnaryOperator::Neg => UnaryOp::Neg,
                    crate::parser::ast::UnaryOperator::Not => UnaryOp::Not,
                };
                let r = fb.new_ref(self);
                fb.emit(Instruction::UnaryOp(r, op, operand));
                r
            }
            Expression::Binary(b) => {
                let lhs = self.translate_expression(fb, &b.lhs);
                let rhs = self.translate_expression(fb, &b.rhs);
                let op = binary_op(b.operator);
                let r = fb.new_ref(self);
                fb.emit(Instruction::BinaryOp(r, op, lhs, rhs));
                r
            }
            Expression::If(i) => {
                let cond = self.translate_expression(fb, &i.condition);
                let false_idx = fb.emit(Instruction::FalseBranch(cond, 0));
                let result = fb.new_ref(self);
                let then_ref = self.translate_expression(fb, &i.then_branch);
                fb.emit(Instruction::CopyRef(result, then_ref));
                let jump_idx = fb.emit(Instruction::Jump(0));
                let alt_start = fb.here();
                fb.patch_target(false_idx, alt_start);
                let else_ref = match &i.else_branch {
                    Some(e) => self.translate_expression(fb, e),
                    None => {
                        let v = fb.new_ref(self);
                        fb.emit(Instruction::SetTuple(v, vec![]));
                        v
                    }
                };
                fb.emit(Instruction::CopyRef(result, else_ref));
                let joint = fb.here();
                fb.patch_target(jump_idx, joint);
                result
            }
            Expression::VariableDeclaration(vd) => {
                let value_ref = self.translate_expression(fb, &vd.value);
                fb.declare(self, vd.name.clone(), value_ref);
                value_ref
            }
            Expression::Application(app) => self.translate_application(fb, app),
            Expression::FieldAccess(fa) => self.translate_field_access(fb, fa),
            Expression::ArrayAccess(aa) => {
                let base = self.translate_expression(fb, &aa.base);
                let index = self.translate_expression(fb, &aa.index);
                let r = fb.new_ref(self);
                fb.emit(Instruction::ArrayAccess(r, base, index));
                r
            }
            Expression::Parenthesized(inner, _) => self.translate_expression(fb, inner),
        }
    }

    /// `callee(args...)`. Spec.md's instruction list has no explicit call
    /// opcode; `ir::Instruction::Call` fills that gap (see `DESIGN.md`).
    fn translate_application(&mut self, fb: &mut FnBuilder, app: &crate::parser::ast::Application<Type>) -> RefId {
        let callee = self.translate_expression(fb, &app.callee);
        let args: Vec<RefId> = app.args.iter().map(|a| self.translate_expression(fb, a)).collect();
        let r = fb.new_ref(self);
        fb.emit(Instruction::Call(r, callee, args));
        r
    }

    fn translate_field_access(&mut self, fb: &mut FnBuilder, fa: &crate::parser::ast::FieldAccess<Type>) -> RefId {
        if let Expression::Id(id) = &fa.base {
            if fb.lookup(&id.name).is_none() {
                let path = fb.path().to_path_buf();
                if let Some(binding) = self.checker.modules.get(&path).and_then(|m| m.imports.get(&id.name)).cloned() {
                    if binding.exported_name == "*" {
                        return self.translate_identifier(fb, &binding.module_path, &fa.field);
                    }
                }
            }
        }
        let base = self.translate_expression(fb, &fa.base);
        let r = fb.new_ref(self);
        fb.emit(Instruction::FieldAccess(r, base, fa.field.clone()));
        r
    }

    fn translate_lambda(&mut self, fb: &mut FnBuilder, lambda: &crate::parser::ast::Lambda<Type>) -> RefId {
        let id = self.functions.len();
        self.next_lambda += 1;
        self.functions.push(ir::Function {
            id,
            name: format!("{}::lambda#{}", fb.path().display(), self.next_lambda),
            param_count: lambda.params.len(),
            instructions: vec![],
        });

        let mut lfb = FnBuilder::new(fb.path().to_path_buf());
        for (i, param) in lambda.params.iter().enumerate() {
            let r = lfb.new_ref(self);
            lfb.emit(Instruction::ParamRef(r, i));
            lfb.declare(self, param.name.clone(), r);
        }
        match &lambda.body {
            LambdaBody::Block(block) => self.translate_block(&mut lfb, block),
            LambdaBody::Expression(expr) => {
                let r = self.translate_expression(&mut lfb, expr);
                lfb.emit(Instruction::Return(r));
            }
        }
        let void_ref = lfb.new_ref(self);
        lfb.emit(Instruction::SetTuple(void_ref, vec![]));
        lfb.emit(Instruction::Return(void_ref));
        self.functions[id].instructions = lfb.instructions;

        let r = fb.new_ref(self);
        fb.emit(Instruction::SetFunction(r, id));
        r
    }

    /// Resolves an identifier that missed every enclosing scope: a local
    /// function, a local constant (memoized-wrapper pattern), or one import
    /// hop (spec.md §4.3/§4.4).
    fn translate_identifier(&mut self, fb: &mut FnBuilder, path: &Path, name: &str) -> RefId {
        if find_function(&self.programs[path], name).is_some() {
            let fid = self.function_id(path, name);
            let r = fb.new_ref(self);
            fb.emit(Instruction::SetFunction(r, fid));
            return r;
        }
        if find_constant(&self.programs[path], name).is_some() {
            return self.translate_constant_reference(fb, path, name);
        }
        if let Some(binding) = self.checker.modules.get(path).and_then(|m| m.imports.get(name)).cloned() {
            return self.translate_identifier(fb, &binding.module_path, &binding.exported_name);
        }
        panic!("identifier '{name}' resolved by the checker but not found during translation");
    }

    /// Memoized-constant-wrapper pattern (spec.md §4.4): `const-branch`
    /// skips straight to the read if the constant id was already
    /// initialized by an earlier reference; otherwise the value expression
    /// is translated inline and stored via `const-set`.
    fn translate_constant_reference(&mut self, fb: &mut FnBuilder, path: &Path, name: &str) -> RefId {
        let const_id = *self
            .const_ids
            .entry((path.to_path_buf(), name.to_owned()))
            .or_insert_with(|| {
                self.next_const += 1;
                self.next_const - 1
            });

        let branch_idx = fb.emit(Instruction::ConstBranch(const_id, 0));
        let decl = find_constant(&self.programs[path], name)
            .expect("constant presence already checked by caller")
            .clone();
        let value_ref = self.translate_expression(fb, &decl.value);
        fb.emit(Instruction::ConstSet(const_id, value_ref));
        let after_init = fb.here();
        fb.patch_target(branch_idx, after_init);

        let r = fb.new_ref(self);
        fb.emit(Instruction::ConstRef(r, const_id));
        r
    }
}

fn binary_op(op: crate::parser::ast::BinaryOperator) -> BinaryOp {
    use crate::parser::ast::BinaryOperator as B;
    match op {
        B::Add => BinaryOp::Add,
        B::Sub => BinaryOp::Sub,
        B::Mul => BinaryOp::Mul,
        B::Div => BinaryOp::Div,
        B::Mod => BinaryOp::Mod,
        B::Eq => BinaryOp::Eq,
        B::Neq => BinaryOp::Neq,
        B::Lt => BinaryOp::Lt,
        B::Lte => BinaryOp::Lte,
        B::Gt => BinaryOp::Gt,
        B::Gte => BinaryOp::Gte,
        B::And => BinaryOp::And,
        B::Or => BinaryOp::Or,
    }
}

/// Per-function translation state: the local-scope stack (source-level
/// lexical scoping, resolved entirely at translation time — the interpreter
/// only ever sees flat `add-to-scope`/lookups against its own frame stack)
/// and the instruction vector under construction.
struct FnBuilder {
    path: PathBuf,
    scopes: Vec<HashMap<String, RefId>>,
    instructions: Vec<Instruction>,
}

impl FnBuilder {
    fn new(path: PathBuf) -> Self {
        Self { path, scopes: vec![HashMap::new()], instructions: vec![] }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn new_ref(&mut self, t: &mut Translator) -> RefId {
        t.new_ref()
    }

    fn emit(&mut self, instr: Instruction) -> Ic {
        self.instructions.push(instr);
        self.instructions.len() - 1
    }

    fn here(&self) -> Ic {
        self.instructions.len()
    }

    fn declare(&mut self, _t: &mut Translator, name: String, r: RefId) {
        self.scopes.last_mut().expect("at least one scope").insert(name.clone(), r);
        self.emit(Instruction::AddToScope(name, r));
    }

    fn lookup(&self, name: &str) -> Option<RefId> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
        self.emit(Instruction::PushScopeFrame);
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        self.emit(Instruction::PopFrame);
    }

    fn patch_target(&mut self, idx: Ic, target: Ic) {
        match &mut self.instructions[idx] {
            Instruction::FalseBranch(_, t)
            | Instruction::TrueBranch(_, t)
            | Instruction::Jump(t)
            | Instruction::ConstBranch(_, t) => *t = target,
            other => panic!("patch_target on non-branch instruction: {other:?}"),
        }
    }

    fn patch_loop(&mut self, idx: Ic, start: Ic, end: Ic) {
        match &mut self.instructions[idx] {
            Instruction::PushLoopFrame(s, e) => {
                *s = start;
                *e = end;
            }
            other => panic!("patch_loop on non-loop-frame instruction: {other:?}"),
        }
    }

    fn patch_try(&mut self, idx: Ic, catches: Vec<CatchTarget>, finally: Option<(Ic, Ic)>) {
        match &mut self.instructions[idx] {
            Instruction::PushTryFrame(c, f) => {
                *c = catches;
                *f = finally;
            }
            other => panic!("patch_try on non-try-frame instruction: {other:?}"),
        }
    }
}
