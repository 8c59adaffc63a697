//! Statement typing (spec.md §4.3). Every `Statement<()>` is rewritten
//! into a `Statement<Type>`; `Noop`, `Break`, and `Continue` carry no
//! expression to type but still participate in the loop-depth and
//! return-type bookkeeping `Context` holds.

use std::path::Path;

use crate::{
    parser::ast::{Block, CatchClause, DoWhileLoop, ForLoop, Return, Statement, Throw, TryCatchFinally, WhileLoop},
    typesys::{is_assignable_from, Type},
};

use super::{
    context::Context,
    error::{LoopControlOutOfRange, TypeCheckError, TypeMismatch},
    Checker,
};

impl Checker {
    pub fn check_block(&mut self, path: &Path, ctx: &mut Context, block: &Block<()>) -> Block<Type> {
        ctx.push_scope();
        let statements = block.statements.iter().map(|s| self.check_statement(path, ctx, s)).collect();
        ctx.pop_scope();
        Block {
            statements,
            info: Type::void(),
            position: block.position.clone(),
        }
    }

    fn check_statement(&mut self, path: &Path, ctx: &mut Context, stmt: &Statement<()>) -> Statement<Type> {
        match stmt {
            Statement::Block(b) => Statement::Block(self.check_block(path, ctx, b)),
            Statement::Expression(e) => Statement::Expression(self.check_expression(path, ctx, e)),
            Statement::For(f) => {
                let iterable = self.check_expression(path, ctx, &f.iterable);
                let elem_type = match iterable.get_info().resolve_shallow() {
                    Type::Array(elem) => *elem,
                    Type::Unknown => Type::Unknown,
                    other => {
                        self.errors.push(TypeCheckError::TypeMismatch(
                            TypeMismatch {
                                expected: Type::Array(Box::new(Type::Any)),
                                actual: other,
                            },
                            iterable.position(),
                        ));
                        Type::Unknown
                    }
                };
                ctx.push_scope();
                ctx.declare(f.binding.clone(), elem_type);
                ctx.enter_loop();
                let body = self.check_block(path, ctx, &f.body);
                ctx.exit_loop();
                ctx.pop_scope();
                Statement::For(ForLoop {
                    binding: f.binding.clone(),
                    iterable,
                    body,
                    info: Type::void(),
                    position: f.position.clone(),
                })
            }
            Statement::While(w) => {
                let condition = self.check_expression(path, ctx, &w.condition);
                self.require_bool_condition(&condition);
                ctx.enter_loop();
                let body = self.check_block(path, ctx, &w.body);
                ctx.exit_loop();
                Statement::While(WhileLoop {
                    condition,
                    body,
                    info: Type::void(),
                    position: w.position.clone(),
                })
            }
            Statement::DoWhile(d) => {
                ctx.enter_loop();
                let body = self.check_block(path, ctx, &d.body);
                ctx.exit_loop();
                let condition = self.check_expression(path, ctx, &d.condition);
                self.require_bool_condition(&condition);
                Statement::DoWhile(DoWhileLoop {
                    body,
                    condition,
                    info: Type::void(),
                    position: d.position.clone(),
                })
            }
            Statement::TryCatchFinally(t) => {
                let try_block = self.check_block(path, ctx, &t.try_block);
                let catches = t
                    .catches
                    .iter()
                    .map(|c| {
                        let exception_type = self.resolve_type_name(path, &c.exception_type, &[]);
                        ctx.push_scope();
                        ctx.declare(c.binding.clone(), exception_type);
                        let body = self.check_block(path, ctx, &c.body);
                        ctx.pop_scope();
                        CatchClause {
                            exception_type: c.exception_type.clone(),
                            binding: c.binding.clone(),
                            body,
                            position: c.position.clone(),
                        }
                    })
                    .collect();
                let finally_block = t.finally_block.as_ref().map(|f| self.check_block(path, ctx, f));
                Statement::TryCatchFinally(TryCatchFinally {
                    try_block,
                    catches,
                    finally_block,
                    info: Type::void(),
                    position: t.position.clone(),
                })
            }
            Statement::Throw(t) => {
                let value = self.check_expression(path, ctx, &t.value);
                Statement::Throw(Throw {
                    value,
                    position: t.position.clone(),
                })
            }
            Statement::Return(r) => {
                let expected = ctx.return_type.clone();
                let value = r.value.as_ref().map(|v| self.check_expression_expected(path, ctx, v, expected.as_ref()));
                match (&value, &expected) {
                    (Some(typed), Some(declared)) => {
                        if !is_assignable_from(declared, &typed.get_info()) {
                            self.errors.push(TypeCheckError::TypeMismatch(
                                TypeMismatch {
                                    expected: declared.clone(),
                                    actual: typed.get_info(),
                                },
                                typed.position(),
                            ));
                        }
                    }
                    (None, Some(declared)) if !declared.is_void() => {
                        self.errors.push(TypeCheckError::TypeMismatch(
                            TypeMismatch {
                                expected: declared.clone(),
                                actual: Type::void(),
                            },
                            r.position.clone(),
                        ));
                    }
                    _ => {}
                }
                Statement::Return(Return {
                    value,
                    position: r.position.clone(),
                })
            }
            Statement::Break(lc) => {
                self.check_loop_control_depth(ctx, lc.depth, lc.position.clone());
                Statement::Break(lc.clone())
            }
            Statement::Continue(lc) => {
                self.check_loop_control_depth(ctx, lc.depth, lc.position.clone());
                Statement::Continue(lc.clone())
            }
            Statement::Noop(s) => Statement::Noop(s.clone()),
        }
    }

    fn require_bool_condition(&mut self, condition: &crate::parser::ast::Expression<Type>) {
        if !is_assignable_from(&Type::Bool, &condition.get_info()) {
            self.errors.push(TypeCheckError::TypeMismatch(
                TypeMismatch {
                    expected: Type::Bool,
                    actual: condition.get_info(),
                },
                condition.position(),
            ));
        }
    }

    /// `depth` is 0-indexed from the innermost loop (spec.md §9 Design
    /// Notes); a valid control statement needs at least `depth + 1`
    /// enclosing loops.
    fn check_loop_control_depth(&mut self, ctx: &Context, depth: u32, span: crate::lexer::Span) {
        if depth >= ctx.loop_depth {
            self.errors.push(TypeCheckError::LoopControlOutOfRange(
                LoopControlOutOfRange {
                    depth,
                    loop_depth: ctx.loop_depth,
                },
                span,
            ));
        }
    }
}
