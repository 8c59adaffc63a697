//! Expression typing (spec.md §4.3 "every expression is assigned exactly
//! one type"). `check_expression` rewrites an `Expression<()>` into an
//! `Expression<Type>` bottom-up; `check_expression_expected` threads a
//! bidirectional "expected type" hint into the handful of positions that
//! need it (lambda parameters without annotations, `let` values, `if`
//! branches, application arguments) so an unannotated lambda passed
//! straight to a generic or explicitly-typed parameter still gets typed
//! parameters instead of `unknown`.

use std::path::Path;

use crate::{
    lexer::Span,
    parser::ast::{
        ArrayAccess, ArrayLiteral, Application, BinaryExpression, BinaryOperator, Expression,
        FieldAccess, Id, IfExpression, Lambda, LambdaBody, LambdaParameter, StructFieldInit,
        StructLiteral, TupleLiteral, TypeName, UnaryExpression, UnaryOperator, VariableDeclaration,
    },
    typesys::{is_assignable_from, most_general, specify, infer_type_args, FloatWidth, IntWidth, Type},
};

use super::{
    context::Context,
    error::{
        ConstraintNotSatisfied, GenericArityMismatch, OperatorNotDefined, TypeCheckError,
        TypeMismatch, UndefinedField, UndefinedType, UndefinedValue,
    },
    Checker,
};

impl Checker {
    pub fn check_expression(&mut self, path: &Path, ctx: &mut Context, expr: &Expression<()>) -> Expression<Type> {
        self.check_expression_expected(path, ctx, expr, None)
    }

    fn check_expression_expected(
        &mut self,
        path: &Path,
        ctx: &mut Context,
        expr: &Expression<()>,
        expected: Option<&Type>,
    ) -> Expression<Type> {
        match expr {
            Expression::Integer(value, _, span) => {
                Expression::Integer(*value, super::integer_literal_type(*value), span.clone())
            }
            Expression::Float(bits, _, span) => {
                Expression::Float(*bits, Type::Float(FloatWidth::W64), span.clone())
            }
            Expression::Char(c, _, span) => Expression::Char(*c, Type::Char, span.clone()),
            Expression::Str(s, _, span) => {
                Expression::Str(s.clone(), Type::Array(Box::new(Type::Char)), span.clone())
            }
            Expression::Bool(b, _, span) => Expression::Bool(*b, Type::Bool, span.clone()),
            Expression::Id(id) => {
                let ty = ctx
                    .lookup(&id.name)
                    .unwrap_or_else(|| self.resolve_identifier_type(path, &id.name, &id.position));
                Expression::Id(Id {
                    name: id.name.clone(),
                    info: ty,
                    position: id.position.clone(),
                })
            }
            Expression::Array(arr) => {
                let elements: Vec<Expression<Type>> =
                    arr.elements.iter().map(|e| self.check_expression(path, ctx, e)).collect();
                let elem_type = elements
                    .iter()
                    .map(|e| e.get_info())
                    .reduce(|a, b| most_general(&a, &b))
                    .unwrap_or(Type::Unknown);
                Expression::Array(ArrayLiteral {
                    elements,
                    info: Type::Array(Box::new(elem_type)),
                    position: arr.position.clone(),
                })
            }
            Expression::Tuple(tup) => {
                let elements: Vec<Expression<Type>> =
                    tup.elements.iter().map(|e| self.check_expression(path, ctx, e)).collect();
                let info = Type::Tuple(elements.iter().map(|e| e.get_info()).collect());
                Expression::Tuple(TupleLiteral {
                    elements,
                    info,
                    position: tup.position.clone(),
                })
            }
            Expression::Struct(st) => self.check_struct_literal(path, ctx, st),
            Expression::Lambda(l) => Expression::Lambda(self.check_lambda(path, ctx, l, expected)),
            Expression::Unary(u) => {
                let operand = self.check_expression(path, ctx, &u.operand);
                let operand_type = operand.get_info();
                let info = match u.operator {
                    UnaryOperator::Neg => {
                        if is_numeric(&operand_type) {
                            operand_type.clone()
                        } else {
                            self.operator_error("-", vec![operand_type.clone()], u.position.clone())
                        }
                    }
                    UnaryOperator::Not => {
                        if matches!(operand_type.resolve_shallow(), Type::Bool | Type::Unknown) {
                            Type::Bool
                        } else {
                            self.operator_error("!", vec![operand_type.clone()], u.position.clone())
                        }
                    }
                };
                Expression::Unary(Box::new(UnaryExpression {
                    operator: u.operator,
                    operand,
                    info,
                    position: u.position.clone(),
                }))
            }
            Expression::Binary(b) => {
                let lhs = self.check_expression(path, ctx, &b.lhs);
                let rhs = self.check_expression(path, ctx, &b.rhs);
                let (lt, rt) = (lhs.get_info(), rhs.get_info());
                let info = self.binary_result_type(b.operator, &lt, &rt, b.position.clone());
                Expression::Binary(Box::new(BinaryExpression {
                    operator: b.operator,
                    lhs,
                    rhs,
                    info,
                    position: b.position.clone(),
                }))
            }
            Expression::If(i) => {
                let condition = self.check_expression(path, ctx, &i.condition);
                if !is_assignable_from(&Type::Bool, &condition.get_info()) {
                    self.errors.push(TypeCheckError::TypeMismatch(
                        TypeMismatch {
                            expected: Type::Bool,
                            actual: condition.get_info(),
                        },
                        condition.position(),
                    ));
                }
                let then_branch = self.check_expression_expected(path, ctx, &i.then_branch, expected);
                let else_branch = i
                    .else_branch
                    .as_ref()
                    .map(|e| self.check_expression_expected(path, ctx, e, expected));
                let info = match &else_branch {
                    Some(e) => most_general(&then_branch.get_info(), &e.get_info()),
                    None => Type::void(),
                };
                Expression::If(Box::new(IfExpression {
                    condition,
                    then_branch,
                    else_branch,
                    info,
                    position: i.position.clone(),
                }))
            }
            Expression::VariableDeclaration(vd) => {
                let declared = vd.type_annotation.as_ref().map(|t| self.resolve_type_name(path, t, &[]));
                let value = self.check_expression_expected(path, ctx, &vd.value, declared.as_ref());
                let actual = value.get_info();
                let info = match &declared {
                    Some(d) if !matches!(d, Type::Unknown) => {
                        if !is_assignable_from(d, &actual) {
                            self.errors.push(TypeCheckError::TypeMismatch(
                                TypeMismatch {
                                    expected: d.clone(),
                                    actual: actual.clone(),
                                },
                                value.position(),
                            ));
                        }
                        d.clone()
                    }
                    _ => actual,
                };
                ctx.declare(vd.name.clone(), info.clone());
                Expression::VariableDeclaration(Box::new(VariableDeclaration {
                    name: vd.name.clone(),
                    type_annotation: vd.type_annotation.clone(),
                    value,
                    info,
                    position: vd.position.clone(),
                }))
            }
            Expression::Application(app) => {
                let callee = self.check_expression(path, ctx, &app.callee);
                let (args, info) = self.check_application(path, ctx, app, &callee);
                Expression::Application(Box::new(Application {
                    callee,
                    type_args: app.type_args.clone(),
                    args,
                    info,
                    position: app.position.clone(),
                }))
            }
            Expression::FieldAccess(fa) => self.check_field_access(path, ctx, fa),
            Expression::ArrayAccess(aa) => {
                let base = self.check_expression(path, ctx, &aa.base);
                let index = self.check_expression(path, ctx, &aa.index);
                let any_int = Type::Integer { width: IntWidth::Unbounded, signed: true };
                if !is_assignable_from(&any_int, &index.get_info()) {
                    self.errors.push(TypeCheckError::TypeMismatch(
                        TypeMismatch {
                            expected: any_int,
                            actual: index.get_info(),
                        },
                        index.position(),
                    ));
                }
                let info = match base.get_info().resolve_shallow() {
                    Type::Array(elem) => *elem,
                    Type::Unknown => Type::Unknown,
                    other => self.operator_error("[]", vec![other], aa.position.clone()),
                };
                Expression::ArrayAccess(Box::new(ArrayAccess {
                    base,
                    index,
                    info,
                    position: aa.position.clone(),
                }))
            }
            Expression::Parenthesized(inner, span) => {
                let typed = self.check_expression_expected(path, ctx, inner, expected);
                Expression::Parenthesized(Box::new(typed), span.clone())
            }
        }
    }

    fn check_struct_literal(
        &mut self,
        path: &Path,
        ctx: &mut Context,
        st: &crate::parser::ast::StructLiteral<()>,
    ) -> Expression<Type> {
        let fields: Vec<StructFieldInit<Type>> = st
            .fields
            .iter()
            .map(|f| StructFieldInit {
                name: f.name.clone(),
                value: self.check_expression(path, ctx, &f.value),
                position: f.position.clone(),
            })
            .collect();
        let structural = Type::Struct(fields.iter().map(|f| (f.name.clone(), f.value.get_info())).collect());

        let info = match &st.name {
            None => structural,
            Some(name) => {
                let declared = self.resolve_named_struct_type(path, name, &st.position);
                match declared {
                    Some(d) if is_assignable_from(&d, &structural) => d,
                    Some(d) => {
                        self.errors.push(TypeCheckError::TypeMismatch(
                            TypeMismatch {
                                expected: d.clone(),
                                actual: structural,
                            },
                            st.position.clone(),
                        ));
                        d
                    }
                    None => structural,
                }
            }
        };

        Expression::Struct(StructLiteral {
            name: st.name.clone(),
            fields,
            info,
            position: st.position.clone(),
        })
    }

    /// Resolves a struct literal's optional leading type name (`Point { .. }`)
    /// against local and imported `type` declarations. Not a `TypeName`
    /// parse (there's no syntax position for type arguments here), so this
    /// bypasses `resolve_type_name` and goes straight to the declaration
    /// tables it would eventually bottom out in.
    fn resolve_named_struct_type(&mut self, path: &Path, name: &str, span: &Span) -> Option<Type> {
        if self.modules.get(path).map(|m| m.types.contains_key(name)).unwrap_or(false) {
            return Some(self.resolve_local_type(path, name));
        }
        if let Some(binding) = self.modules.get(path).and_then(|m| m.imports.get(name)).cloned() {
            return Some(self.resolve_imported_type(&binding.module_path, &binding.exported_name));
        }
        self.errors.push(TypeCheckError::UndefinedType(
            UndefinedType {
                type_name: TypeName::Literal(name.to_owned(), span.clone()),
            },
            span.clone(),
        ));
        None
    }

    /// Identifier lookups that fall through the local scope stack: first a
    /// module-local function or constant, then one import hop, per spec.md
    /// §4.3 "identifiers look up the innermost symbol table, then the
    /// module's own declarations, then its imports".
    fn resolve_identifier_type(&mut self, path: &Path, name: &str, span: &Span) -> Type {
        if self.modules.get(path).map(|m| m.functions.contains_key(name)).unwrap_or(false) {
            return self.resolve_function_signature(path, name);
        }
        if self.modules.get(path).map(|m| m.constants.contains_key(name)).unwrap_or(false) {
            return self.resolve_constant(path, name);
        }
        let import = self.modules.get(path).and_then(|m| m.imports.get(name)).cloned();
        if let Some(binding) = import {
            if binding.exported_name == "*" {
                // A whole-module import alias names a namespace, not a value;
                // used only through `FieldAccess` (see `check_field_access`).
                return Type::Unknown;
            }
            if let Err(e) = self.register_module(&binding.module_path) {
                self.errors.push(e);
                return Type::Unknown;
            }
            let local_name = self
                .modules
                .get(&binding.module_path)
                .and_then(|m| m.exports.get(&binding.exported_name))
                .map(|e| e.local_name.clone());
            return match local_name {
                Some(local) => self.resolve_identifier_type(&binding.module_path, &local, span),
                None => Type::Unknown,
            };
        }
        self.errors.push(TypeCheckError::UndefinedValue(
            UndefinedValue { name: name.to_owned() },
            span.clone(),
        ));
        Type::Unknown
    }

    fn check_field_access(&mut self, path: &Path, ctx: &mut Context, fa: &FieldAccess<()>) -> Expression<Type> {
        if let Expression::Id(id) = &fa.base {
            if ctx.lookup(&id.name).is_none() {
                if let Some(binding) = self.modules.get(path).and_then(|m| m.imports.get(&id.name)).cloned() {
                    if binding.exported_name == "*" {
                        let info = self.resolve_identifier_type(&binding.module_path, &fa.field, &fa.position);
                        let base = Expression::Id(Id {
                            name: id.name.clone(),
                            info: Type::Unknown,
                            position: id.position.clone(),
                        });
                        return Expression::FieldAccess(Box::new(FieldAccess {
                            base,
                            field: fa.field.clone(),
                            info,
                            position: fa.position.clone(),
                        }));
                    }
                }
            }
        }

        let base = self.check_expression(path, ctx, &fa.base);
        let base_type = base.get_info().resolve_shallow();
        let info = match &base_type {
            Type::Struct(fields) => fields.iter().find(|(n, _)| n == &fa.field).map(|(_, t)| t.clone()),
            Type::Unknown => Some(Type::Unknown),
            _ => None,
        }
        .unwrap_or_else(|| {
            self.errors.push(TypeCheckError::UndefinedField(
                UndefinedField {
                    field: fa.field.clone(),
                    base_type: base_type.clone(),
                },
                fa.position.clone(),
            ));
            Type::Unknown
        });

        Expression::FieldAccess(Box::new(FieldAccess {
            base,
            field: fa.field.clone(),
            info,
            position: fa.position.clone(),
        }))
    }

    /// The three call-site algorithms of spec.md §4.3: non-generic
    /// (direct), explicit-generic (`f<T>(..)`, via `specify`), and
    /// implicit-generic (via `infer_type_args` over the non-lambda
    /// arguments, then `specify`, then a second pass over any lambda
    /// argument that had no parameter annotations of its own).
    fn check_application(
        &mut self,
        path: &Path,
        ctx: &mut Context,
        app: &Application<()>,
        callee: &Expression<Type>,
    ) -> (Vec<Expression<Type>>, Type) {
        let callee_type = callee.get_info().resolve_shallow();
        let Type::Function { params, return_type, type_params } = callee_type.clone() else {
            let args: Vec<Expression<Type>> =
                app.args.iter().map(|a| self.check_expression(path, ctx, a)).collect();
            if !matches!(callee_type, Type::Unknown) {
                self.errors.push(TypeCheckError::OperatorNotDefined(
                    OperatorNotDefined {
                        operator: "()".to_owned(),
                        operand_types: vec![callee_type],
                    },
                    app.position.clone(),
                ));
            }
            return (args, Type::Unknown);
        };

        if type_params.is_empty() && app.type_args.is_empty() {
            let args = self.check_call_args(path, ctx, &app.args, &params);
            return (args, (*return_type).clone());
        }

        if !app.type_args.is_empty() {
            if app.type_args.len() != type_params.len() {
                self.errors.push(TypeCheckError::GenericArityMismatch(
                    GenericArityMismatch {
                        expected: type_params.len(),
                        actual: app.type_args.len(),
                    },
                    app.position.clone(),
                ));
            }
            let resolved_args: Vec<Type> =
                app.type_args.iter().map(|t| self.resolve_type_name(path, t, &[])).collect();
            for (param, actual) in type_params.iter().zip(&resolved_args) {
                if let Some(constraint) = &param.constraint {
                    if !is_assignable_from(constraint, actual) {
                        self.errors.push(TypeCheckError::ConstraintNotSatisfied(
                            ConstraintNotSatisfied {
                                parameter: param.name.clone(),
                                constraint: (**constraint).clone(),
                                actual: actual.clone(),
                            },
                            app.position.clone(),
                        ));
                    }
                }
            }
            let specified = specify(&callee_type, &resolved_args);
            let Type::Function { params: p, return_type: r, .. } = specified else {
                unreachable!("specify always returns a Function type for a Function input")
            };
            let args = self.check_call_args(path, ctx, &app.args, &p);
            return (args, *r);
        }

        let mut slots: Vec<Option<Expression<Type>>> = Vec::with_capacity(app.args.len());
        let mut probe_types: Vec<Type> = Vec::with_capacity(app.args.len());
        for arg in &app.args {
            if is_unannotated_lambda(arg) {
                slots.push(None);
                probe_types.push(Type::Unknown);
            } else {
                let typed = self.check_expression(path, ctx, arg);
                probe_types.push(typed.get_info());
                slots.push(Some(typed));
            }
        }
        let inferred_args = infer_type_args(&callee_type, &probe_types);
        let specified = specify(&callee_type, &inferred_args);
        let Type::Function { params: p, return_type: r, .. } = specified else {
            unreachable!("specify always returns a Function type for a Function input")
        };
        for (i, arg) in app.args.iter().enumerate() {
            if slots[i].is_none() {
                slots[i] = Some(self.check_expression_expected(path, ctx, arg, p.get(i)));
            }
        }
        let args: Vec<Expression<Type>> = slots.into_iter().map(|s| s.expect("every slot filled above")).collect();
        self.check_arg_assignability(&args, &p);
        (args, *r)
    }

    fn check_call_args(
        &mut self,
        path: &Path,
        ctx: &mut Context,
        args: &[Expression<()>],
        params: &[Type],
    ) -> Vec<Expression<Type>> {
        let typed: Vec<Expression<Type>> = args
            .iter()
            .enumerate()
            .map(|(i, a)| self.check_expression_expected(path, ctx, a, params.get(i)))
            .collect();
        self.check_arg_assignability(&typed, params);
        typed
    }

    fn check_arg_assignability(&mut self, args: &[Expression<Type>], params: &[Type]) {
        for (arg, param_ty) in args.iter().zip(params) {
            if !is_assignable_from(param_ty, &arg.get_info()) {
                self.errors.push(TypeCheckError::TypeMismatch(
                    TypeMismatch {
                        expected: param_ty.clone(),
                        actual: arg.get_info(),
                    },
                    arg.position(),
                ));
            }
        }
    }

    /// Checks a lambda against an optional enclosing expected function type
    /// (only ever `Some` from an application-argument position). Closes
    /// over the caller's scope, so parameters are declared in a pushed
    /// child scope rather than a fresh `Context`.
    fn check_lambda(
        &mut self,
        path: &Path,
        ctx: &mut Context,
        lambda: &Lambda<()>,
        expected: Option<&Type>,
    ) -> Lambda<Type> {
        let expected_fn = expected.and_then(|t| match t.resolve_shallow() {
            Type::Function { params, return_type, .. } => Some((params, *return_type)),
            _ => None,
        });

        ctx.push_scope();

        let typed_params: Vec<LambdaParameter<Type>> = lambda
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let ty = match &p.type_annotation {
                    Some(tn) => self.resolve_type_name(path, tn, &[]),
                    None => expected_fn
                        .as_ref()
                        .and_then(|(params, _)| params.get(i).cloned())
                        .unwrap_or(Type::Unknown),
                };
                ctx.declare(p.name.clone(), ty.clone());
                LambdaParameter {
                    name: p.name.clone(),
                    type_annotation: p.type_annotation.clone(),
                    info: ty,
                    position: p.position.clone(),
                }
            })
            .collect();

        let declared_return = lambda.return_type.as_ref().map(|t| self.resolve_type_name(path, t, &[]));
        let target_return = declared_return.or_else(|| expected_fn.map(|(_, r)| r));

        let prev_return_type = ctx.return_type.clone();
        ctx.return_type = target_return.clone();

        let (body, return_type) = match &lambda.body {
            LambdaBody::Block(block) => {
                let typed_block = self.check_block(path, ctx, block);
                (LambdaBody::Block(typed_block), target_return.clone().unwrap_or(Type::Unknown))
            }
            LambdaBody::Expression(expr) => {
                let typed = self.check_expression_expected(path, ctx, expr, target_return.as_ref());
                let actual = typed.get_info();
                if let Some(declared) = &target_return {
                    if !is_assignable_from(declared, &actual) {
                        self.errors.push(TypeCheckError::TypeMismatch(
                            TypeMismatch {
                                expected: declared.clone(),
                                actual: actual.clone(),
                            },
                            typed.position(),
                        ));
                    }
                }
                let rt = target_return.clone().unwrap_or(actual);
                (LambdaBody::Expression(Box::new(typed)), rt)
            }
        };

        ctx.return_type = prev_return_type;
        ctx.pop_scope();

        let info = Type::Function {
            params: typed_params.iter().map(|p| p.info.clone()).collect(),
            return_type: Box::new(return_type),
            type_params: vec![],
        };

        Lambda {
            params: typed_params,
            return_type: lambda.return_type.clone(),
            body,
            info,
            position: lambda.position.clone(),
        }
    }

    fn binary_result_type(&mut self, op: BinaryOperator, lt: &Type, rt: &Type, span: Span) -> Type {
        match op {
            BinaryOperator::Add => {
                if let (Type::Array(_), Type::Array(_)) = (lt.resolve_shallow(), rt.resolve_shallow()) {
                    most_general(lt, rt)
                } else {
                    self.numeric_binary(lt, rt, "+", span)
                }
            }
            BinaryOperator::Sub => self.numeric_binary(lt, rt, "-", span),
            BinaryOperator::Mul => self.numeric_binary(lt, rt, "*", span),
            BinaryOperator::Div => self.numeric_binary(lt, rt, "/", span),
            BinaryOperator::Mod => self.numeric_binary(lt, rt, "%", span),
            BinaryOperator::Lt | BinaryOperator::Lte | BinaryOperator::Gt | BinaryOperator::Gte => {
                if is_numeric(lt) && is_numeric(rt) {
                    Type::Bool
                } else {
                    self.operator_error(op_symbol(op), vec![lt.clone(), rt.clone()], span)
                }
            }
            BinaryOperator::Eq | BinaryOperator::Neq => {
                if is_assignable_from(lt, rt) || is_assignable_from(rt, lt) {
                    Type::Bool
                } else {
                    self.operator_error(op_symbol(op), vec![lt.clone(), rt.clone()], span)
                }
            }
            BinaryOperator::And | BinaryOperator::Or => {
                let boolish = |t: &Type| matches!(t.resolve_shallow(), Type::Bool | Type::Unknown);
                if boolish(lt) && boolish(rt) {
                    Type::Bool
                } else {
                    self.operator_error(op_symbol(op), vec![lt.clone(), rt.clone()], span)
                }
            }
        }
    }

    fn numeric_binary(&mut self, lt: &Type, rt: &Type, symbol: &str, span: Span) -> Type {
        if is_numeric(lt) && is_numeric(rt) {
            most_general(lt, rt)
        } else {
            self.operator_error(symbol, vec![lt.clone(), rt.clone()], span)
        }
    }

    fn operator_error(&mut self, operator: &str, operand_types: Vec<Type>, span: Span) -> Type {
        self.errors.push(TypeCheckError::OperatorNotDefined(
            OperatorNotDefined {
                operator: operator.to_owned(),
                operand_types,
            },
            span,
        ));
        Type::Unknown
    }
}

fn is_numeric(t: &Type) -> bool {
    matches!(t.resolve_shallow(), Type::Integer { .. } | Type::Float(_) | Type::Unknown)
}

fn is_unannotated_lambda(expr: &Expression<()>) -> bool {
    matches!(expr, Expression::Lambda(l) if l.params.iter().any(|p| p.type_annotation.is_none()))
}

fn op_symbol(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Sub => "-",
        BinaryOperator::Mul => "*",
        BinaryOperator::Div => "/",
        BinaryOperator::Mod => "%",
        BinaryOperator::Eq => "==",
        BinaryOperator::Neq => "!=",
        BinaryOperator::Lt => "<",
        BinaryOperator::Lte => "<=",
        BinaryOperator::Gt => ">",
        BinaryOperator::Gte => ">=",
        BinaryOperator::And => "&&",
        BinaryOperator::Or => "||",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{module::Module, resolver::FilesystemResolver};
    use std::path::PathBuf;

    fn checker() -> Checker {
        Checker::new(Box::new(FilesystemResolver::new(vec![])))
    }

    fn parse(src: &str) -> crate::parser::ast::Program<()> {
        crate::parser::parse_program("test.ren", src).expect("valid source")
    }

    fn entry_module(src: &str) -> Module {
        Module::new("test".to_owned(), PathBuf::from("test.ren"), parse(src))
    }

    #[test]
    fn integer_arithmetic_widens_to_the_wider_operand() {
        let module = entry_module("fn main(args: string[]): void { let x = 1 + 100000; }");
        let mut c = checker();
        let result = c.check(&module);
        assert!(result.is_ok(), "unexpected errors: {:?}", result.err());
    }

    #[test]
    fn undefined_value_is_reported() {
        let module = entry_module("fn main(args: string[]): void { let x = y; }");
        let mut c = checker();
        let result = c.check(&module);
        assert!(matches!(
            result,
            Err(errors) if errors.iter().any(|e| matches!(e, TypeCheckError::UndefinedValue(..)))
        ));
    }

    #[test]
    fn boolean_operators_reject_non_bool_operands() {
        let module = entry_module("fn main(args: string[]): void { let x = 1 && true; }");
        let mut c = checker();
        let result = c.check(&module);
        assert!(matches!(
            result,
            Err(errors) if errors.iter().any(|e| matches!(e, TypeCheckError::OperatorNotDefined(..)))
        ));
    }
}
