//! CST → AST reduction (spec.md §4.2).
//!
//! Rewrites the `pest` concrete syntax tree into the AST: collapses
//! single-alternative grammar nodes to their payload, folds binary-operator
//! chains using the precedence table in `parser::precedence` via a
//! shunting-yard pass, attaches a `self` span to every reduced node, and
//! normalizes empty blocks to a `noop` node carrying the brace span.

use pest::iterators::Pair;

use crate::lexer::{Position, Span};

use super::{
    ast::*,
    cst::Rule,
    precedence::{associativity, precedence, Associativity},
};

#[derive(Debug, Clone)]
pub struct ReduceError {
    pub message: String,
    pub position: Span,
}

impl std::fmt::Display for ReduceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.position.to_string(&self.message))
    }
}

impl std::error::Error for ReduceError {}

type Result<T> = std::result::Result<T, ReduceError>;

fn span(pair: &Pair<Rule>, file: &str) -> Span {
    let s = pair.as_span();
    let (sl, sc) = s.start_pos().line_col();
    let (el, ec) = s.end_pos().line_col();
    Span::new(file, Position::new(sl, sc), Position::new(el, ec))
}

fn err(pair: &Pair<Rule>, file: &str, message: impl Into<String>) -> ReduceError {
    ReduceError {
        message: message.into(),
        position: span(pair, file),
    }
}

pub fn parse_program(
    pairs: pest::iterators::Pairs<Rule>,
    file: &str,
) -> Result<Program<()>> {
    let mut program = vec![];
    for pair in pairs {
        match pair.as_rule() {
            Rule::EOI => {}
            Rule::topLevelStatement => program.push(top_level_statement(pair, file)?),
            _ => program.push(top_level_statement(pair, file)?),
        }
    }
    Ok(program)
}

fn only_inner(pair: Pair<Rule>) -> Pair<Rule> {
    pair.into_inner().next().expect("single-alternative node")
}

fn top_level_statement(pair: Pair<Rule>, file: &str) -> Result<TopLevelStatement<()>> {
    let pair = if pair.as_rule() == Rule::topLevelStatement {
        only_inner(pair)
    } else {
        pair
    };

    match pair.as_rule() {
        Rule::importDirective => Ok(TopLevelStatement::Import(import_directive(pair, file)?)),
        Rule::exportStatement => Ok(TopLevelStatement::Export(export_statement(pair, file)?)),
        Rule::namespaceDeclaration => {
            Ok(TopLevelStatement::Namespace(namespace_declaration(pair, file)?))
        }
        Rule::typeDeclaration => {
            Ok(TopLevelStatement::TypeDeclaration(type_declaration(pair, file)?))
        }
        Rule::constantDeclaration => {
            Ok(TopLevelStatement::Constant(constant_declaration(pair, file)?))
        }
        Rule::functionDeclaration => {
            Ok(TopLevelStatement::Function(function_declaration(pair, file)?))
        }
        rule => Err(err(&pair, file, format!("unexpected top-level rule {rule:?}"))),
    }
}

fn import_directive(pair: Pair<Rule>, file: &str) -> Result<Import> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let path_pair = inner.next().expect("import path");
    let path = string_literal_value(path_pair);
    let clause_pair = inner.next().expect("import clause");
    let clause = import_clause(clause_pair, file)?;
    Ok(Import { path, clause, position })
}

fn import_clause(pair: Pair<Rule>, file: &str) -> Result<ImportClause> {
    let pair = only_inner(pair);
    match pair.as_rule() {
        Rule::ident => Ok(ImportClause::Whole(pair.as_str().to_owned())),
        Rule::importNamed => {
            let mut items = vec![];
            for item in pair.into_inner() {
                let position = span(&item, file);
                let mut parts = item.into_inner();
                let imported_name = parts.next().expect("import item name").as_str().to_owned();
                let local_alias = parts
                    .next()
                    .map(|p| p.as_str().to_owned())
                    .unwrap_or_else(|| imported_name.clone());
                items.push(ImportItem {
                    imported_name,
                    local_alias,
                    position,
                });
            }
            Ok(ImportClause::Named(items))
        }
        rule => Err(err(&pair, file, format!("unexpected import clause {rule:?}"))),
    }
}

fn export_statement(pair: Pair<Rule>, file: &str) -> Result<Export<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let first = inner.next().expect("export payload");
    match first.as_rule() {
        // `export default expr`; `default` is a grammar keyword, not a pair.
        Rule::expression => Ok(Export::Default(Box::new(expression(first, file)?), position)),
        Rule::functionDeclaration => Ok(Export::Inline(Box::new(TopLevelStatement::Function(
            function_declaration(first, file)?,
        )))),
        Rule::typeDeclaration => Ok(Export::Inline(Box::new(TopLevelStatement::TypeDeclaration(
            type_declaration(first, file)?,
        )))),
        Rule::constantDeclaration => Ok(Export::Inline(Box::new(TopLevelStatement::Constant(
            constant_declaration(first, file)?,
        )))),
        Rule::ident => Ok(Export::Forward {
            name: first.as_str().to_owned(),
            position,
        }),
        rule => Err(err(&first, file, format!("unexpected export payload {rule:?}"))),
    }
}

fn namespace_declaration(pair: Pair<Rule>, file: &str) -> Result<Namespace<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("namespace name").as_str().to_owned();
    let mut members = vec![];
    for member in inner {
        members.push(top_level_statement(member, file)?);
    }
    Ok(Namespace {
        name,
        members,
        position,
    })
}

fn type_declaration(pair: Pair<Rule>, file: &str) -> Result<TypeDeclaration> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("type name").as_str().to_owned();
    let mut next = inner.next().expect("type value or type params");
    let type_parameters = if next.as_rule() == Rule::typeParamList {
        let params = type_param_list(next, file)?;
        next = inner.next().expect("type value");
        params
    } else {
        vec![]
    };
    let value = type_expr(next, file)?;
    Ok(TypeDeclaration {
        name,
        type_parameters,
        value,
        position,
    })
}

fn constant_declaration(pair: Pair<Rule>, file: &str) -> Result<Constant<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("const name").as_str().to_owned();
    let mut next = inner.next().expect("const type or value");
    let type_annotation = if next.as_rule() == Rule::typeExpr {
        let t = type_expr(next, file)?;
        next = inner.next().expect("const value");
        Some(t)
    } else {
        None
    };
    let value = expression(next, file)?;
    Ok(Constant {
        name,
        type_annotation,
        value,
        info: (),
        position,
    })
}

fn function_declaration(pair: Pair<Rule>, file: &str) -> Result<Function<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let return_type = type_expr(inner.next().expect("return type"), file)?;
    let name = inner.next().expect("function name").as_str().to_owned();
    let mut next = inner.next().expect("type params or param list");
    let type_parameters = if next.as_rule() == Rule::typeParamList {
        let params = type_param_list(next, file)?;
        next = inner.next().expect("param list");
        params
    } else {
        vec![]
    };
    let params = param_list(next, file)?;
    let body_pair = inner.next().expect("function body");
    let body = match body_pair.as_rule() {
        Rule::block => FunctionBody::Block(block(body_pair, file)?),
        _ => FunctionBody::Expression(Box::new(expression(body_pair, file)?)),
    };
    Ok(Function {
        name,
        type_parameters,
        params,
        return_type,
        body,
        info: (),
        position,
    })
}

fn type_param_list(pair: Pair<Rule>, file: &str) -> Result<Vec<TypeParameterName>> {
    pair.into_inner().map(|p| type_param(p, file)).collect()
}

fn type_param(pair: Pair<Rule>, file: &str) -> Result<TypeParameterName> {
    let position = span(&pair, file);
    let text = pair.as_str();
    let variance = if text.trim_start().starts_with('+') {
        Variance::Covariant
    } else if text.trim_start().starts_with('-') {
        Variance::Contravariant
    } else {
        Variance::Invariant
    };
    let mut inner = pair.into_inner();
    let name = inner.next().expect("type parameter name").as_str().to_owned();
    let constraint = inner.next().map(|p| type_expr(p, file)).transpose()?;
    Ok(TypeParameterName {
        name,
        variance,
        constraint,
        position,
    })
}

fn param_list(pair: Pair<Rule>, file: &str) -> Result<Vec<Parameter>> {
    pair.into_inner().map(|p| param(p, file)).collect()
}

fn param(pair: Pair<Rule>, file: &str) -> Result<Parameter> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let type_annotation = type_expr(inner.next().expect("param type"), file)?;
    let name = inner.next().expect("param name").as_str().to_owned();
    Ok(Parameter {
        name,
        type_annotation,
        position,
    })
}

// ---- types ---------------------------------------------------------------

fn type_expr(pair: Pair<Rule>, file: &str) -> Result<TypeName> {
    assert_eq!(pair.as_rule(), Rule::typeExpr);
    union_type(only_inner(pair), file)
}

fn union_type(pair: Pair<Rule>, file: &str) -> Result<TypeName> {
    let position = span(&pair, file);
    let mut members = vec![];
    for member in pair.into_inner() {
        members.push(array_type(member, file)?);
    }
    if members.len() == 1 {
        Ok(members.pop().unwrap())
    } else {
        Ok(TypeName::Union(members, position))
    }
}

fn array_type(pair: Pair<Rule>, file: &str) -> Result<TypeName> {
    // intersectionAtomType wraps arrayType; collapse the single alternative.
    let pair = if pair.as_rule() == Rule::intersectionAtomType {
        only_inner(pair)
    } else {
        pair
    };
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let base = specific_type(inner.next().expect("specific type"), file)?;
    let dims = inner.count();
    Ok((0..dims).fold(base, |acc, _| TypeName::Array(Box::new(acc), position.clone())))
}

fn specific_type(pair: Pair<Rule>, file: &str) -> Result<TypeName> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let base = base_type(inner.next().expect("base type"), file)?;
    match inner.next() {
        Some(args) => {
            let args = args
                .into_inner()
                .map(|a| type_expr(a, file))
                .collect::<Result<Vec<_>>>()?;
            Ok(TypeName::Specific(Box::new(base), args, position))
        }
        None => Ok(base),
    }
}

fn base_type(pair: Pair<Rule>, file: &str) -> Result<TypeName> {
    let pair = only_inner_if_wrapper(pair);
    let position = span(&pair, file);
    match pair.as_rule() {
        Rule::ident => Ok(TypeName::Literal(pair.as_str().to_owned(), position)),
        Rule::parenthesizedType => {
            let inner = type_expr(pair.into_inner().next().expect("parenthesized type"), file)?;
            Ok(TypeName::Parenthesized(Box::new(inner), position))
        }
        Rule::tupleType => {
            let elems = pair
                .into_inner()
                .map(|p| type_expr(p, file))
                .collect::<Result<Vec<_>>>()?;
            Ok(TypeName::Tuple(elems, position))
        }
        Rule::structType => {
            let mut fields = vec![];
            for field in pair.into_inner() {
                let mut f = field.into_inner();
                let ty = type_expr(f.next().expect("field type"), file)?;
                let name = f.next().expect("field name").as_str().to_owned();
                fields.push((name, ty));
            }
            Ok(TypeName::Struct(fields, position))
        }
        Rule::fnType => {
            let mut parts: Vec<Pair<Rule>> = pair.into_inner().collect();
            let return_type = Box::new(type_expr(parts.pop().expect("fn return type"), file)?);
            let params = parts
                .into_iter()
                .map(|p| type_expr(p, file))
                .collect::<Result<Vec<_>>>()?;
            Ok(TypeName::Fn {
                params,
                return_type,
                position,
            })
        }
        Rule::namespaceAccessType => {
            let parts = pair.into_inner().map(|p| p.as_str().to_owned()).collect();
            Ok(TypeName::NamespaceAccess(parts, position))
        }
        rule => Err(err(&pair, file, format!("unexpected type {rule:?}"))),
    }
}

fn only_inner_if_wrapper(pair: Pair<Rule>) -> Pair<Rule> {
    if pair.as_rule() == Rule::baseType {
        only_inner(pair)
    } else {
        pair
    }
}

// ---- statements ------------------------------------------------------------

fn statement(pair: Pair<Rule>, file: &str) -> Result<Statement<()>> {
    let pair = if pair.as_rule() == Rule::statement {
        only_inner(pair)
    } else {
        pair
    };
    match pair.as_rule() {
        Rule::forStmt => Ok(Statement::For(for_stmt(pair, file)?)),
        Rule::whileStmt => Ok(Statement::While(while_stmt(pair, file)?)),
        Rule::doWhileStmt => Ok(Statement::DoWhile(do_while_stmt(pair, file)?)),
        Rule::tryStmt => Ok(Statement::TryCatchFinally(try_stmt(pair, file)?)),
        Rule::throwStmt => Ok(Statement::Throw(throw_stmt(pair, file)?)),
        Rule::returnStmt => Ok(Statement::Return(return_stmt(pair, file)?)),
        Rule::breakStmt => Ok(Statement::Break(loop_control(pair, file)?)),
        Rule::continueStmt => Ok(Statement::Continue(loop_control(pair, file)?)),
        Rule::block => Ok(Statement::Block(block(pair, file)?)),
        Rule::expressionStatement => {
            let inner = pair.into_inner().next().expect("expression statement body");
            Ok(Statement::Expression(expression(inner, file)?))
        }
        rule => Err(err(&pair, file, format!("unexpected statement {rule:?}"))),
    }
}

fn block(pair: Pair<Rule>, file: &str) -> Result<Block<()>> {
    let position = span(&pair, file);
    let mut statements = vec![];
    for s in pair.into_inner() {
        statements.push(statement(s, file)?);
    }
    if statements.is_empty() {
        statements.push(Statement::Noop(position.clone()));
    }
    Ok(Block {
        statements,
        info: (),
        position,
    })
}

fn for_stmt(pair: Pair<Rule>, file: &str) -> Result<ForLoop<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let binding = inner.next().expect("for binding").as_str().to_owned();
    let iterable = expression(inner.next().expect("for iterable"), file)?;
    let body = block(inner.next().expect("for body"), file)?;
    Ok(ForLoop {
        binding,
        iterable,
        body,
        info: (),
        position,
    })
}

fn while_stmt(pair: Pair<Rule>, file: &str) -> Result<WhileLoop<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let condition = expression(inner.next().expect("while condition"), file)?;
    let body = block(inner.next().expect("while body"), file)?;
    Ok(WhileLoop {
        condition,
        body,
        info: (),
        position,
    })
}

fn do_while_stmt(pair: Pair<Rule>, file: &str) -> Result<DoWhileLoop<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let body = block(inner.next().expect("do body"), file)?;
    let condition = expression(inner.next().expect("do-while condition"), file)?;
    Ok(DoWhileLoop {
        body,
        condition,
        info: (),
        position,
    })
}

fn try_stmt(pair: Pair<Rule>, file: &str) -> Result<TryCatchFinally<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let try_block = block(inner.next().expect("try body"), file)?;
    let mut catches = vec![];
    let mut finally_block = None;
    for rest in inner {
        match rest.as_rule() {
            Rule::catchClause => catches.push(catch_clause(rest, file)?),
            Rule::finallyClause => {
                finally_block = Some(block(
                    rest.into_inner().next().expect("finally body"),
                    file,
                )?)
            }
            rule => return Err(err(&rest, file, format!("unexpected try clause {rule:?}"))),
        }
    }
    Ok(TryCatchFinally {
        try_block,
        catches,
        finally_block,
        info: (),
        position,
    })
}

fn catch_clause(pair: Pair<Rule>, file: &str) -> Result<CatchClause<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let exception_type = type_expr(inner.next().expect("catch type"), file)?;
    let binding = inner.next().expect("catch binding").as_str().to_owned();
    let body = block(inner.next().expect("catch body"), file)?;
    Ok(CatchClause {
        exception_type,
        binding,
        body,
        position,
    })
}

fn throw_stmt(pair: Pair<Rule>, file: &str) -> Result<Throw<()>> {
    let position = span(&pair, file);
    let value = expression(pair.into_inner().next().expect("throw value"), file)?;
    Ok(Throw { value, position })
}

fn return_stmt(pair: Pair<Rule>, file: &str) -> Result<Return<()>> {
    let position = span(&pair, file);
    let value = pair
        .into_inner()
        .next()
        .map(|p| expression(p, file))
        .transpose()?;
    Ok(Return { value, position })
}

fn loop_control(pair: Pair<Rule>, file: &str) -> Result<LoopControl> {
    let position = span(&pair, file);
    let depth = pair
        .into_inner()
        .next()
        .map(|p| p.as_str().parse::<u32>().unwrap_or(0))
        .unwrap_or(0);
    Ok(LoopControl { depth, position })
}

// ---- expressions -----------------------------------------------------------

fn expression(pair: Pair<Rule>, file: &str) -> Result<Expression<()>> {
    let mut pair = pair;
    while matches!(pair.as_rule(), Rule::expression | Rule::assignmentExpr) {
        pair = only_inner(pair);
    }
    match pair.as_rule() {
        Rule::letExpr => let_expr(pair, file),
        Rule::lambdaExpr => lambda_expr(pair, file),
        Rule::ifExpr => if_expr(pair, file),
        Rule::binaryChain => binary_chain(pair, file),
        rule => Err(err(&pair, file, format!("unexpected expression {rule:?}"))),
    }
}

fn let_expr(pair: Pair<Rule>, file: &str) -> Result<Expression<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("let binding name").as_str().to_owned();
    let mut next = inner.next().expect("let type or value");
    let type_annotation = if next.as_rule() == Rule::typeExpr {
        let t = type_expr(next, file)?;
        next = inner.next().expect("let value");
        Some(t)
    } else {
        None
    };
    let value = expression(next, file)?;
    Ok(Expression::VariableDeclaration(Box::new(VariableDeclaration {
        name,
        type_annotation,
        value,
        info: (),
        position,
    })))
}

fn if_expr(pair: Pair<Rule>, file: &str) -> Result<Expression<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let condition = expression(inner.next().expect("if condition"), file)?;
    let then_branch = expression(inner.next().expect("if branch"), file)?;
    let else_branch = inner.next().map(|p| expression(p, file)).transpose()?;
    Ok(Expression::If(Box::new(IfExpression {
        condition,
        then_branch,
        else_branch,
        info: (),
        position,
    })))
}

fn lambda_expr(pair: Pair<Rule>, file: &str) -> Result<Expression<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let params = lambda_param_list(inner.next().expect("lambda params"), file)?;
    let body_pair = inner.next().expect("lambda body");
    let body = match body_pair.as_rule() {
        Rule::block => LambdaBody::Block(block(body_pair, file)?),
        _ => LambdaBody::Expression(Box::new(expression(body_pair, file)?)),
    };
    Ok(Expression::Lambda(Lambda {
        params,
        return_type: None,
        body,
        info: (),
        position,
    }))
}

fn lambda_param_list(pair: Pair<Rule>, file: &str) -> Result<Vec<LambdaParameter<()>>> {
    // `lambdaParamList = { ident | ("(" ~ (lambdaParam ~ ("," ~ lambdaParam)*)? ~ ")") }`:
    // the parenthesized form is anonymous, so its children (zero or more
    // `lambdaParam`s) surface directly as this pair's inner pairs.
    let children: Vec<Pair<Rule>> = pair.into_inner().collect();
    if children.len() == 1 && children[0].as_rule() == Rule::ident {
        let ident = &children[0];
        let position = span(ident, file);
        return Ok(vec![LambdaParameter {
            name: ident.as_str().to_owned(),
            type_annotation: None,
            info: (),
            position,
        }]);
    }
    children.into_iter().map(|p| lambda_param(p, file)).collect()
}

fn lambda_param(pair: Pair<Rule>, file: &str) -> Result<LambdaParameter<()>> {
    let position = span(&pair, file);
    let mut inner = pair.into_inner();
    let name = inner.next().expect("lambda param name").as_str().to_owned();
    let type_annotation = inner.next().map(|p| type_expr(p, file)).transpose()?;
    Ok(LambdaParameter {
        name,
        type_annotation,
        info: (),
        position,
    })
}

fn binary_chain(pair: Pair<Rule>, file: &str) -> Result<Expression<()>> {
    let mut items = pair.into_inner();
    let first = unary_expr(items.next().expect("binary chain operand"), file)?;

    // Shunting-yard: fold `first (op operand)*` left-to-right honoring
    // precedence and associativity; `None`-associative operators may not
    // appear twice at the same precedence level (spec.md §4.2).
    let mut operand_stack: Vec<Expression<()>> = vec![first];
    let mut operator_stack: Vec<(BinaryOperator, Span)> = vec![];

    fn combine(
        operand_stack: &mut Vec<Expression<()>>,
        operator_stack: &mut Vec<(BinaryOperator, Span)>,
    ) {
        let (op, position) = operator_stack.pop().expect("operator to combine");
        let rhs = operand_stack.pop().expect("rhs operand");
        let lhs = operand_stack.pop().expect("lhs operand");
        let info = ();
        operand_stack.push(Expression::Binary(Box::new(BinaryExpression {
            operator: op,
            lhs,
            rhs,
            info,
            position,
        })));
    }

    while let Some(op_pair) = items.next() {
        let op_position = span(&op_pair, file);
        let op = binary_operator(op_pair.as_str(), &op_pair, file)?;
        let rhs = unary_expr(items.next().expect("rhs operand"), file)?;

        loop {
            let Some((top_op, _)) = operator_stack.last().copied() else {
                break;
            };
            let top_prec = precedence(top_op);
            let next_prec = precedence(op);
            if top_prec > next_prec {
                combine(&mut operand_stack, &mut operator_stack);
                continue;
            }
            if top_prec == next_prec {
                match associativity(op) {
                    Associativity::Left => {
                        combine(&mut operand_stack, &mut operator_stack);
                        continue;
                    }
                    Associativity::None => {
                        return Err(ReduceError {
                            message: format!(
                                "operator '{op:?}' is not associative and cannot be chained"
                            ),
                            position: op_position,
                        });
                    }
                    Associativity::Right => break,
                }
            }
            break;
        }

        operator_stack.push((op, op_position));
        operand_stack.push(rhs);
    }

    while !operator_stack.is_empty() {
        combine(&mut operand_stack, &mut operator_stack);
    }

    Ok(operand_stack.pop().expect("final reduced expression"))
}

fn binary_operator(text: &str, pair: &Pair<Rule>, file: &str) -> Result<BinaryOperator> {
    Ok(match text {
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Sub,
        "*" => BinaryOperator::Mul,
        "/" => BinaryOperator::Div,
        "%" => BinaryOperator::Mod,
        "==" => BinaryOperator::Eq,
        "!=" => BinaryOperator::Neq,
        "<" => BinaryOperator::Lt,
        "<=" => BinaryOperator::Lte,
        ">" => BinaryOperator::Gt,
        ">=" => BinaryOperator::Gte,
        "&&" => BinaryOperator::And,
        "||" => BinaryOperator::Or,
        other => return Err(err(pair, file, format!("unknown binary operator '{other}'"))),
    })
}

fn unary_expr(pair: Pair<Rule>, file: &str) -> Result<Expression<()>> {
    let position = span(&pair, file);
    let mut prefix_ops = vec![];
    let mut postfix_pair = None;
    for child in pair.into_inner() {
        match child.as_rule() {
            Rule::prefixOp => prefix_ops.push(child),
            Rule::postfixExpr => postfix_pair = Some(child),
            _ => {}
        }
    }
    let mut expr = postfix_expr(postfix_pair.expect("unary operand"), file)?;
    for op_pair in prefix_ops.into_iter().rev() {
        let operator = match op_pair.as_str() {
            "-" => UnaryOperator::Neg,
            "!" => UnaryOperator::Not,
            other => return Err(err(&op_pair, file, format!("unknown prefix operator '{other}'"))),
        };
        expr = Expression::Unary(Box::new(UnaryExpression {
            operator,
            operand: expr,
            info: (),
            position: position.clone(),
        }));
    }
    Ok(expr)
}

fn postfix_expr(pair: Pair<Rule>, file: &str) -> Result<Expression<()>> {
    let mut inner = pair.into_inner();
    let mut expr = primary_expr(inner.next().expect("postfix operand"), file)?;
    for op in inner {
        let position = span(&op, file);
        let op = only_inner(op);
        expr = match op.as_rule() {
            Rule::callSuffix => {
                let args = op
                    .into_inner()
                    .map(|a| expression(a, file))
                    .collect::<Result<Vec<_>>>()?;
                Expression::Application(Box::new(Application {
                    callee: expr,
                    type_args: vec![],
                    args,
                    info: (),
                    position,
                }))
            }
            Rule::indexSuffix => {
                let index = expression(op.into_inner().next().expect("index expr"), file)?;
                Expression::ArrayAccess(Box::new(ArrayAccess {
                    base: expr,
                    index,
                    info: (),
                    position,
                }))
            }
            Rule::fieldSuffix => {
                let field = op.into_inner().next().expect("field name").as_str().to_owned();
                Expression::FieldAccess(Box::new(FieldAccess {
                    base: expr,
                    field,
                    info: (),
                    position,
                }))
            }
            rule => return Err(err(&op, file, format!("unexpected postfix op {rule:?}"))),
        };
    }
    Ok(expr)
}

fn primary_expr(pair: Pair<Rule>, file: &str) -> Result<Expression<()>> {
    let pair = if pair.as_rule() == Rule::primaryExpr {
        only_inner(pair)
    } else {
        pair
    };
    let position = span(&pair, file);
    match pair.as_rule() {
        Rule::parenthesizedExpr => {
            let inner = expression(pair.into_inner().next().expect("parenthesized expr"), file)?;
            Ok(Expression::Parenthesized(Box::new(inner), position))
        }
        Rule::arrayLiteral => {
            let elements = pair
                .into_inner()
                .map(|e| expression(e, file))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expression::Array(ArrayLiteral {
                elements,
                info: (),
                position,
            }))
        }
        Rule::tupleLiteral => {
            let elements = pair
                .into_inner()
                .map(|e| expression(e, file))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expression::Tuple(TupleLiteral {
                elements,
                info: (),
                position,
            }))
        }
        Rule::structLiteral => {
            let mut fields = vec![];
            for field in pair.into_inner() {
                let field_position = span(&field, file);
                let mut f = field.into_inner();
                let name = f.next().expect("struct field name").as_str().to_owned();
                let value = expression(f.next().expect("struct field value"), file)?;
                fields.push(StructFieldInit {
                    name,
                    value,
                    position: field_position,
                });
            }
            Ok(Expression::Struct(StructLiteral {
                name: None,
                fields,
                info: (),
                position,
            }))
        }
        Rule::float => {
            let value: f64 = pair.as_str().parse().expect("lexed float literal");
            Ok(Expression::float_literal(value, (), position))
        }
        Rule::integer => {
            let value: i64 = pair.as_str().parse().expect("lexed integer literal");
            Ok(Expression::Integer(value, (), position))
        }
        Rule::charLit => {
            let text = pair.as_str();
            let inner = &text[1..text.len() - 1];
            let unescaped = unescape::unescape(inner).unwrap_or_else(|| inner.to_owned());
            let c = unescaped.chars().next().unwrap_or('\0');
            Ok(Expression::Char(c, (), position))
        }
        Rule::string => Ok(Expression::Str(string_literal_value(pair), (), position)),
        Rule::boolLit => Ok(Expression::Bool(pair.as_str() == "true", (), position)),
        Rule::ident => Ok(Expression::Id(Id {
            name: pair.as_str().to_owned(),
            info: (),
            position,
        })),
        rule => Err(err(&pair, file, format!("unexpected primary expr {rule:?}"))),
    }
}

fn string_literal_value(pair: Pair<Rule>) -> String {
    let text = pair.as_str();
    let inner = &text[1..text.len() - 1];
    unescape::unescape(inner).unwrap_or_else(|| inner.to_owned())
}
