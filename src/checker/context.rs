//! Local (function-body) type-checking context: the symbol table stack and
//! the loop-depth counter.
//!
//! spec.md §9 Design Notes explicitly calls for turning the source's
//! `@@loopNumber` special symbol into "an explicit integer field on the
//! type-check context" — `Context::loop_depth` is exactly that field.

use std::collections::HashMap;

use crate::typesys::Type;

#[derive(Default)]
pub struct Context {
    scopes: Vec<HashMap<String, Type>>,
    pub loop_depth: u32,
    /// The enclosing function's declared return type, checked against every
    /// `return` statement's expression (spec.md §4.3 "the actual return type
    /// must be assignable to the declared return type").
    pub return_type: Option<Type>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            loop_depth: 0,
            return_type: None,
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "popped the root scope");
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: Type) {
        self.scopes
            .last_mut()
            .expect("at least the root scope")
            .insert(name.into(), ty);
    }

    /// Looks up the innermost symbol table first (spec.md §4.3 "Identifiers
    /// look up the innermost symbol table...").
    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    pub fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    pub fn exit_loop(&mut self) {
        self.loop_depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut ctx = Context::new();
        ctx.declare("x", Type::Bool);
        ctx.push_scope();
        ctx.declare("x", Type::Char);
        assert_eq!(ctx.lookup("x"), Some(Type::Char));
        ctx.pop_scope();
        assert_eq!(ctx.lookup("x"), Some(Type::Bool));
    }

    #[test]
    fn loop_depth_tracks_nesting() {
        let mut ctx = Context::new();
        assert_eq!(ctx.loop_depth, 0);
        ctx.enter_loop();
        ctx.enter_loop();
        assert_eq!(ctx.loop_depth, 2);
        ctx.exit_loop();
        assert_eq!(ctx.loop_depth, 1);
    }
}
