//! `TypeName` -> `Type` resolution (spec.md §4.3 "resolve every type name"),
//! memoized per declaration slot with cycle detection via `DeclSlot.resolving`.

use std::path::Path;

use crate::{
    lexer::Span,
    parser::ast::{TypeName, TypeParameterName, Variance as AstVariance},
    typesys::{FloatWidth, IntWidth, Type, TypeCell, Variance},
};

use super::{
    error::{CircularType, TypeCheckError, UndefinedType},
    Checker,
};

/// spec.md §6 "Primitive types" table.
fn primitive_type(name: &str) -> Option<Type> {
    Some(match name {
        "u8" | "byte" => Type::Integer { width: IntWidth::W8, signed: false },
        "i8" => Type::Integer { width: IntWidth::W8, signed: true },
        "u16" | "short" => Type::Integer { width: IntWidth::W16, signed: false },
        "i16" => Type::Integer { width: IntWidth::W16, signed: true },
        "u32" => Type::Integer { width: IntWidth::W32, signed: false },
        "i32" | "integer" => Type::Integer { width: IntWidth::W32, signed: true },
        "u64" => Type::Integer { width: IntWidth::W64, signed: false },
        "i64" | "long" => Type::Integer { width: IntWidth::W64, signed: true },
        "int" => Type::Integer { width: IntWidth::Unbounded, signed: true },
        "f32" | "float" => Type::Float(FloatWidth::W32),
        "f64" | "double" => Type::Float(FloatWidth::W64),
        "char" => Type::Char,
        "string" => Type::Array(Box::new(Type::Char)),
        "bool" => Type::Bool,
        "void" => Type::void(),
        "any" => Type::Any,
        "never" => Type::Never,
        "unknown" => Type::Unknown,
        _ => return None,
    })
}

fn convert_variance(v: AstVariance) -> Variance {
    match v {
        AstVariance::Covariant => Variance::Covariant,
        AstVariance::Contravariant => Variance::Contravariant,
        AstVariance::Invariant => Variance::Invariant,
    }
}

impl Checker {
    pub fn resolve_type_name(
        &mut self,
        path: &Path,
        name: &TypeName,
        type_params: &[TypeParameterName],
    ) -> Type {
        match name {
            TypeName::Literal(id, span) => self.resolve_literal_type(path, id, span, type_params),
            TypeName::Fn { params, return_type, .. } => Type::Function {
                params: params
                    .iter()
                    .map(|p| self.resolve_type_name(path, p, type_params))
                    .collect(),
                return_type: Box::new(self.resolve_type_name(path, return_type, type_params)),
                type_params: vec![],
            },
            TypeName::Tuple(items, _) => Type::Tuple(
                items
                    .iter()
                    .map(|i| self.resolve_type_name(path, i, type_params))
                    .collect(),
            ),
            TypeName::Struct(fields, _) => Type::Struct(
                fields
                    .iter()
                    .map(|(n, t)| (n.clone(), self.resolve_type_name(path, t, type_params)))
                    .collect(),
            ),
            TypeName::Array(inner, _) => {
                Type::Array(Box::new(self.resolve_type_name(path, inner, type_params)))
            }
            TypeName::Union(items, _) => Type::Union(
                items
                    .iter()
                    .map(|i| self.resolve_type_name(path, i, type_params))
                    .collect(),
            ),
            TypeName::Specific(base, args, _) => self.resolve_specific_type(path, base, args, type_params),
            TypeName::Parenthesized(inner, _) => self.resolve_type_name(path, inner, type_params),
            TypeName::NamespaceAccess(segments, span) => {
                self.resolve_namespace_access_type(path, segments, span.clone())
            }
        }
    }

    fn resolve_literal_type(
        &mut self,
        path: &Path,
        id: &str,
        span: &Span,
        type_params: &[TypeParameterName],
    ) -> Type {
        if let Some(t) = primitive_type(id) {
            return t;
        }
        if let Some(tp) = type_params.iter().find(|p| p.name == id) {
            return Type::TypeParameter {
                name: tp.name.clone(),
                variance: convert_variance(tp.variance),
                constraint: tp
                    .constraint
                    .clone()
                    .map(|c| Box::new(self.resolve_type_name(path, &c, type_params))),
            };
        }
        let has_local = self
            .modules
            .get(path)
            .map(|m| m.types.contains_key(id))
            .unwrap_or(false);
        if has_local {
            return self.resolve_local_type(path, id);
        }
        let import = self
            .modules
            .get(path)
            .and_then(|m| m.imports.get(id))
            .cloned();
        if let Some(binding) = import {
            return self.resolve_imported_type(&binding.module_path, &binding.exported_name);
        }
        self.errors.push(TypeCheckError::UndefinedType(
            UndefinedType {
                type_name: TypeName::Literal(id.to_owned(), span.clone()),
            },
            span.clone(),
        ));
        Type::Unknown
    }

    /// Resolves a named local type declaration, memoizing the result in its
    /// `DeclSlot` and detouring through a `Recursive` placeholder while the
    /// declaration's own body is still being resolved (spec.md §4.1
    /// "recursive (back-reference to an in-progress named type)").
    pub(super) fn resolve_local_type(&mut self, path: &Path, name: &str) -> Type {
        {
            let module = self.modules.get(path).expect("module registered");
            if let Some(slot) = module.type_slots.get(name) {
                if let Some(resolved) = &slot.resolved {
                    return resolved.clone();
                }
                if slot.resolving {
                    let position = module.types.get(name).expect("slot implies decl").position.clone();
                    self.errors.push(TypeCheckError::CircularType(
                        CircularType { name: name.to_owned() },
                        position,
                    ));
                    return Type::Recursive(TypeCell::empty());
                }
            }
        }

        let decl = {
            let module = self.modules.get_mut(path).expect("module registered");
            module.type_slots.get_mut(name).expect("slot registered").resolving = true;
            module.types.get(name).expect("decl registered").clone()
        };

        let cell = TypeCell::empty();
        self.modules
            .get_mut(path)
            .expect("module registered")
            .type_slots
            .get_mut(name)
            .expect("slot registered")
            .resolved = Some(Type::Recursive(cell.clone()));

        let resolved = self.resolve_type_name(path, &decl.value, &decl.type_parameters);
        cell.try_resolve(resolved.clone());

        let module = self.modules.get_mut(path).expect("module registered");
        let slot = module.type_slots.get_mut(name).expect("slot registered");
        slot.resolving = false;
        slot.resolved = Some(resolved.clone());
        resolved
    }

    pub(super) fn resolve_imported_type(&mut self, module_path: &Path, exported_name: &str) -> Type {
        if let Err(e) = self.register_module(module_path) {
            self.errors.push(e);
            return Type::Unknown;
        }
        let local_name = self
            .modules
            .get(module_path)
            .and_then(|m| m.exports.get(exported_name))
            .map(|e| e.local_name.clone());
        match local_name {
            Some(local) => self.resolve_local_type(module_path, &local),
            None => Type::Unknown,
        }
    }

    /// `Base<Args...>`. When `Base` names a local or imported `type`
    /// declaration, substitutes eagerly using that declaration's own
    /// parameter list; otherwise keeps a lazy `Type::Generic` so the base
    /// can still be printed in diagnostics.
    fn resolve_specific_type(
        &mut self,
        path: &Path,
        base: &TypeName,
        args: &[TypeName],
        type_params: &[TypeParameterName],
    ) -> Type {
        let arg_types: Vec<Type> = args
            .iter()
            .map(|a| self.resolve_type_name(path, a, type_params))
            .collect();

        let declared_names = self.declared_type_param_names(path, base);
        let base_ty = self.resolve_type_name(path, base, type_params);

        match declared_names {
            Some(names) => crate::typesys::substitute(&base_ty, &names, &arg_types),
            None => Type::Generic {
                base: Box::new(base_ty),
                args: arg_types,
            },
        }
    }

    /// If `name` refers (directly, or via one import hop) to a local `type`
    /// declaration, returns that declaration's parameter names in order.
    fn declared_type_param_names(&mut self, path: &Path, name: &TypeName) -> Option<Vec<String>> {
        match name {
            TypeName::Literal(id, _) => {
                if let Some(decl) = self.modules.get(path).and_then(|m| m.types.get(id)) {
                    return Some(decl.type_parameters.iter().map(|p| p.name.clone()).collect());
                }
                let binding = self.modules.get(path).and_then(|m| m.imports.get(id)).cloned()?;
                self.register_module(&binding.module_path).ok()?;
                let local = self
                    .modules
                    .get(&binding.module_path)?
                    .exports
                    .get(&binding.exported_name)?
                    .local_name
                    .clone();
                self.modules
                    .get(&binding.module_path)?
                    .types
                    .get(&local)
                    .map(|decl| decl.type_parameters.iter().map(|p| p.name.clone()).collect())
            }
            _ => None,
        }
    }

    fn resolve_namespace_access_type(&mut self, path: &Path, segments: &[String], span: Span) -> Type {
        if segments.len() == 2 {
            if let Some(binding) = self.modules.get(path).and_then(|m| m.imports.get(&segments[0])).cloned() {
                return self.resolve_imported_type(&binding.module_path, &segments[1]);
            }
        }
        self.errors.push(TypeCheckError::UndefinedType(
            UndefinedType {
                type_name: TypeName::NamespaceAccess(segments.to_vec(), span.clone()),
            },
            span,
        ));
        Type::Unknown
    }
}
