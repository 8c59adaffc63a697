//! Generic utilities: `specify` (explicit instantiation) and
//! `infer_type_args` (implicit instantiation from argument types).
//! spec.md §4.1 / §4.3 "implicit-generic" call-site algorithm.

use super::{assignability::is_assignable_from, Type};

/// Substitutes every `TypeParameter` occurrence in `generic` by its
/// positional match in `type_args`. Parameters not present in the generic's
/// own `type_params` list are left untouched (defensive; the checker
/// validates arity before calling this).
pub fn specify(generic: &Type, type_args: &[Type]) -> Type {
    let Type::Function {
        params,
        return_type,
        type_params,
    } = generic
    else {
        return generic.clone();
    };

    let names: Vec<String> = type_params.iter().map(|p| p.name.clone()).collect();
    let bind = |t: &Type| -> Type { substitute(t, &names, type_args) };

    Type::Function {
        params: params.iter().map(bind).collect(),
        return_type: Box::new(bind(return_type)),
        type_params: vec![],
    }
}

/// Substitutes every `TypeParameter` named in `names` by its positional
/// match in `args`, recursively through the type's structure. Exposed for
/// the checker's generic *type* (not just function) instantiation, where
/// the parameter names come from a `type` declaration's own parameter list
/// rather than a `Type::Function`'s.
pub fn substitute(t: &Type, names: &[String], args: &[Type]) -> Type {
    match t {
        Type::TypeParameter { name, .. } => names
            .iter()
            .position(|n| n == name)
            .and_then(|i| args.get(i))
            .cloned()
            .unwrap_or_else(|| t.clone()),
        Type::Array(elem) => Type::Array(Box::new(substitute(elem, names, args))),
        Type::Tuple(elems) => Type::Tuple(elems.iter().map(|e| substitute(e, names, args)).collect()),
        Type::Struct(fields) => Type::Struct(
            fields
                .iter()
                .map(|(n, f)| (n.clone(), substitute(f, names, args)))
                .collect(),
        ),
        Type::Function {
            params,
            return_type,
            type_params,
        } => Type::Function {
            params: params.iter().map(|p| substitute(p, names, args)).collect(),
            return_type: Box::new(substitute(return_type, names, args)),
            type_params: type_params.clone(),
        },
        Type::Union(members) => {
            Type::Union(members.iter().map(|m| substitute(m, names, args)).collect())
        }
        Type::Generic { base, args: gargs } => Type::Generic {
            base: Box::new(substitute(base, names, args)),
            args: gargs.iter().map(|a| substitute(a, names, args)).collect(),
        },
        other => other.clone(),
    }
}

/// Implicit generic inference: walks `generic`'s parameter types alongside
/// the concrete `arg_types`, recording the first concrete type each type
/// parameter is matched against. A parameter never encountered resolves to
/// `Type::Unknown` (the checker then reports it rather than guessing).
pub fn infer_type_args(generic: &Type, arg_types: &[Type]) -> Vec<Type> {
    let Type::Function {
        params, type_params, ..
    } = generic
    else {
        return vec![];
    };

    let mut bindings: Vec<Option<Type>> = vec![None; type_params.len()];
    for (param, arg) in params.iter().zip(arg_types) {
        unify_into(param, arg, type_params, &mut bindings);
    }

    bindings
        .into_iter()
        .map(|b| b.unwrap_or(Type::Unknown))
        .collect()
}

fn unify_into(
    param: &Type,
    arg: &Type,
    type_params: &[super::TypeParameter],
    bindings: &mut [Option<Type>],
) {
    match param {
        Type::TypeParameter { name, .. } => {
            if let Some(i) = type_params.iter().position(|p| &p.name == name) {
                if bindings[i].is_none() {
                    bindings[i] = Some(arg.clone());
                } else if let Some(existing) = &bindings[i] {
                    // Subsequent occurrences must agree structurally with
                    // the first binding (checked via assignability in both
                    // directions as a cheap structural-equivalence test).
                    if !is_assignable_from(existing, arg) && !is_assignable_from(arg, existing) {
                        bindings[i] = Some(Type::Unknown);
                    }
                }
            }
        }
        Type::Array(p) => {
            if let Type::Array(a) = arg {
                unify_into(p, a, type_params, bindings);
            }
        }
        Type::Tuple(ps) => {
            if let Type::Tuple(ags) = arg {
                for (p, a) in ps.iter().zip(ags) {
                    unify_into(p, a, type_params, bindings);
                }
            }
        }
        Type::Function {
            params: pps,
            return_type: pr,
            ..
        } => {
            if let Type::Function {
                params: aps,
                return_type: ar,
                ..
            } = arg
            {
                for (p, a) in pps.iter().zip(aps) {
                    unify_into(p, a, type_params, bindings);
                }
                unify_into(pr, ar, type_params, bindings);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesys::{TypeParameter, Variance};

    fn identity_fn() -> Type {
        Type::Function {
            params: vec![Type::TypeParameter {
                name: "T".into(),
                variance: Variance::Invariant,
                constraint: None,
            }],
            return_type: Box::new(Type::TypeParameter {
                name: "T".into(),
                variance: Variance::Invariant,
                constraint: None,
            }),
            type_params: vec![TypeParameter {
                name: "T".into(),
                variance: Variance::Invariant,
                constraint: None,
            }],
        }
    }

    #[test]
    fn specify_substitutes_every_occurrence() {
        let specified = specify(&identity_fn(), &[Type::Bool]);
        let Type::Function {
            params,
            return_type,
            ..
        } = specified
        else {
            panic!("expected function type");
        };
        assert_eq!(params, vec![Type::Bool]);
        assert_eq!(*return_type, Type::Bool);
    }

    #[test]
    fn infer_binds_from_argument_type() {
        let bound = infer_type_args(&identity_fn(), &[Type::Char]);
        assert_eq!(bound, vec![Type::Char]);
    }

    #[test]
    fn infer_leaves_unseen_parameter_unknown() {
        let generic = Type::Function {
            params: vec![Type::Bool],
            return_type: Box::new(Type::TypeParameter {
                name: "U".into(),
                variance: Variance::Invariant,
                constraint: None,
            }),
            type_params: vec![TypeParameter {
                name: "U".into(),
                variance: Variance::Invariant,
                constraint: None,
            }],
        };
        let bound = infer_type_args(&generic, &[Type::Bool]);
        assert_eq!(bound, vec![Type::Unknown]);
    }
}
