//! `is_assignable_from(to, from)` — spec.md §4.1.

use super::{IntWidth, Type};

/// `to ⊒ from`. Pure; the only recursion hazard is a cyclic `Recursive`
/// chain, guarded by `seen` (pairs of cell pointer identities already being
/// compared, matching spec.md §9's "remember in-progress pairs; treat
/// re-entry as assignable").
pub fn is_assignable_from(to: &Type, from: &Type) -> bool {
    let mut seen = Vec::new();
    go(to, from, &mut seen)
}

fn go(to: &Type, from: &Type, seen: &mut Vec<(usize, usize)>) -> bool {
    // `unknown` propagates: any comparison touching it succeeds so the
    // checker does not cascade further errors from the same subterm.
    if matches!(to, Type::Unknown) || matches!(from, Type::Unknown) {
        return true;
    }
    if matches!(from, Type::Never) {
        return true;
    }
    if matches!(to, Type::Any) {
        return true;
    }

    if let Type::Recursive(cell) = to {
        if let Type::Recursive(other) = from {
            let key = (cell.ptr_key(), other.ptr_key());
            if seen.contains(&key) {
                return true;
            }
            seen.push(key);
        }
        return match cell.get() {
            Some(resolved) => go(&resolved, from, seen),
            None => true,
        };
    }
    if let Type::Recursive(cell) = from {
        return match cell.get() {
            Some(resolved) => go(to, &resolved, seen),
            None => true,
        };
    }
    if let Type::Inferred(cell) = to {
        return match cell.get() {
            Some(resolved) => go(&resolved, from, seen),
            None => true,
        };
    }
    if let Type::Inferred(cell) = from {
        return match cell.get() {
            Some(resolved) => go(to, &resolved, seen),
            None => true,
        };
    }

    match (to, from) {
        (
            Type::Integer {
                width: tw,
                signed: ts,
            },
            Type::Integer {
                width: fw,
                signed: fs,
            },
        ) => int_assignable(*tw, *ts, *fw, *fs),
        (Type::Float(tw), Type::Float(fw)) => float_rank(*fw) <= float_rank(*tw),
        (Type::Char, Type::Char) | (Type::Bool, Type::Bool) => true,
        (Type::Tuple(to_elems), Type::Tuple(from_elems)) => {
            to_elems.len() == from_elems.len()
                && to_elems
                    .iter()
                    .zip(from_elems)
                    .all(|(t, f)| go(t, f, seen))
        }
        (Type::Array(to_elem), Type::Array(from_elem)) => go(to_elem, from_elem, seen),
        (Type::Struct(to_fields), Type::Struct(from_fields)) => to_fields.iter().all(|(name, ty)| {
            from_fields
                .iter()
                .find(|(n, _)| n == name)
                .is_some_and(|(_, from_ty)| go(ty, from_ty, seen))
        }),
        (
            Type::Function {
                params: to_params,
                return_type: to_ret,
                ..
            },
            Type::Function {
                params: from_params,
                return_type: from_ret,
                ..
            },
        ) => {
            from_params.len() <= to_params.len()
                && from_params
                    .iter()
                    .zip(to_params)
                    .all(|(from_p, to_p)| go(from_p, to_p, seen)) // contravariant
                && go(to_ret, from_ret, seen) // covariant
        }
        (Type::Union(to_members), _) => {
            let from_members = lift_to_union(from);
            from_members
                .iter()
                .all(|f| to_members.iter().any(|t| go(t, f, seen)))
        }
        (to, Type::Union(from_members)) => from_members.iter().all(|f| go(to, f, seen)),
        (Type::Generic { base: tb, args: ta }, Type::Generic { base: fb, args: fa }) => {
            go(tb, fb, seen) && ta.len() == fa.len() && ta.iter().zip(fa).all(|(t, f)| go(t, f, seen))
        }
        (Type::TypeParameter { name: a, .. }, Type::TypeParameter { name: b, .. }) => a == b,
        _ => to == from,
    }
}

fn lift_to_union(t: &Type) -> Vec<Type> {
    match t {
        Type::Union(members) => members.clone(),
        other => vec![other.clone()],
    }
}

fn int_assignable(to_width: IntWidth, to_signed: bool, from_width: IntWidth, from_signed: bool) -> bool {
    if from_signed && !to_signed {
        return false;
    }
    let (tr, fr) = (to_width.rank(), from_width.rank());
    if fr < tr {
        return true;
    }
    if fr == tr {
        // equal size: refuse unsigned -> signed, allow everything else
        // (including signed -> signed, unsigned -> unsigned, and the
        // already-handled signed -> unsigned rejection above).
        return !(!from_signed && to_signed);
    }
    false
}

fn float_rank(w: super::FloatWidth) -> u8 {
    match w {
        super::FloatWidth::W32 => 0,
        super::FloatWidth::W64 => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typesys::FloatWidth;

    fn int(width: IntWidth, signed: bool) -> Type {
        Type::Integer { width, signed }
    }

    #[test]
    fn reflexive_and_top_bottom() {
        let t = int(IntWidth::W32, true);
        assert!(is_assignable_from(&t, &t));
        assert!(is_assignable_from(&Type::Any, &t));
        assert!(is_assignable_from(&t, &Type::Never));
    }

    #[test]
    fn integer_widening() {
        assert!(is_assignable_from(
            &int(IntWidth::W64, true),
            &int(IntWidth::W32, true)
        ));
        assert!(!is_assignable_from(
            &int(IntWidth::W32, true),
            &int(IntWidth::W64, true)
        ));
    }

    #[test]
    fn unsigned_to_signed_same_size_rejected() {
        assert!(!is_assignable_from(
            &int(IntWidth::W32, true),
            &int(IntWidth::W32, false)
        ));
        assert!(is_assignable_from(
            &int(IntWidth::W32, false),
            &int(IntWidth::W32, false)
        ));
    }

    #[test]
    fn signed_to_unsigned_always_rejected() {
        assert!(!is_assignable_from(
            &int(IntWidth::W64, false),
            &int(IntWidth::W8, true)
        ));
    }

    #[test]
    fn float_widening() {
        assert!(is_assignable_from(
            &Type::Float(FloatWidth::W64),
            &Type::Float(FloatWidth::W32)
        ));
        assert!(!is_assignable_from(
            &Type::Float(FloatWidth::W32),
            &Type::Float(FloatWidth::W64)
        ));
    }

    #[test]
    fn struct_width_subtyping() {
        let to = Type::Struct(vec![("x".into(), Type::Bool)]);
        let from = Type::Struct(vec![("x".into(), Type::Bool), ("y".into(), Type::Char)]);
        assert!(is_assignable_from(&to, &from));
        assert!(!is_assignable_from(&from, &to));
    }

    #[test]
    fn function_contra_co_variance() {
        let wide_param = Type::Struct(vec![]);
        let narrow_param = Type::Struct(vec![("x".into(), Type::Bool)]);

        let to = Type::Function {
            params: vec![narrow_param.clone()],
            return_type: Box::new(narrow_param.clone()),
            type_params: vec![],
        };
        let from = Type::Function {
            params: vec![wide_param.clone()],
            return_type: Box::new(narrow_param.clone()),
            type_params: vec![],
        };
        // from's param (wide) must be assignable from to's param (narrow):
        // wide ⊒ narrow holds (struct width-subtyping), so this is OK.
        assert!(is_assignable_from(&to, &from));

        let bad_from = Type::Function {
            params: vec![narrow_param.clone()],
            return_type: Box::new(wide_param),
            type_params: vec![],
        };
        // return type covariance: to's return (narrow) must accept from's
        // return (wide) — wide is not assignable to narrow, so this fails.
        assert!(!is_assignable_from(&to, &bad_from));
    }

    #[test]
    fn function_extra_params_in_from_are_ignored() {
        let to = Type::Function {
            params: vec![Type::Bool],
            return_type: Box::new(Type::void()),
            type_params: vec![],
        };
        let from = Type::Function {
            params: vec![Type::Bool, Type::Char],
            return_type: Box::new(Type::void()),
            type_params: vec![],
        };
        assert!(is_assignable_from(&to, &from));
    }

    #[test]
    fn union_assignability() {
        let to = Type::Union(vec![Type::Bool, Type::Char]);
        assert!(is_assignable_from(&to, &Type::Bool));
        assert!(is_assignable_from(&to, &Type::Union(vec![Type::Char, Type::Bool])));
        assert!(!is_assignable_from(&to, &Type::Union(vec![Type::Char, int(IntWidth::W8, true)])));
    }
}
