//! Spot-checks of the universal invariants (spec.md §8), independent of
//! any particular source program. These exercise `typesys` directly rather
//! than `compile_and_run_str`, mirroring the teacher's unit-test style of
//! asserting properties of the type system in isolation
//! (`crates/why_lib/src/typechecker/types.rs`'s own `#[cfg(test)]` module)
//! rather than only through whole-program runs.

use ren::typesys::{is_assignable_from, most_general, IntWidth, Type};

fn int(width: IntWidth, signed: bool) -> Type {
    Type::Integer { width, signed }
}

#[test]
fn assignability_is_reflexive() {
    for t in [
        Type::Bool,
        Type::Char,
        int(IntWidth::W32, true),
        int(IntWidth::Unbounded, true),
        Type::Array(Box::new(Type::Char)),
        Type::Tuple(vec![Type::Bool, Type::Char]),
        Type::Struct(vec![("x".to_string(), Type::Bool)]),
    ] {
        assert!(is_assignable_from(&t, &t), "{t:?} should be assignable from itself");
    }
}

#[test]
fn any_is_top_and_never_is_bottom() {
    let candidates = [
        Type::Bool,
        Type::Char,
        int(IntWidth::W64, false),
        Type::Array(Box::new(Type::Bool)),
        Type::Struct(vec![]),
    ];
    for t in &candidates {
        assert!(is_assignable_from(&Type::Any, t), "any should accept {t:?}");
        assert!(is_assignable_from(t, &Type::Never), "{t:?} should accept never");
    }
}

#[test]
fn unknown_propagates_through_comparisons() {
    assert!(is_assignable_from(&Type::Unknown, &Type::Bool));
    assert!(is_assignable_from(&Type::Bool, &Type::Unknown));
    assert!(is_assignable_from(&Type::Unknown, &Type::Unknown));
}

#[test]
fn integer_lattice_matches_spec_rule() {
    use IntWidth::*;

    // Widening always succeeds, signed or not, as long as sign matches or
    // the narrower side is unsigned widening into a wider signed slot.
    assert!(is_assignable_from(&int(W32, true), &int(W16, true)));
    assert!(is_assignable_from(&int(W32, true), &int(W16, false)));
    assert!(is_assignable_from(&int(W32, false), &int(W16, false)));

    // Same width: signed<-signed and unsigned<-unsigned both fine; the
    // unsigned<-signed and signed<-unsigned-same-size directions are not.
    assert!(is_assignable_from(&int(W32, true), &int(W32, true)));
    assert!(is_assignable_from(&int(W32, false), &int(W32, false)));
    assert!(!is_assignable_from(&int(W32, false), &int(W32, true)));
    assert!(!is_assignable_from(&int(W32, true), &int(W32, false)));

    // Narrowing never succeeds, regardless of sign.
    assert!(!is_assignable_from(&int(W16, true), &int(W32, true)));
    assert!(!is_assignable_from(&int(W16, false), &int(W32, false)));

    // Unbounded is the top of the integer lattice.
    assert!(is_assignable_from(&int(Unbounded, true), &int(W64, true)));
    assert!(!is_assignable_from(&int(W64, true), &int(Unbounded, true)));
}

#[test]
fn function_assignability_is_contravariant_in_params_covariant_in_return() {
    let narrow_int = int(IntWidth::W16, true);
    let wide_int = int(IntWidth::W32, true);

    // G accepts a wider parameter than F requires, and returns a narrower
    // type than F promises: F <- G should hold (contravariant params,
    // covariant return).
    let f = Type::Function { params: vec![narrow_int.clone()], return_type: Box::new(wide_int.clone()), type_params: vec![] };
    let g = Type::Function { params: vec![wide_int.clone()], return_type: Box::new(narrow_int.clone()), type_params: vec![] };
    assert!(is_assignable_from(&f, &g));

    // The reverse does not hold: F's narrower param can't stand in for G's
    // wider one.
    assert!(!is_assignable_from(&g, &f));
}

#[test]
fn function_assignability_allows_fewer_params_on_the_from_side() {
    let f = Type::Function {
        params: vec![Type::Bool, Type::Char],
        return_type: Box::new(Type::Bool),
        type_params: vec![],
    };
    let g = Type::Function { params: vec![Type::Bool], return_type: Box::new(Type::Bool), type_params: vec![] };
    assert!(is_assignable_from(&f, &g), "g, taking fewer params, should satisfy f's call sites");
    assert!(!is_assignable_from(&g, &f), "f requires an extra param g does not provide");
}

#[test]
fn struct_assignability_is_width_subtyping() {
    let narrow = Type::Struct(vec![("x".to_string(), Type::Bool)]);
    let wide = Type::Struct(vec![("x".to_string(), Type::Bool), ("y".to_string(), Type::Char)]);
    assert!(is_assignable_from(&narrow, &wide), "extra fields on the source side are allowed");
    assert!(!is_assignable_from(&wide, &narrow), "missing fields on the source side are not");
}

#[test]
fn most_general_picks_the_wider_assignable_side_or_any() {
    let narrow = int(IntWidth::W16, true);
    let wide = int(IntWidth::W32, true);
    assert!(matches!(most_general(&narrow, &wide), Type::Integer { width: IntWidth::W32, signed: true }));
    assert!(matches!(most_general(&wide, &narrow), Type::Integer { width: IntWidth::W32, signed: true }));

    // Two unrelated types fall back to `any`.
    let unrelated = most_general(&Type::Bool, &Type::Char);
    assert!(matches!(unrelated, Type::Any));
}

#[test]
fn void_is_the_empty_tuple() {
    assert!(Type::void().is_void());
    assert!(!Type::Tuple(vec![Type::Bool]).is_void());
}
