use super::*;
use crate::ClassBuilder;
use crate::types::PrimitiveKind;

fn generic_box(env: &TypeEnvironment) -> (DefId, TypeParamId) {
    let t = env.defs.register_type_param(env.intern_string("T"));
    let def = ClassBuilder::class(env, "Box")
        .type_params(vec![t])
        .property("value", env.interner.type_param(t))
        .build();
    (def, t)
}

// =============================================================================
// Substitution
// =============================================================================

#[test]
fn test_empty_substitution_returns_same_handle() {
    let env = TypeEnvironment::new();
    let (def, t) = generic_box(&env);
    let declared = env.declared_type(def);
    let subst = TypeSubstitution::new();
    assert_eq!(instantiate_type(&env, declared, &subst), declared);

    let arr = env.interner.array(env.interner.type_param(t));
    assert_eq!(instantiate_type(&env, arr, &subst), arr);
}

#[test]
fn test_substitution_boxes_primitive_arguments() {
    let env = TypeEnvironment::new();
    let (_, t) = generic_box(&env);
    let mut subst = TypeSubstitution::new();
    subst.insert(&env, t, TypeId::INT);
    assert_eq!(subst.get(t), Some(env.boxed_type(PrimitiveKind::Int)));

    let lit = env.interner.literal_int(3);
    subst.insert(&env, t, lit);
    assert_eq!(subst.get(t), Some(env.boxed_type(PrimitiveKind::Int)));

    subst.insert(&env, t, TypeId::STRING);
    assert_eq!(subst.get(t), Some(TypeId::STRING));
}

#[test]
fn test_instantiate_rewrites_nested_occurrences() {
    let env = TypeEnvironment::new();
    let (_, t) = generic_box(&env);
    let t_ty = env.interner.type_param(t);
    let x = env.intern_string("x");
    let func = env.interner.function(FunctionShape::new(
        vec![ParamInfo::required(x, env.interner.array(t_ty))],
        env.interner.union([t_ty, TypeId::NULL]),
    ));
    let subst = TypeSubstitution::from_args(&env, &[t], &[TypeId::STRING]);
    let expected = env.interner.function(FunctionShape::new(
        vec![ParamInfo::required(x, env.interner.array(TypeId::STRING))],
        env.interner.union([TypeId::STRING, TypeId::NULL]),
    ));
    assert_eq!(instantiate_type(&env, func, &subst), expected);
}

#[test]
fn test_non_nullish_of_substituted_parameter() {
    let env = TypeEnvironment::new();
    let (_, t) = generic_box(&env);
    let wrapped = env.non_nullish(env.interner.type_param(t));
    let nullable_string = env.interner.union([TypeId::STRING, TypeId::NULL]);
    let subst = TypeSubstitution::from_args(&env, &[t], &[nullable_string]);
    assert_eq!(instantiate_type(&env, wrapped, &subst), TypeId::STRING);
}

#[test]
fn test_substitute_signature_keeps_unbound_parameters() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    let u = env.defs.register_type_param(env.intern_string("U"));
    let sig = Signature::new(
        env.intern_string("map"),
        vec![ParamInfo::required(
            env.intern_string("x"),
            env.interner.type_param(t),
        )],
        env.interner.type_param(u),
    )
    .with_type_params(vec![t, u]);

    let subst = TypeSubstitution::from_args(&env, &[t], &[TypeId::STRING]);
    let result = substitute_signature(&env, &sig, &subst);
    assert_eq!(result.type_params, vec![u]);
    assert_eq!(result.params[0].type_id, TypeId::STRING);
    assert_eq!(result.return_type, env.interner.type_param(u));

    let untouched = substitute_signature(&env, &sig, &TypeSubstitution::new());
    assert_eq!(untouched.type_params, vec![t, u]);
}

// =============================================================================
// Generic instantiation
// =============================================================================

#[test]
fn test_instantiation_is_cached() {
    let env = TypeEnvironment::new();
    let (def, _) = generic_box(&env);
    let int_box = env.boxed_type(PrimitiveKind::Int);
    let mut obligations = ConstraintObligations::new();

    let first = instantiate_generic(&env, def, &[int_box], Span::dummy(), &mut obligations);
    let second = instantiate_generic(&env, def, &[int_box], Span::dummy(), &mut obligations);
    assert_eq!(first, second);
    assert!(first.is_ok());
    assert_eq!(env.defs.instantiation_count(), 1);
    assert_eq!(obligations.pending_len(), 1);
}

#[test]
fn test_primitive_argument_shares_boxed_instantiation() {
    let env = TypeEnvironment::new();
    let (def, _) = generic_box(&env);
    let mut obligations = ConstraintObligations::new();

    let from_primitive =
        instantiate_generic(&env, def, &[TypeId::INT], Span::dummy(), &mut obligations);
    let from_boxed = instantiate_generic(
        &env,
        def,
        &[env.boxed_type(PrimitiveKind::Int)],
        Span::dummy(),
        &mut obligations,
    );
    assert_eq!(from_primitive, from_boxed);
    assert_eq!(
        from_primitive,
        Ok(env.interner.object(def, [env.boxed_type(PrimitiveKind::Int)]))
    );
}

#[test]
fn test_non_generic_declaration() {
    let env = TypeEnvironment::new();
    let plain = ClassBuilder::class(&env, "Plain").build();
    let mut obligations = ConstraintObligations::new();

    assert_eq!(
        instantiate_generic(&env, plain, &[], Span::dummy(), &mut obligations),
        Ok(env.declared_type(plain))
    );
    let err = instantiate_generic(&env, plain, &[TypeId::STRING], Span::dummy(), &mut obligations)
        .unwrap_err();
    assert_eq!(err, InstantiationError::NotGeneric { def: plain });
    assert_eq!(err.to_diagnostic(&env).code, codes::NOT_GENERIC);
}

#[test]
fn test_wrong_arity() {
    let env = TypeEnvironment::new();
    let (def, _) = generic_box(&env);
    let mut obligations = ConstraintObligations::new();

    let too_many = instantiate_generic(
        &env,
        def,
        &[TypeId::STRING, TypeId::STRING],
        Span::dummy(),
        &mut obligations,
    );
    assert_eq!(
        too_many,
        Err(InstantiationError::WrongArity {
            def,
            expected: 1,
            got: 2
        })
    );
    let too_few = instantiate_generic(&env, def, &[], Span::dummy(), &mut obligations);
    assert!(matches!(
        too_few,
        Err(InstantiationError::WrongArity { got: 0, .. })
    ));
    assert_eq!(obligations.pending_len(), 0);
}

#[test]
fn test_defaults_fill_missing_arguments() {
    let env = TypeEnvironment::new();
    let k = env.defs.register_type_param(env.intern_string("K"));
    let v = env.defs.register_type_param(env.intern_string("V"));
    // `V = K[]` refers to the earlier parameter.
    env.defs
        .set_type_param_default(v, env.interner.array(env.interner.type_param(k)));
    let map = ClassBuilder::class(&env, "Map").type_params(vec![k, v]).build();
    let mut obligations = ConstraintObligations::new();

    let result = instantiate_generic(&env, map, &[TypeId::STRING], Span::dummy(), &mut obligations);
    assert_eq!(
        result,
        Ok(env
            .interner
            .object(map, [TypeId::STRING, env.interner.array(TypeId::STRING)]))
    );
}
