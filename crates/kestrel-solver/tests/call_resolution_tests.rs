use super::*;
use crate::signature::SignatureFlags;
use crate::types::PrimitiveKind;
use crate::{ClassBuilder, TypeFormatter};

fn param(env: &TypeEnvironment, name: &str, ty: TypeId) -> ParamInfo {
    ParamInfo::required(env.intern_string(name), ty)
}

fn function(env: &TypeEnvironment, name: &str, params: Vec<ParamInfo>, ret: TypeId) -> Signature {
    Signature::new(env.intern_string(name), params, ret)
}

fn typed(types: &[TypeId]) -> Vec<CallArgument> {
    types.iter().map(|&t| CallArgument::Typed(t)).collect()
}

fn resolve(env: &TypeEnvironment, name: &str, args: &[CallArgument]) -> Result<ResolvedCall, CallResolutionError> {
    let mut obligations = ConstraintObligations::new();
    SignatureResolver::new(env, &mut obligations)
        .resolve_function_call(env.intern_string(name), &CallSite::new(args, Span::dummy()))
}

// =============================================================================
// Arity and applicability
// =============================================================================

#[test]
fn test_arity_filter_keeps_matching_overload() {
    let env = TypeEnvironment::new();
    for count in 1..=3 {
        let params = (0..count).map(|i| param(&env, &format!("p{i}"), TypeId::INT)).collect();
        env.defs.add_function(function(&env, "f", params, TypeId::VOID));
    }
    let resolved = resolve(&env, "f", &typed(&[TypeId::INT, TypeId::INT])).unwrap();
    assert_eq!(resolved.signature.params.len(), 2);
    assert_eq!(resolved.arg_conversions.len(), 2);
}

#[test]
fn test_literal_argument_narrows_to_byte_parameter() {
    let env = TypeEnvironment::new();
    env.defs.add_function(function(&env, "take", vec![param(&env, "b", TypeId::BYTE)], TypeId::VOID));

    let one = env.interner.literal_int(1);
    let resolved = resolve(&env, "take", &typed(&[one])).unwrap();
    assert_eq!(
        resolved.arg_conversions[0].as_slice(),
        &[Conversion::Narrow {
            from: PrimitiveKind::Int,
            to: PrimitiveKind::Byte
        }]
    );

    let out_of_range = env.interner.literal_int(1000);
    assert!(matches!(
        resolve(&env, "take", &typed(&[out_of_range])),
        Err(CallResolutionError::NoMatchingSignature { .. })
    ));
    assert!(resolve(&env, "take", &typed(&[TypeId::INT])).is_err());
}

#[test]
fn test_wrong_argument_count() {
    let env = TypeEnvironment::new();
    env.defs.add_function(function(&env, "f", vec![param(&env, "a", TypeId::INT)], TypeId::VOID));
    env.defs.add_function(function(
        &env,
        "f",
        vec![param(&env, "a", TypeId::INT), param(&env, "b", TypeId::INT)],
        TypeId::VOID,
    ));
    let err = resolve(&env, "f", &typed(&[TypeId::INT; 3])).unwrap_err();
    assert_eq!(
        err,
        CallResolutionError::WrongArgumentCount {
            expected: ArityRange { min: 1, max: Some(2) },
            got: 3
        }
    );
    let diag = err.to_diagnostic();
    assert_eq!(diag.code, codes::ARG_COUNT_MISMATCH);
    assert_eq!(diag.args[0], DiagnosticArg::String("1-2".into()));
}

#[test]
fn test_union_argument_matches_no_overload() {
    let env = TypeEnvironment::new();
    env.defs.add_function(function(&env, "f", vec![param(&env, "x", TypeId::INT)], TypeId::VOID));
    env.defs.add_function(function(&env, "f", vec![param(&env, "x", TypeId::STRING)], TypeId::VOID));
    let arg = env.interner.union([TypeId::INT, TypeId::STRING]);

    let err = resolve(&env, "f", &typed(&[arg])).unwrap_err();
    let CallResolutionError::NoMatchingSignature { args, candidates, .. } = &err else {
        panic!("expected no matching signature, got {err:?}");
    };
    assert_eq!(args, &vec![Some(arg)]);
    assert_eq!(candidates.len(), 2);

    let rendered = err
        .to_diagnostic()
        .render(&mut TypeFormatter::new(&env), Span::dummy());
    assert_eq!(
        rendered.message_text,
        "No matching call signature for f(int | string). Candidates: f(x: int): void; f(x: string): void"
    );
}

#[test]
fn test_missing_function_has_no_candidates() {
    let env = TypeEnvironment::new();
    let err = resolve(&env, "nope", &[]).unwrap_err();
    assert!(matches!(
        err,
        CallResolutionError::WrongArgumentCount { got: 0, .. }
            | CallResolutionError::NoMatchingSignature { .. }
    ));
}

#[test]
fn test_rest_parameter_collects_trailing_arguments() {
    let env = TypeEnvironment::new();
    env.defs.add_function(
        function(&env, "sum", vec![], TypeId::LONG).with_rest(param(&env, "xs", TypeId::LONG)),
    );
    let resolved = resolve(&env, "sum", &typed(&[TypeId::INT, TypeId::LONG, TypeId::BYTE])).unwrap();
    assert_eq!(resolved.arg_conversions.len(), 3);
    assert_eq!(
        resolved.arg_conversions[0].as_slice(),
        &[Conversion::Widen {
            from: PrimitiveKind::Int,
            to: PrimitiveKind::Long
        }]
    );
    assert!(resolved.arg_conversions[1].is_empty());
}

// =============================================================================
// Most specific
// =============================================================================

#[test]
fn test_most_specific_prefers_narrower_parameter() {
    let env = TypeEnvironment::new();
    env.defs.add_function(function(&env, "f", vec![param(&env, "x", TypeId::LONG)], TypeId::LONG));
    env.defs.add_function(function(&env, "f", vec![param(&env, "x", TypeId::INT)], TypeId::INT));

    let from_short = resolve(&env, "f", &typed(&[TypeId::SHORT])).unwrap();
    assert_eq!(from_short.return_type(), TypeId::INT);
    let from_long = resolve(&env, "f", &typed(&[TypeId::LONG])).unwrap();
    assert_eq!(from_long.return_type(), TypeId::LONG);
}

#[test]
fn test_boxing_recorded_for_object_parameter() {
    let env = TypeEnvironment::new();
    env.defs.add_function(function(
        &env,
        "show",
        vec![param(&env, "x", env.builtins.object_type)],
        TypeId::VOID,
    ));
    let resolved = resolve(&env, "show", &typed(&[TypeId::INT])).unwrap();
    assert_eq!(
        resolved.arg_conversions[0].as_slice(),
        &[Conversion::Box(PrimitiveKind::Int)]
    );
}

#[test]
fn test_ambiguous_call() {
    let env = TypeEnvironment::new();
    let object = env.builtins.object_type;
    env.defs.add_function(function(
        &env,
        "g",
        vec![param(&env, "a", TypeId::STRING), param(&env, "b", object)],
        TypeId::VOID,
    ));
    env.defs.add_function(function(
        &env,
        "g",
        vec![param(&env, "a", object), param(&env, "b", TypeId::STRING)],
        TypeId::VOID,
    ));
    let err = resolve(&env, "g", &typed(&[TypeId::STRING, TypeId::STRING])).unwrap_err();
    let CallResolutionError::Ambiguous { candidates, .. } = &err else {
        panic!("expected ambiguity, got {err:?}");
    };
    assert_eq!(candidates.len(), 2);
    assert_eq!(err.to_diagnostic().code, codes::AMBIGUOUS_CALL);
}

// =============================================================================
// Generics
// =============================================================================

#[test]
fn test_generic_call_infers_boxed_argument() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    let t_ty = env.interner.type_param(t);
    env.defs.add_function(
        function(&env, "identity", vec![param(&env, "x", t_ty)], t_ty).with_type_params(vec![t]),
    );
    let args = typed(&[TypeId::INT]);
    let mut obligations = ConstraintObligations::new();
    let resolved = SignatureResolver::new(&env, &mut obligations)
        .resolve_function_call(env.intern_string("identity"), &CallSite::new(&args, Span::dummy()))
        .unwrap();

    let int_box = env.boxed_type(PrimitiveKind::Int);
    assert_eq!(resolved.return_type(), int_box);
    assert_eq!(resolved.substitution.get(t), Some(int_box));
    assert_eq!(
        resolved.arg_conversions[0].as_slice(),
        &[Conversion::Box(PrimitiveKind::Int)]
    );
    assert_eq!(obligations.pending_len(), 1);
}

#[test]
fn test_generic_call_through_array_parameter() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    let t_ty = env.interner.type_param(t);
    env.defs.add_function(
        function(&env, "first", vec![param(&env, "xs", env.interner.array(t_ty))], t_ty)
            .with_type_params(vec![t]),
    );
    let resolved = resolve(&env, "first", &typed(&[env.interner.array(TypeId::STRING)])).unwrap();
    assert_eq!(resolved.return_type(), TypeId::STRING);
}

#[test]
fn test_explicit_type_argument_count() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    let t_ty = env.interner.type_param(t);
    env.defs.add_function(
        function(&env, "identity", vec![param(&env, "x", t_ty)], t_ty).with_type_params(vec![t]),
    );
    let name = env.intern_string("identity");
    let args = typed(&[TypeId::STRING]);
    let mut obligations = ConstraintObligations::new();
    let mut resolver = SignatureResolver::new(&env, &mut obligations);

    let one = [TypeId::STRING];
    let ok = resolver
        .resolve_function_call(name, &CallSite::new(&args, Span::dummy()).with_type_args(&one))
        .unwrap();
    assert_eq!(ok.return_type(), TypeId::STRING);

    let two = [TypeId::STRING, TypeId::STRING];
    let err = resolver
        .resolve_function_call(name, &CallSite::new(&args, Span::dummy()).with_type_args(&two))
        .unwrap_err();
    assert_eq!(
        err,
        CallResolutionError::TypeArgumentCount {
            name,
            expected: 1,
            got: 2
        }
    );
}

#[test]
fn test_unconstrained_parameter_falls_back_to_nullable_object() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    env.defs.add_function(
        function(&env, "make", vec![], env.interner.type_param(t)).with_type_params(vec![t]),
    );
    let resolved = resolve(&env, "make", &[]).unwrap();
    assert_eq!(resolved.return_type(), env.builtins.nullable_object);
}

// =============================================================================
// Lambdas
// =============================================================================

fn callback(env: &TypeEnvironment, param_ty: TypeId, ret: TypeId) -> TypeId {
    env.interner
        .function(FunctionShape::new(vec![param(env, "v", param_ty)], ret))
}

#[test]
fn test_untyped_lambda_takes_parameter_shape() {
    let env = TypeEnvironment::new();
    env.defs.add_function(function(
        &env,
        "apply",
        vec![
            param(&env, "x", TypeId::INT),
            param(&env, "f", callback(&env, TypeId::INT, TypeId::STRING)),
        ],
        TypeId::STRING,
    ));
    let args = vec![
        CallArgument::Typed(TypeId::INT),
        CallArgument::UntypedLambda {
            param_count: 1,
            declared: vec![None],
        },
    ];
    let resolved = resolve(&env, "apply", &args).unwrap();
    assert_eq!(resolved.lambda_shapes.len(), 1);
    let (index, shape) = &resolved.lambda_shapes[0];
    assert_eq!(*index, 1);
    assert_eq!(shape.params[0].type_id, TypeId::INT);
    assert_eq!(shape.return_type, TypeId::STRING);
}

#[test]
fn test_lambda_arity_selects_overload() {
    let env = TypeEnvironment::new();
    let two_params = env.interner.function(FunctionShape::new(
        vec![param(&env, "a", TypeId::INT), param(&env, "b", TypeId::INT)],
        TypeId::VOID,
    ));
    env.defs.add_function(function(
        &env,
        "each",
        vec![param(&env, "f", callback(&env, TypeId::STRING, TypeId::VOID))],
        TypeId::INT,
    ));
    env.defs
        .add_function(function(&env, "each", vec![param(&env, "f", two_params)], TypeId::LONG));

    // A two-parameter lambda only fits the second overload.
    let args = vec![CallArgument::UntypedLambda {
        param_count: 2,
        declared: vec![None, None],
    }];
    let resolved = resolve(&env, "each", &args).unwrap();
    assert_eq!(resolved.return_type(), TypeId::LONG);
}

#[test]
fn test_annotated_lambda_parameter_must_accept_slot() {
    let env = TypeEnvironment::new();
    env.defs.add_function(function(
        &env,
        "run",
        vec![param(&env, "f", callback(&env, TypeId::INT, TypeId::VOID))],
        TypeId::VOID,
    ));
    let widened = vec![CallArgument::UntypedLambda {
        param_count: 1,
        declared: vec![Some(TypeId::LONG)],
    }];
    let resolved = resolve(&env, "run", &widened).unwrap();
    assert_eq!(resolved.lambda_shapes[0].1.params[0].type_id, TypeId::LONG);

    let wrong = vec![CallArgument::UntypedLambda {
        param_count: 1,
        declared: vec![Some(TypeId::STRING)],
    }];
    assert!(matches!(
        resolve(&env, "run", &wrong),
        Err(CallResolutionError::NoMatchingSignature { .. })
    ));
}

#[test]
fn test_generic_lambda_parameter_from_other_argument() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    let t_ty = env.interner.type_param(t);
    env.defs.add_function(
        function(
            &env,
            "with",
            vec![
                param(&env, "x", t_ty),
                param(&env, "f", callback(&env, t_ty, TypeId::VOID)),
            ],
            TypeId::VOID,
        )
        .with_type_params(vec![t]),
    );
    let args = vec![
        CallArgument::Typed(TypeId::STRING),
        CallArgument::UntypedLambda {
            param_count: 1,
            declared: vec![None],
        },
    ];
    let resolved = resolve(&env, "with", &args).unwrap();
    assert_eq!(resolved.lambda_shapes[0].1.params[0].type_id, TypeId::STRING);
}

// =============================================================================
// Methods and extensions
// =============================================================================

fn point_class(env: &TypeEnvironment, member_flags: SignatureFlags) -> (DefId, TypeId) {
    let point = ClassBuilder::class(env, "Point")
        .method(function(env, "len", vec![], TypeId::INT).with_flags(member_flags))
        .build();
    (point, env.declared_type(point))
}

#[test]
fn test_extension_tried_before_member() {
    let env = TypeEnvironment::new();
    let (_, point_ty) = point_class(&env, SignatureFlags::PUBLIC);
    env.defs.add_extension(function(&env, "len", vec![param(&env, "self", point_ty)], TypeId::DOUBLE));

    let mut obligations = ConstraintObligations::new();
    let resolved = SignatureResolver::new(&env, &mut obligations)
        .resolve_method_call(point_ty, env.intern_string("len"), &CallSite::new(&[], Span::dummy()))
        .unwrap();
    assert!(resolved.via_extension);
    assert_eq!(resolved.return_type(), TypeId::DOUBLE);
    assert!(resolved.arg_conversions.is_empty());
}

#[test]
fn test_member_used_when_extension_does_not_apply() {
    let env = TypeEnvironment::new();
    let (_, point_ty) = point_class(&env, SignatureFlags::PUBLIC);
    env.defs.add_extension(function(
        &env,
        "len",
        vec![param(&env, "self", TypeId::STRING)],
        TypeId::DOUBLE,
    ));

    let mut obligations = ConstraintObligations::new();
    let resolved = SignatureResolver::new(&env, &mut obligations)
        .resolve_method_call(point_ty, env.intern_string("len"), &CallSite::new(&[], Span::dummy()))
        .unwrap();
    assert!(!resolved.via_extension);
    assert_eq!(resolved.return_type(), TypeId::INT);
}

#[test]
fn test_private_member_wins_inside_its_class() {
    let env = TypeEnvironment::new();
    let (point, point_ty) = point_class(&env, SignatureFlags::PRIVATE);
    env.defs.add_extension(function(&env, "len", vec![param(&env, "self", point_ty)], TypeId::DOUBLE));
    let name = env.intern_string("len");

    let mut obligations = ConstraintObligations::new();
    let mut resolver = SignatureResolver::new(&env, &mut obligations);
    let inside = resolver
        .resolve_method_call(point_ty, name, &CallSite::new(&[], Span::dummy()).with_caller_class(Some(point)))
        .unwrap();
    assert!(!inside.via_extension);
    assert_eq!(inside.return_type(), TypeId::INT);

    let outside = resolver
        .resolve_method_call(point_ty, name, &CallSite::new(&[], Span::dummy()))
        .unwrap();
    assert!(outside.via_extension);
}

#[test]
fn test_private_member_not_preferred_in_subclass() {
    let env = TypeEnvironment::new();
    let (_, point_ty) = point_class(&env, SignatureFlags::PRIVATE);
    let sub = ClassBuilder::class(&env, "Sub").extends(point_ty).build();
    env.defs.add_extension(function(&env, "len", vec![param(&env, "self", point_ty)], TypeId::DOUBLE));

    let mut obligations = ConstraintObligations::new();
    let resolved = SignatureResolver::new(&env, &mut obligations)
        .resolve_method_call(
            point_ty,
            env.intern_string("len"),
            &CallSite::new(&[], Span::dummy()).with_caller_class(Some(sub)),
        )
        .unwrap();
    assert!(resolved.via_extension);
    assert_eq!(resolved.return_type(), TypeId::DOUBLE);
}

#[test]
fn test_protected_member_preferred_in_subclass() {
    let env = TypeEnvironment::new();
    let (_, point_ty) = point_class(&env, SignatureFlags::PROTECTED);
    let sub = ClassBuilder::class(&env, "Sub").extends(point_ty).build();
    env.defs.add_extension(function(&env, "len", vec![param(&env, "self", point_ty)], TypeId::DOUBLE));

    let mut obligations = ConstraintObligations::new();
    let resolved = SignatureResolver::new(&env, &mut obligations)
        .resolve_method_call(
            point_ty,
            env.intern_string("len"),
            &CallSite::new(&[], Span::dummy()).with_caller_class(Some(sub)),
        )
        .unwrap();
    assert!(!resolved.via_extension);
    assert_eq!(resolved.return_type(), TypeId::INT);
}

#[test]
fn test_private_member_hidden_from_other_classes() {
    let env = TypeEnvironment::new();
    let (_, point_ty) = point_class(&env, SignatureFlags::PRIVATE);
    let other = ClassBuilder::class(&env, "Other").build();
    let name = env.intern_string("len");

    let mut obligations = ConstraintObligations::new();
    let mut resolver = SignatureResolver::new(&env, &mut obligations);
    for caller in [None, Some(other)] {
        let err = resolver
            .resolve_method_call(
                point_ty,
                name,
                &CallSite::new(&[], Span::dummy()).with_caller_class(caller),
            )
            .unwrap_err();
        assert_eq!(
            err,
            CallResolutionError::Inaccessible {
                receiver: point_ty,
                name,
                visibility: Visibility::Private,
            }
        );
        assert_eq!(err.to_diagnostic().code, codes::MEMBER_NOT_ACCESSIBLE);
    }
}

#[test]
fn test_unknown_member() {
    let env = TypeEnvironment::new();
    let (_, point_ty) = point_class(&env, SignatureFlags::PUBLIC);
    let name = env.intern_string("area");
    let mut obligations = ConstraintObligations::new();
    let err = SignatureResolver::new(&env, &mut obligations)
        .resolve_method_call(point_ty, name, &CallSite::new(&[], Span::dummy()))
        .unwrap_err();
    assert_eq!(
        err,
        CallResolutionError::UnknownMember {
            receiver: point_ty,
            name
        }
    );
}

#[test]
fn test_extension_lambda_index_excludes_receiver() {
    let env = TypeEnvironment::new();
    let (_, point_ty) = point_class(&env, SignatureFlags::PUBLIC);
    env.defs.add_extension(function(
        &env,
        "visit",
        vec![
            param(&env, "self", point_ty),
            param(&env, "f", callback(&env, point_ty, TypeId::VOID)),
        ],
        TypeId::VOID,
    ));
    let args = vec![CallArgument::UntypedLambda {
        param_count: 1,
        declared: vec![None],
    }];
    let mut obligations = ConstraintObligations::new();
    let resolved = SignatureResolver::new(&env, &mut obligations)
        .resolve_method_call(point_ty, env.intern_string("visit"), &CallSite::new(&args, Span::dummy()))
        .unwrap();
    assert!(resolved.via_extension);
    assert_eq!(resolved.lambda_shapes[0].0, 0);
    assert_eq!(resolved.arg_conversions.len(), 1);
}

// =============================================================================
// Function values
// =============================================================================

#[test]
fn test_function_value_call() {
    let env = TypeEnvironment::new();
    let callee = callback(&env, TypeId::INT, TypeId::STRING);
    let mut obligations = ConstraintObligations::new();
    let mut resolver = SignatureResolver::new(&env, &mut obligations);

    let ok_args = typed(&[TypeId::BYTE]);
    let resolved = resolver
        .resolve_function_value_call(callee, &CallSite::new(&ok_args, Span::dummy()))
        .unwrap();
    assert_eq!(resolved.return_type(), TypeId::STRING);

    let err = resolver
        .resolve_function_value_call(TypeId::STRING, &CallSite::new(&ok_args, Span::dummy()))
        .unwrap_err();
    assert_eq!(err, CallResolutionError::NotCallable { callee: TypeId::STRING });
}
