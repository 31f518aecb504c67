use super::*;
use crate::ClassBuilder;
use crate::def::DefFlags;
use crate::diagnostics::DiagnosticArg;
use crate::numeric::Conversion;
use crate::types::{FunctionShape, ParamInfo, PrimitiveKind};

fn sample_types(env: &TypeEnvironment) -> Vec<TypeId> {
    let animal = ClassBuilder::class(env, "Animal").build();
    let animal_ty = env.declared_type(animal);
    let dog = ClassBuilder::class(env, "Dog").extends(animal_ty).build();
    let dog_ty = env.declared_type(dog);
    vec![
        TypeId::INT,
        TypeId::LONG,
        TypeId::DOUBLE,
        TypeId::STRING,
        TypeId::NULL,
        env.boxed_type(PrimitiveKind::Int),
        env.builtins.object_type,
        animal_ty,
        dog_ty,
        env.interner.array(dog_ty),
        env.interner.array(animal_ty),
        env.interner.union([TypeId::INT, TypeId::STRING]),
        env.interner.union([dog_ty, TypeId::NULL]),
        env.interner.literal_int(7),
    ]
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn test_identity_is_reflexive_and_symmetric() {
    let env = TypeEnvironment::new();
    let types = sample_types(&env);
    let mut rel = env.relation();
    for &a in &types {
        assert!(rel.is_identical(a, a));
        for &b in &types {
            assert_eq!(rel.is_identical(a, b), rel.is_identical(b, a));
        }
    }
}

#[test]
fn test_unions_are_identical_as_sets() {
    let env = TypeEnvironment::new();
    let ab = env.interner.union([TypeId::INT, TypeId::STRING]);
    let ba = env.interner.union([TypeId::STRING, TypeId::INT]);
    assert_ne!(ab, ba);
    assert!(env.relation().is_identical(ab, ba));
}

#[test]
fn test_function_identity_ignores_parameter_names() {
    let env = TypeEnvironment::new();
    let f = env.interner.function(FunctionShape::new(
        vec![ParamInfo::required(env.intern_string("a"), TypeId::INT)],
        TypeId::VOID,
    ));
    let g = env.interner.function(FunctionShape::new(
        vec![ParamInfo::required(env.intern_string("b"), TypeId::INT)],
        TypeId::VOID,
    ));
    assert!(env.relation().is_identical(f, g));
}

// =============================================================================
// Subtyping
// =============================================================================

#[test]
fn test_subtyping_is_antisymmetric_modulo_identity() {
    let env = TypeEnvironment::new();
    let types = sample_types(&env);
    let mut rel = env.relation();
    for &a in &types {
        for &b in &types {
            if rel.is_subtype_of(a, b) && rel.is_subtype_of(b, a) {
                assert!(rel.is_identical(a, b), "{a:?} and {b:?} are mutual subtypes");
            }
        }
    }
}

#[test]
fn test_any_top_never_bottom() {
    let env = TypeEnvironment::new();
    let mut rel = env.relation();
    assert!(rel.is_subtype_of(TypeId::STRING, TypeId::ANY));
    assert!(rel.is_subtype_of(TypeId::NEVER, TypeId::INT));
    assert!(!rel.is_subtype_of(TypeId::ANY, TypeId::INT));
}

#[test]
fn test_object_is_supertype_of_references_only() {
    let env = TypeEnvironment::new();
    let object = env.builtins.object_type;
    let mut rel = env.relation();
    assert!(rel.is_subtype_of(TypeId::STRING, object));
    assert!(rel.is_subtype_of(env.interner.array(TypeId::INT), object));
    assert!(rel.is_subtype_of(env.boxed_type(PrimitiveKind::Double), object));
    assert!(!rel.is_subtype_of(TypeId::INT, object));
    assert!(!rel.is_subtype_of(TypeId::NULL, object));
    assert!(rel.is_subtype_of(TypeId::NULL, env.builtins.nullable_object));
}

#[test]
fn test_type_parameter_relates_through_constraint() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    let t_ty = env.interner.type_param(t);
    let mut rel = env.relation();
    assert!(rel.is_subtype_of(t_ty, env.builtins.nullable_object));
    assert!(!rel.is_subtype_of(t_ty, env.builtins.object_type));
    assert!(rel.is_subtype_of(t_ty, env.interner.union([t_ty, TypeId::NULL])));

    let non_null = env.non_nullish(t_ty);
    assert!(rel.is_subtype_of(non_null, env.builtins.object_type));
    assert!(rel.is_subtype_of(non_null, t_ty));
}

#[test]
fn test_generic_arguments_invariant_except_direct_return() {
    let env = TypeEnvironment::new();
    let animal = ClassBuilder::class(&env, "Animal").build();
    let animal_ty = env.declared_type(animal);
    let dog = ClassBuilder::class(&env, "Dog").extends(animal_ty).build();
    let dog_ty = env.declared_type(dog);
    let t = env.defs.register_type_param(env.intern_string("T"));
    let list = ClassBuilder::class(&env, "List").type_params(vec![t]).build();
    let list_dog = env.interner.object(list, [dog_ty]);
    let list_animal = env.interner.object(list, [animal_ty]);

    assert!(!env.relation().is_subtype_of(list_dog, list_animal));
    let mut covariant = env.relation().with_flags(RelationFlags::DIRECT_RETURN);
    assert!(covariant.is_subtype_of(list_dog, list_animal));
}

#[test]
fn test_array_variance() {
    let env = TypeEnvironment::new();
    let animal = ClassBuilder::class(&env, "Animal").build();
    let animal_ty = env.declared_type(animal);
    let dog = ClassBuilder::class(&env, "Dog").extends(animal_ty).build();
    let dog_ty = env.declared_type(dog);
    let mut rel = env.relation();

    assert!(rel.is_subtype_of(env.interner.array(dog_ty), env.interner.array(animal_ty)));
    assert!(!rel.is_subtype_of(env.interner.array(TypeId::INT), env.interner.array(TypeId::LONG)));
    assert!(!rel.is_subtype_of(
        env.interner.resizable_array(dog_ty),
        env.interner.resizable_array(animal_ty)
    ));
    let tuple = env.interner.tuple([dog_ty, animal_ty]);
    assert!(rel.is_subtype_of(tuple, env.interner.array(animal_ty)));
}

#[test]
fn test_function_variance() {
    let env = TypeEnvironment::new();
    let animal = ClassBuilder::class(&env, "Animal").build();
    let animal_ty = env.declared_type(animal);
    let dog = ClassBuilder::class(&env, "Dog").extends(animal_ty).build();
    let dog_ty = env.declared_type(dog);
    let x = env.intern_string("x");
    let func = |param, ret| {
        env.interner
            .function(FunctionShape::new(vec![ParamInfo::required(x, param)], ret))
    };
    let mut rel = env.relation();

    // Contravariant parameters, covariant return.
    assert!(rel.is_subtype_of(func(animal_ty, dog_ty), func(dog_ty, animal_ty)));
    assert!(!rel.is_subtype_of(func(dog_ty, animal_ty), func(animal_ty, dog_ty)));
    // A void return accepts any return.
    assert!(rel.is_subtype_of(func(animal_ty, TypeId::INT), func(dog_ty, TypeId::VOID)));
}

#[test]
fn test_readonly_only_against_readonly() {
    let env = TypeEnvironment::new();
    let arr = env.interner.array(TypeId::STRING);
    let ro = env.interner.readonly(arr);
    let mut rel = env.relation();
    assert!(!rel.is_subtype_of(arr, ro));
    assert!(!rel.is_subtype_of(ro, arr));
    assert!(rel.is_subtype_of(ro, env.interner.readonly(arr)));
    // Storing a mutable value into a readonly slot is fine.
    assert!(rel.is_assignable(arr, ro));
    assert!(!rel.is_assignable(ro, arr));
}

// =============================================================================
// Assignability
// =============================================================================

#[test]
fn test_widening_records_conversion() {
    let env = TypeEnvironment::new();
    let mut rel = env.relation();
    assert!(rel.is_assignable(TypeId::INT, TypeId::DOUBLE));
    assert_eq!(
        rel.take_conversions().as_slice(),
        &[Conversion::Widen {
            from: PrimitiveKind::Int,
            to: PrimitiveKind::Double
        }]
    );
    assert!(!rel.is_assignable(TypeId::DOUBLE, TypeId::INT));
    assert!(rel.conversions().is_empty());

    let mut strict = env.relation().with_flags(RelationFlags::NO_WIDENING | RelationFlags::NO_THROW);
    assert!(!strict.is_assignable(TypeId::INT, TypeId::DOUBLE));
}

#[test]
fn test_constant_narrowing_is_range_checked() {
    let env = TypeEnvironment::new();
    let small = env.interner.literal_int(100);
    let big = env.interner.literal_int(300);

    let mut rel = env.relation().with_flags(RelationFlags::NO_THROW);
    assert!(rel.is_assignable(small, TypeId::BYTE));
    assert_eq!(
        rel.take_conversions().as_slice(),
        &[Conversion::Narrow {
            from: PrimitiveKind::Int,
            to: PrimitiveKind::Byte
        }]
    );
    assert!(!rel.is_assignable(big, TypeId::BYTE));
    assert!(rel.is_assignable(big, TypeId::SHORT));

    // Only literals narrow.
    assert!(!rel.is_assignable(TypeId::INT, TypeId::BYTE));
}

#[test]
fn test_no_widening_disables_constant_narrowing() {
    let env = TypeEnvironment::new();
    let small = env.interner.literal_int(100);

    let mut strict = env
        .relation()
        .with_flags(RelationFlags::NO_THROW | RelationFlags::NO_WIDENING);
    assert!(!strict.is_assignable(small, TypeId::BYTE));
    assert!(strict.is_assignable(small, TypeId::INT));
    assert!(strict.take_conversions().is_empty());
}

#[test]
fn test_boxing_and_unboxing() {
    let env = TypeEnvironment::new();
    let int_box = env.boxed_type(PrimitiveKind::Int);
    let double_box = env.boxed_type(PrimitiveKind::Double);
    let mut rel = env.relation().with_flags(RelationFlags::NO_THROW);

    assert!(rel.is_assignable(TypeId::INT, int_box));
    assert_eq!(rel.take_conversions().as_slice(), &[Conversion::Box(PrimitiveKind::Int)]);
    assert!(rel.is_assignable(TypeId::INT, env.builtins.object_type));
    assert_eq!(rel.take_conversions().as_slice(), &[Conversion::Box(PrimitiveKind::Int)]);

    assert!(rel.is_assignable(int_box, TypeId::LONG));
    assert_eq!(
        rel.take_conversions().as_slice(),
        &[
            Conversion::Unbox(PrimitiveKind::Int),
            Conversion::Widen {
                from: PrimitiveKind::Int,
                to: PrimitiveKind::Long
            }
        ]
    );
    // Unrelated boxed numerics need an explicit cast.
    assert!(!rel.is_assignable(double_box, TypeId::INT));
    assert!(!rel.is_assignable(TypeId::INT, double_box));
}

#[test]
fn test_boxing_flags_only_remove_conversions() {
    let env = TypeEnvironment::new();
    let types = sample_types(&env);
    for &source in &types {
        for &target in &types {
            let mut strict = env
                .relation()
                .with_flags(RelationFlags::NO_BOXING | RelationFlags::NO_THROW);
            let mut loose = env.relation().with_flags(RelationFlags::NO_THROW);
            if strict.is_assignable(source, target) {
                assert!(loose.is_assignable(source, target), "{source:?} -> {target:?}");
            }
        }
    }
}

#[test]
fn test_union_target_prefers_identity_then_widening() {
    let env = TypeEnvironment::new();
    let int_box = env.boxed_type(PrimitiveKind::Int);
    let mut rel = env.relation();

    let exact = env.interner.union([int_box, TypeId::INT]);
    assert!(rel.is_assignable(TypeId::INT, exact));
    assert!(rel.take_conversions().is_empty());

    let widen_or_box = env.interner.union([int_box, TypeId::LONG]);
    assert!(rel.is_assignable(TypeId::INT, widen_or_box));
    assert_eq!(
        rel.take_conversions().as_slice(),
        &[Conversion::Widen {
            from: PrimitiveKind::Int,
            to: PrimitiveKind::Long
        }]
    );
}

#[test]
fn test_union_source_needs_every_member() {
    let env = TypeEnvironment::new();
    let source = env.interner.union([TypeId::INT, TypeId::STRING]);
    let mut rel = env.relation().with_flags(RelationFlags::NO_THROW);
    assert!(!rel.is_assignable(source, TypeId::INT));
    assert!(rel.is_assignable(source, env.interner.union([TypeId::LONG, TypeId::STRING])));
}

#[test]
fn test_error_and_any_are_silent() {
    let env = TypeEnvironment::new();
    let mut rel = env.relation();
    assert!(rel.is_assignable(TypeId::ERROR, TypeId::INT));
    assert!(rel.is_assignable(TypeId::STRING, TypeId::ERROR));
    assert!(rel.is_assignable(TypeId::ANY, TypeId::INT));
    assert!(rel.take_diagnostics().is_empty());
}

#[test]
fn test_failure_queues_diagnostic_of_failure_kind() {
    let env = TypeEnvironment::new();
    let mut rel = env.relation().with_failure_kind(FailureKind::Argument);
    assert!(!rel.is_assignable(TypeId::STRING, TypeId::INT));
    let diags = rel.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::ARG_NOT_ASSIGNABLE);
    assert_eq!(
        diags[0].args,
        vec![DiagnosticArg::Type(TypeId::STRING), DiagnosticArg::Type(TypeId::INT)]
    );

    let mut silent = env.relation().with_flags(RelationFlags::NO_THROW);
    assert!(!silent.is_assignable(TypeId::STRING, TypeId::INT));
    assert!(silent.take_diagnostics().is_empty());
}

// =============================================================================
// Casts
// =============================================================================

#[test]
fn test_numeric_casts() {
    let env = TypeEnvironment::new();
    let mut rel = env.relation().with_failure_kind(FailureKind::Cast);
    assert!(rel.is_castable(TypeId::DOUBLE, TypeId::BYTE));
    assert_eq!(
        rel.take_conversions().as_slice(),
        &[Conversion::Narrow {
            from: PrimitiveKind::Double,
            to: PrimitiveKind::Byte
        }]
    );
    assert!(rel.is_castable(env.boxed_type(PrimitiveKind::Double), TypeId::INT));
    assert!(!rel.is_castable(TypeId::BOOLEAN, TypeId::INT));
    let diags = rel.take_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::CAST_UNREACHABLE);
}

#[test]
fn test_downcast_and_interface_casts() {
    let env = TypeEnvironment::new();
    let animal = ClassBuilder::class(&env, "Animal").build();
    let animal_ty = env.declared_type(animal);
    let dog = ClassBuilder::class(&env, "Dog").extends(animal_ty).build();
    let dog_ty = env.declared_type(dog);
    let pet = ClassBuilder::interface(&env, "Pet").build();
    let pet_ty = env.declared_type(pet);
    let rock = ClassBuilder::class(&env, "Rock").flags(DefFlags::FINAL).build();
    let rock_ty = env.declared_type(rock);

    let mut rel = env.relation().with_flags(RelationFlags::NO_THROW);
    assert!(rel.is_castable(animal_ty, dog_ty));
    assert!(rel.is_castable(animal_ty, pet_ty));
    assert!(rel.is_castable(pet_ty, dog_ty));
    assert!(!rel.is_castable(rock_ty, pet_ty));
    assert!(!rel.is_castable(rock_ty, dog_ty));
}

#[test]
fn test_union_source_cast() {
    let env = TypeEnvironment::new();
    let source = env.interner.union([TypeId::STRING, TypeId::DOUBLE]);
    let mut rel = env.relation().with_flags(RelationFlags::NO_THROW);
    assert!(rel.is_castable(source, TypeId::STRING));
    assert!(rel.is_castable(source, TypeId::INT));
    assert!(!rel.is_castable(source, TypeId::BOOLEAN));
}

#[test]
fn test_nested_generic_relation_under_trace_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let env = TypeEnvironment::new();
        let t = env.defs.register_type_param(env.intern_string("T"));
        let boxed = ClassBuilder::class(&env, "Box")
            .type_params(vec![t])
            .property("value", env.interner.type_param(t))
            .build();
        let inner = env.interner.object(boxed, [TypeId::INT]);
        let a = env.interner.object(boxed, [inner]);
        let b = env.interner.object(boxed, [env.interner.object(boxed, [TypeId::INT])]);
        let other = env.interner.object(boxed, [env.interner.object(boxed, [TypeId::STRING])]);

        let mut rel = env.relation().with_flags(RelationFlags::NO_THROW);
        assert!(rel.is_subtype_of(a, b));
        assert!(!rel.is_subtype_of(a, other));
        assert!(rel.is_subtype_of(a, env.builtins.object_type));
    });
}
