use super::*;
use crate::types::ParamInfo;

#[test]
fn test_class_defaults_to_object_super() {
    let env = TypeEnvironment::new();
    let animal = ClassBuilder::class(&env, "Animal").build();
    let animal_ty = env.declared_type(animal);
    assert_eq!(env.direct_supertypes(animal_ty), vec![env.builtins.object_type]);
}

#[test]
fn test_find_ancestor_substitutes_type_arguments() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    let container = ClassBuilder::class(&env, "Container")
        .type_params(vec![t])
        .build();
    let container_of_string = env.interner.object(container, [TypeId::STRING]);
    let names = ClassBuilder::class(&env, "Names")
        .extends(container_of_string)
        .build();

    let names_ty = env.declared_type(names);
    assert_eq!(env.find_ancestor(names_ty, container), Some(container_of_string));
    assert!(env.is_derived_def(names, container));
    assert!(!env.is_derived_def(container, names));
}

#[test]
fn test_property_type_through_generic_base() {
    let env = TypeEnvironment::new();
    let t = env.defs.register_type_param(env.intern_string("T"));
    let boxed = ClassBuilder::class(&env, "Box")
        .type_params(vec![t])
        .property("value", env.interner.type_param(t))
        .build();
    let int_box = env.interner.object(boxed, [env.boxed_type(crate::PrimitiveKind::Int)]);
    let value = env.intern_string("value");
    assert_eq!(
        env.property_type(int_box, value),
        Some(env.boxed_type(crate::PrimitiveKind::Int))
    );
    assert_eq!(env.property_type(int_box, env.intern_string("missing")), None);
}

#[test]
fn test_methods_of_nearest_class_shadows_base() {
    let env = TypeEnvironment::new();
    let speak = env.intern_string("speak");
    let base = ClassBuilder::class(&env, "Base")
        .method(Signature::new(speak, vec![], TypeId::VOID))
        .build();
    let derived = ClassBuilder::class(&env, "Derived")
        .extends(env.declared_type(base))
        .method(Signature::new(
            speak,
            vec![ParamInfo::required(env.intern_string("loud"), TypeId::BOOLEAN)],
            TypeId::VOID,
        ))
        .build();

    let found = env.methods_of(env.declared_type(derived), speak);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1.params.len(), 1);
    assert_eq!(found[0].1.owner, Some(derived));
}
