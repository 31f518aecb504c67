//! Most-specific overload selection.
//!
//! Candidate A is more specific than B when every parameter type A uses for
//! the call's arguments is assignable to B's without boxing. When several
//! candidates are maximal the tie-breaks are, in order: the owner declared
//! lower in the hierarchy (classes before interfaces), a signature without a
//! rest parameter, an instance member over a static one, and a public member.

use crate::def::Visibility;
use crate::env::TypeEnvironment;
use crate::relation::{RelationFlags, TypeRelation};
use crate::signature::Signature;

/// Indices into `candidates` of the single best signature, or every
/// candidate still tied after all tie-breaks.
pub fn select_most_specific(
    env: &TypeEnvironment,
    candidates: &[&Signature],
    arg_count: usize,
) -> Result<usize, Vec<usize>> {
    if candidates.len() == 1 {
        return Ok(0);
    }
    let mut maximal: Vec<usize> = (0..candidates.len())
        .filter(|&i| {
            (0..candidates.len()).all(|j| {
                i == j
                    || is_more_specific(env, candidates[i], candidates[j], arg_count)
                    || !is_more_specific(env, candidates[j], candidates[i], arg_count)
            })
        })
        .collect();
    // Keep only candidates more specific than every other maximal one.
    let dominating: Vec<usize> = maximal
        .iter()
        .copied()
        .filter(|&i| {
            maximal
                .iter()
                .all(|&j| i == j || is_more_specific(env, candidates[i], candidates[j], arg_count))
        })
        .collect();
    if !dominating.is_empty() {
        maximal = dominating;
    }
    if maximal.len() == 1 {
        return Ok(maximal[0]);
    }

    let tie_breaks: [&dyn Fn(&Signature, &Signature) -> bool; 4] = [
        &|a: &Signature, b: &Signature| owner_more_specific(env, a, b),
        &|a: &Signature, b: &Signature| a.rest.is_none() && b.rest.is_some(),
        &|a: &Signature, b: &Signature| !a.is_static() && b.is_static(),
        &|a: &Signature, b: &Signature| {
            a.visibility() == Visibility::Public && b.visibility() != Visibility::Public
        },
    ];
    for prefer in tie_breaks {
        let winners: Vec<usize> = maximal
            .iter()
            .copied()
            .filter(|&i| {
                maximal
                    .iter()
                    .all(|&j| i == j || prefer(candidates[i], candidates[j]))
            })
            .collect();
        if winners.len() == 1 {
            return Ok(winners[0]);
        }
    }
    Err(maximal)
}

/// Parameter-wise assignability of `a` to `b` over the first `arg_count`
/// argument positions, with boxing and unboxing disabled.
pub fn is_more_specific(env: &TypeEnvironment, a: &Signature, b: &Signature, arg_count: usize) -> bool {
    let mut relation = TypeRelation::new(env).with_flags(
        RelationFlags::NO_BOXING | RelationFlags::NO_UNBOXING | RelationFlags::NO_THROW,
    );
    (0..arg_count).all(|i| match (a.param_type_at(i), b.param_type_at(i)) {
        (Some(pa), Some(pb)) => relation.is_assignable(pa, pb),
        _ => false,
    })
}

fn owner_more_specific(env: &TypeEnvironment, a: &Signature, b: &Signature) -> bool {
    match (a.owner, b.owner) {
        (Some(oa), Some(ob)) if oa != ob => {
            let a_interface = env.defs.get(oa).is_some_and(|d| d.is_interface());
            let b_interface = env.defs.get(ob).is_some_and(|d| d.is_interface());
            if a_interface != b_interface {
                return !a_interface;
            }
            env.is_derived_def(oa, ob)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParamInfo, TypeId};

    #[test]
    fn test_narrower_parameter_wins() {
        let env = TypeEnvironment::new();
        let f = env.intern_string("f");
        let x = env.intern_string("x");
        let int_sig = Signature::new(f, vec![ParamInfo::required(x, TypeId::INT)], TypeId::VOID);
        let long_sig = Signature::new(f, vec![ParamInfo::required(x, TypeId::LONG)], TypeId::VOID);
        assert!(is_more_specific(&env, &int_sig, &long_sig, 1));
        assert!(!is_more_specific(&env, &long_sig, &int_sig, 1));
        assert_eq!(select_most_specific(&env, &[&long_sig, &int_sig], 1), Ok(1));
    }

    #[test]
    fn test_non_rest_breaks_tie() {
        let env = TypeEnvironment::new();
        let f = env.intern_string("f");
        let x = env.intern_string("x");
        let plain = Signature::new(f, vec![ParamInfo::required(x, TypeId::INT)], TypeId::VOID);
        let rest = Signature::new(f, vec![], TypeId::VOID)
            .with_rest(ParamInfo::required(env.intern_string("xs"), TypeId::INT));
        assert_eq!(select_most_specific(&env, &[&rest, &plain], 1), Ok(1));
    }

    #[test]
    fn test_unrelated_candidates_stay_tied() {
        let env = TypeEnvironment::new();
        let f = env.intern_string("f");
        let x = env.intern_string("x");
        let a = Signature::new(f, vec![ParamInfo::required(x, TypeId::STRING)], TypeId::VOID);
        let b = Signature::new(f, vec![ParamInfo::required(x, TypeId::BOOLEAN)], TypeId::VOID);
        assert_eq!(select_most_specific(&env, &[&a, &b], 1), Err(vec![0, 1]));
    }
}
