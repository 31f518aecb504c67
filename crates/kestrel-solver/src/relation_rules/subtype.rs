//! The supertype relation `sup ⊇ sub`.
//!
//! - `Any` is the top type and `Never` the bottom type
//! - Unions: a union source needs every member, a union target any member
//! - Type parameters relate through their constraint
//! - Classes and interfaces are nominal; arguments are invariant except
//!   under `DIRECT_RETURN`
//! - `Object` is a supertype of every non-nullish reference type
//! - Arrays are covariant for reference elements, resizable arrays invariant
//! - Functions: contravariant parameters, covariant return, `void` accepts any return
//! - `Readonly` only relates to `Readonly`
//! - Literals are subtypes of their base type

use crate::relation::{RelationFlags, RuleKind, TypeRelation};
use crate::types::{FunctionShape, ObjectRef, TypeData, TypeId};

impl<'a> TypeRelation<'a> {
    pub(crate) fn supertype(&mut self, sup: TypeId, sub: TypeId) -> bool {
        if sup == sub || sup == TypeId::ANY || sub == TypeId::NEVER {
            return true;
        }
        if sup.is_error() || sub.is_error() {
            return true;
        }
        if sub == TypeId::ANY {
            return false;
        }
        self.guarded((sup, sub, RuleKind::Supertype), |rel| {
            rel.supertype_data(sup, sub)
        })
    }

    fn supertype_data(&mut self, sup: TypeId, sub: TypeId) -> bool {
        let env = self.env;
        let (sup_data, sub_data) = (env.interner.get(sup), env.interner.get(sub));

        // Source-side decompositions first so `A | B ⊆ A | B | C` works.
        match &*sub_data {
            TypeData::Union(members) => {
                return members.iter().all(|&m| self.supertype(sup, m));
            }
            TypeData::TypeParameter(param) => {
                let constraint = env.type_param_constraint(*param);
                return union_contains(&sup_data, sub) || self.supertype(sup, constraint);
            }
            TypeData::NonNullish(inner) => {
                if *inner == sup {
                    return true;
                }
                let bound = match env.interner.type_param_id(*inner) {
                    Some(param) => env.type_param_constraint(param),
                    None => *inner,
                };
                let stripped = env.remove_nullish(bound, true, true);
                return union_contains(&sup_data, sub) || self.supertype(sup, stripped);
            }
            _ => {}
        }

        match (&*sup_data, &*sub_data) {
            (TypeData::Union(members), _) => members.iter().any(|&m| self.supertype(m, sub)),
            (_, TypeData::Literal(value)) => {
                !matches!(&*sup_data, TypeData::Literal(_))
                    && self.supertype(sup, value.base_type())
            }
            (TypeData::Object(target), _) if self.is_object_root(target) => {
                sub_data.is_reference() && !sub_data.is_nullish()
            }
            (TypeData::Object(target), TypeData::Object(_)) => self.object_supertype(target, sub),
            (TypeData::Array(sup_elem), TypeData::Array(sub_elem)) => {
                self.element_supertype(*sup_elem, *sub_elem)
            }
            (TypeData::Array(sup_elem), TypeData::Tuple(elems)) => {
                elems.iter().all(|&e| self.element_supertype(*sup_elem, e))
            }
            (TypeData::ResizableArray(x), TypeData::ResizableArray(y)) => self.identical(*x, *y),
            (TypeData::Tuple(xs), TypeData::Tuple(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(&x, &y)| self.identical(x, y))
            }
            (TypeData::Function(target), TypeData::Function(source)) => {
                self.function_supertype(target, source)
            }
            (TypeData::Readonly(x), TypeData::Readonly(y)) => self.supertype(*x, *y),
            (TypeData::Partial(x), TypeData::Partial(y)) => self.supertype(*x, *y),
            (TypeData::Partial(x), _) => self.supertype(*x, sub),
            _ => false,
        }
    }

    pub(crate) fn is_object_root(&self, obj: &ObjectRef) -> bool {
        obj.def == self.env.builtins.object
    }

    /// Nominal check: find `target.def` among the ancestors of `sub`, then
    /// compare arguments.
    fn object_supertype(&mut self, target: &ObjectRef, sub: TypeId) -> bool {
        let Some(ancestor) = self.env.find_ancestor(sub, target.def) else {
            return false;
        };
        let Some(found) = self.env.interner.object_ref(ancestor) else {
            return false;
        };
        if found.args.len() != target.args.len() {
            return false;
        }
        let covariant = self.flags.contains(RelationFlags::DIRECT_RETURN);
        target.args.iter().zip(&found.args).all(|(&t, &s)| {
            if covariant {
                self.supertype(t, s)
            } else {
                self.identical(t, s)
            }
        })
    }

    /// Covariant for reference elements, invariant for value elements.
    fn element_supertype(&mut self, sup: TypeId, sub: TypeId) -> bool {
        let both_reference = self.env.interner.get(sup).is_reference()
            && self.env.interner.get(sub).is_reference();
        if both_reference {
            self.supertype(sup, sub)
        } else {
            self.identical(sup, sub)
        }
    }

    /// `target ⊇ source` for function types: `source` must accept every
    /// call `target` accepts.
    fn function_supertype(&mut self, target: &FunctionShape, source: &FunctionShape) -> bool {
        if source.min_arg_count() > target.params.len() && target.rest.is_none() {
            return false;
        }
        for (i, target_param) in target.params.iter().enumerate() {
            let source_param = match source.params.get(i) {
                Some(p) => p.type_id,
                None => match source.rest {
                    Some(rest) => rest,
                    None => continue,
                },
            };
            if !self.supertype(source_param, target_param.type_id) {
                return false;
            }
        }
        match (target.rest, source.rest) {
            (Some(target_rest), Some(source_rest)) => {
                if !self.supertype(source_rest, target_rest) {
                    return false;
                }
            }
            (Some(_), None) => return false,
            _ => {}
        }
        target.return_type == TypeId::VOID || self.supertype(target.return_type, source.return_type)
    }
}

/// `sup` is a union listing `sub` itself (e.g. `T ⊆ T | null`).
fn union_contains(sup: &TypeData, sub: TypeId) -> bool {
    matches!(sup, TypeData::Union(members) if members.contains(&sub))
}
