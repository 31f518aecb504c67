//! Structural type identity.
//!
//! Interning already makes structurally equal types share a handle, so most
//! identity checks are a handle comparison. The structural walk exists for
//! unions, which are identical as sets regardless of member order, and for
//! composite types containing such unions.

use crate::relation::{RuleKind, TypeRelation};
use crate::types::{FunctionShape, TypeData, TypeId};

impl<'a> TypeRelation<'a> {
    pub(crate) fn identical(&mut self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        self.guarded((a, b, RuleKind::Identity), |rel| rel.identical_data(a, b))
    }

    fn identical_data(&mut self, a: TypeId, b: TypeId) -> bool {
        let interner = &self.env.interner;
        let (da, db) = (interner.get(a), interner.get(b));
        match (&*da, &*db) {
            (TypeData::Union(xs), TypeData::Union(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().all(|&x| ys.iter().any(|&y| self.identical(x, y)))
                    && ys.iter().all(|&y| xs.iter().any(|&x| self.identical(x, y)))
            }
            (TypeData::Object(x), TypeData::Object(y)) => {
                x.def == y.def && self.identical_lists(&x.args, &y.args)
            }
            (TypeData::Tuple(xs), TypeData::Tuple(ys)) => self.identical_lists(xs, ys),
            (TypeData::Array(x), TypeData::Array(y))
            | (TypeData::ResizableArray(x), TypeData::ResizableArray(y))
            | (TypeData::Readonly(x), TypeData::Readonly(y))
            | (TypeData::Partial(x), TypeData::Partial(y))
            | (TypeData::NonNullish(x), TypeData::NonNullish(y)) => self.identical(*x, *y),
            (TypeData::Function(x), TypeData::Function(y)) => self.identical_functions(x, y),
            // Type parameters are identical only by declaration, and every
            // other variant is fully captured by its interned handle.
            _ => false,
        }
    }

    fn identical_lists(&mut self, xs: &[TypeId], ys: &[TypeId]) -> bool {
        xs.len() == ys.len() && xs.iter().zip(ys).all(|(&x, &y)| self.identical(x, y))
    }

    /// Parameter names do not participate.
    fn identical_functions(&mut self, x: &FunctionShape, y: &FunctionShape) -> bool {
        if x.params.len() != y.params.len() {
            return false;
        }
        let params_match = x
            .params
            .iter()
            .zip(&y.params)
            .all(|(p, q)| p.optional == q.optional && self.identical(p.type_id, q.type_id));
        let rest_match = match (x.rest, y.rest) {
            (None, None) => true,
            (Some(r), Some(s)) => self.identical(r, s),
            _ => false,
        };
        params_match && rest_match && self.identical(x.return_type, y.return_type)
    }
}
