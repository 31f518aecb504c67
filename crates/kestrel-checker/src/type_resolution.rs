//! Type annotation resolution.
//!
//! Annotations arrive partly resolved. Generic references are instantiated
//! here, which is where constraint obligations enter the queue.

use kestrel_common::Atom;
use kestrel_solver::{
    FunctionShape, InstantiationError, ParamInfo, TypeId, instantiate_generic,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::ast::TypeNode;
use crate::state::CheckerState;

impl CheckerState<'_> {
    /// The type an annotation denotes. Failures are reported and resolve to
    /// `ERROR`.
    pub fn resolve_type_node(&mut self, node: &TypeNode) -> TypeId {
        self.resolve_type_node_at(node, 0)
    }

    fn resolve_type_node_at(&mut self, node: &TypeNode, depth: u32) -> TypeId {
        let env = self.ctx.env;
        match node {
            TypeNode::Resolved(ty) => *ty,
            TypeNode::Array(element) => {
                let element = self.resolve_type_node_at(element, depth);
                env.interner.array(element)
            }
            TypeNode::Union(members) => {
                let members: SmallVec<[TypeId; 4]> = members
                    .iter()
                    .map(|m| self.resolve_type_node_at(m, depth))
                    .collect();
                env.interner.union(members)
            }
            TypeNode::Function {
                params,
                return_type,
            } => {
                let params = params
                    .iter()
                    .map(|p| ParamInfo::required(Atom::NONE, self.resolve_type_node_at(p, depth)))
                    .collect();
                let return_type = self.resolve_type_node_at(return_type, depth);
                env.interner.function(FunctionShape::new(params, return_type))
            }
            TypeNode::Generic { def, args, span } => {
                if depth >= self.ctx.options.max_instantiation_depth {
                    self.report(InstantiationError::TooDeep.to_diagnostic(env), *span);
                    return TypeId::ERROR;
                }
                let args: SmallVec<[TypeId; 4]> = args
                    .iter()
                    .map(|a| self.resolve_type_node_at(a, depth + 1))
                    .collect();
                if args.iter().any(|a| a.is_error()) {
                    return TypeId::ERROR;
                }
                match instantiate_generic(env, *def, &args, *span, &mut self.ctx.obligations) {
                    Ok(ty) => {
                        trace!(def = def.0, ty = ty.0, "resolved generic annotation");
                        ty
                    }
                    Err(err) => {
                        self.report(err.to_diagnostic(env), *span);
                        TypeId::ERROR
                    }
                }
            }
        }
    }
}
