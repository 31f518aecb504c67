//! Call signatures.
//!
//! A `Signature` is one call shape of a (possibly overloaded) callable.
//! Stored signatures are immutable; the resolver derives temporary copies
//! (receiver inserted, type parameters substituted) and never writes back.

use bitflags::bitflags;
use kestrel_common::Atom;

use crate::def::{DefId, Visibility};
use crate::types::{FunctionShape, ParamInfo, TypeId, TypeParamId};

/// Handle to a signature registered in the definition store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureId(pub u32);

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SignatureFlags: u16 {
        const STATIC      = 1 << 0;
        const PUBLIC      = 1 << 1;
        const PRIVATE     = 1 << 2;
        const PROTECTED   = 1 << 3;
        const CONSTRUCTOR = 1 << 4;
        /// First parameter is the receiver.
        const EXTENSION   = 1 << 5;
        const GETTER      = 1 << 6;
        const SETTER      = 1 << 7;
        const ABSTRACT    = 1 << 8;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: Atom,
    pub type_params: Vec<TypeParamId>,
    pub params: Vec<ParamInfo>,
    /// Rest parameter: name and element type.
    pub rest: Option<ParamInfo>,
    pub min_arg_count: usize,
    pub return_type: TypeId,
    pub flags: SignatureFlags,
    pub owner: Option<DefId>,
}

impl Signature {
    /// A public free-standing signature. `min_arg_count` is derived from the
    /// leading non-optional parameters.
    pub fn new(name: Atom, params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        let min_arg_count = params.iter().take_while(|p| !p.optional).count();
        Signature {
            name,
            type_params: Vec::new(),
            params,
            rest: None,
            min_arg_count,
            return_type,
            flags: SignatureFlags::PUBLIC,
            owner: None,
        }
    }

    pub fn with_type_params(mut self, type_params: Vec<TypeParamId>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn with_rest(mut self, rest: ParamInfo) -> Self {
        self.rest = Some(rest);
        self
    }

    pub fn with_flags(mut self, flags: SignatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_owner(mut self, owner: DefId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn is_extension(&self) -> bool {
        self.flags.contains(SignatureFlags::EXTENSION)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(SignatureFlags::STATIC)
    }

    pub fn visibility(&self) -> Visibility {
        if self.flags.contains(SignatureFlags::PRIVATE) {
            Visibility::Private
        } else if self.flags.contains(SignatureFlags::PROTECTED) {
            Visibility::Protected
        } else {
            Visibility::Public
        }
    }

    /// Whether `count` arguments fit this signature's arity.
    pub fn accepts_arg_count(&self, count: usize) -> bool {
        count >= self.min_arg_count && (self.rest.is_some() || count <= self.params.len())
    }

    /// Declared type of the parameter receiving argument `index`, including
    /// the rest element type for trailing arguments.
    pub fn param_type_at(&self, index: usize) -> Option<TypeId> {
        match self.params.get(index) {
            Some(param) => Some(param.type_id),
            None => self.rest.map(|r| r.type_id),
        }
    }

    /// Copy with `receiver` prepended as parameter zero.
    pub fn with_receiver(&self, receiver: ParamInfo) -> Signature {
        let mut copy = self.clone();
        copy.params.insert(0, receiver);
        copy.min_arg_count += 1;
        copy
    }

    /// Copy with parameter zero removed. Used to present an extension
    /// function as a member of its receiver type.
    pub fn without_receiver(&self) -> Signature {
        let mut copy = self.clone();
        if !copy.params.is_empty() {
            copy.params.remove(0);
            copy.min_arg_count = copy.min_arg_count.saturating_sub(1);
        }
        copy
    }

    /// Function type with the same call shape.
    pub fn to_function_shape(&self) -> FunctionShape {
        FunctionShape {
            params: self.params.clone(),
            rest: self.rest.map(|r| r.type_id),
            return_type: self.return_type,
        }
    }

    /// Signature view of a function type, used when calling a function-typed value.
    pub fn from_function_shape(name: Atom, shape: &FunctionShape) -> Signature {
        let mut sig = Signature::new(name, shape.params.clone(), shape.return_type);
        sig.rest = shape.rest.map(|r| ParamInfo::required(Atom::NONE, r));
        sig
    }
}
