//! Type representation.
//!
//! Types are hash-consed by [`TypeInterner`](crate::TypeInterner): the same
//! `TypeData` always maps to the same `TypeId`, so handle equality is type
//! identity for everything except unions, which compare as sets.
//!
//! Type parameters are represented by their declaration handle only. Their
//! constraint and default live in the [`DefinitionStore`](crate::DefinitionStore),
//! which lets a parameter's constraint mention the parameter itself
//! (`T extends Comparable<T>`) without a cycle in the interned data.

use kestrel_common::{Atom, limits};
use serde::Serialize;
use smallvec::SmallVec;

use crate::def::DefId;

/// Handle to an interned type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Sentinel for expressions whose type could not be determined.
    pub const ERROR: TypeId = TypeId(0);
    pub const ANY: TypeId = TypeId(1);
    pub const NULL: TypeId = TypeId(2);
    pub const UNDEFINED: TypeId = TypeId(3);
    pub const VOID: TypeId = TypeId(4);
    pub const NEVER: TypeId = TypeId(5);
    pub const BOOLEAN: TypeId = TypeId(6);
    pub const BYTE: TypeId = TypeId(7);
    pub const CHAR: TypeId = TypeId(8);
    pub const SHORT: TypeId = TypeId(9);
    pub const INT: TypeId = TypeId(10);
    pub const LONG: TypeId = TypeId(11);
    pub const FLOAT: TypeId = TypeId(12);
    pub const DOUBLE: TypeId = TypeId(13);
    pub const STRING: TypeId = TypeId(14);

    /// First handle handed out for non-reserved types.
    pub const FIRST_DYNAMIC: u32 = 15;

    #[inline]
    pub fn is_error(self) -> bool {
        self == TypeId::ERROR
    }

    #[inline]
    pub fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }

    /// Reserved handle for a primitive kind.
    pub const fn primitive(kind: PrimitiveKind) -> TypeId {
        match kind {
            PrimitiveKind::Boolean => TypeId::BOOLEAN,
            PrimitiveKind::Byte => TypeId::BYTE,
            PrimitiveKind::Char => TypeId::CHAR,
            PrimitiveKind::Short => TypeId::SHORT,
            PrimitiveKind::Int => TypeId::INT,
            PrimitiveKind::Long => TypeId::LONG,
            PrimitiveKind::Float => TypeId::FLOAT,
            PrimitiveKind::Double => TypeId::DOUBLE,
        }
    }
}

/// Value-typed primitive kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Char
                | PrimitiveKind::Short
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    /// Source-level spelling.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Name of the boxed class.
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Int => "Int",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        }
    }
}

/// Wrapper for `f64` that is `Eq + Hash` by bit pattern, so float literals
/// can be interned.
#[derive(Clone, Copy, Debug)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Payload of a constant-marked (literal) type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    /// Integer constant. `kind` is the type the literal would have without
    /// narrowing (`int`, or `long` when out of `int` range).
    Integer { kind: PrimitiveKind, value: i64 },
    Float { kind: PrimitiveKind, value: OrderedFloat },
    Boolean(bool),
    Char(u16),
    String(Atom),
}

impl LiteralValue {
    /// The non-constant type this literal belongs to.
    pub fn base_type(&self) -> TypeId {
        match *self {
            LiteralValue::Integer { kind, .. } | LiteralValue::Float { kind, .. } => {
                TypeId::primitive(kind)
            }
            LiteralValue::Boolean(_) => TypeId::BOOLEAN,
            LiteralValue::Char(_) => TypeId::CHAR,
            LiteralValue::String(_) => TypeId::STRING,
        }
    }
}

pub type TypeList = SmallVec<[TypeId; limits::TYPE_LIST_INLINE]>;

/// A class or interface instance with its type arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub def: DefId,
    pub args: TypeList,
}

/// One parameter of a function type or signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub name: Atom,
    pub type_id: TypeId,
    pub optional: bool,
}

impl ParamInfo {
    pub fn required(name: Atom, type_id: TypeId) -> Self {
        ParamInfo {
            name,
            type_id,
            optional: false,
        }
    }

    pub fn optional(name: Atom, type_id: TypeId) -> Self {
        ParamInfo {
            name,
            type_id,
            optional: true,
        }
    }
}

/// Structural function type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub params: Vec<ParamInfo>,
    /// Element type of the rest parameter, if any.
    pub rest: Option<TypeId>,
    pub return_type: TypeId,
}

impl FunctionShape {
    pub fn new(params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        FunctionShape {
            params,
            rest: None,
            return_type,
        }
    }

    pub fn min_arg_count(&self) -> usize {
        self.params.iter().take_while(|p| !p.optional).count()
    }
}

/// Declaration handle of a type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParamId(pub u32);

/// The closed set of type variants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Error,
    Any,
    Null,
    Undefined,
    Void,
    Never,
    Primitive(PrimitiveKind),
    String,
    Literal(LiteralValue),
    Object(ObjectRef),
    Array(TypeId),
    ResizableArray(TypeId),
    Tuple(TypeList),
    /// Flattened, de-duplicated, insertion-ordered members. Never fewer than two.
    Union(TypeList),
    Function(FunctionShape),
    TypeParameter(TypeParamId),
    Readonly(TypeId),
    Partial(TypeId),
    NonNullish(TypeId),
}

impl TypeData {
    pub fn is_nullish(&self) -> bool {
        matches!(self, TypeData::Null | TypeData::Undefined)
    }

    /// Reference types may be stored in a substitution and are subtypes of
    /// `Object` (or of `Object | null | undefined` for the nullish ones).
    pub fn is_reference(&self) -> bool {
        !matches!(
            self,
            TypeData::Primitive(_)
                | TypeData::Void
                | TypeData::Never
                | TypeData::Error
                | TypeData::Literal(
                    LiteralValue::Integer { .. }
                        | LiteralValue::Float { .. }
                        | LiteralValue::Boolean(_)
                        | LiteralValue::Char(_)
                )
        )
    }
}
