//! Rendering types and signatures for diagnostics.

use kestrel_common::Atom;
use std::sync::Arc;

use crate::env::TypeEnvironment;
use crate::signature::Signature;
use crate::types::{FunctionShape, LiteralValue, TypeData, TypeId};

pub struct TypeFormatter<'a> {
    env: &'a TypeEnvironment,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(env: &'a TypeEnvironment) -> Self {
        TypeFormatter { env }
    }

    pub fn atom(&self, atom: Atom) -> Arc<str> {
        self.env.interner.resolve_atom(atom)
    }

    pub fn format(&mut self, ty: TypeId) -> String {
        let data = self.env.interner.get(ty);
        match &*data {
            TypeData::Error => "error".to_string(),
            TypeData::Any => "any".to_string(),
            TypeData::Null => "null".to_string(),
            TypeData::Undefined => "undefined".to_string(),
            TypeData::Void => "void".to_string(),
            TypeData::Never => "never".to_string(),
            TypeData::Primitive(kind) => kind.name().to_string(),
            TypeData::String => "string".to_string(),
            TypeData::Literal(value) => self.literal(value),
            TypeData::Object(obj) => {
                let name = self
                    .env
                    .defs
                    .get_name(obj.def)
                    .map(|n| self.atom(n).to_string())
                    .unwrap_or_else(|| "<anonymous>".to_string());
                if obj.args.is_empty() {
                    name
                } else {
                    format!("{name}<{}>", self.list(&obj.args, ", "))
                }
            }
            TypeData::Array(elem) => {
                let inner = self.format(*elem);
                if self.env.interner.is_union(*elem) || self.is_function(*elem) {
                    format!("({inner})[]")
                } else {
                    format!("{inner}[]")
                }
            }
            TypeData::ResizableArray(elem) => format!("Array<{}>", self.format(*elem)),
            TypeData::Tuple(elems) => format!("[{}]", self.list(elems, ", ")),
            TypeData::Union(members) => self.list(members, " | "),
            TypeData::Function(shape) => self.function(shape),
            TypeData::TypeParameter(param) => {
                self.atom(self.env.type_param_name(*param)).to_string()
            }
            TypeData::Readonly(inner) => format!("readonly {}", self.format(*inner)),
            TypeData::Partial(inner) => format!("Partial<{}>", self.format(*inner)),
            TypeData::NonNullish(inner) => format!("{}!", self.format(*inner)),
        }
    }

    /// `name(a: int, b?: string, ...rest: long[]): void`
    pub fn signature(&mut self, sig: &Signature) -> String {
        let mut out = self.atom(sig.name).to_string();
        if !sig.type_params.is_empty() {
            let names: Vec<String> = sig
                .type_params
                .iter()
                .map(|&p| self.atom(self.env.type_param_name(p)).to_string())
                .collect();
            out.push('<');
            out.push_str(&names.join(", "));
            out.push('>');
        }
        let mut params: Vec<String> = sig
            .params
            .iter()
            .map(|p| self.param(p.name, p.optional, p.type_id))
            .collect();
        if let Some(rest) = sig.rest {
            params.push(format!(
                "...{}: {}[]",
                self.atom(rest.name),
                self.format(rest.type_id)
            ));
        }
        out.push('(');
        out.push_str(&params.join(", "));
        out.push_str("): ");
        out.push_str(&self.format(sig.return_type));
        out
    }

    fn function(&mut self, shape: &FunctionShape) -> String {
        let mut params: Vec<String> = shape
            .params
            .iter()
            .map(|p| self.param(p.name, p.optional, p.type_id))
            .collect();
        if let Some(rest) = shape.rest {
            params.push(format!("...rest: {}[]", self.format(rest)));
        }
        format!("({}) => {}", params.join(", "), self.format(shape.return_type))
    }

    fn param(&mut self, name: Atom, optional: bool, ty: TypeId) -> String {
        let name = if name.is_none() {
            "_".to_string()
        } else {
            self.atom(name).to_string()
        };
        let marker = if optional { "?" } else { "" };
        format!("{name}{marker}: {}", self.format(ty))
    }

    fn list(&mut self, types: &[TypeId], separator: &str) -> String {
        let parts: Vec<String> = types.iter().map(|&t| self.format(t)).collect();
        parts.join(separator)
    }

    fn literal(&self, value: &LiteralValue) -> String {
        match *value {
            LiteralValue::Integer { value, .. } => value.to_string(),
            LiteralValue::Float { value, .. } => value.0.to_string(),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Char(c) => match char::from_u32(u32::from(c)) {
                Some(ch) => format!("'{ch}'"),
                None => format!("'\\u{c:04x}'"),
            },
            LiteralValue::String(atom) => format!("\"{}\"", self.atom(atom)),
        }
    }

    fn is_function(&self, ty: TypeId) -> bool {
        matches!(&*self.env.interner.get(ty), TypeData::Function(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParamInfo, PrimitiveKind};

    #[test]
    fn test_format_primitives_and_unions() {
        let env = TypeEnvironment::new();
        let mut fmt = TypeFormatter::new(&env);
        let u = env.interner.union([TypeId::INT, TypeId::STRING, TypeId::NULL]);
        assert_eq!(fmt.format(u), "int | string | null");
        assert_eq!(fmt.format(env.boxed_type(PrimitiveKind::Int)), "Int");
    }

    #[test]
    fn test_format_arrays_and_functions() {
        let env = TypeEnvironment::new();
        let mut fmt = TypeFormatter::new(&env);
        let u = env.interner.union([TypeId::INT, TypeId::STRING]);
        assert_eq!(fmt.format(env.interner.array(u)), "(int | string)[]");
        assert_eq!(fmt.format(env.interner.resizable_array(TypeId::LONG)), "Array<long>");

        let shape = FunctionShape::new(
            vec![ParamInfo::optional(env.intern_string("x"), TypeId::INT)],
            TypeId::VOID,
        );
        assert_eq!(fmt.format(env.interner.function(shape)), "(x?: int) => void");
    }

    #[test]
    fn test_format_literals() {
        let env = TypeEnvironment::new();
        let mut fmt = TypeFormatter::new(&env);
        assert_eq!(fmt.format(env.interner.literal_int(42)), "42");
        assert_eq!(fmt.format(env.interner.literal_string("hi")), "\"hi\"");
        assert_eq!(fmt.format(env.interner.literal_bool(true)), "true");
    }
}
