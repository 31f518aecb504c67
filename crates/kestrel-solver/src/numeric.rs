//! Numeric conversion tables.
//!
//! - Widening: `byte -> short -> int -> long -> float -> double`, and
//!   `char -> int` (and everything `int` widens to).
//! - Constant narrowing: an integer constant may be assigned to a narrower
//!   integral type when its exact value is in range; checked on `i64`, never
//!   through floating point.
//! - Legal boxed-primitive conversions: a boxed value unboxes to its own
//!   primitive, optionally followed by a widening. Unboxing across unrelated
//!   numeric kinds (`Double` to `int`) needs an explicit cast.

use serde::Serialize;

use crate::types::{LiteralValue, PrimitiveKind};

/// A conversion the backend must materialize at a relation site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Conversion {
    Box(PrimitiveKind),
    Unbox(PrimitiveKind),
    Widen {
        from: PrimitiveKind,
        to: PrimitiveKind,
    },
    Narrow {
        from: PrimitiveKind,
        to: PrimitiveKind,
    },
}

fn rank(kind: PrimitiveKind) -> Option<u8> {
    match kind {
        PrimitiveKind::Byte => Some(0),
        PrimitiveKind::Short => Some(1),
        PrimitiveKind::Int => Some(2),
        PrimitiveKind::Long => Some(3),
        PrimitiveKind::Float => Some(4),
        PrimitiveKind::Double => Some(5),
        PrimitiveKind::Char | PrimitiveKind::Boolean => None,
    }
}

/// Whether `from` implicitly widens to `to` (strictly; identity is not widening).
pub fn widens_to(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    if from == to {
        return false;
    }
    if from == PrimitiveKind::Char {
        return rank(to).is_some_and(|r| r >= 2);
    }
    match (rank(from), rank(to)) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}

/// Whether an integer constant fits `kind` exactly.
pub fn integer_fits(value: i64, kind: PrimitiveKind) -> bool {
    match kind {
        PrimitiveKind::Byte => i8::try_from(value).is_ok(),
        PrimitiveKind::Short => i16::try_from(value).is_ok(),
        PrimitiveKind::Char => u16::try_from(value).is_ok(),
        PrimitiveKind::Int => i32::try_from(value).is_ok(),
        PrimitiveKind::Long => true,
        PrimitiveKind::Float | PrimitiveKind::Double => true,
        PrimitiveKind::Boolean => false,
    }
}

/// Whether the constant `value` may be assigned to `target` without a cast,
/// and which conversion that needs (`None` for no conversion).
pub fn constant_conversion(
    value: &LiteralValue,
    target: PrimitiveKind,
) -> Option<Option<Conversion>> {
    match *value {
        LiteralValue::Integer { kind, value } => {
            if kind == target {
                return Some(None);
            }
            if widens_to(kind, target) {
                return Some(Some(Conversion::Widen { from: kind, to: target }));
            }
            if target.is_integral() && integer_fits(value, target) {
                return Some(Some(Conversion::Narrow { from: kind, to: target }));
            }
            None
        }
        LiteralValue::Float { kind, value } => {
            if kind == target {
                return Some(None);
            }
            if widens_to(kind, target) {
                return Some(Some(Conversion::Widen { from: kind, to: target }));
            }
            let v = value.0;
            if target == PrimitiveKind::Float && (!v.is_finite() || v.abs() <= f64::from(f32::MAX)) {
                return Some(Some(Conversion::Narrow { from: kind, to: target }));
            }
            None
        }
        LiteralValue::Char(c) => {
            if target == PrimitiveKind::Char {
                return Some(None);
            }
            if widens_to(PrimitiveKind::Char, target) {
                return Some(Some(Conversion::Widen {
                    from: PrimitiveKind::Char,
                    to: target,
                }));
            }
            if target.is_integral() && integer_fits(i64::from(c), target) {
                return Some(Some(Conversion::Narrow {
                    from: PrimitiveKind::Char,
                    to: target,
                }));
            }
            None
        }
        LiteralValue::Boolean(_) => (target == PrimitiveKind::Boolean).then_some(None),
        LiteralValue::String(_) => None,
    }
}

/// Whether a boxed `boxed` value may be unboxed and assigned to `target`.
pub fn legal_unboxing(boxed: PrimitiveKind, target: PrimitiveKind) -> bool {
    boxed == target || widens_to(boxed, target)
}

/// Explicit numeric cast between two primitives.
pub fn numeric_cast(from: PrimitiveKind, to: PrimitiveKind) -> Option<Conversion> {
    if !from.is_numeric() || !to.is_numeric() || from == to {
        return None;
    }
    if widens_to(from, to) {
        Some(Conversion::Widen { from, to })
    } else {
        Some(Conversion::Narrow { from, to })
    }
}
