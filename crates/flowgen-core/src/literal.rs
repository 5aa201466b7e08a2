//! Constant literal values carried by member references and literal nodes.
//!
//! Like the integer/float split of primitive types, integer literals remember
//! which primitive they were authored as so the emitter can attach the right
//! numeric suffix. `Float` stores its value as `f64` so the enum keeps a
//! single floating representation; narrowing happens when text is emitted.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::types::{Primitive, TypeRef};

/// A constant value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Char(char),
    String(String),
    /// Signed integer authored as `ty` (`Int`, `Long`, `Short`, `SByte`).
    Integer { value: i64, ty: Primitive },
    /// Unsigned integer authored as `ty` (`UInt`, `ULong`, `UShort`, `Byte`).
    Unsigned { value: u64, ty: Primitive },
    /// Stored as f64 internally; emitted with an `f` suffix.
    Float(f64),
    Double(f64),
    /// Decimal literals keep their source text to avoid rounding.
    Decimal(String),
    /// A named enum member.
    Enum { ty: TypeRef, variant: String },
    /// A vector/colour-like struct built from numeric components, e.g.
    /// `Vector3(1, 0, 0)` or `Color(1, 0, 0, 1)`.
    Struct {
        ty: TypeRef,
        components: SmallVec<[f64; 4]>,
    },
    /// Array initializer.
    Array { element: TypeRef, items: Vec<Literal> },
    /// List initializer.
    List { element: TypeRef, items: Vec<Literal> },
    /// `default(T)`.
    Default(TypeRef),
}

impl Literal {
    pub fn int(value: i64) -> Self {
        Literal::Integer {
            value,
            ty: Primitive::Int,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Literal::String(value.into())
    }

    /// A struct literal built from components.
    pub fn structure(ty: TypeRef, components: &[f64]) -> Self {
        Literal::Struct {
            ty,
            components: SmallVec::from_slice(components),
        }
    }

    /// The type this literal evaluates to, when it can be determined
    /// without context (`null` has no type of its own).
    pub fn value_type(&self) -> Option<TypeRef> {
        match self {
            Literal::Null => None,
            Literal::Bool(_) => Some(TypeRef::Primitive(Primitive::Bool)),
            Literal::Char(_) => Some(TypeRef::Primitive(Primitive::Char)),
            Literal::String(_) => Some(TypeRef::Primitive(Primitive::String)),
            Literal::Integer { ty, .. } | Literal::Unsigned { ty, .. } => {
                Some(TypeRef::Primitive(*ty))
            }
            Literal::Float(_) => Some(TypeRef::Primitive(Primitive::Float)),
            Literal::Double(_) => Some(TypeRef::Primitive(Primitive::Double)),
            Literal::Decimal(_) => Some(TypeRef::Primitive(Primitive::Decimal)),
            Literal::Enum { ty, .. } | Literal::Struct { ty, .. } | Literal::Default(ty) => {
                Some(ty.clone())
            }
            Literal::Array { element, .. } => Some(TypeRef::array_of(element.clone())),
            Literal::List { element, .. } => Some(TypeRef::list_of(element.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_value_type_keeps_authored_primitive() {
        let lit = Literal::Integer {
            value: 5,
            ty: Primitive::Long,
        };
        assert_eq!(lit.value_type(), Some(TypeRef::Primitive(Primitive::Long)));
    }

    #[test]
    fn null_has_no_type() {
        assert_eq!(Literal::Null.value_type(), None);
    }

    #[test]
    fn list_type_wraps_element() {
        let lit = Literal::List {
            element: TypeRef::INT,
            items: vec![Literal::int(1)],
        };
        assert_eq!(lit.value_type(), Some(TypeRef::list_of(TypeRef::INT)));
    }

    #[test]
    fn struct_components_roundtrip() {
        let lit = Literal::structure(TypeRef::structure("UnityEngine", "Vector3"), &[1.0, 2.0, 3.0]);
        let json = serde_json::to_string(&lit).unwrap();
        let back: Literal = serde_json::from_str(&json).unwrap();
        assert_eq!(lit, back);
    }
}
