//! Target-language type descriptors.
//!
//! A [`TypeRef`] names a type in the generated language: a primitive keyword,
//! a named host type (with namespace and generic arguments), an array, a
//! nullable value type, a generic parameter, or a type declared by a graph.
//! Rendering to text lives in the code generator, which consults its using
//! registry to decide between short and qualified names.

use serde::{Deserialize, Serialize};

/// Primitive types with a dedicated keyword in the target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Bool,
    Byte,
    SByte,
    Char,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Decimal,
    String,
    Object,
}

impl Primitive {
    /// The keyword used for this primitive in generated code.
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::SByte => "sbyte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::UShort => "ushort",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Long => "long",
            Primitive::ULong => "ulong",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Decimal => "decimal",
            Primitive::String => "string",
            Primitive::Object => "object",
        }
    }

    /// Returns `true` for integral and floating-point primitives.
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            Primitive::Bool | Primitive::Char | Primitive::String | Primitive::Object
        )
    }

    /// Returns `true` if values of this primitive are copied by value.
    pub fn is_value_type(self) -> bool {
        !matches!(self, Primitive::String | Primitive::Object)
    }
}

/// What kind of declaration a named type refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeKind {
    #[default]
    Class,
    Struct,
    Enum,
    Interface,
    Delegate,
}

/// A reference to a type in the target language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// No value (`void`).
    Void,
    /// A keyword primitive.
    Primitive(Primitive),
    /// A named host type such as `UnityEngine.Vector3` or
    /// `System.Collections.Generic.List<int>`. Nested types use `.` in `name`.
    Named {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        generics: Vec<TypeRef>,
        #[serde(default)]
        kind: TypeKind,
    },
    /// Single or multi-dimensional array.
    Array { element: Box<TypeRef>, rank: u8 },
    /// Nullable value type (`T?`).
    Nullable(Box<TypeRef>),
    /// A generic parameter of the enclosing method or type.
    GenericParam(String),
    /// A type declared by a graph in the same pass (never qualified).
    Generated(String),
}

impl TypeRef {
    pub const INT: TypeRef = TypeRef::Primitive(Primitive::Int);
    pub const FLOAT: TypeRef = TypeRef::Primitive(Primitive::Float);
    pub const BOOL: TypeRef = TypeRef::Primitive(Primitive::Bool);
    pub const STRING: TypeRef = TypeRef::Primitive(Primitive::String);
    pub const OBJECT: TypeRef = TypeRef::Primitive(Primitive::Object);

    /// A named reference type with no generic arguments.
    pub fn class(namespace: &str, name: &str) -> Self {
        TypeRef::Named {
            namespace: non_empty(namespace),
            name: name.to_string(),
            generics: Vec::new(),
            kind: TypeKind::Class,
        }
    }

    /// A named value type (struct) with no generic arguments.
    pub fn structure(namespace: &str, name: &str) -> Self {
        TypeRef::Named {
            namespace: non_empty(namespace),
            name: name.to_string(),
            generics: Vec::new(),
            kind: TypeKind::Struct,
        }
    }

    /// A named enum type.
    pub fn enumeration(namespace: &str, name: &str) -> Self {
        TypeRef::Named {
            namespace: non_empty(namespace),
            name: name.to_string(),
            generics: Vec::new(),
            kind: TypeKind::Enum,
        }
    }

    /// A named generic type instantiated with `generics`.
    pub fn generic(namespace: &str, name: &str, generics: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            namespace: non_empty(namespace),
            name: name.to_string(),
            generics,
            kind: TypeKind::Class,
        }
    }

    /// `System.Collections.Generic.List<element>`.
    pub fn list_of(element: TypeRef) -> Self {
        TypeRef::generic("System.Collections.Generic", "List", vec![element])
    }

    /// Single-dimensional array of `element`.
    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    /// The non-generic iterator type the coroutine dispatcher returns.
    pub fn enumerator() -> Self {
        TypeRef::Named {
            namespace: Some("System.Collections".to_string()),
            name: "IEnumerator".to_string(),
            generics: Vec::new(),
            kind: TypeKind::Interface,
        }
    }

    /// Returns `true` if values of this type are copied on assignment.
    ///
    /// Generic parameters are treated as reference types; assigning through a
    /// temporary is only forced when the type is known to be a value type.
    pub fn is_value_type(&self) -> bool {
        match self {
            TypeRef::Primitive(p) => p.is_value_type(),
            TypeRef::Named { kind, .. } => matches!(kind, TypeKind::Struct | TypeKind::Enum),
            TypeRef::Nullable(_) => true,
            TypeRef::Void
            | TypeRef::Array { .. }
            | TypeRef::GenericParam(_)
            | TypeRef::Generated(_) => false,
        }
    }

    /// Returns `true` for `void`.
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// The unqualified name of a named type, if this is one.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } | TypeRef::Generated(name) => Some(name),
            _ => None,
        }
    }

    /// The namespace of a named type, if any.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            TypeRef::Named { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Accessibility of a generated member or type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    #[default]
    Private,
    Protected,
    Internal,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
        }
    }
}

/// Declaration modifiers, rendered in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_sealed: bool,
    pub is_readonly: bool,
    pub is_const: bool,
    pub is_partial: bool,
}

impl Modifiers {
    pub fn public() -> Self {
        Modifiers {
            visibility: Visibility::Public,
            ..Modifiers::default()
        }
    }

    pub fn private() -> Self {
        Modifiers::default()
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Renders the modifier list followed by a trailing space, or an empty
    /// string when nothing is set beyond the default private visibility and
    /// `omit_private` is requested.
    pub fn render(&self, omit_private: bool) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !(omit_private && self.visibility == Visibility::Private) {
            parts.push(self.visibility.keyword());
        }
        if self.is_const {
            parts.push("const");
        } else if self.is_static {
            parts.push("static");
        }
        if self.is_abstract {
            parts.push("abstract");
        }
        if self.is_virtual {
            parts.push("virtual");
        }
        if self.is_override {
            parts.push("override");
        }
        if self.is_sealed {
            parts.push("sealed");
        }
        if self.is_readonly {
            parts.push("readonly");
        }
        if self.is_partial {
            parts.push("partial");
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("{} ", parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_classification() {
        assert!(TypeRef::INT.is_value_type());
        assert!(!TypeRef::STRING.is_value_type());
        assert!(TypeRef::structure("UnityEngine", "Vector3").is_value_type());
        assert!(TypeRef::enumeration("UnityEngine", "KeyCode").is_value_type());
        assert!(!TypeRef::class("UnityEngine", "Transform").is_value_type());
        assert!(!TypeRef::array_of(TypeRef::INT).is_value_type());
        assert!(TypeRef::Nullable(Box::new(TypeRef::INT)).is_value_type());
    }

    #[test]
    fn empty_namespace_is_none() {
        let ty = TypeRef::class("", "Local");
        assert_eq!(ty.namespace(), None);
        assert_eq!(ty.simple_name(), Some("Local"));
    }

    #[test]
    fn modifiers_render_in_fixed_order() {
        let m = Modifiers {
            visibility: Visibility::Public,
            is_static: true,
            is_readonly: true,
            ..Modifiers::default()
        };
        assert_eq!(m.render(false), "public static readonly ");
    }

    #[test]
    fn const_replaces_static() {
        let m = Modifiers {
            is_const: true,
            is_static: true,
            ..Modifiers::public()
        };
        assert_eq!(m.render(false), "public const ");
    }

    #[test]
    fn private_can_be_omitted() {
        assert_eq!(Modifiers::private().render(true), "");
        assert_eq!(Modifiers::private().render(false), "private ");
    }

    #[test]
    fn serde_roundtrip_named_type() {
        let ty = TypeRef::list_of(TypeRef::structure("UnityEngine", "Vector3"));
        let json = serde_json::to_string(&ty).unwrap();
        let back: TypeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(ty, back);
    }
}
