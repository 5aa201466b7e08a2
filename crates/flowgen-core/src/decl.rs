//! Class-level declarations: the entry points of a graph.
//!
//! A graph always describes one generated class. Its [`ClassDecl`] lists the
//! variables, functions, properties, constructors and event roots the class
//! declares; functions, accessors, constructors and events each name the
//! node their body starts from.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{DeclId, NodeId};
use crate::literal::Literal;
use crate::member::ParamModifier;
use crate::types::{Modifiers, TypeRef};

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// An attribute applied to a declaration, e.g. `[SerializeField]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Literal>,
}

/// A class variable or a function local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub id: DeclId,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Literal>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifier: ParamModifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Literal>,
}

impl ParamDecl {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        ParamDecl {
            name: name.to_string(),
            ty,
            modifier: ParamModifier::None,
            default: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub id: DeclId,
    pub name: String,
    #[serde(default = "void")]
    pub return_type: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locals: Vec<VariableDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDecl>,
}

/// A property. Without getter or setter bodies it is emitted as an
/// auto-property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub id: DeclId,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getter: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDecl>,
}

impl PropertyDecl {
    pub fn is_auto(&self) -> bool {
        self.getter.is_none() && self.setter.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub id: DeclId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDecl>,
    #[serde(default = "Modifiers::public")]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<NodeId>,
}

/// A host-invoked method such as `Start` or `Update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDecl {
    pub id: DeclId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<NodeId>,
}

fn void() -> TypeRef {
    TypeRef::Void
}

// ---------------------------------------------------------------------------
// Class
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usings: Vec<String>,
    #[serde(default = "Modifiers::public")]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDecl>,
    #[serde(default)]
    pub variables: Vec<VariableDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub events: Vec<EventDecl>,
}

/// What kind of body an entry point starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Function,
    Getter,
    Setter,
    Constructor,
    Event,
}

/// A body start: the declaration owning it and its first node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryPoint {
    pub owner: DeclId,
    pub kind: EntryKind,
    pub node: NodeId,
}

/// Any declaration found by id.
#[derive(Debug, Clone, Copy)]
pub enum DeclRef<'a> {
    Variable(&'a VariableDecl),
    Local(&'a FunctionDecl, &'a VariableDecl),
    Function(&'a FunctionDecl),
    Property(&'a PropertyDecl),
    Constructor(&'a ConstructorDecl),
    Event(&'a EventDecl),
}

impl DeclRef<'_> {
    pub fn name(&self) -> &str {
        match self {
            DeclRef::Variable(v) | DeclRef::Local(_, v) => &v.name,
            DeclRef::Function(f) => &f.name,
            DeclRef::Property(p) => &p.name,
            DeclRef::Constructor(_) => ".ctor",
            DeclRef::Event(e) => &e.name,
        }
    }

    /// Parameters of a callable declaration.
    pub fn params(&self) -> &[ParamDecl] {
        match self {
            DeclRef::Function(f) => &f.params,
            DeclRef::Constructor(c) => &c.params,
            DeclRef::Event(e) => &e.params,
            _ => &[],
        }
    }
}

impl ClassDecl {
    pub fn new(name: &str) -> Self {
        ClassDecl {
            name: name.to_string(),
            namespace: None,
            usings: Vec::new(),
            modifiers: Modifiers::public(),
            base: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            variables: Vec::new(),
            functions: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Every body entry in declaration order: functions, property accessors,
    /// constructors, then events.
    pub fn entry_points(&self) -> Vec<EntryPoint> {
        let mut out = Vec::new();
        for f in &self.functions {
            if let Some(node) = f.entry {
                out.push(EntryPoint { owner: f.id, kind: EntryKind::Function, node });
            }
        }
        for p in &self.properties {
            if let Some(node) = p.getter {
                out.push(EntryPoint { owner: p.id, kind: EntryKind::Getter, node });
            }
            if let Some(node) = p.setter {
                out.push(EntryPoint { owner: p.id, kind: EntryKind::Setter, node });
            }
        }
        for c in &self.constructors {
            if let Some(node) = c.entry {
                out.push(EntryPoint { owner: c.id, kind: EntryKind::Constructor, node });
            }
        }
        for e in &self.events {
            if let Some(node) = e.entry {
                out.push(EntryPoint { owner: e.id, kind: EntryKind::Event, node });
            }
        }
        out
    }

    /// Looks up any declaration, including function locals.
    pub fn find(&self, id: DeclId) -> Option<DeclRef<'_>> {
        if let Some(v) = self.variables.iter().find(|v| v.id == id) {
            return Some(DeclRef::Variable(v));
        }
        for f in &self.functions {
            if f.id == id {
                return Some(DeclRef::Function(f));
            }
            if let Some(v) = f.locals.iter().find(|v| v.id == id) {
                return Some(DeclRef::Local(f, v));
            }
        }
        if let Some(p) = self.properties.iter().find(|p| p.id == id) {
            return Some(DeclRef::Property(p));
        }
        if let Some(c) = self.constructors.iter().find(|c| c.id == id) {
            return Some(DeclRef::Constructor(c));
        }
        self.events.iter().find(|e| e.id == id).map(DeclRef::Event)
    }

    /// Like [`ClassDecl::find`] but fails with [`CoreError::DeclNotFound`].
    pub fn get(&self, id: DeclId) -> Result<DeclRef<'_>, CoreError> {
        self.find(id).ok_or(CoreError::DeclNotFound { id })
    }

    /// Every declaration id in the class is unique.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        let ids = self
            .variables
            .iter()
            .map(|v| v.id)
            .chain(self.functions.iter().flat_map(|f| {
                std::iter::once(f.id).chain(f.locals.iter().map(|l| l.id))
            }))
            .chain(self.properties.iter().map(|p| p.id))
            .chain(self.constructors.iter().map(|c| c.id))
            .chain(self.events.iter().map(|e| e.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(CoreError::DuplicateDecl { id });
            }
        }
        Ok(())
    }
}
