//! Symbol table: variables, methods, properties, constructors and bodies of
//! the type being generated.
//!
//! Registration is idempotent. A variable is keyed by its [`SymbolKey`]; a
//! method by its requested name and parameter list. Registering again with an
//! equal descriptor returns the existing handle, so the member is assembled
//! once no matter how many nodes asked for it.
//!
//! Variables start out unbound or local to one body. The first use from a
//! different body promotes them to an instance field; promotion is never
//! undone.

use std::collections::HashMap;

use flowgen_core::decl::AttributeDecl;
use flowgen_core::id::{DeclId, NodeId};
use flowgen_core::literal::Literal;
use flowgen_core::member::ParamModifier;
use flowgen_core::types::{Modifiers, TypeRef};

use crate::error::CodegenError;
use crate::markers::MarkerId;
use crate::names::NameRegistry;

// ---------------------------------------------------------------------------
// Keys and handles
// ---------------------------------------------------------------------------

/// Stable identity of a symbol's requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKey {
    Decl(DeclId),
    Node(NodeId),
    /// A parameter copied into a field.
    Param(DeclId, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyHandle(pub usize);

/// Identity of one emitted body (method, accessor, constructor, state unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Local whose body is decided by its first use.
    Unbound,
    Local(BodyId),
    Instance,
}

/// What a caller wants registered.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDesc {
    pub key: SymbolKey,
    pub base_name: String,
    pub ty: TypeRef,
    pub storage: Storage,
    pub default: Option<Literal>,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    pub marker: Option<MarkerId>,
}

impl VariableDesc {
    pub fn local(key: SymbolKey, base_name: &str, ty: TypeRef) -> Self {
        VariableDesc {
            key,
            base_name: base_name.to_string(),
            ty,
            storage: Storage::Unbound,
            default: None,
            modifiers: Modifiers::private(),
            attributes: Vec::new(),
            marker: None,
        }
    }

    pub fn field(key: SymbolKey, base_name: &str, ty: TypeRef) -> Self {
        VariableDesc {
            storage: Storage::Instance,
            ..VariableDesc::local(key, base_name, ty)
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub key: SymbolKey,
    pub name: String,
    pub ty: TypeRef,
    pub storage: Storage,
    pub default: Option<Literal>,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    pub marker: Option<MarkerId>,
    /// Declared by the class rather than synthesized by the generator.
    pub declared: bool,
}

// ---------------------------------------------------------------------------
// Methods, properties, constructors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSymbol {
    pub name: String,
    pub ty: TypeRef,
    pub modifier: ParamModifier,
    pub default: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDesc {
    pub key: Option<SymbolKey>,
    pub base_name: String,
    pub return_type: TypeRef,
    pub params: Vec<ParamSymbol>,
    pub generic_params: Vec<String>,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    pub marker: Option<MarkerId>,
}

impl MethodDesc {
    pub fn new(base_name: &str, return_type: TypeRef) -> Self {
        MethodDesc {
            key: None,
            base_name: base_name.to_string(),
            return_type,
            params: Vec::new(),
            generic_params: Vec::new(),
            modifiers: Modifiers::private(),
            attributes: Vec::new(),
            marker: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub name: String,
    pub return_type: TypeRef,
    pub params: Vec<ParamSymbol>,
    pub generic_params: Vec<String>,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    pub marker: Option<MarkerId>,
    pub body: BodyId,
}

#[derive(Debug, Clone)]
pub struct PropertySymbol {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    pub marker: Option<MarkerId>,
    pub getter: Option<BodyId>,
    pub setter: Option<BodyId>,
}

#[derive(Debug, Clone)]
pub struct ConstructorSymbol {
    pub params: Vec<ParamSymbol>,
    pub modifiers: Modifiers,
    pub marker: Option<MarkerId>,
    pub body: BodyId,
}

/// Code added to a body independently of its main text. Negative priorities
/// run before the body text, the rest after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub priority: i32,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Body {
    pub text: Option<String>,
    pub contributions: Vec<Contribution>,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

type MethodSignature = (String, Vec<(TypeRef, ParamModifier)>);

#[derive(Debug, Default)]
pub struct SymbolTable {
    variables: Vec<VariableSymbol>,
    var_keys: HashMap<SymbolKey, VarHandle>,
    methods: Vec<MethodSymbol>,
    method_sigs: HashMap<MethodSignature, MethodHandle>,
    method_keys: HashMap<SymbolKey, MethodHandle>,
    method_names: HashMap<String, String>,
    properties: Vec<PropertySymbol>,
    property_keys: HashMap<DeclId, PropertyHandle>,
    constructors: Vec<ConstructorSymbol>,
    bodies: Vec<Body>,
    decl_names: HashMap<DeclId, String>,
    decl_bodies: HashMap<DeclId, BodyId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    // -- Bodies --

    pub fn new_body(&mut self) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(Body::default());
        id
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0 as usize)
    }

    pub fn set_body_text(&mut self, id: BodyId, text: String) {
        if let Some(body) = self.bodies.get_mut(id.0 as usize) {
            body.text = Some(text);
        }
    }

    /// Adds `text` to a body. Identical contributions are kept once.
    pub fn contribute(&mut self, id: BodyId, priority: i32, text: String) {
        if let Some(body) = self.bodies.get_mut(id.0 as usize) {
            let contribution = Contribution { priority, text };
            if !body.contributions.contains(&contribution) {
                body.contributions.push(contribution);
            }
        }
    }

    pub fn decl_body(&self, decl: DeclId) -> Option<BodyId> {
        self.decl_bodies.get(&decl).copied()
    }

    /// Emitted name of a declared variable, method or property.
    pub fn decl_name(&self, decl: DeclId) -> Option<&str> {
        self.decl_names.get(&decl).map(String::as_str)
    }

    // -- Variables --

    pub fn register_variable(&mut self, names: &mut NameRegistry, desc: VariableDesc) -> VarHandle {
        if let Some(&handle) = self.var_keys.get(&desc.key) {
            return handle;
        }
        let name = names.generate_name(&desc.base_name);
        let handle = VarHandle(self.variables.len());
        let declared = matches!(desc.key, SymbolKey::Decl(_));
        if let SymbolKey::Decl(id) = desc.key {
            self.decl_names.insert(id, name.clone());
        }
        self.variables.push(VariableSymbol {
            key: desc.key,
            name,
            ty: desc.ty,
            storage: desc.storage,
            default: desc.default,
            modifiers: desc.modifiers,
            attributes: desc.attributes,
            marker: desc.marker,
            declared,
        });
        self.var_keys.insert(desc.key, handle);
        handle
    }

    pub fn variable_handle(&self, key: SymbolKey) -> Option<VarHandle> {
        self.var_keys.get(&key).copied()
    }

    pub fn variable(&self, handle: VarHandle) -> Option<&VariableSymbol> {
        self.variables.get(handle.0)
    }

    /// Records a use of `handle` from `body` and returns the variable's name.
    /// Binds unbound locals and promotes locals used outside their body.
    pub fn use_variable(&mut self, handle: VarHandle, body: BodyId) -> Option<&str> {
        let var = self.variables.get_mut(handle.0)?;
        match var.storage {
            Storage::Unbound => var.storage = Storage::Local(body),
            Storage::Local(owner) if owner != body => {
                tracing::debug!(name = %var.name, "promoting local to instance field");
                var.storage = Storage::Instance;
            }
            _ => {}
        }
        Some(&var.name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableSymbol> {
        self.variables.iter()
    }

    /// Locals declared in `body`'s prologue, in registration order.
    pub fn locals_of(&self, body: BodyId) -> impl Iterator<Item = &VariableSymbol> {
        self.variables
            .iter()
            .filter(move |v| v.storage == Storage::Local(body))
    }

    // -- Methods --

    /// Registers a method. Equal name and parameter list return the existing
    /// handle; the same name with different parameters is an overload and
    /// shares the emitted name.
    pub fn register_method(
        &mut self,
        names: &mut NameRegistry,
        desc: MethodDesc,
    ) -> Result<MethodHandle, CodegenError> {
        if let Some(&handle) = desc.key.as_ref().and_then(|k| self.method_keys.get(k)) {
            return Ok(handle);
        }
        let signature: MethodSignature = (
            desc.base_name.clone(),
            desc.params.iter().map(|p| (p.ty.clone(), p.modifier)).collect(),
        );
        if let Some(&handle) = self.method_sigs.get(&signature) {
            let existing = &self.methods[handle.0];
            if existing.return_type != desc.return_type {
                return Err(CodegenError::invalid(
                    format!("method {}", desc.base_name),
                    "registered twice with different return types",
                ));
            }
            if let Some(key) = desc.key {
                self.method_keys.insert(key, handle);
            }
            return Ok(handle);
        }
        let name = match self.method_names.get(&desc.base_name) {
            Some(name) => name.clone(),
            None => {
                let name = names.generate_name(&desc.base_name);
                self.method_names.insert(desc.base_name.clone(), name.clone());
                name
            }
        };
        let body = self.new_body();
        let handle = MethodHandle(self.methods.len());
        if let Some(SymbolKey::Decl(id)) = desc.key {
            self.decl_names.insert(id, name.clone());
            self.decl_bodies.insert(id, body);
        }
        self.methods.push(MethodSymbol {
            name,
            return_type: desc.return_type,
            params: desc.params,
            generic_params: desc.generic_params,
            modifiers: desc.modifiers,
            attributes: desc.attributes,
            marker: desc.marker,
            body,
        });
        self.method_sigs.insert(signature, handle);
        if let Some(key) = desc.key {
            self.method_keys.insert(key, handle);
        }
        Ok(handle)
    }

    pub fn method(&self, handle: MethodHandle) -> Option<&MethodSymbol> {
        self.methods.get(handle.0)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodSymbol> {
        self.methods.iter()
    }

    // -- Properties and constructors --

    pub fn register_property(
        &mut self,
        names: &mut NameRegistry,
        decl: DeclId,
        base_name: &str,
        ty: TypeRef,
        modifiers: Modifiers,
    ) -> PropertyHandle {
        if let Some(&handle) = self.property_keys.get(&decl) {
            return handle;
        }
        let name = names.generate_name(base_name);
        self.decl_names.insert(decl, name.clone());
        let handle = PropertyHandle(self.properties.len());
        self.properties.push(PropertySymbol {
            name,
            ty,
            modifiers,
            attributes: Vec::new(),
            marker: Some(MarkerId::Decl(decl)),
            getter: None,
            setter: None,
        });
        self.property_keys.insert(decl, handle);
        handle
    }

    pub fn property_mut(&mut self, handle: PropertyHandle) -> Option<&mut PropertySymbol> {
        self.properties.get_mut(handle.0)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertySymbol> {
        self.properties.iter()
    }

    pub fn register_constructor(
        &mut self,
        decl: Option<DeclId>,
        params: Vec<ParamSymbol>,
        modifiers: Modifiers,
    ) -> BodyId {
        let body = self.new_body();
        if let Some(id) = decl {
            self.decl_bodies.insert(id, body);
        }
        self.constructors.push(ConstructorSymbol {
            params,
            modifiers,
            marker: decl.map(MarkerId::Decl),
            body,
        });
        body
    }

    pub fn constructors(&self) -> impl Iterator<Item = &ConstructorSymbol> {
        self.constructors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_registration_is_idempotent() {
        let mut names = NameRegistry::new();
        let mut table = SymbolTable::new();
        let desc = VariableDesc::field(SymbolKey::Node(NodeId(1)), "value", TypeRef::INT);
        let a = table.register_variable(&mut names, desc.clone());
        let b = table.register_variable(&mut names, desc);
        assert_eq!(a, b);
        assert_eq!(table.variables().count(), 1);
    }

    #[test]
    fn independent_registrations_get_distinct_names() {
        let mut names = NameRegistry::new();
        let mut table = SymbolTable::new();
        let a = table.register_variable(
            &mut names,
            VariableDesc::local(SymbolKey::Node(NodeId(1)), "value", TypeRef::INT),
        );
        let b = table.register_variable(
            &mut names,
            VariableDesc::local(SymbolKey::Node(NodeId(2)), "value", TypeRef::INT),
        );
        assert_eq!(table.variable(a).unwrap().name, "value");
        assert_eq!(table.variable(b).unwrap().name, "value1");
    }

    #[test]
    fn locals_bind_then_promote() {
        let mut names = NameRegistry::new();
        let mut table = SymbolTable::new();
        let first = table.new_body();
        let second = table.new_body();
        let h = table.register_variable(
            &mut names,
            VariableDesc::local(SymbolKey::Node(NodeId(1)), "count", TypeRef::INT),
        );
        table.use_variable(h, first);
        assert_eq!(table.variable(h).unwrap().storage, Storage::Local(first));
        assert_eq!(table.locals_of(first).count(), 1);
        table.use_variable(h, second);
        assert_eq!(table.variable(h).unwrap().storage, Storage::Instance);
        // No demotion.
        table.use_variable(h, first);
        assert_eq!(table.variable(h).unwrap().storage, Storage::Instance);
        assert_eq!(table.locals_of(first).count(), 0);
    }

    #[test]
    fn method_registration_is_idempotent_and_overloads_share_names() {
        let mut names = NameRegistry::new();
        let mut table = SymbolTable::new();
        let desc = MethodDesc::new("Fire", TypeRef::Void);
        let a = table.register_method(&mut names, desc.clone()).unwrap();
        let b = table.register_method(&mut names, desc.clone()).unwrap();
        assert_eq!(a, b);

        let mut overload = desc.clone();
        overload.params.push(ParamSymbol {
            name: "power".into(),
            ty: TypeRef::FLOAT,
            modifier: ParamModifier::None,
            default: None,
        });
        let c = table.register_method(&mut names, overload).unwrap();
        assert_ne!(a, c);
        assert_eq!(table.method(c).unwrap().name, "Fire");
        assert_eq!(table.methods().count(), 2);

        let mut clash = desc;
        clash.return_type = TypeRef::INT;
        assert!(table.register_method(&mut names, clash).is_err());
    }

    #[test]
    fn contributions_are_deduplicated() {
        let mut table = SymbolTable::new();
        let body = table.new_body();
        table.contribute(body, -1, "a = 1;".into());
        table.contribute(body, -1, "a = 1;".into());
        assert_eq!(table.body(body).unwrap().contributions.len(), 1);
    }

    #[test]
    fn declared_names_are_recorded() {
        let mut names = NameRegistry::new();
        let mut table = SymbolTable::new();
        let mut desc = MethodDesc::new("Heal", TypeRef::Void);
        desc.key = Some(SymbolKey::Decl(DeclId(4)));
        let h = table.register_method(&mut names, desc).unwrap();
        assert_eq!(table.decl_name(DeclId(4)), Some("Heal"));
        assert_eq!(table.decl_body(DeclId(4)), Some(table.method(h).unwrap().body));
    }
}
