//! Member references: the typed descriptors carried by value ports.
//!
//! A [`MemberRef`] says where a value comes from. It may be a literal, a
//! declared variable, a type, `this`, another node's output, a collection, or a
//! chain of reflected members (fields, properties, methods, constructors,
//! operators, indexers) rooted at a type or an instance expression.
//!
//! Member references are pure data. Discovering which nodes a reference
//! depends on ([`MemberRef::node_references`]) is what the connectivity
//! builder uses in place of runtime field reflection.

use serde::{Deserialize, Serialize};

use crate::id::{DeclId, NodeId};
use crate::literal::Literal;
use crate::ops::OperatorKind;
use crate::types::TypeRef;

/// Where a value comes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum MemberRef {
    /// Port left unconnected in the editor.
    #[default]
    Unassigned,
    Literal(Literal),
    Variable(VariableRef),
    /// A type used as a value (`typeof(T)`).
    Type(TypeRef),
    This,
    /// Output port `port` of another node.
    NodeOutput { node: NodeId, port: u16 },
    /// A freshly constructed array or list whose items are themselves
    /// member references.
    Collection {
        kind: CollectionKind,
        element: TypeRef,
        items: Vec<MemberRef>,
    },
    Chain(MemberChain),
}

/// Collection initializer flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    Array,
    List,
}

/// A declared variable (or parameter) in the class being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableRef {
    /// A class-level variable declared on the class.
    Field(DeclId),
    /// A local declared by a function.
    Local { function: DeclId, variable: DeclId },
    /// Parameter `index` of a function, event root or constructor.
    Parameter { owner: DeclId, index: usize },
    /// The implicit `value` of a property setter.
    SetterValue,
}

/// A reflected member access chain: `root.a.b(x)[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberChain {
    pub root: ChainRoot,
    pub items: Vec<MemberItem>,
}

/// What a member chain starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChainRoot {
    /// Static access through a type name.
    Static(TypeRef),
    /// Instance access through another value.
    Instance(Box<MemberRef>),
    /// Members of the generated class itself.
    This,
}

/// Kind of a reflected member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
    Indexer,
    /// A method whose name is one of the operator method names.
    Operator,
}

/// How an argument is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParamModifier {
    #[default]
    None,
    Ref,
    Out,
    In,
    Params,
}

impl ParamModifier {
    /// The keyword placed before the argument at a call site.
    pub fn call_prefix(self) -> &'static str {
        match self {
            ParamModifier::Ref => "ref ",
            ParamModifier::Out => "out ",
            ParamModifier::In => "in ",
            ParamModifier::None | ParamModifier::Params => "",
        }
    }

    /// Returns `true` for modifiers that need an assignable argument.
    pub fn is_by_ref(self) -> bool {
        matches!(self, ParamModifier::Ref | ParamModifier::Out)
    }
}

/// Parameter metadata of a reflected method, constructor or indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifier: ParamModifier,
}

impl ParamInfo {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        ParamInfo {
            name: name.to_string(),
            ty,
            modifier: ParamModifier::None,
        }
    }

    pub fn by_ref(name: &str, ty: TypeRef, modifier: ParamModifier) -> Self {
        ParamInfo {
            name: name.to_string(),
            ty,
            modifier,
        }
    }
}

/// One link of a member chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberItem {
    pub name: String,
    pub kind: MemberKind,
    /// Type produced by this link (field/property type, method return type,
    /// constructed type).
    pub value_type: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<MemberRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_args: Vec<TypeRef>,
    /// Member is not publicly accessible and must be reached through the
    /// runtime's dynamic get/set helpers.
    #[serde(default)]
    pub reflected: bool,
    /// Member declared by the generated class; its emitted name comes from
    /// the symbol table rather than `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<DeclId>,
}

impl MemberItem {
    pub fn field(name: &str, value_type: TypeRef) -> Self {
        MemberItem::simple(name, MemberKind::Field, value_type)
    }

    pub fn property(name: &str, value_type: TypeRef) -> Self {
        MemberItem::simple(name, MemberKind::Property, value_type)
    }

    pub fn method(name: &str, value_type: TypeRef, params: Vec<ParamInfo>, args: Vec<MemberRef>) -> Self {
        MemberItem {
            params,
            args,
            ..MemberItem::simple(name, MemberKind::Method, value_type)
        }
    }

    pub fn constructor(value_type: TypeRef, params: Vec<ParamInfo>, args: Vec<MemberRef>) -> Self {
        MemberItem {
            params,
            args,
            ..MemberItem::simple(".ctor", MemberKind::Constructor, value_type)
        }
    }

    pub fn operator(op: OperatorKind, value_type: TypeRef, args: Vec<MemberRef>) -> Self {
        MemberItem {
            args,
            ..MemberItem::simple(op.method_name(), MemberKind::Operator, value_type)
        }
    }

    pub fn indexer(value_type: TypeRef, params: Vec<ParamInfo>, args: Vec<MemberRef>) -> Self {
        MemberItem {
            params,
            args,
            ..MemberItem::simple("Item", MemberKind::Indexer, value_type)
        }
    }

    fn simple(name: &str, kind: MemberKind, value_type: TypeRef) -> Self {
        MemberItem {
            name: name.to_string(),
            kind,
            value_type,
            params: Vec::new(),
            args: Vec::new(),
            generic_args: Vec::new(),
            reflected: false,
            decl: None,
        }
    }

    pub fn with_generics(mut self, generic_args: Vec<TypeRef>) -> Self {
        self.generic_args = generic_args;
        self
    }

    pub fn reflected(mut self) -> Self {
        self.reflected = true;
        self
    }

    pub fn declared_by(mut self, decl: DeclId) -> Self {
        self.decl = Some(decl);
        self
    }
}

impl MemberRef {
    pub fn literal(lit: Literal) -> Self {
        MemberRef::Literal(lit)
    }

    pub fn output(node: NodeId) -> Self {
        MemberRef::NodeOutput { node, port: 0 }
    }

    /// A chain rooted at a static type.
    pub fn static_chain(ty: TypeRef, items: Vec<MemberItem>) -> Self {
        MemberRef::Chain(MemberChain {
            root: ChainRoot::Static(ty),
            items,
        })
    }

    /// A chain rooted at another value.
    pub fn instance_chain(instance: MemberRef, items: Vec<MemberItem>) -> Self {
        MemberRef::Chain(MemberChain {
            root: ChainRoot::Instance(Box::new(instance)),
            items,
        })
    }

    /// A chain rooted at the generated class.
    pub fn this_chain(items: Vec<MemberItem>) -> Self {
        MemberRef::Chain(MemberChain {
            root: ChainRoot::This,
            items,
        })
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, MemberRef::Unassigned)
    }

    /// Every node whose output this reference reads, in discovery order and
    /// without duplicates.
    pub fn node_references(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_node_references(&mut out);
        out
    }

    fn collect_node_references(&self, out: &mut Vec<NodeId>) {
        match self {
            MemberRef::NodeOutput { node, .. } => {
                if !out.contains(node) {
                    out.push(*node);
                }
            }
            MemberRef::Collection { items, .. } => {
                for item in items {
                    item.collect_node_references(out);
                }
            }
            MemberRef::Chain(chain) => {
                if let ChainRoot::Instance(inner) = &chain.root {
                    inner.collect_node_references(out);
                }
                for item in &chain.items {
                    for arg in &item.args {
                        arg.collect_node_references(out);
                    }
                }
            }
            MemberRef::Unassigned
            | MemberRef::Literal(_)
            | MemberRef::Variable(_)
            | MemberRef::Type(_)
            | MemberRef::This => {}
        }
    }

    /// The type this reference evaluates to, when it is knowable from the
    /// reference alone.
    pub fn static_type(&self) -> Option<TypeRef> {
        match self {
            MemberRef::Literal(lit) => lit.value_type(),
            MemberRef::Collection { kind, element, .. } => Some(match kind {
                CollectionKind::Array => TypeRef::array_of(element.clone()),
                CollectionKind::List => TypeRef::list_of(element.clone()),
            }),
            MemberRef::Chain(chain) => chain.items.last().map(|item| item.value_type.clone()),
            MemberRef::Type(_) => Some(TypeRef::class("System", "Type")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector3() -> TypeRef {
        TypeRef::structure("UnityEngine", "Vector3")
    }

    #[test]
    fn node_references_walk_roots_args_and_collections() {
        let member = MemberRef::instance_chain(
            MemberRef::output(NodeId(1)),
            vec![MemberItem::method(
                "Move",
                TypeRef::Void,
                vec![ParamInfo::new("a", vector3()), ParamInfo::new("b", TypeRef::INT)],
                vec![
                    MemberRef::output(NodeId(2)),
                    MemberRef::Collection {
                        kind: CollectionKind::List,
                        element: TypeRef::INT,
                        items: vec![MemberRef::output(NodeId(3)), MemberRef::output(NodeId(1))],
                    },
                ],
            )],
        );
        assert_eq!(
            member.node_references(),
            vec![NodeId(1), NodeId(2), NodeId(3)]
        );
    }

    #[test]
    fn leaves_reference_nothing() {
        assert!(MemberRef::Unassigned.node_references().is_empty());
        assert!(MemberRef::This.node_references().is_empty());
        assert!(MemberRef::Literal(Literal::int(1)).node_references().is_empty());
    }

    #[test]
    fn static_type_of_chain_is_last_link() {
        let member = MemberRef::static_chain(
            TypeRef::class("UnityEngine", "Time"),
            vec![MemberItem::property("deltaTime", TypeRef::FLOAT)],
        );
        assert_eq!(member.static_type(), Some(TypeRef::FLOAT));
    }

    #[test]
    fn operator_item_uses_method_name() {
        let item = MemberItem::operator(OperatorKind::Add, vector3(), vec![]);
        assert_eq!(item.name, "op_Addition");
        assert_eq!(item.kind, MemberKind::Operator);
    }

    #[test]
    fn by_ref_modifiers() {
        assert!(ParamModifier::Out.is_by_ref());
        assert!(!ParamModifier::In.is_by_ref());
        assert_eq!(ParamModifier::Ref.call_prefix(), "ref ");
    }

    #[test]
    fn serde_roundtrip_chain() {
        let member = MemberRef::this_chain(vec![MemberItem::field("hp", TypeRef::INT).declared_by(DeclId(4))]);
        let json = serde_json::to_string(&member).unwrap();
        let back: MemberRef = serde_json::from_str(&json).unwrap();
        assert_eq!(member, back);
    }
}
