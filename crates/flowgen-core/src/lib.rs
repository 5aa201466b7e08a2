pub mod decl;
pub mod error;
pub mod graph;
pub mod id;
pub mod literal;
pub mod member;
pub mod ops;
pub mod port;
pub mod types;

// Re-export commonly used types
pub use decl::{
    AttributeDecl, ClassDecl, ConstructorDecl, DeclRef, EntryKind, EntryPoint, EventDecl,
    FunctionDecl, ParamDecl, PropertyDecl, VariableDecl,
};
pub use error::CoreError;
pub use graph::{GraphDocument, NodeEntry, NodeGraph};
pub use id::{DeclId, NodeId};
pub use literal::Literal;
pub use member::{
    ChainRoot, CollectionKind, MemberChain, MemberItem, MemberKind, MemberRef, ParamInfo,
    ParamModifier, VariableRef,
};
pub use ops::{OperatorKind, OperatorShape, SetOp};
pub use port::{FlowPort, NodePorts, PortSource, ValuePort};
pub use types::{Modifiers, Primitive, TypeKind, TypeRef, Visibility};
