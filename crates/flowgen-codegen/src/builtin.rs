//! Built-in node kinds.
//!
//! Enough control flow, data access and unit control to author whole classes
//! as JSON graph documents. Host libraries add their own kinds by implementing
//! [`NodeKind`] and boxing them into the same [`crate::node::Graph`].

use serde::{Deserialize, Serialize};

use flowgen_core::decl::ParamDecl;
use flowgen_core::id::NodeId;
use flowgen_core::literal::Literal;
use flowgen_core::member::MemberRef;
use flowgen_core::ops::{OperatorKind, SetOp};
use flowgen_core::port::{NodePorts, PortSource};
use flowgen_core::types::TypeRef;

use crate::context::GenerationContext;
use crate::coroutine::{self, UnitQuery};
use crate::error::CodegenError;
use crate::names::OwnerKey;
use crate::node::NodeKind;
use crate::stmt::{self, Fragment, LambdaBody, SwitchCase};
use crate::symbols::{SymbolKey, VariableDesc};

/// One arm of a [`BuiltinNode::Switch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchArm {
    pub labels: Vec<Literal>,
    #[serde(default)]
    pub target: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuiltinNode {
    /// Runs every output in port order.
    Sequence { outputs: Vec<Option<NodeId>> },
    Branch {
        condition: MemberRef,
        #[serde(default)]
        on_true: Option<NodeId>,
        #[serde(default)]
        on_false: Option<NodeId>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    Switch {
        value: MemberRef,
        #[serde(default)]
        cases: Vec<SwitchArm>,
        #[serde(default)]
        default: Option<NodeId>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    /// `for (index = start; index < end; index += step)`. Output 0 is the
    /// index.
    ForLoop {
        start: MemberRef,
        end: MemberRef,
        /// Unassigned steps by one.
        #[serde(default)]
        step: MemberRef,
        #[serde(default)]
        body: Option<NodeId>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    /// Output 0 is the current item, readable only inside the loop body.
    ForEach {
        collection: MemberRef,
        element: TypeRef,
        #[serde(default)]
        body: Option<NodeId>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    While {
        condition: MemberRef,
        #[serde(default)]
        body: Option<NodeId>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    Invoke {
        call: MemberRef,
        #[serde(default)]
        next: Option<NodeId>,
    },
    SetValue {
        target: MemberRef,
        value: MemberRef,
        #[serde(default)]
        op: SetOp,
        #[serde(default)]
        next: Option<NodeId>,
    },
    /// Stores a value once; output 0 reads it back without re-evaluating.
    LocalVariable {
        name: String,
        ty: TypeRef,
        #[serde(default)]
        value: MemberRef,
        #[serde(default)]
        next: Option<NodeId>,
    },
    Return {
        #[serde(default)]
        value: MemberRef,
    },
    /// Suspends for `seconds`, or for one frame when unassigned.
    Wait {
        #[serde(default)]
        seconds: MemberRef,
        #[serde(default)]
        next: Option<NodeId>,
    },
    /// Every flow node of `body` runs as a resumable unit.
    StateScope {
        #[serde(default)]
        body: Option<NodeId>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    StopUnit {
        unit: Option<NodeId>,
        #[serde(default)]
        next: Option<NodeId>,
    },
    UnitStatus { unit: Option<NodeId>, query: UnitQuery },
    Literal { value: Literal },
    Member { value: MemberRef },
    Operator {
        op: OperatorKind,
        operands: Vec<MemberRef>,
        /// Target type of conversion operators.
        #[serde(default)]
        cast: Option<TypeRef>,
    },
    /// Output 0 is the lambda, outputs 1.. its parameters.
    Lambda {
        #[serde(default)]
        params: Vec<ParamDecl>,
        #[serde(default = "void")]
        return_type: TypeRef,
        #[serde(default)]
        body: Option<NodeId>,
    },
}

fn void() -> TypeRef {
    TypeRef::Void
}

impl BuiltinNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            BuiltinNode::Sequence { .. } => "Sequence",
            BuiltinNode::Branch { .. } => "Branch",
            BuiltinNode::Switch { .. } => "Switch",
            BuiltinNode::ForLoop { .. } => "ForLoop",
            BuiltinNode::ForEach { .. } => "ForEach",
            BuiltinNode::While { .. } => "While",
            BuiltinNode::Invoke { .. } => "Invoke",
            BuiltinNode::SetValue { .. } => "SetValue",
            BuiltinNode::LocalVariable { .. } => "LocalVariable",
            BuiltinNode::Return { .. } => "Return",
            BuiltinNode::Wait { .. } => "Wait",
            BuiltinNode::StateScope { .. } => "StateScope",
            BuiltinNode::StopUnit { .. } => "StopUnit",
            BuiltinNode::UnitStatus { .. } => "UnitStatus",
            BuiltinNode::Literal { .. } => "Literal",
            BuiltinNode::Member { .. } => "Member",
            BuiltinNode::Operator { .. } => "Operator",
            BuiltinNode::Lambda { .. } => "Lambda",
        }
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

impl PortSource for BuiltinNode {
    fn title(&self) -> String {
        self.kind_name().to_string()
    }

    fn is_flow(&self) -> bool {
        !matches!(
            self,
            BuiltinNode::UnitStatus { .. }
                | BuiltinNode::Literal { .. }
                | BuiltinNode::Member { .. }
                | BuiltinNode::Operator { .. }
                | BuiltinNode::Lambda { .. }
        )
    }

    fn ports(&self) -> NodePorts {
        let ports = NodePorts::default();
        match self {
            BuiltinNode::Sequence { outputs } => outputs
                .iter()
                .enumerate()
                .fold(ports, |p, (i, t)| p.flow(&format!("then{i}"), *t)),
            BuiltinNode::Branch {
                condition,
                on_true,
                on_false,
                next,
            } => ports
                .value("condition", condition.clone())
                .flow("true", *on_true)
                .flow("false", *on_false)
                .flow("next", *next),
            BuiltinNode::Switch {
                value,
                cases,
                default,
                next,
            } => cases
                .iter()
                .enumerate()
                .fold(ports.value("value", value.clone()), |p, (i, arm)| {
                    p.flow(&format!("case{i}"), arm.target)
                })
                .flow("default", *default)
                .flow("next", *next),
            BuiltinNode::ForLoop {
                start,
                end,
                step,
                body,
                next,
            } => ports
                .value("start", start.clone())
                .value("end", end.clone())
                .value("step", step.clone())
                .flow("body", *body)
                .flow("next", *next),
            BuiltinNode::ForEach {
                collection,
                body,
                next,
                ..
            } => ports
                .value("collection", collection.clone())
                .flow("body", *body)
                .flow("next", *next),
            BuiltinNode::While {
                condition,
                body,
                next,
            } => ports
                .value("condition", condition.clone())
                .flow("body", *body)
                .flow("next", *next),
            BuiltinNode::Invoke { call, next } => {
                ports.value("call", call.clone()).flow("next", *next)
            }
            BuiltinNode::SetValue {
                target,
                value,
                next,
                ..
            } => ports
                .value("target", target.clone())
                .value("value", value.clone())
                .flow("next", *next),
            BuiltinNode::LocalVariable { value, next, .. } => {
                ports.value("value", value.clone()).flow("next", *next)
            }
            BuiltinNode::Return { value } => ports.value("value", value.clone()),
            BuiltinNode::Wait { seconds, next } => {
                ports.value("seconds", seconds.clone()).flow("next", *next)
            }
            BuiltinNode::StateScope { body, next } => ports.child(*body).flow("next", *next),
            BuiltinNode::StopUnit { unit, next } => ports.reference(*unit).flow("next", *next),
            BuiltinNode::UnitStatus { unit, .. } => ports.reference(*unit),
            BuiltinNode::Literal { .. } => ports,
            BuiltinNode::Member { value } => ports.value("value", value.clone()),
            BuiltinNode::Operator { operands, .. } => operands
                .iter()
                .enumerate()
                .fold(ports, |p, (i, v)| p.value(&format!("operand{i}"), v.clone())),
            BuiltinNode::Lambda { body, .. } => ports.child(*body),
        }
    }

    fn requires_suspension(&self) -> bool {
        matches!(self, BuiltinNode::Wait { .. })
    }

    fn is_stateful_scope(&self) -> bool {
        matches!(self, BuiltinNode::StateScope { .. })
    }

    fn continuation(&self) -> Option<usize> {
        match self {
            BuiltinNode::Branch { .. } => Some(2),
            BuiltinNode::Switch { cases, .. } => Some(cases.len() + 1),
            BuiltinNode::ForLoop { .. } | BuiltinNode::ForEach { .. } | BuiltinNode::While { .. } => {
                Some(1)
            }
            BuiltinNode::Invoke { .. }
            | BuiltinNode::SetValue { .. }
            | BuiltinNode::LocalVariable { .. }
            | BuiltinNode::Wait { .. }
            | BuiltinNode::StateScope { .. }
            | BuiltinNode::StopUnit { .. } => Some(0),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

const LOOP_ITEM: &str = "item";
const LOOP_BINDING: &str = "current";

fn no_output(node: &BuiltinNode, port: u16) -> CodegenError {
    CodegenError::invalid(
        format!("output {port} of node `{}`", node.kind_name()),
        "does not produce a value",
    )
}

fn wait_type() -> TypeRef {
    TypeRef::class("UnityEngine", "WaitForSeconds")
}

impl NodeKind for BuiltinNode {
    fn initialize(&self, id: NodeId, cx: &mut GenerationContext<'_>) -> Result<(), CodegenError> {
        match self {
            BuiltinNode::ForLoop { .. } => {
                cx.register_variable(VariableDesc::local(SymbolKey::Node(id), "index", TypeRef::INT));
            }
            // The item outlives the iteration binding so units resumed from
            // the body can still read it.
            BuiltinNode::ForEach { element, .. } => {
                cx.register_variable(VariableDesc::local(SymbolKey::Node(id), LOOP_ITEM, element.clone()));
            }
            BuiltinNode::LocalVariable { name, ty, .. } => {
                cx.register_variable(VariableDesc::local(SymbolKey::Node(id), name, ty.clone()));
            }
            _ => {}
        }
        Ok(())
    }

    fn generate_code(&self, id: NodeId, cx: &mut GenerationContext<'_>) -> Result<String, CodegenError> {
        let fragment = match self {
            BuiltinNode::Sequence { outputs } => {
                let parts = outputs
                    .iter()
                    .map(|target| cx.emit_flow(*target))
                    .collect::<Result<Vec<_>, _>>()?;
                Fragment::block(stmt::lines(parts))
            }
            BuiltinNode::Branch {
                condition,
                on_true,
                on_false,
                ..
            } => {
                let condition = cx.emit_value(condition)?;
                let then_body = cx.emit_flow(*on_true)?;
                let else_body = cx.emit_flow(*on_false)?;
                if then_body.is_empty() && !else_body.is_empty() {
                    let negated = format!("!{}", stmt::operand(&condition));
                    stmt::if_else(&negated, &else_body, None)
                } else {
                    let else_body = (!else_body.is_empty()).then_some(else_body.as_str());
                    stmt::if_else(&condition, &then_body, else_body)
                }
            }
            BuiltinNode::Switch {
                value,
                cases,
                default,
                ..
            } => {
                let value = cx.emit_value(value)?;
                let mut arms = Vec::with_capacity(cases.len());
                for arm in cases {
                    let labels = arm.labels.iter().map(|l| cx.literal(l)).collect();
                    let body = cx.emit_flow(arm.target)?;
                    arms.push(SwitchCase { labels, body });
                }
                let default = cx.emit_flow(*default)?;
                let default = (!default.is_empty()).then_some(default.as_str());
                stmt::switch(&value, &arms, default)
            }
            BuiltinNode::ForLoop {
                start,
                end,
                step,
                body,
                ..
            } => {
                let index = cx.node_variable(id)?;
                let start = cx.emit_value(start)?;
                let end = cx.emit_value(end)?;
                let step = if step.is_assigned() {
                    format!("{index} += {}", stmt::operand(&cx.emit_value(step)?))
                } else {
                    format!("{index}++")
                };
                let body = cx.emit_flow(*body)?;
                stmt::for_loop(
                    &format!("{index} = {start}"),
                    &format!("{index} < {}", stmt::operand(&end)),
                    &step,
                    &body,
                )
            }
            BuiltinNode::ForEach {
                collection,
                element,
                body,
                ..
            } => {
                let item = cx.node_variable(id)?;
                let binding = cx.name_for(OwnerKey::Node(id), LOOP_BINDING);
                let ty = cx.type_name(element);
                let collection = cx.emit_value(collection)?;
                let body = cx.with_scope(id, |cx| cx.emit_flow(*body))?;
                let body = stmt::lines([stmt::assign(&item, &binding, SetOp::Assign).into_text(), body]);
                stmt::foreach(&ty, &binding, &collection, &body)
            }
            BuiltinNode::While { condition, body, .. } => {
                let condition = cx.emit_value(condition)?;
                let body = cx.emit_flow(*body)?;
                stmt::while_loop(&condition, &body)
            }
            BuiltinNode::Invoke { call, .. } => stmt::invoke(&cx.emit_value(call)?),
            BuiltinNode::SetValue {
                target, value, op, ..
            } => {
                let value = cx.emit_value(value)?;
                return cx.emit_assignment(target, &value, *op);
            }
            BuiltinNode::LocalVariable { ty, value, .. } => {
                let name = cx.node_variable(id)?;
                let value = if value.is_assigned() {
                    cx.emit_value(value)?
                } else {
                    format!("default({})", cx.type_name(ty))
                };
                stmt::assign(&name, &value, SetOp::Assign)
            }
            BuiltinNode::Return { value } => return emit_return(cx, value),
            BuiltinNode::Wait { seconds, .. } => {
                if !cx.in_coroutine() {
                    return Err(CodegenError::invalid("wait", "outside a state unit"));
                }
                if seconds.is_assigned() {
                    let seconds = cx.emit_value(seconds)?;
                    let ty = cx.type_name(&wait_type());
                    stmt::yield_return(&format!("new {ty}({seconds})"))
                } else {
                    stmt::yield_return("null")
                }
            }
            BuiltinNode::StateScope { body, .. } => Fragment::block(cx.emit_flow(*body)?),
            BuiltinNode::StopUnit { unit, .. } => {
                let unit = unit.ok_or_else(|| CodegenError::invalid("stop unit", "has no target unit"))?;
                let slot = cx.unit_slot(unit)?;
                stmt::invoke(&coroutine::stop_call(slot))
            }
            other => {
                return Err(CodegenError::invalid(
                    format!("node `{}`", other.kind_name()),
                    "cannot be used as a statement",
                ))
            }
        };
        Ok(fragment.into_text())
    }

    fn generate_value(
        &self,
        id: NodeId,
        port: u16,
        cx: &mut GenerationContext<'_>,
    ) -> Result<String, CodegenError> {
        match (self, port) {
            (BuiltinNode::ForLoop { .. } | BuiltinNode::LocalVariable { .. }, 0) => cx.node_variable(id),
            (BuiltinNode::ForEach { .. }, 0) => {
                if cx.in_scope(id) {
                    cx.node_variable(id)
                } else {
                    Err(CodegenError::invalid(
                        format!("loop item of node {id}"),
                        "read outside its loop body",
                    ))
                }
            }
            (BuiltinNode::UnitStatus { unit, query }, 0) => {
                let unit = unit.ok_or_else(|| CodegenError::invalid("unit status", "has no target unit"))?;
                let slot = cx.unit_slot(unit)?;
                Ok(coroutine::query_call(slot, *query))
            }
            (BuiltinNode::Literal { value }, 0) => Ok(cx.literal(value)),
            (BuiltinNode::Member { value }, 0) => cx.emit_value(value),
            (BuiltinNode::Operator { op, operands, cast }, 0) => {
                let operands = operands
                    .iter()
                    .map(|v| cx.emit_value(v))
                    .collect::<Result<Vec<_>, _>>()?;
                let cast = cast.as_ref().map(|ty| cx.type_name(ty));
                Ok(stmt::operator(*op, &operands, cast.as_deref())?.into_text())
            }
            (
                BuiltinNode::Lambda {
                    params,
                    return_type,
                    body,
                },
                0,
            ) => {
                let names: Vec<String> = params
                    .iter()
                    .map(|p| cx.name_for(OwnerKey::Node(id), &p.name))
                    .collect();
                let body = cx.emit_nested(*body, return_type.clone())?;
                Ok(stmt::lambda(&names, LambdaBody::Statements(&body)).into_text())
            }
            (BuiltinNode::Lambda { params, .. }, n) => match params.get(usize::from(n) - 1) {
                Some(p) => Ok(cx.name_for(OwnerKey::Node(id), &p.name)),
                None => Err(no_output(self, port)),
            },
            _ => Err(no_output(self, port)),
        }
    }
}

fn emit_return(cx: &mut GenerationContext<'_>, value: &MemberRef) -> Result<String, CodegenError> {
    if cx.in_coroutine() {
        if value.is_assigned() {
            return Err(CodegenError::invalid("return value", "inside a state unit"));
        }
        return Ok(stmt::yield_break().into_text());
    }
    let returns_void = cx.state().return_type.is_void();
    match (value.is_assigned(), returns_void) {
        (false, true) => Ok(stmt::return_value(None).into_text()),
        (true, false) => {
            let value = cx.emit_value(value)?;
            Ok(stmt::return_value(Some(&value)).into_text())
        }
        (true, true) => Err(CodegenError::invalid(
            "return value",
            format!("in void member {}", cx.owner_name()),
        )),
        (false, false) => Err(CodegenError::invalid(
            "return without a value",
            format!("in {}, which returns a value", cx.owner_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgen_core::member::MemberItem;

    use crate::test_support::{call_node, event_graph, generate_source};

    fn int(v: i64) -> MemberRef {
        MemberRef::literal(Literal::int(v))
    }

    #[test]
    fn deserializes_tagged_nodes() {
        let node: BuiltinNode = serde_json::from_str(
            r#"{"kind":"branch","condition":{"Literal":{"Bool":true}},"on_true":3}"#,
        )
        .unwrap();
        match &node {
            BuiltinNode::Branch { on_true, next, .. } => {
                assert_eq!(*on_true, Some(NodeId(3)));
                assert_eq!(*next, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(node.continuation(), Some(2));
    }

    #[test]
    fn switch_continuation_follows_cases() {
        let node = BuiltinNode::Switch {
            value: int(1),
            cases: vec![
                SwitchArm { labels: vec![Literal::int(1)], target: None },
                SwitchArm { labels: vec![Literal::int(2)], target: None },
            ],
            default: None,
            next: Some(NodeId(9)),
        };
        let ports = node.ports();
        let index = node.continuation().unwrap();
        assert_eq!(ports.flow_outputs[index].name, "next");
        assert_eq!(ports.flow_outputs[index].target, Some(NodeId(9)));
    }

    #[test]
    fn only_wait_suspends() {
        assert!(BuiltinNode::Wait { seconds: MemberRef::Unassigned, next: None }.requires_suspension());
        assert!(!call_node("A", None).requires_suspension());
        assert!(!BuiltinNode::Literal { value: Literal::int(1) }.is_flow());
    }

    #[test]
    fn branch_with_only_else_is_negated() {
        let graph = event_graph(vec![
            (
                1,
                BuiltinNode::Branch {
                    condition: MemberRef::this_chain(vec![MemberItem::field("alive", TypeRef::BOOL)]),
                    on_true: None,
                    on_false: Some(NodeId(2)),
                    next: None,
                },
            ),
            (2, call_node("Respawn", None)),
        ]);
        let source = generate_source(&graph);
        assert!(source.contains("if (!alive) {\n"), "{source}");
        assert!(source.contains("Respawn();"), "{source}");
    }

    #[test]
    fn for_loop_index_is_a_local() {
        let graph = event_graph(vec![
            (
                1,
                BuiltinNode::ForLoop {
                    start: int(0),
                    end: int(3),
                    step: MemberRef::Unassigned,
                    body: Some(NodeId(2)),
                    next: None,
                },
            ),
            (
                2,
                BuiltinNode::Invoke {
                    call: MemberRef::this_chain(vec![MemberItem::method(
                        "Spawn",
                        TypeRef::Void,
                        vec![flowgen_core::member::ParamInfo::new("i", TypeRef::INT)],
                        vec![MemberRef::output(NodeId(1))],
                    )]),
                    next: None,
                },
            ),
        ]);
        let source = generate_source(&graph);
        assert!(source.contains("int index;"), "{source}");
        assert!(source.contains("for (index = 0; index < 3; index++) {"), "{source}");
        assert!(source.contains("Spawn(index);"), "{source}");
    }

    #[test]
    fn foreach_item_outside_body_is_invalid() {
        let graph = event_graph(vec![
            (
                1,
                BuiltinNode::ForEach {
                    collection: MemberRef::this_chain(vec![MemberItem::field(
                        "targets",
                        TypeRef::list_of(TypeRef::INT),
                    )]),
                    element: TypeRef::INT,
                    body: None,
                    next: Some(NodeId(2)),
                },
            ),
            (
                2,
                BuiltinNode::Invoke {
                    call: MemberRef::this_chain(vec![MemberItem::method(
                        "Hit",
                        TypeRef::Void,
                        vec![flowgen_core::member::ParamInfo::new("t", TypeRef::INT)],
                        vec![MemberRef::output(NodeId(1))],
                    )]),
                    next: None,
                },
            ),
        ]);
        let err = crate::driver::generate_graph(&graph, &crate::GeneratorConfig::default()).unwrap_err();
        assert_eq!(err.node(), Some(NodeId(2)));
        assert!(matches!(err.root(), CodegenError::InvalidTarget { .. }));
    }

    fn hit_item(loop_node: u32) -> BuiltinNode {
        BuiltinNode::Invoke {
            call: MemberRef::this_chain(vec![MemberItem::method(
                "Hit",
                TypeRef::Void,
                vec![flowgen_core::member::ParamInfo::new("t", TypeRef::INT)],
                vec![MemberRef::output(NodeId(loop_node))],
            )]),
            next: None,
        }
    }

    fn foreach_targets(body: u32) -> BuiltinNode {
        BuiltinNode::ForEach {
            collection: MemberRef::this_chain(vec![MemberItem::field("targets", TypeRef::list_of(TypeRef::INT))]),
            element: TypeRef::INT,
            body: Some(NodeId(body)),
            next: None,
        }
    }

    #[test]
    fn foreach_copies_the_item_into_its_variable() {
        let graph = event_graph(vec![(1, foreach_targets(2)), (2, hit_item(1))]);
        let source = generate_source(&graph);
        assert!(source.contains("int item;"), "{source}");
        assert!(source.contains("foreach (int current in targets) {"), "{source}");
        assert!(source.contains("item = current;"), "{source}");
        assert!(source.contains("Hit(item);"), "{source}");
    }

    #[test]
    fn foreach_item_is_readable_after_a_wait_in_the_body() {
        let graph = event_graph(vec![
            (1, foreach_targets(2)),
            (2, BuiltinNode::Wait { seconds: MemberRef::Unassigned, next: Some(NodeId(3)) }),
            (3, hit_item(1)),
        ]);
        let source = generate_source(&graph);
        // Read from another unit, so the item becomes a field.
        assert!(source.contains("private int item;"), "{source}");
        assert!(source.contains("item = current;"), "{source}");
        assert!(source.contains("yield return null;"), "{source}");
        assert!(source.contains("Hit(item);"), "{source}");
    }

    #[test]
    fn wait_runs_inside_a_unit() {
        // Everything flowing into a wait becomes a unit too.
        let graph = event_graph(vec![
            (1, call_node("Before", Some(2))),
            (2, BuiltinNode::Wait { seconds: int(2), next: Some(NodeId(3)) }),
            (3, call_node("After", None)),
        ]);
        let source = generate_source(&graph);
        assert!(source.contains("yield return new WaitForSeconds(2);"), "{source}");
        assert!(source.contains("__rt.Run(0);"), "{source}");
    }

    #[test]
    fn return_value_in_void_member_is_invalid() {
        let graph = event_graph(vec![(1, BuiltinNode::Return { value: int(1) })]);
        let err = crate::driver::generate_graph(&graph, &crate::GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err.root(), CodegenError::InvalidTarget { .. }));
    }
}
