//! Generation context: all mutable state of one graph's generation.
//!
//! A context is created per graph, lives for one pass and is dropped when
//! the artifact is assembled. Nothing in it is shared between passes; the
//! single-active-pass guard in [`crate::driver`] keeps passes apart.
//!
//! Lifecycle:
//!
//! 1. [`GenerationContext::new`] builds connectivity and the classifier.
//! 2. [`GenerationContext::prepare`] registers declarations, runs every
//!    node's `initialize` hook and seals classification.
//! 3. [`GenerationContext::emit_entry`] emits one entry point's body.
//! 4. [`GenerationContext::finish`] assembles the type and extracts the
//!    source map.

use std::collections::{HashMap, HashSet};

use flowgen_check::{Classifier, ConnectivityOptions, ConnectivityTable};
use flowgen_core::decl::{DeclRef, EntryKind, EntryPoint, ParamDecl};
use flowgen_core::id::{DeclId, NodeId};
use flowgen_core::literal::Literal;
use flowgen_core::member::{MemberRef, VariableRef};
use flowgen_core::types::{Modifiers, TypeRef};

use crate::coroutine::{self, StateUnits};
use crate::error::{CodegenError, Diagnostic};
use crate::markers::{self, MarkerId};
use crate::names::{NameRegistry, OwnerKey};
use crate::node::Graph;
use crate::symbols::{
    BodyId, MethodDesc, ParamSymbol, Storage, SymbolKey, SymbolTable, VarHandle, VariableDesc,
};
use crate::usings::UsingRegistry;
use crate::{assemble, expr, stmt, GeneratedArtifact, GeneratorConfig};

/// Priority of parameter copies into promoted fields; runs before the body.
const PARAM_COPY_PRIORITY: i32 = -100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Body,
}

/// What kind of member body is being emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Class,
    Function,
    Getter,
    Setter,
    Constructor,
    Event,
    StateUnit,
    Shared,
}

/// Where emission currently is.
#[derive(Debug, Clone)]
pub struct EmitState {
    pub section: Section,
    pub owner: Option<DeclId>,
    /// Name of the declaration being emitted, for diagnostics.
    pub owner_name: String,
    pub is_static: bool,
    /// Inside a resumable unit: suspension is allowed, returns become
    /// `yield break`.
    pub in_coroutine: bool,
    pub body: BodyId,
    pub return_type: TypeRef,
}

#[derive(Debug, Default)]
struct SpliceFrame {
    enter: Vec<String>,
    exit: Vec<String>,
}

pub struct GenerationContext<'g> {
    graph: &'g Graph,
    config: &'g GeneratorConfig,
    classifier: Classifier,
    pub(crate) names: NameRegistry,
    pub(crate) symbols: SymbolTable,
    pub(crate) units: StateUnits,
    pub(crate) usings: UsingRegistry,
    state: EmitState,
    phase: Phase,
    batched: bool,
    diagnostics: Vec<Diagnostic>,
    value_stack: Vec<(NodeId, u16)>,
    splices: Vec<SpliceFrame>,
    /// Nodes whose loop scope is open.
    scopes: Vec<NodeId>,
    params: HashMap<(DeclId, usize), (String, TypeRef)>,
    accessor_bodies: HashMap<(DeclId, EntryKind), BodyId>,
    /// Shared regular nodes: emitted method name and return type.
    shared: HashMap<NodeId, (String, TypeRef)>,
    pub(crate) node_setups: Vec<(NodeId, String)>,
    pub(crate) runtime_used: bool,
}

impl<'g> GenerationContext<'g> {
    pub fn new(graph: &'g Graph, config: &'g GeneratorConfig) -> Result<Self, CodegenError> {
        graph.class.validate()?;
        let table = ConnectivityTable::build(
            graph,
            ConnectivityOptions {
                strict: config.strict_connectivity,
            },
        )?;
        tracing::debug!(graph = %graph.name, nodes = table.len(), "connectivity built");

        let namespace = config.namespace.as_deref().or(graph.class.namespace.as_deref());
        let mut symbols = SymbolTable::new();
        let class_body = symbols.new_body();
        Ok(GenerationContext {
            graph,
            config,
            classifier: Classifier::new(table),
            names: NameRegistry::new(),
            symbols,
            units: StateUnits::new(),
            usings: UsingRegistry::new(namespace),
            state: EmitState {
                section: Section::Class,
                owner: None,
                owner_name: graph.class.name.clone(),
                is_static: false,
                in_coroutine: false,
                body: class_body,
                return_type: TypeRef::Void,
            },
            phase: Phase::Init,
            batched: config.is_batched(),
            diagnostics: Vec::new(),
            value_stack: Vec::new(),
            splices: Vec::new(),
            scopes: Vec::new(),
            params: HashMap::new(),
            accessor_bodies: HashMap::new(),
            shared: HashMap::new(),
            node_setups: Vec::new(),
            runtime_used: false,
        })
    }

    // -- Accessors --

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn config(&self) -> &'g GeneratorConfig {
        self.config
    }

    pub fn state(&self) -> &EmitState {
        &self.state
    }

    pub fn owner_name(&self) -> &str {
        &self.state.owner_name
    }

    pub fn is_static(&self) -> bool {
        self.state.is_static
    }

    pub fn in_coroutine(&self) -> bool {
        self.state.in_coroutine
    }

    pub fn section(&self) -> Section {
        self.state.section
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_state(&mut self, id: NodeId) -> bool {
        self.classifier.is_state(id)
    }

    pub fn is_recursive(&mut self, id: NodeId) -> bool {
        self.classifier.is_recursive(id)
    }

    // -- Names, types, literals --

    pub fn generate_name(&mut self, base: &str) -> String {
        self.names.generate_name(base)
    }

    pub fn name_for(&mut self, owner: OwnerKey, base: &str) -> String {
        self.names.name_for(owner, base)
    }

    pub fn type_name(&mut self, ty: &TypeRef) -> String {
        expr::type_name(&mut self.usings, ty)
    }

    pub fn literal(&mut self, lit: &Literal) -> String {
        expr::literal(&mut self.usings, lit)
    }

    pub fn decl_name(&self, decl: DeclId) -> Option<String> {
        self.symbols.decl_name(decl).map(str::to_string)
    }

    /// The runtime support property, marking it as needed.
    pub fn runtime(&mut self) -> &'static str {
        self.runtime_used = true;
        coroutine::RUNTIME_PROPERTY
    }

    // -- Registration (initialization phase) --

    /// Forces `id` into state classification. Only valid before bodies are
    /// emitted.
    pub fn register_state_node(&mut self, id: NodeId) -> Result<(), CodegenError> {
        if self.phase == Phase::Body {
            return Err(CodegenError::ClassificationOrder { node: id });
        }
        self.classifier.register_state(id)?;
        Ok(())
    }

    pub fn register_variable(&mut self, desc: VariableDesc) -> VarHandle {
        self.symbols.register_variable(&mut self.names, desc)
    }

    /// Name of a registered variable, recording the use from the current
    /// body.
    pub fn variable_name(&mut self, handle: VarHandle) -> Result<String, CodegenError> {
        self.symbols
            .use_variable(handle, self.state.body)
            .map(str::to_string)
            .ok_or_else(|| CodegenError::UnresolvedReference {
                reference: format!("variable handle {}", handle.0),
                declaration: self.state.owner_name.clone(),
            })
    }

    /// Code run by every constructor of the generated type.
    pub fn register_node_setup(&mut self, node: NodeId, text: String) {
        if !self.node_setups.iter().any(|(n, t)| *n == node && *t == text) {
            self.node_setups.push((node, text));
        }
    }

    /// Name of the variable node `node` registered for itself.
    pub fn node_variable(&mut self, node: NodeId) -> Result<String, CodegenError> {
        let handle = self
            .symbols
            .variable_handle(SymbolKey::Node(node))
            .ok_or_else(|| CodegenError::UnresolvedReference {
                reference: format!("variable of node {node}"),
                declaration: self.state.owner_name.clone(),
            })?;
        self.variable_name(handle)
    }

    // -- Values --

    pub fn emit_value(&mut self, value: &MemberRef) -> Result<String, CodegenError> {
        expr::emit_value(self, value)
    }

    pub fn emit_assignment(
        &mut self,
        target: &MemberRef,
        value: &str,
        op: flowgen_core::ops::SetOp,
    ) -> Result<String, CodegenError> {
        expr::emit_assignment(self, target, value, op)
    }

    /// Output `port` of `node` as an expression.
    pub fn emit_node_value(&mut self, node: NodeId, port: u16) -> Result<String, CodegenError> {
        if self.value_stack.contains(&(node, port)) {
            return Err(CodegenError::ValueCycle { node });
        }
        let graph = self.graph;
        let Some(kind) = graph.get(node) else {
            return Err(CodegenError::UnresolvedReference {
                reference: format!("output {port} of missing node {node}"),
                declaration: self.state.owner_name.clone(),
            });
        };
        self.value_stack.push((node, port));
        let result = kind.generate_value(node, port, self);
        self.value_stack.pop();
        let text = result?;
        Ok(self.mark(MarkerId::Node(node), text))
    }

    /// A declared variable or parameter as seen from the current body.
    pub fn variable_ref(&mut self, var: &VariableRef) -> Result<String, CodegenError> {
        match *var {
            VariableRef::Field(decl) | VariableRef::Local { variable: decl, .. } => {
                let handle = self
                    .symbols
                    .variable_handle(SymbolKey::Decl(decl))
                    .ok_or_else(|| CodegenError::UnresolvedReference {
                        reference: format!("variable {decl}"),
                        declaration: self.state.owner_name.clone(),
                    })?;
                self.variable_name(handle)
            }
            VariableRef::Parameter { owner, index } => self.parameter_ref(owner, index),
            VariableRef::SetterValue => {
                if self.state.section == Section::Setter {
                    Ok("value".to_string())
                } else {
                    Err(CodegenError::invalid(
                        "setter `value`",
                        format!("outside a property setter (in {})", self.state.owner_name),
                    ))
                }
            }
        }
    }

    fn parameter_ref(&mut self, owner: DeclId, index: usize) -> Result<String, CodegenError> {
        let Some((name, ty)) = self.params.get(&(owner, index)).cloned() else {
            return Err(CodegenError::UnresolvedReference {
                reference: format!("parameter {index} of declaration {owner}"),
                declaration: self.state.owner_name.clone(),
            });
        };
        let owner_body = self.symbols.decl_body(owner);
        if owner_body == Some(self.state.body) {
            return Ok(name);
        }
        let Some(owner_body) = owner_body else {
            return Err(CodegenError::UnresolvedReference {
                reference: format!("parameter `{name}` of a declaration without a body"),
                declaration: self.state.owner_name.clone(),
            });
        };
        // Read from another body: copy into a field when the owner starts.
        let handle = self.symbols.register_variable(
            &mut self.names,
            VariableDesc::field(SymbolKey::Param(owner, index), &name, ty),
        );
        let field = self
            .symbols
            .variable(handle)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| name.clone());
        self.symbols
            .contribute(owner_body, PARAM_COPY_PRIORITY, format!("{field} = {name};"));
        Ok(field)
    }

    // -- Splicing --

    /// Runs `f` with a fresh splice frame and returns its text surrounded by
    /// whatever was spliced in.
    pub fn with_splice(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<String, CodegenError>,
    ) -> Result<String, CodegenError> {
        self.splices.push(SpliceFrame::default());
        let result = f(self);
        let frame = self.splices.pop().unwrap_or_default();
        let text = result?;
        let mut parts = frame.enter;
        parts.push(text);
        parts.extend(frame.exit.into_iter().rev());
        Ok(stmt::lines(parts))
    }

    /// Adds code before (and optionally after) the statement being emitted.
    pub fn splice(&mut self, enter: String, exit: Option<String>) -> Result<(), CodegenError> {
        let frame = self.splices.last_mut().ok_or_else(|| {
            CodegenError::invalid("by-ref temporary", "needs an enclosing statement")
        })?;
        frame.enter.push(enter);
        if let Some(exit) = exit {
            frame.exit.push(exit);
        }
        Ok(())
    }

    // -- Scopes --

    /// Runs `f` with `node`'s scope open in the current body.
    pub fn with_scope<T>(
        &mut self,
        node: NodeId,
        f: impl FnOnce(&mut Self) -> Result<T, CodegenError>,
    ) -> Result<T, CodegenError> {
        self.scopes.push(node);
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// `node`'s scope is open. Units and shared nodes first emitted from
    /// inside the scope count as inside it.
    pub fn in_scope(&self, node: NodeId) -> bool {
        self.scopes.contains(&node)
    }

    // -- Flow --

    /// Emits the flow chain starting at `start` in the current body.
    pub fn emit_flow(&mut self, start: Option<NodeId>) -> Result<String, CodegenError> {
        self.emit_chain(start, false)
    }

    /// Emits a nested body (lambda) that runs outside any resumable unit.
    pub fn emit_nested(&mut self, start: Option<NodeId>, return_type: TypeRef) -> Result<String, CodegenError> {
        let state = EmitState {
            in_coroutine: false,
            return_type,
            ..self.state.clone()
        };
        self.with_state(state, |cx| cx.emit_flow(start))
    }

    fn with_state<T>(
        &mut self,
        state: EmitState,
        f: impl FnOnce(&mut Self) -> Result<T, CodegenError>,
    ) -> Result<T, CodegenError> {
        let saved = std::mem::replace(&mut self.state, state);
        let result = f(self);
        self.state = saved;
        result
    }

    fn emit_chain(&mut self, start: Option<NodeId>, inline_first: bool) -> Result<String, CodegenError> {
        let graph = self.graph;
        let mut parts = Vec::new();
        let mut seen = HashSet::new();
        let mut current = start;
        let mut inline = inline_first;

        while let Some(id) = current {
            if !graph.contains(id) {
                tracing::debug!(node = id.0, "flow target missing, chain ends");
                break;
            }
            if !inline {
                if self.classifier.is_state(id) {
                    let invocation = self.state_invocation(id);
                    parts.push(self.recover(id, invocation)?);
                    break;
                }
                if self.classifier.table().is_shared(id) {
                    let invocation = self.shared_invocation(id);
                    parts.push(self.recover(id, invocation)?);
                    break;
                }
            }
            inline = false;
            if !seen.insert(id) {
                return Err(CodegenError::invalid(
                    format!("flow through node {id}"),
                    "revisits a node that is not a state unit",
                ));
            }

            let next = continuation_of(graph, id);
            let statement = self.emit_statement(id);
            parts.push(self.recover(id, statement)?);
            current = next;
        }
        Ok(stmt::lines(parts))
    }

    fn emit_statement(&mut self, id: NodeId) -> Result<String, CodegenError> {
        let graph = self.graph;
        let node = graph.node(id)?;
        tracing::debug!(node = id.0, title = %node.title(), "emitting statement");
        let text = self.with_splice(|cx| node.generate_code(id, cx))?;
        Ok(self.mark(MarkerId::Node(id), text))
    }

    /// Batched passes turn a failed emission of `id` into a placeholder;
    /// synchronous passes attribute the error to the node and abort.
    fn recover(&mut self, id: NodeId, result: Result<String, CodegenError>) -> Result<String, CodegenError> {
        match result {
            Ok(text) => Ok(text),
            Err(err) if self.batched => Ok(self.record_failure(id, err)),
            Err(err) => Err(err.in_node(id, &self.state.owner_name)),
        }
    }

    fn record_failure(&mut self, id: NodeId, err: CodegenError) -> String {
        let title = self.graph.get(id).map(|n| n.title()).unwrap_or_default();
        tracing::warn!(node = id.0, error = %err, "node failed; emitting placeholder");
        // Messages may quote marked-up output; half a marker pair would
        // break source map extraction.
        let message = markers::strip_tokens(&err.root().to_string());
        let text = stmt::placeholder(&format!("flowgen: node {id} ({title}) failed: {message}")).into_text();
        self.diagnostics.push(Diagnostic {
            graph: self.graph.name.clone(),
            node: Some(err.node().unwrap_or(id)),
            owner: self.state.owner_name.clone(),
            message,
        });
        text
    }

    /// Wraps `text` in markers when the pass is traceable.
    pub(crate) fn mark(&self, id: MarkerId, text: String) -> String {
        if self.config.traceable && !text.is_empty() {
            markers::wrap(id, &text)
        } else {
            text
        }
    }

    // -- State units --

    /// Slot of state node `id`, emitting its unit body on first request.
    pub fn unit_slot(&mut self, id: NodeId) -> Result<u32, CodegenError> {
        if !self.classifier.is_state(id) {
            return Err(CodegenError::invalid(
                format!("unit reference to node {id}"),
                "the node is not a state unit",
            ));
        }
        if self.state.is_static {
            return Err(CodegenError::invalid(
                format!("state unit {id}"),
                format!("cannot run from static member {}", self.state.owner_name),
            ));
        }
        self.runtime_used = true;
        let slot = self.units.register(id, &mut self.symbols);
        match self.units.begin(id) {
            Some(body) => {
                tracing::debug!(node = id.0, slot, "emitting state unit");
                let state = EmitState {
                    section: Section::StateUnit,
                    is_static: false,
                    in_coroutine: true,
                    body,
                    return_type: TypeRef::Void,
                    ..self.state.clone()
                };
                let result = self.with_state(state, |cx| cx.emit_chain(Some(id), true));
                match result {
                    Ok(text) => self.units.finish(id, text),
                    Err(err) => {
                        self.units.finish(id, String::new());
                        return Err(err);
                    }
                }
            }
            None => self.units.note_reference(id),
        }
        Ok(slot)
    }

    fn state_invocation(&mut self, id: NodeId) -> Result<String, CodegenError> {
        let slot = self.unit_slot(id)?;
        let degenerate = self.units.get(id).and_then(|u| u.degenerate_value());
        let call = coroutine::run_call(slot, degenerate.as_deref());
        let statement = if self.state.in_coroutine {
            stmt::yield_return(&call)
        } else {
            stmt::invoke(&call)
        };
        Ok(statement.into_text())
    }

    // -- Shared regular nodes --

    fn shared_invocation(&mut self, id: NodeId) -> Result<String, CodegenError> {
        let return_type = self.state.return_type.clone();
        let name = match self.shared.get(&id) {
            Some((name, ty)) if *ty == return_type => name.clone(),
            Some((name, _)) => {
                return Err(CodegenError::invalid(
                    format!("shared node {id} ({name})"),
                    "is reached from bodies with different return types",
                ))
            }
            None => self.emit_shared(id, return_type.clone())?,
        };
        let call = format!("{name}()");
        let statement = if return_type.is_void() {
            stmt::invoke(&call)
        } else {
            stmt::return_value(Some(&call))
        };
        Ok(statement.into_text())
    }

    fn emit_shared(&mut self, id: NodeId, return_type: TypeRef) -> Result<String, CodegenError> {
        let graph = self.graph;
        let node = graph.node(id)?;
        let mut desc = MethodDesc::new(&format!("{}_{id}", node.title()), return_type.clone());
        desc.key = Some(SymbolKey::Node(id));
        if self.state.is_static {
            desc.modifiers = Modifiers::private().with_static();
        }
        let handle = self.symbols.register_method(&mut self.names, desc)?;
        let (name, body) = match self.symbols.method(handle) {
            Some(method) => (method.name.clone(), method.body),
            None => return Err(CodegenError::invalid(format!("shared node {id}"), "method registration failed")),
        };
        self.shared.insert(id, (name.clone(), return_type.clone()));
        tracing::debug!(node = id.0, method = %name, "emitting shared node once");

        let state = EmitState {
            section: Section::Shared,
            in_coroutine: false,
            body,
            return_type,
            ..self.state.clone()
        };
        let text = self.with_state(state, |cx| cx.emit_chain(Some(id), true))?;
        self.symbols.set_body_text(body, text);
        Ok(name)
    }

    // -- Pass steps --

    /// Registers declarations, initializes nodes and seals classification.
    pub fn prepare(&mut self) -> Result<(), CodegenError> {
        self.register_declarations()?;

        let ids: Vec<NodeId> = self.classifier.table().iter().map(|d| d.id).collect();
        let graph = self.graph;
        for id in ids {
            let node = graph.node(id)?;
            if let Err(err) = node.initialize(id, self) {
                if self.batched {
                    self.record_failure(id, err);
                } else {
                    return Err(err.in_node(id, &self.state.owner_name));
                }
            }
        }

        let classification = self.classifier.seal();
        tracing::debug!(
            graph = %graph.name,
            state = classification.state_count(),
            "classification sealed"
        );
        self.phase = Phase::Body;
        Ok(())
    }

    fn register_declarations(&mut self) -> Result<(), CodegenError> {
        let graph = self.graph;
        let class = &graph.class;
        self.names.reserve(&class.name);
        self.usings.reserve(&class.name);
        for reserved in [
            coroutine::DISPATCHER,
            coroutine::RUNTIME_PROPERTY,
            coroutine::RUNTIME_FIELD,
        ] {
            self.names.reserve(reserved);
        }
        for ns in class.usings.iter().chain(self.config.usings.iter()) {
            self.usings.add(ns);
        }

        for v in &class.variables {
            self.symbols.register_variable(
                &mut self.names,
                VariableDesc {
                    default: v.default.clone(),
                    modifiers: v.modifiers,
                    attributes: v.attributes.clone(),
                    marker: Some(MarkerId::Decl(v.id)),
                    ..VariableDesc::field(SymbolKey::Decl(v.id), &v.name, v.ty.clone())
                },
            );
        }

        for f in &class.functions {
            let params = self.register_params(f.id, &f.params);
            let desc = MethodDesc {
                key: Some(SymbolKey::Decl(f.id)),
                params,
                generic_params: f.generic_params.clone(),
                modifiers: f.modifiers,
                attributes: f.attributes.clone(),
                marker: Some(MarkerId::Decl(f.id)),
                ..MethodDesc::new(&f.name, f.return_type.clone())
            };
            self.symbols.register_method(&mut self.names, desc)?;
            let body = self.symbols.decl_body(f.id);
            for local in &f.locals {
                let storage = body.map(Storage::Local).unwrap_or(Storage::Unbound);
                self.symbols.register_variable(
                    &mut self.names,
                    VariableDesc {
                        storage,
                        default: local.default.clone(),
                        ..VariableDesc::local(SymbolKey::Decl(local.id), &local.name, local.ty.clone())
                    },
                );
            }
        }

        for p in &class.properties {
            let handle = self.symbols.register_property(
                &mut self.names,
                p.id,
                &p.name,
                p.ty.clone(),
                p.modifiers,
            );
            let getter = p.getter.map(|_| self.symbols.new_body());
            let setter = p.setter.map(|_| self.symbols.new_body());
            if let Some(body) = getter {
                self.accessor_bodies.insert((p.id, EntryKind::Getter), body);
            }
            if let Some(body) = setter {
                self.accessor_bodies.insert((p.id, EntryKind::Setter), body);
            }
            if let Some(symbol) = self.symbols.property_mut(handle) {
                symbol.attributes = p.attributes.clone();
                symbol.getter = getter;
                symbol.setter = setter;
            }
        }

        for c in &class.constructors {
            let params = self.register_params(c.id, &c.params);
            self.symbols.register_constructor(Some(c.id), params, c.modifiers);
        }

        for e in &class.events {
            let params = self.register_params(e.id, &e.params);
            let desc = MethodDesc {
                key: Some(SymbolKey::Decl(e.id)),
                params,
                marker: Some(MarkerId::Decl(e.id)),
                ..MethodDesc::new(&e.name, TypeRef::Void)
            };
            self.symbols.register_method(&mut self.names, desc)?;
        }
        Ok(())
    }

    fn register_params(&mut self, owner: DeclId, params: &[ParamDecl]) -> Vec<ParamSymbol> {
        params
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let name = self.names.name_for(OwnerKey::Param(owner, index), &p.name);
                self.params.insert((owner, index), (name.clone(), p.ty.clone()));
                ParamSymbol {
                    name,
                    ty: p.ty.clone(),
                    modifier: p.modifier,
                    default: p.default.clone(),
                }
            })
            .collect()
    }

    fn entry_body(&self, entry: &EntryPoint) -> Option<BodyId> {
        match entry.kind {
            EntryKind::Getter | EntryKind::Setter => {
                self.accessor_bodies.get(&(entry.owner, entry.kind)).copied()
            }
            _ => self.symbols.decl_body(entry.owner),
        }
    }

    /// Emits the body of one entry point.
    pub fn emit_entry(&mut self, entry: &EntryPoint) -> Result<(), CodegenError> {
        let body = self.entry_body(entry).ok_or_else(|| {
            CodegenError::invalid(format!("entry of declaration {}", entry.owner), "has no body")
        })?;
        let graph = self.graph;
        let class = &graph.class;
        let decl = class.get(entry.owner)?;
        let (section, is_static, return_type) = match (entry.kind, decl) {
            (EntryKind::Function, DeclRef::Function(f)) => {
                (Section::Function, f.modifiers.is_static, f.return_type.clone())
            }
            (EntryKind::Getter, DeclRef::Property(p)) => {
                (Section::Getter, p.modifiers.is_static, p.ty.clone())
            }
            (EntryKind::Setter, DeclRef::Property(p)) => {
                (Section::Setter, p.modifiers.is_static, TypeRef::Void)
            }
            (EntryKind::Constructor, DeclRef::Constructor(c)) => {
                (Section::Constructor, c.modifiers.is_static, TypeRef::Void)
            }
            (EntryKind::Event, DeclRef::Event(_)) => (Section::Event, false, TypeRef::Void),
            (kind, other) => {
                return Err(CodegenError::invalid(
                    format!("entry {kind:?} of `{}`", other.name()),
                    "does not match its declaration",
                ))
            }
        };
        let owner_name = match decl {
            DeclRef::Constructor(_) => class.name.clone(),
            other => other.name().to_string(),
        };
        tracing::debug!(owner = %owner_name, entry = entry.node.0, "emitting entry");

        let state = EmitState {
            section,
            owner: Some(entry.owner),
            owner_name,
            is_static,
            in_coroutine: false,
            body,
            return_type,
        };
        let text = self.with_state(state, |cx| cx.emit_flow(Some(entry.node)))?;
        self.symbols.set_body_text(body, text);
        Ok(())
    }

    /// Assembles the generated type into its artifact.
    pub fn finish(mut self) -> Result<(GeneratedArtifact, Vec<Diagnostic>), CodegenError> {
        let type_text = assemble::assemble_class(&mut self)?;
        let graph = self.graph;
        let class = &graph.class;
        let namespace = self
            .config
            .namespace
            .as_deref()
            .or(class.namespace.as_deref());
        let usings = self.usings.sorted();
        let text = assemble::assemble_file(&[type_text], &usings, namespace, self.config.header);

        let (source, source_map) = if self.config.traceable {
            let (clean, map) = markers::extract_source_map(&text)?;
            (clean, Some(map))
        } else {
            (text, None)
        };
        let artifact = GeneratedArtifact {
            type_name: class.name.clone(),
            file_name: format!("{}.cs", class.name),
            source,
            source_map,
        };
        Ok((artifact, self.diagnostics))
    }
}

/// Target of the port the generator follows after `id`'s own statement.
fn continuation_of(graph: &Graph, id: NodeId) -> Option<NodeId> {
    let node = graph.get(id)?;
    let index = node.continuation()?;
    node.ports().flow_outputs.get(index).and_then(|port| port.target)
}
