//! Class and file assembly.
//!
//! Once every entry point has been emitted, the symbol table holds the
//! generated type's members and their bodies. [`assemble_class`] renders
//! them in a fixed order:
//!
//! 1. fields (declared, promoted and synthesized)
//! 2. properties
//! 3. constructors (node setups run first in each)
//! 4. methods, shared node methods included
//! 5. the coroutine dispatcher and runtime accessor, when units exist
//! 6. dynamic variable accessors in optimization mode
//!
//! [`assemble_file`] wraps the rendered types in the header, usings and
//! namespace block.

use flowgen_core::decl::AttributeDecl;
use flowgen_core::literal::Literal;
use flowgen_core::member::ParamModifier;
use flowgen_core::types::{Modifiers, TypeRef};

use crate::context::GenerationContext;
use crate::coroutine::{DISPATCHER, RUNTIME_FIELD, RUNTIME_PROPERTY};
use crate::error::CodegenError;
use crate::expr;
use crate::stmt::{self, SwitchCase};
use crate::symbols::{BodyId, ParamSymbol, Storage, SymbolKey};

const HEADER: &str = "\
// <auto-generated>
//     Generated by flowgen. Changes will be lost when the graph is regenerated.
// </auto-generated>
#pragma warning disable";

/// The rendered pieces of one type declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeParts {
    pub attributes: Vec<String>,
    /// Everything before the opening brace, e.g. `public class Player : Base`.
    pub declaration: String,
    pub fields: Vec<String>,
    pub properties: Vec<String>,
    pub constructors: Vec<String>,
    pub methods: Vec<String>,
}

/// Renders a type from its parts. Fields form one block; every other
/// member is separated by a blank line.
pub fn assemble_type(parts: &TypeParts) -> String {
    let mut blocks = Vec::new();
    if !parts.fields.is_empty() {
        blocks.push(parts.fields.join("\n"));
    }
    blocks.extend(parts.properties.iter().cloned());
    blocks.extend(parts.constructors.iter().cloned());
    blocks.extend(parts.methods.iter().cloned());
    let body = blocks.join("\n\n");
    stmt::lines(
        parts
            .attributes
            .iter()
            .cloned()
            .chain([format!("{} {}", parts.declaration, stmt::braced(&body))]),
    )
}

/// Wraps rendered types into a complete source file.
pub fn assemble_file(types: &[String], usings: &[String], namespace: Option<&str>, header: bool) -> String {
    let mut sections = Vec::new();
    if header {
        sections.push(HEADER.to_string());
    }
    if !usings.is_empty() {
        sections.push(
            usings
                .iter()
                .map(|u| format!("using {u};"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    let types = types.join("\n\n");
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) => sections.push(format!("namespace {ns} {}", stmt::braced(&types))),
        None => sections.push(types),
    }
    let mut text = sections.join("\n\n");
    text.push('\n');
    text
}

/// Renders the class of `cx` after all entries were emitted.
pub fn assemble_class(cx: &mut GenerationContext<'_>) -> Result<String, CodegenError> {
    let parts = collect_parts(cx)?;
    tracing::debug!(
        class = %cx.graph().class.name,
        fields = parts.fields.len(),
        methods = parts.methods.len(),
        "assembling class"
    );
    Ok(assemble_type(&parts))
}

fn collect_parts(cx: &mut GenerationContext<'_>) -> Result<TypeParts, CodegenError> {
    let graph = cx.graph();
    let class = &graph.class;
    let mut parts = TypeParts {
        attributes: attributes(cx, &class.attributes),
        ..TypeParts::default()
    };

    let mut declaration = format!("{}class {}", class.modifiers.render(false), class.name);
    let inherits: Vec<String> = class
        .base
        .iter()
        .chain(class.interfaces.iter())
        .map(|ty| cx.type_name(ty))
        .collect();
    if !inherits.is_empty() {
        declaration.push_str(&format!(" : {}", inherits.join(", ")));
    }
    parts.declaration = declaration;

    // Coroutine members first: their rendering may still touch usings and
    // the runtime flag.
    let dispatcher = dispatcher(cx);
    let runtime = if cx.runtime_used {
        Some(runtime_members(cx, dispatcher.is_some()))
    } else {
        None
    };

    parts.fields = fields(cx);
    parts.properties = properties(cx);
    parts.constructors = constructors(cx);
    parts.methods = methods(cx);

    if let Some((field, property)) = runtime {
        parts.fields.push(field);
        parts.properties.push(property);
    }
    parts.methods.extend(dispatcher);
    if cx.config().optimize_variable_access {
        parts.methods.extend(variable_accessors(cx));
    }
    Ok(parts)
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

fn attributes(cx: &mut GenerationContext<'_>, attrs: &[AttributeDecl]) -> Vec<String> {
    attrs
        .iter()
        .map(|attr| {
            let name = cx.type_name(&attr.ty);
            let name = name.strip_suffix("Attribute").filter(|n| !n.is_empty()).unwrap_or(&name);
            if attr.args.is_empty() {
                format!("[{name}]")
            } else {
                let args: Vec<String> = attr.args.iter().map(|a| cx.literal(a)).collect();
                format!("[{name}({})]", args.join(", "))
            }
        })
        .collect()
}

fn fields(cx: &mut GenerationContext<'_>) -> Vec<String> {
    let vars: Vec<_> = cx
        .symbols
        .variables()
        .filter(|v| v.storage == Storage::Instance)
        .cloned()
        .collect();
    vars.into_iter()
        .map(|v| {
            let mut lines = attributes(cx, &v.attributes);
            let ty = cx.type_name(&v.ty);
            let init = v
                .default
                .as_ref()
                .map(|lit| format!(" = {}", cx.literal(lit)))
                .unwrap_or_default();
            lines.push(format!("{}{ty} {}{init};", v.modifiers.render(false), v.name));
            let text = lines.join("\n");
            match v.marker {
                Some(marker) => cx.mark(marker, text),
                None => text,
            }
        })
        .collect()
}

fn properties(cx: &mut GenerationContext<'_>) -> Vec<String> {
    let props: Vec<_> = cx.symbols.properties().cloned().collect();
    props
        .into_iter()
        .map(|p| {
            let mut lines = attributes(cx, &p.attributes);
            let ty = cx.type_name(&p.ty);
            let head = format!("{}{ty} {}", p.modifiers.render(false), p.name);
            if p.getter.is_none() && p.setter.is_none() {
                lines.push(format!("{head} {{ get; set; }}"));
            } else {
                let mut accessors = Vec::new();
                if let Some(body) = p.getter {
                    let text = body_text(cx, body);
                    accessors.push(format!("get {}", stmt::braced(&render_body(cx, body, &text, &p.ty))));
                }
                if let Some(body) = p.setter {
                    let text = body_text(cx, body);
                    let rendered = render_body(cx, body, &text, &TypeRef::Void);
                    accessors.push(format!("set {}", stmt::braced(&rendered)));
                }
                lines.push(format!("{head} {}", stmt::braced(&accessors.join("\n"))));
            }
            let text = lines.join("\n");
            match p.marker {
                Some(marker) => cx.mark(marker, text),
                None => text,
            }
        })
        .collect()
}

fn constructors(cx: &mut GenerationContext<'_>) -> Vec<String> {
    let class_name = cx.graph().class.name.clone();
    let setups: Vec<String> = cx.node_setups.iter().map(|(_, text)| text.clone()).collect();
    let ctors: Vec<_> = cx.symbols.constructors().cloned().collect();
    if ctors.is_empty() {
        if setups.is_empty() {
            return Vec::new();
        }
        let text = format!(
            "{}{class_name}() {}",
            Modifiers::public().render(false),
            stmt::braced(&stmt::lines(&setups))
        );
        return vec![text];
    }
    ctors
        .into_iter()
        .map(|c| {
            let params = params(cx, &c.params);
            let text = body_text(cx, c.body);
            let body = render_body(cx, c.body, &text, &TypeRef::Void);
            // Static constructors run once per type, not per instance.
            let body = if c.modifiers.is_static {
                body
            } else {
                stmt::lines(setups.iter().map(String::as_str).chain([body.as_str()]))
            };
            let text = format!(
                "{}{class_name}({params}) {}",
                c.modifiers.render(false),
                stmt::braced(&body)
            );
            match c.marker {
                Some(marker) => cx.mark(marker, text),
                None => text,
            }
        })
        .collect()
}

fn methods(cx: &mut GenerationContext<'_>) -> Vec<String> {
    let methods: Vec<_> = cx.symbols.methods().cloned().collect();
    methods
        .into_iter()
        .map(|m| {
            let mut lines = attributes(cx, &m.attributes);
            let ret = cx.type_name(&m.return_type);
            let generics = if m.generic_params.is_empty() {
                String::new()
            } else {
                format!("<{}>", m.generic_params.join(", "))
            };
            let params = params(cx, &m.params);
            let text = body_text(cx, m.body);
            let body = render_body(cx, m.body, &text, &m.return_type);
            lines.push(format!(
                "{}{ret} {}{generics}({params}) {}",
                m.modifiers.render(false),
                m.name,
                stmt::braced(&body)
            ));
            let text = lines.join("\n");
            match m.marker {
                Some(marker) => cx.mark(marker, text),
                None => text,
            }
        })
        .collect()
}

fn params(cx: &mut GenerationContext<'_>, params: &[ParamSymbol]) -> String {
    params
        .iter()
        .map(|p| {
            let prefix = match p.modifier {
                ParamModifier::Params => "params ",
                other => other.call_prefix(),
            };
            let ty = cx.type_name(&p.ty);
            let default = p
                .default
                .as_ref()
                .map(|lit| format!(" = {}", cx.literal(lit)))
                .unwrap_or_default();
            format!("{prefix}{ty} {}{default}", p.name)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn body_text(cx: &GenerationContext<'_>, body: BodyId) -> String {
    cx.symbols
        .body(body)
        .and_then(|b| b.text.clone())
        .unwrap_or_default()
}

/// Local declarations, contributions before the text, the text, then the
/// remaining contributions. Non-void bodies that can fall through end with
/// `return default(T);`.
fn render_body(cx: &mut GenerationContext<'_>, body: BodyId, text: &str, return_type: &TypeRef) -> String {
    let locals: Vec<_> = cx.symbols.locals_of(body).cloned().collect();
    let mut contributions = cx
        .symbols
        .body(body)
        .map(|b| b.contributions.clone())
        .unwrap_or_default();
    contributions.sort_by_key(|c| c.priority);

    let mut parts: Vec<String> = locals
        .iter()
        .map(|v| {
            let ty = cx.type_name(&v.ty);
            let init = v.default.as_ref().map(|lit| cx.literal(lit));
            stmt::local(&ty, &v.name, init.as_deref()).into_text()
        })
        .collect();
    parts.extend(contributions.iter().filter(|c| c.priority < 0).map(|c| c.text.clone()));
    parts.push(text.to_string());
    parts.extend(contributions.iter().filter(|c| c.priority >= 0).map(|c| c.text.clone()));

    let mut rendered = stmt::lines(parts);
    if !return_type.is_void() && !stmt::ends_with_jump(&rendered) {
        let ty = cx.type_name(return_type);
        let fallback = stmt::return_value(Some(&format!("default({ty})"))).into_text();
        rendered = stmt::lines([rendered.as_str(), fallback.as_str()]);
    }
    rendered
}

// ---------------------------------------------------------------------------
// Coroutine members
// ---------------------------------------------------------------------------

fn dispatcher(cx: &mut GenerationContext<'_>) -> Option<String> {
    if cx.units.is_empty() {
        return None;
    }
    let enumerator = cx.type_name(&TypeRef::enumerator());
    let units: Vec<(u32, BodyId, String)> = cx
        .units
        .cases()
        .map(|u| (u.slot, u.body, u.text.clone()))
        .collect();
    let mut bodies = std::collections::HashMap::new();
    for (slot, body, text) in units {
        bodies.insert(slot, render_body(cx, body, &text, &TypeRef::Void));
    }
    cx.units
        .emit_dispatcher(&enumerator, |unit| bodies.remove(&unit.slot).unwrap_or_default())
}

/// The runtime backing field and its lazily initializing property.
fn runtime_members(cx: &mut GenerationContext<'_>, has_dispatcher: bool) -> (String, String) {
    let runtime_type = cx.config().runtime_type.clone();
    let ty = match runtime_type.rsplit_once('.') {
        Some((ns, name)) => cx.type_name(&TypeRef::class(ns, name)),
        None => runtime_type,
    };
    let field = format!("private {ty} {RUNTIME_FIELD};");
    let dispatch = if has_dispatcher { DISPATCHER } else { "null" };
    let init = stmt::if_else(
        &format!("{RUNTIME_FIELD} == null"),
        &format!("{RUNTIME_FIELD} = new {ty}(this, {dispatch});"),
        None,
    )
    .into_text();
    let getter = stmt::lines([init, format!("return {RUNTIME_FIELD};")]);
    let property = format!(
        "private {ty} {RUNTIME_PROPERTY} {}",
        stmt::braced(&format!("get {}", stmt::braced(&getter)))
    );
    (field, property)
}

// ---------------------------------------------------------------------------
// Dynamic variable access
// ---------------------------------------------------------------------------

/// `GetVariable`/`SetVariable` switching over declared instance variables.
fn variable_accessors(cx: &mut GenerationContext<'_>) -> Vec<String> {
    let vars: Vec<_> = cx
        .symbols
        .variables()
        .filter(|v| v.declared && v.storage == Storage::Instance)
        .filter(|v| !v.modifiers.is_static && !v.modifiers.is_const)
        .cloned()
        .collect();
    let class = &cx.graph().class;
    let mut get_cases = Vec::new();
    let mut set_cases = Vec::new();
    for v in &vars {
        // Case labels use the declared name so hosts can look variables up
        // by what the user typed.
        let declared = class
            .variables
            .iter()
            .find(|d| SymbolKey::Decl(d.id) == v.key)
            .map(|d| d.name.as_str())
            .unwrap_or(&v.name);
        let label = expr::string_literal(declared);
        let ty = cx.type_name(&v.ty);
        get_cases.push(SwitchCase {
            labels: vec![label.clone()],
            body: stmt::return_value(Some(&v.name)).into_text(),
        });
        set_cases.push(SwitchCase {
            labels: vec![label],
            body: stmt::assign(&v.name, &format!("({ty})value"), Default::default()).into_text(),
        });
    }
    let get_name = cx.generate_name("GetVariable");
    let set_name = cx.generate_name("SetVariable");
    let object = cx.literal(&Literal::Null);
    let get_body = stmt::lines([
        stmt::switch("name", &get_cases, None).into_text(),
        stmt::return_value(Some(&object)).into_text(),
    ]);
    let set_body = stmt::switch("name", &set_cases, None).into_text();
    vec![
        format!("public object {get_name}(string name) {}", stmt::braced(&get_body)),
        format!(
            "public void {set_name}(string name, object value) {}",
            stmt::braced(&set_body)
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_with_namespace_and_usings() {
        let types = vec!["public class A {}".to_string()];
        let usings = vec!["System".to_string(), "UnityEngine".to_string()];
        let text = assemble_file(&types, &usings, Some("Game"), false);
        insta::assert_snapshot!(text.trim_end(), @r###"
        using System;
        using UnityEngine;

        namespace Game {
            public class A {}
        }
        "###);
    }

    #[test]
    fn file_header_without_namespace() {
        let text = assemble_file(&["class A {}".to_string()], &[], None, true);
        assert!(text.starts_with("// <auto-generated>"));
        assert!(text.contains("#pragma warning disable\n\nclass A {}"));
    }

    #[test]
    fn type_groups_fields_and_spaces_members() {
        let parts = TypeParts {
            attributes: vec!["[Serializable]".to_string()],
            declaration: "public class Player".to_string(),
            fields: vec!["public int hp;".to_string(), "private int mp;".to_string()],
            properties: vec![],
            constructors: vec![],
            methods: vec!["void A() {}".to_string(), "void B() {}".to_string()],
        };
        insta::assert_snapshot!(assemble_type(&parts), @r###"
        [Serializable]
        public class Player {
            public int hp;
            private int mp;

            void A() {}

            void B() {}
        }
        "###);
    }
}
