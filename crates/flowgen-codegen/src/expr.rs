//! Expression emission: types, literals and member references.
//!
//! [`emit_value`] branches on what a [`MemberRef`] points at. Member chains
//! are folded left to right; operator methods become native operator syntax,
//! indexers become subscripts, and members that are not publicly accessible
//! go through the runtime's dynamic `GetValue`/`SetValue`/`Invoke` helpers.
//!
//! By-ref arguments that cannot be passed directly (properties, indexers,
//! fields of value-typed intermediates) are routed through a temporary. The
//! temporary's declaration and write-back are spliced around the statement
//! being emitted via [`GenerationContext::splice`].

use flowgen_core::literal::Literal;
use flowgen_core::member::{
    ChainRoot, CollectionKind, MemberChain, MemberItem, MemberKind, MemberRef, ParamInfo,
    ParamModifier,
};
use flowgen_core::ops::{OperatorKind, SetOp};
use flowgen_core::types::TypeRef;

use crate::context::GenerationContext;
use crate::error::CodegenError;
use crate::markers::strip_tokens;
use crate::stmt;
use crate::usings::UsingRegistry;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Target-language spelling of `ty`, registering the usings it needs.
pub fn type_name(usings: &mut UsingRegistry, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Void => "void".to_string(),
        TypeRef::Primitive(p) => p.keyword().to_string(),
        TypeRef::Named {
            namespace,
            name,
            generics,
            ..
        } => {
            let base = usings.qualify(namespace.as_deref(), name);
            if generics.is_empty() {
                base
            } else {
                let args: Vec<String> = generics.iter().map(|g| type_name(usings, g)).collect();
                format!("{base}<{}>", args.join(", "))
            }
        }
        TypeRef::Array { element, rank } => {
            let commas = ",".repeat(usize::from(rank.saturating_sub(1)));
            format!("{}[{commas}]", type_name(usings, element))
        }
        TypeRef::Nullable(inner) => format!("{}?", type_name(usings, inner)),
        TypeRef::GenericParam(name) | TypeRef::Generated(name) => name.clone(),
    }
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

pub fn literal(usings: &mut UsingRegistry, lit: &Literal) -> String {
    use flowgen_core::types::Primitive as P;

    match lit {
        Literal::Null => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Char(c) => char_literal(*c),
        Literal::String(s) => string_literal(s),
        Literal::Integer { value, ty } => match ty {
            P::Long => format!("{value}L"),
            P::Short | P::SByte | P::Byte | P::UShort => format!("({}){value}", ty.keyword()),
            _ => value.to_string(),
        },
        Literal::Unsigned { value, ty } => match ty {
            P::UInt => format!("{value}U"),
            P::ULong => format!("{value}UL"),
            P::UShort | P::Byte | P::Short | P::SByte => format!("({}){value}", ty.keyword()),
            _ => value.to_string(),
        },
        Literal::Float(v) => float_literal(*v),
        Literal::Double(v) => double_literal(*v),
        Literal::Decimal(text) => format!("{text}m"),
        Literal::Enum { ty, variant } => format!("{}.{variant}", type_name(usings, ty)),
        Literal::Struct { ty, components } => {
            let name = type_name(usings, ty);
            match ty.simple_name().and_then(|n| struct_shortcut(n, components)) {
                Some(shortcut) => format!("{name}.{shortcut}"),
                None => {
                    let args: Vec<String> = components.iter().map(|c| float_literal(*c)).collect();
                    format!("new {name}({})", args.join(", "))
                }
            }
        }
        Literal::Array { element, items } => {
            let items: Vec<String> = items.iter().map(|i| literal(usings, i)).collect();
            array_initializer(&type_name(usings, element), &items)
        }
        Literal::List { element, items } => {
            let items: Vec<String> = items.iter().map(|i| literal(usings, i)).collect();
            list_initializer(&type_name(usings, &TypeRef::list_of(element.clone())), &items)
        }
        Literal::Default(ty) => format!("default({})", type_name(usings, ty)),
    }
}

fn float_literal(v: f64) -> String {
    let f = v as f32;
    if f.is_nan() {
        "float.NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "float.PositiveInfinity".to_string()
        } else {
            "float.NegativeInfinity".to_string()
        }
    } else {
        format!("{f}f")
    }
}

fn double_literal(v: f64) -> String {
    if v.is_nan() {
        "double.NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "double.PositiveInfinity".to_string()
        } else {
            "double.NegativeInfinity".to_string()
        }
    } else {
        format!("{v}D")
    }
}

/// Quoted string with escapes. `/*` is split so string contents can never
/// be mistaken for a source marker or open a comment.
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut prev = '\0';
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '*' if prev == '/' => out.push_str("\\u002A"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
        prev = c;
    }
    out.push('"');
    out
}

pub fn char_literal(c: char) -> String {
    match c {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\r' => "'\\r'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\0' => "'\\0'".to_string(),
        c if c.is_control() => format!("'\\u{:04X}'", c as u32),
        c => format!("'{c}'"),
    }
}

/// Well-known constants of vector, colour and rotation structs.
const STRUCT_SHORTCUTS: &[(&str, &[f64], &str)] = &[
    ("Vector2", &[0.0, 0.0], "zero"),
    ("Vector2", &[1.0, 1.0], "one"),
    ("Vector2", &[0.0, 1.0], "up"),
    ("Vector2", &[0.0, -1.0], "down"),
    ("Vector2", &[1.0, 0.0], "right"),
    ("Vector2", &[-1.0, 0.0], "left"),
    ("Vector3", &[0.0, 0.0, 0.0], "zero"),
    ("Vector3", &[1.0, 1.0, 1.0], "one"),
    ("Vector3", &[0.0, 1.0, 0.0], "up"),
    ("Vector3", &[0.0, -1.0, 0.0], "down"),
    ("Vector3", &[1.0, 0.0, 0.0], "right"),
    ("Vector3", &[-1.0, 0.0, 0.0], "left"),
    ("Vector3", &[0.0, 0.0, 1.0], "forward"),
    ("Vector3", &[0.0, 0.0, -1.0], "back"),
    ("Vector4", &[0.0, 0.0, 0.0, 0.0], "zero"),
    ("Vector4", &[1.0, 1.0, 1.0, 1.0], "one"),
    ("Color", &[1.0, 0.0, 0.0, 1.0], "red"),
    ("Color", &[0.0, 1.0, 0.0, 1.0], "green"),
    ("Color", &[0.0, 0.0, 1.0, 1.0], "blue"),
    ("Color", &[1.0, 1.0, 1.0, 1.0], "white"),
    ("Color", &[0.0, 0.0, 0.0, 1.0], "black"),
    ("Color", &[0.0, 1.0, 1.0, 1.0], "cyan"),
    ("Color", &[1.0, 0.0, 1.0, 1.0], "magenta"),
    ("Color", &[0.0, 0.0, 0.0, 0.0], "clear"),
    ("Color", &[0.5, 0.5, 0.5, 1.0], "gray"),
    ("Quaternion", &[0.0, 0.0, 0.0, 1.0], "identity"),
];

fn struct_shortcut(name: &str, components: &[f64]) -> Option<&'static str> {
    STRUCT_SHORTCUTS
        .iter()
        .find(|(ty, values, _)| *ty == name && *values == components)
        .map(|(_, _, shortcut)| *shortcut)
}

fn array_initializer(element: &str, items: &[String]) -> String {
    if items.is_empty() {
        format!("new {element}[0]")
    } else {
        format!("new {element}[] {{ {} }}", items.join(", "))
    }
}

fn list_initializer(list: &str, items: &[String]) -> String {
    if items.is_empty() {
        format!("new {list}()")
    } else {
        format!("new {list}() {{ {} }}", items.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Member references
// ---------------------------------------------------------------------------

/// Expression text for a member reference.
pub fn emit_value(cx: &mut GenerationContext<'_>, value: &MemberRef) -> Result<String, CodegenError> {
    match value {
        MemberRef::Unassigned => Err(CodegenError::UnresolvedReference {
            reference: "unassigned value port".to_string(),
            declaration: cx.owner_name().to_string(),
        }),
        MemberRef::Literal(lit) => Ok(cx.literal(lit)),
        MemberRef::Variable(var) => cx.variable_ref(var),
        MemberRef::Type(ty) => Ok(format!("typeof({})", cx.type_name(ty))),
        MemberRef::This => this_text(cx),
        MemberRef::NodeOutput { node, port } => cx.emit_node_value(*node, *port),
        MemberRef::Collection {
            kind,
            element,
            items,
        } => {
            let items = items
                .iter()
                .map(|item| emit_value(cx, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match kind {
                CollectionKind::Array => array_initializer(&cx.type_name(element), &items),
                CollectionKind::List => {
                    list_initializer(&cx.type_name(&TypeRef::list_of(element.clone())), &items)
                }
            })
        }
        MemberRef::Chain(chain) => {
            let current = fold_chain(cx, chain, chain.items.len())?;
            finish(cx, current)
        }
    }
}

/// Partially folded chain.
enum Current {
    Type(String),
    Value(String),
    This,
}

fn this_text(cx: &GenerationContext<'_>) -> Result<String, CodegenError> {
    if cx.is_static() {
        return Err(CodegenError::invalid("`this`", format!("in static member {}", cx.owner_name())));
    }
    Ok("this".to_string())
}

/// The value a folded chain denotes.
fn finish(cx: &GenerationContext<'_>, current: Current) -> Result<String, CodegenError> {
    match current {
        Current::Value(text) => Ok(text),
        Current::Type(ty) => Ok(format!("typeof({ty})")),
        Current::This => this_text(cx),
    }
}

/// The receiver text for a runtime helper call.
fn target_text(cx: &GenerationContext<'_>, current: &Current) -> Result<String, CodegenError> {
    match current {
        Current::Type(ty) => Ok(format!("typeof({ty})")),
        Current::Value(v) => Ok(stmt::operand(v)),
        Current::This => this_text(cx),
    }
}

fn fold_chain(cx: &mut GenerationContext<'_>, chain: &MemberChain, count: usize) -> Result<Current, CodegenError> {
    let mut current = match &chain.root {
        ChainRoot::Static(ty) => Current::Type(cx.type_name(ty)),
        ChainRoot::Instance(inner) => Current::Value(stmt::operand(&emit_value(cx, inner)?)),
        ChainRoot::This => Current::This,
    };
    for (index, item) in chain.items.iter().take(count).enumerate() {
        current = apply(cx, current, item, index)?;
    }
    Ok(current)
}

fn member_name(cx: &GenerationContext<'_>, item: &MemberItem) -> Result<String, CodegenError> {
    match item.decl {
        Some(decl) => cx.decl_name(decl).ok_or_else(|| CodegenError::UnresolvedReference {
            reference: format!("member `{}` (declaration {decl})", item.name),
            declaration: cx.owner_name().to_string(),
        }),
        None => Ok(item.name.clone()),
    }
}

fn apply(
    cx: &mut GenerationContext<'_>,
    current: Current,
    item: &MemberItem,
    index: usize,
) -> Result<Current, CodegenError> {
    let text = match item.kind {
        MemberKind::Field | MemberKind::Property => {
            let name = member_name(cx, item)?;
            if item.reflected {
                let target = target_text(cx, &current)?;
                let ty = cx.type_name(&item.value_type);
                format!("{}.GetValue<{ty}>({target}, {})", cx.runtime(), string_literal(&name))
            } else {
                access(&current, &name)
            }
        }
        MemberKind::Method => {
            let name = member_name(cx, item)?;
            let args = emit_args(cx, item)?;
            if item.reflected {
                let target = target_text(cx, &current)?;
                let mut call_args = vec![target, string_literal(&name)];
                call_args.extend(args);
                let generic = if item.value_type.is_void() {
                    String::new()
                } else {
                    format!("<{}>", cx.type_name(&item.value_type))
                };
                format!("{}.Invoke{generic}({})", cx.runtime(), call_args.join(", "))
            } else {
                let generics = generic_args(cx, &item.generic_args);
                format!("{}{generics}({})", access(&current, &name), args.join(", "))
            }
        }
        MemberKind::Constructor => {
            if index > 0 {
                return Err(CodegenError::invalid(
                    format!("constructor of {}", cx.type_name(&item.value_type)),
                    "must start a member chain",
                ));
            }
            let args = emit_args(cx, item)?;
            format!("new {}({})", cx.type_name(&item.value_type), args.join(", "))
        }
        MemberKind::Indexer => {
            let target = target_text(cx, &current)?;
            let args = emit_args(cx, item)?;
            format!("{target}[{}]", args.join(", "))
        }
        MemberKind::Operator => {
            let op = OperatorKind::from_method_name(&item.name).ok_or_else(|| {
                CodegenError::invalid(format!("operator `{}`", item.name), "is not a known operator method")
            })?;
            let mut operands = match &current {
                Current::Type(_) => Vec::new(),
                other => vec![target_text(cx, other)?],
            };
            operands.extend(emit_args(cx, item)?);
            let cast = cx.type_name(&item.value_type);
            stmt::operator(op, &operands, Some(&cast))?.into_text()
        }
    };
    Ok(Current::Value(text))
}

/// `a.name`, `T.name`, or the bare member name on the generated class.
fn access(current: &Current, name: &str) -> String {
    match current {
        Current::Type(ty) => format!("{ty}.{name}"),
        Current::Value(v) => format!("{}.{name}", stmt::operand(v)),
        Current::This => name.to_string(),
    }
}

fn generic_args(cx: &mut GenerationContext<'_>, generics: &[TypeRef]) -> String {
    if generics.is_empty() {
        return String::new();
    }
    let names: Vec<String> = generics.iter().map(|g| cx.type_name(g)).collect();
    format!("<{}>", names.join(", "))
}

fn emit_args(cx: &mut GenerationContext<'_>, item: &MemberItem) -> Result<Vec<String>, CodegenError> {
    let mut out = Vec::with_capacity(item.args.len());
    for (i, arg) in item.args.iter().enumerate() {
        let param = item.params.get(i);
        let modifier = param.map(|p| p.modifier).unwrap_or_default();
        let text = match (modifier.is_by_ref(), param) {
            (true, Some(param)) => by_ref_arg(cx, arg, param)?,
            _ => format!("{}{}", modifier.call_prefix(), emit_value(cx, arg)?),
        };
        out.push(text);
    }
    Ok(out)
}

/// `ref x` / `out x`, through a temporary when `arg` is not directly
/// assignable by reference.
fn by_ref_arg(cx: &mut GenerationContext<'_>, arg: &MemberRef, param: &ParamInfo) -> Result<String, CodegenError> {
    let prefix = param.modifier.call_prefix();
    match arg {
        MemberRef::Variable(var) => Ok(format!("{prefix}{}", cx.variable_ref(var)?)),
        MemberRef::NodeOutput { .. } => {
            let text = emit_value(cx, arg)?;
            if is_identifier(&strip_tokens(&text)) {
                Ok(format!("{prefix}{text}"))
            } else {
                Err(CodegenError::invalid(
                    format!("{}argument `{}`", prefix, param.name),
                    "is not assignable",
                ))
            }
        }
        MemberRef::Chain(chain) if is_assignable(chain) => {
            if !needs_temporary(chain) {
                return Ok(format!("{prefix}{}", emit_value(cx, arg)?));
            }
            let tmp = cx.generate_name("temp");
            let ty = cx.type_name(&param.ty);
            let enter = if param.modifier == ParamModifier::Out {
                format!("{ty} {tmp};")
            } else {
                format!("{ty} {tmp} = {};", emit_value(cx, arg)?)
            };
            let exit = emit_assignment(cx, arg, &tmp, SetOp::Assign)?;
            cx.splice(enter, Some(exit))?;
            Ok(format!("{prefix}{tmp}"))
        }
        _ => Err(CodegenError::invalid(
            format!("{}argument `{}`", prefix, param.name),
            "is not assignable",
        )),
    }
}

fn is_assignable(chain: &MemberChain) -> bool {
    chain.items.last().is_some_and(|last| {
        matches!(
            last.kind,
            MemberKind::Field | MemberKind::Property | MemberKind::Indexer
        )
    })
}

/// Only a plain field reached through reference types can be passed by
/// reference directly.
fn needs_temporary(chain: &MemberChain) -> bool {
    let Some((last, rest)) = chain.items.split_last() else {
        return false;
    };
    last.kind != MemberKind::Field
        || last.reflected
        || rest.iter().any(|item| item.value_type.is_value_type())
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '@')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Assignment statement storing `value` into `target`.
pub fn emit_assignment(
    cx: &mut GenerationContext<'_>,
    target: &MemberRef,
    value: &str,
    op: SetOp,
) -> Result<String, CodegenError> {
    match target {
        MemberRef::Variable(var) => {
            let name = cx.variable_ref(var)?;
            Ok(stmt::assign(&name, value, op).into_text())
        }
        MemberRef::NodeOutput { .. } => {
            let text = emit_value(cx, target)?;
            if !is_identifier(&strip_tokens(&text)) {
                return Err(CodegenError::invalid("assignment target", format!("`{text}` is not assignable")));
            }
            Ok(stmt::assign(&text, value, op).into_text())
        }
        MemberRef::Chain(chain) if is_assignable(chain) => {
            let Some(last) = chain.items.last() else {
                return Err(CodegenError::invalid("assignment target", "empty member chain"));
            };
            if last.reflected && last.kind != MemberKind::Indexer {
                let owner = fold_chain(cx, chain, chain.items.len() - 1)?;
                let owner = target_text(cx, &owner)?;
                let name = member_name(cx, last)?;
                let current = if op == SetOp::Assign {
                    String::new()
                } else {
                    emit_value(cx, target)?
                };
                let setter = format!("{}.SetValue", cx.runtime());
                return Ok(stmt::set_via_call(&setter, &[owner, string_literal(&name)], &current, value, op).into_text());
            }
            let text = emit_value(cx, target)?;
            Ok(stmt::assign(&text, value, op).into_text())
        }
        MemberRef::Chain(chain) => Err(CodegenError::invalid(
            "assignment target",
            match chain.items.last() {
                Some(last) => format!("member `{}` is not assignable", last.name),
                None => "a bare type or `this` is not assignable".to_string(),
            },
        )),
        _ => Err(CodegenError::invalid("assignment target", "is not a variable or member")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgen_core::decl::{ClassDecl, VariableDecl};
    use flowgen_core::id::DeclId;
    use flowgen_core::member::VariableRef;
    use flowgen_core::types::{Modifiers, Primitive};

    use crate::test_support::{empty_graph, with_cx};

    fn vector3() -> TypeRef {
        TypeRef::structure("UnityEngine", "Vector3")
    }

    #[test]
    fn type_names() {
        let mut usings = UsingRegistry::new(None);
        assert_eq!(type_name(&mut usings, &TypeRef::INT), "int");
        assert_eq!(type_name(&mut usings, &TypeRef::list_of(vector3())), "List<Vector3>");
        assert_eq!(
            type_name(&mut usings, &TypeRef::Array { element: Box::new(TypeRef::FLOAT), rank: 2 }),
            "float[,]"
        );
        assert_eq!(type_name(&mut usings, &TypeRef::Nullable(Box::new(TypeRef::INT))), "int?");
        assert_eq!(
            usings.sorted(),
            vec!["System.Collections.Generic".to_string(), "UnityEngine".to_string()]
        );
    }

    #[test]
    fn numeric_literals() {
        let mut u = UsingRegistry::new(None);
        assert_eq!(literal(&mut u, &Literal::int(5)), "5");
        assert_eq!(literal(&mut u, &Literal::Integer { value: 5, ty: Primitive::Long }), "5L");
        assert_eq!(literal(&mut u, &Literal::Integer { value: -2, ty: Primitive::Short }), "(short)-2");
        assert_eq!(literal(&mut u, &Literal::Unsigned { value: 7, ty: Primitive::UInt }), "7U");
        assert_eq!(literal(&mut u, &Literal::Unsigned { value: 7, ty: Primitive::ULong }), "7UL");
        assert_eq!(literal(&mut u, &Literal::Unsigned { value: 7, ty: Primitive::Byte }), "(byte)7");
        assert_eq!(literal(&mut u, &Literal::Float(1.0)), "1f");
        assert_eq!(literal(&mut u, &Literal::Float(0.25)), "0.25f");
        assert_eq!(literal(&mut u, &Literal::Float(f64::NAN)), "float.NaN");
        assert_eq!(literal(&mut u, &Literal::Float(f64::NEG_INFINITY)), "float.NegativeInfinity");
        assert_eq!(literal(&mut u, &Literal::Double(1.5)), "1.5D");
        assert_eq!(literal(&mut u, &Literal::Decimal("2.50".into())), "2.50m");
    }

    #[test]
    fn text_literals() {
        let mut u = UsingRegistry::new(None);
        assert_eq!(literal(&mut u, &Literal::string("a\"b\\c\n")), r#""a\"b\\c\n""#);
        assert_eq!(literal(&mut u, &Literal::string("/*#<n1*/")), r#""/\u002A#<n1*/""#);
        assert_eq!(literal(&mut u, &Literal::Char('\'')), r"'\''");
        assert_eq!(literal(&mut u, &Literal::Bool(true)), "true");
        assert_eq!(literal(&mut u, &Literal::Null), "null");
    }

    #[test]
    fn struct_literals_use_shortcuts() {
        let mut u = UsingRegistry::new(None);
        let up = Literal::structure(vector3(), &[0.0, 1.0, 0.0]);
        assert_eq!(literal(&mut u, &up), "Vector3.up");
        let red = Literal::structure(TypeRef::structure("UnityEngine", "Color"), &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(literal(&mut u, &red), "Color.red");
        let other = Literal::structure(vector3(), &[1.0, 2.5, 3.0]);
        assert_eq!(literal(&mut u, &other), "new Vector3(1f, 2.5f, 3f)");
    }

    #[test]
    fn collection_and_enum_literals() {
        let mut u = UsingRegistry::new(None);
        let arr = Literal::Array { element: TypeRef::INT, items: vec![Literal::int(1), Literal::int(2)] };
        assert_eq!(literal(&mut u, &arr), "new int[] { 1, 2 }");
        let empty = Literal::List { element: TypeRef::STRING, items: vec![] };
        assert_eq!(literal(&mut u, &empty), "new List<string>()");
        let key = Literal::Enum { ty: TypeRef::enumeration("UnityEngine", "KeyCode"), variant: "Space".into() };
        assert_eq!(literal(&mut u, &key), "KeyCode.Space");
        assert_eq!(literal(&mut u, &Literal::Default(vector3())), "default(Vector3)");
    }

    #[test]
    fn unassigned_reference_names_the_declaration() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let err = emit_value(cx, &MemberRef::Unassigned).unwrap_err();
            match err {
                CodegenError::UnresolvedReference { declaration, .. } => assert_eq!(declaration, "Test"),
                other => panic!("unexpected {other:?}"),
            }
        });
    }

    #[test]
    fn method_chain_with_generics() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let get = MemberItem::method(
                "GetComponent",
                TypeRef::class("UnityEngine", "Rigidbody"),
                vec![],
                vec![],
            )
            .with_generics(vec![TypeRef::class("UnityEngine", "Rigidbody")]);
            let chain = MemberRef::this_chain(vec![get, MemberItem::property("mass", TypeRef::FLOAT)]);
            assert_eq!(emit_value(cx, &chain).unwrap(), "GetComponent<Rigidbody>().mass");
        });
    }

    #[test]
    fn operator_methods_become_infix() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let add = MemberItem::operator(
                OperatorKind::Add,
                vector3(),
                vec![
                    MemberRef::literal(Literal::structure(vector3(), &[0.0, 0.0, 0.0])),
                    MemberRef::literal(Literal::structure(vector3(), &[1.0, 1.0, 1.0])),
                ],
            );
            let value = MemberRef::static_chain(vector3(), vec![add]);
            assert_eq!(emit_value(cx, &value).unwrap(), "(Vector3.zero + Vector3.one)");
        });
    }

    #[test]
    fn unknown_operator_method_is_invalid() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let mut item = MemberItem::operator(OperatorKind::Add, TypeRef::INT, vec![]);
            item.name = "op_Custom".into();
            let value = MemberRef::static_chain(TypeRef::INT, vec![item]);
            assert!(matches!(emit_value(cx, &value), Err(CodegenError::InvalidTarget { .. })));
        });
    }

    #[test]
    fn indexers_and_constructors() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let ctor = MemberItem::constructor(
                TypeRef::list_of(TypeRef::INT),
                vec![],
                vec![],
            );
            let index = MemberItem::indexer(
                TypeRef::INT,
                vec![ParamInfo::new("index", TypeRef::INT)],
                vec![MemberRef::literal(Literal::int(0))],
            );
            let value = MemberRef::static_chain(TypeRef::list_of(TypeRef::INT), vec![ctor, index]);
            assert_eq!(emit_value(cx, &value).unwrap(), "(new List<int>())[0]");
        });
    }

    #[test]
    fn reflected_members_use_runtime_helpers() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let hidden = MemberItem::field("secret", TypeRef::INT).reflected();
            let value = MemberRef::this_chain(vec![hidden]);
            assert_eq!(emit_value(cx, &value).unwrap(), "__rt.GetValue<int>(this, \"secret\")");
            let set = emit_assignment(cx, &value, "3", SetOp::Add).unwrap();
            assert_eq!(
                set,
                "__rt.SetValue(this, \"secret\", __rt.GetValue<int>(this, \"secret\") + 3);"
            );
        });
    }

    #[test]
    fn ref_argument_to_property_uses_temporary() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let position = MemberRef::this_chain(vec![MemberItem::property("position", vector3())]);
            let call = MemberItem::method(
                "Clamp",
                TypeRef::Void,
                vec![ParamInfo::by_ref("v", vector3(), ParamModifier::Ref)],
                vec![position],
            );
            let value = MemberRef::static_chain(TypeRef::class("Game", "Util"), vec![call]);
            let text = cx
                .with_splice(|cx| Ok(format!("{};", emit_value(cx, &value)?)))
                .unwrap();
            assert_eq!(
                text,
                "Vector3 temp = position;\nUtil.Clamp(ref temp);\nposition = temp;"
            );
        });
    }

    #[test]
    fn ref_argument_without_statement_is_invalid() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let position = MemberRef::this_chain(vec![MemberItem::property("position", vector3())]);
            let call = MemberItem::method(
                "Clamp",
                TypeRef::Void,
                vec![ParamInfo::by_ref("v", vector3(), ParamModifier::Ref)],
                vec![position],
            );
            let value = MemberRef::static_chain(TypeRef::class("Game", "Util"), vec![call]);
            assert!(matches!(emit_value(cx, &value), Err(CodegenError::InvalidTarget { .. })));
        });
    }

    #[test]
    fn declared_field_uses_registered_name() {
        let mut class = ClassDecl::new("Test");
        class.variables.push(VariableDecl {
            id: DeclId(1),
            name: "class".into(),
            ty: TypeRef::INT,
            default: None,
            modifiers: Modifiers::public(),
            attributes: vec![],
        });
        let graph = crate::node::Graph::new("Test", class);
        with_cx(&graph, |cx| {
            let field = MemberRef::Variable(VariableRef::Field(DeclId(1)));
            assert_eq!(emit_value(cx, &field).unwrap(), "@class");
            let set = emit_assignment(cx, &field, "2", SetOp::Multiply).unwrap();
            assert_eq!(set, "@class *= 2;");
        });
    }

    #[test]
    fn bare_type_is_not_assignable() {
        let graph = empty_graph();
        with_cx(&graph, |cx| {
            let ty = MemberRef::static_chain(TypeRef::INT, vec![]);
            assert!(emit_assignment(cx, &ty, "1", SetOp::Assign).is_err());
            assert_eq!(emit_value(cx, &ty).unwrap(), "typeof(int)");
        });
    }
}
