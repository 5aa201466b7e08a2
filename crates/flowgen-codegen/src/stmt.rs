//! Statement and control-flow builders.
//!
//! Every function here is a pure text transform: emitted expressions and
//! nested bodies in, a [`Fragment`] out. Nothing touches symbols or
//! connectivity, so each builder is testable in isolation. Nested bodies are
//! re-indented mechanically by [`indent`].

use std::fmt;

use flowgen_core::ops::{OperatorKind, OperatorShape, SetOp};

use crate::error::CodegenError;

const INDENT: &str = "    ";

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Expression,
    Statement,
    /// A statement that owns a braced body.
    Block,
}

/// Emitted text plus what kind of syntax it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub kind: FragmentKind,
}

impl Fragment {
    pub fn expression(text: impl Into<String>) -> Self {
        Fragment {
            text: text.into(),
            kind: FragmentKind::Expression,
        }
    }

    pub fn statement(text: impl Into<String>) -> Self {
        Fragment {
            text: text.into(),
            kind: FragmentKind::Statement,
        }
    }

    pub fn block(text: impl Into<String>) -> Self {
        Fragment {
            text: text.into(),
            kind: FragmentKind::Block,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The same fragment shifted right by `levels`.
    pub fn indented(&self, levels: usize) -> Fragment {
        Fragment {
            text: indent(&self.text, levels),
            kind: self.kind,
        }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<Fragment> for String {
    fn from(fragment: Fragment) -> String {
        fragment.text
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Prefixes every non-blank line with `levels` indentation steps.
pub fn indent(text: &str, levels: usize) -> String {
    if levels == 0 {
        return text.to_string();
    }
    let prefix = INDENT.repeat(levels);
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Joins the non-empty parts with newlines.
pub fn lines<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter(|p| !p.as_ref().trim().is_empty())
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `{}` for an empty body, otherwise the body indented inside braces.
pub fn braced(body: &str) -> String {
    if body.trim().is_empty() {
        "{}".to_string()
    } else {
        format!("{{\n{}\n}}", indent(body, 1))
    }
}

/// `true` when `expr` needs no parentheses to be used as an operand: no
/// whitespace outside brackets and string or char literals.
pub fn is_atomic(expr: &str) -> bool {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in expr.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => return false,
            _ => {}
        }
    }
    true
}

/// Wraps `expr` in parentheses unless it is atomic.
pub fn operand(expr: &str) -> String {
    if is_atomic(expr) {
        expr.to_string()
    } else {
        format!("({expr})")
    }
}

/// `true` when the last statement of `body` transfers control, so a switch
/// section needs no trailing `break`.
pub fn ends_with_jump(body: &str) -> bool {
    let Some(last) = body.lines().rev().find(|l| !l.trim().is_empty()) else {
        return false;
    };
    let last = crate::markers::strip_tokens(last);
    let last = last.trim();
    ["return;", "return ", "break;", "continue;", "yield break;", "throw ", "goto "]
        .iter()
        .any(|kw| last.starts_with(kw))
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// `expr;`
pub fn invoke(expr: &str) -> Fragment {
    Fragment::statement(format!("{expr};"))
}

pub fn if_else(condition: &str, then_body: &str, else_body: Option<&str>) -> Fragment {
    let mut text = format!("if ({condition}) {}", braced(then_body));
    if let Some(else_body) = else_body.filter(|b| !b.trim().is_empty()) {
        let trimmed = else_body.trim();
        // A lone nested `if` chains as `else if`.
        if is_single_if(trimmed) {
            text.push_str(&format!(" else {trimmed}"));
        } else {
            text.push_str(&format!(" else {}", braced(else_body)));
        }
    }
    Fragment::block(text)
}

fn is_single_if(body: &str) -> bool {
    if !body.starts_with("if (") {
        return false;
    }
    // The nested `if` (with its own else chain) must be the only statement.
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let rest = body[i + 1..].trim_start();
                    if rest.is_empty() {
                        return true;
                    }
                    if !rest.starts_with("else") {
                        return false;
                    }
                }
            }
            _ => {}
        }
    }
    false
}

/// One section of a switch statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    pub labels: Vec<String>,
    pub body: String,
}

pub fn switch(value: &str, cases: &[SwitchCase], default: Option<&str>) -> Fragment {
    let mut sections = Vec::new();
    for case in cases.iter().filter(|c| !c.labels.is_empty()) {
        let labels = case
            .labels
            .iter()
            .map(|l| format!("case {l}:"))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("{labels}\n{}", indent(&section_body(&case.body), 1)));
    }
    if let Some(default) = default {
        sections.push(format!("default:\n{}", indent(&section_body(default), 1)));
    }
    if sections.is_empty() {
        return Fragment::block(format!("switch ({value}) {{}}"));
    }
    Fragment::block(format!(
        "switch ({value}) {{\n{}\n}}",
        indent(&sections.join("\n"), 1)
    ))
}

fn section_body(body: &str) -> String {
    if ends_with_jump(body) {
        body.to_string()
    } else {
        lines([body, "break;"])
    }
}

pub fn for_loop(init: &str, condition: &str, step: &str, body: &str) -> Fragment {
    Fragment::block(format!("for ({init}; {condition}; {step}) {}", braced(body)))
}

pub fn foreach(ty: &str, name: &str, collection: &str, body: &str) -> Fragment {
    Fragment::block(format!("foreach ({ty} {name} in {collection}) {}", braced(body)))
}

pub fn while_loop(condition: &str, body: &str) -> Fragment {
    Fragment::block(format!("while ({condition}) {}", braced(body)))
}

/// A bare scope block.
pub fn block(body: &str) -> Fragment {
    Fragment::block(braced(body))
}

/// Body of a lambda expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaBody<'a> {
    Expression(&'a str),
    Statements(&'a str),
}

pub fn lambda(params: &[String], body: LambdaBody<'_>) -> Fragment {
    let params = if params.len() == 1 && !params[0].contains(' ') {
        params[0].clone()
    } else {
        format!("({})", params.join(", "))
    };
    match body {
        LambdaBody::Expression(expr) => Fragment::expression(format!("{params} => {expr}")),
        LambdaBody::Statements(stmts) => {
            Fragment::expression(format!("{params} => {}", braced(stmts)))
        }
    }
}

/// `left op= right;`
pub fn assign(left: &str, right: &str, op: SetOp) -> Fragment {
    Fragment::statement(format!("{left} {} {right};", op.symbol()))
}

/// Assignment routed through a setter call, for targets that cannot be
/// assigned directly. Compound operators read `current` first.
pub fn set_via_call(setter: &str, leading_args: &[String], current: &str, value: &str, op: SetOp) -> Fragment {
    let value = match op.binary() {
        Some(bin) => format!("{} {} {}", operand(current), bin.symbol(), operand(value)),
        None => value.to_string(),
    };
    let mut args = leading_args.to_vec();
    args.push(value);
    Fragment::statement(format!("{setter}({});", args.join(", ")))
}

/// Local declaration, `ty name = init;` or `ty name;`.
pub fn local(ty: &str, name: &str, init: Option<&str>) -> Fragment {
    match init {
        Some(init) => Fragment::statement(format!("{ty} {name} = {init};")),
        None => Fragment::statement(format!("{ty} {name};")),
    }
}

pub fn return_value(value: Option<&str>) -> Fragment {
    match value {
        Some(v) => Fragment::statement(format!("return {v};")),
        None => Fragment::statement("return;"),
    }
}

pub fn yield_return(value: &str) -> Fragment {
    Fragment::statement(format!("yield return {value};"))
}

pub fn yield_break() -> Fragment {
    Fragment::statement("yield break;")
}

pub fn break_loop() -> Fragment {
    Fragment::statement("break;")
}

pub fn continue_loop() -> Fragment {
    Fragment::statement("continue;")
}

/// A comment that cannot terminate early.
pub fn placeholder(text: &str) -> Fragment {
    let clean = text.replace("*/", "* /").replace("/*", "/ *").replace('\n', " ");
    Fragment::statement(format!("/* {clean} */"))
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Native operator syntax. Conversions need the target type in `cast_to`.
pub fn operator(op: OperatorKind, operands: &[String], cast_to: Option<&str>) -> Result<Fragment, CodegenError> {
    if operands.len() != op.arity() {
        return Err(CodegenError::invalid(
            format!("operator {}", op.method_name()),
            format!("expects {} operand(s), got {}", op.arity(), operands.len()),
        ));
    }
    let text = match op.shape() {
        OperatorShape::Infix => format!(
            "({} {} {})",
            operand(&operands[0]),
            op.symbol(),
            operand(&operands[1])
        ),
        OperatorShape::Prefix => format!("{}{}", op.symbol(), operand(&operands[0])),
        OperatorShape::Conversion => {
            let ty = cast_to.ok_or_else(|| {
                CodegenError::invalid(format!("operator {}", op.method_name()), "needs a target type")
            })?;
            format!("(({ty}){})", operand(&operands[0]))
        }
    };
    Ok(Fragment::expression(text))
}
