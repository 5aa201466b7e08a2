//! Collision-free identifier generation.
//!
//! [`NameRegistry::generate_name`] hands out `base`, `base1`, `base2`, ...
//! in request order. [`NameRegistry::name_for`] adds per-owner aliasing: the
//! same owner asking for the same base name always gets the same identifier,
//! while two unrelated owners asking for `value` get `value` and `value1`.

use std::collections::{HashMap, HashSet};

use flowgen_core::id::{DeclId, NodeId};

/// Who requested a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKey {
    Node(NodeId),
    Decl(DeclId),
    /// Parameter `index` of a declaration.
    Param(DeclId, usize),
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Returns `true` for reserved words of the target language.
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Turns arbitrary text into a valid identifier: invalid characters become
/// `_`, a leading digit gets a `_` prefix and keywords are escaped with `@`.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        return "_".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if is_keyword(&out) {
        out.insert(0, '@');
    }
    out
}

/// Name tables for one generated type.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    used: HashSet<String>,
    next_suffix: HashMap<String, u32>,
    aliases: HashMap<(OwnerKey, String), String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        NameRegistry::default()
    }

    /// Marks `name` as taken without generating it.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    /// Returns `base` if unused, otherwise `base` followed by the smallest
    /// numeric suffix that is unused.
    pub fn generate_name(&mut self, base: &str) -> String {
        let base = sanitize_identifier(base);
        if self.used.insert(base.clone()) {
            return base;
        }
        let counter = self.next_suffix.entry(base.clone()).or_insert(1);
        loop {
            let candidate = format!("{base}{counter}");
            *counter += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// The name `owner` uses for `base`, generated on first request.
    pub fn name_for(&mut self, owner: OwnerKey, base: &str) -> String {
        let key = (owner, base.to_string());
        if let Some(name) = self.aliases.get(&key) {
            return name.clone();
        }
        let name = self.generate_name(base);
        self.aliases.insert(key, name.clone());
        name
    }

    /// The alias `owner` already holds for `base`, if any.
    pub fn alias(&self, owner: OwnerKey, base: &str) -> Option<&str> {
        self.aliases
            .get(&(owner, base.to_string()))
            .map(String::as_str)
    }
}
