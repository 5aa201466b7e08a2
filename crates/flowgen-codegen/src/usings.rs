//! Using registry: decides between short and fully qualified type names.
//!
//! The first namespace to claim a short name owns it and is added to the
//! file's using list. A later type with the same short name from another
//! namespace, or one that clashes with a name declared in the generated file,
//! is written fully qualified with `global::`.

use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct UsingRegistry {
    namespaces: BTreeSet<String>,
    claimed: HashMap<String, String>,
    reserved: HashSet<String>,
    current: Option<String>,
}

impl UsingRegistry {
    /// A registry for a file declared in `current` namespace.
    pub fn new(current: Option<&str>) -> Self {
        UsingRegistry {
            current: current.map(str::to_string),
            ..UsingRegistry::default()
        }
    }

    /// Adds an explicit using.
    pub fn add(&mut self, namespace: &str) {
        if !namespace.is_empty() && self.current.as_deref() != Some(namespace) {
            self.namespaces.insert(namespace.to_string());
        }
    }

    /// Reserves a short name declared by the generated file itself.
    pub fn reserve(&mut self, name: &str) {
        self.reserved.insert(name.to_string());
    }

    /// The text to write for `name` declared in `namespace`.
    pub fn qualify(&mut self, namespace: Option<&str>, name: &str) -> String {
        let Some(ns) = namespace.filter(|ns| !ns.is_empty()) else {
            return name.to_string();
        };
        let head = name.split('.').next().unwrap_or(name);
        if self.reserved.contains(head) {
            return format!("global::{ns}.{name}");
        }
        match self.claimed.get(head) {
            Some(owner) if owner != ns => format!("global::{ns}.{name}"),
            Some(_) => name.to_string(),
            None => {
                self.claimed.insert(head.to_string(), ns.to_string());
                self.add(ns);
                name.to_string()
            }
        }
    }

    /// Usings in output order: `System` namespaces first, then the rest,
    /// each group sorted.
    pub fn sorted(&self) -> Vec<String> {
        let (mut system, mut rest): (Vec<String>, Vec<String>) = self
            .namespaces
            .iter()
            .cloned()
            .partition(|ns| ns == "System" || ns.starts_with("System."));
        system.sort();
        rest.sort();
        system.extend(rest);
        system
    }
}
