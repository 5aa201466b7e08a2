//! State units and the coroutine dispatcher.
//!
//! Every state node becomes one resumable unit with a numeric slot. Unit
//! bodies are collected into a single dispatcher method per generated type:
//!
//! ```text
//! private IEnumerator __Dispatch(int slot) {
//!     switch (slot) {
//!         case 0:
//!             ...
//!             yield break;
//!     }
//!     yield break;
//! }
//! ```
//!
//! Generated code never calls the dispatcher directly. It goes through the
//! runtime support object (`__rt.Run(0)`, `__rt.Stop(0)`, `__rt.IsRunning(0)`)
//! which owns the iterators.
//!
//! A unit whose whole body is one `yield return X;` and that never refers to
//! itself is *degenerate*: it gets no case, and its start-up call passes the
//! yielded value directly (`__rt.Run(0, X)`).

use indexmap::IndexMap;

use flowgen_core::id::NodeId;

use crate::markers::strip_tokens;
use crate::stmt::{self, SwitchCase};
use crate::symbols::{BodyId, SymbolTable};

/// Name of the generated dispatcher method.
pub const DISPATCHER: &str = "__Dispatch";
/// Name of the lazily created runtime support property.
pub const RUNTIME_PROPERTY: &str = "__rt";
/// Backing field of [`RUNTIME_PROPERTY`].
pub const RUNTIME_FIELD: &str = "__runtime";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitProgress {
    Pending,
    InProgress,
    Done,
}

#[derive(Debug, Clone)]
pub struct StateUnit {
    pub node: NodeId,
    pub slot: u32,
    pub body: BodyId,
    pub progress: UnitProgress,
    pub text: String,
    /// The unit was referenced while its own body was being emitted, so its
    /// slot must resolve through the dispatcher.
    pub referenced_in_progress: bool,
}

impl StateUnit {
    /// The yielded expression of a degenerate unit.
    pub fn degenerate_value(&self) -> Option<String> {
        if self.progress != UnitProgress::Done || self.referenced_in_progress {
            return None;
        }
        single_yield(&self.text)
    }
}

/// Returns `X` when `body` is exactly `yield return X;`.
fn single_yield(body: &str) -> Option<String> {
    let clean = strip_tokens(body);
    let clean = clean.trim();
    if clean.contains('\n') {
        return None;
    }
    let value = clean.strip_prefix("yield return ")?.strip_suffix(';')?.trim();
    if value.is_empty() || value.contains(';') {
        return None;
    }
    Some(value.to_string())
}

/// Units of one generated type, in slot order.
#[derive(Debug, Default)]
pub struct StateUnits {
    units: IndexMap<NodeId, StateUnit>,
}

impl StateUnits {
    pub fn new() -> Self {
        StateUnits::default()
    }

    /// The slot of `node`, allocating one on first request.
    pub fn register(&mut self, node: NodeId, symbols: &mut SymbolTable) -> u32 {
        let next = self.units.len() as u32;
        self.units
            .entry(node)
            .or_insert_with(|| StateUnit {
                node,
                slot: next,
                body: symbols.new_body(),
                progress: UnitProgress::Pending,
                text: String::new(),
                referenced_in_progress: false,
            })
            .slot
    }

    pub fn get(&self, node: NodeId) -> Option<&StateUnit> {
        self.units.get(&node)
    }

    /// Marks a pending unit as being emitted and returns its body.
    pub fn begin(&mut self, node: NodeId) -> Option<BodyId> {
        let unit = self.units.get_mut(&node)?;
        if unit.progress != UnitProgress::Pending {
            return None;
        }
        unit.progress = UnitProgress::InProgress;
        Some(unit.body)
    }

    /// Records a reference to an already started unit.
    pub fn note_reference(&mut self, node: NodeId) {
        if let Some(unit) = self.units.get_mut(&node) {
            if unit.progress == UnitProgress::InProgress {
                unit.referenced_in_progress = true;
            }
        }
    }

    pub fn finish(&mut self, node: NodeId, text: String) {
        if let Some(unit) = self.units.get_mut(&node) {
            unit.text = text;
            unit.progress = UnitProgress::Done;
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateUnit> {
        self.units.values()
    }

    /// Units that need a dispatcher case.
    pub fn cases(&self) -> impl Iterator<Item = &StateUnit> {
        self.units.values().filter(|u| u.degenerate_value().is_none())
    }

    /// The dispatcher method, or `None` when every unit is degenerate.
    /// `case_body` supplies the full text of each case (prologue included).
    pub fn emit_dispatcher(
        &self,
        enumerator: &str,
        mut case_body: impl FnMut(&StateUnit) -> String,
    ) -> Option<String> {
        let cases: Vec<SwitchCase> = self
            .cases()
            .map(|unit| {
                let body = case_body(unit);
                let body = if stmt::ends_with_jump(&body) {
                    body
                } else {
                    stmt::lines([body.as_str(), "yield break;"])
                };
                SwitchCase {
                    labels: vec![unit.slot.to_string()],
                    body,
                }
            })
            .collect();
        if cases.is_empty() {
            return None;
        }
        let switch = stmt::switch("slot", &cases, None).into_text();
        let body = stmt::lines([switch.as_str(), "yield break;"]);
        Some(format!(
            "private {enumerator} {DISPATCHER}(int slot) {}",
            stmt::braced(&body)
        ))
    }
}

// ---------------------------------------------------------------------------
// Runtime calls
// ---------------------------------------------------------------------------

/// Operations the runtime support object exposes per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnitQuery {
    IsRunning,
    IsSuccess,
    IsFailure,
    IsFinished,
}

impl UnitQuery {
    pub fn method(self) -> &'static str {
        match self {
            UnitQuery::IsRunning => "IsRunning",
            UnitQuery::IsSuccess => "IsSuccess",
            UnitQuery::IsFailure => "IsFailure",
            UnitQuery::IsFinished => "IsFinished",
        }
    }
}

/// `__rt.Run(slot)`, or `__rt.Run(slot, value)` for a degenerate unit.
pub fn run_call(slot: u32, degenerate: Option<&str>) -> String {
    match degenerate {
        Some(value) => format!("{RUNTIME_PROPERTY}.Run({slot}, {value})"),
        None => format!("{RUNTIME_PROPERTY}.Run({slot})"),
    }
}

pub fn stop_call(slot: u32) -> String {
    format!("{RUNTIME_PROPERTY}.Stop({slot})")
}

pub fn query_call(slot: u32, query: UnitQuery) -> String {
    format!("{RUNTIME_PROPERTY}.{}({slot})", query.method())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units_with(bodies: &[(u32, &str)]) -> (StateUnits, SymbolTable) {
        let mut symbols = SymbolTable::new();
        let mut units = StateUnits::new();
        for (id, text) in bodies {
            units.register(NodeId(*id), &mut symbols);
            units.begin(NodeId(*id));
            units.finish(NodeId(*id), text.to_string());
        }
        (units, symbols)
    }

    #[test]
    fn slots_are_stable() {
        let mut symbols = SymbolTable::new();
        let mut units = StateUnits::new();
        assert_eq!(units.register(NodeId(9), &mut symbols), 0);
        assert_eq!(units.register(NodeId(4), &mut symbols), 1);
        assert_eq!(units.register(NodeId(9), &mut symbols), 0);
        assert_eq!(units.len(), 2);
    }

    #[test]
    fn begin_only_once() {
        let mut symbols = SymbolTable::new();
        let mut units = StateUnits::new();
        units.register(NodeId(1), &mut symbols);
        assert!(units.begin(NodeId(1)).is_some());
        assert!(units.begin(NodeId(1)).is_none());
    }

    #[test]
    fn single_yield_units_degenerate() {
        let (units, _) = units_with(&[(1, "yield return new WaitForSeconds(1f);")]);
        let unit = units.get(NodeId(1)).unwrap();
        assert_eq!(unit.degenerate_value().as_deref(), Some("new WaitForSeconds(1f)"));
        assert_eq!(units.cases().count(), 0);
        assert!(units.emit_dispatcher("IEnumerator", |u| u.text.clone()).is_none());
    }

    #[test]
    fn marked_single_yield_still_degenerates() {
        let (units, _) = units_with(&[(1, "/*#<n1*/yield return null;/*#>n1*/")]);
        assert_eq!(units.get(NodeId(1)).unwrap().degenerate_value().as_deref(), Some("null"));
    }

    #[test]
    fn self_referencing_unit_keeps_its_case() {
        let mut symbols = SymbolTable::new();
        let mut units = StateUnits::new();
        units.register(NodeId(1), &mut symbols);
        units.begin(NodeId(1));
        units.note_reference(NodeId(1));
        units.finish(NodeId(1), "yield return null;".to_string());
        assert_eq!(units.cases().count(), 1);
    }

    #[test]
    fn dispatcher_has_one_case_per_unit() {
        let (units, _) = units_with(&[(1, "a();\nyield return null;"), (2, "b();\nyield break;")]);
        let text = units.emit_dispatcher("IEnumerator", |u| u.text.clone()).unwrap();
        insta::assert_snapshot!(text, @r###"
        private IEnumerator __Dispatch(int slot) {
            switch (slot) {
                case 0:
                    a();
                    yield return null;
                    yield break;
                case 1:
                    b();
                    yield break;
            }
            yield break;
        }
        "###);
    }

    #[test]
    fn runtime_calls() {
        assert_eq!(run_call(2, None), "__rt.Run(2)");
        assert_eq!(run_call(2, Some("null")), "__rt.Run(2, null)");
        assert_eq!(stop_call(0), "__rt.Stop(0)");
        assert_eq!(query_call(3, UnitQuery::IsFinished), "__rt.IsFinished(3)");
    }
}
