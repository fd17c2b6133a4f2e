//! Capability scope registry
//!
//! A scope is a closed allowlist of symbols a normalized unit may reference
//! during preview evaluation. Two variants exist: `restricted` for simple
//! component requests and `expanded` for full-application requests, with the
//! invariant that expanded is a superset of restricted.
//!
//! Both definitions are built once at process start inside a [`ScopeRegistry`]
//! and passed by reference into the renderer. Nothing resolves symbols from an
//! ambient namespace: a symbol absent from the selected scope is simply never
//! installed into the evaluation context and fails there with a reference
//! error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::RequestCategory;

/// What a capability symbol provides to the evaluated unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// Reactive state hook (`useState`).
    StateHook,
    /// Lifecycle hook (`useEffect`).
    LifecycleHook,
    /// Mutable reference hook (`useRef`).
    RefHook,
    /// Memoization hook (`useMemo`, `useCallback`).
    MemoHook,
    /// Curated icon component.
    Icon,
    /// 3D graphics library handle.
    Graphics3d,
    /// Data-visualization library handle.
    DataViz,
    /// Chart component.
    Charting,
    /// Audio-synthesis library handle.
    AudioSynth,
    /// General data-utility library handle.
    DataUtility,
}

/// A single named capability in a scope mapping.
///
/// Hooks carry bespoke JavaScript bodies; icons, chart components and library
/// handles get a generated stub so the symbol resolves and carries an
/// identifiable projection in the preview output.
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    kind: CapabilityKind,
    body: Option<&'static str>,
}

impl Capability {
    const fn hook(kind: CapabilityKind, body: &'static str) -> Self {
        Self { kind, body: Some(body) }
    }

    const fn component(kind: CapabilityKind) -> Self {
        Self { kind, body: None }
    }

    const fn library(kind: CapabilityKind) -> Self {
        Self { kind, body: None }
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// JavaScript source installing this capability under `name`.
    pub fn stub_source(&self, name: &str) -> String {
        if let Some(body) = self.body {
            return body.to_string();
        }
        match self.kind {
            CapabilityKind::Icon | CapabilityKind::Charting => {
                format!("function {name}() {{ return '[{name}]'; }}\n")
            }
            _ => format!("var {name} = {{ __capability: '{name}' }};\n"),
        }
    }
}

const USE_STATE: &str = "\
function useState(initial) {
  var value = initial;
  var setValue = function (next) {
    value = typeof next === 'function' ? next(value) : next;
  };
  return [value, setValue];
}
";

const USE_EFFECT: &str = "\
function useEffect(effect, deps) { }
";

const USE_REF: &str = "\
function useRef(initial) { return { current: initial }; }
";

const USE_MEMO: &str = "\
function useMemo(factory, deps) { return factory(); }
";

const USE_CALLBACK: &str = "\
function useCallback(callback, deps) { return callback; }
";

/// Curated icon subset available in every scope.
const ICONS: &[&str] = &[
    "Home", "Settings", "BarChart3", "Search", "Music", "User", "Plus", "X", "Check",
];

/// Chart components available in the expanded scope.
const CHART_COMPONENTS: &[&str] = &[
    "LineChart", "BarChart", "PieChart", "XAxis", "YAxis", "Tooltip",
];

/// An immutable mapping from symbol name to capability.
#[derive(Debug, Clone)]
pub struct ScopeDefinition {
    name: &'static str,
    entries: BTreeMap<&'static str, Capability>,
}

impl ScopeDefinition {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Capability> {
        self.entries.get(symbol)
    }

    /// All symbol names, in deterministic order.
    pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Symbol names of a given kind, in deterministic order.
    pub fn symbols_of(&self, kind: CapabilityKind) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, c)| c.kind() == kind)
            .map(|(n, _)| *n)
            .collect()
    }

    /// Hook symbol names (state, lifecycle, ref, memoization).
    pub fn hook_symbols(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, c)| {
                matches!(
                    c.kind(),
                    CapabilityKind::StateHook
                        | CapabilityKind::LifecycleHook
                        | CapabilityKind::RefHook
                        | CapabilityKind::MemoHook
                )
            })
            .map(|(n, _)| *n)
            .collect()
    }

    /// Library handle names (everything that is not a hook, icon or chart).
    pub fn library_symbols(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, c)| {
                matches!(
                    c.kind(),
                    CapabilityKind::Graphics3d
                        | CapabilityKind::DataViz
                        | CapabilityKind::AudioSynth
                        | CapabilityKind::DataUtility
                )
            })
            .map(|(n, _)| *n)
            .collect()
    }

    /// Concatenated JavaScript stubs for every capability in this scope.
    pub fn stub_prelude(&self) -> String {
        let mut prelude = String::new();
        for (name, capability) in &self.entries {
            prelude.push_str(&capability.stub_source(name));
        }
        prelude
    }

    fn restricted() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("useState", Capability::hook(CapabilityKind::StateHook, USE_STATE));
        entries.insert("useEffect", Capability::hook(CapabilityKind::LifecycleHook, USE_EFFECT));
        entries.insert("useRef", Capability::hook(CapabilityKind::RefHook, USE_REF));
        for icon in ICONS {
            entries.insert(*icon, Capability::component(CapabilityKind::Icon));
        }
        Self { name: "restricted", entries }
    }

    fn expanded() -> Self {
        let mut base = Self::restricted();
        base.entries
            .insert("useMemo", Capability::hook(CapabilityKind::MemoHook, USE_MEMO));
        base.entries
            .insert("useCallback", Capability::hook(CapabilityKind::MemoHook, USE_CALLBACK));
        base.entries
            .insert("THREE", Capability::library(CapabilityKind::Graphics3d));
        base.entries
            .insert("d3", Capability::library(CapabilityKind::DataViz));
        base.entries
            .insert("Tone", Capability::library(CapabilityKind::AudioSynth));
        base.entries
            .insert("_", Capability::library(CapabilityKind::DataUtility));
        for chart in CHART_COMPONENTS {
            base.entries
                .insert(*chart, Capability::component(CapabilityKind::Charting));
        }
        Self { name: "expanded", entries: base.entries }
    }
}

/// Explicit scope selection, overriding the category-derived default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeChoice {
    Restricted,
    Expanded,
}

/// Process-wide, read-only pair of scope definitions.
///
/// Built once at startup and shared by reference; safe to use from concurrent
/// renders without locking.
#[derive(Debug)]
pub struct ScopeRegistry {
    restricted: ScopeDefinition,
    expanded: ScopeDefinition,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self {
            restricted: ScopeDefinition::restricted(),
            expanded: ScopeDefinition::expanded(),
        }
    }

    pub fn restricted(&self) -> &ScopeDefinition {
        &self.restricted
    }

    pub fn expanded(&self) -> &ScopeDefinition {
        &self.expanded
    }

    /// Select the scope for a request: simple → restricted, complex →
    /// expanded; an explicit override wins over the category default.
    pub fn select(
        &self,
        category: RequestCategory,
        choice: Option<ScopeChoice>,
    ) -> &ScopeDefinition {
        match choice {
            Some(ScopeChoice::Restricted) => &self.restricted,
            Some(ScopeChoice::Expanded) => &self.expanded,
            None => match category {
                RequestCategory::Simple => &self.restricted,
                RequestCategory::Complex => &self.expanded,
            },
        }
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expanded_is_superset_of_restricted() {
        let registry = ScopeRegistry::new();
        for symbol in registry.restricted().symbols() {
            assert!(
                registry.expanded().contains(symbol),
                "expanded scope is missing restricted symbol {symbol}"
            );
        }
    }

    #[test]
    fn test_selection_follows_category() {
        let registry = ScopeRegistry::new();
        assert_eq!(
            registry.select(RequestCategory::Simple, None).name(),
            "restricted"
        );
        assert_eq!(
            registry.select(RequestCategory::Complex, None).name(),
            "expanded"
        );
    }

    #[test]
    fn test_override_wins_over_category() {
        let registry = ScopeRegistry::new();
        assert_eq!(
            registry
                .select(RequestCategory::Simple, Some(ScopeChoice::Expanded))
                .name(),
            "expanded"
        );
        assert_eq!(
            registry
                .select(RequestCategory::Complex, Some(ScopeChoice::Restricted))
                .name(),
            "restricted"
        );
    }

    #[test]
    fn test_restricted_has_no_library_handles() {
        let registry = ScopeRegistry::new();
        assert!(registry.restricted().library_symbols().is_empty());
        assert!(!registry.restricted().contains("THREE"));
        assert!(registry.expanded().contains("THREE"));
    }

    #[test]
    fn test_stub_prelude_covers_every_symbol() {
        let registry = ScopeRegistry::new();
        let prelude = registry.expanded().stub_prelude();
        for symbol in registry.expanded().symbols() {
            assert!(prelude.contains(symbol), "no stub emitted for {symbol}");
        }
    }

    #[test]
    fn test_hook_symbols_per_scope() {
        let registry = ScopeRegistry::new();
        let restricted = registry.restricted().hook_symbols();
        assert_eq!(restricted, vec!["useEffect", "useRef", "useState"]);
        let expanded = registry.expanded().hook_symbols();
        assert!(expanded.contains(&"useMemo"));
        assert!(expanded.contains(&"useCallback"));
    }
}
