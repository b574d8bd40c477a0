//! Component registry: the boundary between markup and the component library.

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Component props, ordered by name so rendering is deterministic.
pub type Props = BTreeMap<String, Value>;

/// A reusable presentational unit invoked by name from markup.
///
/// `children` is the already rendered HTML between the opening and closing
/// tags (empty for self-closing tags).
pub trait Component: Send + Sync {
    fn render(&self, props: &Props, children: &str) -> String;
}

impl<F> Component for F
where
    F: Fn(&Props, &str) -> String + Send + Sync,
{
    fn render(&self, props: &Props, children: &str) -> String {
        self(props, children)
    }
}

/// Read-only mapping from component name to implementation.
///
/// Built once at startup; builds only ever look components up.
#[derive(Default)]
pub struct ComponentRegistry {
    components: FxHashMap<String, Box<dyn Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `component` under `name`, replacing any previous entry.
    pub fn with(mut self, name: impl Into<String>, component: impl Component + 'static) -> Self {
        self.components.insert(name.into(), Box::new(component));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(Box::as_ref)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Prop as display text. Strings must be non-empty; numbers and booleans are
/// formatted; anything else counts as absent.
pub fn prop_text(props: &Props, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
