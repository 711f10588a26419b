//! Component registry: `(family, type)` to builder.
//!
//! Families map to an ordered list of types so resolution of a bare family
//! is deterministic: the type named like the family wins, otherwise the
//! first one registered.

use std::collections::HashMap;

use engine_component::plugin::{self, EntryPoint};
use engine_component::{Component, Selector};

/// A no-argument constructor for a fresh component.
#[derive(Debug, Clone, Copy)]
pub enum Builder {
    /// Compiled into the host.
    Native(fn() -> Box<dyn Component>),
    /// Exported by a loaded module.
    Module(EntryPoint),
}

impl Builder {
    /// Builds a fresh component. `None` if a module factory returned null.
    #[must_use]
    pub fn build(&self) -> Option<Box<dyn Component>> {
        match self {
            Self::Native(f) => Some(f()),
            // SAFETY: module builders are only registered by the factory,
            // which keeps their library loaded for its own lifetime.
            Self::Module(entry) => unsafe { plugin::build_from(*entry) },
        }
    }
}

/// Registry of every buildable component.
#[derive(Debug, Default)]
pub struct Registry {
    /// Types keyed by family, in registration order.
    families: HashMap<String, Vec<(String, Builder)>>,
}

impl Registry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `builder` under the selector's family and resolved type.
    ///
    /// A missing builder is ignored. Registering an existing pair replaces
    /// its builder in place. Returns `true` if the pair is new.
    pub fn register(&mut self, selector: &Selector, builder: Option<Builder>) -> bool {
        let Some(builder) = builder else {
            return false;
        };
        let types = self.families.entry(selector.family().to_string()).or_default();
        match types.iter_mut().find(|(kind, _)| kind == selector.kind()) {
            Some(entry) => {
                entry.1 = builder;
                false
            }
            None => {
                types.push((selector.kind().to_string(), builder));
                true
            }
        }
    }

    /// Resolves a selector to its registered type and builder.
    ///
    /// An explicit type must match exactly. A bare family resolves to the
    /// type named like the family, else the first type registered.
    #[must_use]
    pub fn resolve(&self, selector: &Selector) -> Option<(&str, &Builder)> {
        let types = self.families.get(selector.family())?;
        let found = match selector.explicit_kind() {
            Some(kind) => types.iter().find(|(k, _)| k == kind),
            None => types
                .iter()
                .find(|(k, _)| k == selector.family())
                .or_else(|| types.first()),
        };
        found.map(|(kind, builder)| (kind.as_str(), builder))
    }

    /// Builds the component `selector` resolves to.
    #[must_use]
    pub fn build(&self, selector: &Selector) -> Option<Box<dyn Component>> {
        self.resolve(selector).and_then(|(_, builder)| builder.build())
    }

    /// Returns `true` if the exact pair is registered.
    #[must_use]
    pub fn contains(&self, family: &str, kind: &str) -> bool {
        self.families
            .get(family)
            .is_some_and(|types| types.iter().any(|(k, _)| k == kind))
    }

    /// Registered types of `family`, in registration order.
    #[must_use]
    pub fn kinds(&self, family: &str) -> Vec<&str> {
        self.families
            .get(family)
            .map(|types| types.iter().map(|(k, _)| k.as_str()).collect())
            .unwrap_or_default()
    }

    /// Returns the number of distinct families registered.
    #[must_use]
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Returns the total number of registered types across all families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
