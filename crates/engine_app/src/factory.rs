//! The component factory: registry plus module search.

use std::path::{Path, PathBuf};

use tracing::{info, trace, warn};

use engine_component::{Component, Selector};

use crate::error::EngineError;
use crate::loader::{self, ModuleCache};
use crate::registry::{Builder, Registry};

/// Builds components by selector, loading modules on demand.
///
/// Registered builders and loaded modules persist for the factory's whole
/// lifetime, across scene switches. The registry is declared before the
/// module cache so builders are dropped before the code they point into.
#[derive(Debug, Default)]
pub struct ComponentFactory {
    registry: Registry,
    search_path: Vec<PathBuf>,
    modules: ModuleCache,
}

impl ComponentFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the comma-separated module search path.
    pub fn set_search_path(&mut self, compath: &str) {
        self.search_path = loader::parse_search_path(compath);
    }

    #[must_use]
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers a builder. See [`Registry::register`].
    pub fn register(&mut self, selector: &Selector, builder: Option<Builder>) -> bool {
        self.registry.register(selector, builder)
    }

    /// Builds the component `selector` resolves to, if registered.
    #[must_use]
    pub fn build(&self, selector: &Selector) -> Option<Box<dyn Component>> {
        let component = self.registry.build(selector)?;
        trace!(selector = %selector, built = %component.selector(), "component built");
        Some(component)
    }

    /// Loads the module implementing `selector` and registers its factory.
    ///
    /// With `path`, only that file is tried; otherwise each search directory
    /// is tried in order. Loading a selector that is already registered, or
    /// a file that is already loaded, registers nothing new.
    ///
    /// # Errors
    ///
    /// [`EngineError::ModuleNotFound`] when no candidate loads,
    /// [`EngineError::NoEntryPoint`] when the module exports no factory.
    pub fn load(&mut self, selector: &Selector, path: Option<&Path>) -> Result<(), EngineError> {
        let family = selector.family();
        let kind = selector.kind();
        if self.registry.contains(family, kind) {
            trace!(selector = %selector, "component already registered");
            return Ok(());
        }

        let searched = match path {
            Some(path) => vec![path.to_path_buf()],
            None => loader::candidates(&self.search_path, family, kind),
        };

        let mut opened = None;
        for candidate in &searched {
            trace!(selector = %selector, path = %candidate.display(), "trying module");
            let fresh = !self.modules.is_loaded(candidate);
            match self.modules.open(candidate) {
                Ok(id) => {
                    opened = Some((id, fresh));
                    break;
                }
                Err(error) => {
                    trace!(path = %candidate.display(), %error, "module not loadable");
                }
            }
        }
        let Some((id, fresh)) = opened else {
            warn!(selector = %selector, "no module found");
            return Err(EngineError::ModuleNotFound {
                selector: selector.clone(),
                searched,
            });
        };

        let module_path = self.modules.path(id).map(Path::to_path_buf).unwrap_or_default();
        let Some((symbol, entry)) = self.modules.entry(id, kind) else {
            warn!(selector = %selector, path = %module_path.display(), "module has no entry point");
            // A fresh module is the last one opened, so discarding it
            // leaves every other handle in place.
            if fresh {
                self.modules.discard(id);
            }
            return Err(EngineError::NoEntryPoint {
                selector: selector.clone(),
                path: module_path,
            });
        };

        self.registry
            .register(&Selector::new(family, kind), Some(Builder::Module(entry)));
        info!(selector = %selector, path = %module_path.display(), symbol, "component module loaded");
        Ok(())
    }

    /// Number of resident modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}
