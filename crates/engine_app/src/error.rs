//! Runtime error types.

use std::path::PathBuf;

use engine_component::{AssemblyFailure, ComponentError, Entity, Selector};

/// Errors raised while loading modules and assembling entities.
///
/// Every variant is fatal for the operation that raised it: a failed load
/// is reported to the caller, and a failed assembly releases the entity
/// under construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A component's declared dependency is still missing after the
    /// assembler tried to build it.
    #[error("component {component} has unmet dependency {missing}")]
    UnmetDependency {
        /// The component that could not be attached.
        component: Selector,
        /// The first dependency that is not satisfied.
        missing: Selector,
    },

    /// No loadable module exists for the selector.
    #[error("no module found for component {selector} (searched {searched:?})")]
    ModuleNotFound {
        selector: Selector,
        /// Every file that was tried, in order.
        searched: Vec<PathBuf>,
    },

    /// The module loaded but exports neither `build_<type>` nor `build`.
    #[error("module {} has no entry point for component {selector}", path.display())]
    NoEntryPoint { selector: Selector, path: PathBuf },

    /// A component's `setup` failed.
    #[error("setup of component {selector} failed: {source}")]
    Setup {
        selector: Selector,
        #[source]
        source: ComponentError,
    },

    /// The entity is gone (never built, or already finalized).
    #[error("entity {0} does not exist")]
    NoSuchEntity(Entity),

    /// A scene or entity-type file could not be read.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Errors reading signature files.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document root must be an object.
    #[error("{} is not a key/value document", path.display())]
    NotAnObject { path: PathBuf },
}

impl From<EngineError> for ComponentError {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (kind, selector) = match error {
            EngineError::UnmetDependency { missing, .. } => (AssemblyFailure::UnmetDependency, Some(missing)),
            EngineError::ModuleNotFound { selector, .. } => (AssemblyFailure::ModuleNotFound, Some(selector)),
            EngineError::NoEntryPoint { selector, .. } => (AssemblyFailure::NoEntryPoint, Some(selector)),
            EngineError::Setup { selector, .. } => (AssemblyFailure::Setup, Some(selector)),
            EngineError::NoSuchEntity(_) => (AssemblyFailure::NoSuchEntity, None),
            EngineError::Scene(_) => (AssemblyFailure::Scene, None),
        };
        ComponentError::Assembly {
            kind,
            selector,
            message,
        }
    }
}
